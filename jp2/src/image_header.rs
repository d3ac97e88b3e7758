use log::{debug, warn};
use std::error;
use std::io;

use crate::boxes::BOX_HEADER_LENGTH;
use crate::{BoxType, JBox, JP2Error, BOX_TYPE_BITS_PER_COMPONENT, BOX_TYPE_IMAGE_HEADER};

const COMPRESSION_TYPE_WAVELET: u8 = 7;

// Components vary in bit depth, see the Bits Per Component box.
const BITS_PER_COMPONENT_VARIES: u8 = 255;

const IMAGE_HEADER_DATA_LENGTH: u64 = 14;

/// Bit depth of a component.
///
/// The low 7 bits hold the depth minus one, the high bit the signedness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitDepth {
    encoded: u8,
}

impl BitDepth {
    pub fn new(encoded: u8) -> BitDepth {
        BitDepth { encoded }
    }

    /// Bit depth including the sign bit, from 1 to 38.
    pub fn value(&self) -> u8 {
        (self.encoded & 0x7F) + 1
    }

    pub fn is_signed(&self) -> bool {
        self.encoded & 0x80 == 0x80
    }

    pub fn encoded(&self) -> u8 {
        self.encoded
    }

    fn is_valid(&self) -> bool {
        self.encoded & 0x7F <= 37
    }
}

/// Image Header box.
///
/// This box contains fixed length generic information about the image, such as
/// the image size and number of components. The contents of the JP2 Header box
/// shall start with an Image Header box.
///
/// For more information, see ISO/IEC 15444-1 | ITU T-800 Appendix I.5.3.1.
#[derive(Debug, Default)]
pub struct ImageHeaderBox {
    pub(crate) length: u64,
    pub(crate) offset: u64,
    height: [u8; 4],
    width: [u8; 4],
    components_num: [u8; 2],
    components_bits: [u8; 1],
    compression_type: [u8; 1],
    colourspace_unknown: [u8; 1],
    intellectual_property: [u8; 1],
}

impl ImageHeaderBox {
    pub(crate) fn new(length: u64, offset: u64) -> ImageHeaderBox {
        ImageHeaderBox {
            length,
            offset,
            ..Default::default()
        }
    }

    /// Image area height (HEIGHT).
    pub fn height(&self) -> u32 {
        u32::from_be_bytes(self.height)
    }

    /// Image area width (WIDTH).
    pub fn width(&self) -> u32 {
        u32::from_be_bytes(self.width)
    }

    /// Number of components (NC).
    pub fn components_num(&self) -> u16 {
        u16::from_be_bytes(self.components_num)
    }

    /// Bit depth shared by all components.
    ///
    /// `None` if the components vary in bit depth, in which case the JP2 Header
    /// box also holds a Bits Per Component box.
    pub fn components_bits(&self) -> Option<BitDepth> {
        if self.components_bits[0] == BITS_PER_COMPONENT_VARIES {
            None
        } else {
            Some(BitDepth::new(self.components_bits[0]))
        }
    }

    /// Compression type (C), 7 for ITU-T T.800 | ISO/IEC 15444-1 files.
    pub fn compression_type(&self) -> u8 {
        self.compression_type[0]
    }

    /// Colourspace Unknown (UnkC).
    ///
    /// 1 if the colourspace specified by the Colour Specification boxes is an
    /// assumption rather than known.
    pub fn colourspace_unknown(&self) -> u8 {
        self.colourspace_unknown[0]
    }

    /// Intellectual Property (IPR).
    pub fn intellectual_property(&self) -> u8 {
        self.intellectual_property[0]
    }
}

impl JBox for ImageHeaderBox {
    // The type of the Image Header box shall be ‘ihdr’ (0x6968 6472)
    fn identifier(&self) -> BoxType {
        BOX_TYPE_IMAGE_HEADER
    }

    fn length(&self) -> u64 {
        self.length
    }

    fn offset(&self) -> u64 {
        self.offset
    }

    fn decode<R: io::Read + io::Seek>(
        &mut self,
        reader: &mut R,
    ) -> Result<(), Box<dyn error::Error>> {
        // The length of the Image Header box shall be 22 bytes, including the
        // box length and type fields.
        if self.length != BOX_HEADER_LENGTH + IMAGE_HEADER_DATA_LENGTH {
            return Err(JP2Error::BoxMalformed {
                box_type: BOX_TYPE_IMAGE_HEADER,
                offset: self.offset,
            }
            .into());
        }

        reader.seek(io::SeekFrom::Start(self.offset + BOX_HEADER_LENGTH))?;
        reader.read_exact(&mut self.height)?;
        reader.read_exact(&mut self.width)?;
        reader.read_exact(&mut self.components_num)?;
        reader.read_exact(&mut self.components_bits)?;
        reader.read_exact(&mut self.compression_type)?;
        reader.read_exact(&mut self.colourspace_unknown)?;
        reader.read_exact(&mut self.intellectual_property)?;

        debug!("Height {}", self.height());
        debug!("Width {}", self.width());
        debug!("Components {}", self.components_num());
        debug!("Bits per component {:?}", self.components_bits());

        if let Some(depth) = self.components_bits() {
            // Values past 38 bits are reserved for ISO use.
            if !depth.is_valid() {
                return Err(JP2Error::BoxMalformed {
                    box_type: BOX_TYPE_IMAGE_HEADER,
                    offset: self.offset,
                }
                .into());
            }
        }

        if self.compression_type() != COMPRESSION_TYPE_WAVELET {
            return Err(JP2Error::BoxMalformed {
                box_type: BOX_TYPE_IMAGE_HEADER,
                offset: self.offset,
            }
            .into());
        }

        if self.colourspace_unknown() > 1 {
            warn!("Colourspace Unknown {} reserved", self.colourspace_unknown());
        }

        Ok(())
    }
}

/// Bits Per Component box.
///
/// Present when the Image Header box gives 255 for the bit depth. There is one
/// entry per component, in codestream order.
///
/// See ITU-T T.800 (V4) | ISO/IEC 15444-1:2024 Section I.5.3.2.
#[derive(Debug, Default)]
pub struct BitsPerComponentBox {
    pub(crate) length: u64,
    pub(crate) offset: u64,
    bits_per_component: Vec<u8>,
}

impl BitsPerComponentBox {
    pub(crate) fn new(length: u64, offset: u64) -> BitsPerComponentBox {
        BitsPerComponentBox {
            length,
            offset,
            ..Default::default()
        }
    }

    pub fn bits_per_component(&self) -> Vec<BitDepth> {
        self.bits_per_component
            .iter()
            .map(|byte| BitDepth::new(*byte))
            .collect()
    }
}

impl JBox for BitsPerComponentBox {
    fn identifier(&self) -> BoxType {
        BOX_TYPE_BITS_PER_COMPONENT
    }

    fn length(&self) -> u64 {
        self.length
    }

    fn offset(&self) -> u64 {
        self.offset
    }

    fn decode<R: io::Read + io::Seek>(
        &mut self,
        reader: &mut R,
    ) -> Result<(), Box<dyn error::Error>> {
        reader.seek(io::SeekFrom::Start(self.offset + BOX_HEADER_LENGTH))?;
        self.bits_per_component = vec![0u8; self.length.saturating_sub(BOX_HEADER_LENGTH) as usize];
        reader.read_exact(&mut self.bits_per_component)?;

        if self
            .bits_per_component()
            .iter()
            .any(|depth| !depth.is_valid())
        {
            return Err(JP2Error::BoxMalformed {
                box_type: BOX_TYPE_BITS_PER_COMPONENT,
                offset: self.offset,
            }
            .into());
        }

        Ok(())
    }
}
