use log::{debug, info, warn};
use std::error;
use std::fmt;
use std::io;

use crate::boxes::BOX_HEADER_LENGTH;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::{BoxType, JBox, JP2Error, BOX_TYPE_COLOUR_SPECIFICATION};

type Method = u8;

const METHOD_ENUMERATED_COLOUR_SPACE: Method = 1;
const METHOD_RESTRICTED_ICC_PROFILE: Method = 2;

const ENUMERATED_COLOUR_SPACE_SRGB: u32 = 16;
const ENUMERATED_COLOUR_SPACE_GREYSCALE: u32 = 17;
const ENUMERATED_COLOUR_SPACE_SYCC: u32 = 18;
const ENUMERATED_COLOUR_SPACE_ESRGB: u32 = 20;

// Enumerated colourspaces that are recognised but have no transform.
const UNSUPPORTED_COLOUR_SPACES: [(u32, &str); 15] = [
    (0, "Bi-Level"),
    (1, "YCbCr(1)"),
    (3, "YCbCr(2)"),
    (4, "YCbCr(3)"),
    (9, "PhotoYCC"),
    (11, "CMY"),
    (12, "CMYK"),
    (13, "YCCK"),
    (14, "CIELab"),
    (15, "Bi-Level(2)"),
    (19, "CIEJab"),
    (21, "ROMM-RGB"),
    (22, "YPbPr(1125/60)"),
    (23, "YPbPr(1250/50)"),
    (24, "e-sYCC"),
];

/// Name of a recognised but unsupported enumerated colourspace.
pub fn unsupported_colour_space_name(code: u32) -> Option<&'static str> {
    UNSUPPORTED_COLOUR_SPACES
        .iter()
        .find(|(value, _)| *value == code)
        .map(|(_, name)| *name)
}

/// Colour specification methods (METH) understood by a JP2 reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColourSpecificationMethod {
    /// Enumerated colour space, using integer codes.
    Enumerated,

    /// Restricted ICC method.
    ///
    /// The PROFILE field holds a Monochrome Input or Three-Component
    /// Matrix-Based Input profile whose PCS is XYZ.
    IccProfiled,
}

/// Enumerated colourspaces (EnumCS) that can be transformed to sRGB.
///
/// Every other code decodes to `Unknown`, with a diagnostic naming it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumeratedColourSpace {
    /// sRGB as defined by IEC 61966-2-1.
    #[allow(non_camel_case_types)]
    sRGB,

    /// Greyscale using the sRGB non-linearity.
    GreyScale,

    /// sYCC as defined by IEC 61966-2-1 / Amd.1.
    #[allow(non_camel_case_types)]
    sYCC,

    /// e-sRGB as defined by PIMA 7667.
    #[allow(non_camel_case_types)]
    esRGB,

    Unknown,
}

impl EnumeratedColourSpace {
    fn new(code: u32) -> EnumeratedColourSpace {
        match code {
            ENUMERATED_COLOUR_SPACE_SRGB => EnumeratedColourSpace::sRGB,
            ENUMERATED_COLOUR_SPACE_GREYSCALE => EnumeratedColourSpace::GreyScale,
            ENUMERATED_COLOUR_SPACE_SYCC => EnumeratedColourSpace::sYCC,
            ENUMERATED_COLOUR_SPACE_ESRGB => EnumeratedColourSpace::esRGB,
            _ => EnumeratedColourSpace::Unknown,
        }
    }

    /// The EnumCS value, `None` for `Unknown`.
    pub fn code(&self) -> Option<u32> {
        match self {
            EnumeratedColourSpace::sRGB => Some(ENUMERATED_COLOUR_SPACE_SRGB),
            EnumeratedColourSpace::GreyScale => Some(ENUMERATED_COLOUR_SPACE_GREYSCALE),
            EnumeratedColourSpace::sYCC => Some(ENUMERATED_COLOUR_SPACE_SYCC),
            EnumeratedColourSpace::esRGB => Some(ENUMERATED_COLOUR_SPACE_ESRGB),
            EnumeratedColourSpace::Unknown => None,
        }
    }
}

impl fmt::Display for EnumeratedColourSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnumeratedColourSpace::sRGB => write!(f, "sRGB"),
            EnumeratedColourSpace::GreyScale => write!(f, "Greyscale"),
            EnumeratedColourSpace::sYCC => write!(f, "sYCC"),
            EnumeratedColourSpace::esRGB => write!(f, "e-sRGB"),
            EnumeratedColourSpace::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Resolved colourspace of the decompressed image.
#[derive(Debug, Clone, PartialEq)]
pub enum ColourSpecification {
    Enumerated(EnumeratedColourSpace),

    /// Raw bytes of the embedded ICC profile, starting with its size field.
    IccProfiled(Vec<u8>),
}

impl ColourSpecification {
    pub fn method(&self) -> ColourSpecificationMethod {
        match self {
            ColourSpecification::Enumerated(_) => ColourSpecificationMethod::Enumerated,
            ColourSpecification::IccProfiled(_) => ColourSpecificationMethod::IccProfiled,
        }
    }
}

impl Default for ColourSpecification {
    fn default() -> Self {
        ColourSpecification::Enumerated(EnumeratedColourSpace::Unknown)
    }
}

impl fmt::Display for ColourSpecification {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ColourSpecification::Enumerated(colour_space) => {
                write!(f, "Enumerated colourspace: {}", colour_space)
            }
            ColourSpecification::IccProfiled(profile) => {
                write!(f, "Restricted ICC Profile ({} bytes)", profile.len())
            }
        }
    }
}

/// Colour Specification box.
///
/// Each Colour Specification box defines one method by which an application
/// can interpret the colourspace of the decompressed image data.
///
/// A JP2 file may contain multiple Colour Specification boxes, but must contain
/// at least one. Readers use the first one and ignore the rest.
///
/// See ITU-T T.800(V4) | ISO/IEC 15444-1:2024 I.5.3.3.
#[derive(Debug, Default)]
pub struct ColourSpecificationBox {
    pub(crate) length: u64,
    pub(crate) offset: u64,
    method: [u8; 1],
    precedence: [u8; 1],
    colourspace_approximation: [u8; 1],
    enumerated_colour_space: [u8; 4],
    specification: ColourSpecification,
    diagnostics: Diagnostics,
}

impl ColourSpecificationBox {
    pub(crate) fn new(length: u64, offset: u64) -> ColourSpecificationBox {
        ColourSpecificationBox {
            length,
            offset,
            ..Default::default()
        }
    }

    /// Box for an enumerated colourspace code.
    pub fn enumerated(code: u32) -> ColourSpecificationBox {
        ColourSpecificationBox {
            length: BOX_HEADER_LENGTH + 7,
            method: [METHOD_ENUMERATED_COLOUR_SPACE],
            enumerated_colour_space: code.to_be_bytes(),
            specification: ColourSpecification::Enumerated(EnumeratedColourSpace::new(code)),
            ..Default::default()
        }
    }

    /// Box for a restricted ICC profile.
    pub fn icc_profiled(profile: Vec<u8>) -> ColourSpecificationBox {
        ColourSpecificationBox {
            length: BOX_HEADER_LENGTH + 3 + profile.len() as u64,
            method: [METHOD_RESTRICTED_ICC_PROFILE],
            specification: ColourSpecification::IccProfiled(profile),
            ..Default::default()
        }
    }

    /// Specification method (METH).
    pub fn method(&self) -> ColourSpecificationMethod {
        self.specification.method()
    }

    pub fn specification(&self) -> &ColourSpecification {
        &self.specification
    }

    /// Precedence (PREC), ignored by JP2 readers.
    pub fn precedence(&self) -> i8 {
        self.precedence[0] as i8
    }

    /// Colourspace approximation (APPROX), ignored by JP2 readers.
    pub fn colourspace_approximation(&self) -> u8 {
        self.colourspace_approximation[0]
    }

    /// Warnings raised while decoding this box.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub(crate) fn take_diagnostics(&mut self) -> Diagnostics {
        std::mem::take(&mut self.diagnostics)
    }

    /// Encode the complete box, header included.
    pub fn encode(&self) -> Vec<u8> {
        let mut body = vec![
            self.method[0],
            self.precedence[0],
            self.colourspace_approximation[0],
        ];
        match &self.specification {
            ColourSpecification::Enumerated(_) => {
                body.extend_from_slice(&self.enumerated_colour_space)
            }
            ColourSpecification::IccProfiled(profile) => body.extend_from_slice(profile),
        }

        let mut out = Vec::with_capacity(body.len() + BOX_HEADER_LENGTH as usize);
        out.extend_from_slice(&((body.len() as u64 + BOX_HEADER_LENGTH) as u32).to_be_bytes());
        out.extend_from_slice(&BOX_TYPE_COLOUR_SPECIFICATION);
        out.extend(body);
        out
    }

    fn box_end(&self) -> u64 {
        self.offset + self.length
    }

    fn decode_enumerated(&mut self) {
        let code = u32::from_be_bytes(self.enumerated_colour_space);
        let colour_space = EnumeratedColourSpace::new(code);
        debug!("EnumCS {} ({})", colour_space, code);

        if colour_space == EnumeratedColourSpace::Unknown {
            let offset = self.offset;
            match unsupported_colour_space_name(code) {
                Some(name) => self.diagnostics.push(Diagnostic::UnsupportedColourSpace {
                    name,
                    code,
                    offset,
                }),
                None => self
                    .diagnostics
                    .push(Diagnostic::UnknownColourSpace { code, offset }),
            }
        }

        self.specification = ColourSpecification::Enumerated(colour_space);
    }
}

impl JBox for ColourSpecificationBox {
    // The type of a Colour Specification box shall be ‘colr’ (0x636F 6C72).
    fn identifier(&self) -> BoxType {
        BOX_TYPE_COLOUR_SPECIFICATION
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
        info!("ColourSpecificationBox start at {:?}", self.offset);
        let data_start = self.offset + BOX_HEADER_LENGTH;
        reader.seek(io::SeekFrom::Start(data_start))?;

        reader.read_exact(&mut self.method)?;
        reader.read_exact(&mut self.precedence)?;
        reader.read_exact(&mut self.colourspace_approximation)?;

        if self.precedence() != 0 {
            warn!("Precedence {:?} unexpected", self.precedence());
        }
        if self.colourspace_approximation() != 0 {
            warn!(
                "Colourspace Approximation {:?} unexpected",
                self.colourspace_approximation()
            );
        }
        debug!("Method {:?}", self.method[0]);

        match self.method[0] {
            // If the value of METH is 1, then the EnumCS field shall exist in
            // this box immediately following the APPROX field.
            METHOD_ENUMERATED_COLOUR_SPACE => {
                reader.read_exact(&mut self.enumerated_colour_space)?;
                self.decode_enumerated();
            }

            // If the value of METH is 2, then the PROFILE field shall
            // immediately follow the APPROX field. The profile starts with its
            // own size.
            METHOD_RESTRICTED_ICC_PROFILE => {
                let mut size = [0u8; 4];
                reader.read_exact(&mut size)?;
                let size = u32::from_be_bytes(size) as u64;

                let profile_start = data_start + 3;
                if profile_start + size > self.box_end() {
                    return Err(JP2Error::BoxMalformed {
                        box_type: BOX_TYPE_COLOUR_SPECIFICATION,
                        offset: self.offset,
                    }
                    .into());
                }

                reader.seek(io::SeekFrom::Start(profile_start))?;
                let mut profile = vec![0u8; size as usize];
                reader.read_exact(&mut profile)?;
                debug!("Restricted ICC Profile of {} bytes", size);
                self.specification = ColourSpecification::IccProfiled(profile);
            }

            method => {
                return Err(JP2Error::BadSpecificationMethod {
                    method,
                    offset: self.offset,
                }
                .into());
            }
        }

        info!("ColourSpecificationBox finish at {:?}", reader.stream_position()?);
        Ok(())
    }
}
