#![allow(dead_code)]

//! JP2 file format.
//!
//! The JPEG 2000 file format (JP2 file format) provides a foundation for storing application specific data (metadata) in
//! association with a JPEG 2000 codestream, such as information which is required to display the image.
//!
//! The building-block of the JP2 file format is called a box. All information contained within the JP2 file is
//! encapsulated in boxes, and some boxes (superboxes) contain other boxes.
//!
//! The main entry point for this module is the `decode_jp2` function. That reads from the provided input, and returns a
//! `JP2File` on success, or an error on failure. Recoverable anomalies do not fail the read, they are collected in the
//! `Diagnostics` of the returned file.

use log::{debug, info};
use std::error;
use std::fmt;
use std::io;

mod boxes;
mod colour_specification;
mod diagnostics;
mod image_header;

pub use boxes::{read_boxes, source_length, BoxHeader, BoxNode, BOX_HEADER_LENGTH};
pub use colour_specification::{
    unsupported_colour_space_name, ColourSpecification, ColourSpecificationBox,
    ColourSpecificationMethod, EnumeratedColourSpace,
};
pub use diagnostics::{Diagnostic, Diagnostics};
pub use image_header::{BitDepth, BitsPerComponentBox, ImageHeaderBox};

use diagnostics::box_name;

/// Error values that may be returned from JP2 functions.
#[derive(Debug)]
pub enum JP2Error {
    /// Invalid signature.
    ///
    /// The signature box did not match the required value.
    /// This usually means that the file is not JPEG 2000
    /// file format. It could be a codestream without the Annex I
    /// wrapper.
    InvalidSignature { signature: [u8; 4], offset: u64 },

    /// Not compatible.
    ///
    /// The compatible brands did not contain a supported brand.
    /// At this time, at least `'jp2 '` is required.
    NotCompatible { compatibility_list: Vec<String> },

    /// Unexpected box type.
    ///
    /// A box was encountered where the file format does not allow it, for
    /// example a codestream before the JP2 Header box.
    BoxUnexpected { box_type: BoxType, offset: u64 },

    /// Duplicate box.
    ///
    /// Some boxes are only permitted to be present once in the file.
    BoxDuplicate { box_type: BoxType, offset: u64 },

    /// Malformed box.
    ///
    /// This indicates that the box was not in the expected form. Usually
    /// this indicates some form of truncation during generation or in transit.
    BoxMalformed { box_type: BoxType, offset: u64 },

    /// Missing box.
    ///
    /// Some boxes are required to be present. If a required
    /// box is not present, this error will be returned.
    BoxMissing { box_type: BoxType },

    /// Extended length.
    ///
    /// The box length field was 1, meaning the length is given as a 64-bit
    /// XLBox field. Such boxes are not supported.
    BoxExtendedLength { box_type: BoxType, offset: u64 },

    /// Box out of bounds.
    ///
    /// The box extends past the end of the source or of its superbox.
    BoxOutOfBounds {
        box_type: BoxType,
        offset: u64,
        length: u64,
        bound: u64,
    },

    /// Bad specification method.
    ///
    /// The METH field of a Colour Specification box is neither 1 nor 2.
    BadSpecificationMethod { method: u8, offset: u64 },
}

impl error::Error for JP2Error {}
impl fmt::Display for JP2Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::InvalidSignature { signature, offset } => {
                write!(
                    f,
                    "invalid signature {:?} at offset {}",
                    String::from_utf8_lossy(signature),
                    offset
                )
            }
            Self::NotCompatible { compatibility_list } => {
                write!(
                    f,
                    "'jp2 ' not found in compatibility list '{}'",
                    compatibility_list.join(", ")
                )
            }
            Self::BoxDuplicate { box_type, offset } => {
                write!(
                    f,
                    "unexpected duplicate box type {} at offset {}",
                    box_name(*box_type),
                    offset
                )
            }
            Self::BoxUnexpected { box_type, offset } => {
                write!(
                    f,
                    "unexpected box type {} at offset {}",
                    box_name(*box_type),
                    offset
                )
            }
            Self::BoxMalformed { box_type, offset } => {
                write!(
                    f,
                    "malformed box type {} at offset {}",
                    box_name(*box_type),
                    offset
                )
            }
            Self::BoxMissing { box_type } => {
                write!(f, "box type {} missing", box_name(*box_type))
            }
            Self::BoxExtendedLength { box_type, offset } => {
                write!(
                    f,
                    "extended length of box type {} at offset {} is not supported",
                    box_name(*box_type),
                    offset
                )
            }
            Self::BoxOutOfBounds {
                box_type,
                offset,
                length,
                bound,
            } => {
                write!(
                    f,
                    "box type {} at offset {} with length {} exceeds {}",
                    box_name(*box_type),
                    offset,
                    length,
                    bound
                )
            }
            Self::BadSpecificationMethod { method, offset } => {
                write!(
                    f,
                    "Bad specification method ({}) in colour specification box at offset {}",
                    method, offset
                )
            }
        }
    }
}

// jP\040\040 (0x6A50 2020)
const BOX_TYPE_SIGNATURE: BoxType = [106, 80, 32, 32];
const BOX_TYPE_FILE_TYPE: BoxType = [102, 116, 121, 112];
const BOX_TYPE_HEADER: BoxType = [106, 112, 50, 104];
const BOX_TYPE_IMAGE_HEADER: BoxType = [105, 104, 100, 114];
const BOX_TYPE_BITS_PER_COMPONENT: BoxType = [98, 112, 99, 99];
const BOX_TYPE_COLOUR_SPECIFICATION: BoxType = [99, 111, 108, 114];
const BOX_TYPE_PALETTE: BoxType = [112, 99, 108, 114];
const BOX_TYPE_COMPONENT_MAPPING: BoxType = [99, 109, 97, 112];
const BOX_TYPE_CHANNEL_DEFINITION: BoxType = [99, 100, 101, 102];
const BOX_TYPE_RESOLUTION: BoxType = [114, 101, 115, 32];
const BOX_TYPE_CAPTURE_RESOLUTION: BoxType = [114, 101, 115, 99];
const BOX_TYPE_DEFAULT_DISPLAY_RESOLUTION: BoxType = [114, 101, 115, 100];
const BOX_TYPE_CONTIGUOUS_CODESTREAM: BoxType = [106, 112, 50, 99];
const BOX_TYPE_INTELLECTUAL_PROPERTY: BoxType = [106, 112, 50, 105];
const BOX_TYPE_XML: BoxType = [120, 109, 108, 32];
const BOX_TYPE_UUID: BoxType = [117, 117, 105, 100];
const BOX_TYPE_UUID_INFO: BoxType = [117, 105, 110, 102];
const BOX_TYPE_UUID_LIST: BoxType = [117, 108, 115, 116];
const BOX_TYPE_DATA_ENTRY_URL: BoxType = [117, 114, 108, 32];

// jp2\040
const BRAND_JP2: [u8; 4] = [106, 112, 50, 32];

// <CR><LF><0x87><LF> (0x0D0A 870A).
const SIGNATURE_MAGIC: [u8; 4] = [13, 10, 135, 10];

const SIGNATURE_BOX_LENGTH: u64 = 12;

/// Labels of the box types defined by ITU T.800 | ISO/IEC 15444-1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoxTypes {
    Signature,
    FileType,
    Header,
    ImageHeader,
    BitsPerComponent,
    ColourSpecification,
    Palette,
    ComponentMapping,
    ChannelDefinition,
    Resolution,
    CaptureResolution,
    DefaultDisplayResolution,
    ContiguousCodestream,
    IntellectualProperty,
    Xml,
    Uuid,
    UUIDInfo,
    UUIDList,
    DataEntryURL,
    Unknown,
}

impl fmt::Display for BoxTypes {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl BoxTypes {
    pub fn new(value: BoxType) -> BoxTypes {
        match value {
            BOX_TYPE_SIGNATURE => BoxTypes::Signature,
            BOX_TYPE_FILE_TYPE => BoxTypes::FileType,
            BOX_TYPE_HEADER => BoxTypes::Header,
            BOX_TYPE_IMAGE_HEADER => BoxTypes::ImageHeader,
            BOX_TYPE_BITS_PER_COMPONENT => BoxTypes::BitsPerComponent,
            BOX_TYPE_COLOUR_SPECIFICATION => BoxTypes::ColourSpecification,
            BOX_TYPE_PALETTE => BoxTypes::Palette,
            BOX_TYPE_COMPONENT_MAPPING => BoxTypes::ComponentMapping,
            BOX_TYPE_CHANNEL_DEFINITION => BoxTypes::ChannelDefinition,

            BOX_TYPE_RESOLUTION => BoxTypes::Resolution,
            BOX_TYPE_CAPTURE_RESOLUTION => BoxTypes::CaptureResolution,
            BOX_TYPE_DEFAULT_DISPLAY_RESOLUTION => BoxTypes::DefaultDisplayResolution,

            BOX_TYPE_CONTIGUOUS_CODESTREAM => BoxTypes::ContiguousCodestream,
            BOX_TYPE_INTELLECTUAL_PROPERTY => BoxTypes::IntellectualProperty,
            BOX_TYPE_XML => BoxTypes::Xml,

            BOX_TYPE_UUID => BoxTypes::Uuid,
            BOX_TYPE_UUID_INFO => BoxTypes::UUIDInfo,
            BOX_TYPE_UUID_LIST => BoxTypes::UUIDList,
            BOX_TYPE_DATA_ENTRY_URL => BoxTypes::DataEntryURL,
            _ => BoxTypes::Unknown,
        }
    }

    /// Boxes that contain nothing but other boxes.
    pub fn is_superbox(&self) -> bool {
        matches!(
            self,
            BoxTypes::Header | BoxTypes::Resolution | BoxTypes::UUIDInfo
        )
    }
}

pub type BoxType = [u8; 4];

/// JPEG 2000 box trait.
///
/// The building-block of the JP2 file format is called a box.
///
/// Implementors know their own offset and length. `decode` positions the reader
/// itself, so boxes can be decoded in any order once the box tree is known.
///
/// For more information, see ISO/IEC 15444-1 / ITU T-800 Appendix I.4.
pub trait JBox {
    fn identifier(&self) -> BoxType;
    fn length(&self) -> u64;
    fn offset(&self) -> u64;

    fn decode<R: io::Read + io::Seek>(
        &mut self,
        reader: &mut R,
    ) -> Result<(), Box<dyn error::Error>>;
}

/// JPEG 2000 Signature box.
///
/// The Signature box shall be the first box in the file. For file verification
/// purposes, this box can be considered a fixed-length 12-byte string which
/// shall have the value: 0x0000 000C 6A50 2020 0D0A 870A.
///
/// For more information, see ISO/IEC 15444-1 / ITU T-800 Appendix I.5.1.
#[derive(Debug, Default)]
pub struct SignatureBox {
    length: u64,
    offset: u64,
}

impl SignatureBox {
    pub fn signature(&self) -> [u8; 4] {
        SIGNATURE_MAGIC
    }
}

impl JBox for SignatureBox {
    // The type of the JPEG 2000 Signature box shall be ‘jP\040\040’ (0x6A50 2020)
    fn identifier(&self) -> BoxType {
        BOX_TYPE_SIGNATURE
    }

    fn length(&self) -> u64 {
        self.length
    }

    fn offset(&self) -> u64 {
        self.offset
    }

    // The contents of this box shall be the 4-byte character string ‘<CR><LF><0x87><LF>’ (0x0D0A 870A).
    fn decode<R: io::Read + io::Seek>(
        &mut self,
        reader: &mut R,
    ) -> Result<(), Box<dyn error::Error>> {
        reader.seek(io::SeekFrom::Start(self.offset + BOX_HEADER_LENGTH))?;

        let mut buffer = [0u8; 4];
        reader.read_exact(&mut buffer)?;

        if buffer != SIGNATURE_MAGIC {
            return Err(JP2Error::InvalidSignature {
                signature: buffer,
                offset: self.offset + BOX_HEADER_LENGTH,
            }
            .into());
        };

        Ok(())
    }
}

type CompatibilityList = Vec<[u8; 4]>;

/// File Type box.
///
/// The File Type box shall immediately follow the Signature box. It names the
/// standard that completely defines the file (the brand) and a list of readers
/// the file is compatible with.
///
/// For more information, see ISO/IEC 15444-1 / ITU T-800 Appendix I.5.2.
#[derive(Debug, Default)]
pub struct FileTypeBox {
    length: u64,
    offset: u64,
    brand: [u8; 4],
    min_version: [u8; 4],
    compatibility_list: CompatibilityList,
}

impl FileTypeBox {
    /// Brand.
    ///
    /// This field specifies the Recommendation | International Standard which
    /// completely defines this file.
    pub fn brand(&self) -> String {
        String::from_utf8_lossy(&self.brand).into_owned()
    }

    /// Minor version.
    pub fn min_version(&self) -> u32 {
        u32::from_be_bytes(self.min_version)
    }

    /// Compatibility list.
    pub fn compatibility_list(&self) -> Vec<String> {
        self.compatibility_list
            .iter()
            .map(|c| String::from_utf8_lossy(c).into_owned())
            .collect()
    }
}

impl JBox for FileTypeBox {
    // The type of the File Type Box shall be ‘ftyp’ (0x6674 7970).
    fn identifier(&self) -> BoxType {
        BOX_TYPE_FILE_TYPE
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
        if self.length < BOX_HEADER_LENGTH + 8 {
            return Err(JP2Error::BoxMalformed {
                box_type: BOX_TYPE_FILE_TYPE,
                offset: self.offset,
            }
            .into());
        }

        reader.seek(io::SeekFrom::Start(self.offset + BOX_HEADER_LENGTH))?;
        reader.read_exact(&mut self.brand)?;
        reader.read_exact(&mut self.min_version)?;
        debug!("Brand {:?}", self.brand());

        let mut buffer = [0u8; 4];

        // The number of CL fields is determined by the length of this box
        let mut size = (self.length - BOX_HEADER_LENGTH - 8) / 4;
        while size > 0 {
            reader.read_exact(&mut buffer)?;
            self.compatibility_list.push(buffer);
            size -= 1;
        }

        // A file shall contain the value ‘jp2\040’ in one of the CL fields in
        // the File Type box. The brand itself may name another standard.
        if !self.compatibility_list.contains(&BRAND_JP2) {
            return Err(JP2Error::NotCompatible {
                compatibility_list: self.compatibility_list(),
            }
            .into());
        }

        Ok(())
    }
}

/// Location of the data of a Contiguous Codestream box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodestreamRange {
    pub offset: u64,
    pub length: u64,
}

/// JP2 file.
///
/// The box tree of the file with the boxes needed to interpret the image
/// decoded: the image header, optional bits per component, the colour
/// specification in use and the location of every codestream.
#[derive(Debug)]
pub struct JP2File {
    length: u64,
    boxes: Vec<BoxNode>,
    file_type: FileTypeBox,
    image_header: ImageHeaderBox,
    bits_per_component: Option<BitsPerComponentBox>,
    colour_specification: ColourSpecificationBox,
    codestreams: Vec<CodestreamRange>,
    diagnostics: Diagnostics,
}

impl JP2File {
    pub fn length(&self) -> u64 {
        self.length
    }

    /// Top level boxes, superboxes hold their children.
    pub fn boxes(&self) -> &[BoxNode] {
        &self.boxes
    }

    pub fn file_type_box(&self) -> &FileTypeBox {
        &self.file_type
    }

    pub fn image_header_box(&self) -> &ImageHeaderBox {
        &self.image_header
    }

    pub fn bits_per_component_box(&self) -> Option<&BitsPerComponentBox> {
        self.bits_per_component.as_ref()
    }

    /// The first Colour Specification box in the JP2 Header box.
    pub fn colour_specification_box(&self) -> &ColourSpecificationBox {
        &self.colour_specification
    }

    pub fn colour_specification(&self) -> &ColourSpecification {
        self.colour_specification.specification()
    }

    /// Codestream locations, in file order.
    ///
    /// ITU-T T.800 | ISO/IEC 15444-1 readers use the first one only.
    pub fn codestreams(&self) -> &[CodestreamRange] {
        &self.codestreams
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Bit depth of every component, in codestream order.
    pub fn component_bit_depths(&self) -> Vec<BitDepth> {
        match (&self.bits_per_component, self.image_header.components_bits()) {
            (Some(bits_per_component), _) => bits_per_component.bits_per_component(),
            (None, Some(depth)) => vec![depth; self.image_header.components_num() as usize],
            (None, None) => vec![],
        }
    }
}

struct Header {
    image_header: ImageHeaderBox,
    bits_per_component: Option<BitsPerComponentBox>,
    colour_specification: ColourSpecificationBox,
}

fn decode_header<R: io::Read + io::Seek>(
    reader: &mut R,
    node: &BoxNode,
    diagnostics: &mut Diagnostics,
) -> Result<Header, Box<dyn error::Error>> {
    let mut children = node.children().iter();

    // The contents of the JP2 Header box shall start with an Image Header box.
    let image_header_node = match children.next() {
        Some(child) if child.header().box_type() == BOX_TYPE_IMAGE_HEADER => child,
        _ => {
            return Err(JP2Error::BoxMissing {
                box_type: BOX_TYPE_IMAGE_HEADER,
            }
            .into())
        }
    };
    let mut image_header = ImageHeaderBox::new(
        image_header_node.header().length(),
        image_header_node.header().offset(),
    );
    info!("ImageHeaderBox start at {:?}", image_header.offset);
    image_header.decode(reader)?;

    let mut bits_per_component: Option<BitsPerComponentBox> = None;
    let mut colour_specification: Option<ColourSpecificationBox> = None;

    for child in children {
        let header = child.header();
        match BoxTypes::new(header.box_type()) {
            BoxTypes::ImageHeader => {
                // Instances of Image Header box in other places in the file shall be ignored.
                diagnostics.push(Diagnostic::IgnoredImageHeader {
                    offset: header.offset(),
                });
            }
            BoxTypes::BitsPerComponent => {
                if bits_per_component.is_some() {
                    return Err(JP2Error::BoxDuplicate {
                        box_type: header.box_type(),
                        offset: header.offset(),
                    }
                    .into());
                }
                let mut bits_per_component_box =
                    BitsPerComponentBox::new(header.length(), header.offset());
                bits_per_component_box.decode(reader)?;
                bits_per_component = Some(bits_per_component_box);
            }
            BoxTypes::ColourSpecification => {
                if colour_specification.is_some() {
                    diagnostics.push(Diagnostic::IgnoredColourSpecification {
                        offset: header.offset(),
                    });
                    continue;
                }
                let mut colour_specification_box =
                    ColourSpecificationBox::new(header.length(), header.offset());
                colour_specification_box.decode(reader)?;
                diagnostics.extend(colour_specification_box.take_diagnostics());
                colour_specification = Some(colour_specification_box);
            }
            BoxTypes::Palette
            | BoxTypes::ComponentMapping
            | BoxTypes::ChannelDefinition
            | BoxTypes::Resolution => {
                debug!("Keeping {} undecoded", BoxTypes::new(header.box_type()));
            }
            BoxTypes::Unknown => diagnostics.push(Diagnostic::UnknownBox {
                box_type: header.box_type(),
                offset: header.offset(),
            }),
            _ => diagnostics.push(Diagnostic::MisplacedBox {
                box_type: header.box_type(),
                offset: header.offset(),
            }),
        }
    }

    let colour_specification = colour_specification.ok_or(JP2Error::BoxMissing {
        box_type: BOX_TYPE_COLOUR_SPECIFICATION,
    })?;

    if image_header.components_bits().is_none() && bits_per_component.is_none() {
        return Err(JP2Error::BoxMissing {
            box_type: BOX_TYPE_BITS_PER_COMPONENT,
        }
        .into());
    }

    Ok(Header {
        image_header,
        bits_per_component,
        colour_specification,
    })
}

fn decode_signature<R: io::Read + io::Seek>(
    reader: &mut R,
    length: u64,
) -> Result<BoxNode, Box<dyn error::Error>> {
    let mut prefix = [0u8; 8];
    if length < SIGNATURE_BOX_LENGTH {
        return Err(JP2Error::InvalidSignature {
            signature: [0u8; 4],
            offset: 0,
        }
        .into());
    }
    reader.seek(io::SeekFrom::Start(0))?;
    reader.read_exact(&mut prefix)?;

    let mut box_type: BoxType = [0u8; 4];
    box_type.copy_from_slice(&prefix[4..]);
    if u32::from_be_bytes([prefix[0], prefix[1], prefix[2], prefix[3]]) as u64
        != SIGNATURE_BOX_LENGTH
        || box_type != BOX_TYPE_SIGNATURE
    {
        return Err(JP2Error::InvalidSignature {
            signature: box_type,
            offset: 0,
        }
        .into());
    }

    let mut signature_box = SignatureBox {
        length: SIGNATURE_BOX_LENGTH,
        offset: 0,
    };
    info!("SignatureBox start at {:?}", signature_box.offset);
    signature_box.decode(reader)?;
    info!("SignatureBox finish at {:?}", reader.stream_position()?);

    BoxNode::read(
        reader,
        BoxHeader::new(BOX_TYPE_SIGNATURE, 0, SIGNATURE_BOX_LENGTH),
    )
}

/// Read a JP2 file.
///
/// The Signature box and the File Type box must come first. Then the top level
/// boxes are walked: there must be exactly one JP2 Header box, before any
/// Contiguous Codestream box, and at least one Contiguous Codestream box.
pub fn decode_jp2<R: io::Read + io::Seek>(
    reader: &mut R,
) -> Result<JP2File, Box<dyn error::Error>> {
    let length = source_length(reader)?;
    let mut diagnostics = Diagnostics::default();
    let mut boxes = vec![decode_signature(reader, length)?];

    // The File Type box shall immediately follow the Signature box
    let file_type_header = BoxHeader::read(reader, SIGNATURE_BOX_LENGTH, length)?;
    if file_type_header.box_type() != BOX_TYPE_FILE_TYPE {
        return Err(JP2Error::BoxUnexpected {
            box_type: file_type_header.box_type(),
            offset: file_type_header.offset(),
        }
        .into());
    }
    let mut file_type = FileTypeBox {
        length: file_type_header.length(),
        offset: file_type_header.offset(),
        ..Default::default()
    };
    info!("FileTypeBox start at {:?}", file_type.offset);
    file_type.decode(reader)?;
    info!("FileTypeBox finish at {:?}", reader.stream_position()?);
    boxes.push(BoxNode::read(reader, file_type_header)?);

    let mut header: Option<Header> = None;
    let mut codestreams: Vec<CodestreamRange> = vec![];
    let mut offset = file_type_header.box_end();

    while offset < length {
        if length - offset < BOX_HEADER_LENGTH {
            return Err(JP2Error::BoxMalformed {
                box_type: [0u8; 4],
                offset,
            }
            .into());
        }

        let box_header = BoxHeader::read(reader, offset, length)?;
        let node = BoxNode::read(reader, box_header)?;
        offset = box_header.box_end();

        match BoxTypes::new(box_header.box_type()) {
            BoxTypes::Header => {
                if header.is_some() {
                    return Err(JP2Error::BoxDuplicate {
                        box_type: box_header.box_type(),
                        offset: box_header.offset(),
                    }
                    .into());
                }
                info!("HeaderSuperBox start at {:?}", box_header.offset());
                header = Some(decode_header(reader, &node, &mut diagnostics)?);
                info!("HeaderSuperBox finish at {:?}", box_header.box_end());
            }
            BoxTypes::ContiguousCodestream => {
                // The JP2 Header box shall be found before the codestream.
                if header.is_none() {
                    return Err(JP2Error::BoxUnexpected {
                        box_type: box_header.box_type(),
                        offset: box_header.offset(),
                    }
                    .into());
                }
                info!(
                    "ContiguousCodestreamBox at {:?} length {:?}",
                    box_header.data_start(),
                    box_header.data_length()
                );
                codestreams.push(CodestreamRange {
                    offset: box_header.data_start(),
                    length: box_header.data_length(),
                });
            }
            BoxTypes::Signature | BoxTypes::FileType => {
                return Err(JP2Error::BoxDuplicate {
                    box_type: box_header.box_type(),
                    offset: box_header.offset(),
                }
                .into());
            }
            BoxTypes::IntellectualProperty
            | BoxTypes::Xml
            | BoxTypes::Uuid
            | BoxTypes::UUIDInfo => {
                debug!("Keeping {} undecoded", BoxTypes::new(box_header.box_type()));
            }
            BoxTypes::Unknown => diagnostics.push(Diagnostic::UnknownBox {
                box_type: box_header.box_type(),
                offset: box_header.offset(),
            }),
            _ => diagnostics.push(Diagnostic::MisplacedBox {
                box_type: box_header.box_type(),
                offset: box_header.offset(),
            }),
        }

        boxes.push(node);
    }

    let Header {
        image_header,
        bits_per_component,
        colour_specification,
    } = header.ok_or(JP2Error::BoxMissing {
        box_type: BOX_TYPE_HEADER,
    })?;

    if codestreams.is_empty() {
        return Err(JP2Error::BoxMissing {
            box_type: BOX_TYPE_CONTIGUOUS_CODESTREAM,
        }
        .into());
    }

    Ok(JP2File {
        length,
        boxes,
        file_type,
        image_header,
        bits_per_component,
        colour_specification,
        codestreams,
        diagnostics,
    })
}
