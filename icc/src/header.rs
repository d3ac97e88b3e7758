//! The 128-byte ICC profile header.
//!
//! See ISO 15076-1 clause 7.2. All fields are big endian.

use log::debug;

use crate::{be_i32, be_u16, be_u32, signature_at, IccError, Signature};

pub const ICC_HEADER_LENGTH: usize = 128;

/// Profile file signature, ‘acsp’.
pub const PROFILE_SIGNATURE: Signature = *b"acsp";

/// Input device profile class, ‘scnr’.
pub const PROFILE_CLASS_INPUT: Signature = *b"scnr";

/// Display device profile class, ‘mntr’.
pub const PROFILE_CLASS_DISPLAY: Signature = *b"mntr";

/// nCIEXYZ profile connection space, ‘XYZ ’.
pub const PROFILE_CONNECTION_SPACE_XYZ: Signature = *b"XYZ ";

const OFFSET_SIZE: usize = 0;
const OFFSET_CMM_TYPE: usize = 4;
const OFFSET_VERSION: usize = 8;
const OFFSET_CLASS: usize = 12;
const OFFSET_COLOUR_SPACE: usize = 16;
const OFFSET_PCS: usize = 20;
const OFFSET_DATE_TIME: usize = 24;
const OFFSET_SIGNATURE: usize = 36;
const OFFSET_PLATFORM: usize = 40;
const OFFSET_FLAGS: usize = 44;
const OFFSET_MANUFACTURER: usize = 48;
const OFFSET_MODEL: usize = 52;
const OFFSET_ATTRIBUTES: usize = 56;
const OFFSET_RENDERING_INTENT: usize = 64;
const OFFSET_ILLUMINANT: usize = 68;
const OFFSET_CREATOR: usize = 80;
const OFFSET_RESERVED: usize = 84;
const RESERVED_LENGTH: usize = 44;

/// Profile version, major and minor revision plus two reserved bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IccProfileVersion {
    pub major: u8,
    pub minor: u8,
    pub reserved: [u8; 2],
}

/// Creation date and time of the profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IccDateTime {
    pub year: u16,
    pub month: u16,
    pub day: u16,
    pub hours: u16,
    pub minutes: u16,
    pub seconds: u16,
}

/// An XYZ triple in s15Fixed16Number form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct XyzNumber {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl XyzNumber {
    pub const LENGTH: usize = 12;

    pub fn new(x: i32, y: i32, z: i32) -> XyzNumber {
        XyzNumber { x, y, z }
    }

    /// From floating point components, rounded to the nearest 1/65536.
    pub fn from_f64(x: f64, y: f64, z: f64) -> XyzNumber {
        XyzNumber {
            x: double_to_xyz(x),
            y: double_to_xyz(y),
            z: double_to_xyz(z),
        }
    }

    pub(crate) fn read(data: &[u8], offset: usize) -> XyzNumber {
        XyzNumber {
            x: be_i32(data, offset),
            y: be_i32(data, offset + 4),
            z: be_i32(data, offset + 8),
        }
    }

    pub(crate) fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.x.to_be_bytes());
        out.extend_from_slice(&self.y.to_be_bytes());
        out.extend_from_slice(&self.z.to_be_bytes());
    }

    pub fn x_f64(&self) -> f64 {
        xyz_to_double(self.x)
    }

    pub fn y_f64(&self) -> f64 {
        xyz_to_double(self.y)
    }

    pub fn z_f64(&self) -> f64 {
        xyz_to_double(self.z)
    }
}

/// s15Fixed16Number to double.
pub fn xyz_to_double(value: i32) -> f64 {
    value as f64 / 65536.0
}

/// Double to s15Fixed16Number.
pub fn double_to_xyz(value: f64) -> i32 {
    (value * 65536.0 + 0.5).floor() as i32
}

/// ICC profile header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IccProfileHeader {
    size: u32,
    cmm_type: Signature,
    version: IccProfileVersion,
    profile_class: Signature,
    colour_space: Signature,
    pcs: Signature,
    date_time: IccDateTime,
    signature: Signature,
    platform: Signature,
    flags: u32,
    manufacturer: Signature,
    model: Signature,
    attributes: [u32; 2],
    rendering_intent: u32,
    illuminant: XyzNumber,
    creator: Signature,
    reserved: [u8; RESERVED_LENGTH],
}

impl Default for IccProfileHeader {
    fn default() -> Self {
        IccProfileHeader {
            size: ICC_HEADER_LENGTH as u32,
            cmm_type: [0; 4],
            version: IccProfileVersion {
                major: 2,
                minor: 0x20,
                reserved: [0; 2],
            },
            profile_class: PROFILE_CLASS_INPUT,
            colour_space: *b"RGB ",
            pcs: PROFILE_CONNECTION_SPACE_XYZ,
            date_time: IccDateTime::default(),
            signature: PROFILE_SIGNATURE,
            platform: [0; 4],
            flags: 0,
            manufacturer: [0; 4],
            model: [0; 4],
            attributes: [0; 2],
            rendering_intent: 0,
            // D50
            illuminant: XyzNumber::new(0xF6D6, 0x1_0000, 0xD32D),
            creator: [0; 4],
            reserved: [0; RESERVED_LENGTH],
        }
    }
}

impl IccProfileHeader {
    /// Decode the header at the start of `data`.
    ///
    /// Fails if fewer than 128 bytes are available or the profile file
    /// signature is not ‘acsp’.
    pub fn decode(data: &[u8]) -> Result<IccProfileHeader, IccError> {
        if data.len() < ICC_HEADER_LENGTH {
            return Err(IccError::Truncated {
                expected: ICC_HEADER_LENGTH,
                available: data.len(),
            });
        }

        let signature = signature_at(data, OFFSET_SIGNATURE);
        if signature != PROFILE_SIGNATURE {
            return Err(IccError::InvalidSignature { signature });
        }

        let mut reserved = [0u8; RESERVED_LENGTH];
        reserved.copy_from_slice(&data[OFFSET_RESERVED..OFFSET_RESERVED + RESERVED_LENGTH]);

        let header = IccProfileHeader {
            size: be_u32(data, OFFSET_SIZE),
            cmm_type: signature_at(data, OFFSET_CMM_TYPE),
            version: IccProfileVersion {
                major: data[OFFSET_VERSION],
                minor: data[OFFSET_VERSION + 1],
                reserved: [data[OFFSET_VERSION + 2], data[OFFSET_VERSION + 3]],
            },
            profile_class: signature_at(data, OFFSET_CLASS),
            colour_space: signature_at(data, OFFSET_COLOUR_SPACE),
            pcs: signature_at(data, OFFSET_PCS),
            date_time: IccDateTime {
                year: be_u16(data, OFFSET_DATE_TIME),
                month: be_u16(data, OFFSET_DATE_TIME + 2),
                day: be_u16(data, OFFSET_DATE_TIME + 4),
                hours: be_u16(data, OFFSET_DATE_TIME + 6),
                minutes: be_u16(data, OFFSET_DATE_TIME + 8),
                seconds: be_u16(data, OFFSET_DATE_TIME + 10),
            },
            signature,
            platform: signature_at(data, OFFSET_PLATFORM),
            flags: be_u32(data, OFFSET_FLAGS),
            manufacturer: signature_at(data, OFFSET_MANUFACTURER),
            model: signature_at(data, OFFSET_MODEL),
            attributes: [
                be_u32(data, OFFSET_ATTRIBUTES),
                be_u32(data, OFFSET_ATTRIBUTES + 4),
            ],
            rendering_intent: be_u32(data, OFFSET_RENDERING_INTENT),
            illuminant: XyzNumber::read(data, OFFSET_ILLUMINANT),
            creator: signature_at(data, OFFSET_CREATOR),
            reserved,
        };

        debug!(
            "ICC profile size {} class {:?} colour space {:?} version {}.{}",
            header.size,
            String::from_utf8_lossy(&header.profile_class),
            String::from_utf8_lossy(&header.colour_space),
            header.version.major,
            header.version.minor
        );

        Ok(header)
    }

    /// Encode the header, the fields are written in the order they are decoded.
    pub fn encode(&self) -> [u8; ICC_HEADER_LENGTH] {
        let mut out = Vec::with_capacity(ICC_HEADER_LENGTH);
        out.extend_from_slice(&self.size.to_be_bytes());
        out.extend_from_slice(&self.cmm_type);
        out.extend_from_slice(&[
            self.version.major,
            self.version.minor,
            self.version.reserved[0],
            self.version.reserved[1],
        ]);
        out.extend_from_slice(&self.profile_class);
        out.extend_from_slice(&self.colour_space);
        out.extend_from_slice(&self.pcs);
        for value in [
            self.date_time.year,
            self.date_time.month,
            self.date_time.day,
            self.date_time.hours,
            self.date_time.minutes,
            self.date_time.seconds,
        ] {
            out.extend_from_slice(&value.to_be_bytes());
        }
        out.extend_from_slice(&self.signature);
        out.extend_from_slice(&self.platform);
        out.extend_from_slice(&self.flags.to_be_bytes());
        out.extend_from_slice(&self.manufacturer);
        out.extend_from_slice(&self.model);
        out.extend_from_slice(&self.attributes[0].to_be_bytes());
        out.extend_from_slice(&self.attributes[1].to_be_bytes());
        out.extend_from_slice(&self.rendering_intent.to_be_bytes());
        self.illuminant.write(&mut out);
        out.extend_from_slice(&self.creator);
        out.extend_from_slice(&self.reserved);

        let mut header = [0u8; ICC_HEADER_LENGTH];
        header.copy_from_slice(&out);
        header
    }

    /// Declared size of the whole profile in bytes.
    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn set_size(&mut self, size: u32) {
        self.size = size;
    }

    pub fn cmm_type(&self) -> Signature {
        self.cmm_type
    }

    pub fn version(&self) -> IccProfileVersion {
        self.version
    }

    /// Profile/device class, ‘scnr’ for input profiles.
    pub fn profile_class(&self) -> Signature {
        self.profile_class
    }

    pub fn set_profile_class(&mut self, class: Signature) {
        self.profile_class = class;
    }

    /// Colour space of the data, ‘GRAY’ or ‘RGB ’ for restricted profiles.
    pub fn colour_space(&self) -> Signature {
        self.colour_space
    }

    pub fn set_colour_space(&mut self, colour_space: Signature) {
        self.colour_space = colour_space;
    }

    /// Profile connection space.
    pub fn pcs(&self) -> Signature {
        self.pcs
    }

    pub fn set_pcs(&mut self, pcs: Signature) {
        self.pcs = pcs;
    }

    pub fn date_time(&self) -> IccDateTime {
        self.date_time
    }

    pub fn set_date_time(&mut self, date_time: IccDateTime) {
        self.date_time = date_time;
    }

    pub fn signature(&self) -> Signature {
        self.signature
    }

    pub fn platform(&self) -> Signature {
        self.platform
    }

    pub fn flags(&self) -> u32 {
        self.flags
    }

    pub fn manufacturer(&self) -> Signature {
        self.manufacturer
    }

    pub fn model(&self) -> Signature {
        self.model
    }

    pub fn attributes(&self) -> [u32; 2] {
        self.attributes
    }

    pub fn rendering_intent(&self) -> u32 {
        self.rendering_intent
    }

    /// nCIEXYZ of the PCS illuminant.
    pub fn illuminant(&self) -> XyzNumber {
        self.illuminant
    }

    pub fn creator(&self) -> Signature {
        self.creator
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_header() -> IccProfileHeader {
        let mut header = IccProfileHeader::default();
        header.set_size(512);
        header.set_colour_space(*b"GRAY");
        header.set_date_time(IccDateTime {
            year: 2001,
            month: 4,
            day: 17,
            hours: 13,
            minutes: 5,
            seconds: 59,
        });
        header
    }

    #[test]
    fn test_header_layout() {
        let encoded = sample_header().encode();
        assert_eq!(&encoded[0..4], &[0, 0, 2, 0]);
        assert_eq!(&encoded[8..10], &[2, 0x20]);
        assert_eq!(&encoded[12..16], b"scnr");
        assert_eq!(&encoded[16..20], b"GRAY");
        assert_eq!(&encoded[20..24], b"XYZ ");
        assert_eq!(&encoded[24..26], &2001u16.to_be_bytes());
        assert_eq!(&encoded[34..36], &59u16.to_be_bytes());
        assert_eq!(&encoded[36..40], b"acsp");
        assert_eq!(&encoded[68..72], &0xF6D6i32.to_be_bytes());
        assert!(encoded[84..].iter().all(|byte| *byte == 0));
    }

    #[test]
    fn test_header_decode_fields() {
        let decoded = IccProfileHeader::decode(&sample_header().encode()).unwrap();
        assert_eq!(decoded, sample_header());
        assert_eq!(decoded.date_time().day, 17);
        assert_eq!(decoded.version().minor, 0x20);
        assert!((decoded.illuminant().x_f64() - 0.9642).abs() < 1e-4);
    }

    #[test]
    fn test_header_bad_signature() {
        let mut encoded = sample_header().encode();
        encoded[36..40].copy_from_slice(b"acsq");
        assert_eq!(
            IccProfileHeader::decode(&encoded),
            Err(IccError::InvalidSignature {
                signature: *b"acsq"
            })
        );
    }

    #[test]
    fn test_header_truncated() {
        let encoded = sample_header().encode();
        assert_eq!(
            IccProfileHeader::decode(&encoded[..100]),
            Err(IccError::Truncated {
                expected: 128,
                available: 100
            })
        );
    }

    #[test]
    fn test_xyz_conversions() {
        assert_eq!(xyz_to_double(0x1_0000), 1.0);
        assert_eq!(xyz_to_double(-0x8000), -0.5);
        assert_eq!(double_to_xyz(0.25), 0x4000);
        let xyz = XyzNumber::from_f64(0.4361, 0.2225, 0.0139);
        assert!((xyz.y_f64() - 0.2225).abs() < 1.0 / 65536.0);
    }
}
