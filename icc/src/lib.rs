#![allow(dead_code)]

//! ICC profiles embedded in JP2 files.
//!
//! A JP2 Colour Specification box using the restricted ICC method carries a
//! Monochrome Input or a Three-Component Matrix-Based Input profile (ISO 15076-1),
//! with XYZ as profile connection space. Such a profile is fully described by its
//! tone reproduction curves and, for three components, its colorants.
//!
//! This crate reads and writes those profiles (`IccProfile`), reduces them to
//! their restricted form (`RestrictedIccProfile`) and builds the lookup tables
//! and transforms that map decoded samples to sRGB.
//!
//! See ITU-T T.800(V4) | ISO/IEC 15444-1:2024 J.8 for how a restricted profile is
//! applied without a colour management engine.

use std::error;
use std::fmt;

mod header;
mod lut;
mod profile;
mod tags;
mod transform;

pub use header::{
    IccDateTime, IccProfileHeader, IccProfileVersion, XyzNumber, ICC_HEADER_LENGTH,
    PROFILE_CLASS_DISPLAY, PROFILE_CLASS_INPUT, PROFILE_CONNECTION_SPACE_XYZ,
    PROFILE_SIGNATURE,
};
pub use lut::{
    monochrome_srgb_table, LookUpTable32Gamma, LookUpTable32Interp,
    LookUpTable32LinearSrgbToSrgb, LookUpTableFp, SrgbCurve, SRGB_CURVE,
};
pub use profile::{IccProfile, RestrictedIccProfile};
pub use tags::{
    CurveType, Tag, TagTable, XyzType, TAG_BLUE_COLORANT, TAG_BLUE_TRC, TAG_COPYRIGHT,
    TAG_DESCRIPTION, TAG_GRAY_TRC, TAG_GREEN_COLORANT, TAG_GREEN_TRC, TAG_MEDIA_WHITE_POINT,
    TAG_RED_COLORANT, TAG_RED_TRC, TYPE_CURVE, TYPE_XYZ,
};
pub use transform::{MatrixBasedTransformTosRgb, MonochromeTransformTosRgb};

/// Four character code used for tags, types and header fields.
pub type Signature = [u8; 4];

/// Error values that may be returned from ICC functions.
#[derive(Debug, PartialEq)]
pub enum IccError {
    /// The profile file signature was not ‘acsp’.
    InvalidSignature { signature: Signature },

    /// The data ends before the profile or one of its structures does.
    Truncated { expected: usize, available: usize },

    /// A tag table entry points outside the profile.
    TagOutOfBounds {
        tag: Signature,
        offset: u32,
        count: u32,
    },

    /// A tag is malformed for its declared type.
    TagMalformed { tag: Signature },

    /// Only input and display profiles are valid in a JP2 file.
    InvalidProfileClass { class: Signature },

    /// The profile connection space must be XYZ.
    InvalidPcs { pcs: Signature },

    /// Neither a gray nor a red tone reproduction curve is present.
    MissingCurveData,

    /// A required tag is absent.
    MissingTag { tag: Signature },

    /// A tag does not have the type its signature requires.
    WrongTagType { tag: Signature, found: Signature },

    /// The restricted profile is not of the kind the transform needs.
    WrongProfileType,
}

impl error::Error for IccError {}
impl fmt::Display for IccError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::InvalidSignature { signature } => {
                write!(
                    f,
                    "invalid profile signature {:?}",
                    String::from_utf8_lossy(signature)
                )
            }
            Self::Truncated {
                expected,
                available,
            } => {
                write!(
                    f,
                    "profile truncated, {} bytes needed but {} available",
                    expected, available
                )
            }
            Self::TagOutOfBounds { tag, offset, count } => {
                write!(
                    f,
                    "tag {:?} at offset {} with {} bytes lies outside the profile",
                    String::from_utf8_lossy(tag),
                    offset,
                    count
                )
            }
            Self::TagMalformed { tag } => {
                write!(f, "malformed tag {:?}", String::from_utf8_lossy(tag))
            }
            Self::InvalidProfileClass { class } => {
                write!(
                    f,
                    "profile class {:?} is neither input nor display",
                    String::from_utf8_lossy(class)
                )
            }
            Self::InvalidPcs { pcs } => {
                write!(
                    f,
                    "profile connection space {:?} is not XYZ",
                    String::from_utf8_lossy(pcs)
                )
            }
            Self::MissingCurveData => write!(f, "curve data not found in profile"),
            Self::MissingTag { tag } => {
                write!(f, "tag {:?} missing", String::from_utf8_lossy(tag))
            }
            Self::WrongTagType { tag, found } => {
                write!(
                    f,
                    "tag {:?} has unexpected type {:?}",
                    String::from_utf8_lossy(tag),
                    String::from_utf8_lossy(found)
                )
            }
            Self::WrongProfileType => write!(f, "wrong type of restricted profile supplied"),
        }
    }
}

// All multi-byte ICC values are big endian.

pub(crate) fn be_u16(data: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([data[offset], data[offset + 1]])
}

pub(crate) fn be_u32(data: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

pub(crate) fn be_i32(data: &[u8], offset: usize) -> i32 {
    be_u32(data, offset) as i32
}

pub(crate) fn signature_at(data: &[u8], offset: usize) -> Signature {
    [
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ]
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub fn init_logger() {
        let _ = env_logger::builder()
            .is_test(true)
            .filter_level(log::LevelFilter::Debug)
            .try_init();
    }

    #[test]
    fn test_big_endian_readers() {
        let data = [0x12, 0x34, 0x56, 0x78, 0xFF, 0xFF, 0xFF, 0xFE];
        assert_eq!(be_u16(&data, 0), 0x1234);
        assert_eq!(be_u32(&data, 0), 0x1234_5678);
        assert_eq!(be_i32(&data, 4), -2);
        assert_eq!(signature_at(&data, 2), [0x56, 0x78, 0xFF, 0xFF]);
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            IccError::MissingCurveData.to_string(),
            "curve data not found in profile"
        );
        assert_eq!(
            IccError::InvalidPcs { pcs: *b"Lab " }.to_string(),
            "profile connection space \"Lab \" is not XYZ"
        );
    }
}
