//! Helpers to assemble restricted ICC profiles.

use icc::{
    CurveType, IccProfile, IccProfileHeader, Tag, TagTable, XyzNumber, XyzType, TAG_BLUE_COLORANT,
    TAG_BLUE_TRC, TAG_GRAY_TRC, TAG_GREEN_COLORANT, TAG_GREEN_TRC, TAG_MEDIA_WHITE_POINT,
    TAG_RED_COLORANT, TAG_RED_TRC,
};

pub fn init_logger() {
    let _ = env_logger::builder()
        .is_test(true)
        .filter_level(log::LevelFilter::Debug)
        .try_init();
}

pub fn d50() -> XyzNumber {
    XyzNumber::new(0xF6D6, 0x1_0000, 0xD32D)
}

/// Monochrome input profile with the given gray curve.
pub fn monochrome_profile(gray_trc: CurveType) -> Vec<u8> {
    let mut header = IccProfileHeader::default();
    header.set_colour_space(*b"GRAY");

    let mut tags = TagTable::new();
    tags.insert(TAG_MEDIA_WHITE_POINT, Tag::Xyz(XyzType::new(vec![d50()])));
    tags.insert(TAG_GRAY_TRC, Tag::Curve(gray_trc));
    IccProfile::new(header, tags).encode()
}

/// Three-component matrix profile with sRGB primaries and the given curve on
/// every channel.
pub fn matrix_profile(trc: CurveType) -> Vec<u8> {
    let mut tags = TagTable::new();
    tags.insert(TAG_MEDIA_WHITE_POINT, Tag::Xyz(XyzType::new(vec![d50()])));
    for (curve, colorant, xyz) in [
        (
            TAG_RED_TRC,
            TAG_RED_COLORANT,
            XyzNumber::from_f64(0.4361, 0.2225, 0.0139),
        ),
        (
            TAG_GREEN_TRC,
            TAG_GREEN_COLORANT,
            XyzNumber::from_f64(0.3851, 0.7169, 0.0971),
        ),
        (
            TAG_BLUE_TRC,
            TAG_BLUE_COLORANT,
            XyzNumber::from_f64(0.1431, 0.0606, 0.7141),
        ),
    ] {
        tags.insert(curve, Tag::Curve(trc.clone()));
        tags.insert(colorant, Tag::Xyz(XyzType::new(vec![xyz])));
    }
    IccProfile::new(IccProfileHeader::default(), tags).encode()
}
