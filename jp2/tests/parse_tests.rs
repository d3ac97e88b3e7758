use std::io::Cursor;

use jp2::{
    decode_jp2, BitDepth, ColourSpecification, ColourSpecificationMethod, Diagnostic,
    EnumeratedColourSpace, JP2Error, JP2File,
};

mod shared;
use shared::{boxed, enumerated_colour, image_header, Jp2Builder};

struct ExpectedConfiguration {
    compatibility_list: Vec<String>,
    width: u32,
    height: u32,
    num_components: u16,
    bit_depths: Vec<BitDepth>,
    colour_specification_method: ColourSpecificationMethod,
    codestreams: usize,
}

fn test_jp2_file(input: Vec<u8>, expected: ExpectedConfiguration) -> JP2File {
    let file = decode_jp2(&mut Cursor::new(input)).unwrap();

    assert_eq!(
        file.file_type_box().compatibility_list(),
        expected.compatibility_list
    );
    let image_header_box = file.image_header_box();
    assert_eq!(image_header_box.width(), expected.width);
    assert_eq!(image_header_box.height(), expected.height);
    assert_eq!(image_header_box.components_num(), expected.num_components);
    assert_eq!(file.component_bit_depths(), expected.bit_depths);
    assert_eq!(
        file.colour_specification_box().method(),
        expected.colour_specification_method
    );
    assert_eq!(file.codestreams().len(), expected.codestreams);

    file
}

#[test]
fn test_srgb_file() {
    let input = Jp2Builder::new()
        .header_box(image_header(64, 128, 3, 15))
        .header_box(enumerated_colour(16))
        .top_level_box(boxed(b"jp2c", &[0xFF, 0x4F, 0xFF, 0x51]))
        .build();

    let file = test_jp2_file(
        input,
        ExpectedConfiguration {
            compatibility_list: vec!["jp2 ".into()],
            width: 64,
            height: 128,
            num_components: 3,
            bit_depths: vec![BitDepth::new(15); 3],
            colour_specification_method: ColourSpecificationMethod::Enumerated,
            codestreams: 1,
        },
    );

    assert_eq!(
        *file.colour_specification(),
        ColourSpecification::Enumerated(EnumeratedColourSpace::sRGB)
    );
    assert!(file.diagnostics().is_empty());
}

#[test]
fn test_varying_bit_depths() {
    let input = Jp2Builder::new()
        .compatibility_list(vec![[0, 0, 0, 1], *b"jp2 "])
        .header_box(image_header(8, 8, 2, 255))
        .header_box(boxed(b"bpcc", &[7, 0x8F]))
        .header_box(enumerated_colour(17))
        .top_level_box(boxed(b"jp2c", &[0xFF, 0x4F]))
        .top_level_box(boxed(b"jp2c", &[0xFF, 0x4F]))
        .build();

    let file = test_jp2_file(
        input,
        ExpectedConfiguration {
            compatibility_list: vec!["\0\0\0\u{1}".into(), "jp2 ".into()],
            width: 8,
            height: 8,
            num_components: 2,
            bit_depths: vec![BitDepth::new(7), BitDepth::new(0x8F)],
            colour_specification_method: ColourSpecificationMethod::Enumerated,
            codestreams: 2,
        },
    );
    assert!(file.bits_per_component_box().is_some());
}

#[test]
fn test_varying_bit_depths_needs_bpcc() {
    let input = Jp2Builder::new()
        .header_box(image_header(8, 8, 2, 255))
        .header_box(enumerated_colour(17))
        .top_level_box(boxed(b"jp2c", &[0xFF, 0x4F]))
        .build();

    let err = decode_jp2(&mut Cursor::new(input)).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<JP2Error>(),
        Some(JP2Error::BoxMissing { box_type }) if box_type == b"bpcc"
    ));
}

#[test]
fn test_icc_profiled_file() {
    let mut profile = 16u32.to_be_bytes().to_vec();
    profile.extend_from_slice(&[1u8; 12]);
    let mut colr = vec![2, 0, 0];
    colr.extend_from_slice(&profile);

    let input = Jp2Builder::new()
        .header_box(image_header(1, 1, 1, 7))
        .header_box(boxed(b"colr", &colr))
        .top_level_box(boxed(b"jp2c", &[0xFF, 0x4F]))
        .build();

    let file = test_jp2_file(
        input,
        ExpectedConfiguration {
            compatibility_list: vec!["jp2 ".into()],
            width: 1,
            height: 1,
            num_components: 1,
            bit_depths: vec![BitDepth::new(7)],
            colour_specification_method: ColourSpecificationMethod::IccProfiled,
            codestreams: 1,
        },
    );
    assert_eq!(
        *file.colour_specification(),
        ColourSpecification::IccProfiled(profile)
    );
}

#[test]
fn test_second_colour_specification_is_ignored() {
    let input = Jp2Builder::new()
        .header_box(image_header(1, 1, 3, 7))
        .header_box(enumerated_colour(18))
        .header_box(enumerated_colour(16))
        .top_level_box(boxed(b"jp2c", &[0xFF, 0x4F]))
        .build();

    let file = decode_jp2(&mut Cursor::new(input)).unwrap();
    assert_eq!(
        *file.colour_specification(),
        ColourSpecification::Enumerated(EnumeratedColourSpace::sYCC)
    );
    assert!(matches!(
        file.diagnostics().entries(),
        [Diagnostic::IgnoredColourSpecification { .. }]
    ));
}

#[test]
fn test_unsupported_colourspace_is_kept_as_unknown() {
    let input = Jp2Builder::new()
        .header_box(image_header(1, 1, 3, 7))
        .header_box(enumerated_colour(14))
        .top_level_box(boxed(b"jp2c", &[0xFF, 0x4F]))
        .build();

    let file = decode_jp2(&mut Cursor::new(input)).unwrap();
    assert_eq!(
        *file.colour_specification(),
        ColourSpecification::Enumerated(EnumeratedColourSpace::Unknown)
    );
    assert!(matches!(
        file.diagnostics().entries(),
        [Diagnostic::UnsupportedColourSpace { name: "CIELab", code: 14, .. }]
    ));
}

#[test]
fn test_bad_colour_method_fails_file() {
    let input = Jp2Builder::new()
        .header_box(image_header(1, 1, 3, 7))
        .header_box(boxed(b"colr", &[3, 0, 0, 0, 0, 0, 16]))
        .top_level_box(boxed(b"jp2c", &[0xFF, 0x4F]))
        .build();

    let err = decode_jp2(&mut Cursor::new(input)).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<JP2Error>(),
        Some(JP2Error::BadSpecificationMethod { method: 3, .. })
    ));
}

#[test]
fn test_header_must_start_with_image_header() {
    let input = Jp2Builder::new()
        .header_box(enumerated_colour(16))
        .header_box(image_header(1, 1, 3, 7))
        .top_level_box(boxed(b"jp2c", &[0xFF, 0x4F]))
        .build();

    let err = decode_jp2(&mut Cursor::new(input)).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<JP2Error>(),
        Some(JP2Error::BoxMissing { box_type }) if box_type == b"ihdr"
    ));
}

#[test]
fn test_trailing_codestream_of_unknown_length() {
    let mut input = Jp2Builder::new()
        .header_box(image_header(1, 1, 1, 7))
        .header_box(enumerated_colour(17))
        .top_level_box(boxed(b"xml ", b"<x/>"))
        .build();
    let codestream_offset = input.len() as u64 + 8;
    input.extend_from_slice(&[0, 0, 0, 0]);
    input.extend_from_slice(b"jp2c");
    input.extend_from_slice(&[0xFF, 0x4F, 0xFF, 0x51, 0xFF, 0xD9]);

    let file = decode_jp2(&mut Cursor::new(input)).unwrap();
    assert_eq!(file.codestreams()[0].offset, codestream_offset);
    assert_eq!(file.codestreams()[0].length, 6);
    assert_eq!(file.boxes().len(), 5);
}
