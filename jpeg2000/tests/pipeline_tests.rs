use std::io::Cursor;

use icc::CurveType;
use jp2::decode_jp2;
use jpeg2000::{colour_transform, component_info, ColourError, ComponentInfo, ComponentSamples};

use shared::{
    enumerated, icc_profiled, init_logger, jp2_file, jp2_file_with_depth, matrix_profile,
    monochrome_profile,
};

fn transform_for(input: Vec<u8>) -> Result<jpeg2000::ColourTransform, ColourError> {
    let file = decode_jp2(&mut Cursor::new(input)).unwrap();
    colour_transform(&file)
}

#[test]
fn test_component_info_from_file() {
    init_logger();

    let file = decode_jp2(&mut Cursor::new(jp2_file(3, 12, &enumerated(16)))).unwrap();
    assert_eq!(component_info(&file), vec![ComponentInfo::new(12, 0, false); 3]);
}

#[test]
fn test_srgb_is_identity() {
    let transform = transform_for(jp2_file(3, 8, &enumerated(16))).unwrap();
    assert!(transform.is_identity());
}

#[test]
fn test_sycc_file() {
    init_logger();

    let transform = transform_for(jp2_file(3, 8, &enumerated(18))).unwrap();
    assert!(!transform.is_identity());

    // neutral chroma leaves luma on every channel
    let out = transform
        .apply(&[
            ComponentSamples::Float(vec![-0.25, 0.5]),
            ComponentSamples::Float(vec![0.0, 0.0]),
            ComponentSamples::Float(vec![0.0, 0.0]),
        ])
        .unwrap();
    for plane in out {
        assert_eq!(plane, ComponentSamples::Float(vec![-0.25, 0.5]));
    }
}

#[test]
fn test_esrgb_file() {
    let transform = transform_for(jp2_file(3, 10, &enumerated(20))).unwrap();
    // (v + 512 - 384) * 2 - 512
    let planes = vec![
        ComponentSamples::Int(vec![-128]),
        ComponentSamples::Int(vec![0]),
        ComponentSamples::Int(vec![128]),
    ];
    assert_eq!(
        transform.apply(&planes).unwrap(),
        vec![
            ComponentSamples::Int(vec![-512]),
            ComponentSamples::Int(vec![-256]),
            ComponentSamples::Int(vec![0]),
        ]
    );
}

#[test]
fn test_unsupported_colour_space_fails_pipeline_only() {
    // CMYK is kept as unknown by the file reader
    let input = jp2_file(3, 8, &enumerated(12));
    let file = decode_jp2(&mut Cursor::new(input)).unwrap();
    assert_eq!(
        colour_transform(&file),
        Err(ColourError::UnknownColourSpace)
    );
}

#[test]
fn test_icc_monochrome_file() {
    init_logger();

    let profile = monochrome_profile(CurveType::gamma(1.0));
    let transform = transform_for(jp2_file(1, 8, &icc_profiled(&profile))).unwrap();
    let out = transform
        .apply(&[ComponentSamples::Int(vec![-128, 127, 500])])
        .unwrap();
    assert_eq!(out, vec![ComponentSamples::Int(vec![-128, 127, 127])]);
}

#[test]
fn test_icc_matrix_file() {
    init_logger();

    let profile = matrix_profile(CurveType::new(vec![]));
    let transform = transform_for(jp2_file(3, 8, &icc_profiled(&profile))).unwrap();
    let out = transform
        .apply(&[
            ComponentSamples::Int(vec![127]),
            ComponentSamples::Int(vec![-128]),
            ComponentSamples::Int(vec![-128]),
        ])
        .unwrap();
    match out.as_slice() {
        [ComponentSamples::Int(r), ComponentSamples::Int(g), ComponentSamples::Int(b)] => {
            assert!(r[0] >= 126, "red {}", r[0]);
            assert!(g[0] <= -120, "green {}", g[0]);
            assert!(b[0] <= -120, "blue {}", b[0]);
        }
        other => panic!("unexpected planes {:?}", other),
    }
}

#[test]
fn test_icc_component_count() {
    let profile = matrix_profile(CurveType::gamma(2.2));
    assert_eq!(
        transform_for(jp2_file(2, 8, &icc_profiled(&profile))),
        Err(ColourError::UnsupportedComponentCount {
            colour_space: "ICC profiled",
            count: 2
        })
    );

    // a gray profile does not describe three components
    let profile = monochrome_profile(CurveType::gamma(1.0));
    assert_eq!(
        transform_for(jp2_file(3, 8, &icc_profiled(&profile))),
        Err(ColourError::Icc(icc::IccError::WrongProfileType))
    );
}

#[test]
fn test_one_bit_components() {
    init_logger();

    // (v + 1 - 0) * 2 - 1
    let transform = transform_for(jp2_file(1, 1, &enumerated(20))).unwrap();
    assert_eq!(
        transform.apply(&[ComponentSamples::Int(vec![-1, 0])]).unwrap(),
        vec![ComponentSamples::Int(vec![-1, 1])]
    );

    let profile = monochrome_profile(CurveType::gamma(1.0));
    let transform = transform_for(jp2_file(1, 1, &icc_profiled(&profile))).unwrap();
    assert_eq!(
        transform.apply(&[ComponentSamples::Int(vec![-1, 0, 7])]).unwrap(),
        vec![ComponentSamples::Int(vec![-1, 0, 0])]
    );
}

#[test]
fn test_signed_wide_components() {
    // signed, 30 bits
    let input = jp2_file_with_depth(3, 0x80 | 29, &enumerated(18));
    let file = decode_jp2(&mut Cursor::new(input)).unwrap();
    assert_eq!(component_info(&file), vec![ComponentInfo::new(30, 0, true); 3]);

    let transform = colour_transform(&file).unwrap();
    let luma = vec![i32::MIN, -1, (1 << 29) - 1];
    let out = transform
        .apply(&[
            ComponentSamples::Int(luma.clone()),
            ComponentSamples::Int(vec![0; 3]),
            ComponentSamples::Int(vec![0; 3]),
        ])
        .unwrap();
    for plane in out {
        assert_eq!(plane, ComponentSamples::Int(luma.clone()));
    }
}

#[test]
fn test_depths_past_sample_range() {
    // 31 bits still decodes as a file, but the samples do not fit
    assert_eq!(
        transform_for(jp2_file_with_depth(1, 30, &enumerated(20))),
        Err(ColourError::UnsupportedBitDepth {
            bits: 31,
            fixed_point: 0
        })
    );

    // 38 bits, the widest depth a JP2 file can signal
    assert_eq!(
        transform_for(jp2_file_with_depth(3, 37, &enumerated(16))),
        Err(ColourError::UnsupportedBitDepth {
            bits: 38,
            fixed_point: 0
        })
    );

    let profile = monochrome_profile(CurveType::gamma(1.0));
    assert_eq!(
        transform_for(jp2_file(1, 17, &icc_profiled(&profile))),
        Err(ColourError::UnsupportedBitDepth {
            bits: 17,
            fixed_point: 0
        })
    );
}
