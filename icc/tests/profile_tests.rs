use icc::{
    CurveType, IccError, IccProfile, MatrixBasedTransformTosRgb, MonochromeTransformTosRgb,
    RestrictedIccProfile, Tag, TAG_GRAY_TRC, TAG_MEDIA_WHITE_POINT,
};

mod shared;
use shared::{d50, init_logger, matrix_profile, monochrome_profile};

#[test]
fn test_monochrome_profile() {
    init_logger();

    let data = monochrome_profile(CurveType::gamma(1.0));
    let profile = IccProfile::decode(&data).unwrap();
    assert_eq!(profile.header().colour_space(), *b"GRAY");
    assert_eq!(profile.header().size() as usize, data.len());
    assert_eq!(
        profile.tags().xyz(TAG_MEDIA_WHITE_POINT).unwrap(),
        d50()
    );

    let restricted = profile.restricted().unwrap();
    assert!(restricted.is_monochrome());

    // gamma 1.0 makes the transform a plain sRGB encode
    let transform = MonochromeTransformTosRgb::new(&restricted, 255, 128).unwrap();
    assert_eq!(transform.apply_int(&[0, 1, 255]), vec![-128, 13 - 128, 127]);
}

#[test]
fn test_sampled_gray_curve() {
    init_logger();

    // linear ramp sampled at three points is the identity
    let data = monochrome_profile(CurveType::new(vec![0, 32768, 65535]));
    let profile = IccProfile::decode(&data).unwrap();
    match profile.tags().get(TAG_GRAY_TRC) {
        Some(Tag::Curve(curve)) => assert_eq!(curve.len(), 3),
        other => panic!("unexpected gray TRC {:?}", other),
    }

    let restricted = profile.restricted().unwrap();
    let ramp = MonochromeTransformTosRgb::new(&restricted, 1023, 512).unwrap();
    let identity = MonochromeTransformTosRgb::new(
        &RestrictedIccProfile::Monochrome {
            gray_trc: CurveType::new(vec![]),
        },
        1023,
        512,
    )
    .unwrap();
    let input: Vec<i32> = (0..1024).step_by(31).collect();
    let difference = ramp
        .apply_int(&input)
        .iter()
        .zip(identity.apply_int(&input))
        .map(|(a, b)| (a - b).abs())
        .max()
        .unwrap();
    assert!(difference <= 1, "difference {}", difference);
}

#[test]
fn test_matrix_profile() {
    init_logger();

    let data = matrix_profile(CurveType::new(vec![]));
    let restricted = IccProfile::decode(&data).unwrap().restricted().unwrap();
    assert_eq!(restricted.num_components(), 3);

    let transform = MatrixBasedTransformTosRgb::new(&restricted, [255; 3], [128; 3]).unwrap();
    // a pure primary stays (nearly) pure
    let [r, g, b] = transform.apply_int([&[255], &[0], &[0]]);
    assert!(r[0] >= 126, "red {}", r[0]);
    assert!(g[0] <= -120, "green {}", g[0]);
    assert!(b[0] <= -120, "blue {}", b[0]);
}

#[test]
fn test_transform_is_reproducible() {
    let data = matrix_profile(CurveType::gamma(2.2));
    let restricted = IccProfile::decode(&data).unwrap().restricted().unwrap();
    let first = MatrixBasedTransformTosRgb::new(&restricted, [4095; 3], [2048; 3]).unwrap();
    let second = MatrixBasedTransformTosRgb::new(&restricted, [4095; 3], [2048; 3]).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_corrupt_signature() {
    let mut data = monochrome_profile(CurveType::new(vec![]));
    data[36] = b'x';
    assert_eq!(
        IccProfile::decode(&data),
        Err(IccError::InvalidSignature {
            signature: *b"xcsp"
        })
    );
}

#[test]
fn test_truncated_profile() {
    let data = monochrome_profile(CurveType::new(vec![]));
    let err = IccProfile::decode(&data[..data.len() - 1]).unwrap_err();
    assert!(matches!(err, IccError::Truncated { .. }));
    assert!(err.to_string().contains("truncated"));
}
