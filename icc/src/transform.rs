//! Restricted ICC profile transforms to sRGB.
//!
//! Input samples are unsigned, in `[0, max_value]`, and outputs are level
//! shifted back to be centred on zero. The lookup tables are built when the
//! transform is created.

use log::debug;

use crate::lut::{monochrome_srgb_table, LookUpTable32LinearSrgbToSrgb, LookUpTableFp, SRGB_CURVE};
use crate::profile::RestrictedIccProfile;
use crate::IccError;

/// PCS XYZ (D50) to linear sRGB.
const SRGB_MATRIX: [[f64; 3]; 3] = [
    [3.1337, -1.6173, -0.4907],
    [-0.9785, 1.9162, 0.0334],
    [0.0720, -0.2290, 1.4056],
];

/// Monochrome Input profile to sRGB.
#[derive(Debug, Clone, PartialEq)]
pub struct MonochromeTransformTosRgb {
    lut: Vec<i32>,
    max_value: i32,
    shift: i32,
}

impl MonochromeTransformTosRgb {
    pub fn new(
        profile: &RestrictedIccProfile,
        max_value: i32,
        shift: i32,
    ) -> Result<MonochromeTransformTosRgb, IccError> {
        let gray_trc = match profile {
            RestrictedIccProfile::Monochrome { gray_trc } => gray_trc,
            _ => return Err(IccError::WrongProfileType),
        };

        debug!(
            "Monochrome transform, max value {} shift {}",
            max_value, shift
        );

        Ok(MonochromeTransformTosRgb {
            lut: monochrome_srgb_table(gray_trc, max_value, shift),
            max_value,
            shift,
        })
    }

    pub fn lut(&self) -> &[i32] {
        &self.lut
    }

    pub fn apply_int(&self, input: &[i32]) -> Vec<i32> {
        input
            .iter()
            .map(|sample| self.lut[(*sample).clamp(0, self.max_value) as usize])
            .collect()
    }

    pub fn apply_float(&self, input: &[f32]) -> Vec<f32> {
        let max = self.max_value as f32;
        input
            .iter()
            .map(|sample| self.lut[sample.max(0.0).min(max) as usize] as f32)
            .collect()
    }
}

/// Three-Component Matrix-Based Input profile to sRGB.
///
/// Each channel goes through its TRC, the three linear values are mapped by
/// the combined colorant and XYZ to sRGB matrix and the result is companded
/// with the linear sRGB table.
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixBasedTransformTosRgb {
    trc_luts: [LookUpTableFp; 3],
    matrix: [[f64; 3]; 3],
    lut: LookUpTable32LinearSrgbToSrgb,
    max_values: [i32; 3],
    shift_values: [i32; 3],
}

impl MatrixBasedTransformTosRgb {
    pub fn new(
        profile: &RestrictedIccProfile,
        max_values: [i32; 3],
        shift_values: [i32; 3],
    ) -> Result<MatrixBasedTransformTosRgb, IccError> {
        let (trc, pcs) = match (profile, profile.colorant_matrix()) {
            (RestrictedIccProfile::ThreeComponentMatrix { trc, .. }, Some(pcs)) => (trc, pcs),
            _ => return Err(IccError::WrongProfileType),
        };

        let trc_luts = [
            LookUpTableFp::new(&trc[0], max_values[0].max(0) as usize + 1),
            LookUpTableFp::new(&trc[1], max_values[1].max(0) as usize + 1),
            LookUpTableFp::new(&trc[2], max_values[2].max(0) as usize + 1),
        ];

        let mut matrix = [[0f64; 3]; 3];
        for (row, out) in matrix.iter_mut().enumerate() {
            for (column, value) in out.iter_mut().enumerate() {
                let sum: f64 = (0..3)
                    .map(|k| SRGB_MATRIX[row][k] * pcs[k][column])
                    .sum();
                *value = max_values[row] as f64 * sum;
            }
        }
        debug!("Matrix transform {:?}", matrix);

        // A single table serves all channels, sized from the first one.
        let lut = LookUpTable32LinearSrgbToSrgb::new(max_values[0], max_values[0], &SRGB_CURVE);

        Ok(MatrixBasedTransformTosRgb {
            trc_luts,
            matrix,
            lut,
            max_values,
            shift_values,
        })
    }

    pub fn matrix(&self) -> &[[f64; 3]; 3] {
        &self.matrix
    }

    pub fn shift_values(&self) -> [i32; 3] {
        self.shift_values
    }

    fn linearise_int(&self, channel: usize, input: &[i32]) -> Vec<f32> {
        let lut = self.trc_luts[channel].lut();
        let max = self.max_values[channel];
        input
            .iter()
            .map(|sample| lut[(*sample).clamp(0, max) as usize])
            .collect()
    }

    fn linearise_float(&self, channel: usize, input: &[f32]) -> Vec<f32> {
        let lut = self.trc_luts[channel].lut();
        let max = self.max_values[channel] as f32;
        input
            .iter()
            .map(|sample| lut[sample.max(0.0).min(max) as usize])
            .collect()
    }

    fn output(&self, row: usize, rgb: [f64; 3]) -> i32 {
        let m = &self.matrix[row];
        let value = (m[0] * rgb[0] + m[1] * rgb[1] + m[2] * rgb[2] + 0.5) as i64;
        self.lut.get_clamped(value)
    }

    fn combine(&self, linear: [Vec<f32>; 3]) -> [Vec<i32>; 3] {
        let length = linear.iter().map(Vec::len).min().unwrap_or(0);
        let mut out = [
            Vec::with_capacity(length),
            Vec::with_capacity(length),
            Vec::with_capacity(length),
        ];
        for index in 0..length {
            let rgb = [
                linear[0][index] as f64,
                linear[1][index] as f64,
                linear[2][index] as f64,
            ];
            for (row, plane) in out.iter_mut().enumerate() {
                plane.push(self.output(row, rgb));
            }
        }
        out
    }

    /// Transform red, green and blue planes of equal length.
    pub fn apply_int(&self, input: [&[i32]; 3]) -> [Vec<i32>; 3] {
        self.combine([
            self.linearise_int(0, input[0]),
            self.linearise_int(1, input[1]),
            self.linearise_int(2, input[2]),
        ])
    }

    pub fn apply_float(&self, input: [&[f32]; 3]) -> [Vec<f32>; 3] {
        let [r, g, b] = self.combine([
            self.linearise_float(0, input[0]),
            self.linearise_float(1, input[1]),
            self.linearise_float(2, input[2]),
        ]);
        let to_float =
            |plane: Vec<i32>| -> Vec<f32> { plane.into_iter().map(|v| v as f32).collect() };
        [to_float(r), to_float(g), to_float(b)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::XyzNumber;
    use crate::tags::CurveType;

    fn srgb_like() -> RestrictedIccProfile {
        RestrictedIccProfile::ThreeComponentMatrix {
            trc: [
                CurveType::new(vec![]),
                CurveType::new(vec![]),
                CurveType::new(vec![]),
            ],
            // sRGB primaries adapted to D50
            colorants: [
                XyzNumber::from_f64(0.4361, 0.2225, 0.0139),
                XyzNumber::from_f64(0.3851, 0.7169, 0.0971),
                XyzNumber::from_f64(0.1431, 0.0606, 0.7141),
            ],
        }
    }

    #[test]
    fn test_wrong_profile_type() {
        let gray = RestrictedIccProfile::Monochrome {
            gray_trc: CurveType::new(vec![]),
        };
        assert_eq!(
            MatrixBasedTransformTosRgb::new(&gray, [255; 3], [128; 3]),
            Err(IccError::WrongProfileType)
        );
        assert_eq!(
            MonochromeTransformTosRgb::new(&srgb_like(), 255, 128),
            Err(IccError::WrongProfileType)
        );
    }

    #[test]
    fn test_monochrome_clamps_input() {
        let gray = RestrictedIccProfile::Monochrome {
            gray_trc: CurveType::new(vec![]),
        };
        let transform = MonochromeTransformTosRgb::new(&gray, 255, 128).unwrap();
        assert_eq!(transform.lut().len(), 256);
        assert_eq!(transform.apply_int(&[-20, 0, 255, 400]), vec![-128, -128, 127, 127]);
        assert_eq!(transform.apply_float(&[-1.0, 255.9]), vec![-128.0, 127.0]);
    }

    #[test]
    fn test_matrix_coefficients() {
        let transform = MatrixBasedTransformTosRgb::new(&srgb_like(), [255; 3], [128; 3]).unwrap();
        let matrix = transform.matrix();
        // colorants of sRGB make the combined matrix close to 255 * identity
        for (row, values) in matrix.iter().enumerate() {
            for (column, value) in values.iter().enumerate() {
                let expected = if row == column { 255.0 } else { 0.0 };
                assert!(
                    (value - expected).abs() < 2.0,
                    "matrix[{}][{}] = {}",
                    row,
                    column,
                    value
                );
            }
        }
    }

    #[test]
    fn test_matrix_black_and_white() {
        let transform = MatrixBasedTransformTosRgb::new(&srgb_like(), [255; 3], [128; 3]).unwrap();
        let [r, g, b] = transform.apply_int([&[0, 255], &[0, 255], &[0, 255]]);
        assert_eq!(r[0], -128);
        assert_eq!(g[0], -128);
        assert_eq!(b[0], -128);
        // white saturates or comes within a code value of the top
        for plane in [&r, &g, &b] {
            assert!(plane[1] >= 126, "{:?}", plane);
        }

        let [rf, _, _] = transform.apply_float([&[0.0, 255.0], &[0.0, 255.0], &[0.0, 255.0]]);
        assert_eq!(rf[0], -128.0);
        assert_eq!(rf[1], r[1] as f32);
    }
}
