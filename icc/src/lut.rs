//! Lookup tables built from tone reproduction curves.
//!
//! Every table is built once per profile and then indexed per sample.

use crate::tags::CurveType;

/// Parameters of the sRGB companding law.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SrgbCurve {
    pub shadow_cutoff: f64,
    pub shadow_slope: f64,
    pub scale_after_exp: f64,
    pub exponent: f64,
    pub reduce_after_exp: f64,
}

/// IEC 61966-2-1 sRGB.
pub const SRGB_CURVE: SrgbCurve = SrgbCurve {
    shadow_cutoff: 0.0031308,
    shadow_slope: 12.92,
    scale_after_exp: 1.055,
    exponent: 1.0 / 2.4,
    reduce_after_exp: 0.055,
};

impl SrgbCurve {
    /// Linear value in [0, 1] to its companded sRGB value.
    ///
    /// The cutoff itself is on the linear segment, as in
    /// `LookUpTable32LinearSrgbToSrgb`.
    pub fn encode(&self, linear: f64) -> f64 {
        if linear <= self.shadow_cutoff {
            self.shadow_slope * linear
        } else {
            self.scale_after_exp * linear.powf(self.exponent) - self.reduce_after_exp
        }
    }
}

/// Position of entry `index` of an `n` entry table in [0, 1].
fn normalised(index: usize, n: usize) -> f64 {
    if n > 1 {
        index as f64 / (n - 1) as f64
    } else {
        0.0
    }
}

/// Resample `curve` to `n` values in [0, 1].
///
/// No entries gives the identity, one entry a gamma curve, otherwise the two
/// nearest entries are linearly interpolated.
fn resample(curve: &CurveType, n: usize) -> Vec<f64> {
    match curve.len() {
        0 => (0..n).map(|i| normalised(i, n)).collect(),
        1 => {
            let gamma = curve.gamma_value().unwrap_or(1.0);
            (0..n).map(|i| normalised(i, n).powf(gamma)).collect()
        }
        entries => {
            let increment = if n > 1 {
                (entries - 1) as f64 / (n - 1) as f64
            } else {
                0.0
            };
            (0..n)
                .map(|i| {
                    let target = i as f64 * increment;
                    let low = target.floor() as usize;
                    let high = target.ceil() as usize;
                    if low == high || high >= entries {
                        curve.value(low.min(entries - 1))
                    } else {
                        let low_value = curve.value(low);
                        let high_value = curve.value(high);
                        low_value + (high_value - low_value) * (target - low as f64)
                    }
                })
                .collect()
        }
    }
}

/// Floating point table of `n` entries in [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct LookUpTableFp {
    lut: Vec<f32>,
}

impl LookUpTableFp {
    pub fn new(curve: &CurveType, n: usize) -> LookUpTableFp {
        LookUpTableFp {
            lut: resample(curve, n).into_iter().map(|v| v as f32).collect(),
        }
    }

    pub fn lut(&self) -> &[f32] {
        &self.lut
    }

    pub fn len(&self) -> usize {
        self.lut.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lut.is_empty()
    }
}

/// Integer table interpolating the curve, scaled to `[0, max_output]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookUpTable32Interp {
    lut: Vec<i32>,
}

impl LookUpTable32Interp {
    pub fn new(curve: &CurveType, n: usize, max_output: i32) -> LookUpTable32Interp {
        let max = max_output as f64;
        LookUpTable32Interp {
            lut: resample(curve, n)
                .into_iter()
                .map(|v| (v * max + 0.5).floor() as i32)
                .collect(),
        }
    }

    pub fn lut(&self) -> &[i32] {
        &self.lut
    }
}

/// Integer gamma table, the curve must hold a single gamma entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookUpTable32Gamma {
    lut: Vec<i32>,
}

impl LookUpTable32Gamma {
    pub fn new(curve: &CurveType, n: usize, max_output: i32) -> LookUpTable32Gamma {
        let gamma = curve.gamma_value().unwrap_or(1.0);
        let max = max_output as f64;
        LookUpTable32Gamma {
            lut: (0..n)
                .map(|i| (normalised(i, n).powf(gamma) * max + 0.5).floor() as i32)
                .collect(),
        }
    }

    pub fn lut(&self) -> &[i32] {
        &self.lut
    }
}

/// Linear sRGB to sRGB, level shifted to be centred on zero.
///
/// Indices up to the shadow cutoff use the linear segment, the rest the
/// power segment. The table has `in_max + 1` entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookUpTable32LinearSrgbToSrgb {
    lut: Vec<i32>,
}

impl LookUpTable32LinearSrgbToSrgb {
    pub fn new(in_max: i32, out_max: i32, curve: &SrgbCurve) -> LookUpTable32LinearSrgbToSrgb {
        let in_max = in_max.max(0);
        let norm = if in_max > 0 { 1.0 / in_max as f64 } else { 0.0 };
        let out = out_max as f64;
        let cut_off = (curve.shadow_cutoff * in_max as f64).floor() as i32;
        let shift = (out_max + 1) / 2;

        let lut = (0..=in_max)
            .map(|i| {
                let x = i as f64 * norm;
                let value = if i <= cut_off {
                    (curve.shadow_slope * out * x + 0.5).floor()
                } else {
                    (curve.scale_after_exp * out * x.powf(curve.exponent)
                        - curve.reduce_after_exp * out
                        + 0.5)
                        .floor()
                };
                value as i32 - shift
            })
            .collect();

        LookUpTable32LinearSrgbToSrgb { lut }
    }

    pub fn lut(&self) -> &[i32] {
        &self.lut
    }

    /// Entry for `index`, clamped to the ends of the table.
    pub fn get_clamped(&self, index: i64) -> i32 {
        let last = self.lut.len() as i64 - 1;
        self.lut[index.clamp(0, last.max(0)) as usize]
    }
}

/// Gray tone reproduction curve composed with the sRGB law.
///
/// Entry `i` maps an input sample in `[0, max_value]` to a level shifted
/// output sample.
pub fn monochrome_srgb_table(curve: &CurveType, max_value: i32, shift: i32) -> Vec<i32> {
    let n = max_value.max(0) as usize + 1;
    let max = max_value as f64;
    LookUpTableFp::new(curve, n)
        .lut()
        .iter()
        .map(|linear| (SRGB_CURVE.encode(*linear as f64) * max + 0.5).floor() as i32 - shift)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_srgb_cutoff_is_linear() {
        let cutoff = SRGB_CURVE.shadow_cutoff;
        assert_eq!(SRGB_CURVE.encode(cutoff), 12.92 * cutoff);
        let above = cutoff + 1e-9;
        assert_eq!(
            SRGB_CURVE.encode(above),
            1.055 * above.powf(1.0 / 2.4) - 0.055
        );
        // both segments meet at the cutoff
        assert!((SRGB_CURVE.encode(above) - SRGB_CURVE.encode(cutoff)).abs() < 1e-6);
    }

    #[test]
    fn test_monochrome_table_matches_linear_srgb_table() {
        let identity = CurveType::new(vec![]);
        for max in [255, 4095] {
            let monochrome = monochrome_srgb_table(&identity, max, (max + 1) / 2);
            let linear = LookUpTable32LinearSrgbToSrgb::new(max, max, &SRGB_CURVE);
            assert_eq!(monochrome.len(), linear.lut().len());
            let difference = monochrome
                .iter()
                .zip(linear.lut())
                .map(|(a, b)| (a - b).abs())
                .max()
                .unwrap();
            assert!(difference <= 1, "max {} difference {}", max, difference);
        }
    }

    #[test]
    fn test_identity_curve() {
        let table = LookUpTableFp::new(&CurveType::new(vec![]), 5);
        assert_eq!(table.lut(), &[0.0, 0.25, 0.5, 0.75, 1.0]);
    }

    #[test]
    fn test_gamma_curve() {
        // 2.0 in u8Fixed8Number
        let curve = CurveType::new(vec![512]);
        let table = LookUpTableFp::new(&curve, 3);
        assert_eq!(table.lut(), &[0.0, 0.25, 1.0]);

        let table = LookUpTable32Gamma::new(&curve, 5, 255);
        assert_eq!(table.lut(), &[0, 16, 64, 143, 255]);
    }

    #[test]
    fn test_interpolated_curve() {
        // three entries stretched over five outputs
        let curve = CurveType::new(vec![0, 13107, 65535]);
        let table = LookUpTable32Interp::new(&curve, 5, 100);
        assert_eq!(table.lut(), &[0, 10, 20, 60, 100]);

        let table = LookUpTableFp::new(&curve, 5);
        assert_eq!(table.len(), 5);
        assert!((table.lut()[3] - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_tables_are_reproducible() {
        let curve = CurveType::new(vec![0, 100, 4000, 30000, 65535]);
        assert_eq!(
            LookUpTable32Interp::new(&curve, 256, 255),
            LookUpTable32Interp::new(&curve, 256, 255)
        );
        assert_eq!(
            LookUpTableFp::new(&curve, 1024),
            LookUpTableFp::new(&curve, 1024)
        );
    }

    #[test]
    fn test_linear_srgb_table() {
        let table = LookUpTable32LinearSrgbToSrgb::new(255, 255, &SRGB_CURVE);
        let lut = table.lut();
        assert_eq!(lut.len(), 256);
        // black and white land on the ends of the shifted range
        assert_eq!(lut[0], -128);
        assert_eq!(lut[255], 127);
        // the shadow segment only covers index zero at 8 bits
        assert_eq!((0.0031308f64 * 255.0).floor(), 0.0);
        // 1.055 * 255 * (1/255)^(1/2.4) - 0.055 * 255
        assert_eq!(lut[1], 13 - 128);
        assert!(lut.windows(2).all(|pair| pair[0] <= pair[1]));

        assert_eq!(table.get_clamped(-5), -128);
        assert_eq!(table.get_clamped(1000), 127);
    }

    #[test]
    fn test_linear_srgb_shadow_segment() {
        let table = LookUpTable32LinearSrgbToSrgb::new(4095, 4095, &SRGB_CURVE);
        // cutoff index is floor(0.0031308 * 4095) = 12
        assert_eq!(table.lut()[12], (12.92f64 * 12.0 + 0.5).floor() as i32 - 2048);
    }

    #[test]
    fn test_srgb_law() {
        assert_eq!(SRGB_CURVE.encode(0.0), 0.0);
        assert!((SRGB_CURVE.encode(1.0) - 1.0).abs() < 1e-12);
        assert!((SRGB_CURVE.encode(0.001) - 0.01292).abs() < 1e-12);
    }

    #[test]
    fn test_monochrome_table() {
        let table = monochrome_srgb_table(&CurveType::new(vec![]), 255, 128);
        assert_eq!(table.len(), 256);
        assert_eq!(table[0], -128);
        assert_eq!(table[255], 127);
        assert_eq!(table[1], 13 - 128);
    }
}
