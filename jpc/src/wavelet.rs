//! Wavelet filters for JPEG 2000
//!
//! Descriptors for the two filters of ITU-T T.800 Annex F, the reversible 5-3
//! integer lifting filter and the irreversible 9-7 floating point lifting
//! filter.
//!
//! The descriptors carry what the rest of the codec needs to know about a
//! filter without running it: the filter supports, whether the transform is
//! reversible, the sample type, and the synthesis filter taps from which the
//! subband L2 norms are derived.

use crate::code_block::DataKind;

const LP_SYNTHESIS_53: [f32; 3] = [0.5, 1.0, 0.5];
const HP_SYNTHESIS_53: [f32; 5] = [-0.125, -0.25, 0.75, -0.25, -0.125];

const LP_SYNTHESIS_97: [f32; 7] = [
    -0.091272, -0.057544, 0.591272, 1.115087, 0.591272, -0.057544, -0.091272,
];
const HP_SYNTHESIS_97: [f32; 9] = [
    0.026749, 0.016864, -0.078223, -0.266864, 0.602949, -0.266864, -0.078223, 0.016864, 0.026749,
];

/// How a filter is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImplementationType {
    IntLift,
    FloatLift,
    FloatConvolution,
}

/// Number of taps on either side of the centre of a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterSupports {
    pub low_neg: usize,
    pub low_pos: usize,
    pub high_neg: usize,
    pub high_pos: usize,
}

/// Filter type selection for DWT operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterType {
    /// 5-3 Reversible filter for lossless compression
    Reversible53,
    /// 9-7 Irreversible filter for lossy compression
    Irreversible97,
}

impl FilterType {
    /// Get the supports of the analysis filters
    pub fn analysis_supports(&self) -> FilterSupports {
        match self {
            FilterType::Reversible53 => FilterSupports {
                low_neg: 2,
                low_pos: 2,
                high_neg: 1,
                high_pos: 1,
            },
            FilterType::Irreversible97 => FilterSupports {
                low_neg: 4,
                low_pos: 4,
                high_neg: 3,
                high_pos: 3,
            },
        }
    }

    /// Get the supports of the synthesis filters
    pub fn synthesis_supports(&self) -> FilterSupports {
        match self {
            FilterType::Reversible53 => FilterSupports {
                low_neg: 1,
                low_pos: 1,
                high_neg: 2,
                high_pos: 2,
            },
            FilterType::Irreversible97 => FilterSupports {
                low_neg: 3,
                low_pos: 3,
                high_neg: 4,
                high_pos: 4,
            },
        }
    }

    /// Get the implementation type
    pub fn implementation_type(&self) -> ImplementationType {
        match self {
            FilterType::Reversible53 => ImplementationType::IntLift,
            FilterType::Irreversible97 => ImplementationType::FloatLift,
        }
    }

    /// Get the type of the samples the filter operates on
    pub fn data_type(&self) -> DataKind {
        match self {
            FilterType::Reversible53 => DataKind::Int,
            FilterType::Irreversible97 => DataKind::Float,
        }
    }

    pub fn is_reversible(&self) -> bool {
        matches!(self, FilterType::Reversible53)
    }

    /// Whether filtering a signal of `len` samples, given `tail` samples of
    /// overlap before it and `head` after it, yields the same coefficients as
    /// filtering the full signal.
    pub fn is_same_as_full_wt(&self, tail: usize, head: usize, len: usize) -> bool {
        let (tail_min, head_even, head_odd) = match self {
            FilterType::Reversible53 => (2, 1, 2),
            FilterType::Irreversible97 => (4, 3, 4),
        };
        let head_min = if len % 2 == 0 { head_even } else { head_odd };
        tail >= tail_min && head >= head_min
    }

    /// Get the low-pass synthesis filter taps
    pub fn lp_synthesis_filter(&self) -> &'static [f32] {
        match self {
            FilterType::Reversible53 => &LP_SYNTHESIS_53,
            FilterType::Irreversible97 => &LP_SYNTHESIS_97,
        }
    }

    /// Get the high-pass synthesis filter taps
    pub fn hp_synthesis_filter(&self) -> &'static [f32] {
        match self {
            FilterType::Reversible53 => &HP_SYNTHESIS_53,
            FilterType::Irreversible97 => &HP_SYNTHESIS_97,
        }
    }

    /// Waveform after one more low-pass synthesis stage.
    pub fn lp_synthesis_waveform(&self, input: &[f64]) -> Vec<f64> {
        upsample_convolve(input, self.lp_synthesis_filter())
    }

    /// Waveform after one more high-pass synthesis stage.
    pub fn hp_synthesis_waveform(&self, input: &[f64]) -> Vec<f64> {
        upsample_convolve(input, self.hp_synthesis_filter())
    }
}

/// Upsample `input` by two and convolve it with `filter`.
///
/// The output has `2 * input.len() + filter.len() - 2` samples.
pub fn upsample_convolve(input: &[f64], filter: &[f32]) -> Vec<f64> {
    if input.is_empty() || filter.is_empty() {
        return vec![];
    }
    let mut out = vec![0f64; 2 * input.len() + filter.len() - 2];
    for (k, value) in input.iter().enumerate() {
        for (j, tap) in filter.iter().enumerate() {
            out[2 * k + j] += value * *tap as f64;
        }
    }
    out
}

// ============================================================================
// Tests
// ============================================================================
