//! Entropy coding parameters and the coding pass sequence of a code-block.
//!
//! The bit-plane coder itself lives outside this crate. What is defined here
//! is the order in which passes are produced for a code-block and, for every
//! pass, whether it is raw coded, terminated, followed by a context reset or
//! by segmentation symbols.

use std::fmt;

use log::debug;

/// Selective arithmetic coding bypass.
pub const OPT_BYPASS: u8 = 0x01;
/// Reset MQ contexts after each pass.
pub const OPT_RESET_MQ: u8 = 0x02;
/// Terminate the codeword after each pass.
pub const OPT_TERM_PASS: u8 = 0x04;
/// Vertically stripe causal context formation.
pub const OPT_VERT_STR_CAUSAL: u8 = 0x08;
/// Predictable termination.
pub const OPT_PRED_TERM: u8 = 0x10;
/// Segmentation symbols after each cleanup pass.
pub const OPT_SEG_SYMBOLS: u8 = 0x20;

pub const MIN_CB_DIM: u32 = 4;
pub const MAX_CB_DIM: u32 = 1024;
pub const MAX_CB_AREA: u32 = 4096;

/// Height of the stripes code-blocks are scanned in.
pub const STRIPE_HEIGHT: u32 = 4;

/// Passes per bit-plane.
pub const NUM_PASSES: usize = 3;

/// Most significant bit-planes that are never raw coded.
pub const NUM_NON_BYPASS_MS_BP: usize = 4;

/// Passes that are empty in the most significant bit-plane.
pub const NUM_EMPTY_PASSES_IN_MS_BP: usize = 2;

/// Index of the first pass that may be raw coded.
pub const FIRST_BYPASS_PASS_IDX: usize =
    NUM_NON_BYPASS_MS_BP * NUM_PASSES - NUM_EMPTY_PASSES_IN_MS_BP;

/// Symbols coded with the uniform context after each cleanup pass.
pub const SEG_SYMBOLS: [u8; 4] = [1, 0, 1, 0];

/// Number of MQ contexts.
pub const NUM_CTXTS: usize = 19;

/// Initial MQ state of each context: uniform, run-length, first zero coding
/// context, the rest at zero.
pub const MQ_INIT: [u8; NUM_CTXTS] = [46, 3, 4, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];

/// Code-block style flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntropyCodingOptions {
    pub bypass: bool,
    pub reset_mq: bool,
    pub term_pass: bool,
    pub vertically_causal: bool,
    pub predictable_termination: bool,
    pub segmentation_symbols: bool,
}

impl EntropyCodingOptions {
    /// Options from the code-block style byte, unknown bits are ignored.
    pub fn from_bits(bits: u8) -> EntropyCodingOptions {
        EntropyCodingOptions {
            bypass: bits & OPT_BYPASS != 0,
            reset_mq: bits & OPT_RESET_MQ != 0,
            term_pass: bits & OPT_TERM_PASS != 0,
            vertically_causal: bits & OPT_VERT_STR_CAUSAL != 0,
            predictable_termination: bits & OPT_PRED_TERM != 0,
            segmentation_symbols: bits & OPT_SEG_SYMBOLS != 0,
        }
    }

    pub fn bits(&self) -> u8 {
        let mut bits = 0;
        for (set, flag) in [
            (self.bypass, OPT_BYPASS),
            (self.reset_mq, OPT_RESET_MQ),
            (self.term_pass, OPT_TERM_PASS),
            (self.vertically_causal, OPT_VERT_STR_CAUSAL),
            (self.predictable_termination, OPT_PRED_TERM),
            (self.segmentation_symbols, OPT_SEG_SYMBOLS),
        ] {
            if set {
                bits |= flag;
            }
        }
        bits
    }
}

/// The three coding passes of a bit-plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassKind {
    SignificancePropagation,
    MagnitudeRefinement,
    CleanUp,
}

impl PassKind {
    /// The pass that follows this one.
    ///
    /// CleanUp -> SignificancePropagation -> MagnitudeRefinement -> CleanUp ...
    pub fn next(self) -> PassKind {
        match self {
            PassKind::CleanUp => PassKind::SignificancePropagation,
            PassKind::SignificancePropagation => PassKind::MagnitudeRefinement,
            PassKind::MagnitudeRefinement => PassKind::CleanUp,
        }
    }
}

impl fmt::Display for PassKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PassKind::SignificancePropagation => write!(f, "significance propagation"),
            PassKind::MagnitudeRefinement => write!(f, "magnitude refinement"),
            PassKind::CleanUp => write!(f, "cleanup"),
        }
    }
}

/// One coding pass of a code-block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodingPass {
    /// Position of the pass in the code-block, from 0.
    pub index: usize,

    /// Bit-plane of the pass, 0 being the most significant coded one.
    pub bit_plane: usize,

    pub kind: PassKind,

    /// Raw coded instead of MQ coded.
    pub is_bypass: bool,

    /// The codeword is terminated after this pass.
    pub is_terminated: bool,

    /// MQ contexts are reset after this pass.
    pub reset_contexts: bool,

    /// Segmentation symbols follow this pass.
    pub segmentation_symbols: bool,
}

impl CodingPass {
    /// Symbols coded with the uniform context after this pass.
    pub fn trailing_symbols(&self) -> &'static [u8] {
        if self.segmentation_symbols {
            &SEG_SYMBOLS
        } else {
            &[]
        }
    }

    /// MQ context states the next pass starts from, `None` when the states
    /// carry over.
    pub fn context_states_after(&self) -> Option<&'static [u8; NUM_CTXTS]> {
        if self.reset_contexts {
            Some(&MQ_INIT)
        } else {
            None
        }
    }
}

/// Number of stripes a code-block of height `h` is scanned in.
pub fn num_stripes(h: u32) -> u32 {
    (h + STRIPE_HEIGHT - 1) / STRIPE_HEIGHT
}

/// All coding passes of a code-block with `num_bit_planes` coded bit-planes.
///
/// The most significant bit-plane only has a cleanup pass, every other
/// bit-plane has significance propagation, magnitude refinement and cleanup.
pub fn coding_passes(num_bit_planes: usize, options: &EntropyCodingOptions) -> Vec<CodingPass> {
    let count = if num_bit_planes == 0 {
        0
    } else {
        NUM_PASSES * num_bit_planes - NUM_EMPTY_PASSES_IN_MS_BP
    };

    let mut passes = Vec::with_capacity(count);
    let mut kind = PassKind::CleanUp;
    let mut bit_plane = 0;
    for index in 0..count {
        if index > 0 && kind == PassKind::SignificancePropagation {
            bit_plane += 1;
        }

        let is_bypass = options.bypass
            && kind != PassKind::CleanUp
            && index >= FIRST_BYPASS_PASS_IDX;

        // In bypass mode the codeword is terminated where MQ and raw coding
        // alternate: after raw refinement and after the cleanup preceding
        // raw passes.
        let switches_coder = options.bypass
            && match kind {
                PassKind::CleanUp => bit_plane + 1 >= NUM_NON_BYPASS_MS_BP,
                PassKind::MagnitudeRefinement => is_bypass,
                PassKind::SignificancePropagation => false,
            };

        let is_terminated = options.term_pass || index + 1 == count || switches_coder;

        passes.push(CodingPass {
            index,
            bit_plane,
            kind,
            is_bypass,
            is_terminated,
            reset_contexts: options.reset_mq && !is_bypass,
            segmentation_symbols: options.segmentation_symbols && kind == PassKind::CleanUp,
        });
        kind = kind.next();
    }

    debug!(
        "{} coding passes for {} bit-planes, options {:#04x}",
        passes.len(),
        num_bit_planes,
        options.bits()
    );
    passes
}
