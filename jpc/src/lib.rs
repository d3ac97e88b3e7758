#![allow(dead_code)]

//! JPEG 2000 codestream building blocks.
//!
//! The wavelet transform decomposes each tile-component into a tree of
//! subbands (`subband`), every leaf of which is partitioned into code-blocks
//! (`code_block`) that are entropy coded in bit-plane coding passes
//! (`entropy`). Code-block sizes are configured per tile and component with
//! the option machinery in `module_spec` and `code_block_size`.
//!
//! See ITU-T T.800(V4) | ISO/IEC 15444-1:2024 Annexes B, D and F.

mod code_block;
mod code_block_size;
mod entropy;
mod module_spec;
mod subband;
mod wavelet;

pub use code_block::{
    CodeBlockData, CodeBlockError, CodeBlockGrid, CodeBlockLayout, DataKind, Sample,
};
pub use code_block_size::{CodeBlockSize, CodeBlockSizeSpec};
pub use entropy::{
    coding_passes, num_stripes, CodingPass, EntropyCodingOptions, PassKind, FIRST_BYPASS_PASS_IDX,
    MAX_CB_AREA, MAX_CB_DIM, MIN_CB_DIM, MQ_INIT, NUM_CTXTS, NUM_EMPTY_PASSES_IN_MS_BP,
    NUM_NON_BYPASS_MS_BP, NUM_PASSES, OPT_BYPASS, OPT_PRED_TERM, OPT_RESET_MQ,
    OPT_SEG_SYMBOLS, OPT_TERM_PASS, OPT_VERT_STR_CAUSAL, SEG_SYMBOLS, STRIPE_HEIGHT,
};
pub use module_spec::{parse_idx, ModuleSpec, SpecError, SpecType, ValueType};
pub use subband::{
    AnalysisPayload, AnalysisTree, SubBandType, Subband, SubbandError, SubbandId,
    SubbandPayload, SubbandTree, SynthesisPayload, SynthesisTree,
};
pub use wavelet::{upsample_convolve, FilterSupports, FilterType, ImplementationType};

#[cfg(test)]
pub(crate) mod tests {
    pub fn init_logger() {
        let _ = env_logger::builder()
            .is_test(true)
            .filter_level(log::LevelFilter::Debug)
            .try_init();
    }
}
