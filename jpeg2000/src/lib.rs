//! JPEG 2000 colour pipeline.
//!
//! Ties the colour specification of a JP2 file to the transform that brings
//! its decoded components to sRGB. Enumerated colourspaces map with closed
//! form expressions, restricted ICC profiles through the lookup tables of the
//! `icc` crate.

use jp2::JP2File;

mod colour;

pub use colour::{
    ColourError, ColourTransform, ComponentInfo, ComponentSamples, MAX_ICC_NOMINAL_RANGE_BITS,
    MAX_NOMINAL_RANGE_BITS,
};

/// Components of a JP2 file, as integers of the signalled bit depths.
pub fn component_info(file: &JP2File) -> Vec<ComponentInfo> {
    file.component_bit_depths()
        .into_iter()
        .map(ComponentInfo::from_bit_depth)
        .collect()
}

/// Colour transform for the colour specification in use by a JP2 file.
pub fn colour_transform(file: &JP2File) -> Result<ColourTransform, ColourError> {
    ColourTransform::new(file.colour_specification(), &component_info(file))
}

#[cfg(test)]
pub(crate) mod tests {
    pub fn init_logger() {
        let _ = env_logger::builder()
            .is_test(true)
            .filter_level(log::LevelFilter::Debug)
            .try_init();
    }
}
