use log::warn;
use std::fmt;

use crate::{BoxType, BoxTypes};

/// A recoverable anomaly found while reading a file.
///
/// These never stop parsing, the affected box is skipped or degraded (for
/// example to an unknown colourspace) and the reader carries on.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// A known enumerated colourspace that this crate cannot transform.
    UnsupportedColourSpace {
        name: &'static str,
        code: u32,
        offset: u64,
    },

    /// An enumerated colourspace code that is not defined.
    UnknownColourSpace { code: u32, offset: u64 },

    /// A Colour Specification box after the first one.
    IgnoredColourSpecification { offset: u64 },

    /// An Image Header box outside its required position.
    IgnoredImageHeader { offset: u64 },

    /// A box type that is not recognised.
    UnknownBox { box_type: BoxType, offset: u64 },

    /// A recognised box outside the superbox it belongs in.
    MisplacedBox { box_type: BoxType, offset: u64 },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::UnsupportedColourSpace { name, code, offset } => {
                write!(
                    f,
                    "unsupported colourspace {} ({}) at offset {}",
                    name, code, offset
                )
            }
            Self::UnknownColourSpace { code, offset } => {
                write!(
                    f,
                    "Unknown enumerated colorspace ({}) at offset {}",
                    code, offset
                )
            }
            Self::IgnoredColourSpecification { offset } => {
                write!(f, "ignoring colour specification box at offset {}", offset)
            }
            Self::IgnoredImageHeader { offset } => {
                write!(f, "ignoring image header box at offset {}", offset)
            }
            Self::UnknownBox { box_type, offset } => {
                write!(
                    f,
                    "unknown box {} ({:?}) at offset {}",
                    box_name(*box_type),
                    box_type,
                    offset
                )
            }
            Self::MisplacedBox { box_type, offset } => {
                write!(
                    f,
                    "ignoring misplaced box {} at offset {}",
                    box_name(*box_type),
                    offset
                )
            }
        }
    }
}

/// Warnings accumulated while reading.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Record a warning, it is logged as well.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        warn!("{}", diagnostic);
        self.entries.push(diagnostic);
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.entries.extend(other.entries);
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether an unknown box of the given type was seen.
    pub fn has_unknown_box(&self, box_type: BoxType) -> bool {
        self.entries.iter().any(|entry| {
            matches!(entry, Diagnostic::UnknownBox { box_type: seen, .. } if *seen == box_type)
        })
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for entry in &self.entries {
            writeln!(f, "{}", entry)?;
        }
        Ok(())
    }
}

/// Name of a box type for messages, falls back to the raw bytes.
pub(crate) fn box_name(box_type: BoxType) -> String {
    match BoxTypes::new(box_type) {
        BoxTypes::Unknown => String::from_utf8_lossy(&box_type).into_owned(),
        label => label.to_string(),
    }
}
