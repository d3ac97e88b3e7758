//! Per tile and per component option values.
//!
//! Codec options such as the code-block size can be given once for the whole
//! image, per component, per tile or per tile-component. A `ModuleSpec` keeps
//! every level and answers a query for a tile-component with the most specific
//! value that was given.

use std::collections::HashMap;
use std::error;
use std::fmt;

use log::debug;

/// Which kinds of values an option accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecType {
    /// Component specific only.
    Component,
    /// Tile specific only.
    Tile,
    /// Tile, component and tile-component specific.
    TileComponent,
}

/// Origin of the value in use for a tile-component.
///
/// Ordered by precedence, a setter only ever raises the value type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ValueType {
    Default,
    ComponentDefault,
    TileDefault,
    TileComponent,
}

/// Errors raised while configuring option values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecError {
    WidthTooLarge { width: u32 },
    WidthTooSmall { width: u32 },
    WidthNotPowerOfTwo { width: u32 },
    HeightTooLarge { height: u32 },
    HeightTooSmall { height: u32 },
    HeightNotPowerOfTwo { height: u32 },
    AreaTooLarge { width: u32, height: u32 },

    /// The code-block width could not be parsed.
    BadWidth { word: String },

    /// A width was not followed by a height.
    MissingHeight,

    /// The code-block height could not be parsed.
    BadHeight { word: String },

    /// Malformed token, such as `t1;2` or `x64`.
    BadConstruction { word: String },

    /// A tile or component index is not below the number of tiles or
    /// components.
    IndexOutOfRange { word: String, index: usize },

    /// The option is tile specific and cannot be set per component.
    TileOnly,

    /// The option is component specific and cannot be set per tile.
    ComponentOnly,

    /// No value was ever given for the tile-component.
    NotSpecified { tile: usize, component: usize },
}

impl error::Error for SpecError {}
impl fmt::Display for SpecError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::WidthTooLarge { width } => write!(
                f,
                "the code-block's width {} cannot be greater than {}",
                width,
                crate::entropy::MAX_CB_DIM
            ),
            Self::WidthTooSmall { width } => write!(
                f,
                "the code-block's width {} cannot be less than {}",
                width,
                crate::entropy::MIN_CB_DIM
            ),
            Self::WidthNotPowerOfTwo { width } => {
                write!(f, "the code-block's width {} must be a power of 2", width)
            }
            Self::HeightTooLarge { height } => write!(
                f,
                "the code-block's height {} cannot be greater than {}",
                height,
                crate::entropy::MAX_CB_DIM
            ),
            Self::HeightTooSmall { height } => write!(
                f,
                "the code-block's height {} cannot be less than {}",
                height,
                crate::entropy::MIN_CB_DIM
            ),
            Self::HeightNotPowerOfTwo { height } => {
                write!(f, "the code-block's height {} must be a power of 2", height)
            }
            Self::AreaTooLarge { width, height } => write!(
                f,
                "the code-block's area {}x{} cannot be greater than {}",
                width,
                height,
                crate::entropy::MAX_CB_AREA
            ),
            Self::BadWidth { word } => {
                write!(f, "the code-block's width {:?} could not be parsed", word)
            }
            Self::MissingHeight => write!(f, "could not parse the code-block's height"),
            Self::BadHeight { word } => {
                write!(f, "the code-block's height {:?} could not be parsed", word)
            }
            Self::BadConstruction { word } => {
                write!(f, "bad construction for parameter: {}", word)
            }
            Self::IndexOutOfRange { word, index } => {
                write!(f, "out of range index in parameter {:?}: {}", word, index)
            }
            Self::TileOnly => write!(
                f,
                "option cannot be specified for components as it is tile specific"
            ),
            Self::ComponentOnly => write!(
                f,
                "option cannot be specified for tiles as it is component specific"
            ),
            Self::NotSpecified { tile, component } => write!(
                f,
                "no value specified for tile {} component {}",
                tile, component
            ),
        }
    }
}

/// Values of one option for every tile-component of an image.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleSpec<T> {
    spec_type: SpecType,
    num_tiles: usize,
    num_comps: usize,

    /// Indexed by `tile * num_comps + comp`.
    value_types: Vec<ValueType>,

    default: Option<T>,
    comp_def: Vec<Option<T>>,
    tile_def: Vec<Option<T>>,
    tile_comp: HashMap<(usize, usize), T>,
}

impl<T: Clone> ModuleSpec<T> {
    pub fn new(num_tiles: usize, num_comps: usize, spec_type: SpecType) -> ModuleSpec<T> {
        ModuleSpec {
            spec_type,
            num_tiles,
            num_comps,
            value_types: vec![ValueType::Default; num_tiles * num_comps],
            default: None,
            comp_def: vec![None; num_comps],
            tile_def: vec![None; num_tiles],
            tile_comp: HashMap::new(),
        }
    }

    pub fn spec_type(&self) -> SpecType {
        self.spec_type
    }

    pub fn num_tiles(&self) -> usize {
        self.num_tiles
    }

    pub fn num_comps(&self) -> usize {
        self.num_comps
    }

    fn check_tile(&self, tile: usize) -> Result<(), SpecError> {
        if tile >= self.num_tiles {
            return Err(SpecError::IndexOutOfRange {
                word: format!("t{}", tile),
                index: tile,
            });
        }
        Ok(())
    }

    fn check_comp(&self, comp: usize) -> Result<(), SpecError> {
        if comp >= self.num_comps {
            return Err(SpecError::IndexOutOfRange {
                word: format!("c{}", comp),
                index: comp,
            });
        }
        Ok(())
    }

    /// Raise the value type of a tile-component, never lowering it.
    fn raise(&mut self, tile: usize, comp: usize, value_type: ValueType) {
        let slot = &mut self.value_types[tile * self.num_comps + comp];
        if *slot < value_type {
            *slot = value_type;
        }
    }

    pub fn set_default(&mut self, value: T) {
        self.default = Some(value);
    }

    pub fn default(&self) -> Option<&T> {
        self.default.as_ref()
    }

    pub fn set_comp_def(&mut self, comp: usize, value: T) -> Result<(), SpecError> {
        if self.spec_type == SpecType::Tile {
            return Err(SpecError::TileOnly);
        }
        self.check_comp(comp)?;
        for tile in 0..self.num_tiles {
            self.raise(tile, comp, ValueType::ComponentDefault);
        }
        self.comp_def[comp] = Some(value);
        Ok(())
    }

    /// Value given for the component, or the default.
    pub fn comp_def(&self, comp: usize) -> Option<&T> {
        self.comp_def
            .get(comp)
            .and_then(Option::as_ref)
            .or_else(|| self.default())
    }

    pub fn set_tile_def(&mut self, tile: usize, value: T) -> Result<(), SpecError> {
        if self.spec_type == SpecType::Component {
            return Err(SpecError::ComponentOnly);
        }
        self.check_tile(tile)?;
        for comp in 0..self.num_comps {
            self.raise(tile, comp, ValueType::TileDefault);
        }
        self.tile_def[tile] = Some(value);
        Ok(())
    }

    /// Value given for the tile, or the default.
    pub fn tile_def(&self, tile: usize) -> Option<&T> {
        self.tile_def
            .get(tile)
            .and_then(Option::as_ref)
            .or_else(|| self.default())
    }

    pub fn set_tile_comp_val(&mut self, tile: usize, comp: usize, value: T) -> Result<(), SpecError> {
        match self.spec_type {
            SpecType::Tile => return Err(SpecError::TileOnly),
            SpecType::Component => return Err(SpecError::ComponentOnly),
            SpecType::TileComponent => {}
        }
        self.check_tile(tile)?;
        self.check_comp(comp)?;
        self.raise(tile, comp, ValueType::TileComponent);
        self.tile_comp.insert((tile, comp), value);
        Ok(())
    }

    /// Value given for the tile-component, falling back on the tile, the
    /// component and the default in that order.
    pub fn tile_comp_val(&self, tile: usize, comp: usize) -> Option<&T> {
        self.tile_comp
            .get(&(tile, comp))
            .or_else(|| self.tile_def.get(tile).and_then(Option::as_ref))
            .or_else(|| self.comp_def(comp))
    }

    pub fn value_type(&self, tile: usize, comp: usize) -> Result<ValueType, SpecError> {
        self.check_tile(tile)?;
        self.check_comp(comp)?;
        Ok(self.value_types[tile * self.num_comps + comp])
    }

    /// The value in use for a tile-component.
    pub fn spec(&self, tile: usize, comp: usize) -> Result<&T, SpecError> {
        let value = match self.value_type(tile, comp)? {
            ValueType::Default => self.default(),
            ValueType::ComponentDefault => self.comp_def(comp),
            ValueType::TileDefault => self.tile_def(tile),
            ValueType::TileComponent => self.tile_comp.get(&(tile, comp)),
        };
        value.ok_or(SpecError::NotSpecified {
            tile,
            component: comp,
        })
    }

    pub fn is_comp_specified(&self, comp: usize) -> bool {
        self.comp_def.get(comp).map_or(false, Option::is_some)
    }

    pub fn is_tile_specified(&self, tile: usize) -> bool {
        self.tile_def.get(tile).map_or(false, Option::is_some)
    }

    pub fn is_tile_comp_specified(&self, tile: usize, comp: usize) -> bool {
        self.tile_comp.contains_key(&(tile, comp))
    }
}

fn select(selected: &mut [bool], idx: usize, last: Option<usize>, dash: bool) {
    if dash {
        let start = last.map_or(0, |l| l + 1);
        for item in selected.iter_mut().take(idx).skip(start) {
            *item = true;
        }
    }
    selected[idx] = true;
}

/// Parse the indices of a `t` or `c` token.
///
/// The first character is the token kind and is skipped. Indices are
/// separated by `,` and a `-` between two indices selects the whole range, so
/// `t0,2-4` over 6 tiles gives `[true, false, true, true, true, false]`.
pub fn parse_idx(word: &str, max: usize) -> Result<Vec<bool>, SpecError> {
    let bad_construction = || SpecError::BadConstruction {
        word: word.to_string(),
    };
    let out_of_range = |index| SpecError::IndexOutOfRange {
        word: word.to_string(),
        index,
    };

    let mut selected = vec![false; max];
    let mut index: Option<usize> = None;
    let mut last: Option<usize> = None;
    let mut dash = false;

    for c in word.chars().skip(1) {
        if let Some(digit) = c.to_digit(10) {
            let current = index.unwrap_or(0);
            index = Some(
                current
                    .saturating_mul(10)
                    .saturating_add(digit as usize),
            );
            continue;
        }

        let idx = match (index, c) {
            (Some(idx), ',') | (Some(idx), '-') => idx,
            _ => return Err(bad_construction()),
        };
        if idx >= max {
            return Err(out_of_range(idx));
        }
        select(&mut selected, idx, last, dash);
        // a comma closes a range, a dash opens one
        dash = c == '-';
        last = Some(idx);
        index = None;
    }

    let idx = index.ok_or_else(bad_construction)?;
    if idx >= max {
        return Err(out_of_range(idx));
    }
    select(&mut selected, idx, last, dash);

    debug!("Parsed {:?} as {:?}", word, selected);
    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::init_logger;

    #[test]
    fn test_parse_idx() {
        init_logger();
        assert_eq!(
            parse_idx("t0,2-4", 6),
            Ok(vec![true, false, true, true, true, false])
        );
        assert_eq!(parse_idx("c1", 3), Ok(vec![false, true, false]));
        assert_eq!(parse_idx("c0-2,4", 5), Ok(vec![true, true, true, false, true]));
        assert_eq!(parse_idx("t12", 13).map(|v| v[12]), Ok(true));
    }

    #[test]
    fn test_parse_idx_errors() {
        assert_eq!(
            parse_idx("t1;2", 4),
            Err(SpecError::BadConstruction {
                word: "t1;2".to_string()
            })
        );
        assert_eq!(
            parse_idx("t,1", 4),
            Err(SpecError::BadConstruction {
                word: "t,1".to_string()
            })
        );
        assert_eq!(
            parse_idx("t", 4),
            Err(SpecError::BadConstruction {
                word: "t".to_string()
            })
        );
        assert_eq!(
            parse_idx("t1-", 4),
            Err(SpecError::BadConstruction {
                word: "t1-".to_string()
            })
        );
        assert_eq!(
            parse_idx("c0,3", 3),
            Err(SpecError::IndexOutOfRange {
                word: "c0,3".to_string(),
                index: 3
            })
        );
        assert_eq!(
            parse_idx("c5-1", 3),
            Err(SpecError::IndexOutOfRange {
                word: "c5-1".to_string(),
                index: 5
            })
        );
    }

    #[test]
    fn test_precedence() {
        let mut spec = ModuleSpec::new(2, 2, SpecType::TileComponent);
        assert_eq!(
            spec.spec(0, 0),
            Err(SpecError::NotSpecified {
                tile: 0,
                component: 0
            })
        );

        spec.set_default(1);
        spec.set_comp_def(1, 2).unwrap();
        spec.set_tile_def(1, 3).unwrap();
        spec.set_tile_comp_val(0, 0, 4).unwrap();

        assert_eq!(spec.spec(0, 0), Ok(&4));
        assert_eq!(spec.spec(0, 1), Ok(&2));
        assert_eq!(spec.spec(1, 0), Ok(&3));
        assert_eq!(spec.spec(1, 1), Ok(&3));

        assert_eq!(spec.value_type(0, 0), Ok(ValueType::TileComponent));
        assert_eq!(spec.value_type(0, 1), Ok(ValueType::ComponentDefault));
        assert_eq!(spec.value_type(1, 1), Ok(ValueType::TileDefault));

        // a component default set later does not override a tile default
        spec.set_comp_def(0, 5).unwrap();
        assert_eq!(spec.spec(1, 0), Ok(&3));
        assert_eq!(spec.comp_def(0), Some(&5));
        assert_eq!(spec.tile_def(0), Some(&1));

        assert!(spec.is_comp_specified(1));
        assert!(!spec.is_tile_specified(0));
        assert!(spec.is_tile_comp_specified(0, 0));
        assert!(!spec.is_tile_comp_specified(1, 1));
    }

    #[test]
    fn test_spec_type_enforced() {
        let mut tile_only = ModuleSpec::new(2, 2, SpecType::Tile);
        assert_eq!(tile_only.set_comp_def(0, 1), Err(SpecError::TileOnly));
        assert_eq!(tile_only.set_tile_comp_val(0, 0, 1), Err(SpecError::TileOnly));
        assert!(tile_only.set_tile_def(1, 1).is_ok());

        let mut comp_only = ModuleSpec::new(2, 2, SpecType::Component);
        assert_eq!(comp_only.set_tile_def(0, 1), Err(SpecError::ComponentOnly));
        assert_eq!(
            comp_only.set_tile_comp_val(0, 0, 1),
            Err(SpecError::ComponentOnly)
        );
        assert!(comp_only.set_comp_def(1, 1).is_ok());
    }

    #[test]
    fn test_indices_checked() {
        let mut spec = ModuleSpec::new(1, 3, SpecType::TileComponent);
        assert_eq!(
            spec.set_comp_def(3, 0),
            Err(SpecError::IndexOutOfRange {
                word: "c3".to_string(),
                index: 3
            })
        );
        assert!(spec.set_tile_def(1, 0).is_err());
        assert!(spec.spec(0, 3).is_err());
    }
}
