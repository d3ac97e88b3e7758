//! Code-block size option.
//!
//! The `Cblksiz` option value is a list of tokens: `t<idx>` and `c<idx>` select
//! tiles and components, a `<width> <height>` pair gives the size for the
//! current selection. For example `64 64 t0 32 32 t1 c2 16 16` sets the default
//! to 64x64, tile 0 to 32x32 and component 2 of tile 1 to 16x16.

use log::{debug, info};

use crate::entropy::{MAX_CB_AREA, MAX_CB_DIM, MIN_CB_DIM};
use crate::module_spec::{parse_idx, ModuleSpec, SpecError, SpecType, ValueType};

/// Nominal code-block dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeBlockSize {
    pub width: u32,
    pub height: u32,
}

impl CodeBlockSize {
    /// Validated code-block dimensions.
    ///
    /// Both dimensions are powers of two in `[4, 1024]` and the area is at
    /// most 4096.
    pub fn new(width: u32, height: u32) -> Result<CodeBlockSize, SpecError> {
        if width > MAX_CB_DIM {
            return Err(SpecError::WidthTooLarge { width });
        }
        if width < MIN_CB_DIM {
            return Err(SpecError::WidthTooSmall { width });
        }
        if !width.is_power_of_two() {
            return Err(SpecError::WidthNotPowerOfTwo { width });
        }
        if height > MAX_CB_DIM {
            return Err(SpecError::HeightTooLarge { height });
        }
        if height < MIN_CB_DIM {
            return Err(SpecError::HeightTooSmall { height });
        }
        if !height.is_power_of_two() {
            return Err(SpecError::HeightNotPowerOfTwo { height });
        }
        if width * height > MAX_CB_AREA {
            return Err(SpecError::AreaTooLarge { width, height });
        }
        Ok(CodeBlockSize { width, height })
    }
}

/// Where a value is installed.
#[derive(Debug, Clone, Copy)]
enum Target {
    Default,
    Component(usize),
    Tile(usize),
    TileComponent(usize, usize),
}

/// Code-block sizes of every tile-component.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeBlockSizeSpec {
    spec: ModuleSpec<CodeBlockSize>,
    max_width: u32,
    max_height: u32,
}

impl CodeBlockSizeSpec {
    pub fn new(num_tiles: usize, num_comps: usize, spec_type: SpecType) -> CodeBlockSizeSpec {
        CodeBlockSizeSpec {
            spec: ModuleSpec::new(num_tiles, num_comps, spec_type),
            max_width: 0,
            max_height: 0,
        }
    }

    /// Parse a `Cblksiz` option value.
    ///
    /// The first size given also becomes the default. A `t` token followed by
    /// a `c` token, or the reverse, selects tile-components. The selection is
    /// kept for the sizes that follow until another `t` or `c` token.
    pub fn parse(
        option: &str,
        num_tiles: usize,
        num_comps: usize,
        spec_type: SpecType,
    ) -> Result<CodeBlockSizeSpec, SpecError> {
        info!("Parsing code-block sizes {:?}", option);
        let mut spec = CodeBlockSizeSpec::new(num_tiles, num_comps, spec_type);

        let mut current = ValueType::Default;
        let mut tiles: Vec<bool> = Vec::new();
        let mut comps: Vec<bool> = Vec::new();
        let mut first = true;

        let mut words = option.split_whitespace();
        while let Some(word) = words.next() {
            if word.starts_with('t') {
                tiles = parse_idx(word, num_tiles)?;
                current = if current == ValueType::ComponentDefault {
                    ValueType::TileComponent
                } else {
                    ValueType::TileDefault
                };
                continue;
            }
            if word.starts_with('c') {
                comps = parse_idx(word, num_comps)?;
                current = if current == ValueType::TileDefault {
                    ValueType::TileComponent
                } else {
                    ValueType::ComponentDefault
                };
                continue;
            }
            if !word.starts_with(|c: char| c.is_ascii_digit()) {
                return Err(SpecError::BadConstruction {
                    word: word.to_string(),
                });
            }

            let width: u32 = word.parse().map_err(|_| SpecError::BadWidth {
                word: word.to_string(),
            })?;
            let height_word = words.next().ok_or(SpecError::MissingHeight)?;
            let height: u32 = height_word.parse().map_err(|_| SpecError::BadHeight {
                word: height_word.to_string(),
            })?;
            let size = CodeBlockSize::new(width, height)?;

            if first {
                spec.install(Target::Default, size)?;
                first = false;
            }

            match current {
                ValueType::Default => spec.install(Target::Default, size)?,
                ValueType::ComponentDefault => {
                    for comp in selected(&comps) {
                        spec.install(Target::Component(comp), size)?;
                    }
                }
                ValueType::TileDefault => {
                    for tile in selected(&tiles) {
                        spec.install(Target::Tile(tile), size)?;
                    }
                }
                ValueType::TileComponent => {
                    for tile in selected(&tiles) {
                        for comp in selected(&comps) {
                            spec.install(Target::TileComponent(tile, comp), size)?;
                        }
                    }
                }
            }
        }

        Ok(spec)
    }

    /// Store a value and update the largest dimensions seen.
    fn install(&mut self, target: Target, size: CodeBlockSize) -> Result<(), SpecError> {
        debug!("Code-block size {:?} for {:?}", size, target);
        match target {
            Target::Default => self.spec.set_default(size),
            Target::Component(comp) => self.spec.set_comp_def(comp, size)?,
            Target::Tile(tile) => self.spec.set_tile_def(tile, size)?,
            Target::TileComponent(tile, comp) => self.spec.set_tile_comp_val(tile, comp, size)?,
        }
        self.track_max(size);
        Ok(())
    }

    /// Every stored value passes through here.
    fn track_max(&mut self, size: CodeBlockSize) {
        self.max_width = self.max_width.max(size.width);
        self.max_height = self.max_height.max(size.height);
    }

    pub fn set_default(&mut self, size: CodeBlockSize) {
        debug!("Default code-block size {:?}", size);
        self.spec.set_default(size);
        self.track_max(size);
    }

    pub fn set_comp_def(&mut self, comp: usize, size: CodeBlockSize) -> Result<(), SpecError> {
        self.install(Target::Component(comp), size)
    }

    pub fn set_tile_def(&mut self, tile: usize, size: CodeBlockSize) -> Result<(), SpecError> {
        self.install(Target::Tile(tile), size)
    }

    pub fn set_tile_comp_val(
        &mut self,
        tile: usize,
        comp: usize,
        size: CodeBlockSize,
    ) -> Result<(), SpecError> {
        self.install(Target::TileComponent(tile, comp), size)
    }

    fn lookup(&self, value_type: ValueType, tile: usize, comp: usize) -> Result<CodeBlockSize, SpecError> {
        let size = match value_type {
            ValueType::Default => self.spec.default(),
            ValueType::ComponentDefault => self.spec.comp_def(comp),
            ValueType::TileDefault => self.spec.tile_def(tile),
            ValueType::TileComponent => self.spec.tile_comp_val(tile, comp),
        };
        size.copied().ok_or(SpecError::NotSpecified {
            tile,
            component: comp,
        })
    }

    /// Width of the value of the given type, `tile` and `comp` are ignored
    /// where the type does not use them.
    pub fn cblk_width(&self, value_type: ValueType, tile: usize, comp: usize) -> Result<u32, SpecError> {
        Ok(self.lookup(value_type, tile, comp)?.width)
    }

    pub fn cblk_height(&self, value_type: ValueType, tile: usize, comp: usize) -> Result<u32, SpecError> {
        Ok(self.lookup(value_type, tile, comp)?.height)
    }

    /// The size in use for a tile-component.
    pub fn code_block_size(&self, tile: usize, comp: usize) -> Result<CodeBlockSize, SpecError> {
        self.spec.spec(tile, comp).map(|size| *size)
    }

    /// Largest width ever installed, whether in use or not.
    pub fn max_cblk_width(&self) -> u32 {
        self.max_width
    }

    pub fn max_cblk_height(&self) -> u32 {
        self.max_height
    }

    pub fn module_spec(&self) -> &ModuleSpec<CodeBlockSize> {
        &self.spec
    }
}

fn selected(flags: &[bool]) -> impl Iterator<Item = usize> + '_ {
    flags
        .iter()
        .enumerate()
        .filter(|(_, set)| **set)
        .map(|(index, _)| index)
}
