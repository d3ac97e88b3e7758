//! Code-blocks.
//!
//! Every subband is partitioned into code-blocks, which are entropy coded
//! independently. The partition is anchored on the canvas at the code-block
//! partition origin, each axis of which is 0 or 1, so the first and last
//! code-blocks of a row or column may be clipped by the subband bounds.

use std::error;
use std::fmt;

use log::{debug, info};

use crate::code_block_size::{CodeBlockSize, CodeBlockSizeSpec};
use crate::entropy::num_stripes;
use crate::module_spec::SpecError;
use crate::subband::{SubBandType, Subband, SubbandId, SubbandPayload, SubbandTree};

/// Kind of the coefficients of a code-block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataKind {
    Int,
    Float,
}

/// Coefficient types a code-block can hold.
pub trait Sample: Copy + Default + fmt::Debug + PartialEq {
    const KIND: DataKind;
}

impl Sample for i32 {
    const KIND: DataKind = DataKind::Int;
}

impl Sample for f32 {
    const KIND: DataKind = DataKind::Float;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeBlockError {
    /// Each axis of the partition origin must be 0 or 1.
    InvalidPartitionOrigin { origin: (u32, u32) },

    /// The partition origin lies right of or below the subband.
    OriginAfterSubband { ulcx: u32, ulcy: u32 },

    /// The buffer is too short for the code-block geometry.
    DataTooShort { expected: usize, available: usize },

    /// The scan width is smaller than the code-block width.
    ScanWidthTooSmall { scanw: usize, width: usize },

    Spec(SpecError),
}

impl error::Error for CodeBlockError {}
impl fmt::Display for CodeBlockError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::InvalidPartitionOrigin { origin } => {
                write!(f, "invalid code-block partition origin {:?}", origin)
            }
            Self::OriginAfterSubband { ulcx, ulcy } => write!(
                f,
                "code-block partition origin lies after the subband at ({}, {})",
                ulcx, ulcy
            ),
            Self::DataTooShort {
                expected,
                available,
            } => write!(
                f,
                "code-block data too short, {} samples needed but {} available",
                expected, available
            ),
            Self::ScanWidthTooSmall { scanw, width } => write!(
                f,
                "scan width {} is smaller than the code-block width {}",
                scanw, width
            ),
            Self::Spec(e) => write!(f, "{}", e),
        }
    }
}

impl From<SpecError> for CodeBlockError {
    fn from(e: SpecError) -> CodeBlockError {
        CodeBlockError::Spec(e)
    }
}

/// Position of one code-block in its subband.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeBlockLayout {
    /// Upper left corner in the tile-component.
    pub ulx: u32,
    pub uly: u32,

    /// Column index in the subband.
    pub n: u32,

    /// Row index in the subband.
    pub m: u32,

    pub w: u32,
    pub h: u32,
}

impl CodeBlockLayout {
    /// Stripes the bit-plane coder scans this code-block in.
    pub fn num_stripes(&self) -> u32 {
        num_stripes(self.h)
    }
}

/// Partition of one subband into code-blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlockGrid {
    ulx: u32,
    uly: u32,
    ulcx: i64,
    ulcy: i64,
    w: i64,
    h: i64,
    cbw: i64,
    cbh: i64,

    /// Partition origin in subband coordinates.
    x0: i64,
    y0: i64,

    /// Partition indices of the first column and row.
    l0: i64,
    k0: i64,

    cols: u32,
    rows: u32,
}

fn floor_div(a: i64, b: i64) -> i64 {
    let q = a / b;
    if a % b != 0 && (a < 0) != (b < 0) {
        q - 1
    } else {
        q
    }
}

impl CodeBlockGrid {
    /// Partition `subband` into code-blocks of nominal `size`.
    ///
    /// High-pass directions anchor the partition at 0, low-pass directions at
    /// the partition origin.
    pub fn new(
        subband: &Subband,
        size: CodeBlockSize,
        origin: (u32, u32),
    ) -> Result<CodeBlockGrid, CodeBlockError> {
        if origin.0 > 1 || origin.1 > 1 {
            return Err(CodeBlockError::InvalidPartitionOrigin { origin });
        }

        let (x0, y0) = match subband.orientation() {
            SubBandType::LL => (origin.0, origin.1),
            SubBandType::HL => (0, origin.1),
            SubBandType::LH => (origin.0, 0),
            SubBandType::HH => (0, 0),
        };
        if subband.ulcx() < x0 || subband.ulcy() < y0 {
            return Err(CodeBlockError::OriginAfterSubband {
                ulcx: subband.ulcx(),
                ulcy: subband.ulcy(),
            });
        }

        let mut grid = CodeBlockGrid {
            ulx: subband.ulx(),
            uly: subband.uly(),
            ulcx: subband.ulcx() as i64,
            ulcy: subband.ulcy() as i64,
            w: subband.width() as i64,
            h: subband.height() as i64,
            cbw: size.width as i64,
            cbh: size.height as i64,
            x0: x0 as i64,
            y0: y0 as i64,
            l0: 0,
            k0: 0,
            cols: 0,
            rows: 0,
        };

        if grid.w > 0 && grid.h > 0 {
            grid.l0 = floor_div(grid.ulcx - grid.x0, grid.cbw);
            grid.k0 = floor_div(grid.ulcy - grid.y0, grid.cbh);
            let l1 = floor_div(grid.ulcx + grid.w - 1 - grid.x0, grid.cbw);
            let k1 = floor_div(grid.ulcy + grid.h - 1 - grid.y0, grid.cbh);
            grid.cols = (l1 - grid.l0 + 1) as u32;
            grid.rows = (k1 - grid.k0 + 1) as u32;
        }

        debug!(
            "{}x{} code-blocks of {}x{} in subband at ({}, {})",
            grid.cols, grid.rows, size.width, size.height, grid.ulcx, grid.ulcy
        );
        Ok(grid)
    }

    /// Code-blocks per row and per column.
    pub fn num_code_blocks(&self) -> (u32, u32) {
        (self.cols, self.rows)
    }

    pub fn len(&self) -> usize {
        self.cols as usize * self.rows as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Code-block in row `m` and column `n`.
    pub fn layout(&self, m: u32, n: u32) -> Option<CodeBlockLayout> {
        if m >= self.rows || n >= self.cols {
            return None;
        }

        let l = self.l0 + n as i64;
        let k = self.k0 + m as i64;

        // canvas extent of the partition cell, clipped to the subband
        let x_start = (self.x0 + l * self.cbw).max(self.ulcx);
        let x_end = (self.x0 + (l + 1) * self.cbw).min(self.ulcx + self.w);
        let y_start = (self.y0 + k * self.cbh).max(self.ulcy);
        let y_end = (self.y0 + (k + 1) * self.cbh).min(self.ulcy + self.h);

        Some(CodeBlockLayout {
            ulx: self.ulx + (x_start - self.ulcx) as u32,
            uly: self.uly + (y_start - self.ulcy) as u32,
            n,
            m,
            w: (x_end - x_start) as u32,
            h: (y_end - y_start) as u32,
        })
    }

    /// Every code-block in raster order.
    pub fn iter(&self) -> impl Iterator<Item = CodeBlockLayout> + '_ {
        (0..self.rows).flat_map(move |m| (0..self.cols).filter_map(move |n| self.layout(m, n)))
    }
}

impl<P: SubbandPayload> SubbandTree<P> {
    /// Store nominal code-block sizes and counts on every leaf.
    pub fn assign_code_blocks(
        &mut self,
        spec: &CodeBlockSizeSpec,
        tile: usize,
        comp: usize,
        origin: (u32, u32),
    ) -> Result<(), CodeBlockError> {
        let size = spec.code_block_size(tile, comp)?;
        info!(
            "Code-blocks of {}x{} for tile {} component {}",
            size.width, size.height, tile, comp
        );

        for leaf in self.leaves() {
            let grid = CodeBlockGrid::new(self.subband(leaf), size, origin)?;
            let subband = self.subband_mut(leaf);
            subband.nom_cblk_w = size.width;
            subband.nom_cblk_h = size.height;
            subband.num_cblks = grid.num_code_blocks();
        }
        Ok(())
    }
}

/// Coefficients of one code-block and the parameters that go with them.
///
/// Sample `(x, y)` of the code-block is `data[offset + y * scanw + x]`.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeBlockData<T: Sample> {
    pub layout: CodeBlockLayout,
    pub subband: Option<SubbandId>,

    offset: usize,
    scanw: usize,
    data: Vec<T>,

    /// Magnitude bits of the coefficients.
    pub magbits: u32,
    pub wmse_scaling: f32,
    pub convert_factor: f64,
    pub step_size: f64,

    /// Region of interest coefficients and bit-planes.
    pub num_roi_coeff: usize,
    pub num_roi_bp: u32,
}

impl<T: Sample> CodeBlockData<T> {
    /// A zeroed, tightly packed code-block.
    pub fn new(layout: CodeBlockLayout) -> CodeBlockData<T> {
        let w = layout.w as usize;
        let h = layout.h as usize;
        CodeBlockData {
            layout,
            subband: None,
            offset: 0,
            scanw: w,
            data: vec![T::default(); w * h],
            magbits: 0,
            wmse_scaling: 1.0,
            convert_factor: 1.0,
            step_size: 1.0,
            num_roi_coeff: 0,
            num_roi_bp: 0,
        }
    }

    pub fn data_kind(&self) -> DataKind {
        T::KIND
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn scanw(&self) -> usize {
        self.scanw
    }

    /// Replace the buffer, which must hold every sample of the code-block.
    pub fn set_data(&mut self, data: Vec<T>, offset: usize, scanw: usize) -> Result<(), CodeBlockError> {
        let w = self.layout.w as usize;
        let h = self.layout.h as usize;
        if scanw < w {
            return Err(CodeBlockError::ScanWidthTooSmall { scanw, width: w });
        }
        let expected = if w == 0 || h == 0 {
            0
        } else {
            offset + (h - 1) * scanw + w
        };
        if data.len() < expected {
            return Err(CodeBlockError::DataTooShort {
                expected,
                available: data.len(),
            });
        }

        self.data = data;
        self.offset = offset;
        self.scanw = scanw;
        Ok(())
    }

    fn index(&self, x: u32, y: u32) -> Option<usize> {
        if x >= self.layout.w || y >= self.layout.h {
            return None;
        }
        Some(self.offset + y as usize * self.scanw + x as usize)
    }

    pub fn sample(&self, x: u32, y: u32) -> Option<T> {
        self.index(x, y).map(|i| self.data[i])
    }

    pub fn sample_mut(&mut self, x: u32, y: u32) -> Option<&mut T> {
        let i = self.index(x, y)?;
        self.data.get_mut(i)
    }

    /// Row `y` of the code-block.
    pub fn row(&self, y: u32) -> Option<&[T]> {
        let start = self.index(0, y)?;
        Some(&self.data[start..start + self.layout.w as usize])
    }
}
