//! Subband decomposition tree.
//!
//! Each component of a tile is decomposed by the wavelet transform into a
//! tree of subbands. The root is the whole tile-component, splitting a node
//! gives four children LL, HL, LH and HH, and only leaves are real subbands
//! that get entropy coded. See ITU-T T.800(V4) | ISO/IEC 15444-1:2024 Annex F.
//!
//! The tree is kept in an arena and nodes are referred to by `SubbandId`.
//! Encoder and decoder trees share the geometry in `Subband` and differ only
//! in the payload carried by every node.

use std::error;
use std::fmt;

use log::{debug, info};

use crate::wavelet::FilterType;

/// Orientation of a subband relative to its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubBandType {
    LL,
    HL,
    LH,
    HH,
}

impl SubBandType {
    /// Position among the children of the parent, also the low bits of the
    /// subband index.
    pub fn index(&self) -> usize {
        match self {
            SubBandType::LL => 0,
            SubBandType::HL => 1,
            SubBandType::LH => 2,
            SubBandType::HH => 3,
        }
    }
}

/// Reference to a node of a `SubbandTree`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubbandId(usize);

impl SubbandId {
    pub fn index(&self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubbandError {
    /// The horizontal or vertical filter list is empty.
    NoFilters,

    /// The subband was already split.
    AlreadySplit { id: SubbandId },

    /// The operation is only defined on leaves.
    NotALeaf { id: SubbandId },

    ResolutionLevelOutOfRange { res_level: usize, max: usize },

    NoSuchSubband { res_level: usize, index: usize },

    /// The point lies outside the subband the search started from.
    PointOutside { x: u32, y: u32 },
}

impl error::Error for SubbandError {}
impl fmt::Display for SubbandError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::NoFilters => write!(f, "no wavelet filters supplied"),
            Self::AlreadySplit { id } => write!(f, "subband {} is already split", id.0),
            Self::NotALeaf { id } => write!(f, "subband {} is not a leaf", id.0),
            Self::ResolutionLevelOutOfRange { res_level, max } => write!(
                f,
                "resolution level {} out of range, maximum is {}",
                res_level, max
            ),
            Self::NoSuchSubband { res_level, index } => write!(
                f,
                "no subband {} in resolution level {}",
                index, res_level
            ),
            Self::PointOutside { x, y } => {
                write!(f, "point ({}, {}) lies outside the subband", x, y)
            }
        }
    }
}

/// Geometry and bookkeeping of one node.
#[derive(Debug, Clone, PartialEq)]
pub struct Subband {
    pub(crate) orientation: SubBandType,

    /// Decomposition depth, 0 at the root.
    pub(crate) level: usize,

    /// Resolution level the subband contributes to.
    pub(crate) res_level: usize,

    /// Upper left corner in the tile-component.
    pub(crate) ulx: u32,
    pub(crate) uly: u32,
    pub(crate) w: u32,
    pub(crate) h: u32,

    /// Upper left corner on the canvas.
    pub(crate) ulcx: u32,
    pub(crate) ulcy: u32,

    /// Base 2 exponent of the analysis gain.
    pub(crate) an_gain_exp: u32,

    pub(crate) subband_index: usize,
    pub(crate) is_node: bool,

    pub(crate) nom_cblk_w: u32,
    pub(crate) nom_cblk_h: u32,

    /// Code-blocks per row and per column.
    pub(crate) num_cblks: (u32, u32),

    /// Filters the node was split with.
    pub(crate) hfilter: Option<FilterType>,
    pub(crate) vfilter: Option<FilterType>,

    pub(crate) parent: Option<SubbandId>,

    /// LL, HL, LH and HH once split.
    pub(crate) children: Option<[SubbandId; 4]>,
}

impl Subband {
    fn root(w: u32, h: u32, ulcx: u32, ulcy: u32, levels: usize) -> Subband {
        Subband {
            orientation: SubBandType::LL,
            level: 0,
            res_level: levels,
            ulx: 0,
            uly: 0,
            w,
            h,
            ulcx,
            ulcy,
            an_gain_exp: 0,
            subband_index: 0,
            is_node: false,
            nom_cblk_w: 0,
            nom_cblk_h: 0,
            num_cblks: (0, 0),
            hfilter: None,
            vfilter: None,
            parent: None,
            children: None,
        }
    }

    pub fn orientation(&self) -> SubBandType {
        self.orientation
    }

    pub fn level(&self) -> usize {
        self.level
    }

    pub fn res_level(&self) -> usize {
        self.res_level
    }

    pub fn ulx(&self) -> u32 {
        self.ulx
    }

    pub fn uly(&self) -> u32 {
        self.uly
    }

    pub fn width(&self) -> u32 {
        self.w
    }

    pub fn height(&self) -> u32 {
        self.h
    }

    pub fn ulcx(&self) -> u32 {
        self.ulcx
    }

    pub fn ulcy(&self) -> u32 {
        self.ulcy
    }

    pub fn an_gain_exp(&self) -> u32 {
        self.an_gain_exp
    }

    pub fn subband_index(&self) -> usize {
        self.subband_index
    }

    pub fn is_node(&self) -> bool {
        self.is_node
    }

    pub fn nom_cblk_width(&self) -> u32 {
        self.nom_cblk_w
    }

    pub fn nom_cblk_height(&self) -> u32 {
        self.nom_cblk_h
    }

    pub fn num_code_blocks(&self) -> (u32, u32) {
        self.num_cblks
    }

    pub fn hfilter(&self) -> Option<FilterType> {
        self.hfilter
    }

    pub fn vfilter(&self) -> Option<FilterType> {
        self.vfilter
    }

    pub fn parent(&self) -> Option<SubbandId> {
        self.parent
    }

    pub fn children(&self) -> Option<[SubbandId; 4]> {
        self.children
    }

    /// Whether `(x, y)` in tile-component coordinates lies inside.
    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.ulx && y >= self.uly && x - self.ulx < self.w && y - self.uly < self.h
    }
}

/// Data attached to every node of a tree.
pub trait SubbandPayload: Sized + Default + Clone + fmt::Debug {
    /// Called whenever the tree geometry changes.
    fn finish(_tree: &mut SubbandTree<Self>) {}
}

impl SubbandPayload for () {}

/// Encoder side data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisPayload {
    /// L2 norm of the synthesis basis waveform, leaves only.
    pub l2_norm: f64,

    /// Weighted MSE of a quantization step, set with
    /// `SubbandTree::set_quantization_step`.
    pub step_wmse: f64,
}

impl SubbandPayload for AnalysisPayload {
    fn finish(tree: &mut SubbandTree<Self>) {
        for leaf in tree.leaves() {
            let (horizontal, vertical) = tree.basis_waveforms(leaf);
            let norm = |waveform: &[f64]| waveform.iter().map(|v| v * v).sum::<f64>().sqrt();
            let l2_norm = norm(&horizontal) * norm(&vertical);
            debug!("Subband {} L2 norm {}", tree.subband(leaf).subband_index, l2_norm);
            tree.payload_mut(leaf).l2_norm = l2_norm;
        }
    }
}

/// Decoder side data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SynthesisPayload {
    /// Magnitude bits of the subband, from the quantization parameters.
    pub magbits: u32,
}

impl SubbandPayload for SynthesisPayload {}

pub type AnalysisTree = SubbandTree<AnalysisPayload>;
pub type SynthesisTree = SubbandTree<SynthesisPayload>;

/// Subband tree of one tile-component.
#[derive(Debug, Clone, PartialEq)]
pub struct SubbandTree<P> {
    nodes: Vec<Subband>,
    payloads: Vec<P>,
}

impl<P: SubbandPayload> SubbandTree<P> {
    /// Dyadic decomposition of a `w` by `h` tile-component with upper left
    /// canvas corner `(ulcx, ulcy)` into `levels` levels.
    ///
    /// The split of resolution level `r` uses filter `r - 1`, or the last
    /// filter when fewer filters than levels are given.
    pub fn build(
        w: u32,
        h: u32,
        ulcx: u32,
        ulcy: u32,
        levels: usize,
        hfilters: &[FilterType],
        vfilters: &[FilterType],
    ) -> Result<SubbandTree<P>, SubbandError> {
        if hfilters.is_empty() || vfilters.is_empty() {
            return Err(SubbandError::NoFilters);
        }
        info!(
            "Subband tree {}x{} at ({}, {}) with {} levels",
            w, h, ulcx, ulcy, levels
        );

        let mut tree = SubbandTree {
            nodes: vec![Subband::root(w, h, ulcx, ulcy, levels)],
            payloads: vec![P::default()],
        };

        let filter_index = |res_level: usize, count: usize| {
            if res_level <= count {
                res_level.saturating_sub(1)
            } else {
                count - 1
            }
        };

        let mut current = tree.root();
        for _ in 0..levels {
            let res_level = tree.subband(current).res_level;
            let hfilter = hfilters[filter_index(res_level, hfilters.len())];
            let vfilter = vfilters[filter_index(res_level, vfilters.len())];
            current = tree.split_node(current, hfilter, vfilter)?;
        }

        P::finish(&mut tree);
        Ok(tree)
    }

    pub fn root(&self) -> SubbandId {
        SubbandId(0)
    }

    /// Number of nodes, internal ones included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn subband(&self, id: SubbandId) -> &Subband {
        &self.nodes[id.0]
    }

    pub(crate) fn subband_mut(&mut self, id: SubbandId) -> &mut Subband {
        &mut self.nodes[id.0]
    }

    pub fn payload(&self, id: SubbandId) -> &P {
        &self.payloads[id.0]
    }

    pub fn payload_mut(&mut self, id: SubbandId) -> &mut P {
        &mut self.payloads[id.0]
    }

    pub fn parent(&self, id: SubbandId) -> Option<SubbandId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: SubbandId) -> Option<[SubbandId; 4]> {
        self.nodes[id.0].children
    }

    pub fn child(&self, id: SubbandId, orientation: SubBandType) -> Option<SubbandId> {
        self.children(id).map(|children| children[orientation.index()])
    }

    /// Split a leaf into four children, returning the LL child.
    pub fn split(
        &mut self,
        id: SubbandId,
        hfilter: FilterType,
        vfilter: FilterType,
    ) -> Result<SubbandId, SubbandError> {
        let ll = self.split_node(id, hfilter, vfilter)?;
        P::finish(self);
        Ok(ll)
    }

    fn split_node(
        &mut self,
        id: SubbandId,
        hfilter: FilterType,
        vfilter: FilterType,
    ) -> Result<SubbandId, SubbandError> {
        let parent = self.nodes[id.0].clone();
        if parent.is_node {
            return Err(SubbandError::AlreadySplit { id });
        }

        let level = parent.level + 1;
        let child = |orientation| Subband {
            orientation,
            level,
            res_level: parent.res_level,
            parent: Some(id),
            ..Subband::root(0, 0, 0, 0, 0)
        };

        // The low-pass half takes the extra sample when the canvas origin is
        // even.
        let mut ll = child(SubBandType::LL);
        ll.ulcx = (parent.ulcx + 1) >> 1;
        ll.ulcy = (parent.ulcy + 1) >> 1;
        ll.ulx = parent.ulx;
        ll.uly = parent.uly;
        ll.w = ((parent.ulcx + parent.w + 1) >> 1) - ll.ulcx;
        ll.h = ((parent.ulcy + parent.h + 1) >> 1) - ll.ulcy;
        // only the all low-pass path moves down a resolution level
        if parent.orientation == SubBandType::LL {
            ll.res_level = parent.res_level.saturating_sub(1);
        }
        ll.an_gain_exp = parent.an_gain_exp;
        ll.subband_index = parent.subband_index << 2;

        let mut hl = child(SubBandType::HL);
        hl.ulcx = parent.ulcx >> 1;
        hl.ulcy = ll.ulcy;
        hl.ulx = parent.ulx + ll.w;
        hl.uly = parent.uly;
        hl.w = ((parent.ulcx + parent.w) >> 1) - hl.ulcx;
        hl.h = ll.h;
        hl.an_gain_exp = parent.an_gain_exp + 1;
        hl.subband_index = (parent.subband_index << 2) + 1;

        let mut lh = child(SubBandType::LH);
        lh.ulcx = ll.ulcx;
        lh.ulcy = parent.ulcy >> 1;
        lh.ulx = parent.ulx;
        lh.uly = parent.uly + ll.h;
        lh.w = ll.w;
        lh.h = ((parent.ulcy + parent.h) >> 1) - lh.ulcy;
        lh.an_gain_exp = parent.an_gain_exp + 1;
        lh.subband_index = (parent.subband_index << 2) + 2;

        let mut hh = child(SubBandType::HH);
        hh.ulcx = hl.ulcx;
        hh.ulcy = lh.ulcy;
        hh.ulx = hl.ulx;
        hh.uly = lh.uly;
        hh.w = hl.w;
        hh.h = lh.h;
        hh.an_gain_exp = parent.an_gain_exp + 2;
        hh.subband_index = (parent.subband_index << 2) + 3;

        let first = self.nodes.len();
        let ids = [
            SubbandId(first),
            SubbandId(first + 1),
            SubbandId(first + 2),
            SubbandId(first + 3),
        ];
        self.nodes.extend([ll, hl, lh, hh]);
        self.payloads.extend((0..4).map(|_| P::default()));

        let node = &mut self.nodes[id.0];
        node.is_node = true;
        node.hfilter = Some(hfilter);
        node.vfilter = Some(vfilter);
        node.children = Some(ids);

        debug!("Split subband {} at level {}", parent.subband_index, parent.level);
        Ok(ids[0])
    }

    /// Descend through LL children to a leaf.
    fn first_leaf(&self, mut id: SubbandId) -> SubbandId {
        while let Some(children) = self.nodes[id.0].children {
            id = children[0];
        }
        id
    }

    /// The next leaf of the same resolution level, `None` after the last.
    ///
    /// Leaves of a resolution level are visited in LL, HL, LH, HH order,
    /// depth first.
    pub fn next_subband(&self, id: SubbandId) -> Result<Option<SubbandId>, SubbandError> {
        let leaf = &self.nodes[id.0];
        if leaf.is_node {
            return Err(SubbandError::NotALeaf { id });
        }

        // Climb out of HH children, the sibling of the first ancestor that
        // is not HH is next.
        let mut current = id;
        while self.nodes[current.0].orientation == SubBandType::HH {
            match self.nodes[current.0].parent {
                Some(parent) => current = parent,
                None => return Ok(None),
            }
        }

        let parent = match self.nodes[current.0].parent {
            Some(parent) => parent,
            None => return Ok(None),
        };
        let next = match self.nodes[current.0].orientation {
            SubBandType::LL => {
                if self.nodes[parent.0].res_level != leaf.res_level {
                    return Ok(None);
                }
                self.child(parent, SubBandType::HL)
            }
            SubBandType::HL => self.child(parent, SubBandType::LH),
            SubBandType::LH => self.child(parent, SubBandType::HH),
            SubBandType::HH => None,
        };

        Ok(next.map(|next| self.first_leaf(next)))
    }

    /// The first leaf of the next higher resolution level.
    pub fn next_res_level(&self, id: SubbandId) -> Option<SubbandId> {
        let res_level = self.nodes[id.0].res_level;
        if self.nodes[id.0].level == 0 {
            return None;
        }

        let mut current = id;
        loop {
            current = self.nodes[current.0].parent?;
            if self.nodes[current.0].res_level != res_level {
                break;
            }
        }

        let hl = self.child(current, SubBandType::HL)?;
        Some(self.first_leaf(hl))
    }

    /// Subband `index` of resolution level `res_level`, where 0 is the LL
    /// node of the level and 1 to 3 are its HL, LH and HH children.
    pub fn subband_by_index(
        &self,
        from: SubbandId,
        res_level: usize,
        index: usize,
    ) -> Result<SubbandId, SubbandError> {
        let start = &self.nodes[from.0];
        if res_level > start.res_level {
            return Err(SubbandError::ResolutionLevelOutOfRange {
                res_level,
                max: start.res_level,
            });
        }
        if res_level == start.res_level && index == start.subband_index {
            return Ok(from);
        }

        let no_such = SubbandError::NoSuchSubband { res_level, index };

        let mut current = from;
        if start.subband_index != 0 {
            current = start.parent.ok_or_else(|| no_such.clone())?;
        }
        while self.nodes[current.0].res_level > res_level {
            current = self
                .child(current, SubBandType::LL)
                .ok_or_else(|| no_such.clone())?;
        }
        while self.nodes[current.0].res_level < res_level {
            current = self.nodes[current.0]
                .parent
                .ok_or_else(|| no_such.clone())?;
        }

        match index {
            0 => Ok(current),
            1 => self.child(current, SubBandType::HL).ok_or(no_such),
            2 => self.child(current, SubBandType::LH).ok_or(no_such),
            3 => self.child(current, SubBandType::HH).ok_or(no_such),
            _ => Err(no_such),
        }
    }

    /// The leaf containing the tile-component point `(x, y)`.
    ///
    /// At each node the point is compared with the upper left corner of the
    /// HH child to pick the quadrant.
    pub fn subband_at(&self, from: SubbandId, x: u32, y: u32) -> Result<SubbandId, SubbandError> {
        if !self.nodes[from.0].contains(x, y) {
            return Err(SubbandError::PointOutside { x, y });
        }

        let mut current = from;
        while let Some(children) = self.nodes[current.0].children {
            let hh = &self.nodes[children[3].0];
            current = match (x < hh.ulx, y < hh.uly) {
                (true, true) => children[0],
                (false, true) => children[1],
                (true, false) => children[2],
                (false, false) => children[3],
            };
        }
        Ok(current)
    }

    /// Every leaf, from the lowest resolution level up and in coding order
    /// within a level.
    pub fn leaves(&self) -> Vec<SubbandId> {
        let mut leaves = Vec::new();
        let mut level_start = Some(self.first_leaf(self.root()));
        while let Some(first) = level_start {
            let mut current = Some(first);
            while let Some(id) = current {
                leaves.push(id);
                current = self.next_subband(id).unwrap_or(None);
            }
            level_start = self.next_res_level(first);
        }
        leaves
    }

    /// Synthesis basis waveforms of a leaf, horizontal then vertical.
    ///
    /// Starting from a unit impulse, every ancestor upsamples and filters the
    /// waveform with the low-pass or high-pass synthesis filter it was split
    /// with, depending on the side of the split the leaf is on.
    pub fn basis_waveforms(&self, id: SubbandId) -> (Vec<f64>, Vec<f64>) {
        let mut horizontal = vec![1.0];
        let mut vertical = vec![1.0];

        let mut current = id;
        while let Some(parent) = self.nodes[current.0].parent {
            let node = &self.nodes[parent.0];
            if let (Some(hfilter), Some(vfilter)) = (node.hfilter, node.vfilter) {
                let (h_high, v_high) = match self.nodes[current.0].orientation {
                    SubBandType::LL => (false, false),
                    SubBandType::HL => (true, false),
                    SubBandType::LH => (false, true),
                    SubBandType::HH => (true, true),
                };
                horizontal = if h_high {
                    hfilter.hp_synthesis_waveform(&horizontal)
                } else {
                    hfilter.lp_synthesis_waveform(&horizontal)
                };
                vertical = if v_high {
                    vfilter.hp_synthesis_waveform(&vertical)
                } else {
                    vfilter.lp_synthesis_waveform(&vertical)
                };
            }
            current = parent;
        }
        (horizontal, vertical)
    }
}

impl SubbandTree<AnalysisPayload> {
    /// Set the quantization step of a leaf, as a fraction of the nominal
    /// range of the tile-component.
    ///
    /// The distortion one step adds in the image domain is the squared step
    /// weighted by the energy of the leaf's basis waveform.
    pub fn set_quantization_step(
        &mut self,
        id: SubbandId,
        step: f64,
    ) -> Result<(), SubbandError> {
        if self.nodes[id.0].is_node {
            return Err(SubbandError::NotALeaf { id });
        }
        let payload = &mut self.payloads[id.0];
        payload.step_wmse = step * step * payload.l2_norm * payload.l2_norm;
        debug!("Subband {} step WMSE {}", id.0, payload.step_wmse);
        Ok(())
    }

    /// Quantization steps of a reversible transform: one integer step in a
    /// leaf with analysis gain `g` is `2^-g` of the nominal range.
    pub fn set_reversible_steps(&mut self) {
        for leaf in self.leaves() {
            let step = 1.0 / (1u64 << self.nodes[leaf.0].an_gain_exp) as f64;
            let payload = &mut self.payloads[leaf.0];
            payload.step_wmse = step * step * payload.l2_norm * payload.l2_norm;
        }
    }
}
