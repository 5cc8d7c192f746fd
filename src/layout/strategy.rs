//! The capability both layout styles implement

use std::collections::BTreeMap;
use std::fmt;

use crate::renderer::path::ResolvedPath;
use crate::workspace::{Block, Slot};

use super::error::LayoutError;
use super::types::{BlockMetrics, Extent};
use super::LayoutStyle;

/// Extents of the children already measured in this pass
#[derive(Debug, Clone, Copy)]
pub struct MeasureContext<'a> {
    children: &'a BTreeMap<Slot, Extent>,
}

impl<'a> MeasureContext<'a> {
    pub fn new(children: &'a BTreeMap<Slot, Extent>) -> Self {
        Self { children }
    }

    /// Extent of the child attached at `slot`, including its stack
    pub fn child(&self, slot: Slot) -> Option<Extent> {
        self.children.get(&slot).copied()
    }
}

/// A layout style: how a block is measured, drawn and stacked
pub trait LayoutStrategy: fmt::Debug {
    fn style(&self) -> LayoutStyle;

    /// Size the block, place its rows and compute connection offsets
    fn measure(&self, block: &Block, ctx: &MeasureContext<'_>) -> Result<BlockMetrics, LayoutError>;

    /// Combine a block's own size with the extent of the stack attached to
    /// its next connection
    fn stack_extent(&self, own: Extent, below: Option<Extent>) -> Extent;

    /// Outline in block-local coordinates
    fn outline(&self, block: &Block, metrics: &BlockMetrics) -> ResolvedPath;
}
