//! Layout engine: measures blocks, builds their outlines and positions
//! children relative to their parents.
//!
//! A render pass runs bottom-up over one stack tree. Each child is measured
//! first so the parent can size its sockets and bays, then the parent places
//! its connections and pulls every child tight against them.

pub mod config;
pub mod error;
pub mod inline;
pub mod measure;
pub mod stacked;
pub mod strategy;
pub mod types;

pub use config::{InlineConfig, LayoutConfig, SocketSizes, StackedConfig};
pub use error::LayoutError;
pub use inline::InlineLayout;
pub use stacked::StackedLayout;
pub use strategy::{LayoutStrategy, MeasureContext};
pub use types::*;

use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use serde::Deserialize;

use crate::workspace::{BlockId, ConnectionRef, Slot, Workspace};

/// Which layout strategy a workspace uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutStyle {
    /// Vertical stacks with C-shaped statement bays
    #[default]
    Stacked,
    /// Horizontal chains of single-row blocks
    Inline,
}

/// Build the strategy for a style
pub fn strategy_for(style: LayoutStyle, config: &LayoutConfig) -> Rc<dyn LayoutStrategy> {
    match style {
        LayoutStyle::Stacked => Rc::new(StackedLayout::new(config.clone())),
        LayoutStyle::Inline => Rc::new(InlineLayout::new(config.clone())),
    }
}

/// Bookkeeping of one render pass
#[derive(Debug, Default)]
pub struct RenderPass {
    /// Extent of every block visited, including its stack
    pub extents: HashMap<BlockId, Extent>,
    pub blocks_measured: usize,
    /// Outlines rebuilt because the measurement changed
    pub paths_built: usize,
}

impl Workspace {
    /// Lay out the whole tree containing `id`
    pub fn render_block(&mut self, id: BlockId) -> Result<RenderPass, LayoutError> {
        let root = self.root_block(id).ok_or(LayoutError::UnknownBlock(id))?;
        let strategy = self.strategy();
        let mut pass = RenderPass::default();
        self.render_tree(root, strategy.as_ref(), &mut pass)?;
        tracing::debug!(
            %root,
            measured = pass.blocks_measured,
            rebuilt = pass.paths_built,
            "render pass"
        );
        Ok(pass)
    }

    /// Lay out every top-level tree
    pub fn render_all(&mut self) -> Result<RenderPass, LayoutError> {
        let strategy = self.strategy();
        let mut pass = RenderPass::default();
        for root in self.top_blocks() {
            self.render_tree(root, strategy.as_ref(), &mut pass)?;
        }
        Ok(pass)
    }

    /// Size and absolute connection positions of a block after a render
    pub fn layout(&mut self, id: BlockId) -> Result<BlockLayout, LayoutError> {
        self.render_block(id)?;
        let block = self.block(id).ok_or(LayoutError::UnknownBlock(id))?;
        let metrics = block
            .metrics
            .as_ref()
            .ok_or_else(|| LayoutError::invalid_layout(&block.type_name, "not measured"))?;
        Ok(BlockLayout {
            width: metrics.width,
            height: metrics.height,
            connections: metrics
                .connections
                .iter()
                .map(|(slot, offset)| (*slot, block.position.translate(*offset)))
                .collect(),
        })
    }

    fn render_tree(
        &mut self,
        id: BlockId,
        strategy: &dyn LayoutStrategy,
        pass: &mut RenderPass,
    ) -> Result<Extent, LayoutError> {
        if let Some(extent) = pass.extents.get(&id) {
            return Ok(*extent);
        }

        let children = self.child_blocks(id);
        let mut extents = BTreeMap::new();
        for (slot, child) in &children {
            extents.insert(*slot, self.render_tree(*child, strategy, pass)?);
        }

        let block = self.block(id).ok_or(LayoutError::UnknownBlock(id))?;
        let metrics = strategy.measure(block, &MeasureContext::new(&extents))?;
        pass.blocks_measured += 1;
        let outline = match (&block.metrics, &block.outline) {
            (Some(previous), Some(_)) if *previous == metrics => None,
            _ => Some(strategy.outline(block, &metrics)),
        };
        let own = Extent::new(metrics.width, metrics.height, block.next.is_some());
        let extent = strategy.stack_extent(own, extents.get(&Slot::Next).copied());
        let position = block.position;
        let offsets = metrics.connections.clone();

        if let Some(block) = self.block_mut(id) {
            if let Some(outline) = outline {
                block.outline = Some(outline);
                pass.paths_built += 1;
            }
            block.metrics = Some(metrics);
        }
        for (slot, offset) in &offsets {
            self.set_connection_position(ConnectionRef::new(id, *slot), position.translate(*offset));
        }

        for (slot, child) in children {
            let Some(anchor) = offsets
                .iter()
                .find(|(s, _)| *s == slot)
                .map(|(_, offset)| position.translate(*offset))
            else {
                continue;
            };
            let Some(plug) = self
                .block(child)
                .and_then(|b| Some(ConnectionRef::new(child, b.plug_slot()?)))
                .and_then(|plug| self.connection(plug))
                .map(|c| c.position)
            else {
                continue;
            };
            self.translate_tree(child, anchor.x - plug.x, anchor.y - plug.y);
        }

        pass.extents.insert(id, extent);
        Ok(extent)
    }
}
