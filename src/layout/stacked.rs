//! Vertical layout: rows stacked top to bottom, statement bays open to the
//! right, and top/bottom notches joining blocks into stacks.

use std::mem;

use crate::renderer::path::{reporter_outline, ResolvedPath};
use crate::workspace::{Block, InputKind, Slot};

use super::config::{LayoutConfig, StackedConfig};
use super::error::LayoutError;
use super::measure::{
    content_height, content_width, input_elements, place_elements, socket_connections,
    PendingElement,
};
use super::strategy::{LayoutStrategy, MeasureContext};
use super::types::{Bay, BlockMetrics, Extent, Point, RowKind, RowMetrics};
use super::LayoutStyle;

#[derive(Debug, Clone, Default)]
pub struct StackedLayout {
    config: LayoutConfig,
}

enum PendingRow {
    Inline(Vec<PendingElement>),
    Statement(usize),
}

impl StackedLayout {
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    fn constants(&self) -> &StackedConfig {
        &self.config.stacked
    }

    /// Group inputs into rows. Every statement input gets its own row with an
    /// inline row above it, even an empty one, so consecutive bays are
    /// separated by an arm.
    fn build_rows(&self, block: &Block, ctx: &MeasureContext<'_>) -> Vec<PendingRow> {
        let c = self.constants();
        let mut rows = Vec::new();
        let mut current: Vec<PendingElement> = Vec::new();

        for (index, input) in block.inputs.iter().enumerate() {
            let group = input_elements(block, index, ctx, &self.config, &c.sockets);
            if !current.is_empty() && !group.is_empty() {
                let widened = content_width(&current, c.sep_space_x)
                    + c.sep_space_x
                    + content_width(&group, c.sep_space_x);
                if widened > c.max_row_width {
                    rows.push(PendingRow::Inline(mem::take(&mut current)));
                }
            }
            current.extend(group);

            if input.kind == InputKind::Statement {
                if !current.is_empty() || !matches!(rows.last(), Some(PendingRow::Inline(_))) {
                    rows.push(PendingRow::Inline(mem::take(&mut current)));
                }
                rows.push(PendingRow::Statement(index));
            }
        }
        if !current.is_empty() || rows.is_empty() {
            rows.push(PendingRow::Inline(current));
        }
        rows
    }

    fn min_row_height(&self, block: &Block) -> f64 {
        let c = self.constants();
        if is_single_field(block) {
            c.min_block_height_single_field_output
        } else if block.output.is_some() {
            c.min_block_height_reporter
        } else {
            c.min_block_height
        }
    }

    fn min_width(&self, block: &Block) -> f64 {
        let c = self.constants();
        if block.output.is_some() {
            if block.shadow {
                c.min_block_width_shadow_output
            } else {
                c.min_block_width_output
            }
        } else if block.first_statement_slot().is_some() {
            c.min_block_width_with_statement
        } else {
            c.min_block_width
        }
    }

    /// Notch cut into an edge drawn left to right
    fn notch_rightward(&self, path: &mut ResolvedPath, x: f64, y: f64) {
        let c = self.constants();
        let start = x + c.notch_start_padding;
        path.line_to(start, y);
        path.line_to(start + c.notch_height, y + c.notch_height);
        path.line_to(start + c.notch_width - c.notch_height, y + c.notch_height);
        path.line_to(start + c.notch_width, y);
    }

    /// Tab on an edge drawn right to left
    fn notch_leftward(&self, path: &mut ResolvedPath, x: f64, y: f64) {
        let c = self.constants();
        let start = x + c.notch_start_padding;
        path.line_to(start + c.notch_width, y);
        path.line_to(start + c.notch_width - c.notch_height, y + c.notch_height);
        path.line_to(start + c.notch_height, y + c.notch_height);
        path.line_to(start, y);
    }
}

/// Hat blocks start a script: nothing can plug in above them
fn is_hat(block: &Block) -> bool {
    block.output.is_none() && block.previous.is_none()
}

/// A reporter whose whole content is one editable field, like a number shadow
fn is_single_field(block: &Block) -> bool {
    block.output.is_some()
        && matches!(block.inputs.as_slice(), [input]
            if input.kind == InputKind::Dummy
                && input.fields.len() == 1
                && input.fields[0].is_editable())
}

impl LayoutStrategy for StackedLayout {
    fn style(&self) -> LayoutStyle {
        LayoutStyle::Stacked
    }

    fn measure(&self, block: &Block, ctx: &MeasureContext<'_>) -> Result<BlockMetrics, LayoutError> {
        let c = self.constants();
        let hat = is_hat(block);
        let padding = if block.output.is_some() {
            c.output_padding(block.output_shape)
        } else {
            c.sep_space_x
        };
        let min_row_height = self.min_row_height(block);

        let mut rows = Vec::new();
        let mut connections = Vec::new();
        let mut y = if hat { c.hat_height } else { 0.0 };

        for (position, pending) in self.build_rows(block, ctx).into_iter().enumerate() {
            match pending {
                PendingRow::Inline(elements) => {
                    let height =
                        (content_height(&elements) + 2.0 * c.sep_space_y).max(min_row_height);
                    let mut width = content_width(&elements, c.sep_space_x) + 2.0 * padding;
                    if position == 0 {
                        if hat {
                            width = width.max(c.hat_width);
                        } else if block.previous.is_some() {
                            width = width
                                .max(c.notch_start_padding + c.notch_width + c.corner_radius);
                        }
                    }
                    let elements = place_elements(&elements, padding, y, height, c.sep_space_x);
                    connections.extend(socket_connections(&elements));
                    rows.push(RowMetrics {
                        kind: RowKind::Inline,
                        y,
                        width,
                        height,
                        elements,
                    });
                    y += height;
                }
                PendingRow::Statement(input) => {
                    let child = ctx.child(Slot::Input(input));
                    let bay = Bay {
                        x: c.statement_arm_width,
                        y,
                        width: child.map_or(c.min_bay_width, |e| e.width.max(c.min_bay_width)),
                        height: child
                            .map_or(c.min_bay_height, |e| e.height.max(c.min_bay_height)),
                        notch_at_bottom: child.map_or(true, |e| e.open_tail),
                    };
                    connections.push((Slot::Input(input), Point::new(bay.x, bay.y)));
                    rows.push(RowMetrics {
                        kind: RowKind::Statement { input, bay },
                        y,
                        width: bay.x + bay.width,
                        height: bay.height,
                        elements: Vec::new(),
                    });
                    y += bay.height;
                }
            }
        }

        if matches!(rows.last().map(|r| &r.kind), Some(RowKind::Statement { .. })) {
            y += c.statement_footer_height;
        }
        let height = y;

        let mut width = rows.iter().map(|r| r.width).fold(self.min_width(block), f64::max);
        if block.output.is_none() {
            if hat {
                width += c.hat_margin;
            }
            if block.next.is_none() {
                width += c.terminal_margin;
            }
        }

        if block.output.is_some() {
            connections.push((Slot::Output, Point::new(0.0, 0.0)));
        }
        if block.previous.is_some() {
            connections.push((Slot::Previous, Point::new(0.0, 0.0)));
        }
        if block.next.is_some() {
            connections.push((Slot::Next, Point::new(0.0, height)));
        }
        connections.sort_by_key(|(slot, _)| *slot);

        Ok(BlockMetrics {
            width,
            height,
            hat,
            rows,
            connections,
        })
    }

    fn stack_extent(&self, own: Extent, below: Option<Extent>) -> Extent {
        match below {
            Some(below) => Extent::new(
                own.width.max(below.width),
                own.height + below.height,
                below.open_tail,
            ),
            None => own,
        }
    }

    fn outline(&self, block: &Block, metrics: &BlockMetrics) -> ResolvedPath {
        if block.output.is_some() {
            return reporter_outline(block.output_shape, metrics.width, metrics.height);
        }
        let c = self.constants();
        let (w, h, r) = (metrics.width, metrics.height, c.corner_radius);
        let mut path = ResolvedPath::new();

        if metrics.hat {
            path.move_to(0.0, c.hat_height);
            path.quad_to(
                Point::new(c.hat_width / 2.0, -c.hat_height),
                Point::new(c.hat_width, c.hat_height),
            );
            path.line_to(w - r, c.hat_height);
            path.arc_to(w, c.hat_height + r, r);
        } else {
            path.move_to(0.0, r);
            path.arc_to(r, 0.0, r);
            if block.previous.is_some() {
                self.notch_rightward(&mut path, 0.0, 0.0);
            }
            path.line_to(w - r, 0.0);
            path.arc_to(w, r, r);
        }

        for bay in metrics.bays() {
            let bottom = bay.y + bay.height;
            path.line_to(w, bay.y);
            self.notch_leftward(&mut path, bay.x, bay.y);
            path.line_to(bay.x, bay.y);
            path.line_to(bay.x, bottom);
            if bay.notch_at_bottom {
                self.notch_rightward(&mut path, bay.x, bottom);
            }
            path.line_to(w, bottom);
        }

        path.line_to(w, h - r);
        path.arc_to(w - r, h, r);
        if block.next.is_some() {
            self.notch_leftward(&mut path, 0.0, h);
        }
        path.line_to(r, h);
        path.arc_to(0.0, h - r, r);
        path.close();
        path
    }
}
