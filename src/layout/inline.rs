//! Horizontal layout: every block is a single row, stacks grow to the right
//! and blocks join through tabs on their left and right sides.

use crate::renderer::path::{reporter_outline, ResolvedPath};
use crate::workspace::{Block, InputKind, Slot};

use super::config::{InlineConfig, LayoutConfig};
use super::error::LayoutError;
use super::measure::{
    content_height, content_width, input_elements, place_elements, socket_connections,
    PendingElement,
};
use super::strategy::{LayoutStrategy, MeasureContext};
use super::types::{Bay, BlockMetrics, Extent, Point, RowKind, RowMetrics};
use super::LayoutStyle;

#[derive(Debug, Clone, Default)]
pub struct InlineLayout {
    config: LayoutConfig,
}

impl InlineLayout {
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    fn constants(&self) -> &InlineConfig {
        &self.config.inline
    }

    /// Tab sticking out of a vertical edge at `x`, top at `y`
    fn tab(&self, path: &mut ResolvedPath, x: f64, y: f64) {
        let c = self.constants();
        path.line_to(x, y);
        path.line_to(x + c.notch_width, y);
        path.line_to(x + c.notch_width, y + c.notch_height);
        path.line_to(x, y + c.notch_height);
    }

    /// Recess cut into a vertical edge at `x`, drawn bottom to top
    fn recess(&self, path: &mut ResolvedPath, x: f64, y: f64) {
        let c = self.constants();
        path.line_to(x, y + c.notch_height);
        path.line_to(x + c.notch_width, y + c.notch_height);
        path.line_to(x + c.notch_width, y);
        path.line_to(x, y);
    }
}

impl LayoutStrategy for InlineLayout {
    fn style(&self) -> LayoutStyle {
        LayoutStyle::Inline
    }

    fn measure(&self, block: &Block, ctx: &MeasureContext<'_>) -> Result<BlockMetrics, LayoutError> {
        let c = self.constants();
        let statements: Vec<usize> = block
            .inputs
            .iter()
            .enumerate()
            .filter(|(_, input)| input.kind == InputKind::Statement)
            .map(|(index, _)| index)
            .collect();
        if statements.len() > 1 {
            return Err(LayoutError::invalid_layout(
                &block.type_name,
                format!(
                    "{} statement inputs, a horizontal block holds at most one",
                    statements.len()
                ),
            ));
        }

        let elements: Vec<PendingElement> = (0..block.inputs.len())
            .flat_map(|index| input_elements(block, index, ctx, &self.config, &c.sockets))
            .collect();
        let mut width =
            (content_width(&elements, c.sep_space_x) + 2.0 * c.edge_padding).max(c.min_block_width);
        let mut height =
            (content_height(&elements) + 2.0 * c.edge_padding).max(c.min_block_height);

        let bay = statements.first().map(|&input| {
            let child = ctx.child(Slot::Input(input));
            // the child's side tab already sits inside the bay wall
            let bay = Bay {
                x: 0.0,
                y: c.bay_arm,
                width: child.map_or(c.min_bay_width, |e| e.width.max(c.min_bay_width)),
                height: child.map_or(c.min_bay_height, |e| {
                    (e.height - c.notch_height).max(c.min_bay_height)
                }),
                notch_at_bottom: child.map_or(true, |e| e.open_tail),
            };
            (input, bay)
        });
        if let Some((_, bay)) = &bay {
            height = height.max(bay.height + 2.0 * c.bay_arm);
        }

        let mut connections = Vec::new();
        let placed = place_elements(&elements, c.edge_padding, 0.0, height, c.sep_space_x);
        connections.extend(socket_connections(&placed));
        let mut rows = vec![RowMetrics {
            kind: RowKind::Inline,
            y: 0.0,
            width,
            height,
            elements: placed,
        }];

        if let Some((input, mut bay)) = bay {
            bay.x = width;
            connections.push((Slot::Input(input), Point::new(bay.x, bay.y)));
            rows.push(RowMetrics {
                kind: RowKind::Statement { input, bay },
                y: bay.y,
                width: bay.width,
                height: bay.height,
                elements: Vec::new(),
            });
            width += bay.width + c.bay_arm;
        }

        if block.output.is_some() {
            connections.push((Slot::Output, Point::new(0.0, 0.0)));
        }
        if block.previous.is_some() {
            connections.push((Slot::Previous, Point::new(0.0, 0.0)));
        }
        if block.next.is_some() {
            connections.push((Slot::Next, Point::new(width, 0.0)));
        }
        connections.sort_by_key(|(slot, _)| *slot);

        Ok(BlockMetrics {
            width,
            height,
            hat: false,
            rows,
            connections,
        })
    }

    fn stack_extent(&self, own: Extent, below: Option<Extent>) -> Extent {
        match below {
            Some(below) => Extent::new(
                own.width + below.width,
                own.height.max(below.height),
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
        let (w, h) = (metrics.width, metrics.height);
        let mut path = ResolvedPath::new();

        path.move_to(0.0, 0.0);
        path.line_to(w, 0.0);
        if block.next.is_some() {
            self.tab(&mut path, w, c.notch_start_padding);
        }
        path.line_to(w, h);
        path.line_to(0.0, h);
        if block.previous.is_some() {
            self.recess(&mut path, 0.0, c.notch_start_padding);
        }
        path.close();

        for bay in metrics.bays() {
            let (right, bottom) = (bay.x + bay.width, bay.y + bay.height);
            let notch_y = bay.y + c.notch_start_padding;
            let mut hole = ResolvedPath::new();
            hole.move_to(bay.x, bay.y);
            hole.line_to(right, bay.y);
            if bay.notch_at_bottom {
                self.tab(&mut hole, right, notch_y);
            }
            hole.line_to(right, bottom);
            hole.line_to(bay.x, bottom);
            self.recess(&mut hole, bay.x, notch_y);
            hole.close();
            path.extend(hole);
        }
        path
    }
}
