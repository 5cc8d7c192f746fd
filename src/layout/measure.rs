//! Element measurement shared by both layout styles

use crate::workspace::{Block, Field, InputKind, Slot};

use super::config::{LayoutConfig, SocketSizes};
use super::strategy::MeasureContext;
use super::types::{ElementKind, ElementMetrics};

/// An element whose size is known but which is not yet placed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingElement {
    pub kind: ElementKind,
    pub width: f64,
    pub height: f64,
}

/// Width and height of a field
pub fn measure_field(field: &Field, config: &LayoutConfig) -> (f64, f64) {
    let text_width = |text: &str| text.chars().count() as f64 * config.char_width;
    match field {
        Field::Label { text } => (text_width(text), config.label_height),
        Field::Text { .. } | Field::Number { .. } => (
            text_width(&field.display_text()).max(config.min_editable_width),
            config.label_height,
        ),
        Field::Dropdown { .. } | Field::Variable { .. } => (
            text_width(&field.display_text())
                + 2.0 * config.box_field_padding
                + config.dropdown_arrow_width,
            config.box_field_height,
        ),
        Field::Image { width, height, .. } => (*width, *height),
    }
}

/// The fields of an input followed by its value socket, if any. An occupied
/// socket takes the size of the attached child.
pub fn input_elements(
    block: &Block,
    index: usize,
    ctx: &MeasureContext<'_>,
    config: &LayoutConfig,
    sockets: &SocketSizes,
) -> Vec<PendingElement> {
    let Some(input) = block.inputs.get(index) else {
        return Vec::new();
    };
    let mut elements: Vec<PendingElement> = input
        .fields
        .iter()
        .enumerate()
        .map(|(field, value)| {
            let (width, height) = measure_field(value, config);
            PendingElement {
                kind: ElementKind::Field {
                    input: index,
                    field,
                },
                width,
                height,
            }
        })
        .collect();

    if input.kind == InputKind::Value {
        let shape = input.socket_shape();
        let (width, height, occupied) = match ctx.child(Slot::Input(index)) {
            Some(extent) => (extent.width, extent.height, true),
            None => {
                let (width, height) = sockets.size(shape);
                (width, height, false)
            }
        };
        elements.push(PendingElement {
            kind: ElementKind::Socket {
                input: index,
                shape,
                occupied,
            },
            width,
            height,
        });
    }
    elements
}

/// Total width of elements separated by `gap`
pub fn content_width(elements: &[PendingElement], gap: f64) -> f64 {
    let widths: f64 = elements.iter().map(|e| e.width).sum();
    widths + gap * elements.len().saturating_sub(1) as f64
}

pub fn content_height(elements: &[PendingElement]) -> f64 {
    elements.iter().map(|e| e.height).fold(0.0, f64::max)
}

/// Place elements left to right from `x`, each centred vertically in the
/// row spanning `row_y..row_y + height`
pub fn place_elements(
    elements: &[PendingElement],
    x: f64,
    row_y: f64,
    height: f64,
    gap: f64,
) -> Vec<ElementMetrics> {
    let mut cursor = x;
    elements
        .iter()
        .map(|element| {
            let placed = ElementMetrics {
                kind: element.kind,
                x: cursor,
                y: row_y + (height - element.height) / 2.0,
                width: element.width,
                height: element.height,
            };
            cursor += element.width + gap;
            placed
        })
        .collect()
}

/// Offset of every value socket, keyed by its input slot
pub fn socket_connections(elements: &[ElementMetrics]) -> impl Iterator<Item = (Slot, super::Point)> + '_ {
    elements.iter().filter_map(|element| match element.kind {
        ElementKind::Socket { input, .. } => {
            Some((Slot::Input(input), super::Point::new(element.x, element.y)))
        }
        ElementKind::Field { .. } => None,
    })
}
