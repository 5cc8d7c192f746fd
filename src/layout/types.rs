//! Core geometry types for the layout engine

use serde::{Deserialize, Serialize};

use crate::workspace::Slot;

/// A 2D point in workspace coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Return this point shifted by the given offsets
    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Return this point shifted by another point treated as a vector
    pub fn translate(self, by: Point) -> Self {
        self.offset(by.x, by.y)
    }

    /// Euclidean distance between two points
    pub fn distance(self, other: Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// A bounding box representing the spatial extent of a block or region
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a zero-sized bounding box at the origin
    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }

    /// Right edge x-coordinate
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge y-coordinate
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Check if this bounding box contains a point (edges inclusive)
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.x <= self.right()
            && point.y >= self.y
            && point.y <= self.bottom()
    }

    /// Grow by `margin` on every side
    pub fn inflate(&self, margin: f64) -> BoundingBox {
        BoundingBox::new(
            self.x - margin,
            self.y - margin,
            self.width + 2.0 * margin,
            self.height + 2.0 * margin,
        )
    }

    /// Compute the union of two bounding boxes (smallest box containing both)
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        BoundingBox::new(x, y, right - x, bottom - y)
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::zero()
    }
}

/// Size of a block together with everything stacked below it.
///
/// `open_tail` is false when the last block of the stack has no next
/// connection, so nothing can ever attach underneath it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub width: f64,
    pub height: f64,
    pub open_tail: bool,
}

impl Extent {
    pub fn new(width: f64, height: f64, open_tail: bool) -> Self {
        Self {
            width,
            height,
            open_tail,
        }
    }
}

/// Shape of a value socket or of a reporter's output tab
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    Hexagonal,
    #[default]
    Round,
    Square,
    None,
}

/// What a measured element inside a row is
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ElementKind {
    /// Field `field` of input `input`
    Field { input: usize, field: usize },
    /// The value socket of input `input`; `occupied` when a child fills it
    Socket {
        input: usize,
        shape: Shape,
        occupied: bool,
    },
}

/// A positioned element, relative to the block's top-left corner
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementMetrics {
    pub kind: ElementKind,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// The notched interior region that holds a nested statement stack
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bay {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Whether a notch is drawn where the nested stack's tail would attach
    pub notch_at_bottom: bool,
}

/// Row kinds produced by the layout strategies
#[derive(Debug, Clone, PartialEq)]
pub enum RowKind {
    /// Fields and value sockets packed left to right
    Inline,
    /// A statement input's bay
    Statement { input: usize, bay: Bay },
}

/// A laid-out row
#[derive(Debug, Clone, PartialEq)]
pub struct RowMetrics {
    pub kind: RowKind,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub elements: Vec<ElementMetrics>,
}

impl RowMetrics {
    /// The bay of a statement row
    pub fn bay(&self) -> Option<&Bay> {
        match &self.kind {
            RowKind::Statement { bay, .. } => Some(bay),
            RowKind::Inline => None,
        }
    }
}

/// Full measurement of one block, relative to its top-left corner
#[derive(Debug, Clone, PartialEq)]
pub struct BlockMetrics {
    pub width: f64,
    pub height: f64,
    /// True when the block is drawn with a curved hat cap
    pub hat: bool,
    pub rows: Vec<RowMetrics>,
    /// Connection offsets, sorted by slot
    pub connections: Vec<(Slot, Point)>,
}

impl BlockMetrics {
    /// Offset of a connection relative to the block origin
    pub fn connection_offset(&self, slot: Slot) -> Option<Point> {
        self.connections
            .iter()
            .find(|(s, _)| *s == slot)
            .map(|(_, p)| *p)
    }

    /// All statement bays, top to bottom
    pub fn bays(&self) -> impl Iterator<Item = &Bay> {
        self.rows.iter().filter_map(RowMetrics::bay)
    }
}

/// Result of `Workspace::layout`: size plus absolute connection positions
#[derive(Debug, Clone, PartialEq)]
pub struct BlockLayout {
    pub width: f64,
    pub height: f64,
    pub connections: Vec<(Slot, Point)>,
}
