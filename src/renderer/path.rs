//! Outline paths
//!
//! Block outlines are built as a list of segments in block-local
//! coordinates and serialised to SVG `d` strings with two decimals.

use std::fmt;

use crate::layout::{Point, Shape};

/// One drawing command, in block-local coordinates
#[derive(Debug, Clone, PartialEq)]
pub enum PathSegment {
    MoveTo(Point),
    LineTo(Point),
    /// Circular arc of `radius` ending at `end`; `sweep` is clockwise on screen
    ArcTo {
        end: Point,
        radius: f64,
        large_arc: bool,
        sweep: bool,
    },
    QuadraticTo { control: Point, end: Point },
    Close,
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::MoveTo(p) => write!(f, "M{:.2} {:.2}", p.x, p.y),
            PathSegment::LineTo(p) => write!(f, "L{:.2} {:.2}", p.x, p.y),
            PathSegment::ArcTo {
                end,
                radius,
                large_arc,
                sweep,
            } => write!(
                f,
                "A{r:.2} {r:.2} 0 {} {} {:.2} {:.2}",
                u8::from(*large_arc),
                u8::from(*sweep),
                end.x,
                end.y,
                r = radius
            ),
            PathSegment::QuadraticTo { control, end } => write!(
                f,
                "Q{:.2} {:.2} {:.2} {:.2}",
                control.x, control.y, end.x, end.y
            ),
            PathSegment::Close => f.write_str("Z"),
        }
    }
}

/// A closed outline, possibly made of several subpaths
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResolvedPath {
    pub segments: Vec<PathSegment>,
}

impl ResolvedPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn move_to(&mut self, x: f64, y: f64) {
        self.segments.push(PathSegment::MoveTo(Point::new(x, y)));
    }

    pub fn line_to(&mut self, x: f64, y: f64) {
        self.segments.push(PathSegment::LineTo(Point::new(x, y)));
    }

    /// Small clockwise arc
    pub fn arc_to(&mut self, x: f64, y: f64, radius: f64) {
        self.segments.push(PathSegment::ArcTo {
            end: Point::new(x, y),
            radius,
            large_arc: false,
            sweep: true,
        });
    }

    pub fn quad_to(&mut self, control: Point, end: Point) {
        self.segments.push(PathSegment::QuadraticTo { control, end });
    }

    pub fn close(&mut self) {
        self.segments.push(PathSegment::Close);
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Append another path's segments, typically a separate subpath
    pub fn extend(&mut self, other: ResolvedPath) {
        self.segments.extend(other.segments);
    }

    /// Whether a line segment ends at this point
    pub fn has_line_to(&self, x: f64, y: f64) -> bool {
        let target = Point::new(x, y);
        self.segments
            .iter()
            .any(|s| matches!(s, PathSegment::LineTo(p) if *p == target))
    }

    /// Shift every point of the path
    pub fn translate(&mut self, dx: f64, dy: f64) {
        for seg in &mut self.segments {
            match seg {
                PathSegment::MoveTo(p) | PathSegment::LineTo(p) => *p = p.offset(dx, dy),
                PathSegment::ArcTo { end, .. } => *end = end.offset(dx, dy),
                PathSegment::QuadraticTo { control, end } => {
                    *control = control.offset(dx, dy);
                    *end = end.offset(dx, dy);
                }
                PathSegment::Close => {}
            }
        }
    }

    /// The `d` attribute: segments separated by single spaces
    pub fn to_svg_d(&self) -> String {
        self.segments
            .iter()
            .map(PathSegment::to_string)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Closed outline of a reporter or an empty socket of the given shape
pub fn reporter_outline(shape: Shape, width: f64, height: f64) -> ResolvedPath {
    let mut path = ResolvedPath::new();
    let half = height / 2.0;
    match shape {
        Shape::Hexagonal => {
            path.move_to(half, 0.0);
            path.line_to(width - half, 0.0);
            path.line_to(width, half);
            path.line_to(width - half, height);
            path.line_to(half, height);
            path.line_to(0.0, half);
        }
        Shape::Round => {
            path.move_to(half, 0.0);
            path.line_to(width - half, 0.0);
            path.arc_to(width - half, height, half);
            path.line_to(half, height);
            path.arc_to(half, 0.0, half);
        }
        Shape::Square | Shape::None => {
            path.move_to(0.0, 0.0);
            path.line_to(width, 0.0);
            path.line_to(width, height);
            path.line_to(0.0, height);
        }
    }
    path.close();
    path
}
