//! SVG renderer for laid-out workspaces
//!
//! Walks the blocks of a workspace after a render pass and produces an SVG
//! string with CSS classes for category, shadow and drag-preview state.

pub mod config;
pub mod path;
pub mod svg;

pub use config::SvgConfig;
pub use path::{PathSegment, ResolvedPath};
pub use svg::{render_svg, SvgBuilder};
