//! Interlock - connection and layout engine for block-based program editors
//!
//! Blocks are declared in TOML, instantiated into a [`Workspace`], joined
//! through typed connections and laid out either as vertical stacks or as
//! horizontal chains. A [`DragSession`] resolves where a dragged stack would
//! land and previews the result with an insertion marker.
//!
//! # Example
//!
//! ```rust
//! use interlock::render;
//!
//! let definitions = r#"
//! [[blocks]]
//! type = "looks_say"
//! message = "say hello"
//! previous = true
//! next = true
//! "#;
//! let program = r#"
//! [[blocks]]
//! type = "looks_say"
//! "#;
//!
//! let svg = render(definitions, program).unwrap();
//! assert!(svg.contains("<svg"));
//! ```

pub mod config;
pub mod definition;
pub mod drag;
pub mod error;
pub mod layout;
pub mod renderer;
pub mod workspace;

pub use config::{ConfigError, EditorConfig, SnapConfig};
pub use definition::{BlockDefinition, BlockRegistry, Mutation};
pub use drag::{Candidate, DragError, DragSession, DropOutcome, PreviewState};
pub use error::{DefinitionError, MessageError};
pub use layout::{BlockLayout, LayoutConfig, LayoutError, LayoutStrategy, LayoutStyle, Point};
pub use renderer::{render_svg, SvgConfig};
pub use workspace::{
    BlockId, BlockState, ConnectionCheck, ConnectionRef, Slot, StateError, Workspace,
    WorkspaceError, WorkspaceState,
};

use std::path::Path;
use std::rc::Rc;

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur in the load-and-render pipeline
#[derive(Debug, Error)]
pub enum EditorError {
    #[error("definition error: {0}")]
    Definition(#[from] DefinitionError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("workspace file error: {0}")]
    State(#[from] StateError),

    #[error("workspace error: {0}")]
    Workspace(#[from] WorkspaceError),

    #[error("layout error: {0}")]
    Layout(#[from] LayoutError),

    #[error("drag error: {0}")]
    Drag(#[from] DragError),
}

/// Configuration for the complete render pipeline
///
/// The file form is an editor configuration with an optional `[svg]` table:
///
/// ```toml
/// style = "stacked"
///
/// [svg]
/// class_prefix = "blk-"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Layout style, layout constants and snap thresholds
    #[serde(flatten)]
    pub editor: EditorConfig,
    /// SVG output configuration
    pub svg: SvgConfig,
    /// Debug mode: log every block's bounds after layout
    #[serde(skip)]
    pub debug: bool,
}

impl RenderConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load configuration from a TOML string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Set the editor configuration
    pub fn with_editor(mut self, config: EditorConfig) -> Self {
        self.editor = config;
        self
    }

    /// Set the SVG configuration
    pub fn with_svg(mut self, config: SvgConfig) -> Self {
        self.svg = config;
        self
    }

    /// Enable or disable debug mode
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

/// Load definitions and a saved workspace into a fresh, laid-out workspace
pub fn load_workspace(
    definitions: &str,
    program: &str,
    config: EditorConfig,
) -> Result<Workspace, EditorError> {
    let registry = BlockRegistry::from_str(definitions)?;
    let state = WorkspaceState::from_str(program)?;
    let mut workspace = Workspace::new(Rc::new(registry), config);
    workspace.load(&state)?;
    workspace.render_all()?;
    Ok(workspace)
}

/// Render a saved workspace to SVG with default configuration
///
/// This is the main entry point for the library. It loads the block
/// definitions, instantiates every saved stack, lays them out and generates
/// SVG output.
pub fn render(definitions: &str, program: &str) -> Result<String, EditorError> {
    render_with_config(definitions, program, RenderConfig::default())
}

/// Render a saved workspace to SVG with custom configuration
///
/// # Example
///
/// ```rust
/// use interlock::{render_with_config, EditorConfig, LayoutStyle, RenderConfig, SvgConfig};
///
/// let definitions = r#"
/// [[blocks]]
/// type = "motion_turn"
/// message = "turn"
/// previous = true
/// next = true
/// "#;
/// let program = r#"
/// [[blocks]]
/// type = "motion_turn"
/// "#;
///
/// let config = RenderConfig::new()
///     .with_editor(EditorConfig::new().with_style(LayoutStyle::Inline))
///     .with_svg(SvgConfig::default().with_viewbox_padding(0.0));
///
/// let svg = render_with_config(definitions, program, config).unwrap();
/// assert!(svg.contains("<svg"));
/// ```
pub fn render_with_config(
    definitions: &str,
    program: &str,
    config: RenderConfig,
) -> Result<String, EditorError> {
    let workspace = load_workspace(definitions, program, config.editor)?;

    if config.debug {
        for root in workspace.top_blocks() {
            for id in workspace.descendants(root) {
                if let Some(block) = workspace.block(id) {
                    let bounds = block.bounds();
                    tracing::info!(
                        block = %id,
                        r#type = %block.type_name,
                        x = bounds.x,
                        y = bounds.y,
                        w = bounds.width,
                        h = bounds.height,
                        "layout"
                    );
                }
            }
        }
    }

    Ok(render_svg(&workspace, &config.svg))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFS: &str = r#"
[[blocks]]
type = "control_forever"
message = "forever %1"
args = [{ kind = "input_statement", name = "SUBSTACK" }]
previous = true

[[blocks]]
type = "looks_say"
message = "say %1"
args = [{ kind = "field_text", name = "MESSAGE", value = "Hello!" }]
previous = true
next = true
"#;

    #[test]
    fn test_render_nested_program() {
        let svg = render(
            DEFS,
            r#"
[[blocks]]
type = "control_forever"
x = 10
y = 10

[blocks.inputs.SUBSTACK.block]
type = "looks_say"
fields = { MESSAGE = "Hi & bye" }
"#,
        )
        .unwrap();
        assert!(svg.contains("ib-control_forever"));
        assert!(svg.contains(">Hi &amp; bye</text>"));
    }

    #[test]
    fn test_render_empty_program() {
        let svg = render(DEFS, "").unwrap();
        assert!(svg.contains("<svg"));
        assert!(!svg.contains("<g"));
    }

    #[test]
    fn test_unknown_type_is_workspace_error() {
        let err = render(DEFS, "[[blocks]]\ntype = \"nope\"\n").unwrap_err();
        assert!(matches!(err, EditorError::Workspace(_)));
    }

    #[test]
    fn test_bad_definitions_are_definition_errors() {
        let err = render("[[blocks]]\ntype = 3\n", "").unwrap_err();
        assert!(matches!(err, EditorError::Definition(_)));
    }

    #[test]
    fn test_render_config_file_shares_editor_keys() {
        let config = RenderConfig::from_str(
            r#"
style = "inline"

[snap]
snap_radius = 30.0

[svg]
class_prefix = "blk-"
"#,
        )
        .unwrap();
        assert_eq!(config.editor.style, LayoutStyle::Inline);
        assert_eq!(config.editor.snap.snap_radius, 30.0);
        assert_eq!(config.svg.class_prefix.as_deref(), Some("blk-"));
        assert!(!config.debug);
    }

    #[test]
    fn test_inline_config_changes_geometry() {
        let program = "[[blocks]]\ntype = \"looks_say\"\n";
        let stacked = load_workspace(DEFS, program, EditorConfig::default()).unwrap();
        let inline = load_workspace(
            DEFS,
            program,
            EditorConfig::default().with_style(LayoutStyle::Inline),
        )
        .unwrap();
        let id = stacked.top_blocks()[0];
        let inline_id = inline.top_blocks()[0];
        assert_ne!(
            stacked.block(id).unwrap().bounds().height,
            inline.block(inline_id).unwrap().bounds().height
        );
    }
}
