//! Configuration for the layout engine
//!
//! All values are in workspace units. Every key is optional when loading
//! from TOML; missing keys keep their defaults.

use serde::Deserialize;

use super::types::Shape;

/// Placeholder sizes for empty value sockets
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SocketSizes {
    pub height: f64,
    pub hexagonal_width: f64,
    pub round_width: f64,
    pub square_width: f64,
}

impl Default for SocketSizes {
    fn default() -> Self {
        Self {
            height: 32.0,
            hexagonal_width: 48.0,
            round_width: 40.0,
            square_width: 40.0,
        }
    }
}

impl SocketSizes {
    /// Width and height of an empty socket of the given shape
    pub fn size(&self, shape: Shape) -> (f64, f64) {
        let width = match shape {
            Shape::Hexagonal => self.hexagonal_width,
            Shape::Round => self.round_width,
            Shape::Square | Shape::None => self.square_width,
        };
        (width, self.height)
    }
}

/// Constants for the stacked (vertical) style
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct StackedConfig {
    /// Horizontal gap between elements and at row ends
    pub sep_space_x: f64,
    /// Vertical padding above and below row content
    pub sep_space_y: f64,

    pub min_block_width: f64,
    pub min_block_width_output: f64,
    pub min_block_width_shadow_output: f64,
    pub min_block_width_with_statement: f64,

    pub min_block_height: f64,
    pub min_block_height_reporter: f64,
    /// Minimum height of an output block holding a single editable field
    pub min_block_height_single_field_output: f64,

    pub min_bay_width: f64,
    pub min_bay_height: f64,
    pub statement_arm_width: f64,
    pub statement_footer_height: f64,

    pub notch_width: f64,
    pub notch_height: f64,
    pub notch_start_padding: f64,
    pub corner_radius: f64,

    pub hat_height: f64,
    pub hat_width: f64,
    /// Extra width for blocks with a hat cap
    pub hat_margin: f64,
    /// Extra width for blocks without a next connection
    pub terminal_margin: f64,

    pub output_padding_hexagonal: f64,
    pub output_padding_round: f64,
    pub output_padding_square: f64,

    /// Inline rows wrap once they would grow past this width
    pub max_row_width: f64,

    pub sockets: SocketSizes,
}

impl Default for StackedConfig {
    fn default() -> Self {
        Self {
            sep_space_x: 8.0,
            sep_space_y: 8.0,
            min_block_width: 64.0,
            min_block_width_output: 48.0,
            min_block_width_shadow_output: 40.0,
            min_block_width_with_statement: 160.0,
            min_block_height: 48.0,
            min_block_height_reporter: 40.0,
            min_block_height_single_field_output: 32.0,
            min_bay_width: 96.0,
            min_bay_height: 24.0,
            statement_arm_width: 16.0,
            statement_footer_height: 24.0,
            notch_width: 32.0,
            notch_height: 8.0,
            notch_start_padding: 12.0,
            corner_radius: 4.0,
            hat_height: 16.0,
            hat_width: 96.0,
            hat_margin: 16.0,
            terminal_margin: 8.0,
            output_padding_hexagonal: 16.0,
            output_padding_round: 12.0,
            output_padding_square: 8.0,
            max_row_width: 480.0,
            sockets: SocketSizes::default(),
        }
    }
}

impl StackedConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the minimum size of an empty statement bay
    pub fn with_min_bay(mut self, width: f64, height: f64) -> Self {
        self.min_bay_width = width;
        self.min_bay_height = height;
        self
    }

    /// Set the width past which inline rows wrap
    pub fn with_max_row_width(mut self, width: f64) -> Self {
        self.max_row_width = width;
        self
    }

    /// Set the extra widths for hat and terminal blocks
    pub fn with_margins(mut self, hat: f64, terminal: f64) -> Self {
        self.hat_margin = hat;
        self.terminal_margin = terminal;
        self
    }

    /// Horizontal padding inside an output block of the given shape
    pub fn output_padding(&self, shape: Shape) -> f64 {
        match shape {
            Shape::Hexagonal => self.output_padding_hexagonal,
            Shape::Round => self.output_padding_round,
            Shape::Square | Shape::None => self.output_padding_square,
        }
    }
}

/// Constants for the inline (horizontal) style
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct InlineConfig {
    pub min_block_width: f64,
    pub min_block_height: f64,
    /// Margin between the block edge and its content
    pub edge_padding: f64,
    pub sep_space_x: f64,
    /// Depth of the side tab
    pub notch_width: f64,
    /// Height of the side tab, shared between neighbouring blocks
    pub notch_height: f64,
    pub notch_start_padding: f64,
    /// Thickness of the wall around the bay
    pub bay_arm: f64,
    pub min_bay_width: f64,
    pub min_bay_height: f64,
    pub sockets: SocketSizes,
}

impl Default for InlineConfig {
    fn default() -> Self {
        Self {
            min_block_width: 64.0,
            min_block_height: 64.0,
            edge_padding: 8.0,
            sep_space_x: 8.0,
            notch_width: 8.0,
            notch_height: 16.0,
            notch_start_padding: 16.0,
            bay_arm: 8.0,
            min_bay_width: 48.0,
            min_bay_height: 48.0,
            sockets: SocketSizes::default(),
        }
    }
}

impl InlineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the minimum size of an empty bay
    pub fn with_min_bay(mut self, width: f64, height: f64) -> Self {
        self.min_bay_width = width;
        self.min_bay_height = height;
        self
    }
}

/// Configuration options for layout computation
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Estimated advance of one character of field text
    pub char_width: f64,
    /// Height of a line of field text
    pub label_height: f64,
    /// Height of a boxed field such as a dropdown
    pub box_field_height: f64,
    /// Padding on either side of boxed field text
    pub box_field_padding: f64,
    pub dropdown_arrow_width: f64,
    /// Minimum width of editable text and number fields
    pub min_editable_width: f64,

    pub stacked: StackedConfig,
    pub inline: InlineConfig,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            char_width: 7.0,
            label_height: 16.0,
            box_field_height: 32.0,
            box_field_padding: 8.0,
            dropdown_arrow_width: 12.0,
            min_editable_width: 8.0,
            stacked: StackedConfig::default(),
            inline: InlineConfig::default(),
        }
    }
}

impl LayoutConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stacked style constants
    pub fn with_stacked(mut self, stacked: StackedConfig) -> Self {
        self.stacked = stacked;
        self
    }

    /// Replace the inline style constants
    pub fn with_inline(mut self, inline: InlineConfig) -> Self {
        self.inline = inline;
        self
    }

    /// Set the estimated character width used to measure text
    pub fn with_char_width(mut self, width: f64) -> Self {
        self.char_width = width;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LayoutConfig::default();
        assert_eq!(config.char_width, 7.0);
        assert_eq!(config.stacked.min_bay_width, 96.0);
        assert_eq!(config.stacked.notch_width, 32.0);
        assert_eq!(config.inline.notch_height, 16.0);
    }

    #[test]
    fn test_builder_pattern() {
        let config = LayoutConfig::new()
            .with_char_width(8.0)
            .with_stacked(StackedConfig::new().with_min_bay(96.0, 48.0));
        assert_eq!(config.char_width, 8.0);
        assert_eq!(config.stacked.min_bay_height, 48.0);
        assert_eq!(config.stacked.min_bay_width, 96.0);
    }

    #[test]
    fn test_socket_sizes() {
        let sockets = SocketSizes::default();
        assert_eq!(sockets.size(Shape::Hexagonal), (48.0, 32.0));
        assert_eq!(sockets.size(Shape::Round), (40.0, 32.0));
        assert_eq!(sockets.size(Shape::None), (40.0, 32.0));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: LayoutConfig = toml::from_str(
            r#"
            char_width = 6.5

            [stacked]
            min_bay_height = 48.0
            "#,
        )
        .unwrap();
        assert_eq!(config.char_width, 6.5);
        assert_eq!(config.stacked.min_bay_height, 48.0);
        assert_eq!(config.stacked.min_bay_width, 96.0);
        assert_eq!(config.inline, InlineConfig::default());
    }
}
