//! SVG output options
//!
//! Loaded from the `[svg]` table of an editor configuration file or built in
//! code. Category colours become a `<style>` element in the output so the
//! SVG is viewable without an external stylesheet.

use std::collections::BTreeMap;

use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SvgConfig {
    /// Margin added on every side of the drawn blocks
    pub viewbox_padding: f64,

    /// Emit the XML declaration
    pub standalone: bool,

    /// One element per line, indented by group depth
    pub pretty_print: bool,

    /// Prepended to every CSS class, `ib-` by default
    pub class_prefix: Option<String>,

    /// Text inset inside dropdown and variable boxes
    pub field_inset: f64,

    /// Fill colour per block category. Empty disables the embedded style.
    pub palette: BTreeMap<String, String>,
}

fn default_palette() -> BTreeMap<String, String> {
    [
        ("control", "#FFAB19"),
        ("events", "#FFBF00"),
        ("looks", "#9966FF"),
        ("more", "#FF6680"),
        ("motion", "#4C97FF"),
        ("operators", "#59C059"),
        ("sensing", "#5CB1D6"),
    ]
    .into_iter()
    .map(|(category, colour)| (category.to_string(), colour.to_string()))
    .collect()
}

impl Default for SvgConfig {
    fn default() -> Self {
        Self {
            viewbox_padding: 20.0,
            standalone: true,
            pretty_print: true,
            class_prefix: Some("ib-".to_string()),
            field_inset: 8.0,
            palette: default_palette(),
        }
    }
}

impl SvgConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_viewbox_padding(mut self, padding: f64) -> Self {
        self.viewbox_padding = padding;
        self
    }

    pub fn with_pretty_print(mut self, pretty: bool) -> Self {
        self.pretty_print = pretty;
        self
    }

    /// Use `prefix` instead of `ib-` for every class
    pub fn with_class_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.class_prefix = Some(prefix.into());
        self
    }

    pub fn without_class_prefix(mut self) -> Self {
        self.class_prefix = None;
        self
    }

    /// Override or add the fill of one category
    pub fn with_category_colour(
        mut self,
        category: impl Into<String>,
        colour: impl Into<String>,
    ) -> Self {
        self.palette.insert(category.into(), colour.into());
        self
    }

    /// Leave colouring entirely to an external stylesheet
    pub fn without_palette(mut self) -> Self {
        self.palette.clear();
        self
    }
}
