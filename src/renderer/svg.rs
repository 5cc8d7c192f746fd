//! SVG generation from a rendered workspace

use crate::layout::{BoundingBox, ElementKind, ElementMetrics};
use crate::workspace::{Block, Field, Highlight, Workspace};

use super::path::{reporter_outline, ResolvedPath};
use super::SvgConfig;

/// Build SVG elements incrementally
pub struct SvgBuilder {
    config: SvgConfig,
    elements: Vec<String>,
    indent: usize,
}

impl SvgBuilder {
    /// Create a new SVG builder
    pub fn new(config: SvgConfig) -> Self {
        Self {
            config,
            elements: vec![],
            indent: 1,
        }
    }

    fn prefix(&self) -> String {
        self.config.class_prefix.clone().unwrap_or_default()
    }

    fn indent_str(&self) -> String {
        if self.config.pretty_print {
            "  ".repeat(self.indent)
        } else {
            String::new()
        }
    }

    fn newline(&self) -> &str {
        if self.config.pretty_print {
            "\n"
        } else {
            ""
        }
    }

    fn class_list(&self, base: &str, classes: &[String]) -> String {
        std::iter::once(format!("{}{}", self.prefix(), base))
            .chain(classes.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Add a closed outline
    pub fn add_path(&mut self, path: &ResolvedPath, base: &str, classes: &[String]) {
        self.elements.push(format!(
            r#"{}<path class="{}" d="{}"/>"#,
            self.indent_str(),
            self.class_list(base, classes),
            path.to_svg_d()
        ));
    }

    /// Add a rectangle element
    pub fn add_rect(&mut self, x: f64, y: f64, w: f64, h: f64, classes: &[String]) {
        self.elements.push(format!(
            r#"{}<rect class="{}" x="{}" y="{}" width="{}" height="{}"/>"#,
            self.indent_str(),
            self.class_list("box", classes),
            x,
            y,
            w,
            h
        ));
    }

    /// Add a text element, vertically centred on `y`
    pub fn add_text(&mut self, text: &str, x: f64, y: f64, classes: &[String]) {
        self.elements.push(format!(
            r#"{}<text class="{}" x="{}" y="{}" dominant-baseline="middle">{}</text>"#,
            self.indent_str(),
            self.class_list("text", classes),
            x,
            y,
            escape_xml(text)
        ));
    }

    /// Add an image element
    pub fn add_image(&mut self, src: &str, x: f64, y: f64, w: f64, h: f64) {
        self.elements.push(format!(
            r#"{}<image class="{}image" href="{}" x="{}" y="{}" width="{}" height="{}"/>"#,
            self.indent_str(),
            self.prefix(),
            escape_xml(src),
            x,
            y,
            w,
            h
        ));
    }

    /// Open a group translated to `(x, y)`
    pub fn start_group(&mut self, id: Option<&str>, classes: &[String], x: f64, y: f64) {
        let id_attr = id.map(|i| format!(r#" id="{}""#, i)).unwrap_or_default();
        let class_attr = if classes.is_empty() {
            String::new()
        } else {
            format!(r#" class="{}""#, classes.join(" "))
        };

        self.elements.push(format!(
            r#"{}<g{}{} transform="translate({} {})">"#,
            self.indent_str(),
            id_attr,
            class_attr,
            x,
            y
        ));
        self.indent += 1;
    }

    /// Close a group element
    pub fn end_group(&mut self) {
        self.indent = self.indent.saturating_sub(1);
        self.elements.push(format!("{}</g>", self.indent_str()));
    }

    /// Category fills, plus the translucency of insertion markers
    fn style_element(&self) -> String {
        let prefix = self.prefix();
        let indent = if self.config.pretty_print { "  " } else { "" };
        let mut rules: Vec<String> = self
            .config
            .palette
            .iter()
            .map(|(category, colour)| {
                format!(
                    "{}.{}category-{} > .{}outline {{ fill: {}; }}",
                    indent, prefix, category, prefix, colour
                )
            })
            .collect();
        rules.push(format!(
            "{}.{}insertion-marker > .{}outline {{ opacity: 0.4; }}",
            indent, prefix, prefix
        ));
        let nl = self.newline();
        format!("{}<style>{}{}{}{}</style>", indent, nl, rules.join(nl), nl, indent)
    }

    /// Build the final SVG string
    pub fn build(self, content: BoundingBox) -> String {
        let vb = content.inflate(self.config.viewbox_padding);
        let nl = self.newline();
        let mut svg = String::new();
        if self.config.standalone {
            svg.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
            svg.push_str(nl);
        }
        svg.push_str(&format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="{} {} {} {}">"#,
            vb.x, vb.y, vb.width, vb.height
        ));
        svg.push_str(nl);

        if !self.config.palette.is_empty() {
            svg.push_str(&self.style_element());
            svg.push_str(nl);
        }

        for elem in &self.elements {
            svg.push_str(elem);
            svg.push_str(nl);
        }

        svg.push_str("</svg>");

        svg
    }
}

/// Render every block of a laid-out workspace to an SVG string.
///
/// Blocks are drawn tree by tree, parents before children, so nested
/// blocks paint over the bays and sockets that hold them.
pub fn render_svg(workspace: &Workspace, config: &SvgConfig) -> String {
    let mut builder = SvgBuilder::new(config.clone());
    let mut viewbox: Option<BoundingBox> = None;

    for root in workspace.top_blocks() {
        for id in workspace.descendants(root) {
            let Some(block) = workspace.block(id) else {
                continue;
            };
            let bounds = block.bounds();
            viewbox = Some(viewbox.map_or(bounds, |vb| vb.union(&bounds)));
            render_block(block, config, &mut builder);
        }
    }

    builder.build(viewbox.unwrap_or_default())
}

fn render_block(block: &Block, config: &SvgConfig, builder: &mut SvgBuilder) {
    let prefix = builder.prefix();
    let mut classes = vec![
        format!("{}block", prefix),
        format!("{}{}", prefix, block.type_name),
    ];
    if let Some(category) = &block.category {
        classes.push(format!("{}category-{}", prefix, category));
    }
    if block.shadow {
        classes.push(format!("{}shadow", prefix));
    }
    if block.insertion_marker {
        classes.push(format!("{}insertion-marker", prefix));
    }
    if block.highlight == Highlight::Block {
        classes.push(format!("{}replaceable", prefix));
    }

    let id = block.id.to_string();
    builder.start_group(Some(&id), &classes, block.position.x, block.position.y);

    if let Some(outline) = &block.outline {
        builder.add_path(outline, "outline", &[]);
    }

    if let Some(metrics) = &block.metrics {
        for element in metrics.rows.iter().flat_map(|row| row.elements.iter()) {
            render_element(block, element, config, builder);
        }
    }

    builder.end_group();
}

fn render_element(
    block: &Block,
    element: &ElementMetrics,
    config: &SvgConfig,
    builder: &mut SvgBuilder,
) {
    let prefix = builder.prefix();
    let middle = element.y + element.height / 2.0;
    match element.kind {
        ElementKind::Socket {
            input,
            shape,
            occupied: false,
        } => {
            let mut classes = vec![];
            if block.highlight == Highlight::EmptyInput(input) {
                classes.push(format!("{}replaceable", prefix));
            }
            let mut path = reporter_outline(shape, element.width, element.height);
            path.translate(element.x, element.y);
            builder.add_path(&path, "socket", &classes);
        }
        ElementKind::Socket { .. } => {}
        ElementKind::Field { input, field } => {
            let Some(field) = block.inputs.get(input).and_then(|i| i.fields.get(field)) else {
                return;
            };
            match field {
                Field::Label { text } => {
                    builder.add_text(text, element.x, middle, &[format!("{}label", prefix)]);
                }
                Field::Text { .. } | Field::Number { .. } => {
                    builder.add_text(
                        &field.display_text(),
                        element.x,
                        middle,
                        &[format!("{}editable", prefix)],
                    );
                }
                Field::Dropdown { .. } | Field::Variable { .. } => {
                    builder.add_rect(element.x, element.y, element.width, element.height, &[]);
                    builder.add_text(
                        &field.display_text(),
                        element.x + config.field_inset,
                        middle,
                        &[format!("{}editable", prefix)],
                    );
                }
                Field::Image { src, .. } => {
                    builder.add_image(src, element.x, element.y, element.width, element.height);
                }
            }
        }
    }
}

/// Escape special XML characters
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
