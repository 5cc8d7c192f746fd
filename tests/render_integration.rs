//! End-to-end: demo definitions and program through layout to SVG

use std::rc::Rc;

use pretty_assertions::assert_eq;

use interlock::{
    load_workspace, render, render_with_config, BlockRegistry, EditorConfig, LayoutStyle, Point,
    RenderConfig, SvgConfig, Workspace, WorkspaceState,
};

const BLOCKS: &str = include_str!("../demos/blocks.toml");
const PROGRAM: &str = include_str!("../demos/program.toml");

#[test]
fn test_render_demo_program() {
    let svg = render(BLOCKS, PROGRAM).unwrap();

    assert!(svg.starts_with("<?xml"));
    assert_eq!(svg.matches("<g ").count(), 8);
    assert!(svg.contains("ib-event_whenflagclicked"));
    assert!(svg.contains("ib-category-control"));
    assert!(svg.contains(r#"href="green-flag.svg""#));
    assert!(svg.contains(">10</text>"));
    assert!(svg.contains(">5</text>"));
    assert!(svg.contains(">Hello!</text>"));
    assert!(svg.contains("ib-shadow"));
    // every socket is filled by a shadow
    assert!(!svg.contains("ib-socket"));
}

#[test]
fn test_demo_program_positions() {
    let ws = load_workspace(BLOCKS, PROGRAM, EditorConfig::default()).unwrap();
    let top = ws.top_blocks();
    assert_eq!(top.len(), 2);

    let hat = top[0];
    assert_eq!(ws.block(hat).unwrap().position, Point::new(40.0, 40.0));
    let repeat = ws.next_block(hat).unwrap();
    assert_eq!(ws.block(repeat).unwrap().type_name, "control_repeat");
    assert_eq!(ws.block(repeat).unwrap().position, Point::new(40.0, 104.0));
    assert_eq!(ws.descendants(hat).len(), 7);
    assert_eq!(ws.block(top[1]).unwrap().type_name, "motion_xposition");
}

#[test]
fn test_inline_render_of_demo_program() {
    let config = RenderConfig::new()
        .with_editor(EditorConfig::new().with_style(LayoutStyle::Inline))
        .with_svg(
            SvgConfig::default()
                .without_class_prefix()
                .with_pretty_print(false),
        );
    let svg = render_with_config(BLOCKS, PROGRAM, config).unwrap();
    assert!(!svg.contains('\n'));
    assert!(svg.contains("control_repeat"));
    assert!(!svg.contains("ib-"));
}

#[test]
fn test_escaped_field_text() {
    let program = r#"
[[blocks]]
type = "looks_say"

[blocks.inputs.MESSAGE.shadow]
type = "text"
fields = { TEXT = "<b> & \"q\"" }
"#;
    let svg = render(BLOCKS, program).unwrap();
    assert!(svg.contains(">&lt;b&gt; &amp; &quot;q&quot;</text>"));
}

#[test]
fn test_save_and_reload_keeps_structure() {
    let ws = load_workspace(BLOCKS, PROGRAM, EditorConfig::default()).unwrap();
    let saved = ws.save().unwrap();
    let text = saved.to_toml().unwrap();

    let mut reloaded = Workspace::new(
        Rc::new(BlockRegistry::from_str(BLOCKS).unwrap()),
        EditorConfig::default(),
    );
    reloaded
        .load(&WorkspaceState::from_str(&text).unwrap())
        .unwrap();
    assert_eq!(reloaded.save().unwrap(), saved);
    assert_eq!(reloaded.len(), ws.len());
}

#[test]
fn test_unknown_block_in_program() {
    let err = render(BLOCKS, "[[blocks]]\ntype = \"looks_shout\"\n").unwrap_err();
    assert!(err.to_string().contains("looks_shout"));
}
