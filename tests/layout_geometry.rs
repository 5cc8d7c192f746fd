//! Measured sizes, connection offsets and outlines of the demo blocks

use std::rc::Rc;

use pretty_assertions::assert_eq;

use interlock::layout::{Shape, StackedConfig};
use interlock::{
    BlockId, BlockRegistry, ConnectionRef, EditorConfig, LayoutConfig, LayoutStyle, Point, Slot,
    Workspace,
};

const BLOCKS: &str = include_str!("../demos/blocks.toml");

fn workspace_with(config: EditorConfig) -> Workspace {
    let registry = BlockRegistry::from_str(BLOCKS).unwrap();
    Workspace::new(Rc::new(registry), config)
}

fn workspace() -> Workspace {
    workspace_with(EditorConfig::default())
}

/// Bays at least as tall as a regular block
fn roomy_bays() -> EditorConfig {
    EditorConfig::new().with_layout(
        LayoutConfig::new().with_stacked(StackedConfig::new().with_min_bay(96.0, 48.0)),
    )
}

fn conn(block: BlockId, slot: Slot) -> ConnectionRef {
    ConnectionRef::new(block, slot)
}

fn size(ws: &mut Workspace, id: BlockId) -> (f64, f64) {
    let layout = ws.layout(id).unwrap();
    (layout.width, layout.height)
}

fn outline_d(ws: &Workspace, id: BlockId) -> String {
    ws.block(id).unwrap().outline.as_ref().unwrap().to_svg_d()
}

#[test]
fn test_repeat_with_empty_bay() {
    let mut ws = workspace_with(roomy_bays());
    let repeat = ws.new_block("control_repeat").unwrap();

    let layout = ws.layout(repeat).unwrap();
    assert_eq!((layout.width, layout.height), (160.0, 120.0));
    assert_eq!(
        layout.connections,
        vec![
            (Slot::Previous, Point::new(0.0, 0.0)),
            (Slot::Next, Point::new(0.0, 120.0)),
            (Slot::Input(0), Point::new(58.0, 8.0)),
            (Slot::Input(1), Point::new(16.0, 48.0)),
        ]
    );
}

#[test]
fn test_connections_follow_block_position() {
    let mut ws = workspace_with(roomy_bays());
    let repeat = ws.new_block_at("control_repeat", Point::new(100.0, 50.0)).unwrap();
    ws.render_block(repeat).unwrap();
    assert_eq!(
        ws.connection(conn(repeat, Slot::Input(1))).unwrap().position,
        Point::new(116.0, 98.0)
    );
    assert_eq!(
        ws.connection(conn(repeat, Slot::Next)).unwrap().position,
        Point::new(100.0, 170.0)
    );
}

#[test]
fn test_open_bay_has_bottom_notch() {
    let mut ws = workspace_with(roomy_bays());
    let repeat = ws.new_block("control_repeat").unwrap();
    ws.render_block(repeat).unwrap();
    assert!(outline_d(&ws, repeat).contains("L36.00 104.00"));
}

#[test]
fn test_terminal_child_closes_bay_notch() {
    let mut ws = workspace_with(roomy_bays());
    let repeat = ws.new_block("control_repeat").unwrap();
    ws.render_block(repeat).unwrap();
    let open = ws.block(repeat).unwrap().outline.clone().unwrap();

    let stop = ws.new_block("control_stop").unwrap();
    ws.connect(conn(repeat, Slot::Input(1)), conn(stop, Slot::Previous))
        .unwrap();

    assert_eq!(size(&mut ws, stop), (109.0, 48.0));
    assert_eq!(size(&mut ws, repeat), (160.0, 120.0));
    let closed = ws.block(repeat).unwrap().outline.clone().unwrap();
    assert!(!closed.to_svg_d().contains("L36.00 104.00"));
    assert_eq!(closed.len(), open.len() - 4);
}

#[test]
fn test_bay_grows_with_nested_stack() {
    let mut ws = workspace_with(roomy_bays());
    let repeat = ws.new_block("control_repeat").unwrap();
    let a = ws.new_block("motion_movesteps").unwrap();
    let b = ws.new_block("motion_movesteps").unwrap();
    ws.connect(conn(a, Slot::Next), conn(b, Slot::Previous)).unwrap();
    ws.connect(conn(repeat, Slot::Input(1)), conn(a, Slot::Previous))
        .unwrap();

    // two 48 px blocks in the bay
    assert_eq!(size(&mut ws, repeat), (160.0, 48.0 + 96.0 + 24.0));
    assert_eq!(ws.block(b).unwrap().position, Point::new(16.0, 96.0));
}

#[test]
fn test_boolean_reporter_is_hexagonal() {
    let mut ws = workspace();
    let pressed = ws.new_block("sensing_mousedown").unwrap();
    assert_eq!(size(&mut ws, pressed), (109.0, 40.0));
    assert_eq!(ws.block(pressed).unwrap().output_shape, Shape::Hexagonal);
    assert!(outline_d(&ws, pressed).starts_with("M20.00 0.00"));
}

#[test]
fn test_nested_reporter_grows_parent_row() {
    let mut ws = workspace();
    let step = ws.new_block_at("motion_movesteps", Point::new(10.0, 10.0)).unwrap();
    assert_eq!(size(&mut ws, step).1, 48.0);

    let add = ws.new_block("operator_add").unwrap();
    ws.connect(conn(step, Slot::Input(0)), conn(add, Slot::Output))
        .unwrap();

    assert_eq!(size(&mut ws, add), (127.0, 48.0));
    assert_eq!(size(&mut ws, step).1, 64.0);
    assert_eq!(ws.block(add).unwrap().position, Point::new(54.0, 18.0));
}

#[test]
fn test_hat_block() {
    let mut ws = workspace();
    let hat = ws.new_block("event_whenflagclicked").unwrap();
    let layout = ws.layout(hat).unwrap();
    assert_eq!((layout.width, layout.height), (149.0, 64.0));
    assert_eq!(layout.connections, vec![(Slot::Next, Point::new(0.0, 64.0))]);
    assert!(ws.block(hat).unwrap().metrics.as_ref().unwrap().hat);
}

#[test]
fn test_condition_socket_position() {
    let mut ws = workspace();
    let if_else = ws.new_block("control_if_else").unwrap();
    let layout = ws.layout(if_else).unwrap();
    assert!(layout
        .connections
        .contains(&(Slot::Input(0), Point::new(30.0, 8.0))));
}

#[test]
fn test_rerender_without_changes_reuses_outlines() {
    let mut ws = workspace();
    let step = ws.new_block("motion_movesteps").unwrap();
    let say = ws.new_block("looks_say").unwrap();
    ws.connect(conn(step, Slot::Next), conn(say, Slot::Previous))
        .unwrap();

    let pass = ws.render_block(step).unwrap();
    assert_eq!(pass.paths_built, 0);
    assert_eq!(pass.blocks_measured, 2);
}

#[test]
fn test_layout_is_idempotent_for_nested_tree() {
    let mut ws = workspace_with(roomy_bays());
    let repeat = ws.new_block_at("control_repeat", Point::new(20.0, 30.0)).unwrap();
    let step = ws.new_block("motion_movesteps").unwrap();
    let say = ws.new_block("looks_say").unwrap();
    let add = ws.new_block("operator_add").unwrap();
    ws.connect(conn(step, Slot::Next), conn(say, Slot::Previous))
        .unwrap();
    ws.connect(conn(repeat, Slot::Input(1)), conn(step, Slot::Previous))
        .unwrap();
    ws.connect(conn(step, Slot::Input(0)), conn(add, Slot::Output))
        .unwrap();

    let first: Vec<_> = [repeat, step, say, add]
        .into_iter()
        .map(|id| ws.layout(id).unwrap())
        .collect();
    let outline = outline_d(&ws, repeat);
    let second: Vec<_> = [repeat, step, say, add]
        .into_iter()
        .map(|id| ws.layout(id).unwrap())
        .collect();

    assert_eq!(first, second);
    assert_eq!(outline_d(&ws, repeat), outline);
    assert_eq!(
        ws.block(say).unwrap().position,
        ws.connection(conn(step, Slot::Next)).unwrap().position
    );
}

#[test]
fn test_inline_repeat() {
    let mut ws = workspace_with(EditorConfig::new().with_style(LayoutStyle::Inline));
    let repeat = ws.new_block("control_repeat").unwrap();
    let layout = ws.layout(repeat).unwrap();
    assert_eq!((layout.width, layout.height), (162.0, 64.0));
    assert!(layout
        .connections
        .contains(&(Slot::Next, Point::new(162.0, 0.0))));
}

#[test]
fn test_inline_if_else_is_rejected() {
    let mut ws = workspace_with(EditorConfig::new().with_style(LayoutStyle::Inline));
    assert!(ws.new_block("control_if_else").is_err());
}
