//! What the editor shows for the current drag candidate.
//!
//! Inserting materialises an insertion marker: a real block of the dragged
//! type, connected to the candidate so layout places it exactly where the
//! drop would land. Replacing only highlights what would be displaced.
//! Both are built and torn down without events or undo side effects.

use crate::workspace::{
    BlockId, Connection, ConnectionRef, ConnectionRole, Highlight, Slot, Workspace, WorkspaceError,
};

use super::session::Candidate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewState {
    None,
    Inserting,
    Replacing,
}

/// What a replacement preview highlights
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplacementTarget {
    /// A block that would be displaced
    Block(BlockId),
    /// The placeholder of an empty value socket
    EmptyInput { block: BlockId, input: usize },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Preview {
    #[default]
    None,
    Inserting {
        marker: BlockId,
        /// The marker's connection joined to the candidate
        marker_connection: ConnectionRef,
    },
    Replacing {
        target: ReplacementTarget,
    },
}

impl Preview {
    pub fn state(&self) -> PreviewState {
        match self {
            Preview::None => PreviewState::None,
            Preview::Inserting { .. } => PreviewState::Inserting,
            Preview::Replacing { .. } => PreviewState::Replacing,
        }
    }

    /// Show the preview for `candidate`; `dragged` is the top of the stack
    pub(crate) fn show(
        ws: &mut Workspace,
        dragged: BlockId,
        candidate: &Candidate,
    ) -> Result<Self, WorkspaceError> {
        let preview = if should_replace(ws, dragged, candidate) {
            let target = replacement_target(ws, candidate);
            set_highlight(ws, target, true);
            Preview::Replacing { target }
        } else {
            let (marker, marker_connection) = insert_marker(ws, candidate)?;
            Preview::Inserting {
                marker,
                marker_connection,
            }
        };
        tracing::debug!(state = ?preview.state(), closest = %candidate.closest, "show preview");
        Ok(preview)
    }

    /// Undo every transient effect of the preview
    pub(crate) fn hide(self, ws: &mut Workspace) -> Result<(), WorkspaceError> {
        match self {
            Preview::None => return Ok(()),
            Preview::Replacing { target } => set_highlight(ws, target, false),
            Preview::Inserting {
                marker,
                marker_connection,
            } => remove_marker(ws, marker, marker_connection)?,
        }
        tracing::debug!("hide preview");
        Ok(())
    }
}

/// Whether dropping on `candidate` would displace something rather than
/// splice the dragged stack in
pub fn should_replace(ws: &Workspace, dragged: BlockId, candidate: &Candidate) -> bool {
    let Some(local) = ws.block(candidate.local.block) else {
        return false;
    };
    if local.role(candidate.local.slot) == Some(ConnectionRole::Output) {
        return true;
    }
    if local.first_statement_slot() == Some(candidate.local.slot) {
        return false;
    }
    // A terminal stack dropped onto a terminal block takes its place
    let terminal_stack = ws.last_connection_in_stack(dragged).is_none();
    if candidate.local.slot == Slot::Previous && terminal_stack {
        return ws
            .target_block(candidate.closest)
            .and_then(|id| ws.block(id))
            .is_some_and(|occupant| !occupant.insertion_marker && occupant.next.is_none());
    }
    false
}

fn replacement_target(ws: &Workspace, candidate: &Candidate) -> ReplacementTarget {
    match (ws.target_block(candidate.closest), candidate.closest.slot) {
        (Some(occupant), _) => ReplacementTarget::Block(occupant),
        (None, Slot::Input(input)) => ReplacementTarget::EmptyInput {
            block: candidate.closest.block,
            input,
        },
        (None, _) => ReplacementTarget::Block(candidate.closest.block),
    }
}

fn set_highlight(ws: &mut Workspace, target: ReplacementTarget, on: bool) {
    let (block, highlight) = match target {
        ReplacementTarget::Block(block) => (block, Highlight::Block),
        ReplacementTarget::EmptyInput { block, input } => (block, Highlight::EmptyInput(input)),
    };
    if let Some(block) = ws.block_mut(block) {
        block.highlight = if on { highlight } else { Highlight::None };
    }
}

/// Run scratch work with events suppressed and undo recording off, so no
/// bumps are scheduled and no shadows respawn
fn quietly<T>(
    ws: &mut Workspace,
    f: impl FnOnce(&mut Workspace) -> Result<T, WorkspaceError>,
) -> Result<T, WorkspaceError> {
    let record = ws.events().record_undo();
    ws.events_mut().set_record_undo(false);
    let result = ws.silently(f);
    ws.events_mut().set_record_undo(record);
    result
}

fn insert_marker(
    ws: &mut Workspace,
    candidate: &Candidate,
) -> Result<(BlockId, ConnectionRef), WorkspaceError> {
    let source = ws
        .block(candidate.local.block)
        .ok_or(WorkspaceError::UnknownBlock(candidate.local.block))?;
    let type_name = source.type_name.clone();
    let mutation = source.mutation.clone();

    quietly(ws, |ws| {
        let marker = ws.create_block(&type_name, mutation.as_ref(), false, true)?;
        ws.render_block(marker)?;
        let marker_connection = ConnectionRef::new(marker, candidate.local.slot);
        let from = ws.conn(marker_connection)?.position;
        let to = ws.conn(candidate.closest)?.position;
        ws.translate_tree(marker, to.x - from.x, to.y - from.y);
        ws.connect(marker_connection, candidate.closest)?;
        Ok((marker, marker_connection))
    })
}

/// Take the marker out and heal whatever it was spliced into
fn remove_marker(
    ws: &mut Workspace,
    marker: BlockId,
    marker_connection: ConnectionRef,
) -> Result<(), WorkspaceError> {
    quietly(ws, |ws| {
        let block = ws.block(marker).ok_or(WorkspaceError::UnknownBlock(marker))?;
        let above = block.previous.as_ref().and_then(|p| p.target);
        let wraps = matches!(marker_connection.slot, Slot::Input(_))
            && block.role(marker_connection.slot) == Some(ConnectionRole::Next);

        match marker_connection.slot {
            Slot::Previous | Slot::Output => ws.unplug(marker, true)?,
            _ => {
                let inner = ws.conn(marker_connection)?.target;
                if inner.is_some() {
                    ws.disconnect(marker_connection)?;
                }
                ws.unplug(marker, true)?;
                if let (true, Some(above), Some(inner)) = (wraps, above, inner) {
                    ws.connect(above, inner)?;
                }
            }
        }

        if ws
            .connection(marker_connection)
            .is_some_and(Connection::is_connected)
        {
            return Err(WorkspaceError::MarkerStillAttached(marker_connection));
        }
        ws.dispose_block(marker, false)
    })
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::config::EditorConfig;
    use crate::definition::BlockRegistry;
    use crate::layout::Point;

    const DEFS: &str = r#"
[[blocks]]
type = "step"
message = "step"
previous = true
next = true

[[blocks]]
type = "stop"
message = "stop"
previous = true

[[blocks]]
type = "wrap"
message = "wrap %1"
args = [{ kind = "input_statement", name = "SUBSTACK" }]
previous = true
next = true

[[blocks]]
type = "say"
message = "say %1"
args = [{ kind = "input_value", name = "MESSAGE" }]
previous = true
next = true

[[blocks]]
type = "answer"
message = "answer"
output = true
"#;

    fn workspace() -> Workspace {
        let registry = BlockRegistry::from_str(DEFS).unwrap();
        Workspace::new(Rc::new(registry), EditorConfig::default())
    }

    fn candidate(local: ConnectionRef, closest: ConnectionRef) -> Candidate {
        Candidate {
            local,
            closest,
            distance: 0.0,
        }
    }

    #[test]
    fn test_reporter_always_replaces() {
        let mut ws = workspace();
        let say = ws.new_block("say").unwrap();
        let answer = ws.new_block("answer").unwrap();
        let c = candidate(
            ConnectionRef::new(answer, Slot::Output),
            ConnectionRef::new(say, Slot::Input(0)),
        );
        assert!(should_replace(&ws, answer, &c));

        let preview = Preview::show(&mut ws, answer, &c).unwrap();
        assert_eq!(
            preview,
            Preview::Replacing {
                target: ReplacementTarget::EmptyInput { block: say, input: 0 }
            }
        );
        assert_eq!(ws.block(say).unwrap().highlight, Highlight::EmptyInput(0));
        preview.hide(&mut ws).unwrap();
        assert_eq!(ws.block(say).unwrap().highlight, Highlight::None);
    }

    #[test]
    fn test_terminal_on_terminal_replaces() {
        let mut ws = workspace();
        let top = ws.new_block("step").unwrap();
        let old_stop = ws.new_block("stop").unwrap();
        ws.connect(
            ConnectionRef::new(top, Slot::Next),
            ConnectionRef::new(old_stop, Slot::Previous),
        )
        .unwrap();
        let new_stop = ws.new_block("stop").unwrap();
        let c = candidate(
            ConnectionRef::new(new_stop, Slot::Previous),
            ConnectionRef::new(top, Slot::Next),
        );
        assert!(should_replace(&ws, new_stop, &c));

        let step = ws.new_block("step").unwrap();
        let c = candidate(
            ConnectionRef::new(step, Slot::Previous),
            ConnectionRef::new(top, Slot::Next),
        );
        assert!(!should_replace(&ws, step, &c));
    }

    #[test]
    fn test_marker_splices_and_heals() {
        let mut ws = workspace();
        let top = ws.new_block("step").unwrap();
        let below = ws.new_block("step").unwrap();
        ws.connect(
            ConnectionRef::new(top, Slot::Next),
            ConnectionRef::new(below, Slot::Previous),
        )
        .unwrap();
        let dragged = ws.new_block_at("step", Point::new(200.0, 200.0)).unwrap();
        let before = ws.events().log().len();
        let blocks = ws.len();

        let c = candidate(
            ConnectionRef::new(dragged, Slot::Previous),
            ConnectionRef::new(top, Slot::Next),
        );
        let preview = Preview::show(&mut ws, dragged, &c).unwrap();
        let Preview::Inserting { marker, .. } = preview else {
            panic!("expected an insertion marker");
        };
        assert!(ws.block(marker).unwrap().insertion_marker);
        assert_eq!(ws.next_block(top), Some(marker));
        assert_eq!(ws.next_block(marker), Some(below));
        assert_eq!(ws.block(below).unwrap().position, Point::new(0.0, 96.0));

        preview.hide(&mut ws).unwrap();
        assert!(ws.block(marker).is_none());
        assert_eq!(ws.next_block(top), Some(below));
        assert_eq!(ws.block(below).unwrap().position, Point::new(0.0, 48.0));
        assert_eq!(ws.len(), blocks);
        assert_eq!(ws.events().log().len(), before);
        assert!(ws.scheduler().pending().is_empty());
    }

    #[test]
    fn test_wrapping_marker_restores_stack() {
        let mut ws = workspace();
        let top = ws.new_block("step").unwrap();
        let middle = ws.new_block("step").unwrap();
        ws.connect(
            ConnectionRef::new(top, Slot::Next),
            ConnectionRef::new(middle, Slot::Previous),
        )
        .unwrap();
        let wrap = ws.new_block_at("wrap", Point::new(300.0, 0.0)).unwrap();
        let c = candidate(
            ConnectionRef::new(wrap, Slot::Input(0)),
            ConnectionRef::new(middle, Slot::Previous),
        );
        assert!(!should_replace(&ws, wrap, &c));

        let preview = Preview::show(&mut ws, wrap, &c).unwrap();
        let Preview::Inserting { marker, .. } = preview else {
            panic!("expected an insertion marker");
        };
        assert_eq!(ws.next_block(top), Some(marker));
        assert_eq!(
            ws.target_block(ConnectionRef::new(marker, Slot::Input(0))),
            Some(middle)
        );

        preview.hide(&mut ws).unwrap();
        assert_eq!(ws.next_block(top), Some(middle));
        assert!(ws.block(marker).is_none());
    }
}
