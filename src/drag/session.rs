//! One drag gesture from pick-up to drop

use std::collections::HashSet;

use crate::config::SnapConfig;
use crate::layout::Point;
use crate::workspace::{
    BlockId, ConnectionRef, EventGroup, EventKind, Task, Workspace, WorkspaceError,
};

use super::preview::{Preview, PreviewState};
use super::DragError;

/// A connection of the dragged stack paired with the closest legal target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub local: ConnectionRef,
    pub closest: ConnectionRef,
    pub distance: f64,
}

/// How a drag ended
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DropOutcome {
    Connected {
        local: ConnectionRef,
        target: ConnectionRef,
    },
    Freestanding,
    Deleted,
}

#[derive(Debug)]
pub struct DragSession {
    block: BlockId,
    start: Point,
    group: EventGroup,
    saved_group: Option<EventGroup>,
    /// Connections searched from: the top block's plus the stack's tail
    available: Vec<ConnectionRef>,
    /// Every connection travelling with the stack
    dragging: HashSet<ConnectionRef>,
    candidate: Option<Candidate>,
    preview: Preview,
    would_delete: bool,
    snap: SnapConfig,
}

impl DragSession {
    /// Pick up `block`. Without `heal_stack` the blocks below it come along;
    /// with it they close the gap it leaves.
    pub fn start(ws: &mut Workspace, block: BlockId, heal_stack: bool) -> Result<Self, DragError> {
        let b = ws
            .block(block)
            .ok_or(WorkspaceError::UnknownBlock(block))?;
        if b.shadow || b.insertion_marker || !b.movable {
            return Err(DragError::NotDraggable(block));
        }

        let saved_group = ws.events().group();
        let group = ws.events_mut().new_group();
        ws.events_mut().set_group(Some(group));
        ws.unplug(block, heal_stack)?;
        ws.set_dragging(true);

        let start = ws
            .block(block)
            .ok_or(WorkspaceError::UnknownBlock(block))?
            .position;
        let dragging = ws
            .descendants(block)
            .into_iter()
            .filter_map(|id| ws.block(id))
            .flat_map(|b| b.slots().into_iter().map(move |slot| ConnectionRef::new(b.id, slot)))
            .collect();
        let mut available: Vec<ConnectionRef> = ws
            .block(block)
            .map(|b| b.slots().into_iter().map(|slot| ConnectionRef::new(block, slot)).collect())
            .unwrap_or_default();
        if let Some(tail) = ws.last_connection_in_stack(block) {
            if tail.block != block {
                available.push(tail);
            }
        }
        tracing::debug!(%block, connections = available.len(), "drag start");

        Ok(Self {
            block,
            start,
            group,
            saved_group,
            available,
            dragging,
            candidate: None,
            preview: Preview::None,
            would_delete: false,
            snap: ws.snap_config().clone(),
        })
    }

    pub fn block(&self) -> BlockId {
        self.block
    }

    pub fn group(&self) -> EventGroup {
        self.group
    }

    pub fn candidate(&self) -> Option<&Candidate> {
        self.candidate.as_ref()
    }

    pub fn preview(&self) -> &Preview {
        &self.preview
    }

    pub fn preview_state(&self) -> PreviewState {
        self.preview.state()
    }

    pub fn would_delete(&self) -> bool {
        self.would_delete
    }

    pub fn available_connections(&self) -> &[ConnectionRef] {
        &self.available
    }

    pub fn dragging_connections(&self) -> &HashSet<ConnectionRef> {
        &self.dragging
    }

    /// Move the stack to `start + (dx, dy)` and refresh the candidate and
    /// its preview
    pub fn drag_to(&mut self, ws: &mut Workspace, dx: f64, dy: f64) -> Result<(), DragError> {
        let current = ws
            .block(self.block)
            .ok_or(WorkspaceError::UnknownBlock(self.block))?
            .position;
        let target = self.start.offset(dx, dy);
        ws.translate_tree(self.block, target.x - current.x, target.y - current.y);

        let found = self.closest(ws);
        if self.should_update(ws, found.as_ref()) {
            let previous = std::mem::take(&mut self.preview);
            previous.hide(ws)?;
            self.candidate = found;
            if let Some(candidate) = &self.candidate {
                self.preview = Preview::show(ws, self.block, candidate)?;
            }
        }

        self.would_delete = self.candidate.is_none() && ws.is_delete_area(target);
        Ok(())
    }

    /// Closest legal candidate over all searched connections. The radius
    /// widens while a candidate is already previewed.
    fn closest(&self, ws: &Workspace) -> Option<Candidate> {
        let radius = if self.candidate.is_some() {
            self.snap.connecting_radius
        } else {
            self.snap.snap_radius
        };
        let mut best: Option<Candidate> = None;
        for &local in &self.available {
            let limit = best.map_or(radius, |b| b.distance);
            if let Some((closest, distance)) = ws.nearest(local, limit, &self.dragging) {
                if best.map_or(true, |b| distance < b.distance) {
                    best = Some(Candidate {
                        local,
                        closest,
                        distance,
                    });
                }
            }
        }
        best
    }

    /// The current candidate is kept unless the new one is closer by more
    /// than the configured preference
    fn should_update(&self, ws: &Workspace, found: Option<&Candidate>) -> bool {
        let Some(current) = &self.candidate else {
            return found.is_some();
        };
        let Some(found) = found else {
            return true;
        };
        if found.local == current.local && found.closest == current.closest {
            return false;
        }
        let live = match (ws.connection(current.local), ws.connection(current.closest)) {
            (Some(local), Some(closest)) => local.position.distance(closest.position),
            _ => return true,
        };
        found.distance < live - self.snap.current_connection_preference
    }

    /// Drop the stack: connect to the candidate, delete it over a deletion
    /// area, or leave it where it is
    pub fn end(mut self, ws: &mut Workspace) -> Result<DropOutcome, DragError> {
        let preview = std::mem::take(&mut self.preview);
        preview.hide(ws)?;
        ws.set_dragging(false);

        let outcome = match self.candidate.take() {
            Some(candidate) => {
                ws.connect(candidate.local, candidate.closest)?;
                DropOutcome::Connected {
                    local: candidate.local,
                    target: candidate.closest,
                }
            }
            None if self.would_delete => {
                ws.dispose_block(self.block, false)?;
                DropOutcome::Deleted
            }
            None => {
                let position = ws
                    .block(self.block)
                    .ok_or(WorkspaceError::UnknownBlock(self.block))?
                    .position;
                ws.events_mut().fire(EventKind::Move {
                    block: self.block,
                    old_parent: None,
                    new_parent: None,
                    old_position: self.start,
                    new_position: position,
                });
                DropOutcome::Freestanding
            }
        };
        tracing::debug!(block = %self.block, ?outcome, "drop");

        if outcome != DropOutcome::Deleted {
            let delay = self.snap.bump_delay_ms;
            if self.snap.grid_spacing.is_some() && outcome == DropOutcome::Freestanding {
                ws.schedule(delay / 2, Task::SnapToGrid { block: self.block });
            }
            if let Some(root) = ws.root_block(self.block) {
                ws.schedule(delay, Task::BumpNeighbours { block: root });
            }
        }
        ws.events_mut().set_group(self.saved_group);
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::config::EditorConfig;
    use crate::definition::BlockRegistry;
    use crate::layout::BoundingBox;
    use crate::workspace::{Slot, TaskOutcome};

    const DEFS: &str = r#"
[[blocks]]
type = "step"
message = "step"
previous = true
next = true

[[blocks]]
type = "stuck"
message = "stuck"
previous = true
next = true
movable = false
"#;

    fn workspace() -> Workspace {
        let registry = BlockRegistry::from_str(DEFS).unwrap();
        Workspace::new(Rc::new(registry), EditorConfig::default())
    }

    #[test]
    fn test_immovable_blocks_are_not_draggable() {
        let mut ws = workspace();
        let stuck = ws.new_block("stuck").unwrap();
        let err = DragSession::start(&mut ws, stuck, false).unwrap_err();
        assert!(matches!(err, DragError::NotDraggable(id) if id == stuck));
        assert!(!ws.is_dragging());
    }

    #[test]
    fn test_drag_below_stack_previews_then_connects() {
        let mut ws = workspace();
        let top = ws.new_block("step").unwrap();
        let dragged = ws.new_block_at("step", Point::new(200.0, 200.0)).unwrap();

        let mut session = DragSession::start(&mut ws, dragged, false).unwrap();
        assert!(ws.is_dragging());
        session.drag_to(&mut ws, -190.0, -140.0).unwrap();
        let candidate = *session.candidate().unwrap();
        assert_eq!(candidate.local, ConnectionRef::new(dragged, Slot::Previous));
        assert_eq!(candidate.closest, ConnectionRef::new(top, Slot::Next));
        assert_eq!(session.preview_state(), PreviewState::Inserting);

        let outcome = session.end(&mut ws).unwrap();
        assert_eq!(
            outcome,
            DropOutcome::Connected {
                local: ConnectionRef::new(dragged, Slot::Previous),
                target: ConnectionRef::new(top, Slot::Next),
            }
        );
        assert!(!ws.is_dragging());
        assert_eq!(ws.next_block(top), Some(dragged));
        assert_eq!(ws.block(dragged).unwrap().position, Point::new(0.0, 48.0));
        assert!(ws.blocks().all(|b| !b.insertion_marker));
    }

    #[test]
    fn test_nothing_in_range_stays_freestanding() {
        let mut ws = workspace();
        ws.new_block("step").unwrap();
        let dragged = ws.new_block_at("step", Point::new(400.0, 400.0)).unwrap();
        let mut session = DragSession::start(&mut ws, dragged, false).unwrap();
        session.drag_to(&mut ws, 10.0, 10.0).unwrap();
        assert!(session.candidate().is_none());
        assert_eq!(session.preview_state(), PreviewState::None);
        let group = session.group();
        assert_eq!(session.end(&mut ws).unwrap(), DropOutcome::Freestanding);
        assert_eq!(ws.block(dragged).unwrap().position, Point::new(410.0, 410.0));
        let last = ws.events().log().last().unwrap();
        assert_eq!(last.group, Some(group));
        assert!(matches!(last.kind, EventKind::Move { .. }));
    }

    #[test]
    fn test_hysteresis_keeps_current_candidate() {
        let mut ws = workspace();
        let near = ws.new_block_at("step", Point::new(0.0, 0.0)).unwrap();
        let other = ws.new_block_at("step", Point::new(30.0, 0.0)).unwrap();
        let dragged = ws.new_block_at("step", Point::new(300.0, 300.0)).unwrap();

        let mut session = DragSession::start(&mut ws, dragged, false).unwrap();
        // previous at (0, 58): 10 below near's next
        session.drag_to(&mut ws, -300.0, -242.0).unwrap();
        assert_eq!(session.candidate().unwrap().closest, ConnectionRef::new(near, Slot::Next));

        // now 20 from near and 10 from other: not enough of an improvement
        session.drag_to(&mut ws, -280.0, -252.0).unwrap();
        assert_eq!(session.candidate().unwrap().closest, ConnectionRef::new(near, Slot::Next));

        // right on top of other
        session.drag_to(&mut ws, -270.0, -252.0).unwrap();
        assert_eq!(session.candidate().unwrap().closest, ConnectionRef::new(other, Slot::Next));
        session.end(&mut ws).unwrap();
        assert_eq!(ws.next_block(other), Some(dragged));
        assert_eq!(ws.next_block(near), None);
    }

    #[test]
    fn test_drop_over_deletion_area_deletes() {
        let mut ws = workspace();
        ws.add_deletion_area(BoundingBox::new(500.0, 0.0, 100.0, 100.0));
        let dragged = ws.new_block("step").unwrap();
        let below = ws.new_block("step").unwrap();
        ws.connect(
            ConnectionRef::new(dragged, Slot::Next),
            ConnectionRef::new(below, Slot::Previous),
        )
        .unwrap();

        let mut session = DragSession::start(&mut ws, dragged, false).unwrap();
        session.drag_to(&mut ws, 520.0, 20.0).unwrap();
        assert!(session.would_delete());
        assert_eq!(session.end(&mut ws).unwrap(), DropOutcome::Deleted);
        assert!(ws.is_empty());
    }

    #[test]
    fn test_tail_connection_is_searched() {
        let mut ws = workspace();
        let dragged = ws.new_block("step").unwrap();
        let below = ws.new_block("step").unwrap();
        ws.connect(
            ConnectionRef::new(dragged, Slot::Next),
            ConnectionRef::new(below, Slot::Previous),
        )
        .unwrap();
        let session = DragSession::start(&mut ws, dragged, false).unwrap();
        assert!(session
            .available_connections()
            .contains(&ConnectionRef::new(below, Slot::Next)));
        assert_eq!(session.dragging_connections().len(), 4);
        session.end(&mut ws).unwrap();
    }

    #[test]
    fn test_neighbours_bumped_after_drop() {
        let mut ws = workspace();
        let dropped = ws.new_block_at("step", Point::new(200.0, 0.0)).unwrap();
        let mut session = DragSession::start(&mut ws, dropped, false).unwrap();
        session.drag_to(&mut ws, 0.0, 0.0).unwrap();
        assert_eq!(session.end(&mut ws).unwrap(), DropOutcome::Freestanding);
        let reports = ws.advance_time(250).unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].outcome, TaskOutcome::Ran);
    }
}
