//! Connect, disconnect, unplug and dispose
//!
//! These mutate the tree and are only called after a compatibility check
//! has passed, so every precondition failure is an error rather than a
//! silent no-op.

use super::block::BlockId;
use super::checker::ConnectionCheck;
use super::connection::{checks_intersect, ConnectionRef, ConnectionRole, Slot};
use super::error::WorkspaceError;
use super::events::EventKind;
use super::scheduler::Task;
use super::Workspace;

impl Workspace {
    /// Join two connections. Already-joined pairs are left alone.
    pub fn connect(&mut self, a: ConnectionRef, b: ConnectionRef) -> Result<(), WorkspaceError> {
        if self.conn(a)?.target == Some(b) {
            return Ok(());
        }
        let check = self.can_connect(a, b);
        if check != ConnectionCheck::CanConnect {
            return Err(WorkspaceError::Refused {
                from: a,
                to: b,
                reason: check,
            });
        }
        let (parent, child) = if self.conn(a)?.role.is_superior() {
            (a, b)
        } else {
            (b, a)
        };
        tracing::debug!(%parent, %child, "connect");

        let previous_root = self
            .block(child.block)
            .and_then(|block| block.parent)
            .and_then(|parent| self.root_block(parent));
        self.connect_internal(parent, child)?;

        if let Some(root) = self.root_block(parent.block) {
            self.render_block(root)?;
        }
        if let Some(old) = previous_root.filter(|old| self.block(*old).is_some_and(|b| b.parent.is_none())) {
            self.render_block(old)?;
        }
        Ok(())
    }

    pub(crate) fn connect_internal(
        &mut self,
        parent: ConnectionRef,
        child: ConnectionRef,
    ) -> Result<(), WorkspaceError> {
        let parent_role = self.conn(parent)?.role;
        let child_block = child.block;
        let old_parent = self.conn(child)?.target;
        let old_position = self
            .block(child_block)
            .ok_or(WorkspaceError::UnknownBlock(child_block))?
            .position;

        // A C-block wrapping a block mid-stack takes over that block's place
        let surrounding = match old_parent {
            Some(above) if parent_role == ConnectionRole::Next => {
                let wrapper = self
                    .block(parent.block)
                    .ok_or(WorkspaceError::UnknownBlock(parent.block))?;
                let wraps = wrapper.first_statement_slot() == Some(parent.slot)
                    && wrapper.previous.as_ref().is_some_and(|p| !p.is_connected());
                wraps.then_some(above)
            }
            _ => None,
        };

        if let Some(above) = old_parent {
            self.disconnect_internal(child)?;
            if above != parent {
                self.respawn_shadow(above)?;
            }
        }

        let mut shadow = self.conn_mut(parent)?.shadow.take();
        let occupant = self.conn(parent)?.target;
        if let Some(orphan_conn) = occupant {
            let orphan = orphan_conn.block;
            let orphan_is_shadow = self.block(orphan).is_some_and(|b| b.shadow);
            let mut reattached = false;

            if orphan_is_shadow {
                // Shadows dissolve; their current values become the filler
                shadow = Some(self.serialize_block(orphan)?);
                self.disconnect_internal(parent)?;
                self.silently(|ws| ws.dispose_tree(orphan))?;
                reattached = true;
            } else if parent_role == ConnectionRole::Next {
                let orphan_previous = self
                    .block(orphan)
                    .and_then(|b| b.previous.as_ref())
                    .ok_or(WorkspaceError::OrphanWithoutPrevious(orphan))?
                    .check
                    .clone();
                if let Some(tail) = self.stack_tail(child_block) {
                    let tail_next = self
                        .block(tail)
                        .and_then(|b| b.next.as_ref())
                        .filter(|next| checks_intersect(orphan_previous.as_deref(), next.check.as_deref()))
                        .map(|_| ConnectionRef::new(tail, Slot::Next));
                    if let Some(tail_next) = tail_next {
                        self.connect_internal(tail_next, ConnectionRef::new(orphan, Slot::Previous))?;
                        reattached = true;
                    }
                }
            }

            if !reattached {
                self.disconnect_internal(parent)?;
                if self.events.record_undo() {
                    let delay = self.snap.bump_delay_ms;
                    self.schedule(
                        delay,
                        Task::Bump {
                            orphan,
                            away_from: parent,
                        },
                    );
                }
            }
        }
        self.conn_mut(parent)?.shadow = shadow;

        self.conn_mut(parent)?.target = Some(child);
        self.conn_mut(child)?.target = Some(parent);
        if let Some(block) = self.block_mut(child_block) {
            block.parent = Some(parent.block);
        }
        self.events.fire(EventKind::Move {
            block: child_block,
            old_parent,
            new_parent: Some(parent),
            old_position,
            new_position: old_position,
        });

        if let Some(above) = surrounding {
            if let Some(previous) = self
                .block(parent.block)
                .and_then(|b| b.previous.as_ref().map(|_| ConnectionRef::new(parent.block, Slot::Previous)))
            {
                if self.can_connect(above, previous).is_ok() {
                    self.connect_internal(above, previous)?;
                }
            }
        }
        Ok(())
    }

    /// Last non-shadow block of the stack starting at `id`, provided it can
    /// take a next block
    fn stack_tail(&self, id: BlockId) -> Option<BlockId> {
        let mut current = id;
        loop {
            let next = self.block(current)?.next.as_ref()?;
            match next.target.and_then(|t| self.block(t.block)) {
                Some(below) if !below.shadow => current = below.id,
                _ => return Some(current),
            }
        }
    }

    /// Break a link without respawning shadows or re-rendering
    pub(crate) fn disconnect_internal(
        &mut self,
        conn: ConnectionRef,
    ) -> Result<(ConnectionRef, ConnectionRef), WorkspaceError> {
        let connection = self.conn(conn)?;
        let other = connection.target.ok_or(WorkspaceError::NotConnected(conn))?;
        let superior = connection.role.is_superior();
        if self.conn(other)?.target != Some(conn) {
            return Err(WorkspaceError::Asymmetric { conn, other });
        }
        let (parent, child) = if superior { (conn, other) } else { (other, conn) };

        self.events.fire(EventKind::Disconnect { parent, child });
        self.conn_mut(parent)?.target = None;
        self.conn_mut(child)?.target = None;
        if let Some(block) = self.block_mut(child.block) {
            block.parent = None;
        }
        Ok((parent, child))
    }

    /// Break a link. The emptied socket gets its shadow filler back.
    pub fn disconnect(&mut self, conn: ConnectionRef) -> Result<(), WorkspaceError> {
        let (parent, child) = self.disconnect_internal(conn)?;
        tracing::debug!(%parent, %child, "disconnect");
        self.respawn_shadow(parent)?;

        if let Some(root) = self.root_block(parent.block) {
            self.render_block(root)?;
        }
        if self.block(child.block).is_some() {
            self.render_block(child.block)?;
        }
        Ok(())
    }

    fn respawn_shadow(&mut self, parent: ConnectionRef) -> Result<(), WorkspaceError> {
        if !self.events.record_undo() {
            return Ok(());
        }
        let connection = self.conn(parent)?;
        let Some(state) = connection.shadow.clone().filter(|_| !connection.is_connected()) else {
            return Ok(());
        };
        let shadow = self.instantiate_state(&state, true)?;
        let plug = self
            .block(shadow)
            .and_then(|b| b.plug_slot())
            .ok_or(WorkspaceError::NoPlug(shadow))?;
        self.connect_internal(parent, ConnectionRef::new(shadow, plug))
    }

    /// Detach a block from its parent. With `heal_stack`, the blocks below a
    /// statement block are reattached to whatever was above it.
    pub fn unplug(&mut self, id: BlockId, heal_stack: bool) -> Result<(), WorkspaceError> {
        let block = self.block(id).ok_or(WorkspaceError::UnknownBlock(id))?;
        if let Some(output) = &block.output {
            if output.is_connected() {
                self.disconnect(ConnectionRef::new(id, Slot::Output))?;
            }
            return Ok(());
        }
        let Some(previous) = &block.previous else {
            return Ok(());
        };

        let above = previous.target;
        if above.is_some() {
            self.disconnect(ConnectionRef::new(id, Slot::Previous))?;
        }
        if !heal_stack {
            return Ok(());
        }
        let Some(below) = self.next_block(id) else {
            return Ok(());
        };
        let below_previous = ConnectionRef::new(below, Slot::Previous);
        self.disconnect(below_previous)?;
        if let Some(above) = above {
            let compatible = match (self.connection(above), self.connection(below_previous)) {
                (Some(a), Some(b)) => a.accepts(b),
                _ => false,
            };
            if compatible {
                self.connect(above, below_previous)?;
            }
        }
        Ok(())
    }

    /// Remove a block and everything attached beneath it
    pub fn dispose_block(&mut self, id: BlockId, heal_stack: bool) -> Result<(), WorkspaceError> {
        if self.block(id).is_none() {
            return Err(WorkspaceError::UnknownBlock(id));
        }
        self.unplug(id, heal_stack)?;
        self.events.fire(EventKind::Delete { block: id });
        tracing::debug!(block = %id, "dispose");
        self.silently(|ws| ws.dispose_tree(id))
    }

    pub(crate) fn dispose_tree(&mut self, id: BlockId) -> Result<(), WorkspaceError> {
        for (slot, child) in self.child_blocks(id) {
            self.disconnect_internal(ConnectionRef::new(id, slot))?;
            self.dispose_tree(child)?;
        }
        let block = self.block(id).ok_or(WorkspaceError::UnknownBlock(id))?;
        for slot in block.slots() {
            if block.connection(slot).is_some_and(|c| c.is_connected()) {
                return Err(WorkspaceError::StillConnected(ConnectionRef::new(id, slot)));
            }
        }
        self.remove_block(id);
        Ok(())
    }

    // -- Bumping ------------------------------------------------------------

    /// Shift the root of `moving` so its connection sits one snap radius
    /// below and to the right of `fixed`. Returns false when nothing moved.
    pub(crate) fn bump_away_from(
        &mut self,
        moving: ConnectionRef,
        fixed: ConnectionRef,
    ) -> Result<bool, WorkspaceError> {
        if self.is_dragging() {
            return Ok(false);
        }
        let mut root = self
            .root_block(moving.block)
            .ok_or(WorkspaceError::UnknownBlock(moving.block))?;
        let mut anchor = self.conn(fixed)?.position;
        let mut reverse = false;
        if !self.block(root).is_some_and(|b| b.movable) {
            // Move the other side instead, upwards
            root = self
                .root_block(fixed.block)
                .ok_or(WorkspaceError::UnknownBlock(fixed.block))?;
            if !self.block(root).is_some_and(|b| b.movable) {
                return Ok(false);
            }
            anchor = self.conn(moving)?.position;
            reverse = true;
        }
        let origin = self.conn(if reverse { fixed } else { moving })?.position;
        let radius = self.snap.snap_radius;
        let dx = anchor.x + radius - origin.x;
        let mut dy = anchor.y + radius - origin.y;
        if reverse {
            dy = -dy;
        }
        tracing::debug!(block = %root, dx, dy, "bump");
        self.move_by(root, dx, dy)?;
        Ok(true)
    }

    /// Push unrelated stacks whose free connections sit within snap radius
    /// of this block's tree
    pub(crate) fn bump_neighbours(&mut self, id: BlockId) -> Result<(), WorkspaceError> {
        let Some(root) = self.root_block(id) else {
            return Ok(());
        };
        let radius = self.snap.snap_radius;
        for member in self.descendants(root) {
            let slots = match self.block(member) {
                Some(block) if !block.insertion_marker => block.slots(),
                _ => continue,
            };
            for slot in slots {
                let local = ConnectionRef::new(member, slot);
                for other in self.neighbours(local, radius) {
                    let (Some(mine), Some(theirs)) = (self.connection(local), self.connection(other)) else {
                        continue;
                    };
                    if mine.is_connected() && theirs.is_connected() {
                        continue;
                    }
                    let superior = mine.role.is_superior();
                    let foreign = self.block(other.block).is_some_and(|b| !b.insertion_marker)
                        && self.root_block(other.block) != Some(root);
                    if !foreign {
                        continue;
                    }
                    if superior {
                        self.bump_away_from(other, local)?;
                    } else {
                        self.bump_away_from(local, other)?;
                    }
                }
            }
        }
        Ok(())
    }

    pub(crate) fn snap_to_grid(&mut self, id: BlockId) -> Result<(), WorkspaceError> {
        let Some(spacing) = self.snap.grid_spacing.filter(|s| *s > 0.0) else {
            return Ok(());
        };
        let position = self.block(id).ok_or(WorkspaceError::UnknownBlock(id))?.position;
        let half = spacing / 2.0;
        let dx = ((position.x - half) / spacing).round() * spacing + half - position.x;
        let dy = ((position.y - half) / spacing).round() * spacing + half - position.y;
        if dx != 0.0 || dy != 0.0 {
            self.move_by(id, dx, dy)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use pretty_assertions::assert_eq;

    use crate::config::EditorConfig;
    use crate::definition::BlockRegistry;
    use crate::workspace::{BlockState, TaskOutcome, Workspace};

    use super::*;

    const DEFS: &str = r#"
[[blocks]]
type = "stack"
message = "step"
previous = true
next = true

[[blocks]]
type = "say"
message = "say %1"
args = [{ kind = "input_value", name = "MESSAGE" }]
previous = true
next = true

[[blocks]]
type = "text"
message = "%1"
args = [{ kind = "field_text", name = "TEXT" }]
output = ["String"]

[[blocks]]
type = "stop"
message = "stop"
previous = true
"#;

    fn workspace() -> Workspace {
        let registry = BlockRegistry::from_str(DEFS).unwrap();
        Workspace::new(Rc::new(registry), EditorConfig::default())
    }

    fn next(id: BlockId) -> ConnectionRef {
        ConnectionRef::new(id, Slot::Next)
    }

    fn prev(id: BlockId) -> ConnectionRef {
        ConnectionRef::new(id, Slot::Previous)
    }

    #[test]
    fn test_connect_is_symmetric_and_disconnect_clears_both() {
        let mut ws = workspace();
        let a = ws.new_block("stack").unwrap();
        let b = ws.new_block("stack").unwrap();
        ws.connect(next(a), prev(b)).unwrap();
        assert_eq!(ws.connection(next(a)).unwrap().target, Some(prev(b)));
        assert_eq!(ws.connection(prev(b)).unwrap().target, Some(next(a)));
        assert_eq!(ws.block(b).unwrap().parent, Some(a));

        ws.disconnect(prev(b)).unwrap();
        assert_eq!(ws.connection(next(a)).unwrap().target, None);
        assert_eq!(ws.connection(prev(b)).unwrap().target, None);
        assert_eq!(ws.block(b).unwrap().parent, None);
    }

    #[test]
    fn test_connect_twice_is_noop() {
        let mut ws = workspace();
        let a = ws.new_block("stack").unwrap();
        let b = ws.new_block("stack").unwrap();
        ws.connect(next(a), prev(b)).unwrap();
        let events = ws.events().log().len();
        ws.connect(prev(b), next(a)).unwrap();
        assert_eq!(ws.events().log().len(), events);
    }

    #[test]
    fn test_refused_connection_reports_reason() {
        let mut ws = workspace();
        let a = ws.new_block("stack").unwrap();
        let err = ws.connect(next(a), prev(a)).unwrap_err();
        assert!(matches!(
            err,
            WorkspaceError::Refused {
                reason: ConnectionCheck::SelfConnection,
                ..
            }
        ));
    }

    #[test]
    fn test_disconnect_unconnected_is_error() {
        let mut ws = workspace();
        let a = ws.new_block("stack").unwrap();
        assert!(matches!(
            ws.disconnect(next(a)),
            Err(WorkspaceError::NotConnected(_))
        ));
    }

    #[test]
    fn test_insert_splices_stack() {
        let mut ws = workspace();
        let p = ws.new_block("stack").unwrap();
        let q = ws.new_block("stack").unwrap();
        let x = ws.new_block("stack").unwrap();
        ws.connect(next(p), prev(q)).unwrap();
        ws.connect(next(p), prev(x)).unwrap();

        assert_eq!(ws.next_block(p), Some(x));
        assert_eq!(ws.next_block(x), Some(q));
        assert_eq!(ws.len(), 3);
        assert!(ws.scheduler().pending().is_empty());
    }

    #[test]
    fn test_unattachable_orphan_is_bumped_once() {
        let mut ws = workspace();
        let p = ws.new_block("stack").unwrap();
        let q = ws.new_block("stack").unwrap();
        let stop = ws.new_block("stop").unwrap();
        ws.connect(next(p), prev(q)).unwrap();
        ws.connect(next(p), prev(stop)).unwrap();

        assert_eq!(ws.block(q).unwrap().parent, None);
        assert_eq!(ws.scheduler().pending().len(), 1);

        let before = ws.block(q).unwrap().position;
        let anchor = ws.connection(next(p)).unwrap().position;
        let reports = ws.advance_time(250).unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].outcome, TaskOutcome::Ran);
        let after = ws.block(q).unwrap().position;
        let radius = ws.snap_config().snap_radius;
        // q's previous connection sits at its origin
        assert_eq!(after.x - before.x, anchor.x + radius - before.x);
        assert_eq!(after.y - before.y, anchor.y + radius - before.y);
    }

    #[test]
    fn test_bump_is_stale_after_reparenting() {
        let mut ws = workspace();
        let p = ws.new_block("stack").unwrap();
        let q = ws.new_block("stack").unwrap();
        let stop = ws.new_block("stop").unwrap();
        let other = ws.new_block("stack").unwrap();
        ws.connect(next(p), prev(q)).unwrap();
        ws.connect(next(p), prev(stop)).unwrap();
        ws.connect(next(other), prev(q)).unwrap();

        let before = ws.block(q).unwrap().position;
        let reports = ws.advance_time(1000).unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].outcome, TaskOutcome::Stale);
        assert_eq!(ws.block(q).unwrap().position, before);
    }

    #[test]
    fn test_no_bump_without_undo_recording() {
        let mut ws = workspace();
        let p = ws.new_block("stack").unwrap();
        let q = ws.new_block("stack").unwrap();
        let stop = ws.new_block("stop").unwrap();
        ws.connect(next(p), prev(q)).unwrap();
        ws.events_mut().set_record_undo(false);
        ws.connect(next(p), prev(stop)).unwrap();
        assert!(ws.scheduler().pending().is_empty());
    }

    #[test]
    fn test_shadow_dissolves_and_respawns() {
        let mut ws = workspace();
        let state = BlockState::new("say")
            .with_input_shadow("MESSAGE", BlockState::new("text").with_field("TEXT", "Hello"));
        let say = ws.deserialize_block(&state).unwrap();
        let socket = ConnectionRef::new(say, Slot::Input(0));
        let shadow = ws.target_block(socket).unwrap();
        assert!(ws.block(shadow).unwrap().shadow);

        let real = ws.new_block("text").unwrap();
        ws.connect(socket, ConnectionRef::new(real, Slot::Output)).unwrap();
        assert!(ws.block(shadow).is_none());
        assert!(ws.scheduler().pending().is_empty());

        ws.disconnect(socket).unwrap();
        let respawned = ws.target_block(socket).unwrap();
        let block = ws.block(respawned).unwrap();
        assert!(block.shadow);
        assert_eq!(block.field("TEXT").and_then(|f| f.value()).as_deref(), Some("Hello"));
    }

    #[test]
    fn test_unplug_heals_stack() {
        let mut ws = workspace();
        let a = ws.new_block("stack").unwrap();
        let b = ws.new_block("stack").unwrap();
        let c = ws.new_block("stack").unwrap();
        ws.connect(next(a), prev(b)).unwrap();
        ws.connect(next(b), prev(c)).unwrap();

        ws.unplug(b, true).unwrap();
        assert_eq!(ws.next_block(a), Some(c));
        assert_eq!(ws.next_block(b), None);
        assert_eq!(ws.block(b).unwrap().parent, None);
    }

    #[test]
    fn test_unplug_without_heal_takes_the_rest() {
        let mut ws = workspace();
        let a = ws.new_block("stack").unwrap();
        let b = ws.new_block("stack").unwrap();
        let c = ws.new_block("stack").unwrap();
        ws.connect(next(a), prev(b)).unwrap();
        ws.connect(next(b), prev(c)).unwrap();

        ws.unplug(b, false).unwrap();
        assert_eq!(ws.next_block(a), None);
        assert_eq!(ws.next_block(b), Some(c));
    }

    #[test]
    fn test_dispose_removes_subtree_and_index_entries() {
        let mut ws = workspace();
        let a = ws.new_block("stack").unwrap();
        let say = ws.new_block("say").unwrap();
        let text = ws.new_block("text").unwrap();
        ws.connect(next(a), prev(say)).unwrap();
        ws.connect(ConnectionRef::new(say, Slot::Input(0)), ConnectionRef::new(text, Slot::Output))
            .unwrap();

        ws.dispose_block(say, false).unwrap();
        assert!(ws.block(say).is_none());
        assert!(ws.block(text).is_none());
        assert_eq!(ws.next_block(a), None);
        assert!(ws.connection_db(ConnectionRole::Output).is_empty());
        assert_eq!(ws.connection_db(ConnectionRole::Next).len(), 1);
    }

    #[test]
    fn test_snap_to_grid() {
        let registry = BlockRegistry::from_str(DEFS).unwrap();
        let config = EditorConfig::default()
            .with_snap(crate::config::SnapConfig::default().with_grid_spacing(20.0));
        let mut ws = Workspace::new(Rc::new(registry), config);
        let a = ws
            .new_block_at("stack", crate::layout::Point::new(33.0, 4.0))
            .unwrap();
        ws.snap_to_grid(a).unwrap();
        assert_eq!(ws.block(a).unwrap().position, crate::layout::Point::new(30.0, 10.0));
    }
}
