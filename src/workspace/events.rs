//! Structural change notifications
//!
//! The bus is a plain recorder. Internal scratch work (insertion markers)
//! runs with the bus disabled so it leaves no trace in the log.

use crate::layout::Point;

use super::block::BlockId;
use super::connection::ConnectionRef;

/// Opaque token tying together the events of one user gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventGroup(pub u64);

#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    Create {
        block: BlockId,
    },
    Delete {
        block: BlockId,
    },
    /// A block changed parent or position. Parents are the superior
    /// connection the block hangs from.
    Move {
        block: BlockId,
        old_parent: Option<ConnectionRef>,
        new_parent: Option<ConnectionRef>,
        old_position: Point,
        new_position: Point,
    },
    Disconnect {
        parent: ConnectionRef,
        child: ConnectionRef,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockEvent {
    pub group: Option<EventGroup>,
    pub kind: EventKind,
}

#[derive(Debug)]
pub struct EventBus {
    disabled: u32,
    record_undo: bool,
    group: Option<EventGroup>,
    next_group: u64,
    log: Vec<BlockEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self {
            disabled: 0,
            record_undo: true,
            group: None,
            next_group: 1,
            log: Vec::new(),
        }
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.disabled == 0
    }

    /// Suppress events; calls nest and must be balanced by [`EventBus::enable`]
    pub fn disable(&mut self) {
        self.disabled += 1;
    }

    pub fn enable(&mut self) {
        self.disabled = self.disabled.saturating_sub(1);
    }

    /// Whether undo history is being recorded. Shadow respawn and orphan
    /// bumping only happen while it is.
    pub fn record_undo(&self) -> bool {
        self.record_undo
    }

    pub fn set_record_undo(&mut self, record: bool) {
        self.record_undo = record;
    }

    pub fn group(&self) -> Option<EventGroup> {
        self.group
    }

    pub fn set_group(&mut self, group: Option<EventGroup>) {
        self.group = group;
    }

    /// Allocate a fresh group token
    pub fn new_group(&mut self) -> EventGroup {
        let group = EventGroup(self.next_group);
        self.next_group += 1;
        group
    }

    /// Record an event unless the bus is disabled
    pub fn fire(&mut self, kind: EventKind) {
        if !self.is_enabled() {
            return;
        }
        tracing::trace!(event = ?kind, group = ?self.group, "event");
        self.log.push(BlockEvent {
            group: self.group,
            kind,
        });
    }

    pub fn log(&self) -> &[BlockEvent] {
        &self.log
    }

    /// Drain the recorded events
    pub fn take(&mut self) -> Vec<BlockEvent> {
        std::mem::take(&mut self.log)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workspace::block::WorkspaceId;

    fn block(serial: u64) -> BlockId {
        BlockId {
            workspace: WorkspaceId(1),
            serial,
        }
    }

    #[test]
    fn test_disabled_bus_drops_events() {
        let mut bus = EventBus::new();
        bus.disable();
        bus.disable();
        bus.fire(EventKind::Create { block: block(1) });
        bus.enable();
        bus.fire(EventKind::Create { block: block(2) });
        assert!(bus.log().is_empty());
        bus.enable();
        bus.fire(EventKind::Create { block: block(3) });
        assert_eq!(bus.log().len(), 1);
    }

    #[test]
    fn test_events_carry_group() {
        let mut bus = EventBus::new();
        let group = bus.new_group();
        bus.set_group(Some(group));
        bus.fire(EventKind::Delete { block: block(1) });
        bus.set_group(None);
        bus.fire(EventKind::Delete { block: block(2) });
        let events = bus.take();
        assert_eq!(events[0].group, Some(group));
        assert_eq!(events[1].group, None);
        assert!(bus.log().is_empty());
    }

    #[test]
    fn test_groups_are_distinct() {
        let mut bus = EventBus::new();
        assert_ne!(bus.new_group(), bus.new_group());
    }

    #[test]
    fn test_record_undo_defaults_on() {
        let mut bus = EventBus::new();
        assert!(bus.record_undo());
        bus.set_record_undo(false);
        assert!(!bus.record_undo());
    }
}
