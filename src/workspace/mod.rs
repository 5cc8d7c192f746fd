//! The workspace: blocks, their connections and everything that mutates them
//!
//! A [`Workspace`] owns every block by id. Links between blocks are stored
//! as [`ConnectionRef`]s, so the tree can be walked in any direction without
//! shared ownership.

pub mod block;
pub mod checker;
pub mod connection;
pub mod db;
pub mod error;
pub mod events;
pub mod protocol;
pub mod scheduler;
pub mod state;

pub use block::{Block, BlockId, Field, Highlight, Input, InputKind, WorkspaceId};
pub use checker::{can_connect, ConnectionCheck, Endpoint, ExclusivePairing, EXCLUSIVE_PAIRINGS};
pub use connection::{checks_intersect, Connection, ConnectionRef, ConnectionRole, Slot};
pub use db::{ConnectionDb, DbEntry};
pub use error::WorkspaceError;
pub use events::{BlockEvent, EventBus, EventGroup, EventKind};
pub use scheduler::{ScheduledTask, Scheduler, Task, TaskOutcome, TaskReport};
pub use state::{BlockState, InputState, StateError, WorkspaceState};

use std::collections::BTreeMap;
use std::rc::Rc;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::config::{EditorConfig, SnapConfig};
use crate::definition::{BlockRegistry, Mutation};
use crate::layout::{strategy_for, BoundingBox, LayoutStrategy, Point};

use db::ConnectionDbs;

static NEXT_WORKSPACE_ID: AtomicU32 = AtomicU32::new(1);

#[derive(Debug)]
pub struct Workspace {
    id: WorkspaceId,
    registry: Rc<BlockRegistry>,
    blocks: BTreeMap<BlockId, Block>,
    next_serial: u64,
    dbs: ConnectionDbs,
    strategy: Rc<dyn LayoutStrategy>,
    snap: SnapConfig,
    events: EventBus,
    scheduler: Scheduler,
    deletion_areas: Vec<BoundingBox>,
    dragging: bool,
}

impl Workspace {
    pub fn new(registry: Rc<BlockRegistry>, config: EditorConfig) -> Self {
        let id = WorkspaceId(NEXT_WORKSPACE_ID.fetch_add(1, Ordering::Relaxed));
        Self {
            id,
            registry,
            blocks: BTreeMap::new(),
            next_serial: 1,
            dbs: ConnectionDbs::default(),
            strategy: strategy_for(config.style, &config.layout),
            snap: config.snap,
            events: EventBus::new(),
            scheduler: Scheduler::new(),
            deletion_areas: Vec::new(),
            dragging: false,
        }
    }

    pub fn id(&self) -> WorkspaceId {
        self.id
    }

    pub fn registry(&self) -> &BlockRegistry {
        &self.registry
    }

    pub fn snap_config(&self) -> &SnapConfig {
        &self.snap
    }

    pub fn strategy(&self) -> Rc<dyn LayoutStrategy> {
        Rc::clone(&self.strategy)
    }

    /// Switch layout strategy; cached measurements are dropped so the next
    /// pass rebuilds every outline
    pub fn set_strategy(&mut self, strategy: Rc<dyn LayoutStrategy>) {
        self.strategy = strategy;
        for block in self.blocks.values_mut() {
            block.metrics = None;
            block.outline = None;
        }
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.events
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    // -- Lookup -------------------------------------------------------------

    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(&id)
    }

    pub(crate) fn block_mut(&mut self, id: BlockId) -> Option<&mut Block> {
        self.blocks.get_mut(&id)
    }

    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks.values()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn connection(&self, conn: ConnectionRef) -> Option<&Connection> {
        self.block(conn.block)?.connection(conn.slot)
    }

    pub(crate) fn connection_mut(&mut self, conn: ConnectionRef) -> Option<&mut Connection> {
        self.block_mut(conn.block)?.connection_mut(conn.slot)
    }

    pub(crate) fn conn(&self, conn: ConnectionRef) -> Result<&Connection, WorkspaceError> {
        self.connection(conn)
            .ok_or(WorkspaceError::UnknownConnection(conn))
    }

    pub(crate) fn conn_mut(&mut self, conn: ConnectionRef) -> Result<&mut Connection, WorkspaceError> {
        self.connection_mut(conn)
            .ok_or(WorkspaceError::UnknownConnection(conn))
    }

    /// Block attached on the other side of a connection
    pub fn target_block(&self, conn: ConnectionRef) -> Option<BlockId> {
        Some(self.connection(conn)?.target?.block)
    }

    /// Blocks without a parent, in creation order
    pub fn top_blocks(&self) -> Vec<BlockId> {
        self.blocks
            .values()
            .filter(|b| b.parent.is_none())
            .map(|b| b.id)
            .collect()
    }

    pub fn root_block(&self, id: BlockId) -> Option<BlockId> {
        let mut current = self.block(id)?;
        while let Some(parent) = current.parent {
            current = self.block(parent)?;
        }
        Some(current.id)
    }

    /// Blocks attached beneath this one, keyed by the slot holding them
    pub fn child_blocks(&self, id: BlockId) -> Vec<(Slot, BlockId)> {
        let Some(block) = self.block(id) else {
            return Vec::new();
        };
        block
            .slots()
            .into_iter()
            .filter_map(|slot| {
                let conn = block.connection(slot)?;
                if !conn.role.is_superior() {
                    return None;
                }
                Some((slot, conn.target?.block))
            })
            .collect()
    }

    /// The block and everything attached beneath it, parents first
    pub fn descendants(&self, id: BlockId) -> Vec<BlockId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if self.block(current).is_none() {
                continue;
            }
            out.push(current);
            let children = self.child_blocks(current);
            stack.extend(children.into_iter().rev().map(|(_, child)| child));
        }
        out
    }

    pub fn next_block(&self, id: BlockId) -> Option<BlockId> {
        self.target_block(ConnectionRef::new(id, Slot::Next))
    }

    /// Free next connection at the bottom of the stack starting at `id`.
    /// None when the stack ends in a terminal block.
    pub fn last_connection_in_stack(&self, id: BlockId) -> Option<ConnectionRef> {
        let mut current = id;
        loop {
            let next = self.block(current)?.next.as_ref()?;
            match next.target {
                Some(target) => current = target.block,
                None => return Some(ConnectionRef::new(current, Slot::Next)),
            }
        }
    }

    // -- Regions and modes --------------------------------------------------

    pub fn add_deletion_area(&mut self, area: BoundingBox) {
        self.deletion_areas.push(area);
    }

    pub fn is_delete_area(&self, point: Point) -> bool {
        self.deletion_areas.iter().any(|area| area.contains(point))
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub(crate) fn set_dragging(&mut self, dragging: bool) {
        self.dragging = dragging;
    }

    /// Run `f` with event emission suppressed
    pub fn silently<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        self.events.disable();
        let out = f(self);
        self.events.enable();
        out
    }

    // -- Creation and editing -----------------------------------------------

    pub fn new_block(&mut self, type_name: &str) -> Result<BlockId, WorkspaceError> {
        self.new_block_at(type_name, Point::default())
    }

    /// Create a top-level block at `position` and lay it out
    pub fn new_block_at(&mut self, type_name: &str, position: Point) -> Result<BlockId, WorkspaceError> {
        let id = self.create_block(type_name, None, false, false)?;
        if let Some(block) = self.block_mut(id) {
            block.position = position;
        }
        self.render_block(id)?;
        Ok(id)
    }

    pub(crate) fn create_block(
        &mut self,
        type_name: &str,
        mutation: Option<&Mutation>,
        shadow: bool,
        insertion_marker: bool,
    ) -> Result<BlockId, WorkspaceError> {
        let registry = Rc::clone(&self.registry);
        let definition = registry
            .get(type_name)
            .ok_or_else(|| WorkspaceError::UnknownBlockType(type_name.to_string()))?;
        let template = definition.instantiate(mutation)?;

        let id = BlockId {
            workspace: self.id,
            serial: self.next_serial,
        };
        self.next_serial += 1;

        let block = Block {
            id,
            type_name: definition.type_name.clone(),
            category: definition.category.clone(),
            shadow,
            insertion_marker,
            movable: definition.movable && !shadow,
            position: Point::default(),
            parent: None,
            output_shape: template.output_shape,
            output: template.output,
            previous: template.previous,
            next: template.next,
            inputs: template.inputs,
            mutation: mutation.cloned(),
            highlight: Highlight::None,
            metrics: None,
            outline: None,
        };
        for slot in block.slots() {
            if let Some(conn) = block.connection(slot) {
                self.dbs
                    .get_mut(conn.role)
                    .add(ConnectionRef::new(id, slot), conn.position);
            }
        }
        self.blocks.insert(id, block);
        self.events.fire(EventKind::Create { block: id });
        Ok(id)
    }

    /// Change a field value and re-lay-out the block's tree
    pub fn set_field(&mut self, id: BlockId, name: &str, value: &str) -> Result<(), WorkspaceError> {
        self.apply_field(id, name, value)?;
        if let Some(root) = self.root_block(id) {
            self.render_block(root)?;
        }
        Ok(())
    }

    pub(crate) fn apply_field(&mut self, id: BlockId, name: &str, value: &str) -> Result<(), WorkspaceError> {
        let block = self.block_mut(id).ok_or(WorkspaceError::UnknownBlock(id))?;
        let block_type = block.type_name.clone();
        let field = block
            .field_mut(name)
            .ok_or_else(|| WorkspaceError::UnknownField {
                block_type,
                field: name.to_string(),
            })?;
        if !field.set_value(value) {
            return Err(WorkspaceError::InvalidFieldValue {
                field: name.to_string(),
                value: value.to_string(),
            });
        }
        Ok(())
    }

    // -- Movement -----------------------------------------------------------

    /// Move a top-level block and everything attached to it
    pub fn move_by(&mut self, id: BlockId, dx: f64, dy: f64) -> Result<(), WorkspaceError> {
        let block = self.block(id).ok_or(WorkspaceError::UnknownBlock(id))?;
        if block.parent.is_some() {
            return Err(WorkspaceError::NotTopLevel(id));
        }
        let old_position = block.position;
        self.translate_tree(id, dx, dy);
        self.events.fire(EventKind::Move {
            block: id,
            old_parent: None,
            new_parent: None,
            old_position,
            new_position: old_position.offset(dx, dy),
        });
        Ok(())
    }

    pub fn move_to(&mut self, id: BlockId, position: Point) -> Result<(), WorkspaceError> {
        let current = self.block(id).ok_or(WorkspaceError::UnknownBlock(id))?.position;
        self.move_by(id, position.x - current.x, position.y - current.y)
    }

    /// Shift a subtree and its indexed connections without emitting events
    pub(crate) fn translate_tree(&mut self, id: BlockId, dx: f64, dy: f64) {
        if dx == 0.0 && dy == 0.0 {
            return;
        }
        for member in self.descendants(id) {
            let Some(block) = self.blocks.get_mut(&member) else {
                continue;
            };
            block.position = block.position.offset(dx, dy);
            for slot in block.slots() {
                if let Some(conn) = block.connection_mut(slot) {
                    conn.position = conn.position.offset(dx, dy);
                    self.dbs
                        .get_mut(conn.role)
                        .relocate(ConnectionRef::new(member, slot), conn.position);
                }
            }
        }
    }

    pub(crate) fn set_connection_position(&mut self, conn: ConnectionRef, position: Point) {
        if let Some(connection) = self.connection_mut(conn) {
            if connection.position == position {
                return;
            }
            connection.position = position;
            let role = connection.role;
            self.dbs.get_mut(role).relocate(conn, position);
        }
    }

    pub(crate) fn unindex_block(&mut self, id: BlockId) {
        let Some(block) = self.blocks.get(&id) else {
            return;
        };
        for slot in block.slots() {
            if let Some(conn) = block.connection(slot) {
                self.dbs.get_mut(conn.role).remove(ConnectionRef::new(id, slot));
            }
        }
    }

    pub(crate) fn remove_block(&mut self, id: BlockId) -> Option<Block> {
        self.unindex_block(id);
        self.blocks.remove(&id)
    }
}
