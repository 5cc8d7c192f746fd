//! Connection data model
//!
//! A connection is one typed attachment point owned by a block. Links
//! between connections are stored as [`ConnectionRef`]s on both sides so
//! the target relation stays symmetric.

use std::fmt;

use crate::layout::Point;

use super::block::BlockId;
use super::state::BlockState;

/// Directional role of a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConnectionRole {
    /// A reporter's plug
    Output,
    /// A value socket
    Input,
    /// The top of a statement block
    Previous,
    /// The bottom of a statement block, or a statement input
    Next,
}

impl ConnectionRole {
    pub const ALL: [ConnectionRole; 4] = [
        ConnectionRole::Output,
        ConnectionRole::Input,
        ConnectionRole::Previous,
        ConnectionRole::Next,
    ];

    /// The single role this one may be joined to
    pub fn opposite(self) -> Self {
        match self {
            ConnectionRole::Output => ConnectionRole::Input,
            ConnectionRole::Input => ConnectionRole::Output,
            ConnectionRole::Previous => ConnectionRole::Next,
            ConnectionRole::Next => ConnectionRole::Previous,
        }
    }

    /// The superior side visually contains the other
    pub fn is_superior(self) -> bool {
        matches!(self, ConnectionRole::Input | ConnectionRole::Next)
    }
}

impl fmt::Display for ConnectionRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionRole::Output => "output",
            ConnectionRole::Input => "input",
            ConnectionRole::Previous => "previous",
            ConnectionRole::Next => "next",
        };
        f.write_str(name)
    }
}

/// Where on its block a connection lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Slot {
    Output,
    Previous,
    Next,
    /// The connection of the input at this index
    Input(usize),
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Output => f.write_str("output"),
            Slot::Previous => f.write_str("previous"),
            Slot::Next => f.write_str("next"),
            Slot::Input(index) => write!(f, "input#{}", index),
        }
    }
}

/// Stable handle to a connection: its owning block plus the slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionRef {
    pub block: BlockId,
    pub slot: Slot,
}

impl ConnectionRef {
    pub fn new(block: BlockId, slot: Slot) -> Self {
        Self { block, slot }
    }
}

impl fmt::Display for ConnectionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.block, self.slot)
    }
}

/// One typed attachment point
#[derive(Debug, Clone, PartialEq)]
pub struct Connection {
    pub role: ConnectionRole,
    /// Absolute workspace position, kept current by the layout engine
    pub position: Point,
    /// Accepted type tags; `None` accepts anything
    pub check: Option<Vec<String>>,
    /// Filler respawned when the socket is emptied
    pub shadow: Option<BlockState>,
    pub target: Option<ConnectionRef>,
}

impl Connection {
    pub fn new(role: ConnectionRole, check: Option<Vec<String>>) -> Self {
        Self {
            role,
            position: Point::default(),
            check,
            shadow: None,
            target: None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.target.is_some()
    }

    /// Whether the type tags of both connections are compatible
    pub fn accepts(&self, other: &Connection) -> bool {
        checks_intersect(self.check.as_deref(), other.check.as_deref())
    }
}

/// Two check lists are compatible when either is unrestricted or they share a tag
pub fn checks_intersect(a: Option<&[String]>, b: Option<&[String]>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.iter().any(|tag| b.contains(tag)),
        _ => true,
    }
}
