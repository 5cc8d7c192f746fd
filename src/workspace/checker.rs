//! Connection compatibility rules
//!
//! [`can_connect`] is the pure legality check used before every connect.
//! [`Workspace::is_connection_allowed`] layers the drag-time rules on top
//! of it. Neither raises; both report a reason or a yes/no.

use std::collections::HashSet;
use std::fmt;

use super::block::Block;
use super::connection::{Connection, ConnectionRef, ConnectionRole, Slot};
use super::Workspace;

/// Outcome of a compatibility check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionCheck {
    CanConnect,
    TargetNull,
    SelfConnection,
    WrongRole,
    DifferentWorkspaces,
    ChecksFailed,
    ShadowParent,
    StructuralException,
}

impl ConnectionCheck {
    pub fn is_ok(self) -> bool {
        self == ConnectionCheck::CanConnect
    }
}

impl fmt::Display for ConnectionCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ConnectionCheck::CanConnect => "connections are compatible",
            ConnectionCheck::TargetNull => "target connection is missing",
            ConnectionCheck::SelfConnection => "a block cannot connect to itself",
            ConnectionCheck::WrongRole => "connection roles are not opposites",
            ConnectionCheck::DifferentWorkspaces => "blocks live in different workspaces",
            ConnectionCheck::ChecksFailed => "type checks do not intersect",
            ConnectionCheck::ShadowParent => "a shadow block cannot hold a non-shadow block",
            ConnectionCheck::StructuralException => "block pairing is not permitted",
        };
        f.write_str(text)
    }
}

/// A connection seen together with the block that owns it
#[derive(Debug, Clone, Copy)]
pub struct Endpoint<'a> {
    block: &'a Block,
    slot: Slot,
    connection: &'a Connection,
}

impl<'a> Endpoint<'a> {
    pub fn new(block: &'a Block, slot: Slot) -> Option<Self> {
        let connection = block.connection(slot)?;
        Some(Self {
            block,
            slot,
            connection,
        })
    }

    pub fn block(&self) -> &'a Block {
        self.block
    }

    pub fn slot(&self) -> Slot {
        self.slot
    }

    pub fn connection(&self) -> &'a Connection {
        self.connection
    }

    pub fn reference(&self) -> ConnectionRef {
        ConnectionRef::new(self.block.id, self.slot)
    }
}

/// A parent input reserved for exactly one child type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExclusivePairing {
    pub parent: &'static str,
    pub input: &'static str,
    pub child: &'static str,
}

/// The input may only hold the child type, and the child type may only
/// live in that input.
pub const EXCLUSIVE_PAIRINGS: &[ExclusivePairing] = &[ExclusivePairing {
    parent: "procedures_definition",
    input: "custom_block",
    child: "procedures_prototype",
}];

fn violates_pairing(parent: &Endpoint<'_>, child: &Endpoint<'_>) -> bool {
    let input_name = match parent.slot {
        Slot::Input(index) => parent.block.inputs.get(index).and_then(|i| i.name.as_deref()),
        _ => None,
    };
    EXCLUSIVE_PAIRINGS.iter().any(|pairing| {
        let in_reserved_input =
            parent.block.type_name == pairing.parent && input_name == Some(pairing.input);
        let is_reserved_child = child.block.type_name == pairing.child;
        in_reserved_input != is_reserved_child
    })
}

/// Whether two connections may legally be joined, checked in a fixed order
pub fn can_connect(a: Option<Endpoint<'_>>, b: Option<Endpoint<'_>>) -> ConnectionCheck {
    let (Some(a), Some(b)) = (a, b) else {
        return ConnectionCheck::TargetNull;
    };
    if a.block.id == b.block.id {
        return ConnectionCheck::SelfConnection;
    }
    if b.connection.role != a.connection.role.opposite() {
        return ConnectionCheck::WrongRole;
    }
    if a.block.id.workspace != b.block.id.workspace {
        return ConnectionCheck::DifferentWorkspaces;
    }
    if !a.connection.accepts(b.connection) {
        return ConnectionCheck::ChecksFailed;
    }
    let (parent, child) = if a.connection.role.is_superior() {
        (a, b)
    } else {
        (b, a)
    };
    if parent.block.shadow && !child.block.shadow {
        return ConnectionCheck::ShadowParent;
    }
    if violates_pairing(&parent, &child) {
        return ConnectionCheck::StructuralException;
    }
    ConnectionCheck::CanConnect
}

impl Workspace {
    pub(crate) fn endpoint(&self, conn: ConnectionRef) -> Option<Endpoint<'_>> {
        Endpoint::new(self.block(conn.block)?, conn.slot)
    }

    /// Legality of joining two connections of this workspace
    pub fn can_connect(&self, a: ConnectionRef, b: ConnectionRef) -> ConnectionCheck {
        can_connect(self.endpoint(a), self.endpoint(b))
    }

    fn occupant(&self, conn: &Connection) -> Option<&Block> {
        self.block(conn.target?.block)
    }

    fn connected_to_real_block(&self, conn: &Connection) -> bool {
        self.occupant(conn).is_some_and(|b| !b.insertion_marker)
    }

    /// Drag-time legality: `local` belongs to the dragged stack and
    /// `candidate` is a connection found nearby. `dragging` holds every
    /// connection travelling with the stack.
    pub fn is_connection_allowed(
        &self,
        local: ConnectionRef,
        candidate: ConnectionRef,
        dragging: &HashSet<ConnectionRef>,
    ) -> bool {
        let (Some(mine), Some(theirs)) = (self.endpoint(local), self.endpoint(candidate)) else {
            return false;
        };
        if theirs.block.insertion_marker {
            return false;
        }
        if !can_connect(Some(mine), Some(theirs)).is_ok() {
            return false;
        }
        if dragging.contains(&candidate) {
            return false;
        }

        let first_statement = mine.block.first_statement_slot();
        match theirs.connection.role {
            ConnectionRole::Previous => {
                return self.can_connect_to_previous(&mine, &theirs, dragging);
            }
            ConnectionRole::Output => {
                // A plugged reporter is never offered another socket
                if theirs.connection.is_connected() || mine.connection.is_connected() {
                    return false;
                }
            }
            ConnectionRole::Input => {
                // Splicing into an immovable occupant is not offered
                if let Some(occupant) = self.occupant(theirs.connection) {
                    if !occupant.movable && !occupant.shadow {
                        return false;
                    }
                }
            }
            ConnectionRole::Next => {
                // A C-block only joins mid-stack when it already wraps something
                if let Some(first) = first_statement {
                    let inner_empty = mine
                        .block
                        .connection(first)
                        .is_some_and(|c| !c.is_connected());
                    if mine.slot == Slot::Previous
                        && self.connected_to_real_block(theirs.connection)
                        && inner_empty
                    {
                        return false;
                    }
                }
                // A terminal block never bumps a continuable stack out of place
                if mine.block.next.is_none() {
                    if let Some(occupant) = self.occupant(theirs.connection) {
                        if !occupant.shadow && !occupant.insertion_marker && occupant.next.is_some()
                        {
                            return false;
                        }
                    }
                }
            }
        }
        true
    }

    fn can_connect_to_previous(
        &self,
        mine: &Endpoint<'_>,
        theirs: &Endpoint<'_>,
        dragging: &HashSet<ConnectionRef>,
    ) -> bool {
        if mine.connection.is_connected() || dragging.contains(&theirs.reference()) {
            return false;
        }
        let first_statement = mine.block.first_statement_slot();
        let is_first_statement = first_statement == Some(mine.slot);

        if mine.slot == Slot::Next || (is_first_statement && mine.block.previous.is_none()) {
            // Only the top of a stack can be attached beneath us
            return match self.occupant(theirs.connection) {
                None => true,
                Some(above) if above.insertion_marker => !above
                    .previous
                    .as_ref()
                    .is_some_and(Connection::is_connected),
                Some(_) => false,
            };
        }
        // A C-block may wrap a block anywhere in a stack
        is_first_statement
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorConfig;
    use crate::definition::BlockRegistry;
    use std::rc::Rc;

    const DEFS: &str = r#"
[[blocks]]
type = "stack"
message = "step %1"
args = [{ kind = "input_value", name = "N", check = ["Number"] }]
previous = true
next = true

[[blocks]]
type = "number"
message = "%1"
args = [{ kind = "field_number", name = "NUM", value = 0 }]
output = ["Number"]

[[blocks]]
type = "flag"
message = "ready?"
output = ["Boolean"]

[[blocks]]
type = "procedures_definition"
message = "define %1"
args = [{ kind = "input_value", name = "custom_block" }]
next = true

[[blocks]]
type = "procedures_prototype"
message = "proc"
output = true
"#;

    fn workspace() -> Workspace {
        let registry = BlockRegistry::from_str(DEFS).unwrap();
        Workspace::new(Rc::new(registry), EditorConfig::default())
    }

    #[test]
    fn test_reason_codes_in_order() {
        let mut ws = workspace();
        let a = ws.new_block("stack").unwrap();
        let b = ws.new_block("stack").unwrap();
        let flag = ws.new_block("flag").unwrap();

        let a_next = ConnectionRef::new(a, Slot::Next);
        assert_eq!(
            can_connect(ws.endpoint(a_next), None),
            ConnectionCheck::TargetNull
        );
        assert_eq!(
            ws.can_connect(a_next, ConnectionRef::new(a, Slot::Previous)),
            ConnectionCheck::SelfConnection
        );
        assert_eq!(
            ws.can_connect(a_next, ConnectionRef::new(b, Slot::Next)),
            ConnectionCheck::WrongRole
        );
        assert_eq!(
            ws.can_connect(ConnectionRef::new(a, Slot::Input(0)), ConnectionRef::new(flag, Slot::Output)),
            ConnectionCheck::ChecksFailed
        );
        assert_eq!(
            ws.can_connect(a_next, ConnectionRef::new(b, Slot::Previous)),
            ConnectionCheck::CanConnect
        );
    }

    #[test]
    fn test_different_workspaces() {
        let mut first = workspace();
        let mut second = workspace();
        let a = first.new_block("stack").unwrap();
        let b = second.new_block("stack").unwrap();
        let check = can_connect(
            first.endpoint(ConnectionRef::new(a, Slot::Next)),
            second.endpoint(ConnectionRef::new(b, Slot::Previous)),
        );
        assert_eq!(check, ConnectionCheck::DifferentWorkspaces);
    }

    #[test]
    fn test_shadow_cannot_parent_real_block() {
        let mut ws = workspace();
        let shadow = ws.create_block("stack", None, true, false).unwrap();
        let number = ws.new_block("number").unwrap();
        assert_eq!(
            ws.can_connect(
                ConnectionRef::new(shadow, Slot::Input(0)),
                ConnectionRef::new(number, Slot::Output)
            ),
            ConnectionCheck::ShadowParent
        );
    }

    #[test]
    fn test_reserved_procedure_input() {
        let mut ws = workspace();
        let definition = ws.new_block("procedures_definition").unwrap();
        let prototype = ws.new_block("procedures_prototype").unwrap();
        let number = ws.new_block("number").unwrap();
        let stack = ws.new_block("stack").unwrap();

        let custom = ConnectionRef::new(definition, Slot::Input(0));
        assert!(ws
            .can_connect(custom, ConnectionRef::new(prototype, Slot::Output))
            .is_ok());
        assert_eq!(
            ws.can_connect(custom, ConnectionRef::new(number, Slot::Output)),
            ConnectionCheck::StructuralException
        );
        assert_eq!(
            ws.can_connect(
                ConnectionRef::new(stack, Slot::Input(0)),
                ConnectionRef::new(prototype, Slot::Output)
            ),
            ConnectionCheck::StructuralException
        );
    }

    #[test]
    fn test_dragging_connections_are_excluded() {
        let mut ws = workspace();
        let a = ws.new_block("stack").unwrap();
        let b = ws.new_block("stack").unwrap();
        let local = ConnectionRef::new(a, Slot::Next);
        let candidate = ConnectionRef::new(b, Slot::Previous);
        assert!(ws.is_connection_allowed(local, candidate, &HashSet::new()));
        let dragging: HashSet<_> = [candidate].into_iter().collect();
        assert!(!ws.is_connection_allowed(local, candidate, &dragging));
    }

    #[test]
    fn test_plugged_reporter_not_offered() {
        let mut ws = workspace();
        let a = ws.new_block("stack").unwrap();
        let b = ws.new_block("stack").unwrap();
        let number = ws.new_block("number").unwrap();
        let socket_a = ConnectionRef::new(a, Slot::Input(0));
        let plug = ConnectionRef::new(number, Slot::Output);
        ws.connect(socket_a, plug).unwrap();
        assert!(!ws.is_connection_allowed(
            ConnectionRef::new(b, Slot::Input(0)),
            plug,
            &HashSet::new()
        ));
    }
}
