//! Error types for workspace operations

use thiserror::Error;

use crate::error::DefinitionError;
use crate::layout::LayoutError;

use super::block::BlockId;
use super::checker::ConnectionCheck;
use super::connection::ConnectionRef;

/// Illegal operations and inconsistent state
#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("unknown block {0}")]
    UnknownBlock(BlockId),

    #[error("unknown connection {0}")]
    UnknownConnection(ConnectionRef),

    #[error("unknown block type '{0}'")]
    UnknownBlockType(String),

    #[error("block type '{block_type}' has no field '{field}'")]
    UnknownField { block_type: String, field: String },

    #[error("invalid value '{value}' for field '{field}'")]
    InvalidFieldValue { field: String, value: String },

    #[error("block type '{block_type}' has no input '{input}'")]
    UnknownInput { block_type: String, input: String },

    #[error("cannot connect {from} to {to}: {reason}")]
    Refused {
        from: ConnectionRef,
        to: ConnectionRef,
        reason: ConnectionCheck,
    },

    #[error("{0} is not connected")]
    NotConnected(ConnectionRef),

    /// The target relation was found one-sided
    #[error("{conn} points at {other}, which does not point back")]
    Asymmetric {
        conn: ConnectionRef,
        other: ConnectionRef,
    },

    #[error("orphan block {0} has no previous connection")]
    OrphanWithoutPrevious(BlockId),

    #[error("block {0} has neither an output nor a previous connection")]
    NoPlug(BlockId),

    #[error("block {0} is not a top-level block")]
    NotTopLevel(BlockId),

    #[error("{0} is still connected during disposal")]
    StillConnected(ConnectionRef),

    #[error("insertion marker {0} is still attached after cleanup")]
    MarkerStillAttached(ConnectionRef),

    #[error(transparent)]
    Definition(#[from] DefinitionError),

    #[error(transparent)]
    Layout(#[from] LayoutError),
}
