//! Interactive drag resolution
//!
//! A [`DragSession`] owns all per-gesture state: the connections travelling
//! with the dragged stack, the best candidate found so far and the preview
//! currently shown for it. Nothing about an in-progress drag lives on the
//! workspace except its `dragging` flag.

pub mod preview;
pub mod session;

pub use preview::{should_replace, Preview, PreviewState, ReplacementTarget};
pub use session::{Candidate, DragSession, DropOutcome};

use thiserror::Error;

use crate::workspace::{BlockId, WorkspaceError};

#[derive(Debug, Error)]
pub enum DragError {
    /// Shadows, insertion markers and immovable blocks stay put
    #[error("block {0} cannot be dragged")]
    NotDraggable(BlockId),

    #[error(transparent)]
    Workspace(#[from] WorkspaceError),
}
