//! Error types for the layout engine

use thiserror::Error;

use crate::workspace::BlockId;

/// Errors that can occur during a render pass
#[derive(Debug, Error)]
pub enum LayoutError {
    /// A block referenced during the pass no longer exists
    #[error("unknown block {0}")]
    UnknownBlock(BlockId),

    /// The block's structure cannot be expressed by the active strategy
    #[error("invalid layout for block '{block}': {reason}")]
    InvalidLayout { block: String, reason: String },
}

impl LayoutError {
    /// Create an invalid layout error
    pub fn invalid_layout(block: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidLayout {
            block: block.into(),
            reason: reason.into(),
        }
    }
}
