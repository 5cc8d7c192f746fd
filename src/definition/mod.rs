//! Declarative block definitions
//!
//! A definition describes a block type's message (`repeat %1 %2`), its
//! arguments and which of the previous/next/output connections it carries.
//! Messages are tokenised with logos and parsed with chumsky.

pub mod grammar;
pub mod lexer;
pub mod message;
pub mod registry;

pub use grammar::parse_message;
pub use message::{Message, MessagePart, Spanned};
pub use registry::{
    ArgDefinition, BlockDefinition, BlockRegistry, BlockTemplate, CheckSpec, Mutation,
};
