//! Serialized block trees
//!
//! A [`BlockState`] is the blob used for shadow fillers, insertion marker
//! clones and workspace files:
//!
//! ```toml
//! [[blocks]]
//! type = "control_repeat"
//! x = 40.0
//! y = 40.0
//!
//! [blocks.inputs.TIMES.shadow]
//! type = "math_number"
//! fields = { NUM = "10" }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::definition::Mutation;
use crate::layout::Point;

use super::block::BlockId;
use super::connection::{Connection, ConnectionRef, Slot};
use super::error::WorkspaceError;
use super::Workspace;

#[derive(Error, Debug)]
pub enum StateError {
    #[error("Failed to read workspace file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse workspace TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to write workspace TOML: {0}")]
    Write(#[from] toml::ser::Error),
}

fn is_false(value: &bool) -> bool {
    !*value
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockState {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub shadow: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mutation: Option<Mutation>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub inputs: BTreeMap<String, InputState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<InputState>,
}

/// What sits in one socket: a shadow filler, a real block, or both
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InputState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shadow: Option<Box<BlockState>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block: Option<Box<BlockState>>,
}

impl InputState {
    pub fn is_empty(&self) -> bool {
        self.shadow.is_none() && self.block.is_none()
    }
}

impl BlockState {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            shadow: false,
            x: None,
            y: None,
            fields: BTreeMap::new(),
            mutation: None,
            inputs: BTreeMap::new(),
            next: None,
        }
    }

    pub fn as_shadow(mut self) -> Self {
        self.shadow = true;
        self
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn with_mutation(mut self, mutation: Mutation) -> Self {
        self.mutation = Some(mutation);
        self
    }

    pub fn with_input_block(mut self, input: impl Into<String>, block: BlockState) -> Self {
        self.inputs.entry(input.into()).or_default().block = Some(Box::new(block));
        self
    }

    pub fn with_input_shadow(mut self, input: impl Into<String>, shadow: BlockState) -> Self {
        self.inputs.entry(input.into()).or_default().shadow = Some(Box::new(shadow.as_shadow()));
        self
    }

    pub fn with_next(mut self, block: BlockState) -> Self {
        self.next.get_or_insert_with(InputState::default).block = Some(Box::new(block));
        self
    }

    pub fn from_toml(content: &str) -> Result<Self, StateError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml(&self) -> Result<String, StateError> {
        Ok(toml::to_string(self)?)
    }
}

/// Every top-level stack of a workspace
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WorkspaceState {
    #[serde(default)]
    pub blocks: Vec<BlockState>,
}

impl WorkspaceState {
    pub fn from_file(path: &Path) -> Result<Self, StateError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, StateError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml(&self) -> Result<String, StateError> {
        Ok(toml::to_string(self)?)
    }
}

impl Workspace {
    /// Serialize a block together with its children and the rest of its stack
    pub fn serialize_block(&self, id: BlockId) -> Result<BlockState, WorkspaceError> {
        let block = self.block(id).ok_or(WorkspaceError::UnknownBlock(id))?;
        let mut state = BlockState::new(&block.type_name);
        state.shadow = block.shadow;
        state.mutation = block.mutation.clone();
        if block.parent.is_none() {
            state.x = Some(block.position.x);
            state.y = Some(block.position.y);
        }

        for field in block.inputs.iter().flat_map(|input| input.fields.iter()) {
            if let (Some(name), Some(value)) = (field.name(), field.value()) {
                state.fields.insert(name.to_string(), value);
            }
        }
        for input in &block.inputs {
            let (Some(name), Some(connection)) = (&input.name, &input.connection) else {
                continue;
            };
            let slot = self.serialize_slot(connection)?;
            if !slot.is_empty() {
                state.inputs.insert(name.clone(), slot);
            }
        }
        if let Some(next) = &block.next {
            let slot = self.serialize_slot(next)?;
            if !slot.is_empty() {
                state.next = Some(slot);
            }
        }
        Ok(state)
    }

    fn serialize_slot(&self, connection: &Connection) -> Result<InputState, WorkspaceError> {
        let mut slot = InputState {
            shadow: connection.shadow.clone().map(Box::new),
            block: None,
        };
        if let Some(target) = connection.target {
            let child = self.serialize_block(target.block)?;
            if child.shadow {
                slot.shadow = Some(Box::new(child));
            } else {
                slot.block = Some(Box::new(child));
            }
        }
        Ok(slot)
    }

    /// Instantiate a serialized tree and lay it out
    pub fn deserialize_block(&mut self, state: &BlockState) -> Result<BlockId, WorkspaceError> {
        let id = self.instantiate_state(state, state.shadow)?;
        self.render_block(id)?;
        Ok(id)
    }

    pub(crate) fn instantiate_state(&mut self, state: &BlockState, shadow: bool) -> Result<BlockId, WorkspaceError> {
        let id = self.create_block(&state.type_name, state.mutation.as_ref(), shadow, false)?;
        if let (Some(x), Some(y)) = (state.x, state.y) {
            if let Some(block) = self.block_mut(id) {
                block.position = Point::new(x, y);
            }
        }
        for (name, value) in &state.fields {
            self.apply_field(id, name, value)?;
        }
        for (name, input) in &state.inputs {
            let index = self
                .block(id)
                .and_then(|b| b.input_index(name))
                .ok_or_else(|| WorkspaceError::UnknownInput {
                    block_type: state.type_name.clone(),
                    input: name.clone(),
                })?;
            self.restore_slot(ConnectionRef::new(id, Slot::Input(index)), input)?;
        }
        if let Some(next) = &state.next {
            self.restore_slot(ConnectionRef::new(id, Slot::Next), next)?;
        }
        Ok(id)
    }

    fn restore_slot(&mut self, parent: ConnectionRef, input: &InputState) -> Result<(), WorkspaceError> {
        let connection = self
            .connection_mut(parent)
            .ok_or(WorkspaceError::UnknownConnection(parent))?;
        connection.shadow = input.shadow.as_deref().cloned();

        let child = match (&input.block, &input.shadow) {
            (Some(block), _) => Some((block.as_ref(), false)),
            (None, Some(shadow)) => Some((shadow.as_ref(), true)),
            (None, None) => None,
        };
        if let Some((state, shadow)) = child {
            let child = self.instantiate_state(state, shadow || state.shadow)?;
            let plug = self
                .block(child)
                .and_then(|b| b.plug_slot())
                .ok_or(WorkspaceError::NoPlug(child))?;
            self.connect(parent, ConnectionRef::new(child, plug))?;
        }
        Ok(())
    }

    /// Serialize every top-level stack
    pub fn save(&self) -> Result<WorkspaceState, WorkspaceError> {
        let blocks = self
            .top_blocks()
            .into_iter()
            .map(|id| self.serialize_block(id))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(WorkspaceState { blocks })
    }

    /// Instantiate every stack of a saved workspace
    pub fn load(&mut self, state: &WorkspaceState) -> Result<Vec<BlockId>, WorkspaceError> {
        state
            .blocks
            .iter()
            .map(|block| self.deserialize_block(block))
            .collect()
    }
}
