//! Block definitions and the registry that holds them
//!
//! Definitions are declared in TOML:
//!
//! ```toml
//! [[blocks]]
//! type = "control_repeat"
//! category = "control"
//! message = "repeat %1 %2"
//! args = [
//!   { kind = "input_value", name = "TIMES", check = ["Number"] },
//!   { kind = "input_statement", name = "SUBSTACK" },
//! ]
//! previous = true
//! next = true
//! ```

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::DefinitionError;
use crate::layout::Shape;
use crate::workspace::{Connection, ConnectionRole, Field, Input, InputKind};

use super::message::{Message, MessagePart};

/// One `%N` argument of a message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ArgDefinition {
    InputValue {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        check: Option<Vec<String>>,
    },
    InputStatement {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        check: Option<Vec<String>>,
    },
    InputDummy {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    FieldLabel {
        text: String,
    },
    FieldText {
        name: String,
        #[serde(default)]
        value: String,
    },
    FieldNumber {
        name: String,
        #[serde(default)]
        value: f64,
    },
    FieldDropdown {
        name: String,
        options: Vec<(String, String)>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<String>,
    },
    FieldImage {
        src: String,
        width: f64,
        height: f64,
    },
    FieldVariable {
        name: String,
        #[serde(default)]
        variable: String,
    },
}

impl ArgDefinition {
    /// The field this argument declares, or None for inputs
    fn to_field(&self) -> Option<Field> {
        let field = match self {
            ArgDefinition::FieldLabel { text } => Field::Label { text: text.clone() },
            ArgDefinition::FieldText { name, value } => Field::Text {
                name: name.clone(),
                value: value.clone(),
            },
            ArgDefinition::FieldNumber { name, value } => Field::Number {
                name: name.clone(),
                value: *value,
            },
            ArgDefinition::FieldDropdown {
                name,
                options,
                value,
            } => Field::Dropdown {
                name: name.clone(),
                options: options.clone(),
                value: value
                    .clone()
                    .or_else(|| options.first().map(|(_, v)| v.clone()))
                    .unwrap_or_default(),
            },
            ArgDefinition::FieldImage { src, width, height } => Field::Image {
                src: src.clone(),
                width: *width,
                height: *height,
            },
            ArgDefinition::FieldVariable { name, variable } => Field::Variable {
                name: name.clone(),
                variable: variable.clone(),
            },
            ArgDefinition::InputValue { .. }
            | ArgDefinition::InputStatement { .. }
            | ArgDefinition::InputDummy { .. } => return None,
        };
        Some(field)
    }
}

/// Whether a block has a previous/next/output connection, and what it accepts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CheckSpec {
    Enabled(bool),
    Types(Vec<String>),
}

impl CheckSpec {
    /// `None` when the connection is absent, otherwise its check list
    pub fn connection(&self, role: ConnectionRole) -> Option<Connection> {
        match self {
            CheckSpec::Enabled(false) => None,
            CheckSpec::Enabled(true) => Some(Connection::new(role, None)),
            CheckSpec::Types(types) => Some(Connection::new(role, Some(types.clone()))),
        }
    }

    fn is_enabled(&self) -> bool {
        !matches!(self, CheckSpec::Enabled(false))
    }
}

/// Replacement shape carried by a block instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mutation {
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<ArgDefinition>,
}

/// A declared block type
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BlockDefinition {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub category: Option<String>,
    pub message: String,
    #[serde(default)]
    pub args: Vec<ArgDefinition>,
    #[serde(default)]
    pub output: Option<CheckSpec>,
    #[serde(default)]
    pub output_shape: Option<Shape>,
    #[serde(default)]
    pub previous: Option<CheckSpec>,
    #[serde(default)]
    pub next: Option<CheckSpec>,
    #[serde(default = "default_movable")]
    pub movable: bool,
}

fn default_movable() -> bool {
    true
}

/// Everything needed to construct a block instance
#[derive(Debug, Clone)]
pub struct BlockTemplate {
    pub inputs: Vec<Input>,
    pub output: Option<Connection>,
    pub previous: Option<Connection>,
    pub next: Option<Connection>,
    pub output_shape: Shape,
}

impl BlockDefinition {
    /// Check the message and the connection combination
    pub fn validate(&self) -> Result<(), DefinitionError> {
        let has = |spec: &Option<CheckSpec>| spec.as_ref().is_some_and(CheckSpec::is_enabled);
        if has(&self.output) && has(&self.previous) {
            return Err(DefinitionError::OutputAndPrevious(self.type_name.clone()));
        }
        let message = compile_message(&self.type_name, &self.message, &self.args)?;
        interpolate(&self.type_name, &message, &self.args)?;
        Ok(())
    }

    /// Build the inputs and connections of a new instance. A mutation
    /// replaces the definition's message and arguments.
    pub fn instantiate(&self, mutation: Option<&Mutation>) -> Result<BlockTemplate, DefinitionError> {
        let (source, args) = match mutation {
            Some(m) => (m.message.as_str(), m.args.as_slice()),
            None => (self.message.as_str(), self.args.as_slice()),
        };
        let message = compile_message(&self.type_name, source, args)?;
        let inputs = interpolate(&self.type_name, &message, args)?;

        let output = self
            .output
            .as_ref()
            .and_then(|spec| spec.connection(ConnectionRole::Output));
        let output_shape = self.output_shape.unwrap_or_else(|| {
            let boolean = output
                .as_ref()
                .and_then(|c| c.check.as_ref())
                .is_some_and(|check| check.iter().any(|t| t == "Boolean"));
            if boolean {
                Shape::Hexagonal
            } else {
                Shape::Round
            }
        });

        Ok(BlockTemplate {
            inputs,
            output,
            previous: self
                .previous
                .as_ref()
                .and_then(|spec| spec.connection(ConnectionRole::Previous)),
            next: self
                .next
                .as_ref()
                .and_then(|spec| spec.connection(ConnectionRole::Next)),
            output_shape,
        })
    }
}

fn compile_message(
    block: &str,
    source: &str,
    args: &[ArgDefinition],
) -> Result<Message, DefinitionError> {
    let invalid = |errors| DefinitionError::InvalidMessage {
        block: block.to_string(),
        message: source.to_string(),
        errors,
    };
    let message = Message::parse(source).map_err(invalid)?;
    message.validate(args.len()).map_err(invalid)?;
    Ok(message)
}

/// Turn message parts into inputs. Text and fields accumulate until an
/// input argument closes the row; leftovers form a trailing dummy input.
fn interpolate(
    block: &str,
    message: &Message,
    args: &[ArgDefinition],
) -> Result<Vec<Input>, DefinitionError> {
    let mut inputs = Vec::new();
    let mut fields = Vec::new();
    let mut names = HashSet::new();

    for part in &message.parts {
        let arg = match &part.node {
            MessagePart::Text(text) => {
                fields.push(Field::Label { text: text.clone() });
                continue;
            }
            MessagePart::Arg(index) => match index.checked_sub(1).and_then(|i| args.get(i)) {
                Some(arg) => arg,
                None => continue,
            },
        };

        let (name, kind, connection) = match arg {
            ArgDefinition::InputValue { name, check } => (
                Some(name.clone()),
                InputKind::Value,
                Some(Connection::new(ConnectionRole::Input, check.clone())),
            ),
            ArgDefinition::InputStatement { name, check } => (
                Some(name.clone()),
                InputKind::Statement,
                Some(Connection::new(ConnectionRole::Next, check.clone())),
            ),
            ArgDefinition::InputDummy { name } => (name.clone(), InputKind::Dummy, None),
            field => {
                if let Some(field) = field.to_field() {
                    fields.push(field);
                }
                continue;
            }
        };

        if let Some(name) = &name {
            if !names.insert(name.clone()) {
                return Err(DefinitionError::DuplicateInput {
                    block: block.to_string(),
                    input: name.clone(),
                });
            }
        }
        inputs.push(Input {
            name,
            kind,
            fields: std::mem::take(&mut fields),
            connection,
        });
    }

    if !fields.is_empty() {
        inputs.push(Input {
            name: None,
            kind: InputKind::Dummy,
            fields,
            connection: None,
        });
    }

    Ok(inputs)
}

/// TOML structure for deserializing definition files
#[derive(Deserialize)]
struct DefinitionFile {
    #[serde(default)]
    blocks: Vec<BlockDefinition>,
}

/// All known block types
#[derive(Debug, Clone, Default)]
pub struct BlockRegistry {
    definitions: BTreeMap<String, BlockDefinition>,
}

impl BlockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load definitions from a TOML file, failing on the first invalid block
    pub fn from_file(path: &Path) -> Result<Self, DefinitionError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load definitions from a TOML string, failing on the first invalid block
    pub fn from_str(content: &str) -> Result<Self, DefinitionError> {
        let (registry, mut rejected) = Self::load(content)?;
        if rejected.is_empty() {
            Ok(registry)
        } else {
            Err(rejected.remove(0))
        }
    }

    /// Load every valid definition, returning the rejected ones alongside
    pub fn load(content: &str) -> Result<(Self, Vec<DefinitionError>), DefinitionError> {
        let parsed: DefinitionFile = toml::from_str(content)?;
        let mut registry = Self::new();
        let mut rejected = Vec::new();
        for definition in parsed.blocks {
            if let Err(err) = registry.register(definition) {
                rejected.push(err);
            }
        }
        Ok((registry, rejected))
    }

    /// Validate and add a definition
    pub fn register(&mut self, definition: BlockDefinition) -> Result<(), DefinitionError> {
        if self.definitions.contains_key(&definition.type_name) {
            return Err(DefinitionError::Duplicate(definition.type_name));
        }
        definition.validate()?;
        tracing::trace!(block = %definition.type_name, "registered block definition");
        self.definitions
            .insert(definition.type_name.clone(), definition);
        Ok(())
    }

    pub fn get(&self, type_name: &str) -> Option<&BlockDefinition> {
        self.definitions.get(type_name)
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.definitions.contains_key(type_name)
    }

    /// Registered type names in sorted order
    pub fn types(&self) -> impl Iterator<Item = &str> {
        self.definitions.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}
