//! Block instances living in a workspace

use std::fmt;

use crate::definition::Mutation;
use crate::layout::{BlockMetrics, BoundingBox, Point, Shape};
use crate::renderer::path::ResolvedPath;

use super::connection::{Connection, ConnectionRole, Slot};

/// Identifier of a workspace, unique within the process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorkspaceId(pub u32);

/// Identifier of a block; serials are never reused within a workspace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId {
    pub workspace: WorkspaceId,
    pub serial: u64,
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.workspace.0, self.serial)
    }
}

/// Kind of a block input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// Holds a reporter through an input-role connection
    Value,
    /// Holds a nested stack through a next-role connection
    Statement,
    /// Only carries fields
    Dummy,
}

/// A field drawn inside a row
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    Label {
        text: String,
    },
    Text {
        name: String,
        value: String,
    },
    Number {
        name: String,
        value: f64,
    },
    Dropdown {
        name: String,
        /// (display text, value) pairs
        options: Vec<(String, String)>,
        value: String,
    },
    Image {
        src: String,
        width: f64,
        height: f64,
    },
    Variable {
        name: String,
        variable: String,
    },
}

impl Field {
    /// Name under which the field's value is serialized
    pub fn name(&self) -> Option<&str> {
        match self {
            Field::Text { name, .. }
            | Field::Number { name, .. }
            | Field::Dropdown { name, .. }
            | Field::Variable { name, .. } => Some(name),
            Field::Label { .. } | Field::Image { .. } => None,
        }
    }

    /// Whether the user can change the value in place
    pub fn is_editable(&self) -> bool {
        self.name().is_some()
    }

    /// Serialized value of a named field
    pub fn value(&self) -> Option<String> {
        match self {
            Field::Text { value, .. } | Field::Dropdown { value, .. } => Some(value.clone()),
            Field::Number { value, .. } => Some(format_number(*value)),
            Field::Variable { variable, .. } => Some(variable.clone()),
            Field::Label { .. } | Field::Image { .. } => None,
        }
    }

    /// Text drawn for the field
    pub fn display_text(&self) -> String {
        match self {
            Field::Label { text } => text.clone(),
            Field::Dropdown { options, value, .. } => options
                .iter()
                .find(|(_, v)| v == value)
                .map(|(text, _)| text.clone())
                .unwrap_or_else(|| value.clone()),
            Field::Image { .. } => String::new(),
            other => other.value().unwrap_or_default(),
        }
    }

    /// Apply a serialized value; returns false when the value is rejected
    pub fn set_value(&mut self, new_value: &str) -> bool {
        match self {
            Field::Text { value, .. } => {
                *value = new_value.to_string();
                true
            }
            Field::Number { value, .. } => match new_value.trim().parse::<f64>() {
                Ok(parsed) if parsed.is_finite() => {
                    *value = parsed;
                    true
                }
                _ => false,
            },
            Field::Dropdown { options, value, .. } => {
                if options.iter().any(|(_, v)| v == new_value) {
                    *value = new_value.to_string();
                    true
                } else {
                    false
                }
            }
            Field::Variable { variable, .. } => {
                *variable = new_value.to_string();
                true
            }
            Field::Label { .. } | Field::Image { .. } => false,
        }
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// One input of a block: a row of fields plus at most one connection
#[derive(Debug, Clone, PartialEq)]
pub struct Input {
    pub name: Option<String>,
    pub kind: InputKind,
    pub fields: Vec<Field>,
    pub connection: Option<Connection>,
}

impl Input {
    /// Placeholder shape drawn while a value socket is empty
    pub fn socket_shape(&self) -> Shape {
        let boolean = self
            .connection
            .as_ref()
            .and_then(|c| c.check.as_ref())
            .is_some_and(|check| check.iter().any(|t| t == "Boolean"));
        if boolean {
            Shape::Hexagonal
        } else {
            Shape::Round
        }
    }
}

/// Visual replacement marking set by the drag preview
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Highlight {
    #[default]
    None,
    /// The whole block would be displaced
    Block,
    /// The empty socket of this input would be filled
    EmptyInput(usize),
}

/// A block instance
#[derive(Debug, Clone)]
pub struct Block {
    pub id: BlockId,
    pub type_name: String,
    pub category: Option<String>,
    pub shadow: bool,
    pub insertion_marker: bool,
    pub movable: bool,
    /// Absolute top-left corner
    pub position: Point,
    pub parent: Option<BlockId>,
    pub output_shape: Shape,
    pub output: Option<Connection>,
    pub previous: Option<Connection>,
    pub next: Option<Connection>,
    pub inputs: Vec<Input>,
    pub mutation: Option<Mutation>,
    pub highlight: Highlight,
    /// Last measurement, cached between render passes
    pub metrics: Option<BlockMetrics>,
    pub outline: Option<ResolvedPath>,
}

impl Block {
    pub fn connection(&self, slot: Slot) -> Option<&Connection> {
        match slot {
            Slot::Output => self.output.as_ref(),
            Slot::Previous => self.previous.as_ref(),
            Slot::Next => self.next.as_ref(),
            Slot::Input(index) => self.inputs.get(index)?.connection.as_ref(),
        }
    }

    pub fn connection_mut(&mut self, slot: Slot) -> Option<&mut Connection> {
        match slot {
            Slot::Output => self.output.as_mut(),
            Slot::Previous => self.previous.as_mut(),
            Slot::Next => self.next.as_mut(),
            Slot::Input(index) => self.inputs.get_mut(index)?.connection.as_mut(),
        }
    }

    /// Every slot that carries a connection: output, previous, next, then inputs
    pub fn slots(&self) -> Vec<Slot> {
        let mut slots = Vec::new();
        if self.output.is_some() {
            slots.push(Slot::Output);
        }
        if self.previous.is_some() {
            slots.push(Slot::Previous);
        }
        if self.next.is_some() {
            slots.push(Slot::Next);
        }
        for (index, input) in self.inputs.iter().enumerate() {
            if input.connection.is_some() {
                slots.push(Slot::Input(index));
            }
        }
        slots
    }

    /// The connection through which this block plugs into a parent
    pub fn plug_slot(&self) -> Option<Slot> {
        if self.output.is_some() {
            Some(Slot::Output)
        } else if self.previous.is_some() {
            Some(Slot::Previous)
        } else {
            None
        }
    }

    /// Slot of the first statement input, the inside of a C-shaped block
    pub fn first_statement_slot(&self) -> Option<Slot> {
        self.inputs
            .iter()
            .position(|input| input.kind == InputKind::Statement)
            .map(Slot::Input)
    }

    pub fn input_index(&self, name: &str) -> Option<usize> {
        self.inputs
            .iter()
            .position(|input| input.name.as_deref() == Some(name))
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.inputs
            .iter()
            .flat_map(|input| input.fields.iter())
            .find(|field| field.name() == Some(name))
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut Field> {
        self.inputs
            .iter_mut()
            .flat_map(|input| input.fields.iter_mut())
            .find(|field| field.name() == Some(name))
    }

    /// Role of the connection in a slot
    pub fn role(&self, slot: Slot) -> Option<ConnectionRole> {
        self.connection(slot).map(|c| c.role)
    }

    /// Area covered by the block after its last layout
    pub fn bounds(&self) -> BoundingBox {
        let (width, height) = self
            .metrics
            .as_ref()
            .map_or((0.0, 0.0), |m| (m.width, m.height));
        BoundingBox::new(self.position.x, self.position.y, width, height)
    }
}
