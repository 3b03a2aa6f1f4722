use core::fmt;
use std::fmt::{Display, Formatter};

use num_bigint::BigInt;
use rustc_hash::FxHashMap;

use crate::{
    nodes::{AstNode, Field, Location, NodeKind, Value},
    number::Decimal,
};

impl AstNode {
    pub(crate) fn new(id: u32, kind: NodeKind, location: Option<Location>, fields: Vec<Field>) -> Self {
        debug_assert_eq!(
            fields.len(),
            kind.fields().len(),
            "field count does not match the `{kind}` field table"
        );
        AstNode {
            id,
            kind,
            location,
            fields,
            annotations: FxHashMap::default(),
        }
    }

    /// Semantic fields paired with their names, in declared order.
    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &Field)> {
        self.kind
            .fields()
            .iter()
            .map(|spec| spec.name)
            .zip(self.fields.iter())
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.kind
            .field_index(name)
            .and_then(|index| self.fields.get(index))
    }

    /// The child stored in a single-node field.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<u32> {
        self.field(name).and_then(Field::as_node)
    }

    /// The children stored in a list field, empty for any other field.
    #[must_use]
    pub fn children_of(&self, name: &str) -> &[u32] {
        self.field(name).and_then(Field::as_list).unwrap_or_default()
    }

    #[must_use]
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.field(name).and_then(Field::as_value)
    }

    #[must_use]
    pub fn str_value(&self, name: &str) -> Option<&str> {
        match self.value(name) {
            Some(Value::Str(value)) => Some(value),
            _ => None,
        }
    }

    /// Every child id, list fields flattened, in declared field order.
    #[must_use]
    pub fn child_ids(&self) -> Vec<u32> {
        let mut children = Vec::new();
        for field in &self.fields {
            match field {
                Field::Node(id) => children.push(*id),
                Field::List(ids) => children.extend_from_slice(ids),
                Field::Value(_) | Field::Absent => {}
            }
        }
        children
    }

    /// Declaration sequence of a container node. Empty for non-containers.
    #[must_use]
    pub fn body(&self) -> &[u32] {
        if self.kind.is_container() {
            self.children_of("body")
        } else {
            &[]
        }
    }

    #[must_use]
    pub fn body_len(&self) -> usize {
        self.body().len()
    }

    #[must_use]
    pub fn body_get(&self, index: usize) -> Option<u32> {
        self.body().get(index).copied()
    }

    #[must_use]
    pub fn body_contains(&self, id: u32) -> bool {
        self.body().contains(&id)
    }

    #[must_use]
    pub fn is_terminus(&self) -> bool {
        self.kind.is_terminus()
    }

    #[must_use]
    pub fn annotation(&self, key: &str) -> Option<&serde_json::Value> {
        self.annotations.get(key)
    }

    /// Field index and, for list fields, position of `child` among this node's fields.
    pub(crate) fn locate_child(&self, child: u32) -> Option<(usize, Option<usize>)> {
        self.fields
            .iter()
            .enumerate()
            .find_map(|(index, field)| match field {
                Field::Node(id) if *id == child => Some((index, None)),
                Field::List(ids) => ids
                    .iter()
                    .position(|id| *id == child)
                    .map(|position| (index, Some(position))),
                _ => None,
            })
    }

    pub(crate) fn set_child_slot(&mut self, index: usize, position: Option<usize>, child: u32) {
        match (self.fields.get_mut(index), position) {
            (Some(Field::Node(slot)), None) => *slot = child,
            (Some(Field::List(ids)), Some(position)) => {
                if let Some(slot) = ids.get_mut(position) {
                    *slot = child;
                }
            }
            _ => {}
        }
    }
}

impl Field {
    #[must_use]
    pub fn as_node(&self) -> Option<u32> {
        match self {
            Field::Node(id) => Some(*id),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[u32]> {
        match self {
            Field::List(ids) => Some(ids),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Field::Value(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_absent(&self) -> bool {
        matches!(self, Field::Absent)
    }
}

impl Value {
    #[must_use]
    pub fn as_int(&self) -> Option<&BigInt> {
        match self {
            Value::Int(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(value) => Some(*value),
            _ => None,
        }
    }
}

impl From<BigInt> for Value {
    fn from(value: BigInt) -> Self {
        Value::Int(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(BigInt::from(value))
    }
}

impl From<Decimal> for Value {
    fn from(value: Decimal) -> Self {
        Value::Decimal(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<Value> for Field {
    fn from(value: Value) -> Self {
        Field::Value(value)
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(value) => write!(f, "{value}"),
            Value::Decimal(value) => write!(f, "{value}"),
            Value::Str(value) => write!(f, "{value:?}"),
            Value::Bytes(value) => write!(f, "0x{}", hex::encode(value)),
            Value::Bool(true) => f.write_str("True"),
            Value::Bool(false) => f.write_str("False"),
        }
    }
}
