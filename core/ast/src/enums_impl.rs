//! Convenience methods for the taxonomy enums.

use core::fmt;
use std::fmt::{Display, Formatter};

use crate::nodes::{FieldType, NodeClass, NodeKind, Value};

impl NodeClass {
    /// The enclosing class, if any. `Num` is a `Constant`, which is an `Expression`.
    #[must_use]
    pub fn parent(self) -> Option<NodeClass> {
        match self {
            NodeClass::Constant => Some(NodeClass::Expression),
            NodeClass::Num => Some(NodeClass::Constant),
            NodeClass::BinaryOperator
            | NodeClass::BooleanOperator
            | NodeClass::ComparisonOperator
            | NodeClass::UnaryOperator => Some(NodeClass::Operator),
            NodeClass::TopLevel
            | NodeClass::Statement
            | NodeClass::Expression
            | NodeClass::Operator
            | NodeClass::Auxiliary => None,
        }
    }
}

impl NodeKind {
    /// Looks up a kind by the tag used in the generic parse tree.
    #[must_use]
    pub fn from_name(name: &str) -> Option<NodeKind> {
        NodeKind::ALL.iter().copied().find(|kind| kind.name() == name)
    }

    /// Returns `true` if this kind belongs to `class` or one of its sub-classes.
    #[must_use]
    pub fn is_a(self, class: NodeClass) -> bool {
        let mut current = Some(self.class());
        while let Some(c) = current {
            if c == class {
                return true;
            }
            current = c.parent();
        }
        false
    }

    #[must_use]
    pub fn field_index(self, name: &str) -> Option<usize> {
        self.fields().iter().position(|spec| spec.name == name)
    }

    /// Module and definitions own an ordered `body` sequence.
    #[must_use]
    pub fn is_container(self) -> bool {
        self.is_a(NodeClass::TopLevel)
    }

    /// Statements after which control never falls through.
    #[must_use]
    pub fn is_terminus(self) -> bool {
        matches!(
            self,
            NodeKind::Return | NodeKind::Raise | NodeKind::Break | NodeKind::Continue
        )
    }
}

impl Display for NodeKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FieldType {
    #[must_use]
    pub fn is_required(self) -> bool {
        !matches!(
            self,
            FieldType::OptionalNode(_) | FieldType::NodeList(_) | FieldType::OptionalStr
        )
    }

    /// Returns `true` if a child of `kind` may be stored in a field of this type.
    #[must_use]
    pub fn accepts(self, kind: NodeKind) -> bool {
        match self {
            FieldType::Node(accepts)
            | FieldType::OptionalNode(accepts)
            | FieldType::NodeList(accepts) => accepts(kind),
            _ => false,
        }
    }

    /// Returns `true` if `value` is a valid scalar payload for this field type.
    #[must_use]
    pub fn admits(self, value: &Value) -> bool {
        matches!(
            (self, value),
            (FieldType::Int, Value::Int(_))
                | (FieldType::Decimal, Value::Decimal(_))
                | (FieldType::Str | FieldType::OptionalStr, Value::Str(_))
                | (FieldType::Bytes, Value::Bytes(_))
                | (FieldType::Bool, Value::Bool(_))
        )
    }
}

impl Display for FieldType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::Node(_) => "node",
            FieldType::OptionalNode(_) => "optional node",
            FieldType::NodeList(_) => "node list",
            FieldType::Int => "integer",
            FieldType::Decimal => "decimal",
            FieldType::Str => "string",
            FieldType::OptionalStr => "optional string",
            FieldType::Bytes => "bytes",
            FieldType::Bool => "boolean",
        };
        f.write_str(name)
    }
}
