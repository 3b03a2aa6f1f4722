//! Converts the generic parse tree into typed nodes stored in an [`Arena`].
//!
//! The builder dispatches on the [`SyntaxNode`] tag, looks the tag up in the node
//! taxonomy and validates every raw field against the kind's field table:
//!
//! - unknown tags fail with [`AstError::UnsupportedSyntax`]
//! - required fields that are missing or `null` fail with [`AstError::MissingField`]
//! - unknown fields, values of the wrong shape and children of a kind the slot does
//!   not accept fail with [`AstError::InvalidField`]
//!
//! # Example
//!
//! ```
//! use snek_ast::builder::Builder;
//! use snek_ast::nodes::{Location, NodeKind};
//! use snek_ast::syntax_tree::SyntaxNode;
//!
//! let span = Location::new(0, 4, 1, 0, 1, 4);
//! let module = SyntaxNode::new("Module")
//!     .with_location(span)
//!     .with_field("body", vec![SyntaxNode::new("Pass").with_location(span)]);
//!
//! let arena = Builder::new().build_ast(&module).unwrap();
//! let root = arena.root_node().unwrap();
//! assert_eq!(root.kind, NodeKind::Module);
//! assert_eq!(root.body_len(), 1);
//! ```
//!
//! # Node IDs
//!
//! IDs are allocated per arena in pre-order, starting from 1. Zero is never a valid id.
//!
//! # Spans
//!
//! Nodes read from parsed input must carry a span. Operator tags (`Add`, `Eq`, ...)
//! are the exception and inherit the span of the node that owns them. Nodes built
//! with [`Arena::build_detached`] are synthesized and may have no span at all, as
//! may parsed nodes whose `lineno` is explicitly `null` (the form
//! [`Arena::to_dict`] writes for synthesized nodes).

use std::str::FromStr;

use num_bigint::BigInt;
use rustc_hash::FxHashSet;

use crate::{
    arena::Arena,
    errors::AstError,
    nodes::{AstNode, Field, FieldSpec, FieldType, Location, NodeClass, NodeKind, Value},
    number::Decimal,
    syntax_tree::{SyntaxNode, SyntaxValue},
};

pub struct Builder {
    arena: Arena,
}

impl Default for Builder {
    fn default() -> Self {
        Builder::new()
    }
}

impl Builder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            arena: Arena::default(),
        }
    }

    /// Builds the tree rooted at `root` and returns the arena that owns it.
    ///
    /// # Errors
    ///
    /// Returns the first [`AstError`] met while walking the input.
    pub fn build_ast(mut self, root: &SyntaxNode) -> Result<Arena, AstError> {
        let id = NodeFactory::parsed(&mut self.arena).build(root, None)?;
        self.arena.root = Some(id);
        tracing::debug!(root = id, nodes = self.arena.len(), "Built AST");
        Ok(self.arena)
    }
}

/// Shorthand for `Builder::new().build_ast(root)`.
///
/// # Errors
///
/// See [`Builder::build_ast`].
pub fn build_ast(root: &SyntaxNode) -> Result<Arena, AstError> {
    Builder::new().build_ast(root)
}

impl Arena {
    /// Builds a synthesized, detached subtree inside this arena. Spans are optional.
    ///
    /// # Errors
    ///
    /// Same as [`Builder::build_ast`]. Nothing is left behind on failure.
    pub fn build_detached(&mut self, node: &SyntaxNode) -> Result<u32, AstError> {
        let mark = self.mark();
        let result = NodeFactory::synthesized(self).build(node, None);
        if result.is_err() {
            self.rollback(mark);
        }
        result
    }

    /// Creates a detached node of `kind` from `source` ("retyping").
    ///
    /// The span and every same-named field whose value fits the target kind are
    /// copied, child subtrees as deep copies. `overrides` then set fields
    /// explicitly; node ids given there must be detached and are adopted by the new
    /// node. Fields of `source` the target does not declare are dropped.
    ///
    /// # Errors
    ///
    /// - [`AstError::NotFound`] if `source` does not exist
    /// - [`AstError::MissingField`] if a required target field gets no value
    /// - [`AstError::InvalidField`] for unknown or ill-typed overrides
    /// - [`AstError::AlreadyAttached`] if an override references an attached node or
    ///   names the same node twice
    pub fn from_node(
        &mut self,
        source: u32,
        kind: NodeKind,
        overrides: Vec<(&str, Field)>,
    ) -> Result<u32, AstError> {
        let source_node = self.get_node(source)?.clone();
        for (name, _) in &overrides {
            if kind.field_index(name).is_none() {
                return Err(AstError::InvalidField {
                    kind,
                    field: (*name).to_string(),
                    reason: "no such field".to_string(),
                    location: source_node.location,
                });
            }
        }
        let mut adopted = FxHashSet::default();
        for (_, field) in &overrides {
            let ids = match field {
                Field::Node(id) => std::slice::from_ref(id),
                Field::List(ids) => ids.as_slice(),
                Field::Value(_) | Field::Absent => &[],
            };
            if let Some(id) = ids.iter().find(|id| !adopted.insert(**id)) {
                return Err(AstError::AlreadyAttached { id: *id });
            }
        }
        let mut overrides = overrides;
        let mark = self.mark();
        let id = self.alloc_id();
        let mut fields = Vec::with_capacity(kind.fields().len());
        for spec in kind.fields() {
            let field = match overrides.iter().position(|(name, _)| *name == spec.name) {
                Some(index) => {
                    let (_, field) = overrides.swap_remove(index);
                    self.check_field(kind, spec, &field, source_node.location)
                        .and_then(|()| self.check_detached(&field))
                        .map(|()| field)
                }
                None => self.copy_compatible_field(&source_node, kind, spec),
            };
            match field {
                Ok(field) => fields.push(field),
                Err(err) => {
                    self.rollback(mark);
                    return Err(err);
                }
            }
        }
        let node = AstNode::new(id, kind, source_node.location, fields);
        Ok(self.insert(node))
    }

    /// Structural copy of the subtree under `id` with fresh ids. The copy is detached,
    /// keeps the spans and starts with no annotations.
    ///
    /// # Errors
    ///
    /// Returns [`AstError::NotFound`] if `id` does not exist.
    pub fn deep_copy(&mut self, id: u32) -> Result<u32, AstError> {
        let source = self.get_node(id)?.clone();
        let copy = self.alloc_id();
        let mut fields = Vec::with_capacity(source.fields.len());
        for field in &source.fields {
            fields.push(match field {
                Field::Node(child) => Field::Node(self.deep_copy(*child)?),
                Field::List(children) => Field::List(
                    children
                        .iter()
                        .map(|child| self.deep_copy(*child))
                        .collect::<Result<_, _>>()?,
                ),
                Field::Value(_) | Field::Absent => field.clone(),
            });
        }
        let node = AstNode::new(copy, source.kind, source.location, fields);
        Ok(self.insert(node))
    }

    /// Validates a stored field against its spec: scalar type, presence of required
    /// values and the accepted child kinds of node slots.
    pub(crate) fn check_field(
        &self,
        kind: NodeKind,
        spec: &FieldSpec,
        field: &Field,
        location: Option<Location>,
    ) -> Result<(), AstError> {
        let invalid = |reason: String| AstError::InvalidField {
            kind,
            field: spec.name.to_string(),
            reason,
            location,
        };
        match (spec.ty, field) {
            (_, Field::Absent) if spec.ty.is_required() => Err(AstError::MissingField {
                kind,
                field: spec.name,
                location,
            }),
            (FieldType::OptionalNode(_) | FieldType::OptionalStr, Field::Absent) => Ok(()),
            (FieldType::Node(_) | FieldType::OptionalNode(_), Field::Node(child)) => {
                self.check_child(spec.ty, *child).map_err(invalid)
            }
            (FieldType::NodeList(_), Field::List(children)) => children
                .iter()
                .try_for_each(|child| self.check_child(spec.ty, *child))
                .map_err(invalid),
            (ty, Field::Value(value)) if ty.admits(value) => Ok(()),
            (ty, _) => Err(invalid(format!("expected {ty}"))),
        }
    }

    fn check_child(&self, ty: FieldType, child: u32) -> Result<(), String> {
        let node = self
            .find_node(child)
            .ok_or_else(|| format!("node {child} does not exist"))?;
        if ty.accepts(node.kind) {
            Ok(())
        } else {
            Err(format!("`{}` is not allowed here", node.kind))
        }
    }

    fn check_detached(&self, field: &Field) -> Result<(), AstError> {
        let ids = match field {
            Field::Node(id) => std::slice::from_ref(id),
            Field::List(ids) => ids.as_slice(),
            Field::Value(_) | Field::Absent => &[],
        };
        match ids.iter().find(|id| self.is_attached(**id)) {
            Some(id) => Err(AstError::AlreadyAttached { id: *id }),
            None => Ok(()),
        }
    }

    fn copy_compatible_field(
        &mut self,
        source: &AstNode,
        kind: NodeKind,
        spec: &FieldSpec,
    ) -> Result<Field, AstError> {
        let candidate = source
            .field(spec.name)
            .filter(|field| {
                !field.is_absent()
                    && self
                        .check_field(kind, spec, field, source.location)
                        .is_ok()
            })
            .cloned();
        match candidate {
            Some(Field::Node(child)) => Ok(Field::Node(self.deep_copy(child)?)),
            Some(Field::List(children)) => Ok(Field::List(
                children
                    .iter()
                    .map(|child| self.deep_copy(*child))
                    .collect::<Result<_, _>>()?,
            )),
            Some(field) => Ok(field),
            None if spec.ty.is_required() => Err(AstError::MissingField {
                kind,
                field: spec.name,
                location: source.location,
            }),
            None => Ok(empty_field(spec.ty)),
        }
    }
}

fn empty_field(ty: FieldType) -> Field {
    match ty {
        FieldType::NodeList(_) => Field::List(Vec::new()),
        _ => Field::Absent,
    }
}

/// Recursive node construction shared by the parsed and synthesized entry points.
struct NodeFactory<'a> {
    arena: &'a mut Arena,
    synthesized: bool,
}

impl<'a> NodeFactory<'a> {
    fn parsed(arena: &'a mut Arena) -> Self {
        Self {
            arena,
            synthesized: false,
        }
    }

    fn synthesized(arena: &'a mut Arena) -> Self {
        Self {
            arena,
            synthesized: true,
        }
    }

    fn build(&mut self, syntax: &SyntaxNode, inherited: Option<Location>) -> Result<u32, AstError> {
        let kind = NodeKind::from_name(&syntax.tag).ok_or_else(|| AstError::UnsupportedSyntax {
            tag: syntax.tag.clone(),
            location: syntax.location.or(inherited),
        })?;
        let location = self.location(kind, syntax, inherited)?;
        if let Some((name, _)) = syntax
            .fields
            .iter()
            .find(|(name, _)| kind.field_index(name).is_none())
        {
            return Err(AstError::InvalidField {
                kind,
                field: name.clone(),
                reason: "no such field".to_string(),
                location,
            });
        }

        let id = self.arena.alloc_id();
        let mut fields = Vec::with_capacity(kind.fields().len());
        for spec in kind.fields() {
            let raw = syntax.field(spec.name);
            fields.push(self.build_field(kind, spec, raw, location)?);
        }
        Self::check_shape(kind, &fields, location)?;
        let node = AstNode::new(id, kind, location, fields);
        Ok(self.arena.insert(node))
    }

    fn location(
        &self,
        kind: NodeKind,
        syntax: &SyntaxNode,
        inherited: Option<Location>,
    ) -> Result<Option<Location>, AstError> {
        if syntax.location.is_some() {
            return Ok(syntax.location);
        }
        if kind.is_a(NodeClass::Operator) {
            return Ok(inherited);
        }
        if self.synthesized || syntax.synthesized {
            return Ok(None);
        }
        Err(AstError::MissingField {
            kind,
            field: "lineno",
            location: inherited,
        })
    }

    fn build_field(
        &mut self,
        kind: NodeKind,
        spec: &FieldSpec,
        raw: Option<&SyntaxValue>,
        location: Option<Location>,
    ) -> Result<Field, AstError> {
        let invalid = |reason: String| AstError::InvalidField {
            kind,
            field: spec.name.to_string(),
            reason,
            location,
        };
        let raw = match raw {
            None | Some(SyntaxValue::Null) if spec.ty.is_required() => {
                return Err(AstError::MissingField {
                    kind,
                    field: spec.name,
                    location,
                });
            }
            None | Some(SyntaxValue::Null) => return Ok(empty_field(spec.ty)),
            Some(raw) => raw,
        };
        match (spec.ty, raw) {
            (FieldType::Node(_) | FieldType::OptionalNode(_), SyntaxValue::Node(child)) => {
                Self::check_tag(spec.ty, child).map_err(invalid)?;
                Ok(Field::Node(self.build(child, location)?))
            }
            (FieldType::NodeList(_), SyntaxValue::List(items)) => {
                let mut children = Vec::with_capacity(items.len());
                for item in items {
                    let SyntaxValue::Node(child) = item else {
                        return Err(invalid(format!(
                            "expected a list of nodes, found {}",
                            item.describe()
                        )));
                    };
                    Self::check_tag(spec.ty, child).map_err(invalid)?;
                    children.push(self.build(child, location)?);
                }
                Ok(Field::List(children))
            }
            (FieldType::Int, SyntaxValue::Number(text) | SyntaxValue::Str(text)) => {
                BigInt::from_str(text)
                    .map(|value| Field::Value(Value::Int(value)))
                    .map_err(|_| invalid(format!("`{text}` is not an integer")))
            }
            (FieldType::Decimal, SyntaxValue::Number(text) | SyntaxValue::Str(text)) => {
                Decimal::from_str(text)
                    .map(|value| Field::Value(Value::Decimal(value)))
                    .map_err(|err| invalid(err.to_string()))
            }
            (FieldType::Str | FieldType::OptionalStr, SyntaxValue::Str(text)) => {
                Ok(Field::Value(Value::Str(text.clone())))
            }
            (FieldType::Bytes, SyntaxValue::Str(text)) => {
                let bytes = match text.strip_prefix("0x") {
                    Some(digits) => hex::decode(digits)
                        .map_err(|err| invalid(format!("`{text}` is not valid hex: {err}")))?,
                    None => text.as_bytes().to_vec(),
                };
                Ok(Field::Value(Value::Bytes(bytes)))
            }
            (FieldType::Bool, SyntaxValue::Bool(value)) => Ok(Field::Value(Value::Bool(*value))),
            (ty, raw) => Err(invalid(format!("expected {ty}, found {}", raw.describe()))),
        }
    }

    /// Rejects a child whose tag is known but not accepted by the slot. Unknown tags
    /// are left for `build` to report as unsupported syntax.
    fn check_tag(ty: FieldType, child: &SyntaxNode) -> Result<(), String> {
        match NodeKind::from_name(&child.tag) {
            Some(kind) if !ty.accepts(kind) => Err(format!("`{kind}` is not allowed here")),
            _ => Ok(()),
        }
    }

    /// Cross-field constraints the field tables cannot express.
    fn check_shape(
        kind: NodeKind,
        fields: &[Field],
        location: Option<Location>,
    ) -> Result<(), AstError> {
        match kind {
            NodeKind::Dict => {
                let len = |index: usize| {
                    fields
                        .get(index)
                        .and_then(Field::as_list)
                        .map_or(0, <[u32]>::len)
                };
                if len(0) == len(1) {
                    Ok(())
                } else {
                    Err(AstError::InvalidField {
                        kind,
                        field: "values".to_string(),
                        reason: format!("{} keys but {} values", len(0), len(1)),
                        location,
                    })
                }
            }
            NodeKind::BoolOp => {
                let operands = fields.get(1).and_then(Field::as_list).map_or(0, <[u32]>::len);
                if operands >= 2 {
                    Ok(())
                } else {
                    Err(AstError::InvalidField {
                        kind,
                        field: "values".to_string(),
                        reason: format!("needs at least two operands, found {operands}"),
                        location,
                    })
                }
            }
            NodeKind::Hex => {
                let is_hex = matches!(
                    fields.first(),
                    Some(Field::Value(Value::Str(text)))
                        if text.strip_prefix("0x").is_some_and(|digits| {
                            !digits.is_empty() && digits.chars().all(|c| c.is_ascii_hexdigit())
                        })
                );
                if is_hex {
                    Ok(())
                } else {
                    Err(AstError::InvalidField {
                        kind,
                        field: "value".to_string(),
                        reason: "expected a `0x`-prefixed hex literal".to_string(),
                        location,
                    })
                }
            }
            _ => Ok(()),
        }
    }
}
