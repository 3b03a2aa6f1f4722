//! Error types for the AST crate.
//!
//! [`AstError`] covers tree construction and structural edits. Constant folding
//! reports through the separate [`FoldError`] because "not foldable" is an
//! ordinary outcome that callers usually recover from.

use thiserror::Error;

use crate::nodes::{Location, NodeKind};

fn at(location: Option<&Location>) -> String {
    match location {
        Some(location) => format!(" at {location}"),
        None => String::new(),
    }
}

/// Errors raised while building, retyping or editing a tree.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[must_use = "errors must not be silently ignored"]
pub enum AstError {
    /// The generic tree carries a tag with no matching node kind.
    #[error("unsupported syntax `{tag}`{}", at(location.as_ref()))]
    UnsupportedSyntax {
        tag: String,
        location: Option<Location>,
    },

    /// A required field is absent from the input or from a retype source.
    #[error("`{kind}` is missing required field `{field}`{}", at(location.as_ref()))]
    MissingField {
        kind: NodeKind,
        field: &'static str,
        location: Option<Location>,
    },

    /// A field value has the wrong shape, or a child kind is not allowed in that slot.
    #[error("invalid field `{field}` on `{kind}`: {reason}{}", at(location.as_ref()))]
    InvalidField {
        kind: NodeKind,
        field: String,
        reason: String,
        location: Option<Location>,
    },

    /// The generic tree is not shaped like a node description.
    #[error("malformed parse tree: {reason}")]
    MalformedInput { reason: String },

    /// The node is not reachable from a parent slot.
    #[error("node {id} is not attached to the tree")]
    NotInTree { id: u32 },

    /// No node with this id, or no node matching the query.
    #[error("node {id} not found")]
    NotFound { id: u32 },

    /// The node already has a parent and cannot be attached elsewhere.
    #[error("node {id} already has a parent")]
    AlreadyAttached { id: u32 },

    /// The arena holds no rooted tree.
    #[error("arena has no root node")]
    NoRoot,
}

/// Reasons an expression does not fold to a literal.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FoldError {
    /// The expression depends on something only known at run time.
    #[error("`{kind}` is not a constant expression: {reason}")]
    NotConstant { kind: NodeKind, reason: String },

    /// No node with this id exists in the arena.
    #[error("node {id} does not exist")]
    NotFound { id: u32 },

    /// The operands are constant but the operation has no defined result.
    #[error("invalid constant operation: {reason}")]
    InvalidConstantOperation { reason: String },
}

impl FoldError {
    pub(crate) fn not_constant(kind: NodeKind, reason: impl Into<String>) -> Self {
        FoldError::NotConstant {
            kind,
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        FoldError::InvalidConstantOperation {
            reason: reason.into(),
        }
    }
}
