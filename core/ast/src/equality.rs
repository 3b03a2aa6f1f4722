//! Structural equality and hashing.
//!
//! Two nodes are equal when they have the same kind and pairwise equal semantic
//! fields, recursively. Spans, parent links, annotations and ids are metadata and
//! never take part, so a folded or synthesized node compares equal to a parsed one.
//! [`NodeRef`] pairs a node with its arena so that nodes from different arenas can
//! be compared and used as hash-map keys.

use std::hash::{BuildHasher, Hash, Hasher};

use rustc_hash::FxBuildHasher;
use serde::{Serialize, Serializer};

use crate::{
    arena::Arena,
    nodes::{AstNode, Field},
};

/// A node viewed through its arena. Compares and hashes structurally.
#[derive(Clone, Copy, Debug)]
pub struct NodeRef<'a> {
    pub arena: &'a Arena,
    pub node: &'a AstNode,
}

impl<'a> NodeRef<'a> {
    #[must_use]
    pub fn id(&self) -> u32 {
        self.node.id
    }

    fn resolve(&self, id: u32) -> Option<NodeRef<'a>> {
        self.arena.node_ref(id)
    }

    fn fields_equal(&self, ours: &Field, other: &NodeRef<'_>, theirs: &Field) -> bool {
        match (ours, theirs) {
            (Field::Node(a), Field::Node(b)) => self.children_equal(*a, other, *b),
            (Field::List(a), Field::List(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .zip(b)
                        .all(|(a, b)| self.children_equal(*a, other, *b))
            }
            (Field::Value(a), Field::Value(b)) => a == b,
            (Field::Absent, Field::Absent) => true,
            _ => false,
        }
    }

    fn children_equal(&self, ours: u32, other: &NodeRef<'_>, theirs: u32) -> bool {
        match (self.resolve(ours), other.resolve(theirs)) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    fn hash_field<H: Hasher>(&self, field: &Field, state: &mut H) {
        std::mem::discriminant(field).hash(state);
        match field {
            Field::Node(id) => self.hash_child(*id, state),
            Field::List(ids) => {
                ids.len().hash(state);
                for id in ids {
                    self.hash_child(*id, state);
                }
            }
            Field::Value(value) => value.hash(state),
            Field::Absent => {}
        }
    }

    fn hash_child<H: Hasher>(&self, id: u32, state: &mut H) {
        if let Some(child) = self.resolve(id) {
            child.hash(state);
        }
    }
}

impl PartialEq for NodeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.node.kind == other.node.kind
            && self
                .node
                .fields
                .iter()
                .zip(&other.node.fields)
                .all(|(ours, theirs)| self.fields_equal(ours, other, theirs))
    }
}

impl Eq for NodeRef<'_> {}

impl Hash for NodeRef<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.node.kind.hash(state);
        for field in &self.node.fields {
            self.hash_field(field, state);
        }
    }
}

impl Serialize for NodeRef<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.arena
            .to_dict(self.node.id)
            .map_err(serde::ser::Error::custom)?
            .serialize(serializer)
    }
}

impl Arena {
    #[must_use]
    pub fn node_ref(&self, id: u32) -> Option<NodeRef<'_>> {
        self.find_node(id).map(|node| NodeRef { arena: self, node })
    }

    /// Structural equality of two nodes of this arena. Missing ids are never equal.
    #[must_use]
    pub fn nodes_equal(&self, a: u32, b: u32) -> bool {
        match (self.node_ref(a), self.node_ref(b)) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    /// Hash of the node's kind and semantic fields, consistent with [`Arena::nodes_equal`].
    #[must_use]
    pub fn structural_hash(&self, id: u32) -> Option<u64> {
        self.node_ref(id).map(|node| FxBuildHasher.hash_one(node))
    }
}
