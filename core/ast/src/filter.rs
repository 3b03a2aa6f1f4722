//! Kind and field filters for tree navigation.

use crate::{
    arena::Arena,
    nodes::{AstNode, Field, NodeClass, NodeKind, Value},
};

/// Matches a node kind. Sets of filters match when any member does.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum KindFilter {
    #[default]
    Any,
    Kind(NodeKind),
    Class(NodeClass),
    AnyOf(Vec<KindFilter>),
}

impl KindFilter {
    #[must_use]
    pub fn matches(&self, kind: NodeKind) -> bool {
        match self {
            KindFilter::Any => true,
            KindFilter::Kind(expected) => *expected == kind,
            KindFilter::Class(class) => kind.is_a(*class),
            KindFilter::AnyOf(filters) => filters.iter().any(|filter| filter.matches(kind)),
        }
    }
}

impl From<NodeKind> for KindFilter {
    fn from(kind: NodeKind) -> Self {
        KindFilter::Kind(kind)
    }
}

impl From<NodeClass> for KindFilter {
    fn from(class: NodeClass) -> Self {
        KindFilter::Class(class)
    }
}

impl From<&[NodeKind]> for KindFilter {
    fn from(kinds: &[NodeKind]) -> Self {
        KindFilter::AnyOf(kinds.iter().copied().map(KindFilter::Kind).collect())
    }
}

impl<const N: usize> From<[NodeKind; N]> for KindFilter {
    fn from(kinds: [NodeKind; N]) -> Self {
        KindFilter::from(kinds.as_slice())
    }
}

/// Filter for [`Arena::get_children`] and [`Arena::get_descendants`].
///
/// Field conditions are keyed by a dotted path through node-valued fields
/// (`"func.id"` reads the `id` of the node in `func`) and require an exact match
/// against the stored scalar value. A condition listing several values matches
/// any of them.
#[derive(Clone, Debug, Default)]
pub struct NodeFilter {
    kind: KindFilter,
    fields: Vec<(String, Vec<Value>)>,
    reverse: bool,
    include_self: bool,
}

impl NodeFilter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn kind(mut self, kind: impl Into<KindFilter>) -> Self {
        self.kind = kind.into();
        self
    }

    #[must_use]
    pub fn field(mut self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.push((path.into(), vec![value.into()]));
        self
    }

    #[must_use]
    pub fn field_any(mut self, path: impl Into<String>, values: Vec<Value>) -> Self {
        self.fields.push((path.into(), values));
        self
    }

    /// Visit children last-to-first.
    #[must_use]
    pub fn reverse(mut self) -> Self {
        self.reverse = true;
        self
    }

    /// Let [`Arena::get_descendants`] yield the starting node too.
    #[must_use]
    pub fn include_self(mut self) -> Self {
        self.include_self = true;
        self
    }

    #[must_use]
    pub fn is_reversed(&self) -> bool {
        self.reverse
    }

    #[must_use]
    pub fn includes_self(&self) -> bool {
        self.include_self
    }

    #[must_use]
    pub fn matches(&self, arena: &Arena, node: &AstNode) -> bool {
        self.kind.matches(node.kind)
            && self.fields.iter().all(|(path, expected)| {
                resolve_path(arena, node, path).is_some_and(|value| expected.contains(value))
            })
    }
}

impl From<KindFilter> for NodeFilter {
    fn from(kind: KindFilter) -> Self {
        NodeFilter::new().kind(kind)
    }
}

impl From<NodeKind> for NodeFilter {
    fn from(kind: NodeKind) -> Self {
        NodeFilter::new().kind(kind)
    }
}

impl From<NodeClass> for NodeFilter {
    fn from(class: NodeClass) -> Self {
        NodeFilter::new().kind(class)
    }
}

fn resolve_path<'a>(arena: &'a Arena, node: &'a AstNode, path: &str) -> Option<&'a Value> {
    let mut current = node;
    let mut segments = path.split('.').peekable();
    while let Some(segment) = segments.next() {
        let field = current.field(segment)?;
        if segments.peek().is_none() {
            return field.as_value();
        }
        let Field::Node(child) = field else {
            return None;
        };
        current = arena.find_node(*child)?;
    }
    None
}
