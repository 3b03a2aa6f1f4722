//! Node storage and read-only navigation.
//!
//! The arena owns every node by id. Parent links live in [`NodeRoute`]s beside the
//! nodes and never own anything, so a detached subtree simply stops being reachable
//! from the root and is dropped by [`Arena::sweep`](crate::arena::Arena::sweep) or
//! together with the arena.

use rustc_hash::FxHashMap;

use crate::{
    errors::AstError,
    filter::{KindFilter, NodeFilter},
    nodes::AstNode,
};

#[derive(Default, Clone, Debug)]
pub struct Arena {
    pub(crate) nodes: FxHashMap<u32, AstNode>,
    pub(crate) node_routes: FxHashMap<u32, NodeRoute>,
    /// Memoized `get_folded_value` results, source id to folded node id.
    pub(crate) folded: FxHashMap<u32, u32>,
    pub(crate) root: Option<u32>,
    next_id: u32,
}

#[derive(Clone, Default, Debug)]
pub struct NodeRoute {
    pub id: u32,
    pub(crate) parent: Option<u32>,
    pub(crate) children: Vec<u32>,
}

impl Arena {
    /// Id of the root node, `None` for an arena that holds only detached nodes.
    #[must_use]
    pub fn root(&self) -> Option<u32> {
        self.root
    }

    #[must_use]
    pub fn root_node(&self) -> Option<&AstNode> {
        self.root.and_then(|id| self.nodes.get(&id))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn find_node(&self, id: u32) -> Option<&AstNode> {
        self.nodes.get(&id)
    }

    /// # Errors
    ///
    /// Returns [`AstError::NotFound`] if the arena holds no node with this id.
    pub fn get_node(&self, id: u32) -> Result<&AstNode, AstError> {
        self.nodes.get(&id).ok_or(AstError::NotFound { id })
    }

    #[must_use]
    pub fn find_parent_node(&self, id: u32) -> Option<u32> {
        self.node_routes.get(&id).and_then(|route| route.parent)
    }

    /// Returns `true` for the root and for every node that has a parent.
    /// A node whose ancestors were detached still counts as attached.
    #[must_use]
    pub fn is_attached(&self, id: u32) -> bool {
        self.root == Some(id) || self.find_parent_node(id).is_some()
    }

    /// Returns `true` if walking parent links from `id` ends at the root.
    #[must_use]
    pub fn is_reachable(&self, id: u32) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if self.root == Some(node) {
                return true;
            }
            current = self.find_parent_node(node);
        }
        false
    }

    /// Immediate children of `id` in declared field order, list fields flattened.
    #[must_use]
    pub fn get_children(&self, id: u32, filter: &NodeFilter) -> Vec<u32> {
        let mut children: Vec<u32> = self
            .node_routes
            .get(&id)
            .map(|route| route.children.clone())
            .unwrap_or_default();
        if filter.is_reversed() {
            children.reverse();
        }
        children.retain(|child| self.matches(*child, filter));
        children
    }

    /// Pre-order walk of the subtree under `id`.
    ///
    /// Non-matching nodes are skipped but their subtrees are still visited. The
    /// result is a snapshot; editing the tree afterwards does not affect it.
    #[must_use]
    pub fn get_descendants(&self, id: u32, filter: &NodeFilter) -> Vec<u32> {
        let mut result = Vec::new();
        if !self.nodes.contains_key(&id) {
            return result;
        }
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if (current != id || filter.includes_self()) && self.matches(current, filter) {
                result.push(current);
            }
            if let Some(route) = self.node_routes.get(&current) {
                // Pushed in reverse so that the first child is visited first.
                if filter.is_reversed() {
                    stack.extend(route.children.iter().copied());
                } else {
                    stack.extend(route.children.iter().rev().copied());
                }
            }
        }
        result
    }

    /// Nearest proper ancestor of `id` whose kind matches `filter`.
    #[must_use]
    pub fn find_ancestor(&self, id: u32, filter: &KindFilter) -> Option<u32> {
        let mut current = self.find_parent_node(id);
        while let Some(ancestor) = current {
            if self
                .nodes
                .get(&ancestor)
                .is_some_and(|node| filter.matches(node.kind))
            {
                return Some(ancestor);
            }
            current = self.find_parent_node(ancestor);
        }
        None
    }

    /// # Errors
    ///
    /// Returns [`AstError::NotFound`] with the starting id if the walk reaches the
    /// top of the tree without a match.
    pub fn get_ancestor(&self, id: u32, filter: &KindFilter) -> Result<u32, AstError> {
        self.find_ancestor(id, filter)
            .ok_or(AstError::NotFound { id })
    }

    /// Attaches a derived annotation to a node, replacing any previous value under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`AstError::NotFound`] if the node does not exist.
    pub fn annotate(
        &mut self,
        id: u32,
        key: impl Into<String>,
        value: serde_json::Value,
    ) -> Result<(), AstError> {
        let node = self.nodes.get_mut(&id).ok_or(AstError::NotFound { id })?;
        node.annotations.insert(key.into(), value);
        Ok(())
    }

    #[must_use]
    pub fn annotation(&self, id: u32, key: &str) -> Option<&serde_json::Value> {
        self.nodes.get(&id).and_then(|node| node.annotation(key))
    }

    /// The part of `code` covered by the node's span.
    #[must_use]
    pub fn node_source<'c>(&self, id: u32, code: &'c str) -> Option<&'c str> {
        let location = self.nodes.get(&id)?.location?;
        code.get(location.offset_start as usize..location.offset_end as usize)
    }

    /// Checks that every node reachable from the root has exactly one parent and
    /// that the parent lists it exactly once.
    #[must_use]
    pub fn parent_links_consistent(&self) -> bool {
        let Some(root) = self.root else {
            return true;
        };
        if self.find_parent_node(root).is_some() {
            return false;
        }
        let mut stack = vec![root];
        while let Some(current) = stack.pop() {
            let Some(node) = self.nodes.get(&current) else {
                return false;
            };
            let children = node.child_ids();
            let route_children = self
                .node_routes
                .get(&current)
                .map(|route| route.children.as_slice())
                .unwrap_or_default();
            if children != route_children {
                return false;
            }
            for child in &children {
                if children.iter().filter(|c| *c == child).count() != 1
                    || self.find_parent_node(*child) != Some(current)
                {
                    return false;
                }
            }
            stack.extend(children);
        }
        true
    }

    fn matches(&self, id: u32, filter: &NodeFilter) -> bool {
        self.nodes
            .get(&id)
            .is_some_and(|node| filter.matches(self, node))
    }

    pub(crate) fn alloc_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    /// Current id high-water mark, for [`Arena::rollback`].
    pub(crate) fn mark(&self) -> u32 {
        self.next_id
    }

    /// Drops every node allocated after `mark`. Used when a construction fails halfway.
    pub(crate) fn rollback(&mut self, mark: u32) {
        self.nodes.retain(|id, _| *id <= mark);
        self.node_routes.retain(|id, _| *id <= mark);
        self.folded.retain(|_, folded| *folded <= mark);
        self.next_id = mark;
    }

    /// Stores a fully built node and adopts its children.
    pub(crate) fn insert(&mut self, node: AstNode) -> u32 {
        let id = node.id;
        let children = node.child_ids();
        for child in &children {
            if let Some(route) = self.node_routes.get_mut(child) {
                route.parent = Some(id);
            }
        }
        self.node_routes.insert(
            id,
            NodeRoute {
                id,
                parent: None,
                children,
            },
        );
        self.nodes.insert(id, node);
        id
    }

    /// Recomputes the route children of `id` from its fields after an edit.
    pub(crate) fn refresh_children(&mut self, id: u32) {
        let children = self
            .nodes
            .get(&id)
            .map(AstNode::child_ids)
            .unwrap_or_default();
        if let Some(route) = self.node_routes.get_mut(&id) {
            route.children = children;
        }
    }

    pub(crate) fn set_parent(&mut self, id: u32, parent: Option<u32>) {
        if let Some(route) = self.node_routes.get_mut(&id) {
            route.parent = parent;
        }
    }
}
