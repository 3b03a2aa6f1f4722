//! In-place structural edits.
//!
//! Every edit keeps the parent links consistent: a node is attached to at most one
//! parent slot, and a detached node is not listed by any parent. Detached nodes
//! stay in the arena until [`Arena::sweep`] so that ids held by callers remain valid.

use rustc_hash::FxHashSet;

use crate::{
    arena::Arena,
    errors::AstError,
    nodes::{AstNode, Field, FieldType, NodeKind, Value},
};

impl Arena {
    /// Puts the detached node `new` into the slot `old` occupies and detaches `old`.
    ///
    /// `old` is found by id, never by structural equality. Its annotations are cleared
    /// and cached fold results of `old` and of every ancestor of the slot are dropped.
    ///
    /// # Errors
    ///
    /// - [`AstError::NotFound`] if either id does not exist
    /// - [`AstError::NotInTree`] if `old` is not reachable from the root
    /// - [`AstError::AlreadyAttached`] if `new` already has a parent or is the root
    /// - [`AstError::InvalidField`] if the slot does not accept the kind of `new`
    pub fn replace_in_tree(&mut self, old: u32, new: u32) -> Result<(), AstError> {
        self.get_node(old)?;
        let new_kind = self.get_node(new)?.kind;
        if self.is_attached(new) {
            return Err(AstError::AlreadyAttached { id: new });
        }
        // A slot inside a detached subtree could be `new` itself or one of its descendants.
        if !self.is_reachable(old) {
            return Err(AstError::NotInTree { id: old });
        }
        let parent_id = self.find_parent_node(old).ok_or(AstError::NotInTree { id: old })?;
        let parent = self.get_node(parent_id)?;
        let (index, position) = parent.locate_child(old).ok_or(AstError::NotInTree { id: old })?;
        let spec = parent.kind.fields()[index];
        if !spec.ty.accepts(new_kind) {
            return Err(AstError::InvalidField {
                kind: parent.kind,
                field: spec.name.to_string(),
                reason: format!("`{new_kind}` is not allowed here"),
                location: parent.location,
            });
        }

        if let Some(parent) = self.nodes.get_mut(&parent_id) {
            parent.set_child_slot(index, position, new);
        }
        self.refresh_children(parent_id);
        self.set_parent(new, Some(parent_id));
        self.set_parent(old, None);
        if let Some(node) = self.nodes.get_mut(&old) {
            node.annotations.clear();
        }
        self.invalidate_folded(old);
        self.invalidate_folded_from(parent_id);
        self.folded.retain(|_, folded| *folded != new);
        tracing::debug!(old, new, parent = parent_id, kind = %new_kind, "Replaced node");
        Ok(())
    }

    /// Appends the detached node `id` to the body of the root module.
    ///
    /// # Errors
    ///
    /// - [`AstError::NotFound`] if the node does not exist
    /// - [`AstError::AlreadyAttached`] if it has a parent or is the root
    /// - [`AstError::InvalidField`] if the root is not a module or the kind cannot
    ///   appear in a module body
    pub fn add_to_body(&mut self, id: u32) -> Result<(), AstError> {
        let kind = self.get_node(id)?.kind;
        if self.is_attached(id) {
            return Err(AstError::AlreadyAttached { id });
        }
        let (root, body_index) = self.module_body()?;
        let module = self.get_node(root)?;
        let spec = module.kind.fields()[body_index];
        if !spec.ty.accepts(kind) {
            return Err(AstError::InvalidField {
                kind: module.kind,
                field: spec.name.to_string(),
                reason: format!("`{kind}` is not allowed here"),
                location: module.location,
            });
        }
        if let Some(Field::List(body)) = self
            .nodes
            .get_mut(&root)
            .and_then(|module| module.fields.get_mut(body_index))
        {
            body.push(id);
        }
        self.refresh_children(root);
        self.set_parent(id, Some(root));
        self.invalidate_folded_from(root);
        tracing::debug!(id, kind = %kind, "Appended node to module body");
        Ok(())
    }

    /// Detaches `id` from the body of the root module.
    ///
    /// # Errors
    ///
    /// Returns [`AstError::NotFound`] if `id` is not a direct member of the module body.
    pub fn remove_from_body(&mut self, id: u32) -> Result<(), AstError> {
        let (root, body_index) = self.module_body()?;
        let removed = match self
            .nodes
            .get_mut(&root)
            .and_then(|module| module.fields.get_mut(body_index))
        {
            Some(Field::List(body)) => match body.iter().position(|member| *member == id) {
                Some(position) => {
                    body.remove(position);
                    true
                }
                None => false,
            },
            _ => false,
        };
        if !removed {
            return Err(AstError::NotFound { id });
        }
        self.refresh_children(root);
        self.set_parent(id, None);
        self.invalidate_folded_from(root);
        tracing::debug!(id, "Removed node from module body");
        Ok(())
    }

    /// Sets the documentation string of a module or definition, detaching any previous one.
    ///
    /// # Errors
    ///
    /// Returns [`AstError::NotFound`] if `id` does not exist and
    /// [`AstError::InvalidField`] if the node has no `doc_string` field.
    pub fn set_doc_string(&mut self, id: u32, text: &str) -> Result<u32, AstError> {
        let node = self.get_node(id)?;
        let Some(index) = node.kind.field_index("doc_string") else {
            return Err(AstError::InvalidField {
                kind: node.kind,
                field: "doc_string".to_string(),
                reason: "node has no documentation slot".to_string(),
                location: node.location,
            });
        };
        let previous = node.fields.get(index).and_then(Field::as_node);
        let doc = self.alloc_id();
        self.insert(AstNode::new(
            doc,
            NodeKind::DocStr,
            None,
            vec![Field::Value(Value::Str(text.to_string()))],
        ));
        if let Some(slot) = self.nodes.get_mut(&id).and_then(|node| node.fields.get_mut(index)) {
            *slot = Field::Node(doc);
        }
        if let Some(previous) = previous {
            self.set_parent(previous, None);
        }
        self.set_parent(doc, Some(id));
        self.refresh_children(id);
        self.invalidate_folded_from(id);
        tracing::debug!(id, doc, "Set documentation string");
        Ok(doc)
    }

    /// Drops every node that is no longer reachable from the root and returns how many
    /// were dropped. Ids of dropped nodes become invalid.
    pub fn sweep(&mut self) -> usize {
        let mut reachable = FxHashSet::default();
        let mut stack: Vec<u32> = self.root.into_iter().collect();
        while let Some(id) = stack.pop() {
            if reachable.insert(id) {
                if let Some(route) = self.node_routes.get(&id) {
                    stack.extend(route.children.iter().copied());
                }
            }
        }
        let before = self.nodes.len();
        self.nodes.retain(|id, _| reachable.contains(id));
        self.node_routes.retain(|id, _| reachable.contains(id));
        // Cached fold results are always detached, so none of them survive.
        self.folded.clear();
        let dropped = before - self.nodes.len();
        if dropped > 0 {
            tracing::debug!(dropped, "Swept detached nodes");
        }
        dropped
    }

    /// Root id and index of its `body` field. Body edits are only defined on modules.
    fn module_body(&self) -> Result<(u32, usize), AstError> {
        let root = self.root_node().ok_or(AstError::NoRoot)?;
        match (root.kind, root.kind.field_index("body")) {
            (NodeKind::Module, Some(index))
                if matches!(root.kind.fields()[index].ty, FieldType::NodeList(_)) =>
            {
                Ok((root.id, index))
            }
            _ => Err(AstError::InvalidField {
                kind: root.kind,
                field: "body".to_string(),
                reason: "body edits need a `Module` root".to_string(),
                location: root.location,
            }),
        }
    }

    fn invalidate_folded(&mut self, id: u32) {
        self.folded.remove(&id);
    }

    /// Drops the cached fold result of `id` and of all its ancestors.
    fn invalidate_folded_from(&mut self, id: u32) {
        let mut current = Some(id);
        while let Some(node) = current {
            self.invalidate_folded(node);
            current = self.find_parent_node(node);
        }
    }
}
