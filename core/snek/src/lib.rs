#![warn(clippy::pedantic)]
//! Pipeline entry points for the snek compiler frontend.
//!
//! The external parser hands over a generic parse tree as JSON. This crate turns
//! it into a typed [`Arena`], runs the tree-level passes and serializes the result:
//!
//! ```text
//! parse tree (JSON) → parse_json → Arena → fold_constants → to_json → AST (JSON)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use snek::{fold_constants, parse_json, to_json};
//!
//! fn fold(parse_tree: &str) -> anyhow::Result<String> {
//!     let mut arena = parse_json(parse_tree)?;
//!     fold_constants(&mut arena)?;
//!     to_json(&arena, true)
//! }
//! ```
//!
//! Every function returns [`anyhow::Result`] with the failing phase attached as
//! context, so callers can print the error chain directly.
//!
//! [`Arena`]: snek_ast::arena::Arena

use anyhow::Context;
use snek_ast::{
    arena::Arena,
    builder::Builder,
    errors::FoldError,
    filter::NodeFilter,
    nodes::NodeClass,
    syntax_tree::SyntaxNode,
};

/// Builds a typed AST from the JSON form of a generic parse tree.
///
/// # Errors
///
/// Returns an error if the text is not JSON, if it is not shaped like a parse tree
/// or if the [`Builder`] rejects a node (unsupported tag, missing or invalid field).
pub fn parse_json(parse_tree: &str) -> anyhow::Result<Arena> {
    let value: serde_json::Value =
        serde_json::from_str(parse_tree).context("Parse tree is not valid JSON")?;
    parse_value(&value)
}

/// Same as [`parse_json`] for an already decoded JSON value.
///
/// # Errors
///
/// See [`parse_json`].
pub fn parse_value(parse_tree: &serde_json::Value) -> anyhow::Result<Arena> {
    let root = SyntaxNode::from_json(parse_tree).context("Failed to read parse tree")?;
    let arena = Builder::new()
        .build_ast(&root)
        .context("Failed to build AST")?;
    Ok(arena)
}

/// Replaces every maximal constant expression in the tree with its folded literal
/// and returns the number of replacements.
///
/// Expressions are visited top-down, so once an expression is folded its operands are
/// no longer part of the tree and are skipped. Expressions that depend on run-time
/// values are left alone. Nodes detached by the pass are swept at the end.
///
/// # Errors
///
/// Returns an error for constant expressions with no defined value, such as a
/// division by zero or an out-of-range result.
pub fn fold_constants(arena: &mut Arena) -> anyhow::Result<usize> {
    let Some(root) = arena.root() else {
        return Ok(0);
    };
    let candidates = arena.get_descendants(root, &NodeFilter::new().kind(NodeClass::Expression));
    let mut replaced = 0;
    for id in candidates {
        if !arena.is_reachable(id) || arena.is_literal_value(id) {
            continue;
        }
        match arena.get_folded_value(id) {
            Ok(folded) => {
                arena
                    .replace_in_tree(id, folded)
                    .with_context(|| format!("Failed to replace folded node {id}"))?;
                replaced += 1;
            }
            Err(FoldError::NotConstant { .. }) => {}
            Err(
                err @ (FoldError::InvalidConstantOperation { .. } | FoldError::NotFound { .. }),
            ) => {
                let location = arena
                    .find_node(id)
                    .and_then(|node| node.location)
                    .map(|location| format!(" at {location}"))
                    .unwrap_or_default();
                return Err(anyhow::Error::new(err))
                    .with_context(|| format!("Constant folding failed{location}"));
            }
        }
    }
    let swept = arena.sweep();
    tracing::debug!(replaced, swept, "Folded constant expressions");
    Ok(replaced)
}

/// Serializes the whole tree, pretty-printed or on a single line.
///
/// # Errors
///
/// Returns an error if the arena has no root or references a missing node.
pub fn to_json(arena: &Arena, pretty: bool) -> anyhow::Result<String> {
    let root = arena.root().context("AST has no root node")?;
    let dict = arena.to_dict(root).context("Failed to serialize AST")?;
    let value = serde_json::Value::Object(dict);
    let text = if pretty {
        serde_json::to_string_pretty(&value)?
    } else {
        serde_json::to_string(&value)?
    };
    Ok(text)
}
