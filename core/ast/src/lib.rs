#![warn(clippy::pedantic)]
//! Typed abstract syntax tree for the snek smart-contract language.
//!
//! Nodes live in an [`arena::Arena`] and refer to each other by `u32` id. The
//! crate covers the whole life of a tree:
//!
//! - [`builder`] turns the parser's generic [`syntax_tree::SyntaxNode`] into typed nodes
//! - [`arena`] and [`filter`] answer navigation queries
//! - [`equality`] compares subtrees structurally, ignoring spans
//! - [`fold`] evaluates constant expressions to literals
//! - [`editor`] rewrites the tree in place
//! - [`serialize`] emits the JSON mapping used by tooling and snapshot tests

pub mod arena;
pub mod builder;
pub mod editor;
pub(crate) mod enums_impl;
pub mod equality;
pub mod errors;
pub mod filter;
pub mod fold;
pub mod nodes;
pub(crate) mod nodes_impl;
pub mod number;
pub mod serialize;
pub mod syntax_tree;
