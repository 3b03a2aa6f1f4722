//! Command line argument parsing for the snek compiler frontend.
//!
//! This module defines the CLI interface using `clap`. The `Cli` struct captures
//! all command line flags and arguments passed to the `snekc` binary.

use clap::Parser;

/// Command line interface definition for `snekc`.
///
/// `snekc` reads generic parse trees in JSON form, builds the typed AST and prints
/// it back as JSON. With `--fold` the constant-folding pass runs in between.
///
/// ## Examples
///
/// Build and print the AST of one parse tree:
/// ```bash
/// snekc token.json
/// ```
///
/// Fold constants in every parse tree of a directory and write `<stem>.ast.json` files:
/// ```bash
/// snekc contracts/ --fold -o out
/// ```
#[derive(Parser)]
#[command(
    name = "snekc",
    author,
    version,
    about = "snek compiler frontend CLI (snekc)",
    long_about = "The 'snekc' command builds the typed AST from one parse tree (.json) or from \
every .json file below a directory, optionally folds constant expressions, and emits the AST as JSON."
)]
pub(crate) struct Cli {
    /// Parse tree file, or a directory searched recursively for `*.json` files.
    pub(crate) path: std::path::PathBuf,

    /// Replace constant expressions with their folded literals.
    #[clap(long = "fold", action = clap::ArgAction::SetTrue)]
    pub(crate) fold: bool,

    /// Emit single-line JSON instead of pretty-printed JSON.
    #[clap(long = "compact", action = clap::ArgAction::SetTrue)]
    pub(crate) compact: bool,

    /// Write `<stem>.ast.json` files into this directory instead of printing to stdout.
    #[clap(short = 'o', long = "out-dir")]
    pub(crate) out_dir: Option<std::path::PathBuf>,

    /// Log pipeline events to stderr. `SNEK_LOG` overrides the level.
    #[clap(short = 'v', long = "verbose", action = clap::ArgAction::SetTrue)]
    pub(crate) verbose: bool,
}
