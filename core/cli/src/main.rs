#![warn(clippy::pedantic)]

//! # snek Compiler Frontend CLI
//!
//! Command line interface for the snek AST layer.
//!
//! 1. Parse  – read a generic parse tree (`.json`) and build the typed AST.
//! 2. Fold   (`--fold`) – replace constant expressions with literals.
//! 3. Emit   – print the AST as JSON, or write it to `<out-dir>/<stem>.ast.json` with `-o`.
//!
//! A directory argument is walked recursively and every `*.json` file in it is processed
//! in path order.
//!
//! ## Logging
//! Diagnostics go to stderr through `tracing`. The level comes from `SNEK_LOG`
//! (for example `SNEK_LOG=snek_ast=debug`) and defaults to `warn`, or `debug` with `-v`.
//!
//! ## Exit codes
//! * 0 – success.
//! * 1 – usage / IO / pipeline failure.
//!
//! ## Example
//! ```bash
//! snekc tests/test_data/json/constants.json --fold --compact
//! ```

mod parser;
use anyhow::Context;
use clap::Parser;
use parser::Cli;
use snek::{fold_constants, parse_json, to_json};
use std::{
    fs,
    path::{Path, PathBuf},
    process::{self},
};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

/// Entry point for the CLI executable.
///
/// On any failure a diagnostic is printed to stderr and the process exits with code `1`.
fn main() {
    let args = Cli::parse();
    init_logging(args.verbose);
    if !args.path.exists() {
        eprintln!("Error: path not found");
        process::exit(1);
    }

    let inputs = match collect_inputs(&args.path) {
        Ok(inputs) => inputs,
        Err(e) => {
            eprintln!("Error: {e:#}");
            process::exit(1);
        }
    };
    if inputs.is_empty() {
        eprintln!("Error: no .json parse trees found in {}", args.path.display());
        process::exit(1);
    }

    for input in &inputs {
        if let Err(e) = process_file(input, &args) {
            eprintln!("Error: {}: {e:#}", input.display());
            process::exit(1);
        }
    }
    process::exit(0);
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("SNEK_LOG").unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// A file is taken as is; a directory yields its `*.json` files sorted by path.
fn collect_inputs(path: &Path) -> anyhow::Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    let mut inputs = Vec::new();
    for entry in WalkDir::new(path).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to walk {}", path.display()))?;
        let is_json = entry.path().extension().is_some_and(|ext| ext == "json");
        if entry.file_type().is_file() && is_json {
            inputs.push(entry.into_path());
        }
    }
    Ok(inputs)
}

fn process_file(input: &Path, args: &Cli) -> anyhow::Result<()> {
    let parse_tree =
        fs::read_to_string(input).with_context(|| format!("Failed to read {}", input.display()))?;
    let mut arena = parse_json(&parse_tree)?;
    tracing::info!(path = %input.display(), nodes = arena.len(), "Parsed");
    if args.fold {
        let folded = fold_constants(&mut arena)?;
        tracing::info!(path = %input.display(), folded, "Folded constants");
    }
    let output = to_json(&arena, !args.compact)?;
    match &args.out_dir {
        Some(out_dir) => {
            fs::create_dir_all(out_dir)
                .with_context(|| format!("Failed to create output directory {}", out_dir.display()))?;
            let stem = input
                .file_stem()
                .and_then(|stem| stem.to_str())
                .unwrap_or("module");
            let out_path = out_dir.join(format!("{stem}.ast.json"));
            fs::write(&out_path, output)
                .with_context(|| format!("Failed to write {}", out_path.display()))?;
            println!("AST written to: {}", out_path.to_string_lossy());
        }
        None => println!("{output}"),
    }
    Ok(())
}
