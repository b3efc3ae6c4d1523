//! The modelgraph Command-Line Interface.
//!
//! This module is the main entry point for all CLI commands and orchestrates
//! the core library functions.

use std::path::Path;
use std::process;

use clap::Parser;

use crate::cli::args::{Command, ModelgraphArgs};
use crate::errors::{print_error, ModelError, Result};
use crate::manifest::{discover_manifests, Manifest};
use crate::path::ModelPath;
use crate::reference::UntypedReference;
use crate::types::TypeDescriptor;

pub mod args;
pub mod output;

/// The main entry point for the CLI.
pub fn run() {
    let args = ModelgraphArgs::parse();

    let result = match args.command {
        Command::Path { text } => handle_path(&text).map(|()| true),
        Command::Type { text } => handle_type(&text).map(|()| true),
        Command::Ref { path, type_text } => handle_ref(&path, &type_text).map(|()| true),
        Command::Check { target } => handle_check(&target),
    };

    match result {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            print_error(e);
            process::exit(1);
        }
    }
}

fn write_failed(e: std::io::Error) -> ModelError {
    ModelError::Io {
        path: "<stdout>".into(),
        source: e,
    }
}

fn handle_path(text: &str) -> Result<()> {
    let path = ModelPath::parse(text)?;
    output::print_path(&mut output::stdout(), &path).map_err(write_failed)
}

fn handle_type(text: &str) -> Result<()> {
    let descriptor = TypeDescriptor::parse(text)?;
    output::print_type(&mut output::stdout(), &descriptor).map_err(write_failed)
}

fn handle_ref(path: &str, type_text: &str) -> Result<()> {
    let reference = UntypedReference::parse(path, type_text)?;
    output::print_reference(&mut output::stdout(), &reference).map_err(write_failed)
}

/// Handles the `check` subcommand. Returns true when every reference in every
/// manifest resolved.
fn handle_check(target: &Path) -> Result<bool> {
    let manifests = discover_manifests(target)?;
    if manifests.is_empty() {
        return Err(ModelError::invalid_argument(format!(
            "no manifests found under '{}'",
            target.display()
        )));
    }

    let mut stdout = output::stdout();
    let mut all_passed = true;
    for manifest_path in &manifests {
        let manifest = Manifest::load(manifest_path)?;
        let registry = manifest.build_registry()?;
        let reports = manifest.check(&registry)?;
        let passed = output::print_check_report(
            &mut stdout,
            &manifest_path.display().to_string(),
            &reports,
        )
        .map_err(write_failed)?;
        all_passed &= passed;
    }
    Ok(all_passed)
}
