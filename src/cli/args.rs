//! Defines the command-line arguments and subcommands for the modelgraph CLI.
//!
//! This module uses the `clap` crate with its "derive" feature to create a
//! declarative and type-safe argument parsing structure.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "modelgraph",
    version,
    about = "Typed references into hierarchical, type-tagged model graphs."
)]
pub struct ModelgraphArgs {
    #[command(subcommand)]
    pub command: Command,
}

/// An enumeration of all available CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Validate a dotted model path and show its structure.
    Path {
        /// The path text, e.g. `tasks.compile`. Empty text is the root.
        text: String,
    },
    /// Validate a type descriptor and print its normalized form.
    Type {
        /// The type text, e.g. `Map<String, Vec<Task>>`.
        text: String,
    },
    /// Build a reference from a path and a type and print it.
    Ref {
        /// The path text.
        path: String,
        /// The type text.
        #[arg(value_name = "TYPE")]
        type_text: String,
    },
    /// Check manifest references against the nodes the manifest declares.
    Check {
        /// A manifest file, or a directory searched for manifests.
        #[arg(required = true)]
        target: PathBuf,
    },
}
