//! CLI argument definitions for modsort.
//!
//! Uses `clap` derive macros to define the command surface. Each command
//! corresponds to a handler in the [`super::commands`] module.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "modsort",
    version,
    about = "Deterministic load order resolution for RimWorld mods",
    long_about = "modsort scans mod folders for About.xml descriptors, validates saved \
                  selections against their dependencies and incompatibilities, and computes \
                  a load order that honours every loadBefore/loadAfter declaration."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Output format for command results.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Format {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List every mod found in the source directories
    Scan {
        /// Mod source directory, scanned in order (overrides [sources] dirs)
        #[arg(short, long = "source", value_name = "DIR")]
        sources: Vec<PathBuf>,
        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// Validate a saved selection and report every finding
    Check {
        /// Saved selection: .json modlist, ModsConfig.xml, or plain text
        #[arg(long, value_name = "FILE")]
        selection: PathBuf,
        /// Mod source directory, scanned in order (overrides [sources] dirs)
        #[arg(short, long = "source", value_name = "DIR")]
        sources: Vec<PathBuf>,
        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// Compute the load order for a saved selection
    Sort {
        /// Saved selection: .json modlist, ModsConfig.xml, or plain text
        #[arg(long, value_name = "FILE")]
        selection: PathBuf,
        /// Mod source directory, scanned in order (overrides [sources] dirs)
        #[arg(short, long = "source", value_name = "DIR")]
        sources: Vec<PathBuf>,
        /// Write the resolved order to this .json or .txt file
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
}

pub fn parse() -> Cli {
    Cli::parse()
}
