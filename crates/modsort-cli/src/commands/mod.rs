//! Command dispatch and handler modules.

mod check;
mod scan;
mod sort;

use miette::Result;
use modsort_ops::OutputFormat;

use crate::cli::{Cli, Command, Format};

/// Route a parsed CLI invocation to the appropriate command handler.
pub fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Scan { sources, format } => scan::exec(sources, format.into()),
        Command::Check {
            selection,
            sources,
            format,
        } => check::exec(selection, sources, format.into()),
        Command::Sort {
            selection,
            sources,
            output,
            format,
        } => sort::exec(selection, sources, output, format.into()),
    }
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Text => OutputFormat::Text,
            Format::Json => OutputFormat::Json,
        }
    }
}
