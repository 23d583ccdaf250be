//! Check command implementation.

use std::path::PathBuf;

use miette::Result;
use modsort_ops::ops_check::{self, CheckOptions};
use modsort_ops::OutputFormat;

pub fn exec(selection: PathBuf, sources: Vec<PathBuf>, format: OutputFormat) -> Result<()> {
    ops_check::check(&CheckOptions {
        sources,
        selection,
        format,
    })
}
