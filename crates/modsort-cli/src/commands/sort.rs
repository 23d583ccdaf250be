use std::path::PathBuf;

use miette::Result;
use modsort_ops::ops_sort::{self, SortOptions};
use modsort_ops::OutputFormat;

pub fn exec(
    selection: PathBuf,
    sources: Vec<PathBuf>,
    output: Option<PathBuf>,
    format: OutputFormat,
) -> Result<()> {
    ops_sort::sort(&SortOptions {
        sources,
        selection,
        output,
        format,
    })
}
