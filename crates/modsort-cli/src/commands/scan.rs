use std::path::PathBuf;

use miette::Result;
use modsort_ops::ops_scan::{self, ScanOptions};
use modsort_ops::OutputFormat;

pub fn exec(sources: Vec<PathBuf>, format: OutputFormat) -> Result<()> {
    ops_scan::scan(&ScanOptions { sources, format })
}
