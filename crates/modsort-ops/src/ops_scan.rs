//! Operation: list every mod found in the source directories.

use std::path::{Path, PathBuf};

use serde::Serialize;

use modsort_core::{Finding, ModSource};
use modsort_resolver::DiagnosticReport;

use crate::ops_setup;
use crate::OutputFormat;

/// Options for `modsort scan`.
#[derive(Debug, Default)]
pub struct ScanOptions {
    /// Source directories overriding `[sources] dirs`.
    pub sources: Vec<PathBuf>,
    pub format: OutputFormat,
}

#[derive(Serialize)]
struct ScanEntry<'a> {
    id: &'a str,
    name: &'a str,
    source: ModSource,
    path: &'a Path,
}

#[derive(Serialize)]
struct ScanOutput<'a> {
    mods: Vec<ScanEntry<'a>>,
    findings: &'a [Finding],
}

/// Scan the sources and print the catalog with its findings.
pub fn scan(opts: &ScanOptions) -> miette::Result<()> {
    let context = ops_setup::load_catalog(&opts.sources)?;
    let report = DiagnosticReport::new(context.findings.clone());

    let mut mods: Vec<ScanEntry<'_>> = context
        .catalog
        .iter()
        .map(|record| ScanEntry {
            id: record.id.as_str(),
            name: record.display_name(),
            source: record.source,
            path: record.path(),
        })
        .collect();
    mods.sort_by(|a, b| a.id.to_lowercase().cmp(&b.id.to_lowercase()));

    match opts.format {
        OutputFormat::Json => crate::print_json(&ScanOutput {
            mods,
            findings: &report.findings,
        })?,
        OutputFormat::Text => {
            let width = mods.iter().map(|m| m.id.len()).max().unwrap_or(0);
            for entry in &mods {
                println!(
                    "{:<width$}  {:<8}  {}  ({})",
                    entry.id,
                    entry.source.as_str(),
                    entry.name,
                    entry.path.display()
                );
            }
            if !report.is_empty() {
                println!();
                print!("{report}");
            }
        }
    }

    modsort_util::progress::status_info(
        "Found",
        &format!(
            "{} mods, {} duplicate identit{}",
            context.catalog.len(),
            context.catalog.duplicates().len(),
            if context.catalog.duplicates().len() == 1 { "y" } else { "ies" }
        ),
    );
    Ok(())
}
