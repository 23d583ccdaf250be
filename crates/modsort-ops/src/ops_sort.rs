//! Operation: compute the load order for a saved selection.

use std::path::PathBuf;

use serde::Serialize;

use modsort_core::{selection, Finding, ModId};
use modsort_resolver::{DiagnosticReport, ResolvedOrder};

use crate::ops_setup;
use crate::OutputFormat;

/// Options for `modsort sort`.
#[derive(Debug, Default)]
pub struct SortOptions {
    pub sources: Vec<PathBuf>,
    pub selection: PathBuf,
    /// Where to persist the order. Nothing is written when unset.
    pub output: Option<PathBuf>,
    pub format: OutputFormat,
}

#[derive(Serialize)]
struct SortOutput<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    order: Option<&'a ResolvedOrder>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cycle: Option<&'a [ModId]>,
    findings: &'a [Finding],
}

/// Resolve the selection, print the order and findings, and optionally save
/// the order. A cycle is printed and reported as an error; nothing is saved.
pub fn sort(opts: &SortOptions) -> miette::Result<()> {
    let outcome = ops_setup::run_pipeline(&opts.sources, &opts.selection)?;
    let report = DiagnosticReport::new(outcome.findings);

    let order = match outcome.resolution.order {
        Ok(order) => order,
        Err(cycle) => {
            match opts.format {
                OutputFormat::Json => crate::print_json(&SortOutput {
                    order: None,
                    cycle: Some(&cycle.cycle),
                    findings: &report.findings,
                })?,
                OutputFormat::Text => println!("{report}"),
            }
            modsort_util::progress::status_error(
                "Cycle",
                &format!("{} mods block each other; no order written", cycle.cycle.len()),
            );
            return Err(cycle.into());
        }
    };

    match opts.format {
        OutputFormat::Json => crate::print_json(&SortOutput {
            order: Some(&order),
            cycle: None,
            findings: &report.findings,
        })?,
        OutputFormat::Text => {
            print!("{order}");
            if !report.is_empty() {
                println!();
                print!("{report}");
            }
        }
    }

    let implicit = order.implicit().count();
    if implicit > 0 {
        modsort_util::progress::status_info(
            "Added",
            &format!("{implicit} required mod(s) missing from the selection"),
        );
    }

    if let Some(output) = &opts.output {
        let ids: Vec<ModId> = order.ids().cloned().collect();
        let name = ops_setup::selection_name(&opts.selection);
        selection::save(output, &name, &ids)?;
        modsort_util::progress::status("Saved", &format!("load order to {}", output.display()));
    } else {
        modsort_util::progress::status("Sorted", &format!("{} mods", order.len()));
    }
    Ok(())
}
