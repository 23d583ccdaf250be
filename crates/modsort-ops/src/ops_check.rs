//! Operation: validate a saved selection without writing anything.

use std::path::PathBuf;

use serde::Serialize;

use modsort_resolver::DiagnosticReport;
use modsort_util::errors::ModsortError;

use crate::ops_setup;
use crate::OutputFormat;

/// Options for `modsort check`.
#[derive(Debug, Default)]
pub struct CheckOptions {
    pub sources: Vec<PathBuf>,
    /// The saved selection to validate.
    pub selection: PathBuf,
    pub format: OutputFormat,
}

#[derive(Serialize)]
struct CheckOutput<'a> {
    ok: bool,
    errors: usize,
    warnings: usize,
    #[serde(flatten)]
    report: &'a DiagnosticReport,
}

/// Run the pipeline over a saved selection and print every finding.
///
/// Fails when any error-severity finding exists.
pub fn check(opts: &CheckOptions) -> miette::Result<()> {
    let outcome = ops_setup::run_pipeline(&opts.sources, &opts.selection)?;
    let report = DiagnosticReport::new(outcome.findings);

    match opts.format {
        OutputFormat::Json => crate::print_json(&CheckOutput {
            ok: !report.has_errors(),
            errors: report.error_count(),
            warnings: report.warning_count(),
            report: &report,
        })?,
        OutputFormat::Text => println!("{report}"),
    }

    if report.has_errors() {
        return Err(ModsortError::Resolution {
            message: format!(
                "{} error(s) in {}",
                report.error_count(),
                opts.selection.display()
            ),
        }
        .into());
    }

    modsort_util::progress::status(
        "Checked",
        &format!(
            "{} mods, {} warning(s)",
            outcome.selection.len(),
            report.warning_count()
        ),
    );
    Ok(())
}
