pub mod ops_check;
pub mod ops_scan;
pub mod ops_setup;
pub mod ops_sort;

use serde::Serialize;

use modsort_util::errors::ModsortError;

/// How an operation prints its result on stdout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Print `value` as pretty JSON on stdout.
pub(crate) fn print_json<T: Serialize>(value: &T) -> miette::Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(|e| ModsortError::Generic {
        message: format!("Failed to serialize output: {e}"),
    })?;
    println!("{json}");
    Ok(())
}
