//! Shared setup for `scan`, `check`, and `sort`: config, source directories,
//! catalog, and the resolution pipeline.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use modsort_core::config::GlobalConfig;
use modsort_core::{selection, ActiveSelection, Finding, ModId};
use modsort_resolver::{resolve_selection, summarize, Catalog, ResolveOptions, Resolution};
use modsort_scan::AboutXmlScanner;
use modsort_util::errors::ModsortError;

/// Everything known after scanning the source directories.
pub struct CatalogContext {
    pub config: GlobalConfig,
    pub dirs: Vec<PathBuf>,
    pub catalog: Catalog,
    /// Duplicate and self-reference findings from catalog construction.
    pub findings: Vec<Finding>,
}

/// The result of running a saved selection through the resolver.
pub struct PipelineOutcome {
    pub context: CatalogContext,
    pub selection: ActiveSelection,
    pub resolution: Resolution,
    /// Catalog findings relevant to this selection merged with the
    /// resolution findings, in presentation order.
    pub findings: Vec<Finding>,
}

impl PipelineOutcome {
    pub fn has_errors(&self) -> bool {
        self.findings.iter().any(Finding::is_error)
    }
}

/// Source directories to scan: `--source` flags win over `[sources] dirs`.
pub fn source_dirs(config: &GlobalConfig, overrides: &[PathBuf]) -> miette::Result<Vec<PathBuf>> {
    let dirs = if overrides.is_empty() {
        config.sources.dirs.clone()
    } else {
        overrides.to_vec()
    };
    if dirs.is_empty() {
        return Err(ModsortError::Config {
            message: format!(
                "No mod source directories configured. Pass --source DIR or set [sources] dirs in {}",
                GlobalConfig::default_path().display()
            ),
        }
        .into());
    }
    Ok(dirs)
}

/// Load the global config and scan every source directory into a catalog.
pub fn load_catalog(overrides: &[PathBuf]) -> miette::Result<CatalogContext> {
    let config = GlobalConfig::load()?;
    let dirs = source_dirs(&config, overrides)?;

    for dir in &dirs {
        if !dir.is_dir() {
            modsort_util::progress::status_warn(
                "Missing",
                &format!("source directory {}", dir.display()),
            );
        }
    }
    modsort_util::progress::status(
        "Scanning",
        &format!("{} source director{}", dirs.len(), if dirs.len() == 1 { "y" } else { "ies" }),
    );

    let (catalog, findings) = Catalog::build(&dirs, &AboutXmlScanner::new());
    tracing::debug!("Catalog holds {} mods", catalog.len());

    Ok(CatalogContext {
        config,
        dirs,
        catalog,
        findings,
    })
}

/// Scan the sources, load the selection at `selection_path`, and resolve it.
pub fn run_pipeline(overrides: &[PathBuf], selection_path: &Path) -> miette::Result<PipelineOutcome> {
    let context = load_catalog(overrides)?;
    let selection = selection::load(selection_path)?;
    if selection.is_empty() {
        modsort_util::progress::status_warn(
            "Empty",
            &format!("selection {}", selection_path.display()),
        );
    }

    modsort_util::progress::status(
        "Resolving",
        &format!("{} selected mods", selection.len()),
    );
    let options = ResolveOptions {
        load_first: context.config.resolve.load_first_ids(),
    };
    let resolution = resolve_selection(&context.catalog, &selection, &options);

    let findings = merge_findings(&context.findings, &selection, &resolution);
    Ok(PipelineOutcome {
        context,
        selection,
        resolution,
        findings,
    })
}

/// Catalog findings only matter when they touch a mod in play: selected, or
/// part of the resolved order.
fn merge_findings(
    catalog_findings: &[Finding],
    selection: &ActiveSelection,
    resolution: &Resolution,
) -> Vec<Finding> {
    let mut active: HashSet<&ModId> = selection.iter().collect();
    if let Ok(order) = &resolution.order {
        active.extend(order.ids());
    }
    let relevant = catalog_findings
        .iter()
        .filter(|f| f.identities.iter().any(|id| active.contains(id)))
        .cloned();
    summarize(relevant.chain(resolution.findings.iter().cloned()).collect())
}

/// Name a modlist after the selection file it was loaded from.
pub fn selection_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "modlist".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_win_over_config() {
        let mut config = GlobalConfig::default();
        config.sources.dirs = vec![PathBuf::from("/configured")];
        let dirs = source_dirs(&config, &[PathBuf::from("/flag")]).unwrap();
        assert_eq!(dirs, vec![PathBuf::from("/flag")]);
        let dirs = source_dirs(&config, &[]).unwrap();
        assert_eq!(dirs, vec![PathBuf::from("/configured")]);
    }

    #[test]
    fn no_sources_is_a_config_error() {
        let err = source_dirs(&GlobalConfig::default(), &[]).unwrap_err();
        assert!(err.to_string().contains("Config error"));
    }

    #[test]
    fn selection_name_uses_file_stem() {
        assert_eq!(selection_name(Path::new("/x/my list.json")), "my list");
    }
}
