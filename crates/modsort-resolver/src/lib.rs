//! Load order resolution engine.
//!
//! Data flows one way: a [`Catalog`] of discovered mods and an
//! [`ActiveSelection`] go into the [`GraphBuilder`], whose constraint graph is
//! sorted by [`resolve`]; every step contributes [`Finding`]s that
//! [`summarize`] puts into presentation order.
//!
//! Everything here is synchronous and free of I/O. The graph copies what it
//! needs out of the catalog, so a catalog may be rebuilt while an earlier
//! graph is still being resolved.

pub mod catalog;
pub mod diagnostics;
pub mod graph;
pub mod resolver;

use modsort_core::{ActiveSelection, Finding, ModId};

pub use catalog::{Catalog, DuplicateIdentity, Scanner};
pub use diagnostics::{summarize, DiagnosticReport};
pub use graph::{build_graph, Activation, ConstraintGraph, GraphBuilder};
pub use resolver::{resolve, CycleFinding, ResolvedEntry, ResolvedOrder};

/// Tuning for [`resolve_selection`].
#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    /// Identities that win tie-breaks, in this order, ahead of everything else.
    pub load_first: Vec<ModId>,
}

/// The outcome of one resolution call.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub order: Result<ResolvedOrder, CycleFinding>,
    /// Graph and sort findings in [`summarize`] order, including the cycle
    /// finding when `order` is an error.
    pub findings: Vec<Finding>,
}

impl Resolution {
    pub fn has_errors(&self) -> bool {
        self.findings.iter().any(Finding::is_error)
    }
}

/// Build the constraint graph for `selection`, sort it, and collect findings.
pub fn resolve_selection(
    catalog: &Catalog,
    selection: &ActiveSelection,
    options: &ResolveOptions,
) -> Resolution {
    let (graph, mut findings) = GraphBuilder::new(catalog)
        .load_first(options.load_first.iter().cloned())
        .build(selection);
    let order = resolve(&graph);
    if let Err(cycle) = &order {
        findings.push(cycle.to_finding());
    }
    Resolution {
        order,
        findings: summarize(findings),
    }
}
