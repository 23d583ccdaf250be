//! Constraint graph construction.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};

use modsort_core::{ActiveSelection, Finding, ModId, ModRecord};

use crate::catalog::Catalog;

/// Tie-break tier of nodes that are not on the load-first list.
pub const DEFAULT_TIER: usize = usize::MAX;

/// Why a node is part of the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    /// Requested by the selection.
    Explicit,
    /// Pulled in only because something requires it.
    Implicit,
}

/// A node in the constraint graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphNode {
    pub id: ModId,
    pub activation: Activation,
    /// Position on the load-first list, or [`DEFAULT_TIER`].
    pub tier: usize,
}

/// Which declaration produced an ordering edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeOrigin {
    LoadBefore,
    LoadAfter,
    Requires,
}

/// Ordering constraints over the active mods, backed by petgraph.
///
/// An edge `a -> b` means `a` must load before `b`. Incompatible pairs live in
/// a separate set and never contribute edges.
#[derive(Debug, Clone, Default)]
pub struct ConstraintGraph {
    graph: DiGraph<GraphNode, EdgeOrigin>,
    index: HashMap<ModId, NodeIndex>,
    forbidden: BTreeSet<(ModId, ModId)>,
}

impl ConstraintGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or retrieve a node. An existing node keeps its activation, so the
    /// first tag assigned sticks.
    pub fn add_node(&mut self, id: ModId, activation: Activation) -> NodeIndex {
        if let Some(&idx) = self.index.get(&id) {
            return idx;
        }
        let idx = self.graph.add_node(GraphNode {
            id: id.clone(),
            activation,
            tier: DEFAULT_TIER,
        });
        self.index.insert(id, idx);
        idx
    }

    /// Add an ordering edge `from -> to`. Parallel edges collapse into the
    /// first one and self-loops are ignored. Returns whether an edge was added.
    pub fn add_edge(&mut self, from: NodeIndex, to: NodeIndex, origin: EdgeOrigin) -> bool {
        if from == to || self.graph.find_edge(from, to).is_some() {
            return false;
        }
        self.graph.add_edge(from, to, origin);
        true
    }

    /// Record an incompatible pair. Returns `false` if it was already known.
    pub fn forbid(&mut self, a: ModId, b: ModId) -> bool {
        let pair = if a <= b { (a, b) } else { (b, a) };
        self.forbidden.insert(pair)
    }

    pub fn set_tier(&mut self, idx: NodeIndex, tier: usize) {
        self.graph[idx].tier = tier;
    }

    /// Look up a node by identity (case-insensitive).
    pub fn find(&self, id: &ModId) -> Option<NodeIndex> {
        self.index.get(id).copied()
    }

    pub fn node(&self, idx: NodeIndex) -> &GraphNode {
        &self.graph[idx]
    }

    /// Nodes in insertion order: selection order first, then pulled-in requirements.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeIndex, &GraphNode)> {
        self.graph
            .node_indices()
            .map(move |idx| (idx, &self.graph[idx]))
    }

    /// Nodes that must load right after `idx`.
    pub fn successors(&self, idx: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.neighbors_directed(idx, Direction::Outgoing)
    }

    /// Number of ordering edges pointing at `idx`.
    pub fn in_degree(&self, idx: NodeIndex) -> usize {
        self.graph
            .edges_directed(idx, Direction::Incoming)
            .count()
    }

    /// All ordering edges as `(before, after)` identity pairs.
    pub fn edges(&self) -> Vec<(&ModId, &ModId)> {
        self.graph
            .edge_references()
            .map(|e| (&self.graph[e.source()].id, &self.graph[e.target()].id))
            .collect()
    }

    pub fn has_edge(&self, from: &ModId, to: &ModId) -> bool {
        match (self.find(from), self.find(to)) {
            (Some(a), Some(b)) => self.graph.find_edge(a, b).is_some(),
            _ => false,
        }
    }

    /// The origin recorded for the edge `from -> to`, if any.
    pub fn edge_origin(&self, from: &ModId, to: &ModId) -> Option<EdgeOrigin> {
        let edge = self.graph.find_edge(self.find(from)?, self.find(to)?)?;
        self.graph.edge_weight(edge).copied()
    }

    /// Incompatible pairs among the nodes, each stored sorted.
    pub fn forbidden(&self) -> &BTreeSet<(ModId, ModId)> {
        &self.forbidden
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Builds a [`ConstraintGraph`] from a catalog and a requested selection.
pub struct GraphBuilder<'a> {
    catalog: &'a Catalog,
    load_first: Vec<ModId>,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self {
            catalog,
            load_first: Vec::new(),
        }
    }

    /// Identities that win tie-breaks, in the given order. They never add edges.
    pub fn load_first(mut self, ids: impl IntoIterator<Item = ModId>) -> Self {
        self.load_first.extend(ids);
        self
    }

    pub fn build(&self, selection: &ActiveSelection) -> (ConstraintGraph, Vec<Finding>) {
        let mut graph = ConstraintGraph::new();
        let mut findings = Vec::new();

        let mut pending = self.add_selected(&mut graph, &mut findings, selection);
        let requires = self.pull_in_requirements(&mut graph, &mut findings, &mut pending);
        self.add_ordering_edges(&mut graph, requires);
        self.record_incompatibilities(&mut graph, &mut findings);
        self.assign_tiers(&mut graph);

        tracing::debug!(
            "Built constraint graph: {} nodes, {} edges, {} incompatible pairs",
            graph.len(),
            graph.edge_count(),
            graph.forbidden().len()
        );
        (graph, findings)
    }

    fn add_selected(
        &self,
        graph: &mut ConstraintGraph,
        findings: &mut Vec<Finding>,
        selection: &ActiveSelection,
    ) -> VecDeque<&'a ModRecord> {
        let catalog = self.catalog;
        let mut seen = HashSet::new();
        let mut pending = VecDeque::new();
        for id in selection {
            if !seen.insert(id) {
                findings.push(Finding::duplicate_selection(id.clone()));
                continue;
            }
            let Some(record) = catalog.get(id) else {
                findings.push(Finding::unknown_selection(id.clone()));
                continue;
            };
            graph.add_node(record.id.clone(), Activation::Explicit);
            pending.push_back(record);
        }
        pending
    }

    /// Breadth-first closure over `requires`. Returns `(dependency, dependent)`
    /// pairs for every satisfied requirement.
    fn pull_in_requirements(
        &self,
        graph: &mut ConstraintGraph,
        findings: &mut Vec<Finding>,
        pending: &mut VecDeque<&'a ModRecord>,
    ) -> Vec<(NodeIndex, NodeIndex)> {
        let catalog = self.catalog;
        let mut satisfied = Vec::new();
        while let Some(record) = pending.pop_front() {
            let Some(dependent) = graph.find(&record.id) else {
                continue;
            };
            for target in &record.requires {
                if record.incompatible_with.contains(target) {
                    findings.push(Finding::contradictory(record.id.clone(), target.clone()));
                    continue;
                }
                let Some(dependency) = catalog.get(target) else {
                    findings.push(Finding::missing_dependency(
                        record.id.clone(),
                        target.clone(),
                    ));
                    continue;
                };
                let idx = match graph.find(&dependency.id) {
                    Some(idx) => idx,
                    None => {
                        pending.push_back(dependency);
                        graph.add_node(dependency.id.clone(), Activation::Implicit)
                    }
                };
                satisfied.push((idx, dependent));
            }
        }
        satisfied
    }

    fn add_ordering_edges(&self, graph: &mut ConstraintGraph, requires: Vec<(NodeIndex, NodeIndex)>) {
        let mut edges = Vec::new();
        for (idx, node) in graph.nodes() {
            let Some(record) = self.catalog.get(&node.id) else {
                continue;
            };
            for before in &record.load_before {
                if let Some(target) = graph.find(before) {
                    edges.push((idx, target, EdgeOrigin::LoadBefore));
                }
            }
            for after in &record.load_after {
                if let Some(source) = graph.find(after) {
                    edges.push((source, idx, EdgeOrigin::LoadAfter));
                }
            }
        }
        edges.extend(
            requires
                .into_iter()
                .map(|(dependency, dependent)| (dependency, dependent, EdgeOrigin::Requires)),
        );
        for (from, to, origin) in edges {
            graph.add_edge(from, to, origin);
        }
    }

    fn record_incompatibilities(&self, graph: &mut ConstraintGraph, findings: &mut Vec<Finding>) {
        let mut pairs = Vec::new();
        for (_, node) in graph.nodes() {
            let Some(record) = self.catalog.get(&node.id) else {
                continue;
            };
            for other in &record.incompatible_with {
                if let Some(other_idx) = graph.find(other) {
                    pairs.push((node.id.clone(), graph.node(other_idx).id.clone()));
                }
            }
        }
        for (a, b) in pairs {
            if graph.forbid(a.clone(), b.clone()) {
                findings.push(Finding::incompatible(a, b));
            }
        }
    }

    fn assign_tiers(&self, graph: &mut ConstraintGraph) {
        for (tier, id) in self.load_first.iter().enumerate() {
            if let Some(idx) = graph.find(id) {
                if graph.node(idx).tier == DEFAULT_TIER {
                    graph.set_tier(idx, tier);
                }
            }
        }
    }
}

/// Build the constraint graph for `selection` with no load-first list.
pub fn build_graph(catalog: &Catalog, selection: &ActiveSelection) -> (ConstraintGraph, Vec<Finding>) {
    GraphBuilder::new(catalog).build(selection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use modsort_core::{FindingKind, MissingCause, Relation};

    fn id(s: &str) -> ModId {
        ModId::parse(s).unwrap()
    }

    fn record(s: &str) -> ModRecord {
        ModRecord::new(id(s), s.to_uppercase(), format!("/mods/{s}"))
    }

    fn selection(raw: &[&str]) -> ActiveSelection {
        ActiveSelection::from_strings(raw)
    }

    fn catalog(records: Vec<ModRecord>) -> Catalog {
        Catalog::from_records(records).0
    }

    #[test]
    fn add_node_returns_existing_and_keeps_activation() {
        let mut g = ConstraintGraph::new();
        let a = g.add_node(id("a"), Activation::Explicit);
        let again = g.add_node(id("A"), Activation::Implicit);
        assert_eq!(a, again);
        assert_eq!(g.node(a).activation, Activation::Explicit);
        assert_eq!(g.len(), 1);
    }

    #[test]
    fn parallel_edges_collapse() {
        let mut g = ConstraintGraph::new();
        let a = g.add_node(id("a"), Activation::Explicit);
        let b = g.add_node(id("b"), Activation::Explicit);
        assert!(g.add_edge(a, b, EdgeOrigin::LoadBefore));
        assert!(!g.add_edge(a, b, EdgeOrigin::LoadAfter));
        assert!(!g.add_edge(a, a, EdgeOrigin::Requires));
        assert_eq!(g.edge_count(), 1);
        assert_eq!(g.edge_origin(&id("a"), &id("b")), Some(EdgeOrigin::LoadBefore));
    }

    #[test]
    fn load_before_and_after_become_edges() {
        let cat = catalog(vec![
            record("a").with(Relation::LoadBefore, [id("b")]),
            record("c").with(Relation::LoadAfter, [id("b")]),
            record("b"),
        ]);
        let (g, findings) = build_graph(&cat, &selection(&["a", "b", "c"]));
        assert!(findings.is_empty());
        assert!(g.has_edge(&id("a"), &id("b")));
        assert!(g.has_edge(&id("b"), &id("c")));
        assert_eq!(g.edge_count(), 2);
    }

    #[test]
    fn ordering_edges_to_inactive_mods_are_ignored() {
        let cat = catalog(vec![
            record("a").with(Relation::LoadBefore, [id("b"), id("ghost")]),
            record("b"),
        ]);
        let (g, findings) = build_graph(&cat, &selection(&["a"]));
        assert!(findings.is_empty());
        assert_eq!(g.len(), 1);
        assert_eq!(g.edge_count(), 0);
    }

    #[test]
    fn unknown_selection_is_dropped() {
        let cat = catalog(vec![record("a")]);
        let (g, findings) = build_graph(&cat, &selection(&["a", "ghost"]));
        assert_eq!(g.len(), 1);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].cause, Some(MissingCause::UnknownSelection));
        assert_eq!(findings[0].identities, vec![id("ghost")]);
    }

    #[test]
    fn duplicate_selection_entry_is_reported_once() {
        let cat = catalog(vec![record("a")]);
        let (g, findings) = build_graph(&cat, &selection(&["a", "A"]));
        assert_eq!(g.len(), 1);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, FindingKind::DuplicateIdentity);
        assert!(!findings[0].is_error());
    }

    #[test]
    fn requirements_are_pulled_in_transitively() {
        let cat = catalog(vec![
            record("a").with(Relation::Requires, [id("b")]),
            record("b").with(Relation::Requires, [id("c")]),
            record("c"),
        ]);
        let (g, findings) = build_graph(&cat, &selection(&["a"]));
        assert!(findings.is_empty());
        assert_eq!(g.len(), 3);
        let b = g.find(&id("b")).unwrap();
        let c = g.find(&id("c")).unwrap();
        assert_eq!(g.node(b).activation, Activation::Implicit);
        assert_eq!(g.node(c).activation, Activation::Implicit);
        assert_eq!(g.edge_origin(&id("b"), &id("a")), Some(EdgeOrigin::Requires));
        assert!(g.has_edge(&id("c"), &id("b")));
    }

    #[test]
    fn explicit_wins_over_implicit() {
        let cat = catalog(vec![
            record("a").with(Relation::Requires, [id("b")]),
            record("b"),
        ]);
        let (g, _) = build_graph(&cat, &selection(&["a", "b"]));
        let b = g.find(&id("b")).unwrap();
        assert_eq!(g.node(b).activation, Activation::Explicit);
    }

    #[test]
    fn missing_requirement_adds_no_edge() {
        let cat = catalog(vec![record("a").with(Relation::Requires, [id("z")])]);
        let (g, findings) = build_graph(&cat, &selection(&["a"]));
        assert_eq!(g.len(), 1);
        assert_eq!(g.edge_count(), 0);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].cause, Some(MissingCause::NotInCatalog));
        assert_eq!(findings[0].identities, vec![id("a"), id("z")]);
    }

    #[test]
    fn contradictory_requirement_is_skipped() {
        let cat = catalog(vec![
            record("a")
                .with(Relation::Requires, [id("b")])
                .with(Relation::IncompatibleWith, [id("b")]),
            record("b"),
        ]);
        let (g, findings) = build_graph(&cat, &selection(&["a"]));
        assert_eq!(g.len(), 1, "contradictory target must not be pulled in");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, FindingKind::MissingDependency);
        assert_eq!(findings[0].cause, Some(MissingCause::Contradictory));
    }

    #[test]
    fn incompatible_pair_is_recorded_once() {
        let cat = catalog(vec![
            record("a").with(Relation::IncompatibleWith, [id("b")]),
            record("b").with(Relation::IncompatibleWith, [id("a")]),
        ]);
        let (g, findings) = build_graph(&cat, &selection(&["b", "a"]));
        assert_eq!(g.len(), 2);
        assert_eq!(g.forbidden().len(), 1);
        assert_eq!(g.edge_count(), 0);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, FindingKind::Incompatible);
        assert_eq!(findings[0].identities, vec![id("a"), id("b")]);
    }

    #[test]
    fn load_first_sets_tiers_without_edges() {
        let cat = catalog(vec![record("a"), record("core"), record("dlc")]);
        let (g, _) = GraphBuilder::new(&cat)
            .load_first([id("core"), id("dlc"), id("core")])
            .build(&selection(&["a", "dlc", "core"]));
        assert_eq!(g.edge_count(), 0);
        assert_eq!(g.node(g.find(&id("core")).unwrap()).tier, 0);
        assert_eq!(g.node(g.find(&id("dlc")).unwrap()).tier, 1);
        assert_eq!(g.node(g.find(&id("a")).unwrap()).tier, DEFAULT_TIER);
    }
}
