//! Deterministic topological sort of the constraint graph.
//!
//! Kahn's algorithm where the ready set is ordered by `(tier, identity key)`,
//! so the output never depends on insertion or hash order. When nodes are left
//! over, the shortest cycle through the lowest-identity node that lies on a
//! cycle is reported instead of any partial order.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::fmt;

use miette::Diagnostic;
use petgraph::graph::NodeIndex;
use serde::Serialize;
use thiserror::Error;

use modsort_core::{Finding, ModId};

use crate::graph::{Activation, ConstraintGraph};

/// One position in the resolved load order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedEntry {
    pub id: ModId,
    pub activation: Activation,
}

/// A total order of the active mods that satisfies every ordering edge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolvedOrder {
    pub entries: Vec<ResolvedEntry>,
}

impl ResolvedOrder {
    pub fn ids(&self) -> impl Iterator<Item = &ModId> {
        self.entries.iter().map(|e| &e.id)
    }

    /// Position of `id` in the order.
    pub fn position(&self, id: &ModId) -> Option<usize> {
        self.entries.iter().position(|e| &e.id == id)
    }

    /// Entries that were only pulled in as requirements.
    pub fn implicit(&self) -> impl Iterator<Item = &ResolvedEntry> {
        self.entries
            .iter()
            .filter(|e| e.activation == Activation::Implicit)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for ResolvedOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, entry) in self.entries.iter().enumerate() {
            write!(f, "{:>4}. {}", i + 1, entry.id)?;
            if entry.activation == Activation::Implicit {
                write!(f, " (required)")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// The ordering constraints contain a cycle; no order exists.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
#[error("load order cycle: {}", chain(.cycle))]
#[diagnostic(
    code(modsort::cycle),
    help("drop one of the load_before, load_after or requires declarations on this loop")
)]
pub struct CycleFinding {
    /// Cycle members in edge order, starting at the lowest identity.
    pub cycle: Vec<ModId>,
}

impl CycleFinding {
    pub fn to_finding(&self) -> Finding {
        Finding::cycle(self.cycle.clone())
    }
}

fn chain(cycle: &[ModId]) -> String {
    let mut parts: Vec<&str> = cycle.iter().map(ModId::as_str).collect();
    if let Some(first) = cycle.first() {
        parts.push(first.as_str());
    }
    parts.join(" -> ")
}

/// Sort the graph. Ties go to the lowest `(tier, identity)`.
pub fn resolve(graph: &ConstraintGraph) -> Result<ResolvedOrder, CycleFinding> {
    let mut in_degree: HashMap<NodeIndex, usize> = HashMap::with_capacity(graph.len());
    let mut ready: BTreeMap<(usize, &str), NodeIndex> = BTreeMap::new();
    for (idx, node) in graph.nodes() {
        let degree = graph.in_degree(idx);
        in_degree.insert(idx, degree);
        if degree == 0 {
            ready.insert((node.tier, node.id.key()), idx);
        }
    }

    let mut entries = Vec::with_capacity(graph.len());
    while let Some((_, idx)) = ready.pop_first() {
        let node = graph.node(idx);
        entries.push(ResolvedEntry {
            id: node.id.clone(),
            activation: node.activation,
        });
        for next in graph.successors(idx) {
            let Some(degree) = in_degree.get_mut(&next) else {
                continue;
            };
            *degree -= 1;
            if *degree == 0 {
                let successor = graph.node(next);
                ready.insert((successor.tier, successor.id.key()), next);
            }
        }
    }

    if entries.len() == graph.len() {
        tracing::debug!("Resolved load order of {} mods", entries.len());
        return Ok(ResolvedOrder { entries });
    }

    let stuck: HashSet<NodeIndex> = in_degree
        .into_iter()
        .filter(|&(_, degree)| degree > 0)
        .map(|(idx, _)| idx)
        .collect();
    let cycle = find_cycle(graph, &stuck);
    tracing::debug!("Load order blocked by a cycle of {} mods", cycle.len());
    Err(CycleFinding { cycle })
}

/// Shortest cycle through the lowest-identity stuck node that lies on one.
///
/// Every stuck node is either on a cycle or downstream of one, so some start
/// node always succeeds.
fn find_cycle(graph: &ConstraintGraph, stuck: &HashSet<NodeIndex>) -> Vec<ModId> {
    let mut starts: Vec<NodeIndex> = stuck.iter().copied().collect();
    starts.sort_by(|a, b| graph.node(*a).id.cmp(&graph.node(*b).id));

    for &start in &starts {
        if let Some(path) = shortest_cycle_through(graph, stuck, start) {
            return path.into_iter().map(|idx| graph.node(idx).id.clone()).collect();
        }
    }
    starts.into_iter().map(|idx| graph.node(idx).id.clone()).collect()
}

fn shortest_cycle_through(
    graph: &ConstraintGraph,
    stuck: &HashSet<NodeIndex>,
    start: NodeIndex,
) -> Option<Vec<NodeIndex>> {
    let mut parent: HashMap<NodeIndex, NodeIndex> = HashMap::new();
    let mut queue = VecDeque::from([start]);

    while let Some(current) = queue.pop_front() {
        let mut next: Vec<NodeIndex> = graph
            .successors(current)
            .filter(|idx| stuck.contains(idx))
            .collect();
        next.sort_by(|a, b| graph.node(*a).id.cmp(&graph.node(*b).id));

        for successor in next {
            if successor == start {
                let mut path = vec![current];
                let mut cursor = current;
                while cursor != start {
                    cursor = parent[&cursor];
                    path.push(cursor);
                }
                path.reverse();
                return Some(path);
            }
            if !parent.contains_key(&successor) {
                parent.insert(successor, current);
                queue.push_back(successor);
            }
        }
    }
    None
}
