//! Diagnostic findings produced while building the catalog, building the
//! constraint graph, and sorting it.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::id::ModId;
use crate::record::Relation;

/// How serious a finding is. Errors sort before warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    DuplicateIdentity,
    MissingDependency,
    Incompatible,
    Cycle,
    SelfReference,
}

impl FindingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FindingKind::DuplicateIdentity => "duplicate_identity",
            FindingKind::MissingDependency => "missing_dependency",
            FindingKind::Incompatible => "incompatible",
            FindingKind::Cycle => "cycle",
            FindingKind::SelfReference => "self_reference",
        }
    }
}

impl fmt::Display for FindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a [`FindingKind::MissingDependency`] was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingCause {
    /// A required mod is not in the catalog.
    NotInCatalog,
    /// A selected mod is not in the catalog.
    UnknownSelection,
    /// A mod both requires and is incompatible with the same target.
    Contradictory,
}

/// A single diagnostic.
///
/// `identities` holds the mods involved, in a kind-specific order:
/// the dependent then the dependency for missing dependencies, the sorted
/// pair for incompatibilities, and the cycle order for cycles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub kind: FindingKind,
    pub severity: Severity,
    pub identities: Vec<ModId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub paths: Vec<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<MissingCause>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl Finding {
    fn new(kind: FindingKind, severity: Severity, identities: Vec<ModId>, detail: String) -> Self {
        Self {
            kind,
            severity,
            identities,
            paths: Vec::new(),
            cause: None,
            detail: Some(detail),
        }
    }

    /// The same identity was discovered under several source paths.
    /// `paths` lists the canonical (kept) path first.
    pub fn duplicate_identity(id: ModId, paths: Vec<PathBuf>) -> Self {
        let listed = paths
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        let detail = format!("{id} is provided by {} sources, keeping the first: {listed}", paths.len());
        Self {
            paths,
            ..Self::new(FindingKind::DuplicateIdentity, Severity::Warning, vec![id], detail)
        }
    }

    /// The same identity appears more than once in a requested selection.
    pub fn duplicate_selection(id: ModId) -> Self {
        let detail = format!("{id} is listed more than once in the selection, keeping the first");
        Self::new(FindingKind::DuplicateIdentity, Severity::Warning, vec![id], detail)
    }

    /// A record names itself in one of its relation sets.
    pub fn self_reference(id: ModId, relation: Relation) -> Self {
        let detail = format!("{id} names itself in {relation}; the entry was dropped");
        Self::new(FindingKind::SelfReference, Severity::Error, vec![id], detail)
    }

    /// `dependent` requires `missing`, which the catalog does not contain.
    pub fn missing_dependency(dependent: ModId, missing: ModId) -> Self {
        let detail = format!("{dependent} requires {missing}, which is not installed");
        Self {
            cause: Some(MissingCause::NotInCatalog),
            ..Self::new(
                FindingKind::MissingDependency,
                Severity::Error,
                vec![dependent, missing],
                detail,
            )
        }
    }

    /// A selected identity is not in the catalog.
    pub fn unknown_selection(id: ModId) -> Self {
        let detail = format!("{id} is selected but not installed");
        Self {
            cause: Some(MissingCause::UnknownSelection),
            ..Self::new(FindingKind::MissingDependency, Severity::Error, vec![id], detail)
        }
    }

    /// `dependent` declares `target` as both required and incompatible.
    pub fn contradictory(dependent: ModId, target: ModId) -> Self {
        let detail = format!(
            "{dependent} both requires and is incompatible with {target}; the requirement was skipped"
        );
        Self {
            cause: Some(MissingCause::Contradictory),
            ..Self::new(
                FindingKind::MissingDependency,
                Severity::Error,
                vec![dependent, target],
                detail,
            )
        }
    }

    /// Two active mods are incompatible. The pair is stored sorted.
    pub fn incompatible(a: ModId, b: ModId) -> Self {
        let (first, second) = if a <= b { (a, b) } else { (b, a) };
        let detail = format!("{first} and {second} are incompatible but both active");
        Self::new(
            FindingKind::Incompatible,
            Severity::Error,
            vec![first, second],
            detail,
        )
    }

    /// The ordering constraints form a cycle, listed in cycle order.
    pub fn cycle(members: Vec<ModId>) -> Self {
        let mut chain: Vec<String> = members.iter().map(ToString::to_string).collect();
        if let Some(first) = members.first() {
            chain.push(first.to_string());
        }
        let detail = format!("load order cycle: {}", chain.join(" -> "));
        Self::new(FindingKind::Cycle, Severity::Error, members, detail)
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]: ", self.severity, self.kind)?;
        match &self.detail {
            Some(detail) => f.write_str(detail),
            None => {
                let ids: Vec<&str> = self.identities.iter().map(ModId::as_str).collect();
                f.write_str(&ids.join(", "))
            }
        }
    }
}
