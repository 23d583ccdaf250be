use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::id::ModId;

/// One kind of declared relation between two mods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    /// The target must be active and load first.
    Requires,
    /// This mod loads before the target, if the target is active.
    LoadBefore,
    /// This mod loads after the target, if the target is active.
    LoadAfter,
    /// The two mods must not be active together.
    IncompatibleWith,
}

impl Relation {
    pub const ALL: [Relation; 4] = [
        Relation::Requires,
        Relation::LoadBefore,
        Relation::LoadAfter,
        Relation::IncompatibleWith,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Relation::Requires => "requires",
            Relation::LoadBefore => "load_before",
            Relation::LoadAfter => "load_after",
            Relation::IncompatibleWith => "incompatible_with",
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a mod was installed from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModSource {
    /// Shipped with the game under its `Data/` folder.
    Game,
    /// Subscribed through the Steam Workshop.
    Workshop,
    #[default]
    Local,
}

impl ModSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModSource::Game => "game",
            ModSource::Workshop => "workshop",
            ModSource::Local => "local",
        }
    }
}

impl fmt::Display for ModSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata of one discovered mod directory.
///
/// Records are produced by a scanner and handed to the catalog, which owns
/// them from then on and only hands out shared references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModRecord {
    pub id: ModId,
    #[serde(default)]
    pub name: String,
    pub path: PathBuf,
    #[serde(default)]
    pub source: ModSource,
    #[serde(default)]
    pub requires: BTreeSet<ModId>,
    #[serde(default)]
    pub load_before: BTreeSet<ModId>,
    #[serde(default)]
    pub load_after: BTreeSet<ModId>,
    #[serde(default)]
    pub incompatible_with: BTreeSet<ModId>,
}

impl ModRecord {
    /// A record with no declared relations.
    pub fn new(id: ModId, name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            id,
            name: name.into(),
            path: path.into(),
            source: ModSource::Local,
            requires: BTreeSet::new(),
            load_before: BTreeSet::new(),
            load_after: BTreeSet::new(),
            incompatible_with: BTreeSet::new(),
        }
    }

    /// Add targets to one relation set.
    pub fn with(mut self, relation: Relation, targets: impl IntoIterator<Item = ModId>) -> Self {
        self.relation_mut(relation).extend(targets);
        self
    }

    pub fn with_source(mut self, source: ModSource) -> Self {
        self.source = source;
        self
    }

    /// Name for display, falling back to the identity.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            self.id.as_str()
        } else {
            &self.name
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The targets declared for `relation`.
    pub fn relation(&self, relation: Relation) -> &BTreeSet<ModId> {
        match relation {
            Relation::Requires => &self.requires,
            Relation::LoadBefore => &self.load_before,
            Relation::LoadAfter => &self.load_after,
            Relation::IncompatibleWith => &self.incompatible_with,
        }
    }

    pub fn relation_mut(&mut self, relation: Relation) -> &mut BTreeSet<ModId> {
        match relation {
            Relation::Requires => &mut self.requires,
            Relation::LoadBefore => &mut self.load_before,
            Relation::LoadAfter => &mut self.load_after,
            Relation::IncompatibleWith => &mut self.incompatible_with,
        }
    }
}

impl fmt::Display for ModRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.display_name(), self.id)
    }
}
