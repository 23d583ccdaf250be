//! The catalog of discovered mods, keyed by identity.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use modsort_core::{Finding, ModId, ModRecord, Relation};

/// Discovers mod records inside one source directory.
///
/// Malformed descriptors are the scanner's problem: they are simply absent
/// from the returned list.
pub trait Scanner {
    fn scan(&self, dir: &Path) -> Vec<ModRecord>;
}

/// An identity that was discovered under more than one source path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateIdentity {
    pub id: ModId,
    /// Every conflicting path; the canonical one comes first.
    pub paths: Vec<PathBuf>,
}

/// Identity to record mapping, first-discovered wins.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    records: Vec<ModRecord>,
    index: HashMap<ModId, usize>,
    duplicates: Vec<DuplicateIdentity>,
}

impl Catalog {
    /// Scan `dirs` in order and build a catalog from everything found.
    pub fn build<S: Scanner + ?Sized>(dirs: &[PathBuf], scanner: &S) -> (Self, Vec<Finding>) {
        let candidates = dirs.iter().flat_map(|dir| {
            let found = scanner.scan(dir);
            tracing::debug!("Found {} mods in {}", found.len(), dir.display());
            found
        });
        Self::from_records(candidates)
    }

    /// Build a catalog from already-scanned candidates, in discovery order.
    ///
    /// Self-referencing relation entries are dropped and reported. An identity
    /// seen again under a different path is reported once, naming every path;
    /// the first record stays canonical.
    pub fn from_records(candidates: impl IntoIterator<Item = ModRecord>) -> (Self, Vec<Finding>) {
        let mut catalog = Catalog::default();
        let mut findings = Vec::new();
        let mut duplicate_paths: BTreeMap<ModId, Vec<PathBuf>> = BTreeMap::new();

        for mut record in candidates {
            if let Some(&slot) = catalog.index.get(&record.id) {
                let canonical = &catalog.records[slot];
                if canonical.path == record.path {
                    continue;
                }
                let paths = duplicate_paths
                    .entry(canonical.id.clone())
                    .or_insert_with(|| vec![canonical.path.clone()]);
                if !paths.contains(&record.path) {
                    paths.push(record.path);
                }
                continue;
            }

            let id = record.id.clone();
            for relation in Relation::ALL {
                if record.relation_mut(relation).remove(&id) {
                    findings.push(Finding::self_reference(id.clone(), relation));
                }
            }
            catalog.index.insert(id, catalog.records.len());
            catalog.records.push(record);
        }

        for (id, paths) in duplicate_paths {
            tracing::warn!("{id} found in {} source paths", paths.len());
            findings.push(Finding::duplicate_identity(id.clone(), paths.clone()));
            catalog.duplicates.push(DuplicateIdentity { id, paths });
        }

        (catalog, findings)
    }

    /// Look up the canonical record for an identity (case-insensitive).
    pub fn get(&self, id: &ModId) -> Option<&ModRecord> {
        self.index.get(id).map(|&slot| &self.records[slot])
    }

    pub fn contains(&self, id: &ModId) -> bool {
        self.index.contains_key(id)
    }

    /// Canonical records in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = &ModRecord> {
        self.records.iter()
    }

    pub fn duplicates(&self) -> &[DuplicateIdentity] {
        &self.duplicates
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
