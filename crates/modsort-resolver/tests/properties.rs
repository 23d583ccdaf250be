use std::path::PathBuf;

use modsort_core::{ActiveSelection, FindingKind, MissingCause, ModId, ModRecord, Relation};
use modsort_resolver::{resolve_selection, Activation, Catalog, ResolveOptions};

fn id(s: &str) -> ModId {
    ModId::parse(s).unwrap()
}

fn ids(list: &[&str]) -> Vec<ModId> {
    list.iter().map(|s| id(s)).collect()
}

fn record(s: &str) -> ModRecord {
    ModRecord::new(id(s), s.to_uppercase(), format!("/mods/{s}"))
}

fn selection(list: &[&str]) -> ActiveSelection {
    ActiveSelection::from_strings(list.iter().copied())
}

fn order_of(catalog: &Catalog, list: &[&str]) -> Vec<String> {
    let res = resolve_selection(catalog, &selection(list), &ResolveOptions::default());
    res.order
        .unwrap()
        .ids()
        .map(|i| i.as_str().to_string())
        .collect()
}

#[test]
fn resolution_is_deterministic_across_selection_order() {
    let (catalog, _) = Catalog::from_records([
        record("a").with(Relation::LoadAfter, ids(&["c"])),
        record("b"),
        record("c"),
        record("d").with(Relation::LoadBefore, ids(&["b"])),
    ]);
    let first = order_of(&catalog, &["a", "b", "c", "d"]);
    let second = order_of(&catalog, &["d", "c", "b", "a"]);
    assert_eq!(first, second);
    assert_eq!(first, vec!["c", "a", "d", "b"]);
}

#[test]
fn unconstrained_mods_come_out_alphabetical() {
    let (catalog, _) = Catalog::from_records([record("zeta"), record("Alpha"), record("mid")]);
    assert_eq!(order_of(&catalog, &["zeta", "mid", "alpha"]), vec!["Alpha", "mid", "zeta"]);
}

#[test]
fn resolving_a_resolved_order_is_idempotent() {
    let (catalog, _) = Catalog::from_records([
        record("a").with(Relation::Requires, ids(&["b"])),
        record("b"),
        record("c").with(Relation::LoadBefore, ids(&["a"])),
    ]);
    let once = order_of(&catalog, &["a", "c"]);
    let refs: Vec<&str> = once.iter().map(String::as_str).collect();
    let twice = order_of(&catalog, &refs);
    assert_eq!(once, twice);
}

#[test]
fn duplicate_identity_keeps_first_and_names_both_paths() {
    let (catalog, findings) = Catalog::from_records([
        ModRecord::new(id("core.alpha"), "Alpha", "/data/alpha"),
        ModRecord::new(id("core.alpha"), "Alpha copy", "/mods/alpha"),
    ]);
    assert_eq!(catalog.len(), 1);
    assert_eq!(catalog.get(&id("core.alpha")).unwrap().name, "Alpha");
    assert_eq!(findings.len(), 1);
    assert_eq!(
        findings[0].paths,
        vec![PathBuf::from("/data/alpha"), PathBuf::from("/mods/alpha")]
    );
}

#[test]
fn each_repeated_selection_entry_is_reported() {
    let (catalog, _) = Catalog::from_records([record("a")]);
    let res = resolve_selection(&catalog, &selection(&["a", "a", "A"]), &ResolveOptions::default());
    let duplicates: Vec<_> = res
        .findings
        .iter()
        .filter(|f| f.kind == FindingKind::DuplicateIdentity)
        .collect();
    assert_eq!(duplicates.len(), 2);
    assert_eq!(res.order.unwrap().len(), 1);
}

#[test]
fn cycle_yields_no_order() {
    let (catalog, _) = Catalog::from_records([
        record("a").with(Relation::LoadBefore, ids(&["b"])),
        record("b").with(Relation::LoadBefore, ids(&["a"])),
    ]);
    let res = resolve_selection(&catalog, &selection(&["b", "a"]), &ResolveOptions::default());
    let cycle = res.order.as_ref().unwrap_err();
    assert_eq!(cycle.cycle, ids(&["a", "b"]));
    assert!(res.has_errors());
    assert!(res.findings.iter().any(|f| f.kind == FindingKind::Cycle));
}

#[test]
fn missing_dependency_still_produces_an_order() {
    let (catalog, _) = Catalog::from_records([record("a").with(Relation::Requires, ids(&["z"]))]);
    let res = resolve_selection(&catalog, &selection(&["a"]), &ResolveOptions::default());
    assert_eq!(res.findings.len(), 1);
    let finding = &res.findings[0];
    assert_eq!(finding.kind, FindingKind::MissingDependency);
    assert_eq!(finding.cause, Some(MissingCause::NotInCatalog));
    assert!(finding.identities.contains(&id("z")));
    let order = res.order.unwrap();
    assert_eq!(order.ids().cloned().collect::<Vec<_>>(), ids(&["a"]));
}

#[test]
fn incompatible_mods_both_stay_in_the_order() {
    let (catalog, _) = Catalog::from_records([
        record("a").with(Relation::IncompatibleWith, ids(&["b"])),
        record("b").with(Relation::IncompatibleWith, ids(&["a"])),
    ]);
    let res = resolve_selection(&catalog, &selection(&["a", "b"]), &ResolveOptions::default());
    let incompatible: Vec<_> = res
        .findings
        .iter()
        .filter(|f| f.kind == FindingKind::Incompatible)
        .collect();
    assert_eq!(incompatible.len(), 1);
    assert_eq!(incompatible[0].identities, ids(&["a", "b"]));
    assert_eq!(res.order.unwrap().len(), 2);
}

#[test]
fn required_mod_is_pulled_in_and_loads_first() {
    let (catalog, _) = Catalog::from_records([
        record("a").with(Relation::Requires, ids(&["b"])),
        record("b"),
    ]);
    let res = resolve_selection(&catalog, &selection(&["a"]), &ResolveOptions::default());
    assert!(res.findings.is_empty());
    let order = res.order.unwrap();
    assert_eq!(order.ids().cloned().collect::<Vec<_>>(), ids(&["b", "a"]));
    assert_eq!(order.entries[0].activation, Activation::Implicit);
    assert_eq!(order.entries[1].activation, Activation::Explicit);
}

#[test]
fn load_first_list_only_breaks_ties() {
    let (catalog, _) = Catalog::from_records([
        record("ludeon.rimworld"),
        record("brrainz.harmony").with(Relation::LoadBefore, ids(&["ludeon.rimworld"])),
        record("aaa.mod"),
    ]);
    let options = ResolveOptions {
        load_first: ids(&["brrainz.harmony", "ludeon.rimworld"]),
    };
    let res = resolve_selection(
        &catalog,
        &selection(&["aaa.mod", "ludeon.rimworld", "brrainz.harmony"]),
        &options,
    );
    let order: Vec<String> = res
        .order
        .unwrap()
        .ids()
        .map(|i| i.as_str().to_string())
        .collect();
    assert_eq!(order, vec!["brrainz.harmony", "ludeon.rimworld", "aaa.mod"]);
}

#[test]
fn findings_serialize_with_snake_case_kinds() {
    let (catalog, _) = Catalog::from_records([record("a").with(Relation::Requires, ids(&["z"]))]);
    let res = resolve_selection(&catalog, &selection(&["a"]), &ResolveOptions::default());
    let json = serde_json::to_value(&res.findings).unwrap();
    assert_eq!(json[0]["kind"], "missing_dependency");
    assert_eq!(json[0]["severity"], "error");
    assert_eq!(json[0]["cause"], "not_in_catalog");
    assert!(json[0].get("paths").is_none());
}
