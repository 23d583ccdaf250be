//! Saved selections: the ordered list of active mod identities.
//!
//! Formats understood on load:
//!
//! - `.json` modlists: an object holding the list under one of several
//!   manager-specific keys (`active_mods`, `mods`, `package_ids`, ...), or a
//!   bare array. Entries are strings or objects carrying a `packageId`.
//! - `.xml` game configs: `<ModsConfigData><activeMods><li>...</li></activeMods>`
//! - other `.xml` modlists (`<ModList>`, `<RimPyModList>`, ...) holding
//!   `<mod>`, `<li>`, `<item>` or `<entry>` elements
//! - anything else: plain text, one identity per line, `#` starts a comment
//!
//! Steam Workshop ids cannot be mapped to identities offline. They are skipped
//! with a warning, and a list holding nothing else is rejected.
//!
//! Saving writes a JSON modlist for `.json` paths and plain text otherwise.

use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use modsort_util::errors::ModsortError;

use crate::id::ModId;

/// An ordered request of mods to activate, in the user's current order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveSelection {
    ids: Vec<ModId>,
}

impl ActiveSelection {
    pub fn new(ids: Vec<ModId>) -> Self {
        Self { ids }
    }

    pub fn ids(&self) -> &[ModId] {
        &self.ids
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ModId> {
        self.ids.iter()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Parse raw strings, silently skipping blank entries.
    pub fn from_strings<S: AsRef<str>>(raw: impl IntoIterator<Item = S>) -> Self {
        raw.into_iter().filter_map(|s| ModId::parse(s.as_ref())).collect()
    }
}

impl FromIterator<ModId> for ActiveSelection {
    fn from_iter<I: IntoIterator<Item = ModId>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ActiveSelection {
    type Item = &'a ModId;
    type IntoIter = std::slice::Iter<'a, ModId>;

    fn into_iter(self) -> Self::IntoIter {
        self.ids.iter()
    }
}

/// A named modlist as saved by the manager.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Modlist {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub mod_ids: Vec<String>,
    #[serde(default)]
    pub active_mods: Vec<String>,
}

/// Object keys that hold the mod list in manager-written JSON, in lookup order.
const MODLIST_KEYS: &[&str] = &[
    "active_mods",
    "mods",
    "activeMods",
    "mod_list",
    "modList",
    "package_ids",
    "modlist",
    "mod_ids",
];

/// Keys naming the identity inside an object entry.
const PACKAGE_ID_KEYS: &[&str] = &["packageId", "package_id", "id"];

/// Keys naming the Steam Workshop id inside an object entry.
const WORKSHOP_ID_KEYS: &[&str] = &["workshopId", "workshop_id", "steamId"];

/// Element names that hold one entry in an XML modlist, compared case-insensitively.
const XML_ENTRY_TAGS: &[&str] = &["mod", "li", "item", "entry"];

/// On-disk format of a saved selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionFormat {
    Modlist,
    ModsConfig,
    XmlModlist,
    PlainText,
}

impl SelectionFormat {
    /// Pick the format from the file extension. Every `.xml` path is taken
    /// as `ModsConfig.xml`; see [`SelectionFormat::sniff`].
    pub fn detect(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("json") => SelectionFormat::Modlist,
            Some("xml") => SelectionFormat::ModsConfig,
            _ => SelectionFormat::PlainText,
        }
    }

    /// Like [`SelectionFormat::detect`], but an `.xml` document whose root is
    /// not `ModsConfigData` is an XML modlist.
    pub fn sniff(path: &Path, content: &str) -> Self {
        match Self::detect(path) {
            SelectionFormat::ModsConfig if xml_root(content).as_deref() != Some("ModsConfigData") => {
                SelectionFormat::XmlModlist
            }
            format => format,
        }
    }
}

/// Load a saved selection from disk.
pub fn load(path: &Path) -> miette::Result<ActiveSelection> {
    let content = std::fs::read_to_string(path).map_err(|e| ModsortError::Selection {
        message: format!("Failed to read {}: {e}", path.display()),
    })?;
    let format = SelectionFormat::sniff(path, &content);
    let raw = match format {
        SelectionFormat::Modlist => parse_modlist(&content)?,
        SelectionFormat::ModsConfig => parse_mods_config(&content)?,
        SelectionFormat::XmlModlist => parse_xml_modlist(&content)?,
        SelectionFormat::PlainText => parse_plain_text(&content),
    };

    let (workshop, package): (Vec<String>, Vec<String>) =
        raw.into_iter().partition(|s| workshop_id(s).is_some());
    if !workshop.is_empty() {
        tracing::warn!(
            "Skipping {} Steam Workshop ids in {}; only package ids can be resolved",
            workshop.len(),
            path.display()
        );
    }

    let selection = ActiveSelection::from_strings(&package);
    if selection.is_empty() && !workshop.is_empty() {
        return Err(ModsortError::Selection {
            message: format!(
                "{} holds only Steam Workshop ids ({}); list package ids instead",
                path.display(),
                workshop.len()
            ),
        }
        .into());
    }
    if selection.is_empty() && format != SelectionFormat::ModsConfig {
        return Err(ModsortError::Selection {
            message: format!("No mods found in {}", path.display()),
        }
        .into());
    }
    tracing::debug!(
        "Loaded {} selected mods from {}",
        selection.len(),
        path.display()
    );
    Ok(selection)
}

/// The numeric Steam Workshop id carried by `entry`, if it is one: a bare id
/// of seven or more digits, or a workshop URL with an `id=` parameter.
pub fn workshop_id(entry: &str) -> Option<&str> {
    let entry = entry.trim();
    if entry.len() >= 7 && entry.bytes().all(|b| b.is_ascii_digit()) {
        return Some(entry);
    }
    if !entry.contains("steamcommunity.com") {
        return None;
    }
    let (_, rest) = entry.split_once("id=")?;
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    (end > 0).then(|| &rest[..end])
}

/// Parse a JSON modlist: a bare array, or an object holding the list under
/// the first of [`MODLIST_KEYS`] with a non-empty array.
pub fn parse_modlist(json: &str) -> miette::Result<Vec<String>> {
    let value: Value = serde_json::from_str(json).map_err(|e| ModsortError::Selection {
        message: format!("Invalid modlist JSON: {e}"),
    })?;
    let entries = match &value {
        Value::Array(entries) => Some(entries),
        Value::Object(map) => MODLIST_KEYS
            .iter()
            .filter_map(|key| map.get(*key).and_then(Value::as_array))
            .find(|entries| !entries.is_empty()),
        _ => None,
    };
    let Some(entries) = entries else {
        return Err(ModsortError::Selection {
            message: format!(
                "Modlist JSON has no mod list; expected an array or one of: {}",
                MODLIST_KEYS.join(", ")
            ),
        }
        .into());
    };
    Ok(entries.iter().filter_map(modlist_entry).collect())
}

fn modlist_entry(entry: &Value) -> Option<String> {
    match entry {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(map) => {
            let field = |keys: &[&str]| {
                keys.iter().find_map(|key| match map.get(*key)? {
                    Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
            };
            field(PACKAGE_ID_KEYS).or_else(|| field(WORKSHOP_ID_KEYS))
        }
        _ => None,
    }
}

/// Name of the root element of an XML document.
fn xml_root(xml: &str) -> Option<String> {
    let mut reader = Reader::from_str(xml.trim_start_matches('\u{feff}'));
    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                return Some(String::from_utf8_lossy(e.name().as_ref()).to_string())
            }
            Ok(Event::Eof) | Err(_) => return None,
            _ => {}
        }
    }
}

/// Parse the `<activeMods>` list of a game `ModsConfig.xml`.
pub fn parse_mods_config(xml: &str) -> miette::Result<Vec<String>> {
    let mut reader = Reader::from_str(xml.trim_start_matches('\u{feff}'));
    reader.config_mut().trim_text(true);

    let mut path: Vec<String> = Vec::new();
    let mut saw_active = false;
    let mut ids = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let tag = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if tag == "activeMods" && path.len() == 1 {
                    saw_active = true;
                }
                path.push(tag);
            }
            Ok(Event::Empty(ref e)) => {
                if e.name().as_ref() == b"activeMods" && path.len() == 1 {
                    saw_active = true;
                }
            }
            Ok(Event::Text(ref e)) => {
                let in_active_li = path.len() == 3 && path[1] == "activeMods" && path[2] == "li";
                if in_active_li {
                    let text = e.unescape().map_err(|err| ModsortError::Selection {
                        message: format!("Invalid ModsConfig.xml: {err}"),
                    })?;
                    ids.push(text.trim().to_string());
                }
            }
            Ok(Event::End(_)) => {
                path.pop();
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ModsortError::Selection {
                    message: format!(
                        "Invalid ModsConfig.xml at position {}: {e}",
                        reader.error_position()
                    ),
                }
                .into())
            }
            _ => {}
        }
    }

    if !saw_active {
        return Err(ModsortError::Selection {
            message: "No activeMods section found in ModsConfig.xml".to_string(),
        }
        .into());
    }
    Ok(ids)
}

/// The outermost entry element of an XML modlist while it is open.
#[derive(Default)]
struct XmlEntry {
    depth: usize,
    package_id: Option<String>,
    workshop_id: Option<String>,
    text: Option<String>,
}

impl XmlEntry {
    fn from_attributes(depth: usize, e: &BytesStart<'_>) -> Self {
        let mut entry = XmlEntry {
            depth,
            ..Default::default()
        };
        for attr in e.attributes().flatten() {
            let Ok(value) = attr.unescape_value() else {
                continue;
            };
            let value = value.trim().to_string();
            if value.is_empty() {
                continue;
            }
            match attr.key.as_ref() {
                b"packageId" | b"id" => entry.package_id = Some(value),
                b"workshopId" | b"steamId" => entry.workshop_id = Some(value),
                _ => {}
            }
        }
        entry
    }

    fn into_id(self) -> Option<String> {
        let text = self.text.filter(|t| !t.is_empty());
        self.package_id
            .or_else(|| text.clone().filter(|t| t.contains('.')))
            .or(self.workshop_id)
            .or_else(|| text.filter(|t| t.bytes().all(|b| b.is_ascii_digit())))
    }
}

fn is_entry_tag(tag: &str) -> bool {
    XML_ENTRY_TAGS.iter().any(|t| t.eq_ignore_ascii_case(tag))
}

/// Parse an XML modlist written by another manager.
///
/// Each `<mod>`, `<li>`, `<item>` or `<entry>` element yields one identity,
/// taken from a `packageId`/`id` attribute, a `packageId` child, or its text
/// when that looks like an identity. Workshop ids are kept as a fallback.
pub fn parse_xml_modlist(xml: &str) -> miette::Result<Vec<String>> {
    let mut reader = Reader::from_str(xml.trim_start_matches('\u{feff}'));
    reader.config_mut().trim_text(true);

    let mut path: Vec<String> = Vec::new();
    let mut open: Option<XmlEntry> = None;
    let mut ids = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let tag = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if open.is_none() && is_entry_tag(&tag) {
                    open = Some(XmlEntry::from_attributes(path.len(), e));
                }
                path.push(tag);
            }
            Ok(Event::Empty(ref e)) => {
                let tag = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if open.is_none() && is_entry_tag(&tag) {
                    if let Some(id) = XmlEntry::from_attributes(path.len(), e).into_id() {
                        ids.push(id);
                    }
                }
            }
            Ok(Event::Text(ref e)) => {
                let text = e.unescape().map_err(|err| ModsortError::Selection {
                    message: format!("Invalid XML modlist: {err}"),
                })?;
                let text = text.trim().to_string();
                let Some(entry) = open.as_mut() else {
                    continue;
                };
                if path.len() == entry.depth + 1 {
                    entry.text = Some(text);
                } else if path.len() == entry.depth + 2 {
                    match path[entry.depth + 1].to_ascii_lowercase().as_str() {
                        "packageid" | "package_id" | "id" => entry.package_id = Some(text),
                        "workshopid" | "workshop_id" | "steamid" | "publishedfileid" => {
                            entry.workshop_id = Some(text)
                        }
                        _ => {}
                    }
                }
            }
            Ok(Event::End(_)) => {
                path.pop();
                if open.as_ref().is_some_and(|entry| entry.depth == path.len()) {
                    if let Some(id) = open.take().and_then(XmlEntry::into_id) {
                        ids.push(id);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ModsortError::Selection {
                    message: format!(
                        "Invalid XML modlist at position {}: {e}",
                        reader.error_position()
                    ),
                }
                .into())
            }
            _ => {}
        }
    }

    if ids.is_empty() {
        return Err(ModsortError::Selection {
            message: "No mod entries found in XML modlist".to_string(),
        }
        .into());
    }
    Ok(ids)
}

/// Parse a plain text list: one identity per line, `#` or `//` comments.
pub fn parse_plain_text(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| {
            let line = line.split('#').next().unwrap_or("");
            if line.trim_start().starts_with("//") {
                ""
            } else {
                line.trim()
            }
        })
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Persist an ordered list of identities.
pub fn save(path: &Path, name: &str, ids: &[ModId]) -> miette::Result<()> {
    let contents = match SelectionFormat::detect(path) {
        SelectionFormat::Modlist => {
            let strings: Vec<String> = ids.iter().map(ToString::to_string).collect();
            let list = Modlist {
                name: name.to_string(),
                mod_ids: strings.clone(),
                active_mods: strings,
            };
            let mut json =
                serde_json::to_string_pretty(&list).map_err(|e| ModsortError::Selection {
                    message: format!("Failed to serialize modlist: {e}"),
                })?;
            json.push('\n');
            json
        }
        SelectionFormat::ModsConfig | SelectionFormat::XmlModlist => {
            return Err(ModsortError::Selection {
                message: format!(
                    "Refusing to write {}: ModsConfig.xml is owned by the game, save to a .json or .txt modlist instead",
                    path.display()
                ),
            }
            .into())
        }
        SelectionFormat::PlainText => {
            let mut text = String::new();
            for id in ids {
                text.push_str(id.as_str());
                text.push('\n');
            }
            text
        }
    };
    modsort_util::fs::write_atomic(path, contents.as_bytes()).map_err(|e| {
        ModsortError::Selection {
            message: format!("Failed to write {}: {e}", path.display()),
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_by_extension() {
        assert_eq!(
            SelectionFormat::detect(Path::new("list.JSON")),
            SelectionFormat::Modlist
        );
        assert_eq!(
            SelectionFormat::detect(Path::new("ModsConfig.xml")),
            SelectionFormat::ModsConfig
        );
        assert_eq!(
            SelectionFormat::detect(Path::new("order")),
            SelectionFormat::PlainText
        );
    }

    #[test]
    fn plain_text_skips_comments_and_blanks() {
        let text = "# my list\nludeon.rimworld\n\n  brrainz.harmony  # needed\n// old\n";
        assert_eq!(
            parse_plain_text(text),
            vec!["ludeon.rimworld", "brrainz.harmony"]
        );
    }

    #[test]
    fn modlist_prefers_active_mods() {
        let json = r#"{"name": "x", "mod_ids": ["a", "b"], "active_mods": ["b"]}"#;
        assert_eq!(parse_modlist(json).unwrap(), vec!["b"]);
        let json = r#"{"name": "x", "mod_ids": ["a", "b"]}"#;
        assert_eq!(parse_modlist(json).unwrap(), vec!["a", "b"]);
        assert_eq!(parse_modlist(r#"["c"]"#).unwrap(), vec!["c"]);
    }

    #[test]
    fn modlist_reads_other_manager_keys() {
        let json = r#"{"name": "rimsort", "mods": ["brrainz.harmony", "ludeon.rimworld"]}"#;
        assert_eq!(
            parse_modlist(json).unwrap(),
            vec!["brrainz.harmony", "ludeon.rimworld"]
        );
        assert_eq!(
            parse_modlist(r#"{"package_ids": ["a.b"]}"#).unwrap(),
            vec!["a.b"]
        );
        assert_eq!(parse_modlist(r#"{"activeMods": ["c.d"]}"#).unwrap(), vec!["c.d"]);
        assert_eq!(parse_modlist(r#"{"mod_list": ["e.f"]}"#).unwrap(), vec!["e.f"]);
        assert_eq!(parse_modlist(r#"{"modList": ["g.h"]}"#).unwrap(), vec!["g.h"]);
        assert_eq!(parse_modlist(r#"{"modlist": ["i.j"]}"#).unwrap(), vec!["i.j"]);
    }

    #[test]
    fn modlist_skips_empty_keys() {
        let json = r#"{"active_mods": [], "mods": ["a.b"]}"#;
        assert_eq!(parse_modlist(json).unwrap(), vec!["a.b"]);
    }

    #[test]
    fn modlist_object_entries() {
        let json = r#"{"mods": [
            {"packageId": "brrainz.harmony", "name": "Harmony"},
            {"package_id": "a.b"},
            {"id": "c.d"},
            {"workshopId": "2009463077"},
            {"name": "nothing useful"}
        ]}"#;
        assert_eq!(
            parse_modlist(json).unwrap(),
            vec!["brrainz.harmony", "a.b", "c.d", "2009463077"]
        );
    }

    #[test]
    fn modlist_without_list_is_an_error() {
        let err = parse_modlist(r#"{"name": "x", "author": "me"}"#).unwrap_err();
        assert!(err.to_string().contains("Selection error"));
        assert!(parse_modlist(r#"{"mods": []}"#).is_err());
        assert!(parse_modlist(r#""ludeon.rimworld""#).is_err());
    }

    #[test]
    fn mods_config_reads_active_mods_only() {
        let xml = r#"<?xml version="1.0" encoding="utf-8"?>
<ModsConfigData>
  <version>1.5.4104 rev435</version>
  <activeMods>
    <li>brrainz.harmony</li>
    <li>ludeon.rimworld</li>
  </activeMods>
  <knownExpansions>
    <li>ludeon.rimworld.royalty</li>
  </knownExpansions>
</ModsConfigData>"#;
        assert_eq!(
            parse_mods_config(xml).unwrap(),
            vec!["brrainz.harmony", "ludeon.rimworld"]
        );
    }

    #[test]
    fn mods_config_without_active_mods_is_an_error() {
        let xml = "<ModsConfigData><version>1.5</version></ModsConfigData>";
        assert!(parse_mods_config(xml).is_err());
    }

    #[test]
    fn sniff_tells_mods_config_from_xml_modlist() {
        let path = Path::new("list.xml");
        assert_eq!(
            SelectionFormat::sniff(path, "<?xml version=\"1.0\"?><ModsConfigData/>"),
            SelectionFormat::ModsConfig
        );
        assert_eq!(
            SelectionFormat::sniff(path, "\u{feff}<RimPyModList><mod/></RimPyModList>"),
            SelectionFormat::XmlModlist
        );
        assert_eq!(
            SelectionFormat::sniff(Path::new("list.txt"), "<ModList/>"),
            SelectionFormat::PlainText
        );
    }

    #[test]
    fn xml_modlist_reads_children_attributes_and_text() {
        let xml = r#"<?xml version="1.0" encoding="utf-8"?>
<RimPyModList>
  <mods>
    <mod>
      <packageId>brrainz.harmony</packageId>
      <name>Harmony</name>
    </mod>
    <mod packageId="Ludeon.RimWorld" />
    <Item>unlimitedhugs.hugslib</Item>
    <entry><workshopId>2009463077</workshopId></entry>
    <li>Not An Id</li>
  </mods>
</RimPyModList>"#;
        assert_eq!(
            parse_xml_modlist(xml).unwrap(),
            vec![
                "brrainz.harmony",
                "Ludeon.RimWorld",
                "unlimitedhugs.hugslib",
                "2009463077"
            ]
        );
    }

    #[test]
    fn xml_modlist_prefers_package_id_over_workshop_id() {
        let xml = r#"<ModList><mod workshopId="2009463077" id="brrainz.harmony"/>
            <mod><publishedFileId>818773962</publishedFileId><package_id>unlimitedhugs.hugslib</package_id></mod>
            </ModList>"#;
        assert_eq!(
            parse_xml_modlist(xml).unwrap(),
            vec!["brrainz.harmony", "unlimitedhugs.hugslib"]
        );
    }

    #[test]
    fn xml_modlist_without_entries_is_an_error() {
        let err = parse_xml_modlist("<ModList><name>x</name></ModList>").unwrap_err();
        assert!(err.to_string().contains("Selection error"));
    }

    #[test]
    fn workshop_ids_are_recognized() {
        assert_eq!(workshop_id("2009463077"), Some("2009463077"));
        assert_eq!(workshop_id(" 818773962 "), Some("818773962"));
        assert_eq!(
            workshop_id("https://steamcommunity.com/sharedfiles/filedetails/?id=2009463077&x=1"),
            Some("2009463077")
        );
        assert_eq!(workshop_id("123"), None);
        assert_eq!(workshop_id("brrainz.harmony"), None);
        assert_eq!(workshop_id("https://example.com/?id=2009463077"), None);
    }

    #[test]
    fn from_strings_drops_blanks() {
        let selection = ActiveSelection::from_strings(["a", " ", "B"]);
        assert_eq!(selection.len(), 2);
        assert_eq!(selection.ids()[1].as_str(), "B");
    }
}
