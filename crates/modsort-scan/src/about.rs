//! `About/About.xml` parsing: identity, display name, and relation lists.

use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;

use modsort_core::{ModId, ModRecord, Relation};
use modsort_util::errors::ModsortError;

/// The parts of a mod descriptor that matter for load ordering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AboutXml {
    pub package_id: Option<String>,
    /// Pre-1.0 descriptors used `identifier` instead of `packageId`.
    pub identifier: Option<String>,
    pub name: Option<String>,
    pub mod_dependencies: Vec<String>,
    pub load_before: Vec<String>,
    pub load_after: Vec<String>,
    pub incompatible_with: Vec<String>,
}

impl AboutXml {
    /// The declared identity, falling back to `identifier`.
    pub fn declared_id(&self) -> Option<&str> {
        self.package_id
            .as_deref()
            .or(self.identifier.as_deref())
            .filter(|s| !s.trim().is_empty())
    }

    /// Turn the descriptor of the mod folder at `folder` into a record.
    ///
    /// Without a declared identity the folder name is used as
    /// `unknown.<folder>`. Entries that are not valid identities are skipped.
    pub fn into_record(self, folder: &Path) -> Option<ModRecord> {
        let folder_name = folder
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let id = match self.declared_id() {
            Some(declared) => ModId::parse(declared)?,
            None => ModId::parse(&format!(
                "unknown.{}",
                folder_name.to_lowercase().replace(' ', "_")
            ))?,
        };
        let name = self
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(folder_name);

        Some(
            ModRecord::new(id, name, folder)
                .with(Relation::Requires, to_ids(self.mod_dependencies))
                .with(Relation::LoadBefore, to_ids(self.load_before))
                .with(Relation::LoadAfter, to_ids(self.load_after))
                .with(Relation::IncompatibleWith, to_ids(self.incompatible_with)),
        )
    }

    fn list_mut(&mut self, tag: &str) -> Option<&mut Vec<String>> {
        match tag {
            "modDependencies" => Some(&mut self.mod_dependencies),
            "loadBefore" => Some(&mut self.load_before),
            "loadAfter" => Some(&mut self.load_after),
            "incompatibleWith" => Some(&mut self.incompatible_with),
            _ => None,
        }
    }
}

fn to_ids(raw: Vec<String>) -> impl Iterator<Item = ModId> {
    raw.into_iter().filter_map(|s| ModId::parse(&s))
}

/// Parse an `About.xml` document.
///
/// The root element name is not checked; mods in the wild use several
/// spellings of `ModMetaData`.
pub fn parse_about(xml: &str) -> miette::Result<AboutXml> {
    let content = sanitize(xml);
    let mut reader = Reader::from_str(&content);
    reader.config_mut().trim_text(true);

    let mut about = AboutXml::default();
    let mut path: Vec<String> = Vec::new();
    let mut text_buf = String::new();
    let mut saw_root = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let tag = String::from_utf8_lossy(e.name().as_ref()).to_string();
                path.push(tag);
                saw_root = true;
                text_buf.clear();
            }
            Ok(Event::Empty(_)) => saw_root = true,
            Ok(Event::Text(ref e)) => {
                text_buf = e.unescape().unwrap_or_default().trim().to_string();
            }
            Ok(Event::CData(ref e)) => {
                text_buf = String::from_utf8_lossy(e).trim().to_string();
            }
            Ok(Event::End(_)) => {
                let value = std::mem::take(&mut text_buf);
                match path.len() {
                    // <ModMetaData><packageId>
                    2 => match path[1].as_str() {
                        "packageId" => about.package_id = non_empty(value),
                        "identifier" => about.identifier = non_empty(value),
                        "name" => about.name = non_empty(value),
                        _ => {}
                    },
                    // <ModMetaData><loadAfter><li>
                    3 if path[2] == "li" && !value.is_empty() => {
                        if let Some(list) = about.list_mut(&path[1]) {
                            list.push(value);
                        }
                    }
                    // <ModMetaData><modDependencies><li><packageId>
                    4 if path[2] == "li" && path[3] == "packageId" && !value.is_empty() => {
                        if let Some(list) = about.list_mut(&path[1]) {
                            list.push(value);
                        }
                    }
                    _ => {}
                }
                path.pop();
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ModsortError::Scan {
                    message: format!(
                        "malformed About.xml at byte {}: {e}",
                        reader.error_position()
                    ),
                }
                .into());
            }
            _ => {}
        }
    }

    if !saw_root {
        return Err(ModsortError::Scan {
            message: "About.xml has no root element".to_string(),
        }
        .into());
    }
    if let Some(open) = path.last() {
        return Err(ModsortError::Scan {
            message: format!("About.xml ends inside <{open}>"),
        }
        .into());
    }

    Ok(about)
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Strip a byte-order mark and escape bare `&` characters, which hand-written
/// descriptors often contain.
fn sanitize(xml: &str) -> String {
    let xml = xml.strip_prefix('\u{feff}').unwrap_or(xml);
    let mut out = String::with_capacity(xml.len());
    let mut rest = xml;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        if starts_with_entity(tail) {
            out.push('&');
        } else {
            out.push_str("&amp;");
        }
        rest = &tail[1..];
    }
    out.push_str(rest);
    out
}

fn starts_with_entity(s: &str) -> bool {
    let Some(end) = s.find(';') else {
        return false;
    };
    let body = &s[1..end];
    match body {
        "amp" | "lt" | "gt" | "quot" | "apos" => true,
        _ => {
            if let Some(hex) = body.strip_prefix("#x") {
                !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit())
            } else if let Some(dec) = body.strip_prefix('#') {
                !dec.is_empty() && dec.chars().all(|c| c.is_ascii_digit())
            } else {
                false
            }
        }
    }
}
