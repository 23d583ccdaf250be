#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use tempfile::TempDir;

/// A throwaway modsort home plus a mods directory to scan.
pub struct Fixture {
    pub tmp: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("home")).unwrap();
        fs::create_dir_all(tmp.path().join("mods")).unwrap();
        Self { tmp }
    }

    /// The standard set: Core, Harmony, HugsLib, and an unrelated mod.
    pub fn with_standard_mods() -> Self {
        let fx = Self::new();
        fx.add_mod("Core", "Ludeon.RimWorld", "");
        fx.add_mod(
            "Harmony",
            "brrainz.harmony",
            "<loadBefore><li>Ludeon.RimWorld</li></loadBefore>",
        );
        fx.add_mod(
            "HugsLib",
            "UnlimitedHugs.HugsLib",
            "<modDependencies><li><packageId>brrainz.harmony</packageId></li></modDependencies>\
             <loadAfter><li>brrainz.harmony</li><li>Ludeon.RimWorld</li></loadAfter>",
        );
        fx.add_mod("Alpha", "zz.alpha", "");
        fx
    }

    pub fn home(&self) -> PathBuf {
        self.tmp.path().join("home")
    }

    pub fn mods(&self) -> PathBuf {
        self.tmp.path().join("mods")
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.tmp.path().join(name)
    }

    pub fn add_mod(&self, folder: &str, id: &str, extra: &str) {
        let about = self.mods().join(folder).join("About");
        fs::create_dir_all(&about).unwrap();
        fs::write(
            about.join("About.xml"),
            format!(
                "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
                 <ModMetaData><packageId>{id}</packageId><name>{folder}</name>{extra}</ModMetaData>"
            ),
        )
        .unwrap();
    }

    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.path(name);
        fs::write(&path, contents).unwrap();
        path
    }

    /// `modsort` with an isolated home directory.
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("modsort").unwrap();
        cmd.env("MODSORT_HOME", self.home()).env_remove("RUST_LOG");
        cmd
    }

    pub fn source_args(&self) -> [String; 2] {
        ["--source".to_string(), self.mods().display().to_string()]
    }
}
