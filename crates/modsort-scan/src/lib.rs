//! Mod metadata discovery: `About.xml` parsing and source directory scanning.

pub mod about;
pub mod scanner;

pub use about::{parse_about, AboutXml};
pub use scanner::AboutXmlScanner;
