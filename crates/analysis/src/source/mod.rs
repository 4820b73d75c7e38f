//! Parsing and source-unit extraction for the JS/TS family.

pub mod extractor;
pub mod language;

pub use extractor::{ParsedFile, SourceUnit, SourceUnitExtractor, UnitKind};
pub use language::{language_for_path, supports_path, SUPPORTED_EXTENSIONS};
