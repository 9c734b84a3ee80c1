//! File classification - extension and technology lookup, binary sniffing
//!
//! The extension -> technology mapping is data, not code: it is read from
//! `assets/technologies.json` (embedded at build time) or from a user supplied
//! JSON file of the same shape.
//!
//! Table sections:
//! - `extensions`: single suffix (`.py`)
//! - `compound`: multi-dot suffix matched against the file name (`.blade.php`)
//! - `filenames`: exact file name (`dockerfile`, `requirements.txt`)
//!
//! Lookup order is filenames, then compound (longest first), then extensions.

use once_cell::sync::Lazy;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::model::UNKNOWN_TECHNOLOGY;

/// Bytes inspected when deciding whether a file is binary
pub const DEFAULT_SAMPLE_SIZE: usize = 8 * 1024;

const BUILTIN_TABLE_JSON: &str = include_str!("../../assets/technologies.json");

static BUILTIN_TABLE: Lazy<TechnologyTable> = Lazy::new(|| {
    TechnologyTable::from_json_str(BUILTIN_TABLE_JSON)
        .expect("Invalid built-in technology table")
});

/// Errors loading a technology table
#[derive(Debug, Error)]
pub enum TableError {
    #[error("cannot read extension map {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid extension map: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid extension key {0:?}: keys must start with '.'")]
    InvalidKey(String),
}

/// On-disk shape of the table
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TableFile {
    #[serde(default)]
    extensions: BTreeMap<String, String>,
    #[serde(default)]
    compound: BTreeMap<String, String>,
    #[serde(default)]
    filenames: BTreeMap<String, String>,
}

/// Lookup table from file names/extensions to technology names
#[derive(Debug, Clone, Default)]
pub struct TechnologyTable {
    extensions: HashMap<String, String>,
    /// Sorted longest suffix first
    compound: Vec<(String, String)>,
    filenames: HashMap<String, String>,
}

/// Result of classifying a path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub extension: String,
    pub technology: String,
}

impl Classification {
    pub fn is_known(&self) -> bool {
        self.technology != UNKNOWN_TECHNOLOGY
    }
}

impl TechnologyTable {
    /// The table shipped with the binary
    pub fn builtin() -> &'static TechnologyTable {
        &BUILTIN_TABLE
    }

    /// Parse a table from JSON text
    pub fn from_json_str(json: &str) -> Result<Self, TableError> {
        let file: TableFile = serde_json::from_str(json)?;

        let mut extensions = HashMap::with_capacity(file.extensions.len());
        for (key, technology) in file.extensions {
            extensions.insert(normalize_suffix(&key)?, technology);
        }

        let mut compound = Vec::with_capacity(file.compound.len());
        for (key, technology) in file.compound {
            compound.push((normalize_suffix(&key)?, technology));
        }
        compound.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(&b.0)));

        let filenames = file
            .filenames
            .into_iter()
            .map(|(name, technology)| (name.to_lowercase(), technology))
            .collect();

        Ok(Self {
            extensions,
            compound,
            filenames,
        })
    }

    /// Load a table from a JSON file
    pub fn from_path(path: &Path) -> Result<Self, TableError> {
        let json = fs::read_to_string(path).map_err(|source| TableError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Number of single-suffix entries
    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty() && self.compound.is_empty() && self.filenames.is_empty()
    }

    /// Technology for a single extension such as ".py" (case-insensitive)
    pub fn technology_for_extension(&self, extension: &str) -> &str {
        self.extensions
            .get(&extension.to_lowercase())
            .map(String::as_str)
            .unwrap_or(UNKNOWN_TECHNOLOGY)
    }

    /// Classify a path by its name. Never fails; unmatched names are "Unknown".
    pub fn classify(&self, path: &Path) -> Classification {
        let extension = extension_of(path);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        let technology = self
            .filenames
            .get(&name)
            .or_else(|| {
                self.compound
                    .iter()
                    .find(|(suffix, _)| name.len() > suffix.len() && name.ends_with(suffix.as_str()))
                    .map(|(_, technology)| technology)
            })
            .map(String::as_str)
            .unwrap_or_else(|| self.technology_for_extension(&extension));

        Classification {
            extension,
            technology: technology.to_string(),
        }
    }
}

fn normalize_suffix(key: &str) -> Result<String, TableError> {
    if !key.starts_with('.') || key.len() < 2 {
        return Err(TableError::InvalidKey(key.to_string()));
    }
    Ok(key.to_lowercase())
}

/// Lowercase extension with its leading dot ("" for none).
///
/// Dot-files such as `.gitignore` have no extension.
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .filter(|ext| !ext.is_empty())
        .map(|ext| format!(".{}", ext))
        .unwrap_or_default()
}

/// A sample with a null byte is binary, whatever the extension says
pub fn is_binary_sample(sample: &[u8]) -> bool {
    sample.contains(&0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_table_loads() {
        let table = TechnologyTable::builtin();
        assert!(table.len() > 10);
        assert!(!table.is_empty());
    }

    #[test]
    fn test_common_extensions() {
        let table = TechnologyTable::builtin();
        assert_eq!(table.technology_for_extension(".py"), "Python");
        assert_eq!(table.technology_for_extension(".js"), "JavaScript");
        assert_eq!(table.technology_for_extension(".md"), "Markdown");
        assert_eq!(table.technology_for_extension(".rs"), "Rust");
        assert_eq!(table.technology_for_extension(".gradle"), "Android Gradle");
    }

    #[test]
    fn test_extension_lookup_is_case_insensitive() {
        let table = TechnologyTable::builtin();
        assert_eq!(table.technology_for_extension(".PY"), "Python");
    }

    #[test]
    fn test_unknown_extension() {
        let table = TechnologyTable::builtin();
        let c = table.classify(Path::new("data/file.xyz123"));
        assert_eq!(c.extension, ".xyz123");
        assert_eq!(c.technology, UNKNOWN_TECHNOLOGY);
        assert!(!c.is_known());
    }

    #[test]
    fn test_classify_known() {
        let table = TechnologyTable::builtin();
        let c = table.classify(Path::new("src/Main.PY"));
        assert_eq!(c.extension, ".py");
        assert_eq!(c.technology, "Python");
        assert!(c.is_known());
    }

    #[test]
    fn test_classify_compound_suffix() {
        let table = TechnologyTable::builtin();
        let c = table.classify(Path::new("views/welcome.blade.php"));
        assert_eq!(c.extension, ".php");
        assert_eq!(c.technology, "Laravel Blade");

        let plain = table.classify(Path::new("index.php"));
        assert_eq!(plain.technology, "PHP");
    }

    #[test]
    fn test_classify_exact_filename() {
        let table = TechnologyTable::builtin();
        let c = table.classify(Path::new("docker/Dockerfile"));
        assert_eq!(c.extension, "");
        assert_eq!(c.technology, "Dockerfile");

        let req = table.classify(Path::new("requirements.txt"));
        assert_eq!(req.extension, ".txt");
        assert_eq!(req.technology, "Python Requirements");
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of(Path::new("a/b/c.RS")), ".rs");
        assert_eq!(extension_of(Path::new("archive.tar.gz")), ".gz");
        assert_eq!(extension_of(Path::new("LICENSE")), "");
        assert_eq!(extension_of(Path::new(".gitignore")), "");
        assert_eq!(extension_of(Path::new("trailing.")), "");
    }

    #[test]
    fn test_is_binary_sample() {
        assert!(is_binary_sample(&[0x48, 0x00, 0x49]));
        assert!(!is_binary_sample(b"plain text"));
        assert!(!is_binary_sample(&[]));
    }

    #[test]
    fn test_custom_table() {
        let table = TechnologyTable::from_json_str(
            r#"{ "extensions": { ".XYZ": "Xyz Lang" }, "filenames": { "Justfile": "Just" } }"#,
        )
        .unwrap();
        assert_eq!(table.technology_for_extension(".xyz"), "Xyz Lang");
        assert_eq!(table.classify(Path::new("justfile")).technology, "Just");
        assert_eq!(table.technology_for_extension(".py"), UNKNOWN_TECHNOLOGY);
    }

    #[test]
    fn test_custom_table_rejects_bad_key() {
        let err = TechnologyTable::from_json_str(r#"{ "extensions": { "py": "Python" } }"#)
            .unwrap_err();
        assert!(matches!(err, TableError::InvalidKey(k) if k == "py"));
    }

    #[test]
    fn test_custom_table_rejects_unknown_section() {
        let err = TechnologyTable::from_json_str(r#"{ "languages": {} }"#).unwrap_err();
        assert!(matches!(err, TableError::Parse(_)));
    }

    #[test]
    fn test_table_from_missing_path() {
        let err = TechnologyTable::from_path(Path::new("/nonexistent/map.json")).unwrap_err();
        assert!(matches!(err, TableError::Io { .. }));
    }

    #[test]
    fn test_table_from_path() {
        let temp = tempfile::tempdir().unwrap();
        let map = temp.path().join("map.json");
        std::fs::write(&map, r#"{ "extensions": { ".foo": "Foo" } }"#).unwrap();

        let table = TechnologyTable::from_path(&map).unwrap();
        assert_eq!(table.classify(Path::new("a.foo")).technology, "Foo");
    }
}
