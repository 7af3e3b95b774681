//! Mapping database
//!
//! Collects mapping lines from `gamecontrollerdb.txt`-style files and in-memory
//! text. Comment (`#`) and blank lines are skipped. A bad line is recorded in
//! the [`LoadReport`] and the remaining lines still load. Lines restricted to
//! another platform are skipped without being reported.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, warn};

use super::error::ParseError;
use super::mapping::{Mapping, Platform};

/// A rejected line
#[derive(Debug, Clone, PartialEq)]
pub struct LineError {
    /// 1-based line number within the loaded text
    pub line: usize,
    pub error: ParseError,
}

/// Outcome of loading one file or text block
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    /// Mappings added or replaced, in input order
    pub accepted: Vec<Arc<Mapping>>,
    /// Lines for another platform
    pub skipped: usize,
    pub errors: Vec<LineError>,
}

impl LoadReport {
    pub fn added(&self) -> usize {
        self.accepted.len()
    }

    /// Accepted mappings re-serialized, one per line
    pub fn accepted_text(&self) -> String {
        self.accepted
            .iter()
            .map(|m| m.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Fold another report into this one
    pub fn merge(&mut self, other: LoadReport) {
        self.accepted.extend(other.accepted);
        self.skipped += other.skipped;
        self.errors.extend(other.errors);
    }
}

/// Known mappings keyed by GUID
#[derive(Debug, Clone)]
pub struct MappingDatabase {
    platform: Platform,
    mappings: HashMap<String, Arc<Mapping>>,
}

impl Default for MappingDatabase {
    fn default() -> Self {
        Self::new(Platform::current())
    }
}

impl MappingDatabase {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            mappings: HashMap::new(),
        }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Load every line of `text`
    ///
    /// A later line for a GUID replaces the earlier mapping.
    pub fn load_str(&mut self, text: &str) -> LoadReport {
        let mut report = LoadReport::default();

        for (idx, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            match Mapping::parse_for(line, self.platform) {
                Ok(mapping) => {
                    let mapping = Arc::new(mapping);
                    self.mappings
                        .insert(mapping.guid().to_string(), mapping.clone());
                    report.accepted.push(mapping);
                }
                Err(ParseError::PlatformMismatch(tag)) => {
                    debug!("Skipping mapping for platform '{}'", tag);
                    report.skipped += 1;
                }
                Err(error) => {
                    warn!("Rejected mapping on line {}: {}", idx + 1, error);
                    report.errors.push(LineError {
                        line: idx + 1,
                        error,
                    });
                }
            }
        }

        report
    }

    pub fn get(&self, guid: &str) -> Option<Arc<Mapping>> {
        self.mappings.get(guid).cloned()
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

/// Read a mapping file, `None` if it does not exist or cannot be read
pub fn read_mapping_file(path: &Path) -> Option<String> {
    match fs::read_to_string(path) {
        Ok(text) => Some(text),
        Err(e) => {
            debug!("No mapping file at {}: {}", path.display(), e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const DB: &str = "\
# Game controller mappings
030000005e0400008e02000014010000,Xbox 360 Controller,a:b0,b:b1,leftx:a0,lefty:a1,platform:Linux,

030000005e0400008e02000014010000,Xbox 360 Controller,a:b1,b:b0,platform:Windows,
bad line without pairs,Pad,a
03000000de280000fc11000001000000,Steam Controller,a:b0,dpup:h0.3,
0300000079000000060000000000000,Generic Pad,a:b2,b:b1,
03000000de280000fc11000001000000,Steam Controller,a:b0,paddle9:b20,platform:Windows,
";

    #[test]
    fn test_load_skips_comments_and_isolates_errors() {
        let mut db = MappingDatabase::new(Platform::Linux);
        let report = db.load_str(DB);

        assert_eq!(report.added(), 2);
        assert_eq!(report.skipped, 2);
        assert_eq!(report.errors.len(), 2);
        assert_eq!(report.errors[0].line, 5);
        assert_eq!(report.errors[1].error, ParseError::InvalidHatMask(3));

        assert_eq!(db.len(), 2);
        assert!(db.get("030000005e0400008e02000014010000").is_some());
        assert!(db.get("03000000de280000fc11000001000000").is_none());
    }

    #[test]
    fn test_later_line_replaces_mapping() {
        let mut db = MappingDatabase::new(Platform::Linux);
        db.load_str("g1,First,a:b0,");
        db.load_str("g1,Second,a:b3,");

        assert_eq!(db.len(), 1);
        assert_eq!(db.get("g1").unwrap().name(), "Second");
    }

    #[test]
    fn test_accepted_text_reloads() {
        let mut db = MappingDatabase::new(Platform::Linux);
        let report = db.load_str(DB);

        let mut other = MappingDatabase::new(Platform::Linux);
        let again = other.load_str(&report.accepted_text());
        assert_eq!(again.added(), 2);
        assert!(again.errors.is_empty());
    }

    #[test]
    fn test_foreign_line_with_unknown_token_is_skipped() {
        let mut db = MappingDatabase::new(Platform::Linux);
        let report = db.load_str("g1,Pad,a:b0,paddle9:b20,platform:Windows,");
        assert_eq!(report.skipped, 1);
        assert!(report.errors.is_empty());
        assert!(db.is_empty());
    }

    #[test]
    fn test_missing_file_is_silent() {
        assert!(read_mapping_file(Path::new("/nonexistent/gamecontrollerdb.txt")).is_none());
    }

    #[test]
    fn test_load_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "# local overrides").unwrap();
        writeln!(file, "abcd,Arcade Stick,a:b0,b:b1,start:b9,").unwrap();

        let mut db = MappingDatabase::new(Platform::Linux);
        let text = read_mapping_file(file.path()).unwrap();
        let report = db.load_str(&text);
        assert_eq!(report.added(), 1);
        assert_eq!(db.get("abcd").unwrap().bindings().len(), 3);
    }

    #[test]
    fn test_merge_reports() {
        let mut db = MappingDatabase::new(Platform::Linux);
        let mut total = db.load_str("g1,A,a:b0,");
        total.merge(db.load_str("g2,B,a:b0,\nbroken"));
        assert_eq!(total.added(), 2);
        assert_eq!(total.errors.len(), 1);
    }
}
