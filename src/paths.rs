//! Mapping database discovery
//!
//! The SDL community database is conventionally shipped as
//! `gamecontrollerdb.txt`. It is looked up, in order:
//!
//! 1. the current working directory (development runs)
//! 2. next to the executable (portable installs)
//! 3. the per-user data directory, e.g. `~/.local/share/gamewindow-pad/`

use std::path::{Path, PathBuf};
use tracing::debug;

/// Application name used for the per-user data directory
const APP_NAME: &str = "gamewindow-pad";

/// Conventional database file name
pub const MAPPING_DB_FILE: &str = "gamecontrollerdb.txt";

/// Directory containing the running executable
pub fn exe_dir() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
}

/// Per-user data directory for this application
pub fn data_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join(APP_NAME))
}

/// Candidate mapping database locations, most specific first
///
/// Candidates may not exist; duplicates are removed.
pub fn mapping_db_candidates() -> Vec<PathBuf> {
    let dirs = [Some(PathBuf::from(".")), exe_dir(), data_dir()];
    candidates_in(dirs.into_iter().flatten())
}

fn candidates_in(dirs: impl IntoIterator<Item = PathBuf>) -> Vec<PathBuf> {
    let mut candidates: Vec<PathBuf> = Vec::new();
    for dir in dirs {
        let path = dir.join(MAPPING_DB_FILE);
        if !candidates.contains(&path) {
            debug!("Mapping database candidate: {}", path.display());
            candidates.push(path);
        }
    }
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cwd_candidate_comes_first() {
        let candidates = mapping_db_candidates();
        assert_eq!(candidates.first(), Some(&PathBuf::from("./gamecontrollerdb.txt")));
        assert!(candidates.iter().all(|p| p.ends_with(MAPPING_DB_FILE)));
    }

    #[test]
    fn test_duplicate_directories_collapse() {
        let candidates = candidates_in(vec![
            PathBuf::from("/opt/pad"),
            PathBuf::from("/opt/pad"),
            PathBuf::from("/usr/share/pad"),
        ]);
        assert_eq!(
            candidates,
            vec![
                PathBuf::from("/opt/pad/gamecontrollerdb.txt"),
                PathBuf::from("/usr/share/pad/gamecontrollerdb.txt"),
            ]
        );
    }
}
