//! Path utilities for determining data storage locations.
//!
//! Ledger databases live under `~/.taskledger/` with one subdirectory per
//! workspace, named from the workspace directory plus a hash of its path.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

/// The base directory name for taskledger data.
const DATA_DIR_NAME: &str = ".taskledger";

/// The database filename.
pub const DATABASE_FILENAME: &str = "ledger.sqlite3";

/// Get the base data directory.
///
/// Returns `~/.taskledger/` or `None` if the home directory cannot be
/// determined.
#[must_use]
pub fn data_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(DATA_DIR_NAME))
}

/// Get the default database path for a workspace directory.
///
/// Returns `~/.taskledger/workspaces/<name>-<hash>/ledger.sqlite3`.
#[must_use]
pub fn workspace_db_path(workspace_dir: &Path) -> Option<PathBuf> {
    let base = data_dir()?;
    Some(base.join("workspaces").join(workspace_dir_name(workspace_dir)).join(DATABASE_FILENAME))
}

/// Directory name for a workspace: `<last-component>-<hash>`.
fn workspace_dir_name(workspace_dir: &Path) -> String {
    let canonical =
        workspace_dir.canonicalize().unwrap_or_else(|_| workspace_dir.to_path_buf());

    let prefix = canonical.file_name().and_then(|n| n.to_str()).unwrap_or("workspace");
    let prefix: String =
        prefix.chars().map(|c| if c.is_alphanumeric() { c } else { '-' }).collect();
    let prefix = prefix.trim_matches('-');

    let mut hasher = DefaultHasher::new();
    canonical.hash(&mut hasher);
    format!("{prefix}-{:016x}", hasher.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_dir_returns_home_based_path() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(data_dir().unwrap(), home.join(".taskledger"));
        }
    }

    #[test]
    fn test_workspace_db_path_ends_with_filename() {
        if let Some(path) = workspace_db_path(Path::new("/some/work/space")) {
            assert!(path.to_string_lossy().contains("workspaces"));
            assert!(path.to_string_lossy().ends_with(DATABASE_FILENAME));
        }
    }

    #[test]
    fn test_workspace_dir_name_starts_with_last_component() {
        let name = workspace_dir_name(Path::new("/leading/slash"));
        assert!(name.starts_with("slash-"));
        assert!(!name.contains('/'));
    }

    #[test]
    fn test_workspace_dir_name_differs_for_similar_paths() {
        let a = workspace_dir_name(Path::new("/home/user/project"));
        let b = workspace_dir_name(Path::new("/home/user-project"));
        assert_ne!(a, b);
    }
}
