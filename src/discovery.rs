//! Locate the JW Library `userData.db` on this machine.
//!
//! The app keeps its database somewhere below a per-platform root, inside a
//! package directory whose name starts with a fixed prefix. We walk the root
//! and keep every file matching `<root>/**/<prefix>*/**/<file_name>`.

use crate::error::DiscoveryError;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const DEFAULT_PACKAGE_PREFIX: &str = "WatchtowerBibleandTractSo.JWLibrarySignLanguage";
pub const DEFAULT_DATABASE_NAME: &str = "userData.db";

/// Where the app's package directories live on this platform.
pub fn default_search_root() -> Option<PathBuf> {
    if cfg!(target_os = "macos") {
        dirs::home_dir().map(|h| h.join("Library/Preferences"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir().map(|d| d.join("Packages"))
    } else {
        dirs::data_dir()
    }
}

/// Every database file under `root`, sorted.
pub fn find_databases(root: &Path, package_prefix: &str, file_name: &str) -> Vec<PathBuf> {
    let mut found: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(e) => {
                tracing::debug!("Skipping unreadable entry: {e}");
                None
            }
        })
        .filter(|e| e.file_type().is_file() && e.file_name() == OsStr::new(file_name))
        .filter(|e| in_package(root, e.path(), package_prefix))
        .map(|e| e.into_path())
        .collect();
    found.sort();
    tracing::debug!(root = %root.display(), count = found.len(), "searched for databases");
    found
}

/// The one database under `root`, or why there isn't exactly one.
pub fn find_database(
    root: &Path,
    package_prefix: &str,
    file_name: &str,
) -> Result<PathBuf, DiscoveryError> {
    let mut paths = find_databases(root, package_prefix, file_name);
    match paths.len() {
        0 => Err(DiscoveryError::NotFound {
            root: root.to_path_buf(),
        }),
        1 => Ok(paths.remove(0)),
        _ => Err(DiscoveryError::Ambiguous { paths }),
    }
}

/// Whether some directory between `root` and the file starts with `prefix`.
fn in_package(root: &Path, path: &Path, prefix: &str) -> bool {
    let Ok(relative) = path.strip_prefix(root) else {
        return false;
    };
    relative
        .parent()
        .into_iter()
        .flat_map(Path::components)
        .any(|c| c.as_os_str().to_string_lossy().starts_with(prefix))
}
