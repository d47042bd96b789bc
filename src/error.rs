use std::path::PathBuf;
use thiserror::Error;

/// Why a single database could not be picked.
#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("No JW Library database was found under {}", .root.display())]
    NotFound { root: PathBuf },

    #[error("More than one JW Library database found:{}", list(.paths))]
    Ambiguous { paths: Vec<PathBuf> },
}

/// Failures that abort a whole import.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Document contains no playlist")]
    NoPlaylist,

    #[error("Failed to insert playlist '{name}'")]
    PlaylistInsert {
        name: String,
        #[source]
        source: rusqlite::Error,
    },
}

fn list(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| format!("\n  {}", p.display()))
        .collect()
}
