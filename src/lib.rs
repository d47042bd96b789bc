//! # jwl-playlist
//!
//! Move JW Library playlists between installations.
//!
//! ## What it does
//!
//! JW Library keeps playlists in its SQLite `userData.db`, spread over six
//! tables: the playlist itself is a `Tag` row (Type 2), joined through
//! `TagMap` to `PlaylistItem`s, which play `PlaylistMedia` that may point at
//! a `Location` in a publication. `PlaylistItemChild` rows hang off items.
//!
//! Exporting walks those tables outward from one `Tag` and writes every row
//! it reaches to a single JSON document. Importing does the reverse into
//! another database: new keys are assigned, every foreign key in the
//! document is rewritten to match, and `Location` / `PlaylistMedia` rows that
//! already exist in the target (same content, different key) are reused
//! instead of duplicated. A playlist whose name is taken gets a numeric
//! suffix ("Trip" → "Trip 2").
//!
//! ## Usage
//!
//! ```sh
//! jwl-playlist list
//! jwl-playlist export --playlist "Trip" --file trip.json
//! jwl-playlist import --file trip.json
//! ```
//!
//! The database is auto-detected below the platform's app data directory.
//! Use `--db` to point at one directly, or persist `db_path` /
//! `search_root` in `~/.config/jwl-playlist/config.toml`.
//!
//! ## Caveats
//!
//! Import is not transactional. A row that fails to insert is skipped and
//! reported; rows referring to it keep their old key. Close JW Library
//! before importing: the database is locked exclusively while it runs.
pub mod discovery;
pub mod document;
pub mod error;
pub mod exporter;
pub mod importer;
pub mod naming;
pub mod session;
pub mod utils;

#[cfg(test)]
mod testing;

pub use document::{Document, Row, Table};
pub use error::{DiscoveryError, ImportError};
pub use exporter::{Playlist, export_playlist, find_playlist, list_playlists};
pub use importer::{ImportReport, TableStats, import_playlist};
pub use naming::unique_playlist_name;
pub use session::Session;
