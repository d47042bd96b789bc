//! Merge an exported playlist document into another `userData.db`.
//!
//! Tables are imported parents first (Tag, Location, PlaylistMedia,
//! PlaylistItem, then TagMap and PlaylistItemChild). After each stage the
//! old→new key map of that table is applied to the rows still waiting in the
//! document, so every later insert carries keys of the target store.
//!
//! Location and PlaylistMedia rows are looked up by content first and reused
//! when an identical row already exists. Everything else is always inserted.
//!
//! Only a failed playlist (Tag) insert aborts. Any other row that fails is
//! logged and skipped, and rows referencing it keep the stale key from the
//! source store. That inconsistency is left in place: nothing is nulled or
//! removed to hide it.

use crate::document::{Document, Row, Table, integer};
use crate::error::ImportError;
use crate::exporter::{PLAYLIST_TAG_TYPE, list_playlists};
use crate::naming::unique_playlist_name;
use crate::session::Session;
use eyre::Result;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

/// Columns that identify a Location regardless of its key.
pub const LOCATION_IDENTITY: [&str; 8] = [
    "BookNumber",
    "ChapterNumber",
    "DocumentId",
    "Track",
    "IssueTagNumber",
    "KeySymbol",
    "MepsLanguage",
    "Type",
];

/// Columns that identify a PlaylistMedia regardless of its key.
pub const MEDIA_IDENTITY: [&str; 2] = ["MediaType", "LocationId"];

/// Source-store key → target-store key for one table.
type KeyMap = HashMap<i64, i64>;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TableStats {
    pub inserted: usize,
    pub reused: usize,
    pub failed: usize,
}

#[derive(Debug, Clone)]
pub struct ImportReport {
    /// Key of the new playlist row.
    pub tag_id: i64,
    /// Name the playlist was stored under after collision resolution.
    pub name: String,
    pub stats: BTreeMap<Table, TableStats>,
}

impl ImportReport {
    pub fn stats(&self, table: Table) -> TableStats {
        self.stats.get(&table).copied().unwrap_or_default()
    }

    /// Rows skipped because their lookup or insert failed.
    pub fn failed(&self) -> usize {
        self.stats.values().map(|s| s.failed).sum()
    }
}

impl std::fmt::Display for ImportReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Imported playlist '{}' as {}.", self.name, self.tag_id)?;
        for table in Table::ALL {
            let s = self.stats(table);
            write!(
                f,
                "\n{:<18} {} inserted, {} reused, {} failed",
                table.name(),
                s.inserted,
                s.reused,
                s.failed
            )?;
        }
        Ok(())
    }
}

enum Resolved {
    Inserted(i64),
    Reused(i64),
}

/// Import the first playlist in `doc` into the store behind `session`.
///
/// Durability is relaxed for the duration of the call and restored on every
/// exit path.
pub fn import_playlist(session: &Session, mut doc: Document) -> Result<ImportReport> {
    let Some(mut tag) = doc.tag.first().cloned() else {
        return Err(ImportError::NoPlaylist.into());
    };
    if doc.tag.len() > 1 {
        tracing::warn!(
            count = doc.tag.len(),
            "Document holds several tags, importing only the first"
        );
    }
    if integer(&tag, "Type") != Some(PLAYLIST_TAG_TYPE) {
        tracing::warn!("First tag in the document is not a playlist");
    }

    let existing: Vec<String> = list_playlists(session)?
        .into_iter()
        .map(|p| p.name)
        .collect();

    let _guard = session.relax_durability()?;
    let mut stats = BTreeMap::new();

    // Tag
    tag.shift_remove(Table::Tag.key_column());
    let candidate = tag
        .get("Name")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let name = unique_playlist_name(&candidate, &existing);
    if name != candidate {
        tracing::info!(%candidate, %name, "renamed playlist to avoid a collision");
    }
    tag.insert("Name".to_string(), Value::String(name.clone()));
    let tag_id = session
        .insert_row(Table::Tag, &tag)
        .map_err(|source| ImportError::PlaylistInsert {
            name: name.clone(),
            source,
        })?;
    stats.insert(
        Table::Tag,
        TableStats {
            inserted: 1,
            ..TableStats::default()
        },
    );
    for row in &mut doc.tag_map {
        row.insert("TagId".to_string(), Value::from(tag_id));
    }

    // Location
    let locations = import_rows(
        session,
        Table::Location,
        &mut doc.location,
        Some(&LOCATION_IDENTITY[..]),
        &mut stats,
    );
    rewrite(&mut doc.playlist_media, "LocationId", &locations);
    rewrite(&mut doc.tag_map, "LocationId", &locations);

    // PlaylistMedia
    let media = import_rows(
        session,
        Table::PlaylistMedia,
        &mut doc.playlist_media,
        Some(&MEDIA_IDENTITY[..]),
        &mut stats,
    );
    rewrite(&mut doc.playlist_item, "PlaylistMediaId", &media);

    // PlaylistItem
    let items = import_rows(
        session,
        Table::PlaylistItem,
        &mut doc.playlist_item,
        None,
        &mut stats,
    );
    rewrite(&mut doc.playlist_item_child, "PlaylistItemId", &items);
    rewrite(&mut doc.tag_map, "PlaylistItemId", &items);

    // Join rows last, once every reference has been rewritten
    import_rows(session, Table::TagMap, &mut doc.tag_map, None, &mut stats);
    import_rows(
        session,
        Table::PlaylistItemChild,
        &mut doc.playlist_item_child,
        None,
        &mut stats,
    );

    let report = ImportReport {
        tag_id,
        name,
        stats,
    };
    tracing::info!(tag_id, failed = report.failed(), "imported playlist");
    Ok(report)
}

/// Strip each row's own key, then reuse a matching row (when `identity` is
/// given) or insert it. Returns the key mapping for rows that made it.
fn import_rows(
    session: &Session,
    table: Table,
    rows: &mut [Row],
    identity: Option<&[&str]>,
    stats: &mut BTreeMap<Table, TableStats>,
) -> KeyMap {
    let stats = stats.entry(table).or_default();
    let mut keys = KeyMap::new();

    for row in rows.iter_mut() {
        let old = row
            .shift_remove(table.key_column())
            .and_then(|v| v.as_i64());

        let new = match resolve(session, table, row, identity) {
            Ok(Resolved::Inserted(key)) => {
                stats.inserted += 1;
                key
            }
            Ok(Resolved::Reused(key)) => {
                stats.reused += 1;
                key
            }
            Err(e) => {
                stats.failed += 1;
                tracing::error!(
                    %table,
                    old_key = ?old,
                    row = %serde_json::to_string(&*row).unwrap_or_default(),
                    "Skipping row: {e}"
                );
                continue;
            }
        };

        match old {
            Some(old) => {
                keys.insert(old, new);
            }
            None => {
                tracing::warn!(%table, new_key = new, "Row had no key, nothing can refer to it");
            }
        }
    }

    tracing::debug!(%table, ?stats, "imported rows");
    keys
}

fn resolve(
    session: &Session,
    table: Table,
    row: &Row,
    identity: Option<&[&str]>,
) -> rusqlite::Result<Resolved> {
    if let Some(columns) = identity {
        if let Some(key) = session.find_key(table, row, columns)? {
            return Ok(Resolved::Reused(key));
        }
    }
    session.insert_row(table, row).map(Resolved::Inserted)
}

/// Point `column` of every row at its new key. Unmapped values stay as they are.
fn rewrite(rows: &mut [Row], column: &str, keys: &KeyMap) {
    for row in rows {
        if let Some(&new) = integer(row, column).and_then(|old| keys.get(&old)) {
            row.insert(column.to_string(), Value::from(new));
        }
    }
}
