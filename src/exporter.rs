use crate::document::{Document, Row, Table, integer};
use crate::session::Session;
use eyre::{Context, Result};

/// Tag `Type` value that marks a playlist.
pub const PLAYLIST_TAG_TYPE: i64 = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Playlist {
    pub id: i64,
    pub name: String,
}

/// Every playlist in the store, ordered by key.
pub fn list_playlists(session: &Session) -> Result<Vec<Playlist>> {
    let mut stmt = session
        .connection()
        .prepare("SELECT TagId, Name FROM Tag WHERE Type = ?1 ORDER BY TagId")
        .wrap_err("Failed to prepare playlist query")?;
    let playlists = stmt
        .query_map([PLAYLIST_TAG_TYPE], |row| {
            Ok(Playlist {
                id: row.get(0)?,
                name: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
            })
        })?
        .collect::<Result<_, _>>()
        .wrap_err("Failed to list playlists")?;
    Ok(playlists)
}

/// Resolve a user-supplied playlist reference: its key, or its name in any case.
pub fn find_playlist<'a>(playlists: &'a [Playlist], query: &str) -> Option<&'a Playlist> {
    let query = query.trim();
    let lowered = query.to_lowercase();
    playlists
        .iter()
        .find(|p| p.id.to_string() == query || p.name.to_lowercase() == lowered)
}

/// Collect the playlist rooted at Tag `tag_id` and everything it depends on.
///
/// Each table is fetched with the keys gathered from the one before it:
/// Tag → TagMap → PlaylistItem → PlaylistItemChild → PlaylistMedia → Location.
/// A failed query is logged and yields no rows, so later tables come back
/// empty rather than aborting the export.
pub fn export_playlist(session: &Session, tag_id: i64) -> Document {
    let mut doc = Document::default();

    doc.tag = fetch(Table::Tag, session.select_eq(Table::Tag, "TagId", tag_id));
    doc.tag_map = fetch(Table::TagMap, session.select_eq(Table::TagMap, "TagId", tag_id));

    let item_ids = collect_keys(&doc.tag_map, "PlaylistItemId");
    doc.playlist_item = fetch_in(session, Table::PlaylistItem, "PlaylistItemId", &item_ids);
    doc.playlist_item_child =
        fetch_in(session, Table::PlaylistItemChild, "PlaylistItemId", &item_ids);

    let media_ids = collect_keys(&doc.playlist_item, "PlaylistMediaId");
    doc.playlist_media = fetch_in(session, Table::PlaylistMedia, "PlaylistMediaId", &media_ids);

    let location_ids = collect_keys(&doc.playlist_media, "LocationId");
    doc.location = fetch_in(session, Table::Location, "LocationId", &location_ids);

    tracing::info!(tag_id, rows = doc.row_count(), "exported playlist");
    doc
}

fn fetch_in(session: &Session, table: Table, column: &str, keys: &[i64]) -> Vec<Row> {
    if keys.is_empty() {
        return Vec::new();
    }
    fetch(table, session.select_in(table, column, keys))
}

fn fetch(table: Table, result: rusqlite::Result<Vec<Row>>) -> Vec<Row> {
    match result {
        Ok(rows) => {
            tracing::debug!(%table, count = rows.len(), "fetched rows");
            rows
        }
        Err(e) => {
            tracing::error!(%table, "Query failed: {e}");
            Vec::new()
        }
    }
}

/// Distinct non-null integer values of `column`, in first-seen order.
fn collect_keys(rows: &[Row], column: &str) -> Vec<i64> {
    let mut keys = Vec::new();
    for key in rows.iter().filter_map(|r| integer(r, column)) {
        if !keys.contains(&key) {
            keys.push(key);
        }
    }
    keys
}
