//! The six-table JSON document exchanged between database instances.
//!
//! ```json
//! { "Location": [...], "PlaylistItem": [...], "PlaylistItemChild": [...],
//!   "PlaylistMedia": [...], "Tag": [...], "TagMap": [...] }
//! ```
//!
//! Each array holds row objects exactly as the store returned them, keyed by
//! column name. Surrogate keys travel along but are informational only: the
//! importer discards and reassigns them.

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// One table row, column name to value, in store column order.
pub type Row = Map<String, Value>;

/// The fixed entity set a playlist spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Table {
    Tag,
    Location,
    PlaylistMedia,
    PlaylistItem,
    TagMap,
    PlaylistItemChild,
}

impl Table {
    /// Import order: every table comes after the tables it references.
    pub const ALL: [Table; 6] = [
        Table::Tag,
        Table::Location,
        Table::PlaylistMedia,
        Table::PlaylistItem,
        Table::TagMap,
        Table::PlaylistItemChild,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Table::Tag => "Tag",
            Table::TagMap => "TagMap",
            Table::PlaylistItem => "PlaylistItem",
            Table::PlaylistItemChild => "PlaylistItemChild",
            Table::PlaylistMedia => "PlaylistMedia",
            Table::Location => "Location",
        }
    }

    /// Integer surrogate key column.
    pub const fn key_column(self) -> &'static str {
        match self {
            Table::Tag => "TagId",
            Table::TagMap => "TagMapId",
            Table::PlaylistItem => "PlaylistItemId",
            Table::PlaylistItemChild => "PlaylistItemChildId",
            Table::PlaylistMedia => "PlaylistMediaId",
            Table::Location => "LocationId",
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A playlist and every row it transitively depends on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct Document {
    pub location: Vec<Row>,
    pub playlist_item: Vec<Row>,
    pub playlist_item_child: Vec<Row>,
    pub playlist_media: Vec<Row>,
    pub tag: Vec<Row>,
    pub tag_map: Vec<Row>,
}

impl Document {
    pub fn rows(&self, table: Table) -> &[Row] {
        match table {
            Table::Tag => &self.tag,
            Table::TagMap => &self.tag_map,
            Table::PlaylistItem => &self.playlist_item,
            Table::PlaylistItemChild => &self.playlist_item_child,
            Table::PlaylistMedia => &self.playlist_media,
            Table::Location => &self.location,
        }
    }

    pub fn rows_mut(&mut self, table: Table) -> &mut Vec<Row> {
        match table {
            Table::Tag => &mut self.tag,
            Table::TagMap => &mut self.tag_map,
            Table::PlaylistItem => &mut self.playlist_item,
            Table::PlaylistItemChild => &mut self.playlist_item_child,
            Table::PlaylistMedia => &mut self.playlist_media,
            Table::Location => &mut self.location,
        }
    }

    /// Total number of rows across all six tables.
    pub fn row_count(&self) -> usize {
        Table::ALL.iter().map(|t| self.rows(*t).len()).sum()
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        serde_json::from_reader(reader).wrap_err("Malformed playlist document")
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .wrap_err_with(|| format!("Failed to open document: {}", path.display()))?;
        Self::from_reader(BufReader::new(file))
            .wrap_err_with(|| format!("Failed to parse document: {}", path.display()))
    }

    pub fn to_writer<W: Write>(&self, writer: W, pretty: bool) -> Result<()> {
        if pretty {
            serde_json::to_writer_pretty(writer, self)
        } else {
            serde_json::to_writer(writer, self)
        }
        .wrap_err("Failed to serialize playlist document")
    }

    pub fn write_to_path(&self, path: &Path, pretty: bool) -> Result<()> {
        let file = File::create(path)
            .wrap_err_with(|| format!("Failed to create document: {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        self.to_writer(&mut writer, pretty)?;
        writer
            .flush()
            .wrap_err_with(|| format!("Failed to write document: {}", path.display()))
    }
}

/// Integer value of `column`, if present and integral.
pub fn integer(row: &Row, column: &str) -> Option<i64> {
    row.get(column).and_then(Value::as_i64)
}
