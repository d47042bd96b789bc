#![allow(dead_code)]

use jwl_playlist::Session;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const SCHEMA: &str = r#"
    CREATE TABLE Location (
        LocationId INTEGER PRIMARY KEY,
        BookNumber INTEGER,
        ChapterNumber INTEGER,
        DocumentId INTEGER,
        Track INTEGER,
        IssueTagNumber INTEGER NOT NULL DEFAULT 0,
        KeySymbol TEXT,
        MepsLanguage INTEGER,
        Type INTEGER NOT NULL,
        Title TEXT
    );
    CREATE TABLE Tag (
        TagId INTEGER PRIMARY KEY,
        Type INTEGER NOT NULL,
        Name TEXT NOT NULL,
        UNIQUE (Type, Name)
    );
    CREATE TABLE PlaylistMedia (
        PlaylistMediaId INTEGER PRIMARY KEY,
        MediaType INTEGER NOT NULL,
        Label TEXT,
        Filename TEXT,
        LocationId INTEGER REFERENCES Location(LocationId)
    );
    CREATE TABLE PlaylistItem (
        PlaylistItemId INTEGER PRIMARY KEY,
        Label TEXT NOT NULL,
        StartTrimOffsetTicks INTEGER,
        EndTrimOffsetTicks INTEGER,
        Accuracy INTEGER NOT NULL,
        EndAction INTEGER NOT NULL,
        ThumbnailFilePath TEXT,
        PlaylistMediaId INTEGER NOT NULL REFERENCES PlaylistMedia(PlaylistMediaId)
    );
    CREATE TABLE PlaylistItemChild (
        PlaylistItemChildId INTEGER PRIMARY KEY,
        BaseDurationTicks INTEGER,
        MarkerId INTEGER,
        PlaylistItemId INTEGER NOT NULL REFERENCES PlaylistItem(PlaylistItemId)
    );
    CREATE TABLE TagMap (
        TagMapId INTEGER PRIMARY KEY,
        PlaylistItemId INTEGER REFERENCES PlaylistItem(PlaylistItemId),
        LocationId INTEGER REFERENCES Location(LocationId),
        NoteId INTEGER,
        TagId INTEGER NOT NULL REFERENCES Tag(TagId),
        Position INTEGER NOT NULL,
        UNIQUE (TagId, Position)
    );
"#;

/// Playlist "Road Trip" (TagId 7): two songs sharing one publication
/// location, and a photo with no location.
const SEED: &str = r#"
    INSERT INTO Tag VALUES (7, 2, 'Road Trip'), (8, 2, 'Road Trip 2');
    INSERT INTO Location VALUES
        (100, NULL, NULL, NULL, 12, 0, 'sjjm', 1, 2, 'Song 12'),
        (101, NULL, NULL, NULL, 55, 0, 'sjjm', 1, 2, 'Song 55');
    INSERT INTO PlaylistMedia VALUES
        (200, 2, 'Song 12', NULL, 100),
        (201, 2, 'Song 55', NULL, 101),
        (202, 1, 'Photo', 'beach.jpg', NULL);
    INSERT INTO PlaylistItem VALUES
        (300, 'Opening', NULL, NULL, 0, 0, NULL, 200),
        (301, 'Closing', 0, 12000, 0, 1, 'thumb.png', 201),
        (302, 'Beach', NULL, NULL, 0, 0, NULL, 202);
    INSERT INTO PlaylistItemChild VALUES
        (400, 50000, NULL, 300),
        (401, 60000, 3, 301);
    INSERT INTO TagMap VALUES
        (500, 300, NULL, NULL, 7, 0),
        (501, 301, NULL, NULL, 7, 1),
        (502, 302, NULL, NULL, 7, 2);
"#;

pub struct Store {
    _dir: TempDir,
    pub path: PathBuf,
}

impl Store {
    pub fn empty() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("userData.db");
        Connection::open(&path).unwrap().execute_batch(SCHEMA).unwrap();
        Self { _dir: dir, path }
    }

    pub fn seeded() -> Self {
        let store = Self::empty();
        Connection::open(&store.path).unwrap().execute_batch(SEED).unwrap();
        store
    }

    pub fn session(&self) -> Session {
        Session::open(&self.path).unwrap()
    }

    pub fn count(&self, table: &str) -> i64 {
        count_in(&self.path, table)
    }
}

pub fn count_in(path: &Path, table: &str) -> i64 {
    Connection::open(path)
        .unwrap()
        .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))
        .unwrap()
}
