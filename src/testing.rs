//! Fixtures shared by the unit tests: a trimmed-down `userData.db` schema and
//! a seeded playlist.

use crate::document::Row;
use crate::session::Session;
use rusqlite::Connection;
use serde_json::Value;

pub const SCHEMA: &str = r#"
    CREATE TABLE Location (
        LocationId INTEGER PRIMARY KEY,
        BookNumber INTEGER,
        ChapterNumber INTEGER,
        DocumentId INTEGER,
        Track INTEGER,
        IssueTagNumber INTEGER,
        KeySymbol TEXT,
        MepsLanguage INTEGER,
        Type INTEGER NOT NULL,
        Title TEXT
    );
    CREATE TABLE Tag (
        TagId INTEGER PRIMARY KEY,
        Type INTEGER NOT NULL,
        Name TEXT NOT NULL
    );
    CREATE TABLE PlaylistMedia (
        PlaylistMediaId INTEGER PRIMARY KEY,
        MediaType INTEGER NOT NULL,
        Label TEXT CHECK (Label IS NULL OR Label <> 'broken'),
        Filename TEXT,
        LocationId INTEGER REFERENCES Location(LocationId)
    );
    CREATE TABLE PlaylistItem (
        PlaylistItemId INTEGER PRIMARY KEY,
        Label TEXT NOT NULL,
        Accuracy INTEGER NOT NULL DEFAULT 0,
        EndAction INTEGER NOT NULL DEFAULT 0,
        PlaylistMediaId INTEGER NOT NULL REFERENCES PlaylistMedia(PlaylistMediaId)
    );
    CREATE TABLE PlaylistItemChild (
        PlaylistItemChildId INTEGER PRIMARY KEY,
        BaseDurationTicks INTEGER,
        PlaylistItemId INTEGER NOT NULL REFERENCES PlaylistItem(PlaylistItemId)
    );
    CREATE TABLE TagMap (
        TagMapId INTEGER PRIMARY KEY,
        PlaylistItemId INTEGER REFERENCES PlaylistItem(PlaylistItemId),
        LocationId INTEGER REFERENCES Location(LocationId),
        TagId INTEGER NOT NULL REFERENCES Tag(TagId),
        Position INTEGER NOT NULL,
        UNIQUE (TagId, Position)
    );
"#;

/// Seeds playlist "Trip" (TagId 1) with three items, an unrelated playlist
/// "Other" (TagId 2) and a non-playlist tag (TagId 3).
///
/// Item 10 plays media 20 at location 30 (BookNumber NULL) and has one child.
/// Item 11 plays media 21 at location 31. Item 12 plays media 22, a bare
/// file with no location. "Other" reuses media 21 through item 13.
pub const SEED: &str = r#"
    INSERT INTO Tag VALUES (1, 2, 'Trip'), (2, 2, 'Other'), (3, 1, 'Trip 2');
    INSERT INTO Location VALUES
        (30, NULL, NULL, 1102021, NULL, 0, NULL, 0, 0, 'Watchtower'),
        (31, 40, 5, NULL, NULL, 0, 'nwt', 0, 0, 'Matthew 5'),
        (32, 1, 1, NULL, NULL, 0, 'nwt', 0, 0, 'Genesis 1');
    INSERT INTO PlaylistMedia VALUES
        (20, 1, 'Image', 'img.jpg', 30),
        (21, 2, 'Video', NULL, 31),
        (22, 1, 'Photo', 'photo.png', NULL);
    INSERT INTO PlaylistItem VALUES
        (10, 'First', 0, 0, 20),
        (11, 'Second', 0, 1, 21),
        (12, 'Third', 0, 0, 22),
        (13, 'Elsewhere', 0, 0, 21);
    INSERT INTO PlaylistItemChild VALUES (40, 1000, 10);
    INSERT INTO TagMap VALUES
        (50, 10, NULL, 1, 0),
        (51, 11, NULL, 1, 1),
        (52, 12, NULL, 1, 2),
        (53, 13, NULL, 2, 0),
        (54, NULL, 32, 3, 0);
"#;

pub fn create_schema(conn: &Connection) {
    conn.execute_batch(SCHEMA).unwrap();
}

pub fn memory_session() -> Session {
    let conn = Connection::open_in_memory().unwrap();
    create_schema(&conn);
    Session::from_connection(conn)
}

pub fn seeded_session() -> Session {
    let session = memory_session();
    session.connection().execute_batch(SEED).unwrap();
    session
}

pub fn row(value: Value) -> Row {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

pub fn count(session: &Session, table: &str) -> i64 {
    session
        .connection()
        .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))
        .unwrap()
}
