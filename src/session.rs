//! Scoped handle on one JW Library `userData.db`.
//!
//! A `Session` owns the connection for the length of one export or import
//! and closes it on drop. All row I/O goes through the generic helpers
//! here: rows are read as column-name maps and written back the same way,
//! so the exporter and importer never need to know a table's full schema.

use crate::document::{Row, Table};
use eyre::{Context, Result};
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{Connection, OpenFlags, OptionalExtension, Params, Statement, params_from_iter};
use serde_json::Value;
use std::path::Path;
use std::time::Duration;

/// Stay well below SQLite's bound-parameter limit on `IN (...)` queries.
const MAX_BOUND_KEYS: usize = 500;

pub struct Session {
    conn: Connection,
}

impl Session {
    /// Open an existing database for reading and writing. Never creates one.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .wrap_err_with(|| format!("Failed to open database: {}", path.display()))?;
        conn.busy_timeout(Duration::from_secs(5))
            .wrap_err("Failed to set busy timeout")?;
        tracing::debug!(path = %path.display(), "opened database");
        Ok(Self { conn })
    }

    pub fn open_read_only(path: &Path) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .wrap_err_with(|| format!("Failed to open database: {}", path.display()))?;
        tracing::debug!(path = %path.display(), "opened database read-only");
        Ok(Self { conn })
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// All rows of `table` where `column = value`.
    pub fn select_eq(
        &self,
        table: Table,
        column: &str,
        value: i64,
    ) -> rusqlite::Result<Vec<Row>> {
        let sql = format!(
            "SELECT * FROM {} WHERE {} = ?1",
            quote(table.name()),
            quote(column)
        );
        let mut stmt = self.conn.prepare(&sql)?;
        collect_rows(&mut stmt, [value])
    }

    /// All rows of `table` whose `column` is one of `keys`.
    pub fn select_in(
        &self,
        table: Table,
        column: &str,
        keys: &[i64],
    ) -> rusqlite::Result<Vec<Row>> {
        let mut rows = Vec::new();
        for chunk in keys.chunks(MAX_BOUND_KEYS) {
            let placeholders = (1..=chunk.len())
                .map(|i| format!("?{i}"))
                .collect::<Vec<_>>()
                .join(", ");
            let sql = format!(
                "SELECT * FROM {} WHERE {} IN ({})",
                quote(table.name()),
                quote(column),
                placeholders
            );
            let mut stmt = self.conn.prepare(&sql)?;
            rows.extend(collect_rows(&mut stmt, params_from_iter(chunk))?);
        }
        Ok(rows)
    }

    /// Insert `row` as-is and return the rowid the store assigned.
    pub fn insert_row(&self, table: Table, row: &Row) -> rusqlite::Result<i64> {
        if row.is_empty() {
            self.conn
                .execute(&format!("INSERT INTO {} DEFAULT VALUES", quote(table.name())), [])?;
            return Ok(self.conn.last_insert_rowid());
        }
        let columns = row.keys().map(|c| quote(c)).collect::<Vec<_>>().join(", ");
        let placeholders = (1..=row.len())
            .map(|i| format!("?{i}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote(table.name()),
            columns,
            placeholders
        );
        self.conn
            .execute(&sql, params_from_iter(row.values().map(to_sql)))?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Key of the first row of `table` whose `columns` equal those of `row`.
    ///
    /// Null (or absent) source values only match stored NULLs: the lookup uses
    /// `IS NULL` for them and `=` for everything else.
    pub fn find_key(
        &self,
        table: Table,
        row: &Row,
        columns: &[&str],
    ) -> rusqlite::Result<Option<i64>> {
        let mut clauses = Vec::with_capacity(columns.len());
        let mut values = Vec::new();
        for column in columns {
            match row.get(*column) {
                None | Some(Value::Null) => clauses.push(format!("{} IS NULL", quote(column))),
                Some(value) => {
                    values.push(to_sql(value));
                    clauses.push(format!("{} = ?{}", quote(column), values.len()));
                }
            }
        }
        let filter = if clauses.is_empty() {
            "1".to_string()
        } else {
            clauses.join(" AND ")
        };
        let sql = format!(
            "SELECT {} FROM {} WHERE {} LIMIT 1",
            quote(table.key_column()),
            quote(table.name()),
            filter
        );
        self.conn
            .query_row(&sql, params_from_iter(values), |r| r.get(0))
            .optional()
    }

    /// Trade durability for speed until the returned guard is dropped.
    ///
    /// Switches to an exclusive lock, an in-memory journal and no fsync, and
    /// turns foreign-key enforcement off so a skipped row never takes the
    /// rows referring to it down too. The previous settings are put back when
    /// the guard goes out of scope.
    pub fn relax_durability(&self) -> Result<DurabilityGuard<'_>> {
        let conn = &self.conn;
        let guard = DurabilityGuard {
            conn,
            locking_mode: conn
                .pragma_query_value(None, "locking_mode", |r| r.get(0))
                .wrap_err("Failed to read locking_mode")?,
            journal_mode: conn
                .pragma_query_value(None, "journal_mode", |r| r.get(0))
                .wrap_err("Failed to read journal_mode")?,
            synchronous: conn
                .pragma_query_value(None, "synchronous", |r| r.get(0))
                .wrap_err("Failed to read synchronous")?,
            foreign_keys: conn
                .pragma_query_value(None, "foreign_keys", |r| r.get(0))
                .wrap_err("Failed to read foreign_keys")?,
        };

        conn.pragma_update_and_check(None, "locking_mode", "EXCLUSIVE", |r| {
            r.get::<_, String>(0)
        })
        .wrap_err("Failed to set locking_mode")?;
        conn.pragma_update_and_check(None, "journal_mode", "MEMORY", |r| {
            r.get::<_, String>(0)
        })
        .wrap_err("Failed to set journal_mode")?;
        conn.pragma_update(None, "synchronous", "OFF")
            .wrap_err("Failed to set synchronous")?;
        conn.pragma_update(None, "foreign_keys", 0)
            .wrap_err("Failed to set foreign_keys")?;
        tracing::debug!(
            locking_mode = %guard.locking_mode,
            journal_mode = %guard.journal_mode,
            synchronous = guard.synchronous,
            foreign_keys = guard.foreign_keys,
            "relaxed durability"
        );
        Ok(guard)
    }
}

/// Restores the pragmas recorded by [`Session::relax_durability`].
pub struct DurabilityGuard<'a> {
    conn: &'a Connection,
    locking_mode: String,
    journal_mode: String,
    synchronous: i64,
    foreign_keys: i64,
}

impl Drop for DurabilityGuard<'_> {
    fn drop(&mut self) {
        let conn = self.conn;
        if let Err(e) =
            conn.pragma_update_and_check(None, "locking_mode", &self.locking_mode, |r| {
                r.get::<_, String>(0)
            })
        {
            tracing::warn!("Failed to restore locking_mode: {e}");
        }
        if let Err(e) =
            conn.pragma_update_and_check(None, "journal_mode", &self.journal_mode, |r| {
                r.get::<_, String>(0)
            })
        {
            tracing::warn!("Failed to restore journal_mode: {e}");
        }
        if let Err(e) = conn.pragma_update(None, "synchronous", self.synchronous) {
            tracing::warn!("Failed to restore synchronous: {e}");
        }
        if let Err(e) = conn.pragma_update(None, "foreign_keys", self.foreign_keys) {
            tracing::warn!("Failed to restore foreign_keys: {e}");
        }
        // An exclusive lock is only given up on the next access to the file.
        if let Err(e) =
            conn.query_row("SELECT COUNT(*) FROM sqlite_master", [], |r| r.get::<_, i64>(0))
        {
            tracing::warn!("Failed to release the exclusive lock: {e}");
        }
        tracing::debug!("restored durability settings");
    }
}

fn quote(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

fn collect_rows<P: Params>(stmt: &mut Statement<'_>, params: P) -> rusqlite::Result<Vec<Row>> {
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let mut rows = stmt.query(params)?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let mut obj = Row::new();
        for (i, name) in columns.iter().enumerate() {
            obj.insert(name.clone(), to_json(row.get_ref(i)?));
        }
        out.push(obj);
    }
    Ok(out)
}

fn to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f).map_or(Value::Null, Value::Number),
        ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::Array(b.iter().map(|&byte| Value::from(byte)).collect()),
    }
}

fn to_sql(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => n
            .as_i64()
            .map(SqlValue::Integer)
            .or_else(|| n.as_f64().map(SqlValue::Real))
            .unwrap_or(SqlValue::Null),
        Value::String(s) => SqlValue::Text(s.clone()),
        Value::Array(items) => items
            .iter()
            .map(|v| v.as_u64().and_then(|b| u8::try_from(b).ok()))
            .collect::<Option<Vec<u8>>>()
            .map_or_else(|| SqlValue::Text(value.to_string()), SqlValue::Blob),
        Value::Object(_) => SqlValue::Text(value.to_string()),
    }
}
