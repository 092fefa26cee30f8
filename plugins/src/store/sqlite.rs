//! Read-only access to the host application's SQLite conversation database.
//!
//! The table layout belongs to the host application and is taken from
//! [`StoreSchema`]. Identifiers are validated before they are placed in SQL.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use rusqlite::types::ValueRef;
use rusqlite::{params, Connection, OpenFlags};

use histbridge_core::api::{
    ConversationRecord, ConversationStore, MessageEntry, StoreConnector, StoreError, StoreSchema,
    TimestampFormat, Watermark,
};

pub struct SqliteConnector {
    path: PathBuf,
    schema: StoreSchema,
}

impl SqliteConnector {
    pub fn new(path: impl Into<PathBuf>, schema: StoreSchema) -> Self {
        Self {
            path: path.into(),
            schema,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn unavailable(&self, reason: impl Into<String>) -> StoreError {
        StoreError::Unavailable {
            path: self.path.clone(),
            reason: reason.into(),
        }
    }
}

impl StoreConnector for SqliteConnector {
    fn location(&self) -> String {
        self.path.display().to_string()
    }

    fn open(&self) -> Result<Box<dyn ConversationStore>, StoreError> {
        let (query, has_title) =
            build_query(&self.schema).map_err(|reason| self.unavailable(reason))?;

        if !self.path.exists() {
            return Err(self.unavailable("database not found"));
        }

        let conn = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| self.unavailable(format!("failed to open database: {e}")))?;

        Ok(Box::new(SqliteConversationStore {
            conn,
            query,
            has_title,
            format: self.schema.timestamp_format,
        }))
    }
}

pub struct SqliteConversationStore {
    conn: Connection,
    query: String,
    has_title: bool,
    format: TimestampFormat,
}

/// One row before decoding; logging happens outside the rusqlite closure.
struct RawRow {
    id: Option<String>,
    updated_at: Option<DateTime<Utc>>,
    messages: Option<String>,
    title: Option<String>,
}

impl ConversationStore for SqliteConversationStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn fetch_since(
        &self,
        since: &Watermark,
        limit: usize,
    ) -> Result<Vec<ConversationRecord>, StoreError> {
        let query_err = |e: rusqlite::Error| StoreError::Query(e.to_string());
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let format = self.format;
        let has_title = self.has_title;

        let mut stmt = self.conn.prepare_cached(&self.query).map_err(query_err)?;
        let row_to_raw = |row: &rusqlite::Row<'_>| -> rusqlite::Result<RawRow> {
            Ok(RawRow {
                id: text_of(row.get_ref(0)?),
                updated_at: timestamp_of(row.get_ref(1)?, format),
                messages: text_of(row.get_ref(2)?),
                title: if has_title {
                    text_of(row.get_ref(3)?)
                } else {
                    None
                },
            })
        };
        let rows = match format {
            TimestampFormat::Rfc3339 => stmt.query_map(
                params![since.at().to_rfc3339_opts(SecondsFormat::AutoSi, true), limit],
                row_to_raw,
            ),
            TimestampFormat::UnixMillis => {
                stmt.query_map(params![since.at().timestamp_millis(), limit], row_to_raw)
            }
        }
        .map_err(query_err)?;

        let mut records = Vec::new();
        for row in rows {
            let raw = row.map_err(query_err)?;
            let Some(updated_at) = raw.updated_at else {
                tracing::warn!(
                    id = raw.id.as_deref().unwrap_or("unknown"),
                    "skipping conversation with unreadable update time"
                );
                continue;
            };
            let messages = decode_messages(raw.id.as_deref(), raw.messages.as_deref());
            records.push(ConversationRecord {
                id: raw.id,
                title: raw.title,
                updated_at,
                messages,
            });
        }
        Ok(records)
    }
}

/// The SELECT for `fetch_since`, and whether it includes a title column.
fn build_query(schema: &StoreSchema) -> Result<(String, bool), String> {
    let table = quoted(&schema.table)?;
    let id = quoted(&schema.id_column)?;
    let updated_at = quoted(&schema.updated_at_column)?;
    let messages = quoted(&schema.messages_column)?;

    let mut columns = format!("{id}, {updated_at}, {messages}");
    let title = schema
        .title_column
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    if let Some(title) = title {
        columns.push_str(", ");
        columns.push_str(&quoted(title)?);
    }

    let key = ordering_key(&updated_at, schema.timestamp_format);
    let sql = format!(
        "SELECT {columns} FROM {table} WHERE {key} > {bound} ORDER BY {key} DESC LIMIT ?2",
        bound = bound_key(schema.timestamp_format),
    );
    Ok((sql, title.is_some()))
}

/// SQL expression that turns the stored update time into a comparable number,
/// whatever text or integer form the row uses. NULL when it is unreadable.
fn ordering_key(column: &str, format: TimestampFormat) -> String {
    match format {
        TimestampFormat::Rfc3339 => format!(
            "(CASE typeof({column}) WHEN 'integer' THEN julianday({column}, 'unixepoch') \
             ELSE julianday({column}) END)"
        ),
        TimestampFormat::UnixMillis => format!(
            "(CASE typeof({column}) WHEN 'integer' THEN {column} \
             ELSE CAST(round((julianday({column}) - 2440587.5) * 86400000.0) AS INTEGER) END)"
        ),
    }
}

fn bound_key(format: TimestampFormat) -> &'static str {
    match format {
        TimestampFormat::Rfc3339 => "julianday(?1)",
        TimestampFormat::UnixMillis => "?1",
    }
}

fn quoted(ident: &str) -> Result<String, String> {
    let mut chars = ident.chars();
    let valid_start = chars
        .next()
        .map(|c| c.is_ascii_alphabetic() || c == '_')
        .unwrap_or(false);
    if !valid_start || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(format!("invalid SQL identifier in store schema: {ident:?}"));
    }
    Ok(format!("\"{ident}\""))
}

fn text_of(value: ValueRef<'_>) -> Option<String> {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(i) => Some(i.to_string()),
        ValueRef::Real(f) => Some(f.to_string()),
        ValueRef::Text(t) | ValueRef::Blob(t) => Some(String::from_utf8_lossy(t).into_owned()),
    }
}

fn timestamp_of(value: ValueRef<'_>, format: TimestampFormat) -> Option<DateTime<Utc>> {
    match value {
        ValueRef::Integer(i) => match format {
            TimestampFormat::UnixMillis => Utc.timestamp_millis_opt(i).single(),
            TimestampFormat::Rfc3339 => Utc.timestamp_opt(i, 0).single(),
        },
        ValueRef::Text(t) => parse_timestamp(std::str::from_utf8(t).ok()?),
        _ => None,
    }
}

/// RFC 3339, or SQLite's `YYYY-MM-DD HH:MM:SS[.fff]` read as UTC.
fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Entries are decoded one at a time so a single malformed entry is dropped
/// without losing the rest of the conversation.
fn decode_messages(id: Option<&str>, raw: Option<&str>) -> Vec<MessageEntry> {
    let id = id.unwrap_or("unknown");
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Vec::new();
    };
    let entries = match serde_json::from_str::<Vec<serde_json::Value>>(raw) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(id, "messages column is not a message list: {e}");
            return Vec::new();
        }
    };
    entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| match serde_json::from_value(entry) {
            Ok(message) => Some(message),
            Err(e) => {
                tracing::warn!(id, index, "skipping unreadable message: {e}");
                None
            }
        })
        .collect()
}
