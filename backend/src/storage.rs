//! SQLite persistence of users, lookup requests and lookup results.
//!
//! Users and lookup results are written by the directory sync and the registry worker. This
//! server only creates requests and reads results back as a [`ReportSource`].

use crate::error::StoreError;
use chrono::{DateTime, Utc};
use common::model::report::{KeyRecord, OwnershipEvent, ReportSource, RequestMetadata, StoredTime};
use common::model::request::{CandidateRequest, RequestType};
use common::model::user::{Permission, UserRef};
use log::warn;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use uuid::Uuid;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id              TEXT PRIMARY KEY,
    name            TEXT NOT NULL,
    can_request_pix INTEGER NOT NULL DEFAULT 0,
    can_request_ccs INTEGER NOT NULL DEFAULT 0
);
CREATE TABLE IF NOT EXISTS requests (
    id           TEXT PRIMARY KEY,
    user_id      TEXT NOT NULL REFERENCES users(id),
    request_type TEXT NOT NULL,
    search_term  TEXT NOT NULL,
    reason       TEXT NOT NULL,
    reference    TEXT NOT NULL DEFAULT '',
    created      TEXT NOT NULL,
    processed    INTEGER NOT NULL DEFAULT 0
);
CREATE TABLE IF NOT EXISTS pix_keys (
    id                INTEGER PRIMARY KEY AUTOINCREMENT,
    request_id        TEXT NOT NULL REFERENCES requests(id) ON DELETE CASCADE,
    position          INTEGER NOT NULL,
    key               TEXT,
    key_type          TEXT,
    status            TEXT,
    holder_document   TEXT,
    holder_name       TEXT,
    institution       TEXT,
    branch            TEXT,
    account_number    TEXT,
    account_type      TEXT,
    account_opened_at TEXT
);
CREATE TABLE IF NOT EXISTS ownership_events (
    id                INTEGER PRIMARY KEY AUTOINCREMENT,
    key_id            INTEGER NOT NULL REFERENCES pix_keys(id) ON DELETE CASCADE,
    position          INTEGER NOT NULL,
    occurred_at       TEXT,
    event_type        TEXT,
    event_reason      TEXT,
    holder_document   TEXT,
    holder_name       TEXT,
    institution       TEXT,
    branch            TEXT,
    account_number    TEXT,
    account_opened_at TEXT
);
"#;

/// Opens the database and makes sure the schema exists.
pub fn open(path: impl AsRef<Path>) -> Result<Connection, StoreError> {
    let conn = Connection::open(path)?;
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.execute_batch(SCHEMA)?;
    Ok(conn)
}

pub fn find_user(conn: &Connection, user_id: &str) -> Result<Option<UserRef>, StoreError> {
    let user = conn
        .query_row(
            "SELECT id, name, can_request_pix, can_request_ccs FROM users WHERE id = ?1",
            params![user_id],
            |row| {
                let mut permissions = Vec::new();
                if row.get::<_, bool>(2)? {
                    permissions.push(Permission::RequestPix);
                }
                if row.get::<_, bool>(3)? {
                    permissions.push(Permission::RequestCcs);
                }
                Ok(UserRef {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    permissions,
                })
            },
        )
        .optional()?;
    Ok(user)
}

/// Inserts all `records` in one transaction and returns their new ids, in order.
///
/// If any insert fails the transaction is rolled back and nothing is kept.
pub fn insert_requests(
    conn: &mut Connection,
    records: &[CandidateRequest],
    created: DateTime<Utc>,
) -> Result<Vec<String>, StoreError> {
    let tx = conn.transaction()?;
    let created = created.to_rfc3339();
    let mut ids = Vec::with_capacity(records.len());
    {
        let mut stmt = tx.prepare(
            "INSERT INTO requests (id, user_id, request_type, search_term, reason, reference, created)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )?;
        for record in records {
            let id = Uuid::new_v4().to_string();
            stmt.execute(params![
                id,
                record.requested_by.id,
                record.request_type.code(),
                record.search_term,
                record.reason,
                record.reference,
                created,
            ])?;
            ids.push(id);
        }
    }
    tx.commit()?;
    Ok(ids)
}

/// A stored request together with the id of the user who owns it.
#[derive(Debug, Clone)]
pub struct OwnedReport {
    pub owner_id: String,
    pub source: ReportSource,
}

fn stored_time(raw: Option<String>, column: &str) -> Option<StoredTime> {
    let raw = raw?;
    let parsed = StoredTime::parse(&raw);
    if parsed.is_none() && !raw.trim().is_empty() {
        warn!("Ignoring unparseable timestamp in {}: {:?}", column, raw);
    }
    parsed
}

fn key_from_row(row: &Row<'_>) -> rusqlite::Result<(i64, KeyRecord)> {
    Ok((
        row.get(0)?,
        KeyRecord {
            key: row.get(1)?,
            key_type: row.get(2)?,
            status: row.get(3)?,
            holder_document: row.get(4)?,
            holder_name: row.get(5)?,
            institution: row.get(6)?,
            branch: row.get(7)?,
            account_number: row.get(8)?,
            account_type: row.get(9)?,
            account_opened_at: stored_time(row.get(10)?, "pix_keys.account_opened_at"),
            events: Vec::new(),
        },
    ))
}

fn event_from_row(row: &Row<'_>) -> rusqlite::Result<OwnershipEvent> {
    Ok(OwnershipEvent {
        occurred_at: stored_time(row.get(0)?, "ownership_events.occurred_at"),
        event_type: row.get(1)?,
        event_reason: row.get(2)?,
        holder_document: row.get(3)?,
        holder_name: row.get(4)?,
        institution: row.get(5)?,
        branch: row.get(6)?,
        account_number: row.get(7)?,
        account_opened_at: stored_time(row.get(8)?, "ownership_events.account_opened_at"),
    })
}

/// Loads a request and its lookup result, or `None` if the request does not exist.
pub fn load_report_source(
    conn: &Connection,
    request_id: &str,
) -> Result<Option<OwnedReport>, StoreError> {
    let header = conn
        .query_row(
            "SELECT r.user_id, r.request_type, r.search_term, r.reason, u.name, r.created
             FROM requests r LEFT JOIN users u ON u.id = r.user_id
             WHERE r.id = ?1",
            params![request_id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, Option<String>>(4)?,
                    row.get::<_, Option<String>>(5)?,
                ))
            },
        )
        .optional()?;

    let Some((owner_id, code, search_term, reason, requester_name, created)) = header else {
        return Ok(None);
    };
    let request_type = RequestType::from_code(&code).ok_or(StoreError::InvalidColumn {
        column: "requests.request_type",
        value: code.clone(),
    })?;

    let mut key_stmt = conn.prepare(
        "SELECT id, key, key_type, status, holder_document, holder_name, institution, branch,
                account_number, account_type, account_opened_at
         FROM pix_keys WHERE request_id = ?1 ORDER BY position",
    )?;
    let keys_with_ids = key_stmt
        .query_map(params![request_id], key_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    let mut event_stmt = conn.prepare(
        "SELECT occurred_at, event_type, event_reason, holder_document, holder_name, institution,
                branch, account_number, account_opened_at
         FROM ownership_events WHERE key_id = ?1 ORDER BY position",
    )?;
    let mut keys = Vec::with_capacity(keys_with_ids.len());
    for (key_id, mut key) in keys_with_ids {
        key.events = event_stmt
            .query_map(params![key_id], event_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        keys.push(key);
    }

    Ok(Some(OwnedReport {
        owner_id,
        source: ReportSource {
            request: RequestMetadata {
                request_type,
                search_term,
                reason,
                requester_name,
                created_at: stored_time(created, "requests.created"),
            },
            keys,
        },
    }))
}
