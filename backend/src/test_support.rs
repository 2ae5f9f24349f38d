//! Fixtures shared by the handler and report tests.

use crate::config::Settings;
use crate::error::StoreError;
use crate::storage;
use common::model::report::KeyRecord;
use common::model::user::{Permission, UserRef};
use rusqlite::{params, Connection};
use std::path::PathBuf;
use tempfile::TempDir;

/// TTF family checked in next to the crate manifest.
pub const FIXTURE_FONT_FAMILY: &str = "DejaVuSans";

pub fn fixture_fonts_dir() -> PathBuf {
    PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/fonts"))
}

pub fn user(id: &str, permissions: &[Permission]) -> UserRef {
    UserRef {
        id: id.to_string(),
        name: format!("Usuário {id}"),
        permissions: permissions.to_vec(),
    }
}

/// Stands in for the directory sync that provisions users.
pub fn save_user(conn: &Connection, user: &UserRef) -> Result<(), StoreError> {
    conn.execute(
        "INSERT OR REPLACE INTO users (id, name, can_request_pix, can_request_ccs) VALUES (?1, ?2, ?3, ?4)",
        params![
            user.id,
            user.name,
            user.has_permission(Permission::RequestPix),
            user.has_permission(Permission::RequestCcs),
        ],
    )?;
    Ok(())
}

/// Replaces the lookup result of a request and marks it processed, as the registry worker
/// does.
pub fn store_lookup_result(
    conn: &mut Connection,
    request_id: &str,
    keys: &[KeyRecord],
) -> Result<(), StoreError> {
    let tx = conn.transaction()?;
    tx.execute("DELETE FROM pix_keys WHERE request_id = ?1", params![request_id])?;
    for (position, key) in keys.iter().enumerate() {
        tx.execute(
            "INSERT INTO pix_keys (request_id, position, key, key_type, status, holder_document,
                 holder_name, institution, branch, account_number, account_type, account_opened_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                request_id,
                position as i64,
                key.key,
                key.key_type,
                key.status,
                key.holder_document,
                key.holder_name,
                key.institution,
                key.branch,
                key.account_number,
                key.account_type,
                key.account_opened_at.map(|t| t.to_string()),
            ],
        )?;
        let key_id = tx.last_insert_rowid();
        for (event_position, event) in key.events.iter().enumerate() {
            tx.execute(
                "INSERT INTO ownership_events (key_id, position, occurred_at, event_type, event_reason,
                     holder_document, holder_name, institution, branch, account_number, account_opened_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    key_id,
                    event_position as i64,
                    event.occurred_at.map(|t| t.to_string()),
                    event.event_type,
                    event.event_reason,
                    event.holder_document,
                    event.holder_name,
                    event.institution,
                    event.branch,
                    event.account_number,
                    event.account_opened_at.map(|t| t.to_string()),
                ],
            )?;
        }
    }
    tx.execute(
        "UPDATE requests SET processed = 1 WHERE id = ?1",
        params![request_id],
    )?;
    tx.commit()?;
    Ok(())
}

/// Default settings pointing at a fresh database in `dir`, with `users` already saved and the
/// fixture fonts configured.
pub fn settings_with_users(dir: &TempDir, users: &[UserRef]) -> Settings {
    let mut settings = Settings::defaults().expect("embedded defaults");
    settings.storage.database_path = dir.path().join("consultalab.sqlite");
    settings.reports.fonts_dir = fixture_fonts_dir();
    settings.reports.font_family = FIXTURE_FONT_FAMILY.to_string();
    let conn = storage::open(&settings.storage.database_path).expect("database");
    for user in users {
        save_user(&conn, user).expect("user saved");
    }
    settings
}
