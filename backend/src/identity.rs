use crate::error::AppError;
use crate::storage;
use actix_web::HttpRequest;
use common::model::user::UserRef;
use rusqlite::Connection;

/// Header set by the authenticating reverse proxy in front of the server.
pub const REMOTE_USER_HEADER: &str = "X-Remote-User";

/// Resolves the user making the request. Unknown or missing users are unauthenticated.
pub fn requester(req: &HttpRequest, conn: &Connection) -> Result<UserRef, AppError> {
    let user_id = req
        .headers()
        .get(REMOTE_USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(AppError::Unauthenticated)?;
    storage::find_user(conn, user_id)?.ok_or(AppError::Unauthenticated)
}
