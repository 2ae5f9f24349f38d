//! Creation of registry lookup requests.
//!
//! The provided routes are:
//! - `POST /api/requests`: the interactive form. Expects a JSON `CreateRequest` and creates a
//!   single request. Accepts Pix document (`1`), Pix key (`2`) and CCS document (`3`) lookups.
//!
//! - `POST /api/requests/bulk`: multipart/form-data upload with an `arquivo_txt` field holding a
//!   `.txt` file, one request per line (`tipo;termo;motivo[;referencia]`, `,` also accepted).
//!   Valid lines are stored in a single transaction; rejected lines are returned with their line
//!   number and the reason. Only Pix lookups are accepted in bulk.
//!
//! Both routes identify the requester through the `X-Remote-User` header.

use actix_web::web::{post, scope};
use actix_web::Scope;

pub mod batch;
mod bulk;
mod create;
pub mod line;

const API_PATH: &str = "/api/requests";

/// Configures and returns the Actix scope for request creation routes.
pub fn configure_routes() -> Scope {
    scope(API_PATH)
        // Route to upload a bulk request file.
        .route("/bulk", post().to(bulk::process))
        // Route to create a single request from the form.
        .route("", post().to(create::process))
}
