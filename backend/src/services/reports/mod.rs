//! # Report Service Module
//!
//! Turns the stored result of a Pix lookup into a downloadable PDF.
//!
//! ## Sub-modules:
//! - `normalize`: projects the stored result into display strings in Brasília time.
//! - `layout`: builds the block structure of the summary and detailed reports.
//! - `pdf`: paints a layout with genpdf.
//! - `download`: the HTTP handler, including ownership checks and the file name.

mod download;
pub mod layout;
pub mod normalize;
pub mod pdf;

use actix_web::web::{get, scope};
use actix_web::Scope;

/// The base path for all report endpoints.
const API_PATH: &str = "/api/reports";

/// Configures and returns the Actix `Scope` for report routes.
///
/// # Registered Routes:
///
/// *   **`GET /{request_id}`**:
///     - **Handler**: `download::process`
///     - **Description**: Renders the report of a request owned by the caller. The optional
///       `report_type` query parameter selects `summary`; anything else yields `detailed`.
pub fn configure_routes() -> Scope {
    scope(API_PATH).route("/{request_id}", get().to(download::process))
}
