use crate::config::Settings;
use crate::error::AppError;
use crate::identity;
use crate::services::requests::line::{self, Rejection};
use crate::storage;
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use chrono::Utc;
use common::requests::CreateRequest;
use log::info;

/// Actix web handler for `POST /api/requests`.
///
/// # Returns
/// - `201 Created` with `{"id": ...}` when the request was stored.
/// - `400 Bad Request` when a field is invalid, `403 Forbidden` when the user lacks the
///   permission for the lookup type.
pub async fn process(
    req: HttpRequest,
    payload: web::Json<CreateRequest>,
    settings: web::Data<Settings>,
) -> impl Responder {
    match create_request(&req, &payload, &settings) {
        Ok(id) => HttpResponse::Created().json(serde_json::json!({ "id": id })),
        Err(e) => e.to_response(),
    }
}

pub fn create_request(
    req: &HttpRequest,
    payload: &CreateRequest,
    settings: &Settings,
) -> Result<String, AppError> {
    let mut conn = storage::open(&settings.storage.database_path)?;
    let requester = identity::requester(req, &conn)?;

    let record = line::validate_form(payload, &requester).map_err(|rejection| {
        info!("Form request by {} refused: {}", requester.id, rejection.message());
        match rejection {
            Rejection::Invalid(m) => AppError::Invalid(m),
            Rejection::Unauthorized(m) => AppError::Forbidden(m),
        }
    })?;

    let mut ids = storage::insert_requests(&mut conn, std::slice::from_ref(&record), Utc::now())?;
    let id = ids
        .pop()
        .ok_or_else(|| AppError::Invalid("Nenhuma requisição criada.".to_string()))?;
    info!(
        "Request {} ({}) created by {}",
        id, record.request_type, requester.id
    );
    Ok(id)
}
