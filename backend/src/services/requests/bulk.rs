use crate::config::Settings;
use crate::error::{AppError, BatchError};
use crate::identity;
use crate::services::requests::batch::{self, Upload, MAX_UPLOAD_BYTES};
use crate::storage;
use actix_multipart::Multipart;
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use chrono::Utc;
use common::requests::BulkUploadSummary;
use futures_util::StreamExt;
use log::{info, warn};

/// Name of the multipart field carrying the file.
const FILE_FIELD: &str = "arquivo_txt";

/// HTTP handler wrapper that converts internal result to an `HttpResponse`.
///
/// - On success: returns `200 OK` with a `BulkUploadSummary` JSON body.
/// - On failure: returns the status of the error with its message.
pub async fn process(
    req: HttpRequest,
    payload: Multipart,
    settings: web::Data<Settings>,
) -> impl Responder {
    match upload_bulk_requests(&req, payload, &settings).await {
        Ok(summary) => HttpResponse::Ok().json(summary),
        Err(e) => {
            warn!("Bulk upload refused: {}", e);
            e.to_response()
        }
    }
}

/// Reads the `arquivo_txt` field. Stops as soon as the size cap is exceeded.
async fn read_upload(mut payload: Multipart) -> Result<Option<Upload>, AppError> {
    let mut upload: Option<Upload> = None;

    while let Some(item) = payload.next().await {
        let mut field = item?;
        let field_name = field
            .content_disposition()
            .and_then(|cd| cd.get_name().map(|n| n.to_string()));

        if field_name.as_deref() != Some(FILE_FIELD) {
            while let Some(chunk) = field.next().await {
                chunk?;
            }
            continue;
        }

        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename().map(|f| f.to_string()))
            .unwrap_or_default();

        let mut bytes: Vec<u8> = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk?;
            bytes.extend_from_slice(&chunk);
            if bytes.len() > MAX_UPLOAD_BYTES {
                return Err(BatchError::TooLarge {
                    size: bytes.len(),
                    max: MAX_UPLOAD_BYTES,
                }
                .into());
            }
        }
        upload = Some(Upload { filename, bytes });
    }

    Ok(upload)
}

/// Validates an uploaded request file and stores every valid line.
///
/// Line errors do not fail the upload; they are returned in `erros`. Upload-shape and
/// decoding errors, as well as a failed insert, fail it as a whole.
pub async fn upload_bulk_requests(
    req: &HttpRequest,
    payload: Multipart,
    settings: &Settings,
) -> Result<BulkUploadSummary, AppError> {
    let mut conn = storage::open(&settings.storage.database_path)?;
    let requester = identity::requester(req, &conn)?;

    let upload = read_upload(payload).await?;
    let outcome = batch::process(upload.as_ref(), &requester)?;

    let created = storage::insert_requests(&mut conn, &outcome.accepted, Utc::now())?;

    info!(
        "Bulk upload by {}: {} accepted, {} rejected",
        requester.id,
        outcome.accepted.len(),
        outcome.rejected.len()
    );

    Ok(BulkUploadSummary {
        total_linhas: outcome.total_lines(),
        requisicoes_validas: outcome.accepted.len(),
        requisicoes_invalidas: outcome.rejected.len(),
        requisicoes_criadas: created,
        erros: outcome.rejected,
    })
}
