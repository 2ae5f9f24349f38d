use crate::config::Settings;
use crate::error::{AppError, ReportError};
use crate::identity;
use crate::services::reports::layout::{build_layout, ReportVariant};
use crate::services::reports::normalize::{brazil_offset, normalize};
use crate::services::reports::pdf::{self, RenderSettings};
use crate::storage;
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use chrono::Utc;
use common::model::report::RequestMetadata;
use common::requests::ReportQuery;
use log::{info, warn};
use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

static RE_NOT_SLUG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s-]").unwrap());
static RE_SEPARATORS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[-\s]+").unwrap());

/// Actix web handler for `GET /api/reports/{request_id}?report_type=summary|detailed`.
///
/// # Returns
/// - `200 OK` with the PDF as an attachment.
/// - `404 Not Found` for an unknown request, `403 Forbidden` for a request owned by someone
///   else.
pub async fn process(
    req: HttpRequest,
    request_id: web::Path<String>,
    query: web::Query<ReportQuery>,
    settings: web::Data<Settings>,
) -> impl Responder {
    match generate_report(&req, &request_id, &query, &settings).await {
        Ok((filename, bytes)) => HttpResponse::Ok()
            .content_type("application/pdf")
            .insert_header(ContentDisposition {
                disposition: DispositionType::Attachment,
                parameters: vec![DispositionParam::Filename(filename)],
            })
            .body(bytes),
        Err(e) => {
            warn!("Report for {} refused: {}", request_id.as_str(), e);
            e.to_response()
        }
    }
}

pub async fn generate_report(
    req: &HttpRequest,
    request_id: &str,
    query: &ReportQuery,
    settings: &Settings,
) -> Result<(String, Vec<u8>), AppError> {
    let conn = storage::open(&settings.storage.database_path)?;
    let requester = identity::requester(req, &conn)?;

    let owned = storage::load_report_source(&conn, request_id)?
        .ok_or_else(|| AppError::NotFound("Requisição não encontrada.".to_string()))?;
    if owned.owner_id != requester.id {
        return Err(AppError::Forbidden(
            "Você não tem permissão para acessar este relatório.".to_string(),
        ));
    }

    let variant = ReportVariant::parse(query.report_type.as_deref());
    let filename = report_filename(variant, &owned.source.request);
    let layout = build_layout(&normalize(&owned.source, brazil_offset()), variant);
    let render_settings = RenderSettings {
        fonts_dir: settings.reports.fonts_dir.clone(),
        font_family: settings.reports.font_family.clone(),
        generated_at: Utc::now().with_timezone(&brazil_offset()),
    };

    let painted = tokio::task::spawn_blocking(move || pdf::render(&layout, &render_settings))
        .await
        .map_err(ReportError::from)??;

    info!(
        "Report {} ({}) generated for {}: {} pages, {} bytes",
        request_id,
        variant.as_str(),
        requester.id,
        painted.pages,
        painted.bytes.len()
    );
    Ok((filename, painted.bytes))
}

/// Lowercase ASCII slug: accents are stripped, runs of spaces and hyphens become one `-`.
pub fn slugify(value: &str) -> String {
    let ascii: String = value.nfkd().filter(char::is_ascii).collect();
    let cleaned = RE_NOT_SLUG.replace_all(&ascii.to_lowercase(), "").into_owned();
    RE_SEPARATORS
        .replace_all(&cleaned, "-")
        .trim_matches(|c: char| c == '-' || c == '_')
        .to_string()
}

/// `relatorio_<variant>_<YYYYMMDD or unknown>_<slug of the search term>.pdf`
pub fn report_filename(variant: ReportVariant, request: &RequestMetadata) -> String {
    let date = request
        .created_at
        .map(|t| t.stored_date().format("%Y%m%d").to_string())
        .unwrap_or_else(|| "unknown".to_string());
    format!(
        "relatorio_{}_{}_{}.pdf",
        variant.as_str(),
        date,
        slugify(&request.search_term)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::REMOTE_USER_HEADER;
    use crate::services::reports::configure_routes;
    use crate::test_support::{settings_with_users, store_lookup_result, user};
    use actix_web::http::StatusCode;
    use actix_web::test as atest;
    use actix_web::App;
    use common::model::report::{KeyRecord, StoredTime};
    use common::model::request::{CandidateRequest, RequestType};
    use common::model::user::Permission;

    fn request(term: &str, created: Option<&str>) -> RequestMetadata {
        RequestMetadata {
            request_type: RequestType::PixKey,
            search_term: term.to_string(),
            reason: "motivo".to_string(),
            requester_name: None,
            created_at: created.and_then(StoredTime::parse),
        }
    }

    #[test]
    fn slug_strips_accents_and_punctuation() {
        assert_eq!(slugify("João da Silva"), "joao-da-silva");
        assert_eq!(slugify("fulano@exemplo.com.br"), "fulanoexemplocombr");
        assert_eq!(slugify("  --Ação  _x_ "), "acao-_x");
        assert_eq!(slugify("+55 (11) 99999-0000"), "55-11-99999-0000");
    }

    #[test]
    fn filename_uses_stored_date_and_variant() {
        let req = request("11144477735", Some("2024-05-10T23:30:00Z"));
        assert_eq!(
            report_filename(ReportVariant::Summary, &req),
            "relatorio_summary_20240510_11144477735.pdf"
        );
        assert_eq!(
            report_filename(ReportVariant::Detailed, &req),
            "relatorio_detailed_20240510_11144477735.pdf"
        );
    }

    #[test]
    fn filename_without_creation_date() {
        let req = request("Chave Aleatória", None);
        assert_eq!(
            report_filename(ReportVariant::Detailed, &req),
            "relatorio_detailed_unknown_chave-aleatoria.pdf"
        );
    }

    /// Settings with two investigators and one processed request owned by `ana`.
    fn seeded(dir: &tempfile::TempDir) -> (Settings, String) {
        let ana = user("ana", &[Permission::RequestPix]);
        let bia = user("bia", &[Permission::RequestPix]);
        let settings = settings_with_users(dir, &[ana.clone(), bia]);
        let mut conn = storage::open(&settings.storage.database_path).unwrap();
        let ids = storage::insert_requests(
            &mut conn,
            &[CandidateRequest {
                request_type: RequestType::PixKey,
                search_term: "chave@x.com".to_string(),
                reason: "IPL 9/2024".to_string(),
                reference: String::new(),
                requested_by: ana,
            }],
            Utc::now(),
        )
        .unwrap();
        store_lookup_result(
            &mut conn,
            &ids[0],
            &[KeyRecord {
                key: Some("chave@x.com".to_string()),
                status: Some("ATIVO".to_string()),
                ..Default::default()
            }],
        )
        .unwrap();
        (settings, ids[0].clone())
    }

    fn get(uri: &str, user_id: &str) -> atest::TestRequest {
        atest::TestRequest::get()
            .uri(uri)
            .insert_header((REMOTE_USER_HEADER, user_id.to_string()))
    }

    #[actix_web::test]
    async fn reports_are_only_served_to_their_owner() {
        let dir = tempfile::tempdir().unwrap();
        let (settings, id) = seeded(&dir);
        let app = atest::init_service(
            App::new()
                .app_data(web::Data::new(settings))
                .service(configure_routes()),
        )
        .await;

        let req = get(&format!("/api/reports/{id}"), "bia").to_request();
        let resp = atest::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let req = get("/api/reports/does-not-exist", "ana").to_request();
        let resp = atest::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn owner_downloads_the_summary_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let (settings, id) = seeded(&dir);
        let app = atest::init_service(
            App::new()
                .app_data(web::Data::new(settings))
                .service(configure_routes()),
        )
        .await;

        let uri = format!("/api/reports/{id}?report_type=summary");
        let resp = atest::call_service(&app, get(&uri, "ana").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let disposition = resp
            .headers()
            .get("content-disposition")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .unwrap();
        assert!(disposition.contains("relatorio_summary_"));
        assert!(disposition.contains("_chavexcom.pdf"));
        let body = atest::read_body(resp).await;
        assert!(body.starts_with(b"%PDF"));
    }
}
