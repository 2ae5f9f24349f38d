//! Validation of a single lookup request, either one line of a bulk upload or the
//! interactive form.
//!
//! Both entry points feed a [`Draft`] through the same ordered list of checks. The first
//! failing check wins, so format problems are always reported before authorization.

use crate::documents::{self, DocumentKind};
use common::model::request::{CandidateRequest, LineError, RequestType};
use common::model::user::UserRef;
use common::requests::CreateRequest;

const MIN_FIELDS: usize = 3;

/// Which surface the request came from. Bulk uploads only accept Pix lookups and use
/// terse per-line messages; the form also accepts CCS lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Bulk,
    Interactive,
}

/// Why a request was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    Invalid(String),
    Unauthorized(String),
}

impl Rejection {
    pub fn message(&self) -> &str {
        match self {
            Rejection::Invalid(m) | Rejection::Unauthorized(m) => m,
        }
    }

    fn into_message(self) -> String {
        match self {
            Rejection::Invalid(m) | Rejection::Unauthorized(m) => m,
        }
    }
}

/// Fields of a request while it goes through the checks.
#[derive(Debug, Default)]
struct Draft {
    code: String,
    request_type: Option<RequestType>,
    search_term: String,
    reason: String,
    reference: String,
}

type Check = fn(&mut Draft, Mode, &UserRef) -> Result<(), Rejection>;

const CHECKS: [Check; 4] = [
    resolve_request_type,
    require_term_and_reason,
    normalize_document,
    authorize,
];

fn resolve_request_type(draft: &mut Draft, mode: Mode, _: &UserRef) -> Result<(), Rejection> {
    let request_type = RequestType::from_code(&draft.code).filter(|t| match mode {
        Mode::Bulk => *t != RequestType::CcsDocument,
        Mode::Interactive => true,
    });
    match request_type {
        Some(t) => {
            draft.request_type = Some(t);
            Ok(())
        }
        None => Err(Rejection::Invalid(match mode {
            Mode::Bulk => "tipo_requisicao deve ser 1 (Pix CPF/CNPJ) ou 2 (Pix Chave)".to_string(),
            Mode::Interactive => "tipo_requisicao deve ser 1, 2 ou 3".to_string(),
        })),
    }
}

fn require_term_and_reason(draft: &mut Draft, mode: Mode, _: &UserRef) -> Result<(), Rejection> {
    match mode {
        Mode::Bulk => {
            if draft.search_term.is_empty() || draft.reason.is_empty() {
                return Err(Rejection::Invalid(
                    "termo_busca e motivo são obrigatórios".to_string(),
                ));
            }
        }
        Mode::Interactive => {
            if draft.search_term.is_empty() {
                return Err(Rejection::Invalid(
                    "O termo de busca é obrigatório para este tipo de requisição.".to_string(),
                ));
            }
            if draft.reason.is_empty() {
                return Err(Rejection::Invalid("O motivo é obrigatório.".to_string()));
            }
        }
    }
    Ok(())
}

fn normalize_document(draft: &mut Draft, mode: Mode, _: &UserRef) -> Result<(), Rejection> {
    let is_document = draft
        .request_type
        .is_some_and(RequestType::is_document_lookup);
    if !is_document {
        return Ok(());
    }

    let digits = documents::strip_non_digits(&draft.search_term);
    let message = |bulk: &str, form: &str| {
        Rejection::Invalid(match mode {
            Mode::Bulk => bulk.to_string(),
            Mode::Interactive => form.to_string(),
        })
    };

    if digits.is_empty() {
        return Err(message(
            "termo_busca deve conter apenas números",
            "O termo de busca deve conter apenas números.",
        ));
    }
    match DocumentKind::from_len(digits.len()) {
        Some(kind) if documents::validate(kind, &digits) => {
            draft.search_term = digits;
            Ok(())
        }
        Some(DocumentKind::Cpf) => Err(message(
            "CPF inválido",
            "O termo de busca deve ser um CPF válido.",
        )),
        Some(DocumentKind::Cnpj) => Err(message(
            "CNPJ inválido",
            "O termo de busca deve ser um CNPJ válido.",
        )),
        None => Err(message(
            "Documento deve ter 11 dígitos (CPF) ou 14 dígitos (CNPJ)",
            "O termo de busca deve ter 11 dígitos (CPF) ou 14 dígitos (CNPJ).",
        )),
    }
}

fn authorize(draft: &mut Draft, mode: Mode, requester: &UserRef) -> Result<(), Rejection> {
    let Some(request_type) = draft.request_type else {
        return Ok(());
    };
    if requester.has_permission(request_type.required_permission()) {
        return Ok(());
    }
    let registry = match request_type {
        RequestType::CcsDocument => "CCS",
        RequestType::PixDocument | RequestType::PixKey => "Pix",
    };
    let suffix = match mode {
        Mode::Bulk => "",
        Mode::Interactive => ".",
    };
    Err(Rejection::Unauthorized(format!(
        "Usuário não autorizado a realizar requisições {registry}{suffix}"
    )))
}

fn run_checks(
    mut draft: Draft,
    mode: Mode,
    requester: &UserRef,
) -> Result<CandidateRequest, Rejection> {
    for check in CHECKS {
        check(&mut draft, mode, requester)?;
    }
    let request_type = draft
        .request_type
        .ok_or_else(|| Rejection::Invalid("tipo_requisicao ausente".to_string()))?;
    Ok(CandidateRequest {
        request_type,
        search_term: draft.search_term,
        reason: draft.reason,
        reference: draft.reference,
        requested_by: requester.clone(),
    })
}

/// Splits on `;` when the line has one, otherwise on `,`.
fn split_fields(line: &str) -> Vec<&str> {
    let delimiter = if line.contains(';') { ';' } else { ',' };
    line.split(delimiter).map(str::trim).collect()
}

/// Validates one line of a bulk upload.
///
/// Returns `None` for blank lines: they are skipped and do not count as accepted or
/// rejected.
pub fn parse_line(
    raw_line: &str,
    line_number: usize,
    requester: &UserRef,
) -> Option<Result<CandidateRequest, LineError>> {
    let trimmed = raw_line.trim();
    if trimmed.is_empty() {
        return None;
    }

    let reject = |message: String| LineError {
        line_number,
        raw_content: raw_line.trim_end_matches('\r').to_string(),
        error_message: message,
    };

    let fields = split_fields(trimmed);
    if fields.len() < MIN_FIELDS {
        return Some(Err(reject(
            "Linha deve ter pelo menos 3 campos: tipo_requisicao, termo_busca, motivo"
                .to_string(),
        )));
    }

    let draft = Draft {
        code: fields[0].to_string(),
        request_type: None,
        search_term: fields[1].to_string(),
        reason: fields[2].to_string(),
        reference: fields.get(3).map(|r| r.to_string()).unwrap_or_default(),
    };

    Some(run_checks(draft, Mode::Bulk, requester).map_err(|r| reject(r.into_message())))
}

/// Validates the interactive form, which also accepts CCS lookups.
pub fn validate_form(
    payload: &CreateRequest,
    requester: &UserRef,
) -> Result<CandidateRequest, Rejection> {
    let draft = Draft {
        code: payload.tipo_requisicao.trim().to_string(),
        request_type: None,
        search_term: payload.termo_busca.trim().to_string(),
        reason: payload.motivo.trim().to_string(),
        reference: payload
            .referencia
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_string(),
    };
    run_checks(draft, Mode::Interactive, requester)
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::model::user::Permission;

    fn investigator() -> UserRef {
        UserRef {
            id: "u-1".to_string(),
            name: "Ana Investigadora".to_string(),
            permissions: vec![Permission::RequestPix],
        }
    }

    fn no_permissions() -> UserRef {
        UserRef {
            id: "u-2".to_string(),
            name: "Visitante".to_string(),
            permissions: vec![],
        }
    }

    fn error_of(line: &str, user: &UserRef) -> LineError {
        parse_line(line, 7, user)
            .expect("line is not blank")
            .expect_err("line must be rejected")
    }

    #[test]
    fn blank_lines_are_skipped() {
        assert!(parse_line("", 1, &investigator()).is_none());
        assert!(parse_line("   \t\r", 2, &investigator()).is_none());
    }

    #[test]
    fn document_line_is_accepted_and_cleaned() {
        let record = parse_line("1, 111.444.777-35 ,BO 123/2023,REF001", 1, &investigator())
            .unwrap()
            .unwrap();
        assert_eq!(record.request_type, RequestType::PixDocument);
        assert_eq!(record.search_term, "11144477735");
        assert_eq!(record.reason, "BO 123/2023");
        assert_eq!(record.reference, "REF001");
        assert_eq!(record.requested_by, investigator());
    }

    #[test]
    fn key_line_is_kept_verbatim_without_reference() {
        let record = parse_line("2,usuario@email.com,IPL 456/2023", 2, &investigator())
            .unwrap()
            .unwrap();
        assert_eq!(record.request_type, RequestType::PixKey);
        assert_eq!(record.search_term, "usuario@email.com");
        assert_eq!(record.reference, "");
    }

    #[test]
    fn semicolon_takes_precedence_over_comma() {
        let record = parse_line("2;chave,com,virgulas;Motivo, com vírgula", 1, &investigator())
            .unwrap()
            .unwrap();
        assert_eq!(record.search_term, "chave,com,virgulas");
        assert_eq!(record.reason, "Motivo, com vírgula");
    }

    #[test]
    fn too_few_fields() {
        let err = error_of("1,12345678909", &investigator());
        assert!(err.error_message.contains("pelo menos 3 campos"));
        assert_eq!(err.line_number, 7);
        assert_eq!(err.raw_content, "1,12345678909");
    }

    #[test]
    fn ccs_code_is_refused_in_bulk() {
        let err = error_of("3,12345678909,BO 125/2023", &investigator());
        assert!(err.error_message.contains("tipo_requisicao deve ser 1"));
        assert!(err.error_message.contains("2 (Pix Chave)"));
    }

    #[test]
    fn missing_term_or_reason() {
        let err = error_of("2,,IPL 1", &investigator());
        assert_eq!(err.error_message, "termo_busca e motivo são obrigatórios");
        let err = error_of("2,chave@x.com,  ", &investigator());
        assert_eq!(err.error_message, "termo_busca e motivo são obrigatórios");
    }

    #[test]
    fn document_errors_are_specific() {
        assert_eq!(
            error_of("1,abc,BO", &investigator()).error_message,
            "termo_busca deve conter apenas números"
        );
        assert_eq!(
            error_of("1,12345678900,BO 124/2023", &investigator()).error_message,
            "CPF inválido"
        );
        assert_eq!(
            error_of("1,11222333000182,BO", &investigator()).error_message,
            "CNPJ inválido"
        );
        assert!(error_of("1,12345,BO", &investigator())
            .error_message
            .contains("11 dígitos"));
    }

    #[test]
    fn format_errors_win_over_authorization() {
        let err = error_of("1,12345678900,BO", &no_permissions());
        assert_eq!(err.error_message, "CPF inválido");
        let err = error_of("2,chave@x.com,BO", &no_permissions());
        assert_eq!(
            err.error_message,
            "Usuário não autorizado a realizar requisições Pix"
        );
    }

    #[test]
    fn raw_content_keeps_original_spacing() {
        let err = error_of("  1,abc,BO  \r", &investigator());
        assert_eq!(err.raw_content, "  1,abc,BO  ");
    }

    fn form(code: &str, term: &str) -> CreateRequest {
        CreateRequest {
            tipo_requisicao: code.to_string(),
            termo_busca: term.to_string(),
            motivo: "Teste de validação".to_string(),
            referencia: None,
        }
    }

    #[test]
    fn form_accepts_ccs_with_permission() {
        let user = UserRef {
            permissions: vec![Permission::RequestCcs],
            ..investigator()
        };
        let record = validate_form(&form("3", "11144477735"), &user).unwrap();
        assert_eq!(record.request_type, RequestType::CcsDocument);
    }

    #[test]
    fn form_refuses_ccs_without_permission() {
        let rejection = validate_form(&form("3", "11144477735"), &investigator()).unwrap_err();
        assert_eq!(
            rejection,
            Rejection::Unauthorized("Usuário não autorizado a realizar requisições CCS.".to_string())
        );
    }

    #[test]
    fn form_uses_its_own_messages() {
        let user = investigator();
        assert_eq!(
            validate_form(&form("1", "11111111111"), &user).unwrap_err().message(),
            "O termo de busca deve ser um CPF válido."
        );
        assert_eq!(
            validate_form(&form("1", "11111111111111"), &user).unwrap_err().message(),
            "O termo de busca deve ser um CNPJ válido."
        );
        assert_eq!(
            validate_form(&form("1", ""), &user).unwrap_err().message(),
            "O termo de busca é obrigatório para este tipo de requisição."
        );
        let cleaned = validate_form(&form("1", "11.222.333/0001-81"), &user).unwrap();
        assert_eq!(cleaned.search_term, "11222333000181");
    }
}
