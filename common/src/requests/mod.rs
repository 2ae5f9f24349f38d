use crate::model::request::LineError;
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize, Debug, Clone)]
/// Payload of the interactive (single) request form.
pub struct CreateRequest {
    pub tipo_requisicao: String,
    pub termo_busca: String,
    pub motivo: String,
    #[serde(default)]
    pub referencia: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
/// Query string of the report download.
pub struct ReportQuery {
    pub report_type: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
/// Result of a bulk upload, shown to the user next to the list of rejected lines.
pub struct BulkUploadSummary {
    pub total_linhas: usize,
    pub requisicoes_validas: usize,
    pub requisicoes_invalidas: usize,
    pub requisicoes_criadas: Vec<String>,
    pub erros: Vec<LineError>,
}
