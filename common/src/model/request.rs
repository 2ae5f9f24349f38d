use crate::model::user::{Permission, UserRef};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of lookup sent to the registry, identified on the wire by its numeric code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestType {
    /// Code `1`: Pix keys owned by a CPF/CNPJ.
    #[serde(rename = "1")]
    PixDocument,
    /// Code `2`: a single Pix key (email, phone, random key...).
    #[serde(rename = "2")]
    PixKey,
    /// Code `3`: CCS relationships of a CPF/CNPJ. Interactive form only.
    #[serde(rename = "3")]
    CcsDocument,
}

impl RequestType {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "1" => Some(RequestType::PixDocument),
            "2" => Some(RequestType::PixKey),
            "3" => Some(RequestType::CcsDocument),
            _ => None,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            RequestType::PixDocument => "1",
            RequestType::PixKey => "2",
            RequestType::CcsDocument => "3",
        }
    }

    /// Human label used on screens and in reports.
    pub fn label(self) -> &'static str {
        match self {
            RequestType::PixDocument => "Pix CPF/CNPJ",
            RequestType::PixKey => "Pix Chave",
            RequestType::CcsDocument => "CCS CPF/CNPJ",
        }
    }

    /// Whether the search term is a CPF/CNPJ that must pass check-digit validation.
    pub fn is_document_lookup(self) -> bool {
        matches!(self, RequestType::PixDocument | RequestType::CcsDocument)
    }

    pub fn required_permission(self) -> Permission {
        match self {
            RequestType::PixDocument | RequestType::PixKey => Permission::RequestPix,
            RequestType::CcsDocument => Permission::RequestCcs,
        }
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A validated request, ready to be handed to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateRequest {
    pub request_type: RequestType,
    pub search_term: String,
    pub reason: String,
    pub reference: String,
    pub requested_by: UserRef,
}

/// A rejected line of a bulk upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineError {
    #[serde(rename = "linha")]
    pub line_number: usize,
    #[serde(rename = "conteudo")]
    pub raw_content: String,
    #[serde(rename = "erro")]
    pub error_message: String,
}
