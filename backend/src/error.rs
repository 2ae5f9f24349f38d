use thiserror::Error;

/// Upload-level failures. Any of these rejects the whole batch before a single line is read.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BatchError {
    #[error("Nenhum arquivo foi enviado.")]
    MissingFile,

    #[error("O arquivo deve ter extensão {expected}: <{filename}>")]
    WrongExtension {
        filename: String,
        expected: &'static str,
    },

    #[error("O arquivo excede o tamanho máximo de {max} bytes ({size} bytes).")]
    TooLarge { size: usize, max: usize },
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Erro no banco de dados: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Valor inválido na coluna {column}: <{value}>")]
    InvalidColumn { column: &'static str, value: String },
}

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Erro ao gerar PDF: {0}")]
    Pdf(#[from] genpdf::error::Error),

    #[error("Falha na tarefa de geração do relatório: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Everything an HTTP handler can fail with.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Usuário não autenticado.")]
    Unauthenticated,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Invalid(String),

    #[error(transparent)]
    Batch(#[from] BatchError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Report(#[from] ReportError),

    #[error("Erro no upload: {0}")]
    Multipart(#[from] actix_multipart::MultipartError),
}

impl From<rusqlite::Error> for AppError {
    fn from(e: rusqlite::Error) -> Self {
        AppError::Store(StoreError::Sqlite(e))
    }
}

impl AppError {
    pub fn status(&self) -> actix_web::http::StatusCode {
        use actix_web::http::StatusCode;
        match self {
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Invalid(_) | AppError::Batch(_) | AppError::Multipart(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Store(_) | AppError::Report(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Plain-text error response, like every other handler in the server.
    pub fn to_response(&self) -> actix_web::HttpResponse {
        actix_web::HttpResponse::build(self.status()).body(format!("Error: {}", self))
    }
}
