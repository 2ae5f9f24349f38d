//! Turns an uploaded text file into accepted requests and rejected lines.
//!
//! Nothing here touches the database: the caller persists `accepted` in a single
//! transaction.

use crate::error::BatchError;
use crate::services::requests::line;
use common::model::request::{CandidateRequest, LineError};
use common::model::user::UserRef;

/// Largest accepted upload (5 MiB).
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;
pub const TEXT_EXTENSION: &str = ".txt";

/// A file as received from the upload form.
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub accepted: Vec<CandidateRequest>,
    pub rejected: Vec<LineError>,
}

impl BatchOutcome {
    /// Non-blank lines seen, i.e. accepted plus rejected.
    pub fn total_lines(&self) -> usize {
        self.accepted.len() + self.rejected.len()
    }
}

/// Upload-shape checks, independent of the file content.
pub fn check_upload(upload: Option<&Upload>) -> Result<&Upload, BatchError> {
    let upload = upload.ok_or(BatchError::MissingFile)?;
    if upload.filename.is_empty() {
        return Err(BatchError::MissingFile);
    }
    if !upload.filename.to_lowercase().ends_with(TEXT_EXTENSION) {
        return Err(BatchError::WrongExtension {
            filename: upload.filename.clone(),
            expected: TEXT_EXTENSION,
        });
    }
    if upload.bytes.len() > MAX_UPLOAD_BYTES {
        return Err(BatchError::TooLarge {
            size: upload.bytes.len(),
            max: MAX_UPLOAD_BYTES,
        });
    }
    Ok(upload)
}

/// UTF-8 first (dropping a BOM), then ISO-8859-1.
///
/// Every byte is a Latin-1 code point, so decoding cannot fail. Windows-1252 punctuation
/// such as `0x96` comes through as the matching C1 control character.
pub fn decode(bytes: &[u8]) -> String {
    if let Ok(text) = std::str::from_utf8(bytes) {
        return text.strip_prefix('\u{feff}').unwrap_or(text).to_string();
    }
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Validates every line of `text`, keeping the original order.
pub fn process_text(text: &str, requester: &UserRef) -> BatchOutcome {
    let mut outcome = BatchOutcome::default();
    for (idx, raw_line) in text.split('\n').enumerate() {
        match line::parse_line(raw_line, idx + 1, requester) {
            Some(Ok(record)) => outcome.accepted.push(record),
            Some(Err(error)) => outcome.rejected.push(error),
            None => {}
        }
    }
    outcome
}

/// Shape checks, decoding and per-line validation of one upload.
pub fn process(upload: Option<&Upload>, requester: &UserRef) -> Result<BatchOutcome, BatchError> {
    let upload = check_upload(upload)?;
    let text = decode(&upload.bytes);
    Ok(process_text(&text, requester))
}
