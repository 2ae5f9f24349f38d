//! Lookup results as kept by the result store, consumed read-only by the report generator.

use crate::model::request::RequestType;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A timestamp as written by the store.
///
/// The registry job writes RFC 3339 values, but older rows carry no offset and a few
/// account-opening fields only carry a calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredTime {
    Zoned(DateTime<FixedOffset>),
    /// No zone information; interpreted as UTC.
    Naive(NaiveDateTime),
    Date(NaiveDate),
}

impl StoredTime {
    /// Parses the textual forms found in the store. Returns `None` for anything else.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(StoredTime::Zoned(dt));
        }
        for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
            if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
                return Some(StoredTime::Naive(dt));
            }
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .map(StoredTime::Date)
    }

    /// Calendar date as stored, without any zone conversion.
    pub fn stored_date(&self) -> NaiveDate {
        match self {
            StoredTime::Zoned(dt) => dt.date_naive(),
            StoredTime::Naive(dt) => dt.date(),
            StoredTime::Date(d) => *d,
        }
    }
}

impl fmt::Display for StoredTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoredTime::Zoned(dt) => write!(f, "{}", dt.to_rfc3339()),
            StoredTime::Naive(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S%.f")),
            StoredTime::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

/// Metadata of the lookup request a report is about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestMetadata {
    pub request_type: RequestType,
    pub search_term: String,
    pub reason: String,
    pub requester_name: Option<String>,
    pub created_at: Option<StoredTime>,
}

/// A historical binding of a Pix key to an account/holder.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OwnershipEvent {
    pub occurred_at: Option<StoredTime>,
    pub event_type: Option<String>,
    pub event_reason: Option<String>,
    pub holder_document: Option<String>,
    pub holder_name: Option<String>,
    pub institution: Option<String>,
    pub branch: Option<String>,
    pub account_number: Option<String>,
    pub account_opened_at: Option<StoredTime>,
}

/// A Pix key returned by the registry together with its current ownership.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyRecord {
    pub key: Option<String>,
    pub key_type: Option<String>,
    pub status: Option<String>,
    pub holder_document: Option<String>,
    pub holder_name: Option<String>,
    pub institution: Option<String>,
    pub branch: Option<String>,
    pub account_number: Option<String>,
    pub account_type: Option<String>,
    pub account_opened_at: Option<StoredTime>,
    pub events: Vec<OwnershipEvent>,
}

/// Everything a report is built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSource {
    pub request: RequestMetadata,
    pub keys: Vec<KeyRecord>,
}
