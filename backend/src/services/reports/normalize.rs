//! Projection of a stored lookup result into plain display strings.
//!
//! Every timestamp is shown in Brasília time (fixed UTC-3). Values stored without a zone are
//! UTC, which is what the store always writes. Absent or blank values become `"N/A"`.

use chrono::{FixedOffset, NaiveTime, Offset, TimeZone, Utc};
use common::model::report::{KeyRecord, OwnershipEvent, ReportSource, StoredTime};

pub const NOT_AVAILABLE: &str = "N/A";

const BRAZIL_OFFSET_SECS: i32 = 3 * 3600;

pub const DATE_TIME_LONG: &str = "%d/%m/%Y às %H:%M:%S";
pub const DATE_TIME_SHORT: &str = "%d/%m/%Y %H:%M";
pub const DATE_ONLY: &str = "%d/%m/%Y";

/// Fixed UTC-3 offset used in every report.
pub fn brazil_offset() -> FixedOffset {
    FixedOffset::west_opt(BRAZIL_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

/// Formats `time` in `offset`. Bare dates have no time of day and are printed unchanged.
pub fn format_time(time: Option<&StoredTime>, offset: FixedOffset, format: &str) -> String {
    let Some(time) = time else {
        return NOT_AVAILABLE.to_string();
    };
    match time {
        StoredTime::Zoned(dt) => dt.with_timezone(&offset).format(format).to_string(),
        StoredTime::Naive(naive) => Utc
            .from_utc_datetime(naive)
            .with_timezone(&offset)
            .format(format)
            .to_string(),
        StoredTime::Date(date) => date.and_time(NaiveTime::MIN).format(format).to_string(),
    }
}

fn text(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v.to_string(),
        _ => NOT_AVAILABLE.to_string(),
    }
}

/// Request metadata as displayed in the consultation table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSummary {
    pub lookup_type: String,
    pub search_term: String,
    pub reason: String,
    pub requester: String,
    pub created_at: String,
}

/// One row of the event-history table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRow {
    pub occurred_at: String,
    pub event_type: String,
    pub event_reason: String,
    pub holder_document: String,
    pub holder_name: String,
    /// Institution, then `Ag:` and `Conta:` lines when known.
    pub account: String,
    pub account_opened_on: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedKey {
    pub key: String,
    pub key_type: String,
    pub status: String,
    pub holder_document: String,
    pub holder_name: String,
    pub institution: String,
    pub branch: String,
    pub account_number: String,
    pub account_type: String,
    pub account_opened_on: String,
    pub events: Vec<EventRow>,
}

impl NormalizedKey {
    pub fn is_active(&self) -> bool {
        self.status.eq_ignore_ascii_case("ATIVO")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedReport {
    pub request: RequestSummary,
    pub keys: Vec<NormalizedKey>,
}

impl NormalizedReport {
    pub fn active_keys(&self) -> usize {
        self.keys.iter().filter(|k| k.is_active()).count()
    }

    pub fn inactive_keys(&self) -> usize {
        self.keys.len() - self.active_keys()
    }
}

fn account_text(event: &OwnershipEvent) -> String {
    let mut account = text(event.institution.as_deref());
    if let Some(branch) = event.branch.as_deref().filter(|b| !b.trim().is_empty()) {
        account.push_str("\nAg: ");
        account.push_str(branch);
    }
    if let Some(number) = event.account_number.as_deref().filter(|n| !n.trim().is_empty()) {
        account.push_str("\nConta: ");
        account.push_str(number);
    }
    account
}

fn normalize_event(event: &OwnershipEvent, offset: FixedOffset) -> EventRow {
    EventRow {
        occurred_at: format_time(event.occurred_at.as_ref(), offset, DATE_TIME_SHORT),
        event_type: text(event.event_type.as_deref()),
        event_reason: text(event.event_reason.as_deref()),
        holder_document: text(event.holder_document.as_deref()),
        holder_name: text(event.holder_name.as_deref()),
        account: account_text(event),
        account_opened_on: format_time(event.account_opened_at.as_ref(), offset, DATE_ONLY),
    }
}

fn normalize_key(key: &KeyRecord, offset: FixedOffset) -> NormalizedKey {
    NormalizedKey {
        key: text(key.key.as_deref()),
        key_type: text(key.key_type.as_deref()),
        status: text(key.status.as_deref()),
        holder_document: text(key.holder_document.as_deref()),
        holder_name: text(key.holder_name.as_deref()),
        institution: text(key.institution.as_deref()),
        branch: text(key.branch.as_deref()),
        account_number: text(key.account_number.as_deref()),
        account_type: text(key.account_type.as_deref()),
        account_opened_on: format_time(key.account_opened_at.as_ref(), offset, DATE_ONLY),
        events: key
            .events
            .iter()
            .map(|e| normalize_event(e, offset))
            .collect(),
    }
}

pub fn normalize(source: &ReportSource, offset: FixedOffset) -> NormalizedReport {
    let request = &source.request;
    NormalizedReport {
        request: RequestSummary {
            lookup_type: request.request_type.label().to_string(),
            search_term: text(Some(request.search_term.as_str())),
            reason: text(Some(request.reason.as_str())),
            requester: text(request.requester_name.as_deref()),
            created_at: format_time(request.created_at.as_ref(), offset, DATE_TIME_LONG),
        },
        keys: source.keys.iter().map(|k| normalize_key(k, offset)).collect(),
    }
}
