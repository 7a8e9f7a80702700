pub mod connection;
pub mod repository;

pub use repository::HubRepository;

use chrono::{DateTime, SecondsFormat, Utc};

/// Timestamps are stored as RFC 3339 UTC strings with millisecond precision,
/// so lexical order matches chronological order.
pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn now_timestamp() -> String {
    timestamp(Utc::now())
}
