//! RFC 5019 §6.2 cache metadata, joining `nextUpdate` with the operator's
//! `max-age` ceiling.

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheDirectives {
    /// Seconds the response may be served from cache.
    pub max_age: i64,
    /// Set when `nextUpdate` already passed; the caller logs it.
    pub stale: bool,
}

impl CacheDirectives {
    /// The `Cache-Control` header value.
    pub fn header(&self) -> String {
        format!(
            "max-age={},public,no-transform,must-revalidate",
            self.max_age
        )
    }
}

/// `max-age` is the time until `nextUpdate`, clamped at zero for stale
/// responses and at the configured ceiling when one is set.
pub fn directives(
    now: DateTime<Utc>,
    next_update: DateTime<Utc>,
    ceiling: Option<u64>,
) -> CacheDirectives {
    let remaining = (next_update - now).num_seconds().max(0);
    let max_age = match ceiling {
        Some(ceiling) => remaining.min(ceiling.min(i64::MAX as u64) as i64),
        None => remaining,
    };

    CacheDirectives {
        max_age,
        stale: next_update < now,
    }
}
