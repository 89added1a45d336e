//! Conversions between ASN.1 time contents and `DateTime<Utc>`.
//!
//! DER restricts both time types to their canonical `Z` forms with no
//! fractional seconds: `YYYYMMDDHHMMSSZ` for GeneralizedTime and
//! `YYMMDDHHMMSSZ` for UTCTime. Instants are truncated to whole seconds
//! before formatting.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike, Utc};
use snafu::OptionExt;

use crate::error::{self, DecodeError};

pub fn format_generalized(at: DateTime<Utc>) -> String {
    truncate(at).format("%Y%m%d%H%M%SZ").to_string()
}

pub fn format_utc(at: DateTime<Utc>) -> String {
    truncate(at).format("%y%m%d%H%M%SZ").to_string()
}

pub fn parse_generalized(text: &str) -> Result<DateTime<Utc>, DecodeError> {
    NaiveDateTime::parse_from_str(text, "%Y%m%d%H%M%SZ")
        .ok()
        .context(error::InvalidDateSnafu { text })
        .map(|date| date.and_utc())
}

/// Parses wire UTCTime with the RFC 5280 century pivot: `YY` below 50 is
/// 20YY, anything else 19YY.
pub fn parse_utc(text: &str) -> Result<DateTime<Utc>, DecodeError> {
    let invalid = || error::InvalidDateSnafu { text };

    if text.len() != 13 || !text.ends_with('Z') {
        return Err(invalid().build());
    }
    let yy: i32 = text[..2].parse().ok().with_context(invalid)?;
    let year = if yy < 50 { 2000 + yy } else { 1900 + yy };

    parse_fields(year, &text[2..12]).with_context(invalid)
}

/// Assembles a date from a four-digit year and a `MMDDHHMMSS` tail.
pub(crate) fn parse_fields(year: i32, tail: &str) -> Option<DateTime<Utc>> {
    if tail.len() != 10 || !tail.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let field = |range: core::ops::Range<usize>| tail[range].parse::<u32>().ok();

    NaiveDate::from_ymd_opt(year, field(0..2)?, field(2..4)?)?
        .and_hms_opt(field(4..6)?, field(6..8)?, field(8..10)?)
        .map(|date| date.and_utc())
}

pub(crate) fn truncate(at: DateTime<Utc>) -> DateTime<Utc> {
    at.with_nanosecond(0).unwrap_or(at)
}
