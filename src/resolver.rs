//! Classifies a requested serial against the revocation store.

use chrono::{DateTime, Utc};
use snafu::ResultExt;

use crate::error::{self, OcspError, StoreError};
use crate::ocsp::{CertId, CertStatus, CrlReason};
use crate::store::{self, RecordStatus, RevocationRecord, RevocationStore};

/// Fetches and classifies the record for a request's CertID.
pub fn resolve<S: RevocationStore>(
    store: &S,
    cert_id: &CertId,
    now: DateTime<Utc>,
) -> Result<CertStatus, OcspError> {
    let serial = cert_id.serial_hex();
    let record = store
        .fetch(&serial)
        .context(error::StoreUnavailableSnafu)?;
    classify(record, &serial, now)
}

/// Applies the status policy:
///
/// - no record → `unknown`;
/// - past the expiry date the stored status is overridden to expired, and
///   expired end-entity certificates are not answered for (`unauthorized`
///   rather than the RFC-permitted `good`);
/// - revoked records carry `YYMMDDHHMMSSZ[,reason]`, and an unrecognised
///   reason name drops the `revocationReason` extension.
pub fn classify(
    record: Option<RevocationRecord>,
    serial: &str,
    now: DateTime<Utc>,
) -> Result<CertStatus, OcspError> {
    let Some(record) = record else {
        return Ok(CertStatus::Unknown);
    };

    let expiry = store::parse_db_time(&record.expiry).context(error::BadRecordSnafu { serial })?;
    let status = if now > expiry {
        RecordStatus::Expired
    } else {
        record.status
    };

    match status {
        RecordStatus::Valid => Ok(CertStatus::Good),
        RecordStatus::Expired => error::CertificateExpiredSnafu { serial }.fail(),
        RecordStatus::Revoked => {
            let (revocation_time, reason) =
                parse_revoked(&record.revoked).context(error::BadRecordSnafu { serial })?;
            Ok(CertStatus::Revoked {
                revocation_time,
                reason,
            })
        }
    }
}

/// Splits a `YYMMDDHHMMSSZ[,reason]` revocation field.
pub fn parse_revoked(raw: &str) -> Result<(DateTime<Utc>, Option<CrlReason>), StoreError> {
    let (date, reason) = match raw.split_once(',') {
        Some((date, reason)) => (date, Some(reason)),
        None => (raw, None),
    };
    Ok((
        store::parse_db_time(date)?,
        reason.and_then(CrlReason::from_name),
    ))
}
