//! Assembly and signing of `OCSPResponse` structures.

use chrono::{DateTime, Duration, Utc};
use snafu::ResultExt;

use super::{CertId, CertStatus, OcspResponseStatus};
use crate::der::{self, time, Element};
use crate::error::{self, OcspError};
use crate::oid;
use crate::registry::ResponderEntry;
use crate::sign;

/// A signed success response plus the instants the cache policy needs.
#[derive(Debug, Clone)]
pub struct SignedResponse {
    pub der: Vec<u8>,
    pub produced_at: DateTime<Utc>,
    pub next_update: DateTime<Utc>,
}

/// Builds and signs a `BasicOCSPResponse` carrying exactly one
/// `SingleResponse`, wrapped in a successful `OCSPResponse`.
///
/// `producedAt`, `thisUpdate`, and `nextUpdate` all derive from the single
/// `now` snapshot so the cache metadata stays coherent.
pub fn build_success_response(
    entry: &ResponderEntry,
    cert_id: &CertId,
    status: &CertStatus,
    now: DateTime<Utc>,
    ttl: Duration,
) -> Result<SignedResponse, OcspError> {
    let produced_at = time::truncate(now);
    let this_update = produced_at;
    let next_update = produced_at + ttl;

    let cert_status = match status {
        CertStatus::Good => Element::implicit(0, Element::null()),
        CertStatus::Revoked {
            revocation_time,
            reason,
        } => {
            let mut revoked_info = vec![Element::generalized_time(*revocation_time)];
            if let Some(reason) = reason {
                revoked_info.push(Element::explicit(0, Element::enumerated(reason.code())));
            }
            Element::implicit(1, Element::sequence(revoked_info))
        }
        CertStatus::Unknown => Element::implicit(2, Element::null()),
    };

    let single_response = Element::sequence(vec![
        cert_id.element().clone(),
        cert_status,
        Element::generalized_time(this_update),
        Element::explicit(0, Element::generalized_time(next_update)),
    ]);

    // version is DEFAULT v1 and therefore absent from the DER.
    let response_data = Element::sequence(vec![
        Element::explicit(2, Element::octet_string(entry.key_hash.clone())),
        Element::generalized_time(produced_at),
        Element::sequence(vec![single_response]),
    ]);

    let tbs = der::encode(&response_data);
    let signature =
        sign::sign(&entry.signing_key, entry.hash, &tbs).context(error::SignerSnafu)?;

    let basic_response = Element::sequence(vec![
        response_data,
        entry.hash.algorithm_identifier(),
        Element::bit_string(0, signature),
        Element::explicit(0, Element::sequence(vec![entry.certificate.clone()])),
    ]);

    let response = Element::sequence(vec![
        Element::enumerated(OcspResponseStatus::Successful.code()),
        Element::explicit(
            0,
            Element::sequence(vec![
                Element::object_identifier(oid::ID_PKIX_OCSP_BASIC),
                Element::octet_string(der::encode(&basic_response)),
            ]),
        ),
    ]);

    Ok(SignedResponse {
        der: der::encode(&response),
        produced_at,
        next_update,
    })
}

/// An unsigned error response: `responseStatus` with no `responseBytes`,
/// the five-octet sequence `30 03 0A 01 <status>`.
pub fn build_error_response(status: OcspResponseStatus) -> Vec<u8> {
    der::encode(&Element::sequence(vec![Element::enumerated(status.code())]))
}
