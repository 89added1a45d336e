//! Construction and signing of a `CertificateList` (RFC 5280 §5), invoked
//! out of band by the operational tooling.

use chrono::{DateTime, Duration, Utc};
use num_bigint::BigInt;
use sha1::{Digest, Sha1};

use crate::der::{self, time, Element};
use crate::error::{self, SignError, StoreError};
use crate::ocsp::CrlReason;
use crate::oid;
use crate::registry::ResponderEntry;
use crate::resolver;
use crate::sign::{self, SignatureHash};
use crate::store::{RecordStatus, RevocationRecord};

/// v1 omits the version field and every extension; v2 carries the entry
/// extensions, the authority key identifier, and the CRL number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrlVersion {
    V1,
    V2,
}

/// Hold instruction codes (RFC 5280 §5.3.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldInstruction {
    None,
    CallIssuer,
    Reject,
}

impl HoldInstruction {
    fn arcs(self) -> &'static [u32] {
        match self {
            Self::None => oid::HOLD_INSTRUCTION_NONE,
            Self::CallIssuer => oid::HOLD_INSTRUCTION_CALL_ISSUER,
            Self::Reject => oid::HOLD_INSTRUCTION_REJECT,
        }
    }
}

/// One entry of the revoked-certificates list.
#[derive(Debug, Clone)]
pub struct RevokedCertificate {
    pub serial: BigInt,
    pub revocation_date: DateTime<Utc>,
    pub reason: Option<CrlReason>,
    pub invalidity_date: Option<DateTime<Utc>>,
    pub hold_instruction: Option<HoldInstruction>,
}

/// CRL metadata supplied by the operator.
#[derive(Debug, Clone)]
pub struct CrlParams {
    pub number: u64,
    pub version: CrlVersion,
    /// `nextUpdate` horizon in days from `this_update`.
    pub days: i64,
    pub hash: SignatureHash,
    pub this_update: DateTime<Utc>,
}

/// Assembles and signs the CRL for `ca`, returning the DER
/// `CertificateList`.
pub fn build(
    ca: &ResponderEntry,
    params: &CrlParams,
    revoked: &[RevokedCertificate],
) -> Result<Vec<u8>, SignError> {
    let v2 = params.version == CrlVersion::V2;
    let this_update = time::truncate(params.this_update);
    let next_update = this_update + Duration::days(params.days);

    let entries: Vec<Element> = revoked
        .iter()
        .map(|entry| {
            let mut children = vec![
                Element::integer(entry.serial.clone()),
                Element::utc_time(entry.revocation_date),
            ];
            if v2 {
                if let Some(extensions) = entry_extensions(entry) {
                    children.push(extensions);
                }
            }
            Element::sequence(children)
        })
        .collect();

    let mut tbs_children = Vec::new();
    if v2 {
        tbs_children.push(Element::integer(1));
    }
    tbs_children.push(params.hash.algorithm_identifier());
    tbs_children.push(ca.subject_name.clone());
    tbs_children.push(Element::utc_time(this_update));
    tbs_children.push(Element::utc_time(next_update));
    if !entries.is_empty() {
        tbs_children.push(Element::sequence(entries));
    }
    if v2 {
        tbs_children.push(Element::explicit(0, crl_extensions(ca, params.number)));
    }

    let tbs_cert_list = Element::sequence(tbs_children);
    let tbs_der = der::encode(&tbs_cert_list);
    let signature = sign::sign(&ca.signing_key, params.hash, &tbs_der)?;

    Ok(der::encode(&Element::sequence(vec![
        tbs_cert_list,
        params.hash.algorithm_identifier(),
        Element::bit_string(0, signature),
    ])))
}

/// `crlEntryExtensions`: the reason code, plus the invalidity date for key
/// compromises and the hold instruction for certificate holds.
fn entry_extensions(entry: &RevokedCertificate) -> Option<Element> {
    let reason = entry.reason?;
    let mut extensions = vec![extension(
        oid::CE_CRL_REASON,
        Element::enumerated(reason.code()),
    )];

    if reason == CrlReason::KeyCompromise {
        if let Some(invalidity_date) = entry.invalidity_date {
            extensions.push(extension(
                oid::CE_INVALIDITY_DATE,
                Element::generalized_time(invalidity_date),
            ));
        }
    }
    if reason == CrlReason::CertificateHold {
        if let Some(hold) = entry.hold_instruction {
            extensions.push(extension(
                oid::CE_HOLD_INSTRUCTION_CODE,
                Element::object_identifier(hold.arcs()),
            ));
        }
    }
    Some(Element::sequence(extensions))
}

/// CRL-level extensions: authority key identifier and CRL number.
fn crl_extensions(ca: &ResponderEntry, number: u64) -> Element {
    let authority_key_identifier = Element::sequence(vec![
        Element::implicit(
            0,
            Element::octet_string(Sha1::digest(&ca.public_key_bytes).to_vec()),
        ),
        Element::implicit(
            1,
            Element::sequence(vec![Element::explicit(4, ca.subject_name.clone())]),
        ),
        Element::implicit(2, Element::integer_raw(ca.serial_raw.clone())),
    ]);

    Element::sequence(vec![
        extension(oid::CE_AUTHORITY_KEY_IDENTIFIER, authority_key_identifier),
        extension(oid::CE_CRL_NUMBER, Element::integer(BigInt::from(number))),
    ])
}

/// Wraps a DER-encoded value into a non-critical `Extension`.
fn extension(arcs: &[u32], value: Element) -> Element {
    Element::sequence(vec![
        Element::object_identifier(arcs),
        Element::octet_string(der::encode(&value)),
    ])
}

/// Converts the store's revoked records into CRL entries, for the `crl`
/// subcommand.
pub fn revoked_from_store(
    records: &[(String, RevocationRecord)],
) -> Result<Vec<RevokedCertificate>, StoreError> {
    let mut revoked = Vec::new();
    for (serial, record) in records {
        if record.status != RecordStatus::Revoked {
            continue;
        }
        let (revocation_date, reason) = resolver::parse_revoked(&record.revoked)?;
        let serial = BigInt::parse_bytes(serial.as_bytes(), 16)
            .ok_or_else(|| error::InvalidSerialSnafu { serial: serial.clone() }.build())?;
        revoked.push(RevokedCertificate {
            serial,
            revocation_date,
            reason,
            invalidity_date: None,
            hold_instruction: None,
        });
    }
    Ok(revoked)
}
