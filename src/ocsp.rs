//! OCSP data model (RFC 6960 §4.1 and §4.2).

mod request;
mod response;

pub use request::{parse_request, ParsedRequest};
pub use response::{build_error_response, build_success_response, SignedResponse};

use chrono::{DateTime, Utc};
use num_bigint::BigInt;

use crate::der::Element;

/// The outer status of an `OCSPResponse` (RFC 6960 §4.2.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OcspResponseStatus {
    /// Response has valid confirmations.
    Successful = 0,
    /// Illegal confirmation request.
    MalformedRequest = 1,
    /// Internal error in issuer.
    InternalError = 2,
    /// Try again later.
    TryLater = 3,
    /// Must sign the request.
    SigRequired = 5,
    /// Request unauthorized.
    Unauthorized = 6,
}

impl OcspResponseStatus {
    pub fn code(self) -> i64 {
        self as i64
    }
}

/// The revocation state reported for one certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CertStatus {
    Good,
    Revoked {
        revocation_time: DateTime<Utc>,
        reason: Option<CrlReason>,
    },
    Unknown,
}

/// The entity signing the response, by distinguished name or by SHA-1 of its
/// public key. Only `ByKey` is emitted; `ByName` completes the RFC choice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponderId {
    ByName(Element),
    ByKey(Vec<u8>),
}

/// CRL revocation reasons (RFC 5280 §5.3.1). Value 7 is unassigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CrlReason {
    Unspecified = 0,
    KeyCompromise = 1,
    CaCompromise = 2,
    AffiliationChanged = 3,
    Superseded = 4,
    CessationOfOperation = 5,
    CertificateHold = 6,
    RemoveFromCRL = 8,
    PrivilegeWithdrawn = 9,
    AaCompromise = 10,
}

impl CrlReason {
    /// Maps a database reason name to its code. Unrecognised names yield
    /// `None` and the reason is omitted from the response.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "unspecified" => Some(Self::Unspecified),
            "keyCompromise" => Some(Self::KeyCompromise),
            "cACompromise" => Some(Self::CaCompromise),
            "affiliationChanged" => Some(Self::AffiliationChanged),
            "superseded" => Some(Self::Superseded),
            "cessationOfOperation" => Some(Self::CessationOfOperation),
            "certificateHold" => Some(Self::CertificateHold),
            "removeFromCRL" => Some(Self::RemoveFromCRL),
            "privilegeWithdrawn" => Some(Self::PrivilegeWithdrawn),
            "aACompromise" => Some(Self::AaCompromise),
            _ => None,
        }
    }

    pub fn code(self) -> i64 {
        self as i64
    }
}

/// The request-side identity of a certificate: hash algorithm, hashes of the
/// issuer name and key, and the serial number.
///
/// The original `reqCert` element is kept alongside the decoded components so
/// the response echoes the CertID byte-exactly, whatever parameter encoding
/// the client chose.
#[derive(Debug, Clone)]
pub struct CertId {
    pub hash_algorithm: Vec<u32>,
    pub issuer_name_hash: Vec<u8>,
    pub issuer_key_hash: Vec<u8>,
    /// Raw INTEGER content octets, preserving sign and length exactly.
    pub serial_number: Vec<u8>,
    element: Element,
}

impl CertId {
    pub(crate) fn new(
        hash_algorithm: Vec<u32>,
        issuer_name_hash: Vec<u8>,
        issuer_key_hash: Vec<u8>,
        serial_number: Vec<u8>,
        element: Element,
    ) -> Self {
        Self {
            hash_algorithm,
            issuer_name_hash,
            issuer_key_hash,
            serial_number,
            element,
        }
    }

    /// The `reqCert` element as received, for echoing into `SingleResponse`.
    pub fn element(&self) -> &Element {
        &self.element
    }

    /// The serial as upper-case hex without leading zero octets, padded to an
    /// even width: the database key format.
    pub fn serial_hex(&self) -> String {
        let mut hex = BigInt::from_signed_bytes_be(&self.serial_number)
            .to_str_radix(16)
            .to_ascii_uppercase();
        if hex.len() % 2 != 0 {
            hex.insert(0, '0');
        }
        hex
    }
}

impl PartialEq for CertId {
    fn eq(&self, other: &Self) -> bool {
        self.hash_algorithm == other.hash_algorithm
            && self.issuer_name_hash == other.issuer_name_hash
            && self.issuer_key_hash == other.issuer_key_hash
            && self.serial_number == other.serial_number
    }
}

impl Eq for CertId {}

impl core::fmt::Display for CertId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "CertID(serial={}, issuerNameHash={}, issuerKeyHash={})",
            self.serial_hex(),
            hex::encode(&self.issuer_name_hash),
            hex::encode(&self.issuer_key_hash),
        )
    }
}
