//! Error types for the codec, the request pipeline, and the collaborators.

use std::path::PathBuf;

use snafu::Snafu;

use crate::ocsp::OcspResponseStatus;
use crate::tag::Tag;

/// Failure while decoding DER bytes into an element tree.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum DecodeError {
    #[snafu(display("unexpected end of input"))]
    Truncated,
    #[snafu(display("indefinite lengths are not permitted in DER"))]
    IndefiniteLength,
    #[snafu(display("non-minimal length or tag encoding"))]
    NonMinimalLength,
    #[snafu(display("reserved length octet 0xff"))]
    ReservedLength,
    #[snafu(display("{count} trailing bytes after the outermost element"))]
    TrailingBytes { count: usize },
    #[snafu(display("expected {expected:?} tag, actual tag: {actual:?}"))]
    MismatchedTag { expected: Tag, actual: Tag },
    #[snafu(display("constructed encoding where a primitive value was expected"))]
    UnexpectedConstructed,
    #[snafu(display("primitive encoding where a constructed value was expected"))]
    UnexpectedPrimitive,
    #[snafu(display("boolean contents must be a single octet"))]
    InvalidBoolean,
    #[snafu(display("integer contents are empty or not minimal"))]
    InvalidInteger,
    #[snafu(display("malformed object identifier contents"))]
    InvalidObjectIdentifier,
    #[snafu(display("bit string declares {bits} unused bits"))]
    InvalidBitString { bits: u8 },
    #[snafu(display("'{text}' is not a valid ASN.1 time"))]
    InvalidDate { text: String },
    #[snafu(display("tag number does not fit in 32 bits"))]
    TagOverflow,
}

/// Failure while validating an `OCSPRequest`, mapped to `malformedRequest`
/// unless noted otherwise.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum RequestError {
    #[snafu(display("request is not valid DER: {source}"))]
    MalformedAsn1 { source: DecodeError },
    #[snafu(display("request is missing its {field} field"))]
    MissingField { field: &'static str },
    #[snafu(display("unsupported request version {version}"))]
    UnsupportedVersion { version: i64 },
    #[snafu(display("unsupported critical extension {oid}"))]
    UnsupportedCriticalExtension { oid: String },
    #[snafu(display("request list is empty"))]
    RequestListEmpty,
    #[snafu(display("request list carries more than one entry"))]
    RequestListMultiple,
}

/// Failure reading or updating the revocation database.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum StoreError {
    #[snafu(display("cannot access revocation database {}: {source}", path.display()))]
    Database {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("malformed record on line {line} of {}", path.display()))]
    MalformedRecord { path: PathBuf, line: usize },
    #[snafu(display("'{text}' is not a valid database timestamp"))]
    InvalidTimestamp { text: String },
    #[snafu(display("serial {serial} is not present in the database"))]
    SerialNotFound { serial: String },
    #[snafu(display("'{serial}' is not a valid hex serial"))]
    InvalidSerial { serial: String },
    #[snafu(display("serial {serial} is already recorded"))]
    SerialExists { serial: String },
}

/// Failure producing or checking a PKCS#1 v1.5 signature.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SignError {
    #[snafu(display("signing failed: {source}"))]
    Signature { source: rsa::Error },
    #[snafu(display("signature does not verify: {source}"))]
    Verification { source: rsa::Error },
}

/// Failure assembling the responder registry from certificates and keys.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum RegistryError {
    #[snafu(display("cannot read {}: {source}", path.display()))]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("cannot parse certificate {}: {reason}", path.display()))]
    CertificateParse { path: PathBuf, reason: String },
    #[snafu(display("cannot parse signing key {}: not PKCS#8 or PKCS#1", path.display()))]
    KeyParse { path: PathBuf },
}

/// Failure loading the operator configuration.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ConfigError {
    #[snafu(display("cannot read configuration {}: {source}", path.display()))]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("cannot parse configuration {}: {source}", path.display()))]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[snafu(display("'{value}' is not a recognised signature hash"))]
    UnknownHash { value: String },
    #[snafu(display("registry failed to load: {source}"))]
    Registry { source: RegistryError },
}

/// Responder-level failure, carrying enough shape to pick the
/// `OCSPResponseStatus` of the unsigned error response.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum OcspError {
    #[snafu(display("{source}"))]
    Request { source: RequestError },
    #[snafu(display("no responder configured for issuer key hash {key_hash}"))]
    UnknownIssuer { key_hash: String },
    #[snafu(display("end-entity certificate {serial} has expired"))]
    CertificateExpired { serial: String },
    #[snafu(display("revocation store unavailable: {source}"))]
    StoreUnavailable { source: StoreError },
    #[snafu(display("record for serial {serial} is unusable: {source}"))]
    BadRecord { serial: String, source: StoreError },
    #[snafu(display("signer failed: {source}"))]
    Signer { source: SignError },
    #[snafu(display("request must be signed"))]
    SigRequired,
}

impl OcspError {
    /// The RFC 6960 §4.2.1 status the unsigned error response carries.
    pub fn status(&self) -> OcspResponseStatus {
        match self {
            OcspError::Request { .. } => OcspResponseStatus::MalformedRequest,
            OcspError::UnknownIssuer { .. } | OcspError::CertificateExpired { .. } => {
                OcspResponseStatus::Unauthorized
            }
            OcspError::StoreUnavailable { .. } => OcspResponseStatus::TryLater,
            OcspError::BadRecord { .. } | OcspError::Signer { .. } => {
                OcspResponseStatus::InternalError
            }
            OcspError::SigRequired => OcspResponseStatus::SigRequired,
        }
    }
}
