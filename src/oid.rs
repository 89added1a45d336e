//! Object identifiers used across the OCSP and CRL modules.

/// `id-pkix-ocsp-basic` — the response type of a `BasicOCSPResponse`.
pub const ID_PKIX_OCSP_BASIC: &[u32] = &[1, 3, 6, 1, 5, 5, 7, 48, 1, 1];
/// `id-pkix-ocsp-nonce` — parsed out of requests, never echoed.
pub const ID_PKIX_OCSP_NONCE: &[u32] = &[1, 3, 6, 1, 5, 5, 7, 48, 1, 2];

/// `id-sha1`, the CertID hash algorithm of the RFC 5019 profile.
pub const ID_SHA1: &[u32] = &[1, 3, 14, 3, 2, 26];

pub const RSA_ENCRYPTION: &[u32] = &[1, 2, 840, 113549, 1, 1, 1];
pub const SHA1_WITH_RSA_ENCRYPTION: &[u32] = &[1, 2, 840, 113549, 1, 1, 5];
pub const SHA256_WITH_RSA_ENCRYPTION: &[u32] = &[1, 2, 840, 113549, 1, 1, 11];

/// CRL and CRL-entry extensions (RFC 5280 §5.2, §5.3).
pub const CE_CRL_NUMBER: &[u32] = &[2, 5, 29, 20];
pub const CE_CRL_REASON: &[u32] = &[2, 5, 29, 21];
pub const CE_HOLD_INSTRUCTION_CODE: &[u32] = &[2, 5, 29, 23];
pub const CE_INVALIDITY_DATE: &[u32] = &[2, 5, 29, 24];
pub const CE_AUTHORITY_KEY_IDENTIFIER: &[u32] = &[2, 5, 29, 35];

/// Hold instruction codes (RFC 5280 §5.3.2).
pub const HOLD_INSTRUCTION_NONE: &[u32] = &[1, 2, 840, 10040, 2, 1];
pub const HOLD_INSTRUCTION_CALL_ISSUER: &[u32] = &[1, 2, 840, 10040, 2, 2];
pub const HOLD_INSTRUCTION_REJECT: &[u32] = &[1, 2, 840, 10040, 2, 3];

/// `id-at-commonName`, used by the test fixtures when assembling names.
pub const AT_COMMON_NAME: &[u32] = &[2, 5, 4, 3];
