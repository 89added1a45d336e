//! The responder registry: maps an issuer key hash to the signing identity
//! used to answer for that issuer.

use std::collections::HashMap;
use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha1::{Digest, Sha1};
use snafu::ResultExt;
use tracing::info;
use x509_parser::prelude::*;

use crate::config::Config;
use crate::der::{self, Element};
use crate::error::{self, ConfigError, RegistryError};
use crate::sign::SignatureHash;

/// What the registry extracts from a trusted issuer certificate at load
/// time, via the external certificate parser.
#[derive(Debug, Clone)]
pub struct CertificateInfo {
    /// Subject DN rendered for logs.
    pub subject: String,
    /// DER of the subject `Name`, hashed into request `issuerNameHash`es.
    pub subject_raw: Vec<u8>,
    /// Content octets of the subject public key BIT STRING.
    pub public_key_bytes: Vec<u8>,
    /// Raw serial content octets.
    pub serial_raw: Vec<u8>,
}

/// Extracts the responder-relevant fields from a DER certificate.
pub fn certificate_info(der: &[u8]) -> Result<CertificateInfo, RegistryError> {
    let (_, certificate) = X509Certificate::from_der(der).map_err(|e| {
        error::CertificateParseSnafu {
            path: Path::new("<memory>"),
            reason: e.to_string(),
        }
        .build()
    })?;

    Ok(CertificateInfo {
        subject: certificate.subject().to_string(),
        subject_raw: certificate.subject().as_raw().to_vec(),
        public_key_bytes: certificate
            .public_key()
            .subject_public_key
            .data
            .as_ref()
            .to_vec(),
        serial_raw: certificate.raw_serial().to_vec(),
    })
}

/// One issuer the responder answers for: the issuer certificate, its
/// signing key, and everything derived from them at load time.
#[derive(Debug, Clone)]
pub struct ResponderEntry {
    pub subject: String,
    pub subject_raw: Vec<u8>,
    /// The subject `Name` decoded, reused as the CRL issuer.
    pub subject_name: Element,
    pub public_key_bytes: Vec<u8>,
    /// SHA-1 over the public key bytes: both the registry key and the
    /// `byKey` responder ID.
    pub key_hash: Vec<u8>,
    pub serial_raw: Vec<u8>,
    /// The decoded certificate, embedded in the `certs` field of responses.
    pub certificate: Element,
    pub signing_key: RsaPrivateKey,
    pub hash: SignatureHash,
}

impl ResponderEntry {
    pub fn new(
        certificate_der: &[u8],
        signing_key: RsaPrivateKey,
        hash: SignatureHash,
    ) -> Result<Self, RegistryError> {
        let info = certificate_info(certificate_der)?;
        let parse_failure = |e: crate::error::DecodeError| {
            error::CertificateParseSnafu {
                path: Path::new("<memory>"),
                reason: e.to_string(),
            }
            .build()
        };
        let certificate = der::decode(certificate_der).map_err(parse_failure)?;
        let subject_name = der::decode(&info.subject_raw).map_err(parse_failure)?;

        Ok(Self {
            key_hash: Sha1::digest(&info.public_key_bytes).to_vec(),
            subject: info.subject,
            subject_raw: info.subject_raw,
            subject_name,
            public_key_bytes: info.public_key_bytes,
            serial_raw: info.serial_raw,
            certificate,
            signing_key,
            hash,
        })
    }

    pub fn public_key(&self) -> RsaPublicKey {
        self.signing_key.to_public_key()
    }
}

/// Issuer-key-hash lookup table, loaded at startup and immutable afterwards.
#[derive(Debug, Default)]
pub struct Registry {
    entries: HashMap<String, ResponderEntry>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the configured responder identity.
    pub fn load(config: &Config) -> Result<Self, ConfigError> {
        let certificate_der =
            read_certificate_der(&config.responder_cert).context(error::RegistrySnafu)?;
        let signing_key = read_signing_key(&config.responder_key).context(error::RegistrySnafu)?;

        let entry = ResponderEntry::new(&certificate_der, signing_key, config.signature_hash()?)
            .context(error::RegistrySnafu)?;

        let mut registry = Self::new();
        registry.add(entry);
        Ok(registry)
    }

    pub fn add(&mut self, entry: ResponderEntry) {
        info!(
            subject = %entry.subject,
            key_hash = %hex::encode(&entry.key_hash),
            "registered responder identity"
        );
        self.entries.insert(BASE64.encode(&entry.key_hash), entry);
    }

    /// A miss means the responder declines to answer for this issuer and
    /// the request maps to `unauthorized`.
    pub fn lookup(&self, issuer_key_hash: &[u8]) -> Option<&ResponderEntry> {
        self.entries.get(&BASE64.encode(issuer_key_hash))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Reads a certificate file, accepting PEM armor or raw DER.
pub fn read_certificate_der(path: &Path) -> Result<Vec<u8>, RegistryError> {
    let bytes = std::fs::read(path).context(error::FileReadSnafu { path })?;
    if bytes.starts_with(b"-----") {
        let parsed = ::pem::parse(&bytes).map_err(|e| {
            error::CertificateParseSnafu {
                path,
                reason: e.to_string(),
            }
            .build()
        })?;
        Ok(parsed.into_contents())
    } else {
        Ok(bytes)
    }
}

/// Reads an RSA signing key, trying PKCS#8 then PKCS#1, PEM or DER.
pub fn read_signing_key(path: &Path) -> Result<RsaPrivateKey, RegistryError> {
    let bytes = std::fs::read(path).context(error::FileReadSnafu { path })?;

    if bytes.starts_with(b"-----") {
        let text = String::from_utf8_lossy(&bytes);
        RsaPrivateKey::from_pkcs8_pem(&text)
            .or_else(|_| RsaPrivateKey::from_pkcs1_pem(&text))
            .ok()
    } else {
        RsaPrivateKey::from_pkcs8_der(&bytes)
            .or_else(|_| RsaPrivateKey::from_pkcs1_der(&bytes))
            .ok()
    }
    .ok_or_else(|| error::KeyParseSnafu { path }.build())
}
