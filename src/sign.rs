//! PKCS#1 v1.5 signing over the to-be-signed structures.

use rsa::{Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use sha1::Sha1;
use sha2::{Digest, Sha256};
use snafu::ResultExt;

use crate::der::Element;
use crate::error::{self, SignError};
use crate::oid;

/// The digest used for signatures. SHA-256 is the default; SHA-1 is kept for
/// legacy consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureHash {
    Sha1,
    Sha256,
}

impl SignatureHash {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "sha1" | "sha-1" => Some(Self::Sha1),
            "sha256" | "sha-256" => Some(Self::Sha256),
            _ => None,
        }
    }

    /// The `AlgorithmIdentifier` naming the paired RSA signature scheme,
    /// parameters an explicit NULL.
    pub fn algorithm_identifier(&self) -> Element {
        let arcs = match self {
            Self::Sha1 => oid::SHA1_WITH_RSA_ENCRYPTION,
            Self::Sha256 => oid::SHA256_WITH_RSA_ENCRYPTION,
        };
        Element::sequence(vec![Element::object_identifier(arcs), Element::null()])
    }

    pub fn digest(&self, data: &[u8]) -> Vec<u8> {
        match self {
            Self::Sha1 => Sha1::digest(data).to_vec(),
            Self::Sha256 => Sha256::digest(data).to_vec(),
        }
    }

    fn padding(&self) -> Pkcs1v15Sign {
        match self {
            Self::Sha1 => Pkcs1v15Sign::new::<Sha1>(),
            Self::Sha256 => Pkcs1v15Sign::new::<Sha256>(),
        }
    }
}

impl Default for SignatureHash {
    fn default() -> Self {
        Self::Sha256
    }
}

pub fn sign(key: &RsaPrivateKey, hash: SignatureHash, tbs: &[u8]) -> Result<Vec<u8>, SignError> {
    key.sign(hash.padding(), &hash.digest(tbs))
        .context(error::SignatureSnafu)
}

pub fn verify(
    key: &RsaPublicKey,
    hash: SignatureHash,
    tbs: &[u8],
    signature: &[u8],
) -> Result<(), SignError> {
    key.verify(hash.padding(), &hash.digest(tbs), signature)
        .context(error::VerificationSnafu)
}
