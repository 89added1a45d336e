//! Shared fixtures: a self-signed CA assembled with the crate's own codec,
//! plus request builders and response walkers.

#![allow(dead_code)]

use std::sync::OnceLock;

use chrono::{TimeZone, Utc};
use rsa::pkcs1::EncodeRsaPublicKey;
use rsa::RsaPrivateKey;
use sha1::{Digest, Sha1};

use ocspd::der::{self, Element};
use ocspd::oid;
use ocspd::registry::ResponderEntry;
use ocspd::sign::{self, SignatureHash};

pub struct TestCa {
    pub entry: ResponderEntry,
    /// SHA-1 over the DER subject name, as requests carry it.
    pub name_hash: Vec<u8>,
    /// SHA-1 over the subject public key bytes.
    pub key_hash: Vec<u8>,
}

/// Generating an RSA key dominates fixture cost, so the CA is built once
/// per test binary.
pub fn ca() -> &'static TestCa {
    static CA: OnceLock<TestCa> = OnceLock::new();
    CA.get_or_init(|| {
        let key = RsaPrivateKey::new(&mut rand::thread_rng(), 2048).expect("generate test key");
        let certificate = self_signed_certificate(&key, "ocspd test CA");
        let entry = ResponderEntry::new(&certificate, key, SignatureHash::Sha256)
            .expect("load test CA");

        TestCa {
            name_hash: Sha1::digest(&entry.subject_raw).to_vec(),
            key_hash: entry.key_hash.clone(),
            entry,
        }
    })
}

fn name(common_name: &str) -> Element {
    Element::sequence(vec![Element::set(vec![Element::sequence(vec![
        Element::object_identifier(oid::AT_COMMON_NAME),
        Element::utf8_string(common_name),
    ])])])
}

/// A minimal v3 certificate, self-signed with SHA-256.
fn self_signed_certificate(key: &RsaPrivateKey, common_name: &str) -> Vec<u8> {
    let algorithm = SignatureHash::Sha256.algorithm_identifier();
    let public_key_der = key
        .to_public_key()
        .to_pkcs1_der()
        .expect("encode public key")
        .as_bytes()
        .to_vec();

    let tbs_certificate = Element::sequence(vec![
        Element::explicit(0, Element::integer(2)),
        Element::integer(1),
        algorithm.clone(),
        name(common_name),
        Element::sequence(vec![
            Element::utc_time(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()),
            Element::utc_time(Utc.with_ymd_and_hms(2040, 1, 1, 0, 0, 0).unwrap()),
        ]),
        name(common_name),
        Element::sequence(vec![
            Element::sequence(vec![
                Element::object_identifier(oid::RSA_ENCRYPTION),
                Element::null(),
            ]),
            Element::bit_string(0, public_key_der),
        ]),
    ]);

    let tbs_der = der::encode(&tbs_certificate);
    let signature = sign::sign(key, SignatureHash::Sha256, &tbs_der).expect("sign test CA");

    der::encode(&Element::sequence(vec![
        tbs_certificate,
        algorithm,
        Element::bit_string(0, signature),
    ]))
}

pub fn cert_id(name_hash: &[u8], key_hash: &[u8], serial: &[u8]) -> Element {
    Element::sequence(vec![
        Element::sequence(vec![
            Element::object_identifier(oid::ID_SHA1),
            Element::null(),
        ]),
        Element::octet_string(name_hash.to_vec()),
        Element::octet_string(key_hash.to_vec()),
        Element::integer_raw(serial.to_vec()),
    ])
}

/// A well-formed single-entry `OCSPRequest`.
pub fn build_request(name_hash: &[u8], key_hash: &[u8], serial: &[u8]) -> Vec<u8> {
    let request = Element::sequence(vec![cert_id(name_hash, key_hash, serial)]);
    der::encode(&Element::sequence(vec![Element::sequence(vec![
        Element::sequence(vec![request]),
    ])]))
}

/// Unwraps a successful `OCSPResponse` down to the `BasicOCSPResponse`.
pub fn basic_response(body: &[u8]) -> Element {
    let response = der::decode(body).expect("response decodes");
    assert_eq!(
        response.child_at(0).unwrap().as_enumerated().unwrap(),
        0,
        "responseStatus is successful"
    );

    let response_bytes = response
        .find_context(0)
        .expect("responseBytes present")
        .child_at(0)
        .unwrap();
    assert_eq!(
        response_bytes.child_at(0).unwrap().as_oid().unwrap(),
        oid::ID_PKIX_OCSP_BASIC
    );

    let basic_der = response_bytes.child_at(1).unwrap().as_octet_string().unwrap();
    der::decode(basic_der).expect("BasicOCSPResponse decodes")
}

/// `(tbsResponseData, signature bytes)` of a basic response.
pub fn response_data(basic: &Element) -> (Element, Vec<u8>) {
    let tbs = basic.child_at(0).unwrap().clone();
    let (unused, signature) = basic
        .nth_child_of_type(0, ocspd::tag::Tag::BIT_STRING)
        .unwrap()
        .as_bit_string()
        .unwrap();
    assert_eq!(unused, 0);
    (tbs, signature.to_vec())
}

/// The lone `SingleResponse` of a response.
pub fn single_response(tbs: &Element) -> Element {
    let responses = tbs
        .nth_child_of_type(0, ocspd::tag::Tag::SEQUENCE)
        .expect("responses list");
    assert_eq!(responses.elements().len(), 1);
    responses.child_at(0).unwrap().clone()
}
