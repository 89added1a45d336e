//! End-to-end request handling against a registry and an in-memory store.

mod common;

use chrono::{DateTime, TimeZone, Utc};
use pretty_assertions::assert_eq;

use common::{basic_response, build_request, ca, cert_id, response_data, single_response};
use ocspd::der::{self, Element};
use ocspd::http::{self, HttpRequest, REQUEST_CONTENT_TYPE, RESPONSE_CONTENT_TYPE};
use ocspd::registry::Registry;
use ocspd::sign::{self, SignatureHash};
use ocspd::store::{MemoryStore, RecordStatus, RevocationRecord};
use ocspd::tag::Tag;
use ocspd::Responder;

const MALFORMED: &[u8] = &[0x30, 0x03, 0x0a, 0x01, 0x01];
const UNAUTHORIZED: &[u8] = &[0x30, 0x03, 0x0a, 0x01, 0x06];

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

fn record(status: RecordStatus, expiry: &str, revoked: &str) -> RevocationRecord {
    RevocationRecord {
        status,
        expiry: expiry.to_string(),
        revoked: revoked.to_string(),
    }
}

fn responder(store: MemoryStore) -> Responder<MemoryStore> {
    let mut registry = Registry::new();
    registry.add(ca().entry.clone());
    Responder::new(registry, store)
}

fn post(responder: &Responder<MemoryStore>, body: &[u8]) -> http::HttpReply {
    http::handle(
        responder,
        &HttpRequest {
            method: "POST",
            path: "",
            content_type: Some(REQUEST_CONTENT_TYPE),
            body,
        },
        now(),
    )
}

#[test]
fn empty_body_yields_an_unsigned_malformed_response() {
    let reply = post(&responder(MemoryStore::new()), &[]);
    assert_eq!(reply.status, 200);
    assert_eq!(reply.header("Content-Type"), Some(RESPONSE_CONTENT_TYPE));
    assert_eq!(reply.body, MALFORMED);
}

#[test]
fn unknown_issuers_are_unauthorized() {
    let request = build_request(&[0x13; 20], &[0x37; 20], &[0x01]);
    let reply = post(&responder(MemoryStore::new()), &request);
    assert_eq!(reply.body, UNAUTHORIZED);
}

#[test]
fn valid_serials_are_good() {
    let ca = ca();
    let mut store = MemoryStore::new();
    store.insert("0A1B2C", record(RecordStatus::Valid, "991231235959Z", ""));

    let serial = [0x0a, 0x1b, 0x2c];
    let request = build_request(&ca.name_hash, &ca.key_hash, &serial);
    let reply = post(&responder(store), &request);
    assert_eq!(reply.status, 200);

    let basic = basic_response(&reply.body);
    let (tbs, signature) = response_data(&basic);
    sign::verify(
        &ca.entry.public_key(),
        SignatureHash::Sha256,
        &der::encode(&tbs),
        &signature,
    )
    .expect("signature verifies under the responder key");

    // responderID is byKey: SHA-1 of the responder public key bytes.
    let responder_id = tbs.find_context(2).unwrap();
    assert_eq!(
        responder_id.child_at(0).unwrap().as_octet_string().unwrap(),
        &ca.key_hash[..]
    );

    let single = single_response(&tbs);
    assert_eq!(
        single.child_at(0).unwrap(),
        &cert_id(&ca.name_hash, &ca.key_hash, &serial),
        "the response echoes the request CertID"
    );

    let status = single.child_at(1).unwrap();
    assert!(status.tag().is_context(0) && !status.is_constructed());

    let produced_at = tbs.nth_child_of_type(0, Tag::GENERALIZED_TIME).unwrap();
    let this_update = single.nth_child_of_type(0, Tag::GENERALIZED_TIME).unwrap();
    assert_eq!(produced_at, this_update);
    assert_eq!(this_update.as_instant().unwrap(), now());

    let next_update = single.child_at(3).unwrap();
    assert!(next_update.tag().is_context(0));
    assert_eq!(
        next_update.child_at(0).unwrap().as_instant().unwrap(),
        now() + chrono::Duration::days(1)
    );

    // The responder certificate rides along in certs [0].
    let certs = basic.find_context(0).unwrap().child_at(0).unwrap();
    assert_eq!(certs.child_at(0).unwrap(), &ca.entry.certificate);

    assert_eq!(
        reply.header("Cache-Control"),
        Some("max-age=86400,public,no-transform,must-revalidate")
    );
    assert_eq!(
        reply.header("Last-Modified"),
        Some("Mon, 01 Jan 2024 00:00:00 GMT")
    );
    assert_eq!(
        reply.header("Expires"),
        Some("Tue, 02 Jan 2024 00:00:00 GMT")
    );
}

#[test]
fn revoked_serials_carry_time_and_reason() {
    let ca = ca();
    let mut store = MemoryStore::new();
    store.insert(
        "0A1B2C",
        record(
            RecordStatus::Revoked,
            "991231235959Z",
            "230615101530Z,keyCompromise",
        ),
    );

    let request = build_request(&ca.name_hash, &ca.key_hash, &[0x0a, 0x1b, 0x2c]);
    let reply = post(&responder(store), &request);

    let basic = basic_response(&reply.body);
    let (tbs, _) = response_data(&basic);
    let single = single_response(&tbs);

    let status = single.child_at(1).unwrap();
    assert!(status.tag().is_context(1) && status.is_constructed());
    assert_eq!(
        status.child_at(0).unwrap().as_instant().unwrap(),
        Utc.with_ymd_and_hms(2023, 6, 15, 10, 15, 30).unwrap()
    );
    let reason = status.child_at(1).unwrap();
    assert!(reason.tag().is_context(0));
    assert_eq!(reason.child_at(0).unwrap().as_enumerated().unwrap(), 1);
}

#[test]
fn unknown_serials_are_reported_unknown() {
    let ca = ca();
    let mut store = MemoryStore::new();
    store.insert("0A1B2C", record(RecordStatus::Valid, "991231235959Z", ""));

    let request = build_request(&ca.name_hash, &ca.key_hash, &[0x0a, 0x1b, 0x2d]);
    let reply = post(&responder(store), &request);

    let basic = basic_response(&reply.body);
    let (tbs, _) = response_data(&basic);
    let status = single_response(&tbs).child_at(1).unwrap().clone();
    assert!(status.tag().is_context(2) && !status.is_constructed());
}

#[test]
fn expired_certificates_are_not_answered_for() {
    let ca = ca();
    let mut store = MemoryStore::new();
    store.insert("0A1B2C", record(RecordStatus::Valid, "231231235959Z", ""));

    let request = build_request(&ca.name_hash, &ca.key_hash, &[0x0a, 0x1b, 0x2c]);
    let reply = post(&responder(store), &request);
    assert_eq!(reply.body, UNAUTHORIZED);
}

#[test]
fn multi_entry_request_lists_are_malformed() {
    let ca = ca();
    let entry = Element::sequence(vec![cert_id(&ca.name_hash, &ca.key_hash, &[0x01])]);
    let request = der::encode(&Element::sequence(vec![Element::sequence(vec![
        Element::sequence(vec![entry.clone(), entry]),
    ])]));

    let reply = post(&responder(MemoryStore::new()), &request);
    assert_eq!(reply.body, MALFORMED);
}

#[test]
fn get_requests_travel_in_the_path() {
    use base64::engine::general_purpose::URL_SAFE as BASE64URL;
    use base64::Engine;

    let ca = ca();
    let mut store = MemoryStore::new();
    store.insert("0A1B2C", record(RecordStatus::Valid, "991231235959Z", ""));
    let responder = responder(store);

    let request = build_request(&ca.name_hash, &ca.key_hash, &[0x0a, 0x1b, 0x2c]);
    let path = format!("///{}", BASE64URL.encode(&request));

    let reply = http::handle(
        &responder,
        &HttpRequest {
            method: "GET",
            path: &path,
            content_type: None,
            body: &[],
        },
        now(),
    );
    assert_eq!(reply.status, 200);
    let basic = basic_response(&reply.body);
    let (tbs, _) = response_data(&basic);
    let status = single_response(&tbs).child_at(1).unwrap().clone();
    assert!(status.tag().is_context(0));
}
