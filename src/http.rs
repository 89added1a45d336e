//! The HTTP collaborator contract: framing in, headers out. The transport
//! itself (sockets, method parsing, header emission) lives outside the core.

use base64::engine::general_purpose::URL_SAFE as BASE64URL;
use base64::Engine;
use chrono::{DateTime, Utc};
use sha1::{Digest, Sha1};

use crate::responder::Responder;
use crate::store::RevocationStore;

pub const REQUEST_CONTENT_TYPE: &str = "application/ocsp-request";
pub const RESPONSE_CONTENT_TYPE: &str = "application/ocsp-response";

/// What the transport hands the core.
#[derive(Debug, Clone, Copy)]
pub struct HttpRequest<'a> {
    pub method: &'a str,
    /// Path info below the responder mount point.
    pub path: &'a str,
    pub content_type: Option<&'a str>,
    pub body: &'a [u8],
}

/// What the transport sends back.
#[derive(Debug, Clone)]
pub struct HttpReply {
    pub status: u16,
    pub headers: Vec<(&'static str, String)>,
    pub body: Vec<u8>,
}

impl HttpReply {
    fn plain(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Frames a transport request, runs the responder, and attaches the
/// RFC 5019 caching headers.
///
/// Framing failures (wrong content type, undecodable GET path) are 400 and
/// unsupported methods 405; those never reach the OCSP status mapper. A
/// decoded body always yields 200 with an `OCSPResponse`, error or not.
pub fn handle<S: RevocationStore>(
    responder: &Responder<S>,
    request: &HttpRequest<'_>,
    now: DateTime<Utc>,
) -> HttpReply {
    let body;
    let request_der: &[u8] = if request.method.eq_ignore_ascii_case("POST") {
        if request.content_type != Some(REQUEST_CONTENT_TYPE) {
            return HttpReply::plain(400);
        }
        request.body
    } else if request.method.eq_ignore_ascii_case("GET") {
        match decode_get_path(request.path) {
            Some(decoded) => {
                body = decoded;
                &body
            }
            None => return HttpReply::plain(400),
        }
    } else {
        return HttpReply::plain(405);
    };

    let reply = responder.handle(request_der, now);

    let mut headers = vec![
        ("Content-Type", RESPONSE_CONTENT_TYPE.to_string()),
        ("Content-Length", reply.body.len().to_string()),
        ("ETag", format!("\"{}\"", hex::encode(Sha1::digest(&reply.body)))),
    ];
    if let Some(produced_at) = reply.produced_at {
        headers.push(("Last-Modified", rfc1123(produced_at)));
    }
    if let Some(next_update) = reply.next_update {
        headers.push(("Expires", rfc1123(next_update)));
    }
    if let Some(cache_control) = reply.cache_control {
        headers.push(("Cache-Control", cache_control));
    }

    HttpReply {
        status: 200,
        headers,
        body: reply.body,
    }
}

/// A GET carries the base64url request as its final path segment. Leading
/// separators are stripped (proxies stack up to three extra ones); the
/// url-safe alphabet keeps '/' out of the payload itself.
fn decode_get_path(path: &str) -> Option<Vec<u8>> {
    let encoded = path.trim_start_matches('/');
    if encoded.is_empty() {
        return None;
    }
    BASE64URL.decode(encoded).ok()
}

fn rfc1123(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;
    use crate::store::MemoryStore;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn responder() -> Responder<MemoryStore> {
        Responder::new(Registry::new(), MemoryStore::new())
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn post_with_empty_body_still_gets_an_ocsp_answer() {
        let reply = handle(
            &responder(),
            &HttpRequest {
                method: "POST",
                path: "",
                content_type: Some(REQUEST_CONTENT_TYPE),
                body: &[],
            },
            now(),
        );
        assert_eq!(reply.status, 200);
        assert_eq!(reply.header("Content-Type"), Some(RESPONSE_CONTENT_TYPE));
        assert_eq!(reply.body, vec![0x30, 0x03, 0x0a, 0x01, 0x01]);
        assert_eq!(reply.header("Content-Length"), Some("5"));
        assert!(reply.header("Cache-Control").is_none());
    }

    #[test]
    fn wrong_content_type_is_a_transport_failure() {
        let reply = handle(
            &responder(),
            &HttpRequest {
                method: "POST",
                path: "",
                content_type: Some("text/plain"),
                body: &[0x30, 0x00],
            },
            now(),
        );
        assert_eq!(reply.status, 400);
        assert!(reply.body.is_empty());
    }

    #[test]
    fn get_tolerates_stacked_leading_slashes() {
        let encoded = BASE64URL.encode([0x30, 0x00]);
        for prefix in ["/", "////"] {
            let path = format!("{prefix}{encoded}");
            let reply = handle(
                &responder(),
                &HttpRequest {
                    method: "GET",
                    path: &path,
                    content_type: None,
                    body: &[],
                },
                now(),
            );
            assert_eq!(reply.status, 200);
            assert_eq!(reply.body, vec![0x30, 0x03, 0x0a, 0x01, 0x01]);
        }
    }

    #[test]
    fn undecodable_get_paths_are_rejected() {
        for path in ["/", "/%%%not-base64%%%"] {
            let reply = handle(
                &responder(),
                &HttpRequest {
                    method: "GET",
                    path,
                    content_type: None,
                    body: &[],
                },
                now(),
            );
            assert_eq!(reply.status, 400);
        }
    }

    #[test]
    fn other_methods_are_not_allowed() {
        let reply = handle(
            &responder(),
            &HttpRequest {
                method: "PUT",
                path: "",
                content_type: None,
                body: &[],
            },
            now(),
        );
        assert_eq!(reply.status, 405);
    }

    #[test]
    fn etag_is_the_sha1_of_the_body() {
        let reply = handle(
            &responder(),
            &HttpRequest {
                method: "POST",
                path: "",
                content_type: Some(REQUEST_CONTENT_TYPE),
                body: &[],
            },
            now(),
        );
        let expected = hex::encode(Sha1::digest(&reply.body));
        assert_eq!(reply.header("ETag"), Some(format!("\"{expected}\"").as_str()));
    }
}
