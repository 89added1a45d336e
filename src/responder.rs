//! The per-request pipeline: DER request in, DER response and cache
//! metadata out. Synchronous; one store lookup and one signing operation.

use chrono::{DateTime, Duration, Utc};
use snafu::ResultExt;
use tracing::{debug, error, warn};

use crate::cache;
use crate::error::{self, OcspError};
use crate::ocsp::{
    build_error_response, build_success_response, parse_request, OcspResponseStatus,
};
use crate::registry::Registry;
use crate::resolver;
use crate::store::RevocationStore;

/// A complete OCSP answer: the wire bytes plus what the HTTP collaborator
/// needs for its caching headers. Error responses carry no dates and no
/// cache policy.
#[derive(Debug, Clone)]
pub struct Reply {
    pub body: Vec<u8>,
    pub status: OcspResponseStatus,
    pub produced_at: Option<DateTime<Utc>>,
    pub next_update: Option<DateTime<Utc>>,
    pub cache_control: Option<String>,
}

/// The responder core. The registry and configuration are immutable after
/// construction and safe to share across workers.
#[derive(Debug)]
pub struct Responder<S> {
    registry: Registry,
    store: S,
    ttl: Duration,
    max_age: Option<u64>,
}

impl<S: RevocationStore> Responder<S> {
    pub fn new(registry: Registry, store: S) -> Self {
        Self {
            registry,
            store,
            ttl: Duration::days(1),
            max_age: None,
        }
    }

    /// The `nextUpdate` horizon. Defaults to one day.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Operator ceiling on the `max-age` cache directive, in seconds.
    pub fn with_max_age(mut self, max_age: Option<u64>) -> Self {
        self.max_age = max_age;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Answers one request. Every outcome is an `OCSPResponse`: failures
    /// become the unsigned error form with the mapped status.
    pub fn handle(&self, request: &[u8], now: DateTime<Utc>) -> Reply {
        match self.respond(request, now) {
            Ok(reply) => reply,
            Err(err) => {
                let status = err.status();
                if status == OcspResponseStatus::InternalError {
                    error!(%err, "request failed");
                } else {
                    debug!(%err, ?status, "refusing request");
                }
                Reply {
                    body: build_error_response(status),
                    status,
                    produced_at: None,
                    next_update: None,
                    cache_control: None,
                }
            }
        }
    }

    fn respond(&self, request: &[u8], now: DateTime<Utc>) -> Result<Reply, OcspError> {
        let parsed = parse_request(request).context(error::RequestSnafu)?;

        let entry = self
            .registry
            .lookup(&parsed.cert_id.issuer_key_hash)
            .ok_or_else(|| {
                error::UnknownIssuerSnafu {
                    key_hash: hex::encode(&parsed.cert_id.issuer_key_hash),
                }
                .build()
            })?;

        let status = resolver::resolve(&self.store, &parsed.cert_id, now)?;
        let signed = build_success_response(entry, &parsed.cert_id, &status, now, self.ttl)?;

        let directives = cache::directives(signed.produced_at, signed.next_update, self.max_age);
        if directives.stale {
            warn!(cert_id = %parsed.cert_id, "nextUpdate is already in the past");
        }

        Ok(Reply {
            body: signed.der,
            status: OcspResponseStatus::Successful,
            produced_at: Some(signed.produced_at),
            next_update: Some(signed.next_update),
            cache_control: Some(directives.header()),
        })
    }
}
