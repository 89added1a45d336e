//! Core of a lightweight OCSP responder (RFC 6960), profiled for
//! high-volume deployment by RFC 5019.
//!
//! Given a DER `OCSPRequest` naming a single end-entity certificate, the
//! responder consults the issuing CA's revocation database and returns a
//! signed DER `OCSPResponse` (good, revoked, or unknown) plus the HTTP cache
//! metadata the profile prescribes. A CRL builder covers the out-of-band
//! side of the same database.
//!
//! The pipeline, leaves first: [`der`] decodes the request bytes into an
//! element tree, [`ocsp`] validates it and later assembles the response,
//! [`registry`] maps the request's issuer key hash to a signing identity,
//! [`resolver`] classifies the serial against the [`store`], and
//! [`responder`] ties it together, mapping every failure onto an OCSP
//! status. [`http`] and [`cache`] implement the transport collaborator
//! contract; [`crl`] signs certificate lists for the same CA.

pub mod cache;
pub mod config;
pub mod crl;
pub mod der;
pub mod error;
pub mod http;
pub mod ocsp;
pub mod oid;
pub mod registry;
pub mod resolver;
pub mod responder;
pub mod sign;
pub mod store;
pub mod tag;

pub use config::Config;
pub use der::Element;
pub use responder::{Reply, Responder};
