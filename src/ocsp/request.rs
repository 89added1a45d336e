//! Validation and extraction of the single `CertID` of an `OCSPRequest`.

use snafu::{ensure, OptionExt, ResultExt};

use super::CertId;
use crate::der::{self, Element};
use crate::error::{self, RequestError};
use crate::oid;
use crate::tag::Tag;

/// The usable content of a validated request.
#[derive(Debug, Clone)]
pub struct ParsedRequest {
    pub cert_id: CertId,
    /// id-pkix-ocsp-nonce payload, parsed out of band and never echoed.
    pub nonce: Option<Vec<u8>>,
}

/// Decodes and validates an `OCSPRequest`:
///
/// 1. the version, when present, must be v1 (0);
/// 2. no critical extension is accepted at either the request or the
///    single-request level, since none is implemented;
/// 3. the request list must hold exactly one entry.
pub fn parse_request(input: &[u8]) -> Result<ParsedRequest, RequestError> {
    let request = der::decode(input).context(error::MalformedAsn1Snafu)?;
    let tbs_request = require(request.child_at(0), "tbsRequest")?;
    ensure!(
        tbs_request.tag() == Tag::SEQUENCE,
        error::MissingFieldSnafu {
            field: "tbsRequest",
        }
    );

    if let Some(version) = tbs_request.find_context(0) {
        let version = require(version.child_at(0), "version")?
            .as_integer()
            .context(error::MalformedAsn1Snafu)?;
        ensure!(
            version == num_bigint::BigInt::from(0),
            error::UnsupportedVersionSnafu {
                version: num_traits::ToPrimitive::to_i64(&version).unwrap_or(i64::MAX),
            }
        );
    }

    // requestorName [1] is ignored when present.

    let mut nonce = None;
    if let Some(extensions) = tbs_request.find_context(2) {
        scan_extensions(require(extensions.child_at(0), "requestExtensions")?, &mut nonce)?;
    }

    let request_list = tbs_request
        .nth_child_of_type(0, Tag::SEQUENCE)
        .context(error::MissingFieldSnafu {
            field: "requestList",
        })?;
    let entry = match request_list.elements() {
        [] => error::RequestListEmptySnafu.fail()?,
        [entry] => entry,
        _ => error::RequestListMultipleSnafu.fail()?,
    };

    if let Some(extensions) = entry.find_context(0) {
        scan_extensions(
            require(extensions.child_at(0), "singleRequestExtensions")?,
            &mut nonce,
        )?;
    }

    let cert_id = parse_cert_id(require(entry.child_at(0), "reqCert")?)?;

    Ok(ParsedRequest { cert_id, nonce })
}

/// Positional CertID access: hash algorithm, issuer name hash, issuer key
/// hash, serial number.
fn parse_cert_id(req_cert: &Element) -> Result<CertId, RequestError> {
    let algorithm = require(req_cert.child_at(0), "hashAlgorithm")?
        .nth_child_of_type(0, Tag::OBJECT_IDENTIFIER)
        .context(error::MissingFieldSnafu {
            field: "hashAlgorithm",
        })?
        .as_oid()
        .context(error::MalformedAsn1Snafu)?;
    let issuer_name_hash = require(req_cert.child_at(1), "issuerNameHash")?
        .as_octet_string()
        .context(error::MalformedAsn1Snafu)?
        .to_vec();
    let issuer_key_hash = require(req_cert.child_at(2), "issuerKeyHash")?
        .as_octet_string()
        .context(error::MalformedAsn1Snafu)?
        .to_vec();
    let serial_number = require(req_cert.child_at(3), "serialNumber")?
        .as_raw_integer()
        .context(error::MalformedAsn1Snafu)?
        .to_vec();

    Ok(CertId::new(
        algorithm,
        issuer_name_hash,
        issuer_key_hash,
        serial_number,
        req_cert.clone(),
    ))
}

/// Rejects any critical extension and collects the nonce payload.
fn scan_extensions(
    extensions: &Element,
    nonce: &mut Option<Vec<u8>>,
) -> Result<(), RequestError> {
    for extension in extensions.elements() {
        let id = require(extension.child_at(0), "extnID")?
            .as_oid()
            .context(error::MalformedAsn1Snafu)?;

        if let Some(critical) = extension.nth_child_of_type(0, Tag::BOOL) {
            let critical = critical.as_boolean().context(error::MalformedAsn1Snafu)?;
            ensure!(
                !critical,
                error::UnsupportedCriticalExtensionSnafu { oid: dotted(&id) }
            );
        }

        if id == oid::ID_PKIX_OCSP_NONCE {
            if let Some(value) = extension.nth_child_of_type(0, Tag::OCTET_STRING) {
                let value = value.as_octet_string().context(error::MalformedAsn1Snafu)?;
                // The extnValue octets wrap a DER OCTET STRING holding the
                // nonce itself; fall back to the raw octets otherwise.
                let inner = der::decode(value)
                    .ok()
                    .and_then(|e| e.as_octet_string().map(<[u8]>::to_vec).ok());
                *nonce = Some(inner.unwrap_or_else(|| value.to_vec()));
            }
        }
    }
    Ok(())
}

fn require<'a>(
    element: Option<&'a Element>,
    field: &'static str,
) -> Result<&'a Element, RequestError> {
    element.context(error::MissingFieldSnafu { field })
}

fn dotted(arcs: &[u32]) -> String {
    arcs.iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(".")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn cert_id_element(serial: &[u8]) -> Element {
        Element::sequence(vec![
            Element::sequence(vec![
                Element::object_identifier(oid::ID_SHA1),
                Element::null(),
            ]),
            Element::octet_string(vec![0x11; 20]),
            Element::octet_string(vec![0x22; 20]),
            Element::integer_raw(serial.to_vec()),
        ])
    }

    fn request(entries: Vec<Element>, extensions: Option<Element>) -> Vec<u8> {
        let mut tbs = Vec::new();
        tbs.push(Element::sequence(entries));
        if let Some(extensions) = extensions {
            tbs.push(Element::explicit(2, extensions));
        }
        der::encode(&Element::sequence(vec![Element::sequence(tbs)]))
    }

    fn single(serial: &[u8]) -> Element {
        Element::sequence(vec![cert_id_element(serial)])
    }

    #[test]
    fn extracts_the_cert_id() {
        let parsed = parse_request(&request(vec![single(&[0x0a, 0x1b, 0x2c])], None)).unwrap();
        assert_eq!(parsed.cert_id.hash_algorithm, oid::ID_SHA1);
        assert_eq!(parsed.cert_id.serial_number, vec![0x0a, 0x1b, 0x2c]);
        assert_eq!(parsed.cert_id.serial_hex(), "0A1B2C");
        assert_eq!(parsed.nonce, None);
    }

    #[test]
    fn versioned_v1_requests_are_accepted() {
        let tbs = Element::sequence(vec![
            Element::explicit(0, Element::integer(0)),
            Element::sequence(vec![single(&[0x01])]),
        ]);
        let bytes = der::encode(&Element::sequence(vec![tbs]));
        assert!(parse_request(&bytes).is_ok());
    }

    #[test]
    fn future_versions_are_rejected() {
        let tbs = Element::sequence(vec![
            Element::explicit(0, Element::integer(1)),
            Element::sequence(vec![single(&[0x01])]),
        ]);
        let bytes = der::encode(&Element::sequence(vec![tbs]));
        assert!(matches!(
            parse_request(&bytes),
            Err(RequestError::UnsupportedVersion { version: 1 })
        ));
    }

    #[test]
    fn empty_and_multiple_request_lists_are_rejected() {
        assert!(matches!(
            parse_request(&request(vec![], None)),
            Err(RequestError::RequestListEmpty)
        ));
        assert!(matches!(
            parse_request(&request(vec![single(&[0x01]), single(&[0x02])], None)),
            Err(RequestError::RequestListMultiple)
        ));
    }

    #[test]
    fn critical_extensions_are_rejected() {
        let extensions = Element::sequence(vec![Element::sequence(vec![
            Element::object_identifier(&[1, 2, 3, 4]),
            Element::boolean(true),
            Element::octet_string(vec![]),
        ])]);
        assert!(matches!(
            parse_request(&request(vec![single(&[0x01])], Some(extensions))),
            Err(RequestError::UnsupportedCriticalExtension { .. })
        ));
    }

    #[test]
    fn nonce_is_parsed_but_out_of_band() {
        let payload = der::encode(&Element::octet_string(vec![0xab; 16]));
        let extensions = Element::sequence(vec![Element::sequence(vec![
            Element::object_identifier(oid::ID_PKIX_OCSP_NONCE),
            Element::octet_string(payload),
        ])]);
        let parsed =
            parse_request(&request(vec![single(&[0x01])], Some(extensions))).unwrap();
        assert_eq!(parsed.nonce, Some(vec![0xab; 16]));
    }

    #[test]
    fn garbage_is_malformed() {
        assert!(matches!(
            parse_request(&[0x30, 0x03, 0x02]),
            Err(RequestError::MalformedAsn1 { .. })
        ));
        assert!(matches!(
            parse_request(&[]),
            Err(RequestError::MalformedAsn1 { .. })
        ));
    }
}
