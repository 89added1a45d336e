//! Strict DER codec over an explicit TLV tree.
//!
//! The decoder accepts definite, minimally-encoded lengths only; the encoder
//! is deterministic, so `encode(decode(encode(e))) == encode(e)` for any
//! element `e`.

mod element;
mod enc;
mod identifier;
mod parser;
pub(crate) mod time;

pub use element::Element;
pub use identifier::Identifier;

use snafu::ensure;

use crate::error::{self, DecodeError};

/// Decodes one DER element covering the whole input.
pub fn decode(input: &[u8]) -> Result<Element, DecodeError> {
    let (rest, element) = parser::parse_element(input)?;
    ensure!(
        rest.is_empty(),
        error::TrailingBytesSnafu { count: rest.len() }
    );
    Ok(element)
}

/// Serializes an element tree back into DER.
pub fn encode(element: &Element) -> Vec<u8> {
    enc::encode(element)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag::Tag;
    use chrono::TimeZone;
    use num_bigint::BigInt;
    use pretty_assertions::assert_eq;

    fn sample() -> Element {
        let at = chrono::Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Element::sequence(vec![
            Element::integer(BigInt::from(0x0a1b2c)),
            Element::octet_string(vec![0xde, 0xad, 0xbe, 0xef]),
            Element::bit_string(0, vec![0x55; 16]),
            Element::object_identifier(crate::oid::ID_SHA1),
            Element::explicit(0, Element::generalized_time(at)),
            Element::implicit(1, Element::sequence(vec![Element::utc_time(at)])),
            Element::enumerated(6),
            Element::boolean(false),
            Element::null(),
        ])
    }

    #[test]
    fn decode_inverts_encode() {
        let tree = sample();
        assert_eq!(decode(&encode(&tree)).unwrap(), tree);
    }

    #[test]
    fn encode_is_deterministic_on_decoded_bytes() {
        let bytes = encode(&sample());
        let reencoded = encode(&decode(&bytes).unwrap());
        assert_eq!(reencoded, bytes);
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let mut bytes = encode(&Element::null());
        bytes.push(0x00);
        assert!(matches!(
            decode(&bytes),
            Err(DecodeError::TrailingBytes { count: 1 })
        ));
    }

    #[test]
    fn times_read_back_as_instants() {
        let at = chrono::Utc.with_ymd_and_hms(2023, 6, 15, 10, 15, 30).unwrap();
        let decoded = decode(&encode(&Element::utc_time(at))).unwrap();
        assert_eq!(decoded.tag(), Tag::UTC_TIME);
        assert_eq!(decoded.as_instant().unwrap(), at);

        let decoded = decode(&encode(&Element::generalized_time(at))).unwrap();
        assert_eq!(decoded.as_instant().unwrap(), at);
    }
}
