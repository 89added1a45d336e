use chrono::{DateTime, Utc};
use num_bigint::BigInt;
use num_traits::ToPrimitive;
use snafu::{ensure, OptionExt};

use super::time;
use super::Identifier;
use crate::error::{self, DecodeError};
use crate::tag::{Class, Tag};

/// A node in a decoded or under-construction DER tree.
///
/// Identity is `(class, tag number, constructed, value)`; two elements are
/// equal iff all four match, so a decoded tree re-encodes byte-exactly.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Element {
    identifier: Identifier,
    value: Value,
}

#[derive(Debug, Clone, Eq, PartialEq)]
enum Value {
    Primitive(Vec<u8>),
    Constructed(Vec<Element>),
}

impl Element {
    pub(crate) fn primitive(tag: Tag, contents: Vec<u8>) -> Self {
        Self {
            identifier: Identifier::from_tag(tag, false),
            value: Value::Primitive(contents),
        }
    }

    pub(crate) fn constructed(tag: Tag, children: Vec<Element>) -> Self {
        Self {
            identifier: Identifier::from_tag(tag, true),
            value: Value::Constructed(children),
        }
    }

    pub fn sequence(children: Vec<Element>) -> Self {
        Self::constructed(Tag::SEQUENCE, children)
    }

    pub fn set(children: Vec<Element>) -> Self {
        Self::constructed(Tag::SET, children)
    }

    pub fn integer(value: impl Into<BigInt>) -> Self {
        Self::primitive(Tag::INTEGER, value.into().to_signed_bytes_be())
    }

    /// An INTEGER with caller-supplied content octets, for values that must
    /// round-trip exactly as received (certificate serial numbers).
    pub fn integer_raw(contents: Vec<u8>) -> Self {
        Self::primitive(Tag::INTEGER, contents)
    }

    pub fn enumerated(value: i64) -> Self {
        Self::primitive(Tag::ENUMERATED, BigInt::from(value).to_signed_bytes_be())
    }

    pub fn boolean(value: bool) -> Self {
        Self::primitive(Tag::BOOL, vec![if value { 0xff } else { 0x00 }])
    }

    pub fn null() -> Self {
        Self::primitive(Tag::NULL, Vec::new())
    }

    pub fn octet_string(contents: Vec<u8>) -> Self {
        Self::primitive(Tag::OCTET_STRING, contents)
    }

    pub fn utf8_string(text: &str) -> Self {
        Self::primitive(Tag::UTF8_STRING, text.as_bytes().to_vec())
    }

    /// A BIT STRING over whole bytes plus an unused-bit count, which covers
    /// every bit string this crate emits (signatures and key material).
    pub fn bit_string(unused_bits: u8, bytes: Vec<u8>) -> Self {
        debug_assert!(unused_bits < 8);
        let mut contents = Vec::with_capacity(bytes.len() + 1);
        contents.push(unused_bits);
        contents.extend_from_slice(&bytes);
        Self::primitive(Tag::BIT_STRING, contents)
    }

    /// Packs arcs into base-128 contents. `arcs` must hold at least two
    /// components with a first arc of 0, 1, or 2.
    pub fn object_identifier(arcs: &[u32]) -> Self {
        debug_assert!(arcs.len() >= 2 && arcs[0] <= 2);
        let mut contents = Vec::new();
        encode_base128(u64::from(arcs[0]) * 40 + u64::from(arcs[1]), &mut contents);
        for arc in &arcs[2..] {
            encode_base128(u64::from(*arc), &mut contents);
        }
        Self::primitive(Tag::OBJECT_IDENTIFIER, contents)
    }

    pub fn generalized_time(at: DateTime<Utc>) -> Self {
        Self::primitive(Tag::GENERALIZED_TIME, time::format_generalized(at).into_bytes())
    }

    pub fn utc_time(at: DateTime<Utc>) -> Self {
        Self::primitive(Tag::UTC_TIME, time::format_utc(at).into_bytes())
    }

    /// Wraps `inner` in a constructed context-specific tag (EXPLICIT tagging).
    pub fn explicit(number: u32, inner: Element) -> Self {
        Self::constructed(Tag::context(number), vec![inner])
    }

    /// Retags `inner` with a context-specific tag, keeping its construction
    /// and value (IMPLICIT tagging).
    pub fn implicit(number: u32, inner: Element) -> Self {
        Self {
            identifier: Identifier::new(Class::Context, inner.identifier.is_constructed, number),
            value: inner.value,
        }
    }

    pub(crate) fn from_parts(identifier: Identifier, contents: Vec<u8>) -> Self {
        Self {
            identifier,
            value: Value::Primitive(contents),
        }
    }

    pub(crate) fn from_children(identifier: Identifier, children: Vec<Element>) -> Self {
        Self {
            identifier,
            value: Value::Constructed(children),
        }
    }

    pub fn identifier(&self) -> Identifier {
        self.identifier
    }

    pub fn tag(&self) -> Tag {
        self.identifier.tag
    }

    /// The tag number, regardless of class.
    pub fn type_id(&self) -> u32 {
        self.identifier.tag.value
    }

    pub fn class(&self) -> Class {
        self.identifier.tag.class
    }

    pub fn is_constructed(&self) -> bool {
        self.identifier.is_constructed
    }

    /// Child elements; empty for primitive values.
    pub fn elements(&self) -> &[Element] {
        match &self.value {
            Value::Constructed(children) => children,
            Value::Primitive(_) => &[],
        }
    }

    pub fn child_at(&self, index: usize) -> Option<&Element> {
        self.elements().get(index)
    }

    /// The `n`th child (zero-based) carrying `tag`, skipping children of
    /// other types.
    pub fn nth_child_of_type(&self, n: usize, tag: Tag) -> Option<&Element> {
        self.elements().iter().filter(|e| e.tag() == tag).nth(n)
    }

    /// The first context-specific child numbered `number`, how tagged
    /// OPTIONAL fields are located.
    pub fn find_context(&self, number: u32) -> Option<&Element> {
        self.elements().iter().find(|e| e.tag().is_context(number))
    }

    /// Raw content octets; `None` for constructed elements.
    pub fn contents(&self) -> Option<&[u8]> {
        match &self.value {
            Value::Primitive(contents) => Some(contents),
            Value::Constructed(_) => None,
        }
    }

    fn primitive_contents(&self, expected: Tag) -> Result<&[u8], DecodeError> {
        ensure!(
            self.tag() == expected,
            error::MismatchedTagSnafu {
                expected,
                actual: self.tag(),
            }
        );
        self.contents().context(error::UnexpectedConstructedSnafu)
    }

    pub fn as_integer(&self) -> Result<BigInt, DecodeError> {
        let contents = self.primitive_contents(Tag::INTEGER)?;
        ensure!(!contents.is_empty(), error::InvalidIntegerSnafu);
        Ok(BigInt::from_signed_bytes_be(contents))
    }

    /// The raw content octets of an INTEGER, preserving sign and length.
    pub fn as_raw_integer(&self) -> Result<&[u8], DecodeError> {
        self.primitive_contents(Tag::INTEGER)
    }

    pub fn as_enumerated(&self) -> Result<i64, DecodeError> {
        let contents = self.primitive_contents(Tag::ENUMERATED)?;
        ensure!(!contents.is_empty(), error::InvalidIntegerSnafu);
        BigInt::from_signed_bytes_be(contents)
            .to_i64()
            .context(error::InvalidIntegerSnafu)
    }

    pub fn as_octet_string(&self) -> Result<&[u8], DecodeError> {
        self.primitive_contents(Tag::OCTET_STRING)
    }

    pub fn as_boolean(&self) -> Result<bool, DecodeError> {
        let contents = self.primitive_contents(Tag::BOOL)?;
        ensure!(contents.len() == 1, error::InvalidBooleanSnafu);
        Ok(contents[0] != 0)
    }

    /// Unused-bit count and payload bytes of a BIT STRING.
    pub fn as_bit_string(&self) -> Result<(u8, &[u8]), DecodeError> {
        let contents = self.primitive_contents(Tag::BIT_STRING)?;
        let unused = *contents.first().context(error::TruncatedSnafu)?;
        ensure!(unused < 8, error::InvalidBitStringSnafu { bits: unused });
        Ok((unused, &contents[1..]))
    }

    pub fn as_oid(&self) -> Result<Vec<u32>, DecodeError> {
        let contents = self.primitive_contents(Tag::OBJECT_IDENTIFIER)?;
        decode_oid(contents)
    }

    /// Reads either time type as an instant.
    pub fn as_instant(&self) -> Result<DateTime<Utc>, DecodeError> {
        let text = core::str::from_utf8(self.contents().context(error::UnexpectedConstructedSnafu)?)
            .ok()
            .context(error::InvalidDateSnafu { text: String::new() })?;
        match self.tag() {
            Tag::GENERALIZED_TIME => time::parse_generalized(text),
            Tag::UTC_TIME => time::parse_utc(text),
            actual => Err(error::MismatchedTagSnafu {
                expected: Tag::GENERALIZED_TIME,
                actual,
            }
            .build()),
        }
    }
}

fn encode_base128(mut value: u64, out: &mut Vec<u8>) {
    let start = out.len();
    out.push((value & 0x7f) as u8);
    value >>= 7;
    while value != 0 {
        out.insert(start, (value & 0x7f) as u8 | 0x80);
        value >>= 7;
    }
}

fn decode_oid(contents: &[u8]) -> Result<Vec<u32>, DecodeError> {
    ensure!(!contents.is_empty(), error::InvalidObjectIdentifierSnafu);
    ensure!(
        contents.last().map_or(false, |last| last & 0x80 == 0),
        error::InvalidObjectIdentifierSnafu
    );

    let mut arcs = Vec::new();
    let mut accumulator: u64 = 0;
    for byte in contents {
        ensure!(
            accumulator != 0 || *byte != 0x80,
            error::InvalidObjectIdentifierSnafu
        );
        ensure!(accumulator >> 57 == 0, error::InvalidObjectIdentifierSnafu);
        accumulator = (accumulator << 7) | u64::from(byte & 0x7f);
        if byte & 0x80 == 0 {
            if arcs.is_empty() {
                let first = (accumulator / 40).min(2);
                arcs.push(first as u32);
                arcs.push((accumulator - first * 40) as u32);
            } else {
                arcs.push(
                    accumulator
                        .to_u32()
                        .context(error::InvalidObjectIdentifierSnafu)?,
                );
            }
            accumulator = 0;
        }
    }
    Ok(arcs)
}
