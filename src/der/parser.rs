//! Strict DER scanner: definite, minimal lengths only.

use nom::error::Error as NomError;
use snafu::ensure;

use super::{Element, Identifier};
use crate::error::{self, DecodeError};
use crate::tag::Class;

type Parsed<'a, T> = Result<(&'a [u8], T), DecodeError>;

pub(crate) fn parse_element(input: &[u8]) -> Parsed<'_, Element> {
    let (input, identifier) = parse_identifier_octet(input)?;
    let (input, length) = parse_length(input)?;
    let (input, contents) = take(input, length)?;

    let element = if identifier.is_constructed {
        let mut children = Vec::new();
        let mut rest = contents;
        while !rest.is_empty() {
            let (remaining, child) = parse_element(rest)?;
            rest = remaining;
            children.push(child);
        }
        Element::from_children(identifier, children)
    } else {
        Element::from_parts(identifier, contents.to_vec())
    };

    Ok((input, element))
}

fn parse_identifier_octet(input: &[u8]) -> Parsed<'_, Identifier> {
    let (input, octet) = take(input, 1)?;
    let initial_octet = octet[0];

    let class = Class::from_bits((initial_octet & 0xc0) >> 6);
    let constructed = (initial_octet & 0x20) != 0;
    let number = u32::from(initial_octet & 0x1f);

    if number != 0x1f {
        return Ok((input, Identifier::new(class, constructed, number)));
    }

    let (input, number) = parse_encoded_number(input)?;
    ensure!(number >= 0x1f, error::NonMinimalLengthSnafu);
    Ok((input, Identifier::new(class, constructed, number)))
}

/// Concatenates a series of 7-bit groups delimited by a set continuation
/// bit and ended by a clear one (X.690 8.1.2.4.2).
fn parse_encoded_number(input: &[u8]) -> Parsed<'_, u32> {
    let (input, body) = take_while(input, |i| i & 0x80 != 0)?;
    let (input, end) = take(input, 1)?;

    ensure!(
        body.first().map_or(true, |first| *first != 0x80),
        error::NonMinimalLengthSnafu
    );
    ensure!(body.len() < 5, error::TagOverflowSnafu);

    let mut number: u32 = 0;
    for byte in body {
        ensure!(number.leading_zeros() >= 7, error::TagOverflowSnafu);
        number = (number << 7) | u32::from(byte & 0x7f);
    }
    ensure!(number.leading_zeros() >= 7, error::TagOverflowSnafu);

    Ok((input, (number << 7) | u32::from(end[0])))
}

fn parse_length(input: &[u8]) -> Parsed<'_, usize> {
    let (input, octet) = take(input, 1)?;

    match octet[0] {
        0x80 => error::IndefiniteLengthSnafu.fail(),
        0xff => error::ReservedLengthSnafu.fail(),
        short if short < 0x80 => Ok((input, usize::from(short))),
        long => {
            let count = usize::from(long & 0x7f);
            ensure!(count <= core::mem::size_of::<usize>(), error::TruncatedSnafu);
            let (input, octets) = take(input, count)?;

            let mut length: usize = 0;
            for byte in octets {
                length = (length << 8) | usize::from(*byte);
            }
            // The long form must be needed and use no leading zero octets.
            ensure!(
                length >= 0x80 && octets[0] != 0,
                error::NonMinimalLengthSnafu
            );
            Ok((input, length))
        }
    }
}

fn take(input: &[u8], count: usize) -> Parsed<'_, &[u8]> {
    nom::bytes::complete::take::<_, _, NomError<&[u8]>>(count)(input)
        .map_err(|_| error::TruncatedSnafu.build())
}

fn take_while(input: &[u8], predicate: impl Fn(u8) -> bool) -> Parsed<'_, &[u8]> {
    nom::bytes::complete::take_while::<_, _, NomError<&[u8]>>(predicate)(input)
        .map_err(|_| error::TruncatedSnafu.build())
}
