//! Deterministic DER serialization of an element tree.

use super::{Element, Identifier};
use crate::tag::Class;

pub(crate) fn encode(element: &Element) -> Vec<u8> {
    let mut output = Vec::new();
    encode_element(element, &mut output);
    output
}

fn encode_element(element: &Element, output: &mut Vec<u8>) {
    let contents: Vec<u8> = if element.is_constructed() {
        let mut inner = Vec::new();
        for child in element.elements() {
            encode_element(child, &mut inner);
        }
        inner
    } else {
        element.contents().unwrap_or_default().to_vec()
    };

    encode_identifier(element.identifier(), output);
    encode_length(contents.len(), output);
    output.extend_from_slice(&contents);
}

fn encode_identifier(identifier: Identifier, output: &mut Vec<u8>) {
    let class = match identifier.tag.class {
        Class::Universal => 0,
        Class::Application => 0b0100_0000,
        Class::Context => 0b1000_0000,
        Class::Private => 0b1100_0000,
    };
    let constructed = if identifier.is_constructed { 0b0010_0000 } else { 0 };
    let number = identifier.tag.value;

    if number < 0x1f {
        output.push(class | constructed | number as u8);
    } else {
        output.push(class | constructed | 0x1f);
        let mut groups = [(number & 0x7f) as u8; 5];
        let mut count = 1;
        let mut rest = number >> 7;
        while rest != 0 {
            groups[count] = (rest & 0x7f) as u8 | 0x80;
            count += 1;
            rest >>= 7;
        }
        output.extend(groups[..count].iter().rev());
    }
}

fn encode_length(length: usize, output: &mut Vec<u8>) {
    if length < 0x80 {
        output.push(length as u8);
    } else {
        let octets = length.to_be_bytes();
        let skip = octets.iter().take_while(|byte| **byte == 0).count();
        output.push(0x80 | (octets.len() - skip) as u8);
        output.extend_from_slice(&octets[skip..]);
    }
}
