//! Minimal BER element reader
//!
//! PKCS#12 files in the wild mix DER with BER (indefinite lengths and
//! segmented OCTET STRINGs), so container layers are walked with the BER
//! parser and only leaf values are interpreted.

use std::borrow::Cow;
use thiserror::Error;
use x509_parser::der_parser::asn1_rs::{Any, Class, FromBer, Oid, Tag};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct BerError(pub String);

impl BerError {
    fn new(message: impl Into<String>) -> Self {
        BerError(message.into())
    }
}

/// One encoded element, borrowed from the input
#[derive(Debug, Clone, Copy)]
pub struct Element<'a> {
    pub class: Class,
    pub tag: Tag,
    pub constructed: bool,
    /// Header, content and end-of-contents octets
    pub raw: &'a [u8],
    /// Content octets only
    pub content: &'a [u8],
}

impl<'a> Element<'a> {
    /// Read the first element of `input`, returning it and the remaining bytes
    pub fn parse(input: &'a [u8]) -> Result<(Self, &'a [u8]), BerError> {
        if input.is_empty() {
            return Err(BerError::new("unexpected end of data"));
        }

        let (rest, any) =
            Any::from_ber(input).map_err(|e| BerError(format!("invalid BER element: {}", e)))?;
        let raw = &input[..input.len() - rest.len()];

        Ok((
            Element {
                class: any.class(),
                tag: any.tag(),
                constructed: any.header.is_constructed(),
                raw,
                content: any.data,
            },
            rest,
        ))
    }

    /// Read exactly one element spanning all of `input`
    pub fn parse_exact(input: &'a [u8]) -> Result<Self, BerError> {
        let (element, rest) = Self::parse(input)?;
        if !rest.is_empty() {
            return Err(BerError(format!(
                "{} trailing bytes after element",
                rest.len()
            )));
        }
        Ok(element)
    }

    fn is_universal(&self, tag: Tag) -> bool {
        self.class == Class::Universal && self.tag == tag
    }

    /// Whether this is the context-specific tag `[number]`
    pub fn is_context(&self, number: u32) -> bool {
        self.class == Class::ContextSpecific && self.tag == Tag(number)
    }

    /// Child elements of a constructed element
    pub fn children(&self) -> Result<Vec<Element<'a>>, BerError> {
        if !self.constructed {
            return Err(BerError::new("expected a constructed element"));
        }

        let mut children = Vec::new();
        let mut input = self.content;
        while !input.is_empty() {
            let (child, rest) = Self::parse(input)?;
            children.push(child);
            input = rest;
        }
        Ok(children)
    }

    /// Children of a SEQUENCE; `what` names the structure in errors
    pub fn sequence(&self, what: &str) -> Result<Vec<Element<'a>>, BerError> {
        if !self.is_universal(Tag::Sequence) {
            return Err(BerError(format!("{} is not a SEQUENCE", what)));
        }
        self.children()
    }

    /// The single element wrapped by an explicit `[number]` tag
    pub fn explicit(&self, number: u32, what: &str) -> Result<Element<'a>, BerError> {
        if !self.is_context(number) || !self.constructed {
            return Err(BerError(format!("{} is not tagged [{}]", what, number)));
        }
        Element::parse_exact(self.content)
    }

    /// Dotted form of an OBJECT IDENTIFIER
    pub fn oid(&self) -> Result<String, BerError> {
        if !self.is_universal(Tag::Oid) || self.constructed || self.content.is_empty() {
            return Err(BerError::new("expected an OBJECT IDENTIFIER"));
        }
        Ok(Oid::new(Cow::Borrowed(self.content)).to_id_string())
    }

    /// A non-negative INTEGER that fits in 32 bits
    pub fn u32(&self) -> Result<u32, BerError> {
        if !self.is_universal(Tag::Integer) || self.constructed || self.content.is_empty() {
            return Err(BerError::new("expected an INTEGER"));
        }
        if self.content[0] & 0x80 != 0 {
            return Err(BerError::new("negative INTEGER"));
        }

        let significant: Vec<u8> = self
            .content
            .iter()
            .copied()
            .skip_while(|b| *b == 0)
            .collect();
        if significant.len() > 4 {
            return Err(BerError::new("INTEGER out of range"));
        }
        Ok(significant
            .iter()
            .fold(0u32, |acc, b| (acc << 8) | u32::from(*b)))
    }

    /// Value of a universal OCTET STRING
    pub fn octet_string(&self) -> Result<Vec<u8>, BerError> {
        if !self.is_universal(Tag::OctetString) {
            return Err(BerError::new("expected an OCTET STRING"));
        }
        self.octets()
    }

    /// Octets of a string-like element whatever its tag, joining BER
    /// constructed segments
    pub fn octets(&self) -> Result<Vec<u8>, BerError> {
        if !self.constructed {
            return Ok(self.content.to_vec());
        }

        let mut joined = Vec::new();
        for segment in self.children()? {
            joined.extend(segment.octet_string()?);
        }
        Ok(joined)
    }
}

/// Encode a definite-length element; used to build fixtures in tests
#[cfg(test)]
pub(crate) fn encode(tag: u8, content: &[u8]) -> Vec<u8> {
    let mut out = vec![tag];
    let len = content.len();
    if len < 0x80 {
        out.push(len as u8);
    } else {
        let bytes: Vec<u8> = len
            .to_be_bytes()
            .iter()
            .copied()
            .skip_while(|b| *b == 0)
            .collect();
        out.push(0x80 | bytes.len() as u8);
        out.extend(bytes);
    }
    out.extend_from_slice(content);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_children_and_raw() {
        // SEQUENCE { INTEGER 3, OID 1.2.840.113549.1.7.1 }
        let data = [
            0x30, 0x0e, 0x02, 0x01, 0x03, 0x06, 0x09, 0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01,
            0x07, 0x01,
        ];
        let element = Element::parse_exact(&data).unwrap();
        let children = element.sequence("test").unwrap();

        assert_eq!(element.raw, &data[..]);
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].u32().unwrap(), 3);
        assert_eq!(children[1].oid().unwrap(), "1.2.840.113549.1.7.1");
        assert_eq!(children[1].raw, &data[5..]);
    }

    #[test]
    fn test_indefinite_length_and_segmented_octets() {
        // OCTET STRING (constructed, indefinite) { "ab", "cd" } EOC
        let data = [
            0x24, 0x80, 0x04, 0x02, b'a', b'b', 0x04, 0x02, b'c', b'd', 0x00, 0x00,
        ];
        let element = Element::parse_exact(&data).unwrap();
        assert_eq!(element.octet_string().unwrap(), b"abcd");
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let err = Element::parse_exact(&[0x05, 0x00, 0xff]).unwrap_err();
        assert!(err.to_string().contains("trailing"));
    }

    #[test]
    fn test_u32_rejects_negative_and_large() {
        let negative = encode(0x02, &[0xff]);
        assert!(Element::parse_exact(&negative).unwrap().u32().is_err());

        let large = encode(0x02, &[0x01, 0x00, 0x00, 0x00, 0x00]);
        assert!(Element::parse_exact(&large).unwrap().u32().is_err());

        let padded = encode(0x02, &[0x00, 0x80, 0x00]);
        assert_eq!(Element::parse_exact(&padded).unwrap().u32().unwrap(), 0x8000);
    }

    #[test]
    fn test_explicit_tag() {
        let inner = encode(0x05, &[]);
        let tagged = encode(0xa0, &inner);
        let element = Element::parse_exact(&tagged).unwrap();

        assert!(element.is_context(0));
        assert_eq!(element.explicit(0, "content").unwrap().raw, inner.as_slice());
        assert!(element.explicit(1, "content").is_err());
    }
}
