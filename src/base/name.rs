//! Domain names.
//!
//! This module provides [`Dname`], an absolute domain name kept in its
//! uncompressed wire format. Since domain names compare case-insensitively,
//! all ASCII letters are folded to lower case when a name is created. This
//! makes names directly usable as keys, which is what the gateway cache
//! needs them for.

use super::wire::{append_slice, ParseError, Parser, ShortBuf};
use bytes::Bytes;
use std::str::FromStr;
use std::{error, fmt};

//------------ Module Configuration ------------------------------------------

/// The maximum length of a label.
const MAX_LABEL_LEN: usize = 63;

/// The maximum length of a domain name in wire format.
const MAX_NAME_LEN: usize = 255;

/// The maximum number of compression pointers followed while parsing.
const MAX_POINTERS: usize = 127;

//------------ Dname ---------------------------------------------------------

/// An uncompressed, absolute domain name.
///
/// The name is stored as a sequence of length-prefixed labels ending in the
/// empty root label. Letters are always lower case.
#[derive(Clone, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Dname(Bytes);

impl Dname {
    /// Returns the root name.
    pub fn root() -> Self {
        Dname(Bytes::from_static(b"\0"))
    }

    /// Returns whether this is the root name.
    pub fn is_root(&self) -> bool {
        self.0.len() == 1
    }

    /// Returns the wire-format representation of the name.
    pub fn as_slice(&self) -> &[u8] {
        self.0.as_ref()
    }

    /// Returns an iterator over the labels of the name.
    ///
    /// The final empty root label is not included.
    pub fn iter_labels(&self) -> LabelIter {
        LabelIter {
            octets: self.as_slice(),
        }
    }

    /// Parses a possibly compressed name from a message.
    ///
    /// The parser is left positioned right after the name as it appears at
    /// the original position, i.e., after the first compression pointer if
    /// there is one. Pointers must point strictly backwards so that a
    /// malicious message cannot make the parser loop.
    pub fn parse(parser: &mut Parser) -> Result<Self, ParseError> {
        let octets = parser.as_slice();
        let mut res = Vec::new();
        let mut pos = parser.pos();
        let mut end = None;
        let mut pointers = 0;

        loop {
            let len = *octets.get(pos).ok_or(ParseError::ShortInput)? as usize;
            match len & 0xC0 {
                0x00 => {
                    let label = octets
                        .get(pos + 1..pos + 1 + len)
                        .ok_or(ParseError::ShortInput)?;
                    if res.len() + 1 + len > MAX_NAME_LEN {
                        return Err(ParseError::form_error("long domain name"));
                    }
                    res.push(len as u8);
                    res.extend(label.iter().map(u8::to_ascii_lowercase));
                    pos += 1 + len;
                    if len == 0 {
                        break;
                    }
                }
                0xC0 => {
                    let low = *octets.get(pos + 1).ok_or(ParseError::ShortInput)?;
                    let target = ((len & 0x3F) << 8) | low as usize;
                    if target >= pos {
                        return Err(ParseError::form_error(
                            "compression pointer not pointing backwards",
                        ));
                    }
                    pointers += 1;
                    if pointers > MAX_POINTERS {
                        return Err(ParseError::form_error(
                            "too many compression pointers",
                        ));
                    }
                    if end.is_none() {
                        end = Some(pos + 2);
                    }
                    pos = target;
                }
                _ => {
                    return Err(ParseError::form_error("invalid label type"))
                }
            }
        }

        parser.seek(end.unwrap_or(pos))?;
        Ok(Dname(res.into()))
    }

    /// Appends the uncompressed wire format of the name to `target`.
    pub fn compose(&self, target: &mut Vec<u8>) -> Result<(), ShortBuf> {
        append_slice(target, self.as_slice())
    }
}

//--- FromStr

impl FromStr for Dname {
    type Err = DnameError;

    /// Parses a host name from its presentation format.
    ///
    /// The name is always taken to be absolute, the final dot is optional.
    /// Labels are restricted to letters, digits, hyphens and underscores;
    /// escape sequences are not supported.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(DnameError::Empty);
        }
        if s == "." {
            return Ok(Dname::root());
        }
        let s = s.strip_suffix('.').unwrap_or(s);
        let mut res = Vec::with_capacity(s.len() + 2);
        for label in s.split('.') {
            if label.is_empty() {
                return Err(DnameError::EmptyLabel);
            }
            if label.len() > MAX_LABEL_LEN {
                return Err(DnameError::LongLabel);
            }
            if !label
                .bytes()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == b'-' || ch == b'_')
            {
                return Err(DnameError::IllegalCharacter);
            }
            res.push(label.len() as u8);
            res.extend(label.bytes().map(|ch| ch.to_ascii_lowercase()));
        }
        res.push(0);
        if res.len() > MAX_NAME_LEN {
            return Err(DnameError::LongName);
        }
        Ok(Dname(res.into()))
    }
}

//--- Display and Debug

impl fmt::Display for Dname {
    /// Formats the name without the trailing dot unless it is the root.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_root() {
            return f.write_str(".");
        }
        let mut first = true;
        for label in self.iter_labels() {
            if !first {
                f.write_str(".")?;
            }
            first = false;
            for &ch in label {
                if ch.is_ascii_graphic() && ch != b'.' && ch != b'\\' {
                    write!(f, "{}", ch as char)?;
                } else {
                    write!(f, "\\{:03}", ch)?;
                }
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Dname {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Dname({})", self)
    }
}

//------------ LabelIter -----------------------------------------------------

/// An iterator over the labels of a [`Dname`].
#[derive(Clone, Debug)]
pub struct LabelIter<'a> {
    /// The remaining wire-format octets.
    octets: &'a [u8],
}

impl<'a> Iterator for LabelIter<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        let (&len, rest) = self.octets.split_first()?;
        if len == 0 {
            return None;
        }
        let (label, rest) = rest.split_at(len as usize);
        self.octets = rest;
        Some(label)
    }
}

//------------ DnameError ----------------------------------------------------

/// A domain name could not be created from its presentation format.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DnameError {
    /// The string was empty.
    Empty,

    /// The name contains an empty label.
    EmptyLabel,

    /// A label was longer than 63 octets.
    LongLabel,

    /// The name was longer than 255 octets.
    LongName,

    /// A label contains something other than a letter, digit, hyphen or
    /// underscore.
    IllegalCharacter,
}

impl fmt::Display for DnameError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            DnameError::Empty => f.write_str("empty domain name"),
            DnameError::EmptyLabel => f.write_str("empty label"),
            DnameError::LongLabel => f.write_str("label exceeds 63 octets"),
            DnameError::LongName => {
                f.write_str("domain name exceeds 255 octets")
            }
            DnameError::IllegalCharacter => {
                f.write_str("illegal character in label")
            }
        }
    }
}

impl error::Error for DnameError {}

//============ Testing =======================================================

#[cfg(test)]
mod test {
    use super::*;

    fn name(s: &str) -> Dname {
        Dname::from_str(s).unwrap()
    }

    #[test]
    fn from_str() {
        assert_eq!(name("test.gw.istio.io").as_slice(), b"\x04test\x02gw\x05istio\x02io\0");
        assert_eq!(name("test.gw.istio.io."), name("test.gw.istio.io"));
        assert_eq!(name("Test.GW.Example"), name("test.gw.example"));
        assert!(name(".").is_root());
        assert_eq!(Dname::from_str(""), Err(DnameError::Empty));
        assert_eq!(Dname::from_str("a..b"), Err(DnameError::EmptyLabel));
        assert_eq!(
            Dname::from_str("white space.example"),
            Err(DnameError::IllegalCharacter)
        );
        let long = "x".repeat(64);
        assert_eq!(Dname::from_str(&long), Err(DnameError::LongLabel));
        let long = ["x".repeat(60).as_str(); 5].join(".");
        assert_eq!(Dname::from_str(&long), Err(DnameError::LongName));
    }

    #[test]
    fn display() {
        assert_eq!(name("gw.Example.COM.").to_string(), "gw.example.com");
        assert_eq!(Dname::root().to_string(), ".");
        let n = name("a.bc");
        let labels: Vec<_> = n.iter_labels().collect();
        assert_eq!(labels, [&b"a"[..], &b"bc"[..]]);
    }

    #[test]
    fn parse_compressed() {
        // "example.com" at offset 0, then "gw" + pointer to offset 0.
        let msg = b"\x07example\x03com\x00\x02GW\xC0\x00\xFF";
        let mut parser = Parser::from_slice(msg);
        assert_eq!(Dname::parse(&mut parser).unwrap(), name("example.com"));
        assert_eq!(parser.pos(), 13);
        assert_eq!(Dname::parse(&mut parser).unwrap(), name("gw.example.com"));
        assert_eq!(parser.pos(), 18);
        assert_eq!(parser.parse_u8(), Ok(0xFF));
    }

    #[test]
    fn parse_rejects_loops() {
        // A pointer to itself.
        let mut parser = Parser::from_slice(b"\xC0\x00");
        assert!(matches!(
            Dname::parse(&mut parser),
            Err(ParseError::Form(_))
        ));

        // A forward pointer.
        let mut parser = Parser::from_slice(b"\xC0\x02\x00");
        assert!(Dname::parse(&mut parser).is_err());

        // Truncated label.
        let mut parser = Parser::from_slice(b"\x05ab");
        assert_eq!(Dname::parse(&mut parser), Err(ParseError::ShortInput));
    }

    #[test]
    fn compose() {
        let mut target = Vec::new();
        name("gw.example").compose(&mut target).unwrap();
        let mut parser = Parser::from_slice(&target);
        assert_eq!(Dname::parse(&mut parser).unwrap(), name("gw.example"));
    }
}
