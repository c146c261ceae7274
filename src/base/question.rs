//! A single question in a DNS message.
//!
//! This module defines the type [`Question`] which represents an entry in
//! the question section of a DNS message.

use super::iana::{Class, Rtype};
use super::name::Dname;
use super::wire::{append_u16, ParseError, Parser, ShortBuf};
use std::fmt;

//------------ Question ------------------------------------------------------

/// A question in a DNS message.
///
/// In DNS, a question describes what is requested in a query. It consists
/// of three elements: a domain name, a record type, and a class. This type
/// represents such a question.
///
/// Questions are generally printed in the same way as they appear in zone
/// files: name, class, and type separated by tabs.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Question {
    /// The domain name of the question.
    qname: Dname,

    /// The record type of the question.
    qtype: Rtype,

    /// The class of the question.
    qclass: Class,
}

/// # Creation and Conversion
///
impl Question {
    /// Creates a new question from its three components.
    pub fn new(qname: Dname, qtype: Rtype, qclass: Class) -> Self {
        Question {
            qname,
            qtype,
            qclass,
        }
    }

    /// Creates a new question from a name and record type, assuming class IN.
    pub fn new_in(qname: Dname, qtype: Rtype) -> Self {
        Question::new(qname, qtype, Class::IN)
    }
}

/// # Field Access
///
impl Question {
    /// Returns a reference to the domain name in the question.
    pub fn qname(&self) -> &Dname {
        &self.qname
    }

    /// Returns the record type of the question.
    pub fn qtype(&self) -> Rtype {
        self.qtype
    }

    /// Returns the class of the question.
    pub fn qclass(&self) -> Class {
        self.qclass
    }
}

/// # Parsing and Composing
///
impl Question {
    /// Parses a question from the current position of `parser`.
    pub fn parse(parser: &mut Parser) -> Result<Self, ParseError> {
        Ok(Question::new(
            Dname::parse(parser)?,
            Rtype::from_int(parser.parse_u16()?),
            Class::from_int(parser.parse_u16()?),
        ))
    }

    /// Appends the wire format of the question to `target`.
    pub fn compose(&self, target: &mut Vec<u8>) -> Result<(), ShortBuf> {
        self.qname.compose(target)?;
        append_u16(target, self.qtype.to_int())?;
        append_u16(target, self.qclass.to_int())
    }
}

//--- From

impl From<(Dname, Rtype)> for Question {
    fn from((name, rtype): (Dname, Rtype)) -> Self {
        Question::new_in(name, rtype)
    }
}

//--- Display

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.\t{}\t{}", self.qname, self.qclass, self.qtype)
    }
}

//============ Testing =======================================================

#[cfg(test)]
mod test {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn parse_and_display() {
        let question = Question::from((
            Dname::from_str("gw.example").unwrap(),
            Rtype::AAAA,
        ));
        let mut target = Vec::new();
        question.compose(&mut target).unwrap();
        assert_eq!(&target[target.len() - 4..], b"\x00\x1c\x00\x01");

        let parsed = Question::parse(&mut Parser::from_slice(&target)).unwrap();
        assert_eq!(parsed, question);
        assert_eq!(parsed.to_string(), "gw.example.\tIN\tAAAA");
    }
}
