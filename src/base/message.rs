//! Accessing existing DNS messages.
//!
//! This module defines the [`Message`] type which wraps the octets of a
//! complete DNS message together with its parsed content. Messages received
//! by the resolver are small and only ever inspected as a whole, so the
//! message is parsed eagerly when it is created: if [`Message::from_octets`]
//! succeeds, every section is available as a slice of already decoded
//! entries.
//!
//! For creating new messages, use the
//! [`MessageBuilder`](super::message_builder::MessageBuilder).

use super::header::{Header, HeaderCounts, HeaderSection};
use super::iana::{Class, Rcode, Rtype};
use super::name::Dname;
use super::question::Question;
use super::record::{Record, Ttl};
use super::wire::{ParseError, Parser};
use crate::rdata::RecordData;
use bytes::Bytes;
use std::net::IpAddr;

//------------ Message -------------------------------------------------------

/// A DNS message.
///
/// The type keeps the original octets around so that a message can be
/// passed on unchanged, for instance when it is sent over the network.
#[derive(Clone, Debug)]
pub struct Message {
    /// The octets of the message.
    octets: Bytes,

    /// The header section.
    header: HeaderSection,

    /// The question section.
    question: Vec<Question>,

    /// The answer section.
    answer: Vec<Record>,

    /// The authority section.
    authority: Vec<Record>,

    /// The additional section.
    additional: Vec<Record>,
}

/// # Creation and Conversion
///
impl Message {
    /// Creates a message from an octets sequence.
    ///
    /// This fails if the header or any of the sections cannot be parsed.
    /// Trailing octets after the last record announced in the header are
    /// ignored.
    pub fn from_octets(octets: Bytes) -> Result<Self, ParseError> {
        let mut parser = Parser::from_slice(octets.as_ref());
        let header = HeaderSection::parse(&mut parser)?;
        let counts = *header.counts();
        let question = (0..counts.qdcount())
            .map(|_| Question::parse(&mut parser))
            .collect::<Result<_, _>>()?;
        let answer = Self::parse_section(&mut parser, counts.ancount())?;
        let authority = Self::parse_section(&mut parser, counts.nscount())?;
        let additional = Self::parse_section(&mut parser, counts.arcount())?;
        Ok(Message {
            octets,
            header,
            question,
            answer,
            authority,
            additional,
        })
    }

    /// Creates a message from a slice by copying the octets.
    pub fn from_slice(slice: &[u8]) -> Result<Self, ParseError> {
        Self::from_octets(Bytes::copy_from_slice(slice))
    }

    /// Assembles a message from parts known to be consistent.
    pub(super) fn from_parts(
        octets: Bytes,
        header: HeaderSection,
        question: Vec<Question>,
        answer: Vec<Record>,
        authority: Vec<Record>,
        additional: Vec<Record>,
    ) -> Self {
        Message {
            octets,
            header,
            question,
            answer,
            authority,
            additional,
        }
    }

    fn parse_section(
        parser: &mut Parser,
        count: u16,
    ) -> Result<Vec<Record>, ParseError> {
        (0..count).map(|_| Record::parse(parser)).collect()
    }

    /// Returns a reference to the underlying octets sequence.
    pub fn as_octets(&self) -> &Bytes {
        &self.octets
    }

    /// Returns a slice of the underlying octets.
    pub fn as_slice(&self) -> &[u8] {
        self.octets.as_ref()
    }
}

/// # Header Section
///
impl Message {
    /// Returns the message header.
    pub fn header(&self) -> Header {
        *self.header.header()
    }

    /// Returns the header counts of the message.
    pub fn header_counts(&self) -> HeaderCounts {
        *self.header.counts()
    }

    /// Returns whether the rcode of the header is NoError.
    pub fn no_error(&self) -> bool {
        self.header().rcode() == Rcode::NOERROR
    }

    /// Returns whether the rcode of the header is one of the error values.
    pub fn is_error(&self) -> bool {
        self.header().rcode() != Rcode::NOERROR
    }
}

/// # Access to Sections
///
impl Message {
    /// Returns the question section.
    pub fn question(&self) -> &[Question] {
        &self.question
    }

    /// Returns the answer section.
    pub fn answer(&self) -> &[Record] {
        &self.answer
    }

    /// Returns the authority section.
    pub fn authority(&self) -> &[Record] {
        &self.authority
    }

    /// Returns the additional section.
    pub fn additional(&self) -> &[Record] {
        &self.additional
    }
}

/// # Helpers for Common Tasks
///
impl Message {
    /// Returns whether this is the answer to some other message.
    ///
    /// The method checks whether the ID fields of the headers are the same,
    /// whether the QR flag is set in this message, and whether the questions
    /// are the same.
    pub fn is_answer(&self, query: &Message) -> bool {
        self.header().qr()
            && self.header().id() == query.header().id()
            && self.question == query.question
    }

    /// Returns the first question, if there is any.
    pub fn first_question(&self) -> Option<&Question> {
        self.question.first()
    }

    /// Returns the query type of the first question, if any.
    pub fn qtype(&self) -> Option<Rtype> {
        self.first_question().map(Question::qtype)
    }

    /// Returns the addresses of type `rtype` owned by the answer section.
    ///
    /// Records of other types, such as the CNAME records leading to the
    /// address records, are skipped. The second element is the smallest
    /// TTL of all returned records or `None` if there are none.
    pub fn answer_addrs(&self, rtype: Rtype) -> (Vec<IpAddr>, Option<Ttl>) {
        let mut ttl: Option<Ttl> = None;
        let addrs = self
            .answer
            .iter()
            .filter(|record| {
                record.rtype() == rtype && record.class() == Class::IN
            })
            .filter_map(|record| {
                let addr = record.data().ip_addr()?;
                ttl = Some(match ttl {
                    Some(ttl) => ttl.min(record.ttl()),
                    None => record.ttl(),
                });
                Some(addr)
            })
            .collect();
        (addrs, ttl)
    }

    /// Returns the negative caching TTL of the message.
    ///
    /// Per section 5 of RFC 2308 this is the smaller of the TTL of the SOA
    /// record in the authority section and its minimum field. Returns
    /// `None` if there is no SOA record.
    pub fn negative_ttl(&self) -> Option<Ttl> {
        self.authority
            .iter()
            .filter_map(|record| match record.data() {
                RecordData::Soa(soa) => Some(soa.negative_ttl(record.ttl())),
                _ => None,
            })
            .min()
    }

    /// Returns whether the first question asks for `qname`.
    pub fn is_question_for(&self, qname: &Dname) -> bool {
        self.first_question()
            .map(|question| question.qname() == qname)
            .unwrap_or(false)
    }
}

//============ Testing =======================================================

#[cfg(test)]
mod test {
    use super::*;
    use crate::base::message_builder::MessageBuilder;
    use crate::rdata::{Aaaa, Soa, A};
    use std::str::FromStr;

    fn name(s: &str) -> Dname {
        Dname::from_str(s).unwrap()
    }

    fn query(qname: &str, qtype: Rtype) -> Message {
        let mut msg = MessageBuilder::new_vec().question();
        msg.header_mut().set_id(0x4242);
        msg.header_mut().set_rd(true);
        msg.push((name(qname), qtype)).unwrap();
        msg.into_message()
    }

    #[test]
    fn parse_answer() {
        let query = query("gw.example", Rtype::A);
        let mut answer = MessageBuilder::new_vec()
            .start_answer(&query, Rcode::NOERROR)
            .unwrap();
        answer
            .push(Record::new(
                name("gw.example"),
                Class::IN,
                Ttl::from_secs(30),
                A::from_octets(10, 0, 0, 1),
            ))
            .unwrap();
        answer
            .push(Record::new(
                name("gw.example"),
                Class::IN,
                Ttl::from_secs(20),
                A::from_octets(10, 0, 0, 2),
            ))
            .unwrap();
        answer
            .push(Record::new(
                name("gw.example"),
                Class::IN,
                Ttl::from_secs(5),
                Aaaa::new("fd00::1".parse().unwrap()),
            ))
            .unwrap();
        let octets = answer.finish();

        let msg = Message::from_slice(&octets).unwrap();
        assert!(msg.is_answer(&query));
        assert!(msg.no_error());
        assert_eq!(msg.header_counts().ancount(), 3);
        assert_eq!(msg.qtype(), Some(Rtype::A));
        assert!(msg.is_question_for(&name("GW.example")));
        let (addrs, ttl) = msg.answer_addrs(Rtype::A);
        assert_eq!(
            addrs,
            vec![IpAddr::from([10, 0, 0, 1]), IpAddr::from([10, 0, 0, 2])]
        );
        assert_eq!(ttl, Some(Ttl::from_secs(20)));
        assert_eq!(msg.negative_ttl(), None);
    }

    #[test]
    fn is_answer_checks_id_and_question() {
        let query = query("gw.example", Rtype::A);
        let answer = MessageBuilder::new_vec()
            .start_answer(&query, Rcode::NXDOMAIN)
            .unwrap()
            .into_message();
        assert!(answer.is_answer(&query));
        assert!(answer.is_error());
        assert!(!query.is_answer(&query));

        let mut other = MessageBuilder::new_vec()
            .start_answer(&query, Rcode::NOERROR)
            .unwrap();
        other.header_mut().set_id(0x4243);
        assert!(!other.into_message().is_answer(&query));

        let other_question = MessageBuilder::new_vec()
            .start_answer(&self::query("gw.example", Rtype::AAAA), Rcode::NOERROR)
            .unwrap()
            .into_message();
        assert!(!other_question.is_answer(&query));
    }

    #[test]
    fn negative_ttl_from_soa() {
        let query = query("missing.example", Rtype::AAAA);
        let mut msg = MessageBuilder::new_vec()
            .start_answer(&query, Rcode::NOERROR)
            .unwrap()
            .authority();
        msg.push(Record::new(
            name("example"),
            Class::IN,
            Ttl::from_secs(900),
            Soa::new(
                name("ns.example"),
                name("hostmaster.example"),
                1,
                Ttl::from_secs(3600),
                Ttl::from_secs(600),
                Ttl::from_secs(86400),
                Ttl::from_secs(120),
            ),
        ))
        .unwrap();
        let msg = Message::from_slice(&msg.finish()).unwrap();
        assert_eq!(msg.answer_addrs(Rtype::AAAA), (Vec::new(), None));
        assert_eq!(msg.negative_ttl(), Some(Ttl::from_secs(120)));
    }

    #[test]
    fn reject_short_message() {
        assert_eq!(
            Message::from_slice(b"\x00\x01\x81\x80\x00\x01").unwrap_err(),
            ParseError::ShortInput
        );
        // Header announces a question that is missing.
        assert!(Message::from_slice(
            b"\x00\x01\x81\x80\x00\x01\x00\x00\x00\x00\x00\x00"
        )
        .is_err());
    }
}
