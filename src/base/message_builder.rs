//! Building a new DNS message.
//!
//! The types in this module allow building a DNS message consecutively from
//! its parts. Since messages consist of five parts, a number of types are
//! involved. The concept is that you start out with a [`MessageBuilder`] and
//! work your way step by step through the sections by trading the builder in
//! for one of another type representing the following section. The sequence
//! is [`MessageBuilder`], [`QuestionBuilder`], [`AnswerBuilder`],
//! [`AuthorityBuilder`], and finally [`AdditionalBuilder`].
//!
//! You can skip forward over unwanted sections. You can also go backwards,
//! but then you’ll lose anything you built before. The naming of the
//! methods that do these things is consistent across types: `question`,
//! `answer`, `authority`, and `additional` move to the respective section.
//!
//! Each type has a method `finish` that returns the octets of the final
//! message and a method `into_message` that returns a [`Message`] without
//! having to parse the octets again.
//!
//! Names are never compressed.
//!
//! # Example
//!
//! ```
//! use gateway_resolv::base::{Dname, MessageBuilder, Rtype};
//! use std::str::FromStr;
//!
//! let mut msg = MessageBuilder::new_vec().question();
//! msg.header_mut().set_rd(true);
//! msg.push((Dname::from_str("gw.example.com").unwrap(), Rtype::A)).unwrap();
//! let msg = msg.into_message();
//! assert_eq!(msg.header_counts().qdcount(), 1);
//! ```

use super::header::{Header, HeaderCounts, HeaderSection};
use super::iana::Rcode;
use super::message::Message;
use super::question::Question;
use super::record::Record;
use super::wire::{append_slice, ShortBuf};
use bytes::Bytes;
use std::{error, fmt};

//------------ MessageBuilder ------------------------------------------------

/// Starts building a DNS message.
///
/// This type wraps the octets builder and starts with an empty header
/// section. Use [`question`][Self::question] to move on to adding
/// questions, or [`start_answer`][Self::start_answer] to create a response
/// to an existing query.
#[derive(Clone, Debug)]
pub struct MessageBuilder {
    /// The header section of the message.
    header: HeaderSection,

    /// The message data past the header.
    target: Vec<u8>,

    question: Vec<Question>,
    answer: Vec<Record>,
    authority: Vec<Record>,
    additional: Vec<Record>,
}

/// # Creating Message Builders
///
impl MessageBuilder {
    /// Creates a new message builder using a new `Vec<u8>`.
    pub fn new_vec() -> Self {
        MessageBuilder {
            header: HeaderSection::new(),
            target: Vec::with_capacity(512),
            question: Vec::new(),
            answer: Vec::new(),
            authority: Vec::new(),
            additional: Vec::new(),
        }
    }

    /// Starts creating an answer for the given message.
    ///
    /// Specifically, this sets the ID, QR, OPCODE, RD, and RCODE fields in
    /// the header and attempts to push the message’s questions to the
    /// builder.
    pub fn start_answer(
        mut self,
        msg: &Message,
        rcode: Rcode,
    ) -> Result<AnswerBuilder, PushError> {
        {
            let header = self.header_mut();
            header.set_id(msg.header().id());
            header.set_qr(true);
            header.set_opcode(msg.header().opcode());
            header.set_rd(msg.header().rd());
            header.set_rcode(rcode);
        }
        let mut builder = self.question();
        for item in msg.question() {
            builder.push(item.clone())?;
        }
        Ok(builder.answer())
    }
}

/// # Access to the Message Header
///
impl MessageBuilder {
    /// Return the current value of the message header.
    pub fn header(&self) -> Header {
        *self.header.header()
    }

    /// Return a mutable reference to the message header for manipulations.
    pub fn header_mut(&mut self) -> &mut Header {
        self.header.header_mut()
    }

    /// Return the current value of the message header counts.
    pub fn counts(&self) -> HeaderCounts {
        *self.header.counts()
    }
}

/// # Conversions
///
impl MessageBuilder {
    /// Converts the message builder into a question builder.
    pub fn question(self) -> QuestionBuilder {
        QuestionBuilder::new(self)
    }

    /// Converts the message builder into an answer builder.
    pub fn answer(self) -> AnswerBuilder {
        self.question().answer()
    }

    /// Converts the message builder into an authority builder.
    pub fn authority(self) -> AuthorityBuilder {
        self.question().answer().authority()
    }

    /// Converts the message builder into an additional builder.
    pub fn additional(self) -> AdditionalBuilder {
        self.question().answer().authority().additional()
    }

    /// Returns the octets of the final message.
    pub fn finish(self) -> Vec<u8> {
        Self::assemble(&self.header, &self.target)
    }

    /// Converts the builder into a message.
    pub fn into_message(self) -> Message {
        let MessageBuilder {
            header,
            target,
            question,
            answer,
            authority,
            additional,
        } = self;
        Message::from_parts(
            Bytes::from(Self::assemble(&header, &target)),
            header,
            question,
            answer,
            authority,
            additional,
        )
    }

    //--- Internal helpers

    fn assemble(header: &HeaderSection, target: &[u8]) -> Vec<u8> {
        let mut res = Vec::with_capacity(HeaderSection::LEN + target.len());
        res.extend_from_slice(&header.to_array());
        res.extend_from_slice(target);
        res
    }

    /// Appends the wire format produced by `compose` and bumps a counter.
    ///
    /// If composing fails, the builder is left unchanged.
    fn push_item(
        &mut self,
        compose: impl FnOnce(&mut Vec<u8>) -> Result<(), ShortBuf>,
        count: impl FnOnce(&mut HeaderCounts) -> Result<(), PushError>,
    ) -> Result<(), PushError> {
        let mut buf = Vec::new();
        compose(&mut buf)?;
        let mut counts = *self.header.counts();
        count(&mut counts)?;
        if HeaderSection::LEN + self.target.len() + buf.len()
            > super::wire::MAX_MESSAGE_LEN
        {
            return Err(PushError::ShortBuf);
        }
        append_slice(&mut self.target, &buf)?;
        *self.header.counts_mut() = counts;
        Ok(())
    }

    /// Drops everything past the given section.
    fn rewind_to(&mut self, section: Section) {
        let counts = self.header.counts_mut();
        if section < Section::Additional {
            counts.set_arcount(0);
            self.additional.clear();
        }
        if section < Section::Authority {
            counts.set_nscount(0);
            self.authority.clear();
        }
        if section < Section::Answer {
            counts.set_ancount(0);
            self.answer.clear();
        }
        let mut len = 0;
        let mut buf = Vec::new();
        for item in &self.question {
            buf.clear();
            // Already composed once, so this cannot fail.
            let _ = item.compose(&mut buf);
            len += buf.len();
        }
        for item in self
            .answer
            .iter()
            .chain(self.authority.iter())
            .chain(self.additional.iter())
        {
            buf.clear();
            let _ = item.compose(&mut buf);
            len += buf.len();
        }
        self.target.truncate(len);
    }
}

/// The sections of a message in order.
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
enum Section {
    Question,
    Answer,
    Authority,
    Additional,
}

/// Increments one of the counters, failing on overflow.
fn inc(
    get: fn(HeaderCounts) -> u16,
    set: fn(&mut HeaderCounts, u16),
) -> impl FnOnce(&mut HeaderCounts) -> Result<(), PushError> {
    move |counts| {
        let value = get(*counts)
            .checked_add(1)
            .ok_or(PushError::CountOverflow)?;
        set(counts, value);
        Ok(())
    }
}

//------------ Section builders ----------------------------------------------

/// Implements the shared methods of the section builders.
macro_rules! section_builder {
    ($name:ident) => {
        impl $name {
            /// Return the current value of the message header.
            pub fn header(&self) -> Header {
                self.builder.header()
            }

            /// Return a mutable reference to the message header.
            pub fn header_mut(&mut self) -> &mut Header {
                self.builder.header_mut()
            }

            /// Return the current value of the message header counts.
            pub fn counts(&self) -> HeaderCounts {
                self.builder.counts()
            }

            /// Returns the octets of the final message.
            pub fn finish(self) -> Vec<u8> {
                self.builder.finish()
            }

            /// Converts the builder into a message.
            pub fn into_message(self) -> Message {
                self.builder.into_message()
            }
        }
    };
}

//------------ QuestionBuilder -----------------------------------------------

/// Builds the question section of a DNS message.
#[derive(Clone, Debug)]
pub struct QuestionBuilder {
    builder: MessageBuilder,
}

impl QuestionBuilder {
    fn new(mut builder: MessageBuilder) -> Self {
        builder.rewind_to(Section::Question);
        QuestionBuilder { builder }
    }

    /// Appends a question to the question section.
    ///
    /// The method accepts anything that can be converted into a
    /// [`Question`], such as a `(Dname, Rtype)` pair.
    pub fn push(
        &mut self,
        question: impl Into<Question>,
    ) -> Result<(), PushError> {
        let question = question.into();
        self.builder.push_item(
            |target| question.compose(target),
            inc(HeaderCounts::qdcount, HeaderCounts::set_qdcount),
        )?;
        self.builder.question.push(question);
        Ok(())
    }

    /// Converts the question builder into an answer builder.
    pub fn answer(self) -> AnswerBuilder {
        AnswerBuilder::new(self.builder)
    }

    /// Converts the question builder into an authority builder.
    pub fn authority(self) -> AuthorityBuilder {
        self.answer().authority()
    }

    /// Converts the question builder into an additional builder.
    pub fn additional(self) -> AdditionalBuilder {
        self.answer().authority().additional()
    }
}

section_builder!(QuestionBuilder);

//------------ AnswerBuilder -------------------------------------------------

/// Builds the answer section of a DNS message.
#[derive(Clone, Debug)]
pub struct AnswerBuilder {
    builder: MessageBuilder,
}

impl AnswerBuilder {
    fn new(mut builder: MessageBuilder) -> Self {
        builder.rewind_to(Section::Answer);
        AnswerBuilder { builder }
    }

    /// Appends a record to the answer section.
    pub fn push(&mut self, record: Record) -> Result<(), PushError> {
        self.builder.push_item(
            |target| record.compose(target),
            inc(HeaderCounts::ancount, HeaderCounts::set_ancount),
        )?;
        self.builder.answer.push(record);
        Ok(())
    }

    /// Converts the answer builder into a question builder.
    ///
    /// This drops all answers already added.
    pub fn question(self) -> QuestionBuilder {
        QuestionBuilder::new(self.builder)
    }

    /// Converts the answer builder into an authority builder.
    pub fn authority(self) -> AuthorityBuilder {
        AuthorityBuilder::new(self.builder)
    }

    /// Converts the answer builder into an additional builder.
    pub fn additional(self) -> AdditionalBuilder {
        self.authority().additional()
    }
}

section_builder!(AnswerBuilder);

//------------ AuthorityBuilder ----------------------------------------------

/// Builds the authority section of a DNS message.
#[derive(Clone, Debug)]
pub struct AuthorityBuilder {
    builder: MessageBuilder,
}

impl AuthorityBuilder {
    fn new(mut builder: MessageBuilder) -> Self {
        builder.rewind_to(Section::Authority);
        AuthorityBuilder { builder }
    }

    /// Appends a record to the authority section.
    pub fn push(&mut self, record: Record) -> Result<(), PushError> {
        self.builder.push_item(
            |target| record.compose(target),
            inc(HeaderCounts::nscount, HeaderCounts::set_nscount),
        )?;
        self.builder.authority.push(record);
        Ok(())
    }

    /// Converts the authority builder into an answer builder.
    ///
    /// This drops all authority records already added.
    pub fn answer(self) -> AnswerBuilder {
        AnswerBuilder::new(self.builder)
    }

    /// Converts the authority builder into an additional builder.
    pub fn additional(self) -> AdditionalBuilder {
        AdditionalBuilder::new(self.builder)
    }
}

section_builder!(AuthorityBuilder);

//------------ AdditionalBuilder ---------------------------------------------

/// Builds the additional section of a DNS message.
#[derive(Clone, Debug)]
pub struct AdditionalBuilder {
    builder: MessageBuilder,
}

impl AdditionalBuilder {
    fn new(mut builder: MessageBuilder) -> Self {
        builder.rewind_to(Section::Additional);
        AdditionalBuilder { builder }
    }

    /// Appends a record to the additional section.
    pub fn push(&mut self, record: Record) -> Result<(), PushError> {
        self.builder.push_item(
            |target| record.compose(target),
            inc(HeaderCounts::arcount, HeaderCounts::set_arcount),
        )?;
        self.builder.additional.push(record);
        Ok(())
    }

    /// Converts the additional builder into an authority builder.
    ///
    /// This drops all additional records already added.
    pub fn authority(self) -> AuthorityBuilder {
        AuthorityBuilder::new(self.builder)
    }
}

section_builder!(AdditionalBuilder);

//============ Error Types ===================================================

//------------ PushError -----------------------------------------------------

/// An error occurred when attempting to add data to a message.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PushError {
    /// A section count would exceed 65,535.
    CountOverflow,

    /// The message would exceed its maximum size.
    ShortBuf,
}

impl From<ShortBuf> for PushError {
    fn from(_: ShortBuf) -> Self {
        PushError::ShortBuf
    }
}

impl fmt::Display for PushError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            PushError::CountOverflow => f.write_str("counter overflow"),
            PushError::ShortBuf => fmt::Display::fmt(&ShortBuf, f),
        }
    }
}

impl error::Error for PushError {}

//============ Testing =======================================================
