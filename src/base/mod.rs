//! Basic DNS.
//!
//! This module provides the types and traits needed to ask a recursive
//! resolver for the addresses of a host and to understand its answer. It
//! covers exactly what the gateway resolver needs: domain names, the
//! message header, questions, records with the data types listed in
//! [rdata](crate::rdata), and building as well as parsing complete
//! messages.
//!
//! # Representation of Variable-length Data and DNS Messages
//!
//! Messages are parsed eagerly from a [`Bytes`](bytes::Bytes) value by
//! [`Message::from_octets`]. Domain names are decompressed while parsing and
//! kept in their lower-case uncompressed wire format in a [`Dname`], which
//! makes them cheap to clone and usable as map keys.
//!
//! New messages are built with a [`MessageBuilder`] which moves through the
//! sections of the message step by step.

pub use self::header::{Header, HeaderCounts, HeaderSection};
pub use self::iana::{Class, Opcode, Rcode, Rtype};
pub use self::message::Message;
pub use self::message_builder::{
    AdditionalBuilder, AnswerBuilder, AuthorityBuilder, MessageBuilder,
    PushError, QuestionBuilder,
};
pub use self::name::{Dname, DnameError};
pub use self::question::Question;
pub use self::record::{Record, Ttl};
pub use self::wire::{FormError, ParseError, Parser, ShortBuf};

pub mod header;
pub mod iana;
pub mod message;
pub mod message_builder;
pub mod name;
pub mod question;
pub mod record;
pub mod wire;
