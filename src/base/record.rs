//! Resource Records.
//!
//! This module defines types related to DNS resource records. The most
//! complete one is [`Record`] which contains a complete record for a certain
//! record type. [`Ttl`] is a small newtype around the 32 bit time-to-live
//! value of a record.

use super::iana::{Class, Rtype};
use super::name::Dname;
use super::wire::{append_u16, append_u32, ParseError, Parser, ShortBuf};
use crate::rdata::RecordData;
use std::time::Duration;
use std::fmt;

//------------ Record --------------------------------------------------------

/// A DNS resource record.
///
/// All information available through the DNS is stored in resource records.
/// They have a three part key of a domain name (the *owner*), a record type,
/// and a class. The type is given by the data. Records also carry a
/// time-to-live value that limits how long they may be cached.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Record {
    /// The owner of the record.
    owner: Dname,

    /// The class of the record.
    class: Class,

    /// The time-to-live value of the record.
    ttl: Ttl,

    /// The record data. The value also specifies the record’s type.
    data: RecordData,
}

/// # Creation and Element Access
///
impl Record {
    /// Creates a new record from its parts.
    pub fn new(
        owner: Dname,
        class: Class,
        ttl: Ttl,
        data: impl Into<RecordData>,
    ) -> Self {
        Record {
            owner,
            class,
            ttl,
            data: data.into(),
        }
    }

    /// Returns a reference to the owner domain name.
    pub fn owner(&self) -> &Dname {
        &self.owner
    }

    /// Returns the record type.
    pub fn rtype(&self) -> Rtype {
        self.data.rtype()
    }

    /// Returns the record class.
    pub fn class(&self) -> Class {
        self.class
    }

    /// Returns the record’s time-to-live.
    pub fn ttl(&self) -> Ttl {
        self.ttl
    }

    /// Return a reference to the record data.
    pub fn data(&self) -> &RecordData {
        &self.data
    }

    /// Trades the record for its record data.
    pub fn into_data(self) -> RecordData {
        self.data
    }
}

/// # Parsing and Composing
///
impl Record {
    /// Parses a record from the current position of `parser`.
    pub fn parse(parser: &mut Parser) -> Result<Self, ParseError> {
        let owner = Dname::parse(parser)?;
        let rtype = Rtype::from_int(parser.parse_u16()?);
        let class = Class::from_int(parser.parse_u16()?);
        let ttl = Ttl::parse(parser)?;
        let rdlen = parser.parse_u16()? as usize;
        let data = RecordData::parse(rtype, parser, rdlen)?;
        Ok(Record {
            owner,
            class,
            ttl,
            data,
        })
    }

    /// Appends the wire format of the record to `target`.
    pub fn compose(&self, target: &mut Vec<u8>) -> Result<(), ShortBuf> {
        self.owner.compose(target)?;
        append_u16(target, self.rtype().to_int())?;
        append_u16(target, self.class.to_int())?;
        self.ttl.compose(target)?;
        let len_pos = target.len();
        append_u16(target, 0)?;
        self.data.compose(target)?;
        let rdlen = u16::try_from(target.len() - len_pos - 2)
            .map_err(|_| ShortBuf)?;
        target[len_pos..len_pos + 2].copy_from_slice(&rdlen.to_be_bytes());
        Ok(())
    }
}

//--- Display

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}.\t{}\t{}\t{}",
            self.owner,
            self.ttl.as_secs(),
            self.class,
            self.rtype()
        )?;
        if let Some(addr) = self.data.ip_addr() {
            write!(f, "\t{}", addr)?;
        }
        Ok(())
    }
}

//------------ Ttl -----------------------------------------------------------

/// A span of time, typically used to describe the time a given DNS record
/// is valid.
///
/// `Ttl` is a thin wrapper around the 32 bit number of seconds from the
/// wire format. It converts into a [`Duration`] for scheduling.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Ttl(u32);

impl Ttl {
    /// A time-to-live of one second.
    pub const SECOND: Ttl = Ttl::from_secs(1);

    /// A duration of zero time.
    pub const ZERO: Ttl = Ttl::from_secs(0);

    /// The largest value permitted by RFC 2181.
    ///
    /// Values with the most significant bit set are treated as zero.
    pub const MAX: Ttl = Ttl::from_secs(0x7FFF_FFFF);

    /// Creates a new `Ttl` from the specified number of seconds.
    #[must_use]
    pub const fn from_secs(secs: u32) -> Self {
        Self(secs)
    }

    /// Returns the total time to live in seconds.
    #[must_use]
    pub const fn as_secs(&self) -> u32 {
        self.0
    }

    /// Converts a `Ttl` into a [`Duration`].
    #[must_use]
    pub const fn into_duration(&self) -> Duration {
        Duration::from_secs(self.0 as u64)
    }

    /// Returns `true` if this `Ttl` spans no time.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Parses a TTL value.
    ///
    /// Per section 8 of RFC 2181, values larger than [`Ttl::MAX`] are
    /// interpreted as zero.
    pub fn parse(parser: &mut Parser) -> Result<Self, ParseError> {
        let secs = parser.parse_u32()?;
        Ok(if secs > Self::MAX.0 {
            Self::ZERO
        } else {
            Self(secs)
        })
    }

    /// Appends the wire format of the value.
    pub fn compose(&self, target: &mut Vec<u8>) -> Result<(), ShortBuf> {
        append_u32(target, self.0)
    }
}

impl From<Ttl> for Duration {
    fn from(ttl: Ttl) -> Self {
        ttl.into_duration()
    }
}

//============ Testing =======================================================
