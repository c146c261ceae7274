//! Record data.
//!
//! Only three record types are interpreted: the two address records,
//! A from [RFC 1035] and AAAA from [RFC 3596], plus SOA which carries the
//! negative caching TTL of an empty answer per [RFC 2308]. Data of all
//! other types is kept as opaque octets so that it can be skipped and, when
//! building messages, copied verbatim.
//!
//! [RFC 1035]: https://tools.ietf.org/html/rfc1035
//! [RFC 2308]: https://tools.ietf.org/html/rfc2308
//! [RFC 3596]: https://tools.ietf.org/html/rfc3596

use crate::base::iana::Rtype;
use crate::base::name::Dname;
use crate::base::record::Ttl;
use crate::base::wire::{
    append_slice, append_u32, ParseError, Parser, ShortBuf,
};
use bytes::Bytes;
use std::cmp;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

//------------ A -------------------------------------------------------------

/// A record data.
///
/// A records convey the IPv4 address of a host.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct A {
    addr: Ipv4Addr,
}

impl A {
    /// Creates a new A record data from an IPv4 address.
    pub fn new(addr: Ipv4Addr) -> A {
        A { addr }
    }

    /// Creates a new A record from the IPv4 address components.
    pub fn from_octets(a: u8, b: u8, c: u8, d: u8) -> A {
        A::new(Ipv4Addr::new(a, b, c, d))
    }

    /// Returns the address.
    pub fn addr(&self) -> Ipv4Addr {
        self.addr
    }
}

//------------ Aaaa ----------------------------------------------------------

/// AAAA record data.
///
/// AAAA records convey the IPv6 address of a host.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Aaaa {
    addr: Ipv6Addr,
}

impl Aaaa {
    /// Creates a new AAAA record data from an IPv6 address.
    pub fn new(addr: Ipv6Addr) -> Aaaa {
        Aaaa { addr }
    }

    /// Returns the address.
    pub fn addr(&self) -> Ipv6Addr {
        self.addr
    }
}

//------------ Soa -----------------------------------------------------------

/// Soa record data.
///
/// Soa records mark the top of a zone and contain information pertinent to
/// name server maintenance operations. For the purpose of this crate, the
/// interesting part is the minimum field which limits how long a negative
/// answer may be cached.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Soa {
    mname: Dname,
    rname: Dname,
    serial: u32,
    refresh: Ttl,
    retry: Ttl,
    expire: Ttl,
    minimum: Ttl,
}

impl Soa {
    /// Creates new Soa record data from content.
    pub fn new(
        mname: Dname,
        rname: Dname,
        serial: u32,
        refresh: Ttl,
        retry: Ttl,
        expire: Ttl,
        minimum: Ttl,
    ) -> Self {
        Soa {
            mname,
            rname,
            serial,
            refresh,
            retry,
            expire,
            minimum,
        }
    }

    /// The primary name server for the zone.
    pub fn mname(&self) -> &Dname {
        &self.mname
    }

    /// The mailbox for the person responsible for this zone.
    pub fn rname(&self) -> &Dname {
        &self.rname
    }

    /// The serial number of the original copy of the zone.
    pub fn serial(&self) -> u32 {
        self.serial
    }

    /// The time interval before the zone should be refreshed.
    pub fn refresh(&self) -> Ttl {
        self.refresh
    }

    /// The time before a failed refresh is retried.
    pub fn retry(&self) -> Ttl {
        self.retry
    }

    /// The upper limit of time the zone is authoritative.
    pub fn expire(&self) -> Ttl {
        self.expire
    }

    /// The minimum TTL to be exported with any RR from this zone.
    ///
    /// Since RFC 2308 this is the TTL for negative responses.
    pub fn minimum(&self) -> Ttl {
        self.minimum
    }

    /// Returns the negative caching TTL for a record with the given TTL.
    ///
    /// This is the smaller of the record’s TTL and the minimum field.
    pub fn negative_ttl(&self, record_ttl: Ttl) -> Ttl {
        cmp::min(record_ttl, self.minimum)
    }
}

//------------ UnknownRecordData ---------------------------------------------

/// Data of a record type this crate does not interpret.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct UnknownRecordData {
    /// The record type of this data.
    rtype: Rtype,

    /// The record data in wire format.
    data: Bytes,
}

impl UnknownRecordData {
    /// Creates generic record data from a record type and raw octets.
    pub fn from_octets(rtype: Rtype, data: Bytes) -> Self {
        UnknownRecordData { rtype, data }
    }

    /// Returns the record type of the data.
    pub fn rtype(&self) -> Rtype {
        self.rtype
    }

    /// Returns the raw record data.
    pub fn data(&self) -> &Bytes {
        &self.data
    }
}

//------------ RecordData ----------------------------------------------------

/// The data of any record.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum RecordData {
    /// An IPv4 address.
    A(A),

    /// An IPv6 address.
    Aaaa(Aaaa),

    /// Start of a zone of authority.
    Soa(Soa),

    /// Anything else.
    Unknown(UnknownRecordData),
}

impl RecordData {
    /// Returns the record type of the data.
    pub fn rtype(&self) -> Rtype {
        match *self {
            RecordData::A(_) => Rtype::A,
            RecordData::Aaaa(_) => Rtype::AAAA,
            RecordData::Soa(_) => Rtype::SOA,
            RecordData::Unknown(ref data) => data.rtype(),
        }
    }

    /// Returns the address if the data is an address record.
    pub fn ip_addr(&self) -> Option<IpAddr> {
        match *self {
            RecordData::A(a) => Some(a.addr().into()),
            RecordData::Aaaa(aaaa) => Some(aaaa.addr().into()),
            _ => None,
        }
    }

    /// Parses record data of the given type and length.
    ///
    /// The data has to fill exactly `rdlen` octets.
    pub fn parse(
        rtype: Rtype,
        parser: &mut Parser,
        rdlen: usize,
    ) -> Result<Self, ParseError> {
        let end = parser.pos() + rdlen;
        if rdlen > parser.remaining() {
            return Err(ParseError::ShortInput);
        }
        let res = match rtype {
            Rtype::A => {
                if rdlen != 4 {
                    return Err(ParseError::form_error("invalid A record"));
                }
                RecordData::A(A::new(parser.parse_array::<4>()?.into()))
            }
            Rtype::AAAA => {
                if rdlen != 16 {
                    return Err(ParseError::form_error("invalid AAAA record"));
                }
                RecordData::Aaaa(Aaaa::new(parser.parse_array::<16>()?.into()))
            }
            Rtype::SOA => RecordData::Soa(Soa::new(
                Dname::parse(parser)?,
                Dname::parse(parser)?,
                parser.parse_u32()?,
                Ttl::from_secs(parser.parse_u32()?),
                Ttl::from_secs(parser.parse_u32()?),
                Ttl::from_secs(parser.parse_u32()?),
                Ttl::from_secs(parser.parse_u32()?),
            )),
            _ => RecordData::Unknown(UnknownRecordData::from_octets(
                rtype,
                Bytes::copy_from_slice(parser.parse_octets(rdlen)?),
            )),
        };
        if parser.pos() != end {
            return Err(ParseError::form_error("trailing record data"));
        }
        Ok(res)
    }

    /// Appends the wire format of the data, without length, to `target`.
    pub fn compose(&self, target: &mut Vec<u8>) -> Result<(), ShortBuf> {
        match *self {
            RecordData::A(a) => append_slice(target, &a.addr().octets()),
            RecordData::Aaaa(aaaa) => {
                append_slice(target, &aaaa.addr().octets())
            }
            RecordData::Soa(ref soa) => {
                soa.mname.compose(target)?;
                soa.rname.compose(target)?;
                append_u32(target, soa.serial)?;
                append_u32(target, soa.refresh.as_secs())?;
                append_u32(target, soa.retry.as_secs())?;
                append_u32(target, soa.expire.as_secs())?;
                append_u32(target, soa.minimum.as_secs())
            }
            RecordData::Unknown(ref data) => append_slice(target, data.data()),
        }
    }
}

impl From<A> for RecordData {
    fn from(a: A) -> Self {
        RecordData::A(a)
    }
}

impl From<Aaaa> for RecordData {
    fn from(aaaa: Aaaa) -> Self {
        RecordData::Aaaa(aaaa)
    }
}

impl From<Soa> for RecordData {
    fn from(soa: Soa) -> Self {
        RecordData::Soa(soa)
    }
}

impl From<IpAddr> for RecordData {
    fn from(addr: IpAddr) -> Self {
        match addr {
            IpAddr::V4(addr) => A::new(addr).into(),
            IpAddr::V6(addr) => Aaaa::new(addr).into(),
        }
    }
}

//============ Testing =======================================================

#[cfg(test)]
mod test {
    use super::*;
    use std::str::FromStr;

    fn roundtrip(data: RecordData) -> RecordData {
        let mut target = Vec::new();
        data.compose(&mut target).unwrap();
        let len = target.len();
        RecordData::parse(data.rtype(), &mut Parser::from_slice(&target), len)
            .unwrap()
    }

    #[test]
    fn soa_negative_ttl() {
        let soa = Soa::new(
            Dname::from_str("ns.example").unwrap(),
            Dname::from_str("hostmaster.example").unwrap(),
            2024010101,
            Ttl::from_secs(3600),
            Ttl::from_secs(600),
            Ttl::from_secs(86400),
            Ttl::from_secs(300),
        );
        assert_eq!(soa.negative_ttl(Ttl::from_secs(60)), Ttl::from_secs(60));
        assert_eq!(soa.negative_ttl(Ttl::from_secs(900)), Ttl::from_secs(300));
        assert_eq!(roundtrip(soa.clone().into()), RecordData::Soa(soa));
    }

    #[test]
    fn address_data() {
        let data = RecordData::from(IpAddr::from_str("fd00::1").unwrap());
        assert_eq!(data.rtype(), Rtype::AAAA);
        assert_eq!(data.ip_addr(), Some(IpAddr::from_str("fd00::1").unwrap()));
        assert_eq!(roundtrip(data.clone()), data);
        assert_eq!(
            RecordData::from(A::from_octets(10, 0, 0, 1)).ip_addr(),
            Some(IpAddr::from([10, 0, 0, 1]))
        );
    }

    #[test]
    fn bad_length() {
        let mut parser = Parser::from_slice(b"\x0a\x00\x00\x01\x00");
        assert!(RecordData::parse(Rtype::A, &mut parser, 5).is_err());
        let mut parser = Parser::from_slice(b"\x0a\x00");
        assert_eq!(
            RecordData::parse(Rtype::A, &mut parser, 4),
            Err(ParseError::ShortInput)
        );
    }
}
