//! DNS response codes.
//!
//! The original DNS specification in [RFC 1035] specified four bits of the
//! message header as response code. Extended response codes transmitted in
//! the OPT record are not evaluated by this crate.
//!
//! [RFC 1035]: https://tools.ietf.org/html/rfc1035

//------------ Rcode --------------------------------------------------------

int_enum! {
    /// DNS Response Codes.
    ///
    /// The response code of a response indicates what happend on the server
    /// when trying to answer the query. The code is a 4 bit value and part
    /// of the header of a DNS message.
    ///
    /// For the resolver pool, three classes of codes matter: NOERROR and
    /// NXDOMAIN are definitive answers, everything else means the server
    /// could not or would not answer.
    =>
    Rcode, u8, "RCODE";

    /// No error condition.
    ///
    /// (Otherwise known as success.)
    (NOERROR => 0, "NOERROR")

    /// Format error.
    ///
    /// The name server was unable to interpret the query.
    (FORMERR => 1, "FORMERR")

    /// Server failure.
    ///
    /// The name server was unable to process this query due to a problem
    /// with the name server.
    (SERVFAIL => 2, "SERVFAIL")

    /// Name error.
    ///
    /// The domain name given in the query does not exist at the name server.
    (NXDOMAIN => 3, "NXDOMAIN")

    /// Not implemented.
    ///
    /// The name server does not support the requested kind of query.
    (NOTIMP => 4, "NOTIMP")

    /// Query refused.
    ///
    /// The name server refused to perform the operation requested by the
    /// query for policy reasons. Some public resolvers answer ANY queries
    /// this way.
    (REFUSED => 5, "REFUSED")
}

impl Rcode {
    /// Returns whether the code carries a definitive answer.
    ///
    /// This is the case for NOERROR and NXDOMAIN. Every other code means
    /// the question is still open and another server may be asked.
    pub fn is_definitive(self) -> bool {
        self == Rcode::NOERROR || self == Rcode::NXDOMAIN
    }
}

#[cfg(test)]
mod test {
    use super::Rcode;

    #[test]
    fn definitive() {
        assert!(Rcode::NOERROR.is_definitive());
        assert!(Rcode::NXDOMAIN.is_definitive());
        assert!(!Rcode::SERVFAIL.is_definitive());
        assert!(!Rcode::REFUSED.is_definitive());
        assert!(!Rcode::from_int(11).is_definitive());
    }

    #[test]
    fn display() {
        assert_eq!(Rcode::SERVFAIL.to_string(), "SERVFAIL");
        assert_eq!(Rcode::from_int(9).to_string(), "RCODE9");
        assert_eq!(format!("{:?}", Rcode::NXDOMAIN), "Rcode::NXDOMAIN");
    }
}
