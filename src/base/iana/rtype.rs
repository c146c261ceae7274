//! Resource Record (RR) TYPEs

//------------ Rtype ---------------------------------------------------------

int_enum! {
    /// Resource Record Types.
    ///
    /// Each resource records has a 16 bit type value indicating what kind of
    /// information is represented by the record. Normal query includes the
    /// type of record information is requested for.
    ///
    /// Only the types the gateway resolver deals with are named here. In
    /// particular, the resolver only ever asks for [`Rtype::A`] and
    /// [`Rtype::AAAA`]; [`Rtype::ANY`] exists so that it can be recognized
    /// and rejected by test servers.
    ///
    /// See the [IANA DNS Resource Record (RR) TYPEs registry] for the full
    /// list.
    ///
    /// [IANA DNS Resource Record (RR) TYPEs registry]: http://www.iana.org/assignments/dns-parameters/dns-parameters.xhtml#dns-parameters-4
    =>
    Rtype, u16, "TYPE";

    /// A host address.
    (A => 1, "A")

    /// An authoritative name server.
    (NS => 2, "NS")

    /// The canonical name for an alias.
    (CNAME => 5, "CNAME")

    /// Marks the start of a zone of authority.
    (SOA => 6, "SOA")

    /// IPv6 address.
    (AAAA => 28, "AAAA")

    /// Option.
    (OPT => 41, "OPT")

    /// A request for all records the server/cache has available.
    (ANY => 255, "ANY")
}

impl Rtype {
    /// Returns whether this is one of the two address record types.
    pub fn is_address(self) -> bool {
        self == Rtype::A || self == Rtype::AAAA
    }
}

#[cfg(test)]
mod test {
    use super::Rtype;

    #[test]
    fn address_types() {
        assert!(Rtype::A.is_address());
        assert!(Rtype::AAAA.is_address());
        assert!(!Rtype::ANY.is_address());
        assert_eq!(Rtype::from_int(28), Rtype::AAAA);
        assert_eq!(Rtype::from_int(99).to_string(), "TYPE99");
    }
}
