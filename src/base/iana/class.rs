//! DNS CLASSes.

//------------ Class ---------------------------------------------------------

int_enum! {
    /// DNS CLASSes.
    ///
    /// The domain name space is partitioned into separate classes for
    /// different network types. Only the Internet class is of any practical
    /// relevance for gateway resolution.
    ///
    /// For the currently registered values see the [IANA DNS CLASSes
    /// Registry].
    ///
    /// [IANA DNS CLASSes Registry]: http://www.iana.org/assignments/dns-parameters/dns-parameters.xhtml#dns-parameters-2
    =>
    Class, u16, "CLASS";

    /// Internet (IN).
    ///
    /// This class is defined in RFC 1035 and really the only one relevant
    /// at all.
    (IN => 1, "IN")

    /// Chaosnet (CH).
    (CH => 3, "CH")

    /// Query class * (ANY).
    (ANY => 0xFF, "*")
}

#[cfg(test)]
mod test {
    use super::Class;

    #[test]
    fn display() {
        assert_eq!(Class::IN.to_string(), "IN");
        assert_eq!(Class::from_int(42).to_string(), "CLASS42");
    }
}
