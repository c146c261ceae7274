//! The outcome of resolving a host name.
//!
//! Resolution never produces an error value. Instead, each address family
//! ends in one of three ways, represented by [`Lookup`]: addresses were
//! found, the upstream said authoritatively that there are none, or no
//! upstream could give an answer at all. The cache treats these three very
//! differently, so they are kept apart all the way from the resolver pool
//! to the cache update.

use crate::base::{Dname, Ttl};
use std::fmt;
use std::future::Future;
use std::net::IpAddr;
use std::pin::Pin;
use std::sync::Arc;

//------------ Lookup --------------------------------------------------------

/// The result of looking up one record type for a host.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Lookup {
    /// The host has these addresses.
    Found {
        /// The addresses in the order the upstream returned them.
        addrs: Vec<IpAddr>,

        /// The smallest TTL of the address records.
        ttl: Ttl,
    },

    /// The host has no addresses of this type.
    ///
    /// This covers both NXDOMAIN and an empty NOERROR answer.
    Empty {
        /// The negative caching TTL, zero if the upstream didn’t give one.
        ttl: Ttl,
    },

    /// No upstream server gave a definitive answer.
    Failed,
}

impl Lookup {
    /// Creates a successful lookup, or an empty one if `addrs` is empty.
    pub fn found(addrs: Vec<IpAddr>, ttl: Ttl) -> Self {
        if addrs.is_empty() {
            Lookup::Empty { ttl }
        } else {
            Lookup::Found { addrs, ttl }
        }
    }

    /// Returns whether the lookup failed.
    pub fn is_failed(&self) -> bool {
        matches!(*self, Lookup::Failed)
    }

    /// Returns the TTL of a definitive result.
    pub fn ttl(&self) -> Option<Ttl> {
        match *self {
            Lookup::Found { ttl, .. } | Lookup::Empty { ttl } => Some(ttl),
            Lookup::Failed => None,
        }
    }

    /// Returns the addresses of a definitive result.
    ///
    /// Returns `None` for a failed lookup and an empty slice for an empty
    /// one.
    pub fn addrs(&self) -> Option<&[IpAddr]> {
        match *self {
            Lookup::Found { ref addrs, .. } => Some(addrs),
            Lookup::Empty { .. } => Some(&[]),
            Lookup::Failed => None,
        }
    }
}

impl fmt::Display for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Lookup::Found { ref addrs, ttl } => {
                write!(f, "{} address(es), ttl {}s", addrs.len(), ttl.as_secs())
            }
            Lookup::Empty { ttl } => write!(f, "empty, ttl {}s", ttl.as_secs()),
            Lookup::Failed => f.write_str("failed"),
        }
    }
}

//------------ HostAnswer ----------------------------------------------------

/// The result of resolving both address families of a host.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HostAnswer {
    /// The result of the A query.
    pub v4: Lookup,

    /// The result of the AAAA query.
    pub v6: Lookup,
}

impl HostAnswer {
    /// Creates an answer from the two lookups.
    pub fn new(v4: Lookup, v6: Lookup) -> Self {
        HostAnswer { v4, v6 }
    }

    /// Creates an answer where both families failed.
    pub fn failed() -> Self {
        HostAnswer::new(Lookup::Failed, Lookup::Failed)
    }

    /// Creates an authoritative empty answer for both families.
    pub fn empty(ttl: Ttl) -> Self {
        HostAnswer::new(Lookup::Empty { ttl }, Lookup::Empty { ttl })
    }

    /// Creates a successful answer from a mixed list of addresses.
    ///
    /// Addresses are sorted into their families. A family without addresses
    /// is an empty answer with the same TTL.
    pub fn from_addrs(addrs: impl IntoIterator<Item = IpAddr>, ttl: Ttl) -> Self {
        let (v4, v6): (Vec<_>, Vec<_>) =
            addrs.into_iter().partition(IpAddr::is_ipv4);
        HostAnswer::new(Lookup::found(v4, ttl), Lookup::found(v6, ttl))
    }

    /// Returns whether both families failed.
    pub fn is_failed(&self) -> bool {
        self.v4.is_failed() && self.v6.is_failed()
    }

    /// Returns whether at least one family failed.
    pub fn is_partial_failure(&self) -> bool {
        self.v4.is_failed() || self.v6.is_failed()
    }

    /// Returns the smallest TTL of the definitive results.
    pub fn ttl(&self) -> Option<Ttl> {
        match (self.v4.ttl(), self.v6.ttl()) {
            (Some(v4), Some(v6)) => Some(v4.min(v6)),
            (v4, v6) => v4.or(v6),
        }
    }
}

//------------ ResolveHost ---------------------------------------------------

/// The future returned by [`ResolveHost::resolve_host`].
pub type ResolveFuture<'a> = Pin<Box<dyn Future<Output = HostAnswer> + Send + 'a>>;

/// Something that can resolve the addresses of a host.
///
/// The network manager uses this trait to reach its resolver so that
/// tests and embedders can provide their own.
pub trait ResolveHost: Send + Sync {
    /// Resolves both address families of `host`.
    ///
    /// The future must not fail: transport problems are reported as
    /// [`Lookup::Failed`].
    fn resolve_host<'a>(&'a self, host: &'a Dname) -> ResolveFuture<'a>;
}

impl<T: ResolveHost + ?Sized> ResolveHost for Arc<T> {
    fn resolve_host<'a>(&'a self, host: &'a Dname) -> ResolveFuture<'a> {
        (**self).resolve_host(host)
    }
}

//============ Testing =======================================================

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn from_addrs_splits_families() {
        let answer = HostAnswer::from_addrs(
            [
                IpAddr::from([10, 0, 0, 1]),
                "fd00::1".parse().unwrap(),
                IpAddr::from([10, 0, 0, 2]),
            ],
            Ttl::from_secs(30),
        );
        assert_eq!(
            answer.v4.addrs(),
            Some(&[IpAddr::from([10, 0, 0, 1]), IpAddr::from([10, 0, 0, 2])][..])
        );
        assert_eq!(answer.v6.addrs().map(<[_]>::len), Some(1));

        let v4_only =
            HostAnswer::from_addrs([IpAddr::from([10, 0, 0, 1])], Ttl::ZERO);
        assert_eq!(v4_only.v6, Lookup::Empty { ttl: Ttl::ZERO });
    }

    #[test]
    fn failure_and_ttl() {
        let partial = HostAnswer::new(
            Lookup::Failed,
            Lookup::found(vec!["fd00::1".parse().unwrap()], Ttl::from_secs(9)),
        );
        assert!(!partial.is_failed());
        assert!(partial.is_partial_failure());
        assert_eq!(partial.ttl(), Some(Ttl::from_secs(9)));
        assert!(HostAnswer::failed().is_failed());
        assert_eq!(HostAnswer::failed().ttl(), None);
        assert_eq!(
            HostAnswer::new(
                Lookup::Empty { ttl: Ttl::from_secs(3) },
                Lookup::Empty { ttl: Ttl::from_secs(7) }
            )
            .ttl(),
            Some(Ttl::from_secs(3))
        );
    }
}
