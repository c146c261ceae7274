//! The resolved gateway table.
//!
//! A [`GatewayTable`] is an immutable snapshot built from the configured
//! networks and the current content of the host cache. It is rebuilt from
//! scratch whenever either of them changes and then published as a whole,
//! so readers always see one consistent table.

use super::cache::HostCache;
use super::spec::{GatewayAddr, MeshNetworks, NetworkGateway};
use std::collections::BTreeMap;
use std::ops::Range;

//------------ GatewayTable --------------------------------------------------

/// The gateways of all networks.
///
/// Gateways are kept sorted by network, address, and port, without
/// duplicates, so comparing two tables compares sets of gateways.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct GatewayTable {
    /// The sorted and deduplicated gateways.
    gateways: Vec<NetworkGateway>,

    /// Whether any network is configured.
    multi_network: bool,
}

/// # Creation
///
impl GatewayTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the table for a configuration.
    ///
    /// A spec with a literal address contributes exactly one gateway. A
    /// spec with a host name contributes one gateway per address currently
    /// cached for the host, which may be none. Invalid specs contribute
    /// nothing.
    pub fn build(networks: &MeshNetworks, cache: &HostCache) -> Self {
        let mut gateways = Vec::new();
        for (network, spec) in networks.specs() {
            match spec.addr() {
                GatewayAddr::Literal(addr) => {
                    gateways.push(NetworkGateway::new(network, addr, spec.port()))
                }
                GatewayAddr::Host(host) => {
                    gateways.extend(cache.addrs(&host).map(|addr| {
                        NetworkGateway::new(network, addr, spec.port())
                    }))
                }
                GatewayAddr::Invalid => {}
            }
        }
        gateways.sort();
        gateways.dedup();
        GatewayTable {
            gateways,
            multi_network: !networks.is_empty(),
        }
    }
}

/// # Access
///
impl GatewayTable {
    /// Returns all gateways.
    pub fn all(&self) -> &[NetworkGateway] {
        &self.gateways
    }

    /// Returns the gateways of one network.
    ///
    /// An unknown network has no gateways.
    pub fn for_network(&self, network: &str) -> &[NetworkGateway] {
        &self.gateways[self.network_range(network)]
    }

    /// Returns the gateways grouped by network.
    ///
    /// Networks without gateways are missing from the map.
    pub fn by_network(&self) -> BTreeMap<String, Vec<NetworkGateway>> {
        let mut res = BTreeMap::<String, Vec<_>>::new();
        for gateway in &self.gateways {
            res.entry(gateway.network().into())
                .or_default()
                .push(gateway.clone());
        }
        res
    }

    /// Returns whether at least one network is configured.
    pub fn is_multi_network(&self) -> bool {
        self.multi_network
    }

    /// Returns the number of gateways.
    pub fn len(&self) -> usize {
        self.gateways.len()
    }

    /// Returns whether there are no gateways.
    pub fn is_empty(&self) -> bool {
        self.gateways.is_empty()
    }

    /// Returns whether both tables contain the same gateways.
    ///
    /// Unlike `==`, this ignores whether networks are configured.
    pub fn same_gateways(&self, other: &Self) -> bool {
        self.gateways == other.gateways
    }

    fn network_range(&self, network: &str) -> Range<usize> {
        let start = self
            .gateways
            .partition_point(|gateway| gateway.network() < network);
        let end = self
            .gateways
            .partition_point(|gateway| gateway.network() <= network);
        start..end
    }
}

//============ Testing =======================================================

#[cfg(test)]
mod test {
    use super::*;
    use crate::base::{Dname, Ttl};
    use crate::gateway::resolve::HostAnswer;
    use crate::gateway::spec::Network;
    use std::net::IpAddr;
    use std::str::FromStr;
    use std::time::Duration;
    use tokio::time::Instant;

    fn v4(last: u8) -> IpAddr {
        IpAddr::from([10, 0, 0, last])
    }

    fn networks() -> MeshNetworks {
        MeshNetworks::new()
            .with_network(
                "nw1",
                Network::default()
                    .with_gateway("gw.example", 15443)
                    .with_gateway("10.0.0.9", 15443)
                    .with_gateway("not a host", 1),
            )
            .with_network(
                "nw0",
                Network::default()
                    .with_gateway("10.0.0.9", 80)
                    .with_gateway("10.0.0.9", 80)
                    .with_gateway("gw.example", 15443),
            )
            .with_network("nw2", Network::default())
    }

    fn cache(networks: &MeshNetworks, addrs: &[IpAddr]) -> HostCache {
        let now = Instant::now();
        let mut cache =
            HostCache::new(Duration::from_secs(1), Duration::from_secs(1));
        let res = cache.reconcile(&networks.hostnames(), now);
        for (host, generation) in res.added {
            let answer =
                HostAnswer::from_addrs(addrs.iter().copied(), Ttl::from_secs(60));
            cache.complete(&host, generation, answer, now);
        }
        cache
    }

    #[test]
    fn build_sorted_and_deduplicated() {
        let networks = networks();
        let cache = cache(&networks, &[v4(2), v4(1)]);
        let table = GatewayTable::build(&networks, &cache);
        assert!(table.is_multi_network());
        assert_eq!(
            table.all().iter().map(ToString::to_string).collect::<Vec<_>>(),
            [
                "nw0/10.0.0.1:15443",
                "nw0/10.0.0.2:15443",
                "nw0/10.0.0.9:80",
                "nw1/10.0.0.1:15443",
                "nw1/10.0.0.2:15443",
                "nw1/10.0.0.9:15443",
            ]
        );
        assert_eq!(table.for_network("nw0").len(), 3);
        assert_eq!(table.for_network("nw1").len(), 3);
        assert!(table.for_network("nw2").is_empty());
        assert!(table.for_network("nw").is_empty());

        let by_network = table.by_network();
        assert_eq!(by_network.keys().collect::<Vec<_>>(), ["nw0", "nw1"]);
        assert_eq!(by_network["nw1"], table.for_network("nw1"));
    }

    #[test]
    fn unresolved_hosts_contribute_nothing() {
        let networks = networks();
        let table = GatewayTable::build(&networks, &cache(&networks, &[]));
        assert_eq!(table.len(), 2);
        assert!(table.all().iter().all(|gw| gw.addr() == v4(9)));

        let unknown = Dname::from_str("gw.example").unwrap();
        let empty = HostCache::new(Duration::ZERO, Duration::ZERO);
        assert_eq!(empty.addrs(&unknown).count(), 0);
    }

    #[test]
    fn empty_configuration() {
        let table = GatewayTable::build(
            &MeshNetworks::new(),
            &HostCache::new(Duration::ZERO, Duration::ZERO),
        );
        assert!(table.is_empty());
        assert!(!table.is_multi_network());
        assert_eq!(table, GatewayTable::new());

        let configured = GatewayTable::build(
            &MeshNetworks::new().with_network("nw0", Network::default()),
            &HostCache::new(Duration::ZERO, Duration::ZERO),
        );
        assert!(configured.is_multi_network());
        assert!(configured.same_gateways(&table));
        assert_ne!(configured, table);
    }
}
