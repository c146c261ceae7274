//! The declarative gateway configuration and its resolved form.
//!
//! A [`MeshNetworks`] value maps network names to a [`Network`], which in
//! turn lists the gateways of the network as [`GatewaySpec`]s. A spec names
//! its gateway either by literal IP address or by host name. After
//! resolution, every spec yields zero or more [`NetworkGateway`]s, the
//! concrete `(network, address, port)` tuples handed out to readers.

use crate::base::Dname;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

//------------ MeshNetworks -------------------------------------------------

/// The complete set of networks and their gateways.
///
/// The value is always replaced as a whole. An empty value means that no
/// networks are configured.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct MeshNetworks {
    /// The networks by name.
    #[cfg_attr(feature = "serde", serde(default))]
    networks: BTreeMap<String, Network>,
}

impl MeshNetworks {
    /// Creates an empty value.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a network, replacing one of the same name.
    pub fn insert(&mut self, name: impl Into<String>, network: Network) {
        self.networks.insert(name.into(), network);
    }

    /// Adds a network and returns the value for chaining.
    pub fn with_network(
        mut self,
        name: impl Into<String>,
        network: Network,
    ) -> Self {
        self.insert(name, network);
        self
    }

    /// Returns whether there are no networks.
    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }

    /// Returns the network with the given name.
    pub fn get(&self, name: &str) -> Option<&Network> {
        self.networks.get(name)
    }

    /// Returns an iterator over the networks in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Network)> {
        self.networks.iter().map(|(name, net)| (name.as_str(), net))
    }

    /// Returns an iterator over all gateway specs with their network.
    pub fn specs(&self) -> impl Iterator<Item = (&str, &GatewaySpec)> {
        self.iter().flat_map(|(name, net)| {
            net.gateways().iter().map(move |spec| (name, spec))
        })
    }

    /// Returns the set of host names referenced by any gateway spec.
    pub fn hostnames(&self) -> BTreeSet<Dname> {
        self.specs()
            .filter_map(|(_, spec)| match spec.addr() {
                GatewayAddr::Host(name) => Some(name),
                _ => None,
            })
            .collect()
    }
}

impl<N: Into<String>> FromIterator<(N, Network)> for MeshNetworks {
    fn from_iter<T: IntoIterator<Item = (N, Network)>>(iter: T) -> Self {
        MeshNetworks {
            networks: iter
                .into_iter()
                .map(|(name, net)| (name.into(), net))
                .collect(),
        }
    }
}

//------------ Network ------------------------------------------------------

/// A single network.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Network {
    /// The gateways through which the network can be reached.
    #[cfg_attr(feature = "serde", serde(default))]
    gateways: Vec<GatewaySpec>,
}

impl Network {
    /// Creates a network from its gateways.
    pub fn new(gateways: Vec<GatewaySpec>) -> Self {
        Network { gateways }
    }

    /// Adds a gateway and returns the network for chaining.
    pub fn with_gateway(mut self, address: impl Into<String>, port: u16) -> Self {
        self.gateways.push(GatewaySpec::new(address, port));
        self
    }

    /// Returns the gateways of the network.
    pub fn gateways(&self) -> &[GatewaySpec] {
        &self.gateways
    }
}

//------------ GatewaySpec --------------------------------------------------

/// The configuration of a single gateway.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct GatewaySpec {
    /// A literal IP address or a host name.
    address: String,

    /// The port of the gateway.
    port: u16,
}

impl GatewaySpec {
    /// Creates a new spec.
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        GatewaySpec {
            address: address.into(),
            port,
        }
    }

    /// Returns the address as given in the configuration.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Returns the port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns what kind of address the gateway is given as.
    pub fn addr(&self) -> GatewayAddr {
        GatewayAddr::from_config(&self.address)
    }
}

//------------ GatewayAddr --------------------------------------------------

/// The address of a gateway spec after classification.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum GatewayAddr {
    /// A literal address that needs no resolution.
    Literal(IpAddr),

    /// A host name to be resolved.
    Host(Dname),

    /// Neither an address nor a valid host name.
    Invalid,
}

impl GatewayAddr {
    /// Classifies an address string from the configuration.
    ///
    /// Surrounding whitespace is ignored. The root name is not a valid
    /// host.
    pub fn from_config(s: &str) -> Self {
        let s = s.trim();
        if let Ok(addr) = IpAddr::from_str(s) {
            return GatewayAddr::Literal(addr);
        }
        match Dname::from_str(s) {
            Ok(name) if !name.is_root() => GatewayAddr::Host(name),
            _ => GatewayAddr::Invalid,
        }
    }
}

//------------ NetworkGateway -----------------------------------------------

/// A resolved gateway of a network.
///
/// Gateways order by network, then address, then port.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct NetworkGateway {
    /// The name of the network.
    network: String,

    /// The address of the gateway.
    addr: IpAddr,

    /// The port of the gateway.
    port: u16,
}

impl NetworkGateway {
    /// Creates a new gateway.
    pub fn new(network: impl Into<String>, addr: IpAddr, port: u16) -> Self {
        NetworkGateway {
            network: network.into(),
            addr,
            port,
        }
    }

    /// Returns the name of the network.
    pub fn network(&self) -> &str {
        &self.network
    }

    /// Returns the address.
    pub fn addr(&self) -> IpAddr {
        self.addr
    }

    /// Returns the port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns address and port as a socket address.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.addr, self.port)
    }
}

impl fmt::Display for NetworkGateway {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.socket_addr())
    }
}

//============ Testing =======================================================
