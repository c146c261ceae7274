//! Resolving cross-network gateways.
//!
//! Gateways between networks are configured as a [`MeshNetworks`] value.
//! Each gateway is given either by IP address or by host name. The
//! [`NetworkManager`] resolves the host names, keeps re-resolving them as
//! their TTL runs out, and maintains a [`GatewayTable`] of all concrete
//! gateway addresses that can be read at any time without waiting.
//!
//! The building blocks are available separately:
//!
//! * [`spec`] contains the configuration types,
//! * [`conf`] the settings of the resolver and cache,
//! * [`resolve`] the outcome of resolving a host name,
//! * [`pool`] the upstream resolvers tried in order,
//! * [`cache`] the per-host state and refresh policy,
//! * [`table`] the gateway table,
//! * [`notify`] and [`watcher`] the connections to the outside, and
//! * [`manager`] the manager pulling them together.

pub use self::cache::HostState;
pub use self::conf::{ConfError, GatewayConf};
pub use self::manager::NetworkManager;
pub use self::notify::GatewayListener;
pub use self::pool::Pool;
pub use self::resolve::{HostAnswer, Lookup, ResolveHost};
pub use self::spec::{GatewaySpec, MeshNetworks, Network, NetworkGateway};
pub use self::table::GatewayTable;
pub use self::watcher::NetworksWatcher;

pub mod cache;
pub mod conf;
pub mod manager;
pub mod notify;
pub mod pool;
pub mod resolve;
pub mod spec;
pub mod table;
pub mod watcher;
