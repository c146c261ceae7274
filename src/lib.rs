//! Resolving cross-network gateway host names.
//!
//! In a mesh spanning several networks, traffic between networks passes
//! through gateways. These gateways are configured per network, either by
//! IP address or by host name. This crate turns such a configuration into
//! a live table of concrete `(network, address, port)` gateways: it
//! resolves the host names through an ordered list of upstream DNS
//! servers, re-resolves them when their TTL runs out, keeps the last known
//! addresses while the upstreams are failing, and tells an interested party
//! whenever the set of gateways changes.
//!
//! # Modules
//!
//! * [gateway] contains the [`NetworkManager`](gateway::NetworkManager)
//!   and everything it is made of. This is where to start.
//! * [net] contains the DNS client transport for talking to a single
//!   upstream server over UDP.
//! * [base] contains the fundamental DNS types needed to ask for addresses
//!   and understand the answer: domain names, the message header, building
//!   and parsing messages.
//! * [rdata] contains the record data types for A, AAAA, and SOA records.
//!
//! # Reference of Feature Flags
//!
//! * `serde`: Enables serde serialization for the gateway configuration
//!   and the resolver settings. This is enabled by default.
//!
//! # Logging
//!
//! The crate reports what it is doing through the
//! [tracing](https://github.com/tokio-rs/tracing) crate. Queries are
//! logged at trace level, cache transitions and table changes at debug
//! level, and malformed configuration as well as upstream exhaustion as
//! warnings.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod base;
pub mod gateway;
pub mod net;
pub mod rdata;
mod utils;
