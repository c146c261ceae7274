//! Configuration of the gateway resolver.
//!
//! All knobs live in [`GatewayConf`] which is handed to the
//! [`NetworkManager`](super::manager::NetworkManager) when it is created.
//! Every value is limited to a sane range when it is set.
//!
//! The list of upstream servers can be taken from a resolv.conf file via
//! [`GatewayConf::from_resolv_conf`] or [`GatewayConf::system`], which also
//! pick up the `timeout` and `attempts` options.

use crate::net::client::dgram;
use crate::utils::config::DefMinMax;
use std::io::{self, BufRead, Read};
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::str::{FromStr, SplitWhitespace};
use std::sync::Arc;
use std::time::Duration;
use std::{error, fmt, fs};

//------------ Configuration Constants ----------------------------------------

/// Configuration limits for the minimum TTL of an answer.
const MIN_TTL: DefMinMax<Duration> = DefMinMax::new(
    Duration::from_secs(30),
    Duration::from_millis(1),
    Duration::from_secs(24 * 3600),
);

/// Configuration limits for the backoff after a failed resolution.
const FAILURE_BACKOFF: DefMinMax<Duration> = DefMinMax::new(
    Duration::from_secs(5),
    Duration::from_millis(1),
    Duration::from_secs(3600),
);

/// Configuration limits for the timeout of a single query.
const QUERY_TIMEOUT: DefMinMax<Duration> = DefMinMax::new(
    Duration::from_secs(5),
    Duration::from_millis(1),
    Duration::from_secs(60),
);

/// Configuration limits for the number of attempts per upstream.
const UDP_ATTEMPTS: DefMinMax<u8> = DefMinMax::new(2, 1, 10);

/// The port used for servers from resolv.conf.
const DNS_PORT: u16 = 53;

/// The location of the system’s resolver configuration.
const RESOLV_CONF: &str = "/etc/resolv.conf";

//------------ GatewayConf ----------------------------------------------------

/// Configuration for gateway resolution.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Deserialize, serde::Serialize),
    serde(from = "ConfRepr", into = "ConfRepr")
)]
pub struct GatewayConf {
    /// The upstream servers in order of preference.
    servers: Vec<SocketAddr>,

    /// The lower bound for the TTL of a definitive answer.
    min_ttl: Duration,

    /// The time until a failed resolution is retried.
    failure_backoff: Duration,

    /// The timeout of a single query attempt.
    query_timeout: Duration,

    /// The number of attempts per upstream.
    udp_attempts: u8,
}

impl GatewayConf {
    /// Creates a new config with default values and no servers.
    pub fn new() -> Self {
        Default::default()
    }

    /// Creates a config with default values and the given servers.
    pub fn with_servers(servers: Vec<SocketAddr>) -> Self {
        GatewayConf {
            servers,
            ..Default::default()
        }
    }

    /// Returns the upstream servers.
    pub fn servers(&self) -> &[SocketAddr] {
        &self.servers
    }

    /// Sets the upstream servers.
    pub fn set_servers(&mut self, servers: Vec<SocketAddr>) {
        self.servers = servers
    }

    /// Returns the minimum TTL.
    ///
    /// Answers with a smaller TTL are refreshed only after this time. This
    /// avoids hammering the upstreams when a record has a TTL of zero.
    pub fn min_ttl(&self) -> Duration {
        self.min_ttl
    }

    /// Sets the minimum TTL.
    ///
    /// If this value is too small or too large, it will be caped.
    pub fn set_min_ttl(&mut self, value: Duration) {
        self.min_ttl = MIN_TTL.limit(value)
    }

    /// Returns the failure backoff.
    ///
    /// If all upstreams failed, resolution is retried after this time.
    pub fn failure_backoff(&self) -> Duration {
        self.failure_backoff
    }

    /// Sets the failure backoff.
    ///
    /// If this value is too small or too large, it will be caped.
    pub fn set_failure_backoff(&mut self, value: Duration) {
        self.failure_backoff = FAILURE_BACKOFF.limit(value)
    }

    /// Returns the timeout of a single query attempt.
    pub fn query_timeout(&self) -> Duration {
        self.query_timeout
    }

    /// Sets the query timeout.
    ///
    /// If this value is too small or too large, it will be caped.
    pub fn set_query_timeout(&mut self, value: Duration) {
        self.query_timeout = QUERY_TIMEOUT.limit(value)
    }

    /// Returns how often a query is sent to an upstream before giving up.
    pub fn udp_attempts(&self) -> u8 {
        self.udp_attempts
    }

    /// Sets the number of attempts.
    ///
    /// If this value is too small or too large, it will be caped.
    pub fn set_udp_attempts(&mut self, value: u8) {
        self.udp_attempts = UDP_ATTEMPTS.limit(value)
    }

    /// Returns the configuration for the datagram transport.
    pub fn dgram_config(&self) -> dgram::Config {
        let mut res = dgram::Config::new();
        res.set_read_timeout(self.query_timeout);
        res.set_max_attempts(self.udp_attempts);
        res
    }
}

impl Default for GatewayConf {
    fn default() -> Self {
        GatewayConf {
            servers: Vec::new(),
            min_ttl: MIN_TTL.default(),
            failure_backoff: FAILURE_BACKOFF.default(),
            query_timeout: QUERY_TIMEOUT.default(),
            udp_attempts: UDP_ATTEMPTS.default(),
        }
    }
}

/// # Reading resolv.conf
///
impl GatewayConf {
    /// Creates a config from the system’s resolver configuration.
    pub fn system() -> Result<Self, ConfError> {
        Self::from_resolv_conf(RESOLV_CONF)
    }

    /// Creates a config from a resolv.conf file.
    pub fn from_resolv_conf<P: AsRef<Path>>(path: P) -> Result<Self, ConfError> {
        let mut file = fs::File::open(path)?;
        let mut res = Self::new();
        res.parse_resolv_conf(&mut file)?;
        Ok(res)
    }

    /// Updates the config from a reader with resolv.conf content.
    ///
    /// Every `nameserver` line adds a server on port 53. Of the options,
    /// only `timeout` and `attempts` are used. Everything else is ignored.
    pub fn parse_resolv_conf<R: Read>(
        &mut self,
        reader: &mut R,
    ) -> Result<(), ConfError> {
        for line in io::BufReader::new(reader).lines() {
            let line = line?;
            let line = line.trim_end();

            if line.is_empty() || line.starts_with(';') || line.starts_with('#')
            {
                continue;
            }

            let mut words = line.split_whitespace();
            match words.next() {
                Some("nameserver") => self.parse_nameserver(words)?,
                Some("options") => self.parse_options(words)?,
                _ => {}
            }
        }
        Ok(())
    }

    fn parse_nameserver(
        &mut self,
        mut words: SplitWhitespace,
    ) -> Result<(), ConfError> {
        let word = next_word(&mut words)?;
        // Drop a zone index such as in "fe80::1%eth0".
        let word = word.split('%').next().unwrap_or(word);
        let addr = IpAddr::from_str(word).map_err(|_| ConfError::Parse)?;
        self.servers.push(SocketAddr::new(addr, DNS_PORT));
        Ok(())
    }

    fn parse_options(&mut self, words: SplitWhitespace) -> Result<(), ConfError> {
        for word in words {
            match split_arg(word)? {
                ("timeout", Some(n)) => {
                    self.set_query_timeout(Duration::from_secs(n))
                }
                ("attempts", Some(n)) => {
                    self.set_udp_attempts(u8::try_from(n).unwrap_or(u8::MAX))
                }
                _ => {}
            }
        }
        Ok(())
    }
}

//------------ Private Helpers ----------------------------------------------

/// Returns a reference to the next word or an error.
fn next_word<'a>(words: &mut SplitWhitespace<'a>) -> Result<&'a str, ConfError> {
    words.next().ok_or(ConfError::Parse)
}

/// Splits the name and argument from an option with arguments.
fn split_arg(s: &str) -> Result<(&str, Option<u64>), ConfError> {
    match s.split_once(':') {
        Some((left, right)) => {
            Ok((left, Some(right.parse().map_err(|_| ConfError::Parse)?)))
        }
        None => Ok((s, None)),
    }
}

//------------ ConfRepr -------------------------------------------------------

/// The serialized form of a config.
///
/// Durations are given in milliseconds. Missing fields take their default.
#[cfg(feature = "serde")]
#[derive(serde::Deserialize, serde::Serialize)]
#[serde(default)]
struct ConfRepr {
    servers: Vec<SocketAddr>,
    min_ttl_ms: u64,
    failure_backoff_ms: u64,
    query_timeout_ms: u64,
    udp_attempts: u8,
}

#[cfg(feature = "serde")]
impl Default for ConfRepr {
    fn default() -> Self {
        GatewayConf::default().into()
    }
}

#[cfg(feature = "serde")]
impl From<ConfRepr> for GatewayConf {
    fn from(repr: ConfRepr) -> Self {
        let mut res = GatewayConf::with_servers(repr.servers);
        res.set_min_ttl(Duration::from_millis(repr.min_ttl_ms));
        res.set_failure_backoff(Duration::from_millis(repr.failure_backoff_ms));
        res.set_query_timeout(Duration::from_millis(repr.query_timeout_ms));
        res.set_udp_attempts(repr.udp_attempts);
        res
    }
}

#[cfg(feature = "serde")]
impl From<GatewayConf> for ConfRepr {
    fn from(conf: GatewayConf) -> Self {
        fn millis(value: Duration) -> u64 {
            u64::try_from(value.as_millis()).unwrap_or(u64::MAX)
        }
        ConfRepr {
            min_ttl_ms: millis(conf.min_ttl),
            failure_backoff_ms: millis(conf.failure_backoff),
            query_timeout_ms: millis(conf.query_timeout),
            udp_attempts: conf.udp_attempts,
            servers: conf.servers,
        }
    }
}

//------------ ConfError ------------------------------------------------------

/// The error that can happen when reading a resolv.conf file.
#[derive(Clone, Debug)]
pub enum ConfError {
    /// The file is not a proper file.
    Parse,

    /// Something happened while reading.
    Io(Arc<io::Error>),
}

impl From<io::Error> for ConfError {
    fn from(error: io::Error) -> Self {
        ConfError::Io(Arc::new(error))
    }
}

impl fmt::Display for ConfError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ConfError::Parse => f.write_str("error parsing configuration"),
            ConfError::Io(ref err) => fmt::Display::fmt(err, f),
        }
    }
}

impl error::Error for ConfError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            ConfError::Parse => None,
            ConfError::Io(ref err) => Some(err.as_ref()),
        }
    }
}

//============ Testing =======================================================

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults_and_limits() {
        let mut conf = GatewayConf::new();
        assert!(conf.servers().is_empty());
        assert_eq!(conf.min_ttl(), Duration::from_secs(30));
        assert_eq!(conf.failure_backoff(), Duration::from_secs(5));
        assert_eq!(conf.query_timeout(), Duration::from_secs(5));
        assert_eq!(conf.udp_attempts(), 2);

        conf.set_min_ttl(Duration::ZERO);
        conf.set_failure_backoff(Duration::from_secs(86400));
        conf.set_udp_attempts(100);
        assert_eq!(conf.min_ttl(), Duration::from_millis(1));
        assert_eq!(conf.failure_backoff(), Duration::from_secs(3600));
        assert_eq!(conf.udp_attempts(), 10);

        let dgram = conf.dgram_config();
        assert_eq!(dgram.read_timeout(), conf.query_timeout());
        assert_eq!(dgram.max_attempts(), 10);
    }

    #[test]
    fn parse_resolv_conf() {
        let mut conf = GatewayConf::new();
        let data = "# generated\n\
                    search example.com\n\
                    nameserver 192.0.2.1\n\
                    nameserver fe80::1%eth0\n\
                    ; comment\n\
                    options ndots:2 timeout:1 attempts:3 rotate\n";
        conf.parse_resolv_conf(&mut io::Cursor::new(data)).unwrap();
        assert_eq!(
            conf.servers(),
            [
                "192.0.2.1:53".parse::<SocketAddr>().unwrap(),
                "[fe80::1]:53".parse().unwrap()
            ]
        );
        assert_eq!(conf.query_timeout(), Duration::from_secs(1));
        assert_eq!(conf.udp_attempts(), 3);
    }

    #[test]
    fn parse_resolv_conf_errors() {
        let mut conf = GatewayConf::new();
        assert!(matches!(
            conf.parse_resolv_conf(&mut io::Cursor::new("nameserver\n")),
            Err(ConfError::Parse)
        ));
        assert!(matches!(
            conf.parse_resolv_conf(&mut io::Cursor::new("nameserver x.y\n")),
            Err(ConfError::Parse)
        ));
        assert!(matches!(
            conf.parse_resolv_conf(&mut io::Cursor::new("options timeout:x\n")),
            Err(ConfError::Parse)
        ));
        assert!(matches!(
            GatewayConf::from_resolv_conf("/nonexistent/resolv.conf"),
            Err(ConfError::Io(_))
        ));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn deserialize() {
        let conf: GatewayConf = serde_json::from_str(
            r#"{
                "servers": ["192.0.2.1:53", "[2001:db8::1]:5353"],
                "min_ttl_ms": 0,
                "failure_backoff_ms": 250
            }"#,
        )
        .unwrap();
        assert_eq!(conf.servers().len(), 2);
        assert_eq!(conf.min_ttl(), Duration::from_millis(1));
        assert_eq!(conf.failure_backoff(), Duration::from_millis(250));
        assert_eq!(conf.query_timeout(), Duration::from_secs(5));

        let json = serde_json::to_value(&conf).unwrap();
        assert_eq!(json["failure_backoff_ms"], 250);
        assert_eq!(json["udp_attempts"], 2);
    }
}
