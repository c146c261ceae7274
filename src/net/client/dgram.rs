//! A DNS over UDP transport to a single upstream server.
//!
//! Every query uses a freshly bound socket connected to the server, so the
//! kernel drops datagrams from anyone else. Responses that cannot be parsed
//! or do not match the query are ignored until the read timeout fires. After
//! a timeout the query is sent again with a new ID until the configured
//! number of attempts is used up.

use crate::base::{Message, Question};
use crate::net::client::error::Error;
use crate::net::client::request::{build_query, QueryResult, SendQuery};
use crate::utils::config::DefMinMax;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::time::{timeout, Duration};
use tracing::trace;

//------------ Configuration Constants ----------------------------------------

/// Configuration limits for the read timeout.
const READ_TIMEOUT: DefMinMax<Duration> = DefMinMax::new(
    Duration::from_secs(5),
    Duration::from_millis(1),
    Duration::from_secs(60),
);

/// Configuration limits for the maximum number of attempts.
const MAX_ATTEMPTS: DefMinMax<u8> = DefMinMax::new(2, 1, 10);

/// Configuration limits for the size of the receive buffer.
const RECV_SIZE: DefMinMax<usize> = DefMinMax::new(2000, 512, 0xFFFF);

//------------ Config ---------------------------------------------------------

/// Configuration for a datagram transport connection.
#[derive(Clone, Debug)]
pub struct Config {
    /// Read timeout.
    read_timeout: Duration,

    /// Maximum number of attempts.
    max_attempts: u8,

    /// Size of the buffer a response is received into.
    recv_size: usize,
}

impl Config {
    /// Creates a new config with default values.
    pub fn new() -> Self {
        Default::default()
    }

    /// Returns the read timeout.
    ///
    /// The read timeout is the maximum amount of time to wait for a
    /// matching response after a request was sent.
    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    /// Sets the read timeout.
    ///
    /// If this value is too small or too large, it will be caped.
    pub fn set_read_timeout(&mut self, value: Duration) {
        self.read_timeout = READ_TIMEOUT.limit(value)
    }

    /// Returns how often a request is sent before giving up.
    pub fn max_attempts(&self) -> u8 {
        self.max_attempts
    }

    /// Sets the maximum number of attempts.
    ///
    /// If this value is too small or too large, it will be caped.
    pub fn set_max_attempts(&mut self, value: u8) {
        self.max_attempts = MAX_ATTEMPTS.limit(value)
    }

    /// Returns the size of the receive buffer.
    ///
    /// Longer datagrams are truncated and will most likely fail to parse.
    pub fn recv_size(&self) -> usize {
        self.recv_size
    }

    /// Sets the size of the receive buffer.
    pub fn set_recv_size(&mut self, value: usize) {
        self.recv_size = RECV_SIZE.limit(value)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            read_timeout: READ_TIMEOUT.default(),
            max_attempts: MAX_ATTEMPTS.default(),
            recv_size: RECV_SIZE.default(),
        }
    }
}

//------------ Connection -----------------------------------------------------

/// A datagram transport connection to one upstream server.
#[derive(Clone, Debug)]
pub struct Connection {
    /// The address of the server.
    server: SocketAddr,

    /// User configuration variables.
    config: Config,
}

impl Connection {
    /// Creates a new datagram transport connection.
    pub fn new(server: SocketAddr, config: Option<Config>) -> Self {
        Connection {
            server,
            config: config.unwrap_or_default(),
        }
    }

    /// Returns the address of the server.
    pub fn server(&self) -> SocketAddr {
        self.server
    }

    /// Returns the configuration of the connection.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Sends a query and waits for the matching answer.
    async fn query_impl(&self, question: &Question) -> Result<Message, Error> {
        let mut attempts: u8 = 0;
        loop {
            let sock = self.connect().await?;
            let request = build_query(question)?;
            let dgram = request.as_slice();
            trace!(
                server = %self.server,
                id = request.header().id(),
                "sending {question}"
            );
            let sent = sock
                .send(dgram)
                .await
                .map_err(|e| Error::UdpSend(Arc::new(e)))?;
            if sent != dgram.len() {
                return Err(Error::UdpShortSend);
            }

            match timeout(
                self.config.read_timeout,
                self.receive(&sock, &request),
            )
            .await
            {
                Ok(res) => return res,
                Err(_) => {
                    attempts += 1;
                    trace!(
                        server = %self.server,
                        attempts,
                        "timeout waiting for response"
                    );
                    if attempts >= self.config.max_attempts {
                        return Err(Error::UdpTimeoutNoResponse);
                    }
                }
            }
        }
    }

    /// Creates a new socket connected to the server.
    async fn connect(&self) -> Result<UdpSocket, Error> {
        let local: SocketAddr = if self.server.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let sock = UdpSocket::bind(local)
            .await
            .map_err(|e| Error::UdpBind(Arc::new(e)))?;
        sock.connect(self.server)
            .await
            .map_err(|e| Error::UdpConnect(Arc::new(e)))?;
        Ok(sock)
    }

    /// Receives datagrams until one is an answer to `request`.
    async fn receive(
        &self,
        sock: &UdpSocket,
        request: &Message,
    ) -> Result<Message, Error> {
        loop {
            let mut buf = vec![0; self.config.recv_size];
            let len = sock
                .recv(&mut buf)
                .await
                .map_err(|e| Error::UdpReceive(Arc::new(e)))?;
            buf.truncate(len);

            // We ignore garbage since there is a timer on this whole
            // thing.
            let answer = match Message::from_octets(buf.into()) {
                Ok(answer) => answer,
                Err(err) => {
                    trace!(server = %self.server, "ignoring datagram: {err}");
                    continue;
                }
            };
            if !answer.is_answer(request) {
                trace!(server = %self.server, "ignoring unrelated response");
                continue;
            }
            return Ok(answer);
        }
    }
}

impl SendQuery for Connection {
    fn send_query<'a>(&'a self, question: &'a Question) -> QueryResult<'a> {
        Box::pin(self.query_impl(question))
    }
}

//============ Testing =======================================================
