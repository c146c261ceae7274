//! Error type for client transports.

use crate::base::message_builder::PushError;
use std::error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Error type for client transports.
///
/// None of these errors are ever shown to readers of the gateway table. The
/// resolver pool logs them and treats the upstream as failed.
#[derive(Clone, Debug)]
pub enum Error {
    /// PushError from MessageBuilder.
    MessageBuilderPushError,

    /// Binding a UDP socket gave an error.
    UdpBind(Arc<std::io::Error>),

    /// Connecting a UDP socket gave an error.
    UdpConnect(Arc<std::io::Error>),

    /// Receiving from a UDP socket gave an error.
    UdpReceive(Arc<std::io::Error>),

    /// Sending over a UDP socket gave an error.
    UdpSend(Arc<std::io::Error>),

    /// Sending over a UDP socket gave a partial result.
    UdpShortSend,

    /// Timeout receiving a response over a UDP socket.
    UdpTimeoutNoResponse,

    /// No transport available to transmit request.
    NoTransportAvailable,
}

impl From<PushError> for Error {
    fn from(_: PushError) -> Self {
        Error::MessageBuilderPushError
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        match self {
            Error::MessageBuilderPushError => {
                write!(f, "PushError from MessageBuilder")
            }
            Error::UdpBind(err) => write!(f, "error binding UDP socket: {err}"),
            Error::UdpConnect(err) => {
                write!(f, "error connecting UDP socket: {err}")
            }
            Error::UdpReceive(err) => {
                write!(f, "error receiving from UDP socket: {err}")
            }
            Error::UdpSend(err) => {
                write!(f, "error sending to UDP socket: {err}")
            }
            Error::UdpShortSend => write!(f, "partial sent to UDP socket"),
            Error::UdpTimeoutNoResponse => {
                write!(f, "timeout waiting for response")
            }
            Error::NoTransportAvailable => {
                write!(f, "no transport available")
            }
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::MessageBuilderPushError => None,
            Error::UdpBind(e) => Some(e),
            Error::UdpConnect(e) => Some(e),
            Error::UdpReceive(e) => Some(e),
            Error::UdpSend(e) => Some(e),
            Error::UdpShortSend => None,
            Error::UdpTimeoutNoResponse => None,
            Error::NoTransportAvailable => None,
        }
    }
}
