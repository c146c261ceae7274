//! Sending queries to upstream resolvers.
//!
//! * [request] defines [`SendQuery`](request::SendQuery), the trait for
//!   sending one question to one upstream server,
//! * [dgram] implements it over UDP with a per-attempt timeout and retries,
//! * [error] has the error type of the transports.
//!
//! Which upstream to ask and what to make of its answer is decided by the
//! resolver pool in [`gateway::pool`](crate::gateway::pool).

pub mod dgram;
pub mod error;
pub mod request;
