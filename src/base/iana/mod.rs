//! IANA Definitions for DNS.
//!
//! This module contains enums for parameters defined in IANA registries
//! that are relevant for this crate. Only the values actually used when
//! asking for and interpreting address records are given names; all other
//! values are still representable through `from_int`.

#[macro_use]
mod macros;

pub use self::class::Class;
pub use self::opcode::Opcode;
pub use self::rcode::Rcode;
pub use self::rtype::Rtype;

pub mod class;
pub mod opcode;
pub mod rcode;
pub mod rtype;
