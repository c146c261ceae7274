//! Various utility modules.

pub(crate) mod config;
