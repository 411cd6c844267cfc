//! State management module.
//!
//! Contains the Hub (shared server state), the Registry of clients and
//! groups, and the per-connection Peer handle.

mod group;
mod hub;
mod peer;
mod registry;
mod uid;

pub use group::{Group, GroupInfo};
pub use hub::{Hub, ServerInfo};
pub use peer::Peer;
pub use registry::Registry;
pub use uid::{ConnId, ConnIdGenerator};

#[cfg(test)]
pub(crate) use peer::test_support;
