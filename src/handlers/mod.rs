//! Command handlers.
//!
//! The [`Session`] parses each line into a [`groupcast_proto::Command`] and
//! dispatches it to the handler for that command. Handlers return the `+OK`
//! payload or a [`crate::error::HandlerError`] whose text is the `+ERROR`
//! payload.

mod connection;
mod context;
mod group;
mod list;
mod messaging;
mod session;

pub use context::Context;
pub use session::Session;
