//! Command handler context.

use std::sync::Arc;

use crate::error::HandlerError;
use crate::state::{Hub, Peer, Registry};

/// Handler context passed to each command handler.
pub struct Context<'a> {
    /// Shared server state.
    pub hub: &'a Hub,
    /// The connection issuing the command.
    pub peer: &'a Arc<Peer>,
}

impl<'a> Context<'a> {
    pub fn new(hub: &'a Hub, peer: &'a Arc<Peer>) -> Self {
        Self { hub, peer }
    }

    #[inline]
    pub fn registry(&self) -> &'a Registry {
        &self.hub.registry
    }

    /// The caller's name, or `NameNotSet` for `command`.
    pub fn require_name(&self, command: &'static str) -> Result<&'a str, HandlerError> {
        self.peer.name().ok_or(HandlerError::NameNotSet(command))
    }
}
