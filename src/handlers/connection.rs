//! Connection-level handlers: VERSION and NAME.
//!
//! `BYE` has no handler of its own; the session acknowledges it and stops.

use tracing::info;

use super::Context;
use crate::error::{HandlerError, HandlerResult};
use groupcast_proto::GROUP_PREFIX;

/// `VERSION`: report the server identity.
pub fn handle_version(ctx: &Context<'_>) -> HandlerResult {
    Ok(format!("VERSION,{}", ctx.hub.server_info))
}

/// `NAME,<name>`: claim a client name, once per connection.
pub fn handle_name(ctx: &Context<'_>, name: Option<&str>) -> HandlerResult {
    if ctx.peer.name().is_some() {
        return Err(HandlerError::NameAlreadySet);
    }
    let name = name
        .filter(|n| !n.is_empty())
        .ok_or(HandlerError::NameNotSpecified)?;
    if name.starts_with(GROUP_PREFIX) {
        return Err(HandlerError::NameStartsWithPrefix);
    }

    // Registration fails only when the name is taken.
    ctx.registry()
        .register_client(name, ctx.peer)
        .map_err(|_| HandlerError::NameInUse(name.to_string()))?;

    info!(conn = ctx.peer.id(), addr = %ctx.peer.addr(), name, "Client named");
    Ok(format!("NAME,{name}"))
}
