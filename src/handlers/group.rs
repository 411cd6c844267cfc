//! Group membership handlers: JOIN and QUIT.

use tracing::{debug, info};

use super::Context;
use crate::error::{HandlerError, HandlerResult, RegistryError};
use groupcast_proto::GROUP_PREFIX;

/// `JOIN,<group>[,<maxMembers>]`: join a group, creating it if needed.
///
/// A missing or zero capacity means "unbounded" for a new group and
/// "any capacity" for an existing one.
pub fn handle_join(
    ctx: &Context<'_>,
    group: Option<&str>,
    max_members: Option<&str>,
) -> HandlerResult {
    let name = ctx.require_name("JOIN")?;
    let group = group.ok_or(HandlerError::NoGroupGiven("JOIN"))?;
    if !group.starts_with(GROUP_PREFIX) {
        return Err(HandlerError::GroupMissingPrefix);
    }

    let capacity = match max_members {
        Some(raw) => parse_capacity(raw)
            .ok_or_else(|| HandlerError::InvalidCapacity(group.to_string()))?,
        None => 0,
    };

    let info = ctx
        .registry()
        .join_group(group, ctx.peer, capacity)
        .map_err(|e| {
            debug!(conn = ctx.peer.id(), group, reason = e.error_code(), "Join refused");
            match e {
                RegistryError::CapacityMismatch => {
                    HandlerError::CapacityMismatch(group.to_string())
                }
                // join_group only fails with the two variants above.
                RegistryError::GroupFull
                | RegistryError::NameInUse
                | RegistryError::NoSuchGroup
                | RegistryError::NotMember => HandlerError::GroupFull(group.to_string()),
            }
        })?;

    info!(conn = ctx.peer.id(), name, group = %info, "Joined group");
    Ok(format!("JOIN,{info}"))
}

/// `QUIT,<group>`: leave a group. The last member leaving deletes it.
pub fn handle_quit(ctx: &Context<'_>, group: Option<&str>) -> HandlerResult {
    let group = group.ok_or(HandlerError::NoGroupGiven("QUIT"))?;

    ctx.registry()
        .quit_group(group, ctx.peer.id())
        .map_err(|e| match e {
            RegistryError::NotMember => HandlerError::NotMember(group.to_string()),
            // quit_group only fails with NotMember or NoSuchGroup.
            RegistryError::NoSuchGroup
            | RegistryError::NameInUse
            | RegistryError::GroupFull
            | RegistryError::CapacityMismatch => HandlerError::NoSuchGroup(group.to_string()),
        })?;

    debug!(conn = ctx.peer.id(), group, "Left group");
    Ok(format!("QUIT,{group}"))
}

/// Capacities are non-negative 32-bit integers.
fn parse_capacity(raw: &str) -> Option<usize> {
    raw.parse::<i32>()
        .ok()
        .and_then(|n| usize::try_from(n).ok())
}
