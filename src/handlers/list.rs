//! LIST handler: users, groups, and the caller's memberships.
//!
//! Listings are comma-joined after a `:`, so an empty listing ends in `:`.

use super::Context;
use crate::error::{HandlerError, HandlerResult};
use crate::state::GroupInfo;
use groupcast_proto::ListSubCommand;

pub fn handle_list(ctx: &Context<'_>, sub: Option<&ListSubCommand>) -> HandlerResult {
    let registry = ctx.registry();
    match sub.ok_or(HandlerError::ListParameterMissing)? {
        ListSubCommand::USERS(None) => Ok(format!(
            "LIST,USERS:{}",
            registry.client_names().join(",")
        )),
        ListSubCommand::USERS(Some(group)) => {
            let members = registry
                .group_member_names(group)
                .ok_or_else(|| HandlerError::ListGroupNotFound(group.clone()))?;
            Ok(format!("LIST,USERS,{group}:{}", members.join(",")))
        }
        ListSubCommand::GROUPS => Ok(format!("LIST,GROUPS:{}", join_groups(&registry.groups()))),
        ListSubCommand::MYGROUPS => Ok(format!(
            "LIST,MYGROUPS:{}",
            join_groups(&registry.groups_containing(ctx.peer.id()))
        )),
        ListSubCommand::Unknown(param) => Err(HandlerError::ListInvalidParameter(param.clone())),
    }
}

fn join_groups(groups: &[GroupInfo]) -> String {
    groups
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}
