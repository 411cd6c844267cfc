//! The Registry: client name table and group table.
//!
//! Lock order is always table first, then a group's member lock. The client
//! table and group table are never held at the same time. No lock is held
//! while sending to a peer: callers get snapshots and send outside.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use super::{ConnId, Group, GroupInfo, Peer};
use crate::error::RegistryError;

/// What `remove_client` tore down.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Removal {
    /// The client name released, if the connection held one.
    pub name: Option<String>,
    /// Groups the connection was removed from.
    pub groups_left: Vec<String>,
    /// Groups deleted because the connection was their last member.
    pub groups_deleted: Vec<String>,
}

/// Shared name and group tables.
#[derive(Debug, Default)]
pub struct Registry {
    clients: RwLock<HashMap<String, Arc<Peer>>>,
    groups: RwLock<BTreeMap<String, Arc<Group>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to `peer`. Names are unique among connected clients.
    pub fn register_client(&self, name: &str, peer: &Arc<Peer>) -> Result<(), RegistryError> {
        let mut clients = self.clients.write();
        if clients.contains_key(name) {
            return Err(RegistryError::NameInUse);
        }
        if !peer.set_name(name) {
            // The owning session checks this first; a second name never reaches the table.
            return Err(RegistryError::NameInUse);
        }
        clients.insert(name.to_string(), Arc::clone(peer));
        Ok(())
    }

    /// Remove every trace of `peer`: its name entry and its group memberships.
    ///
    /// Idempotent. Each group is handled atomically on its own; the sweep as
    /// a whole is not.
    pub fn remove_client(&self, peer: &Peer) -> Removal {
        let mut removal = Removal::default();

        if let Some(name) = peer.name() {
            let mut clients = self.clients.write();
            if clients.get(name).is_some_and(|p| p.id() == peer.id()) {
                clients.remove(name);
                removal.name = Some(name.to_string());
            }
        }

        let candidates: Vec<Arc<Group>> = self
            .groups
            .read()
            .values()
            .filter(|g| g.contains(peer.id()))
            .cloned()
            .collect();

        for group in candidates {
            let mut groups = self.groups.write();
            let Ok(remaining) = group.remove_member(peer.id()) else {
                continue;
            };
            removal.groups_left.push(group.name().to_string());
            if remaining == 0 && Self::unlink_group(&mut groups, &group) {
                removal.groups_deleted.push(group.name().to_string());
            }
        }

        if !removal.groups_deleted.is_empty() {
            debug!(
                conn = peer.id(),
                groups = ?removal.groups_deleted,
                "Groups emptied by disconnect"
            );
        }
        removal
    }

    pub fn lookup_client(&self, name: &str) -> Option<Arc<Peer>> {
        self.clients.read().get(name).cloned()
    }

    pub fn lookup_group(&self, name: &str) -> Option<Arc<Group>> {
        self.groups.read().get(name).cloned()
    }

    /// Join (creating if needed) the group `name`.
    ///
    /// `requested` of `0` means "no capacity given": it matches any existing
    /// group and creates an unbounded one.
    pub fn join_group(
        &self,
        name: &str,
        peer: &Arc<Peer>,
        requested: usize,
    ) -> Result<GroupInfo, RegistryError> {
        let mut groups = self.groups.write();
        if let Some(group) = groups.get(name) {
            if requested > 0 && requested != group.capacity() {
                return Err(RegistryError::CapacityMismatch);
            }
            return group.add_member(peer);
        }

        let group = Arc::new(Group::new(name, requested));
        let info = group.add_member(peer)?;
        groups.insert(name.to_string(), group);
        Ok(info)
    }

    /// Leave the group `name`. The group is deleted once empty.
    pub fn quit_group(&self, name: &str, id: ConnId) -> Result<(), RegistryError> {
        let mut groups = self.groups.write();
        let group = groups.get(name).cloned().ok_or(RegistryError::NoSuchGroup)?;
        if group.remove_member(id)? == 0 {
            Self::unlink_group(&mut groups, &group);
        }
        Ok(())
    }

    /// Connected client names, sorted.
    pub fn client_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.clients.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// All groups, ordered by name.
    pub fn groups(&self) -> Vec<GroupInfo> {
        self.groups.read().values().map(|g| g.info()).collect()
    }

    /// Groups containing `id`, ordered by name.
    pub fn groups_containing(&self, id: ConnId) -> Vec<GroupInfo> {
        self.groups
            .read()
            .values()
            .filter(|g| g.contains(id))
            .map(|g| g.info())
            .collect()
    }

    /// Member names of `name` in connection order, or `None` if no such group.
    pub fn group_member_names(&self, name: &str) -> Option<Vec<String>> {
        let group = self.lookup_group(name)?;
        Some(
            group
                .members()
                .iter()
                .filter_map(|p| p.name().map(str::to_string))
                .collect(),
        )
    }

    pub fn client_count(&self) -> usize {
        self.clients.read().len()
    }

    pub fn group_count(&self) -> usize {
        self.groups.read().len()
    }

    /// Drop `group` from the table if it is still the registered instance.
    fn unlink_group(groups: &mut BTreeMap<String, Arc<Group>>, group: &Arc<Group>) -> bool {
        if groups
            .get(group.name())
            .is_some_and(|current| Arc::ptr_eq(current, group))
        {
            groups.remove(group.name());
            true
        } else {
            false
        }
    }
}
