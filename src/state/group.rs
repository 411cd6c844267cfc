//! Groups: named, optionally capacity-bounded member sets.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use super::{ConnId, Peer};
use crate::error::RegistryError;

/// A named set of member connections.
///
/// Members are held weakly; the group never keeps a connection alive.
/// Capacity is fixed at creation, `0` meaning unbounded.
#[derive(Debug)]
pub struct Group {
    name: String,
    capacity: usize,
    members: Mutex<BTreeMap<ConnId, Weak<Peer>>>,
}

/// Point-in-time view of a group, used for replies and listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupInfo {
    pub name: String,
    pub member_count: usize,
    pub capacity: usize,
}

impl fmt::Display for GroupInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}/{})", self.name, self.member_count, self.capacity)
    }
}

impl Group {
    pub fn new(name: impl Into<String>, capacity: usize) -> Self {
        Self {
            name: name.into(),
            capacity,
            members: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Insert `peer`. Re-adding a member is a no-op.
    ///
    /// Fails with `GroupFull` when bounded and at capacity, even if `peer`
    /// is already a member.
    pub fn add_member(&self, peer: &Arc<Peer>) -> Result<GroupInfo, RegistryError> {
        let mut members = self.members.lock();
        if self.capacity > 0 && members.len() >= self.capacity {
            return Err(RegistryError::GroupFull);
        }
        members.insert(peer.id(), Arc::downgrade(peer));
        Ok(self.info_locked(members.len()))
    }

    /// Remove `id`, returning how many members remain.
    pub fn remove_member(&self, id: ConnId) -> Result<usize, RegistryError> {
        let mut members = self.members.lock();
        members.remove(&id).ok_or(RegistryError::NotMember)?;
        Ok(members.len())
    }

    pub fn contains(&self, id: ConnId) -> bool {
        self.members.lock().contains_key(&id)
    }

    pub fn member_count(&self) -> usize {
        self.members.lock().len()
    }

    /// Live members in connection order. Dropped connections are skipped.
    pub fn members(&self) -> Vec<Arc<Peer>> {
        self.members
            .lock()
            .values()
            .filter_map(Weak::upgrade)
            .collect()
    }

    pub fn info(&self) -> GroupInfo {
        self.info_locked(self.member_count())
    }

    fn info_locked(&self, member_count: usize) -> GroupInfo {
        GroupInfo {
            name: self.name.clone(),
            member_count,
            capacity: self.capacity,
        }
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.info(), f)
    }
}
