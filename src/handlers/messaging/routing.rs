//! Core message routing logic.
//!
//! Resolves an address against both name spaces and fans a relayed line
//! out to every recipient. Resolution works on snapshots; no registry lock
//! is held while sending.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::warn;

use crate::state::{ConnId, Peer, Registry};
use groupcast_proto::Reply;

/// Every connection `address` reaches, excluding `sender`.
///
/// The group named `address` contributes its members and the client named
/// `address` is added; a connection reached both ways appears once.
/// Recipients come back in connection order.
pub fn resolve_recipients(registry: &Registry, address: &str, sender: ConnId) -> Vec<Arc<Peer>> {
    let mut recipients: BTreeMap<ConnId, Arc<Peer>> = BTreeMap::new();

    if let Some(group) = registry.lookup_group(address) {
        for member in group.members() {
            recipients.insert(member.id(), member);
        }
    }
    if let Some(client) = registry.lookup_client(address) {
        recipients.insert(client.id(), client);
    }
    recipients.remove(&sender);

    recipients.into_values().collect()
}

/// Send `+MSG,<sender>,<address>,<body>` to each recipient.
///
/// Returns how many sends succeeded. A recipient whose send fails is closed;
/// its own task notices and runs its cleanup.
pub fn deliver(recipients: &[Arc<Peer>], sender: &str, address: &str, body: &str) -> usize {
    let line = Reply::msg(sender, address, body).to_string();
    let mut delivered = 0;

    for recipient in recipients {
        match recipient.send_line(line.clone()) {
            Ok(()) => delivered += 1,
            Err(e) => {
                warn!(
                    conn = recipient.id(),
                    name = recipient.name().unwrap_or_default(),
                    error = %e,
                    "Send to recipient failed, closing"
                );
                crate::metrics::record_send_failure(e.error_code());
                recipient.close();
            }
        }
    }

    crate::metrics::record_delivery(recipients.len(), delivered);
    delivered
}
