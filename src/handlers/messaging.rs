//! Messaging handler.
//!
//! Handles `MSG` to a client, a group, or both when the names coincide.

mod routing;

use routing::{deliver, resolve_recipients};

use tracing::debug;

use super::Context;
use crate::error::{HandlerError, HandlerResult};

/// `MSG,<address>,<body>`: relay `body` to everyone `address` reaches.
pub fn handle_msg(ctx: &Context<'_>, address: Option<&str>, body: Option<&str>) -> HandlerResult {
    let sender = ctx.require_name("MSG")?;
    let address = address.ok_or(HandlerError::NoAddress)?;
    let body = body.ok_or(HandlerError::EmptyBody)?;

    let recipients = resolve_recipients(ctx.registry(), address, ctx.peer.id());
    if recipients.is_empty() {
        return Err(HandlerError::NoRecipients {
            address: address.to_string(),
            body: body.to_string(),
        });
    }

    let delivered = deliver(&recipients, sender, address, body);
    debug!(
        conn = ctx.peer.id(),
        name = sender,
        address,
        recipients = recipients.len(),
        delivered,
        "Relayed message"
    );
    Ok(format!("MSG,{address},{body}: {delivered} client(s) notified"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::hub;
    use crate::state::test_support::{named, peer};

    #[test]
    fn msg_preconditions() {
        let hub = hub();
        let (anon, _r0) = peer(1, 4);
        assert_eq!(
            handle_msg(&Context::new(&hub, &anon), Some("bob"), Some("hi")),
            Err(HandlerError::NameNotSet("MSG"))
        );

        let (a, _ra) = named(2, "alice");
        let ctx = Context::new(&hub, &a);
        assert_eq!(handle_msg(&ctx, None, None), Err(HandlerError::NoAddress));
        assert_eq!(handle_msg(&ctx, Some("bob"), None), Err(HandlerError::EmptyBody));
        assert_eq!(
            handle_msg(&ctx, Some("bob"), Some("hi,there")),
            Err(HandlerError::NoRecipients {
                address: "bob".into(),
                body: "hi,there".into()
            })
        );
    }

    #[test]
    fn direct_message_reaches_client() {
        let hub = hub();
        let (a, _ra) = peer(1, 4);
        let (b, mut rb) = peer(2, 4);
        hub.registry.register_client("alice", &a).unwrap();
        hub.registry.register_client("bob", &b).unwrap();

        assert_eq!(
            handle_msg(&Context::new(&hub, &a), Some("bob"), Some("hey")).unwrap(),
            "MSG,bob,hey: 1 client(s) notified"
        );
        assert_eq!(rb.try_recv().unwrap(), "+MSG,alice,bob,hey");
    }

    #[test]
    fn failed_recipient_is_not_counted() {
        let hub = hub();
        let (a, _ra) = peer(1, 4);
        let (b, rb) = peer(2, 4);
        hub.registry.register_client("alice", &a).unwrap();
        hub.registry.register_client("bob", &b).unwrap();
        hub.registry.join_group("@g", &a, 0).unwrap();
        hub.registry.join_group("@g", &b, 0).unwrap();
        drop(rb);

        assert_eq!(
            handle_msg(&Context::new(&hub, &a), Some("@g"), Some("x")).unwrap(),
            "MSG,@g,x: 0 client(s) notified"
        );
        assert!(!b.is_running());
    }
}
