//! Per-connection command processor.
//!
//! Turns one input line into exactly one reply line. Shared state is only
//! touched through the registry; the session itself owns nothing but the
//! running flag.

use std::sync::Arc;

use tracing::debug;

use super::{Context, connection, group, list, messaging};
use crate::error::{HandlerError, HandlerResult};
use crate::state::{Hub, Peer};
use groupcast_proto::{Command, Reply};

/// Command processor for one connection.
pub struct Session {
    hub: Arc<Hub>,
    peer: Arc<Peer>,
    running: bool,
}

impl Session {
    pub fn new(hub: Arc<Hub>, peer: Arc<Peer>) -> Self {
        Self {
            hub,
            peer,
            running: true,
        }
    }

    pub fn peer(&self) -> &Arc<Peer> {
        &self.peer
    }

    /// False after `BYE` or once another connection forced this one closed.
    pub fn is_running(&self) -> bool {
        self.running && self.peer.is_running()
    }

    /// Process one line and produce its reply.
    pub fn process_line(&mut self, line: &str) -> Reply {
        debug!(conn = self.peer.id(), line, "Received line");

        let command = match Command::parse(line) {
            Ok(command) => command,
            Err(_) => return self.reply("NONE", Err(HandlerError::NoCommand)),
        };

        let result = self.dispatch(&command);
        if result.is_ok() && changes_registry(&command) {
            self.hub.update_registry_gauges();
        }
        self.reply(metric_label(&command), result)
    }

    fn dispatch(&mut self, command: &Command) -> HandlerResult {
        let ctx = Context::new(&self.hub, &self.peer);
        match command {
            Command::BYE => {
                self.running = false;
                Ok("BYE".to_string())
            }
            Command::VERSION => connection::handle_version(&ctx),
            Command::NAME(name) => connection::handle_name(&ctx, name.as_deref()),
            Command::LIST(sub) => list::handle_list(&ctx, sub.as_ref()),
            Command::JOIN(group, max) => {
                group::handle_join(&ctx, group.as_deref(), max.as_deref())
            }
            Command::QUIT(group) => group::handle_quit(&ctx, group.as_deref()),
            Command::MSG(address, body) => {
                messaging::handle_msg(&ctx, address.as_deref(), body.as_deref())
            }
            Command::Raw(cmd, _) => Err(HandlerError::UnknownCommand(cmd.clone())),
        }
    }

    fn reply(&self, label: &str, result: HandlerResult) -> Reply {
        crate::metrics::record_command(label);
        match result {
            Ok(text) => Reply::ok(text),
            Err(e) => {
                debug!(conn = self.peer.id(), command = label, error = %e, "Command failed");
                crate::metrics::record_command_error(label, e.error_code());
                Reply::error(e.to_string())
            }
        }
    }
}

/// Bounded label set: unknown commands share one label.
fn metric_label(command: &Command) -> &str {
    match command {
        Command::Raw(..) => "UNKNOWN",
        known => known.name(),
    }
}

fn changes_registry(command: &Command) -> bool {
    matches!(command, Command::NAME(_) | Command::JOIN(..) | Command::QUIT(_))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::hub;

    fn session(hub: &Arc<Hub>, id: u64) -> (Session, tokio::sync::mpsc::Receiver<String>) {
        let (peer, rx) = crate::state::test_support::peer(id, 16);
        hub.connections.insert(peer.id(), Arc::clone(&peer));
        (Session::new(Arc::clone(hub), peer), rx)
    }

    fn say(session: &mut Session, line: &str) -> String {
        session.process_line(line).to_string()
    }

    #[test]
    fn scenario_name_join_and_message() {
        let hub = Arc::new(hub());
        let (mut a, _ra) = session(&hub, 1);
        let (mut b, _rb) = session(&hub, 2);
        let (mut carol, mut rcarol) = session(&hub, 3);
        let (mut dave, _rd) = session(&hub, 4);

        assert_eq!(say(&mut a, "NAME,alice"), "+OK,NAME,alice");
        assert_eq!(say(&mut b, "NAME,alice"), "+ERROR,NAME,alice: already in use");
        assert_eq!(say(&mut carol, "NAME,carol"), "+OK,NAME,carol");
        assert_eq!(say(&mut dave, "NAME,dave"), "+OK,NAME,dave");

        assert_eq!(say(&mut a, "JOIN,@room,2"), "+OK,JOIN,@room(1/2)");
        assert_eq!(say(&mut carol, "JOIN,@room,2"), "+OK,JOIN,@room(2/2)");
        assert_eq!(say(&mut dave, "JOIN,@room,2"), "+ERROR,JOIN,@room: group is full");

        assert_eq!(
            say(&mut a, "MSG,@room,hello"),
            "+OK,MSG,@room,hello: 1 client(s) notified"
        );
        assert_eq!(rcarol.try_recv().unwrap(), "+MSG,alice,@room,hello");
        assert!(rcarol.try_recv().is_err());
    }

    #[test]
    fn commands_are_case_insensitive_and_trimmed() {
        let hub = Arc::new(hub());
        let (mut s, _rx) = session(&hub, 1);
        assert_eq!(
            say(&mut s, "  version "),
            "+OK,VERSION,GroupCast server 1.0 127.0.0.1:20000"
        );
        assert_eq!(say(&mut s, "name,bob"), "+OK,NAME,bob");
        assert_eq!(say(&mut s, "list,users"), "+OK,LIST,USERS:bob");
    }

    #[test]
    fn empty_and_unknown_commands() {
        let hub = Arc::new(hub());
        let (mut s, _rx) = session(&hub, 1);
        assert_eq!(say(&mut s, ",,,"), "+ERROR,No command given");
        assert_eq!(say(&mut s, ""), "+ERROR,Invalid command ()");
        assert_eq!(say(&mut s, "HELLO,world"), "+ERROR,Invalid command (HELLO)");
        assert!(s.is_running());
    }

    #[test]
    fn msg_body_keeps_commas() {
        let hub = Arc::new(hub());
        let (mut a, _ra) = session(&hub, 1);
        let (mut b, mut rb) = session(&hub, 2);
        say(&mut a, "NAME,alice");
        say(&mut b, "NAME,bob");

        assert_eq!(
            say(&mut a, "MSG,bob,one,two,,three"),
            "+OK,MSG,bob,one,two,,three: 1 client(s) notified"
        );
        assert_eq!(rb.try_recv().unwrap(), "+MSG,alice,bob,one,two,,three");
        assert_eq!(say(&mut a, "MSG,bob,"), "+ERROR,MSG: message body empty");
        assert_eq!(say(&mut a, "MSG"), "+ERROR,MSG: no address given");
    }

    #[test]
    fn commands_before_name() {
        let hub = Arc::new(hub());
        let (mut s, _rx) = session(&hub, 1);
        assert_eq!(say(&mut s, "JOIN,@g"), "+ERROR,JOIN: name not set");
        assert_eq!(say(&mut s, "MSG,x,y"), "+ERROR,MSG: name not set");
        assert_eq!(say(&mut s, "QUIT,@g"), "+ERROR,QUIT,@g: group does not exist");
        assert_eq!(say(&mut s, "LIST"), "+ERROR,LIST: parameter missing");
        assert_eq!(say(&mut s, "LIST,foo"), "+ERROR,LIST: Invalid parameter: foo");
        assert_eq!(say(&mut s, "NAME"), "+ERROR,NAME: not specified");
        assert_eq!(say(&mut s, "NAME,@x"), "+ERROR,NAME: cannot start with @");
    }

    #[test]
    fn group_lifecycle_through_commands() {
        let hub = Arc::new(hub());
        let (mut a, _ra) = session(&hub, 1);
        say(&mut a, "NAME,alice");

        assert_eq!(say(&mut a, "JOIN,@g,3"), "+OK,JOIN,@g(1/3)");
        assert_eq!(
            say(&mut a, "JOIN,@g,4"),
            "+ERROR,JOIN,@g: maximum group size mismatch with existing group"
        );
        assert_eq!(say(&mut a, "JOIN,@h,x"), "+ERROR,JOIN,@h: invalid maximum group size");
        assert_eq!(say(&mut a, "JOIN,h"), "+ERROR,JOIN: group must start with @");
        assert_eq!(say(&mut a, "LIST,MYGROUPS"), "+OK,LIST,MYGROUPS:@g(1/3)");
        assert_eq!(say(&mut a, "LIST,USERS,@g"), "+OK,LIST,USERS,@g:alice");
        assert_eq!(say(&mut a, "QUIT,@g"), "+OK,QUIT,@g");
        assert_eq!(say(&mut a, "LIST,GROUPS"), "+OK,LIST,GROUPS:");
        assert_eq!(say(&mut a, "JOIN,@g,9"), "+OK,JOIN,@g(1/9)");
        assert_eq!(
            say(&mut a, "LIST,USERS,@none"),
            "+ERROR,LIST,USERS,@none: group not found"
        );
    }

    #[test]
    fn bye_stops_session() {
        let hub = Arc::new(hub());
        let (mut s, _rx) = session(&hub, 1);
        assert_eq!(say(&mut s, "bye"), "+OK,BYE");
        assert!(!s.is_running());
    }

    #[test]
    fn metric_labels_use_command_names() {
        assert_eq!(metric_label(&Command::parse("join,@g").unwrap()), "JOIN");
        assert_eq!(metric_label(&Command::parse("msg,a,b").unwrap()), "MSG");
        assert_eq!(metric_label(&Command::parse("ping,x").unwrap()), "UNKNOWN");
    }

    #[test]
    fn forced_close_stops_session() {
        let hub = Arc::new(hub());
        let (s, _rx) = session(&hub, 1);
        s.peer().close();
        assert!(!s.is_running());
    }
}
