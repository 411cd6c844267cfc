//! Client command types and parsing.

use std::fmt;
use std::str::FromStr;

use crate::error::MessageParseError;
use crate::tokenize::{tokenize, FIELD_SEPARATOR};

/// A command sent by a client.
///
/// Arguments are kept as `Option`s: whether a missing argument is an error is
/// decided by the server, which reports it with a command-specific message.
#[derive(Clone, Debug, PartialEq, Eq)]
#[allow(clippy::upper_case_acronyms)]
pub enum Command {
    /// `BYE`: acknowledge and close the connection.
    BYE,
    /// `VERSION`: report the server identity.
    VERSION,
    /// `NAME,<name>`: claim a client name.
    NAME(Option<String>),
    /// `LIST,<sub>[,<group>]`: list users, groups or own memberships.
    LIST(Option<ListSubCommand>),
    /// `JOIN,<group>[,<max members>]`: join or create a group.
    JOIN(Option<String>, Option<String>),
    /// `QUIT,<group>`: leave a group.
    QUIT(Option<String>),
    /// `MSG,<address>,<body>`: relay a message to a client or group.
    ///
    /// The body is every field after the address, rejoined with commas.
    MSG(Option<String>, Option<String>),
    /// Any unrecognised command, with its trimmed name and raw arguments.
    Raw(String, Vec<String>),
}

/// Sub-commands of `LIST`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[allow(clippy::upper_case_acronyms)]
pub enum ListSubCommand {
    /// `LIST,USERS` or `LIST,USERS,<group>`.
    USERS(Option<String>),
    /// `LIST,GROUPS`.
    GROUPS,
    /// `LIST,MYGROUPS`.
    MYGROUPS,
    /// Anything else, kept verbatim for the error reply.
    Unknown(String),
}

impl ListSubCommand {
    fn parse(sub: &str, group: Option<&str>) -> Self {
        if sub.eq_ignore_ascii_case("USERS") {
            ListSubCommand::USERS(group.map(str::to_owned))
        } else if sub.eq_ignore_ascii_case("GROUPS") {
            ListSubCommand::GROUPS
        } else if sub.eq_ignore_ascii_case("MYGROUPS") {
            ListSubCommand::MYGROUPS
        } else {
            ListSubCommand::Unknown(sub.to_owned())
        }
    }
}

impl Command {
    /// Parse a single protocol line into a command.
    ///
    /// Fails only when the line has no fields at all (for example `",,"`).
    #[must_use = "command parsing result should be handled"]
    pub fn parse(line: &str) -> Result<Command, MessageParseError> {
        let fields = tokenize(line);
        let (cmd, args) = fields
            .split_first()
            .ok_or(MessageParseError::EmptyMessage)?;
        Ok(Command::new(cmd.trim(), args))
    }

    /// Build a command from its (already trimmed) name and arguments.
    pub fn new(cmd: &str, args: &[&str]) -> Command {
        let arg = |i: usize| args.get(i).map(|s| (*s).to_owned());
        let cmd_upper = cmd.to_ascii_uppercase();

        match cmd_upper.as_str() {
            "BYE" => Command::BYE,
            "VERSION" => Command::VERSION,
            "NAME" => Command::NAME(arg(0)),
            "LIST" => Command::LIST(
                args.first()
                    .map(|sub| ListSubCommand::parse(sub, args.get(1).copied())),
            ),
            "JOIN" => Command::JOIN(arg(0), arg(1)),
            "QUIT" => Command::QUIT(arg(0)),
            "MSG" => {
                let body = if args.len() > 1 {
                    Some(args[1..].join(&FIELD_SEPARATOR.to_string()))
                } else {
                    None
                };
                Command::MSG(arg(0), body)
            }
            _ => Command::Raw(
                cmd.to_owned(),
                args.iter().map(|s| (*s).to_owned()).collect(),
            ),
        }
    }

    /// Command name: canonical upper-case for known commands, the word as
    /// received for [`Command::Raw`].
    pub fn name(&self) -> &str {
        match self {
            Command::BYE => "BYE",
            Command::VERSION => "VERSION",
            Command::NAME(_) => "NAME",
            Command::LIST(_) => "LIST",
            Command::JOIN(..) => "JOIN",
            Command::QUIT(_) => "QUIT",
            Command::MSG(..) => "MSG",
            Command::Raw(cmd, _) => cmd,
        }
    }
}

impl FromStr for Command {
    type Err = MessageParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Command::parse(s)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut fields: Vec<&str> = vec![self.name()];
        match self {
            Command::BYE | Command::VERSION => {}
            Command::NAME(name) | Command::QUIT(name) => fields.extend(name.as_deref()),
            Command::LIST(sub) => match sub {
                Some(ListSubCommand::USERS(group)) => {
                    fields.push("USERS");
                    fields.extend(group.as_deref());
                }
                Some(ListSubCommand::GROUPS) => fields.push("GROUPS"),
                Some(ListSubCommand::MYGROUPS) => fields.push("MYGROUPS"),
                Some(ListSubCommand::Unknown(other)) => fields.push(other),
                None => {}
            },
            Command::JOIN(group, max) => {
                fields.extend(group.as_deref());
                fields.extend(max.as_deref());
            }
            Command::MSG(address, body) => {
                fields.extend(address.as_deref());
                fields.extend(body.as_deref());
            }
            Command::Raw(_, args) => fields.extend(args.iter().map(String::as_str)),
        }
        write!(f, "{}", fields.join(&FIELD_SEPARATOR.to_string()))
    }
}
