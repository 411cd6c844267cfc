//! Server-to-client lines: acknowledgments and relayed messages.

use std::fmt;
use std::str::FromStr;

use crate::error::MessageParseError;

const OK_PREFIX: &str = "+OK,";
const ERROR_PREFIX: &str = "+ERROR,";
const MSG_PREFIX: &str = "+MSG,";

/// A line sent by the server.
///
/// Every client command is answered by exactly one [`Reply::Ok`] or
/// [`Reply::Error`]. [`Reply::Msg`] carries a message relayed from another
/// client and is never an answer to the receiver's own command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reply {
    /// `+OK,<text>`
    Ok(String),
    /// `+ERROR,<text>`
    Error(String),
    /// `+MSG,<sender>,<address>,<body>`
    Msg {
        /// Name of the sending client.
        sender: String,
        /// Address the sender used (a client name or a group name).
        address: String,
        /// Message body, possibly containing commas.
        body: String,
    },
}

impl Reply {
    /// Build a `+OK` reply.
    pub fn ok(text: impl Into<String>) -> Self {
        Reply::Ok(text.into())
    }

    /// Build a `+ERROR` reply.
    pub fn error(text: impl Into<String>) -> Self {
        Reply::Error(text.into())
    }

    /// Build a relayed message.
    pub fn msg(
        sender: impl Into<String>,
        address: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Reply::Msg {
            sender: sender.into(),
            address: address.into(),
            body: body.into(),
        }
    }

    /// Whether this is a `+OK` acknowledgment.
    pub fn is_ok(&self) -> bool {
        matches!(self, Reply::Ok(_))
    }

    /// Whether this is a `+ERROR` acknowledgment.
    pub fn is_error(&self) -> bool {
        matches!(self, Reply::Error(_))
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Ok(text) => write!(f, "{}{}", OK_PREFIX, text),
            Reply::Error(text) => write!(f, "{}{}", ERROR_PREFIX, text),
            Reply::Msg {
                sender,
                address,
                body,
            } => write!(f, "{}{},{},{}", MSG_PREFIX, sender, address, body),
        }
    }
}

impl FromStr for Reply {
    type Err = MessageParseError;

    /// Parse a server line. Trailing `\r\n` is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let line = s.trim_end_matches(['\r', '\n']);

        if let Some(text) = line.strip_prefix(OK_PREFIX) {
            return Ok(Reply::Ok(text.to_owned()));
        }
        if let Some(text) = line.strip_prefix(ERROR_PREFIX) {
            return Ok(Reply::Error(text.to_owned()));
        }
        if let Some(rest) = line.strip_prefix(MSG_PREFIX) {
            let mut parts = rest.splitn(3, ',');
            if let (Some(sender), Some(address), Some(body)) =
                (parts.next(), parts.next(), parts.next())
            {
                return Ok(Reply::msg(sender, address, body));
            }
        }
        Err(MessageParseError::InvalidReply(line.to_owned()))
    }
}
