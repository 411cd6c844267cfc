//! # groupcast-proto
//!
//! Parsing and encoding for the GroupCast line protocol.
//!
//! Every line is a flat list of comma-separated fields with no quoting or
//! escaping. Clients send commands (`NAME,alice`, `JOIN,@room,2`,
//! `MSG,@room,hello`) and the server answers each one with a single
//! `+OK,...` or `+ERROR,...` line. Messages relayed to other clients are
//! delivered as `+MSG,<sender>,<address>,<body>`.
//!
//! ## Quick Start
//!
//! ```rust
//! use groupcast_proto::{Command, Reply};
//!
//! let cmd: Command = "join,@room,2".parse().expect("valid command");
//! assert_eq!(cmd, Command::JOIN(Some("@room".into()), Some("2".into())));
//!
//! let reply = Reply::ok("JOIN,@room(1/2)");
//! assert_eq!(reply.to_string(), "+OK,JOIN,@room(1/2)");
//! ```
//!
//! A literal comma inside a message body cannot be told apart from a field
//! separator. Bodies are rebuilt by joining the trailing fields back together,
//! which is lossless except for trailing empty fields.

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod command;
pub mod error;
#[cfg(feature = "tokio")]
pub mod line;
pub mod reply;
pub mod tokenize;

pub use command::{Command, ListSubCommand};
pub use error::{MessageParseError, ProtocolError};
#[cfg(feature = "tokio")]
pub use line::LineCodec;
pub use reply::Reply;
pub use tokenize::{tokenize, FIELD_SEPARATOR, GROUP_PREFIX};
