//! Unified error handling for groupcast.
//!
//! Protocol-level failures are reported to the offending connection as a
//! single `+ERROR,...` line. The `Display` text of [`HandlerError`] is that
//! line's payload, so handlers never format error replies by hand.

use thiserror::Error;

// ============================================================================
// Handler Errors (command processing)
// ============================================================================

/// Errors that can occur during command handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandlerError {
    #[error("No command given")]
    NoCommand,

    #[error("Invalid command ({0})")]
    UnknownCommand(String),

    #[error("NAME: already set")]
    NameAlreadySet,

    #[error("NAME: not specified")]
    NameNotSpecified,

    #[error("NAME: cannot start with @")]
    NameStartsWithPrefix,

    #[error("NAME,{0}: already in use")]
    NameInUse(String),

    #[error("LIST: parameter missing")]
    ListParameterMissing,

    #[error("LIST: Invalid parameter: {0}")]
    ListInvalidParameter(String),

    #[error("LIST,USERS,{0}: group not found")]
    ListGroupNotFound(String),

    #[error("{0}: name not set")]
    NameNotSet(&'static str),

    #[error("{0}: no group given")]
    NoGroupGiven(&'static str),

    #[error("JOIN: group must start with @")]
    GroupMissingPrefix,

    #[error("JOIN,{0}: group is full")]
    GroupFull(String),

    #[error("JOIN,{0}: invalid maximum group size")]
    InvalidCapacity(String),

    #[error("JOIN,{0}: maximum group size mismatch with existing group")]
    CapacityMismatch(String),

    #[error("QUIT,{0}: group does not exist")]
    NoSuchGroup(String),

    #[error("QUIT,{0}: client is not a member")]
    NotMember(String),

    #[error("MSG: no address given")]
    NoAddress,

    #[error("MSG: message body empty")]
    EmptyBody,

    #[error("MSG,{address},{body}: no recipients found")]
    NoRecipients { address: String, body: String },
}

impl HandlerError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NoCommand => "no_command",
            Self::UnknownCommand(_) => "unknown_command",
            Self::NameAlreadySet => "name_already_set",
            Self::NameNotSpecified => "name_not_specified",
            Self::NameStartsWithPrefix => "name_starts_with_prefix",
            Self::NameInUse(_) => "name_in_use",
            Self::ListParameterMissing => "list_parameter_missing",
            Self::ListInvalidParameter(_) => "list_invalid_parameter",
            Self::ListGroupNotFound(_) => "list_group_not_found",
            Self::NameNotSet(_) => "name_not_set",
            Self::NoGroupGiven(_) => "no_group_given",
            Self::GroupMissingPrefix => "group_missing_prefix",
            Self::GroupFull(_) => "group_full",
            Self::InvalidCapacity(_) => "invalid_capacity",
            Self::CapacityMismatch(_) => "capacity_mismatch",
            Self::NoSuchGroup(_) => "no_such_group",
            Self::NotMember(_) => "not_member",
            Self::NoAddress => "no_address",
            Self::EmptyBody => "empty_body",
            Self::NoRecipients { .. } => "no_recipients",
        }
    }
}

/// Result type for command handlers: the `+OK` payload on success.
pub type HandlerResult = Result<String, HandlerError>;

// ============================================================================
// Registry Errors (shared state operations)
// ============================================================================

/// Registry and group operation errors.
///
/// These carry no names; handler code maps them to the protocol error for
/// the command that triggered them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("name already in use")]
    NameInUse,

    #[error("group is full")]
    GroupFull,

    #[error("capacity mismatch with existing group")]
    CapacityMismatch,

    #[error("no such group")]
    NoSuchGroup,

    #[error("not a member")]
    NotMember,
}

impl RegistryError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NameInUse => "name_in_use",
            Self::GroupFull => "group_full",
            Self::CapacityMismatch => "capacity_mismatch",
            Self::NoSuchGroup => "no_such_group",
            Self::NotMember => "not_member",
        }
    }
}

// ============================================================================
// Send Errors (peer output queue)
// ============================================================================

/// Failure to hand a line to a peer's writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SendError {
    #[error("connection closed")]
    Closed,

    #[error("send queue full")]
    QueueFull,
}

impl SendError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::QueueFull => "queue_full",
        }
    }
}

impl<T> From<tokio::sync::mpsc::error::TrySendError<T>> for SendError {
    fn from(err: tokio::sync::mpsc::error::TrySendError<T>) -> Self {
        match err {
            tokio::sync::mpsc::error::TrySendError::Full(_) => Self::QueueFull,
            tokio::sync::mpsc::error::TrySendError::Closed(_) => Self::Closed,
        }
    }
}
