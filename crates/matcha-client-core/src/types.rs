//! Core types for the Matcha client
//!
//! Identifier newtypes shared across the wire codecs and the realtime layer,
//! plus the channel kind/state enums the rest of the workspace dispatches on.

use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};

// ----------------------------------------------------------------------------
// User Identifier
// ----------------------------------------------------------------------------

/// Unique identifier for a user account, as assigned by the backend.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct UserId(i64);

impl UserId {
    /// Create a new UserId from a raw backend id
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the raw id
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = core::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<i64>().map(Self)
    }
}

// ----------------------------------------------------------------------------
// Chat Identifier
// ----------------------------------------------------------------------------

/// Unique identifier for a conversation between two matched users.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct ChatId(i64);

impl ChatId {
    /// Create a new ChatId from a raw backend id
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the raw id
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ChatId {
    type Err = core::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<i64>().map(Self)
    }
}

// ----------------------------------------------------------------------------
// Channel Kind
// ----------------------------------------------------------------------------

/// The three realtime endpoint families the backend exposes.
///
/// The kind selects the wire dialect, the endpoint path, and the reconnect
/// policy: chat channels retry forever, the ancillary feeds give up after a
/// fixed attempt budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelKind {
    /// Per-conversation message stream
    Chat,
    /// Per-user notification feed
    Notifications,
    /// Per-user nearby-users map feed
    Map,
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelKind::Chat => write!(f, "chat"),
            ChannelKind::Notifications => write!(f, "notifications"),
            ChannelKind::Map => write!(f, "map"),
        }
    }
}

// ----------------------------------------------------------------------------
// Channel State
// ----------------------------------------------------------------------------

/// Observable connection state of a realtime channel.
///
/// Screens render this as a connection-status indicator; it is never an
/// error dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelState {
    /// First connection attempt is in flight
    Connecting,
    /// Link is established and frames are flowing
    Open,
    /// Link was lost; a retry is scheduled or in flight
    Reconnecting,
    /// Channel is done: closed by the caller or retry budget exhausted
    Closed,
}

impl ChannelState {
    /// Whether outbound frames would currently be transmitted
    pub fn is_open(&self) -> bool {
        matches!(self, ChannelState::Open)
    }

    /// Whether the channel will make no further connection attempts
    pub fn is_terminal(&self) -> bool {
        matches!(self, ChannelState::Closed)
    }
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelState::Connecting => write!(f, "connecting"),
            ChannelState::Open => write!(f, "open"),
            ChannelState::Reconnecting => write!(f, "reconnecting"),
            ChannelState::Closed => write!(f, "closed"),
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_round_trip() {
        let user = UserId::new(42);
        assert_eq!(user.value(), 42);
        assert_eq!(user.to_string(), "42");
        assert_eq!("42".parse::<UserId>().unwrap(), user);

        let chat = ChatId::new(7);
        assert_eq!(chat.to_string(), "7");
        assert_eq!("7".parse::<ChatId>().unwrap(), chat);
    }

    #[test]
    fn test_ids_serialize_as_plain_numbers() {
        assert_eq!(serde_json::to_string(&UserId::new(3)).unwrap(), "3");
        assert_eq!(serde_json::to_string(&ChatId::new(9)).unwrap(), "9");
    }

    #[test]
    fn test_channel_state_predicates() {
        assert!(ChannelState::Open.is_open());
        assert!(!ChannelState::Reconnecting.is_open());
        assert!(ChannelState::Closed.is_terminal());
        assert!(!ChannelState::Connecting.is_terminal());
    }
}
