//! Wire messages for the realtime channels
//!
//! JSON shapes exactly as the backend speaks them: a flat object per chat
//! message, a flat object per notification, and a `type`-tagged union on the
//! map feed. Decoding is per-kind because the dialects overlap (all three can
//! deliver an `{"error": ...}` frame).

use serde::{Deserialize, Serialize};

use crate::errors::WireError;
use crate::types::{ChannelKind, ChatId, UserId};

// ----------------------------------------------------------------------------
// Chat Frames
// ----------------------------------------------------------------------------

/// A chat message delivered on a conversation channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub chat_id: ChatId,
    pub sender_id: UserId,
    pub content: String,
    /// Backend-formatted timestamp, passed through opaquely for display
    pub sent_at: String,
}

/// An outbound chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSend {
    pub sender_id: UserId,
    pub content: String,
}

// ----------------------------------------------------------------------------
// Notification Frames
// ----------------------------------------------------------------------------

/// A notification delivered on the per-user feed.
///
/// The `kind` string ("like", "match", "view", ...) is backend-defined and
/// passed through opaquely; screens decide how to render each one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub user_id: UserId,
    #[serde(rename = "type")]
    pub kind: String,
    pub content: String,
    pub created_at: String,
}

// ----------------------------------------------------------------------------
// Map Frames
// ----------------------------------------------------------------------------

/// A position/presence update for one nearby user
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LocationUpdate {
    pub user_id: UserId,
    pub latitude: f64,
    pub longitude: f64,
    pub is_online: bool,
}

/// An online/offline transition for one nearby user
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StatusUpdate {
    pub user_id: UserId,
    pub is_online: bool,
}

// ----------------------------------------------------------------------------
// Inbound Events
// ----------------------------------------------------------------------------

/// A decoded inbound frame from any channel kind
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    /// Chat: a new message in the conversation
    Message(ChatMessage),
    /// Notifications: a new notification for the user
    Notification(Notification),
    /// Map: subscription acknowledged by the server
    Connected,
    /// Map: a nearby user moved or changed presence
    Location(LocationUpdate),
    /// Map: a nearby user went online or offline
    Status(StatusUpdate),
    /// Map: heartbeat response
    Pong,
    /// Any kind: the server reported an error for this channel
    ServerError { message: String },
}

/// Server-side error frame, shared by all channel dialects
#[derive(Debug, Deserialize)]
struct ErrorFrame {
    error: String,
}

/// Decode one inbound frame according to the channel's dialect.
///
/// Frames that fail to decode are reported as [`WireError`]; callers drop
/// and log them without disturbing the channel.
pub fn decode_inbound(kind: ChannelKind, raw: &str) -> Result<InboundEvent, WireError> {
    match kind {
        ChannelKind::Chat => decode_chat(raw),
        ChannelKind::Notifications => decode_notification(raw),
        ChannelKind::Map => decode_map(raw),
    }
}

fn decode_chat(raw: &str) -> Result<InboundEvent, WireError> {
    if let Ok(frame) = serde_json::from_str::<ErrorFrame>(raw) {
        return Ok(InboundEvent::ServerError {
            message: frame.error,
        });
    }
    let message: ChatMessage = serde_json::from_str(raw)?;
    Ok(InboundEvent::Message(message))
}

fn decode_notification(raw: &str) -> Result<InboundEvent, WireError> {
    if let Ok(frame) = serde_json::from_str::<ErrorFrame>(raw) {
        return Ok(InboundEvent::ServerError {
            message: frame.error,
        });
    }
    let notification: Notification = serde_json::from_str(raw)?;
    Ok(InboundEvent::Notification(notification))
}

fn decode_map(raw: &str) -> Result<InboundEvent, WireError> {
    let value: serde_json::Value = serde_json::from_str(raw)?;
    let tag = value
        .get("type")
        .and_then(serde_json::Value::as_str)
        .ok_or(WireError::MissingTag)?;

    match tag {
        "connected" => Ok(InboundEvent::Connected),
        "pong" => Ok(InboundEvent::Pong),
        "location_update" => {
            let update: LocationUpdate = serde_json::from_value(value)?;
            Ok(InboundEvent::Location(update))
        }
        "status_update" => {
            let update: StatusUpdate = serde_json::from_value(value)?;
            Ok(InboundEvent::Status(update))
        }
        other => Err(WireError::UnknownTag {
            tag: other.to_string(),
        }),
    }
}

// ----------------------------------------------------------------------------
// Outbound Events
// ----------------------------------------------------------------------------

/// An outbound frame for any channel kind
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundEvent {
    /// Chat: send a message into the conversation
    Message(ChatSend),
    /// Map: publish our position
    Location { latitude: f64, longitude: f64 },
    /// Map: heartbeat
    Ping,
}

impl OutboundEvent {
    /// Serialize to the wire representation
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        match self {
            OutboundEvent::Message(send) => serde_json::to_string(send),
            OutboundEvent::Location {
                latitude,
                longitude,
            } => serde_json::to_string(&serde_json::json!({
                "type": "location_update",
                "latitude": latitude,
                "longitude": longitude,
            })),
            OutboundEvent::Ping => serde_json::to_string(&serde_json::json!({ "type": "ping" })),
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
