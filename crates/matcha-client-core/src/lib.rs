//! Matcha Client Core
//!
//! This crate provides the I/O-free client logic for the Matcha dating
//! platform: identifier newtypes, wire message codecs for the realtime
//! channels (chat, notifications, map), the reconnect/backoff policy, the
//! swipe gesture state machine, and the candidate card deck backing the
//! discovery screens.
//!
//! Everything here is driven by its caller. Network bindings live in
//! `matcha-client-realtime`; screens and rendering live outside this
//! workspace entirely.

// ----------------------------------------------------------------------------
// Module Declarations
// ----------------------------------------------------------------------------

pub mod config;
pub mod deck;
pub mod errors;
pub mod gesture;
pub mod retry;
pub mod session;
pub mod types;
pub mod wire;

// ----------------------------------------------------------------------------
// Public API
// ----------------------------------------------------------------------------

pub use config::{GestureConfig, RealtimeConfig};
pub use deck::{Advance, CardQueue};
pub use errors::{ClientError, ConfigError, Result, WireError};
pub use gesture::{
    CardTransform, GestureState, Release, SwipeAction, SwipeController, SwipeDirection,
    SwipeGesture, SwipeOutcomes,
};
pub use retry::RetryPolicy;
pub use session::{AuthToken, Session};
pub use types::{ChannelKind, ChannelState, ChatId, UserId};
pub use wire::{
    ChatMessage, ChatSend, InboundEvent, LocationUpdate, Notification, OutboundEvent, StatusUpdate,
};
