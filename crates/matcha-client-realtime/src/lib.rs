//! Matcha Client Realtime
//!
//! The realtime channel manager of the Matcha client: each chat
//! conversation, the per-user notification feed, and the nearby-users map
//! feed ride on a persistent duplex channel to the backend. This crate owns
//! those channels end to end: endpoint resolution, the WebSocket binding,
//! automatic reconnection with backoff, keepalive, and dispatch of decoded
//! events to the subscriber's handler.
//!
//! Reconnection mechanics are hidden from screens. A screen calls
//! [`channel::open`], holds the returned [`ChannelHandle`], renders the
//! [`ChannelState`](matcha_client_core::ChannelState) it observes, and calls
//! `close()` (or just drops the handle) on unmount.
//!
//! The connection itself sits behind the [`Connector`]/[`Link`] seam so the
//! channel task can be driven by a scripted transport in tests and by
//! `tokio-tungstenite` in production.

// ----------------------------------------------------------------------------
// Module Declarations
// ----------------------------------------------------------------------------

pub mod channel;
pub mod endpoint;
pub mod errors;
pub mod link;

// ----------------------------------------------------------------------------
// Public API
// ----------------------------------------------------------------------------

pub use channel::{open, open_with, ChannelHandle, ChannelHandler};
pub use endpoint::Endpoint;
pub use errors::RealtimeError;
pub use link::{Connector, Link, WsConnector};
