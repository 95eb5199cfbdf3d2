//! Realtime endpoint resolution
//!
//! Each channel kind resolves to a distinct backend path parameterized by
//! its routing key: `/ws/chat/{chat_id}`, `/ws/notifications/{user_id}`, and
//! `/ws/map/{user_id}?token=...`. The map feed authenticates with the
//! session's bearer token as a query parameter; the token never appears in
//! `Debug`/`Display` output.

use core::fmt;

use url::Url;

use matcha_client_core::session::{AuthToken, Session};
use matcha_client_core::types::{ChannelKind, ChatId, UserId};

use crate::errors::RealtimeError;

// ----------------------------------------------------------------------------
// Endpoint
// ----------------------------------------------------------------------------

/// Routing key of a realtime endpoint
#[derive(Debug, Clone)]
enum Route {
    Chat(ChatId),
    Notifications(UserId),
    Map { user_id: UserId, token: AuthToken },
}

/// Identity of one realtime backend endpoint: kind plus routing key,
/// resolved against a base URL such as `ws://localhost:8000`.
#[derive(Debug, Clone)]
pub struct Endpoint {
    base: Url,
    route: Route,
}

impl Endpoint {
    /// Endpoint for one conversation's message stream
    pub fn chat(base: Url, chat_id: ChatId) -> Self {
        Self {
            base,
            route: Route::Chat(chat_id),
        }
    }

    /// Endpoint for the logged-in user's notification feed
    pub fn notifications(base: Url, user_id: UserId) -> Self {
        Self {
            base,
            route: Route::Notifications(user_id),
        }
    }

    /// Endpoint for the logged-in user's map feed.
    ///
    /// The map socket is the only one authenticated at connect time, so it
    /// takes the whole session.
    pub fn map(base: Url, session: &Session) -> Self {
        Self {
            base,
            route: Route::Map {
                user_id: session.user_id(),
                token: session.token().clone(),
            },
        }
    }

    /// The channel kind this endpoint belongs to
    pub fn kind(&self) -> ChannelKind {
        match self.route {
            Route::Chat(_) => ChannelKind::Chat,
            Route::Notifications(_) => ChannelKind::Notifications,
            Route::Map { .. } => ChannelKind::Map,
        }
    }

    /// Resolve the full connection URL
    pub fn url(&self) -> Result<Url, RealtimeError> {
        let mut url = self.base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| RealtimeError::InvalidBase)?;
            segments.pop_if_empty().push("ws");
            match &self.route {
                Route::Chat(chat_id) => {
                    segments.push("chat").push(&chat_id.to_string());
                }
                Route::Notifications(user_id) => {
                    segments.push("notifications").push(&user_id.to_string());
                }
                Route::Map { user_id, .. } => {
                    segments.push("map").push(&user_id.to_string());
                }
            }
        }
        if let Route::Map { token, .. } = &self.route {
            url.query_pairs_mut().append_pair("token", token.as_str());
        }
        Ok(url)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.route {
            Route::Chat(chat_id) => write!(f, "chat/{}", chat_id),
            Route::Notifications(user_id) => write!(f, "notifications/{}", user_id),
            Route::Map { user_id, .. } => write!(f, "map/{}", user_id),
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
