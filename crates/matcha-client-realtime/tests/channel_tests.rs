//! Integration tests for the realtime channel manager
//!
//! Driven against a scripted connector on the tokio test clock, so
//! reconnect timing is deterministic: the ancillary feeds walk the
//! 1s/2s/4s/8s/16s ladder and give up, chat retries forever, `close()`
//! cancels pending reconnects, and malformed frames never take the
//! channel down.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::time::{advance, Duration};

use matcha_client_core::session::Session;
use matcha_client_core::types::{ChannelState, ChatId, UserId};
use matcha_client_core::wire::{
    ChatMessage, ChatSend, LocationUpdate, Notification, OutboundEvent, StatusUpdate,
};
use matcha_client_core::RealtimeConfig;
use matcha_client_realtime::{
    open_with, ChannelHandle, ChannelHandler, Connector, Endpoint, Link, RealtimeError,
};

// ----------------------------------------------------------------------------
// Scripted Transport
// ----------------------------------------------------------------------------

/// What one connection attempt should do
enum Outcome {
    /// Refuse the connection
    Refuse,
    /// Serve the scripted frames; then hold the link open or hang up
    Serve {
        frames: Vec<String>,
        hold_open: bool,
    },
}

/// Connector that replays a script of connection outcomes.
/// Attempts beyond the script are refused.
#[derive(Clone, Default)]
struct ScriptConnector {
    attempts: Arc<AtomicU32>,
    outcomes: Arc<Mutex<VecDeque<Outcome>>>,
    sent: Arc<Mutex<Vec<String>>>,
}

impl ScriptConnector {
    fn refusing() -> Self {
        Self::default()
    }

    fn push(&self, outcome: Outcome) -> &Self {
        self.outcomes.lock().unwrap().push_back(outcome);
        self
    }

    fn serving(frames: &[&str], hold_open: bool) -> Self {
        let connector = Self::default();
        connector.push(Outcome::Serve {
            frames: frames.iter().map(|s| s.to_string()).collect(),
            hold_open,
        });
        connector
    }

    fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Connector for ScriptConnector {
    type Link = ScriptLink;

    async fn connect(&self, _endpoint: &Endpoint) -> Result<ScriptLink, RealtimeError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        match self.outcomes.lock().unwrap().pop_front() {
            Some(Outcome::Serve { frames, hold_open }) => Ok(ScriptLink {
                frames: frames.into(),
                hold_open,
                sent: Arc::clone(&self.sent),
            }),
            Some(Outcome::Refuse) | None => {
                Err(RealtimeError::connect_failed("connection refused"))
            }
        }
    }
}

struct ScriptLink {
    frames: VecDeque<String>,
    hold_open: bool,
    sent: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl Link for ScriptLink {
    async fn send_text(&mut self, text: String) -> Result<(), RealtimeError> {
        self.sent.lock().unwrap().push(text);
        Ok(())
    }

    async fn next_text(&mut self) -> Option<Result<String, RealtimeError>> {
        // Pop synchronously so a cancelled poll never loses a frame
        if let Some(frame) = self.frames.pop_front() {
            return Some(Ok(frame));
        }
        if self.hold_open {
            futures::future::pending::<()>().await;
        }
        None
    }

    async fn close(&mut self) {}
}

// ----------------------------------------------------------------------------
// Recording Handler
// ----------------------------------------------------------------------------

#[derive(Clone, Default)]
struct RecordingHandler {
    opens: Arc<AtomicU32>,
    messages: Arc<Mutex<Vec<ChatMessage>>>,
    notifications: Arc<Mutex<Vec<Notification>>>,
    locations: Arc<Mutex<Vec<LocationUpdate>>>,
    statuses: Arc<Mutex<Vec<StatusUpdate>>>,
    errors: Arc<Mutex<Vec<String>>>,
}

impl RecordingHandler {
    fn opens(&self) -> u32 {
        self.opens.load(Ordering::SeqCst)
    }

    fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }

    fn location_count(&self) -> usize {
        self.locations.lock().unwrap().len()
    }
}

impl ChannelHandler for RecordingHandler {
    fn on_open(&mut self) {
        self.opens.fetch_add(1, Ordering::SeqCst);
    }

    fn on_message(&mut self, message: ChatMessage) {
        self.messages.lock().unwrap().push(message);
    }

    fn on_notification(&mut self, notification: Notification) {
        self.notifications.lock().unwrap().push(notification);
    }

    fn on_location(&mut self, update: LocationUpdate) {
        self.locations.lock().unwrap().push(update);
    }

    fn on_status(&mut self, update: StatusUpdate) {
        self.statuses.lock().unwrap().push(update);
    }

    fn on_error(&mut self, diagnostic: &str) {
        self.errors.lock().unwrap().push(diagnostic.to_string());
    }
}

// ----------------------------------------------------------------------------
// Helpers
// ----------------------------------------------------------------------------

fn base() -> url::Url {
    url::Url::parse("ws://localhost:8000").unwrap()
}

/// Route channel logs through the test harness; safe to call repeatedly
fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Spin the scheduler without letting the test clock advance
async fn spin() {
    for _ in 0..64 {
        tokio::task::yield_now().await;
    }
}

/// Park until the channel reports `Open`; the paused clock auto-advances
/// through any scheduled backoff while we wait
async fn wait_until_open(handle: &ChannelHandle) {
    let mut states = handle.state_changes();
    tokio::time::timeout(Duration::from_secs(600), async {
        loop {
            if *states.borrow_and_update() == ChannelState::Open {
                return;
            }
            states.changed().await.expect("channel task vanished");
        }
    })
    .await
    .expect("channel never opened");
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn feed_gives_up_after_attempt_budget() {
    init_tracing();
    let connector = ScriptConnector::refusing();
    let handler = RecordingHandler::default();
    let endpoint = Endpoint::notifications(base(), UserId::new(1));

    let handle = open_with(
        connector.clone(),
        endpoint,
        handler.clone(),
        RealtimeConfig::default(),
    );
    handle.wait_until_closed().await;

    // Initial attempt plus the five backoff retries; a sixth retry is never
    // scheduled
    assert_eq!(connector.attempts(), 6);
    assert_eq!(handle.state(), ChannelState::Closed);

    let errors = handler.errors();
    assert!(errors
        .last()
        .unwrap()
        .contains("gave up after 5 attempts"));
}

#[tokio::test(start_paused = true)]
async fn close_cancels_pending_reconnect() {
    let connector = ScriptConnector::refusing();
    let handler = RecordingHandler::default();
    let endpoint = Endpoint::notifications(base(), UserId::new(2));

    let handle = open_with(
        connector.clone(),
        endpoint,
        handler.clone(),
        RealtimeConfig::default(),
    );

    // Let the first attempt fail and the 1s backoff get scheduled, without
    // letting the clock move
    while connector.attempts() == 0 {
        tokio::task::yield_now().await;
    }
    spin().await;
    assert_eq!(connector.attempts(), 1);

    handle.close();
    handle.close(); // idempotent
    handle.wait_until_closed().await;

    // Even well past every backoff delay, no new attempt occurs
    advance(Duration::from_secs(120)).await;
    spin().await;
    assert_eq!(connector.attempts(), 1);
    assert_eq!(handle.state(), ChannelState::Closed);
}

#[tokio::test(start_paused = true)]
async fn chat_reconnects_past_the_feed_budget() {
    let connector = ScriptConnector::refusing();
    for _ in 0..8 {
        connector.push(Outcome::Refuse);
    }
    connector.push(Outcome::Serve {
        frames: vec![],
        hold_open: true,
    });
    let handler = RecordingHandler::default();
    let endpoint = Endpoint::chat(base(), ChatId::new(10));

    let handle = open_with(
        connector.clone(),
        endpoint,
        handler.clone(),
        RealtimeConfig::default(),
    );
    wait_until_open(&handle).await;

    // Eight refusals never exhaust a chat channel
    assert_eq!(connector.attempts(), 9);
    assert_eq!(handler.opens(), 1);

    handle.close();
    handle.wait_until_closed().await;
}

#[tokio::test(start_paused = true)]
async fn malformed_frame_is_isolated_per_frame() {
    let connector = ScriptConnector::serving(
        &[
            "this is not json",
            r#"{"type": "location_update", "user_id": 4, "latitude": 48.85, "longitude": 2.35, "is_online": true}"#,
        ],
        true,
    );
    let handler = RecordingHandler::default();
    let session = Session::new(UserId::new(4), "token");
    let endpoint = Endpoint::map(base(), &session);

    let handle = open_with(
        connector.clone(),
        endpoint,
        handler.clone(),
        RealtimeConfig::default(),
    );
    wait_until_open(&handle).await;
    spin().await;

    // Exactly one location delivered; the bad frame neither crashed nor
    // closed the channel, and produced no handler error
    assert_eq!(handler.location_count(), 1);
    assert_eq!(handle.state(), ChannelState::Open);
    assert!(handler.errors().is_empty());

    handle.close();
    handle.wait_until_closed().await;
}

#[tokio::test(start_paused = true)]
async fn unknown_map_tag_is_ignored_without_error() {
    let connector = ScriptConnector::serving(
        &[
            r#"{"type": "connected"}"#,
            r#"{"type": "presence_wave", "user_id": 1}"#,
            r#"{"type": "status_update", "user_id": 4, "is_online": false}"#,
        ],
        true,
    );
    let handler = RecordingHandler::default();
    let session = Session::new(UserId::new(4), "token");
    let endpoint = Endpoint::map(base(), &session);

    let handle = open_with(
        connector,
        endpoint,
        handler.clone(),
        RealtimeConfig::default(),
    );
    wait_until_open(&handle).await;
    spin().await;

    assert_eq!(handler.statuses.lock().unwrap().len(), 1);
    assert!(handler.errors().is_empty());

    handle.close();
    handle.wait_until_closed().await;
}

#[tokio::test(start_paused = true)]
async fn independent_channels_keep_independent_retry_state() {
    let failing = ScriptConnector::refusing();
    let serving = ScriptConnector::serving(&[], true);
    let handler_a = RecordingHandler::default();
    let handler_b = RecordingHandler::default();

    let handle_a = open_with(
        failing.clone(),
        Endpoint::notifications(base(), UserId::new(1)),
        handler_a.clone(),
        RealtimeConfig::default(),
    );
    let handle_b = open_with(
        serving.clone(),
        Endpoint::chat(base(), ChatId::new(2)),
        handler_b.clone(),
        RealtimeConfig::default(),
    );

    wait_until_open(&handle_b).await;
    handle_a.wait_until_closed().await;

    // A burned through its budget without touching B's counters
    assert_eq!(failing.attempts(), 6);
    assert_eq!(serving.attempts(), 1);
    assert_eq!(handle_b.state(), ChannelState::Open);

    handle_b.close();
    handle_b.wait_until_closed().await;
}

#[tokio::test(start_paused = true)]
async fn send_transmits_on_open_chat_channel() {
    let connector = ScriptConnector::serving(&[], true);
    let handler = RecordingHandler::default();
    let endpoint = Endpoint::chat(base(), ChatId::new(3));

    let handle = open_with(
        connector.clone(),
        endpoint,
        handler,
        RealtimeConfig::default(),
    );
    wait_until_open(&handle).await;

    handle.send(OutboundEvent::Message(ChatSend {
        sender_id: UserId::new(1),
        content: "oi".to_string(),
    }));
    spin().await;

    let sent = connector.sent();
    assert_eq!(sent.len(), 1);
    let frame: serde_json::Value = serde_json::from_str(&sent[0]).unwrap();
    assert_eq!(frame["sender_id"], 1);
    assert_eq!(frame["content"], "oi");

    handle.close();
    handle.wait_until_closed().await;

    // Sending after close is silently dropped
    handle.send(OutboundEvent::Message(ChatSend {
        sender_id: UserId::new(1),
        content: "lost".to_string(),
    }));
    spin().await;
    assert_eq!(connector.sent().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn map_channel_pings_on_keepalive_interval() {
    let connector = ScriptConnector::serving(&[], true);
    let handler = RecordingHandler::default();
    let session = Session::new(UserId::new(9), "token");
    let endpoint = Endpoint::map(base(), &session);

    let handle = open_with(
        connector.clone(),
        endpoint,
        handler,
        RealtimeConfig::default(),
    );
    wait_until_open(&handle).await;

    advance(Duration::from_secs(31)).await;
    spin().await;

    let pings: Vec<_> = connector
        .sent()
        .into_iter()
        .filter(|raw| raw.contains("\"ping\""))
        .collect();
    assert!(!pings.is_empty());

    handle.close();
    handle.wait_until_closed().await;
}

#[tokio::test(start_paused = true)]
async fn server_error_frame_reaches_on_error() {
    let connector = ScriptConnector::serving(&[r#"{"error": "not a participant"}"#], true);
    let handler = RecordingHandler::default();
    let endpoint = Endpoint::chat(base(), ChatId::new(5));

    let handle = open_with(
        connector,
        endpoint,
        handler.clone(),
        RealtimeConfig::default(),
    );
    wait_until_open(&handle).await;
    spin().await;

    assert_eq!(handler.errors(), vec!["not a participant".to_string()]);
    assert_eq!(handle.state(), ChannelState::Open);

    handle.close();
    handle.wait_until_closed().await;
}

#[tokio::test(start_paused = true)]
async fn server_hangup_triggers_reconnect_and_redelivery() {
    init_tracing();
    let connector = ScriptConnector::default();
    connector.push(Outcome::Serve {
        frames: vec![
            r#"{"chat_id": 1, "sender_id": 2, "content": "first", "sent_at": "t1"}"#.to_string(),
        ],
        hold_open: false,
    });
    connector.push(Outcome::Serve {
        frames: vec![
            r#"{"chat_id": 1, "sender_id": 2, "content": "second", "sent_at": "t2"}"#.to_string(),
        ],
        hold_open: true,
    });
    let handler = RecordingHandler::default();
    let endpoint = Endpoint::chat(base(), ChatId::new(1));

    let handle = open_with(
        connector.clone(),
        endpoint,
        handler.clone(),
        RealtimeConfig::default(),
    );

    let mut states = handle.state_changes();
    tokio::time::timeout(Duration::from_secs(600), async {
        loop {
            if handler.opens() >= 2 {
                return;
            }
            states.changed().await.expect("channel task vanished");
        }
    })
    .await
    .expect("channel never reconnected");
    spin().await;

    assert_eq!(connector.attempts(), 2);
    let contents: Vec<String> = handler
        .messages
        .lock()
        .unwrap()
        .iter()
        .map(|m| m.content.clone())
        .collect();
    assert_eq!(contents, vec!["first".to_string(), "second".to_string()]);

    handle.close();
    handle.wait_until_closed().await;
}
