//! Realtime channel manager
//!
//! One tokio task per channel owns the underlying link exclusively and runs
//! the connect/dispatch/reconnect loop. The owning screen talks to the task
//! through a [`ChannelHandle`]: `send` is fire-and-forget, `close` is
//! idempotent and cancels any pending reconnect, and the channel state is
//! observable through a watch cell for connection-status indicators.
//!
//! Reconnection follows the per-kind policy from
//! [`RealtimeConfig`](matcha_client_core::RealtimeConfig): chat channels
//! retry forever at a fixed interval, the notification and map feeds back
//! off exponentially and give up after their attempt budget, surfacing the
//! failure through `on_error`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::time::Duration;
use tracing::{debug, info, warn};

use matcha_client_core::config::RealtimeConfig;
use matcha_client_core::types::ChannelState;
use matcha_client_core::wire::{
    decode_inbound, ChatMessage, InboundEvent, LocationUpdate, Notification, OutboundEvent,
    StatusUpdate,
};

use crate::endpoint::Endpoint;
use crate::errors::RealtimeError;
use crate::link::{Connector, Link, WsConnector};

// ----------------------------------------------------------------------------
// Channel Handler
// ----------------------------------------------------------------------------

/// Subscriber callbacks for one channel, keyed by event tag.
///
/// Every method has a no-op default so subscribers implement only the tags
/// their channel kind delivers. Callbacks fire only for successfully parsed
/// events with known tags, in the order frames arrived on the link.
pub trait ChannelHandler: Send + 'static {
    /// The link came up (fires again after every successful reconnect)
    fn on_open(&mut self) {}

    /// Chat: a message arrived in the conversation
    fn on_message(&mut self, message: ChatMessage) {
        let _ = message;
    }

    /// Notifications: a notification arrived for the user
    fn on_notification(&mut self, notification: Notification) {
        let _ = notification;
    }

    /// Map: a nearby user moved or changed presence
    fn on_location(&mut self, update: LocationUpdate) {
        let _ = update;
    }

    /// Map: a nearby user went online or offline
    fn on_status(&mut self, update: StatusUpdate) {
        let _ = update;
    }

    /// A one-line diagnostic: connection failure, server-reported error, or
    /// an exhausted retry budget
    fn on_error(&mut self, diagnostic: &str) {
        let _ = diagnostic;
    }
}

// ----------------------------------------------------------------------------
// Channel Handle
// ----------------------------------------------------------------------------

enum Command {
    Send(OutboundEvent),
    Close,
}

/// Owner-side handle to a realtime channel.
///
/// Dropping the handle closes the channel, so a screen that holds it for its
/// lifetime gets cleanup on unmount for free.
pub struct ChannelHandle {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<ChannelState>,
    detached: Arc<AtomicBool>,
    endpoint: Endpoint,
}

impl ChannelHandle {
    /// Queue one outbound event for transmission.
    ///
    /// Fire-and-forget: if the channel is not currently open the frame is
    /// logged and dropped. Callers must not assume delivery.
    pub fn send(&self, event: OutboundEvent) {
        if self.detached.load(Ordering::SeqCst) {
            debug!(endpoint = %self.endpoint, "dropping outbound frame on closed channel");
            return;
        }
        if !self.state.borrow().is_open() {
            debug!(endpoint = %self.endpoint, "channel not open; dropping outbound frame");
            return;
        }
        if self.commands.send(Command::Send(event)).is_err() {
            debug!(endpoint = %self.endpoint, "channel task is gone; outbound frame dropped");
        }
    }

    /// Close the channel: detach the handler, cancel any pending reconnect,
    /// release the link. Idempotent.
    ///
    /// The handler is detached before this returns; the detach flag is
    /// checked immediately before every callback invocation, so frames
    /// already in flight are dropped rather than delivered.
    pub fn close(&self) {
        if self.detached.swap(true, Ordering::SeqCst) {
            return;
        }
        info!(endpoint = %self.endpoint, "closing realtime channel");
        let _ = self.commands.send(Command::Close);
    }

    /// Current channel state
    pub fn state(&self) -> ChannelState {
        if self.detached.load(Ordering::SeqCst) {
            ChannelState::Closed
        } else {
            *self.state.borrow()
        }
    }

    /// A watch receiver over state transitions, for status indicators
    pub fn state_changes(&self) -> watch::Receiver<ChannelState> {
        self.state.clone()
    }

    /// Wait until the channel task has fully stopped
    pub async fn wait_until_closed(&self) {
        let mut state = self.state.clone();
        loop {
            if *state.borrow_and_update() == ChannelState::Closed {
                return;
            }
            if state.changed().await.is_err() {
                return;
            }
        }
    }

    /// The endpoint this channel is bound to
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }
}

impl Drop for ChannelHandle {
    fn drop(&mut self) {
        self.close();
    }
}

// ----------------------------------------------------------------------------
// Opening Channels
// ----------------------------------------------------------------------------

/// Open a realtime channel over the production WebSocket binding.
///
/// Spawns the channel task immediately; must be called within a tokio
/// runtime.
pub fn open<H>(endpoint: Endpoint, handler: H, config: RealtimeConfig) -> ChannelHandle
where
    H: ChannelHandler,
{
    open_with(WsConnector::new(), endpoint, handler, config)
}

/// Open a realtime channel over a caller-supplied connector
pub fn open_with<C, H>(
    connector: C,
    endpoint: Endpoint,
    handler: H,
    config: RealtimeConfig,
) -> ChannelHandle
where
    C: Connector,
    H: ChannelHandler,
{
    let (commands, command_rx) = mpsc::unbounded_channel();
    let (state_tx, state_rx) = watch::channel(ChannelState::Connecting);
    let detached = Arc::new(AtomicBool::new(false));

    let task = ChannelTask {
        connector,
        endpoint: endpoint.clone(),
        handler,
        config,
        commands: command_rx,
        state: state_tx,
        detached: Arc::clone(&detached),
        attempt: 0,
    };
    tokio::spawn(task.run());

    ChannelHandle {
        commands,
        state: state_rx,
        detached,
        endpoint,
    }
}

// ----------------------------------------------------------------------------
// Channel Task
// ----------------------------------------------------------------------------

enum Disconnect {
    /// The owner asked for the channel to close
    Requested,
    /// The link died or the server hung up; reconnect policy applies
    LinkLost,
}

struct ChannelTask<C: Connector, H: ChannelHandler> {
    connector: C,
    endpoint: Endpoint,
    handler: H,
    config: RealtimeConfig,
    commands: mpsc::UnboundedReceiver<Command>,
    state: watch::Sender<ChannelState>,
    detached: Arc<AtomicBool>,
    attempt: u32,
}

impl<C: Connector, H: ChannelHandler> ChannelTask<C, H> {
    async fn run(mut self) {
        let policy = self.config.retry_policy(self.endpoint.kind());
        debug!(endpoint = %self.endpoint, "realtime channel task started");

        loop {
            if self.detached.load(Ordering::SeqCst) {
                break;
            }

            match self.connect().await {
                Ok(link) => {
                    self.attempt = 0;
                    self.set_state(ChannelState::Open);
                    info!(endpoint = %self.endpoint, "realtime channel open");
                    self.emit(|handler| handler.on_open());

                    if let Disconnect::Requested = self.drive(link).await {
                        break;
                    }
                }
                Err(err) => {
                    warn!(endpoint = %self.endpoint, %err, "connection attempt failed");
                    let diagnostic = err.to_string();
                    self.emit(|handler| handler.on_error(&diagnostic));
                }
            }

            match policy.next_delay(self.attempt) {
                Some(delay) => {
                    self.attempt += 1;
                    self.set_state(ChannelState::Reconnecting);
                    debug!(
                        endpoint = %self.endpoint,
                        attempt = self.attempt,
                        delay_ms = delay.as_millis() as u64,
                        "scheduling reconnect"
                    );
                    if !self.wait_for_retry(delay).await {
                        break;
                    }
                }
                None => {
                    let diagnostic = format!(
                        "realtime connection lost; gave up after {} attempts",
                        self.attempt
                    );
                    warn!(endpoint = %self.endpoint, "{}", diagnostic);
                    self.emit(|handler| handler.on_error(&diagnostic));
                    break;
                }
            }
        }

        self.detached.store(true, Ordering::SeqCst);
        self.set_state(ChannelState::Closed);
        debug!(endpoint = %self.endpoint, "realtime channel task stopped");
    }

    /// One connection attempt, bounded by the configured timeout
    async fn connect(&mut self) -> Result<C::Link, RealtimeError> {
        match self.config.connect_timeout {
            Some(timeout) => {
                tokio::time::timeout(timeout, self.connector.connect(&self.endpoint))
                    .await
                    .map_err(|_| RealtimeError::ConnectTimeout {
                        timeout_ms: timeout.as_millis() as u64,
                    })?
            }
            None => self.connector.connect(&self.endpoint).await,
        }
    }

    /// Pump one live link until it dies or the owner closes the channel
    async fn drive(&mut self, mut link: C::Link) -> Disconnect {
        let mut keepalive = self
            .config
            .keepalive(self.endpoint.kind())
            .map(|period| tokio::time::interval_at(tokio::time::Instant::now() + period, period));

        loop {
            tokio::select! {
                biased;

                command = self.commands.recv() => match command {
                    Some(Command::Send(event)) => self.transmit(&mut link, event).await,
                    Some(Command::Close) | None => {
                        link.close().await;
                        return Disconnect::Requested;
                    }
                },

                frame = link.next_text() => match frame {
                    Some(Ok(text)) => self.dispatch(&text),
                    Some(Err(err)) => {
                        warn!(endpoint = %self.endpoint, %err, "realtime link failed");
                        let diagnostic = err.to_string();
                        self.emit(|handler| handler.on_error(&diagnostic));
                        return Disconnect::LinkLost;
                    }
                    None => {
                        info!(endpoint = %self.endpoint, "realtime link closed by server");
                        return Disconnect::LinkLost;
                    }
                },

                _ = keepalive_tick(keepalive.as_mut()) => {
                    self.transmit(&mut link, OutboundEvent::Ping).await;
                }
            }
        }
    }

    /// Sleep out a reconnect delay; returns false if the owner closed the
    /// channel during the wait (the pending reconnect is cancelled with it)
    async fn wait_for_retry(&mut self, delay: Duration) -> bool {
        let sleep = tokio::time::sleep(delay);
        tokio::pin!(sleep);
        loop {
            tokio::select! {
                biased;

                command = self.commands.recv() => match command {
                    Some(Command::Send(_)) => {
                        debug!(endpoint = %self.endpoint, "channel not open; dropping outbound frame");
                    }
                    Some(Command::Close) | None => return false,
                },

                _ = &mut sleep => return true,
            }
        }
    }

    /// Serialize and transmit one outbound event, best effort
    async fn transmit(&mut self, link: &mut C::Link, event: OutboundEvent) {
        let raw = match event.encode() {
            Ok(raw) => raw,
            Err(err) => {
                warn!(endpoint = %self.endpoint, %err, "failed to encode outbound frame");
                return;
            }
        };
        if let Err(err) = link.send_text(raw).await {
            // The read half will notice a dead link; sending stays best effort
            warn!(endpoint = %self.endpoint, %err, "failed to transmit outbound frame");
        }
    }

    /// Decode one inbound frame and deliver it. Failures are isolated to the
    /// frame: the link keeps running.
    fn dispatch(&mut self, raw: &str) {
        match decode_inbound(self.endpoint.kind(), raw) {
            Ok(event) => self.deliver(event),
            Err(err) if err.is_unknown_tag() => {
                debug!(endpoint = %self.endpoint, %err, "ignoring frame with unknown tag");
            }
            Err(err) => {
                warn!(endpoint = %self.endpoint, %err, "dropping malformed frame");
            }
        }
    }

    fn deliver(&mut self, event: InboundEvent) {
        match event {
            InboundEvent::Message(message) => self.emit(|handler| handler.on_message(message)),
            InboundEvent::Notification(notification) => {
                self.emit(|handler| handler.on_notification(notification))
            }
            InboundEvent::Location(update) => self.emit(|handler| handler.on_location(update)),
            InboundEvent::Status(update) => self.emit(|handler| handler.on_status(update)),
            InboundEvent::Connected => {
                debug!(endpoint = %self.endpoint, "server acknowledged subscription");
            }
            InboundEvent::Pong => {
                debug!(endpoint = %self.endpoint, "keepalive pong");
            }
            InboundEvent::ServerError { message } => {
                warn!(endpoint = %self.endpoint, error = %message, "server reported channel error");
                self.emit(|handler| handler.on_error(&message));
            }
        }
    }

    /// Invoke a handler callback unless the owner has closed the channel
    fn emit(&mut self, deliver: impl FnOnce(&mut H)) {
        if !self.detached.load(Ordering::SeqCst) {
            deliver(&mut self.handler);
        }
    }

    fn set_state(&self, state: ChannelState) {
        let _ = self.state.send(state);
    }
}

/// Await the next keepalive tick, or forever if keepalive is disabled
async fn keepalive_tick(keepalive: Option<&mut tokio::time::Interval>) {
    match keepalive {
        Some(interval) => {
            interval.tick().await;
        }
        None => futures::future::pending().await,
    }
}
