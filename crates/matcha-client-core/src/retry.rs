//! Reconnect policy for realtime channels
//!
//! Two shapes, matching the two product behaviors: the ancillary feeds
//! (notifications, map) back off exponentially and eventually give up, while
//! chat retries forever at a fixed interval because a conversation window may
//! stay open indefinitely.

use core::time::Duration;

use crate::types::ChannelKind;

/// Delay of the first exponential backoff step
const BACKOFF_BASE: Duration = Duration::from_millis(1000);
/// Upper bound on any single backoff delay
const BACKOFF_CAP: Duration = Duration::from_millis(30_000);
/// Reconnect budget for the ancillary feeds
const FEED_MAX_ATTEMPTS: u32 = 5;
/// Fixed retry interval for chat channels
const CHAT_RETRY_INTERVAL: Duration = Duration::from_millis(3000);

// ----------------------------------------------------------------------------
// Retry Policy
// ----------------------------------------------------------------------------

/// Per-channel reconnect schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryPolicy {
    /// Delay `min(base * 2^attempt, cap)`, giving up after `max_attempts`
    ExponentialBackoff {
        base: Duration,
        cap: Duration,
        max_attempts: u32,
    },
    /// Retry forever at a fixed interval
    FixedInterval { interval: Duration },
}

impl RetryPolicy {
    /// Policy for chat channels: unconditional retry every 3 seconds
    pub fn chat() -> Self {
        RetryPolicy::FixedInterval {
            interval: CHAT_RETRY_INTERVAL,
        }
    }

    /// Policy for notification and map feeds: 1s, 2s, 4s, 8s, 16s, then stop
    pub fn ancillary_feed() -> Self {
        RetryPolicy::ExponentialBackoff {
            base: BACKOFF_BASE,
            cap: BACKOFF_CAP,
            max_attempts: FEED_MAX_ATTEMPTS,
        }
    }

    /// Default policy for a channel kind
    pub fn for_kind(kind: ChannelKind) -> Self {
        match kind {
            ChannelKind::Chat => Self::chat(),
            ChannelKind::Notifications | ChannelKind::Map => Self::ancillary_feed(),
        }
    }

    /// Delay before reconnect attempt number `attempt` (starting at 0).
    ///
    /// Returns `None` once the budget is exhausted; the channel must then
    /// stop retrying and surface the failure.
    pub fn next_delay(&self, attempt: u32) -> Option<Duration> {
        match self {
            RetryPolicy::FixedInterval { interval } => Some(*interval),
            RetryPolicy::ExponentialBackoff {
                base,
                cap,
                max_attempts,
            } => {
                if attempt >= *max_attempts {
                    return None;
                }
                let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
                let delay = base.checked_mul(factor).unwrap_or(*cap);
                Some(delay.min(*cap))
            }
        }
    }

    /// Whether this policy ever stops retrying
    pub fn is_bounded(&self) -> bool {
        matches!(self, RetryPolicy::ExponentialBackoff { .. })
    }

    /// The attempt budget, if bounded
    pub fn max_attempts(&self) -> Option<u32> {
        match self {
            RetryPolicy::ExponentialBackoff { max_attempts, .. } => Some(*max_attempts),
            RetryPolicy::FixedInterval { .. } => None,
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
