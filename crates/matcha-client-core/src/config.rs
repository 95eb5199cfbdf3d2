//! Centralized configuration for the Matcha client
//!
//! Consolidates the tunables of the realtime layer and the swipe gesture
//! machine so screens construct one value and pass it down, instead of
//! reading ambient globals.

use core::time::Duration;

use crate::errors::ConfigError;
use crate::retry::RetryPolicy;
use crate::types::ChannelKind;

// ----------------------------------------------------------------------------
// Realtime Configuration
// ----------------------------------------------------------------------------

/// Configuration for realtime channels
#[derive(Debug, Clone)]
pub struct RealtimeConfig {
    /// Reconnect policy for chat channels
    pub chat_retry: RetryPolicy,
    /// Reconnect policy for the notification and map feeds
    pub feed_retry: RetryPolicy,
    /// Keepalive ping period for the map channel; `None` disables pings
    pub map_keepalive: Option<Duration>,
    /// Bound on a single connection attempt; `None` waits indefinitely
    pub connect_timeout: Option<Duration>,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            chat_retry: RetryPolicy::chat(),
            feed_retry: RetryPolicy::ancillary_feed(),
            map_keepalive: Some(Duration::from_secs(30)),
            connect_timeout: Some(Duration::from_secs(10)),
        }
    }
}

impl RealtimeConfig {
    /// Reconnect policy for a channel kind
    pub fn retry_policy(&self, kind: ChannelKind) -> RetryPolicy {
        match kind {
            ChannelKind::Chat => self.chat_retry.clone(),
            ChannelKind::Notifications | ChannelKind::Map => self.feed_retry.clone(),
        }
    }

    /// Keepalive period for a channel kind, if any.
    ///
    /// Only the map feed pings; chat and notification sockets are kept
    /// alive by the transport itself.
    pub fn keepalive(&self, kind: ChannelKind) -> Option<Duration> {
        match kind {
            ChannelKind::Map => self.map_keepalive,
            ChannelKind::Chat | ChannelKind::Notifications => None,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(period) = self.map_keepalive {
            if period.is_zero() {
                return Err(ConfigError::invalid("map_keepalive", "must be non-zero"));
            }
        }
        if let Some(timeout) = self.connect_timeout {
            if timeout.is_zero() {
                return Err(ConfigError::invalid("connect_timeout", "must be non-zero"));
            }
        }
        for policy in [&self.chat_retry, &self.feed_retry] {
            if let RetryPolicy::FixedInterval { interval } = policy {
                if interval.is_zero() {
                    return Err(ConfigError::invalid("retry interval", "must be non-zero"));
                }
            }
        }
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Gesture Configuration
// ----------------------------------------------------------------------------

/// Configuration for the swipe gesture machine.
///
/// Defaults mirror the shipped card UI: a 50 px commit threshold, rotation at
/// a tenth of a degree per pixel, opacity fading over 300 px down to a 0.3
/// floor, and a 300 ms exit animation.
#[derive(Debug, Clone, PartialEq)]
pub struct GestureConfig {
    /// Horizontal distance (px) a release must reach to commit a decision
    pub commit_threshold: f32,
    /// Degrees of card rotation per pixel of drag
    pub rotation_factor: f32,
    /// Drag distance (px) over which the card fades toward `min_opacity`
    pub fade_distance: f32,
    /// Opacity floor while dragging
    pub min_opacity: f32,
    /// Horizontal translation (px) of the exit pose, enough to clear any viewport
    pub exit_distance: f32,
    /// Rotation (degrees) of the exit pose
    pub exit_rotation: f32,
    /// Duration of the exit animation before the advance callback fires
    pub exit_duration: Duration,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            commit_threshold: 50.0,
            rotation_factor: 0.1,
            fade_distance: 300.0,
            min_opacity: 0.3,
            exit_distance: 1000.0,
            exit_rotation: 30.0,
            exit_duration: Duration::from_millis(300),
        }
    }
}

impl GestureConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.commit_threshold <= 0.0 {
            return Err(ConfigError::invalid("commit_threshold", "must be positive"));
        }
        if self.fade_distance <= 0.0 {
            return Err(ConfigError::invalid("fade_distance", "must be positive"));
        }
        if !(0.0..=1.0).contains(&self.min_opacity) {
            return Err(ConfigError::invalid("min_opacity", "must be within [0, 1]"));
        }
        if self.exit_distance <= 0.0 {
            return Err(ConfigError::invalid("exit_distance", "must be positive"));
        }
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        RealtimeConfig::default().validate().unwrap();
        GestureConfig::default().validate().unwrap();
    }

    #[test]
    fn test_keepalive_only_for_map() {
        let config = RealtimeConfig::default();
        assert!(config.keepalive(ChannelKind::Map).is_some());
        assert!(config.keepalive(ChannelKind::Chat).is_none());
        assert!(config.keepalive(ChannelKind::Notifications).is_none());
    }

    #[test]
    fn test_retry_policy_selection() {
        let config = RealtimeConfig::default();
        assert!(!config.retry_policy(ChannelKind::Chat).is_bounded());
        assert!(config.retry_policy(ChannelKind::Notifications).is_bounded());
        assert!(config.retry_policy(ChannelKind::Map).is_bounded());
    }

    #[test]
    fn test_invalid_gesture_config_rejected() {
        let mut config = GestureConfig::default();
        config.commit_threshold = 0.0;
        assert!(config.validate().is_err());

        let mut config = GestureConfig::default();
        config.min_opacity = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_realtime_config_rejected() {
        let mut config = RealtimeConfig::default();
        config.map_keepalive = Some(Duration::ZERO);
        assert!(config.validate().is_err());
    }
}
