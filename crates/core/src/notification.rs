//! Transient user-facing status line.
//!
//! A notification replaces whatever is showing and carries a generation number.
//! Expiry requests name the generation they were scheduled for, so a clear that
//! was scheduled for an older message never wipes a newer one.

use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Generation(pub u64);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub message: String,
    pub level: NotificationLevel,
    pub generation: Generation,
}

/// When to clear the notification that was just shown.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClearSchedule {
    pub generation: Generation,
    pub after: Duration,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationChannel {
    current: Option<Notification>,
    last_generation: Generation,
}

impl NotificationChannel {
    pub fn notify(
        &mut self,
        message: impl Into<String>,
        level: NotificationLevel,
        after: Duration,
    ) -> ClearSchedule {
        let generation = Generation(self.last_generation.0 + 1);
        self.last_generation = generation;
        self.current = Some(Notification { message: message.into(), level, generation });
        ClearSchedule { generation, after }
    }

    /// Clears the current notification if it is still the one `generation`
    /// refers to. Returns whether anything was cleared.
    pub fn expire(&mut self, generation: Generation) -> bool {
        match &self.current {
            Some(current) if current.generation == generation => {
                self.current = None;
                true
            }
            _ => false,
        }
    }

    pub fn current(&self) -> Option<&Notification> {
        self.current.as_ref()
    }

    pub fn message(&self) -> Option<&str> {
        self.current.as_ref().map(|notification| notification.message.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_none()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{NotificationChannel, NotificationLevel};

    #[test]
    fn starts_empty() {
        let channel = NotificationChannel::default();
        assert!(channel.is_empty());
        assert_eq!(channel.message(), None);
    }

    #[test]
    fn overwrite_then_both_expiries_leave_channel_empty_without_redisplay() {
        let mut channel = NotificationChannel::default();

        let first = channel.notify("A", NotificationLevel::Success, Duration::from_millis(5_000));
        let second = channel.notify("B", NotificationLevel::Info, Duration::from_millis(3_000));
        assert_eq!(channel.message(), Some("B"));
        assert_ne!(first.generation, second.generation);
        assert_eq!(second.after, Duration::from_millis(3_000));

        assert!(channel.expire(second.generation));
        assert!(channel.is_empty());

        assert!(!channel.expire(first.generation));
        assert!(channel.is_empty());
    }

    #[test]
    fn stale_expiry_does_not_clear_newer_message() {
        let mut channel = NotificationChannel::default();

        let first = channel.notify("A", NotificationLevel::Success, Duration::from_secs(5));
        channel.notify("B", NotificationLevel::Warning, Duration::from_secs(3));

        assert!(!channel.expire(first.generation));
        assert_eq!(channel.message(), Some("B"));
        assert_eq!(channel.current().map(|n| n.level), Some(NotificationLevel::Warning));
    }
}
