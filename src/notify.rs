//! Notification sink abstraction.
//!
//! The realtime service never renders anything itself. User-visible toasts
//! (connection lost, safety alerts, discoveries) go through the
//! [`NotificationSink`] trait so the embedding application decides how to
//! display them.

use std::time::Duration;

use tracing::{error, info, warn};

/// Visual category of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Info,
    Warning,
    Error,
}

impl NotificationKind {
    /// Parse a kind from a wire-level `type` string. Unknown values map to
    /// `Info`, matching the backend's loose typing.
    pub fn parse(s: &str) -> Self {
        match s {
            "success" => NotificationKind::Success,
            "warning" => NotificationKind::Warning,
            "error" => NotificationKind::Error,
            _ => NotificationKind::Info,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Success => "success",
            NotificationKind::Info => "info",
            NotificationKind::Warning => "warning",
            NotificationKind::Error => "error",
        }
    }
}

/// Destination for user-visible notifications.
///
/// Implementations must not block: the sink is invoked from the connection
/// supervisor task. Fire-and-forget only, no result is expected.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, message: &str, kind: NotificationKind, duration: Duration);
}

/// Sink that forwards notifications to the tracing log.
///
/// Used by the headless binary; embedding UIs provide their own sink.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn notify(&self, message: &str, kind: NotificationKind, _duration: Duration) {
        match kind {
            NotificationKind::Error => error!(kind = kind.as_str(), "{message}"),
            NotificationKind::Warning => warn!(kind = kind.as_str(), "{message}"),
            _ => info!(kind = kind.as_str(), "{message}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_kinds() {
        assert_eq!(NotificationKind::parse("success"), NotificationKind::Success);
        assert_eq!(NotificationKind::parse("warning"), NotificationKind::Warning);
        assert_eq!(NotificationKind::parse("error"), NotificationKind::Error);
        assert_eq!(NotificationKind::parse("info"), NotificationKind::Info);
    }

    #[test]
    fn test_parse_unknown_kind_defaults_to_info() {
        assert_eq!(NotificationKind::parse("fancy"), NotificationKind::Info);
        assert_eq!(NotificationKind::parse(""), NotificationKind::Info);
    }

    #[test]
    fn test_as_str_roundtrip() {
        for kind in [
            NotificationKind::Success,
            NotificationKind::Info,
            NotificationKind::Warning,
            NotificationKind::Error,
        ] {
            assert_eq!(NotificationKind::parse(kind.as_str()), kind);
        }
    }
}
