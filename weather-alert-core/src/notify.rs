use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::{convert::TryFrom, fmt::Debug};
use tracing::warn;

/// Message handed to a delivery channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub subject: String,
    pub body: String,
}

/// Delivery channel for alert notifications.
#[async_trait]
pub trait Notifier: Send + Sync + Debug {
    async fn send(&self, notification: &Notification) -> Result<()>;
}

/// Prints `subject body` to stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleNotifier;

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn send(&self, notification: &Notification) -> Result<()> {
        println!("{} {}", notification.subject, notification.body);
        Ok(())
    }
}

/// Emits each notification as a `tracing` warning.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, notification: &Notification) -> Result<()> {
        warn!(subject = %notification.subject, "{}", notification.body);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifierKind {
    #[default]
    Console,
    Log,
}

impl NotifierKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotifierKind::Console => "console",
            NotifierKind::Log => "log",
        }
    }

    pub const fn all() -> &'static [NotifierKind] {
        &[NotifierKind::Console, NotifierKind::Log]
    }

    pub fn build(&self) -> Box<dyn Notifier> {
        match self {
            NotifierKind::Console => Box::new(ConsoleNotifier),
            NotifierKind::Log => Box::new(LogNotifier),
        }
    }
}

impl std::fmt::Display for NotifierKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for NotifierKind {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "console" => Ok(NotifierKind::Console),
            "log" => Ok(NotifierKind::Log),
            _ => Err(anyhow!(
                "Unknown notifier '{value}'. Supported notifiers: console, log."
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notifier_kind_as_str_roundtrip() {
        for kind in NotifierKind::all() {
            let parsed = NotifierKind::try_from(kind.as_str()).expect("roundtrip should succeed");
            assert_eq!(*kind, parsed);
        }
    }

    #[test]
    fn unknown_notifier_error() {
        let err = NotifierKind::try_from("smtp").unwrap_err();
        assert!(err.to_string().contains("Unknown notifier"));
    }

    #[tokio::test]
    async fn built_notifiers_accept_notifications() {
        let n = Notification {
            subject: "Weather Alert: Rain Detected".into(),
            body: "Rain was detected on 2024-06-21 07:00:00+00:00.".into(),
        };
        for kind in NotifierKind::all() {
            kind.build().send(&n).await.unwrap();
        }
    }
}
