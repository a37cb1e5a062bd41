//! Why a suspension was granted while services were already down.

use std::fmt;
use std::time::Duration;

use hostgate_model::ServiceInstance;

/// Ordered set of distinct reason messages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuspensionReasons {
    messages: Vec<String>,
}

impl SuspensionReasons {
    pub fn new() -> Self {
        Self::default()
    }

    /// No reasons worth reporting.
    pub fn nothing_noteworthy() -> Self {
        Self::new()
    }

    /// The instance is down and has no known down-since time.
    pub fn is_down(instance: &ServiceInstance) -> Self {
        let mut reasons = Self::new();
        reasons.add(format!("{} is down", instance.descriptive_name()));
        reasons
    }

    /// The instance has been down since `since` (unix seconds) for `duration`.
    pub fn down_since(instance: &ServiceInstance, since: u64, duration: Duration) -> Self {
        let mut reasons = Self::new();
        reasons.add(format!(
            "{} has been down since {} ({}s)",
            instance.descriptive_name(),
            since,
            duration.as_secs()
        ));
        reasons
    }

    /// Append a message unless it is already present.
    pub fn add(&mut self, message: impl Into<String>) {
        let message = message.into();
        if !self.messages.contains(&message) {
            self.messages.push(message);
        }
    }

    /// Append all of `other`'s messages, keeping the first occurrence of each.
    pub fn merge(&mut self, other: SuspensionReasons) {
        for message in other.messages {
            self.add(message);
        }
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// A log line for a grant, if anything noteworthy happened.
    pub fn log_message(&self) -> Option<String> {
        if self.is_empty() {
            None
        } else {
            Some(format!("Granted suspension although: {self}"))
        }
    }
}

impl fmt::Display for SuspensionReasons {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.messages.is_empty() {
            f.write_str("nothing noteworthy")
        } else {
            f.write_str(&self.messages.join(", "))
        }
    }
}
