//! Deciding whether a service instance counts as down.

use std::time::Duration;

use hostgate_model::{HostName, HostStatus, HostStatusSnapshot, ServiceInstance, ServiceStatus};

use crate::reasons::SuspensionReasons;

/// How long an instance must have been down before it counts as down.
pub const DEFAULT_DOWN_MORATORIUM: Duration = Duration::from_secs(30);

/// Classifies instances as effectively down at a fixed evaluation time.
#[derive(Debug, Clone, Copy)]
pub struct DownClassifier<'a> {
    host_statuses: &'a HostStatusSnapshot,
    now: u64,
    moratorium: Duration,
}

impl<'a> DownClassifier<'a> {
    pub fn new(host_statuses: &'a HostStatusSnapshot, now: u64, moratorium: Duration) -> Self {
        Self {
            host_statuses,
            now,
            moratorium,
        }
    }

    pub fn host_status(&self, host: &HostName) -> HostStatus {
        self.host_statuses.status_of(host)
    }

    pub fn host_statuses(&self) -> &'a HostStatusSnapshot {
        self.host_statuses
    }

    pub fn now(&self) -> u64 {
        self.now
    }

    /// Why `instance` is effectively down, or `None` if it is not.
    ///
    /// An instance on a suspended host is down with nothing noteworthy. An
    /// instance reported down is down once the moratorium has passed since
    /// its down-since time, or immediately if that time is unknown.
    pub fn effectively_down(&self, instance: &ServiceInstance) -> Option<SuspensionReasons> {
        if self.host_status(&instance.host).is_suspended() {
            return Some(SuspensionReasons::nothing_noteworthy());
        }

        match instance.status {
            ServiceStatus::Down => match instance.down_since {
                None => Some(SuspensionReasons::is_down(instance)),
                Some(since) => {
                    let down_for = self.now.saturating_sub(since);
                    if down_for < self.moratorium.as_secs() {
                        None
                    } else {
                        Some(SuspensionReasons::down_since(
                            instance,
                            since,
                            Duration::from_secs(down_for),
                        ))
                    }
                }
            },
            ServiceStatus::Up | ServiceStatus::NotChecked | ServiceStatus::Unknown => None,
        }
    }

    pub fn is_down(&self, instance: &ServiceInstance) -> bool {
        self.effectively_down(instance).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: u64 = 10_000;

    fn down_since(since: u64) -> ServiceInstance {
        ServiceInstance::new("c/0", "h1", ServiceStatus::Down).since(since)
    }

    #[test]
    fn moratorium_boundary() {
        let statuses = HostStatusSnapshot::new();
        let classifier = DownClassifier::new(&statuses, NOW, DEFAULT_DOWN_MORATORIUM);
        let m = DEFAULT_DOWN_MORATORIUM.as_secs();

        assert!(!classifier.is_down(&down_since(NOW - (m - 1))));
        assert!(classifier.is_down(&down_since(NOW - m)));
        assert!(classifier.is_down(&down_since(NOW - (m + 1))));
    }

    #[test]
    fn down_without_since_is_down_immediately() {
        let statuses = HostStatusSnapshot::new();
        let classifier = DownClassifier::new(&statuses, NOW, DEFAULT_DOWN_MORATORIUM);
        let instance = ServiceInstance::new("c/0", "h1", ServiceStatus::Down);

        let reasons = classifier.effectively_down(&instance).unwrap();
        assert_eq!(reasons.to_string(), "c/0 on h1 is down");
    }

    #[test]
    fn down_since_in_the_future_is_within_moratorium() {
        let statuses = HostStatusSnapshot::new();
        let classifier = DownClassifier::new(&statuses, NOW, DEFAULT_DOWN_MORATORIUM);
        assert!(!classifier.is_down(&down_since(NOW + 100)));
    }

    #[test]
    fn suspended_host_overrides_live_status() {
        let statuses = HostStatusSnapshot::new().with("h1", HostStatus::AllowedToBeDown);
        let classifier = DownClassifier::new(&statuses, NOW, DEFAULT_DOWN_MORATORIUM);
        let instance = ServiceInstance::new("c/0", "h1", ServiceStatus::Up);

        let reasons = classifier.effectively_down(&instance).unwrap();
        assert!(reasons.is_empty());
    }

    #[test]
    fn up_unknown_and_not_checked_are_not_down() {
        let statuses = HostStatusSnapshot::new();
        let classifier = DownClassifier::new(&statuses, NOW, DEFAULT_DOWN_MORATORIUM);
        for status in [ServiceStatus::Up, ServiceStatus::Unknown, ServiceStatus::NotChecked] {
            assert!(!classifier.is_down(&ServiceInstance::new("c/0", "h1", status)));
        }
    }
}
