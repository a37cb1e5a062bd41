//! The hosts one maintenance operation targets.

use std::fmt;

use hostgate_model::{ApplicationId, ApplicationInstance, HostName};

/// Sorted, duplicate-free hosts of a single application.
///
/// Every host is assumed to belong to `application`; hosts that do not
/// simply contribute no service instances to any evaluation.
#[derive(Debug, Clone)]
pub struct NodeGroup<'a> {
    application: &'a ApplicationInstance,
    hosts: Vec<HostName>,
}

impl<'a> NodeGroup<'a> {
    pub fn new<I, H>(application: &'a ApplicationInstance, hosts: I) -> Self
    where
        I: IntoIterator<Item = H>,
        H: Into<HostName>,
    {
        let mut group = Self {
            application,
            hosts: Vec::new(),
        };
        for host in hosts {
            group.add(host);
        }
        group
    }

    /// Add a host. Adding a host already in the group is a no-op.
    pub fn add(&mut self, host: impl Into<HostName>) {
        let host = host.into();
        if let Err(pos) = self.hosts.binary_search(&host) {
            self.hosts.insert(pos, host);
        }
    }

    pub fn contains(&self, host: &HostName) -> bool {
        self.hosts.binary_search(host).is_ok()
    }

    pub fn hosts(&self) -> &[HostName] {
        &self.hosts
    }

    pub fn application(&self) -> &'a ApplicationInstance {
        self.application
    }

    pub fn application_id(&self) -> &'a ApplicationId {
        &self.application.id
    }

    /// Hosts joined by `,`.
    pub fn hosts_string(&self) -> String {
        self.hosts
            .iter()
            .map(HostName::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl fmt::Display for NodeGroup<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hosts_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> ApplicationInstance {
        ApplicationInstance::new(ApplicationId::new("t", "a"), Vec::new())
    }

    #[test]
    fn hosts_are_sorted_and_deduplicated() {
        let app = app();
        let group = NodeGroup::new(&app, ["h3", "h1", "h3", "h2"]);
        assert_eq!(group.hosts_string(), "h1,h2,h3");
        assert_eq!(group.to_string(), "h1,h2,h3");
    }

    #[test]
    fn add_is_idempotent() {
        let app = app();
        let mut group = NodeGroup::new(&app, ["h2"]);
        group.add("h1");
        group.add("h1");
        assert_eq!(group.hosts().len(), 2);
        assert!(group.contains(&"h1".into()));
        assert!(!group.contains(&"h9".into()));
        assert_eq!(group.application_id().to_string(), "t:a");
    }
}
