//! Cluster policy: turns cluster views into a grant or a denial.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use hostgate_model::ServiceKind;

use crate::application_view::ApplicationView;
use crate::cluster_view::ClusterView;
use crate::error::{Constraint, HostStateChangeDenied};
use crate::reasons::SuspensionReasons;

/// How many services of a cluster may be down at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuspensionLimit {
    /// Only the group itself; nothing else may be down.
    OneNode,
    TenPercent,
    TwentyPercent,
    /// Availability is guarded elsewhere (e.g. by the cluster controller).
    AllNodes,
}

impl SuspensionLimit {
    pub fn as_percentage(&self) -> u32 {
        match self {
            Self::OneNode => 0,
            Self::TenPercent => 10,
            Self::TwentyPercent => 20,
            Self::AllNodes => 100,
        }
    }

    /// Default limit for a kind of service.
    pub fn for_kind(kind: ServiceKind) -> Self {
        match kind {
            ServiceKind::ConfigServer
            | ServiceKind::Controller
            | ServiceKind::ClusterController
            | ServiceKind::Slobrok => Self::OneNode,
            ServiceKind::Proxy => Self::TwentyPercent,
            ServiceKind::Container | ServiceKind::Searchnode => Self::TenPercent,
            ServiceKind::Storage | ServiceKind::Distributor | ServiceKind::MetricsProxy => {
                Self::AllNodes
            }
        }
    }
}

/// Decides whether the clusters of an application can tolerate a node group going down.
#[derive(Debug, Clone, Default)]
pub struct ClusterPolicy {
    overrides: HashMap<ServiceKind, SuspensionLimit>,
}

impl ClusterPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `limit` for every cluster of `kind` instead of the default.
    pub fn with_limit(mut self, kind: ServiceKind, limit: SuspensionLimit) -> Self {
        self.overrides.insert(kind, limit);
        self
    }

    pub fn suspension_limit(&self, kind: ServiceKind) -> SuspensionLimit {
        self.overrides
            .get(&kind)
            .copied()
            .unwrap_or_else(|| SuspensionLimit::for_kind(kind))
    }

    /// Check every cluster touching the group, in cluster order.
    ///
    /// The first violated constraint aborts with a denial. On success the
    /// reasons of every cluster are merged.
    pub fn grant_suspension_request(
        &self,
        application: &ApplicationView<'_>,
    ) -> Result<SuspensionReasons, HostStateChangeDenied> {
        let mut reasons = SuspensionReasons::new();
        for cluster in application.clusters() {
            reasons.merge(self.verify_group_going_down_is_fine(&cluster)?);
        }
        Ok(reasons)
    }

    /// Check a single cluster.
    pub fn verify_group_going_down_is_fine(
        &self,
        cluster: &ClusterView<'_>,
    ) -> Result<SuspensionReasons, HostStateChangeDenied> {
        if cluster.size() <= 1 {
            debug!(cluster = %cluster.cluster_id(), "single-member cluster, no peers to protect");
            return Ok(SuspensionReasons::nothing_noteworthy());
        }

        match cluster.no_services_outside_group_is_down() {
            Ok(true) => return Ok(SuspensionReasons::nothing_noteworthy()),
            Ok(false) => {}
            Err(unknown) => {
                let denied = HostStateChangeDenied::new(
                    cluster.node_group(),
                    Constraint::UnknownServiceStatus,
                    format!(
                        "Cannot determine whether the {} are up: {}",
                        cluster.service_description(true),
                        unknown
                    ),
                );
                info!(constraint = %denied.constraint, hosts = %denied.hosts, "suspension denied");
                return Err(denied);
            }
        }

        if let Some(reasons) = cluster.all_services_down() {
            debug!(
                cluster = %cluster.cluster_id(),
                %reasons,
                "all group services already down"
            );
            return Ok(reasons);
        }

        let limit = self.suspension_limit(cluster.kind()).as_percentage();
        let if_group_down = cluster.percentage_of_services_down_if_group_is_allowed_to_be_down();
        if if_group_down <= limit {
            return Ok(SuspensionReasons::nothing_noteworthy());
        }

        let outside = cluster.percentage_of_services_down_outside_group();
        let message = if limit == 0 {
            format!(
                "{}% of the {} are down or suspended already:{}",
                outside,
                cluster.service_description(true),
                cluster.down_description()
            )
        } else {
            format!(
                "The percentage of downed or suspended {} would increase from {}% to {}% (limit is {}%):{}",
                cluster.service_description(true),
                outside,
                if_group_down,
                limit,
                cluster.down_description()
            )
        };
        let denied =
            HostStateChangeDenied::new(cluster.node_group(), Constraint::EnoughServicesUp, message);
        info!(
            constraint = %denied.constraint,
            hosts = %denied.hosts,
            cluster = %cluster.cluster_id(),
            percentage = if_group_down,
            limit,
            "suspension denied"
        );
        Err(denied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::down::DEFAULT_DOWN_MORATORIUM;
    use crate::node_group::NodeGroup;
    use hostgate_model::{
        ApplicationId, ApplicationInstance, HostStatus, HostStatusSnapshot, ServiceCluster,
        ServiceInstance, ServiceStatus,
    };

    const NOW: u64 = 100_000;

    fn instance(host: &str, status: ServiceStatus) -> ServiceInstance {
        ServiceInstance::new(format!("c/{host}"), host, status)
    }

    fn app(clusters: Vec<ServiceCluster>) -> ApplicationInstance {
        ApplicationInstance::new(ApplicationId::new("t", "a"), clusters)
    }

    fn decide(
        app: &ApplicationInstance,
        statuses: &HostStatusSnapshot,
        hosts: &[&str],
    ) -> Result<SuspensionReasons, HostStateChangeDenied> {
        let group = NodeGroup::new(app, hosts.iter().copied());
        let view = ApplicationView::new(&group, statuses, NOW, DEFAULT_DOWN_MORATORIUM);
        ClusterPolicy::new().grant_suspension_request(&view)
    }

    fn config_servers(instances: Vec<ServiceInstance>) -> ServiceCluster {
        ServiceCluster::new("zone-config-servers", ServiceKind::ConfigServer, instances)
            .with_expected_hosts(["cfg1", "cfg2", "cfg3"])
    }

    #[test]
    fn limit_table() {
        assert_eq!(SuspensionLimit::for_kind(ServiceKind::ConfigServer).as_percentage(), 0);
        assert_eq!(SuspensionLimit::for_kind(ServiceKind::Container).as_percentage(), 10);
        assert_eq!(SuspensionLimit::for_kind(ServiceKind::Proxy).as_percentage(), 20);
        assert_eq!(SuspensionLimit::for_kind(ServiceKind::Storage).as_percentage(), 100);

        let policy = ClusterPolicy::new().with_limit(ServiceKind::Container, SuspensionLimit::AllNodes);
        assert_eq!(policy.suspension_limit(ServiceKind::Container), SuspensionLimit::AllNodes);
        assert_eq!(policy.suspension_limit(ServiceKind::Proxy), SuspensionLimit::TwentyPercent);
    }

    #[test]
    fn config_server_with_missing_member_is_denied() {
        let app = app(vec![config_servers(vec![
            instance("cfg1", ServiceStatus::Up),
            instance("cfg2", ServiceStatus::Up),
        ])]);

        let denied = decide(&app, &HostStatusSnapshot::new(), &["cfg1"]).unwrap_err();
        assert_eq!(denied.constraint, Constraint::EnoughServicesUp);
        assert_eq!(
            denied.message,
            "33% of the config servers in cluster 'zone-config-servers' are down or \
             suspended already: 1 missing config server: cfg3."
        );
        assert_eq!(
            denied.to_string(),
            format!("Changing the state of cfg1 would violate enough-services-up: {}", denied.message)
        );
    }

    #[test]
    fn config_server_with_all_members_up_is_granted() {
        let app = app(vec![config_servers(vec![
            instance("cfg1", ServiceStatus::Up),
            instance("cfg2", ServiceStatus::Up),
            instance("cfg3", ServiceStatus::Up),
        ])]);

        let reasons = decide(&app, &HostStatusSnapshot::new(), &["cfg1"]).unwrap();
        assert!(reasons.is_empty());
    }

    #[test]
    fn config_server_with_suspended_peer_is_denied() {
        let app = app(vec![config_servers(vec![
            instance("cfg1", ServiceStatus::Up),
            instance("cfg2", ServiceStatus::Up),
            instance("cfg3", ServiceStatus::Up),
        ])]);
        let statuses = HostStatusSnapshot::new().with("cfg3", HostStatus::AllowedToBeDown);

        let denied = decide(&app, &statuses, &["cfg1"]).unwrap_err();
        assert_eq!(denied.constraint, Constraint::EnoughServicesUp);
        assert!(denied.message.contains("Suspended hosts: cfg3."));
    }

    #[test]
    fn single_member_cluster_can_always_be_suspended() {
        for status in [
            ServiceStatus::Up,
            ServiceStatus::Down,
            ServiceStatus::Unknown,
            ServiceStatus::NotChecked,
        ] {
            for kind in [ServiceKind::ConfigServer, ServiceKind::Container, ServiceKind::Storage] {
                let app = app(vec![ServiceCluster::new("solo", kind, vec![instance("h1", status)])]);
                assert!(decide(&app, &HostStatusSnapshot::new(), &["h1"]).is_ok());
            }
        }
    }

    #[test]
    fn unknown_status_outside_group_is_denied() {
        let app = app(vec![ServiceCluster::new(
            "c",
            ServiceKind::Container,
            vec![
                instance("h1", ServiceStatus::Up),
                instance("h2", ServiceStatus::Unknown),
                instance("h3", ServiceStatus::Up),
            ],
        )]);

        let denied = decide(&app, &HostStatusSnapshot::new(), &["h1"]).unwrap_err();
        assert_eq!(denied.constraint, Constraint::UnknownServiceStatus);
        assert!(denied.message.contains("c/h2 on h2"));
    }

    #[test]
    fn container_limit_is_ten_percent() {
        let instances: Vec<ServiceInstance> = (1..=10)
            .map(|n| instance(&format!("h{n:02}"), ServiceStatus::Up))
            .collect();
        let app = app(vec![ServiceCluster::new("c", ServiceKind::Container, instances)]);

        // Nothing else is down.
        assert!(decide(&app, &HostStatusSnapshot::new(), &["h01"]).is_ok());

        // One of ten with another suspended: 20% > 10%.
        let statuses = HostStatusSnapshot::new().with("h02", HostStatus::AllowedToBeDown);
        let denied = decide(&app, &statuses, &["h01"]).unwrap_err();
        assert_eq!(denied.constraint, Constraint::EnoughServicesUp);
        assert_eq!(
            denied.message,
            "The percentage of downed or suspended services in cluster 'c' would increase \
             from 10% to 20% (limit is 10%): Suspended hosts: h02."
        );
    }

    #[test]
    fn group_already_down_is_granted_with_reasons() {
        let app = app(vec![ServiceCluster::new(
            "cfg",
            ServiceKind::ConfigServer,
            vec![
                instance("cfg1", ServiceStatus::Down),
                instance("cfg2", ServiceStatus::Down),
                instance("cfg3", ServiceStatus::Up),
            ],
        )]);

        let reasons = decide(&app, &HostStatusSnapshot::new(), &["cfg1"]).unwrap();
        assert_eq!(reasons.messages(), &["c/cfg1 on cfg1 is down".to_string()]);
    }

    #[test]
    fn recently_down_peer_does_not_block() {
        let app = app(vec![ServiceCluster::new(
            "cfg",
            ServiceKind::ConfigServer,
            vec![
                instance("cfg1", ServiceStatus::Up),
                ServiceInstance::new("c/cfg2", "cfg2", ServiceStatus::Down).since(NOW - 10),
                instance("cfg3", ServiceStatus::Up),
            ],
        )]);
        assert!(decide(&app, &HostStatusSnapshot::new(), &["cfg1"]).is_ok());

        let app = app_with_down_since(NOW - 45);
        assert!(decide(&app, &HostStatusSnapshot::new(), &["cfg1"]).is_err());
    }

    fn app_with_down_since(since: u64) -> ApplicationInstance {
        app(vec![ServiceCluster::new(
            "cfg",
            ServiceKind::ConfigServer,
            vec![
                instance("cfg1", ServiceStatus::Up),
                ServiceInstance::new("c/cfg2", "cfg2", ServiceStatus::Down).since(since),
                instance("cfg3", ServiceStatus::Up),
            ],
        )])
    }

    #[test]
    fn first_violated_cluster_in_order_is_reported() {
        let app = app(vec![
            ServiceCluster::new(
                "z",
                ServiceKind::Container,
                vec![instance("h1", ServiceStatus::Up), instance("h2", ServiceStatus::Unknown)],
            ),
            ServiceCluster::new(
                "a",
                ServiceKind::ConfigServer,
                vec![instance("h1", ServiceStatus::Up), instance("h3", ServiceStatus::Down)],
            ),
        ]);

        let denied = decide(&app, &HostStatusSnapshot::new(), &["h1"]).unwrap_err();
        assert_eq!(denied.constraint, Constraint::EnoughServicesUp);
    }

    #[test]
    fn reapplying_a_granted_suspension_is_granted() {
        let instances: Vec<ServiceInstance> = (1..=10)
            .map(|n| instance(&format!("h{n:02}"), ServiceStatus::Up))
            .collect();
        let app = app(vec![ServiceCluster::new("c", ServiceKind::Container, instances)]);

        assert!(decide(&app, &HostStatusSnapshot::new(), &["h01"]).is_ok());
        let statuses = HostStatusSnapshot::new().with("h01", HostStatus::AllowedToBeDown);
        let reasons = decide(&app, &statuses, &["h01"]).unwrap();
        assert!(reasons.is_empty());
    }

    #[test]
    fn limit_serializes_snake_case() {
        let json = serde_json::to_string(&SuspensionLimit::TwentyPercent).unwrap();
        assert_eq!(json, "\"twenty_percent\"");
    }
}
