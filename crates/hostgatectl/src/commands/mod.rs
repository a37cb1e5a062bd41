pub mod hosts;
pub mod status;

use anyhow::{Context as _, bail};
use tracing::debug;

use hostgate::{Orchestrator, OrchestratorConfig, RecordingClusterController, Topology};
use hostgate_model::HostName;
use hostgate_policy::NodeGroup;
use hostgate_status::HostStatusStore;

use crate::ContextArgs;

const DATABASE_FILE: &str = "hostgate.redb";

/// Everything a command needs: the topology and an orchestrator over the
/// on-disk host status store.
pub struct Context {
    pub topology: Topology,
    pub orchestrator: Orchestrator<RecordingClusterController>,
}

impl Context {
    pub fn load(args: &ContextArgs) -> anyhow::Result<Self> {
        let config = match &args.config {
            Some(path) => OrchestratorConfig::from_file(path)?,
            None => OrchestratorConfig::default(),
        };
        let topology = Topology::from_file(&args.topology)?;

        std::fs::create_dir_all(&args.data_dir)
            .with_context(|| format!("creating {}", args.data_dir.display()))?;
        let path = args.data_dir.join(DATABASE_FILE);
        let store = HostStatusStore::open(&path)?;
        debug!(path = %path.display(), "host status store opened");

        Ok(Self {
            topology,
            orchestrator: Orchestrator::new(store, RecordingClusterController::new(), &config),
        })
    }
}

/// Resolve hosts to a node group. Every host must belong to the same application.
pub fn node_group<'a>(topology: &'a Topology, hosts: &[String]) -> anyhow::Result<NodeGroup<'a>> {
    let Some(first) = hosts.first() else {
        bail!("no hosts given");
    };
    let first = HostName::from(first.as_str());
    let application = topology
        .application_for_host(&first)
        .with_context(|| format!("host {first} is not part of any application"))?;

    for host in hosts {
        let host = HostName::from(host.as_str());
        if !application.has_host(&host) {
            bail!("host {host} is not part of application {}", application.id);
        }
    }
    Ok(NodeGroup::new(application, hosts.iter().map(String::as_str)))
}
