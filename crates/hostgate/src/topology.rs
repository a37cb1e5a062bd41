//! Topology file — the applications the orchestrator can act on.
//!
//! In production the topology and live service status come from the
//! config model and the service monitor. The file form lets operators and
//! tests describe the same snapshot in TOML:
//!
//! ```toml
//! [[applications]]
//! id = { tenant = "music", application = "search" }
//!
//! [[applications.clusters]]
//! id = "music"
//! kind = "storage"
//!
//! [[applications.clusters.instances]]
//! config_id = "music/storage/0"
//! host = "host1"
//! status = "up"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use hostgate_model::{ApplicationId, ApplicationInstance, HostName};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topology {
    #[serde(default)]
    pub applications: Vec<ApplicationInstance>,
}

impl Topology {
    pub fn new(applications: Vec<ApplicationInstance>) -> Self {
        Self { applications }
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn application(&self, id: &ApplicationId) -> Option<&ApplicationInstance> {
        self.applications.iter().find(|a| &a.id == id)
    }

    /// The application with an instance on `host`.
    pub fn application_for_host(&self, host: &HostName) -> Option<&ApplicationInstance> {
        self.applications.iter().find(|a| a.has_host(host))
    }
}
