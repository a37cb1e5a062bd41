//! hostgate.toml configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use hostgate_model::ServiceKind;
use hostgate_policy::{ClusterPolicy, SuspensionLimit, DEFAULT_DOWN_MORATORIUM};

use crate::error::{OrchestratorError, OrchestratorResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Seconds a service must have been down before it counts as down.
    pub down_moratorium_secs: u64,
    /// Seconds to wait for an application lock before giving up.
    pub lock_timeout_secs: u64,
    /// Per-service-kind replacements of the default suspension limits.
    pub limits: Vec<LimitOverride>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitOverride {
    pub kind: ServiceKind,
    pub limit: SuspensionLimit,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            down_moratorium_secs: DEFAULT_DOWN_MORATORIUM.as_secs(),
            lock_timeout_secs: 10,
            limits: Vec::new(),
        }
    }
}

impl OrchestratorConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: OrchestratorConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> OrchestratorResult<()> {
        if self.lock_timeout_secs == 0 {
            return Err(OrchestratorError::Config(
                "lock_timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn down_moratorium(&self) -> Duration {
        Duration::from_secs(self.down_moratorium_secs)
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_secs(self.lock_timeout_secs)
    }

    /// Cluster policy with the configured limit overrides applied.
    pub fn cluster_policy(&self) -> ClusterPolicy {
        self.limits
            .iter()
            .fold(ClusterPolicy::new(), |policy, o| policy.with_limit(o.kind, o.limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = OrchestratorConfig::from_toml_str("").unwrap();
        assert_eq!(config, OrchestratorConfig::default());
        assert_eq!(config.down_moratorium(), Duration::from_secs(30));
        assert_eq!(config.lock_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn parses_limit_overrides() {
        let config = OrchestratorConfig::from_toml_str(
            r#"
down_moratorium_secs = 60

[[limits]]
kind = "container"
limit = "twenty_percent"
"#,
        )
        .unwrap();

        assert_eq!(config.down_moratorium_secs, 60);
        assert_eq!(config.lock_timeout_secs, 10);
        let policy = config.cluster_policy();
        assert_eq!(
            policy.suspension_limit(ServiceKind::Container),
            SuspensionLimit::TwentyPercent
        );
        assert_eq!(
            policy.suspension_limit(ServiceKind::ConfigServer),
            SuspensionLimit::OneNode
        );
    }

    #[test]
    fn zero_lock_timeout_is_rejected() {
        assert!(OrchestratorConfig::from_toml_str("lock_timeout_secs = 0").is_err());
    }

    #[test]
    fn toml_output_parses_back() {
        let mut config = OrchestratorConfig::default();
        config.limits.push(LimitOverride {
            kind: ServiceKind::Proxy,
            limit: SuspensionLimit::TenPercent,
        });
        let toml_str = config.to_toml_string().unwrap();
        assert!(toml_str.contains("down_moratorium_secs = 30"));
        assert_eq!(OrchestratorConfig::from_toml_str(&toml_str).unwrap(), config);
    }
}
