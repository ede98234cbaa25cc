use std::str::FromStr;

use serde::Deserialize;

/// Settings for a [`ResolverRegistryBuilder`](super::ResolverRegistryBuilder),
/// usually provided to gRPC as a JSON object such as
/// `{"defaultPrefix": "passthrough:///"}`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolverRegistryConfig {
    /// Replaces the prefix applied to targets without a registered scheme.
    pub default_prefix: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid resolver registry config: {0}")]
    Json(#[from] serde_json::Error),
}

impl ResolverRegistryConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}

impl FromStr for ResolverRegistryConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_json(s)
    }
}
