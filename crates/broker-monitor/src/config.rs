// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Monitor configuration.
//!
//! Holds the server identity the reports carry, the default list sizes
//! used when a query omits a limit, and the cluster/gateway option summaries
//! echoed by the general stats report.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Server name reported by varz (defaults to the generated server id).
    #[serde(default)]
    pub server_name: String,

    /// Client listen host.
    #[serde(default = "default_host")]
    pub host: String,

    /// Client listen port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Monitoring HTTP host.
    #[serde(default = "default_host")]
    pub http_host: String,

    /// Monitoring HTTP port.
    #[serde(default = "default_http_port")]
    pub http_port: u16,

    /// Maximum number of client connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,

    /// Maximum message payload in bytes.
    #[serde(default = "default_max_payload")]
    pub max_payload: usize,

    /// Page size used by connz when the request carries no positive limit.
    #[serde(default = "default_conn_list_size")]
    pub conn_list_size: usize,

    /// Page size used by subsz when the request carries no positive limit.
    #[serde(default = "default_sub_list_size")]
    pub sub_list_size: usize,

    /// Account list size used by gatewayz when account listing is requested
    /// without a positive limit.
    #[serde(default = "default_gateway_accounts_limit")]
    pub gateway_accounts_limit: usize,

    /// Closed-connection ring capacity (0 disables closed history).
    #[serde(default = "default_max_closed_connections")]
    pub max_closed_connections: usize,

    #[serde(default)]
    pub cluster: ClusterConfig,

    #[serde(default)]
    pub gateway: GatewayConfig,
}

/// Cluster (route) options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterConfig {
    #[serde(default)]
    pub host: String,

    #[serde(default)]
    pub port: u16,

    /// Route authentication timeout in seconds.
    #[serde(default)]
    pub auth_timeout: f64,

    /// Solicited route URLs.
    #[serde(default)]
    pub routes: Vec<String>,

    /// Permissions this server applies to its routes.
    #[serde(default)]
    pub permissions: Option<RoutePermissions>,
}

/// Gateway options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Gateway (cluster) name; empty when gateways are not configured.
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub host: String,

    #[serde(default)]
    pub port: u16,

    #[serde(default)]
    pub advertise: String,

    #[serde(default)]
    pub auth_timeout: f64,

    #[serde(default)]
    pub tls_timeout: f64,

    #[serde(default)]
    pub connect_retries: u32,

    #[serde(default)]
    pub reject_unknown: bool,

    /// No-interest subjects per account before a link switches to
    /// interest-only mode.
    #[serde(default = "default_interest_only_threshold")]
    pub interest_only_threshold: usize,

    /// Explicitly configured remote gateways.
    #[serde(default)]
    pub gateways: Vec<RemoteGatewayConfig>,
}

/// A configured remote gateway.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteGatewayConfig {
    pub name: String,

    #[serde(default)]
    pub tls_timeout: f64,

    #[serde(default)]
    pub urls: Vec<String>,
}

/// Allow/deny subject lists for one direction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectPermission {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deny: Option<Vec<String>>,
}

/// Import/export permissions exchanged between routed servers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutePermissions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub import: Option<SubjectPermission>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export: Option<SubjectPermission>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    4222
}

fn default_http_port() -> u16 {
    8222
}

fn default_max_connections() -> usize {
    64 * 1024
}

fn default_max_payload() -> usize {
    1024 * 1024 // 1 MB
}

fn default_conn_list_size() -> usize {
    1024
}

fn default_sub_list_size() -> usize {
    1024
}

fn default_gateway_accounts_limit() -> usize {
    100
}

fn default_max_closed_connections() -> usize {
    10_000
}

fn default_interest_only_threshold() -> usize {
    1000
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            host: String::new(),
            port: 0,
            advertise: String::new(),
            auth_timeout: 0.0,
            tls_timeout: 0.0,
            connect_retries: 0,
            reject_unknown: false,
            interest_only_threshold: default_interest_only_threshold(),
            gateways: Vec::new(),
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            server_name: String::new(),
            host: default_host(),
            port: default_port(),
            http_host: default_host(),
            http_port: default_http_port(),
            max_connections: default_max_connections(),
            max_payload: default_max_payload(),
            conn_list_size: default_conn_list_size(),
            sub_list_size: default_sub_list_size(),
            gateway_accounts_limit: default_gateway_accounts_limit(),
            max_closed_connections: default_max_closed_connections(),
            cluster: ClusterConfig::default(),
            gateway: GatewayConfig::default(),
        }
    }
}

impl MonitorConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse configuration from a JSON string.
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file.
    pub fn to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.conn_list_size == 0 {
            return Err(ConfigError::Invalid("conn_list_size cannot be 0".into()));
        }
        if self.sub_list_size == 0 {
            return Err(ConfigError::Invalid("sub_list_size cannot be 0".into()));
        }
        if self.gateway_accounts_limit == 0 {
            return Err(ConfigError::Invalid(
                "gateway_accounts_limit cannot be 0".into(),
            ));
        }
        if self.max_payload == 0 {
            return Err(ConfigError::Invalid("max_payload cannot be 0".into()));
        }
        if !self.gateway.gateways.is_empty() && self.gateway.name.is_empty() {
            return Err(ConfigError::Invalid(
                "gateway.name required when remote gateways are configured".into(),
            ));
        }
        if let Some(remote) = self.gateway.gateways.iter().find(|g| g.name.is_empty()) {
            return Err(ConfigError::Invalid(format!(
                "remote gateway with urls {:?} has no name",
                remote.urls
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MonitorConfig::default();
        assert_eq!(config.conn_list_size, 1024);
        assert_eq!(config.sub_list_size, 1024);
        assert_eq!(config.gateway_accounts_limit, 100);
        assert_eq!(config.max_closed_connections, 10_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = MonitorConfig::from_json(r#"{"server_name": "n1", "port": 5222}"#)
            .expect("valid config");
        assert_eq!(config.server_name, "n1");
        assert_eq!(config.port, 5222);
        assert_eq!(config.http_port, 8222);
        assert_eq!(config.conn_list_size, 1024);
        assert!(config.cluster.permissions.is_none());
    }

    #[test]
    fn test_validation_rejects_zero_list_size() {
        let config = MonitorConfig {
            conn_list_size: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_remote_gateways_require_local_name() {
        let mut config = MonitorConfig::default();
        config.gateway.gateways.push(RemoteGatewayConfig {
            name: "B".into(),
            tls_timeout: 0.0,
            urls: vec!["nats://127.0.0.1:7222".into()],
        });
        assert!(config.validate().is_err());
        config.gateway.name = "A".into();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("monitor.json");

        let mut config = MonitorConfig::default();
        config.cluster.permissions = Some(RoutePermissions {
            import: Some(SubjectPermission {
                allow: Some(vec!["foo".into()]),
                deny: None,
            }),
            export: None,
        });
        config.to_file(&path).expect("write config");

        let loaded = MonitorConfig::from_file(&path).expect("read config");
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            MonitorConfig::from_json("{not json"),
            Err(ConfigError::Json(_))
        ));
    }
}
