//! # queuemesh-config: Configuration loading
//!
//! Grounded on `kimberlite-config`'s `ConfigLoader`: built-in defaults,
//! merged with an optional TOML file, merged with environment variables,
//! via the `config` crate. The four names spec.md's External Interfaces
//! table gives (`BROKER_NODES`, `REPLICATION_FACTOR`, `COORDINATOR_URL`,
//! `NODE_ID`) don't follow the `QUEUEMESH_` prefix convention, so they are
//! read and parsed explicitly after the layered merge.

use std::collections::HashMap;
use std::env;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use queuemesh_types::{BrokerName, BrokerRecord, BrokerUrl};
use serde::{Deserialize, Serialize};

/// Errors raised while assembling configuration. All of these are startup
/// failures — the Coordinator/Broker must not run with partial config.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration sources: {0}")]
    Source(#[from] config::ConfigError),

    #[error("BROKER_NODES is required and was not set")]
    MissingBrokerNodes,

    #[error("malformed BROKER_NODES entry (expected name=url): {0:?}")]
    MalformedBrokerNodes(String),

    #[error("invalid REPLICATION_FACTOR (expected an integer >= 1): {0:?}")]
    InvalidReplicationFactor(String),

    #[error("invalid bind address {0:?}: {1}")]
    InvalidBindAddr(String, std::net::AddrParseError),

    #[error("NODE_ID is required and was not set")]
    MissingNodeId,
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Raw, directly-deserializable fields layered through defaults → TOML →
/// `QUEUEMESH_`-prefixed env vars. The spec-named variables are layered
/// on top of this afterward, outside the `config` crate's merge.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
struct RawCoordinatorConfig {
    bind_addr: String,
    virtual_nodes: u32,
    probe_interval_secs: u64,
    failure_threshold: u32,
    probe_timeout_secs: u64,
    replication_factor: usize,
}

impl Default for RawCoordinatorConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:7000".to_string(),
            virtual_nodes: 150,
            probe_interval_secs: 5,
            failure_threshold: 3,
            probe_timeout_secs: 2,
            replication_factor: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
struct RawBrokerConfig {
    bind_addr: String,
}

impl Default for RawBrokerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:5000".to_string(),
        }
    }
}

/// Fully resolved Coordinator configuration.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    pub broker_nodes: Vec<BrokerRecord>,
    pub replication_factor: usize,
    pub bind_addr: SocketAddr,
    pub virtual_nodes: u32,
    pub probe_interval: Duration,
    pub failure_threshold: u32,
    pub probe_timeout: Duration,
}

/// Fully resolved Broker configuration.
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    pub node_id: String,
    pub bind_addr: SocketAddr,
}

/// Loads configuration from defaults, an optional TOML file, and
/// environment variables, builder-style (grounded on
/// `kimberlite-config::ConfigLoader`).
pub struct ConfigLoader {
    project_dir: PathBuf,
    env_prefix: String,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            project_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            env_prefix: "QUEUEMESH".to_string(),
        }
    }

    pub fn with_project_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.project_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    fn layered_source<T>(&self, defaults: &T) -> std::result::Result<config::Config, config::ConfigError>
    where
        T: Serialize,
    {
        let mut builder = config::Config::builder();
        builder = builder.add_source(config::Config::try_from(defaults)?);

        let config_file = self.project_dir.join("queuemesh.toml");
        if config_file.exists() {
            builder = builder.add_source(
                config::File::from(config_file)
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        builder = builder.add_source(
            config::Environment::with_prefix(&self.env_prefix)
                .separator("_")
                .try_parsing(true),
        );

        builder.build()
    }

    /// Loads [`CoordinatorConfig`]. `BROKER_NODES` is mandatory: the
    /// Coordinator must not start with a partially-parsed topology.
    pub fn load_coordinator(self) -> Result<CoordinatorConfig> {
        let defaults = RawCoordinatorConfig::default();
        let built = self.layered_source(&defaults)?;
        let raw: RawCoordinatorConfig = built.try_deserialize()?;

        let broker_nodes = parse_broker_nodes(&env_var("BROKER_NODES").ok_or(ConfigError::MissingBrokerNodes)?)?;

        let replication_factor = match env_var("REPLICATION_FACTOR") {
            Some(value) => value
                .parse::<usize>()
                .ok()
                .filter(|n| *n >= 1)
                .ok_or(ConfigError::InvalidReplicationFactor(value))?,
            None => raw.replication_factor,
        };

        let bind_addr = raw
            .bind_addr
            .parse()
            .map_err(|e| ConfigError::InvalidBindAddr(raw.bind_addr.clone(), e))?;

        Ok(CoordinatorConfig {
            broker_nodes,
            replication_factor,
            bind_addr,
            virtual_nodes: raw.virtual_nodes,
            probe_interval: Duration::from_secs(raw.probe_interval_secs),
            failure_threshold: raw.failure_threshold,
            probe_timeout: Duration::from_secs(raw.probe_timeout_secs),
        })
    }

    /// Loads [`BrokerConfig`]. `NODE_ID` is mandatory.
    pub fn load_broker(self) -> Result<BrokerConfig> {
        let defaults = RawBrokerConfig::default();
        let built = self.layered_source(&defaults)?;
        let raw: RawBrokerConfig = built.try_deserialize()?;

        let node_id = env_var("NODE_ID").ok_or(ConfigError::MissingNodeId)?;
        let bind_addr = raw
            .bind_addr
            .parse()
            .map_err(|e| ConfigError::InvalidBindAddr(raw.bind_addr.clone(), e))?;

        Ok(BrokerConfig { node_id, bind_addr })
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

/// Parses `BROKER_NODES` ("name=url,name=url,..."). A malformed entry
/// (missing `=`) is a hard startup error, not a silent skip (spec.md §4.6).
fn parse_broker_nodes(raw: &str) -> Result<Vec<BrokerRecord>> {
    let mut seen = HashMap::new();
    let mut nodes = Vec::new();

    for entry in raw.split(',') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        let Some((name, url)) = entry.split_once('=') else {
            return Err(ConfigError::MalformedBrokerNodes(entry.to_string()));
        };
        if name.is_empty() || url.is_empty() {
            return Err(ConfigError::MalformedBrokerNodes(entry.to_string()));
        }

        if seen.insert(name.to_string(), ()).is_none() {
            nodes.push(BrokerRecord {
                name: BrokerName::new(name),
                url: BrokerUrl::new(url),
            });
        }
    }

    if nodes.is_empty() {
        return Err(ConfigError::MissingBrokerNodes);
    }

    Ok(nodes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_broker_nodes() {
        let nodes = parse_broker_nodes("node-a=http://node-a:5000,node-b=http://node-b:5000").unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].name, BrokerName::new("node-a"));
        assert_eq!(nodes[0].url, BrokerUrl::new("http://node-a:5000"));
    }

    #[test]
    fn rejects_entry_missing_equals_sign() {
        let err = parse_broker_nodes("node-a=http://node-a:5000,node-b").unwrap_err();
        assert!(matches!(err, ConfigError::MalformedBrokerNodes(_)));
    }

    #[test]
    fn empty_broker_nodes_string_is_an_error() {
        let err = parse_broker_nodes("").unwrap_err();
        assert!(matches!(err, ConfigError::MissingBrokerNodes));
    }

    #[test]
    fn duplicate_names_keep_the_first_occurrence() {
        let nodes = parse_broker_nodes("node-a=http://a:1,node-a=http://a:2").unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].url, BrokerUrl::new("http://a:1"));
    }

    #[test]
    fn raw_coordinator_defaults_match_spec_defaults() {
        let raw = RawCoordinatorConfig::default();
        assert_eq!(raw.virtual_nodes, 150);
        assert_eq!(raw.replication_factor, 3);
        assert_eq!(raw.probe_interval_secs, 5);
        assert_eq!(raw.failure_threshold, 3);
        assert_eq!(raw.probe_timeout_secs, 2);
        assert_eq!(raw.bind_addr, "0.0.0.0:7000");
    }

    #[test]
    fn raw_broker_defaults_use_port_5000() {
        assert_eq!(RawBrokerConfig::default().bind_addr, "0.0.0.0:5000");
    }
}
