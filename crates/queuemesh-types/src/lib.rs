//! # queuemesh-types: Core types for `QueueMesh`
//!
//! Shared types used across the Coordinator and Broker:
//! - Message payloads ([`Payload`]) and keys ([`Key`])
//! - Broker identity ([`BrokerName`], [`BrokerRecord`])
//! - Storage role tagging ([`Role`])
//! - Health state ([`HealthStatus`])

use std::fmt::{Debug, Display};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A message key. Keys are opaque UTF-8 strings hashed onto the ring.
pub type Key = String;

/// An arbitrary JSON message body.
pub type Payload = serde_json::Value;

/// A broker's registered name, e.g. `"node-a"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BrokerName(String);

impl BrokerName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for BrokerName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for BrokerName {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for BrokerName {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl AsRef<str> for BrokerName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A broker's base URL, e.g. `"http://node-a:5000"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokerUrl(String);

impl BrokerUrl {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for BrokerUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A broker known to the Coordinator: its name, URL, and registration order.
///
/// Registered once at Coordinator start from `BROKER_NODES`; never removed
/// at runtime in the base design (spec.md §3, Broker record).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokerRecord {
    pub name: BrokerName,
    pub url: BrokerUrl,
}

/// The role a broker-local entry was written under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Primary,
    Replica,
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Primary => write!(f, "primary"),
            Role::Replica => write!(f, "replica"),
        }
    }
}

/// Health status of a broker as tracked by the Coordinator's detector.
///
/// Transitions are described in spec.md §4.3; HEALTHY is the initial state
/// for every registered broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HealthStatus {
    Healthy,
    Failed,
    FailedOver,
    Recovered,
}

impl Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            HealthStatus::Healthy => "HEALTHY",
            HealthStatus::Failed => "FAILED",
            HealthStatus::FailedOver => "FAILED_OVER",
            HealthStatus::Recovered => "RECOVERED",
        };
        write!(f, "{s}")
    }
}

/// A stamped ISO-8601 UTC timestamp, as carried in every JSON response body.
pub fn now() -> DateTime<Utc> {
    Utc::now()
}
