//! Cached container-service entities and their row converters.
//!
//! Attribute values are coerced: strings as-is, numbers and booleans
//! stringified, `null` treated as missing. Converters never modify the row.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::{CacheClient, CachedEntity};
use crate::keys::{Key, Namespace};
use crate::types::Attributes;

pub type ContainerInstanceCacheClient = CacheClient<ContainerInstance>;
pub type ClusterCacheClient = CacheClient<Cluster>;
pub type ServiceCacheClient = CacheClient<Service>;
pub type TaskCacheClient = CacheClient<Task>;

fn string(attributes: &Attributes, name: &str) -> Option<String> {
    match attributes.get(name)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

fn integer(attributes: &Attributes, name: &str) -> Option<i64> {
    match attributes.get(name)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn count(attributes: &Attributes, name: &str) -> Option<u32> {
    integer(attributes, name).and_then(|n| u32::try_from(n).ok())
}

// ── Container instance ────────────────────────────────────────────

/// A host registered with a cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerInstance {
    pub arn: String,
    pub ec2_instance_id: String,
    pub availability_zone: String,
}

impl CachedEntity for ContainerInstance {
    const NAMESPACE: Namespace = Namespace::ContainerInstances;

    fn from_cache(_key: &Key, attributes: &Attributes) -> Option<Self> {
        Some(Self {
            arn: string(attributes, "containerInstanceArn")?,
            ec2_instance_id: string(attributes, "ec2InstanceId").unwrap_or_default(),
            availability_zone: string(attributes, "availabilityZone").unwrap_or_default(),
        })
    }
}

// ── Cluster ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    pub account: String,
    pub region: String,
    pub name: String,
    pub arn: String,
}

impl CachedEntity for Cluster {
    const NAMESPACE: Namespace = Namespace::Clusters;

    fn from_cache(key: &Key, attributes: &Attributes) -> Option<Self> {
        Some(Self {
            account: key.account.clone(),
            region: key.region.clone(),
            name: string(attributes, "clusterName").unwrap_or_else(|| key.id.clone()),
            arn: string(attributes, "clusterArn")?,
        })
    }
}

// ── Service ───────────────────────────────────────────────────────

/// A long-running service on a cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub account: String,
    pub region: String,
    pub cluster_name: String,
    pub service_name: String,
    pub service_arn: String,
    pub task_definition: String,
    pub desired_count: u32,
    pub max_percent: Option<u32>,
    pub min_percent: Option<u32>,
    /// Epoch milliseconds.
    pub created_at: Option<i64>,
}

impl CachedEntity for Service {
    const NAMESPACE: Namespace = Namespace::Services;

    fn from_cache(key: &Key, attributes: &Attributes) -> Option<Self> {
        Some(Self {
            account: key.account.clone(),
            region: key.region.clone(),
            cluster_name: string(attributes, "clusterName")?,
            service_name: string(attributes, "serviceName").unwrap_or_else(|| key.id.clone()),
            service_arn: string(attributes, "serviceArn")?,
            task_definition: string(attributes, "taskDefinition").unwrap_or_default(),
            desired_count: count(attributes, "desiredCount").unwrap_or_default(),
            max_percent: count(attributes, "maximumPercent"),
            min_percent: count(attributes, "minimumHealthyPercent"),
            created_at: integer(attributes, "createdAt"),
        })
    }
}

// ── Task ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub account: String,
    pub region: String,
    pub task_id: String,
    pub task_arn: String,
    pub cluster_arn: String,
    pub container_instance_arn: Option<String>,
    pub group: Option<String>,
    pub last_status: String,
    pub desired_status: String,
    /// Epoch milliseconds.
    pub started_at: Option<i64>,
}

impl CachedEntity for Task {
    const NAMESPACE: Namespace = Namespace::Tasks;

    fn from_cache(key: &Key, attributes: &Attributes) -> Option<Self> {
        Some(Self {
            account: key.account.clone(),
            region: key.region.clone(),
            task_id: string(attributes, "taskId").unwrap_or_else(|| key.id.clone()),
            task_arn: string(attributes, "taskArn")?,
            cluster_arn: string(attributes, "clusterArn")?,
            container_instance_arn: string(attributes, "containerInstanceArn"),
            group: string(attributes, "group"),
            last_status: string(attributes, "lastStatus").unwrap_or_default(),
            desired_status: string(attributes, "desiredStatus").unwrap_or_default(),
            started_at: integer(attributes, "startedAt"),
        })
    }
}
