//! Composite cache keys.
//!
//! Grammar: `<provider>:<namespace>:<account>:<region>:<resource-id>`.
//! The provider segment is always `container-service`. The resource id is the
//! remainder after the fourth colon and may itself contain colons (ARNs).
//! Account and region are percent-escaped (`%` as `%25`, `:` as `%3A`) so
//! any name decodes back to itself.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use stratus_core::ProviderId;

use crate::glob;

/// Provider segment of every key written by this crate.
pub const PROVIDER: ProviderId = ProviderId::ContainerService;

/// Entity namespaces held in the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Namespace {
    ContainerInstances,
    Clusters,
    Services,
    Tasks,
}

impl Namespace {
    pub const ALL: [Namespace; 4] = [
        Namespace::ContainerInstances,
        Namespace::Clusters,
        Namespace::Services,
        Namespace::Tasks,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Namespace::ContainerInstances => "containerInstances",
            Namespace::Clusters => "clusters",
            Namespace::Services => "services",
            Namespace::Tasks => "tasks",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Namespace {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Namespace::ALL
            .into_iter()
            .find(|ns| ns.as_str() == s)
            .ok_or_else(|| KeyError::UnknownNamespace(s.to_string()))
    }
}

/// A key that does not follow the composite key grammar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("key {0:?} has fewer than five segments")]
    TooFewSegments(String),

    #[error("key {key:?} has provider {provider:?}, expected container-service")]
    WrongProvider { key: String, provider: String },

    #[error("unknown namespace {0:?}")]
    UnknownNamespace(String),

    #[error("key {key:?} has an empty {segment} segment")]
    EmptySegment { key: String, segment: &'static str },
}

/// A decoded composite key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Key {
    pub namespace: Namespace,
    pub account: String,
    pub region: String,
    pub id: String,
}

impl Key {
    pub fn new(namespace: Namespace, account: &str, region: &str, id: &str) -> Self {
        Self {
            namespace,
            account: account.to_string(),
            region: region.to_string(),
            id: id.to_string(),
        }
    }

    pub fn parse(key: &str) -> Result<Self, KeyError> {
        let mut parts = key.splitn(5, ':');
        let (Some(provider), Some(namespace), Some(account), Some(region), Some(id)) = (
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
        ) else {
            return Err(KeyError::TooFewSegments(key.to_string()));
        };

        if provider != PROVIDER.as_str() {
            return Err(KeyError::WrongProvider {
                key: key.to_string(),
                provider: provider.to_string(),
            });
        }
        let namespace = namespace.parse()?;
        for (segment, value) in [("account", account), ("region", region), ("resource id", id)] {
            if value.is_empty() {
                return Err(KeyError::EmptySegment {
                    key: key.to_string(),
                    segment,
                });
            }
        }

        Ok(Self::new(
            namespace,
            &unescape_segment(account),
            &unescape_segment(region),
            id,
        ))
    }

    /// Glob matching every key of `namespace` in one account and region.
    /// Glob metacharacters in the names match only themselves.
    pub fn pattern(namespace: Namespace, account: &str, region: &str) -> String {
        let (account, region) = (escape_segment(account), escape_segment(region));
        let (account, region) = (glob::escape(&account), glob::escape(&region));
        format!("{PROVIDER}:{namespace}:{account}:{region}:*")
    }
}

fn escape_segment(value: &str) -> Cow<'_, str> {
    if !value.contains(['%', ':']) {
        return Cow::Borrowed(value);
    }
    let mut escaped = String::with_capacity(value.len() + 4);
    for c in value.chars() {
        match c {
            '%' => escaped.push_str("%25"),
            ':' => escaped.push_str("%3A"),
            _ => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

/// Inverse of [`escape_segment`]. Unrecognised escapes are kept as written.
fn unescape_segment(value: &str) -> Cow<'_, str> {
    if !value.contains('%') {
        return Cow::Borrowed(value);
    }
    let mut decoded = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(at) = rest.find('%') {
        decoded.push_str(&rest[..at]);
        let tail = &rest[at..];
        if tail.starts_with("%25") {
            decoded.push('%');
            rest = &tail[3..];
        } else if tail.starts_with("%3A") || tail.starts_with("%3a") {
            decoded.push(':');
            rest = &tail[3..];
        } else {
            decoded.push('%');
            rest = &tail[1..];
        }
    }
    decoded.push_str(rest);
    Cow::Owned(decoded)
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}:{}",
            PROVIDER,
            self.namespace,
            escape_segment(&self.account),
            escape_segment(&self.region),
            self.id
        )
    }
}

impl FromStr for Key {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Key::parse(s)
    }
}

pub fn container_instance(account: &str, region: &str, arn: &str) -> String {
    Key::new(Namespace::ContainerInstances, account, region, arn).to_string()
}

pub fn cluster(account: &str, region: &str, cluster_name: &str) -> String {
    Key::new(Namespace::Clusters, account, region, cluster_name).to_string()
}

pub fn service(account: &str, region: &str, service_name: &str) -> String {
    Key::new(Namespace::Services, account, region, service_name).to_string()
}

pub fn task(account: &str, region: &str, task_id: &str) -> String {
    Key::new(Namespace::Tasks, account, region, task_id).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARN: &str = "arn:aws:ecs:us-west-2:123456789012:container-instance/abc";

    #[test]
    fn encode_container_instance_key() {
        assert_eq!(
            container_instance("ecs-prod", "us-west-2", ARN),
            format!("container-service:containerInstances:ecs-prod:us-west-2:{ARN}")
        );
    }

    #[test]
    fn resource_id_keeps_its_colons() {
        let key = Key::parse(&container_instance("ecs-prod", "us-west-2", ARN)).unwrap();
        assert_eq!(key.namespace, Namespace::ContainerInstances);
        assert_eq!(key.account, "ecs-prod");
        assert_eq!(key.region, "us-west-2");
        assert_eq!(key.id, ARN);
    }

    #[test]
    fn parse_rejects_short_keys() {
        assert_eq!(
            Key::parse("container-service:tasks:acct"),
            Err(KeyError::TooFewSegments("container-service:tasks:acct".to_string()))
        );
    }

    #[test]
    fn parse_rejects_other_providers() {
        let err = Key::parse("compute:tasks:acct:us-west-2:t-1").unwrap_err();
        assert!(matches!(err, KeyError::WrongProvider { provider, .. } if provider == "compute"));
    }

    #[test]
    fn parse_rejects_unknown_namespace() {
        let err = Key::parse("container-service:loadBalancers:acct:us-west-2:lb").unwrap_err();
        assert_eq!(err, KeyError::UnknownNamespace("loadBalancers".to_string()));
    }

    #[test]
    fn parse_rejects_empty_segments() {
        let err = Key::parse("container-service:tasks::us-west-2:t-1").unwrap_err();
        assert!(matches!(err, KeyError::EmptySegment { segment: "account", .. }));

        let err = Key::parse("container-service:tasks:acct:us-west-2:").unwrap_err();
        assert!(matches!(err, KeyError::EmptySegment { segment: "resource id", .. }));
    }

    #[test]
    fn pattern_scopes_account_and_region() {
        assert_eq!(
            Key::pattern(Namespace::Services, "ecs-prod", "eu-west-1"),
            "container-service:services:ecs-prod:eu-west-1:*"
        );
    }

    #[test]
    fn separators_in_account_and_region_survive_decoding() {
        let encoded = task("team:prod", "us-west-2", "t-1");
        assert_eq!(encoded, "container-service:tasks:team%3Aprod:us-west-2:t-1");

        let key = Key::parse(&encoded).unwrap();
        assert_eq!(key, Key::new(Namespace::Tasks, "team:prod", "us-west-2", "t-1"));

        let odd = Key::new(Namespace::Clusters, "100%:x", "r%3A", "main");
        assert_eq!(Key::parse(&odd.to_string()).unwrap(), odd);
    }

    #[test]
    fn plain_names_are_written_verbatim() {
        assert_eq!(
            Key::new(Namespace::Tasks, "ecs-prod", "us-west-2", "t-1").to_string(),
            "container-service:tasks:ecs-prod:us-west-2:t-1"
        );
    }

    #[test]
    fn pattern_treats_glob_characters_in_names_literally() {
        let pattern = Key::pattern(Namespace::Tasks, "prod*", "r?");
        let matcher = glob::compile(&pattern).unwrap();

        assert!(matcher.is_match(&task("prod*", "r?", "t-1")));
        assert!(!matcher.is_match(&task("prod-a", "r?", "t-1")));
        assert!(!matcher.is_match(&task("prod*", "r1", "t-1")));
    }

    #[test]
    fn pattern_matches_escaped_account() {
        let matcher = glob::compile(&Key::pattern(Namespace::Tasks, "team:prod", "r")).unwrap();
        assert!(matcher.is_match(&task("team:prod", "r", "t-1")));
        assert!(!matcher.is_match(&task("team", "prod:r", "t-1")));
    }

    #[test]
    fn namespace_round_trips_through_str() {
        for ns in Namespace::ALL {
            assert_eq!(ns.as_str().parse::<Namespace>().unwrap(), ns);
        }
    }
}
