//! Cluster topology: tenants, namespaces and canonical topics.

use thiserror::Error;

use crate::topic::{is_partition_shard, TopicName};

/// Ordered tenants, namespaces and canonical topics of a cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterTopology {
    pub tenants: Vec<String>,
    /// Fully-qualified `tenant/namespace` names
    pub namespaces: Vec<String>,
    /// Canonical topic names, never partition shards
    pub topics: Vec<String>,
}

/// A broken topology invariant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopologyViolation {
    #[error("namespace '{namespace}' belongs to unknown tenant '{tenant}'")]
    UnknownTenant { namespace: String, tenant: String },

    #[error("namespace '{0}' is not of the form tenant/namespace")]
    MalformedNamespace(String),

    #[error("topic '{topic}' belongs to unknown namespace '{namespace}'")]
    UnknownNamespace { topic: String, namespace: String },

    #[error("topic '{0}' is a partition shard")]
    PartitionShard(String),

    #[error("topic '{0}' is not a valid topic name")]
    MalformedTopic(String),
}

impl ClusterTopology {
    /// Check the containment invariants and return every violation found.
    pub fn validate(&self) -> Vec<TopologyViolation> {
        let mut violations = Vec::new();

        for namespace in &self.namespaces {
            match namespace.split_once('/') {
                Some((tenant, rest)) if !tenant.is_empty() && !rest.is_empty() => {
                    if !self.tenants.iter().any(|t| t == tenant) {
                        violations.push(TopologyViolation::UnknownTenant {
                            namespace: namespace.clone(),
                            tenant: tenant.to_string(),
                        });
                    }
                }
                _ => violations.push(TopologyViolation::MalformedNamespace(namespace.clone())),
            }
        }

        for topic in &self.topics {
            if is_partition_shard(topic) {
                violations.push(TopologyViolation::PartitionShard(topic.clone()));
                continue;
            }
            match TopicName::parse(topic) {
                Ok(name) => {
                    let namespace = name.namespace_path();
                    if !self.namespaces.contains(&namespace) {
                        violations.push(TopologyViolation::UnknownNamespace {
                            topic: topic.clone(),
                            namespace,
                        });
                    }
                }
                Err(_) => violations.push(TopologyViolation::MalformedTopic(topic.clone())),
            }
        }

        violations
    }

    pub fn is_empty(&self) -> bool {
        self.tenants.is_empty() && self.namespaces.is_empty() && self.topics.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topology() -> ClusterTopology {
        ClusterTopology {
            tenants: vec!["t".to_string()],
            namespaces: vec!["t/ns".to_string()],
            topics: vec!["persistent://t/ns/orders".to_string()],
        }
    }

    #[test]
    fn test_valid_topology() {
        assert!(topology().validate().is_empty());
    }

    #[test]
    fn test_detects_violations() {
        let mut topo = topology();
        topo.namespaces.push("other/ns".to_string());
        topo.topics.push("persistent://t/missing/x".to_string());
        topo.topics.push("persistent://t/ns/orders-partition-0".to_string());

        let violations = topo.validate();
        assert_eq!(violations.len(), 3);
        assert!(violations.contains(&TopologyViolation::UnknownTenant {
            namespace: "other/ns".to_string(),
            tenant: "other".to_string(),
        }));
        assert!(violations.contains(&TopologyViolation::UnknownNamespace {
            topic: "persistent://t/missing/x".to_string(),
            namespace: "t/missing".to_string(),
        }));
        assert!(violations.contains(&TopologyViolation::PartitionShard(
            "persistent://t/ns/orders-partition-0".to_string()
        )));
    }

    #[test]
    fn test_malformed_namespace() {
        let topo = ClusterTopology {
            tenants: vec!["t".to_string()],
            namespaces: vec!["ns-without-tenant".to_string()],
            topics: vec![],
        };
        assert_eq!(
            topo.validate(),
            vec![TopologyViolation::MalformedNamespace(
                "ns-without-tenant".to_string()
            )]
        );
    }
}
