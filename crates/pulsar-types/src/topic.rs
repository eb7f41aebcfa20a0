//! Topic names and partition-shard handling.

use std::fmt;

use crate::error::{Result, TypesError};

const PARTITION_MARKER: &str = "-partition-";

/// Topic persistence domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TopicDomain {
    Persistent,
    NonPersistent,
}

impl TopicDomain {
    pub fn as_str(&self) -> &'static str {
        match self {
            TopicDomain::Persistent => "persistent",
            TopicDomain::NonPersistent => "non-persistent",
        }
    }
}

/// A fully-qualified topic name: `{domain}://{tenant}/{namespace}/{local}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TopicName {
    pub domain: TopicDomain,
    pub tenant: String,
    pub namespace: String,
    pub local: String,
}

impl TopicName {
    /// Parse a topic name.
    ///
    /// Accepts the full form (`persistent://t/ns/topic`), the short form
    /// `t/ns/topic` (persistent), and a bare local name which resolves to
    /// `public/default` as the broker does.
    pub fn parse(name: &str) -> Result<Self> {
        let invalid = |reason: &str| TypesError::InvalidTopic {
            name: name.to_string(),
            reason: reason.to_string(),
        };

        let (domain, rest) = if let Some(rest) = name.strip_prefix("persistent://") {
            (TopicDomain::Persistent, rest)
        } else if let Some(rest) = name.strip_prefix("non-persistent://") {
            (TopicDomain::NonPersistent, rest)
        } else if name.contains("://") {
            return Err(invalid("unknown domain"));
        } else {
            (TopicDomain::Persistent, name)
        };

        let parts: Vec<&str> = rest.splitn(3, '/').collect();
        let (tenant, namespace, local) = match parts.as_slice() {
            [local] => ("public", "default", *local),
            [tenant, namespace, local] => (*tenant, *namespace, *local),
            _ => return Err(invalid("expected tenant/namespace/topic")),
        };

        if tenant.is_empty() || namespace.is_empty() || local.is_empty() {
            return Err(invalid("empty name segment"));
        }

        Ok(Self {
            domain,
            tenant: tenant.to_string(),
            namespace: namespace.to_string(),
            local: local.to_string(),
        })
    }

    /// The fully-qualified namespace, `tenant/namespace`.
    pub fn namespace_path(&self) -> String {
        format!("{}/{}", self.tenant, self.namespace)
    }

    /// Path of this topic under the admin API, e.g. `persistent/t/ns/topic`.
    pub fn admin_path(&self) -> String {
        format!(
            "{}/{}/{}/{}",
            self.domain.as_str(),
            self.tenant,
            self.namespace,
            self.local
        )
    }
}

impl fmt::Display for TopicName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}://{}/{}/{}",
            self.domain.as_str(),
            self.tenant,
            self.namespace,
            self.local
        )
    }
}

/// Return the parent topic of a partition shard.
///
/// A shard name ends with `-partition-<digits>`; anything else returns `None`.
pub fn partition_parent(name: &str) -> Option<&str> {
    let idx = name.rfind(PARTITION_MARKER)?;
    let digits = &name[idx + PARTITION_MARKER.len()..];
    if idx == 0 || digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(&name[..idx])
}

/// Name of shard `index` of a partitioned topic.
pub fn partition_name(topic: &str, index: u32) -> String {
    format!("{topic}{PARTITION_MARKER}{index}")
}

pub fn is_partition_shard(name: &str) -> bool {
    partition_parent(name).is_some()
}

/// File stem used for a topic's message file in a snapshot.
pub fn snapshot_file_stem(topic: &str) -> String {
    topic.replace('/', "_")
}
