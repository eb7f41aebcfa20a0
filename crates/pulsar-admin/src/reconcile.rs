//! Topic reconciliation.
//!
//! The admin API has three overlapping ways to list a namespace's topics and
//! none of them alone is complete: the plain listing reports partition shards
//! (`orders-partition-0`), the partitioned listing reports parents, and
//! system topics only show up when explicitly requested. The reconciler
//! queries all three and folds them into one canonical set where each topic
//! appears exactly once under its parent identity.

use std::collections::{BTreeSet, HashSet};

use pulsar_types::partition_parent;

use crate::client::{DirectoryClient, TopicSource};

/// Canonical topics of one or more namespaces.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopicSet {
    /// Partitioned topic parents, sorted
    pub partitioned: Vec<String>,
    /// Non-partitioned topics, sorted
    pub non_partitioned: Vec<String>,
    /// Every name any source returned, deduplicated in first-seen order
    pub raw: Vec<String>,
}

impl TopicSet {
    /// Partitioned topics followed by non-partitioned topics.
    pub fn canonical(&self) -> Vec<String> {
        self.partitioned
            .iter()
            .chain(self.non_partitioned.iter())
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.partitioned.len() + self.non_partitioned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_partitioned(&self, topic: &str) -> bool {
        self.partitioned.iter().any(|t| t == topic)
    }

    /// Merge another set into this one. Subset order is preserved, so the
    /// canonical order lists every partitioned topic before any plain one.
    pub fn extend(&mut self, other: TopicSet) {
        let mut seen: HashSet<String> = self.raw.iter().cloned().collect();
        self.merge(other, &mut seen);
    }

    /// Like [`TopicSet::extend`], with `seen` holding every name already in
    /// `raw`.
    fn merge(&mut self, other: TopicSet, seen: &mut HashSet<String>) {
        self.partitioned.extend(other.partitioned);
        self.non_partitioned.extend(other.non_partitioned);
        push_unique(&mut self.raw, seen, other.raw);
    }
}

fn push_unique(
    raw: &mut Vec<String>,
    seen: &mut HashSet<String>,
    names: impl IntoIterator<Item = String>,
) {
    for name in names {
        if seen.insert(name.clone()) {
            raw.push(name);
        }
    }
}

/// Fold raw listings into a [`TopicSet`].
///
/// Shard names collapse to their parent. Names reported by the partitioned
/// source are parents themselves. A name that is both a partitioned parent and
/// a plain name is kept only as partitioned.
pub fn fold_listings<'a, I>(listings: I) -> TopicSet
where
    I: IntoIterator<Item = (TopicSource, &'a [String])>,
{
    let mut partitioned = BTreeSet::new();
    let mut non_partitioned = BTreeSet::new();
    let mut raw: Vec<String> = Vec::new();
    let mut seen = HashSet::new();

    for (source, names) in listings {
        push_unique(&mut raw, &mut seen, names.iter().cloned());
        for name in names {
            if let Some(parent) = partition_parent(name) {
                partitioned.insert(parent.to_string());
            } else if source == TopicSource::Partitioned {
                partitioned.insert(name.clone());
            } else {
                non_partitioned.insert(name.clone());
            }
        }
    }

    let non_partitioned = non_partitioned
        .into_iter()
        .filter(|name| !partitioned.contains(name))
        .collect();

    TopicSet {
        partitioned: partitioned.into_iter().collect(),
        non_partitioned,
        raw,
    }
}

/// Builds canonical topic sets from a [`DirectoryClient`].
pub struct TopicReconciler<'a, D: DirectoryClient + ?Sized> {
    directory: &'a D,
}

impl<'a, D: DirectoryClient + ?Sized> TopicReconciler<'a, D> {
    pub fn new(directory: &'a D) -> Self {
        Self { directory }
    }

    /// Reconcile the topics of one namespace.
    ///
    /// Never fails: a source that errors contributes no topics.
    pub async fn reconcile(&self, namespace: &str) -> TopicSet {
        let mut listings: Vec<(TopicSource, Vec<String>)> = Vec::with_capacity(3);

        for source in TopicSource::ALL {
            match self.directory.list_topics(namespace, source).await {
                Ok(names) => listings.push((source, names)),
                Err(e) if e.is_not_found() => {
                    tracing::debug!("No {source:?} topics for namespace {namespace}: {e}");
                }
                Err(e) => {
                    tracing::warn!("Failed to list {source:?} topics for namespace {namespace}: {e}");
                }
            }
        }

        let set = fold_listings(
            listings
                .iter()
                .map(|(source, names)| (*source, names.as_slice())),
        );

        tracing::debug!(
            "Namespace {namespace}: {} topics ({} partitioned, {} non-partitioned, {} raw)",
            set.len(),
            set.partitioned.len(),
            set.non_partitioned.len(),
            set.raw.len()
        );

        set
    }

    /// Reconcile several namespaces in order and concatenate their sets.
    pub async fn reconcile_all(&self, namespaces: &[String]) -> TopicSet {
        let mut all = TopicSet::default();
        let mut seen = HashSet::new();
        for namespace in namespaces {
            all.merge(self.reconcile(namespace).await, &mut seen);
        }
        all
    }
}
