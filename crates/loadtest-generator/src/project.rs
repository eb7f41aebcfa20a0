//! Project id detection from topic names.

pub const DEFAULT_PROJECT_ID: u64 = 1;

const INGESTION_MARKER: &str = "ingestion-";

/// Where a resolved project id came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectIdSource {
    Explicit,
    Detected,
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedProjectId {
    pub id: u64,
    pub source: ProjectIdSource,
}

/// Find the project id in topic names like `.../post-ingestion-495`.
///
/// Returns the digits following the first `ingestion-` that is followed by
/// at least one digit.
pub fn extract_project_id(topic: &str) -> Option<u64> {
    topic.match_indices(INGESTION_MARKER).find_map(|(idx, _)| {
        let rest = &topic[idx + INGESTION_MARKER.len()..];
        let end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        rest[..end].parse().ok()
    })
}

/// Pick the project id for a publish run.
///
/// An explicit id always wins. Otherwise the id is detected from the topic
/// when `auto_detect` is set, falling back to [`DEFAULT_PROJECT_ID`].
pub fn resolve_project_id(topic: &str, explicit: Option<u64>, auto_detect: bool) -> ResolvedProjectId {
    if let Some(id) = explicit {
        return ResolvedProjectId {
            id,
            source: ProjectIdSource::Explicit,
        };
    }

    if auto_detect {
        if let Some(id) = extract_project_id(topic) {
            tracing::info!("Auto-detected project ID: {id} from topic: {topic}");
            return ResolvedProjectId {
                id,
                source: ProjectIdSource::Detected,
            };
        }
        tracing::warn!(
            "Could not auto-detect project ID from topic {topic}, using default: {DEFAULT_PROJECT_ID}"
        );
    } else {
        tracing::warn!("No project ID given, using default: {DEFAULT_PROJECT_ID}");
    }

    ResolvedProjectId {
        id: DEFAULT_PROJECT_ID,
        source: ProjectIdSource::Default,
    }
}
