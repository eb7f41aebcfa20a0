//! `emailSend` event document.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailSendEvent {
    pub event_id: String,
    pub correlation_id: String,
    pub created_at: String,
    pub payload_version: u32,
    pub payload_type: String,
    pub payload: EventPayload,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPayload {
    pub project_id: u64,
    pub user_key: String,
    pub doc_type: String,
    pub metadata: EventMetadata,
    pub data: EventData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventMetadata {
    pub telemetry: Telemetry,
    pub es_context: EsContext,
    pub source: EventSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Telemetry {
    pub ingest_request_time: String,
    pub ingest_start_time: String,
    pub ingest_finish_time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EsContext {
    pub document_id: String,
    pub unconverted_document_id: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSource {
    pub action: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventData {
    /// Always an empty object for emailSend
    pub data: serde_json::Map<String, serde_json::Value>,
    pub diff: EmailSendDiff,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailSendDiff {
    pub template_id: u32,
    pub campaign_id: u64,
    pub email: String,
    pub message_id: String,
    pub itbl_internal: ItblInternal,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItblInternal {
    pub document_created_at: String,
    pub document_updated_at: String,
}

impl EmailSendEvent {
    pub fn to_json_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
