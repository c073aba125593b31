//! Wire types for the import endpoint.

use recollect_core::{layer, metadata, Metadata, Role};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::batch::Batch;

/// Tag written into every uploaded message's metadata.
pub const IMPORT_SOURCE: &str = "complete_history_migration";

#[derive(Debug, Clone, Serialize)]
pub struct ImportRequest {
    pub data: ImportData,
    pub options: ImportOptions,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportData {
    pub messages: Vec<ImportMessage>,
    pub memories: Vec<Value>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportMessage {
    pub role: Role,
    pub content: String,
    pub timestamp: String,
    pub external_id: String,
    pub metadata: Metadata,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportOptions {
    pub platform: String,
    pub dry_run: bool,
    /// Always sent, as `null` when absent.
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
}

/// Per-run values that shape every request.
#[derive(Debug, Clone)]
pub struct RequestSettings {
    pub platform: String,
    pub dry_run: bool,
    pub idempotency_prefix: Option<String>,
}

/// Keys layered over a message's parse metadata on upload.
pub fn import_overlay(original_order: usize) -> Metadata {
    metadata::from_pairs([
        ("historical_import", json!(true)),
        ("foundational_memory", json!(true)),
        ("batch_import", json!(true)),
        ("original_order", json!(original_order)),
        ("import_source", json!(IMPORT_SOURCE)),
    ])
}

impl ImportRequest {
    pub fn for_batch(batch: &Batch<'_, '_>, settings: &RequestSettings) -> Self {
        let messages = batch
            .entries
            .iter()
            .map(|entry| {
                let m = entry.message;
                ImportMessage {
                    role: m.role,
                    content: m.content.clone(),
                    timestamp: m.timestamp.clone(),
                    external_id: m.id.clone(),
                    metadata: layer(&m.metadata, &import_overlay(entry.original_order)),
                }
            })
            .collect();

        Self {
            data: ImportData {
                messages,
                memories: Vec::new(),
            },
            options: ImportOptions {
                platform: settings.platform.clone(),
                dry_run: settings.dry_run,
                session_id: None,
                idempotency_key: settings
                    .idempotency_prefix
                    .as_ref()
                    .map(|prefix| format!("{prefix}_{}", batch.number)),
            },
        }
    }

    pub fn len(&self) -> usize {
        self.data.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.messages.is_empty()
    }
}

/// Body of a 200 import response. Missing counters read as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImportResponse {
    pub successful: usize,
    pub failed: usize,
    pub total_processed: usize,
    pub duplicates: Option<usize>,
    pub import_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::{partition, select};
    use recollect_core::Message;

    fn parsed(i: usize, role: Role) -> Message {
        Message {
            id: format!("id-{i}"),
            role,
            content: format!("body {i}"),
            timestamp: format!("2024-07-01T00:0{i}:00Z"),
            metadata: metadata::from_pairs([
                ("source", json!("historical_conversation")),
                ("line_start", json!(i + 1)),
            ]),
        }
    }

    fn settings(prefix: Option<&str>) -> RequestSettings {
        RequestSettings {
            platform: "manual".to_string(),
            dry_run: false,
            idempotency_prefix: prefix.map(str::to_string),
        }
    }

    #[test]
    fn request_shape() {
        let messages = vec![parsed(0, Role::User), parsed(1, Role::Assistant)];
        let selected = select(&messages, false);
        let batches = partition(&selected, 50).unwrap();
        let req = ImportRequest::for_batch(&batches[0], &settings(None));

        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["data"]["memories"], json!([]));
        assert_eq!(v["options"]["platform"], "manual");
        assert_eq!(v["options"]["dryRun"], false);
        assert!(v["options"]["sessionId"].is_null());
        assert!(v["options"].get("idempotencyKey").is_none());

        let first = &v["data"]["messages"][0];
        assert_eq!(first["role"], "user");
        assert_eq!(first["content"], "body 0");
        assert_eq!(first["externalId"], "id-0");
        assert_eq!(first["timestamp"], "2024-07-01T00:00:00Z");
    }

    #[test]
    fn metadata_is_layered_not_replaced() {
        let messages = vec![parsed(0, Role::User), parsed(1, Role::Assistant)];
        let selected = select(&messages, false);
        let batches = partition(&selected, 1).unwrap();
        let req = ImportRequest::for_batch(&batches[1], &settings(None));

        let meta = &req.data.messages[0].metadata;
        assert_eq!(meta["source"], "historical_conversation");
        assert_eq!(meta["line_start"], 2);
        assert_eq!(meta["historical_import"], true);
        assert_eq!(meta["foundational_memory"], true);
        assert_eq!(meta["batch_import"], true);
        assert_eq!(meta["original_order"], 1);
        assert_eq!(meta["import_source"], IMPORT_SOURCE);

        // parse-stage map untouched
        assert!(!messages[1].metadata.contains_key("original_order"));
    }

    #[test]
    fn idempotency_key_uses_batch_number() {
        let messages: Vec<Message> = (0..5).map(|i| parsed(i, Role::User)).collect();
        let selected = select(&messages, false);
        let batches = partition(&selected, 2).unwrap();
        let req = ImportRequest::for_batch(&batches[2], &settings(Some("history")));
        assert_eq!(req.options.idempotency_key.as_deref(), Some("history_3"));
        assert_eq!(req.len(), 1);
    }

    #[test]
    fn response_defaults_missing_fields() {
        let resp: ImportResponse =
            serde_json::from_str(r#"{"successful": 48, "failed": 2, "totalProcessed": 50}"#)
                .unwrap();
        assert_eq!(resp.successful, 48);
        assert_eq!(resp.total_processed, 50);
        assert_eq!(resp.duplicates, None);

        let resp: ImportResponse =
            serde_json::from_str(r#"{"duplicates": 3, "importId": "imp-1", "extra": 1}"#).unwrap();
        assert_eq!(resp.successful, 0);
        assert_eq!(resp.duplicates, Some(3));
        assert_eq!(resp.import_id.as_deref(), Some("imp-1"));
    }
}
