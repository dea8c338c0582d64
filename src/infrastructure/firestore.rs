//! Firestore REST 适配器
//!
//! 通过 `documents:commit` 接口原子提交写入批次：
//! - 字段编码为 Firestore 的类型化值（stringValue / integerValue / ...）
//! - 服务端时间戳编码为 `REQUEST_TIME` 字段变换
//! - 每个写入带 `exists: false` 前置条件，只创建新文档

use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use serde::Deserialize;
use serde_json::{json, Map, Value as JsonValue};
use tracing::{debug, error, warn};

use super::store::{CommitReceipt, DocumentStore, FieldValue, StagedWrite, WriteBatch};
use crate::config::Config;
use crate::error::StoreError;

/// Firestore REST 客户端
pub struct FirestoreStore {
    client: reqwest::Client,
    base_url: String,
    project_id: String,
    database: String,
    token: String,
    max_batch_writes: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommitResponse {
    commit_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

impl FirestoreStore {
    /// 创建新的 Firestore 客户端
    pub fn new(config: &Config) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.firestore_api_base_url.trim_end_matches('/').to_string(),
            project_id: config.firestore_project_id.clone(),
            database: config.firestore_database.clone(),
            token: config.firestore_token.clone(),
            max_batch_writes: config.max_batch_writes,
        })
    }

    /// `projects/{project}/databases/{database}/documents`
    fn documents_root(&self) -> String {
        format!(
            "projects/{}/databases/{}/documents",
            self.project_id, self.database
        )
    }

    fn commit_url(&self) -> String {
        format!("{}/{}:commit", self.base_url, self.documents_root())
    }

    /// 把批次编码为 commit 请求体
    pub fn encode_batch(&self, batch: &WriteBatch) -> JsonValue {
        let root = self.documents_root();
        let writes: Vec<JsonValue> = batch
            .writes()
            .iter()
            .map(|write| encode_write(&root, write))
            .collect();
        json!({ "writes": writes })
    }

    async fn send_commit(&self, batch: WriteBatch) -> Result<CommitReceipt, StoreError> {
        if batch.len() > self.max_batch_writes {
            return Err(StoreError::BatchLimitExceeded {
                limit: self.max_batch_writes,
                attempted: batch.len(),
            });
        }

        let body = self.encode_batch(&batch);
        debug!("提交 Firestore 批次: {} 个写入", batch.len());

        let response = self
            .client
            .post(self.commit_url())
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let err = status_error(status.as_u16(), text);
            error!("Firestore 拒绝提交 (status: {}): {}", status, err);
            return Err(err);
        }

        // 状态码成功即视为已提交
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                warn!("读取提交响应失败，使用本地时间: {}", e);
                String::new()
            }
        };
        Ok(CommitReceipt {
            documents: batch.into_writes().into_iter().map(|w| w.doc_ref).collect(),
            commit_time: commit_time_from_body(&text),
        })
    }
}

/// 非成功状态码 → 存储错误
///
/// 响应体是 Firestore 错误信封时取其中的 message，否则使用原文
fn status_error(status: u16, body: String) -> StoreError {
    let message = serde_json::from_str::<ErrorEnvelope>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body);
    match status {
        401 | 403 => StoreError::PermissionDenied { message },
        code => StoreError::Rejected {
            status: code,
            message,
        },
    }
}

/// 从成功响应中取提交时间；缺失或无法解析时使用本地时间
fn commit_time_from_body(body: &str) -> DateTime<Utc> {
    match serde_json::from_str::<CommitResponse>(body) {
        Ok(parsed) => parsed.commit_time.unwrap_or_else(Utc::now),
        Err(e) => {
            warn!("提交响应无法解析，使用本地时间: {}", e);
            Utc::now()
        }
    }
}

impl DocumentStore for FirestoreStore {
    fn commit(&self, batch: WriteBatch) -> BoxFuture<'_, Result<CommitReceipt, StoreError>> {
        Box::pin(self.send_commit(batch))
    }
}

/// 编码单个写入：普通字段进 `fields`，时间戳占位符进 `updateTransforms`
fn encode_write(root: &str, write: &StagedWrite) -> JsonValue {
    let mut fields = Map::new();
    let mut transforms = Vec::new();

    for (name, value) in write.fields.iter() {
        match value {
            FieldValue::Json(v) => {
                fields.insert(name.to_string(), encode_value(v));
            }
            FieldValue::ServerTimestamp => transforms.push(json!({
                "fieldPath": field_path(name),
                "setToServerValue": "REQUEST_TIME",
            })),
        }
    }

    let mut encoded = json!({
        "update": {
            "name": format!("{}/{}", root, write.doc_ref.path()),
            "fields": fields,
        },
        "currentDocument": { "exists": false },
    });
    if !transforms.is_empty() {
        encoded["updateTransforms"] = JsonValue::Array(transforms);
    }
    encoded
}

/// JSON 值 → Firestore 类型化值
pub fn encode_value(value: &JsonValue) -> JsonValue {
    match value {
        JsonValue::Null => json!({ "nullValue": null }),
        JsonValue::Bool(b) => json!({ "booleanValue": b }),
        JsonValue::Number(n) => match n.as_i64() {
            // integerValue 以字符串传输
            Some(i) => json!({ "integerValue": i.to_string() }),
            None => json!({ "doubleValue": n.as_f64() }),
        },
        JsonValue::String(s) => json!({ "stringValue": s }),
        JsonValue::Array(items) => json!({
            "arrayValue": { "values": items.iter().map(encode_value).collect::<Vec<_>>() }
        }),
        JsonValue::Object(map) => {
            let fields: Map<String, JsonValue> = map
                .iter()
                .map(|(k, v)| (k.clone(), encode_value(v)))
                .collect();
            json!({ "mapValue": { "fields": fields } })
        }
    }
}

/// 非简单标识符的字段名需要用反引号包裹
fn field_path(name: &str) -> String {
    let simple = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if simple {
        name.to_string()
    } else {
        format!("`{}`", name.replace('\\', "\\\\").replace('`', "\\`"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::store::{DocumentRef, Fields};

    fn test_store() -> FirestoreStore {
        let config = Config {
            firestore_project_id: "kuis-anak".to_string(),
            firestore_token: "token".to_string(),
            ..Config::default()
        };
        FirestoreStore::new(&config).unwrap()
    }

    #[test]
    fn test_encode_value_types() {
        assert_eq!(encode_value(&json!("a")), json!({"stringValue": "a"}));
        assert_eq!(encode_value(&json!(false)), json!({"booleanValue": false}));
        assert_eq!(encode_value(&json!(42)), json!({"integerValue": "42"}));
        assert_eq!(encode_value(&json!(1.5)), json!({"doubleValue": 1.5}));
        assert_eq!(encode_value(&JsonValue::Null), json!({"nullValue": null}));
        assert_eq!(
            encode_value(&json!(["3", "4"])),
            json!({"arrayValue": {"values": [{"stringValue": "3"}, {"stringValue": "4"}]}})
        );
        assert_eq!(
            encode_value(&json!({"x": 1})),
            json!({"mapValue": {"fields": {"x": {"integerValue": "1"}}}})
        );
    }

    #[test]
    fn test_encode_batch_uses_transforms_for_timestamps() {
        let store = test_store();
        let mut fields = Fields::new();
        fields.insert("questionText", json!("2+2?"));
        fields.insert("createdAt", FieldValue::ServerTimestamp);
        fields.insert("updatedAt", FieldValue::ServerTimestamp);
        let mut batch = WriteBatch::new();
        batch.set(DocumentRef::new("questions", "abc"), fields);

        let body = store.encode_batch(&batch);
        let write = &body["writes"][0];
        assert_eq!(
            write["update"]["name"],
            "projects/kuis-anak/databases/(default)/documents/questions/abc"
        );
        assert_eq!(
            write["update"]["fields"]["questionText"],
            json!({"stringValue": "2+2?"})
        );
        assert!(write["update"]["fields"].get("createdAt").is_none());
        assert_eq!(
            write["updateTransforms"],
            json!([
                {"fieldPath": "createdAt", "setToServerValue": "REQUEST_TIME"},
                {"fieldPath": "updatedAt", "setToServerValue": "REQUEST_TIME"}
            ])
        );
        assert_eq!(write["currentDocument"], json!({"exists": false}));
    }

    #[test]
    fn test_commit_url() {
        assert_eq!(
            test_store().commit_url(),
            "https://firestore.googleapis.com/v1/projects/kuis-anak/databases/(default)/documents:commit"
        );
    }

    #[test]
    fn test_field_path_quotes_special_names() {
        assert_eq!(field_path("createdAt"), "createdAt");
        assert_eq!(field_path("nilai-akhir"), "`nilai-akhir`");
        assert_eq!(field_path("1st"), "`1st`");
    }

    #[tokio::test]
    async fn test_oversized_batch_is_rejected_before_sending() {
        let store = test_store();
        let mut batch = WriteBatch::new();
        for _ in 0..501 {
            batch.set(store.new_document_ref("questions"), Fields::new());
        }
        let err = store.commit(batch).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::BatchLimitExceeded {
                limit: 500,
                attempted: 501
            }
        ));
    }

    #[test]
    fn test_auth_statuses_map_to_permission_denied() {
        let body = r#"{"error": {"code": 403, "message": "Missing or insufficient permissions.", "status": "PERMISSION_DENIED"}}"#;
        for status in [401, 403] {
            match status_error(status, body.to_string()) {
                StoreError::PermissionDenied { message } => {
                    assert_eq!(message, "Missing or insufficient permissions.")
                }
                other => panic!("unexpected error: {:?}", other),
            }
        }
    }

    #[test]
    fn test_other_statuses_map_to_rejected() {
        let body = r#"{"error": {"code": 409, "message": "Document already exists"}}"#;
        match status_error(409, body.to_string()) {
            StoreError::Rejected { status, message } => {
                assert_eq!(status, 409);
                assert_eq!(message, "Document already exists");
            }
            other => panic!("unexpected error: {:?}", other),
        }

        match status_error(502, "<html>Bad Gateway</html>".to_string()) {
            StoreError::Rejected { status, message } => {
                assert_eq!(status, 502);
                assert_eq!(message, "<html>Bad Gateway</html>");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_commit_time_from_body() {
        let parsed = commit_time_from_body(r#"{"commitTime": "2024-05-01T08:30:00.123456Z", "writeResults": []}"#);
        assert_eq!(parsed.to_rfc3339(), "2024-05-01T08:30:00.123456+00:00");

        // 成功响应体损坏时仍视为已提交
        let before = Utc::now();
        assert!(commit_time_from_body("not json") >= before);
        assert!(commit_time_from_body("{}") >= before);
    }
}
