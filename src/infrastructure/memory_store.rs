//! 进程内文档存储
//!
//! 用于测试和 dry-run。提交在一把锁内完成，批次要么全部写入要么全部不写。

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use futures::future::BoxFuture;
use serde_json::{Map, Value as JsonValue};
use tracing::debug;

use super::store::{CommitReceipt, DocumentStore, FieldValue, WriteBatch};
use crate::error::StoreError;

/// 模拟存储拒绝提交的方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectMode {
    PermissionDenied,
    Unavailable,
}

/// 已写入的文档（时间戳已解析为 RFC 3339 字符串）
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub fields: Map<String, JsonValue>,
}

#[derive(Debug, Default)]
struct MemoryState {
    collections: HashMap<String, BTreeMap<String, StoredDocument>>,
    reject: Option<RejectMode>,
    commits: usize,
}

/// 进程内文档存储，clone 后共享同一份数据
#[derive(Debug, Clone)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    max_batch_writes: usize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// 默认单批上限 500，与 Firestore 一致
    pub fn new() -> Self {
        Self::with_max_batch_writes(500)
    }

    pub fn with_max_batch_writes(max_batch_writes: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryState::default())),
            max_batch_writes,
        }
    }

    /// 之后的提交全部按指定方式拒绝；`None` 恢复正常
    pub fn reject_commits(&self, mode: Option<RejectMode>) {
        self.lock().reject = mode;
    }

    /// 集合中的全部文档（按 ID 排序）
    pub fn documents(&self, collection: &str) -> Vec<StoredDocument> {
        self.lock()
            .collections
            .get(collection)
            .map(|docs| docs.values().cloned().collect())
            .unwrap_or_default()
    }

    /// 集合中的文档数
    pub fn count(&self, collection: &str) -> usize {
        self.lock()
            .collections
            .get(collection)
            .map(BTreeMap::len)
            .unwrap_or(0)
    }

    /// 按字段相等过滤
    pub fn find_by_field(&self, collection: &str, field: &str, value: &JsonValue) -> Vec<StoredDocument> {
        self.documents(collection)
            .into_iter()
            .filter(|doc| doc.fields.get(field) == Some(value))
            .collect()
    }

    /// 成功提交的批次数
    pub fn commit_count(&self) -> usize {
        self.lock().commits
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        // 锁内没有会 panic 的代码，中毒时直接取回数据
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn apply(&self, batch: WriteBatch) -> Result<CommitReceipt, StoreError> {
        if batch.len() > self.max_batch_writes {
            return Err(StoreError::BatchLimitExceeded {
                limit: self.max_batch_writes,
                attempted: batch.len(),
            });
        }

        let mut state = self.lock();
        match state.reject {
            Some(RejectMode::PermissionDenied) => {
                return Err(StoreError::PermissionDenied {
                    message: "Missing or insufficient permissions.".to_string(),
                })
            }
            Some(RejectMode::Unavailable) => {
                return Err(StoreError::unavailable(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    "memory store is offline",
                )))
            }
            None => {}
        }

        let commit_time = Utc::now();
        let timestamp = JsonValue::String(commit_time.to_rfc3339());
        let mut documents = Vec::with_capacity(batch.len());

        for write in batch.into_writes() {
            let fields: Map<String, JsonValue> = write
                .fields
                .iter()
                .map(|(name, value)| {
                    let resolved = match value {
                        FieldValue::Json(v) => v.clone(),
                        FieldValue::ServerTimestamp => timestamp.clone(),
                    };
                    (name.to_string(), resolved)
                })
                .collect();

            state
                .collections
                .entry(write.doc_ref.collection.clone())
                .or_default()
                .insert(
                    write.doc_ref.id.clone(),
                    StoredDocument {
                        id: write.doc_ref.id.clone(),
                        fields,
                    },
                );
            documents.push(write.doc_ref);
        }

        state.commits += 1;
        debug!("内存存储提交完成: {} 个文档", documents.len());

        Ok(CommitReceipt {
            documents,
            commit_time,
        })
    }
}

impl DocumentStore for MemoryStore {
    fn commit(&self, batch: WriteBatch) -> BoxFuture<'_, Result<CommitReceipt, StoreError>> {
        Box::pin(futures::future::ready(self.apply(batch)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::store::Fields;
    use serde_json::json;

    fn batch_of(store: &MemoryStore, n: usize) -> WriteBatch {
        let mut batch = WriteBatch::new();
        for i in 0..n {
            let mut fields = Fields::new();
            fields.insert("name", json!(format!("Topik {}", i + 1)));
            fields.insert("createdAt", store.server_timestamp());
            batch.set(store.new_document_ref("topics"), fields);
        }
        batch
    }

    #[tokio::test]
    async fn test_commit_resolves_server_timestamp() {
        let store = MemoryStore::new();
        let receipt = store.commit(batch_of(&store, 2)).await.unwrap();

        assert_eq!(receipt.documents.len(), 2);
        let docs = store.documents("topics");
        assert_eq!(docs.len(), 2);
        for doc in docs {
            let created = doc.fields["createdAt"].as_str().unwrap();
            assert_eq!(created, receipt.commit_time.to_rfc3339());
        }
    }

    #[tokio::test]
    async fn test_batch_over_limit_writes_nothing() {
        let store = MemoryStore::with_max_batch_writes(3);
        let err = store.commit(batch_of(&store, 4)).await.unwrap_err();

        assert!(matches!(
            err,
            StoreError::BatchLimitExceeded {
                limit: 3,
                attempted: 4
            }
        ));
        assert_eq!(store.count("topics"), 0);
        assert_eq!(store.commit_count(), 0);
    }

    #[tokio::test]
    async fn test_rejected_commit_writes_nothing() {
        let store = MemoryStore::new();
        store.reject_commits(Some(RejectMode::PermissionDenied));
        let err = store.commit(batch_of(&store, 2)).await.unwrap_err();
        assert!(matches!(err, StoreError::PermissionDenied { .. }));
        assert_eq!(store.count("topics"), 0);

        store.reject_commits(None);
        store.commit(batch_of(&store, 2)).await.unwrap();
        assert_eq!(store.count("topics"), 2);
    }

    #[test]
    fn test_find_by_field() {
        let store = MemoryStore::new();
        let mut batch = WriteBatch::new();
        for topic in ["T1", "T1", "T2"] {
            let mut fields = Fields::new();
            fields.insert("topicId", json!(topic));
            batch.set(store.new_document_ref("questions"), fields);
        }
        tokio_test::block_on(store.commit(batch)).unwrap();

        assert_eq!(store.find_by_field("questions", "topicId", &json!("T1")).len(), 2);
        assert_eq!(store.find_by_field("questions", "topicId", &json!("T3")).len(), 0);
    }
}
