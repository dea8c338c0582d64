//! 批量导入服务 - 业务能力层
//!
//! 只负责"把一组已校验的题目原子写入题库"，不关心文件、校验和界面状态

use chrono::{DateTime, Utc};
use serde_json::{json, Value as JsonValue};
use tracing::{debug, info};

use crate::error::StoreError;
use crate::infrastructure::{DocumentStore, Fields, WriteBatch};
use crate::models::AcceptedRow;

/// 导入成功后的回执
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportReceipt {
    /// 新建文档的 ID（与输入顺序一致）
    pub document_ids: Vec<String>,
    /// 存储提交时间；空列表未提交时为 None
    pub commit_time: Option<DateTime<Utc>>,
}

impl ImportReceipt {
    pub fn len(&self) -> usize {
        self.document_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.document_ids.is_empty()
    }
}

/// 批量导入服务
///
/// 职责：
/// - 为每道题生成新的文档引用
/// - 追加 subjectId / topicId / createdAt / updatedAt
/// - 一次原子提交，失败不重试
pub struct BatchImporter<S: DocumentStore> {
    store: S,
    collection: String,
}

impl<S: DocumentStore> BatchImporter<S> {
    /// 创建新的批量导入服务
    pub fn new(store: S, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// 把题目暂存进一个写入批次（不提交）
    ///
    /// 导入文件中的原始字段原样写入，关联字段和时间戳在后，同名时后者覆盖
    pub fn build_batch(
        &self,
        subject_id: &str,
        topic_id: &str,
        questions: &[AcceptedRow],
    ) -> Result<WriteBatch, StoreError> {
        let mut batch = WriteBatch::new();

        for row in questions {
            let mut fields = Fields::new();
            fields.merge_object(JsonValue::Object(row.fields.clone()))?;
            fields.insert("subjectId", json!(subject_id));
            fields.insert("topicId", json!(topic_id));
            fields.insert("createdAt", self.store.server_timestamp());
            fields.insert("updatedAt", self.store.server_timestamp());

            batch.set(self.store.new_document_ref(&self.collection), fields);
        }

        Ok(batch)
    }

    /// 导入题目
    ///
    /// # 参数
    /// - `subject_id`: 科目文档 ID
    /// - `topic_id`: 主题文档 ID
    /// - `questions`: 已通过校验的题目
    ///
    /// # 返回
    /// 全部写入成功返回回执；提交被拒绝时返回存储错误，此时一条也没有写入
    pub async fn import_questions(
        &self,
        subject_id: &str,
        topic_id: &str,
        questions: &[AcceptedRow],
    ) -> Result<ImportReceipt, StoreError> {
        if questions.is_empty() {
            debug!("题目列表为空，跳过提交");
            return Ok(ImportReceipt::default());
        }

        let batch = self.build_batch(subject_id, topic_id, questions)?;
        debug!(
            "提交导入批次: {} 道题 → {} (subject: {}, topic: {})",
            batch.len(),
            self.collection,
            subject_id,
            topic_id
        );

        let receipt = self.store.commit(batch).await?;
        info!(
            "✓ 已写入 {} 道题 (提交时间: {})",
            receipt.documents.len(),
            receipt.commit_time.to_rfc3339()
        );

        Ok(ImportReceipt {
            document_ids: receipt.documents.into_iter().map(|d| d.id).collect(),
            commit_time: Some(receipt.commit_time),
        })
    }
}
