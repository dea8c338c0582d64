//! 文档存储能力 - 基础设施层
//!
//! 只暴露导入流程需要的四个写入原语：
//! 新建文档引用、在批次中暂存字段写入、原子提交、服务端时间戳占位符。
//! 不提供查询能力。

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use serde_json::Value as JsonValue;

use crate::error::StoreError;

/// 自动生成的文档 ID 长度
pub const AUTO_ID_LEN: usize = 20;

const AUTO_ID_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// 生成 20 位字母数字文档 ID
pub fn auto_id() -> String {
    let mut bytes = [0u8; 32];
    bytes[..16].copy_from_slice(uuid::Uuid::new_v4().as_bytes());
    bytes[16..].copy_from_slice(uuid::Uuid::new_v4().as_bytes());
    bytes
        .iter()
        .take(AUTO_ID_LEN)
        .map(|b| AUTO_ID_ALPHABET[*b as usize % AUTO_ID_ALPHABET.len()] as char)
        .collect()
}

/// 集合内的一个文档引用
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentRef {
    pub collection: String,
    pub id: String,
}

impl DocumentRef {
    pub fn new(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            id: id.into(),
        }
    }

    /// `collection/id`
    pub fn path(&self) -> String {
        format!("{}/{}", self.collection, self.id)
    }
}

/// 字段值：普通 JSON 值，或提交时由服务端解析的时间戳
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Json(JsonValue),
    ServerTimestamp,
}

impl From<JsonValue> for FieldValue {
    fn from(value: JsonValue) -> Self {
        FieldValue::Json(value)
    }
}

/// 有序字段表，同名字段后写覆盖先写
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields {
    entries: Vec<(String, FieldValue)>,
}

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    /// 写入字段，已存在则原位覆盖
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// 把 JSON 对象的所有字段合并进来；非对象值返回编码错误
    pub fn merge_object(&mut self, value: JsonValue) -> Result<(), StoreError> {
        match value {
            JsonValue::Object(map) => {
                for (name, v) in map {
                    self.insert(name, v);
                }
                Ok(())
            }
            other => Err(StoreError::Encode(format!(
                "文档字段必须是 JSON 对象，实际为: {}",
                other
            ))),
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 批次中暂存的一次写入
#[derive(Debug, Clone, PartialEq)]
pub struct StagedWrite {
    pub doc_ref: DocumentRef,
    pub fields: Fields,
}

/// 待提交的写入批次
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    writes: Vec<StagedWrite>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// 暂存一次整文档写入
    pub fn set(&mut self, doc_ref: DocumentRef, fields: Fields) {
        self.writes.push(StagedWrite { doc_ref, fields });
    }

    pub fn writes(&self) -> &[StagedWrite] {
        &self.writes
    }

    pub fn into_writes(self) -> Vec<StagedWrite> {
        self.writes
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }
}

/// 提交成功后的回执
#[derive(Debug, Clone, PartialEq)]
pub struct CommitReceipt {
    /// 写入的文档引用（与批次顺序一致）
    pub documents: Vec<DocumentRef>,
    /// 服务端提交时间
    pub commit_time: DateTime<Utc>,
}

/// 文档存储能力
///
/// 职责：
/// - 生成新的文档引用
/// - 原子提交一个写入批次（要么全部可见，要么全部不可见）
/// - 提供服务端时间戳占位符
/// - 不认识题目 / 科目
pub trait DocumentStore: Send + Sync {
    /// 在集合中生成一个新的文档引用（此时尚未写入）
    fn new_document_ref(&self, collection: &str) -> DocumentRef {
        DocumentRef::new(collection, auto_id())
    }

    /// 服务端时间戳占位符
    fn server_timestamp(&self) -> FieldValue {
        FieldValue::ServerTimestamp
    }

    /// 原子提交批次
    fn commit(&self, batch: WriteBatch) -> BoxFuture<'_, Result<CommitReceipt, StoreError>>;
}

impl<S: DocumentStore + ?Sized> DocumentStore for Arc<S> {
    fn new_document_ref(&self, collection: &str) -> DocumentRef {
        (**self).new_document_ref(collection)
    }

    fn server_timestamp(&self) -> FieldValue {
        (**self).server_timestamp()
    }

    fn commit(&self, batch: WriteBatch) -> BoxFuture<'_, Result<CommitReceipt, StoreError>> {
        (**self).commit(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_auto_id_shape() {
        let a = auto_id();
        let b = auto_id();
        assert_eq!(a.len(), AUTO_ID_LEN);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_fields_later_insert_overrides_in_place() {
        let mut fields = Fields::new();
        fields.insert("questionText", json!("1+1?"));
        fields.insert("subjectId", json!("lama"));
        fields.insert("subjectId", json!("S1"));

        let names: Vec<_> = fields.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["questionText", "subjectId"]);
        assert_eq!(fields.get("subjectId"), Some(&FieldValue::Json(json!("S1"))));
    }

    #[test]
    fn test_merge_object_rejects_non_objects() {
        let mut fields = Fields::new();
        assert!(fields.merge_object(json!({"a": 1, "b": true})).is_ok());
        assert_eq!(fields.len(), 2);
        assert!(matches!(
            fields.merge_object(json!([1, 2])),
            Err(StoreError::Encode(_))
        ));
    }
}
