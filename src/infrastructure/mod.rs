//! 基础设施层（Infrastructure Layer）
//!
//! 持有存储客户端，只暴露写入能力：
//! - `store` - `DocumentStore` 能力定义、写入批次、字段值
//! - `memory_store` - 进程内实现（测试 / dry-run）
//! - `firestore` - Firestore REST 实现

pub mod firestore;
pub mod memory_store;
pub mod store;

use std::sync::Arc;

pub use firestore::FirestoreStore;
pub use memory_store::{MemoryStore, RejectMode, StoredDocument};
pub use store::{CommitReceipt, DocumentRef, DocumentStore, FieldValue, Fields, WriteBatch};

use crate::config::{Config, StoreBackend};
use crate::error::StoreError;

/// 按配置创建存储后端
pub fn connect_store(config: &Config) -> Result<Arc<dyn DocumentStore>, StoreError> {
    match config.store_backend {
        StoreBackend::Memory => {
            tracing::info!("使用内存存储（数据不会持久化）");
            Ok(Arc::new(MemoryStore::with_max_batch_writes(config.max_batch_writes)))
        }
        StoreBackend::Firestore => {
            tracing::info!("连接 Firestore 项目: {}", config.firestore_project_id);
            Ok(Arc::new(FirestoreStore::new(config)?))
        }
    }
}
