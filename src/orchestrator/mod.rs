//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责命令调度和全局统计，是整个系统的"指挥中心"。
//!
//! ### `app` - 应用运行器
//! - 管理应用生命周期（初始化、运行）
//! - 持有存储后端（`Arc<dyn DocumentStore>`）
//! - 为每个导入文件创建一个 `ImportSession`，顺序执行
//! - 输出全局统计信息
//!
//! ## 层次关系
//!
//! ```text
//! app (处理 Vec<文件>)
//!     ↓
//! workflow::ImportSession (处理单个文件)
//!     ↓
//! services (能力层：validator / importer / template / seeder)
//!     ↓
//! infrastructure (基础设施：DocumentStore)
//! ```
//!
//! ## 设计原则
//!
//! 1. **资源隔离**：只有编排层持有存储客户端
//! 2. **向下依赖**：编排层 → workflow → services → infrastructure
//! 3. **无业务逻辑**：只做调度和统计，不做具体校验

pub mod app;

pub use app::{App, ImportRequest, ImportStats};
