//! # Question Import
//!
//! 题库 JSON 批量导入工具：校验导入文件，预览，确认后原子写入题库
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有存储客户端，只暴露写入能力
//! - `DocumentStore` - 新建文档引用、批次写入、原子提交、服务端时间戳
//! - `MemoryStore` / `FirestoreStore` - 两种实现
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `validate_import_data` - 校验能力（纯函数）
//! - `get_template` / `TemplateWriter` - 模板能力
//! - `BatchImporter` - 批量写入能力
//! - `CurriculumSeeder` - 科目 / 主题初始化能力
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一次导入"的完整流程
//! - `ImportCtx` - 上下文封装（subject_id + topic_id + 文件名）
//! - `ImportSession` - 状态机（Idle → Previewing → Importing）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/app` - 命令调度，逐个文件创建导入会话
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{DocumentStore, MemoryStore};
pub use models::question::{AcceptedRow, Difficulty, ImportQuestion, QuestionType};
pub use orchestrator::{App, ImportRequest, ImportStats};
pub use services::{get_template, validate_import_data, BatchImporter, ValidationReport};
pub use workflow::{ImportCtx, ImportSession};
