//! 流程层（Workflow Layer）
//!
//! - `import_ctx` - 导入会话上下文（日志前缀）
//! - `import_session` - 一次导入的状态机：加载 → 预览 → 确认

pub mod import_ctx;
pub mod import_session;

pub use import_ctx::ImportCtx;
pub use import_session::{
    ConfirmOutcome, ImportSession, SessionState, SuccessCallback, IMPORT_FAILED_ERROR, PARSE_ERROR,
};
