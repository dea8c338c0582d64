//! 导入会话 - 流程层
//!
//! 核心职责：定义"一次导入"的完整流程
//!
//! 状态流转：
//! 1. Idle - 尚未选择文件
//! 2. Previewing - 已解析并校验，持有错误列表或待导入题目
//! 3. Importing - 正在提交
//!
//! 提交成功 → 回调通知 → 关闭并回到 Idle；
//! 提交失败 → 回到 Previewing，保留预览，追加一条通用错误

use std::path::Path;

use serde_json::Value as JsonValue;
use tracing::{debug, error, info, warn};

use crate::error::AppResult;
use crate::infrastructure::DocumentStore;
use crate::models::{read_import_file, AcceptedRow};
use crate::services::{validate_import_data, BatchImporter, ImportReceipt, TemplateWriter};
use crate::workflow::import_ctx::ImportCtx;

/// 文件不是合法 JSON 时的唯一错误
pub const PARSE_ERROR: &str = "File is not valid JSON";

/// 提交失败时追加的错误
pub const IMPORT_FAILED_ERROR: &str = "Import failed";

/// 会话状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Previewing,
    Importing,
}

/// 确认导入的结果
#[derive(Debug, Clone, PartialEq)]
pub enum ConfirmOutcome {
    /// 已提交
    Imported(ImportReceipt),
    /// 没有可导入的题目，未调用导入服务
    NothingToImport,
    /// 提交被拒绝，预览保留
    Failed,
}

/// 成功回调（无参数，调用方自行刷新题目列表）
pub type SuccessCallback = Box<dyn FnMut() + Send>;

/// 导入会话
///
/// - 持有上下文、导入服务、成功回调和当前状态
/// - `confirm` 需要 `&mut self`，上一次提交未完成前无法再次确认
pub struct ImportSession<S: DocumentStore> {
    ctx: ImportCtx,
    importer: BatchImporter<S>,
    template_writer: TemplateWriter,
    on_success: Option<SuccessCallback>,
    open: bool,
    state: SessionState,
    preview: Vec<AcceptedRow>,
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl<S: DocumentStore> ImportSession<S> {
    /// 创建新的导入会话（关闭状态）
    pub fn new(ctx: ImportCtx, importer: BatchImporter<S>) -> Self {
        Self {
            ctx,
            importer,
            template_writer: TemplateWriter::new(),
            on_success: None,
            open: false,
            state: SessionState::Idle,
            preview: Vec::new(),
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// 设置成功回调
    pub fn on_success(mut self, callback: impl FnMut() + Send + 'static) -> Self {
        self.on_success = Some(Box::new(callback));
        self
    }

    /// 设置模板下载路径
    pub fn with_template_writer(mut self, writer: TemplateWriter) -> Self {
        self.template_writer = writer;
        self
    }

    // ========== 开关 ==========

    pub fn open(&mut self) {
        self.open = true;
    }

    /// 关闭并清空所有状态
    pub fn close(&mut self) {
        self.open = false;
        self.reset();
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    // ========== 状态查询 ==========

    pub fn ctx(&self) -> &ImportCtx {
        &self.ctx
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn preview(&self) -> &[AcceptedRow] {
        &self.preview
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// 预览非空时才能确认
    pub fn can_confirm(&self) -> bool {
        self.state == SessionState::Previewing && !self.preview.is_empty()
    }

    /// 前 `limit` 条错误，超出部分汇总为一行
    pub fn display_errors(&self, limit: usize) -> Vec<String> {
        let mut lines: Vec<String> = self.errors.iter().take(limit).cloned().collect();
        if self.errors.len() > limit {
            lines.push(format!("...and {} more errors", self.errors.len() - limit));
        }
        lines
    }

    // ========== 加载 ==========

    /// 读取文件并进入预览；文件读取失败直接返回错误，状态不变
    pub async fn load_file(&mut self, path: &Path) -> AppResult<()> {
        let file = read_import_file(path).await?;
        self.load_text(&file.content);
        Ok(())
    }

    /// 解析文本并进入预览
    ///
    /// 解析失败与校验失败一样：只有错误，没有预览
    pub fn load_text(&mut self, text: &str) {
        self.open = true;
        self.reset();
        self.state = SessionState::Previewing;

        let data: JsonValue = match serde_json::from_str(text) {
            Ok(data) => data,
            Err(e) => {
                warn!("{} ⚠️ JSON 解析失败: {}", self.ctx, e);
                self.errors.push(PARSE_ERROR.to_string());
                return;
            }
        };

        let report = validate_import_data(&data);
        self.warnings = report.warnings;
        if report.valid {
            info!("{} ✓ 校验通过，共 {} 道题", self.ctx, report.questions.len());
            self.preview = report.questions;
        } else {
            warn!("{} ❌ 校验失败，共 {} 条错误", self.ctx, report.errors.len());
            self.errors = report.errors;
        }
        if !self.warnings.is_empty() {
            debug!("{} 提示 {} 条", self.ctx, self.warnings.len());
        }
    }

    // ========== 提交 ==========

    /// 确认导入
    ///
    /// 预览为空时不调用导入服务
    pub async fn confirm(&mut self) -> ConfirmOutcome {
        if !self.can_confirm() {
            debug!("{} 没有可导入的题目", self.ctx);
            return ConfirmOutcome::NothingToImport;
        }

        self.state = SessionState::Importing;
        info!("{} 📤 开始导入 {} 道题", self.ctx, self.preview.len());

        let result = self
            .importer
            .import_questions(&self.ctx.subject_id, &self.ctx.topic_id, &self.preview)
            .await;

        match result {
            Ok(receipt) => {
                info!("{} ✅ 导入完成: {} 道题", self.ctx, receipt.len());
                if let Some(callback) = self.on_success.as_mut() {
                    callback();
                }
                self.close();
                ConfirmOutcome::Imported(receipt)
            }
            Err(e) => {
                // 原因只记日志，界面只显示通用错误
                error!("{} ❌ 导入失败: {}", self.ctx, e);
                self.errors.push(IMPORT_FAILED_ERROR.to_string());
                self.state = SessionState::Previewing;
                ConfirmOutcome::Failed
            }
        }
    }

    /// 下载模板
    pub async fn download_template(&self) -> AppResult<usize> {
        self.template_writer.write().await
    }

    fn reset(&mut self) {
        self.state = SessionState::Idle;
        self.preview.clear();
        self.errors.clear();
        self.warnings.clear();
    }
}
