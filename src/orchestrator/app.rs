//! 应用运行器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责命令调度和资源管理。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：按配置创建存储后端（dry-run 时使用内存存储）
//! 2. **批量导入**：每个文件一个导入会话，逐个顺序执行
//! 3. **课程初始化**：写入科目和主题
//! 4. **全局统计**：汇总所有文件的处理结果
//!
//! ## 设计特点
//!
//! - **顶层编排**：不处理单个题目的细节
//! - **资源所有者**：唯一持有存储客户端的模块
//! - **向下委托**：委托 `ImportSession` 处理单个文件

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use crate::config::{Config, StoreBackend};
use crate::infrastructure::{connect_store, DocumentStore, MemoryStore};
use crate::models::question::option_label;
use crate::models::{resolve_import_paths, AcceptedRow, QuestionType};
use crate::services::{BatchImporter, CurriculumSeeder, SeedPlan, SeedReport, TemplateWriter};
use crate::utils::logging::{log_session_start, log_startup, print_final_stats, truncate_text};
use crate::workflow::{ConfirmOutcome, ImportCtx, ImportSession};

/// 一次导入命令的参数
#[derive(Debug, Clone)]
pub struct ImportRequest {
    pub subject_id: String,
    pub topic_id: String,
    /// 单个文件或包含 `.json` 文件的文件夹
    pub path: PathBuf,
    /// 跳过交互确认
    pub assume_yes: bool,
}

/// 导入统计
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImportStats {
    pub total_files: usize,
    /// 已提交的文件数（由成功回调计数）
    pub imported_files: usize,
    /// 解析 / 校验 / 提交出错的文件数
    pub failed_files: usize,
    /// 用户取消或没有题目的文件数
    pub skipped_files: usize,
    pub questions_written: usize,
}

impl ImportStats {
    pub fn has_failures(&self) -> bool {
        self.failed_files > 0
    }
}

/// 单个文件的处理结果
enum FileOutcome {
    Imported(usize),
    Failed,
    Skipped,
}

/// 应用主结构
pub struct App {
    config: Config,
    store: Arc<dyn DocumentStore>,
}

impl App {
    /// 初始化应用
    ///
    /// `dry_run` 为 true 时忽略配置的后端，写入内存存储
    pub fn initialize(config: Config, dry_run: bool) -> Result<Self> {
        let store: Arc<dyn DocumentStore> = if dry_run {
            info!("🧪 dry-run 模式：写入内存存储");
            Arc::new(MemoryStore::with_max_batch_writes(config.max_batch_writes))
        } else {
            connect_store(&config).context("创建存储后端失败")?
        };
        Ok(Self::with_store(config, store))
    }

    /// 使用已有的存储后端
    pub fn with_store(config: Config, store: Arc<dyn DocumentStore>) -> Self {
        Self { config, store }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn backend_name(&self) -> &'static str {
        match self.config.store_backend {
            StoreBackend::Memory => "memory",
            StoreBackend::Firestore => "firestore",
        }
    }

    // ========== seed ==========

    /// 初始化科目和主题
    pub async fn seed(&self, plan: &SeedPlan) -> Result<SeedReport> {
        log_startup("seed", self.backend_name());
        let report = CurriculumSeeder::new(self.store.clone())
            .seed(plan)
            .await
            .context("初始化科目失败")?;

        for subject in &report.subjects {
            info!(
                "  📚 {} (kelas {}) → {}",
                subject.record.name, subject.record.grade, subject.id
            );
        }
        for topic in &report.topics {
            info!("    📖 {} → {}", topic.record.name, topic.id);
        }
        Ok(report)
    }

    // ========== import ==========

    /// 运行导入命令
    pub async fn run_import(&self, request: &ImportRequest) -> Result<ImportStats> {
        log_startup("import", self.backend_name());

        info!("\n📁 正在扫描导入文件...");
        let paths = resolve_import_paths(&request.path)
            .await
            .with_context(|| format!("无法读取导入路径: {}", request.path.display()))?;

        let mut stats = ImportStats {
            total_files: paths.len(),
            ..Default::default()
        };
        if paths.is_empty() {
            warn!("⚠️ 没有找到待导入的 JSON 文件，程序结束");
            return Ok(stats);
        }

        // 成功回调只在提交后触发，用它统计已导入的文件
        let committed = Arc::new(AtomicUsize::new(0));

        for (index, path) in paths.iter().enumerate() {
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| path.display().to_string());
            log_session_start(index + 1, paths.len(), &file_name);

            match self.import_file(request, path, &file_name, committed.clone()).await {
                FileOutcome::Imported(n) => stats.questions_written += n,
                FileOutcome::Failed => stats.failed_files += 1,
                FileOutcome::Skipped => stats.skipped_files += 1,
            }
        }

        stats.imported_files = committed.load(Ordering::SeqCst);
        print_final_stats(
            stats.imported_files,
            stats.failed_files,
            stats.total_files,
            stats.questions_written,
        );
        Ok(stats)
    }

    /// 处理单个文件：加载 → 预览 → 确认 → 提交
    async fn import_file(
        &self,
        request: &ImportRequest,
        path: &Path,
        file_name: &str,
        committed: Arc<AtomicUsize>,
    ) -> FileOutcome {
        let ctx = ImportCtx::new(&request.subject_id, &request.topic_id).with_file(file_name);
        let importer = BatchImporter::new(self.store.clone(), &self.config.questions_collection);
        let mut session = ImportSession::new(ctx.clone(), importer)
            .with_template_writer(TemplateWriter::with_path(&self.config.template_file))
            .on_success(move || {
                committed.fetch_add(1, Ordering::SeqCst);
            });

        session.open();
        if let Err(e) = session.load_file(path).await {
            error!("{} ❌ 读取文件失败: {}", ctx, e);
            return FileOutcome::Failed;
        }

        for warning in session.warnings() {
            warn!("{} ⚠️ {}", ctx, warning);
        }

        if !session.errors().is_empty() {
            for line in session.display_errors(self.config.error_display_limit) {
                error!("{} ❌ {}", ctx, line);
            }
            return FileOutcome::Failed;
        }

        if !session.can_confirm() {
            info!("{} 文件中没有题目，跳过", ctx);
            return FileOutcome::Skipped;
        }

        self.log_preview(&ctx, session.preview());

        if !request.assume_yes {
            let prompt = format!("导入 {} 道题到 {}?", session.preview().len(), ctx);
            match ask_confirmation(prompt).await {
                Ok(true) => {}
                Ok(false) => {
                    info!("{} 已取消", ctx);
                    session.close();
                    return FileOutcome::Skipped;
                }
                Err(e) => {
                    error!("{} ❌ 读取确认输入失败: {}", ctx, e);
                    return FileOutcome::Failed;
                }
            }
        }

        match session.confirm().await {
            ConfirmOutcome::Imported(receipt) => FileOutcome::Imported(receipt.len()),
            ConfirmOutcome::NothingToImport => FileOutcome::Skipped,
            ConfirmOutcome::Failed => {
                for line in session.display_errors(self.config.error_display_limit) {
                    error!("{} ❌ {}", ctx, line);
                }
                FileOutcome::Failed
            }
        }
    }

    fn log_preview(&self, ctx: &ImportCtx, rows: &[AcceptedRow]) {
        info!("{} 👀 预览 {} 道题:", ctx, rows.len());
        for (index, AcceptedRow { question, .. }) in rows.iter().enumerate() {
            info!(
                "  {}. [{}/{}] {}",
                index + 1,
                question.question_type,
                question.difficulty,
                truncate_text(&question.question_text, 60)
            );
            if question.question_type == QuestionType::Pilgan {
                for option in question.options.as_deref().unwrap_or_default() {
                    let marker = match option_label(option) {
                        Some(label) if label == question.answer_key.trim() => "✓",
                        _ if option.trim() == question.answer_key.trim() => "✓",
                        _ => " ",
                    };
                    info!("     {} {}", marker, truncate_text(option, 50));
                }
            } else if self.config.verbose_logging {
                info!("     → {}", truncate_text(&question.answer_key, 50));
            }
        }
    }
}

/// 在终端询问是否继续
async fn ask_confirmation(prompt: String) -> Result<bool> {
    let answer = tokio::task::spawn_blocking(move || -> std::io::Result<bool> {
        print!("{} [y/N] ", prompt);
        std::io::stdout().flush()?;
        let mut line = String::new();
        std::io::stdin().read_line(&mut line)?;
        Ok(matches!(
            line.trim().to_lowercase().as_str(),
            "y" | "yes" | "ya"
        ))
    })
    .await??;
    Ok(answer)
}
