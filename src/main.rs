use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use question_import::models::Subject;
use question_import::services::{SeedPlan, TemplateWriter};
use question_import::utils::logging;
use question_import::{App, Config, ImportRequest};
use tracing::info;

#[derive(Parser, Debug)]
#[command(version, about = "题库 JSON 导入工具")]
struct Cli {
    /// TOML 配置文件路径
    #[arg(short, long, env = "QUESTION_IMPORT_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// 显示详细日志
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 写出导入模板（template-soal.json）
    Template {
        /// 输出路径
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// 导入一个 JSON 文件，或文件夹中的所有 JSON 文件
    Import {
        /// 科目文档 ID
        #[arg(long)]
        subject: String,
        /// 主题文档 ID
        #[arg(long)]
        topic: String,
        /// 文件或文件夹
        path: PathBuf,
        /// 不询问，直接导入
        #[arg(short = 'y', long)]
        yes: bool,
        /// 写入内存存储，不落库
        #[arg(long)]
        dry_run: bool,
    },
    /// 初始化科目和主题
    Seed {
        /// 只初始化指定科目（可重复）
        #[arg(long = "subject")]
        subjects: Vec<String>,
        /// 只初始化指定年级（可重复，默认 6 和 3）
        #[arg(long = "grade")]
        grades: Vec<u8>,
        /// 写入内存存储，不落库
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 加载配置
    let config = Config::load(cli.config.as_deref()).context("加载配置失败")?;

    // 初始化日志
    logging::init(cli.verbose || config.verbose_logging)?;

    match cli.command {
        Command::Template { output } => {
            let path = output.unwrap_or_else(|| PathBuf::from(&config.template_file));
            let written = TemplateWriter::with_path(path).write().await?;
            info!("✓ 模板写入完成 ({} 字节)", written);
        }
        Command::Import {
            subject,
            topic,
            path,
            yes,
            dry_run,
        } => {
            let app = App::initialize(config, dry_run)?;
            let request = ImportRequest {
                subject_id: subject,
                topic_id: topic,
                path,
                assume_yes: yes,
            };
            let stats = app.run_import(&request).await?;
            if stats.has_failures() {
                anyhow::bail!("{} 个文件导入失败", stats.failed_files);
            }
        }
        Command::Seed {
            subjects,
            grades,
            dry_run,
        } => {
            let app = App::initialize(config, dry_run)?;
            let plan = seed_plan(&subjects, grades)?;
            app.seed(&plan).await?;
        }
    }

    Ok(())
}

/// 命令行参数 → 初始化计划，未指定的部分使用默认值
fn seed_plan(subjects: &[String], grades: Vec<u8>) -> Result<SeedPlan> {
    let mut plan = SeedPlan::default();
    if !subjects.is_empty() {
        plan.subjects = subjects
            .iter()
            .map(|s| Subject::from_str(s).with_context(|| format!("未知科目: {}", s)))
            .collect::<Result<_>>()?;
    }
    if !grades.is_empty() {
        plan.grades = grades;
    }
    Ok(plan)
}
