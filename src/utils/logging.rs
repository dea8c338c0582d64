//! 日志工具模块
//!
//! 提供日志初始化和输出的辅助函数

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化日志
///
/// `RUST_LOG` 优先；未设置时按 `verbose` 选择 info 或 debug
pub fn init(verbose: bool) -> Result<()> {
    let level = if verbose {
        "question_import=debug"
    } else {
        "question_import=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("日志初始化失败: {}", e))?;

    Ok(())
}

/// 记录程序启动信息
///
/// # 参数
/// - `command`: 本次执行的命令
/// - `backend`: 存储后端名称
pub fn log_startup(command: &str, backend: &str) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 题目导入 ({})", command);
    info!("🗄️ 存储后端: {}", backend);
    info!("{}", "=".repeat(60));
}

/// 记录单个导入会话开始
///
/// # 参数
/// - `index`: 当前文件编号（从 1 开始）
/// - `total`: 文件总数
/// - `file_name`: 文件名
pub fn log_session_start(index: usize, total: usize, file_name: &str) {
    info!("\n{}", "─".repeat(60));
    info!("📄 开始处理第 {}/{} 个文件: {}", index, total, file_name);
    info!("{}", "─".repeat(60));
}

/// 打印最终统计信息
///
/// # 参数
/// - `imported_files`: 成功导入的文件数
/// - `failed_files`: 出错的文件数
/// - `total_files`: 文件总数
/// - `questions`: 写入的题目总数
pub fn print_final_stats(imported_files: usize, failed_files: usize, total_files: usize, questions: usize) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", imported_files, total_files);
    info!("❌ 失败: {}", failed_files);
    info!("📝 写入题目: {}", questions);
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度（按字符计）
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text_counts_chars() {
        assert_eq!(truncate_text("2+2?", 10), "2+2?");
        assert_eq!(truncate_text("Hitunglah luas segitiga", 9), "Hitunglah...");
        assert_eq!(truncate_text("三角形的面积", 3), "三角形...");
    }
}
