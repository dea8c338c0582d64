//! 导入会话上下文
//!
//! 封装"我正在把哪个文件导入到哪个科目 / 主题"这一信息

use std::fmt::Display;

/// 导入会话上下文
///
/// 科目和主题在一个会话内不可变
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportCtx {
    /// 科目文档 ID
    pub subject_id: String,

    /// 主题文档 ID
    pub topic_id: String,

    /// 导入文件名（仅用于日志显示）
    pub file_name: Option<String>,
}

impl ImportCtx {
    /// 创建新的导入上下文
    pub fn new(subject_id: impl Into<String>, topic_id: impl Into<String>) -> Self {
        Self {
            subject_id: subject_id.into(),
            topic_id: topic_id.into(),
            file_name: None,
        }
    }

    /// 附带文件名
    pub fn with_file(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }
}

impl Display for ImportCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.file_name {
            Some(name) => write!(
                f,
                "[科目 ID#{} 主题 ID#{} 文件#{}]",
                self.subject_id, self.topic_id, name
            ),
            None => write!(f, "[科目 ID#{} 主题 ID#{}]", self.subject_id, self.topic_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let ctx = ImportCtx::new("S1", "T1");
        assert_eq!(ctx.to_string(), "[科目 ID#S1 主题 ID#T1]");
        assert_eq!(
            ctx.with_file("bab1.json").to_string(),
            "[科目 ID#S1 主题 ID#T1 文件#bab1.json]"
        );
    }
}
