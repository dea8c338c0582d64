//! 导入模板服务 - 业务能力层
//!
//! 提供一份示例导入数据，并负责把它写成 `template-soal.json`

use std::path::{Path, PathBuf};

use serde_json::{json, Value as JsonValue};
use tracing::{debug, info};

use crate::error::{AppError, AppResult};

/// 默认模板文件名
pub const TEMPLATE_FILE_NAME: &str = "template-soal.json";

/// 示例导入数据：一道选择题，一道填空题
///
/// 每次调用都返回一份新值，调用方可以随意修改
pub fn get_template() -> JsonValue {
    json!([
        {
            "questionText": "Contoh soal pilihan ganda",
            "questionType": "pilgan",
            "difficulty": "mudah",
            "options": ["Pilihan A", "Pilihan B", "Pilihan C", "Pilihan D"],
            "answerKey": "Pilihan A",
            "explanation": "Penjelasan jawaban benar",
            "hasImage": false,
            "imageUrl": "",
            "hasMath": false
        },
        {
            "questionText": "Contoh soal isian",
            "questionType": "isian",
            "difficulty": "sedang",
            "answerKey": "Jawaban Singkat",
            "explanation": "Penjelasan jawaban",
            "hasImage": false,
            "imageUrl": "",
            "hasMath": false
        }
    ])
}

/// 模板的文本形式（两空格缩进）
pub fn template_json() -> AppResult<String> {
    Ok(serde_json::to_string_pretty(&get_template())?)
}

/// 模板写入服务
///
/// 职责：
/// - 把模板写到指定路径，已存在则覆盖
/// - 不关心导入流程
pub struct TemplateWriter {
    output_path: PathBuf,
}

impl TemplateWriter {
    /// 写到当前目录下的 `template-soal.json`
    pub fn new() -> Self {
        Self::with_path(TEMPLATE_FILE_NAME)
    }

    /// 使用自定义文件路径创建
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            output_path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.output_path
    }

    /// 写入模板文件
    ///
    /// # 返回
    /// 返回写入的字节数
    pub async fn write(&self) -> AppResult<usize> {
        let content = template_json()?;
        debug!(
            "写入模板: {} | 长度: {}",
            self.output_path.display(),
            content.len()
        );

        tokio::fs::write(&self.output_path, content.as_bytes())
            .await
            .map_err(|e| AppError::file_write_failed(self.output_path.display().to_string(), e))?;

        info!("📄 模板已保存至: {}", self.output_path.display());
        Ok(content.len())
    }
}

impl Default for TemplateWriter {
    fn default() -> Self {
        Self::new()
    }
}
