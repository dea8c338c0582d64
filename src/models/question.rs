use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// 题型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    /// 选择题（pilihan ganda）
    Pilgan,
    /// 问答题
    Essay,
    /// 填空题
    Isian,
}

impl QuestionType {
    pub const ALL: [QuestionType; 3] = [QuestionType::Pilgan, QuestionType::Essay, QuestionType::Isian];

    /// 导入文件中使用的名称
    pub fn as_str(self) -> &'static str {
        match self {
            QuestionType::Pilgan => "pilgan",
            QuestionType::Essay => "essay",
            QuestionType::Isian => "isian",
        }
    }

    /// 精确匹配导入文件中的名称
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }
}

impl std::fmt::Display for QuestionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 难度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// 简单
    Mudah,
    /// 中等
    Sedang,
    /// 困难
    Sulit,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Mudah, Difficulty::Sedang, Difficulty::Sulit];

    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Mudah => "mudah",
            Difficulty::Sedang => "sedang",
            Difficulty::Sulit => "sulit",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.as_str() == s)
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 导入文件中的一道题（写库前）
///
/// `subjectId` / `topicId` / `createdAt` / `updatedAt` 只在写库时追加，不在这里
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportQuestion {
    pub question_text: String,
    pub question_type: QuestionType,
    pub difficulty: Difficulty,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    pub answer_key: String,
    pub explanation: String,
    #[serde(default)]
    pub has_image: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub has_math: bool,
}

impl ImportQuestion {
    /// 答案是否能对应到某个选项（前缀标签或完整文本）
    ///
    /// 非选择题总是返回 true
    pub fn answer_matches_option(&self) -> bool {
        if self.question_type != QuestionType::Pilgan {
            return true;
        }
        let key = self.answer_key.trim();
        self.options.as_deref().unwrap_or_default().iter().any(|option| {
            option.trim() == key || option_label(option).is_some_and(|label| label == key)
        })
    }
}

/// 通过校验的一行
///
/// `fields` 是导入文件中的原始对象，写库时原样合并；`question` 只用于预览和提示
#[derive(Debug, Clone, PartialEq)]
pub struct AcceptedRow {
    pub fields: Map<String, JsonValue>,
    pub question: ImportQuestion,
}

impl From<ImportQuestion> for AcceptedRow {
    /// 由类型化题目构造，原始字段取其序列化结果
    fn from(question: ImportQuestion) -> Self {
        let fields = match serde_json::to_value(&question) {
            Ok(JsonValue::Object(map)) => map,
            _ => Map::new(),
        };
        Self { fields, question }
    }
}

/// 提取选项的前缀标签，例如 "A. Jakarta" → "A"，"b) 12" → "b"
pub fn option_label(option: &str) -> Option<&str> {
    static LABEL: OnceLock<Regex> = OnceLock::new();
    let re = LABEL.get_or_init(|| {
        Regex::new(r"^\s*([A-Za-z0-9]{1,3})\s*[.)]").expect("option label pattern is valid")
    });
    re.captures(option)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}
