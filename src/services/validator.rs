//! 导入数据校验服务 - 业务能力层
//!
//! 纯函数：输入任意 JSON 值，输出校验报告，不做任何 I/O。
//!
//! 每个元素先解析为 `Row`（带类型化字段访问的对象）或 `RowError`，
//! 再按固定顺序逐条检查规则。所有行都会检查，错误全部收集。

use std::collections::HashMap;

use serde_json::{Map, Value as JsonValue};

use crate::models::question::{AcceptedRow, Difficulty, ImportQuestion, QuestionType};

/// 顶层不是数组时的唯一错误
pub const NOT_AN_ARRAY_ERROR: &str = "Data must be a JSON array";

/// 校验报告
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    /// 没有任何错误
    pub valid: bool,
    /// 阻止导入的错误（按行号、规则顺序排列）
    pub errors: Vec<String>,
    /// 不阻止导入的提示
    pub warnings: Vec<String>,
    /// 通过全部规则的行：原始字段 + 类型化题目
    pub questions: Vec<AcceptedRow>,
}

/// 单行解析失败
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowError {
    /// 元素不是 JSON 对象
    NotAnObject,
}

/// 布尔标记字段的三种状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flag {
    Absent,
    Bool(bool),
    NotBool,
}

/// 一行导入数据（JSON 对象）的类型化视图
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    fields: &'a Map<String, JsonValue>,
}

impl<'a> Row<'a> {
    /// 非空字符串字段
    fn text(&self, name: &str) -> Option<&'a str> {
        self.fields
            .get(name)
            .and_then(JsonValue::as_str)
            .filter(|s| !s.is_empty())
    }

    fn question_type(&self) -> Option<QuestionType> {
        self.fields
            .get("questionType")
            .and_then(JsonValue::as_str)
            .and_then(QuestionType::parse)
    }

    fn difficulty(&self) -> Option<Difficulty> {
        self.fields
            .get("difficulty")
            .and_then(JsonValue::as_str)
            .and_then(Difficulty::parse)
    }

    /// 全部为字符串的选项列表；不是数组或含非字符串元素时返回 None
    fn options(&self) -> Option<Vec<&'a str>> {
        self.fields
            .get("options")?
            .as_array()?
            .iter()
            .map(JsonValue::as_str)
            .collect()
    }

    fn flag(&self, name: &str) -> Flag {
        match self.fields.get(name) {
            None | Some(JsonValue::Null) => Flag::Absent,
            Some(JsonValue::Bool(b)) => Flag::Bool(*b),
            Some(_) => Flag::NotBool,
        }
    }
}

/// 解析单个元素
pub fn parse_row(value: &JsonValue) -> Result<Row<'_>, RowError> {
    match value {
        JsonValue::Object(fields) => Ok(Row { fields }),
        _ => Err(RowError::NotAnObject),
    }
}

fn allowed<T: Copy, const N: usize>(all: [T; N], name: fn(T) -> &'static str) -> String {
    all.into_iter().map(name).collect::<Vec<_>>().join("/")
}

/// 校验导入数据
///
/// # 参数
/// - `data`: 任意 JSON 值（通常是解析后的文件内容）
///
/// # 返回
/// 顶层不是数组时只有一条错误；否则每行每条规则各自报错
pub fn validate_import_data(data: &JsonValue) -> ValidationReport {
    let Some(items) = data.as_array() else {
        return ValidationReport {
            valid: false,
            errors: vec![NOT_AN_ARRAY_ERROR.to_string()],
            ..Default::default()
        };
    };

    let mut report = ValidationReport::default();
    let mut seen_texts: HashMap<&str, usize> = HashMap::new();

    for (index, item) in items.iter().enumerate() {
        let row_no = index + 1;

        let row = match parse_row(item) {
            Ok(row) => row,
            Err(RowError::NotAnObject) => {
                report
                    .errors
                    .push(format!("Row {}: expected a question object", row_no));
                continue;
            }
        };

        let errors_before = report.errors.len();
        check_rules(&row, row_no, &mut report.errors);
        if report.errors.len() > errors_before {
            continue;
        }

        if let Some(question) = build_question(&row, row_no, &mut report.warnings) {
            if let Some(first) = seen_texts.get(question.question_text.as_str()) {
                report.warnings.push(format!(
                    "Row {}: questionText duplicates row {}",
                    row_no, first
                ));
            } else if let Some(text) = row.text("questionText") {
                seen_texts.insert(text, row_no);
            }
            report.questions.push(AcceptedRow {
                fields: row.fields.clone(),
                question,
            });
        }
    }

    report.valid = report.errors.is_empty();
    report
}

/// 按固定顺序检查六条规则
fn check_rules(row: &Row<'_>, row_no: usize, errors: &mut Vec<String>) {
    if row.text("questionText").is_none() {
        errors.push(format!("Row {}: questionText required", row_no));
    }

    let question_type = row.question_type();
    if question_type.is_none() {
        errors.push(format!(
            "Row {}: questionType invalid (must be {})",
            row_no,
            allowed(QuestionType::ALL, QuestionType::as_str)
        ));
    }

    if row.difficulty().is_none() {
        errors.push(format!(
            "Row {}: difficulty invalid (must be {})",
            row_no,
            allowed(Difficulty::ALL, Difficulty::as_str)
        ));
    }

    if question_type == Some(QuestionType::Pilgan) && row.options().map_or(true, |o| o.len() < 2) {
        errors.push(format!(
            "Row {}: pilgan question must have at least 2 text options",
            row_no
        ));
    }

    if row.text("answerKey").is_none() {
        errors.push(format!("Row {}: answerKey required", row_no));
    }

    if row.text("explanation").is_none() {
        errors.push(format!("Row {}: explanation required", row_no));
    }
}

/// 已通过规则的行 → 类型化题目，同时收集提示
///
/// 只生成预览用的视图，原始字段不做修改
fn build_question(row: &Row<'_>, row_no: usize, warnings: &mut Vec<String>) -> Option<ImportQuestion> {
    let question_type = row.question_type()?;

    let mut flag = |name: &str| match row.flag(name) {
        Flag::Bool(b) => b,
        Flag::Absent => false,
        Flag::NotBool => {
            warnings.push(format!(
                "Row {}: {} is not a boolean",
                row_no, name
            ));
            false
        }
    };
    let has_image = flag("hasImage");
    let has_math = flag("hasMath");

    // 视图中非选择题的 options 只在格式正确且非空时保留
    let options = row
        .options()
        .filter(|o| !o.is_empty())
        .map(|o| o.into_iter().map(str::to_string).collect());
    let image_url = row
        .fields
        .get("imageUrl")
        .and_then(JsonValue::as_str)
        .map(str::to_string);

    let question = ImportQuestion {
        question_text: row.text("questionText")?.to_string(),
        question_type,
        difficulty: row.difficulty()?,
        options,
        answer_key: row.text("answerKey")?.to_string(),
        explanation: row.text("explanation")?.to_string(),
        has_image,
        image_url,
        has_math,
    };

    if !question.answer_matches_option() {
        warnings.push(format!(
            "Row {}: answerKey \"{}\" does not match any option",
            row_no, question.answer_key
        ));
    }
    if question.has_image && question.image_url.as_deref().map_or(true, str::is_empty) {
        warnings.push(format!("Row {}: hasImage is true but imageUrl is empty", row_no));
    }

    Some(question)
}
