use phf::phf_map;
use serde::{Deserialize, Serialize};

/// 科目枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Subject {
    /// 数学
    Matematika,
    /// 自然科学
    Ipa,
    /// 社会科学
    Ips,
    /// 印尼语
    BahasaIndonesia,
    /// 公民教育
    Pkn,
}

/// 别名 → 科目（小写）
static SUBJECT_ALIASES: phf::Map<&'static str, Subject> = phf_map! {
    "matematika" => Subject::Matematika,
    "mtk" => Subject::Matematika,
    "math" => Subject::Matematika,
    "ipa" => Subject::Ipa,
    "sains" => Subject::Ipa,
    "ips" => Subject::Ips,
    "bahasa indonesia" => Subject::BahasaIndonesia,
    "b. indonesia" => Subject::BahasaIndonesia,
    "bindo" => Subject::BahasaIndonesia,
    "pkn" => Subject::Pkn,
    "ppkn" => Subject::Pkn,
};

impl Subject {
    pub const ALL: [Subject; 5] = [
        Subject::Matematika,
        Subject::Ipa,
        Subject::Ips,
        Subject::BahasaIndonesia,
        Subject::Pkn,
    ];

    /// 获取标准名称
    pub fn name(self) -> &'static str {
        match self {
            Subject::Matematika => "Matematika",
            Subject::Ipa => "IPA",
            Subject::Ips => "IPS",
            Subject::BahasaIndonesia => "Bahasa Indonesia",
            Subject::Pkn => "PKN",
        }
    }

    /// 科目列表中的排序
    pub fn order(self) -> u32 {
        match self {
            Subject::Matematika => 1,
            Subject::Ipa => 2,
            Subject::Ips => 3,
            Subject::BahasaIndonesia => 4,
            Subject::Pkn => 5,
        }
    }

    /// 尝试从字符串解析科目（别名精确匹配，忽略大小写）
    pub fn from_str(s: &str) -> Option<Self> {
        SUBJECT_ALIASES.get(s.trim().to_lowercase().as_str()).copied()
    }
}

impl std::fmt::Display for Subject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// `subjects` 集合中的文档
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectRecord {
    pub name: String,
    pub grade: u8,
    pub order: u32,
}

impl SubjectRecord {
    pub fn new(subject: Subject, grade: u8) -> Self {
        Self {
            name: subject.name().to_string(),
            grade,
            order: subject.order(),
        }
    }
}

/// `topics` 集合中的文档
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicRecord {
    pub subject_id: String,
    pub name: String,
    pub description: String,
    pub order: u32,
}
