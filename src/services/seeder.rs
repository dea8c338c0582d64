//! 课程数据初始化服务 - 业务能力层
//!
//! 写入科目和主题，使导入时有可用的 subjectId / topicId

use tracing::info;

use crate::error::StoreError;
use crate::infrastructure::{DocumentStore, Fields, WriteBatch};
use crate::models::{Subject, SubjectRecord, TopicRecord};

/// 默认初始化的年级
pub const DEFAULT_GRADES: [u8; 2] = [6, 3];

pub const SUBJECTS_COLLECTION: &str = "subjects";
pub const TOPICS_COLLECTION: &str = "topics";

/// 六年级数学的主题（名称，描述）
const MATH_GRADE6_TOPICS: [(&str, &str); 3] = [
    ("Bilangan Bulat", "Operasi hitung bilangan bulat positif dan negatif"),
    ("Pecahan dan Desimal", "Operasi hitung pecahan, desimal, dan persen"),
    ("Geometri dan Pengukuran", "Bangun datar, bangun ruang, luas, volume"),
];

/// 初始化计划
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedPlan {
    pub subjects: Vec<Subject>,
    pub grades: Vec<u8>,
}

impl Default for SeedPlan {
    fn default() -> Self {
        Self {
            subjects: Subject::ALL.to_vec(),
            grades: DEFAULT_GRADES.to_vec(),
        }
    }
}

/// 一个已写入的科目
#[derive(Debug, Clone, PartialEq)]
pub struct SeededSubject {
    pub id: String,
    pub record: SubjectRecord,
}

/// 一个已写入的主题
#[derive(Debug, Clone, PartialEq)]
pub struct SeededTopic {
    pub id: String,
    pub record: TopicRecord,
}

/// 初始化结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeedReport {
    pub subjects: Vec<SeededSubject>,
    pub topics: Vec<SeededTopic>,
}

/// 课程数据初始化服务
pub struct CurriculumSeeder<S: DocumentStore> {
    store: S,
}

impl<S: DocumentStore> CurriculumSeeder<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// 按计划写入科目；六年级数学同时写入主题。全部在一次提交中完成
    pub async fn seed(&self, plan: &SeedPlan) -> Result<SeedReport, StoreError> {
        let mut batch = WriteBatch::new();
        let mut report = SeedReport::default();

        for &grade in &plan.grades {
            for &subject in &plan.subjects {
                let record = SubjectRecord::new(subject, grade);
                let doc_ref = self.store.new_document_ref(SUBJECTS_COLLECTION);
                batch.set(doc_ref.clone(), self.stamped(&record)?);

                // 主题引用同一批次内生成的科目 ID，无需查询
                if subject == Subject::Matematika && grade == 6 {
                    for (index, (name, description)) in MATH_GRADE6_TOPICS.iter().enumerate() {
                        let topic = TopicRecord {
                            subject_id: doc_ref.id.clone(),
                            name: name.to_string(),
                            description: description.to_string(),
                            order: index as u32 + 1,
                        };
                        let topic_ref = self.store.new_document_ref(TOPICS_COLLECTION);
                        batch.set(topic_ref.clone(), self.stamped(&topic)?);
                        report.topics.push(SeededTopic {
                            id: topic_ref.id,
                            record: topic,
                        });
                    }
                }

                report.subjects.push(SeededSubject {
                    id: doc_ref.id,
                    record,
                });
            }
        }

        if batch.is_empty() {
            info!("没有需要初始化的科目");
            return Ok(report);
        }

        let receipt = self.store.commit(batch).await?;
        info!(
            "✓ 已初始化 {} 个科目、{} 个主题 (共 {} 个文档)",
            report.subjects.len(),
            report.topics.len(),
            receipt.documents.len()
        );
        Ok(report)
    }

    fn stamped<T: serde::Serialize>(&self, record: &T) -> Result<Fields, StoreError> {
        let mut fields = Fields::new();
        let value = serde_json::to_value(record).map_err(|e| StoreError::Encode(e.to_string()))?;
        fields.merge_object(value)?;
        fields.insert("createdAt", self.store.server_timestamp());
        fields.insert("updatedAt", self.store.server_timestamp());
        Ok(fields)
    }
}
