//! 业务能力层（Services Layer）
//!
//! 每个服务只提供一种能力，不关心流程顺序：
//! - `validator` - 校验导入数据（纯函数）
//! - `template` - 示例导入数据及模板文件写入
//! - `importer` - 批量原子写入题目
//! - `seeder` - 初始化科目和主题

pub mod importer;
pub mod seeder;
pub mod template;
pub mod validator;

pub use importer::{BatchImporter, ImportReceipt};
pub use seeder::{CurriculumSeeder, SeedPlan, SeedReport};
pub use template::{get_template, template_json, TemplateWriter, TEMPLATE_FILE_NAME};
pub use validator::{validate_import_data, ValidationReport, NOT_AN_ARRAY_ERROR};
