pub mod loaders;
pub mod question;
pub mod subject;

pub use loaders::{read_import_file, resolve_import_paths, ImportFile};
pub use question::{AcceptedRow, Difficulty, ImportQuestion, QuestionType};
pub use subject::{Subject, SubjectRecord, TopicRecord};
