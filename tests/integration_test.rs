use std::path::PathBuf;
use std::sync::Arc;

use question_import::config::Config;
use question_import::infrastructure::{MemoryStore, RejectMode};
use question_import::services::seeder::{SUBJECTS_COLLECTION, TOPICS_COLLECTION};
use question_import::services::{get_template, SeedPlan};
use question_import::workflow::{ConfirmOutcome, SessionState, IMPORT_FAILED_ERROR, PARSE_ERROR};
use question_import::{
    validate_import_data, App, BatchImporter, ImportCtx, ImportRequest, ImportSession,
};
use serde_json::json;

const TWO_PLUS_TWO: &str = r#"[{
    "questionText": "2+2?",
    "questionType": "pilgan",
    "difficulty": "mudah",
    "options": ["3", "4"],
    "answerKey": "4",
    "explanation": "2+2=4",
    "hasImage": false,
    "hasMath": false
}]"#;

fn session(store: &MemoryStore) -> ImportSession<MemoryStore> {
    ImportSession::new(
        ImportCtx::new("S1", "T1"),
        BatchImporter::new(store.clone(), "questions"),
    )
}

/// 在临时目录中创建若干文件，返回目录路径
async fn temp_folder(files: &[(&str, &str)]) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("question-import-{}", uuid::Uuid::new_v4()));
    tokio::fs::create_dir_all(&dir).await.unwrap();
    for (name, content) in files {
        tokio::fs::write(dir.join(name), content).await.unwrap();
    }
    dir
}

fn memory_app(store: &MemoryStore) -> App {
    App::with_store(Config::default(), Arc::new(store.clone()))
}

#[tokio::test]
async fn test_import_single_pilgan_question() {
    let store = MemoryStore::new();
    let mut s = session(&store);

    s.load_text(TWO_PLUS_TWO);
    assert!(matches!(s.confirm().await, ConfirmOutcome::Imported(_)));

    let docs = store.documents("questions");
    assert_eq!(docs.len(), 1);
    let fields = &docs[0].fields;
    assert_eq!(fields["subjectId"], "S1");
    assert_eq!(fields["topicId"], "T1");
    assert_eq!(fields["questionText"], "2+2?");
    assert_eq!(fields["questionType"], "pilgan");
    assert_eq!(fields["difficulty"], "mudah");
    assert_eq!(fields["options"], json!(["3", "4"]));
    assert_eq!(fields["answerKey"], "4");
    assert_eq!(fields["explanation"], "2+2=4");
    assert_eq!(fields["hasImage"], false);
    assert_eq!(fields["hasMath"], false);
    assert!(fields["createdAt"].is_string());
    assert_eq!(fields["createdAt"], fields["updatedAt"]);
}

#[tokio::test]
async fn test_stored_document_is_input_plus_links_and_timestamps() {
    let input = json!({
        "questionText": "Jelaskan proses fotosintesis",
        "questionType": "essay",
        "difficulty": "sedang",
        "options": [],
        "answerKey": "Cahaya diubah menjadi energi kimia",
        "explanation": "Terjadi di kloroplas",
        "hasMath": 1,
        "imageUrl": null,
        "points": 10
    });
    let store = MemoryStore::new();
    let mut s = session(&store);

    s.load_text(&json!([input.clone()]).to_string());
    assert!(matches!(s.confirm().await, ConfirmOutcome::Imported(_)));

    let mut fields = store.documents("questions")[0].fields.clone();
    assert_eq!(fields.remove("subjectId"), Some(json!("S1")));
    assert_eq!(fields.remove("topicId"), Some(json!("T1")));
    assert!(fields.remove("createdAt").is_some());
    assert!(fields.remove("updatedAt").is_some());
    assert_eq!(serde_json::Value::Object(fields), input);
}

#[tokio::test]
async fn test_empty_array_does_not_invoke_importer() {
    let store = MemoryStore::new();
    let mut s = session(&store);

    s.load_text("[]");
    assert_eq!(s.state(), SessionState::Previewing);
    assert!(s.errors().is_empty());
    assert!(!s.can_confirm());
    assert_eq!(s.confirm().await, ConfirmOutcome::NothingToImport);
    assert_eq!(store.commit_count(), 0);
}

#[test]
fn test_trailing_comma_is_a_single_format_error() {
    let mut s = session(&MemoryStore::new());
    s.load_text(
        r#"[{"questionText":"2+2?","questionType":"pilgan","difficulty":"mudah","options":["3","4"],"answerKey":"4","explanation":"2+2=4",}]"#,
    );
    assert_eq!(s.errors(), &[PARSE_ERROR.to_string()]);
    assert!(s.preview().is_empty());
}

#[tokio::test]
async fn test_rejected_commit_keeps_preview_for_retry() {
    let store = MemoryStore::new();
    store.reject_commits(Some(RejectMode::Unavailable));
    let mut s = session(&store);

    s.load_text(TWO_PLUS_TWO);
    assert_eq!(s.confirm().await, ConfirmOutcome::Failed);
    assert_eq!(s.state(), SessionState::Previewing);
    assert_eq!(s.preview().len(), 1);
    assert_eq!(s.errors().last().map(String::as_str), Some(IMPORT_FAILED_ERROR));
    assert_eq!(store.count("questions"), 0);
}

#[tokio::test]
async fn test_oversized_file_writes_nothing() {
    let store = MemoryStore::with_max_batch_writes(2);
    let rows: Vec<_> = (1..=3)
        .map(|i| {
            json!({
                "questionText": format!("Soal {}", i),
                "questionType": "essay",
                "difficulty": "sulit",
                "answerKey": "bebas",
                "explanation": "bebas"
            })
        })
        .collect();
    let mut s = session(&store);

    s.load_text(&serde_json::to_string(&rows).unwrap());
    assert_eq!(s.preview().len(), 3);
    assert_eq!(s.confirm().await, ConfirmOutcome::Failed);
    assert_eq!(store.count("questions"), 0);
}

#[test]
fn test_template_round_trips_through_validator() {
    let report = validate_import_data(&get_template());
    assert!(report.valid);
    assert!(report.errors.is_empty());
}

#[test]
fn test_violations_are_summed_across_rows() {
    let report = validate_import_data(&json!([
        {"questionType": "essay", "difficulty": "mudah", "explanation": "x"},
        {"questionText": "a", "questionType": "pilgan", "difficulty": "mudah",
         "options": ["satu"], "answerKey": "satu", "explanation": "x"},
        "bukan objek"
    ]));
    assert!(!report.valid);
    assert_eq!(report.errors.len(), 4);
    assert!(report.errors[0].starts_with("Row 1:"));
    assert!(report.errors[2].starts_with("Row 2:"));
    assert!(report.errors[3].starts_with("Row 3:"));
}

#[tokio::test]
async fn test_folder_import_runs_every_file_in_order() {
    let dir = temp_folder(&[
        ("a.json", TWO_PLUS_TWO),
        ("b.json", "[{\"questionText\": \"x\"}]"),
        ("c.json", "[]"),
        ("catatan.txt", "bukan json"),
    ])
    .await;
    let store = MemoryStore::new();

    let stats = memory_app(&store)
        .run_import(&ImportRequest {
            subject_id: "S1".to_string(),
            topic_id: "T1".to_string(),
            path: dir.clone(),
            assume_yes: true,
        })
        .await
        .unwrap();

    assert_eq!(stats.total_files, 3);
    assert_eq!(stats.imported_files, 1);
    assert_eq!(stats.failed_files, 1);
    assert_eq!(stats.skipped_files, 1);
    assert_eq!(stats.questions_written, 1);
    assert!(stats.has_failures());
    assert_eq!(store.count("questions"), 1);

    tokio::fs::remove_dir_all(&dir).await.unwrap();
}

#[tokio::test]
async fn test_import_missing_path_is_an_error() {
    let store = MemoryStore::new();
    let result = memory_app(&store)
        .run_import(&ImportRequest {
            subject_id: "S1".to_string(),
            topic_id: "T1".to_string(),
            path: std::env::temp_dir().join("tidak-ada.json"),
            assume_yes: true,
        })
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_seed_then_import_into_seeded_topic() {
    let store = MemoryStore::new();
    let app = memory_app(&store);

    let report = app.seed(&SeedPlan::default()).await.unwrap();
    assert_eq!(store.count(SUBJECTS_COLLECTION), 10);
    assert_eq!(store.count(TOPICS_COLLECTION), 3);

    let topic = &report.topics[0];
    let dir = temp_folder(&[("bilangan.json", TWO_PLUS_TWO)]).await;
    let stats = app
        .run_import(&ImportRequest {
            subject_id: topic.record.subject_id.clone(),
            topic_id: topic.id.clone(),
            path: dir.join("bilangan.json"),
            assume_yes: true,
        })
        .await
        .unwrap();

    assert_eq!(stats.imported_files, 1);
    let imported = store.find_by_field("questions", "topicId", &json!(topic.id));
    assert_eq!(imported.len(), 1);
    assert_eq!(imported[0].fields["subjectId"], json!(topic.record.subject_id));

    tokio::fs::remove_dir_all(&dir).await.unwrap();
}
