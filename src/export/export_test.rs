use serde_json::json;

use super::*;
use crate::models::{Message, Model};

fn defaults() -> Defaults {
    Defaults {
        model: Model::default(),
        prompt: "Be helpful.".to_string(),
    }
}

fn conversation(id: &str, folder_id: Option<&str>) -> Conversation {
    Conversation::new(Model::default(), "Be helpful.")
        .with_id(id)
        .with_name(format!("Conversation {}", id))
        .with_messages(vec![
            Message::new_user("Hello"),
            Message::new_assistant("Hi there"),
        ])
        .with_folder_id(folder_id.map(String::from))
}

#[test]
fn test_import_v1() {
    let raw = json!([
        {"id": "c1", "name": "First", "messages": [{"role": "user", "content": "hi"}]},
        {"id": "c2", "name": "Second", "messages": []},
    ]);

    let data = import_data(raw, &defaults()).unwrap();
    assert_eq!(data.version, 4);
    assert_eq!(data.history.len(), 2);
    assert_eq!(data.history[0].prompt(), "Be helpful.");
    assert!(data.folders.is_empty());
    assert!(data.prompts.is_empty());
}

#[test]
fn test_import_v2_numeric_folders() {
    let raw = json!({
        "history": [{"id": "c1", "name": "Filed", "messages": [], "folderId": 1}],
        "folders": [{"id": 1, "name": "Work"}],
    });

    let data = import_data(raw, &defaults()).unwrap();
    assert_eq!(data.folders.len(), 1);
    assert_eq!(data.folders[0].id(), "1");
    assert_eq!(data.folders[0].name(), "Work");
    assert_eq!(data.folders[0].kind(), FolderKind::Chat);
    assert_eq!(data.history[0].folder_id(), Some("1"));
}

#[test]
fn test_import_v3() {
    let raw = json!({
        "version": 3,
        "history": [{"id": "c1", "name": "A", "messages": []}],
        "folders": [{"id": "f1", "name": "Work", "type": "chat"}],
    });

    let data = import_data(raw, &defaults()).unwrap();
    assert_eq!(data.version, 4);
    assert_eq!(data.folders[0].id(), "f1");
    assert!(data.prompts.is_empty());
}

#[test]
fn test_import_v4() {
    let prompt = Prompt::new("Summarize", Model::default())
        .with_id("p1")
        .with_content("Summarize {{text}}");
    let exported = ExportData {
        version: 4,
        history: vec![conversation("c1", Some("f1")), conversation("c2", None)],
        folders: vec![Folder::new("Work", FolderKind::Chat).with_id("f1")],
        prompts: vec![prompt],
    };

    let text = serde_json::to_string(&exported).unwrap();
    let imported = parse_import(&text, &defaults()).unwrap();
    assert_eq!(imported, exported);
}

#[test]
fn test_import_rejects_malformed() {
    assert_eq!(
        import_data(json!({"version": 5, "history": [], "folders": []}), &defaults()),
        Err(ImportError::UnknownVersion(5))
    );
    assert_eq!(
        import_data(json!({"version": 4, "history": [], "folders": []}), &defaults()),
        Err(ImportError::MissingField("prompts"))
    );
    assert_eq!(
        import_data(json!({"history": []}), &defaults()),
        Err(ImportError::MissingField("folders"))
    );
    assert_eq!(
        import_data(json!("history"), &defaults()),
        Err(ImportError::UnknownFormat)
    );
    assert!(matches!(
        import_data(json!({"version": 3, "history": {}, "folders": []}), &defaults()),
        Err(ImportError::Malformed { field: "history", .. })
    ));
    assert!(matches!(
        parse_import("{not json", &defaults()),
        Err(ImportError::Json(_))
    ));
}

#[test]
fn test_export_file_name() {
    let date = chrono::NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
    assert_eq!(export_file_name(date), "chatty_history_2024-03-07.json");
}

#[test]
fn test_export_data_is_latest_version() {
    let mut repo = Repository::new(defaults());
    repo.create_conversation();
    repo.create_folder("Work", FolderKind::Prompt);
    repo.create_prompt();

    let data = export_data(&repo);
    assert_eq!(data.version, EXPORT_VERSION);
    assert_eq!(data.history, repo.conversations());
    assert_eq!(data.folders, repo.folders());
    assert_eq!(data.prompts, repo.prompts());
}

#[tokio::test]
async fn test_write_then_read() {
    let dir = std::env::temp_dir().join(format!("chatty-export-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    let date = chrono::NaiveDate::from_ymd_opt(2025, 1, 31).unwrap();

    let data = ExportData {
        version: 4,
        history: vec![conversation("c1", None)],
        folders: vec![],
        prompts: vec![],
    };
    let path = write_export(&data, &dir, date).await.unwrap();
    assert!(path.ends_with("chatty_history_2025-01-31.json"));

    let read = read_import(&path, &defaults()).await.unwrap();
    assert_eq!(read, data);

    std::fs::remove_dir_all(&dir).ok();
}
