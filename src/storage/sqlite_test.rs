use super::*;

#[tokio::test]
async fn test_get_missing_key() {
    let db = Sqlite::new(None).await.unwrap();
    let value = db.get("conversationHistory").await.unwrap();
    assert!(value.is_none());
}

#[tokio::test]
async fn test_set_and_overwrite() {
    let db = Sqlite::new(None).await.unwrap();

    db.set("folders", "[]").await.unwrap();
    assert_eq!(db.get("folders").await.unwrap().as_deref(), Some("[]"));

    db.set("folders", r#"[{"id":"f1","name":"Work","type":"chat"}]"#)
        .await
        .unwrap();
    assert_eq!(
        db.get("folders").await.unwrap().as_deref(),
        Some(r#"[{"id":"f1","name":"Work","type":"chat"}]"#)
    );
}

#[tokio::test]
async fn test_remove() {
    let db = Sqlite::new(None).await.unwrap();

    db.set("selectedConversation", "{}").await.unwrap();
    db.set("prompts", "[]").await.unwrap();
    db.remove("selectedConversation").await.unwrap();

    assert!(db.get("selectedConversation").await.unwrap().is_none());
    assert_eq!(db.get("prompts").await.unwrap().as_deref(), Some("[]"));

    // Removing an absent key is not an error
    db.remove("selectedConversation").await.unwrap();
}

#[tokio::test]
async fn test_reopen_keeps_values() {
    let dir = std::env::temp_dir().join(format!("chatty-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("chatty.db");
    let path = path.to_str().unwrap();

    {
        let db = Sqlite::new(Some(path)).await.unwrap();
        db.set("prompts", r#"["kept"]"#).await.unwrap();
    }

    let db = Sqlite::new(Some(path)).await.unwrap();
    assert_eq!(db.get("prompts").await.unwrap().as_deref(), Some(r#"["kept"]"#));

    std::fs::remove_dir_all(&dir).ok();
}
