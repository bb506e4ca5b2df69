use super::*;

fn defaults() -> Defaults {
    Defaults {
        model: Model::default(),
        prompt: "Be helpful.".to_string(),
    }
}

fn conversation(id: &str) -> Conversation {
    Conversation::new(Model::default(), "Be helpful.")
        .with_id(id)
        .with_messages(vec![Message::new_user(format!("hello from {}", id))])
}

fn repo_with(ids: &[&str]) -> Repository {
    let conversations: Vec<Conversation> = ids.iter().map(|id| conversation(id)).collect();
    let snapshot = Snapshot {
        selected: conversations.last().cloned(),
        conversations,
        ..Default::default()
    };
    Repository::from_snapshot(snapshot, defaults())
}

fn ids(conversations: &[Conversation]) -> Vec<&str> {
    conversations.iter().map(|c| c.id()).collect()
}

#[test]
fn test_update_conversation_replaces_or_appends() {
    let list = vec![conversation("a"), conversation("b")];

    let renamed = list[0].clone().with_name("Renamed");
    let Updated { single, all } = update_conversation(&list, renamed.clone());
    assert_eq!(single, renamed);
    assert_eq!(ids(&all), vec!["a", "b"]);
    assert_eq!(all[0].name(), "Renamed");

    let Updated { all, .. } = update_conversation(&list, conversation("c"));
    assert_eq!(ids(&all), vec!["a", "b", "c"]);
}

#[test]
fn test_update_emits_record_then_list() {
    let mut repo = repo_with(&["a"]);
    let updated = repo.selected().clone().with_name("Other");

    let actions = repo.update_conversation(updated.clone());
    assert_eq!(
        actions,
        vec![
            Action::SaveConversation(updated.clone()),
            Action::SaveConversations(vec![updated.clone()]),
        ]
    );
    assert_eq!(repo.selected(), &updated);
}

#[test]
fn test_create_conversation_inherits_last_model() {
    let mut repo = Repository::new(defaults());
    repo.create_conversation();
    assert_eq!(repo.selected().model(), &Model::default());

    let gpt4 = Model::new("gpt-4").with_name("GPT-4");
    let id = repo.selected().id().to_string();
    repo.patch_conversation(&id, ConversationField::Model(gpt4.clone()));

    let actions = repo.create_conversation();
    assert_eq!(repo.conversations().len(), 2);
    let created = repo.selected();
    assert_eq!(created.model(), &gpt4);
    assert_eq!(created.name(), "New Conversation");
    assert_eq!(created.prompt(), "Be helpful.");
    assert!(created.is_empty());
    assert_eq!(created.folder_id(), None);
    assert!(matches!(actions[0], Action::SaveConversation(_)));
    assert!(matches!(actions[1], Action::SaveConversations(ref all) if all.len() == 2));
}

#[test]
fn test_select_conversation() {
    let mut repo = repo_with(&["a", "b"]);
    let actions = repo.select_conversation("a");
    assert_eq!(repo.selected().id(), "a");
    assert_eq!(actions, vec![Action::SaveConversation(conversation("a"))]);

    assert!(repo.select_conversation("missing").is_empty());
    assert_eq!(repo.selected().id(), "a");
}

#[test]
fn test_delete_selects_last_remaining() {
    let mut repo = repo_with(&["a", "b", "c"]);
    repo.select_conversation("a");

    let actions = repo.delete_conversation("c");
    assert_eq!(ids(repo.conversations()), vec!["a", "b"]);
    assert_eq!(repo.selected().id(), "b");
    assert_eq!(
        actions,
        vec![
            Action::SaveConversations(vec![conversation("a"), conversation("b")]),
            Action::SaveConversation(conversation("b")),
        ]
    );
}

#[test]
fn test_delete_only_conversation() {
    let mut repo = repo_with(&["a"]);

    let actions = repo.delete_conversation("a");
    assert!(repo.conversations().is_empty());
    assert_ne!(repo.selected().id(), "a");
    assert!(repo.selected().is_empty());
    assert_eq!(repo.selected().name(), "New Conversation");
    assert_eq!(
        actions,
        vec![Action::SaveConversations(vec![]), Action::RemoveConversation]
    );
}

#[test]
fn test_unknown_ids_are_noops() {
    let mut repo = repo_with(&["a"]);
    let before = repo.clone();

    assert!(repo.delete_conversation("zzz").is_empty());
    assert!(repo.patch_conversation("zzz", ConversationField::Name("x".into())).is_empty());
    assert!(repo.rename_folder("zzz", "x").is_empty());
    assert!(repo.delete_folder("zzz").is_empty());
    assert!(repo.delete_prompt("zzz").is_empty());
    assert!(repo.move_prompt("zzz", None).is_empty());
    assert!(
        repo.update_prompt(Prompt::new("x", Model::default()).with_id("zzz"))
            .is_empty()
    );

    assert_eq!(repo.conversations(), before.conversations());
    assert_eq!(repo.selected(), before.selected());
}

#[test]
fn test_clear_all_keeps_prompt_folders() {
    let mut repo = repo_with(&["a", "b"]);
    repo.create_folder("Chats", FolderKind::Chat);
    repo.create_folder("Templates", FolderKind::Prompt);

    let actions = repo.clear_all();
    assert!(repo.conversations().is_empty());
    assert!(repo.selected().is_empty());
    assert_eq!(repo.folders().len(), 1);
    assert_eq!(repo.folders()[0].name(), "Templates");
    assert_eq!(
        actions,
        vec![
            Action::RemoveConversations,
            Action::RemoveConversation,
            Action::SaveFolders(repo.folders().to_vec()),
        ]
    );
}

#[test]
fn test_delete_folder_unfiles_members() {
    let mut repo = repo_with(&["a", "b"]);
    repo.create_folder("Work", FolderKind::Chat);
    repo.create_folder("Templates", FolderKind::Prompt);
    let chat_folder = repo.folders_of(FolderKind::Chat)[0].id().to_string();
    let prompt_folder = repo.folders_of(FolderKind::Prompt)[0].id().to_string();

    repo.patch_conversation("a", ConversationField::FolderId(Some(chat_folder.clone())));
    repo.patch_conversation("b", ConversationField::FolderId(Some(chat_folder.clone())));
    repo.create_prompt();
    let prompt_id = repo.prompts()[0].id().to_string();
    repo.move_prompt(&prompt_id, Some(prompt_folder.clone()));
    assert_eq!(repo.conversations_in(Some(&chat_folder)).len(), 2);
    assert_eq!(repo.selected().folder_id(), Some(chat_folder.as_str()));

    let actions = repo.delete_folder(&chat_folder);
    assert!(repo.conversations_in(Some(&chat_folder)).is_empty());
    assert_eq!(repo.conversations_in(None).len(), 2);
    assert_eq!(repo.selected().folder_id(), None);
    assert_eq!(repo.prompts()[0].folder_id(), Some(prompt_folder.as_str()));
    assert!(matches!(actions[0], Action::SaveFolders(ref f) if f.len() == 1));
    assert!(matches!(actions[1], Action::SaveConversations(_)));
    assert!(matches!(actions[2], Action::SavePrompts(_)));
    assert!(matches!(actions[3], Action::SaveConversation(_)));

    repo.delete_folder(&prompt_folder);
    assert_eq!(repo.prompts()[0].folder_id(), None);
    assert!(repo.folders().is_empty());
}

#[test]
fn test_move_into_wrong_kind_is_ignored() {
    let mut repo = repo_with(&["a"]);
    repo.create_folder("Templates", FolderKind::Prompt);
    let prompt_folder = repo.folders()[0].id().to_string();

    let actions = repo.patch_conversation("a", ConversationField::FolderId(Some(prompt_folder)));
    assert!(actions.is_empty());
    assert_eq!(repo.selected().folder_id(), None);

    let actions =
        repo.patch_conversation("a", ConversationField::FolderId(Some("nowhere".into())));
    assert!(actions.is_empty());
}

#[test]
fn test_rename_folder() {
    let mut repo = Repository::new(defaults());
    repo.create_folder("Old", FolderKind::Chat);
    let id = repo.folders()[0].id().to_string();

    let actions = repo.rename_folder(&id, "New");
    assert_eq!(repo.folders()[0].name(), "New");
    assert_eq!(actions, vec![Action::SaveFolders(repo.folders().to_vec())]);
}

#[test]
fn test_prompt_crud() {
    let mut repo = Repository::new(defaults());
    repo.create_prompt();
    repo.create_prompt();
    assert_eq!(repo.prompts()[0].name(), "Prompt 1");
    assert_eq!(repo.prompts()[1].name(), "Prompt 2");
    assert_eq!(repo.prompts()[0].model(), &Model::default());

    let edited = repo.prompts()[1].clone().with_content("Translate {{text}}");
    let actions = repo.update_prompt(edited.clone());
    assert_eq!(repo.prompts()[1], edited);
    assert_eq!(actions, vec![Action::SavePrompts(repo.prompts().to_vec())]);

    let first = repo.prompts()[0].id().to_string();
    repo.delete_prompt(&first);
    assert_eq!(repo.prompts(), &[edited]);
}

#[test]
fn test_patch_fields() {
    let mut repo = repo_with(&["a", "b"]);

    repo.patch_conversation("a", ConversationField::Name("Renamed".into()));
    assert_eq!(repo.selected().id(), "a");
    assert_eq!(repo.selected().name(), "Renamed");

    repo.patch_conversation("a", ConversationField::Prompt("Be terse.".into()));
    assert_eq!(repo.selected().prompt(), "Be terse.");

    let actions = repo.patch_conversation("a", ConversationField::Messages(vec![]));
    assert!(repo.selected().is_empty());
    assert!(repo.conversation("a").unwrap().is_empty());
    assert_eq!(actions.len(), 2);
}

#[test]
fn test_search_conversations() {
    let mut repo = repo_with(&["a", "b"]);
    repo.patch_conversation("b", ConversationField::Name("Rust lifetimes".into()));

    let found = repo.search_conversations("HELLO FROM A");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id(), "a");

    let found = repo.search_conversations("rust");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id(), "b");

    assert_eq!(repo.search_conversations("").len(), 2);
    assert!(repo.search_conversations("python").is_empty());
}

#[test]
fn test_from_snapshot_prefers_selected_record() {
    let stale = conversation("a");
    let current = stale
        .clone()
        .with_messages(vec![
            Message::new_user("hello from a"),
            Message::new_assistant("newer reply"),
        ]);
    let snapshot = Snapshot {
        conversations: vec![stale, conversation("b")],
        selected: Some(current.clone()),
        ..Default::default()
    };

    let mut repo = Repository::from_snapshot(snapshot, defaults());
    assert_eq!(repo.selected(), &current);
    assert_eq!(repo.conversations()[0], current);
    assert_eq!(ids(repo.conversations()), vec!["a", "b"]);

    // Switching away keeps the newer reply in the list
    let actions = repo.select_conversation("b");
    assert_eq!(actions, vec![Action::SaveConversation(conversation("b"))]);
    assert_eq!(repo.conversations()[0].len(), 2);
}

#[test]
fn test_from_snapshot_keeps_unsaved_selection_out_of_list() {
    let snapshot = Snapshot {
        conversations: vec![conversation("a")],
        selected: Some(conversation("fresh").with_messages(vec![])),
        ..Default::default()
    };

    let repo = Repository::from_snapshot(snapshot, defaults());
    assert_eq!(repo.selected().id(), "fresh");
    assert_eq!(ids(repo.conversations()), vec!["a"]);
}

#[test]
fn test_import_replaces_state() {
    let mut repo = repo_with(&["old"]);
    let data = ExportData {
        version: 4,
        history: vec![conversation("x"), conversation("y")],
        folders: vec![Folder::new("Work", FolderKind::Chat).with_id("f1")],
        prompts: vec![],
    };

    let actions = repo.import(data.clone());
    assert_eq!(ids(repo.conversations()), vec!["x", "y"]);
    assert_eq!(repo.selected().id(), "y");
    assert_eq!(repo.folders(), data.folders.as_slice());
    assert_eq!(
        actions,
        vec![
            Action::SaveConversations(data.history.clone()),
            Action::SaveConversation(conversation("y")),
            Action::SaveFolders(data.folders.clone()),
            Action::SavePrompts(vec![]),
        ]
    );

    assert_eq!(repo.export(), data);
}

#[test]
fn test_import_empty_history() {
    let mut repo = repo_with(&["old"]);
    let actions = repo.import(ExportData {
        version: 4,
        history: vec![],
        folders: vec![],
        prompts: vec![],
    });
    assert!(repo.conversations().is_empty());
    assert_ne!(repo.selected().id(), "old");
    assert_eq!(actions[1], Action::RemoveConversation);
}
