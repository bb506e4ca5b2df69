use super::*;

fn parse(line: &str) -> Input {
    line.parse().expect("failed to parse input")
}

#[test]
fn test_plain_text_is_a_message() {
    assert_eq!(parse("Hello there\n"), Input::Send("Hello there".to_string()));
    assert_eq!(parse(""), Input::Send(String::new()));
}

#[test]
fn test_commands() {
    assert_eq!(parse("/new"), Input::New);
    assert_eq!(parse("/ls"), Input::List);
    assert_eq!(parse("/select abc"), Input::Select("abc".to_string()));
    assert_eq!(parse("/rename  My chat "), Input::Rename("My chat".to_string()));
    assert_eq!(parse("/move none"), Input::Move(None));
    assert_eq!(parse("/move f1"), Input::Move(Some("f1".to_string())));
    assert_eq!(parse("/regen"), Input::Regenerate);
    assert_eq!(
        parse("/edit 2 What about Rust?"),
        Input::Edit {
            index: 2,
            text: "What about Rust?".to_string()
        }
    );
    assert_eq!(parse("/google weather"), Input::Google("weather".to_string()));
    assert_eq!(parse("/export"), Input::Export(None));
    assert_eq!(parse("/export /tmp"), Input::Export(Some("/tmp".to_string())));
    assert_eq!(parse("/q"), Input::Quit);
}

#[test]
fn test_folder_commands() {
    assert_eq!(parse("/folder"), Input::Folder(FolderInput::List));
    assert_eq!(
        parse("/folder new Work stuff"),
        Input::Folder(FolderInput::New {
            prompt: false,
            name: "Work stuff".to_string()
        })
    );
    assert_eq!(
        parse("/folder new --prompt Templates"),
        Input::Folder(FolderInput::New {
            prompt: true,
            name: "Templates".to_string()
        })
    );
    assert_eq!(
        parse("/folder rename f1 Projects"),
        Input::Folder(FolderInput::Rename {
            id: "f1".to_string(),
            name: "Projects".to_string()
        })
    );
}

#[test]
fn test_prompt_commands() {
    assert_eq!(parse("/prompt list rev"), Input::Prompt(PromptInput::List("rev".to_string())));
    assert_eq!(
        parse("/prompt edit p1 Review {{code}} please"),
        Input::Prompt(PromptInput::Edit {
            id: "p1".to_string(),
            content: "Review {{code}} please".to_string()
        })
    );
    assert_eq!(
        parse("/prompt move p1 -"),
        Input::Prompt(PromptInput::Move {
            id: "p1".to_string(),
            folder_id: None
        })
    );
}

#[test]
fn test_invalid_commands() {
    assert!("/bogus".parse::<Input>().is_err());
    assert!("/select".parse::<Input>().is_err());
    assert!("/edit x text".parse::<Input>().is_err());
    assert!("/edit 1".parse::<Input>().is_err());
    assert!("/folder new".parse::<Input>().is_err());
    assert!("/prompt frobnicate".parse::<Input>().is_err());
}
