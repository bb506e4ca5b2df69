#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;

use clap::Parser;
use eyre::{Context, Result, bail};

use crate::config::{self, Configuration, load_configuration, lookup_config_path};

#[derive(Debug, Parser)]
#[command(
    version,
    about,
    long_about = r#"A terminal chat client with named conversations, folders and prompt templates

Default configuration file location looks up in the following order:
    * $XDG_CONFIG_HOME/chatty/config.toml
    * $HOME/.config/chatty/config.toml
    * $HOME/.chatty.toml
"#,
    disable_version_flag = true
)]
pub struct Command {
    /// Configuration file path
    #[arg(short, long, value_name = "PATH")]
    config: Option<String>,

    /// Show the version
    #[arg(short, long)]
    version: bool,
}

impl Command {
    pub fn new() -> Command {
        Self::parse()
    }

    pub fn get_config(&self) -> Result<Configuration> {
        let config_path = self
            .config
            .clone()
            .unwrap_or_else(|| lookup_config_path().unwrap_or_default());

        if config_path.is_empty() {
            // No config path is specified just use the default config
            return Ok(Configuration::default());
        }
        Ok(load_configuration(config_path.as_str()).wrap_err("loading configuration")?)
    }

    pub fn version(&self) -> bool {
        self.version
    }

    pub fn print_version(&self) {
        println!("{}", config::version())
    }
}

/// A line typed at the chat prompt. Anything not starting with `/` is a
/// message for the selected conversation.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Send(String),
    Google(String),
    New,
    List,
    Select(String),
    Delete(String),
    Rename(String),
    Move(Option<String>),
    Clear,
    Regenerate,
    Edit { index: usize, text: String },
    Search(String),
    Folder(FolderInput),
    Prompt(PromptInput),
    Export(Option<String>),
    Import(String),
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FolderInput {
    List,
    New { prompt: bool, name: String },
    Rename { id: String, name: String },
    Delete(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PromptInput {
    List(String),
    New,
    Edit { id: String, content: String },
    Use(String),
    Move { id: String, folder_id: Option<String> },
    Delete(String),
}

pub const HELP: &str = r#"Commands:
  <text>                       send a message
  /google <text>               answer with the google search plugin
  /new                         start a new conversation
  /list                        list conversations
  /select <id>                 select a conversation
  /delete <id>                 delete a conversation
  /rename <name>               rename the selected conversation
  /move <folder-id|none>       file the selected conversation
  /clear                       delete every conversation and chat folder
  /regen                       regenerate the last answer
  /edit <index> <text>         replace message <index> and resend
  /search <term>               search conversations
  /folder list|new [--prompt] <name>|rename <id> <name>|delete <id>
  /prompt list [query]|new|edit <id> <content>|use <id>|move <id> <folder-id|none>|delete <id>
  /export [dir]                export everything to a dated JSON file
  /import <path>               replace everything with an export file
  /help                        show this help
  /quit                        exit
Press Ctrl+C while a reply streams to stop it."#;

impl std::str::FromStr for Input {
    type Err = eyre::Error;

    fn from_str(line: &str) -> Result<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        let Some(command) = line.strip_prefix('/') else {
            return Ok(Input::Send(line.to_string()));
        };
        let (name, rest) = split_word(command);
        let input = match name {
            "google" => Input::Google(required(rest, "message")?),
            "new" => Input::New,
            "list" | "ls" => Input::List,
            "select" => Input::Select(required(rest, "conversation id")?),
            "delete" | "rm" => Input::Delete(required(rest, "conversation id")?),
            "rename" => Input::Rename(required(rest, "name")?),
            "move" => Input::Move(folder_arg(&required(rest, "folder id")?)),
            "clear" => Input::Clear,
            "regen" | "regenerate" => Input::Regenerate,
            "edit" => {
                let (index, text) = split_word(rest);
                let index = index
                    .parse::<usize>()
                    .wrap_err(format!("invalid message index '{}'", index))?;
                Input::Edit {
                    index,
                    text: required(text, "message")?,
                }
            }
            "search" => Input::Search(rest.trim().to_string()),
            "folder" => Input::Folder(parse_folder(rest)?),
            "prompt" => Input::Prompt(parse_prompt(rest)?),
            "export" => Input::Export(Some(rest.trim()).filter(|s| !s.is_empty()).map(String::from)),
            "import" => Input::Import(required(rest, "path")?),
            "help" | "?" => Input::Help,
            "quit" | "exit" | "q" => Input::Quit,
            other => bail!("unknown command /{}", other),
        };
        Ok(input)
    }
}

fn parse_folder(args: &str) -> Result<FolderInput> {
    let (sub, rest) = split_word(args);
    let input = match sub {
        "" | "list" => FolderInput::List,
        "new" => match rest.trim().strip_prefix("--prompt") {
            Some(name) => FolderInput::New {
                prompt: true,
                name: required(name, "folder name")?,
            },
            None => FolderInput::New {
                prompt: false,
                name: required(rest, "folder name")?,
            },
        },
        "rename" => {
            let (id, name) = split_word(rest);
            FolderInput::Rename {
                id: required(id, "folder id")?,
                name: required(name, "folder name")?,
            }
        }
        "delete" | "rm" => FolderInput::Delete(required(rest, "folder id")?),
        other => bail!("unknown folder command '{}'", other),
    };
    Ok(input)
}

fn parse_prompt(args: &str) -> Result<PromptInput> {
    let (sub, rest) = split_word(args);
    let input = match sub {
        "" | "list" => PromptInput::List(rest.trim().to_string()),
        "new" => PromptInput::New,
        "edit" => {
            let (id, content) = split_word(rest);
            PromptInput::Edit {
                id: required(id, "prompt id")?,
                content: required(content, "prompt content")?,
            }
        }
        "use" => PromptInput::Use(required(rest, "prompt id")?),
        "move" => {
            let (id, folder) = split_word(rest);
            PromptInput::Move {
                id: required(id, "prompt id")?,
                folder_id: folder_arg(&required(folder, "folder id")?),
            }
        }
        "delete" | "rm" => PromptInput::Delete(required(rest, "prompt id")?),
        other => bail!("unknown prompt command '{}'", other),
    };
    Ok(input)
}

fn split_word(input: &str) -> (&str, &str) {
    let input = input.trim_start();
    match input.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim_start()),
        None => (input, ""),
    }
}

fn required(value: &str, what: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        bail!("missing {}", what);
    }
    Ok(value.to_string())
}

fn folder_arg(value: &str) -> Option<String> {
    match value {
        "none" | "-" => None,
        id => Some(id.to_string()),
    }
}
