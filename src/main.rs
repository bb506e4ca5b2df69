use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use chatty::app::{App, ConversationField, Outcome, StopHandle};
use chatty::backend::new_backend;
use chatty::cli::{Command, FolderInput, HELP, Input, PromptInput};
use chatty::config::{Configuration, init_logger, verbose};
use chatty::export::{read_import, write_export};
use chatty::models::{Event, FolderKind, Message, Plugin, SessionState, Status, filter_prompts};
use chatty::storage::{clean::Defaults, new_storage};
use eyre::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::{mpsc, watch};
use tokio::task;
use tokio_util::sync::CancellationToken;

type InputLines = Lines<BufReader<Stdin>>;

#[tokio::main]
async fn main() -> Result<()> {
    let cmd = Command::new();
    if cmd.version() {
        cmd.print_version();
        return Ok(());
    }

    better_panic::Settings::auto().install();

    let config = cmd.get_config()?;
    init_logger(&config.log)?;
    Configuration::init(config)?;
    let config = Configuration::instance();
    verbose!("[+] Logger initialized");

    verbose!("[+] Initializing backend...");
    let backend = new_backend(&config.backend).wrap_err("initializing backend")?;

    verbose!("[+] Initializing storage...");
    let storage = new_storage(&config.storage)
        .await
        .wrap_err("initializing storage")?;
    verbose!("[+] Storage initialized");

    let (event_tx, event_rx) = mpsc::unbounded_channel::<Event>();
    let token = CancellationToken::new();

    let mut app = App::new(
        backend,
        storage,
        Arc::new(event_tx),
        Defaults::from_config(),
        config.general.stop_reset_delay(),
    );

    verbose!("[+] Loading conversations...");
    app.load().await.wrap_err("loading conversations")?;
    verbose!(
        "[+] Loaded {} conversations",
        app.repository().conversations().len()
    );

    let mut task_set = task::JoinSet::new();
    task_set.spawn(print_events(event_rx, token.clone()));
    task_set.spawn(handle_interrupts(
        app.stop_handle(),
        app.subscribe_status(),
        token.clone(),
    ));

    println!("{}. Type /help for commands.", chatty::config::version());
    let result = run(&mut app, &token).await;

    token.cancel();
    while let Some(res) = task_set.join_next().await {
        if let Err(err) = res {
            log::error!("Task error: {}", err);
        }
    }
    result
}

async fn run(app: &mut App, token: &CancellationToken) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("[{}] > ", app.selected().name());
        std::io::stdout().flush().ok();

        let line = tokio::select! {
            _ = token.cancelled() => return Ok(()),
            line = lines.next_line() => line.wrap_err("reading input")?,
        };
        let Some(line) = line else {
            return Ok(());
        };

        let input = match line.parse::<Input>() {
            Ok(input) => input,
            Err(err) => {
                eprintln!("{}", err);
                continue;
            }
        };
        match input {
            Input::Quit => return Ok(()),
            Input::Send(text) if text.trim().is_empty() => continue,
            input => {
                if let Err(err) = handle(app, input, &mut lines).await {
                    log::error!("Command failed: {:?}", err);
                    eprintln!("Error: {:#}", err);
                }
            }
        }
    }
}

async fn handle(app: &mut App, input: Input, lines: &mut InputLines) -> Result<()> {
    let selected_id = app.selected().id().to_string();
    match input {
        Input::Send(text) => {
            let outcome = app.send(Message::new_user(text), 0, None).await?;
            report(outcome);
        }
        Input::Google(text) => {
            let outcome = app
                .send(Message::new_user(text), 0, Some(Plugin::GoogleSearch))
                .await?;
            report(outcome);
        }
        Input::New => {
            app.new_conversation().await?;
            println!("Started conversation {}", app.selected().id());
        }
        Input::List => {
            for convo in app.repository().conversations() {
                let marker = if convo.id() == selected_id { "*" } else { " " };
                let folder = convo
                    .folder_id()
                    .and_then(|id| app.repository().folders().iter().find(|f| f.id() == id))
                    .map(|f| format!(" [{}]", f.name()))
                    .unwrap_or_default();
                println!(
                    "{} {}  {}{} ({} messages)",
                    marker,
                    convo.id(),
                    convo.name(),
                    folder,
                    convo.len()
                );
            }
        }
        Input::Select(id) => {
            app.select_conversation(&id).await?;
            print_transcript(app);
        }
        Input::Delete(id) => app.delete_conversation(&id).await?,
        Input::Rename(name) => {
            app.update_conversation(&selected_id, ConversationField::Name(name))
                .await?
        }
        Input::Move(folder_id) => {
            app.update_conversation(&selected_id, ConversationField::FolderId(folder_id))
                .await?
        }
        Input::Clear => app.clear_conversations().await?,
        Input::Regenerate => {
            let outcome = app.regenerate().await?;
            report(outcome);
        }
        Input::Edit { index, text } => {
            let outcome = app
                .edit_message(Message::new_user(text), index, None)
                .await?;
            report(outcome);
        }
        Input::Search(term) => {
            for convo in app.search(&term) {
                println!("  {}  {}", convo.id(), convo.name());
            }
        }
        Input::Folder(folder) => handle_folder(app, folder).await?,
        Input::Prompt(prompt) => handle_prompt(app, prompt, lines).await?,
        Input::Export(dir) => {
            let dir = dir.unwrap_or_else(|| ".".to_string());
            let date = chrono::Local::now().date_naive();
            let path = write_export(&app.export(), Path::new(&dir), date).await?;
            println!("Exported to {}", path.display());
        }
        Input::Import(path) => {
            let data = read_import(Path::new(&path), app.repository().defaults()).await?;
            app.import(data).await?;
        }
        Input::Help => println!("{}", HELP),
        Input::Quit => {}
    }
    Ok(())
}

async fn handle_folder(app: &mut App, input: FolderInput) -> Result<()> {
    match input {
        FolderInput::List => {
            for folder in app.repository().folders() {
                println!("  {}  {} ({})", folder.id(), folder.name(), folder.kind());
            }
        }
        FolderInput::New { prompt, name } => {
            let kind = if prompt {
                FolderKind::Prompt
            } else {
                FolderKind::Chat
            };
            app.create_folder(&name, kind).await?;
        }
        FolderInput::Rename { id, name } => app.rename_folder(&id, &name).await?,
        FolderInput::Delete(id) => app.delete_folder(&id).await?,
    }
    Ok(())
}

async fn handle_prompt(app: &mut App, input: PromptInput, lines: &mut InputLines) -> Result<()> {
    match input {
        PromptInput::List(query) => {
            for prompt in filter_prompts(app.repository().prompts(), &query) {
                println!("  {}  {}  {}", prompt.id(), prompt.name(), prompt.content());
            }
        }
        PromptInput::New => app.create_prompt().await?,
        PromptInput::Edit { id, content } => {
            let Some(prompt) = app.repository().prompts().iter().find(|p| p.id() == id) else {
                eyre::bail!("unknown prompt {}", id);
            };
            let prompt = prompt.clone().with_content(content);
            app.update_prompt(prompt).await?;
        }
        PromptInput::Use(id) => {
            let Some(prompt) = app.repository().prompts().iter().find(|p| p.id() == id) else {
                eyre::bail!("unknown prompt {}", id);
            };
            let prompt = prompt.clone();
            let variables = prompt.variables();
            let mut values: Vec<String> = Vec::with_capacity(variables.len());
            for (idx, name) in variables.iter().enumerate() {
                if let Some(first) = variables[..idx].iter().position(|v| v == name) {
                    let value = values[first].clone();
                    values.push(value);
                    continue;
                }
                print!("{}: ", name);
                std::io::stdout().flush().ok();
                let value = lines
                    .next_line()
                    .await
                    .wrap_err("reading input")?
                    .unwrap_or_default();
                values.push(value);
            }
            let outcome = app
                .send(Message::new_user(prompt.render(&values)), 0, None)
                .await?;
            report(outcome);
        }
        PromptInput::Move { id, folder_id } => app.move_prompt(&id, folder_id).await?,
        PromptInput::Delete(id) => app.delete_prompt(&id).await?,
    }
    Ok(())
}

fn report(outcome: Outcome) {
    match outcome {
        // Failures and rejections arrive as notices
        Outcome::Completed | Outcome::Failed(_) | Outcome::Rejected(_) => {}
        Outcome::Cancelled => eprintln!("[stopped]"),
        Outcome::Skipped => eprintln!("Nothing to regenerate"),
    }
}

fn print_transcript(app: &App) {
    for (idx, message) in app.selected().messages().iter().enumerate() {
        println!("{:>3} {}> {}", idx, message.role(), message.content());
    }
}

/// Render streamed text and notices as they arrive.
async fn print_events(mut events: mpsc::UnboundedReceiver<Event>, token: CancellationToken) {
    let mut state = SessionState::Idle;
    loop {
        let event = tokio::select! {
            _ = token.cancelled() => return,
            event = events.recv() => match event {
                Some(event) => event,
                None => return,
            },
        };
        match event {
            Event::StreamChunk(chunk) => print!("{}", chunk),
            Event::ConversationUpdated(convo) if state == SessionState::WaitingJson => {
                if let Some(answer) = convo.last_message().filter(|m| m.is_assistant()) {
                    print!("{}", answer.content());
                }
            }
            Event::StatusChanged(status) => {
                match (state, status.state) {
                    (SessionState::Idle, SessionState::Sending) => print!("assistant> "),
                    (SessionState::Idle, _) => {}
                    (_, SessionState::Idle) => println!(),
                    _ => {}
                }
                state = status.state;
            }
            Event::Notice(notice) => eprintln!("\n[{}] {}", notice.kind(), notice.message()),
            Event::ConversationUpdated(_) | Event::ConversationsUpdated(_) => {}
        }
        std::io::stdout().flush().ok();
    }
}

/// Ctrl+C stops a streaming reply, or quits when nothing is running.
async fn handle_interrupts(
    stop: StopHandle,
    status: watch::Receiver<Status>,
    token: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = token.cancelled() => return,
            res = tokio::signal::ctrl_c() => {
                if let Err(err) = res {
                    log::error!("Failed to listen for Ctrl+C: {}", err);
                    return;
                }
                if status.borrow().is_idle() {
                    token.cancel();
                    return;
                }
                stop.stop();
            }
        }
    }
}
