//! Interactive chat loop.

use std::{io::IsTerminal, sync::Arc};

use rustyline::{DefaultEditor, error::ReadlineError};
use tokio::{sync::mpsc, time::Instant};

use hiroba_server::{
    domain::{DisplayName, IdentityStore, MessageLog},
    usecase::{ChatSession, IdentityState},
};

use crate::{
    config::ClientConfig,
    error::ClientError,
    infrastructure::{Backoff, FileIdentityStore, RemoteMessageLog},
    ui::render::Renderer,
};

/// Whether the loop keeps reading input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

enum Input {
    Line(String),
    Closed,
    Failed(String),
}

pub fn name_prompt(candidate: &DisplayName) -> String {
    format!(
        "Pick a display name [{candidate}]: Enter to accept, /random for another, or type your own"
    )
}

fn joined_notice(name: &DisplayName) -> String {
    format!("Joined as {name}. Type a message and press Enter. /rename, /quit")
}

/// Apply one line of input to the session and return the notices to show
pub async fn handle_line(session: &mut ChatSession, line: &str) -> (Flow, Vec<String>) {
    let input = line.trim();
    if input == "/quit" {
        return (Flow::Quit, Vec::new());
    }

    let notices = if !session.is_joined() {
        match input {
            "/random" => vec![name_prompt(session.reroll())],
            "" => match session.accept_candidate().map(joined_notice) {
                Ok(notice) => vec![notice],
                Err(e) => vec![format!("Invalid name: {e}")],
            },
            name => match session.confirm(name).map(joined_notice) {
                Ok(notice) => vec![notice],
                Err(e) => vec![
                    format!("Invalid name: {e}"),
                    name_prompt(session.display_name()),
                ],
            },
        }
    } else {
        match input {
            "/rename" => {
                session.rename();
                vec![name_prompt(session.display_name())]
            }
            "" => Vec::new(),
            _ => match session.composer() {
                Some(composer) => {
                    composer.set_draft(line).await;
                    match composer.submit().await {
                        Ok(id) => {
                            tracing::debug!("Sent message {}", id);
                            Vec::new()
                        }
                        Err(e) => vec![format!("Send failed: {e}")],
                    }
                }
                None => Vec::new(),
            },
        }
    };
    (Flow::Continue, notices)
}

/// Open the live view, printing messages as they arrive
///
/// On failure the returned notice is meant for the user; the session stays
/// usable and the caller may try again later.
pub async fn connect_live_view(session: &mut ChatSession, ansi: bool) -> Result<(), String> {
    let mut renderer = Renderer::new(ansi);
    session
        .open_live_view(move |window| {
            for line in renderer.render(window) {
                println!("{line}");
            }
        })
        .await
        .map_err(|e| format!("Live view unavailable, retrying in the background: {e}"))
}

// rustyline blocks, so it runs on a plain thread that outlives the loop
fn spawn_reader(tx: mpsc::UnboundedSender<Input>) {
    std::thread::spawn(move || {
        let mut editor = match DefaultEditor::new() {
            Ok(editor) => editor,
            Err(e) => {
                let _ = tx.send(Input::Failed(e.to_string()));
                return;
            }
        };
        loop {
            let input = match editor.readline("> ") {
                Ok(line) => {
                    let _ = editor.add_history_entry(line.as_str());
                    Input::Line(line)
                }
                Err(ReadlineError::Interrupted | ReadlineError::Eof) => Input::Closed,
                Err(e) => Input::Failed(e.to_string()),
            };
            let stop = !matches!(input, Input::Line(_));
            if tx.send(input).is_err() || stop {
                break;
            }
        }
    });
}

/// Run a session against `log` and `store` until the user quits
pub async fn run_session(
    log: Arc<dyn MessageLog>,
    store: Arc<dyn IdentityStore>,
) -> Result<(), ClientError> {
    let mut session = ChatSession::start(log, store);

    let ansi = std::io::stdout().is_terminal();
    let backoff = Backoff::default();
    let mut delay = backoff.initial;
    let mut retry_at = match connect_live_view(&mut session, ansi).await {
        Ok(()) => None,
        Err(notice) => {
            println!("{notice}");
            Some(Instant::now() + delay)
        }
    };

    match session.state() {
        IdentityState::Joined(name) => println!("{}", joined_notice(name)),
        IdentityState::Choosing { candidate } => println!("{}", name_prompt(candidate)),
    }

    let (tx, mut rx) = mpsc::unbounded_channel();
    spawn_reader(tx);

    let result = loop {
        let input = tokio::select! {
            input = rx.recv() => input,
            _ = sleep_until(retry_at), if retry_at.is_some() => {
                retry_at = match connect_live_view(&mut session, ansi).await {
                    Ok(()) => {
                        println!("Live view connected");
                        None
                    }
                    Err(notice) => {
                        delay = backoff.next(delay);
                        tracing::debug!("{}", notice);
                        Some(Instant::now() + delay)
                    }
                };
                continue;
            }
        };
        let Some(input) = input else {
            break Ok(());
        };
        match input {
            Input::Line(line) => {
                let (flow, notices) = handle_line(&mut session, &line).await;
                for notice in notices {
                    println!("{notice}");
                }
                if flow == Flow::Quit {
                    break Ok(());
                }
            }
            Input::Closed => break Ok(()),
            Input::Failed(e) => break Err(ClientError::Readline(e)),
        }
    };

    session.teardown().await;
    tracing::info!("Session closed");
    result
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Run the client until the user quits
pub async fn run(config: ClientConfig) -> Result<(), ClientError> {
    tracing::info!("Connecting to {}", config.server_url);
    let log = Arc::new(RemoteMessageLog::new(config.server_url));
    let store = Arc::new(FileIdentityStore::new(config.identity_file));
    run_session(log, store).await
}
