use std::path::Path;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use voxsync_core::app::App;
use voxsync_core::presenter::Prompt;

use crate::error::CliError;
use crate::presenter::TerminalPresenter;
use crate::settings::load_effective_settings;

/// What a line typed at the terminal means right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchInput {
    Email(String),
    Code(String),
    SyncNow,
    Quit,
    Ignored,
}

pub fn interpret_line(open_prompt: Option<Prompt>, line: &str) -> WatchInput {
    let line = line.trim();
    match line {
        "quit" | "exit" => return WatchInput::Quit,
        "" => return WatchInput::Ignored,
        _ => {}
    }
    match open_prompt {
        Some(Prompt::Email) => WatchInput::Email(line.to_string()),
        Some(Prompt::Otp) => WatchInput::Code(line.to_string()),
        None if line == "sync" => WatchInput::SyncNow,
        None => WatchInput::Ignored,
    }
}

pub async fn run_watch(settings_path: &Path) -> Result<(), CliError> {
    let settings = load_effective_settings(settings_path)?;
    let (presenter, mut prompts) = TerminalPresenter::interactive();
    let mut app = App::open(settings_path, &settings, Arc::new(presenter))?;

    println!(
        "Watching for voice notes every {}s. Type `sync` to sync now, `quit` to stop.",
        settings.sync_interval().as_secs()
    );
    app.load();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut open_prompt = None;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            Some(prompt) = prompts.recv() => {
                open_prompt = Some(prompt);
                match prompt {
                    Prompt::Email => println!("Email:"),
                    Prompt::Otp => println!("Code:"),
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match interpret_line(open_prompt, &line) {
                    WatchInput::Email(email) => {
                        // Failures are already reported; the prompt stays open.
                        if app.auth().submit_email(&email).await.is_ok() {
                            open_prompt = None;
                        }
                    }
                    WatchInput::Code(code) => {
                        if app.auth().submit_otp(&code).await.is_ok() {
                            open_prompt = None;
                            app.sync_now();
                        }
                    }
                    WatchInput::SyncNow => app.sync_now(),
                    WatchInput::Quit => break,
                    WatchInput::Ignored => {}
                }
            }
        }
    }

    app.unload().await;
    Ok(())
}
