use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use unsent_board::common::{BoardCommand, BoardEvent, SubmitError};
use unsent_board::config::{self, AppConfig};
use unsent_board::engine::RetentionEngine;
use unsent_board::service::BoardWorker;
use unsent_board::storage;
use unsent_board::ui::render::{render_board, render_detail, render_purge_outcome};
use unsent_board::ui::rows::rows_from;
use unsent_board::ui::state::{
    BoardState, MSG_LOAD_FAILED, MSG_NOT_READY, MSG_OPEN_FAILED, MSG_RELEASED, MSG_SEND_FAILED,
};

#[derive(Parser)]
#[command(
    name = "unsent_board",
    version,
    about = "Anonymous message board where every message fades away after seven days"
)]
struct Cli {
    /// Path to JSON config file
    #[arg(long, default_value = config::DEFAULT_CONFIG_PATH, value_name = "FILE")]
    config: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Release a message into the void
    Post {
        /// Message text
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
        /// Coarse location, e.g. "48.8566, 2.3522"
        #[arg(long)]
        location: Option<String>,
    },
    /// Show every visible message, newest first
    List,
    /// Show one message in full
    Show { id: String },
    /// Delete every expired message now
    Purge,
    /// Keep the board on screen; each line typed on stdin is posted
    Watch,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();
    let mut app_config = config::load_config(&cli.config);
    app_config.apply_env_overrides();

    let store = match storage::open_store(&app_config) {
        Ok(store) => store,
        Err(err) => {
            log::error!("Unable to open message store: {err}");
            eprintln!("{MSG_OPEN_FAILED}");
            return ExitCode::FAILURE;
        }
    };
    let engine = Arc::new(RetentionEngine::new(store));

    match cli.command {
        Command::Post { text, location } => {
            let location = location.or_else(|| app_config.default_location.clone());
            post(&engine, &text.join(" "), location.as_deref()).await;
        }
        Command::List => list(&engine).await,
        Command::Show { id } => show(&engine, &id).await,
        Command::Purge => {
            let outcome = engine.purge_expired(engine.now()).await;
            if let Err(err) = &outcome {
                log::error!("Failed to purge expired messages: {err}");
            }
            println!("{}", render_purge_outcome(&outcome));
        }
        Command::Watch => watch(engine.clone(), &app_config).await,
    }

    engine.wait_for_purges().await;
    ExitCode::SUCCESS
}

async fn post(engine: &RetentionEngine, text: &str, location: Option<&str>) {
    match engine.submit(text, location).await {
        Ok(message) => println!("{MSG_RELEASED} ({})", message.id),
        Err(SubmitError::EmptyMessage) => println!("{MSG_NOT_READY}"),
        Err(err) => {
            log::error!("Failed to submit message: {err}");
            println!("{MSG_SEND_FAILED}");
        }
    }
}

async fn list(engine: &RetentionEngine) {
    let now = engine.now();
    let mut state = BoardState::new();
    match engine.load_visible(now).await {
        Ok(visible) => state.apply(BoardEvent::Refreshed(rows_from(&visible, now))),
        Err(err) => {
            log::error!("Failed to load messages: {err}");
            state.apply(BoardEvent::LoadFailed(MSG_LOAD_FAILED.to_string()));
        }
    }
    print!("{}", with_newline(render_board(&state)));
}

async fn show(engine: &RetentionEngine, id: &str) {
    match engine.fetch(id, engine.now()).await {
        Ok(Some(visible)) => println!("{}", render_detail(&visible.message)),
        Ok(None) => println!("that message has already faded away."),
        Err(err) => {
            log::error!("Failed to fetch message {id}: {err}");
            println!("{MSG_LOAD_FAILED}");
        }
    }
}

async fn watch(engine: Arc<RetentionEngine>, app_config: &AppConfig) {
    // UI -> worker
    let (cmd_tx, cmd_rx) = mpsc::channel(100);
    // worker -> UI
    let (event_tx, mut event_rx) = mpsc::channel(100);

    let worker = BoardWorker::new(engine, event_tx, cmd_rx, app_config.refresh_interval())
        .visible(true)
        .default_location(app_config.default_location.clone());
    let worker = tokio::spawn(worker.run());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut state = BoardState::new();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            line = lines.next_line(), if stdin_open => {
                match line {
                    Ok(Some(text)) => {
                        let command = BoardCommand::Submit { text, location: None };
                        if let Err(err) = cmd_tx.send(command).await {
                            log::warn!("Failed to send command to board worker: {err}");
                        }
                    }
                    Ok(None) => stdin_open = false,
                    Err(err) => {
                        log::warn!("Failed to read stdin: {err}");
                        stdin_open = false;
                    }
                }
            }
            event = event_rx.recv() => {
                let Some(event) = event else { break };
                let redraw = matches!(event, BoardEvent::Refreshed(_) | BoardEvent::LoadFailed(_));
                state.apply(event);
                if let Some(status) = state.take_status() {
                    println!("» {}", status.text);
                }
                if redraw {
                    println!("{}", render_board(&state));
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    drop(cmd_tx);
    if let Err(err) = worker.await {
        log::error!("Board worker terminated unexpectedly: {err}");
    }
}

fn with_newline(mut text: String) -> String {
    if !text.ends_with('\n') {
        text.push('\n');
    }
    text
}
