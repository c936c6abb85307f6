//! Memory Pond CLI - interactive terminal front end for the reflection ritual.
//!
//! # Flow
//!
//! ```text
//! main() -> parse_args() -> Play | Reset | List
//!                             |
//!                             v
//!   resume stored session or begin(title, offering)
//!                             |
//!                             v
//!   read reply -> engine.advance() -> print turn -> persist session
//!                             |
//!                       (finished) -> ask to save -> engine.archive()
//! ```
//!
//! The session is written back to the store after every reply, so quitting at
//! any point (`/quit` or end of input) resumes from the same place next time.

mod args;
mod render;

use std::{
    fs::{self, OpenOptions},
    path::PathBuf,
    sync::Mutex,
};

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use pond_config::{PondConfig, Settings};
use pond_core::{
    JsonFileSessionStore, JsonlArchive, RitualEngine, RitualSession, SessionStore,
};
use pond_providers::{ApiKey, ChatClient, ChatConfig};
use pond_types::SessionId;

use crate::args::{Command, USAGE, parse_args};
use crate::render::{archived_line, render_turn, session_status};

type Input = Lines<BufReader<Stdin>>;

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::try_new("warn").expect("warn filter is valid"));

    let (log_file, init_warnings) = open_pond_log_file();

    if let Some((log_path, file)) = log_file {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .with(env_filter)
            .init();

        tracing::info!(path = %log_path.display(), "Logging initialized");
        for warning in init_warnings {
            tracing::warn!("{warning}");
        }
        return;
    }

    // Without a log file, stay silent rather than interleave logs with the ritual.
    tracing_subscriber::registry().with(env_filter).init();
}

fn open_pond_log_file() -> (Option<(PathBuf, fs::File)>, Vec<String>) {
    let mut warnings = Vec::new();

    for candidate in pond_log_file_candidates() {
        if let Some(parent) = candidate.parent()
            && let Err(e) = fs::create_dir_all(parent)
        {
            warnings.push(format!(
                "Failed to create log dir {}: {e}",
                parent.display()
            ));
            continue;
        }

        match OpenOptions::new().create(true).append(true).open(&candidate) {
            Ok(file) => return (Some((candidate, file)), warnings),
            Err(e) => {
                warnings.push(format!(
                    "Failed to open log file {}: {e}",
                    candidate.display()
                ));
            }
        }
    }

    (None, warnings)
}

fn pond_log_file_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    // Primary: ~/.pond/logs/pond.log
    if let Some(config_path) = PondConfig::path()
        && let Some(config_dir) = config_path.parent()
    {
        candidates.push(config_dir.join("logs").join("pond.log"));
    }

    // Fallback: ./.pond/logs/pond.log
    candidates.push(PathBuf::from(".pond").join("logs").join("pond.log"));

    candidates
}

fn load_settings() -> Settings {
    let config = match PondConfig::load() {
        Ok(config) => config.unwrap_or_default(),
        Err(e) => {
            eprintln!("Ignoring config at {}: {e}", e.path().display());
            PondConfig::default()
        }
    };
    config.resolve()
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let command = match parse_args(std::env::args().skip(1)) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("{e}\n\n{USAGE}");
            std::process::exit(2);
        }
    };
    if command == Command::Help {
        println!("{USAGE}");
        return Ok(());
    }

    let settings = load_settings();
    tracing::debug!(?settings, "Resolved settings");

    let mut store = JsonFileSessionStore::open(&settings.sessions_path)
        .with_context(|| format!("opening {}", settings.sessions_path.display()))?;

    match command {
        Command::List => list(&settings, &store),
        Command::Reset(id) => {
            store.put(&id, None)?;
            println!("Session {id} reset.");
            Ok(())
        }
        Command::Play(id) => play(&settings, &mut store, &id).await,
        Command::Help => Ok(()),
    }
}

fn list(settings: &Settings, store: &JsonFileSessionStore) -> Result<()> {
    let archive = JsonlArchive::new(settings.archive_path.clone());
    let records = archive
        .read_all()
        .with_context(|| format!("reading {}", archive.path().display()))?;
    if records.is_empty() {
        println!("The archive is empty.");
    } else {
        println!("Archived memories:");
        for record in &records {
            println!("  {}", archived_line(record));
        }
    }

    let ids = store.ids();
    if ids.is_empty() {
        println!("No stored sessions.");
    } else {
        println!("Stored sessions:");
        for id in ids {
            println!("  {id}: {}", session_status(store.get(&id).as_ref()));
        }
    }
    Ok(())
}

/// Persist the session, reporting a failed write without ending the ritual.
fn save_session(store: &mut JsonFileSessionStore, id: &SessionId, session: &RitualSession) {
    if let Err(e) = store.put(id, Some(session.clone())) {
        tracing::warn!(session = %id, error = %e, "Failed to persist session");
        eprintln!("Warning: could not save your place: {e}");
    }
}

async fn prompt(input: &mut Input, label: &str) -> Result<Option<String>> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(label.as_bytes()).await?;
    stdout.flush().await?;
    Ok(input.next_line().await?)
}

async fn play(settings: &Settings, store: &mut JsonFileSessionStore, id: &SessionId) -> Result<()> {
    let config = ChatConfig::new(
        settings.base_url.clone(),
        ApiKey::new(settings.api_key.clone()),
        settings.model.clone(),
    )
    .with_timeout(settings.timeout);
    let engine = RitualEngine::new(ChatClient::new(config)?);
    let archive = JsonlArchive::new(settings.archive_path.clone());
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    let mut session = match store.get(id).filter(|s| !s.is_finished()) {
        Some(session) => {
            println!(
                "Resuming \"{}\" ({}).\n",
                session.title(),
                session_status(Some(&session))
            );
            if let Some(last) = session.history().last() {
                println!("{}\n", last.text());
            }
            session
        }
        None => match begin(&engine, &mut input).await? {
            Some(session) => session,
            None => return Ok(()),
        },
    };
    save_session(store, id, &session);

    while !session.is_finished() {
        let Some(reply) = prompt(&mut input, "> ").await? else {
            break;
        };
        let reply = reply.trim();
        if matches!(reply, "/quit" | "/exit") {
            break;
        }

        match engine.advance(&mut session, reply).await {
            Ok(turn) => println!("\n{}\n", render_turn(&turn)),
            Err(e) => eprintln!("\nThe pond could not answer: {e}\n"),
        }
        save_session(store, id, &session);
    }

    if session.is_finished() {
        offer_archive(&engine, &session, &archive, &mut input).await?;
    } else {
        println!("The pond will keep your place. Run again with the same session to continue.");
    }
    Ok(())
}

/// Ask for a title and offering, then produce the first turn.
async fn begin(
    engine: &RitualEngine<ChatClient>,
    input: &mut Input,
) -> Result<Option<RitualSession>> {
    println!("Offer a memory to the pond.\n");
    let title = loop {
        let Some(title) = prompt(input, "Title (1-5 words): ").await? else {
            return Ok(None);
        };
        if !title.trim().is_empty() {
            break title;
        }
        println!("Give the memory a short title first.");
    };
    let Some(offering) = prompt(input, "What happened? ").await? else {
        return Ok(None);
    };

    match engine.begin(&title, &offering).await {
        Ok((session, turn)) => {
            println!("\n{}\n", render_turn(&turn));
            Ok(Some(session))
        }
        Err(e) => {
            eprintln!("\nThe pond could not answer: {e}");
            Ok(None)
        }
    }
}

async fn offer_archive(
    engine: &RitualEngine<ChatClient>,
    session: &RitualSession,
    archive: &JsonlArchive,
    input: &mut Input,
) -> Result<()> {
    let answer = prompt(input, "Save this memory to the archive? [y/N] ").await?;
    let save = answer.is_some_and(|a| matches!(a.trim().to_lowercase().as_str(), "y" | "yes"));
    let outcome = engine.archive(session, save, archive).await?;
    println!("{}", outcome.message());
    Ok(())
}
