mod cli;
mod display;
pub mod editor;
pub mod models;
pub mod presets;
pub mod settings;
pub mod timer;
mod utils;

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::broadcast::error::RecvError,
};

use cli::{Cli, Command, RunArgs};
use editor::ValidatedSession;
use settings::{PlaybackSettings, SettingsStore};
use timer::{commands, PlaybackCommand, PlaybackController, PlaybackEvent};

/// How long shutdown waits for the blocking stdin reader before giving up on it.
const STDIN_SHUTDOWN_GRACE: Duration = Duration::from_millis(100);

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Finished,
    Cancelled,
}

pub fn run() -> Result<()> {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => SettingsStore::new(path.clone())?,
        None => SettingsStore::in_memory(),
    };
    if let Some(path) = settings.path() {
        info!("Using settings from {}", path.display());
    }

    match cli.command {
        Command::List => {
            print!("{}", display::render_catalog(presets::all()));
            Ok(())
        }
        Command::Show(args) => {
            let editor = cli::build_editor(&args)?;
            print!("{}", display::render_plan(editor.session()));
            println!("Total: {}", editor.total_time_label());
            Ok(())
        }
        Command::Run(args) => run_command(args, settings.playback()),
    }
}

fn run_command(args: RunArgs, mut playback: PlaybackSettings) -> Result<()> {
    if let Some(tick_ms) = args.tick_ms {
        playback.tick_interval_ms = tick_ms;
    }
    if args.no_bell {
        playback.bell_enabled = false;
    }

    let editor = cli::build_editor(&args.session)?;
    let session = editor
        .validate_for_playback()
        .with_context(|| format!("cannot start {}", editor.session().name))?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    let result = runtime.block_on(async {
        let controller = PlaybackController::new(&playback);
        run_session(&controller, &session, &playback, args.json).await
    });
    runtime.shutdown_timeout(STDIN_SHUTDOWN_GRACE);

    let outcome = result?;
    info!("Run ended: {outcome:?}");
    Ok(())
}

/// Plays `session` to the end or until cancelled, printing every event and
/// feeding stdin lines to the controller as commands.
pub async fn run_session(
    controller: &PlaybackController,
    session: &ValidatedSession,
    playback: &PlaybackSettings,
    json: bool,
) -> Result<RunOutcome> {
    let mut events = controller.subscribe();
    controller.start(session).await?;

    if !json {
        print!("{}", display::render_plan(session.session()));
        println!("Enter = pausa/continuar, p = pausa, r = continuar, q = detener");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    // Registered once so a Ctrl-C that lands while an event is being printed
    // is still seen on the next pass.
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut interrupted = false;

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    print_event(&event, playback.bell_enabled, json)?;
                    match event {
                        PlaybackEvent::Finished { .. } => {
                            if !json {
                                println!("{}", display::render_summary(session.session()));
                            }
                            return Ok(RunOutcome::Finished);
                        }
                        PlaybackEvent::Cancelled => return Ok(RunOutcome::Cancelled),
                        _ => {}
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("display fell behind; skipped {skipped} events");
                }
                Err(RecvError::Closed) => return Ok(RunOutcome::Cancelled),
            },
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) => match line.parse::<PlaybackCommand>() {
                    Ok(command) => {
                        if let Err(err) = commands::apply(controller, command).await {
                            warn!("{command:?} ignored: {err}");
                        }
                    }
                    Err(err) => warn!("{err}"),
                },
                Ok(None) => stdin_open = false,
                Err(err) => {
                    warn!("stdin closed: {err}");
                    stdin_open = false;
                }
            },
            signal = &mut ctrl_c, if !interrupted => {
                interrupted = true;
                if let Err(err) = signal {
                    warn!("failed to listen for Ctrl-C: {err}");
                    continue;
                }
                controller.cancel().await?;
            }
        }
    }
}

fn print_event(event: &PlaybackEvent, bell: bool, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(event)?);
        return Ok(());
    }

    match event {
        PlaybackEvent::Cancelled => println!("Entrenamiento detenido"),
        other => {
            if let Some(snapshot) = other.snapshot() {
                println!("{}", display::render_frame(snapshot, bell));
            }
        }
    }
    Ok(())
}
