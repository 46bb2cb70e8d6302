//! # Vellum - editor shell driver
//!
//! Wires the state engine to the outside world: loads settings, builds
//! the ports, registers the built-in commands and drives the command
//! surface from a line-oriented prompt on stdin. Rendering and raw key
//! capture belong to a frontend; this binary is the headless shell.
//!
//! ## Quick Start
//!
//! ```bash
//! # Start the shell
//! cargo run
//!
//! # Open a file straight away
//! cargo run -- path/to/file.rs
//!
//! # Open a workspace
//! cargo run -- --workspace path/to/project
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vellum_command::{register_builtins, CommandContext, CommandRegistry};
use vellum_core::{Action, AppState, Store, Theme};
use vellum_ports::{JsonSettings, LocalFs, SettingsPort, SystemClipboard};
use vellum_proc::ProcessManager;

/// Vellum - application state engine for a terminal-hosted editor shell
#[derive(Parser, Debug)]
#[command(name = "vellum")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// File to open
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Workspace directory to open
    #[arg(short, long, value_name = "DIR")]
    workspace: Option<PathBuf>,

    /// Settings file location (defaults to the per-user config dir)
    #[arg(long, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_level(true),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    tracing::info!("Starting Vellum v{}", env!("CARGO_PKG_VERSION"));

    // Settings load once at startup, merged over defaults.
    let settings: Arc<dyn SettingsPort> = Arc::new(match &args.settings {
        Some(path) => JsonSettings::at_path(path),
        None => JsonSettings::at_default_path()?,
    });
    let loaded = settings.load().await.unwrap_or_default();
    let theme = Theme::by_id(&loaded.ui.theme).unwrap_or_default();

    let store = Arc::new(Store::new(AppState::with_theme(theme)));
    let processes = Arc::new(ProcessManager::new());
    let ctx = CommandContext::new(
        store.clone(),
        Arc::new(LocalFs::new()),
        Arc::new(SystemClipboard::new()),
        settings,
        processes.clone(),
    );
    let registry = CommandRegistry::new(ctx);
    register_builtins(&registry);

    // Print newly arriving diagnostics; a frontend would render these.
    let _subscription = {
        let seen = std::sync::atomic::AtomicUsize::new(0);
        store.subscribe(move |state| {
            let from = seen.swap(state.diagnostics.len(), std::sync::atomic::Ordering::SeqCst);
            for diagnostic in state.diagnostics.iter().skip(from) {
                eprintln!("[{:?}] {}", diagnostic.severity, diagnostic.message);
            }
        })
    };

    if let Some(workspace) = &args.workspace {
        let _ = registry
            .execute("workspace.open", vec![workspace.display().to_string()])
            .await;
    }
    if let Some(file) = &args.file {
        let _ = registry
            .execute("file.open", vec![file.display().to_string()])
            .await;
    }

    // Line-oriented command loop: every line goes through the modal
    // command-line contract (`:w`, `open <path>`, ...).
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if line.trim().is_empty() {
            continue;
        }
        store.dispatch(Action::OpenCommandLine);
        let _ = registry.execute("cmdline.execute", vec![line]).await;
        if store.get_state().should_quit {
            break;
        }
    }

    processes.kill_all();
    tracing::info!("Goodbye");
    Ok(())
}
