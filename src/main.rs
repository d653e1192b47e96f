//! Lookout CLI - a terminal live view for a paused Python debuggee.

use std::io;
use std::process;

use clap::Parser;
use lookout::cli::{Cli, Commands, ConfigCommands};
use lookout::commands::{self, Output};
use lookout::config::{ResolvedConfig, default_log_path, resolve_config};
use lookout::protocol::Action;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    let human = cli.human_readable;

    let result = resolve_config(&cli.overrides()).and_then(|config| run(cli.command, &config, human));

    if let Err(e) = result {
        if human {
            eprintln!("Error: {}", e);
        } else {
            eprintln!(r#"{{"error": "{}"}}"#, e);
        }
        process::exit(1);
    }
}

fn run(command: Option<Commands>, config: &ResolvedConfig, human: bool) -> lookout::Result<()> {
    match command.unwrap_or(Commands::Tui) {
        Commands::Tui => {
            let _guard = init_file_logging(config)?;
            run_tui(config)
        }
        Commands::Watch { count } => {
            init_stderr_logging();
            let summary = runtime()?.block_on(async {
                let mut stdout = io::stdout().lock();
                commands::watch(config, count, human, &mut stdout).await
            })?;
            tracing::info!(
                snapshots = summary.snapshots,
                connections = summary.connections,
                "watch finished"
            );
            Ok(())
        }
        Commands::Send { action } => {
            init_stderr_logging();
            let action = Action::try_from(&action)?;
            let result = runtime()?.block_on(commands::send(config, &action))?;
            output(&result, human);
            Ok(())
        }
        Commands::Config { command } => {
            match command {
                ConfigCommands::Show => output(&commands::config_show(config), human),
                ConfigCommands::Path => output(&commands::config_path(config), human),
            }
            Ok(())
        }
    }
}

#[cfg(feature = "tui")]
fn run_tui(config: &ResolvedConfig) -> lookout::Result<()> {
    commands::check_tls_support(config)?;
    runtime()?.block_on(lookout::tui::run_tui(config))
}

#[cfg(not(feature = "tui"))]
fn run_tui(_config: &ResolvedConfig) -> lookout::Result<()> {
    Err(lookout::Error::Other(
        "this build has no terminal UI, rebuild with the `tui` feature or use `watch`".to_string(),
    ))
}

fn runtime() -> lookout::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| lookout::Error::Other(format!("Failed to create runtime: {}", e)))
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Headless commands log to stderr so stdout stays machine-readable.
fn init_stderr_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(io::stderr)
        .try_init();
}

/// The TUI owns the terminal, so its log goes to a file.
fn init_file_logging(config: &ResolvedConfig) -> lookout::Result<Option<WorkerGuard>> {
    let Some(path) = config
        .log_file()
        .map(|p| p.to_path_buf())
        .or_else(default_log_path)
    else {
        return Ok(None);
    };
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)?;
    let (writer, guard) = tracing_appender::non_blocking(file);
    let _ = tracing_subscriber::fmt()
        .json()
        .with_env_filter(env_filter())
        .with_writer(writer)
        .try_init();
    Ok(Some(guard))
}

/// Print output in JSON or human-readable format.
fn output<T: Output>(result: &T, human: bool) {
    if human {
        println!("{}", result.to_human());
    } else {
        println!("{}", result.to_json());
    }
}
