mod app;
mod cli;
mod error;
mod logging;
mod message;
mod output;
mod settings;
mod single_instance;
mod state;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use gsync_core::{LogSink, UpdateCheck};
use gsync_platform::AppPaths;
use log::{error, info, warn};

use crate::app::App;
use crate::cli::{Cli, Commands};
use crate::message::Message;
use crate::settings::AppSettings;
use crate::single_instance::{AcquireError, SingleInstance};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let paths = match AppPaths::new() {
        Ok(paths) => paths,
        Err(error) => {
            eprintln!("gsync: {error}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(error) = paths.ensure_dirs() {
        eprintln!("gsync: failed to create app directories: {error}");
        return ExitCode::FAILURE;
    }

    let settings = AppSettings::load();
    if !paths.settings_file().exists()
        && let Err(error) = settings.save()
    {
        eprintln!("gsync: failed to write default settings: {error}");
    }

    logging::init_logging(&paths, &settings, cli.verbose);
    info!("gsync {} starting", env!("CARGO_PKG_VERSION"));

    let _instance = match SingleInstance::acquire(&paths.lock_file()) {
        Ok(instance) => instance,
        Err(AcquireError::AlreadyRunning) => {
            eprintln!("gsync: another instance is already running");
            return ExitCode::FAILURE;
        }
        Err(error) => {
            error!("Single instance check failed: {error}");
            eprintln!("gsync: {error}");
            return ExitCode::FAILURE;
        }
    };

    let log_path = settings.export_log_path(&paths);
    let log = LogSink::open(log_path.clone()).unwrap_or_else(|error| {
        warn!("Could not read {}: {error}", log_path.display());
        LogSink::new(log_path)
    });

    let mut app = App::new(settings, Arc::new(log));
    run(&mut app, &cli).await
}

async fn run(app: &mut App, cli: &Cli) -> ExitCode {
    if matches!(cli.command, Commands::Tool) {
        return print_tool(app).await;
    }

    if let Some(message) = cli.command.message() {
        app.update(message);
    }
    app.run_until_idle().await;

    if let Commands::Update { relaunch } = cli.command {
        if matches!(app.state().last_check, Some(UpdateCheck::UpToDate { .. })) {
            println!("{}", app.state().update.message);
            return ExitCode::SUCCESS;
        }
        app.update(Message::StartUpdate);
        app.run_until_idle().await;
        if relaunch && app.state().update.ready_to_relaunch {
            app.update(Message::Relaunch);
        }
    }

    print!("{}", output::render(&cli.command, app.state(), cli.json));
    if app.state().alert.is_some() {
        app.update(Message::DismissAlert);
    }

    if let Some(error) = &app.state().refresh_error {
        eprintln!("gsync: warning: {error}");
    }
    if let Some(error) = &app.state().last_error {
        eprintln!("gsync: {error}");
        return ExitCode::FAILURE;
    }
    if app.state().manual_download_url.is_some() {
        return ExitCode::FAILURE;
    }
    if app.state().should_exit {
        info!("Exiting for relaunch");
    }
    ExitCode::SUCCESS
}

async fn print_tool(app: &App) -> ExitCode {
    let bridge = &app.bridge;
    match bridge.locator().locate() {
        Ok(path) => println!("{}", path.display()),
        Err(error) => {
            eprintln!("gsync: {error}");
            return ExitCode::FAILURE;
        }
    }
    match bridge.tool_version().await {
        Ok(version) => {
            println!("{} {version}", bridge.locator().name());
            ExitCode::SUCCESS
        }
        Err(error) => {
            eprintln!("gsync: {error}");
            ExitCode::FAILURE
        }
    }
}
