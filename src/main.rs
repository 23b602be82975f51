// SPDX-FileCopyrightText: 2025 The jenkins-tui Contributors
// SPDX-License-Identifier: GPL-3.0-or-later

mod app;
mod config;
mod errors;
mod integrations;
mod jenkins;
mod navigator;
mod theme;
mod tui;

use app::App;

use std::fs;
use std::path::PathBuf;

use crate::config::Settings;
use crate::integrations::cli::{Cli, Commands};

use tracing_appender::rolling::RollingFileAppender;
use tracing_appender::rolling::Rotation;

use ratatui::{backend::CrosstermBackend, Terminal};
use std::env;
use std::io::stdout;

use tracing_subscriber::filter::Targets;
use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*};

use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};

#[cfg(not(windows))]
use crossterm::event::{
    DisableBracketedPaste, EnableBracketedPaste, KeyboardEnhancementFlags,
    PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};

use clap::Parser;

const DEFAULT_LOG_FILTER: LevelFilter = LevelFilter::INFO;
const DEBUG_LOG_FILTER: LevelFilter = LevelFilter::DEBUG;
const MAX_LOG_FILES: usize = 14;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let base_data_dir = config::get_app_paths()
        .map(|(_, data_dir)| data_dir)
        .unwrap_or_else(|| env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
    let log_dir = base_data_dir.join("logs");
    fs::create_dir_all(&log_dir)?;
    let general_log = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .max_log_files(MAX_LOG_FILES)
        .filename_prefix("jenkins-tui")
        .filename_suffix("log")
        .build(&log_dir)?;
    let (non_blocking_general, _guard_general) = tracing_appender::non_blocking(general_log);

    let level = if cli.debug {
        DEBUG_LOG_FILTER
    } else {
        DEFAULT_LOG_FILTER
    };
    let quiet_filter = Targets::new()
        .with_default(level)
        .with_target("hyper", LevelFilter::WARN)
        .with_target("hyper_util", LevelFilter::WARN)
        .with_target("reqwest", LevelFilter::WARN);
    let general_layer = fmt::layer()
        .with_writer(non_blocking_general)
        .with_ansi(false)
        .with_filter(quiet_filter);
    let _subscriber_result = tracing_subscriber::registry()
        .with(general_layer)
        .try_init();

    tracing::info!("STARTING JENKINS-TUI");

    let config_path = cli.config.clone().or_else(config::default_config_path);
    let settings = match config::load_settings(config_path.clone()) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!("Failed to read configuration: {}", e);
            eprintln!("Could not read the configuration: {}", e);
            std::process::exit(1);
        }
    };

    if settings.url.is_empty() {
        report_missing_url(config_path);
        std::process::exit(1);
    }

    if let Some(Commands::Check) = cli.command {
        return match integrations::cli::run_check(&settings).await {
            Ok(report) => {
                println!("{}", report);
                Ok(())
            }
            Err(e) => {
                tracing::error!("Connection check failed: {}", e);
                eprintln!("Connection check failed: {}", e);
                std::process::exit(1);
            }
        };
    }

    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = cleanup_terminal();
        original_hook(panic_info);
    }));

    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen,)?;

    #[cfg(not(windows))]
    {
        execute!(
            stdout,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES),
            EnableBracketedPaste
        )?;
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = match App::new(settings) {
        Ok(mut app) => app.run(&mut terminal).await,
        Err(e) => Err(e),
    };

    cleanup_terminal()?;
    if let Err(e) = result {
        tracing::error!("Application failed: {}", e);
        eprintln!("[Error] Application failed: {}", e);
    }

    Ok(())
}

/// Explains where the server URL goes, writing a template config when there is none yet.
fn report_missing_url(config_path: Option<PathBuf>) {
    eprintln!("No Jenkins server URL is configured.");
    match config_path {
        Some(path) if !path.exists() => match config::save_settings(&Settings::default(), &path) {
            Ok(()) => {
                tracing::info!("Wrote configuration template to {:?}", path);
                eprintln!("A configuration template was written to:");
                eprintln!("  {}", path.display());
                eprintln!("Set `url` (and `username`/`password` if needed) there and run again.");
            }
            Err(e) => {
                tracing::error!("Failed to write configuration template: {}", e);
                eprintln!("Could not write a configuration template to {}: {}", path.display(), e);
            }
        },
        Some(path) => {
            eprintln!("Set `url` in {} and run again.", path.display());
        }
        None => {}
    }
    eprintln!("Alternatively set the JENKINS_TUI_URL environment variable.");
}

fn cleanup_terminal() -> Result<(), Box<dyn std::error::Error>> {
    disable_raw_mode()?;
    execute!(stdout(), LeaveAlternateScreen,)?;

    #[cfg(not(windows))]
    {
        execute!(stdout(), PopKeyboardEnhancementFlags, DisableBracketedPaste)?;
    }

    Ok(())
}
