// SPDX-FileCopyrightText: 2025 The jenkins-tui Contributors
// SPDX-License-Identifier: GPL-3.0-or-later

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Settings;
use crate::errors::NavigatorError;
use crate::jenkins::client::ServerInfo;
use crate::jenkins::{JenkinsClient, ListingRequest, RemoteLoader};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the configuration file.
    #[arg(long, env = "JENKINS_TUI_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log at DEBUG level.
    #[arg(long)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Connect to the server, print what it reports and exit.
    Check,
}

/// Runs the `check` subcommand and returns the report to print.
pub async fn run_check(settings: &Settings) -> Result<String, NavigatorError> {
    let client = JenkinsClient::new(settings)?;
    tracing::info!("Checking connection to {}", client.base_url());
    let info = client.server_info().await?;
    let top_level = client
        .list_children(ListingRequest {
            path: None,
            recursive: false,
            max_depth: 0,
        })
        .await?;
    Ok(format_check_report(client.base_url(), &info, top_level.len()))
}

fn format_check_report(url: &str, info: &ServerInfo, top_level_jobs: usize) -> String {
    let mut report = format!("Connected to {}\nJenkins version: {}", url, info.version);
    if !info.description.is_empty() {
        report.push_str(&format!("\nDescription: {}", info.description));
    }
    report.push_str(&format!("\nTop level jobs: {}", top_level_jobs));
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_flags_and_subcommand() {
        let cli = Cli::try_parse_from(["jenkins-tui", "--config", "/tmp/ci.toml", "--debug", "check"])
            .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("/tmp/ci.toml")));
        assert!(cli.debug);
        assert_eq!(cli.command, Some(Commands::Check));
    }

    #[test]
    fn test_no_arguments_starts_the_ui() {
        let cli = Cli::try_parse_from(["jenkins-tui"]).unwrap();

        assert!(!cli.debug);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_unknown_subcommand_is_rejected() {
        assert!(Cli::try_parse_from(["jenkins-tui", "build"]).is_err());
    }

    #[test]
    fn test_check_report_skips_empty_description() {
        let info = ServerInfo {
            version: "2.440.1".to_string(),
            description: String::new(),
        };
        assert_eq!(
            format_check_report("https://ci/", &info, 3),
            "Connected to https://ci/\nJenkins version: 2.440.1\nTop level jobs: 3"
        );

        let info = ServerInfo {
            description: "Build farm".to_string(),
            ..info
        };
        assert!(format_check_report("https://ci/", &info, 0)
            .contains("\nDescription: Build farm\nTop level jobs: 0"));
    }
}
