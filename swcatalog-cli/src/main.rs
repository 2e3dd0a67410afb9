//! swcatalog CLI - Command-line interface
//!
//! Resolves macOS installers from Apple software update catalogs and
//! replicates their packages locally.

mod commands;
mod error;
mod runner;
mod ui;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use commands::common::RunArgs;
use commands::fetch::FetchArgs;
use error::CliError;
use runner::CliRunner;

#[derive(Parser)]
#[command(name = "swcatalog")]
#[command(version = swcatalog::VERSION)]
#[command(about = "Resolve and download macOS installers from Apple software update catalogs")]
struct Cli {
    /// Log debug output to the terminal
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// Directory for log files
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve an installer and download all of its packages
    Fetch {
        #[command(flatten)]
        run: RunArgs,

        /// Finish once the installer is staged, even with --wait
        #[arg(long)]
        installer_only: bool,

        /// Hand the product to /usr/sbin/installer
        #[arg(long, conflicts_with = "install_command")]
        system_installer: bool,

        /// After the install command exits, wait for Ctrl+C or SIGTERM
        /// before finishing
        #[arg(long)]
        wait: bool,

        /// Install command run after download; {dist} is replaced with the
        /// distribution file
        #[arg(last = true)]
        install_command: Vec<String>,
    },

    /// List installers in the catalog compatible with this machine
    List {
        #[command(flatten)]
        run: RunArgs,
    },

    /// Write a configuration file with default settings
    Init {
        /// Overwrite existing settings
        #[arg(long)]
        force: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(e.exit_code());
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Init { force } => commands::init::run(force),
        Commands::List { run } => {
            let runner = CliRunner::new(cli.log_dir, cli.verbose)?;
            commands::list::run(&runner, run)
        }
        Commands::Fetch {
            run,
            installer_only,
            system_installer,
            wait,
            install_command,
        } => {
            let runner = CliRunner::new(cli.log_dir, cli.verbose)?;
            commands::fetch::run(
                &runner,
                FetchArgs {
                    run,
                    installer_only,
                    system_installer,
                    wait,
                    install_command,
                },
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_fetch_arguments() {
        let cli = Cli::parse_from([
            "swcatalog",
            "fetch",
            "--target",
            "10.15",
            "--mirror",
            "cache.lan:49180",
            "--installer-only",
            "--",
            "/usr/local/bin/stage",
            "{dist}",
        ]);

        match cli.command {
            Commands::Fetch {
                run,
                installer_only,
                wait,
                install_command,
                ..
            } => {
                assert_eq!(run.target_version.as_deref(), Some("10.15"));
                assert_eq!(run.mirror.as_deref(), Some("cache.lan:49180"));
                assert!(installer_only);
                assert!(!wait);
                assert_eq!(install_command, vec!["/usr/local/bin/stage", "{dist}"]);
            }
            _ => panic!("expected fetch"),
        }
    }
}
