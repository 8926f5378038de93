// Entrypoint for the `dbx` shell.
// - Keeps `main` small: resolve configuration, build the client and hand
//   both to the shell.
// - Startup problems are fatal; command failures only set the exit status.

use clap::Parser;
use crossterm::style::Stylize;
use dbx_shell::api::DropboxClient;
use dbx_shell::command::Cli;
use dbx_shell::config::{home_token_path, Config};
use dbx_shell::shell::Shell;
use dbx_shell::ui;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("{}", format!("Error: {:#}", e).red());
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so they never mix with command output.
fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<bool> {
    let config = Config::resolve(cli.token.as_deref())?;
    let client = DropboxClient::from_config(&config)?;

    let mut shell = Shell::new(client, std::io::stdout()).with_token_store(home_token_path());
    if let Some(dir) = &cli.remote_dir {
        shell = shell.with_current_path(dir);
    }

    match cli.command {
        Some(command) => Ok(shell.run(command)),
        None => {
            ui::interactive(&mut shell)?;
            Ok(true)
        }
    }
}
