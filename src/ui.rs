// UI layer: formatting of API results for the terminal, transfer progress
// bars and the interactive prompt loop built on `dialoguer`.

use crate::api::StorageClient;
use crate::path::display;
use crate::shell::{Flow, Shell};
use crate::types::{FullAccount, Metadata, SearchMatch};
use anyhow::Result;
use crossterm::style::Stylize;
use dialoguer::Input;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::time::Duration;
use tracing::debug;

/// One `ls` line: the entry kind followed by its name.
pub fn entry_line(entry: &Metadata) -> String {
    let kind = match entry {
        Metadata::Folder(_) => "Folder",
        Metadata::File(_) => "File",
        Metadata::Deleted(_) => "Deleted",
    };
    format!("{}: {}", kind, entry.name())
}

pub fn match_line(m: &SearchMatch) -> String {
    format!("{}: {}", m.match_type.tag, m.metadata.path_display())
}

pub fn account_lines(account: &FullAccount) -> Vec<String> {
    let verified = if account.email_verified {
        "verified"
    } else {
        "unverified"
    };
    let mut lines = vec![
        format!("Name:       {}", account.name.display_name),
        format!("Email:      {} ({})", account.email, verified),
        format!("Account ID: {}", account.account_id),
        format!("Type:       {}", account.account_type.tag),
    ];
    if let Some(country) = &account.country {
        lines.push(format!("Country:    {}", country));
    }
    if let Some(locale) = &account.locale {
        lines.push(format!("Locale:     {}", locale));
    }
    lines
}

/// Progress bar for an upload (known length) or a download (spinner with a
/// byte counter). indicatif hides it when stderr is not a terminal.
pub fn transfer_bar(len: Option<u64>, message: String) -> ProgressBar {
    let bar = match len {
        Some(len) => {
            let bar = ProgressBar::new(len);
            bar.set_style(
                ProgressStyle::with_template("{spinner} {msg} [{bar:30}] {bytes}/{total_bytes}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            bar
        }
        None => {
            let bar = ProgressBar::new_spinner();
            bar.set_style(
                ProgressStyle::with_template("{spinner} {msg} {bytes}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            bar
        }
    };
    bar.set_message(message);
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

/// Interactive prompt loop. Reads lines until `quit`, end of input or an
/// interrupted prompt.
pub fn interactive<C: StorageClient, W: Write>(shell: &mut Shell<C, W>) -> Result<()> {
    println!("{}", "Type 'help' for a list of commands, 'quit' to leave.".dark_grey());
    loop {
        let prompt = format!("dbx:{}", display(shell.current_path()));
        let line: String = match Input::<String>::new()
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()
        {
            Ok(line) => line,
            Err(e) => {
                debug!(error = %e, "prompt closed");
                break;
            }
        };
        if shell.execute_line(&line) == Flow::Quit {
            break;
        }
    }
    Ok(())
}
