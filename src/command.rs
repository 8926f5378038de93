// Command vocabulary. The same subcommand enum is parsed from the process
// arguments, from each line of a `cmd` batch file and from the interactive
// prompt, so every entry point accepts exactly the same syntax.

use crate::types::SearchMode;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "dbx", version)]
#[command(about = "Command-line shell for a Dropbox account", long_about = None)]
pub struct Cli {
    /// Access token, or the path of a file containing one
    #[arg(short, long)]
    pub token: Option<String>,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Remote directory to start in
    #[arg(long, value_name = "PATH")]
    pub remote_dir: Option<String>,

    /// Command to run; starts an interactive shell when omitted
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Parser for one shell line: no program name, no global flags.
#[derive(Parser, Debug)]
#[command(name = "dbx", no_binary_name = true, disable_version_flag = true)]
#[command(help_template = "Commands:\n{subcommands}")]
pub struct Line {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Show Dropbox account info
    #[command(name = "account_info", alias = "account-info")]
    AccountInfo,

    /// List the current (or given) remote directory
    Ls {
        /// Remote directory, relative to the current one
        path: Option<String>,
    },

    /// Change the current remote directory
    Cd {
        /// Path to change to
        path: String,
    },

    /// Print the current remote directory
    Pwd,

    /// Copy a remote file to the local system
    Get {
        /// Path on the remote system
        remote_path: String,
        /// Path on the local system (defaults to the remote file name)
        local_path: Option<String>,
    },

    /// Copy a local file to the remote system
    Put {
        /// Path on the local system
        local_path: String,
        /// Path on the remote system (defaults to the local file name)
        remote_path: Option<String>,
        /// What to do when the remote file already exists
        #[arg(short, long, value_enum, default_value_t = WriteMode::Overwrite)]
        writemode: WriteMode,
    },

    /// Make a directory on the remote system
    Mkdir {
        /// Path to create
        path: String,
    },

    /// Move or rename a remote file or directory
    Mv {
        /// Path to move from
        from_path: String,
        /// Path to move to
        to_path: String,
    },

    /// Remove a remote file or directory
    Rm {
        /// Path to remove
        path: String,
    },

    /// Create a shared link for a remote file
    Share {
        /// Path to share
        path: String,
        /// Request a shortened URL
        #[arg(short, long)]
        short_url: bool,
    },

    /// Search under the current remote directory
    Search {
        /// Text to search for
        string: String,
        /// Match file names only, or names and contents
        #[arg(short = 'm', long, value_enum, default_value_t = SearchTarget::Content)]
        searchmode: SearchTarget,
    },

    /// Run the commands listed in a file, one per line
    Cmd {
        /// Command file
        file: PathBuf,
    },

    /// Store an access token for this and later sessions
    Login {
        /// OAuth 2 access token
        token: String,
    },

    /// Leave the interactive shell
    #[command(alias = "exit")]
    Quit,
}

impl Command {
    /// Whether the command needs an authenticated client.
    pub fn requires_login(&self) -> bool {
        !matches!(
            self,
            Command::Pwd | Command::Cmd { .. } | Command::Login { .. } | Command::Quit
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::AccountInfo => "account_info",
            Command::Ls { .. } => "ls",
            Command::Cd { .. } => "cd",
            Command::Pwd => "pwd",
            Command::Get { .. } => "get",
            Command::Put { .. } => "put",
            Command::Mkdir { .. } => "mkdir",
            Command::Mv { .. } => "mv",
            Command::Rm { .. } => "rm",
            Command::Share { .. } => "share",
            Command::Search { .. } => "search",
            Command::Cmd { .. } => "cmd",
            Command::Login { .. } => "login",
            Command::Quit => "quit",
        }
    }
}

/// Write policy for `put`.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Fail if the remote file exists
    Add,
    /// Replace the remote file
    Overwrite,
    /// Replace the remote file only if it has not changed since it was looked up
    Update,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchTarget {
    Filename,
    Content,
}

impl From<SearchTarget> for SearchMode {
    fn from(target: SearchTarget) -> Self {
        match target {
            SearchTarget::Filename => SearchMode::Filename,
            SearchTarget::Content => SearchMode::FilenameAndContent,
        }
    }
}

/// Outcome of parsing one shell line.
#[derive(Debug)]
pub enum Parsed {
    Empty,
    Command(Command),
    Unknown(String),
    /// Usage error or requested help text, already rendered.
    Message(String),
}

/// Split a line on whitespace and parse it as a shell command. Lines whose
/// first word starts with `#` are comments.
pub fn parse_line(line: &str) -> Parsed {
    let words: Vec<&str> = line.split_whitespace().collect();
    let Some(first) = words.first() else {
        return Parsed::Empty;
    };
    if first.starts_with('#') {
        return Parsed::Empty;
    }
    if !is_known(first) {
        return Parsed::Unknown(first.to_string());
    }
    match Line::try_parse_from(words.iter().copied()) {
        Ok(parsed) => Parsed::Command(parsed.command),
        Err(e) => Parsed::Message(e.render().to_string().trim_end().to_string()),
    }
}

fn is_known(name: &str) -> bool {
    matches!(name, "help" | "-h" | "--help") || Line::command().find_subcommand(name).is_some()
}
