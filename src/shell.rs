// Command interpreter. Holds the current remote directory, turns parsed
// commands into `StorageClient` calls and prints results. Every command goes
// through `Shell::run`, which performs the login check and reports failures
// without stopping the session.

use crate::api::{StorageClient, UploadBody};
use crate::command::{parse_line, Command, Parsed, SearchTarget, WriteMode};
use crate::config::{expand_home, persist_token};
use crate::error::{Error, Result};
use crate::path::{change_path, display, file_name};
use crate::types::{Metadata, UploadMode};
use crate::ui;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// How deep `cmd` files may include other `cmd` files.
pub const MAX_CMD_DEPTH: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Shell<C, W> {
    client: C,
    out: W,
    current_path: String,
    token_store: Option<PathBuf>,
    depth: usize,
}

impl<C: StorageClient, W: Write> Shell<C, W> {
    pub fn new(client: C, out: W) -> Self {
        Shell {
            client,
            out,
            current_path: String::new(),
            token_store: None,
            depth: 0,
        }
    }

    /// Start in `path` (resolved from the root) instead of the root.
    pub fn with_current_path(mut self, path: &str) -> Self {
        self.current_path = change_path("", path);
        self
    }

    /// File that `login` writes the token to.
    pub fn with_token_store(mut self, path: PathBuf) -> Self {
        self.token_store = Some(path);
        self
    }

    pub fn current_path(&self) -> &str {
        &self.current_path
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Resolve a user-supplied remote path against the current directory.
    pub fn get_path(&self, path: &str) -> String {
        change_path(&self.current_path, path)
    }

    /// Parse and run one line of input. Problems are printed, never returned.
    pub fn execute_line(&mut self, line: &str) -> Flow {
        match parse_line(line) {
            Parsed::Empty => Flow::Continue,
            Parsed::Unknown(name) => {
                warn!(command = %name, "unknown command");
                self.say(&format!("*** Unknown command: {}", name));
                Flow::Continue
            }
            Parsed::Message(msg) => {
                self.say(&msg);
                Flow::Continue
            }
            Parsed::Command(Command::Quit) => Flow::Quit,
            Parsed::Command(cmd) => {
                self.run(cmd);
                Flow::Continue
            }
        }
    }

    /// Run one command, printing any error. Returns whether it succeeded.
    pub fn run(&mut self, cmd: Command) -> bool {
        match self.dispatch(cmd) {
            Ok(()) => true,
            Err(e) => {
                self.report(&e);
                false
            }
        }
    }

    /// Execute a batch file line by line. A `quit` line ends the file early.
    pub fn run_file(&mut self, path: &Path) -> Result<()> {
        if self.depth >= MAX_CMD_DEPTH {
            return Err(Error::NestingTooDeep(MAX_CMD_DEPTH));
        }
        let script = std::fs::read_to_string(expand_home(&path.to_string_lossy()))?;
        info!(file = %path.display(), "running command file");

        self.depth += 1;
        for line in script.lines() {
            if self.execute_line(line) == Flow::Quit {
                break;
            }
        }
        self.depth -= 1;
        Ok(())
    }

    fn dispatch(&mut self, cmd: Command) -> Result<()> {
        if cmd.requires_login() && !self.client.has_token() {
            return Err(Error::NotLoggedIn);
        }
        debug!(command = cmd.name(), cwd = %self.current_path, "dispatch");

        match cmd {
            Command::AccountInfo => self.account_info(),
            Command::Ls { path } => self.ls(path.as_deref()),
            Command::Cd { path } => {
                self.current_path = self.get_path(&path);
                Ok(())
            }
            Command::Pwd => {
                writeln!(self.out, "{}", display(&self.current_path))?;
                Ok(())
            }
            Command::Get {
                remote_path,
                local_path,
            } => self.get(&remote_path, local_path.as_deref()),
            Command::Put {
                local_path,
                remote_path,
                writemode,
            } => self.put(&local_path, remote_path.as_deref(), writemode),
            Command::Mkdir { path } => {
                self.client.create_folder(&self.get_path(&path))?;
                Ok(())
            }
            Command::Mv { from_path, to_path } => {
                let from = self.get_path(&from_path);
                let to = self.get_path(&to_path);
                self.client.move_entry(&from, &to)?;
                Ok(())
            }
            Command::Rm { path } => {
                self.client.delete(&self.get_path(&path))?;
                Ok(())
            }
            Command::Share { path, short_url } => {
                let link = self.client.create_shared_link(&self.get_path(&path), short_url)?;
                writeln!(self.out, "{}", link.url)?;
                Ok(())
            }
            Command::Search { string, searchmode } => self.search(&string, searchmode),
            Command::Cmd { file } => self.run_file(&file),
            Command::Login { token } => self.login(&token),
            Command::Quit => Ok(()),
        }
    }

    fn ls(&mut self, path: Option<&str>) -> Result<()> {
        let target = match path {
            Some(p) => self.get_path(p),
            None => self.current_path.clone(),
        };
        let mut page = self.client.list_folder(&target)?;
        loop {
            for entry in &page.entries {
                writeln!(self.out, "{}", ui::entry_line(entry))?;
            }
            if !page.has_more {
                break;
            }
            page = self.client.list_folder_continue(&page.cursor)?;
        }
        Ok(())
    }

    fn get(&mut self, remote_path: &str, local_path: Option<&str>) -> Result<()> {
        let remote = self.get_path(remote_path);
        let name = file_name(&remote).ok_or_else(|| Error::Usage {
            action: "download",
            reason: "the root folder is not a file".into(),
        })?;

        let mut local = expand_home(local_path.unwrap_or(name));
        if local.is_dir() {
            local.push(name);
        }

        // The target is only replaced once the server has sent the whole file.
        let dir = local
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut staged = NamedTempFile::new_in(dir)?;

        let bar = ui::transfer_bar(None, format!("Downloading {}", name));
        let result = {
            let mut sink = bar.wrap_write(staged.as_file_mut());
            self.client.download(&remote, &mut sink)
        };
        bar.finish_and_clear();

        let meta = result?;
        staged.persist(&local).map_err(|e| e.error)?;
        info!(remote = %remote, local = %local.display(), size = meta.size, "downloaded");
        Ok(())
    }

    fn put(&mut self, local_path: &str, remote_path: Option<&str>, writemode: WriteMode) -> Result<()> {
        let local = expand_home(local_path);
        let remote = match remote_path {
            Some(p) => self.get_path(p),
            None => self.get_path(file_name(local_path).unwrap_or("")),
        };
        if remote.is_empty() {
            return Err(Error::Usage {
                action: "upload",
                reason: "the root folder is not a file".into(),
            });
        }

        let mode = match writemode {
            WriteMode::Add => UploadMode::Add,
            WriteMode::Overwrite => UploadMode::Overwrite,
            WriteMode::Update => match self.client.get_metadata(&remote)? {
                Metadata::File(f) => UploadMode::Update(f.rev),
                _ => {
                    return Err(Error::Usage {
                        action: "update",
                        reason: format!("{} is not a file", remote),
                    })
                }
            },
        };

        let file = File::open(&local)?;
        let len = file.metadata()?.len();
        let label = file_name(&remote).unwrap_or(&remote).to_string();
        let bar = ui::transfer_bar(Some(len), format!("Uploading {}", label));
        let body = UploadBody::new(bar.wrap_read(file), len);
        let result = self.client.upload(&remote, &mode, body);
        bar.finish_and_clear();

        let meta = result?;
        info!(local = %local.display(), remote = %remote, rev = %meta.rev, "uploaded");
        Ok(())
    }

    fn search(&mut self, query: &str, target: SearchTarget) -> Result<()> {
        debug!(path = %display(&self.current_path), query, "search");
        let mut start = 0;
        loop {
            let page = self
                .client
                .search(&self.current_path, query, start, target.into())?;
            for m in &page.matches {
                writeln!(self.out, "{}", ui::match_line(m))?;
            }
            if !page.more || page.start <= start {
                break;
            }
            start = page.start;
        }
        Ok(())
    }

    fn account_info(&mut self) -> Result<()> {
        let account = self.client.current_account()?;
        for line in ui::account_lines(&account) {
            writeln!(self.out, "{}", line)?;
        }
        Ok(())
    }

    fn login(&mut self, token: &str) -> Result<()> {
        self.client.set_token(token);
        if let Some(store) = &self.token_store {
            persist_token(store, token)?;
            info!(file = %store.display(), "token saved");
        }
        writeln!(self.out, "[loaded OAuth 2 access token]")?;
        Ok(())
    }

    fn report(&mut self, e: &Error) {
        let msg = match e {
            Error::NotLoggedIn | Error::NestingTooDeep(_) | Error::Usage { .. } => e.to_string(),
            _ => format!("Error: {}", e),
        };
        self.say(&msg);
    }

    fn say(&mut self, msg: &str) {
        if let Err(e) = writeln!(self.out, "{}", msg) {
            warn!(error = %e, "failed to write output");
        }
    }
}
