// Runtime configuration: where the access token comes from and which
// endpoints the client talks to. Everything is resolved once at startup from
// command-line flags, environment variables and token files.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

pub const DEFAULT_API_URL: &str = "https://api.dropboxapi.com";
pub const DEFAULT_CONTENT_URL: &str = "https://content.dropboxapi.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

pub const TOKEN_ENV: &str = "DBX_ACCESS_TOKEN";
pub const API_URL_ENV: &str = "DBX_API_URL";
pub const CONTENT_URL_ENV: &str = "DBX_CONTENT_URL";
pub const TIMEOUT_ENV: &str = "DBX_TIMEOUT_SECS";

/// Token file looked up in the working directory.
pub const LOCAL_TOKEN_FILE: &str = "token_store.txt";
/// Token file in the user's home directory, written by `login`.
const HOME_TOKEN_FILE: &str = ".dbx_token";

#[derive(Debug, Clone, PartialEq)]
pub enum TokenSource {
    Flag,
    FlagFile(PathBuf),
    Env,
    File(PathBuf),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub token: Option<String>,
    pub token_source: Option<TokenSource>,
    pub api_url: String,
    pub content_url: String,
    pub timeout: Duration,
}

impl Config {
    /// Resolve configuration from the process environment. `token_flag` is the
    /// value of `--token`: a literal token, or the path of a file holding one.
    pub fn resolve(token_flag: Option<&str>) -> Result<Self> {
        let env = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());
        let files = [PathBuf::from(LOCAL_TOKEN_FILE), home_token_path()];
        Self::resolve_with(token_flag, env, &files)
    }

    /// Resolution with the environment and candidate token files injected.
    pub fn resolve_with(
        token_flag: Option<&str>,
        env: impl Fn(&str) -> Option<String>,
        token_files: &[PathBuf],
    ) -> Result<Self> {
        let (token, token_source) = match token_flag {
            Some(flag) if Path::new(flag).is_file() => {
                let path = PathBuf::from(flag);
                (Some(read_token(&path)?), Some(TokenSource::FlagFile(path)))
            }
            Some(flag) => (Some(flag.trim().to_string()), Some(TokenSource::Flag)),
            None => match env(TOKEN_ENV) {
                Some(t) => (Some(t.trim().to_string()), Some(TokenSource::Env)),
                None => match token_files.iter().find(|p| p.is_file()) {
                    Some(path) => (Some(read_token(path)?), Some(TokenSource::File(path.clone()))),
                    None => (None, None),
                },
            },
        };
        let token = token.filter(|t| !t.is_empty());
        let token_source = token.as_ref().and(token_source);

        if let Some(source) = &token_source {
            info!(?source, "loaded OAuth 2 access token");
        }

        let timeout = match env(TIMEOUT_ENV) {
            Some(v) => v
                .trim()
                .parse::<u64>()
                .with_context(|| format!("{} must be a number of seconds, got {:?}", TIMEOUT_ENV, v))?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Config {
            token,
            token_source,
            api_url: env(API_URL_ENV).unwrap_or_else(|| DEFAULT_API_URL.into()),
            content_url: env(CONTENT_URL_ENV).unwrap_or_else(|| DEFAULT_CONTENT_URL.into()),
            timeout: Duration::from_secs(timeout),
        })
    }
}

fn read_token(path: &Path) -> Result<String> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read token file {}", path.display()))?;
    Ok(data.trim().to_string())
}

/// Token file in the user's home directory (or the working directory when
/// there is no home).
pub fn home_token_path() -> PathBuf {
    let dir = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    dir.join(HOME_TOKEN_FILE)
}

/// Persist a token so later runs pick it up without `--token`.
pub fn persist_token(path: &Path, token: &str) -> std::io::Result<()> {
    std::fs::write(path, token)
}

/// Expand a leading `~` in a local path to the home directory.
pub fn expand_home(path: &str) -> PathBuf {
    let rest = match path.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') || rest.starts_with('\\') => rest,
        _ => return PathBuf::from(path),
    };
    match dirs::home_dir() {
        Some(home) => home.join(rest.trim_start_matches(|c: char| c == '/' || c == '\\')),
        None => PathBuf::from(path),
    }
}
