// Library root
// -----------
// This crate exposes the pieces of the `dbx` shell as a library. The binary
// (`main.rs`) only parses arguments, sets up logging and hands control to the
// shell.
//
// Module responsibilities:
// - `api`: the `StorageClient` seam and its Dropbox HTTP implementation.
// - `types`: request and response shapes of the Dropbox API.
// - `command`: the command vocabulary shared by argv, batch files and the
//   interactive prompt.
// - `shell`: the interpreter that keeps the current remote directory and
//   dispatches commands.
// - `path`: remote path resolution.
// - `config`: token and endpoint resolution.
// - `ui`: terminal formatting, progress bars and the prompt loop.
pub mod api;
pub mod command;
pub mod config;
pub mod error;
pub mod path;
pub mod shell;
pub mod types;
pub mod ui;
