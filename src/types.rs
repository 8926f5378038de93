// Data shapes exchanged with the Dropbox HTTP API. Only the fields the shell
// prints or forwards are modelled; serde ignores the rest of each response.

use serde::{Deserialize, Serialize};

/// A file, folder or deleted entry, discriminated by the `.tag` field.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(tag = ".tag", rename_all = "snake_case")]
pub enum Metadata {
    File(FileMetadata),
    Folder(FolderMetadata),
    Deleted(DeletedMetadata),
}

impl Metadata {
    pub fn name(&self) -> &str {
        match self {
            Metadata::File(f) => &f.name,
            Metadata::Folder(f) => &f.name,
            Metadata::Deleted(d) => &d.name,
        }
    }

    /// Display path if the server sent one, else the bare name.
    pub fn path_display(&self) -> &str {
        let path = match self {
            Metadata::File(f) => f.path_display.as_deref(),
            Metadata::Folder(f) => f.path_display.as_deref(),
            Metadata::Deleted(d) => d.path_display.as_deref(),
        };
        path.unwrap_or_else(|| self.name())
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct FileMetadata {
    pub name: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub path_display: Option<String>,
    #[serde(default)]
    pub rev: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub server_modified: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct FolderMetadata {
    pub name: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub path_display: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct DeletedMetadata {
    pub name: String,
    #[serde(default)]
    pub path_display: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ListFolderResult {
    pub entries: Vec<Metadata>,
    pub cursor: String,
    pub has_more: bool,
}

/// The `*_v2` file operations wrap their metadata in an object.
#[derive(Deserialize, Debug)]
pub struct MetadataEnvelope<T> {
    pub metadata: T,
}

/// How `files/upload` treats an existing file at the target path.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = ".tag", content = "update", rename_all = "snake_case")]
pub enum UploadMode {
    Add,
    Overwrite,
    /// Replace only if the remote file is still at this revision.
    Update(String),
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(tag = ".tag", rename_all = "snake_case")]
pub enum SearchMode {
    Filename,
    FilenameAndContent,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SearchResult {
    pub matches: Vec<SearchMatch>,
    pub more: bool,
    pub start: u64,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SearchMatch {
    pub match_type: Tag,
    pub metadata: Metadata,
}

/// Union value whose payload the shell does not care about.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Tag {
    #[serde(rename = ".tag")]
    pub tag: String,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SharedLink {
    pub url: String,
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct FullAccount {
    pub account_id: String,
    pub name: Name,
    pub email: String,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub locale: Option<String>,
    pub account_type: Tag,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Name {
    pub display_name: String,
    #[serde(default)]
    pub given_name: String,
    #[serde(default)]
    pub surname: String,
}

// Request arguments.

#[derive(Serialize, Debug)]
pub(crate) struct PathArg<'a> {
    pub path: &'a str,
}

#[derive(Serialize, Debug)]
pub(crate) struct CursorArg<'a> {
    pub cursor: &'a str,
}

#[derive(Serialize, Debug)]
pub(crate) struct RelocationArg<'a> {
    pub from_path: &'a str,
    pub to_path: &'a str,
}

#[derive(Serialize, Debug)]
pub(crate) struct UploadArg<'a> {
    pub path: &'a str,
    pub mode: &'a UploadMode,
    pub autorename: bool,
    pub mute: bool,
}

#[derive(Serialize, Debug)]
pub(crate) struct SharedLinkArg<'a> {
    pub path: &'a str,
    pub short_url: bool,
}

#[derive(Serialize, Debug)]
pub(crate) struct SearchArg<'a> {
    pub path: &'a str,
    pub query: &'a str,
    pub start: u64,
    pub max_results: u64,
    pub mode: SearchMode,
}
