// API client module: a small blocking HTTP client for the Dropbox API v2.
// The shell only ever talks to the `StorageClient` trait, so tests can swap
// in an in-memory fake and never touch the network.

use crate::config::Config;
use crate::error::{ApiError, Error, Result};
use crate::types::*;
use reqwest::blocking::{Body, Client, RequestBuilder, Response};
use reqwest::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::{Read, Write};
use tracing::debug;

const API_ARG_HEADER: &str = "Dropbox-API-Arg";
const API_RESULT_HEADER: &str = "Dropbox-API-Result";
const REQUEST_ID_HEADER: &str = "X-Dropbox-Request-Id";
const SEARCH_PAGE_SIZE: u64 = 100;

/// The remote operations the shell needs. Every call blocks until the
/// server answers.
pub trait StorageClient {
    fn has_token(&self) -> bool;
    fn set_token(&mut self, token: &str);

    fn list_folder(&self, path: &str) -> Result<ListFolderResult>;
    fn list_folder_continue(&self, cursor: &str) -> Result<ListFolderResult>;
    fn get_metadata(&self, path: &str) -> Result<Metadata>;
    /// Stream the file at `path` into `sink`.
    fn download(&self, path: &str, sink: &mut dyn Write) -> Result<FileMetadata>;
    fn upload(&self, path: &str, mode: &UploadMode, content: UploadBody) -> Result<FileMetadata>;
    fn create_folder(&self, path: &str) -> Result<FolderMetadata>;
    fn delete(&self, path: &str) -> Result<Metadata>;
    fn move_entry(&self, from_path: &str, to_path: &str) -> Result<Metadata>;
    fn create_shared_link(&self, path: &str, short_url: bool) -> Result<SharedLink>;
    fn current_account(&self) -> Result<FullAccount>;
    /// One page of search results beginning at offset `start`.
    fn search(&self, path: &str, query: &str, start: u64, mode: SearchMode) -> Result<SearchResult>;
}

/// Upload payload: a reader plus its exact length, which the content
/// endpoint needs up front.
pub struct UploadBody {
    pub reader: Box<dyn Read + Send>,
    pub len: u64,
}

impl UploadBody {
    pub fn new(reader: impl Read + Send + 'static, len: u64) -> Self {
        UploadBody {
            reader: Box::new(reader),
            len,
        }
    }
}

/// Dropbox client holding a reqwest blocking client, the RPC and content
/// base URLs and an optional OAuth2 access token.
#[derive(Clone)]
pub struct DropboxClient {
    client: Client,
    api_url: String,
    content_url: String,
    token: Option<String>,
}

impl DropboxClient {
    /// Create a client configured from the resolved `Config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(DropboxClient {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            content_url: config.content_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    /// Attach the bearer token, failing early if the shell has none.
    fn authorized(&self, req: RequestBuilder) -> Result<RequestBuilder> {
        let token = self.token.as_deref().ok_or(Error::NotLoggedIn)?;
        let value = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| Error::Usage {
            action: "authenticate",
            reason: "access token contains invalid characters".into(),
        })?;
        Ok(req.header(AUTHORIZATION, value))
    }

    /// POST a JSON argument to an RPC route and decode the JSON result.
    fn rpc<A: Serialize, R: DeserializeOwned>(&self, route: &str, arg: &A) -> Result<R> {
        debug!(route, "rpc request");
        let url = format!("{}/2/{}", self.api_url, route);
        let req = self.client.post(&url).json(arg);
        let res = check(self.authorized(req)?.send()?)?;
        Ok(res.json()?)
    }

    /// POST to a content route. The argument travels in a header and the
    /// body carries file bytes (upload) or nothing (download).
    fn content<A: Serialize>(&self, route: &str, arg: &A, body: Option<Body>) -> Result<Response> {
        debug!(route, "content request");
        let url = format!("{}/2/{}", self.content_url, route);
        let arg = header_safe_json(arg)?;
        let mut req = self.client.post(&url).header(API_ARG_HEADER, arg);
        if let Some(body) = body {
            req = req.header(CONTENT_TYPE, "application/octet-stream").body(body);
        }
        check(self.authorized(req)?.send()?)
    }
}

impl StorageClient for DropboxClient {
    fn has_token(&self) -> bool {
        self.token.is_some()
    }

    fn set_token(&mut self, token: &str) {
        self.token = Some(token.to_string());
    }

    fn list_folder(&self, path: &str) -> Result<ListFolderResult> {
        self.rpc("files/list_folder", &PathArg { path })
    }

    fn list_folder_continue(&self, cursor: &str) -> Result<ListFolderResult> {
        self.rpc("files/list_folder/continue", &CursorArg { cursor })
    }

    fn get_metadata(&self, path: &str) -> Result<Metadata> {
        self.rpc("files/get_metadata", &PathArg { path })
    }

    fn download(&self, path: &str, sink: &mut dyn Write) -> Result<FileMetadata> {
        let mut res = self.content("files/download", &PathArg { path }, None)?;
        let meta = res
            .headers()
            .get(API_RESULT_HEADER)
            .map(|v| serde_json::from_slice::<FileMetadata>(v.as_bytes()))
            .transpose()?;
        let written = res.copy_to(sink)?;
        debug!(path, written, "download finished");
        Ok(meta.unwrap_or_else(|| FileMetadata {
            name: crate::path::file_name(path).unwrap_or(path).to_string(),
            id: String::new(),
            path_display: Some(path.to_string()),
            rev: String::new(),
            size: written,
            server_modified: None,
        }))
    }

    fn upload(&self, path: &str, mode: &UploadMode, content: UploadBody) -> Result<FileMetadata> {
        let arg = UploadArg {
            path,
            mode,
            autorename: false,
            mute: false,
        };
        let body = Body::sized(content.reader, content.len);
        let res = self.content("files/upload", &arg, Some(body))?;
        Ok(res.json()?)
    }

    fn create_folder(&self, path: &str) -> Result<FolderMetadata> {
        let env: MetadataEnvelope<FolderMetadata> =
            self.rpc("files/create_folder_v2", &PathArg { path })?;
        Ok(env.metadata)
    }

    fn delete(&self, path: &str) -> Result<Metadata> {
        let env: MetadataEnvelope<Metadata> = self.rpc("files/delete_v2", &PathArg { path })?;
        Ok(env.metadata)
    }

    fn move_entry(&self, from_path: &str, to_path: &str) -> Result<Metadata> {
        let env: MetadataEnvelope<Metadata> =
            self.rpc("files/move_v2", &RelocationArg { from_path, to_path })?;
        Ok(env.metadata)
    }

    fn create_shared_link(&self, path: &str, short_url: bool) -> Result<SharedLink> {
        self.rpc("sharing/create_shared_link", &SharedLinkArg { path, short_url })
    }

    fn current_account(&self) -> Result<FullAccount> {
        self.rpc("users/get_current_account", &serde_json::Value::Null)
    }

    fn search(&self, path: &str, query: &str, start: u64, mode: SearchMode) -> Result<SearchResult> {
        let arg = SearchArg {
            path,
            query,
            start,
            max_results: SEARCH_PAGE_SIZE,
            mode,
        };
        self.rpc("files/search", &arg)
    }
}

/// Turn a non-success response into an `ApiError`.
fn check(res: Response) -> Result<Response> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    let request_id = res
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let reason = status.canonical_reason().unwrap_or("");
    let body = res.text().unwrap_or_default();
    debug!(status = status.as_u16(), ?request_id, "api error");
    Err(ApiError::from_body(status.as_u16(), reason, &body, request_id).into())
}

/// Serialize `arg` as JSON that is safe to put in an HTTP header: every
/// non-ASCII character is written as a `\uXXXX` escape (surrogate pairs
/// outside the BMP).
pub fn header_safe_json<A: Serialize + ?Sized>(arg: &A) -> Result<String> {
    let json = serde_json::to_string(arg)?;
    let mut out = String::with_capacity(json.len());
    for c in json.chars() {
        if c.is_ascii() {
            out.push(c);
        } else {
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                out.push_str(&format!("\\u{:04x}", unit));
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;
    use std::time::Duration;

    fn config(token: Option<&str>) -> Config {
        Config {
            token: token.map(str::to_string),
            token_source: None,
            api_url: "http://127.0.0.1:9/".into(),
            content_url: "http://127.0.0.1:9".into(),
            timeout: Duration::from_secs(1),
        }
    }

    #[test]
    fn header_json_escapes_non_ascii() {
        let arg = PathArg { path: "/Fotos/Ümlaut 🎉.jpg" };
        let json = header_safe_json(&arg).unwrap();
        assert!(json.is_ascii());
        assert_eq!(json, r#"{"path":"/Fotos/\u00dcmlaut \ud83c\udf89.jpg"}"#);
        let back: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(back["path"], "/Fotos/Ümlaut 🎉.jpg");
    }

    #[test]
    fn token_state_follows_config_and_login() {
        let mut client = DropboxClient::from_config(&config(None)).unwrap();
        assert!(!client.has_token());
        client.set_token("sl.abc");
        assert!(client.has_token());
        assert_eq!(client.api_url, "http://127.0.0.1:9");
    }

    #[test]
    fn calls_without_token_fail_before_sending() {
        let client = DropboxClient::from_config(&config(None)).unwrap();
        let err = client.list_folder("").unwrap_err();
        assert!(matches!(err, Error::NotLoggedIn));
    }

    #[test]
    fn unreachable_server_is_a_transport_error() {
        let client = DropboxClient::from_config(&config(Some("tok"))).unwrap();
        let err = client.current_account().unwrap_err();
        assert!(matches!(err, Error::Http(_)));
    }

    fn client_for(server: &Server) -> DropboxClient {
        let config = Config {
            token: Some("sl.test".into()),
            token_source: None,
            api_url: server.url(),
            content_url: server.url(),
            timeout: Duration::from_secs(5),
        };
        DropboxClient::from_config(&config).unwrap()
    }

    #[test]
    fn list_folder_posts_json_with_bearer_token() {
        let mut server = Server::new();
        let mock = server
            .mock("POST", "/2/files/list_folder")
            .match_header("authorization", "Bearer sl.test")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(json!({"path": "/docs"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "entries": [
                        {".tag": "folder", "name": "old", "id": "id:1", "path_display": "/docs/old"},
                        {".tag": "file", "name": "a.txt", "id": "id:2", "rev": "r1", "size": 3}
                    ],
                    "cursor": "AAE",
                    "has_more": true
                })
                .to_string(),
            )
            .create();

        let page = client_for(&server).list_folder("/docs").unwrap();
        mock.assert();
        assert_eq!(page.entries.len(), 2);
        assert_eq!(page.entries[1].name(), "a.txt");
        assert_eq!(page.cursor, "AAE");
        assert!(page.has_more);
    }

    #[test]
    fn download_reads_result_header_and_streams_body() {
        let mut server = Server::new();
        let mock = server
            .mock("POST", "/2/files/download")
            .match_header("authorization", "Bearer sl.test")
            .match_header("dropbox-api-arg", r#"{"path":"/r\u00e9sum\u00e9.txt"}"#)
            .with_status(200)
            .with_header(
                "dropbox-api-result",
                r#"{"name":"resume.txt","id":"id:7","rev":"a1","size":5}"#,
            )
            .with_header("content-type", "application/octet-stream")
            .with_body("hello")
            .create();

        let mut sink = Vec::new();
        let meta = client_for(&server).download("/résumé.txt", &mut sink).unwrap();
        mock.assert();
        assert_eq!(sink, b"hello");
        assert_eq!(meta.rev, "a1");
        assert_eq!(meta.size, 5);
    }

    #[test]
    fn upload_sends_arg_header_and_raw_body() {
        let mut server = Server::new();
        let mock = server
            .mock("POST", "/2/files/upload")
            .match_header("authorization", "Bearer sl.test")
            .match_header("content-type", "application/octet-stream")
            .match_header(
                "dropbox-api-arg",
                r#"{"path":"/up.txt","mode":{".tag":"update","update":"r9"},"autorename":false,"mute":false}"#,
            )
            .match_body("payload")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"name":"up.txt","id":"id:9","rev":"r10","size":7}"#)
            .create();

        let body = UploadBody::new(std::io::Cursor::new(b"payload".to_vec()), 7);
        let meta = client_for(&server)
            .upload("/up.txt", &UploadMode::Update("r9".into()), body)
            .unwrap();
        mock.assert();
        assert_eq!(meta.rev, "r10");
    }

    #[test]
    fn conflict_body_becomes_api_error() {
        let mut server = Server::new();
        let mock = server
            .mock("POST", "/2/files/delete_v2")
            .with_status(409)
            .with_header("content-type", "application/json")
            .with_header("x-dropbox-request-id", "req-9")
            .with_body(
                json!({
                    "error_summary": "path_lookup/not_found/..",
                    "error": {".tag": "path_lookup"},
                    "user_message": {"locale": "en", "text": "That file is gone."}
                })
                .to_string(),
            )
            .create();

        let err = client_for(&server).delete("/gone.txt").unwrap_err();
        mock.assert();
        match err {
            Error::Api(api) => {
                assert_eq!(api.status, 409);
                assert_eq!(api.summary, "path_lookup/not_found/..");
                assert_eq!(api.message(), "That file is gone.");
                assert_eq!(api.request_id.as_deref(), Some("req-9"));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn shell_prints_user_message_from_server() {
        let mut server = Server::new();
        let _mock = server
            .mock("POST", "/2/files/create_folder_v2")
            .with_status(409)
            .with_body(
                r#"{"error_summary": "path/conflict/folder/..",
                    "user_message": {"locale": "en", "text": "A folder is already there."}}"#,
            )
            .create();

        let mut shell = crate::shell::Shell::new(client_for(&server), Vec::new());
        assert!(!shell.run(crate::command::Command::Mkdir { path: "docs".into() }));
        let out = String::from_utf8(shell.into_output()).unwrap();
        assert_eq!(out, "Error: A folder is already there.\n");
    }
}
