//! Remote directory service: the wire format of the file-manager API and the
//! trait the tree cache and the panels fetch through.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeZone};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Settings;
use crate::error::{FmError, Result};

pub const STATUS_SUCCESS: &str = "success";

/// `result` block every response carries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultStatus {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

impl ResultStatus {
    pub fn success() -> Self {
        Self {
            status: STATUS_SUCCESS.to_string(),
            message: None,
        }
    }

    pub fn failure(message: &str) -> Self {
        Self {
            status: "danger".to_string(),
            message: Some(message.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == STATUS_SUCCESS
    }

    /// Turn a non-success status into `FmError::RemoteFailure`.
    pub fn check(&self) -> Result<()> {
        if self.is_success() {
            Ok(())
        } else {
            Err(FmError::remote(
                self.message
                    .clone()
                    .unwrap_or_else(|| format!("Request failed ({})", self.status)),
            ))
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryProps {
    #[serde(rename = "hasSubdirectories", default)]
    pub has_subdirectories: bool,
}

/// One directory of a `/tree` response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeDirectory {
    pub basename: String,
    #[serde(default)]
    pub dirname: String,
    pub path: String,
    #[serde(default)]
    pub props: DirectoryProps,
}

impl TreeDirectory {
    pub fn new(path: &str, has_subdirectories: bool) -> Self {
        let basename = crate::utils::format::basename(path).to_string();
        let dirname = crate::utils::format::parent_path(path).unwrap_or_default();
        Self {
            basename,
            dirname,
            path: path.to_string(),
            props: DirectoryProps { has_subdirectories },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeResponse {
    pub result: ResultStatus,
    #[serde(default)]
    pub directories: Vec<TreeDirectory>,
}

impl TreeResponse {
    pub fn into_directories(self) -> Result<Vec<TreeDirectory>> {
        self.result.check()?;
        Ok(self.directories)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Dir,
}

/// One file or directory of a `/content` listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub path: String,
    pub basename: String,
    #[serde(default)]
    pub dirname: String,
    #[serde(default)]
    pub extension: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub size: u64,
    /// Unix seconds
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub visibility: Option<String>,
}

impl Entry {
    pub fn file(path: &str, size: u64) -> Self {
        let basename = crate::utils::format::basename(path).to_string();
        Self {
            kind: EntryKind::File,
            path: path.to_string(),
            extension: crate::utils::format::extension_of(&basename),
            filename: None,
            dirname: crate::utils::format::parent_path(path).unwrap_or_default(),
            basename,
            size,
            timestamp: None,
            visibility: None,
        }
    }

    pub fn dir(path: &str) -> Self {
        Self {
            kind: EntryKind::Dir,
            extension: None,
            ..Self::file(path, 0)
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Dir
    }

    pub fn modified(&self) -> Option<DateTime<Local>> {
        self.timestamp
            .and_then(|ts| Local.timestamp_opt(ts, 0).single())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentResponse {
    pub result: ResultStatus,
    #[serde(default)]
    pub directories: Vec<Entry>,
    #[serde(default)]
    pub files: Vec<Entry>,
}

impl ContentResponse {
    /// `(directories, files)` of a successful listing
    pub fn into_entries(self) -> Result<(Vec<Entry>, Vec<Entry>)> {
        self.result.check()?;
        Ok((self.directories, self.files))
    }
}

/// Source of directory data for the tree cache and the panels.
///
/// `path == None` addresses the disk root. Implementations return transport
/// errors as `Err`; a response whose `result.status` is not "success" is
/// returned as `Ok` and rejected by the caller.
#[async_trait]
pub trait DirectoryService: Send + Sync {
    /// One level of child directories, used by the tree.
    async fn tree(&self, disk: &str, path: Option<&str>) -> Result<TreeResponse>;

    /// Full listing (files and directories) of a working directory.
    async fn content(&self, disk: &str, path: Option<&str>) -> Result<ContentResponse>;
}

/// `DirectoryService` over the HTTP file-manager API
pub struct HttpDirectoryService {
    client: reqwest::Client,
    base_url: String,
}

impl HttpDirectoryService {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(
            &settings.base_url,
            Duration::from_secs(settings.request_timeout_secs),
        )
    }

    pub fn endpoint(&self, name: &str) -> String {
        format!("{}/{}", self.base_url, name)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        name: &str,
        disk: &str,
        path: Option<&str>,
    ) -> Result<T> {
        let url = self.endpoint(name);
        let mut query = vec![("disk", disk)];
        if let Some(p) = path {
            query.push(("path", p));
        }
        debug!(url = %url, disk, path = ?path, "GET");

        let response = self.client.get(&url).query(&query).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FmError::Http(format!("HTTP {} from {}", status, url)));
        }
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl DirectoryService for HttpDirectoryService {
    async fn tree(&self, disk: &str, path: Option<&str>) -> Result<TreeResponse> {
        self.get("tree", disk, path).await
    }

    async fn content(&self, disk: &str, path: Option<&str>) -> Result<ContentResponse> {
        self.get("content", disk, path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tree_response_decoding() {
        let json = r#"{
            "result": { "status": "success", "message": null },
            "directories": [
                { "basename": "cstrike", "dirname": "", "path": "cstrike",
                  "props": { "hasSubdirectories": true } },
                { "basename": "logs", "dirname": "", "path": "logs", "props": {} }
            ]
        }"#;
        let response: TreeResponse = serde_json::from_str(json).unwrap();
        let dirs = response.into_directories().unwrap();
        assert_eq!(dirs.len(), 2);
        assert!(dirs[0].props.has_subdirectories);
        assert!(!dirs[1].props.has_subdirectories);
    }

    #[test]
    fn test_failed_status_is_remote_failure() {
        let json = r#"{ "result": { "status": "danger", "message": "Disk not found" } }"#;
        let response: TreeResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            response.into_directories(),
            Err(FmError::remote("Disk not found"))
        );
    }

    #[test]
    fn test_failed_status_without_message() {
        let status = ResultStatus {
            status: "warning".to_string(),
            message: None,
        };
        assert_eq!(status.check(), Err(FmError::remote("Request failed (warning)")));
    }

    #[test]
    fn test_content_response_decoding() {
        let json = r#"{
            "result": { "status": "success" },
            "directories": [ { "type": "dir", "path": "maps", "basename": "maps" } ],
            "files": [
                { "type": "file", "path": "server.cfg", "basename": "server.cfg",
                  "extension": "cfg", "filename": "server", "size": 2048,
                  "timestamp": 1700000000, "visibility": "public" }
            ]
        }"#;
        let response: ContentResponse = serde_json::from_str(json).unwrap();
        let (dirs, files) = response.into_entries().unwrap();
        assert_eq!(dirs[0].kind, EntryKind::Dir);
        assert_eq!(files[0].kind, EntryKind::File);
        assert_eq!(files[0].size, 2048);
        assert!(files[0].modified().is_some());
        assert!(dirs[0].modified().is_none());
    }

    #[test]
    fn test_entry_constructors() {
        let file = Entry::file("a/b/readme.MD", 10);
        assert_eq!(file.basename, "readme.MD");
        assert_eq!(file.dirname, "a/b");
        assert_eq!(file.extension.as_deref(), Some("md"));
        let dir = Entry::dir("a/b");
        assert!(dir.is_dir());
        assert_eq!(dir.size, 0);
        assert_eq!(dir.extension, None);
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let service =
            HttpDirectoryService::new("http://localhost/fm/", Duration::from_secs(1)).unwrap();
        assert_eq!(service.endpoint("tree"), "http://localhost/fm/tree");
    }
}
