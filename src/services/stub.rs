//! Scripted in-memory `DirectoryService` for tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{FmError, Result};
use crate::services::remote::{
    ContentResponse, DirectoryService, Entry, ResultStatus, TreeDirectory, TreeResponse,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Tree(String, Option<String>),
    Content(String, Option<String>),
}

type Key = (String, Option<String>);

#[derive(Default)]
pub struct StubDirectoryService {
    trees: Mutex<HashMap<Key, Result<TreeResponse>>>,
    contents: Mutex<HashMap<Key, Result<ContentResponse>>>,
    calls: Mutex<Vec<Call>>,
}

fn key(disk: &str, path: Option<&str>) -> Key {
    (disk.to_string(), path.map(|p| p.to_string()))
}

impl StubDirectoryService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve these child directories for `tree(disk, path)`.
    pub fn with_tree(self, disk: &str, path: Option<&str>, dirs: &[(&str, bool)]) -> Self {
        let directories = dirs
            .iter()
            .map(|(p, has_subdirs)| TreeDirectory::new(p, *has_subdirs))
            .collect();
        if let Ok(mut trees) = self.trees.lock() {
            trees.insert(
                key(disk, path),
                Ok(TreeResponse {
                    result: ResultStatus::success(),
                    directories,
                }),
            );
        }
        self
    }

    pub fn with_tree_failure(self, disk: &str, path: Option<&str>, message: &str) -> Self {
        if let Ok(mut trees) = self.trees.lock() {
            trees.insert(
                key(disk, path),
                Ok(TreeResponse {
                    result: ResultStatus::failure(message),
                    directories: Vec::new(),
                }),
            );
        }
        self
    }

    pub fn with_content(
        self,
        disk: &str,
        path: Option<&str>,
        directories: Vec<Entry>,
        files: Vec<Entry>,
    ) -> Self {
        if let Ok(mut contents) = self.contents.lock() {
            contents.insert(
                key(disk, path),
                Ok(ContentResponse {
                    result: ResultStatus::success(),
                    directories,
                    files,
                }),
            );
        }
        self
    }

    pub fn with_content_error(self, disk: &str, path: Option<&str>, error: FmError) -> Self {
        if let Ok(mut contents) = self.contents.lock() {
            contents.insert(key(disk, path), Err(error));
        }
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn tree_calls(&self) -> Vec<Option<String>> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Tree(_, path) => Some(path),
                Call::Content(..) => None,
            })
            .collect()
    }

    pub fn content_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Content(..)))
            .count()
    }

    fn record(&self, call: Call) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

#[async_trait]
impl DirectoryService for StubDirectoryService {
    async fn tree(&self, disk: &str, path: Option<&str>) -> Result<TreeResponse> {
        self.record(Call::Tree(disk.to_string(), path.map(|p| p.to_string())));
        let trees = self.trees.lock().map_err(|e| FmError::Http(e.to_string()))?;
        trees.get(&key(disk, path)).cloned().unwrap_or_else(|| {
            // Unknown directories answer with an empty, successful listing.
            Ok(TreeResponse {
                result: ResultStatus::success(),
                directories: Vec::new(),
            })
        })
    }

    async fn content(&self, disk: &str, path: Option<&str>) -> Result<ContentResponse> {
        self.record(Call::Content(disk.to_string(), path.map(|p| p.to_string())));
        let contents = self.contents.lock().map_err(|e| FmError::Http(e.to_string()))?;
        contents.get(&key(disk, path)).cloned().unwrap_or_else(|| {
            Ok(ContentResponse {
                result: ResultStatus::success(),
                directories: Vec::new(),
                files: Vec::new(),
            })
        })
    }
}
