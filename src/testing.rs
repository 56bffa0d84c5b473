//! In-memory stand-ins for the network and the filesystem.

use crate::error::{StorageError, TransportError};
use crate::media::Storage;
use crate::session::{Fetcher, Headers};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Debug, Clone)]
pub struct Request {
    pub url: String,
    pub headers: Vec<(String, String)>,
}

impl Request {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Serves canned bodies by exact URL. Anything unknown is a 404.
#[derive(Default)]
pub struct FakeFetcher {
    bodies: Mutex<HashMap<String, Vec<u8>>>,
    failures: Mutex<HashMap<String, u16>>,
    redirects: Mutex<HashMap<String, String>>,
    requests: Mutex<Vec<Request>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, url: &str, body: Vec<u8>) {
        self.bodies.lock().unwrap().insert(url.to_string(), body);
    }

    pub fn respond_json(&self, url: &str, body: serde_json::Value) {
        self.respond(url, body.to_string().into_bytes());
    }

    pub fn fail(&self, url: &str, status: u16) {
        self.failures.lock().unwrap().insert(url.to_string(), status);
    }

    pub fn redirect(&self, from: &str, to: &str) {
        self.redirects
            .lock()
            .unwrap()
            .insert(from.to_string(), to.to_string());
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, prefix: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.url.starts_with(prefix))
            .count()
    }

    fn record(&self, url: &str, headers: &Headers<'_>) {
        self.requests.lock().unwrap().push(Request {
            url: url.to_string(),
            headers: headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        });
    }
}

#[async_trait]
impl Fetcher for FakeFetcher {
    async fn fetch(&self, url: &str, headers: &Headers<'_>) -> Result<Vec<u8>, TransportError> {
        self.record(url, headers);

        if let Some(status) = self.failures.lock().unwrap().get(url) {
            return Err(TransportError::Status {
                url: url.to_string(),
                status: *status,
            });
        }

        self.bodies
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| TransportError::Status {
                url: url.to_string(),
                status: 404,
            })
    }

    async fn resolve_redirect(
        &self,
        url: &str,
        headers: &Headers<'_>,
    ) -> Result<String, TransportError> {
        self.record(url, headers);
        self.redirects
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| TransportError::Status {
                url: url.to_string(),
                status: 404,
            })
    }
}

#[derive(Default)]
pub struct MemoryStorage {
    dirs: Mutex<HashSet<PathBuf>>,
    files: Mutex<BTreeMap<PathBuf, Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn files(&self) -> BTreeMap<PathBuf, Vec<u8>> {
        self.files.lock().unwrap().clone()
    }

    pub fn has_dir(&self, dir: &Path) -> bool {
        self.dirs.lock().unwrap().contains(dir)
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn ensure(&self, dir: &Path) -> Result<(), StorageError> {
        self.dirs.lock().unwrap().insert(dir.to_path_buf());
        Ok(())
    }

    async fn write(&self, path: &Path, data: &[u8]) -> Result<(), StorageError> {
        let parent = path.parent().unwrap_or(Path::new(""));
        if !self.has_dir(parent) {
            return Err(StorageError::new(
                path,
                std::io::Error::new(std::io::ErrorKind::NotFound, "directory missing"),
            ));
        }
        self.files
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), data.to_vec());
        Ok(())
    }
}
