//! Resource loaders
//!
//! Implementations of `ResourceLoader` for the places resources live:
//! - `HttpLoader`   resources served under a base URL
//! - `FileLoader`   resources under a local directory
//! - `StaticLoader` resources held in memory (bundled data, tests)
//!
//! Locations are relative paths such as `en/quotes.csv`; each loader resolves
//! them against its own base. None of them retries.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use url::Url;

use crate::interface::{LoadError, ResourceLoader};

/// Pick a loader for a configured source: `http(s)://` URLs load over HTTP,
/// anything else is treated as a directory.
pub fn loader_for_source(source: &str) -> Result<Arc<dyn ResourceLoader>, LoadError> {
    if source.starts_with("http://") || source.starts_with("https://") {
        Ok(Arc::new(HttpLoader::new(source)?))
    } else {
        Ok(Arc::new(FileLoader::new(source)))
    }
}

/// Reject absolute locations and parent traversal
fn validate_location(location: &str) -> Result<(), LoadError> {
    let path = Path::new(location);
    let escapes = path
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if location.is_empty() || escapes {
        return Err(LoadError::InvalidLocation(location.to_string()));
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// HTTP
// ─────────────────────────────────────────────────────────────────────────────

/// Loads resources with GET requests relative to a base URL
#[derive(Debug, Clone)]
pub struct HttpLoader {
    client: reqwest::Client,
    base: Url,
}

impl HttpLoader {
    pub fn new(base: &str) -> Result<Self, LoadError> {
        let mut base = Url::parse(base).map_err(|e| LoadError::InvalidLocation(format!("{}: {}", base, e)))?;
        // Without a trailing slash, `join` would replace the last path segment
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self {
            client: reqwest::Client::new(),
            base,
        })
    }

    pub fn resolve(&self, location: &str) -> Result<Url, LoadError> {
        validate_location(location)?;
        self.base
            .join(location)
            .map_err(|e| LoadError::InvalidLocation(format!("{}: {}", location, e)))
    }
}

#[async_trait::async_trait]
impl ResourceLoader for HttpLoader {
    async fn load(&self, location: &str) -> Result<String, LoadError> {
        let url = self.resolve(location)?;
        tracing::debug!(%url, "fetching resource");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| LoadError::Network(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(LoadError::NotFound(url.to_string()));
        }
        if !status.is_success() {
            return Err(LoadError::Status {
                location: url.to_string(),
                status: status.as_u16(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| LoadError::Network(e.to_string()))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// FILESYSTEM
// ─────────────────────────────────────────────────────────────────────────────

/// Loads resources from files under a base directory
#[derive(Debug, Clone)]
pub struct FileLoader {
    base: PathBuf,
}

impl FileLoader {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn resolve(&self, location: &str) -> Result<PathBuf, LoadError> {
        validate_location(location)?;
        Ok(self.base.join(location))
    }
}

#[async_trait::async_trait]
impl ResourceLoader for FileLoader {
    async fn load(&self, location: &str) -> Result<String, LoadError> {
        let path = self.resolve(location)?;
        tracing::debug!(path = %path.display(), "reading resource");

        tokio::fs::read_to_string(&path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => LoadError::NotFound(path.display().to_string()),
            _ => LoadError::Io(format!("{}: {}", path.display(), e)),
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// IN-MEMORY
// ─────────────────────────────────────────────────────────────────────────────

/// Serves resources from a map. Counts every request, so callers can check
/// that nothing was loaded twice.
#[derive(Debug, Default)]
pub struct StaticLoader {
    resources: HashMap<String, String>,
    load_count: AtomicUsize,
    requested: Mutex<Vec<String>>,
}

impl StaticLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resource(mut self, location: impl Into<String>, content: impl Into<String>) -> Self {
        self.resources.insert(location.into(), content.into());
        self
    }

    /// Number of `load` calls so far, including failed ones
    pub fn load_count(&self) -> usize {
        self.load_count.load(Ordering::SeqCst)
    }

    /// Locations requested so far, in request order
    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().clone()
    }
}

impl<L, C> FromIterator<(L, C)> for StaticLoader
where
    L: Into<String>,
    C: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (L, C)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(StaticLoader::new(), |loader, (location, content)| {
                loader.with_resource(location, content)
            })
    }
}

#[async_trait::async_trait]
impl ResourceLoader for StaticLoader {
    async fn load(&self, location: &str) -> Result<String, LoadError> {
        self.load_count.fetch_add(1, Ordering::SeqCst);
        self.requested.lock().push(location.to_string());
        self.resources
            .get(location)
            .cloned()
            .ok_or_else(|| LoadError::NotFound(location.to_string()))
    }
}
