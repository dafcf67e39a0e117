use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("invalid upstream configuration: {0}")]
    Config(String),
    #[error("playlist request failed: {0}")]
    Request(String),
    #[error("playlist request failed: HTTP {0}")]
    Status(u16),
    #[error("failed to read playlist body: {0}")]
    Body(String),
}

/// Where playlist text comes from.
#[async_trait]
pub trait PlaylistSource: Send + Sync {
    async fn fetch(&self) -> Result<String, FetchError>;

    /// URL or path, for logs.
    fn location(&self) -> &str;
}

/// Upstream playlist served over HTTP(S).
pub struct HttpPlaylistSource {
    client: reqwest::Client,
    url: String,
}

impl HttpPlaylistSource {
    /**
        Build a source for `url`. Every fetch, including connecting and reading
        the body, is bounded by `timeout`.
    */
    pub fn new(url: &str, timeout: Duration, proxy: Option<&str>) -> Result<Self, FetchError> {
        let mut builder = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT);

        if let Some(proxy_url) = proxy {
            let proxy = reqwest::Proxy::all(proxy_url).map_err(|e| {
                FetchError::Config(format!("Invalid proxy URL '{}': {}", proxy_url, e))
            })?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| FetchError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl PlaylistSource for HttpPlaylistSource {
    async fn fetch(&self) -> Result<String, FetchError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| FetchError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        response
            .text()
            .await
            .map_err(|e| FetchError::Body(e.to_string()))
    }

    fn location(&self) -> &str {
        &self.url
    }
}

/// Playlist read from the local filesystem on every fetch.
pub struct FilePlaylistSource {
    path: PathBuf,
    display: String,
}

impl FilePlaylistSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let display = path.display().to_string();
        Self { path, display }
    }
}

#[async_trait]
impl PlaylistSource for FilePlaylistSource {
    async fn fetch(&self) -> Result<String, FetchError> {
        tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| FetchError::Body(format!("{}: {}", self.display, e)))
    }

    fn location(&self) -> &str {
        &self.display
    }
}

/// Pick an HTTP or file source depending on what `location` looks like.
pub fn open_source(
    location: &str,
    timeout: Duration,
    proxy: Option<&str>,
) -> Result<Arc<dyn PlaylistSource>, FetchError> {
    if location.starts_with("http://") || location.starts_with("https://") {
        Ok(Arc::new(HttpPlaylistSource::new(location, timeout, proxy)?))
    } else {
        Ok(Arc::new(FilePlaylistSource::new(location)))
    }
}
