use std::future::Future;
use std::path::PathBuf;

use crate::catalog::error::FeedError;

pub const CELESTRAK_STATIONS_URL: &str = "https://celestrak.org/NORAD/elements/stations.txt";

/// Something that can hand over the raw element feed text.
pub trait FeedSource: Send + Sync {
    fn fetch(&self) -> impl Future<Output = Result<String, FeedError>> + Send;

    /// Human readable origin, for logs.
    fn describe(&self) -> String;
}

pub struct HttpFeed {
    url: String,
    client: reqwest::Client,
}

impl HttpFeed {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::new(),
        }
    }
}

impl FeedSource for HttpFeed {
    async fn fetch(&self) -> Result<String, FeedError> {
        let response = self.client.get(&self.url).send().await?;
        let body = response.error_for_status()?.text().await?;
        Ok(body)
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

/// Reads the feed from a local text file, e.g. a saved CelesTrak download.
pub struct FileFeed {
    path: PathBuf,
}

impl FileFeed {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl FeedSource for FileFeed {
    async fn fetch(&self) -> Result<String, FeedError> {
        Ok(tokio::fs::read_to_string(&self.path).await?)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Feed selected at runtime from configuration.
pub enum ConfiguredFeed {
    Http(HttpFeed),
    File(FileFeed),
}

impl FeedSource for ConfiguredFeed {
    async fn fetch(&self) -> Result<String, FeedError> {
        match self {
            ConfiguredFeed::Http(feed) => feed.fetch().await,
            ConfiguredFeed::File(feed) => feed.fetch().await,
        }
    }

    fn describe(&self) -> String {
        match self {
            ConfiguredFeed::Http(feed) => feed.describe(),
            ConfiguredFeed::File(feed) => feed.describe(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn file_feed_reads_content() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "ISS (ZARYA)\n1 ...\n2 ...\n").unwrap();

        let feed = ConfiguredFeed::File(FileFeed::new(file.path().to_path_buf()));
        let text = feed.fetch().await.unwrap();
        assert!(text.starts_with("ISS (ZARYA)"));
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let feed = FileFeed::new(PathBuf::from("/nonexistent/stations.txt"));
        assert!(matches!(feed.fetch().await, Err(FeedError::Io(_))));
    }
}
