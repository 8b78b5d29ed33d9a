mod error;
mod feed;
mod manager;
mod parsing;
mod types;

pub use error::CatalogError;
pub use feed::{ConfiguredFeed, FeedSource, FileFeed, HttpFeed, CELESTRAK_STATIONS_URL};
pub use manager::{CatalogManager, DEFAULT_CACHE_LIFETIME};
pub use types::{CatalogSnapshot, OrbitalElements, RefreshOutcome};

#[cfg(test)]
pub(crate) use manager::tests::StubFeed;
#[cfg(test)]
pub(crate) use parsing::parse_feed;
#[cfg(test)]
pub(crate) use parsing::tests as fixtures;
