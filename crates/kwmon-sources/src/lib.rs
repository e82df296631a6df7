//! External source adapters for keyword monitoring.
//!
//! Two boundaries: a synchronous news search ([`NewsSource`]) that returns a
//! complete document per keyword, and an asynchronous social search
//! ([`SocialSearch`]) that is driven through submit, status and fetch calls
//! keyed by an opaque job id.

pub mod error;
pub mod http;
pub mod news;
pub mod social;
pub mod types;

mod retry;

pub use error::SourceError;
pub use http::HttpSettings;
pub use news::{parse_rss_feed, GoogleNewsClient, NewsSource};
pub use social::{SocialSearch, SocialSearchClient};
pub use types::{NewsArticle, StatusReport};
