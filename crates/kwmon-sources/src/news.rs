//! News search adapter backed by the Google News RSS endpoint.

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

use crate::error::SourceError;
use crate::http::HttpSettings;
use crate::retry::retry_with_backoff;
use crate::types::NewsArticle;

const SOURCE_NAME: &str = "google_news";

/// Synchronous news search: one round trip, one complete document per keyword.
#[async_trait]
pub trait NewsSource: Send + Sync {
    /// Search news for `keyword`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] on any transport, status or parse failure.
    async fn search(&self, keyword: &str) -> Result<Value, SourceError>;
}

/// Google News RSS client.
///
/// Use [`GoogleNewsClient::new`] with the production base URL or point it at
/// a mock server in tests.
pub struct GoogleNewsClient {
    client: Client,
    base_url: String,
    max_articles: usize,
    max_retries: u32,
    retry_backoff_base_ms: u64,
}

impl GoogleNewsClient {
    /// Creates a client for the RSS search endpoint under `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        base_url: &str,
        max_articles: usize,
        settings: &HttpSettings,
    ) -> Result<Self, SourceError> {
        Ok(Self {
            client: settings.build_client()?,
            base_url: base_url.trim_end_matches('/').to_owned(),
            max_articles,
            max_retries: settings.max_retries,
            retry_backoff_base_ms: settings.retry_backoff_base_ms,
        })
    }

    fn search_url(&self, keyword: &str) -> String {
        let encoded = utf8_percent_encode(keyword, NON_ALPHANUMERIC).to_string();
        format!(
            "{}/rss/search?q={encoded}&hl=en-US&gl=US&ceid=US:en",
            self.base_url
        )
    }

    async fn fetch_feed(&self, url: &str) -> Result<String, SourceError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(SourceError::RateLimited {
                url: url.to_owned(),
            });
        }
        if !status.is_success() {
            return Err(SourceError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_owned(),
            });
        }
        Ok(response.text().await?)
    }
}

#[async_trait]
impl NewsSource for GoogleNewsClient {
    async fn search(&self, keyword: &str) -> Result<Value, SourceError> {
        let url = self.search_url(keyword);
        let body = retry_with_backoff(self.max_retries, self.retry_backoff_base_ms, || {
            self.fetch_feed(&url)
        })
        .await?;

        let articles = parse_rss_feed(&body, self.max_articles)?;
        tracing::debug!(keyword, count = articles.len(), "collected news articles");

        Ok(json!({
            "keyword": keyword,
            "source": SOURCE_NAME,
            "articles": articles,
        }))
    }
}

/// Parse an RSS XML feed into [`NewsArticle`]s.
///
/// Extracts `<item>` elements with their `<title>`, `<link>`, `<description>`
/// and `<pubDate>`. HTML in descriptions is stripped. Items without a title or
/// link are skipped. Stops after `max_articles` items.
///
/// # Errors
///
/// Returns [`SourceError::Xml`] if the XML is malformed.
pub fn parse_rss_feed(xml: &str, max_articles: usize) -> Result<Vec<NewsArticle>, SourceError> {
    if max_articles == 0 {
        return Ok(Vec::new());
    }

    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut articles = Vec::new();
    let mut in_item = false;
    let mut in_description = false;
    let mut current_tag = String::new();
    let mut title = String::new();
    let mut link = String::new();
    let mut description = String::new();
    let mut published = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name_buf = e.name().as_ref().to_vec();
                let name = std::str::from_utf8(&name_buf).unwrap_or("").to_string();
                if name == "item" {
                    in_item = true;
                    in_description = false;
                    title.clear();
                    link.clear();
                    description.clear();
                    published.clear();
                } else if name == "description" && in_item {
                    in_description = true;
                }
                current_tag = name;
            }
            Ok(Event::End(e)) => {
                let name_buf = e.name().as_ref().to_vec();
                let name = std::str::from_utf8(&name_buf).unwrap_or("");
                if name == "description" {
                    in_description = false;
                }
                if name == "item" && in_item {
                    in_item = false;
                    if !title.is_empty() && !link.is_empty() {
                        articles.push(NewsArticle {
                            title: title.clone(),
                            url: link.clone(),
                            description: strip_html(&description),
                            published: (!published.is_empty()).then(|| published.clone()),
                        });
                        if articles.len() >= max_articles {
                            break;
                        }
                    }
                }
            }
            Ok(Event::Text(e)) => {
                if in_item {
                    let text = e.unescape().unwrap_or_default().into_owned();
                    if in_description {
                        if !description.is_empty() {
                            description.push(' ');
                        }
                        description.push_str(&text);
                    } else {
                        match current_tag.as_str() {
                            "title" => title = text,
                            "link" => link = text,
                            "pubDate" => published = text,
                            _ => {}
                        }
                    }
                }
            }
            Ok(Event::CData(e)) => {
                if in_item {
                    let text = String::from_utf8_lossy(e.as_ref()).into_owned();
                    if in_description {
                        description = text;
                    } else if current_tag == "title" {
                        title = text;
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(SourceError::Xml(e)),
            _ => {}
        }
    }

    Ok(articles)
}

/// Strip HTML tags from a string and normalize whitespace.
fn strip_html(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}
