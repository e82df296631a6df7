//! Integration tests for `GoogleNewsClient` using wiremock HTTP mocks.

use kwmon_sources::{GoogleNewsClient, HttpSettings, NewsSource, SourceError};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <item>
      <title>Acme opens new plant</title>
      <link>https://example.com/acme-plant</link>
      <description>Acme is expanding.</description>
    </item>
    <item>
      <title>Acme CEO interview</title>
      <link>https://example.com/acme-ceo</link>
    </item>
  </channel>
</rss>"#;

fn test_client(base_url: &str, max_articles: usize) -> GoogleNewsClient {
    let settings = HttpSettings {
        timeout_secs: 5,
        user_agent: "kwmon-test/0.1".to_string(),
        max_retries: 0,
        retry_backoff_base_ms: 0,
    };
    GoogleNewsClient::new(base_url, max_articles, &settings)
        .expect("client construction should not fail")
}

#[tokio::test]
async fn search_returns_article_document() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rss/search"))
        .and(query_param("q", "acme corp"))
        .respond_with(ResponseTemplate::new(200).set_body_string(FEED))
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 25);
    let document = client.search("acme corp").await.expect("search should succeed");

    assert_eq!(document["keyword"], "acme corp");
    assert_eq!(document["source"], "google_news");
    let articles = document["articles"].as_array().expect("articles array");
    assert_eq!(articles.len(), 2);
    assert_eq!(articles[0]["title"], "Acme opens new plant");
    assert_eq!(articles[0]["url"], "https://example.com/acme-plant");
    assert_eq!(articles[0]["description"], "Acme is expanding.");
}

#[tokio::test]
async fn search_caps_article_count() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rss/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string(FEED))
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 1);
    let document = client.search("acme").await.unwrap();
    assert_eq!(document["articles"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn search_surfaces_http_failure() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rss/search"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 25);
    let result = client.search("acme").await;
    assert!(
        matches!(result, Err(SourceError::UnexpectedStatus { status: 500, .. })),
        "got {result:?}"
    );
}
