//! Unit tests for the search HTTP transport

use reqwest::Client;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};
use wordle_harvester::edition::SearchWindow;
use wordle_harvester::fetcher::search_http::SearchHttpClient;
use wordle_harvester::fetcher::{
    FetchOutcome, FetcherError, PageSource, SearchQuery, SearchTransport,
};
use wordle_harvester::harvester::RateLimitedFetcher;

const TOKEN: &str = "test-bearer-token";

fn page_body() -> serde_json::Value {
    json!({
        "statuses": [
            {
                "id": 1496000000000000050u64,
                "created_at": "Wed Feb 23 10:00:00 +0000 2022",
                "user": {"id": 11},
                "source": "<a href=\"https://mobile.twitter.com\" rel=\"nofollow\">Twitter Web App</a>",
                "in_reply_to_user_id": null,
                "is_quote_status": false,
                "retweet_count": 0,
                "favorite_count": 2,
                "lang": "en",
                "text": "Wordle 250 1/6\n🟩🟩🟩🟩🟩"
            }
        ],
        "search_metadata": {"count": 100}
    })
}

fn client_for(server: &MockServer) -> SearchHttpClient {
    SearchHttpClient::new(Arc::new(Client::new()), server.uri(), TOKEN)
}

fn query(max_id: Option<u64>) -> SearchQuery {
    SearchQuery::for_window(&SearchWindow::for_edition(250), max_id)
}

#[tokio::test]
async fn test_page_with_bearer_and_params() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/1.1/search/tweets.json"))
        .and(header("authorization", format!("Bearer {TOKEN}").as_str()))
        .and(query_param("result_type", "recent"))
        .and(query_param("count", "100"))
        .and(query_param("max_id", "41"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body()))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = client_for(&server).fetch_once(&query(Some(41))).await;

    match outcome {
        FetchOutcome::Page(page) => {
            assert_eq!(page.statuses.len(), 1);
            assert_eq!(page.min_id(), Some(1496000000000000050));
        }
        other => panic!("expected a page, got {other:?}"),
    }
}

#[tokio::test]
async fn test_first_page_omits_max_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/1.1/search/tweets.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"statuses": []})))
        .mount(&server)
        .await;

    let outcome = client_for(&server).fetch_once(&query(None)).await;
    assert!(matches!(outcome, FetchOutcome::Page(ref page) if page.is_empty()));

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let pairs: Vec<(String, String)> = requests[0]
        .url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    assert!(pairs.iter().all(|(k, _)| k != "max_id"));
    assert!(pairs
        .iter()
        .any(|(k, v)| k == "q" && v.starts_with("\"wordle 250\"")));
}

#[tokio::test]
async fn test_429_is_rate_limited() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let outcome = client_for(&server).fetch_once(&query(None)).await;
    assert!(matches!(outcome, FetchOutcome::RateLimited));
}

#[tokio::test]
async fn test_server_error_is_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal error"))
        .mount(&server)
        .await;

    let outcome = client_for(&server).fetch_once(&query(None)).await;
    match outcome {
        FetchOutcome::Fatal(FetcherError::HttpStatus { status, body }) => {
            assert_eq!(status, 500);
            assert_eq!(body, "Internal error");
        }
        other => panic!("expected a fatal status, got {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_body_is_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let outcome = client_for(&server).fetch_once(&query(None)).await;
    assert!(matches!(
        outcome,
        FetchOutcome::Fatal(FetcherError::ParseError(_))
    ));
}

#[tokio::test]
async fn test_rate_limited_fetcher_recovers_after_429() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body()))
        .mount(&server)
        .await;

    let fetcher = RateLimitedFetcher::with_pause(client_for(&server), Duration::from_millis(10));
    let page = fetcher.fetch_page(&query(None)).await.unwrap();

    assert_eq!(page.statuses.len(), 1);
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}
