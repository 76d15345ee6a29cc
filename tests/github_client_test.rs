//! Wiremock integration tests for the GitHub client.
//!
//! Covers the read-through cache, rate limit tracking, status code mapping
//! and the typed endpoints.

use std::time::Duration;

use portfolio::github::{
    ClientConfig, GitHubClient, RepositoryListOptions, RequestOptions, SearchOptions, SearchSort,
    SortDirection,
};
use portfolio::PortfolioError;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> GitHubClient {
    GitHubClient::new(ClientConfig {
        username: Some("alice".to_string()),
        token: Some("secret".to_string()),
        base_url: server.uri(),
        cache_duration: Duration::from_secs(5),
        ..ClientConfig::default()
    })
    .expect("client should build")
}

fn sample_user() -> serde_json::Value {
    json!({
        "login": "alice",
        "id": 1,
        "name": "Alice",
        "public_repos": 4,
        "followers": 10,
        "created_at": "2020-01-01T00:00:00Z"
    })
}

fn sample_repos() -> serde_json::Value {
    json!([
        {"id": 1, "name": "site", "full_name": "alice/site", "stargazers_count": 0,
         "fork": false, "archived": false, "topics": []},
        {"id": 2, "name": "old", "full_name": "alice/old", "stargazers_count": 0,
         "fork": false, "archived": true, "topics": []},
        {"id": 3, "name": "forked", "full_name": "alice/forked", "stargazers_count": 0,
         "fork": true, "archived": false, "topics": []},
        {"id": 4, "name": "showcase", "full_name": "alice/showcase", "stargazers_count": 0,
         "fork": true, "archived": false, "topics": ["portfolio"]},
        {"id": 5, "name": "dotfiles", "full_name": "alice/dotfiles", "stargazers_count": 9,
         "fork": false, "archived": false, "topics": []}
    ])
}

#[tokio::test]
async fn test_cached_user_is_fetched_once() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/alice"))
        .and(header("authorization", "token secret"))
        .and(header("accept", "application/vnd.github.v3+json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sample_user()))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let first = client.get_user(Some("alice")).await.unwrap();
    let second = client.get_user(Some("alice")).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.login, "alice");
    assert_eq!(first.name, "Alice");
    assert_eq!(first.followers, 10);
    assert_eq!(client.cache_len(), 1);
}

#[tokio::test]
async fn test_expired_entry_triggers_new_request() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/alice"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sample_user()))
        .expect(2)
        .mount(&server)
        .await;

    let client = GitHubClient::new(ClientConfig {
        base_url: server.uri(),
        cache_duration: Duration::from_millis(50),
        ..ClientConfig::default()
    })
    .unwrap();

    client.get_user(Some("alice")).await.unwrap();
    tokio::time::sleep(Duration::from_millis(120)).await;
    client.get_user(Some("alice")).await.unwrap();
}

#[tokio::test]
async fn test_disabled_cache_always_hits_network() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/alice"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sample_user()))
        .expect(2)
        .mount(&server)
        .await;

    let client = GitHubClient::new(ClientConfig {
        base_url: server.uri(),
        cache_enabled: false,
        ..ClientConfig::default()
    })
    .unwrap();

    client.get_user(Some("alice")).await.unwrap();
    client.get_user(Some("alice")).await.unwrap();
    assert_eq!(client.cache_len(), 0);
}

#[tokio::test]
async fn test_cache_key_includes_options_and_clear_cache_empties_it() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/alice"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sample_user()))
        .expect(3)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let plain = RequestOptions::new();
    let traced = RequestOptions::new().header("X-Trace", "1");

    let a = client.request("/users/alice", &plain).await.unwrap();
    let b = client.request("/users/alice", &traced).await.unwrap();
    assert_eq!(a, b);
    assert_eq!(client.cache_len(), 2);

    client.clear_cache();
    assert_eq!(client.cache_len(), 0);
    client.request("/users/alice", &plain).await.unwrap();
}

#[tokio::test]
async fn test_rate_limit_headers_are_tracked() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/alice"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(sample_user())
                .insert_header("x-ratelimit-limit", "60")
                .insert_header("x-ratelimit-remaining", "3")
                .insert_header("x-ratelimit-reset", "1700000000")
                .insert_header("x-ratelimit-used", "57"),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert!(client.has_remaining_requests(100));

    client.get_user(None).await.unwrap();

    let status = client.rate_limit();
    assert_eq!(status.limit, Some(60));
    assert_eq!(status.remaining, Some(3));
    assert_eq!(status.used, Some(57));
    assert_eq!(status.reset, Some(1_700_000_000));
    assert_eq!(status.reset_at.map(|dt| dt.timestamp()), Some(1_700_000_000));
    assert!(client.has_remaining_requests(3));
    assert!(!client.has_remaining_requests(4));
}

#[tokio::test]
async fn test_forbidden_after_exhausted_limit_is_rate_limited() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/alice"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(sample_user())
                .insert_header("x-ratelimit-remaining", "0")
                .insert_header("x-ratelimit-reset", "1700000000"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/bob"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.get_user(Some("alice")).await.unwrap();

    let err = client.get_user(Some("bob")).await.unwrap_err();
    match err {
        PortfolioError::RateLimited { reset_at } => {
            assert_eq!(reset_at.map(|dt| dt.timestamp()), Some(1_700_000_000));
        }
        other => panic!("expected RateLimited, got {:?}", other),
    }
}

#[tokio::test]
async fn test_forbidden_with_remaining_quota_is_forbidden() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/bob"))
        .respond_with(ResponseTemplate::new(403).insert_header("x-ratelimit-remaining", "42"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.get_user(Some("bob")).await.unwrap_err();
    assert!(matches!(err, PortfolioError::Forbidden(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_status_codes_map_to_errors() {
    let server = MockServer::start().await;

    Mock::given(path("/users/ghost"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(path("/users/locked"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(path("/users/broken"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let client = client_for(&server);

    let not_found = client.get_user(Some("ghost")).await.unwrap_err();
    assert!(not_found.is_not_found());

    let unauthorized = client.get_user(Some("locked")).await.unwrap_err();
    assert!(matches!(unauthorized, PortfolioError::Unauthorized));

    match client.get_user(Some("broken")).await.unwrap_err() {
        PortfolioError::Provider { status, status_text } => {
            assert_eq!(status, 502);
            assert_eq!(status_text, "Bad Gateway");
        }
        other => panic!("expected Provider, got {:?}", other),
    }

    // Errors are never cached.
    assert_eq!(client.cache_len(), 0);
}

#[tokio::test]
async fn test_connection_failure_is_network_error() {
    let client = GitHubClient::new(ClientConfig {
        base_url: "http://127.0.0.1:1".to_string(),
        ..ClientConfig::default()
    })
    .unwrap();

    let err = client.get_user(Some("alice")).await.unwrap_err();
    assert!(matches!(err, PortfolioError::Network(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_missing_username_fails_before_io() {
    let server = MockServer::start().await;
    let client = GitHubClient::new(ClientConfig {
        base_url: server.uri(),
        ..ClientConfig::default()
    })
    .unwrap();

    let err = client.get_user(None).await.unwrap_err();
    assert!(matches!(err, PortfolioError::InvalidArgument(_)));
    let requests = server.received_requests().await.unwrap();
    assert!(requests.is_empty());
}

#[tokio::test]
async fn test_repository_pagination_is_clamped() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/alice/repos"))
        .and(query_param("per_page", "100"))
        .and(query_param("page", "1"))
        .and(query_param("type", "owner"))
        .and(query_param("sort", "updated"))
        .and(query_param("direction", "desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/alice/repos"))
        .and(query_param("per_page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let large = RepositoryListOptions {
        per_page: 500,
        page: 0,
        ..RepositoryListOptions::default()
    };
    assert!(client.get_repositories(&large).await.unwrap().is_empty());

    let zero = RepositoryListOptions {
        per_page: 0,
        ..RepositoryListOptions::default()
    };
    assert!(client.get_repositories(&zero).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_username_is_encoded_as_one_path_segment() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/alice%3Fper_page%3D500/repos"))
        .and(query_param("per_page", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let options = RepositoryListOptions {
        username: Some("alice?per_page=500".to_string()),
        per_page: 500,
        ..RepositoryListOptions::default()
    };
    assert!(client.get_repositories(&options).await.unwrap().is_empty());

    let err = client.get_repository("..", None).await.unwrap_err();
    assert!(matches!(err, PortfolioError::InvalidArgument(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_repositories_exclude_and_featured_filters() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/alice/repos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sample_repos()))
        .mount(&server)
        .await;

    let client = client_for(&server);

    let all = client
        .get_repositories(&RepositoryListOptions::default())
        .await
        .unwrap();
    assert_eq!(all.len(), 5);

    let options = RepositoryListOptions {
        exclude: vec!["dotfiles".to_string(), "alice/site".to_string()],
        ..RepositoryListOptions::default()
    };
    let names: Vec<String> = client
        .get_repositories(&options)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.name)
        .collect();
    assert_eq!(names, vec!["old", "forked", "showcase"]);

    let featured = RepositoryListOptions {
        featured: true,
        ..RepositoryListOptions::default()
    };
    let names: Vec<String> = client
        .get_repositories(&featured)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.name)
        .collect();
    assert_eq!(names, vec!["site", "showcase", "dotfiles"]);
}

#[tokio::test]
async fn test_stats_tolerate_partial_failure() {
    let server = MockServer::start().await;

    Mock::given(path("/repos/alice/site/languages"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(path("/repos/alice/site/commits"))
        .and(query_param("per_page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "sha": "abc123",
            "html_url": "https://github.com/alice/site/commit/abc123",
            "commit": {
                "message": "Initial commit",
                "author": {"name": "Alice", "email": "a@b.com", "date": "2024-03-01T10:00:00Z"}
            }
        }])))
        .mount(&server)
        .await;
    Mock::given(path("/repos/alice/site/contributors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"login": "alice", "id": 1, "contributions": 40},
            {"login": "bob", "id": 2, "contributions": 2}
        ])))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let stats = client.get_repository_stats("site", Some("alice")).await;

    assert!(stats.languages.is_empty());
    assert_eq!(stats.contributors, 2);
    assert!(stats.has_commits);
    let last = stats.last_commit.unwrap();
    assert_eq!(last.sha, "abc123");
    assert_eq!(last.message, "Initial commit");
    assert_eq!(last.author_name.as_deref(), Some("Alice"));
}

#[tokio::test]
async fn test_stats_never_fail() {
    let server = MockServer::start().await;
    let client = client_for(&server);

    // Nothing mounted: every sub-request is a 404.
    let stats = client.get_repository_stats("missing", None).await;
    assert!(stats.languages.is_empty());
    assert_eq!(stats.contributors, 0);
    assert!(!stats.has_commits);
    assert!(stats.last_commit.is_none());
}

#[tokio::test]
async fn test_readme_is_decoded_and_missing_readme_is_none() {
    let server = MockServer::start().await;

    Mock::given(path("/repos/alice/site/readme"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "README.md",
            "encoding": "base64",
            "content": "IyBI\nZWxsbwo=\n"
        })))
        .mount(&server)
        .await;
    Mock::given(path("/repos/alice/bare/readme"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let readme = client.get_repository_readme("site", None).await.unwrap();
    assert_eq!(readme.as_deref(), Some("# Hello\n"));

    let missing = client.get_repository_readme("bare", None).await.unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn test_readme_propagates_other_errors() {
    let server = MockServer::start().await;

    Mock::given(path("/repos/alice/site/readme"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.get_repository_readme("site", None).await.unwrap_err();
    assert!(matches!(err, PortfolioError::Unauthorized));
}

#[tokio::test]
async fn test_repository_languages() {
    let server = MockServer::start().await;

    Mock::given(path("/repos/alice/site/languages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Rust": 1200, "HTML": 300})))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let languages = client.get_repository_languages("site", None).await.unwrap();
    assert_eq!(languages.get("Rust"), Some(&1200));
    assert_eq!(languages.len(), 2);
}

#[tokio::test]
async fn test_user_activity_digest() {
    let server = MockServer::start().await;

    Mock::given(path("/users/alice/events/public"))
        .and(query_param("per_page", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"type": "PushEvent", "repo": {"name": "alice/site"}, "created_at": "2024-03-02T00:00:00Z"},
            {"type": "PullRequestEvent", "repo": {"name": "bob/lib"}, "created_at": "2024-03-01T00:00:00Z"}
        ])))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let digest = client.get_user_activity(None).await;
    assert_eq!(digest.total_events, 2);
    assert_eq!(digest.push_events, 1);
    assert_eq!(digest.pull_request_events, 1);
    assert!(digest.repositories.contains("bob/lib"));
    assert!(digest.last_activity.is_some());
}

#[tokio::test]
async fn test_user_activity_fails_soft() {
    let server = MockServer::start().await;

    Mock::given(path("/users/alice/events/public"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let digest = client.get_user_activity(Some("alice")).await;
    assert_eq!(digest, Default::default());
}

#[tokio::test]
async fn test_search_composes_qualifiers() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search/repositories"))
        .and(query_param("q", "cli language:rust user:alice"))
        .and(query_param("sort", "stars"))
        .and(query_param("order", "asc"))
        .and(query_param("per_page", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_count": 1,
            "incomplete_results": false,
            "items": [{"id": 9, "name": "tool", "full_name": "alice/tool", "stargazers_count": 5}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let options = SearchOptions {
        sort: Some(SearchSort::Stars),
        order: SortDirection::Asc,
        language: Some("rust".to_string()),
        user: Some("alice".to_string()),
        per_page: 1000,
        ..SearchOptions::default()
    };
    let results = client.search_repositories("cli", &options).await.unwrap();

    assert_eq!(results.total_count, 1);
    assert!(!results.incomplete_results);
    assert_eq!(results.items[0].full_name, "alice/tool");
    assert_eq!(results.items[0].stars, 5);
}

#[tokio::test]
async fn test_search_rejects_empty_query() {
    let server = MockServer::start().await;
    let client = client_for(&server);

    let err = client
        .search_repositories("  ", &SearchOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, PortfolioError::InvalidArgument(_)));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[test]
fn test_invalid_enum_values_name_the_allowed_set() {
    let err = "stars".parse::<portfolio::github::RepoSort>().unwrap_err();
    assert!(matches!(err, PortfolioError::InvalidArgument(_)));
    assert!(err.to_string().contains("created, updated, pushed, full_name"));

    let err = "best".parse::<SearchSort>().unwrap_err();
    assert!(err.to_string().contains("stars, forks, help-wanted-issues, updated"));

    let err = "everyone".parse::<portfolio::github::RepoType>().unwrap_err();
    assert!(err.to_string().contains("owner, all, member"));
}
