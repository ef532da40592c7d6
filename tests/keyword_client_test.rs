mod server;

use insighthub::http_client::build_http_client;
use insighthub::keyword_client::{
    KeywordClient, keyword_suggestions, related_keywords, summarize, trend_flag,
};
use insighthub::models::{KeywordResult, TrendFlag};
use server::{KEYWORD_KEY, start_mock_server};

fn client(base_url: &str, key: Option<&str>) -> KeywordClient {
    KeywordClient::new(
        build_http_client(10).unwrap(),
        format!("{}/search", base_url),
        key.map(str::to_string),
        25,
    )
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_fetch_counts_results_per_keyword() {
    let base_url = start_mock_server().await;
    let keywords = client(&base_url, Some(KEYWORD_KEY));
    assert!(keywords.has_api_key());

    let results = keywords
        .fetch(&strings(&["seo", "local seo audit"]))
        .await;

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].keyword, "seo");
    assert_eq!(results[0].result_count, Some(3));
    assert_eq!(results[0].error, None);
    assert_eq!(results[1].keyword, "local seo audit");
    assert_eq!(results[1].result_count, Some(9));
    assert!(!results[1].related.is_empty());
}

#[tokio::test]
async fn test_one_failing_keyword_does_not_affect_others() {
    let base_url = start_mock_server().await;
    let keywords = client(&base_url, Some(KEYWORD_KEY));

    let results = keywords
        .fetch(&strings(&["fail fast", "rust crawler"]))
        .await;

    assert_eq!(results.len(), 2);
    assert!(!results[0].is_available());
    assert!(results[0].error.as_deref().unwrap().contains("500"));
    assert_eq!(results[1].result_count, Some(6));
}

#[tokio::test]
async fn test_wrong_key_marks_keywords_unavailable() {
    let base_url = start_mock_server().await;
    let keywords = client(&base_url, Some("nope"));

    let results = keywords.fetch(&strings(&["seo"])).await;
    assert!(!results[0].is_available());
    assert!(results[0].error.as_deref().unwrap().contains("401"));
}

#[tokio::test]
async fn test_missing_key_skips_network() {
    // Nothing listens on this endpoint; no request must be attempted
    let keywords = KeywordClient::new(
        build_http_client(1).unwrap(),
        "http://127.0.0.1:1/search",
        None,
        25,
    );
    assert!(!keywords.has_api_key());

    let results = keywords.fetch(&strings(&["seo", "ai tools"])).await;
    assert_eq!(results.len(), 2);
    for result in &results {
        assert_eq!(result.result_count, None);
        assert_eq!(
            result.error.as_deref(),
            Some("no API key configured for keyword research")
        );
    }
    assert_eq!(results[1].trend_flag, TrendFlag::Trending);
}

#[test]
fn test_trend_flags() {
    assert_eq!(trend_flag("AI marketing tools"), TrendFlag::Trending);
    assert_eq!(trend_flag("black friday deals"), TrendFlag::Seasonal);
    assert_eq!(trend_flag("summer digital sale"), TrendFlag::Seasonal);
    assert_eq!(trend_flag("plumber in boston"), TrendFlag::Steady);
    // Whole words only
    assert_eq!(trend_flag("hair salon"), TrendFlag::Steady);
}

#[test]
fn test_related_keywords() {
    let related = related_keywords("SEO Tool");

    assert!(related.len() <= 8);
    assert_eq!(related[0], "how to seo tool");
    assert!(related.contains(&"best seo tool".to_string()));
    assert!(related.contains(&"seo tool near me".to_string()));
    assert!(!related.contains(&"seo tool".to_string()));

    let mut unique = related.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), related.len());

    assert!(related_keywords("   ").is_empty());
}

#[test]
fn test_synonyms_replace_whole_words_only() {
    let related = related_keywords("tool tools");

    assert!(related.contains(&"software tools".to_string()), "{:?}", related);
    assert!(related.contains(&"application tools".to_string()));
    assert!(related.iter().all(|r| !r.contains("softwares")));
}

#[test]
fn test_related_keywords_plural_variants() {
    assert!(related_keywords("widget").contains(&"widgets".to_string()));
    assert!(related_keywords("widgets").contains(&"widget".to_string()));
}

#[test]
fn test_keyword_suggestions() {
    let suggestions = keyword_suggestions(&strings(&["SEO", "Audit"]));

    assert_eq!(suggestions[0], "seo audit");
    assert_eq!(suggestions[1], "audit seo");
    assert!(suggestions.contains(&"backlinks".to_string()));
    assert!(suggestions.len() <= 10);

    assert!(keyword_suggestions(&[]).is_empty());
}

#[test]
fn test_summarize() {
    let results = vec![
        KeywordResult {
            keyword: "ai writing tools".to_string(),
            result_count: Some(10),
            trend_flag: TrendFlag::Trending,
            related: Vec::new(),
            error: None,
        },
        KeywordResult {
            keyword: "seo".to_string(),
            result_count: Some(20),
            trend_flag: TrendFlag::Steady,
            related: Vec::new(),
            error: None,
        },
        KeywordResult {
            keyword: "plumbing".to_string(),
            result_count: None,
            trend_flag: TrendFlag::Steady,
            related: Vec::new(),
            error: Some("request timed out".to_string()),
        },
    ];

    let summary = summarize(&results);
    assert_eq!(summary.total_keywords, 3);
    assert_eq!(summary.available, 2);
    assert_eq!(summary.average_result_count, Some(15.0));
    assert_eq!(summary.max_result_count, Some(20));
    assert_eq!(summary.trending, 1);
    assert_eq!(summary.long_tail, 1);
    assert!(!summary.suggestions.is_empty());

    let empty = summarize(&[]);
    assert_eq!(empty.average_result_count, None);
    assert_eq!(empty.max_result_count, None);
}
