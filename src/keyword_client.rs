use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::ClientError;
use crate::models::{KeywordResult, KeywordSummary, TrendFlag};

pub const DEFAULT_KEYWORD_ENDPOINT: &str = "https://api.exa.ai/search";
pub const DEFAULT_KEYWORD_RESULTS: u32 = 25;

const MAX_RELATED: usize = 8;
const MAX_SUGGESTIONS: usize = 10;

const TRENDING_TERMS: &[&str] = &["ai", "automation", "digital", "remote", "sustainable"];
const SEASONAL_TERMS: &[&str] = &[
    "holiday",
    "summer",
    "winter",
    "spring",
    "back to school",
    "christmas",
    "black friday",
];

const SYNONYMS: &[(&str, &[&str])] = &[
    (
        "seo",
        &["search engine optimization", "organic search", "search marketing"],
    ),
    ("marketing", &["advertising", "promotion", "branding"]),
    ("website", &["site", "web page", "online presence"]),
    ("business", &["company", "enterprise", "organization"]),
    ("tool", &["software", "application", "platform"]),
    ("service", &["solution", "offering", "support"]),
    ("analysis", &["analytics", "examination", "assessment"]),
    ("strategy", &["plan", "approach", "methodology"]),
    ("optimization", &["improvement", "enhancement", "refinement"]),
    ("digital", &["online", "internet", "web-based"]),
];

const INDUSTRY_TERMS: &[(&str, &[&str])] = &[
    ("seo", &["serp features", "backlinks", "keyword ranking"]),
    ("marketing", &["lead generation", "conversion rate", "customer acquisition"]),
    ("web", &["responsive design", "user experience", "page speed"]),
    ("business", &["revenue growth", "market share", "brand awareness"]),
    ("digital", &["online presence", "social media", "content marketing"]),
];

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchRequest<'a> {
    query: &'a str,
    #[serde(rename = "type")]
    search_type: &'static str,
    num_results: u32,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    results: Vec<serde_json::Value>,
}

/// Looks keywords up on a hosted search API and uses the number of results
/// as a rough volume signal.
pub struct KeywordClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    num_results: u32,
}

impl KeywordClient {
    pub fn new(
        client: Client,
        endpoint: impl Into<String>,
        api_key: Option<String>,
        num_results: u32,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            api_key,
            num_results: num_results.max(1),
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// One result per keyword, in request order. Keywords that could not be
    /// looked up are kept with no result count.
    pub async fn fetch(&self, keywords: &[String]) -> Vec<KeywordResult> {
        let mut results = Vec::with_capacity(keywords.len());

        for keyword in keywords {
            let lookup = match &self.api_key {
                Some(api_key) => self.search(api_key, keyword).await,
                None => Err(ClientError::MissingApiKey("keyword research")),
            };

            let (result_count, error) = match lookup {
                Ok(count) => (Some(count), None),
                Err(e) => {
                    tracing::warn!(keyword = %keyword, error = %e, "Keyword lookup failed");
                    (None, Some(e.to_string()))
                }
            };

            results.push(KeywordResult {
                keyword: keyword.clone(),
                result_count,
                trend_flag: trend_flag(keyword),
                related: related_keywords(keyword),
                error,
            });
        }

        results
    }

    async fn search(&self, api_key: &str, keyword: &str) -> Result<u64, ClientError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .header("x-api-key", api_key)
            .json(&SearchRequest {
                query: keyword,
                search_type: "keyword",
                num_results: self.num_results,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let search: SearchResponse = response
            .json()
            .await
            .map_err(|e| ClientError::Parse(e.to_string()))?;

        Ok(search.results.len() as u64)
    }
}

/// Whole-word (or whole-phrase) match, ignoring case and repeated spaces
fn contains_term(keyword: &str, term: &str) -> bool {
    let words: Vec<&str> = keyword.split_whitespace().collect();
    let padded = format!(" {} ", words.join(" ").to_lowercase());
    padded.contains(&format!(" {} ", term))
}

/// Swaps whole-word occurrences of `term`, leaving words that merely contain it
fn replace_term(text: &str, term: &str, replacement: &str) -> String {
    text.split_whitespace()
        .map(|word| if word == term { replacement } else { word })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn trend_flag(keyword: &str) -> TrendFlag {
    if SEASONAL_TERMS.iter().any(|term| contains_term(keyword, term)) {
        TrendFlag::Seasonal
    } else if TRENDING_TERMS.iter().any(|term| contains_term(keyword, term)) {
        TrendFlag::Trending
    } else {
        TrendFlag::Steady
    }
}

/// Question, commercial, local and long-tail variants, synonym swaps and the
/// plural/singular form. At most eight, without duplicates.
pub fn related_keywords(keyword: &str) -> Vec<String> {
    let base = keyword.trim().to_lowercase();
    if base.is_empty() {
        return Vec::new();
    }

    let mut related = vec![
        format!("how to {}", base),
        format!("what is {}", base),
        format!("best {}", base),
        format!("top {}", base),
        format!("{} near me", base),
        format!("{} guide", base),
    ];

    for (word, synonyms) in SYNONYMS {
        if contains_term(&base, word) {
            related.extend(
                synonyms
                    .iter()
                    .take(2)
                    .map(|synonym| replace_term(&base, word, synonym)),
            );
        }
    }

    if let Some(singular) = base.strip_suffix('s').filter(|s| s.len() > 2) {
        related.push(singular.to_string());
    } else if !base.ends_with('s') {
        related.push(format!("{}s", base));
    }

    dedup_capped(related, &base, MAX_RELATED)
}

/// Long-tail combinations of the requested keywords plus industry terms
pub fn keyword_suggestions(keywords: &[String]) -> Vec<String> {
    let lowered: Vec<String> = keywords.iter().map(|k| k.trim().to_lowercase()).collect();
    let mut suggestions = Vec::new();

    for (i, first) in lowered.iter().enumerate() {
        for second in &lowered[i + 1..] {
            suggestions.push(format!("{} {}", first, second));
            suggestions.push(format!("{} {}", second, first));
        }
    }

    for keyword in &lowered {
        for (industry, terms) in INDUSTRY_TERMS {
            if keyword.contains(industry) {
                suggestions.extend(terms.iter().map(|t| t.to_string()));
            }
        }
    }

    dedup_capped(suggestions, "", MAX_SUGGESTIONS)
}

fn dedup_capped(items: Vec<String>, exclude: &str, cap: usize) -> Vec<String> {
    let mut unique: Vec<String> = Vec::new();
    for item in items {
        if item != exclude && !unique.contains(&item) {
            unique.push(item);
        }
        if unique.len() == cap {
            break;
        }
    }
    unique
}

pub fn summarize(results: &[KeywordResult]) -> KeywordSummary {
    let counts: Vec<u64> = results.iter().filter_map(|r| r.result_count).collect();
    let average_result_count = if counts.is_empty() {
        None
    } else {
        Some(counts.iter().sum::<u64>() as f64 / counts.len() as f64)
    };

    let keywords: Vec<String> = results.iter().map(|r| r.keyword.clone()).collect();

    KeywordSummary {
        total_keywords: results.len(),
        available: counts.len(),
        average_result_count,
        max_result_count: counts.iter().copied().max(),
        trending: results
            .iter()
            .filter(|r| r.trend_flag == TrendFlag::Trending)
            .count(),
        long_tail: results.iter().filter(|r| r.word_count() >= 3).count(),
        suggestions: keyword_suggestions(&keywords),
    }
}
