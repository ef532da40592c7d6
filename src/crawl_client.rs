use once_cell::sync::Lazy;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use url::Url;

use crate::error::ClientError;
use crate::models::{CrawlResult, HeadingCounts};

pub const DEFAULT_CRAWL_ENDPOINT: &str = "https://api.firecrawl.dev/v1/scrape";

// Cached selectors to avoid repeated parsing and eliminate unwrap() calls
static TITLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("title").expect("title selector should be valid"));
static META_DESC_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("meta[name='description']").expect("meta description selector should be valid")
});
static OG_DESC_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("meta[property='og:description']")
        .expect("og:description selector should be valid")
});
static HEADING_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("h1, h2, h3, h4, h5, h6").expect("heading selector should be valid")
});
static VIEWPORT_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("meta[name='viewport']").expect("viewport selector should be valid")
});
static IMG_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("img").expect("img selector should be valid"));
static ANCHOR_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("a[href] selector should be valid"));
static CANONICAL_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("link[rel='canonical']").expect("canonical selector should be valid")
});
static OPEN_GRAPH_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("meta[property^='og:']").expect("open graph selector should be valid")
});
static STRUCTURED_DATA_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("script[type='application/ld+json'], [itemtype]")
        .expect("structured data selector should be valid")
});
static BODY_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("body").expect("body selector should be valid"));

/// Elements whose text never counts towards the visible word count
const INVISIBLE_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScrapeRequest<'a> {
    url: &'a str,
    formats: [&'static str; 1],
    only_main_content: bool,
}

#[derive(Debug, Deserialize)]
struct ScrapeResponse {
    success: bool,
    data: Option<ScrapeData>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScrapeData {
    raw_html: Option<String>,
    html: Option<String>,
    #[serde(default)]
    metadata: serde_json::Value,
}

/// How pages get fetched: through the hosted crawling API, or directly when
/// no API key is configured.
#[derive(Debug, Clone)]
enum CrawlMode {
    Api { endpoint: String, api_key: String },
    Direct,
}

pub struct CrawlClient {
    client: Client,
    mode: CrawlMode,
}

impl CrawlClient {
    pub fn new(client: Client, endpoint: impl Into<String>, api_key: Option<String>) -> Self {
        let mode = match api_key {
            Some(api_key) => CrawlMode::Api {
                endpoint: endpoint.into(),
                api_key,
            },
            None => CrawlMode::Direct,
        };

        Self { client, mode }
    }

    pub fn uses_api(&self) -> bool {
        matches!(self.mode, CrawlMode::Api { .. })
    }

    /// Crawls one URL. Never fails: any error becomes an unavailable result
    /// for that URL so the rest of the analysis can continue.
    pub async fn crawl(&self, url: &str) -> CrawlResult {
        match self.try_crawl(url).await {
            Ok(result) => {
                tracing::info!(url = %url, "Crawled page");
                result
            }
            Err(e) => {
                tracing::error!(url = %url, error = %e, "Failed to crawl page");
                CrawlResult::unavailable(url, e.to_string())
            }
        }
    }

    async fn try_crawl(&self, url: &str) -> Result<CrawlResult, ClientError> {
        let start = Instant::now();

        let fetched = match &self.mode {
            CrawlMode::Api { endpoint, api_key } => self.scrape(endpoint, api_key, url).await?,
            CrawlMode::Direct => self.fetch_direct(url).await?,
        };

        let elapsed = start.elapsed().as_secs_f64();

        let mut result = extract_page(url, &fetched.html);
        result.status_code = fetched.status_code;
        result.load_time_estimate = Some((elapsed * 100.0).round() / 100.0);

        if !result.has_title() {
            result.title = fetched.metadata_title;
        }
        if !result.has_meta_description() {
            result.meta_description = fetched.metadata_description;
        }

        Ok(result)
    }

    async fn scrape(
        &self,
        endpoint: &str,
        api_key: &str,
        url: &str,
    ) -> Result<FetchedPage, ClientError> {
        let response = self
            .client
            .post(endpoint)
            .bearer_auth(api_key)
            .json(&ScrapeRequest {
                url,
                formats: ["rawHtml"],
                only_main_content: false,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, error = %body, "Crawl API error");
            return Err(ClientError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let scrape: ScrapeResponse = response
            .json()
            .await
            .map_err(|e| ClientError::Parse(e.to_string()))?;

        if !scrape.success {
            return Err(ClientError::Api {
                status: status.as_u16(),
                body: scrape
                    .error
                    .unwrap_or_else(|| "crawl reported failure".to_string()),
            });
        }

        let data = scrape
            .data
            .ok_or_else(|| ClientError::Parse("crawl response has no data".to_string()))?;

        let status_code = data
            .metadata
            .get("statusCode")
            .and_then(|v| v.as_u64())
            .and_then(|v| u16::try_from(v).ok());

        if let Some(code) = status_code
            && code >= 400
        {
            return Err(ClientError::TargetStatus(code));
        }

        let metadata_title = metadata_string(&data.metadata, "title");
        let metadata_description = metadata_string(&data.metadata, "description");

        let html = data
            .raw_html
            .or(data.html)
            .ok_or_else(|| ClientError::Parse("crawl response has no HTML".to_string()))?;

        Ok(FetchedPage {
            html,
            status_code,
            metadata_title,
            metadata_description,
        })
    }

    async fn fetch_direct(&self, url: &str) -> Result<FetchedPage, ClientError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(ClientError::TargetStatus(status.as_u16()));
        }

        // Validate content type before attempting to parse as HTML
        if let Some(ct) = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
        {
            let ct_lower = ct.to_lowercase();
            if !ct_lower.contains("text/html") && !ct_lower.contains("application/xhtml") {
                tracing::warn!(
                    url = %url,
                    content_type = %ct,
                    "Non-HTML content type detected, parsing may fail"
                );
            }
        }

        let html = response.text().await?;

        Ok(FetchedPage {
            html,
            status_code: Some(status.as_u16()),
            metadata_title: None,
            metadata_description: None,
        })
    }
}

struct FetchedPage {
    html: String,
    status_code: Option<u16>,
    metadata_title: Option<String>,
    metadata_description: Option<String>,
}

/// The crawl API reports some metadata either as a string or a list of strings
fn metadata_string(metadata: &serde_json::Value, key: &str) -> Option<String> {
    match metadata.get(key)? {
        serde_json::Value::String(s) => Some(s.trim().to_string()),
        serde_json::Value::Array(items) => items
            .iter()
            .find_map(|item| item.as_str())
            .map(|s| s.trim().to_string()),
        _ => None,
    }
    .filter(|s| !s.is_empty())
}

/// Extracts SEO signals from an HTML document. The result is available,
/// with no status code or load time.
pub fn extract_page(url: &str, html: &str) -> CrawlResult {
    let document = Html::parse_document(html);
    let page_url = Url::parse(url).ok();

    let mut result = CrawlResult::available(url);
    result.title = extract_title(&document);
    result.meta_description = extract_meta_description(&document);
    result.word_count = Some(count_words(&document));
    result.heading_counts = Some(count_headings(&document));
    result.mobile_friendly = Some(document.select(&VIEWPORT_SELECTOR).next().is_some());
    result.has_ssl = page_url.as_ref().map(|u| u.scheme() == "https");
    result.image_count = Some(document.select(&IMG_SELECTOR).count() as u32);
    result.has_canonical = Some(document.select(&CANONICAL_SELECTOR).next().is_some());
    result.has_open_graph = Some(document.select(&OPEN_GRAPH_SELECTOR).next().is_some());
    result.has_structured_data = Some(
        document
            .select(&STRUCTURED_DATA_SELECTOR)
            .next()
            .is_some(),
    );

    if let Some(page_url) = &page_url {
        let (internal, external) = count_links(&document, page_url);
        result.internal_links = Some(internal);
        result.external_links = Some(external);
    }

    result
}

fn extract_title(document: &Html) -> Option<String> {
    document
        .select(&TITLE_SELECTOR)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|title| !title.is_empty())
}

fn extract_meta_description(document: &Html) -> Option<String> {
    document
        .select(&META_DESC_SELECTOR)
        .chain(document.select(&OG_DESC_SELECTOR))
        .filter_map(|el| el.value().attr("content"))
        .map(|s| s.trim().to_string())
        .find(|s| !s.is_empty())
}

fn count_headings(document: &Html) -> HeadingCounts {
    let mut counts = [0u32; 6];
    for element in document.select(&HEADING_SELECTOR) {
        let level = element
            .value()
            .name()
            .strip_prefix('h')
            .and_then(|n| n.parse::<usize>().ok());
        if let Some(level @ 1..=6) = level {
            counts[level - 1] += 1;
        }
    }
    HeadingCounts::from_levels(counts)
}

fn count_words(document: &Html) -> u32 {
    let root = document
        .select(&BODY_SELECTOR)
        .next()
        .unwrap_or_else(|| document.root_element());

    visible_text(root)
        .iter()
        .map(|text| text.split_whitespace().count() as u32)
        .sum()
}

fn visible_text(root: ElementRef<'_>) -> Vec<&str> {
    root.descendants()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            let hidden = node.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .is_some_and(|el| INVISIBLE_ELEMENTS.contains(&el.name()))
            });
            (!hidden).then_some(&**text)
        })
        .collect()
}

/// Counts http(s) anchors as internal (same host and port) or external
fn count_links(document: &Html, page_url: &Url) -> (u32, u32) {
    let mut internal = 0;
    let mut external = 0;

    for element in document.select(&ANCHOR_SELECTOR) {
        if let Some(href) = element.value().attr("href")
            && let Ok(absolute_url) = page_url.join(href)
            && matches!(absolute_url.scheme(), "http" | "https")
        {
            if absolute_url.host_str() == page_url.host_str()
                && absolute_url.port_or_known_default() == page_url.port_or_known_default()
            {
                internal += 1;
            } else {
                external += 1;
            }
        }
    }

    (internal, external)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_string_accepts_lists() {
        let metadata = serde_json::json!({
            "title": ["  First  ", "Second"],
            "description": "",
        });
        assert_eq!(
            metadata_string(&metadata, "title"),
            Some("First".to_string())
        );
        assert_eq!(metadata_string(&metadata, "description"), None);
        assert_eq!(metadata_string(&metadata, "missing"), None);
    }

    #[test]
    fn test_word_count_skips_scripts_and_styles() {
        let html = r#"<html><head><title>t</title></head><body>
            <p>one two three</p>
            <script>var a = "not counted at all";</script>
            <style>.x { color: red; }</style>
            <div>four <span>five</span></div>
        </body></html>"#;
        let page = extract_page("https://example.com/", html);
        assert_eq!(page.word_count, Some(5));
    }
}
