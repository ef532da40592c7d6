use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use url::Url;

use crate::error::InputError;

pub const MAX_COMPETITORS: usize = 5;

/// One user submission: the site to analyze, who to compare it with and
/// which keywords to research. Only constructed through [`AnalysisRequest::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    primary_url: String,
    competitor_urls: Vec<String>,
    keywords: Vec<String>,
}

impl AnalysisRequest {
    /// Validates and normalizes the raw form values.
    ///
    /// URLs without a scheme get `https://` prepended. Blank competitor
    /// entries are ignored. `keywords` is a comma-separated list; entries are
    /// trimmed and de-duplicated case-insensitively, keeping the first spelling.
    pub fn new(
        primary_url: &str,
        competitor_urls: &[String],
        keywords: &str,
    ) -> Result<Self, InputError> {
        let primary_url = normalize_url(primary_url)?;

        let competitor_urls = competitor_urls
            .iter()
            .map(|url| url.trim())
            .filter(|url| !url.is_empty())
            .map(normalize_url)
            .collect::<Result<Vec<_>, _>>()?;

        if competitor_urls.len() > MAX_COMPETITORS {
            return Err(InputError::TooManyCompetitors(competitor_urls.len()));
        }

        Ok(Self {
            primary_url,
            competitor_urls,
            keywords: parse_keywords(keywords),
        })
    }

    pub fn primary_url(&self) -> &str {
        &self.primary_url
    }

    pub fn competitor_urls(&self) -> &[String] {
        &self.competitor_urls
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }
}

/// Adds a missing scheme and checks that the result is an http(s) URL with a host.
pub fn normalize_url(raw: &str) -> Result<String, InputError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(InputError::EmptyUrl);
    }

    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let parsed = Url::parse(&candidate).map_err(|e| InputError::InvalidUrl {
        url: trimmed.to_string(),
        reason: e.to_string(),
    })?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(InputError::UnsupportedScheme(scheme.to_string())),
    }

    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(InputError::InvalidUrl {
            url: trimmed.to_string(),
            reason: "missing host".to_string(),
        });
    }

    Ok(parsed.to_string())
}

fn parse_keywords(raw: &str) -> Vec<String> {
    let mut keywords: Vec<String> = Vec::new();
    for keyword in raw.split(',').map(str::trim).filter(|k| !k.is_empty()) {
        if !keywords.iter().any(|k| k.eq_ignore_ascii_case(keyword)) {
            keywords.push(keyword.to_string());
        }
    }
    keywords
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CrawlStatus {
    Available,
    Unavailable { reason: String },
}

/// Heading counts keyed by level (1-6).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HeadingCounts(BTreeMap<u8, u32>);

impl HeadingCounts {
    pub fn from_levels(counts: [u32; 6]) -> Self {
        Self(
            counts
                .iter()
                .enumerate()
                .map(|(idx, count)| (idx as u8 + 1, *count))
                .collect(),
        )
    }

    pub fn count(&self, level: u8) -> u32 {
        self.0.get(&level).copied().unwrap_or(0)
    }

    pub fn h1(&self) -> u32 {
        self.count(1)
    }

    pub fn total(&self) -> u32 {
        self.0.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u8, u32)> + '_ {
        self.0.iter().map(|(level, count)| (*level, *count))
    }
}

/// Page metadata for one crawled URL.
///
/// Every metric is optional: `None` means "not known", which is different
/// from "known to be absent". A failed fetch keeps its entry with
/// [`CrawlStatus::Unavailable`] and no metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlResult {
    pub url: String,
    pub status: CrawlStatus,
    pub status_code: Option<u16>,
    pub title: Option<String>,
    pub meta_description: Option<String>,
    pub word_count: Option<u32>,
    pub heading_counts: Option<HeadingCounts>,
    /// Seconds
    pub load_time_estimate: Option<f64>,
    pub mobile_friendly: Option<bool>,
    pub has_ssl: Option<bool>,
    pub image_count: Option<u32>,
    pub internal_links: Option<u32>,
    pub external_links: Option<u32>,
    pub has_canonical: Option<bool>,
    pub has_open_graph: Option<bool>,
    pub has_structured_data: Option<bool>,
}

impl CrawlResult {
    /// An available result with no metrics filled in yet.
    pub fn available(url: impl Into<String>) -> Self {
        Self::with_status(url, CrawlStatus::Available)
    }

    pub fn unavailable(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::with_status(
            url,
            CrawlStatus::Unavailable {
                reason: reason.into(),
            },
        )
    }

    fn with_status(url: impl Into<String>, status: CrawlStatus) -> Self {
        Self {
            url: url.into(),
            status,
            status_code: None,
            title: None,
            meta_description: None,
            word_count: None,
            heading_counts: None,
            load_time_estimate: None,
            mobile_friendly: None,
            has_ssl: None,
            image_count: None,
            internal_links: None,
            external_links: None,
            has_canonical: None,
            has_open_graph: None,
            has_structured_data: None,
        }
    }

    pub fn is_available(&self) -> bool {
        self.status == CrawlStatus::Available
    }

    pub fn unavailable_reason(&self) -> Option<&str> {
        match &self.status {
            CrawlStatus::Available => None,
            CrawlStatus::Unavailable { reason } => Some(reason),
        }
    }

    pub fn has_title(&self) -> bool {
        self.title.as_deref().is_some_and(|t| !t.trim().is_empty())
    }

    pub fn has_meta_description(&self) -> bool {
        self.meta_description
            .as_deref()
            .is_some_and(|d| !d.trim().is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendFlag {
    Trending,
    Seasonal,
    Steady,
}

impl fmt::Display for TrendFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrendFlag::Trending => write!(f, "trending"),
            TrendFlag::Seasonal => write!(f, "seasonal"),
            TrendFlag::Steady => write!(f, "steady"),
        }
    }
}

/// Keyword research outcome. `result_count == None` marks the keyword as
/// unavailable and `error` says why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordResult {
    pub keyword: String,
    pub result_count: Option<u64>,
    pub trend_flag: TrendFlag,
    pub related: Vec<String>,
    pub error: Option<String>,
}

impl KeywordResult {
    pub fn is_available(&self) -> bool {
        self.result_count.is_some()
    }

    pub fn word_count(&self) -> usize {
        self.keyword.split_whitespace().count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordSummary {
    pub total_keywords: usize,
    pub available: usize,
    pub average_result_count: Option<f64>,
    pub max_result_count: Option<u64>,
    pub trending: usize,
    pub long_tail: usize,
    pub suggestions: Vec<String>,
}

/// Declared in urgency order so that sorting puts `High` first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::High => write!(f, "High"),
            Priority::Medium => write!(f, "Medium"),
            Priority::Low => write!(f, "Low"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    OnPage,
    Content,
    Performance,
    Mobile,
    Technical,
    Competitive,
    Keywords,
    General,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::OnPage => "On-page",
            Category::Content => "Content",
            Category::Performance => "Performance",
            Category::Mobile => "Mobile",
            Category::Technical => "Technical",
            Category::Competitive => "Competitive",
            Category::Keywords => "Keywords",
            Category::General => "General",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub text: String,
    pub priority: Priority,
    pub category: Category,
}

impl Recommendation {
    pub fn new(text: impl Into<String>, priority: Priority, category: Category) -> Self {
        Self {
            text: text.into(),
            priority,
            category,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationSource {
    Ai,
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl Grade {
    pub fn from_score(score: u8) -> Self {
        match score {
            86.. => Grade::Excellent,
            71..=85 => Grade::Good,
            51..=70 => Grade::Fair,
            _ => Grade::Poor,
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// A page attribute used for scoring and comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    LoadTime,
    Title,
    MetaDescription,
    WordCount,
    Headings,
    MobileFriendly,
    Https,
    Score,
}

impl Signal {
    pub const ALL: [Signal; 8] = [
        Signal::LoadTime,
        Signal::Title,
        Signal::MetaDescription,
        Signal::WordCount,
        Signal::Headings,
        Signal::MobileFriendly,
        Signal::Https,
        Signal::Score,
    ];

    pub fn higher_is_better(self) -> bool {
        !matches!(self, Signal::LoadTime)
    }

    pub fn is_flag(self) -> bool {
        matches!(
            self,
            Signal::Title | Signal::MetaDescription | Signal::MobileFriendly | Signal::Https
        )
    }

    pub fn label(self) -> &'static str {
        match self {
            Signal::LoadTime => "Load time",
            Signal::Title => "Title tag",
            Signal::MetaDescription => "Meta description",
            Signal::WordCount => "Word count",
            Signal::Headings => "Headings",
            Signal::MobileFriendly => "Mobile friendly",
            Signal::Https => "HTTPS",
            Signal::Score => "SEO score",
        }
    }

    /// Renders a raw signal value the way reports show it.
    pub fn format_value(self, value: Option<f64>) -> String {
        match value {
            None => "n/a".to_string(),
            Some(v) if self.is_flag() => (if v > 0.0 { "yes" } else { "no" }).to_string(),
            Some(v) if self == Signal::LoadTime => format!("{:.2}s", v),
            Some(v) => format!("{:.0}", v),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalDelta {
    pub signal: Signal,
    pub primary: Option<f64>,
    pub competitor: Option<f64>,
    /// `primary - competitor`, when both are known
    pub delta: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitorDelta {
    pub url: String,
    pub available: bool,
    pub deltas: Vec<SignalDelta>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gap {
    pub signal: Signal,
    pub primary: f64,
    pub best_competitor: f64,
    pub best_competitor_url: String,
    /// Relative shortfall in [0, 1], used for ranking
    pub shortfall: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub table: Vec<CompetitorDelta>,
    pub gaps: Vec<Gap>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitorScore {
    pub url: String,
    pub score: Option<u8>,
    pub grade: Option<Grade>,
}

/// Everything one analysis run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub request: AnalysisRequest,
    pub primary: CrawlResult,
    pub competitors: Vec<CrawlResult>,
    pub keywords: Vec<KeywordResult>,
    pub keyword_summary: Option<KeywordSummary>,
    pub score: u8,
    pub grade: Grade,
    pub competitor_scores: Vec<CompetitorScore>,
    pub comparison: Comparison,
    pub recommendations: Vec<Recommendation>,
    pub recommendation_source: RecommendationSource,
    pub notices: Vec<String>,
    pub timestamp: String,
}

impl AnalysisReport {
    pub fn recommendations_with(&self, priority: Priority) -> impl Iterator<Item = &Recommendation> {
        self.recommendations
            .iter()
            .filter(move |rec| rec.priority == priority)
    }
}
