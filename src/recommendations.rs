//! Turns report data into an ordered list of recommendations, either from
//! LLM output or from a fixed rule set when the LLM is unavailable.

use std::fmt::Write as _;

use crate::error::ClientError;
use crate::llm_client::LlmClient;
use crate::models::{
    Category, Comparison, CrawlResult, KeywordResult, Priority, Recommendation,
    RecommendationSource, Signal,
};

pub const MAX_RECOMMENDATIONS: usize = 12;

/// Lines shorter than this are headings or filler, not advice
const MIN_RECOMMENDATION_CHARS: usize = 30;
const DEDUP_PREFIX_CHARS: usize = 50;

const SYSTEM_PROMPT: &str = "You are an expert SEO consultant. Analyze the provided website data and \
give specific, actionable SEO recommendations. Focus on high-impact improvements that can be \
implemented quickly. Provide 8-12 recommendations as a bulleted list, one per line, and label \
each with its priority (High, Medium or Low).";

const HIGH_MARKERS: &[&str] = &[
    "critical",
    "urgent",
    "high priority",
    "high-priority",
    "priority: high",
    "(high)",
    "[high]",
    "high:",
    "immediately",
    "top priority",
];

const LOW_MARKERS: &[&str] = &[
    "low priority",
    "low-priority",
    "priority: low",
    "(low)",
    "[low]",
    "low:",
    "optional",
    "nice to have",
    "nice-to-have",
    "minor",
    "long-term",
    "long term",
];

const MEDIUM_MARKERS: &[&str] = &[
    "medium priority",
    "medium-priority",
    "priority: medium",
    "(medium)",
    "[medium]",
    "medium:",
];

/// Checked in order; the first category with a matching term wins.
const CATEGORY_TERMS: &[(Category, &[&str])] = &[
    (
        Category::Performance,
        &[
            "load time", "page speed", "speed", "performance", "cache", "caching", "compress",
            "minif", "lazy", "cdn",
        ],
    ),
    (Category::Mobile, &["mobile", "viewport", "responsive"]),
    (
        Category::OnPage,
        &[
            "title", "meta description", "meta tag", "heading", "h1", "open graph", "alt text",
        ],
    ),
    (
        Category::Technical,
        &[
            "https", "ssl", "canonical", "schema", "structured data", "sitemap", "robots",
            "redirect", "internal link", "broken link",
        ],
    ),
    (Category::Competitive, &["competitor", "competitive"]),
    (Category::Keywords, &["keyword"]),
    (Category::Content, &["content", "word", "blog", "article", "copy"]),
];

/// Report data the synthesizer works from.
pub struct SynthesisInput<'a> {
    pub primary: &'a CrawlResult,
    pub competitors: &'a [CrawlResult],
    pub keywords: &'a [KeywordResult],
    pub score: u8,
    pub comparison: &'a Comparison,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Synthesis {
    pub recommendations: Vec<Recommendation>,
    pub source: RecommendationSource,
    /// Set when AI analysis was wanted but could not be used
    pub notice: Option<String>,
}

/// Asks the LLM when one is configured, and falls back to the rule set on
/// any failure.
pub async fn synthesize(input: &SynthesisInput<'_>, llm: Option<&LlmClient>) -> Synthesis {
    let llm_result = match llm {
        Some(llm) => llm.complete(SYSTEM_PROMPT, &build_prompt(input)).await,
        None => Err(ClientError::MissingApiKey("AI analysis")),
    };

    synthesize_from(input, llm_result)
}

/// Pure half of [`synthesize`]: decides between AI and fallback output given
/// the LLM call's outcome.
pub fn synthesize_from(
    input: &SynthesisInput<'_>,
    llm_result: Result<String, ClientError>,
) -> Synthesis {
    let fallback_set = fallback(input);

    let failure = match llm_result {
        Ok(text) => {
            let parsed = parse_llm_text(&text);
            if !parsed.is_empty() {
                tracing::info!(count = parsed.len(), "Parsed AI recommendations");
                return Synthesis {
                    recommendations: merge(parsed, fallback_set),
                    source: RecommendationSource::Ai,
                    notice: None,
                };
            }
            "response contained no recommendations".to_string()
        }
        Err(e) => e.to_string(),
    };

    tracing::warn!(reason = %failure, "AI analysis unavailable, using rule-based recommendations");

    Synthesis {
        recommendations: fallback_set,
        source: RecommendationSource::Fallback,
        notice: Some(format!("AI analysis unavailable: {}", failure)),
    }
}

/// Deterministic user prompt embedding the report's numbers.
pub fn build_prompt(input: &SynthesisInput<'_>) -> String {
    let mut prompt = String::new();
    let page = input.primary;

    let _ = writeln!(
        prompt,
        "Analyze this website's SEO performance and provide specific recommendations."
    );
    let _ = writeln!(prompt);
    let _ = writeln!(prompt, "WEBSITE DATA:");
    let _ = writeln!(prompt, "- URL: {}", page.url);

    if let Some(reason) = page.unavailable_reason() {
        let _ = writeln!(prompt, "- Crawl status: unavailable ({})", reason);
    } else {
        let _ = writeln!(
            prompt,
            "- Title: {}",
            page.title.as_deref().unwrap_or("Missing")
        );
        let _ = writeln!(
            prompt,
            "- Meta Description: {}",
            page.meta_description.as_deref().unwrap_or("Missing")
        );
        let _ = writeln!(
            prompt,
            "- Page Load Time: {}",
            Signal::LoadTime.format_value(page.load_time_estimate)
        );
        let _ = writeln!(prompt, "- Word Count: {}", opt(page.word_count));
        let _ = writeln!(prompt, "- Mobile Friendly: {}", opt(page.mobile_friendly));
        let _ = writeln!(prompt, "- HTTPS: {}", opt(page.has_ssl));
        let _ = writeln!(prompt, "- Image Count: {}", opt(page.image_count));
        let _ = writeln!(prompt, "- Internal Links: {}", opt(page.internal_links));
        let _ = writeln!(prompt, "- External Links: {}", opt(page.external_links));
        let _ = writeln!(prompt, "- Has Canonical URL: {}", opt(page.has_canonical));
        let _ = writeln!(prompt, "- Has Open Graph: {}", opt(page.has_open_graph));
        let _ = writeln!(prompt, "- Has Schema Markup: {}", opt(page.has_structured_data));

        let _ = writeln!(prompt);
        let _ = writeln!(prompt, "HEADING STRUCTURE:");
        match &page.heading_counts {
            Some(headings) if headings.total() > 0 => {
                for (level, count) in headings.iter() {
                    let _ = writeln!(prompt, "- H{}: {} headings", level, count);
                }
            }
            _ => {
                let _ = writeln!(prompt, "- No heading structure detected");
            }
        }
    }

    let _ = writeln!(prompt);
    let _ = writeln!(prompt, "HEURISTIC SEO SCORE: {}/100", input.score);

    if !input.competitors.is_empty() {
        let _ = writeln!(prompt);
        let _ = writeln!(prompt, "COMPETITORS:");
        for (i, competitor) in input.competitors.iter().enumerate() {
            if let Some(reason) = competitor.unavailable_reason() {
                let _ = writeln!(
                    prompt,
                    "- Competitor {} ({}): unavailable ({})",
                    i + 1,
                    competitor.url,
                    reason
                );
            } else {
                let _ = writeln!(
                    prompt,
                    "- Competitor {} ({}): load time {}, {} words, mobile friendly {}",
                    i + 1,
                    competitor.url,
                    Signal::LoadTime.format_value(competitor.load_time_estimate),
                    opt(competitor.word_count),
                    opt(competitor.mobile_friendly)
                );
            }
        }

        if !input.comparison.gaps.is_empty() {
            let _ = writeln!(prompt, "Competitive gaps:");
            for gap in &input.comparison.gaps {
                let _ = writeln!(
                    prompt,
                    "- {}: ours {}, best competitor {} ({})",
                    gap.signal.label(),
                    gap.signal.format_value(Some(gap.primary)),
                    gap.signal.format_value(Some(gap.best_competitor)),
                    gap.best_competitor_url
                );
            }
        }
    }

    if !input.keywords.is_empty() {
        let _ = writeln!(prompt);
        let _ = writeln!(prompt, "TARGET KEYWORDS:");
        for keyword in input.keywords {
            let _ = writeln!(
                prompt,
                "- {}: {} search results ({})",
                keyword.keyword,
                keyword
                    .result_count
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "n/a".to_string()),
                keyword.trend_flag
            );
        }
    }

    let _ = writeln!(prompt);
    let _ = writeln!(prompt, "REQUIREMENTS:");
    let _ = writeln!(
        prompt,
        "1. Identify the most critical issues affecting SEO performance"
    );
    let _ = writeln!(
        prompt,
        "2. Give one specific, actionable recommendation per line, starting with an action verb"
    );
    let _ = writeln!(
        prompt,
        "3. Cover technical, content, on-page, mobile and performance concerns where relevant"
    );
    let _ = writeln!(
        prompt,
        "4. Label each recommendation with its priority: High, Medium or Low"
    );

    prompt
}

fn opt<T: ToString>(value: Option<T>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Splits LLM output into recommendations.
///
/// Section headings ("High priority:") set the default priority for the
/// items below them; an explicit marker on an item wins.
pub fn parse_llm_text(text: &str) -> Vec<Recommendation> {
    let mut section: Option<Priority> = None;
    let mut recommendations = Vec::new();

    for raw in text.lines() {
        let line = clean_line(raw);
        if line.is_empty() {
            continue;
        }

        let is_heading = raw.trim_start().starts_with('#') || line.ends_with(':');
        if is_heading || line.chars().count() < MIN_RECOMMENDATION_CHARS {
            if let Some(priority) = priority_marker(&line) {
                section = Some(priority);
            }
            continue;
        }

        let priority = priority_marker(&line)
            .or(section)
            .unwrap_or(Priority::Medium);
        recommendations.push(Recommendation::new(line.clone(), priority, classify_category(&line)));
    }

    recommendations
}

/// Strips list markers, numbering and markdown emphasis.
fn clean_line(raw: &str) -> String {
    let mut line = raw.trim().trim_start_matches('#').trim_start();

    for prefix in ["- ", "* ", "+ ", "• "] {
        if let Some(rest) = line.strip_prefix(prefix) {
            line = rest;
            break;
        }
    }

    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits > 0
        && let Some(rest) = line[digits..]
            .strip_prefix('.')
            .or_else(|| line[digits..].strip_prefix(')'))
    {
        line = rest;
    }

    line.replace("**", "")
        .replace("__", "")
        .replace('`', "")
        .trim()
        .to_string()
}

/// Explicit priority wording in a line, if any.
pub fn priority_marker(line: &str) -> Option<Priority> {
    let lower = line.to_lowercase();
    let has_any = |markers: &[&str]| markers.iter().any(|m| contains_marker(&lower, m));

    if has_any(HIGH_MARKERS) {
        Some(Priority::High)
    } else if has_any(LOW_MARKERS) {
        Some(Priority::Low)
    } else if has_any(MEDIUM_MARKERS) {
        Some(Priority::Medium)
    } else {
        None
    }
}

/// Marker must start at a word boundary ("flow:" is not "low:")
fn contains_marker(text: &str, marker: &str) -> bool {
    text.match_indices(marker).any(|(idx, _)| {
        text[..idx]
            .chars()
            .next_back()
            .is_none_or(|c| !c.is_alphanumeric())
    })
}

pub fn classify_priority(line: &str) -> Priority {
    priority_marker(line).unwrap_or(Priority::Medium)
}

pub fn classify_category(line: &str) -> Category {
    let lower = line.to_lowercase();
    CATEGORY_TERMS
        .iter()
        .find(|(_, terms)| terms.iter().any(|term| lower.contains(term)))
        .map(|(category, _)| *category)
        .unwrap_or(Category::General)
}

/// AI items first, then fallback items not already covered; de-duplicated
/// on the first 50 characters, ordered by priority and capped.
pub fn merge(ai: Vec<Recommendation>, fallback: Vec<Recommendation>) -> Vec<Recommendation> {
    let mut seen = Vec::new();
    let mut merged: Vec<Recommendation> = ai
        .into_iter()
        .chain(fallback)
        .filter(|rec| {
            let key: String = rec
                .text
                .to_lowercase()
                .chars()
                .take(DEDUP_PREFIX_CHARS)
                .collect();
            if seen.contains(&key) {
                false
            } else {
                seen.push(key);
                true
            }
        })
        .collect();

    merged.sort_by_key(|rec| rec.priority);
    merged.truncate(MAX_RECOMMENDATIONS);
    merged
}

/// Rule-based recommendations from threshold checks.
pub fn fallback(input: &SynthesisInput<'_>) -> Vec<Recommendation> {
    let mut recs = Vec::new();
    let page = input.primary;

    if let Some(reason) = page.unavailable_reason() {
        recs.push(Recommendation::new(
            format!(
                "Confirm that {} is reachable and re-run the analysis (crawl failed: {})",
                page.url, reason
            ),
            Priority::High,
            Category::General,
        ));
    } else {
        page_rules(page, &mut recs);

        if input.score <= 50 {
            recs.push(Recommendation::new(
                format!(
                    "Overall SEO score is {}/100: work through the high-priority items first, they carry the most weight",
                    input.score
                ),
                Priority::High,
                Category::General,
            ));
        }
    }

    competitive_rules(input.comparison, &mut recs);
    keyword_rules(input.keywords, &mut recs);

    if recs.is_empty() {
        recs.push(Recommendation::new(
            "No major issues detected: keep monitoring page speed and refresh content regularly",
            Priority::Low,
            Category::General,
        ));
    }

    recs.sort_by_key(|rec| rec.priority);
    recs.truncate(MAX_RECOMMENDATIONS);
    recs
}

fn page_rules(page: &CrawlResult, recs: &mut Vec<Recommendation>) {
    match page.title.as_deref().map(str::trim) {
        None | Some("") => recs.push(Recommendation::new(
            "Add a descriptive title tag containing your primary keyword (50-60 characters)",
            Priority::High,
            Category::OnPage,
        )),
        Some(title) if title.chars().count() > 60 => recs.push(Recommendation::new(
            "Shorten the title tag to under 60 characters so it is not truncated in search results",
            Priority::Medium,
            Category::OnPage,
        )),
        _ => {}
    }

    match page.meta_description.as_deref().map(str::trim) {
        None | Some("") => recs.push(Recommendation::new(
            "Add a compelling meta description (150-160 characters) to improve click-through rates",
            Priority::High,
            Category::OnPage,
        )),
        Some(desc) if desc.chars().count() > 160 => recs.push(Recommendation::new(
            "Shorten the meta description to under 160 characters for a clean search snippet",
            Priority::Medium,
            Category::OnPage,
        )),
        _ => {}
    }

    if page.mobile_friendly == Some(false) {
        recs.push(Recommendation::new(
            "Add a responsive viewport meta tag and optimize layouts for mobile-first indexing",
            Priority::High,
            Category::Mobile,
        ));
    }

    if page.has_ssl == Some(false) {
        recs.push(Recommendation::new(
            "Serve the site over HTTPS: it is a ranking signal and browsers flag plain HTTP pages",
            Priority::High,
            Category::Technical,
        ));
    }

    if let Some(load_time) = page.load_time_estimate {
        if load_time > 5.0 {
            recs.push(Recommendation::new(
                format!(
                    "Reduce page load time (currently {:.1}s, target under 3s) by compressing images and deferring scripts",
                    load_time
                ),
                Priority::High,
                Category::Performance,
            ));
        } else if load_time > 3.0 {
            recs.push(Recommendation::new(
                format!(
                    "Improve page load time (currently {:.1}s, target under 3s) with caching and asset compression",
                    load_time
                ),
                Priority::Medium,
                Category::Performance,
            ));
        }
    }

    match page.word_count {
        Some(words) if words < 300 => recs.push(Recommendation::new(
            format!(
                "Expand page content to at least 300 words (currently {}) to give search engines more to rank",
                words
            ),
            Priority::High,
            Category::Content,
        )),
        Some(words) if words > 1500 => recs.push(Recommendation::new(
            "Break long content into clearly headed sections or separate pages for readability",
            Priority::Low,
            Category::Content,
        )),
        _ => {}
    }

    if let Some(headings) = &page.heading_counts {
        if headings.h1() == 0 {
            recs.push(Recommendation::new(
                "Add a single H1 heading that states the page topic and includes the primary keyword",
                Priority::Medium,
                Category::OnPage,
            ));
        } else if headings.h1() > 1 {
            recs.push(Recommendation::new(
                format!(
                    "Use only one H1 heading per page (found {}) and demote the rest to H2",
                    headings.h1()
                ),
                Priority::Low,
                Category::OnPage,
            ));
        }
    }

    if page.internal_links.is_some_and(|links| links < 5) {
        recs.push(Recommendation::new(
            "Add more internal links to important pages to improve crawlability and link equity flow",
            Priority::Low,
            Category::Technical,
        ));
    }

    if page.has_canonical == Some(false) {
        recs.push(Recommendation::new(
            "Add a canonical link tag to prevent duplicate content issues",
            Priority::Low,
            Category::Technical,
        ));
    }

    if page.has_open_graph == Some(false) {
        recs.push(Recommendation::new(
            "Add Open Graph tags (og:title, og:description, og:image) for richer social previews",
            Priority::Low,
            Category::OnPage,
        ));
    }

    if page.has_structured_data == Some(false) {
        recs.push(Recommendation::new(
            "Add structured data (JSON-LD schema markup) to become eligible for rich results",
            Priority::Low,
            Category::Technical,
        ));
    }
}

fn competitive_rules(comparison: &Comparison, recs: &mut Vec<Recommendation>) {
    for gap in comparison.gaps.iter().take(3) {
        let priority = if gap.signal == Signal::LoadTime && gap.shortfall >= 0.5 {
            Priority::High
        } else {
            Priority::Medium
        };

        recs.push(Recommendation::new(
            format!(
                "Close the {} gap with {}: yours is {}, theirs is {}",
                gap.signal.label().to_lowercase(),
                gap.best_competitor_url,
                gap.signal.format_value(Some(gap.primary)),
                gap.signal.format_value(Some(gap.best_competitor))
            ),
            priority,
            Category::Competitive,
        ));
    }
}

fn keyword_rules(keywords: &[KeywordResult], recs: &mut Vec<Recommendation>) {
    let with_presence: Vec<&str> = keywords
        .iter()
        .filter(|k| k.result_count.is_some_and(|count| count > 0))
        .map(|k| k.keyword.as_str())
        .take(3)
        .collect();

    if !with_presence.is_empty() {
        recs.push(Recommendation::new(
            format!(
                "Target these keywords in the title, headings and body copy: {}",
                with_presence.join(", ")
            ),
            Priority::Medium,
            Category::Keywords,
        ));
    }

    let long_tail: Vec<&str> = keywords
        .iter()
        .filter(|k| k.word_count() >= 3)
        .map(|k| k.keyword.as_str())
        .collect();

    if !long_tail.is_empty() {
        recs.push(Recommendation::new(
            format!(
                "Create dedicated content pieces for long-tail keywords: {}",
                long_tail.join(", ")
            ),
            Priority::Low,
            Category::Keywords,
        ));
    }
}
