//! Self-contained HTML dashboard for one report.
//!
//! The page needs no scripts or external assets: tabs are radio inputs
//! styled with CSS, and the score bar is a sized div. Markup lives in
//! `templates/dashboard.html`; askama escapes every interpolated value.

use anyhow::{Context, Result};
use askama::Template;
use std::fs;

use crate::models::{AnalysisReport, CrawlResult, Grade, RecommendationSource, Signal};
use crate::reporter::ACTION_PLAN;

#[derive(Template)]
#[template(path = "dashboard.html")]
struct DashboardTemplate<'a> {
    url: &'a str,
    timestamp: &'a str,
    notices: &'a [String],
    score: u8,
    grade: Grade,
    grade_class: &'static str,
    unavailable_reason: Option<&'a str>,
    page_rows: Vec<PageRow>,
    competitor_rows: Vec<CompetitorRow<'a>>,
    delta_sites: Vec<&'a str>,
    delta_rows: Vec<DeltaRow>,
    gap_rows: Vec<GapRow<'a>>,
    keyword_rows: Vec<KeywordRow<'a>>,
    suggestions: &'a [String],
    source_label: &'static str,
    action_groups: Vec<ActionGroup<'a>>,
}

struct PageRow {
    label: &'static str,
    value: String,
}

struct CompetitorRow<'a> {
    url: &'a str,
    available: bool,
    score: String,
    grade: String,
}

/// One signal across every competitor column
struct DeltaRow {
    label: &'static str,
    cells: Vec<String>,
}

struct GapRow<'a> {
    label: &'static str,
    primary: String,
    best: String,
    url: &'a str,
}

struct KeywordRow<'a> {
    keyword: &'a str,
    results: String,
    trend: String,
    related: String,
}

struct ActionGroup<'a> {
    class: String,
    heading: &'static str,
    items: Vec<ActionItem<'a>>,
}

struct ActionItem<'a> {
    text: &'a str,
    category: String,
}

impl<'a> DashboardTemplate<'a> {
    fn from_report(report: &'a AnalysisReport) -> Self {
        let primary = &report.primary;

        let competitor_rows = report
            .competitor_scores
            .iter()
            .map(|competitor| match (competitor.score, competitor.grade) {
                (Some(score), Some(grade)) => CompetitorRow {
                    url: &competitor.url,
                    available: true,
                    score: score.to_string(),
                    grade: grade.to_string(),
                },
                _ => CompetitorRow {
                    url: &competitor.url,
                    available: false,
                    score: String::new(),
                    grade: String::new(),
                },
            })
            .collect();

        let delta_rows = Signal::ALL
            .into_iter()
            .map(|signal| DeltaRow {
                label: signal.label(),
                cells: report
                    .comparison
                    .table
                    .iter()
                    .map(|row| {
                        row.deltas
                            .iter()
                            .find(|d| d.signal == signal)
                            .and_then(|d| d.delta)
                            .map(|delta| format!("{:+.2}", delta))
                            .unwrap_or_else(|| "n/a".to_string())
                    })
                    .collect(),
            })
            .collect();

        let gap_rows = report
            .comparison
            .gaps
            .iter()
            .map(|gap| GapRow {
                label: gap.signal.label(),
                primary: gap.signal.format_value(Some(gap.primary)),
                best: gap.signal.format_value(Some(gap.best_competitor)),
                url: &gap.best_competitor_url,
            })
            .collect();

        let keyword_rows = report
            .keywords
            .iter()
            .map(|keyword| KeywordRow {
                keyword: &keyword.keyword,
                results: match (keyword.result_count, &keyword.error) {
                    (Some(count), _) => count.to_string(),
                    (None, Some(error)) => format!("unavailable ({})", error),
                    (None, None) => "unavailable".to_string(),
                },
                trend: keyword.trend_flag.to_string(),
                related: keyword.related.join(", "),
            })
            .collect();

        let action_groups = ACTION_PLAN
            .into_iter()
            .map(|(priority, heading)| ActionGroup {
                class: priority.to_string().to_lowercase(),
                heading,
                items: report
                    .recommendations_with(priority)
                    .map(|rec| ActionItem {
                        text: &rec.text,
                        category: rec.category.to_string(),
                    })
                    .collect(),
            })
            .filter(|group| !group.items.is_empty())
            .collect();

        Self {
            url: &primary.url,
            timestamp: &report.timestamp,
            notices: &report.notices,
            score: report.score,
            grade: report.grade,
            grade_class: grade_class(report.grade),
            unavailable_reason: primary.unavailable_reason(),
            page_rows: page_rows(primary),
            competitor_rows,
            delta_sites: report
                .comparison
                .table
                .iter()
                .map(|row| row.url.as_str())
                .collect(),
            delta_rows,
            gap_rows,
            keyword_rows,
            suggestions: report
                .keyword_summary
                .as_ref()
                .map(|summary| summary.suggestions.as_slice())
                .unwrap_or_default(),
            source_label: match report.recommendation_source {
                RecommendationSource::Ai => "AI-assisted recommendations",
                RecommendationSource::Fallback => "Rule-based recommendations",
            },
            action_groups,
        }
    }
}

/// Renders the full HTML document
pub fn render(report: &AnalysisReport) -> Result<String> {
    DashboardTemplate::from_report(report)
        .render()
        .context("Failed to render HTML dashboard")
}

pub fn save(report: &AnalysisReport, filename: &str) -> Result<()> {
    fs::write(filename, render(report)?)
        .with_context(|| format!("Failed to write HTML dashboard: {}", filename))?;
    tracing::info!(file = %filename, "HTML dashboard written");
    Ok(())
}

fn page_rows(page: &CrawlResult) -> Vec<PageRow> {
    let text = |value: &Option<String>| {
        value
            .as_deref()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or("Missing")
            .to_string()
    };
    let flag = |value: Option<bool>| match value {
        Some(true) => "yes".to_string(),
        Some(false) => "no".to_string(),
        None => "unknown".to_string(),
    };
    let count = |value: Option<u32>| Signal::WordCount.format_value(value.map(f64::from));

    let headings = page
        .heading_counts
        .as_ref()
        .map(|h| {
            h.iter()
                .map(|(level, n)| format!("H{}: {}", level, n))
                .collect::<Vec<_>>()
                .join(", ")
        })
        .unwrap_or_else(|| "unknown".to_string());

    [
        ("Title", text(&page.title)),
        ("Meta description", text(&page.meta_description)),
        (
            "Load time",
            Signal::LoadTime.format_value(page.load_time_estimate),
        ),
        ("Word count", count(page.word_count)),
        ("Headings", headings),
        ("Mobile friendly", flag(page.mobile_friendly)),
        ("HTTPS", flag(page.has_ssl)),
        ("Images", count(page.image_count)),
        ("Internal links", count(page.internal_links)),
        ("External links", count(page.external_links)),
        ("Canonical URL", flag(page.has_canonical)),
        ("Open Graph", flag(page.has_open_graph)),
        ("Structured data", flag(page.has_structured_data)),
    ]
    .into_iter()
    .map(|(label, value)| PageRow { label, value })
    .collect()
}

fn grade_class(grade: Grade) -> &'static str {
    match grade {
        Grade::Excellent => "excellent",
        Grade::Good => "good",
        Grade::Fair => "fair",
        Grade::Poor => "poor",
    }
}
