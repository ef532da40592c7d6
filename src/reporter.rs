use crate::models::{
    AnalysisReport, CrawlResult, Grade, Priority, RecommendationSource, Signal,
};
use anyhow::{Context, Result};
use colored::*;
use std::fs::File;
use std::io::Write;

/// Action plan buckets, in display order
pub const ACTION_PLAN: [(Priority, &str); 3] = [
    (Priority::High, "Immediate Actions"),
    (Priority::Medium, "Short-term Goals"),
    (Priority::Low, "Long-term Strategy"),
];

pub struct Reporter;

impl Reporter {
    pub fn print_text_report(report: &AnalysisReport) {
        println!("\n{}", "=".repeat(80).bright_blue());
        println!("{}", "InsightHub - SEO Report".bright_cyan().bold());
        println!("{}", "=".repeat(80).bright_blue());
        println!();

        println!("{}: {}", "URL".bright_white().bold(), report.primary.url);
        println!("{}: {}", "Timestamp".bright_white().bold(), report.timestamp);
        println!();

        // Score
        println!("{}", "SEO Score".bright_yellow().bold().underline());
        println!(
            "  Score: {} / 100 ({})",
            colored_score(report.score),
            colored_grade(report.grade)
        );
        println!();

        Self::print_page_details(&report.primary);

        if !report.competitors.is_empty() {
            Self::print_competitors(report);
        }

        if !report.keywords.is_empty() {
            Self::print_keywords(report);
        }

        Self::print_action_plan(report);

        if !report.notices.is_empty() {
            println!("{}", "Notices".bright_yellow().bold().underline());
            for notice in &report.notices {
                println!("  {} {}", "!".yellow(), notice);
            }
            println!();
        }

        println!("{}", "=".repeat(80).bright_blue());
    }

    fn print_page_details(page: &CrawlResult) {
        println!("{}", "Page Details".bright_yellow().bold().underline());

        if let Some(reason) = page.unavailable_reason() {
            println!("  {} {}", "Unavailable:".bright_red().bold(), reason);
            println!();
            return;
        }

        println!(
            "  Status:           {}",
            page.status_code
                .map(|code| code.to_string().bright_green())
                .unwrap_or_else(|| "N/A".dimmed())
        );
        println!(
            "  Title:            {}",
            page.title
                .as_deref()
                .filter(|t| !t.trim().is_empty())
                .map(|t| t.bright_white())
                .unwrap_or_else(|| "Missing".bright_red())
        );
        println!(
            "  Meta Description: {}",
            page.meta_description
                .as_deref()
                .filter(|d| !d.trim().is_empty())
                .map(|d| d.normal())
                .unwrap_or_else(|| "Missing".bright_red())
        );
        println!(
            "  Load Time:        {}",
            Signal::LoadTime.format_value(page.load_time_estimate)
        );
        println!(
            "  Word Count:       {}",
            Signal::WordCount.format_value(page.word_count.map(f64::from))
        );
        println!(
            "  Mobile Friendly:  {}",
            flag(page.mobile_friendly)
        );
        println!("  HTTPS:            {}", flag(page.has_ssl));

        if let Some(headings) = &page.heading_counts {
            let summary: Vec<String> = headings
                .iter()
                .filter(|(_, count)| *count > 0)
                .map(|(level, count)| format!("H{}: {}", level, count))
                .collect();
            println!(
                "  Headings:         {}",
                if summary.is_empty() {
                    "none".to_string()
                } else {
                    summary.join(", ")
                }
            );
        }

        if let (Some(internal), Some(external)) = (page.internal_links, page.external_links) {
            println!(
                "  Links:            {} internal, {} external",
                internal, external
            );
        }
        println!();
    }

    fn print_competitors(report: &AnalysisReport) {
        println!("{}", "Competitors".bright_yellow().bold().underline());

        for (page, score) in report.competitors.iter().zip(&report.competitor_scores) {
            match (score.score, score.grade) {
                (Some(value), Some(grade)) => println!(
                    "  {} {} / 100 ({})",
                    page.url.bright_white(),
                    colored_score(value),
                    colored_grade(grade)
                ),
                _ => println!(
                    "  {} {}",
                    page.url.bright_white(),
                    format!(
                        "unavailable: {}",
                        page.unavailable_reason().unwrap_or("unknown error")
                    )
                    .bright_red()
                ),
            }
        }
        println!();

        if report.comparison.gaps.is_empty() {
            println!("  {}", "No competitive gaps found".bright_green());
        } else {
            println!("  {}", "Gaps".bright_white().bold());
            for gap in &report.comparison.gaps {
                println!(
                    "    {:<18} ours {:<8} best {:<8} ({})",
                    gap.signal.label(),
                    gap.signal.format_value(Some(gap.primary)),
                    gap.signal.format_value(Some(gap.best_competitor)),
                    gap.best_competitor_url.dimmed()
                );
            }
        }
        println!();
    }

    fn print_keywords(report: &AnalysisReport) {
        println!("{}", "Keywords".bright_yellow().bold().underline());

        for keyword in &report.keywords {
            let count = match keyword.result_count {
                Some(count) => count.to_string().bright_green(),
                None => "unavailable".bright_red(),
            };
            println!(
                "  {:<30} {} results ({})",
                keyword.keyword, count, keyword.trend_flag
            );
        }

        if let Some(summary) = &report.keyword_summary {
            if let Some(average) = summary.average_result_count {
                println!("  Average results:  {:.1}", average);
            }
            if !summary.suggestions.is_empty() {
                println!("  Suggestions:      {}", summary.suggestions.join(", "));
            }
        }
        println!();
    }

    fn print_action_plan(report: &AnalysisReport) {
        let source = match report.recommendation_source {
            RecommendationSource::Ai => "AI-assisted",
            RecommendationSource::Fallback => "rule-based",
        };
        println!(
            "{} {}",
            "Action Plan".bright_yellow().bold().underline(),
            format!("({})", source).dimmed()
        );

        for (priority, heading) in ACTION_PLAN {
            let items: Vec<_> = report.recommendations_with(priority).collect();
            if items.is_empty() {
                continue;
            }

            println!();
            println!("  {}", heading.bright_white().bold());
            for rec in items {
                println!(
                    "    [{}] {} {}",
                    colored_priority(priority),
                    rec.text,
                    format!("({})", rec.category).dimmed()
                );
            }
        }
        println!();
    }

    pub fn to_json(report: &AnalysisReport) -> Result<String> {
        Ok(serde_json::to_string_pretty(report)?)
    }

    pub fn save_json_report(report: &AnalysisReport, filename: &str) -> Result<()> {
        let json = Self::to_json(report)?;
        let mut file = File::create(filename)
            .with_context(|| format!("Failed to create report file: {}", filename))?;
        file.write_all(json.as_bytes())?;
        tracing::info!(file = %filename, "JSON report written");
        Ok(())
    }
}

fn colored_score(score: u8) -> ColoredString {
    colored_grade_text(score.to_string(), Grade::from_score(score))
}

fn colored_grade(grade: Grade) -> ColoredString {
    colored_grade_text(grade.to_string(), grade)
}

fn colored_grade_text(text: String, grade: Grade) -> ColoredString {
    match grade {
        Grade::Excellent => text.bright_green().bold(),
        Grade::Good => text.green(),
        Grade::Fair => text.yellow(),
        Grade::Poor => text.bright_red(),
    }
}

fn colored_priority(priority: Priority) -> ColoredString {
    match priority {
        Priority::High => "HIGH".bright_red(),
        Priority::Medium => "MED ".yellow(),
        Priority::Low => "LOW ".bright_cyan(),
    }
}

fn flag(value: Option<bool>) -> ColoredString {
    match value {
        Some(true) => "yes".bright_green(),
        Some(false) => "no".bright_red(),
        None => "unknown".dimmed(),
    }
}
