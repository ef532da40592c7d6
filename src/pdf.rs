//! PDF summary of a report, laid out as plain wrapped text on A4 pages
//! using the built-in Helvetica fonts.

use anyhow::{Context, Result, anyhow};
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference};
use std::fs;

use crate::models::{AnalysisReport, Signal};
use crate::reporter::ACTION_PLAN;

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 20.0;
const WRAP_COLUMNS: usize = 90;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Style {
    Title,
    Heading,
    Body,
}

impl Style {
    fn size(self) -> f32 {
        match self {
            Style::Title => 18.0,
            Style::Heading => 13.0,
            Style::Body => 10.0,
        }
    }

    /// Vertical advance in mm
    fn line_height(self) -> f32 {
        match self {
            Style::Title => 10.0,
            Style::Heading => 8.0,
            Style::Body => 5.0,
        }
    }
}

/// Lines of the summary, before wrapping and pagination
fn summary_lines(report: &AnalysisReport) -> Vec<(Style, String)> {
    let mut lines = vec![
        (Style::Title, "InsightHub SEO Report".to_string()),
        (Style::Body, format!("URL: {}", report.primary.url)),
        (Style::Body, format!("Generated: {}", report.timestamp)),
        (
            Style::Body,
            format!("SEO score: {} / 100 ({})", report.score, report.grade),
        ),
    ];

    lines.push((Style::Heading, "Page details".to_string()));
    let page = &report.primary;
    if let Some(reason) = page.unavailable_reason() {
        lines.push((Style::Body, format!("Crawl data unavailable: {}", reason)));
    } else {
        lines.push((
            Style::Body,
            format!("Title: {}", page.title.as_deref().unwrap_or("Missing")),
        ));
        lines.push((
            Style::Body,
            format!(
                "Meta description: {}",
                page.meta_description.as_deref().unwrap_or("Missing")
            ),
        ));
        for signal in [
            Signal::LoadTime,
            Signal::WordCount,
            Signal::Headings,
            Signal::MobileFriendly,
            Signal::Https,
        ] {
            let value = match signal {
                Signal::LoadTime => page.load_time_estimate,
                Signal::WordCount => page.word_count.map(f64::from),
                Signal::Headings => page.heading_counts.as_ref().map(|h| f64::from(h.total())),
                Signal::MobileFriendly => page.mobile_friendly.map(f64::from),
                _ => page.has_ssl.map(f64::from),
            };
            lines.push((
                Style::Body,
                format!("{}: {}", signal.label(), signal.format_value(value)),
            ));
        }
    }

    if !report.competitor_scores.is_empty() {
        lines.push((Style::Heading, "Competitors".to_string()));
        for competitor in &report.competitor_scores {
            let score = match (competitor.score, competitor.grade) {
                (Some(score), Some(grade)) => format!("{} / 100 ({})", score, grade),
                _ => "unavailable".to_string(),
            };
            lines.push((Style::Body, format!("{}: {}", competitor.url, score)));
        }
        for gap in &report.comparison.gaps {
            lines.push((
                Style::Body,
                format!(
                    "Gap - {}: ours {}, best {} ({})",
                    gap.signal.label(),
                    gap.signal.format_value(Some(gap.primary)),
                    gap.signal.format_value(Some(gap.best_competitor)),
                    gap.best_competitor_url
                ),
            ));
        }
    }

    if !report.keywords.is_empty() {
        lines.push((Style::Heading, "Keywords".to_string()));
        for keyword in &report.keywords {
            let count = keyword
                .result_count
                .map(|c| c.to_string())
                .unwrap_or_else(|| "unavailable".to_string());
            lines.push((
                Style::Body,
                format!(
                    "{}: {} results ({})",
                    keyword.keyword, count, keyword.trend_flag
                ),
            ));
        }
    }

    for (priority, heading) in ACTION_PLAN {
        let items: Vec<_> = report.recommendations_with(priority).collect();
        if items.is_empty() {
            continue;
        }
        lines.push((Style::Heading, heading.to_string()));
        for rec in items {
            lines.push((Style::Body, format!("- {} ({})", rec.text, rec.category)));
        }
    }

    if !report.notices.is_empty() {
        lines.push((Style::Heading, "Notices".to_string()));
        for notice in &report.notices {
            lines.push((Style::Body, notice.clone()));
        }
    }

    lines
}

/// Built-in PDF fonts only cover WinAnsi; anything outside ASCII is replaced.
fn to_ascii(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{2018}' | '\u{2019}' => '\'',
            '\u{201C}' | '\u{201D}' => '"',
            '\u{2013}' | '\u{2014}' => '-',
            c if c.is_ascii() && !c.is_ascii_control() => c,
            _ => '?',
        })
        .collect()
}

/// Greedy word wrap on character columns. Words longer than a line are
/// split on char boundaries.
pub fn wrap(text: &str, columns: usize) -> Vec<String> {
    let columns = columns.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0;

    for word in text.split_whitespace() {
        let mut word = word;
        let mut word_chars = word.chars().count();
        while word_chars > columns {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let split = word
                .char_indices()
                .nth(columns)
                .map_or(word.len(), |(index, _)| index);
            let (head, rest) = word.split_at(split);
            lines.push(head.to_string());
            word = rest;
            word_chars -= columns;
        }

        if current.is_empty() {
            current = word.to_string();
            current_chars = word_chars;
        } else if current_chars + 1 + word_chars <= columns {
            current.push(' ');
            current.push_str(word);
            current_chars += 1 + word_chars;
        } else {
            lines.push(std::mem::replace(&mut current, word.to_string()));
            current_chars = word_chars;
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

struct Writer {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    y: f32,
}

impl Writer {
    fn new(title: &str) -> Result<Self> {
        let (doc, page, layer) =
            PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| anyhow!("Failed to load PDF font: {:?}", e))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| anyhow!("Failed to load PDF font: {:?}", e))?;
        let layer = doc.get_page(page).get_layer(layer);

        Ok(Self {
            doc,
            layer,
            regular,
            bold,
            y: PAGE_HEIGHT - MARGIN,
        })
    }

    fn new_page(&mut self) {
        let (page, layer) = self
            .doc
            .add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = PAGE_HEIGHT - MARGIN;
    }

    fn line(&mut self, style: Style, text: &str) {
        if style == Style::Heading {
            self.y -= 3.0;
        }
        if self.y - style.line_height() < MARGIN {
            self.new_page();
        }
        self.y -= style.line_height();

        let font = if style == Style::Body {
            &self.regular
        } else {
            &self.bold
        };
        self.layer
            .use_text(text, style.size(), Mm(MARGIN), Mm(self.y), font);
    }

    fn finish(self) -> Result<Vec<u8>> {
        self.doc
            .save_to_bytes()
            .map_err(|e| anyhow!("Failed to render PDF: {:?}", e))
    }
}

/// Renders the report summary as PDF bytes
pub fn render(report: &AnalysisReport) -> Result<Vec<u8>> {
    let mut writer = Writer::new("InsightHub SEO Report")?;

    for (style, text) in summary_lines(report) {
        let columns = if style == Style::Body {
            WRAP_COLUMNS
        } else {
            WRAP_COLUMNS * 2 / 3
        };
        for line in wrap(&to_ascii(&text), columns) {
            writer.line(style, &line);
        }
    }

    writer.finish()
}

pub fn save(report: &AnalysisReport, filename: &str) -> Result<()> {
    let bytes = render(report)?;
    fs::write(filename, bytes).with_context(|| format!("Failed to write PDF: {}", filename))?;
    tracing::info!(file = %filename, "PDF summary written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap() {
        assert_eq!(
            wrap("the quick brown fox jumps", 10),
            vec!["the quick", "brown fox", "jumps"]
        );
        assert_eq!(wrap("abcdefghij klm", 4), vec!["abcd", "efgh", "ij", "klm"]);
        assert!(wrap("   ", 10).is_empty());
    }

    #[test]
    fn test_wrap_counts_chars_not_bytes() {
        assert_eq!(
            wrap("\u{e9}\u{e9}\u{e9}\u{e9}\u{e9} caf\u{e9}", 4),
            vec!["\u{e9}\u{e9}\u{e9}\u{e9}", "\u{e9}", "caf\u{e9}"]
        );
        assert_eq!(wrap("na\u{ef}ve caf\u{e9}", 10), vec!["na\u{ef}ve caf\u{e9}"]);
        assert_eq!(wrap("abc", 0), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_to_ascii() {
        assert_eq!(to_ascii("caf\u{e9} \u{201C}ok\u{201D}"), "caf? \"ok\"");
    }
}
