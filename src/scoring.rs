use serde::{Deserialize, Serialize};

use crate::models::{CrawlResult, Grade, Signal};

/// Point deltas and thresholds for the SEO score.
///
/// The shipped values are tuning constants, not derived from any model.
/// A config file may override individual fields under `scoring`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringRules {
    pub baseline: i32,

    pub fast_load_secs: f64,
    pub fast_load: i32,
    pub acceptable_load_secs: f64,
    pub acceptable_load: i32,
    pub slow_load_secs: f64,
    pub slow_load: i32,
    pub very_slow_load: i32,

    pub title_present: i32,
    pub title_missing: i32,
    pub meta_present: i32,
    pub meta_missing: i32,

    pub rich_content_words: u32,
    pub rich_content: i32,
    pub min_content_words: u32,
    pub adequate_content: i32,
    pub thin_content: i32,

    pub h1_present: i32,
    pub no_headings: i32,

    pub mobile_friendly: i32,
    pub not_mobile_friendly: i32,

    pub https: i32,
    pub no_https: i32,
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self {
            baseline: 50,

            fast_load_secs: 2.0,
            fast_load: 10,
            acceptable_load_secs: 3.0,
            acceptable_load: 5,
            slow_load_secs: 5.0,
            slow_load: -5,
            very_slow_load: -10,

            title_present: 8,
            title_missing: -10,
            meta_present: 8,
            meta_missing: -8,

            rich_content_words: 800,
            rich_content: 10,
            min_content_words: 300,
            adequate_content: 5,
            thin_content: -10,

            h1_present: 6,
            no_headings: -4,

            mobile_friendly: 8,
            not_mobile_friendly: -10,

            https: 2,
            no_https: -4,
        }
    }
}

/// How much a single signal moved the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreContribution {
    pub signal: Signal,
    pub delta: i32,
}

#[derive(Debug, Clone, Default)]
pub struct Scorer {
    rules: ScoringRules,
}

impl Scorer {
    pub fn new(rules: ScoringRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &ScoringRules {
        &self.rules
    }

    /// Score in [0, 100]. Unknown signals contribute nothing, so an
    /// unavailable page scores exactly the baseline.
    pub fn score(&self, page: &CrawlResult) -> u8 {
        // Configured weights may sit at the i32 limits
        let total: i64 = self
            .breakdown(page)
            .iter()
            .map(|contribution| i64::from(contribution.delta))
            .sum();

        (i64::from(self.rules.baseline) + total).clamp(0, 100) as u8
    }

    pub fn grade(&self, page: &CrawlResult) -> Grade {
        Grade::from_score(self.score(page))
    }

    /// Per-signal contributions, in [`Signal::ALL`] order. Signals with no
    /// data are left out.
    pub fn breakdown(&self, page: &CrawlResult) -> Vec<ScoreContribution> {
        if !page.is_available() {
            return Vec::new();
        }

        let rules = &self.rules;
        let mut contributions = Vec::new();
        let mut push = |signal: Signal, delta: i32| {
            contributions.push(ScoreContribution { signal, delta });
        };

        if let Some(load_time) = page.load_time_estimate {
            push(Signal::LoadTime, self.load_time_delta(load_time));
        }

        push(
            Signal::Title,
            if page.has_title() {
                rules.title_present
            } else {
                rules.title_missing
            },
        );

        push(
            Signal::MetaDescription,
            if page.has_meta_description() {
                rules.meta_present
            } else {
                rules.meta_missing
            },
        );

        if let Some(words) = page.word_count {
            let delta = if words >= rules.rich_content_words {
                rules.rich_content
            } else if words >= rules.min_content_words {
                rules.adequate_content
            } else {
                rules.thin_content
            };
            push(Signal::WordCount, delta);
        }

        if let Some(headings) = &page.heading_counts {
            let delta = if headings.h1() > 0 {
                rules.h1_present
            } else if headings.total() == 0 {
                rules.no_headings
            } else {
                0
            };
            push(Signal::Headings, delta);
        }

        if let Some(mobile) = page.mobile_friendly {
            push(
                Signal::MobileFriendly,
                if mobile {
                    rules.mobile_friendly
                } else {
                    rules.not_mobile_friendly
                },
            );
        }

        if let Some(ssl) = page.has_ssl {
            push(Signal::Https, if ssl { rules.https } else { rules.no_https });
        }

        contributions
    }

    fn load_time_delta(&self, secs: f64) -> i32 {
        let rules = &self.rules;
        if !secs.is_finite() || secs < 0.0 {
            0
        } else if secs <= rules.fast_load_secs {
            rules.fast_load
        } else if secs <= rules.acceptable_load_secs {
            rules.acceptable_load
        } else if secs <= rules.slow_load_secs {
            rules.slow_load
        } else {
            rules.very_slow_load
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HeadingCounts;

    #[test]
    fn test_negative_load_time_is_ignored() {
        let mut page = CrawlResult::available("https://example.com/");
        page.title = Some("Title".to_string());
        page.meta_description = Some("Description".to_string());
        let without = Scorer::default().score(&page);

        page.load_time_estimate = Some(-1.0);
        assert_eq!(Scorer::default().score(&page), without);

        page.load_time_estimate = Some(f64::NAN);
        assert_eq!(Scorer::default().score(&page), without);
    }

    #[test]
    fn test_headings_without_h1_are_neutral() {
        let mut page = CrawlResult::available("https://example.com/");
        page.heading_counts = Some(HeadingCounts::from_levels([0, 3, 1, 0, 0, 0]));

        let headings = Scorer::default()
            .breakdown(&page)
            .into_iter()
            .find(|c| c.signal == Signal::Headings)
            .expect("headings contribution");
        assert_eq!(headings.delta, 0);
    }
}
