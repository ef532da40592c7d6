use crate::models::{CompetitorDelta, Comparison, CrawlResult, Gap, Signal, SignalDelta};
use crate::scoring::Scorer;

const EPSILON: f64 = 1e-9;

pub struct Comparator<'a> {
    scorer: &'a Scorer,
}

impl<'a> Comparator<'a> {
    pub fn new(scorer: &'a Scorer) -> Self {
        Self { scorer }
    }

    /// Builds the primary-vs-competitor delta table and the ranked gap list.
    pub fn compare(&self, primary: &CrawlResult, competitors: &[CrawlResult]) -> Comparison {
        let table = competitors
            .iter()
            .map(|competitor| CompetitorDelta {
                url: competitor.url.clone(),
                available: competitor.is_available(),
                deltas: Signal::ALL
                    .iter()
                    .map(|&signal| {
                        let primary_value = self.signal_value(primary, signal);
                        let competitor_value = self.signal_value(competitor, signal);
                        SignalDelta {
                            signal,
                            primary: primary_value,
                            competitor: competitor_value,
                            delta: primary_value.zip(competitor_value).map(|(p, c)| p - c),
                        }
                    })
                    .collect(),
            })
            .collect();

        let mut gaps: Vec<Gap> = Signal::ALL
            .iter()
            .filter_map(|&signal| self.find_gap(primary, competitors, signal))
            .collect();

        // Stable sort keeps Signal::ALL order among equal shortfalls
        gaps.sort_by(|a, b| b.shortfall.total_cmp(&a.shortfall));

        Comparison { table, gaps }
    }

    /// Numeric value of a signal, or `None` when the page doesn't tell us.
    /// Flags map to 1.0 / 0.0.
    pub fn signal_value(&self, page: &CrawlResult, signal: Signal) -> Option<f64> {
        if !page.is_available() {
            return None;
        }

        let flag = |value: bool| if value { 1.0 } else { 0.0 };

        match signal {
            Signal::LoadTime => page.load_time_estimate.filter(|secs| secs.is_finite()),
            Signal::Title => Some(flag(page.has_title())),
            Signal::MetaDescription => Some(flag(page.has_meta_description())),
            Signal::WordCount => page.word_count.map(f64::from),
            Signal::Headings => page.heading_counts.as_ref().map(|h| f64::from(h.total())),
            Signal::MobileFriendly => page.mobile_friendly.map(flag),
            Signal::Https => page.has_ssl.map(flag),
            Signal::Score => Some(f64::from(self.scorer.score(page))),
        }
    }

    fn find_gap(
        &self,
        primary: &CrawlResult,
        competitors: &[CrawlResult],
        signal: Signal,
    ) -> Option<Gap> {
        let primary_value = self.signal_value(primary, signal)?;

        let (best_url, best_value) = competitors
            .iter()
            .filter_map(|c| self.signal_value(c, signal).map(|v| (c.url.as_str(), v)))
            .reduce(|best, candidate| {
                if is_better(signal, candidate.1, best.1) {
                    candidate
                } else {
                    best
                }
            })?;

        // Ties go to the primary
        if !is_better(signal, best_value, primary_value) {
            return None;
        }

        let scale = best_value.abs().max(primary_value.abs()).max(1.0);
        Some(Gap {
            signal,
            primary: primary_value,
            best_competitor: best_value,
            best_competitor_url: best_url.to_string(),
            shortfall: ((best_value - primary_value).abs() / scale).min(1.0),
        })
    }
}

fn is_better(signal: Signal, candidate: f64, reference: f64) -> bool {
    if signal.higher_is_better() {
        candidate > reference + EPSILON
    } else {
        candidate < reference - EPSILON
    }
}
