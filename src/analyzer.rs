use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};

use crate::comparator::Comparator;
use crate::config::ApiSettings;
use crate::crawl_client::CrawlClient;
use crate::http_client::build_http_client;
use crate::keyword_client::{self, KeywordClient};
use crate::llm_client::LlmClient;
use crate::models::{
    AnalysisReport, AnalysisRequest, CompetitorScore, CrawlResult, RecommendationSource,
};
use crate::recommendations::{self, Synthesis, SynthesisInput};
use crate::scoring::Scorer;

/// Added when load times come from the crawl API round trip
pub const API_LOAD_TIME_NOTICE: &str =
    "Load times were measured through the crawl API and include its rendering time";

/// Runs one analysis end to end: crawl, keyword research, scoring,
/// comparison and recommendations.
///
/// External calls are made one after another. A failing call never aborts
/// the run; its result is marked unavailable and the report notes it.
pub struct Analyzer {
    crawl_client: CrawlClient,
    keyword_client: KeywordClient,
    llm_client: Option<LlmClient>,
    use_ai: bool,
    scorer: Scorer,
    progress_bar: Option<ProgressBar>,
}

impl Analyzer {
    /// Builds all clients from resolved settings. With `use_ai` off the LLM
    /// is never called and no notice is added for it.
    pub fn new(settings: &ApiSettings, use_ai: bool) -> Result<Self> {
        let http_client = build_http_client(settings.timeout_secs)?;

        let crawl_client = CrawlClient::new(
            http_client.clone(),
            &settings.crawl_endpoint,
            settings.crawl_api_key.clone(),
        );

        let keyword_client = KeywordClient::new(
            http_client.clone(),
            &settings.keyword_endpoint,
            settings.keyword_api_key.clone(),
            settings.keyword_results,
        );

        let llm_client = match (&settings.llm_api_key, use_ai) {
            (Some(api_key), true) => Some(
                LlmClient::new(http_client, api_key.as_str())
                    .with_base_url(&settings.llm_base_url)
                    .with_model(&settings.llm_model),
            ),
            _ => None,
        };

        let mut analyzer = Self::from_parts(
            crawl_client,
            keyword_client,
            llm_client,
            Scorer::new(settings.scoring.clone()),
        );
        analyzer.use_ai = use_ai;
        Ok(analyzer)
    }

    pub fn from_parts(
        crawl_client: CrawlClient,
        keyword_client: KeywordClient,
        llm_client: Option<LlmClient>,
        scorer: Scorer,
    ) -> Self {
        Self {
            crawl_client,
            keyword_client,
            llm_client,
            use_ai: true,
            scorer,
            progress_bar: None,
        }
    }

    /// Enable a spinner showing the current step
    pub fn enable_progress_bar(&mut self) {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) =
            ProgressStyle::default_spinner().template("[{elapsed_precise}] {spinner:.cyan} {msg}")
        {
            pb.set_style(style);
        }
        pb.enable_steady_tick(std::time::Duration::from_millis(120));
        self.progress_bar = Some(pb);
    }

    fn step(&self, message: String) {
        if let Some(pb) = &self.progress_bar {
            pb.set_message(message);
        }
    }

    pub async fn analyze(&self, request: &AnalysisRequest) -> AnalysisReport {
        let mut notices = Vec::new();

        if !self.crawl_client.uses_api() {
            notices.push(
                "No crawl API key configured: pages were fetched directly".to_string(),
            );
        }

        self.step(format!("Crawling {}", request.primary_url()));
        let primary = self.crawl_client.crawl(request.primary_url()).await;

        let mut competitors: Vec<CrawlResult> = Vec::with_capacity(request.competitor_urls().len());
        for url in request.competitor_urls() {
            self.step(format!("Crawling competitor {}", url));
            competitors.push(self.crawl_client.crawl(url).await);
        }

        let (keywords, keyword_summary) = if request.keywords().is_empty() {
            (Vec::new(), None)
        } else {
            self.step("Researching keywords".to_string());
            if !self.keyword_client.has_api_key() {
                notices.push(
                    "No keyword API key configured: keyword volumes are unavailable".to_string(),
                );
            }
            let results = self.keyword_client.fetch(request.keywords()).await;
            let summary = keyword_client::summarize(&results);
            (results, Some(summary))
        };

        let api_timed = std::iter::once(&primary)
            .chain(competitors.iter())
            .any(|page| page.load_time_estimate.is_some());
        if self.crawl_client.uses_api() && api_timed {
            notices.push(API_LOAD_TIME_NOTICE.to_string());
        }

        self.step("Scoring".to_string());
        let score = self.scorer.score(&primary);
        let grade = self.scorer.grade(&primary);

        let competitor_scores = competitors
            .iter()
            .map(|page| {
                let available = page.is_available();
                CompetitorScore {
                    url: page.url.clone(),
                    score: available.then(|| self.scorer.score(page)),
                    grade: available.then(|| self.scorer.grade(page)),
                }
            })
            .collect();

        let comparison = Comparator::new(&self.scorer).compare(&primary, &competitors);

        self.step("Generating recommendations".to_string());
        let input = SynthesisInput {
            primary: &primary,
            competitors: &competitors,
            keywords: &keywords,
            score,
            comparison: &comparison,
        };
        let synthesis = if self.use_ai {
            recommendations::synthesize(&input, self.llm_client.as_ref()).await
        } else {
            Synthesis {
                recommendations: recommendations::fallback(&input),
                source: RecommendationSource::Fallback,
                notice: None,
            }
        };
        if let Some(notice) = synthesis.notice {
            notices.push(notice);
        }

        for page in std::iter::once(&primary).chain(competitors.iter()) {
            if let Some(reason) = page.unavailable_reason() {
                notices.push(format!("Crawl data unavailable for {}: {}", page.url, reason));
            }
        }

        if let Some(pb) = &self.progress_bar {
            pb.finish_and_clear();
        }

        tracing::info!(
            url = %request.primary_url(),
            score,
            competitors = competitors.len(),
            recommendations = synthesis.recommendations.len(),
            "Analysis complete"
        );

        AnalysisReport {
            request: request.clone(),
            primary,
            competitors,
            keywords,
            keyword_summary,
            score,
            grade,
            competitor_scores,
            comparison,
            recommendations: synthesis.recommendations,
            recommendation_source: synthesis.source,
            notices,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
