use clap::Parser;

pub const DEFAULT_OUTPUT: &str = "text";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Parser, Debug, Clone)]
#[command(name = "insighthub")]
#[command(
    about = "Crawl a website, research keywords, compare competitors and produce a scored SEO report",
    long_about = None
)]
pub struct Cli {
    /// The website URL to analyze (https:// is assumed when missing)
    #[arg(value_name = "URL")]
    pub url: String,

    /// Competitor URL to compare against; repeat or comma-separate (max 5)
    #[arg(short, long = "competitor", value_name = "URL", value_delimiter = ',')]
    pub competitors: Vec<String>,

    /// Target keywords, comma-separated
    #[arg(short, long)]
    pub keywords: Option<String>,

    /// Output format: text or json
    #[arg(short, long, default_value = DEFAULT_OUTPUT)]
    pub output: String,

    /// Save the JSON report to a file
    #[arg(short, long)]
    pub save: Option<String>,

    /// Write an HTML dashboard to a file
    #[arg(long)]
    pub html: Option<String>,

    /// Export a PDF summary to a file
    #[arg(long)]
    pub pdf: Option<String>,

    /// Skip the LLM call and use rule-based recommendations only
    #[arg(long)]
    pub no_ai: bool,

    /// HTTP timeout in seconds for each external call (default: 30)
    #[arg(short, long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Path to configuration file (JSON, TOML, or YAML)
    #[arg(long)]
    pub config: Option<String>,
}
