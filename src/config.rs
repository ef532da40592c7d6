use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::{Cli, DEFAULT_OUTPUT, DEFAULT_TIMEOUT_SECS};
use crate::crawl_client::DEFAULT_CRAWL_ENDPOINT;
use crate::keyword_client::{DEFAULT_KEYWORD_ENDPOINT, DEFAULT_KEYWORD_RESULTS};
use crate::llm_client::{DEFAULT_LLM_BASE_URL, DEFAULT_LLM_MODEL};
use crate::scoring::ScoringRules;

pub const CRAWL_API_KEY_VAR: &str = "FIRECRAWL_API_KEY";
pub const KEYWORD_API_KEY_VAR: &str = "EXA_API_KEY";
pub const LLM_API_KEY_VAR: &str = "GROQ_API_KEY";
pub const CRAWL_ENDPOINT_VAR: &str = "FIRECRAWL_API_URL";
pub const KEYWORD_ENDPOINT_VAR: &str = "EXA_API_URL";
pub const LLM_BASE_URL_VAR: &str = "GROQ_API_URL";
pub const LLM_MODEL_VAR: &str = "GROQ_MODEL";

/// Configuration file structure.
/// All fields are optional to allow partial configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Competitor URLs to compare against
    pub competitors: Option<Vec<String>>,

    /// Target keywords
    pub keywords: Option<Vec<String>>,

    /// Output format: text or json
    pub output: Option<String>,

    /// Save the JSON report to file
    pub save: Option<String>,

    /// Write the HTML dashboard to file
    pub html: Option<String>,

    /// Export a PDF summary to file
    pub pdf: Option<String>,

    /// Skip the LLM call
    pub no_ai: Option<bool>,

    /// HTTP timeout in seconds
    pub timeout: Option<u64>,

    /// Verbose output
    pub verbose: Option<bool>,

    /// Crawl API scrape endpoint
    pub crawl_endpoint: Option<String>,

    /// Keyword search API endpoint
    pub keyword_endpoint: Option<String>,

    /// Base URL of the OpenAI-compatible chat completion API
    pub llm_base_url: Option<String>,

    /// Chat model name
    pub llm_model: Option<String>,

    /// Number of search results requested per keyword
    pub keyword_results: Option<u32>,

    /// Score weight overrides
    pub scoring: Option<ScoringRules>,
}

/// Configuration file format based on file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
    Yaml,
}

impl ConfigFormat {
    /// Detect format from file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| match ext.to_lowercase().as_str() {
                "json" => Some(ConfigFormat::Json),
                "toml" => Some(ConfigFormat::Toml),
                "yaml" | "yml" => Some(ConfigFormat::Yaml),
                _ => None,
            })
    }

    /// Get file extensions for this format
    pub fn extensions(&self) -> &[&str] {
        match self {
            ConfigFormat::Json => &["json"],
            ConfigFormat::Toml => &["toml"],
            ConfigFormat::Yaml => &["yaml", "yml"],
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let format = ConfigFormat::from_path(path)
            .with_context(|| format!("Unsupported config file format: {}", path.display()))?;

        let config = match format {
            ConfigFormat::Json => serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))?,
            ConfigFormat::Toml => toml::from_str(&contents)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display()))?,
            ConfigFormat::Yaml => serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display()))?,
        };

        Ok(config)
    }

    /// Default configuration file paths, highest priority first:
    /// current directory, then the user config directory
    pub fn default_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        for format in &[ConfigFormat::Json, ConfigFormat::Toml, ConfigFormat::Yaml] {
            for ext in format.extensions() {
                paths.push(PathBuf::from(format!("insighthub.{}", ext)));
            }
        }

        // Use XDG_CONFIG_HOME if set, otherwise fall back to ~/.config
        let config_home = env::var("XDG_CONFIG_HOME")
            .ok()
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")));

        if let Some(config_home) = config_home {
            let app_config_dir = config_home.join("insighthub");
            for format in &[ConfigFormat::Json, ConfigFormat::Toml, ConfigFormat::Yaml] {
                for ext in format.extensions() {
                    paths.push(app_config_dir.join(format!("config.{}", ext)));
                }
            }
        }

        paths
    }

    /// Returns the first configuration file found, or None if no config exists
    pub fn from_default_paths() -> Result<Option<Self>> {
        for path in Self::default_paths() {
            if path.exists() {
                return Ok(Some(Self::from_file(&path)?));
            }
        }
        Ok(None)
    }

    /// Merge this configuration with CLI arguments.
    /// CLI arguments take precedence over config file values
    pub fn merge_with_cli(&self, cli: &Cli) -> Cli {
        Cli {
            url: cli.url.clone(),
            competitors: if cli.competitors.is_empty() {
                self.competitors.clone().unwrap_or_default()
            } else {
                cli.competitors.clone()
            },
            keywords: cli
                .keywords
                .clone()
                .or_else(|| self.keywords.as_ref().map(|k| k.join(","))),
            output: if cli.output != DEFAULT_OUTPUT {
                cli.output.clone()
            } else {
                self.output.clone().unwrap_or_else(|| cli.output.clone())
            },
            save: cli.save.clone().or_else(|| self.save.clone()),
            html: cli.html.clone().or_else(|| self.html.clone()),
            pdf: cli.pdf.clone().or_else(|| self.pdf.clone()),
            no_ai: cli.no_ai || self.no_ai.unwrap_or(false),
            timeout: if cli.timeout != DEFAULT_TIMEOUT_SECS {
                cli.timeout
            } else {
                self.timeout.unwrap_or(cli.timeout)
            },
            verbose: cli.verbose || self.verbose.unwrap_or(false),
            config: cli.config.clone(),
        }
    }
}

/// Endpoints, keys and tuning for the external services.
///
/// Keys come only from the environment (a `.env` file is honoured).
/// Endpoints and the model resolve as environment, then config file, then
/// built-in default.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiSettings {
    pub crawl_endpoint: String,
    pub crawl_api_key: Option<String>,
    pub keyword_endpoint: String,
    pub keyword_api_key: Option<String>,
    pub keyword_results: u32,
    pub llm_base_url: String,
    pub llm_api_key: Option<String>,
    pub llm_model: String,
    pub timeout_secs: u64,
    pub scoring: ScoringRules,
}

impl ApiSettings {
    pub fn resolve(config: &Config, timeout_secs: u64) -> Self {
        dotenvy::dotenv().ok();

        let pick = |var: &str, from_file: &Option<String>, default: &str| {
            env_var(var)
                .or_else(|| from_file.clone())
                .unwrap_or_else(|| default.to_string())
        };

        Self {
            crawl_endpoint: pick(
                CRAWL_ENDPOINT_VAR,
                &config.crawl_endpoint,
                DEFAULT_CRAWL_ENDPOINT,
            ),
            crawl_api_key: env_var(CRAWL_API_KEY_VAR),
            keyword_endpoint: pick(
                KEYWORD_ENDPOINT_VAR,
                &config.keyword_endpoint,
                DEFAULT_KEYWORD_ENDPOINT,
            ),
            keyword_api_key: env_var(KEYWORD_API_KEY_VAR),
            keyword_results: config.keyword_results.unwrap_or(DEFAULT_KEYWORD_RESULTS),
            llm_base_url: pick(LLM_BASE_URL_VAR, &config.llm_base_url, DEFAULT_LLM_BASE_URL),
            llm_api_key: env_var(LLM_API_KEY_VAR),
            llm_model: pick(LLM_MODEL_VAR, &config.llm_model, DEFAULT_LLM_MODEL),
            timeout_secs,
            scoring: config.scoring.clone().unwrap_or_default(),
        }
    }
}

/// Non-empty environment variable
fn env_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::NamedTempFile;

    fn default_cli() -> Cli {
        Cli {
            url: "https://example.com".to_string(),
            competitors: vec![],
            keywords: None,
            output: "text".to_string(),
            save: None,
            html: None,
            pdf: None,
            no_ai: false,
            timeout: 30,
            verbose: false,
            config: None,
        }
    }

    #[test]
    fn test_config_format_from_path() {
        assert_eq!(
            ConfigFormat::from_path(Path::new("config.json")),
            Some(ConfigFormat::Json)
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("config.toml")),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("config.yaml")),
            Some(ConfigFormat::Yaml)
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("config.YML")),
            Some(ConfigFormat::Yaml)
        );
        assert_eq!(ConfigFormat::from_path(Path::new("config.txt")), None);
    }

    #[test]
    fn test_load_json_config() {
        let json_content = r#"
{
    "competitors": ["https://a.example", "https://b.example"],
    "keywords": ["seo tools", "local marketing"],
    "output": "json",
    "timeout": 10,
    "llm_model": "mixtral-8x7b",
    "scoring": { "baseline": 40 }
}
        "#;

        let temp_file = NamedTempFile::new().unwrap();
        let temp_path = temp_file.path().with_extension("json");
        fs::write(&temp_path, json_content).unwrap();

        let config = Config::from_file(&temp_path).unwrap();
        assert_eq!(config.competitors.as_ref().map(Vec::len), Some(2));
        assert_eq!(
            config.keywords,
            Some(vec!["seo tools".to_string(), "local marketing".to_string()])
        );
        assert_eq!(config.output, Some("json".to_string()));
        assert_eq!(config.timeout, Some(10));
        assert_eq!(config.llm_model, Some("mixtral-8x7b".to_string()));

        let scoring = config.scoring.unwrap();
        assert_eq!(scoring.baseline, 40);
        // Unspecified weights keep their defaults
        assert_eq!(scoring.fast_load, ScoringRules::default().fast_load);

        fs::remove_file(temp_path).ok();
    }

    #[test]
    fn test_load_toml_config() {
        let toml_content = r#"
competitors = ["https://a.example"]
keywords = ["seo"]
no_ai = true
keyword_results = 10

[scoring]
title_missing = -20
        "#;

        let temp_file = NamedTempFile::new().unwrap();
        let temp_path = temp_file.path().with_extension("toml");
        fs::write(&temp_path, toml_content).unwrap();

        let config = Config::from_file(&temp_path).unwrap();
        assert_eq!(config.competitors, Some(vec!["https://a.example".to_string()]));
        assert_eq!(config.no_ai, Some(true));
        assert_eq!(config.keyword_results, Some(10));
        assert_eq!(config.scoring.unwrap().title_missing, -20);

        fs::remove_file(temp_path).ok();
    }

    #[test]
    fn test_load_yaml_config() {
        let yaml_content = r#"
output: "json"
verbose: true
crawl_endpoint: "http://localhost:9000/v1/scrape"
        "#;

        let temp_file = NamedTempFile::new().unwrap();
        let temp_path = temp_file.path().with_extension("yaml");
        fs::write(&temp_path, yaml_content).unwrap();

        let config = Config::from_file(&temp_path).unwrap();
        assert_eq!(config.output, Some("json".to_string()));
        assert_eq!(config.verbose, Some(true));
        assert_eq!(
            config.crawl_endpoint,
            Some("http://localhost:9000/v1/scrape".to_string())
        );

        fs::remove_file(temp_path).ok();
    }

    #[test]
    fn test_invalid_configs() {
        for (ext, content) in [
            ("json", "{ invalid json }"),
            ("toml", "[[[ invalid toml"),
            ("yaml", "output: \"test\n    verbose: invalid"),
            ("txt", "content"),
        ] {
            let temp_file = NamedTempFile::new().unwrap();
            let temp_path = temp_file.path().with_extension(ext);
            fs::write(&temp_path, content).unwrap();

            assert!(Config::from_file(&temp_path).is_err(), "{} should fail", ext);

            fs::remove_file(temp_path).ok();
        }
    }

    #[test]
    fn test_merge_with_cli_defaults() {
        let config = Config {
            competitors: Some(vec!["https://a.example".to_string()]),
            keywords: Some(vec!["seo".to_string(), "rust".to_string()]),
            output: Some("json".to_string()),
            timeout: Some(5),
            no_ai: Some(true),
            ..Default::default()
        };

        let merged = config.merge_with_cli(&default_cli());
        assert_eq!(merged.url, "https://example.com");
        assert_eq!(merged.competitors, vec!["https://a.example"]);
        assert_eq!(merged.keywords, Some("seo,rust".to_string()));
        assert_eq!(merged.output, "json");
        assert_eq!(merged.timeout, 5);
        assert!(merged.no_ai);
    }

    #[test]
    fn test_merge_with_cli_overrides() {
        let config = Config {
            competitors: Some(vec!["https://a.example".to_string()]),
            keywords: Some(vec!["seo".to_string()]),
            output: Some("json".to_string()),
            save: Some("config.json".to_string()),
            timeout: Some(5),
            ..Default::default()
        };

        let cli = Cli {
            competitors: vec!["https://b.example".to_string()],
            keywords: Some("rust".to_string()),
            output: "text-plain".to_string(),
            save: Some("cli.json".to_string()),
            timeout: 60,
            verbose: true,
            ..default_cli()
        };

        let merged = config.merge_with_cli(&cli);
        assert_eq!(merged.competitors, vec!["https://b.example"]);
        assert_eq!(merged.keywords, Some("rust".to_string()));
        assert_eq!(merged.output, "text-plain");
        assert_eq!(merged.save, Some("cli.json".to_string()));
        assert_eq!(merged.timeout, 60);
        assert!(merged.verbose);
    }

    #[test]
    fn test_default_paths_exists() {
        let paths = Config::default_paths();
        for name in ["insighthub.json", "insighthub.toml", "insighthub.yaml", "insighthub.yml"] {
            assert!(
                paths.iter().any(|p| p.to_string_lossy().contains(name)),
                "missing {}",
                name
            );
        }
    }

    #[test]
    #[serial]
    fn test_default_paths_with_xdg_config_home() {
        unsafe {
            env::set_var("XDG_CONFIG_HOME", "/custom/config/path");
        }

        let paths = Config::default_paths();
        assert!(
            paths
                .iter()
                .any(|p| p.to_string_lossy().contains("/custom/config/path/insighthub"))
        );

        unsafe {
            env::remove_var("XDG_CONFIG_HOME");
        }
    }

    #[test]
    #[serial]
    fn test_from_default_paths_priority_order() {
        use tempfile::tempdir;

        let temp_dir = tempdir().unwrap();
        let original_dir = env::current_dir().unwrap();
        env::set_current_dir(temp_dir.path()).unwrap();

        let temp_config_dir = tempdir().unwrap();
        let app_dir = temp_config_dir.path().join("insighthub");
        fs::create_dir_all(&app_dir).unwrap();
        unsafe {
            env::set_var("XDG_CONFIG_HOME", temp_config_dir.path());
        }

        fs::write(temp_dir.path().join("insighthub.json"), r#"{"timeout": 5}"#).unwrap();
        fs::write(app_dir.join("config.json"), r#"{"timeout": 20}"#).unwrap();

        let config = Config::from_default_paths().unwrap().unwrap();
        assert_eq!(config.timeout, Some(5));

        env::set_current_dir(&original_dir).ok();
        unsafe {
            env::remove_var("XDG_CONFIG_HOME");
        }
    }

    #[test]
    #[serial]
    fn test_from_default_paths_returns_none_when_no_config_exists() {
        use tempfile::tempdir;

        let temp_dir = tempdir().unwrap();
        let original_dir = env::current_dir().unwrap();
        env::set_current_dir(temp_dir.path()).unwrap();

        let temp_config_dir = tempdir().unwrap();
        unsafe {
            env::set_var("XDG_CONFIG_HOME", temp_config_dir.path());
        }

        let result = Config::from_default_paths();
        assert!(result.is_ok());
        assert!(result.unwrap().is_none());

        env::set_current_dir(&original_dir).ok();
        unsafe {
            env::remove_var("XDG_CONFIG_HOME");
        }
    }

    #[test]
    #[serial]
    fn test_api_settings_resolution_order() {
        use tempfile::tempdir;

        // Keep any real .env file out of the way
        let temp_dir = tempdir().unwrap();
        let original_dir = env::current_dir().unwrap();
        env::set_current_dir(temp_dir.path()).unwrap();

        unsafe {
            env::set_var(LLM_API_KEY_VAR, "gsk-test");
            env::set_var(LLM_MODEL_VAR, "env-model");
            env::set_var(CRAWL_API_KEY_VAR, "   ");
            env::remove_var(KEYWORD_API_KEY_VAR);
            env::remove_var(KEYWORD_ENDPOINT_VAR);
            env::remove_var(CRAWL_ENDPOINT_VAR);
            env::remove_var(LLM_BASE_URL_VAR);
        }

        let config = Config {
            llm_model: Some("file-model".to_string()),
            keyword_endpoint: Some("http://localhost:1/search".to_string()),
            ..Default::default()
        };

        let settings = ApiSettings::resolve(&config, 12);
        assert_eq!(settings.llm_api_key, Some("gsk-test".to_string()));
        assert_eq!(settings.llm_model, "env-model");
        assert_eq!(settings.crawl_api_key, None);
        assert_eq!(settings.keyword_api_key, None);
        assert_eq!(settings.keyword_endpoint, "http://localhost:1/search");
        assert_eq!(settings.crawl_endpoint, DEFAULT_CRAWL_ENDPOINT);
        assert_eq!(settings.llm_base_url, DEFAULT_LLM_BASE_URL);
        assert_eq!(settings.timeout_secs, 12);
        assert_eq!(settings.scoring, ScoringRules::default());

        unsafe {
            env::remove_var(LLM_API_KEY_VAR);
            env::remove_var(LLM_MODEL_VAR);
            env::remove_var(CRAWL_API_KEY_VAR);
        }
        env::set_current_dir(&original_dir).ok();
    }
}
