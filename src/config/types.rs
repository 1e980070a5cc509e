use serde::{Deserialize, Serialize};

/// Main configuration structure for Contact-Miner
///
/// Every section and key has a default, so an empty TOML file is a valid
/// configuration. Command-line flags are layered on top by the binary.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub input: InputConfig,
    pub output: OutputConfig,
    pub fetch: FetchConfig,
    pub discovery: DiscoveryConfig,
    pub scrape: ScrapeConfig,
    pub runner: RunnerConfig,
    pub checkpoint: CheckpointConfig,
}

/// Input table configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct InputConfig {
    /// Path to the input CSV file
    pub path: String,

    /// Column holding the target URL or bare host
    pub url_column: String,

    /// Optional column holding the display name
    pub name_column: Option<String>,

    /// Only process the first N valid rows (dry runs)
    pub limit: Option<usize>,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            path: String::new(),
            url_column: "website".to_string(),
            name_column: Some("name".to_string()),
            limit: None,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Directory receiving the partitions, analytics and checkpoint
    pub directory: String,

    /// Serializations written for every partition
    pub formats: Vec<OutputFormat>,

    /// How multiple emails of one target are laid out in rows
    pub email_output: EmailCardinality,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: "output".to_string(),
            formats: vec![OutputFormat::Csv, OutputFormat::Sqlite],
            email_output: EmailCardinality::AllInOne,
        }
    }
}

/// HTTP fetch configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct FetchConfig {
    /// Per-request timeout for the retrying fetcher (seconds)
    pub timeout_secs: u64,

    /// Connection establishment timeout (seconds)
    pub connect_timeout_secs: u64,

    /// Total attempts per URL for transient failures
    pub max_attempts: u32,

    /// First backoff delay; doubled after every failed attempt (milliseconds)
    pub backoff_base_ms: u64,

    /// Lower bound of the random pre-request delay (milliseconds)
    pub jitter_min_ms: u64,

    /// Upper bound of the random pre-request delay (milliseconds)
    pub jitter_max_ms: u64,

    /// Per-attempt timeouts of the pooled fetcher (seconds)
    pub progressive_timeouts_secs: Vec<u64>,

    /// Classify near-empty HTML responses as dynamic
    pub detect_dynamic: bool,

    /// Visible text length below which a page counts as dynamic
    pub dynamic_text_threshold: usize,

    /// Idle keep-alive connections kept per host by the pooled client
    pub max_idle_per_host: usize,

    /// User-Agent header sent with every request
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            connect_timeout_secs: 5,
            max_attempts: 3,
            backoff_base_ms: 500,
            jitter_min_ms: 100,
            jitter_max_ms: 500,
            progressive_timeouts_secs: vec![3, 5, 10],
            detect_dynamic: false,
            dynamic_text_threshold: 200,
            max_idle_per_host: 4,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/120.0 Safari/537.36"
                .to_string(),
        }
    }
}

/// Page discovery configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct DiscoveryConfig {
    /// Maximum candidate pages fetched per target during deep search
    pub max_pages: usize,

    /// Maximum child sitemaps read from a sitemap index
    pub max_child_sitemaps: usize,

    /// Consult robots.txt and sitemaps before guessing paths
    pub use_sitemaps: bool,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            max_pages: 5,
            max_child_sitemaps: 10,
            use_sitemaps: true,
        }
    }
}

/// Scraping behavior configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ScrapeConfig {
    /// Homepage only, or homepage followed by deep search
    pub mode: ScrapeMode,

    /// Extract emails; when false, a fetched homepage alone is a success
    pub extract_emails: bool,

    /// Keep cleaned page text on the result
    pub include_text: bool,

    /// Concatenate deep-search page text onto the homepage text
    pub preserve_content: bool,

    /// Maximum characters of cleaned text kept per result
    pub max_text_chars: usize,

    /// Pages yielding more unique emails than this are discarded as mis-scrapes
    pub max_emails_per_page: usize,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            mode: ScrapeMode::DeepSearch,
            extract_emails: true,
            include_text: false,
            preserve_content: false,
            max_text_chars: 5000,
            max_emails_per_page: 20,
        }
    }
}

/// Batch runner configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RunnerConfig {
    /// Scheduling model
    pub kind: RunnerKind,

    /// Worker count (pool) or in-flight target bound (concurrent)
    pub workers: usize,

    /// Concurrent deep-search fetches against one target
    pub per_host_concurrency: usize,

    /// Log a progress line every N completed targets
    pub progress_every: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            kind: RunnerKind::Concurrent,
            workers: 50,
            per_host_concurrency: 3,
            progress_every: 50,
        }
    }
}

/// Checkpoint configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CheckpointConfig {
    /// Resume from an existing checkpoint instead of starting fresh
    pub resume: bool,

    /// Checkpoint file; defaults to `<output>/checkpoint.json`
    pub path: Option<String>,

    /// Flush once this many emails are buffered
    pub interval: usize,

    /// Flush once this many rows are buffered, whatever their emails
    pub max_buffered_rows: usize,
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            resume: false,
            path: None,
            interval: 100,
            max_buffered_rows: 500,
        }
    }
}

/// Whether to search beyond the homepage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ScrapeMode {
    HomepageOnly,
    DeepSearch,
}

/// Row layout for targets with several emails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum EmailCardinality {
    /// One row, emails joined with "; "
    AllInOne,
    /// One row per email
    OnePerRow,
    /// One row carrying the best email only
    PrimaryOnly,
}

/// Scheduling model of the batch runner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum RunnerKind {
    /// Fixed workers pulling from a shared queue; sequential retries and deep search
    Pool,
    /// Semaphore-bounded tasks over a pooled client; concurrent deep search
    Concurrent,
}

/// Output serialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    Csv,
    Sqlite,
}

impl Config {
    /// Path of the checkpoint file for this configuration
    pub fn checkpoint_path(&self) -> std::path::PathBuf {
        match &self.checkpoint.path {
            Some(path) => std::path::PathBuf::from(path),
            None => std::path::Path::new(&self.output.directory).join("checkpoint.json"),
        }
    }
}
