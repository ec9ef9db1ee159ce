use config::{Config as ConfigBuilder, ConfigError, File};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use crate::errors::{SearchError, SearchResult};
use crate::filters::ObjectFilter;
use crate::search::matcher::{ContentMatcher, MatchStyle};

/// What the run reports for each result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    /// Matched lines grouped under each object key
    #[default]
    Report,
    /// Only the keys of searched objects, like `grep -l`
    MatchingObjects,
    /// Only the keys of objects passing the filter; content is never fetched
    KeysOnly,
}

/// What a worker does after a task fails to fetch or decompress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Log the failure and stop this worker; the pool shrinks by one
    #[default]
    StopWorker,
    /// Log the failure and keep pulling tasks
    Continue,
}

/// Configuration for a search run.
///
/// # Configuration Locations
///
/// The configuration can be loaded from multiple locations in order of precedence:
/// 1. Custom config file specified via `--config` flag
/// 2. Local `.blobscout.yaml` in the current directory
/// 3. Global `$HOME/.config/blobscout/config.yaml`
///
/// # Configuration Format
///
/// ```yaml
/// bucket: "app-logs"
/// prefix: "prod/2024/"
/// key_pattern: "\\.log(\\.gz)?$"
/// content_pattern: "ERROR|FATAL"
/// thread_count: 64
/// queue_capacity: 10000
/// output_mode: "report"
/// failure_policy: "stop_worker"
/// log_level: "info"
/// ```
///
/// Command-line arguments take precedence over config file values; see
/// [`SearchConfig::merge_with_cli`]. Nothing is compiled or checked until
/// [`SearchConfig::validate`] turns the configuration into a [`SearchPlan`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Bucket to search
    #[serde(default)]
    pub bucket: String,

    /// Only objects whose keys start with this prefix are listed
    #[serde(default)]
    pub prefix: String,

    /// Regex an object key must match somewhere to be searched
    #[serde(default)]
    pub key_pattern: String,

    /// Regex a line must match somewhere to be reported
    #[serde(default)]
    pub content_pattern: String,

    /// Keys requested per listing page
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Number of concurrent fetch-and-scan workers
    #[serde(default = "default_thread_count")]
    pub thread_count: NonZeroUsize,

    /// Capacity of the task queue between discovery and the workers
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Capacity of the channel between the workers and the collector
    #[serde(default = "default_result_capacity")]
    pub result_capacity: usize,

    /// Highlight matches in colour
    #[serde(default)]
    pub highlight: bool,

    /// Truncate output lines to the terminal width
    #[serde(default)]
    pub fit_to_width: bool,

    #[serde(default)]
    pub output_mode: OutputMode,

    /// Print a `key (n matches):` header above each object's lines
    #[serde(default = "default_true")]
    pub show_keys: bool,

    /// Print a blank line after each object's lines
    #[serde(default = "default_true")]
    pub extra_newlines: bool,

    /// Periodically log the task queue depth
    #[serde(default)]
    pub queue_ticker: bool,

    #[serde(default)]
    pub failure_policy: FailurePolicy,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_page_size() -> usize {
    1000
}

fn default_thread_count() -> NonZeroUsize {
    NonZeroUsize::new(250).unwrap_or(NonZeroUsize::MIN)
}

fn default_queue_capacity() -> usize {
    10_000
}

fn default_result_capacity() -> usize {
    1024
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            prefix: String::new(),
            key_pattern: String::new(),
            content_pattern: String::new(),
            page_size: default_page_size(),
            thread_count: default_thread_count(),
            queue_capacity: default_queue_capacity(),
            result_capacity: default_result_capacity(),
            highlight: false,
            fit_to_width: false,
            output_mode: OutputMode::default(),
            show_keys: true,
            extra_newlines: true,
            queue_ticker: false,
            failure_policy: FailurePolicy::default(),
            log_level: default_log_level(),
        }
    }
}

impl SearchConfig {
    /// Loads configuration from the default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Loads configuration from a specific file
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        let config_files = [
            dirs::config_dir().map(|p| p.join("blobscout/config.yaml")),
            Some(PathBuf::from(".blobscout.yaml")),
            config_path.map(PathBuf::from),
        ];

        for path in config_files.iter().flatten() {
            // An explicitly requested file must exist
            if path.exists() || Some(path.as_path()) == config_path {
                builder = builder.add_source(File::from(path.as_path()));
            }
        }

        builder.build()?.try_deserialize()
    }

    /// Merges CLI arguments with configuration file values
    pub fn merge_with_cli(mut self, cli: CliOverrides) -> Self {
        if let Some(bucket) = cli.bucket {
            self.bucket = bucket;
        }
        if let Some(prefix) = cli.prefix {
            self.prefix = prefix;
        }
        if let Some(key_pattern) = cli.key_pattern {
            self.key_pattern = key_pattern;
        }
        if let Some(content_pattern) = cli.content_pattern {
            self.content_pattern = content_pattern;
        }
        if let Some(page_size) = cli.page_size {
            self.page_size = page_size;
        }
        if let Some(thread_count) = cli.thread_count {
            self.thread_count = thread_count;
        }
        if let Some(queue_capacity) = cli.queue_capacity {
            self.queue_capacity = queue_capacity;
        }
        if let Some(result_capacity) = cli.result_capacity {
            self.result_capacity = result_capacity;
        }
        if let Some(output_mode) = cli.output_mode {
            self.output_mode = output_mode;
        }
        if let Some(failure_policy) = cli.failure_policy {
            self.failure_policy = failure_policy;
        }
        if let Some(log_level) = cli.log_level {
            self.log_level = log_level;
        }
        // Switches only ever turn a behaviour on or off relative to the file
        self.highlight |= cli.highlight;
        self.fit_to_width |= cli.fit_to_width;
        self.queue_ticker |= cli.queue_ticker;
        if cli.hide_keys {
            self.show_keys = false;
        }
        if cli.no_extra_newlines {
            self.extra_newlines = false;
        }
        self
    }

    /// Checks the configuration and compiles it into an immutable plan.
    ///
    /// Every configuration error surfaces here, before any thread starts.
    pub fn validate(&self) -> SearchResult<SearchPlan> {
        if self.bucket.is_empty() {
            return Err(SearchError::config_error("a bucket is required"));
        }
        if self.highlight && self.fit_to_width {
            // Truncating inside a highlighted span leaves the markup unterminated
            return Err(SearchError::config_error(
                "highlighting and fitting lines to the terminal width cannot be combined",
            ));
        }
        if self.page_size == 0 {
            return Err(SearchError::config_error("page size must be at least 1"));
        }
        if self.queue_capacity == 0 {
            return Err(SearchError::config_error("queue capacity must be at least 1"));
        }
        if self.result_capacity == 0 {
            return Err(SearchError::config_error(
                "result capacity must be at least 1",
            ));
        }

        let key_pattern = Regex::new(&self.key_pattern).map_err(|e| {
            SearchError::invalid_pattern(format!("key pattern '{}': {}", self.key_pattern, e))
        })?;
        let content_pattern = Regex::new(&self.content_pattern).map_err(|e| {
            SearchError::invalid_pattern(format!(
                "content pattern '{}': {}",
                self.content_pattern, e
            ))
        })?;
        let style = if self.highlight {
            MatchStyle::Highlight
        } else {
            MatchStyle::Plain
        };

        Ok(SearchPlan {
            bucket: self.bucket.clone(),
            prefix: self.prefix.clone(),
            filter: ObjectFilter::new(key_pattern),
            matcher: ContentMatcher::new(content_pattern, style),
            page_size: self.page_size,
            workers: self.thread_count.get(),
            queue_capacity: self.queue_capacity,
            result_capacity: self.result_capacity,
            output_mode: self.output_mode,
            failure_policy: self.failure_policy,
            queue_ticker: self.queue_ticker,
            display: DisplayOptions {
                show_keys: self.show_keys,
                extra_newlines: self.extra_newlines,
                fit_to_width: self.fit_to_width,
            },
        })
    }
}

/// Values given on the command line, each overriding the config file when set
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub bucket: Option<String>,
    pub prefix: Option<String>,
    pub key_pattern: Option<String>,
    pub content_pattern: Option<String>,
    pub page_size: Option<usize>,
    pub thread_count: Option<NonZeroUsize>,
    pub queue_capacity: Option<usize>,
    pub result_capacity: Option<usize>,
    pub output_mode: Option<OutputMode>,
    pub failure_policy: Option<FailurePolicy>,
    pub log_level: Option<String>,
    pub highlight: bool,
    pub fit_to_width: bool,
    pub queue_ticker: bool,
    pub hide_keys: bool,
    pub no_extra_newlines: bool,
}

/// How a report is laid out as text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayOptions {
    pub show_keys: bool,
    pub extra_newlines: bool,
    pub fit_to_width: bool,
}

/// A validated, compiled configuration shared read-only by every component of a run
#[derive(Debug, Clone)]
pub struct SearchPlan {
    pub bucket: String,
    pub prefix: String,
    pub filter: ObjectFilter,
    pub matcher: ContentMatcher,
    pub page_size: usize,
    pub workers: usize,
    pub queue_capacity: usize,
    pub result_capacity: usize,
    pub output_mode: OutputMode,
    pub failure_policy: FailurePolicy,
    pub queue_ticker: bool,
    pub display: DisplayOptions,
}
