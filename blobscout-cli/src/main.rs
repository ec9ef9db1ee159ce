use blobscout::{
    config::CliOverrides,
    logging,
    output::{render_report, terminal_width},
    search::MatchStyle,
    FailurePolicy, LocalStore, OutputMode, SearchConfig, SearchError,
};
use clap::Parser;
use std::{
    io::{self, Write},
    num::NonZeroUsize,
    path::PathBuf,
};
use tracing::debug;

type Result<T> = std::result::Result<T, SearchError>;

/// Concurrent grep over the objects of a bucket.
///
/// Buckets are read from directories under `--root`; every regular file
/// below a bucket directory is an object keyed by its relative path.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory whose subdirectories are the buckets
    #[arg(short = 'd', long, default_value = ".")]
    root: PathBuf,

    /// Bucket to search
    #[arg(short, long)]
    bucket: Option<String>,

    /// Only list keys beginning with this prefix
    #[arg(short, long)]
    prefix: Option<String>,

    /// Regex an object key must match to be searched
    #[arg(short = 'k', long = "key-match")]
    key_match: Option<String>,

    /// Regex matched against every line of every object
    #[arg(short = 'm', long = "content-match")]
    content_match: Option<String>,

    /// Keys requested per listing page
    #[arg(long = "max-keys")]
    max_keys: Option<usize>,

    /// Number of concurrent workers
    #[arg(short = 'j', long = "max-workers")]
    max_workers: Option<NonZeroUsize>,

    /// Capacity of the queue between discovery and workers
    #[arg(long)]
    queue_capacity: Option<usize>,

    /// Capacity of the channel between workers and the collector
    #[arg(long)]
    result_capacity: Option<usize>,

    /// Highlight matched text in colour
    #[arg(long, alias = "color")]
    colour: bool,

    /// Truncate matched lines to the terminal width
    #[arg(long = "fit-to-tty")]
    fit_to_tty: bool,

    /// Do not print a header line per object
    #[arg(long = "no-object-keys")]
    no_object_keys: bool,

    /// Do not print a blank line after each object
    #[arg(long = "no-extra-newlines")]
    no_extra_newlines: bool,

    /// Print only the keys of objects that pass the key filter, without fetching them
    #[arg(long = "only-list-key-matches", conflicts_with = "only_list_matching_objects")]
    only_list_key_matches: bool,

    /// Print only the keys of searched objects
    #[arg(long = "only-list-matching-objects")]
    only_list_matching_objects: bool,

    /// Periodically log the number of queued tasks
    #[arg(long = "tasks-ticker")]
    tasks_ticker: bool,

    /// Keep a worker running after one of its objects fails
    #[arg(long = "continue-on-error")]
    continue_on_error: bool,

    /// Path to a configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long)]
    log_level: Option<String>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn overrides(&self) -> CliOverrides {
        let output_mode = if self.only_list_key_matches {
            Some(OutputMode::KeysOnly)
        } else if self.only_list_matching_objects {
            Some(OutputMode::MatchingObjects)
        } else {
            None
        };

        CliOverrides {
            bucket: self.bucket.clone(),
            prefix: self.prefix.clone(),
            key_pattern: self.key_match.clone(),
            content_pattern: self.content_match.clone(),
            page_size: self.max_keys,
            thread_count: self.max_workers,
            queue_capacity: self.queue_capacity,
            result_capacity: self.result_capacity,
            output_mode,
            failure_policy: self.continue_on_error.then_some(FailurePolicy::Continue),
            log_level: self.log_level.clone(),
            highlight: self.colour,
            fit_to_width: self.fit_to_tty,
            queue_ticker: self.tasks_ticker,
            hide_keys: self.no_object_keys,
            no_extra_newlines: self.no_extra_newlines,
        }
    }
}

fn main() -> Result<()> {
    run()
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let config = SearchConfig::load_from(cli.config.as_deref())
        .map_err(|e| SearchError::config_error(e.to_string()))?
        .merge_with_cli(cli.overrides());

    logging::init(&config.log_level);
    debug!("Using configuration: {:?}", config);

    // Validate before touching the store so bad patterns never cost a listing
    let plan = config.validate()?;
    if plan.matcher.style() == MatchStyle::Highlight {
        colored::control::set_override(true);
    }

    let store = LocalStore::new(cli.root.clone());
    let report = blobscout::search::run(&plan, &store)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if cli.json {
        serde_json::to_writer_pretty(&mut out, &report).map_err(io::Error::from)?;
        writeln!(out)?;
    } else {
        let width = if plan.display.fit_to_width {
            terminal_width()
        } else {
            0
        };
        render_report(&report, plan.output_mode, plan.display, width, &mut out)?;
    }

    Ok(())
}
