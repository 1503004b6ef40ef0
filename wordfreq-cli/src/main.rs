use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use wordfreq::{
    analyze, AnalysisReport, AnalyzerConfig, CliOverrides, EncodingMode, FileResultWriter,
    OutputFormat, ProcessingMode, ResultWriter,
};

#[derive(Parser)]
#[command(author, version, about = "Count the most frequent words in a directory of text files", long_about = None)]
struct Cli {
    /// Directory (or single file) to analyze
    #[arg(short = 'd', long = "dir")]
    dir: PathBuf,

    /// Minimum word length in characters
    #[arg(short = 'm', long = "min-len", visible_alias = "minlen")]
    min_len: Option<usize>,

    /// Number of top words to report
    #[arg(short = 'n', long = "top")]
    top: Option<usize>,

    /// Write the ranking to this file
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Output file format (text|json)
    #[arg(long)]
    format: Option<OutputFormat>,

    /// Number of worker threads
    #[arg(short = 'j', long)]
    threads: Option<NonZeroUsize>,

    /// Target chunk size in bytes
    #[arg(long)]
    chunk_size: Option<NonZeroUsize>,

    /// Buffer size of each pipeline channel (0 for rendezvous)
    #[arg(long)]
    capacity: Option<usize>,

    /// Execution strategy (pipeline|parallel)
    #[arg(long)]
    mode: Option<ProcessingMode>,

    /// How to handle invalid UTF-8 sequences (failfast|lossy)
    #[arg(long)]
    encoding: Option<EncodingMode>,

    /// File extensions to include (e.g. txt,md)
    #[arg(short = 'e', long = "ext")]
    extensions: Option<String>,

    /// Patterns to ignore (glob format)
    #[arg(short, long)]
    ignore: Vec<String>,

    /// Character class words are made of (e.g. "[a-z]")
    #[arg(long)]
    pattern: Option<String>,

    /// Lowercase words before counting
    #[arg(long, overrides_with = "no_fold_case")]
    fold_case: bool,

    /// Count words exactly as written, even if a config file enables --fold-case
    #[arg(long, overrides_with = "fold_case")]
    no_fold_case: bool,

    /// Abandon files containing a word longer than this many bytes
    #[arg(long = "max-token-len")]
    max_token_len: Option<usize>,

    /// Give up after this long (e.g. 30s, 2m)
    #[arg(long, value_parser = humantime::parse_duration)]
    timeout: Option<Duration>,

    /// Configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Print pipeline statistics after the ranking
    #[arg(short, long, overrides_with = "no_stats")]
    stats: bool,

    /// Do not print statistics, even if a config file enables them
    #[arg(long, overrides_with = "stats")]
    no_stats: bool,
}

/// Maps a `--flag`/`--no-flag` pair to an override; neither leaves the loaded value
fn switch(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

impl Cli {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            root_path: Some(self.dir.clone()),
            file_extensions: self
                .extensions
                .as_ref()
                .map(|e| e.split(',').map(|s| s.trim().to_string()).collect()),
            ignore_patterns: self.ignore.clone(),
            min_word_length: self.min_len,
            top_count: self.top,
            word_pattern: self.pattern.clone(),
            fold_case: switch(self.fold_case, self.no_fold_case),
            chunk_size: self.chunk_size,
            max_token_length: self.max_token_len,
            thread_count: self.threads,
            channel_capacity: self.capacity,
            mode: self.mode,
            encoding_mode: self.encoding,
            timeout: self.timeout,
            output_path: self.output.clone(),
            output_format: self.format,
            log_level: self.log_level.clone(),
            show_stats: switch(self.stats, self.no_stats),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AnalyzerConfig::load_from(cli.config.as_deref())
        .context("failed to load configuration")?
        .merge_with_cli(cli.overrides());

    init_logging(&config.log_level);
    debug!("Effective configuration: {:?}", config);

    let report = analyze(&config)?;
    print_report(&report, config.show_stats);

    if let Some(path) = &config.output_path {
        FileResultWriter::new(path, config.output_format).write(&report.ranked)?;
        info!("Results written to {}", path.display());
    }

    Ok(())
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn print_report(report: &AnalysisReport, show_stats: bool) {
    println!("Found {} text files", report.files_discovered);

    if report.ranked.is_empty() {
        println!("No words found");
    } else {
        println!("{}", format!("Top {} words:", report.ranked.len()).bold());
        for (rank, entry) in report.ranked.ranked() {
            println!("{}. {}: {}", rank.to_string().green(), entry.word, entry.count);
        }
    }

    for failure in &report.failures {
        eprintln!("{} {}", "warning:".yellow(), failure);
    }
    if !report.is_complete() {
        eprintln!(
            "{} {} of {} files could not be fully read",
            "warning:".yellow(),
            report.files_failed(),
            report.files_discovered
        );
    }

    if show_stats {
        let stats = &report.stats;
        println!();
        println!("{}", "Statistics:".bold());
        println!("  Words counted:   {}", report.total_words);
        println!("  Distinct words:  {}", report.distinct_words);
        println!(
            "  Files opened:    {} ({} failed)",
            stats.files_opened, stats.files_failed
        );
        println!(
            "  Chunks:          {} ({} bytes, {} oversized)",
            stats.chunks_emitted, stats.bytes_emitted, stats.oversized_chunks
        );
    }
}
