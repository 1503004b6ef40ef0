use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use crate::config::{AnalyzerConfig, ProcessingMode};
use crate::discovery::discover_files;
use crate::errors::FreqResult;
use crate::metrics::PipelineMetrics;
use crate::pipeline::{parallel, Aggregate, ChunkCounter, Pipeline};
use crate::reader::FileChunks;
use crate::results::AnalysisReport;
use crate::tokenizer::{RegexTokenizer, Tokenizer};

/// Counts word frequencies across the corpus described by `config`
pub fn analyze(config: &AnalyzerConfig) -> FreqResult<AnalysisReport> {
    config.validate()?;
    let tokenizer = RegexTokenizer::new(
        &config.word_pattern,
        config.min_word_length,
        config.fold_case,
    )?;
    analyze_with_tokenizer(config, Arc::new(tokenizer))
}

/// Like [`analyze`], with a caller-supplied word extractor.
///
/// `word_pattern`, `min_word_length` and `fold_case` are ignored; the
/// tokenizer alone decides what a word is.
pub fn analyze_with_tokenizer(
    config: &AnalyzerConfig,
    tokenizer: Arc<dyn Tokenizer>,
) -> FreqResult<AnalysisReport> {
    config.validate()?;
    info!(
        "Starting analysis of {} in {} mode",
        config.root_path.display(),
        config.mode
    );
    let started = Instant::now();

    let files = discover_files(config)?;
    let files_discovered = files.len();
    debug!("Found {} files to process", files_discovered);

    let metrics = PipelineMetrics::new();
    let totals: Aggregate = match config.mode {
        ProcessingMode::Pipeline => {
            let source = FileChunks::new(files, config.split_options(), metrics.clone());
            Pipeline::from_config(config, tokenizer, metrics.clone()).run(source)?
        }
        ProcessingMode::Parallel => {
            let counter = ChunkCounter {
                tokenizer,
                encoding_mode: config.encoding_mode,
                metrics: metrics.clone(),
            };
            parallel::run_parallel(files, config.split_options(), &counter, config.thread_count)?
        }
    };

    let ranked = totals.frequencies.top_k(config.top_count);
    metrics.log_stats();

    let report = AnalysisReport {
        ranked,
        files_discovered,
        distinct_words: totals.frequencies.len(),
        total_words: totals.frequencies.total(),
        failures: totals.failures,
        stats: metrics.snapshot(),
    };

    info!(
        "Analysis complete in {}. {} words ({} distinct) in {} files, {} failures",
        humantime::format_duration(started.elapsed()),
        report.total_words,
        report.distinct_words,
        report.files_discovered,
        report.failures.len()
    );

    Ok(report)
}
