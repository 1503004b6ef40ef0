use config::{Config as ConfigBuilder, File};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::errors::{FreqError, FreqResult};
use crate::pipeline::DEFAULT_CHANNEL_CAPACITY;
use crate::splitter::{SplitOptions, DEFAULT_CHUNK_SIZE};
use crate::tokenizer::DEFAULT_WORD_PATTERN;

/// How the chunk stream is executed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingMode {
    /// Generator, worker pool and fan-in over bounded channels
    #[default]
    Pipeline,
    /// Whole files counted on a rayon pool and reduced
    Parallel,
}

/// What to do with bytes that are not valid UTF-8
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingMode {
    /// Fail the chunk with an encoding error
    FailFast,
    /// Replace invalid sequences with U+FFFD
    #[default]
    Lossy,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// `<rank>. <word>: <count>` per line
    #[default]
    Text,
    /// Array of `{"word", "count"}` objects
    Json,
}

impl FromStr for ProcessingMode {
    type Err = FreqError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pipeline" => Ok(Self::Pipeline),
            "parallel" => Ok(Self::Parallel),
            other => Err(FreqError::config_error(format!(
                "unknown processing mode '{}', expected pipeline or parallel",
                other
            ))),
        }
    }
}

impl FromStr for EncodingMode {
    type Err = FreqError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "failfast" | "fail-fast" => Ok(Self::FailFast),
            "lossy" => Ok(Self::Lossy),
            other => Err(FreqError::config_error(format!(
                "unknown encoding mode '{}', expected failfast or lossy",
                other
            ))),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = FreqError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "txt" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(FreqError::config_error(format!(
                "unknown output format '{}', expected text or json",
                other
            ))),
        }
    }
}

impl fmt::Display for ProcessingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pipeline => write!(f, "pipeline"),
            Self::Parallel => write!(f, "parallel"),
        }
    }
}

/// Configuration for a word frequency analysis.
///
/// # Configuration Locations
///
/// Values are layered in order of increasing precedence:
/// 1. Global `$CONFIG_DIR/wordfreq/config.yaml`
/// 2. Local `.wordfreq.yaml` in the current directory
/// 3. Custom config file given with `--config`
///
/// Command-line flags are applied last through [`AnalyzerConfig::merge_with_cli`].
///
/// # Configuration Format
///
/// ```yaml
/// root_path: "corpus"
/// file_extensions: ["txt", "md"]
/// ignore_patterns: ["**/drafts/**"]
/// min_word_length: 5
/// top_count: 10
/// thread_count: 4
/// channel_capacity: 4
/// chunk_size: 1048576
/// mode: "pipeline"          # or "parallel"
/// encoding_mode: "lossy"    # or "failfast"
/// timeout: "30s"
/// log_level: "info"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Directory (or single file) to analyze
    pub root_path: PathBuf,

    /// File extensions to include. `None` includes every non-binary file.
    pub file_extensions: Option<Vec<String>>,

    /// Glob patterns of paths to skip
    pub ignore_patterns: Vec<String>,

    /// Shortest word counted, in characters
    pub min_word_length: usize,

    /// Number of ranked entries to report
    pub top_count: usize,

    /// Character class a word is made of
    pub word_pattern: String,

    /// Lowercase words before counting
    pub fold_case: bool,

    /// Target chunk size in bytes
    pub chunk_size: NonZeroUsize,

    /// Longest word the splitter will buffer. Unbounded when unset.
    pub max_token_length: Option<usize>,

    /// Worker threads; defaults to the number of CPU cores
    pub thread_count: NonZeroUsize,

    /// Buffer size of each pipeline channel
    pub channel_capacity: usize,

    pub mode: ProcessingMode,

    pub encoding_mode: EncodingMode,

    /// Deadline for the whole run, e.g. `"30s"` or `"2m"`
    #[serde(with = "humantime_option")]
    pub timeout: Option<Duration>,

    /// Where to write the ranked result, if anywhere
    pub output_path: Option<PathBuf>,

    pub output_format: OutputFormat,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Print pipeline counters after the run
    pub show_stats: bool,
}

/// Settings given on the command line. `None` (or an empty list) leaves the
/// loaded value alone, so a flag that repeats the default still wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliOverrides {
    pub root_path: Option<PathBuf>,
    pub file_extensions: Option<Vec<String>>,
    pub ignore_patterns: Vec<String>,
    pub min_word_length: Option<usize>,
    pub top_count: Option<usize>,
    pub word_pattern: Option<String>,
    pub fold_case: Option<bool>,
    pub chunk_size: Option<NonZeroUsize>,
    pub max_token_length: Option<usize>,
    pub thread_count: Option<NonZeroUsize>,
    pub channel_capacity: Option<usize>,
    pub mode: Option<ProcessingMode>,
    pub encoding_mode: Option<EncodingMode>,
    pub timeout: Option<Duration>,
    pub output_path: Option<PathBuf>,
    pub output_format: Option<OutputFormat>,
    pub log_level: Option<String>,
    pub show_stats: Option<bool>,
}

fn default_thread_count() -> NonZeroUsize {
    NonZeroUsize::new(num_cpus::get()).unwrap_or(NonZeroUsize::MIN)
}

fn default_chunk_size() -> NonZeroUsize {
    NonZeroUsize::new(DEFAULT_CHUNK_SIZE).unwrap_or(NonZeroUsize::MIN)
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            root_path: PathBuf::from("."),
            file_extensions: Some(vec!["txt".to_string()]),
            ignore_patterns: Vec::new(),
            min_word_length: 5,
            top_count: 10,
            word_pattern: DEFAULT_WORD_PATTERN.to_string(),
            fold_case: false,
            chunk_size: default_chunk_size(),
            max_token_length: None,
            thread_count: default_thread_count(),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            mode: ProcessingMode::default(),
            encoding_mode: EncodingMode::default(),
            timeout: None,
            output_path: None,
            output_format: OutputFormat::default(),
            log_level: default_log_level(),
            show_stats: false,
        }
    }
}

impl AnalyzerConfig {
    /// Loads configuration from the default locations
    pub fn load() -> FreqResult<Self> {
        Self::load_from(None)
    }

    /// Loads configuration from the default locations plus a specific file
    pub fn load_from(config_path: Option<&Path>) -> FreqResult<Self> {
        let mut builder = ConfigBuilder::builder();

        let config_files = [
            dirs::config_dir().map(|p| p.join("wordfreq/config.yaml")),
            Some(PathBuf::from(".wordfreq.yaml")),
        ];

        for path in config_files.iter().flatten() {
            if path.exists() {
                builder = builder.add_source(File::from(path.as_path()));
            }
        }

        // An explicitly requested file must exist
        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path));
        }

        builder
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| FreqError::config_error(e.to_string()))
    }

    /// Applies every flag the user actually passed on top of the loaded values
    pub fn merge_with_cli(mut self, cli: CliOverrides) -> Self {
        fn apply<T>(target: &mut T, value: Option<T>) {
            if let Some(value) = value {
                *target = value;
            }
        }

        apply(&mut self.root_path, cli.root_path);
        if cli.file_extensions.is_some() {
            self.file_extensions = cli.file_extensions;
        }
        if !cli.ignore_patterns.is_empty() {
            self.ignore_patterns = cli.ignore_patterns;
        }
        apply(&mut self.min_word_length, cli.min_word_length);
        apply(&mut self.top_count, cli.top_count);
        apply(&mut self.word_pattern, cli.word_pattern);
        apply(&mut self.fold_case, cli.fold_case);
        apply(&mut self.chunk_size, cli.chunk_size);
        if cli.max_token_length.is_some() {
            self.max_token_length = cli.max_token_length;
        }
        apply(&mut self.thread_count, cli.thread_count);
        apply(&mut self.channel_capacity, cli.channel_capacity);
        apply(&mut self.mode, cli.mode);
        apply(&mut self.encoding_mode, cli.encoding_mode);
        if cli.timeout.is_some() {
            self.timeout = cli.timeout;
        }
        if cli.output_path.is_some() {
            self.output_path = cli.output_path;
        }
        apply(&mut self.output_format, cli.output_format);
        apply(&mut self.log_level, cli.log_level);
        apply(&mut self.show_stats, cli.show_stats);
        self
    }

    /// Rejects settings that cannot produce a meaningful run
    pub fn validate(&self) -> FreqResult<()> {
        if self.word_pattern.trim().is_empty() {
            return Err(FreqError::invalid_pattern("word pattern must not be empty"));
        }
        if self.max_token_length == Some(0) {
            return Err(FreqError::config_error(
                "max_token_length must be greater than zero",
            ));
        }
        if let Some(limit) = self.max_token_length {
            if limit < self.min_word_length {
                return Err(FreqError::config_error(format!(
                    "max_token_length ({}) is shorter than min_word_length ({})",
                    limit, self.min_word_length
                )));
            }
        }
        if self.timeout == Some(Duration::ZERO) {
            return Err(FreqError::config_error("timeout must be greater than zero"));
        }
        Ok(())
    }

    /// Splitter settings derived from this configuration
    pub fn split_options(&self) -> SplitOptions {
        SplitOptions::new(self.chunk_size).with_max_token_length(self.max_token_length)
    }
}

/// (De)serializes `Option<Duration>` as a humantime string such as `"1m 30s"`
mod humantime_option {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => serializer.serialize_str(&humantime::format_duration(*d).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Duration>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        raw.map(|s| humantime::parse_duration(&s).map_err(serde::de::Error::custom))
            .transpose()
    }
}
