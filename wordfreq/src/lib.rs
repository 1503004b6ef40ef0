pub mod config;
pub mod discovery;
pub mod engine;
pub mod errors;
pub mod filters;
pub mod frequency;
pub mod metrics;
pub mod pipeline;
pub mod reader;
pub mod results;
pub mod splitter;
pub mod tokenizer;
pub mod writer;

pub use config::{AnalyzerConfig, CliOverrides, EncodingMode, OutputFormat, ProcessingMode};
pub use engine::{analyze, analyze_with_tokenizer};
pub use errors::{FreqError, FreqResult};
pub use frequency::{FrequencyMap, RankedResult, WordCount};
pub use results::AnalysisReport;
pub use tokenizer::{RegexTokenizer, Tokenizer};
pub use writer::{FileResultWriter, ResultWriter};
