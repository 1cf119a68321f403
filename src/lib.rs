//! Word-frequency distribution over a directory of text files.
//!
//! The core is a concurrent ingestion pipeline: one line source per file feeds
//! a shared bounded queue, a tokenizer turns lines into words, and a single
//! counter owns the word → count table. Every hand-off is bounded, so a fast
//! reader blocks instead of growing memory.
//!
//! # Features
//!
//! - Lock-free bounded queues using crossbeam's `ArrayQueue`, with close semantics
//! - Countdown latch so the merged line stream closes exactly once, after every source
//! - Single-owner counting: no locks around the frequency table
//! - Per-stage metrics: items in/out, latency percentiles, queue pressure
//! - A sequential variant with identical results, for comparison
//!
//! # Example
//!
//! ```no_run
//! use wordfreq::{chart_values, discover, PipelineBuilder};
//!
//! let paths = discover::txt_files("./books/".as_ref());
//! let dist = PipelineBuilder::new().build()?.run(&paths)?;
//! for value in chart_values(&dist.ranked, dist.total(), 21) {
//!     println!("{:>6.2}% {}", value.value, value.label);
//! }
//! # Ok::<(), wordfreq::WordFreqError>(())
//! ```

pub mod app;
pub mod batch;
pub mod buffer;
pub mod chart;
pub mod config;
pub mod counter;
pub mod diagnostics;
pub mod discover;
pub mod error;
pub mod latch;
pub mod metrics;
pub mod pipeline;
pub mod rank;
pub mod source;
pub mod stage;
pub mod tokenize;

// Re-exports for convenience
pub use buffer::{BoundedQueue, QueueStats};
pub use chart::BarChart;
pub use config::Config;
pub use counter::{FrequencyCounter, FrequencyTable};
pub use diagnostics::DiagnosticServer;
pub use error::{Result, WordFreqError};
pub use latch::{CompletionGuard, CompletionLatch};
pub use metrics::{MetricsSnapshot, StageMetrics};
pub use pipeline::{FileSummary, PipelineBuilder, StageReport, WordDistribution, WordPipeline};
pub use rank::{chart_values, rank, ChartValue, RankedEntry};
pub use source::{LineAggregator, LineSource, SourceOutcome, SourceStatus};
pub use stage::{Stage, StageRunner};
pub use tokenize::Tokenizer;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
