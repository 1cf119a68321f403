use crate::buffer::{BoundedQueue, QueueStats};
use crate::config::{self, Config, DEFAULT_LINE_CAPACITY, DEFAULT_TOKEN_CAPACITY};
use crate::counter::{FrequencyCounter, FrequencyTable};
use crate::error::{Result, WordFreqError};
use crate::metrics::{MetricsSnapshot, StageMetrics};
use crate::rank::{rank, RankedEntry};
use crate::source::{LineAggregator, LineSource, SourceOutcome, SourceStatus};
use crate::stage::StageRunner;
use crate::tokenize::Tokenizer;
use serde::Serialize;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Builder for [`WordPipeline`]
#[derive(Debug, Clone)]
pub struct PipelineBuilder {
    line_capacity: usize,
    token_capacity: usize,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self {
            line_capacity: DEFAULT_LINE_CAPACITY,
            token_capacity: DEFAULT_TOKEN_CAPACITY,
        }
    }

    /// Queue capacities taken from a run configuration
    pub fn from_config(config: &Config) -> Self {
        Self::new()
            .line_capacity(config.line_capacity)
            .token_capacity(config.token_capacity)
    }

    /// Capacity of the merged line queue shared by every line source
    pub fn line_capacity(mut self, capacity: usize) -> Self {
        self.line_capacity = capacity;
        self
    }

    /// Capacity of the queue between the tokenizer and the counter
    pub fn token_capacity(mut self, capacity: usize) -> Self {
        self.token_capacity = capacity;
        self
    }

    pub fn build(self) -> Result<WordPipeline> {
        config::validate_capacity("line", self.line_capacity)?;
        config::validate_capacity("token", self.token_capacity)?;
        Ok(WordPipeline {
            line_capacity: self.line_capacity,
            token_capacity: self.token_capacity,
        })
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The concurrent word-frequency pipeline.
///
/// ```text
/// file ─► LineSource ─┐
/// file ─► LineSource ─┼─► line queue ─► Tokenizer ─► token queue ─► FrequencyCounter ─► rank
/// file ─► LineSource ─┘
/// ```
///
/// One thread per file, one coordinator closing the line queue once every
/// source has finished, one tokenizer thread, and the counter on the calling
/// thread. A pipeline holds no state between runs.
#[derive(Debug, Clone)]
pub struct WordPipeline {
    line_capacity: usize,
    token_capacity: usize,
}

impl WordPipeline {
    /// Count words across `paths`.
    ///
    /// Unreadable files are logged and skipped; only thread failures are
    /// reported as errors.
    pub fn run<P: AsRef<Path>>(&self, paths: &[P]) -> Result<WordDistribution> {
        let started = Instant::now();

        let aggregator = LineAggregator::new(paths.len(), self.line_capacity);
        let tokens = BoundedQueue::new(self.token_capacity);
        let source_metrics = StageMetrics::new("sources");
        let tokenizer_metrics = StageMetrics::new("tokenizer");
        let counter_metrics = StageMetrics::new("counter");

        let (table, outcomes) = thread::scope(|scope| -> Result<_> {
            let lines = aggregator.lines();

            let mut sources = Vec::with_capacity(paths.len());
            for path in paths {
                let path = path.as_ref();
                let source = LineSource::new(path);
                let completion = aggregator.completion_guard();
                let metrics = &source_metrics;
                // A failed spawn drops the closure, and with it the guard, so
                // the aggregator still counts this source as finished.
                let spawned = thread::Builder::new()
                    .name("line-source".into())
                    .spawn_scoped(scope, move || source.run(lines, completion, metrics));
                match spawned {
                    Ok(handle) => sources.push(handle),
                    Err(err) => {
                        warn!(path = %path.display(), error = %err, "could not start line source")
                    }
                }
            }

            let coordinator = thread::Builder::new()
                .name("line-aggregator".into())
                .spawn_scoped(scope, || aggregator.close_when_complete())
                .map_err(|err| abort_sources(lines, err))?;

            let runner = StageRunner::new(lines.clone(), tokens.clone(), tokenizer_metrics.clone());
            let tokenizer = thread::Builder::new()
                .name("tokenizer".into())
                .spawn_scoped(scope, move || {
                    runner.run(Tokenizer::new());
                })
                .map_err(|err| abort_sources(lines, err))?;

            let table = FrequencyCounter::new().consume(&tokens, &counter_metrics);

            let outcomes = sources
                .into_iter()
                .map(|handle| {
                    handle.join().unwrap_or_else(|_| {
                        warn!("line source panicked");
                        SourceOutcome {
                            status: SourceStatus::Truncated,
                            lines: 0,
                        }
                    })
                })
                .collect::<Vec<_>>();
            coordinator
                .join()
                .map_err(|_| WordFreqError::Thread("line aggregator panicked".into()))?;
            tokenizer
                .join()
                .map_err(|_| WordFreqError::Thread("tokenizer panicked".into()))?;

            Ok((table, outcomes))
        })?;

        let elapsed = started.elapsed();
        let stages = vec![
            StageReport::new(&source_metrics, Some(aggregator.lines().stats())),
            StageReport::new(&tokenizer_metrics, Some(tokens.stats())),
            StageReport::new(&counter_metrics, None),
        ];
        let distribution = WordDistribution::new(table, FileSummary::from_outcomes(&outcomes), elapsed, stages);
        info!(
            files = distribution.files.read,
            skipped = distribution.files.skipped,
            total = distribution.total(),
            distinct = distribution.table.distinct(),
            elapsed_ms = elapsed.as_millis() as u64,
            "pipeline finished"
        );
        Ok(distribution)
    }
}

/// Close the line queue so running sources stop, then report the spawn error.
fn abort_sources(lines: &BoundedQueue<String>, err: std::io::Error) -> WordFreqError {
    lines.close();
    WordFreqError::Thread(format!("failed to spawn pipeline stage: {err}"))
}

/// How many input files were read, skipped, or cut short
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FileSummary {
    pub read: usize,
    pub skipped: usize,
    pub truncated: usize,
}

impl FileSummary {
    pub fn from_outcomes(outcomes: &[SourceOutcome]) -> Self {
        let mut summary = Self::default();
        for outcome in outcomes {
            match outcome.status {
                SourceStatus::Completed => summary.read += 1,
                SourceStatus::Skipped => summary.skipped += 1,
                SourceStatus::Truncated | SourceStatus::Abandoned => summary.truncated += 1,
            }
        }
        summary
    }
}

/// Metrics of one stage plus the counters of the queue it writes into
#[derive(Debug, Clone, Serialize)]
pub struct StageReport {
    #[serde(flatten)]
    pub metrics: MetricsSnapshot,
    pub output_queue: Option<QueueStats>,
}

impl StageReport {
    pub fn new(metrics: &StageMetrics, output_queue: Option<QueueStats>) -> Self {
        Self {
            metrics: metrics.snapshot(),
            output_queue,
        }
    }
}

/// Everything one run produced
#[derive(Debug, Clone)]
pub struct WordDistribution {
    pub table: FrequencyTable,
    pub ranked: Vec<RankedEntry>,
    pub files: FileSummary,
    pub elapsed: Duration,
    pub stages: Vec<StageReport>,
}

impl WordDistribution {
    pub fn new(table: FrequencyTable, files: FileSummary, elapsed: Duration, stages: Vec<StageReport>) -> Self {
        let ranked = rank(&table);
        Self {
            table,
            ranked,
            files,
            elapsed,
            stages,
        }
    }

    /// Total tokens counted
    pub fn total(&self) -> u64 {
        self.table.total()
    }
}
