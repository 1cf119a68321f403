//! Sequential word counting: every file is read in order on the calling
//! thread, then tokenized and counted in one pass.
//!
//! Uses the same line reading, tokenizing, and counting rules as
//! [`WordPipeline`](crate::pipeline::WordPipeline), so both produce the same
//! table for the same files. Handy as a baseline when measuring the pipeline.

use crate::counter::FrequencyCounter;
use crate::metrics::StageMetrics;
use crate::pipeline::{FileSummary, StageReport, WordDistribution};
use crate::source::LineSource;
use crate::tokenize::Tokenizer;
use std::ops::ControlFlow;
use std::path::Path;
use std::time::Instant;
use tracing::info;

/// Count words across `paths` without any worker threads.
pub fn count_word_dist<P: AsRef<Path>>(paths: &[P]) -> WordDistribution {
    let started = Instant::now();
    let metrics = StageMetrics::new("batch");

    let mut lines = Vec::new();
    let outcomes: Vec<_> = paths
        .iter()
        .map(|path| {
            LineSource::new(path.as_ref()).read_lines(|line| {
                lines.push(line);
                ControlFlow::Continue(())
            })
        })
        .collect();

    let words: Vec<String> = lines
        .iter()
        .inspect(|_| metrics.record_received())
        .flat_map(|line| Tokenizer::tokens(line))
        .collect();

    let mut counter = FrequencyCounter::new();
    for word in &words {
        counter.record(word);
        metrics.record_emitted();
    }

    let elapsed = started.elapsed();
    let distribution = WordDistribution::new(
        counter.finish(),
        FileSummary::from_outcomes(&outcomes),
        elapsed,
        vec![StageReport::new(&metrics, None)],
    );
    info!(
        files = distribution.files.read,
        total = distribution.total(),
        elapsed_ms = elapsed.as_millis() as u64,
        "batch count finished"
    );
    distribution
}
