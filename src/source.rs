//! Line sources and the aggregator that merges them into one stream.

use crate::buffer::BoundedQueue;
use crate::latch::{CompletionGuard, CompletionLatch};
use crate::metrics::StageMetrics;
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind};
use std::ops::ControlFlow;
use std::path::PathBuf;
use tracing::{debug, warn};

/// How a single file's read ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceStatus {
    /// Read to end-of-file
    Completed,
    /// Could not be opened; nothing was read
    Skipped,
    /// A read error stopped the file early; lines before it were kept
    Truncated,
    /// The consumer closed the line queue before the file was finished
    Abandoned,
}

/// Result of reading one file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceOutcome {
    pub status: SourceStatus,
    pub lines: u64,
}

/// Reads one file line by line.
///
/// Each emitted line keeps its trailing line break. A final line without one
/// is emitted as-is.
#[derive(Debug, Clone)]
pub struct LineSource {
    path: PathBuf,
}

impl LineSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read the file, calling `emit` with every line in order.
    ///
    /// Open failures and read errors are logged and reported through the
    /// returned status; they never propagate. The file handle is released
    /// before this returns on every path.
    pub fn read_lines<F>(&self, mut emit: F) -> SourceOutcome
    where
        F: FnMut(String) -> ControlFlow<()>,
    {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "skipping unreadable file");
                return SourceOutcome {
                    status: SourceStatus::Skipped,
                    lines: 0,
                };
            }
        };

        let mut reader = BufReader::new(file);
        let mut buf = Vec::new();
        let mut lines = 0;
        let status = loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) => break SourceStatus::Completed,
                Ok(_) => {
                    lines += 1;
                    if emit(decode_line(&mut buf)).is_break() {
                        break SourceStatus::Abandoned;
                    }
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => {
                    warn!(path = %self.path.display(), error = %err, lines, "read failed, treating as end of file");
                    break SourceStatus::Truncated;
                }
            }
        };

        debug!(path = %self.path.display(), lines, ?status, "source finished");
        SourceOutcome { status, lines }
    }

    /// Stream every line into `output`, then signal completion.
    ///
    /// `completion` fires when this returns or unwinds, so the aggregator's
    /// count always reaches its target.
    pub fn run(
        self,
        output: &BoundedQueue<String>,
        completion: CompletionGuard<'_>,
        metrics: &StageMetrics,
    ) -> SourceOutcome {
        let _completion = completion;
        self.read_lines(|line| match output.push(line) {
            Ok(()) => {
                metrics.record_emitted();
                ControlFlow::Continue(())
            }
            Err(_) => ControlFlow::Break(()),
        })
    }
}

/// Lines are passed through without validation; invalid UTF-8 is replaced.
fn decode_line(buf: &mut Vec<u8>) -> String {
    match String::from_utf8(std::mem::take(buf)) {
        Ok(line) => line,
        Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned(),
    }
}

/// Owns the merged line queue and closes it once every source has finished.
#[derive(Debug)]
pub struct LineAggregator {
    lines: BoundedQueue<String>,
    latch: CompletionLatch,
}

impl LineAggregator {
    /// An aggregator expecting `sources` completion signals
    pub fn new(sources: usize, capacity: usize) -> Self {
        Self {
            lines: BoundedQueue::new(capacity),
            latch: CompletionLatch::new(sources),
        }
    }

    /// The merged line stream, for sources to write into and the tokenizer
    /// to read from
    pub fn lines(&self) -> &BoundedQueue<String> {
        &self.lines
    }

    /// One completion guard per source
    pub fn completion_guard(&self) -> CompletionGuard<'_> {
        self.latch.guard()
    }

    pub fn pending_sources(&self) -> usize {
        self.latch.remaining()
    }

    /// Block until every source has signaled, then close the line queue.
    /// Returns whether this call performed the close.
    pub fn close_when_complete(&self) -> bool {
        self.latch.wait();
        let closed = self.lines.close();
        debug!(closed, "all line sources finished");
        closed
    }
}
