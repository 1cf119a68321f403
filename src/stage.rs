use crate::buffer::{BoundedQueue, CloseOnDrop};
use crate::metrics::StageMetrics;
use std::time::Instant;
use tracing::{debug, warn};

/// A stream transformer between two queues.
///
/// Each input item can produce zero, one, or many outputs.
pub trait Stage: Send {
    type Input: Send;
    type Output: Send;

    /// Process one input item, appending its outputs to `out` in order
    fn process(&mut self, input: Self::Input, out: &mut Vec<Self::Output>);

    /// Called before the first item
    fn on_start(&mut self) {}

    /// Called after the input has been closed and drained
    fn on_shutdown(&mut self) {}

    fn name(&self) -> &str {
        "stage"
    }
}

/// Drives a [`Stage`]: pulls from the input queue until it is closed and
/// drained, pushes every output downstream, then closes the output queue.
pub struct StageRunner<I, O> {
    input: BoundedQueue<I>,
    output: BoundedQueue<O>,
    metrics: StageMetrics,
}

impl<I: Send, O: Send> StageRunner<I, O> {
    pub fn new(input: BoundedQueue<I>, output: BoundedQueue<O>, metrics: StageMetrics) -> Self {
        Self {
            input,
            output,
            metrics,
        }
    }

    pub fn metrics(&self) -> &StageMetrics {
        &self.metrics
    }

    /// Run the stage to completion on the current thread, returning it.
    ///
    /// Both queues are closed on every exit path. Closing the input matters
    /// only when the run ends early: it releases upstream producers that
    /// would otherwise block on a queue nobody drains.
    pub fn run<S>(&self, mut stage: S) -> S
    where
        S: Stage<Input = I, Output = O>,
    {
        let _close_output = CloseOnDrop(&self.output);
        let _close_input = CloseOnDrop(&self.input);

        stage.on_start();
        debug!(stage = stage.name(), "stage started");

        let mut batch = Vec::new();
        'items: while let Some(item) = self.input.pop() {
            self.metrics.record_received();

            let start = Instant::now();
            stage.process(item, &mut batch);
            self.metrics.record_latency(start.elapsed());

            for output in batch.drain(..) {
                if self.output.push(output).is_err() {
                    warn!(stage = stage.name(), "downstream closed early, stopping");
                    break 'items;
                }
                self.metrics.record_emitted();
            }
        }

        stage.on_shutdown();
        debug!(
            stage = stage.name(),
            received = self.metrics.total_received(),
            emitted = self.metrics.total_emitted(),
            "stage drained"
        );
        stage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    struct Doubler {
        shutdown_called: bool,
    }

    impl Stage for Doubler {
        type Input = u32;
        type Output = u32;

        fn process(&mut self, input: u32, out: &mut Vec<u32>) {
            out.push(input);
            out.push(input * 2);
        }

        fn on_shutdown(&mut self) {
            self.shutdown_called = true;
        }

        fn name(&self) -> &str {
            "doubler"
        }
    }

    #[test]
    fn test_runner_drains_input_then_closes_output() {
        let input = BoundedQueue::new(4);
        let output = BoundedQueue::new(16);
        let runner = StageRunner::new(input.clone(), output.clone(), StageMetrics::new("doubler"));

        for i in 1..=3 {
            input.push(i).unwrap();
        }
        input.close();

        let stage = runner.run(Doubler {
            shutdown_called: false,
        });

        assert!(stage.shutdown_called);
        assert!(output.is_closed());
        let collected: Vec<u32> = std::iter::from_fn(|| output.pop()).collect();
        assert_eq!(collected, vec![1, 2, 2, 4, 3, 6]);
        assert_eq!(runner.metrics().total_received(), 3);
        assert_eq!(runner.metrics().total_emitted(), 6);
    }

    #[test]
    fn test_runner_applies_backpressure_to_small_output() {
        let input = BoundedQueue::new(64);
        let output = BoundedQueue::new(1);
        let runner = StageRunner::new(input.clone(), output.clone(), StageMetrics::new("doubler"));

        let consumer = {
            let output = output.clone();
            thread::spawn(move || std::iter::from_fn(|| output.pop()).count())
        };

        for i in 0..50 {
            input.push(i).unwrap();
        }
        input.close();
        runner.run(Doubler {
            shutdown_called: false,
        });

        assert_eq!(consumer.join().unwrap(), 100);
    }

    #[test]
    fn test_runner_stops_when_downstream_closes() {
        let input = BoundedQueue::new(8);
        let output = BoundedQueue::new(8);
        output.close();
        let runner = StageRunner::new(input.clone(), output, StageMetrics::new("doubler"));

        input.push(1).unwrap();
        runner.run(Doubler {
            shutdown_called: false,
        });

        assert!(input.is_closed());
        assert_eq!(runner.metrics().total_emitted(), 0);
    }
}
