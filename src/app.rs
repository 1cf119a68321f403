//! End-to-end run: discover files, count, chart, then serve diagnostics.

use crate::chart::BarChart;
use crate::config::Config;
use crate::diagnostics::DiagnosticServer;
use crate::discover::txt_files;
use crate::error::{Result, WordFreqError};
use crate::pipeline::{PipelineBuilder, WordDistribution};
use crate::rank::{chart_values, ChartValue};
use tracing::info;

/// Count the configured directory and write the chart.
///
/// Returns the run's distribution and the plotted values.
pub fn generate(config: &Config) -> Result<(WordDistribution, Vec<ChartValue>)> {
    config.validate()?;

    let paths = txt_files(&config.input_dir);
    let pipeline = PipelineBuilder::from_config(config).build()?;
    let dist = pipeline.run(&paths)?;

    println!("total time elapsed: {:?}", dist.elapsed);
    println!("total number of words: {}", dist.total());
    for stage in &dist.stages {
        info!("{}", stage.metrics.format());
    }

    let values = chart_values(&dist.ranked, dist.total(), config.top_n);
    BarChart::new(values.clone()).write_to(&config.chart_path)?;
    info!(path = %config.chart_path.display(), bars = values.len(), "chart written");

    Ok((dist, values))
}

/// Run once, then hand the results to `server` and serve them until the
/// process is stopped.
pub fn run(config: &Config, server: DiagnosticServer) -> Result<()> {
    let (dist, values) = generate(config)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(WordFreqError::Diagnostics)?;
    let server = server.with_report(&dist, values);
    info!(addr = %server.addr(), "serving run diagnostics");
    runtime.block_on(server.serve())
}
