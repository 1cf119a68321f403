use anyhow::Context;
use tracing_subscriber::EnvFilter;
use wordfreq::{app, Config, DiagnosticServer};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::default();
    let server = DiagnosticServer::new(config.diagnostics_addr);
    app::run(&config, server).context("word frequency run failed")
}
