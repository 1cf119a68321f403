use crate::error::{Result, WordFreqError};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Default directory scanned for input files
pub const DEFAULT_INPUT_DIR: &str = "./books/";
/// Default chart output path
pub const DEFAULT_CHART_PATH: &str = "chart.png";
/// Default number of ranked words plotted
pub const DEFAULT_TOP_N: usize = 21;
/// Default capacity of the merged line queue
pub const DEFAULT_LINE_CAPACITY: usize = 256;
/// Default capacity of the token queue
pub const DEFAULT_TOKEN_CAPACITY: usize = 1024;
/// Default diagnostic server port
pub const DEFAULT_DIAGNOSTICS_PORT: u16 = 8000;

/// Settings for one run.
///
/// The binary always uses [`Config::default`]; the `with_*` methods exist for
/// embedding and tests.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub input_dir: PathBuf,
    pub chart_path: PathBuf,
    pub top_n: usize,
    pub line_capacity: usize,
    pub token_capacity: usize,
    pub diagnostics_addr: SocketAddr,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from(DEFAULT_INPUT_DIR),
            chart_path: PathBuf::from(DEFAULT_CHART_PATH),
            top_n: DEFAULT_TOP_N,
            line_capacity: DEFAULT_LINE_CAPACITY,
            token_capacity: DEFAULT_TOKEN_CAPACITY,
            diagnostics_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_DIAGNOSTICS_PORT)),
        }
    }
}

impl Config {
    pub fn with_input_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.input_dir = dir.into();
        self
    }

    pub fn with_chart_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.chart_path = path.into();
        self
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    pub fn with_line_capacity(mut self, capacity: usize) -> Self {
        self.line_capacity = capacity;
        self
    }

    pub fn with_token_capacity(mut self, capacity: usize) -> Self {
        self.token_capacity = capacity;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.top_n == 0 {
            return Err(WordFreqError::Config("top_n must be at least 1".into()));
        }
        validate_capacity("line", self.line_capacity)?;
        validate_capacity("token", self.token_capacity)
    }
}

pub(crate) fn validate_capacity(queue: &str, capacity: usize) -> Result<()> {
    if capacity == 0 {
        Err(WordFreqError::Config(format!(
            "{queue} queue capacity must be at least 1"
        )))
    } else {
        Ok(())
    }
}
