//! Domain error types.

/// Top-level error type for vectrader.
#[derive(Debug, thiserror::Error)]
pub enum BacktestError {
    #[error("unknown strategy: {name}")]
    UnknownStrategy { name: String },

    #[error("missing parameter {key} for strategy {strategy}")]
    MissingParameter { strategy: String, key: String },

    #[error("unknown parameter {key} for strategy {strategy}")]
    UnknownParameter { strategy: String, key: String },

    #[error("invalid parameter {key}: {reason}")]
    InvalidParameter { key: String, reason: String },

    #[error("invalid range for {key}: {reason}")]
    InvalidRange { key: String, reason: String },

    #[error("insufficient data for {symbol}: have {bars} bars, need {minimum}")]
    InsufficientData {
        symbol: String,
        bars: usize,
        minimum: usize,
    },

    #[error("invalid price series for {symbol}: {reason}")]
    InvalidSeries { symbol: String, reason: String },

    #[error("backtester is not configured; call strategy_setup first")]
    NotConfigured,

    #[error("no strategy results yet; run a strategy first")]
    NoResults,

    #[error("no data for {symbol}: {reason}")]
    DataUnavailable { symbol: String, reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("chart rendering failed: {reason}")]
    Render { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&BacktestError> for std::process::ExitCode {
    fn from(err: &BacktestError) -> Self {
        let code: u8 = match err {
            BacktestError::Io(_) | BacktestError::Render { .. } => 1,
            BacktestError::ConfigParse { .. }
            | BacktestError::ConfigMissing { .. }
            | BacktestError::ConfigInvalid { .. } => 2,
            BacktestError::DataUnavailable { .. } | BacktestError::InvalidSeries { .. } => 3,
            BacktestError::UnknownStrategy { .. }
            | BacktestError::MissingParameter { .. }
            | BacktestError::UnknownParameter { .. }
            | BacktestError::InvalidParameter { .. }
            | BacktestError::InvalidRange { .. } => 4,
            BacktestError::InsufficientData { .. } => 5,
            BacktestError::NotConfigured | BacktestError::NoResults => 6,
        };
        std::process::ExitCode::from(code)
    }
}
