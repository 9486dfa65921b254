use thiserror::Error;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Every way a run can fail. None of these are retried: the run aborts and
/// the cause is reported to the operator.
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or out-of-range configuration parameter.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Configuration file is not valid JSON for the expected layout.
    #[error("malformed configuration file: {0}")]
    Json(#[from] serde_json::Error),

    /// A line of the initial-position file could not be parsed.
    #[error("malformed input at line {line}: {reason}")]
    MalformedInput { line: usize, reason: String },

    /// Cell index cannot be built with the requested cell size.
    #[error("degenerate grid: {0}")]
    DegenerateGrid(String),

    /// Internal invariant broken (programming error, not bad input).
    #[error("invariant violated: {0}")]
    Invariant(String),

    /// Reading inputs or writing outputs failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
