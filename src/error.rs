use crate::trial::TrialType;
use std::path::PathBuf;

/// A single result or log file did not have the shape the harness produces.
#[derive(Debug)]
pub enum ExtractError {
    /// A line at a schema offset did not match its rule.
    Malformed {
        path: PathBuf,
        line: usize,
        expected: String,
        found: String,
    },
    /// The file ended before a line a required field lives on.
    MissingLine {
        path: PathBuf,
        line: usize,
        field: &'static str,
        len: usize,
    },
}

impl std::fmt::Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractError::Malformed {
                path,
                line,
                expected,
                found,
            } => write!(
                f,
                "unexpected input format in {} line {line}: expected {expected}, found {found:?}",
                path.display()
            ),
            ExtractError::MissingLine {
                path,
                line,
                field,
                len,
            } => write!(
                f,
                "unexpected input format in {}: {field} needs line {line} but file has {len} lines",
                path.display()
            ),
        }
    }
}

impl std::error::Error for ExtractError {}

/// Errors that abort a run.
#[derive(Debug)]
pub enum PipelineError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Extract(ExtractError),
    Config {
        path: PathBuf,
        message: String,
    },
    Output(csv::Error),
    /// A field a query reads was never populated for a trial.
    Unset {
        trial: String,
        field: &'static str,
    },
    EmptyGroup {
        trial_type: TrialType,
        rate: u32,
    },
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineError::Io { path, source } => {
                write!(f, "failed to read {}: {source}", path.display())
            }
            PipelineError::Extract(e) => write!(f, "{e}"),
            PipelineError::Config { path, message } => {
                write!(f, "invalid config {}: {message}", path.display())
            }
            PipelineError::Output(e) => write!(f, "failed to write output: {e}"),
            PipelineError::Unset { trial, field } => {
                write!(f, "trial {trial} has no value for {field}")
            }
            PipelineError::EmptyGroup { trial_type, rate } => {
                write!(f, "no trials to summarize for type {trial_type} rate {rate}")
            }
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PipelineError::Io { source, .. } => Some(source),
            PipelineError::Extract(e) => Some(e),
            PipelineError::Config { .. } => None,
            PipelineError::Output(e) => Some(e),
            PipelineError::Unset { .. } | PipelineError::EmptyGroup { .. } => None,
        }
    }
}

impl From<ExtractError> for PipelineError {
    fn from(e: ExtractError) -> Self {
        PipelineError::Extract(e)
    }
}
