use thiserror::Error;

/// Failure taxonomy for the dashboard backend.
///
/// Malformed cells are never an error (parsing is total) and unresolved
/// hierarchy references are dropped, not raised, so the surface stays small:
/// either the sheet source could not be reached, or the process was started
/// without a required piece of configuration.
#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("sheet source unavailable ({range}): {message}")]
    SourceUnavailable { range: String, message: String },

    #[error("configuration missing: {0}")]
    ConfigurationMissing(&'static str),
}

impl DashboardError {
    pub fn source_unavailable(range: &str, message: impl ToString) -> Self {
        DashboardError::SourceUnavailable {
            range: range.to_string(),
            message: message.to_string(),
        }
    }
}

pub type DashboardResult<T> = Result<T, DashboardError>;
