use thiserror::Error;

/// User-facing failure kinds. Every variant is recoverable: the page keeps its
/// previous state and the user retries by hand.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    /// Input rejected before any network call was made.
    #[error("{0}")]
    Validation(String),

    #[error("Error: {0}")]
    RequestFailed(String),

    #[error("Chat Error: {0}")]
    AssistantUnavailable(String),

    #[error("Failed to generate PDF: {0}")]
    ReportGenerationFailed(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// Short machine-readable name of the failure kind.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation",
            AppError::RequestFailed(_) => "request_failed",
            AppError::AssistantUnavailable(_) => "assistant_unavailable",
            AppError::ReportGenerationFailed(_) => "report_generation_failed",
            AppError::Config(_) => "config",
        }
    }
}
