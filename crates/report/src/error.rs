use dermai_core::AppError;

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("image could not be decoded: {0}")]
    Image(#[from] image::ImageError),
    #[error("image data URI is invalid: {0}")]
    DataUri(String),
    #[error("PDF encoding failed: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("a report is already being generated")]
    Busy,
    #[error("failed to write report: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ReportError> for AppError {
    fn from(err: ReportError) -> Self {
        AppError::ReportGenerationFailed(err.to_string())
    }
}
