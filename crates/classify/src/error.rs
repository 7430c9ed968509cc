use dermai_core::AppError;

#[derive(Debug, thiserror::Error)]
pub enum ClassifyError {
    /// Bad form input; raised before any request is sent.
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    RequestFailed(String),
    #[error("failed to read image: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ClassifyError> for AppError {
    fn from(err: ClassifyError) -> Self {
        match err {
            ClassifyError::Validation(msg) => AppError::Validation(msg),
            ClassifyError::Io(e) => AppError::Validation(format!("failed to read image: {e}")),
            ClassifyError::RequestFailed(msg) => AppError::RequestFailed(msg),
        }
    }
}
