use thiserror::Error;

/// A gateway read or write that did not succeed.
///
/// Transport failures and server-side rejections both collapse into the
/// message string; callers only ever display it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct FetchError {
    pub message: String,
}

impl FetchError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        Self::new(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Title is required.")]
    MissingTitle,
    #[error("Content is required.")]
    MissingContent,
    #[error("An image is required.")]
    MissingImage,
}

/// The image at `path` could not be opened for reading.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Permission required to access {path}: {reason}")]
pub struct PermissionError {
    pub path: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComposeError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Permission(#[from] PermissionError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
}
