use thiserror::Error;

pub const INVALID_IMAGE_MESSAGE: &str = "Please upload a valid image file.";
pub const MISSING_IMAGE_MESSAGE: &str = "Please upload an image before submitting.";
pub const ENDPOINT_FALLBACK_MESSAGE: &str = "An error occurred.";
pub const TRANSPORT_ERROR_MESSAGE: &str = "Error while uploading image.";
pub const SUBMISSION_IN_FLIGHT_MESSAGE: &str = "A submission is already in progress.";

/// Everything the upload workflow reports back to the user. The `Display`
/// output is the exact text shown in the notification.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    #[error("{}", INVALID_IMAGE_MESSAGE)]
    InvalidImage,
    #[error("{}", MISSING_IMAGE_MESSAGE)]
    MissingImage,
    #[error("{0}")]
    Endpoint(String),
    #[error("{}", TRANSPORT_ERROR_MESSAGE)]
    Transport,
    #[error("{}", SUBMISSION_IN_FLIGHT_MESSAGE)]
    SubmissionInFlight,
}

impl UploadError {
    pub fn is_validation(&self) -> bool {
        matches!(self, UploadError::InvalidImage | UploadError::MissingImage)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            UploadError::InvalidImage | UploadError::MissingImage => "validation",
            UploadError::Endpoint(_) => "endpoint",
            UploadError::Transport => "transport",
            UploadError::SubmissionInFlight => "in_flight",
        }
    }
}
