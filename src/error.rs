use http::StatusCode;
use thiserror::Error;

use crate::models::{EntityRef, LessonKind};

/// Failure reported by a collaborator (REST backend, media service).
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Request failed ({status}): {message}")]
    Status { status: StatusCode, message: String },

    #[error("Reqwest client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Received invalid json data")]
    Json(#[from] serde_json::Error),

    #[error("Operation timed out")]
    Timeout,
}

impl BackendError {
    pub fn status(status: StatusCode, message: impl Into<String>) -> Self {
        BackendError::Status {
            status,
            message: message.into(),
        }
    }
}

/// Input rejected locally, before any network call is made.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        field: &'static str,
        min: i64,
        max: i64,
    },

    #[error("a {actual} body cannot be applied to a {expected} lesson")]
    LessonTypeMismatch { expected: LessonKind, actual: LessonKind },

    #[error("question type is locked once options exist")]
    QuestionTypeLocked,

    #[error("a true/false question takes at most two options")]
    TooManyOptions,

    #[error("an upload is still in progress")]
    UploadInFlight,

    #[error("the list is still loading")]
    CollectionNotReady,

    #[error("no module is selected")]
    NoModuleSelected,

    #[error("no course is selected")]
    NoCourseSelected,

    #[error("only draft courses can be submitted for approval")]
    CourseNotDraft,

    #[error("position {index} is outside a list of {len}")]
    PositionOutOfBounds { index: usize, len: usize },

    #[error("confirmation does not match {0}")]
    ConfirmationMismatch(EntityRef),
}

/// The backend answered a create/update/delete/reorder with an error.
#[derive(Error, Debug)]
#[error("{operation} was rejected: {source}")]
pub struct RemoteRejection {
    pub operation: &'static str,
    #[source]
    pub source: BackendError,
}

impl RemoteRejection {
    pub fn new(operation: &'static str, source: BackendError) -> Self {
        Self { operation, source }
    }
}

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("upload rejected: {0}")]
    Rejected(String),

    #[error("upload failed: {0}")]
    Transfer(#[source] BackendError),

    #[error("could not resolve media {media_id}: {source}")]
    Resolve {
        media_id: String,
        #[source]
        source: BackendError,
    },
}

#[derive(Error, Debug)]
pub enum AuthoringError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Remote(#[from] RemoteRejection),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error("{0} no longer exists")]
    StaleReference(EntityRef),

    #[error("no signed-in actor")]
    NoActor,
}

impl AuthoringError {
    pub fn remote(operation: &'static str, source: BackendError) -> Self {
        AuthoringError::Remote(RemoteRejection::new(operation, source))
    }
}

pub type Result<T, E = AuthoringError> = std::result::Result<T, E>;
