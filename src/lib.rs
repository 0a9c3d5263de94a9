//! Client-side core of a course authoring tool: an in-memory copy of one
//! course's module/lesson/quiz/assignment tree, kept in step with a remote
//! course API and media service.

pub mod backend;
pub mod config;
pub mod error;
pub mod http;
pub mod models;
pub mod mutation;
pub mod navigation;
pub mod ordering;
pub mod store;
pub mod telemetry;
pub mod upload;
pub mod workspace;

pub use backend::{Backend, Identity, StaticIdentity};
pub use config::Config;
pub use error::{AuthoringError, BackendError, Result, UploadError, ValidationError};
pub use crate::http::HttpBackend;
pub use workspace::Workspace;
