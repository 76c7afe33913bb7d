//! Certis API Library
//!
//! The HTTP boundary of the storage core: the authenticated redemption
//! handler for presigned download tokens, the multipart upload entrypoint,
//! and the error-to-status translation layer.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use auth::Caller;
pub use error::{ErrorResponse, HttpAppError};
pub use routes::router;
pub use state::AppState;
