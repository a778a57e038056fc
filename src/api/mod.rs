//! REST API: routers, handlers, typed errors.

pub mod error;
pub mod handlers;
pub mod rest;
pub mod types;

pub use error::{ApiError, ErrorCode};
