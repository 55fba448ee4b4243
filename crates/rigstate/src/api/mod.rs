//! API route handlers

pub mod error;
pub mod hardware;
pub mod system;

pub use error::ApiError;
