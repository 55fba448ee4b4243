//! rigstate-api: Shared API types and schemas
//!
//! Request/response bodies and OpenAPI schema definitions used by the daemon
//! and the CLI.

pub mod requests;
pub mod responses;

pub use requests::OverclockRequest;
pub use responses::{
    HealthResponse, OverclockResponse, OverclockStatus, RejectedField, RescanResponse,
};
