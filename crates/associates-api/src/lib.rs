//! Associates API
//!
//! REST surface for associate onboarding, built on axum. Admins register
//! associates and receive the access token to deliver; associates open
//! `/associate/field/:token` or `/associate/form/:token` and post their
//! data, which the submission gateway validates.
//!
//! Status mapping: accepted submissions return 200, an invalid token 404,
//! a token consumed by a concurrent submission 410, and failed validation
//! 422 with every failing field listed.

pub mod config;
pub mod error;
pub mod response;
pub mod routes;

pub use config::{init_tracing, ServerArgs};
pub use error::ApiError;
pub use response::{ApiResponse, AssociateView, ErrorInfo, HealthResponse, Page, PageResponse};
pub use routes::{create_router, AppState};
