//! HTTP surface for the follow graph
//!
//! Collections under `/api/user/{nickname}/{followers,following}`, the
//! follow feed, and client/user registration, all behind OAuth PLAINTEXT
//! credentials.

pub mod api;
pub mod auth;
pub mod error;
pub mod handlers;
pub mod server;
pub mod state;
pub mod types;

pub use api::build_router;
pub use error::{ApiError, ApiResult};
pub use server::ApiServer;
pub use state::AppState;
