//! Folio API crate: axum HTTP surface for the portfolio chat relay.
//!
//! Exposes chat, conversation management, end-of-conversation snapshots,
//! health, and model control under `/api`.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::AppState;
