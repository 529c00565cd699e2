//! MedSift Server — axum routes and shared application state.
//!
//! The binary in `main.rs` wires configuration and the scheduler around
//! these; integration tests build the router directly.

pub mod routes;
pub mod state;

pub use routes::build_router;
pub use state::AppState;
