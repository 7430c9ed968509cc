//! Assistant proxy: forwards flattened prompts to the generative-text API so
//! the API key never leaves the server.

pub mod api;
pub mod router;
pub mod state;

pub use router::build_router;
pub use state::AppState;
