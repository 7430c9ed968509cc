pub mod config;
pub mod error;
pub mod model;
pub mod tracker;
pub mod transcript;

pub use config::Config;
pub use error::*;
pub use model::*;
pub use tracker::{RequestTicket, RequestTracker};
pub use transcript::{Message, Role, Transcript};
