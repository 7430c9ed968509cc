//! Page-level state for the prediction and chat screens.
//!
//! Each page owns its state behind a mutex that is never held across a
//! network call. Calls are tagged by a [`dermai_core::RequestTracker`] so a
//! late response from a superseded call, or one arriving after the page was
//! disposed, is dropped instead of overwriting newer state.

pub mod chat;
pub mod prediction;

pub use chat::{ChatPage, ChatState};
pub use prediction::{PredictionPage, PredictionState};
