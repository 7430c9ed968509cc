//! Prediction flow up to the rendered result.
//!
//! This crate provides:
//! - `FormInput` to collect the image and patient metadata and validate a submission
//! - `Classifier` trait with the multipart HTTP implementation
//! - `ResultView` mapping a backend result into display sections

pub mod client;
pub mod error;
pub mod form;
pub mod render;

pub use client::{Classifier, HttpClassifier};
pub use error::ClassifyError;
pub use form::FormInput;
pub use render::ResultView;
