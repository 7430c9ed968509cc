//! PDF report for one classification.
//!
//! Layout and encoding are separate steps: [`layout::layout_report`] is a pure
//! function producing a display list per page, and [`pdf::render_pdf`] turns
//! that list plus the decoded image into PDF bytes.

pub mod bitmap;
pub mod error;
pub mod generator;
pub mod layout;
pub mod metrics;
pub mod pdf;

pub use error::ReportError;
pub use generator::{
    report_file_name, GeneratedReport, ReportGenerator, ReportGuard, ReportInput, ReportJob,
    ReportState,
};
pub use layout::{layout_report, DrawOp, ReportLayout};
