use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Local, NaiveDate, Utc};
use dermai_core::{ClassificationResult, PatientInfo};
use tracing::{info, warn};

use crate::bitmap;
use crate::error::ReportError;
use crate::layout::{layout_report, ReportLayout};
use crate::pdf::render_pdf;

pub const DEFAULT_PRODUCT: &str = "DermAI";

/// `DermAI_Report_2025-06-14.pdf`
pub fn report_file_name(product: &str, date: NaiveDate) -> String {
    format!("{}_Report_{}.pdf", product, date.format("%Y-%m-%d"))
}

/// Everything the report is built from.
#[derive(Debug, Clone)]
pub struct ReportInput {
    pub result: ClassificationResult,
    pub patient: PatientInfo,
    /// Original upload: PNG/JPEG bytes or a base64 data URI.
    pub image: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct GeneratedReport {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub page_count: usize,
}

impl GeneratedReport {
    /// Write the file into `dir` and return its path.
    pub fn save_to(&self, dir: &Path) -> Result<PathBuf, ReportError> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(&self.file_name);
        std::fs::write(&path, &self.bytes)?;
        info!(path = %path.display(), pages = self.page_count, "Report saved");
        Ok(path)
    }
}

#[derive(Debug, Clone)]
pub struct ReportGenerator {
    product: String,
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_PRODUCT)
    }
}

impl ReportGenerator {
    pub fn new(product: impl Into<String>) -> Self {
        Self {
            product: product.into(),
        }
    }

    pub fn product(&self) -> &str {
        &self.product
    }

    /// Lay out the pages without encoding anything.
    pub fn layout(&self, input: &ReportInput, generated_at: DateTime<Utc>) -> ReportLayout {
        let stamp = generated_at
            .with_timezone(&Local)
            .format("%-m/%-d/%Y, %-I:%M:%S %p")
            .to_string();
        layout_report(&self.product, &input.result, &input.patient, &stamp)
    }

    pub fn generate(&self, input: &ReportInput) -> Result<GeneratedReport, ReportError> {
        self.generate_at(input, Utc::now())
    }

    pub fn generate_at(
        &self,
        input: &ReportInput,
        generated_at: DateTime<Utc>,
    ) -> Result<GeneratedReport, ReportError> {
        let image = bitmap::decode(&input.image).map_err(|e| {
            warn!(error = %e, "Report image could not be embedded");
            e
        })?;
        let layout = self.layout(input, generated_at);
        let bytes = render_pdf(&layout, Some(&image))?;
        Ok(GeneratedReport {
            file_name: report_file_name(&self.product, generated_at.date_naive()),
            bytes,
            page_count: layout.page_count(),
        })
    }
}

/// Report generation state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportState {
    Idle,
    Generating,
}

impl ReportState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportState::Idle => "idle",
            ReportState::Generating => "generating",
        }
    }
}

/// Pending flag for report generation. Only one generation runs at a time and
/// it cannot be cancelled; the state returns to idle when the guard drops,
/// whether the run succeeded or failed.
#[derive(Debug, Clone, Default)]
pub struct ReportJob {
    generating: Arc<AtomicBool>,
}

impl ReportJob {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ReportState {
        if self.generating.load(Ordering::SeqCst) {
            ReportState::Generating
        } else {
            ReportState::Idle
        }
    }

    pub fn is_generating(&self) -> bool {
        self.state() == ReportState::Generating
    }

    /// Move `Idle -> Generating`. Fails with [`ReportError::Busy`] when a run is
    /// already in progress.
    pub fn start(&self) -> Result<ReportGuard, ReportError> {
        self.generating
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| ReportError::Busy)?;
        Ok(ReportGuard {
            generating: self.generating.clone(),
        })
    }
}

#[derive(Debug)]
pub struct ReportGuard {
    generating: Arc<AtomicBool>,
}

impl Drop for ReportGuard {
    fn drop(&mut self) {
        self.generating.store(false, Ordering::SeqCst);
    }
}
