use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Placeholder shown wherever an optional patient field was left empty.
pub const NOT_PROVIDED: &str = "Not provided";

// ── Request side ──────────────────────────────────────────────

/// An uploaded lesion image, already checked to carry an `image/*` MIME type.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for ImageUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageUpload")
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
    Other,
    #[default]
    #[serde(rename = "")]
    Unspecified,
}

impl Sex {
    /// Form value sent to the backend (empty when unspecified).
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "male",
            Sex::Female => "female",
            Sex::Other => "other",
            Sex::Unspecified => "",
        }
    }
}

impl std::fmt::Display for Sex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Sex {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "male" | "m" => Ok(Sex::Male),
            "female" | "f" => Ok(Sex::Female),
            "other" => Ok(Sex::Other),
            "" => Ok(Sex::Unspecified),
            other => Err(format!("unknown sex '{}': expected male, female or other", other)),
        }
    }
}

/// Optional patient metadata collected next to the image. Values are opaque
/// strings; nothing here is validated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientInfo {
    #[serde(default)]
    pub age: String,
    #[serde(default)]
    pub sex: Sex,
    #[serde(default)]
    pub localization: String,
    #[serde(default)]
    pub dx_type: String,
}

impl PatientInfo {
    pub fn age_or_placeholder(&self) -> &str {
        or_placeholder(&self.age)
    }

    pub fn sex_or_placeholder(&self) -> &str {
        or_placeholder(self.sex.as_str())
    }

    pub fn localization_or_placeholder(&self) -> &str {
        or_placeholder(&self.localization)
    }

    pub fn dx_type_or_placeholder(&self) -> &str {
        or_placeholder(&self.dx_type)
    }
}

fn or_placeholder(value: &str) -> &str {
    if value.trim().is_empty() {
        NOT_PROVIDED
    } else {
        value
    }
}

/// One classification submission. Created per submit, dropped once the call resolves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationRequest {
    pub image: ImageUpload,
    pub patient: PatientInfo,
}

// ── Result side ───────────────────────────────────────────────

/// Classification returned by the backend. Never mutated after receipt; views
/// are re-derived from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub cnn_result: CnnResult,
    pub nlp_result: NlpResult,
    pub segmentation_result: String,
    pub combined_result: CombinedResult,
    #[serde(default)]
    pub plot_image: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CnnResult {
    pub predicted_class: String,
    pub confidence: f64,
    /// Class name to probability, in the order the backend sent them.
    pub all_probabilities: IndexMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NlpResult {
    pub predicted_class: String,
    #[serde(default)]
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedResult {
    pub predicted_class: String,
    pub confidence: f64,
    pub source: String,
}

/// Format a `[0, 1]` fraction as a percentage with `decimals` places, e.g. `82.0%`.
pub fn format_percent(fraction: f64, decimals: usize) -> String {
    format!("{:.*}%", decimals, fraction * 100.0)
}
