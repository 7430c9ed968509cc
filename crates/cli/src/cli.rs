use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use dermai_core::{PatientInfo, Sex};

/// Skin-lesion classification client.
///
/// Sends an image and optional patient metadata to the classification
/// backend, renders the result, writes PDF reports and chats with the
/// dermatology assistant.
#[derive(Parser, Debug)]
#[command(name = "dermai", version, about)]
pub struct CliArgs {
    /// Path to config file (default: ~/.config/dermai/config.toml)
    #[arg(long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Classify an image.
    Predict(PredictArgs),
    /// Build a PDF report from a saved result.
    Report(ReportArgs),
    /// Talk to the dermatology assistant.
    Chat(ChatArgs),
}

/// Optional patient metadata. Anything left out prints as "Not provided".
#[derive(Args, Debug, Clone, Default)]
pub struct PatientArgs {
    #[arg(long)]
    pub age: Option<String>,

    /// male, female or other
    #[arg(long)]
    pub sex: Option<Sex>,

    /// Body site of the lesion
    #[arg(long)]
    pub localization: Option<String>,

    /// Diagnosis type hint (histo, follow_up, consensus, confocal)
    #[arg(long = "dx-type")]
    pub dx_type: Option<String>,
}

impl PatientArgs {
    pub fn into_patient(self) -> PatientInfo {
        PatientInfo {
            age: self.age.unwrap_or_default(),
            sex: self.sex.unwrap_or_default(),
            localization: self.localization.unwrap_or_default(),
            dx_type: self.dx_type.unwrap_or_default(),
        }
    }
}

#[derive(Args, Debug)]
pub struct PredictArgs {
    /// Lesion image (PNG or JPEG)
    #[arg(long)]
    pub image: PathBuf,

    #[command(flatten)]
    pub patient: PatientArgs,

    /// Classification backend URL (overrides CLASSIFIER_URL)
    #[arg(long)]
    pub backend: Option<String>,

    /// Also write the PDF report
    #[arg(long)]
    pub report: bool,

    /// Directory for the report (overrides REPORT_DIR)
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Print the raw backend JSON instead of the summary
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ReportArgs {
    /// Result JSON as written by `predict --json`
    #[arg(long)]
    pub result: PathBuf,

    /// The image that was classified
    #[arg(long)]
    pub image: PathBuf,

    #[command(flatten)]
    pub patient: PatientArgs,

    /// Directory for the report (overrides REPORT_DIR)
    #[arg(long)]
    pub out_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ChatArgs {
    /// System prompt override
    #[arg(long)]
    pub system_prompt: Option<String>,

    /// Assistant provider: proxy or gemini (overrides ASSISTANT_PROVIDER)
    #[arg(long)]
    pub provider: Option<String>,
}
