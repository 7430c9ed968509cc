use std::path::Path;

use dermai_core::{ClassificationRequest, ImageUpload, PatientInfo};
use tracing::debug;

use crate::error::ClassifyError;

pub const MISSING_IMAGE: &str = "Please select an image before predicting.";
pub const INVALID_SELECTION: &str = "Please select a valid image file.";
pub const INVALID_DROP: &str = "Please drop a valid image file.";

/// Raw state of the prediction form.
#[derive(Debug, Clone, Default)]
pub struct FormInput {
    image: Option<ImageUpload>,
    pub patient: PatientInfo,
}

impl FormInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pick an image from disk. Non-image files are rejected and the previous
    /// selection is kept.
    pub fn select_image(&mut self, path: &Path) -> Result<(), ClassifyError> {
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("image")
            .to_string();
        self.accept(file_name, bytes, INVALID_SELECTION)
    }

    /// Accept a dropped file, as the drag-and-drop area does.
    pub fn drop_file(&mut self, file_name: &str, bytes: Vec<u8>) -> Result<(), ClassifyError> {
        self.accept(file_name.to_string(), bytes, INVALID_DROP)
    }

    fn accept(
        &mut self,
        file_name: String,
        bytes: Vec<u8>,
        rejection: &str,
    ) -> Result<(), ClassifyError> {
        let mime_type = detect_image_mime(&file_name, &bytes)
            .ok_or_else(|| ClassifyError::Validation(rejection.to_string()))?;
        debug!(file = %file_name, mime = %mime_type, bytes = bytes.len(), "Image selected");
        self.image = Some(ImageUpload {
            file_name,
            mime_type,
            bytes,
        });
        Ok(())
    }

    pub fn clear_image(&mut self) {
        self.image = None;
    }

    pub fn image(&self) -> Option<&ImageUpload> {
        self.image.as_ref()
    }

    /// Mirrors the submit button: disabled until an image is chosen.
    pub fn can_submit(&self) -> bool {
        self.image.is_some()
    }

    /// Build the request payload. Only the image is required.
    pub fn validate(&self) -> Result<ClassificationRequest, ClassifyError> {
        let image = self
            .image
            .clone()
            .ok_or_else(|| ClassifyError::Validation(MISSING_IMAGE.to_string()))?;
        Ok(ClassificationRequest {
            image,
            patient: self.patient.clone(),
        })
    }
}

/// Return an `image/*` MIME type for the file, from its extension or, failing
/// that, from the leading bytes. `None` when it is not an image.
pub fn detect_image_mime(file_name: &str, bytes: &[u8]) -> Option<String> {
    let from_name = mime_guess::from_path(file_name)
        .first()
        .filter(|m| m.type_() == mime_guess::mime::IMAGE)
        .map(|m| m.essence_str().to_string());

    from_name.or_else(|| {
        image::guess_format(bytes)
            .ok()
            .map(|format| format.to_mime_type().to_string())
            .filter(|mime| mime.starts_with("image/"))
    })
}
