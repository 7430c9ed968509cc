//! End-to-end report generation: layout, image embedding, PDF encoding, save.

use std::io::Cursor;

use chrono::{TimeZone, Utc};
use dermai_core::{ClassificationResult, PatientInfo, Sex};
use dermai_report::{ReportError, ReportGenerator, ReportInput};

fn sample_result(segmentation: &str) -> ClassificationResult {
    serde_json::from_value(serde_json::json!({
        "cnn_result": {
            "predicted_class": "mel",
            "confidence": 0.71,
            "all_probabilities": {"mel": 0.71, "nv": 0.2, "bkl": 0.05, "bcc": 0.04}
        },
        "nlp_result": {"predicted_class": "mel", "confidence": null},
        "segmentation_result": segmentation,
        "combined_result": {"predicted_class": "mel", "confidence": 0.71, "source": "cnn"},
        "plot_image": ""
    }))
    .unwrap()
}

fn png_bytes() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(32, 24, image::Rgb([180, 90, 60]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn input(segmentation: &str, image: Vec<u8>) -> ReportInput {
    ReportInput {
        result: sample_result(segmentation),
        patient: PatientInfo {
            age: "62".into(),
            sex: Sex::Male,
            localization: "face".into(),
            dx_type: "histo".into(),
        },
        image,
    }
}

#[test]
fn generates_single_page_pdf() {
    let generator = ReportGenerator::default();
    let at = Utc.with_ymd_and_hms(2025, 6, 14, 12, 0, 0).unwrap();
    let report = generator
        .generate_at(&input("Asymmetric lesion with irregular borders.", png_bytes()), at)
        .unwrap();

    assert_eq!(report.file_name, "DermAI_Report_2025-06-14.pdf");
    assert_eq!(report.page_count, 1);

    let doc = lopdf::Document::load_mem(&report.bytes).unwrap();
    assert_eq!(doc.get_pages().len(), 1);
}

#[test]
fn overflowing_segmentation_adds_pages() {
    let long =
        "Dermoscopic structures include atypical network, irregular dots and globules. ".repeat(80);
    let report = ReportGenerator::default()
        .generate(&input(&long, png_bytes()))
        .unwrap();

    assert!(report.page_count > 1);
    let doc = lopdf::Document::load_mem(&report.bytes).unwrap();
    assert_eq!(doc.get_pages().len(), report.page_count);
}

#[test]
fn repeated_generation_is_layout_identical() {
    let generator = ReportGenerator::default();
    let input = input("Symmetric lesion.", png_bytes());
    let first = generator.layout(&input, Utc.with_ymd_and_hms(2025, 1, 1, 8, 0, 0).unwrap());
    let second = generator.layout(&input, Utc.with_ymd_and_hms(2025, 1, 1, 8, 0, 0).unwrap());
    assert_eq!(first, second);
}

#[test]
fn unreadable_image_fails_cleanly() {
    let err = ReportGenerator::default()
        .generate(&input("text", b"not an image".to_vec()))
        .unwrap_err();
    assert!(matches!(err, ReportError::Image(_)));

    let app_err: dermai_core::AppError = err.into();
    assert!(app_err.to_string().starts_with("Failed to generate PDF"));
}

#[test]
fn save_writes_named_file() {
    let dir = tempfile::tempdir().unwrap();
    let report = ReportGenerator::default()
        .generate(&input("Symmetric lesion.", png_bytes()))
        .unwrap();
    let path = report.save_to(dir.path()).unwrap();

    assert_eq!(path.file_name().unwrap().to_str().unwrap(), report.file_name);
    assert_eq!(std::fs::read(&path).unwrap(), report.bytes);
}
