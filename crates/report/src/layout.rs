//! Page layout of the analysis report.
//!
//! Coordinates are millimetres from the top-left corner of an A4 page, text
//! positions are baselines. The upper part of page one sits at fixed offsets;
//! from the CNN block on, lines are placed by a running cursor that starts a
//! new page instead of running into the footer band.

use dermai_core::{format_percent, ClassificationResult, PatientInfo};

use crate::metrics::{wrap_text, Font};

pub const PAGE_WIDTH: f32 = 210.0;
pub const PAGE_HEIGHT: f32 = 297.0;

pub const MARGIN_LEFT: f32 = 15.0;
pub const INDENT_LEFT: f32 = 20.0;
pub const CONTENT_WIDTH: f32 = 180.0;

pub const HEADER_HEIGHT: f32 = 20.0;
pub const FOOTER_TOP: f32 = 280.0;
pub const FOOTER_HEIGHT: f32 = 17.0;
/// Last baseline a flowing line may use before a page break.
pub const CONTENT_BOTTOM: f32 = 275.0;
/// First baseline on a continuation page.
pub const CONTINUATION_TOP: f32 = 30.0;

pub const IMAGE_X: f32 = 15.0;
pub const IMAGE_Y: f32 = 75.0;
pub const IMAGE_WIDTH: f32 = 80.0;
pub const IMAGE_HEIGHT: f32 = 60.0;

pub const CNN_CURSOR_START: f32 = 180.0;
pub const LINE_ADVANCE: f32 = 6.0;
pub const PROBABILITY_ADVANCE: f32 = 5.0;
pub const SECTION_GAP: f32 = 3.0;
/// Baseline distance inside the wrapped segmentation paragraph (10pt * 1.15).
pub const PARAGRAPH_ADVANCE: f32 = 10.0 * 1.15 * crate::metrics::PT_TO_MM;

const TITLE_SIZE: f32 = 16.0;
const HEADING_SIZE: f32 = 12.0;
const BODY_SIZE: f32 = 10.0;
const FOOTER_SIZE: f32 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb(pub u8, pub u8, pub u8);

pub const HEADER_FILL: Rgb = Rgb(59, 130, 246);
pub const FOOTER_FILL: Rgb = Rgb(240, 240, 240);
const WHITE: Rgb = Rgb(255, 255, 255);
const MUTED: Rgb = Rgb(100, 100, 100);
const BODY: Rgb = Rgb(60, 60, 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    /// `x` is the horizontal centre of the line.
    Center,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    FillRect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: Rgb,
    },
    Text {
        x: f32,
        y: f32,
        text: String,
        font: Font,
        size: f32,
        color: Rgb,
        align: Align,
    },
    /// Placement of the uploaded lesion image.
    Image {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageLayout {
    pub ops: Vec<DrawOp>,
}

/// Vertical cursor positions around the CNN probability list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CursorSpan {
    pub start: f32,
    pub end: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportLayout {
    pub pages: Vec<PageLayout>,
    /// Cursor before the first and after the last probability line.
    pub probabilities: CursorSpan,
    /// Cursor after the last segmentation line.
    pub final_cursor: f32,
}

impl ReportLayout {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// All text on all pages in drawing order.
    pub fn texts(&self) -> Vec<&str> {
        self.pages
            .iter()
            .flat_map(|p| p.ops.iter())
            .filter_map(|op| match op {
                DrawOp::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

pub fn title(product: &str) -> String {
    format!("{} - Skin Lesion Analysis Report", product)
}

pub fn disclaimer(product: &str) -> [String; 2] {
    [
        format!(
            "This report is generated by {} and should be reviewed by a healthcare professional.",
            product
        ),
        "It is not a substitute for professional medical advice, diagnosis, or treatment.".to_string(),
    ]
}

/// Single-column writer with an explicit, mutable cursor.
struct Flow {
    product: String,
    pages: Vec<PageLayout>,
    y: f32,
}

impl Flow {
    fn new(product: &str) -> Self {
        Self {
            product: product.to_string(),
            pages: vec![PageLayout::default()],
            y: 0.0,
        }
    }

    fn page(&mut self) -> &mut PageLayout {
        // `pages` starts non-empty and only grows.
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn push(&mut self, op: DrawOp) {
        self.page().ops.push(op);
    }

    fn text(&mut self, x: f32, y: f32, text: impl Into<String>, font: Font, size: f32, color: Rgb) {
        self.push(DrawOp::Text {
            x,
            y,
            text: text.into(),
            font,
            size,
            color,
            align: Align::Left,
        });
    }

    fn centered(&mut self, y: f32, text: impl Into<String>, font: Font, size: f32, color: Rgb) {
        self.push(DrawOp::Text {
            x: PAGE_WIDTH / 2.0,
            y,
            text: text.into(),
            font,
            size,
            color,
            align: Align::Center,
        });
    }

    fn header_band(&mut self, title: String) {
        self.push(DrawOp::FillRect {
            x: 0.0,
            y: 0.0,
            width: PAGE_WIDTH,
            height: HEADER_HEIGHT,
            color: HEADER_FILL,
        });
        self.centered(12.0, title, Font::Bold, TITLE_SIZE, WHITE);
    }

    /// Start a new page when the next baseline would enter the footer area.
    fn ensure_room(&mut self) {
        if self.y > CONTENT_BOTTOM {
            self.pages.push(PageLayout::default());
            let continued = format!("{} (continued)", title(&self.product));
            self.header_band(continued);
            self.y = CONTINUATION_TOP;
        }
    }

    /// Draw one flowing line at the cursor and advance it.
    fn line(&mut self, x: f32, text: impl Into<String>, font: Font, advance: f32) {
        self.ensure_room();
        let y = self.y;
        self.text(x, y, text, font, BODY_SIZE, BODY);
        self.y += advance;
    }

    fn gap(&mut self, height: f32) {
        self.y += height;
    }

    /// Footer band and disclaimer, drawn on every page at a fixed offset.
    fn finish(mut self) -> Vec<PageLayout> {
        let [first, second] = disclaimer(&self.product);
        for page in &mut self.pages {
            page.ops.push(DrawOp::FillRect {
                x: 0.0,
                y: FOOTER_TOP,
                width: PAGE_WIDTH,
                height: FOOTER_HEIGHT,
                color: FOOTER_FILL,
            });
            for (text, y) in [(&first, 285.0), (&second, 290.0)] {
                page.ops.push(DrawOp::Text {
                    x: PAGE_WIDTH / 2.0,
                    y,
                    text: text.clone(),
                    font: Font::Regular,
                    size: FOOTER_SIZE,
                    color: MUTED,
                    align: Align::Center,
                });
            }
        }
        self.pages
    }
}

/// Lay out the report. Pure: identical inputs give identical layouts, and
/// `generated_on` only affects the timestamp line.
pub fn layout_report(
    product: &str,
    result: &ClassificationResult,
    patient: &PatientInfo,
    generated_on: &str,
) -> ReportLayout {
    let mut flow = Flow::new(product);

    flow.header_band(title(product));
    flow.centered(
        25.0,
        format!("Generated on: {}", generated_on),
        Font::Regular,
        BODY_SIZE,
        MUTED,
    );

    // Patient information: four fixed lines, placeholders keep their slot.
    flow.text(MARGIN_LEFT, 35.0, "Patient Information", Font::Bold, HEADING_SIZE, BODY);
    let patient_lines = [
        ("Age", patient.age_or_placeholder()),
        ("Sex", patient.sex_or_placeholder()),
        ("Localization", patient.localization_or_placeholder()),
        ("Diagnosis Type", patient.dx_type_or_placeholder()),
    ];
    for (i, (label, value)) in patient_lines.iter().enumerate() {
        let y = 42.0 + LINE_ADVANCE * i as f32;
        flow.text(MARGIN_LEFT, y, format!("{}: {}", label, value), Font::Regular, BODY_SIZE, BODY);
    }

    flow.text(MARGIN_LEFT, 70.0, "Original Image", Font::Bold, HEADING_SIZE, BODY);
    flow.push(DrawOp::Image {
        x: IMAGE_X,
        y: IMAGE_Y,
        width: IMAGE_WIDTH,
        height: IMAGE_HEIGHT,
    });

    let combined = &result.combined_result;
    flow.text(MARGIN_LEFT, 145.0, "Analysis Results", Font::Bold, HEADING_SIZE, BODY);
    flow.text(
        MARGIN_LEFT,
        152.0,
        format!("Predicted Class: {}", combined.predicted_class),
        Font::Regular,
        BODY_SIZE,
        BODY,
    );
    flow.text(
        MARGIN_LEFT,
        158.0,
        format!("Confidence: {}", format_percent(combined.confidence, 2)),
        Font::Regular,
        BODY_SIZE,
        BODY,
    );
    flow.text(
        MARGIN_LEFT,
        164.0,
        format!("Source: {}", combined.source),
        Font::Regular,
        BODY_SIZE,
        BODY,
    );

    // CNN block: the cursor takes over from here.
    let cnn = &result.cnn_result;
    flow.text(MARGIN_LEFT, 174.0, "CNN Analysis", Font::Bold, BODY_SIZE, BODY);
    flow.y = CNN_CURSOR_START;
    flow.line(
        MARGIN_LEFT,
        format!("Predicted Class: {}", cnn.predicted_class),
        Font::Regular,
        LINE_ADVANCE,
    );
    flow.line(
        MARGIN_LEFT,
        format!("Confidence: {}", format_percent(cnn.confidence, 2)),
        Font::Regular,
        LINE_ADVANCE,
    );
    flow.line(MARGIN_LEFT, "Class Probabilities:", Font::Regular, LINE_ADVANCE);

    let probabilities_start = flow.y;
    for (class_name, probability) in &cnn.all_probabilities {
        flow.line(
            INDENT_LEFT,
            format!("{}: {}", class_name, format_percent(*probability, 1)),
            Font::Regular,
            PROBABILITY_ADVANCE,
        );
    }
    let probabilities = CursorSpan {
        start: probabilities_start,
        end: flow.y,
    };

    let nlp = &result.nlp_result;
    flow.gap(SECTION_GAP);
    flow.line(MARGIN_LEFT, "NLP Analysis", Font::Bold, LINE_ADVANCE);
    flow.line(
        MARGIN_LEFT,
        format!("Predicted Class: {}", nlp.predicted_class),
        Font::Regular,
        LINE_ADVANCE,
    );
    if let Some(confidence) = nlp.confidence {
        flow.line(
            MARGIN_LEFT,
            format!("Confidence: {}", format_percent(confidence, 2)),
            Font::Regular,
            LINE_ADVANCE,
        );
    }

    flow.gap(SECTION_GAP);
    flow.line(MARGIN_LEFT, "Segmentation Analysis", Font::Bold, LINE_ADVANCE);
    for line in wrap_text(&result.segmentation_result, CONTENT_WIDTH, Font::Regular, BODY_SIZE) {
        flow.line(MARGIN_LEFT, line, Font::Regular, PARAGRAPH_ADVANCE);
    }

    let final_cursor = flow.y;
    ReportLayout {
        pages: flow.finish(),
        probabilities,
        final_cursor,
    }
}
