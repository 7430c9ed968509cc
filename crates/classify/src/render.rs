//! Display model for a classification result.
//!
//! Pure formatting: nothing here changes the result, it only derives strings
//! for the four result sections and the probability bars.

use std::fmt;

use dermai_core::{format_percent, ClassificationResult};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultView {
    pub combined: CombinedSection,
    pub cnn: CnnSection,
    pub nlp: NlpSection,
    pub segmentation: String,
    pub plot_image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CombinedSection {
    pub predicted_class: String,
    pub confidence: String,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CnnSection {
    pub predicted_class: String,
    pub confidence: String,
    pub probabilities: Vec<ProbabilityBar>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NlpSection {
    pub predicted_class: String,
    /// `None` when the backend sent no confidence; the line is then shown without it.
    pub confidence: Option<String>,
}

/// One bar of the CNN probability chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbabilityBar {
    pub label: String,
    pub fraction: f64,
    pub percent: String,
}

impl ProbabilityBar {
    /// `nv: 82.0%`
    pub fn line(&self) -> String {
        format!("{}: {}", self.label, self.percent)
    }
}

impl From<&ClassificationResult> for ResultView {
    fn from(result: &ClassificationResult) -> Self {
        let probabilities = result
            .cnn_result
            .all_probabilities
            .iter()
            .map(|(label, &fraction)| ProbabilityBar {
                label: label.clone(),
                fraction,
                percent: format_percent(fraction, 1),
            })
            .collect();

        Self {
            combined: CombinedSection {
                predicted_class: result.combined_result.predicted_class.clone(),
                confidence: format_percent(result.combined_result.confidence, 2),
                source: result.combined_result.source.clone(),
            },
            cnn: CnnSection {
                predicted_class: result.cnn_result.predicted_class.clone(),
                confidence: format_percent(result.cnn_result.confidence, 2),
                probabilities,
            },
            nlp: NlpSection {
                predicted_class: result.nlp_result.predicted_class.clone(),
                confidence: result.nlp_result.confidence.map(|c| format_percent(c, 2)),
            },
            segmentation: result.segmentation_result.clone(),
            plot_image: Some(result.plot_image.clone()).filter(|p| !p.is_empty()),
        }
    }
}

impl ResultView {
    pub fn probability_lines(&self) -> Vec<String> {
        self.cnn.probabilities.iter().map(ProbabilityBar::line).collect()
    }

    /// NLP summary, e.g. `Predicted Class: nv (Confidence: 64.00%)`.
    pub fn nlp_line(&self) -> String {
        match &self.nlp.confidence {
            Some(confidence) => format!(
                "Predicted Class: {} (Confidence: {})",
                self.nlp.predicted_class, confidence
            ),
            None => format!("Predicted Class: {}", self.nlp.predicted_class),
        }
    }
}

impl fmt::Display for ResultView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Final Diagnosis")?;
        writeln!(f, "  {}", self.combined.predicted_class)?;
        writeln!(f, "  Confidence: {}", self.combined.confidence)?;
        writeln!(f, "  Source: {}", self.combined.source)?;
        writeln!(f)?;
        writeln!(f, "CNN Analysis")?;
        writeln!(
            f,
            "  Predicted Class: {} (Confidence: {})",
            self.cnn.predicted_class, self.cnn.confidence
        )?;
        for bar in &self.cnn.probabilities {
            writeln!(f, "    {}", bar.line())?;
        }
        writeln!(f)?;
        writeln!(f, "NLP Analysis")?;
        writeln!(f, "  {}", self.nlp_line())?;
        writeln!(f)?;
        writeln!(f, "Segmentation Analysis")?;
        writeln!(f, "  {}", self.segmentation)?;
        if let Some(plot) = &self.plot_image {
            writeln!(f)?;
            if plot.starts_with("data:") {
                writeln!(f, "Visualization: embedded image ({} bytes)", plot.len())?;
            } else {
                writeln!(f, "Visualization: {}", plot)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dermai_core::{CnnResult, CombinedResult, NlpResult};
    use indexmap::IndexMap;

    fn sample(nlp_confidence: Option<f64>) -> ClassificationResult {
        let mut probs = IndexMap::new();
        probs.insert("nv".to_string(), 0.82);
        probs.insert("mel".to_string(), 0.10);
        probs.insert("bcc".to_string(), 0.08);
        ClassificationResult {
            cnn_result: CnnResult {
                predicted_class: "nv".into(),
                confidence: 0.82,
                all_probabilities: probs,
            },
            nlp_result: NlpResult {
                predicted_class: "mel".into(),
                confidence: nlp_confidence,
            },
            segmentation_result: "Asymmetric border.".into(),
            combined_result: CombinedResult {
                predicted_class: "nv".into(),
                confidence: 0.82,
                source: "cnn".into(),
            },
            plot_image: String::new(),
        }
    }

    #[test]
    fn probability_lines_keep_mapping_order() {
        let view = ResultView::from(&sample(Some(0.5)));
        assert_eq!(
            view.probability_lines(),
            vec!["nv: 82.0%", "mel: 10.0%", "bcc: 8.0%"]
        );
    }

    #[test]
    fn null_nlp_confidence_is_omitted() {
        let view = ResultView::from(&sample(None));
        assert_eq!(view.nlp.confidence, None);
        assert_eq!(view.nlp_line(), "Predicted Class: mel");
        let text = view.to_string();
        assert!(text.contains("Predicted Class: mel\n"));
    }

    #[test]
    fn confidences_use_two_decimals() {
        let view = ResultView::from(&sample(Some(0.6412)));
        assert_eq!(view.combined.confidence, "82.00%");
        assert_eq!(view.nlp_line(), "Predicted Class: mel (Confidence: 64.12%)");
        assert_eq!(view.plot_image, None);
    }
}
