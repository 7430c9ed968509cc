//! Font metrics for the two standard fonts the report uses, and greedy line
//! wrapping on top of them.

/// Millimetres per PDF point.
pub const PT_TO_MM: f32 = 25.4 / 72.0;

/// Glyph advance for characters outside the printable ASCII tables.
const FALLBACK_WIDTH: u16 = 556;

/// Helvetica advance widths (1/1000 em) for `' '..='~'`.
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
    278, 278, 584, 584, 584, 556, 1015, // ':'..'@'
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // 'A'..'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N'..'Z'
    278, 278, 278, 469, 556, 333, // '['..'`'
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // 'a'..'m'
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // 'n'..'z'
    334, 260, 334, 584, // '{'..'~'
];

/// Helvetica-Bold advance widths (1/1000 em) for `' '..='~'`.
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    333, 333, 584, 584, 584, 611, 975,
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    333, 278, 333, 584, 556, 333,
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889,
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500,
    389, 280, 389, 584,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Font {
    Regular,
    Bold,
}

impl Font {
    pub fn base_font(&self) -> &'static str {
        match self {
            Font::Regular => "Helvetica",
            Font::Bold => "Helvetica-Bold",
        }
    }

    /// Name of the font in the page resource dictionary.
    pub fn resource_name(&self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
        }
    }

    fn glyph_width(&self, ch: char) -> u16 {
        let table = match self {
            Font::Regular => &HELVETICA,
            Font::Bold => &HELVETICA_BOLD,
        };
        match ch {
            ' '..='~' => table[ch as usize - ' ' as usize],
            _ => FALLBACK_WIDTH,
        }
    }
}

/// Rendered width of `text` in millimetres.
pub fn text_width(text: &str, font: Font, size_pt: f32) -> f32 {
    let units: u32 = text.chars().map(|c| u32::from(font.glyph_width(c))).sum();
    units as f32 / 1000.0 * size_pt * PT_TO_MM
}

/// Split `text` into lines no wider than `max_width` millimetres.
///
/// Breaks at spaces; explicit newlines start a new line; a single word wider
/// than the limit is broken between characters. An empty paragraph yields an
/// empty line, so the result always has at least one entry.
pub fn wrap_text(text: &str, max_width: f32, font: Font, size_pt: f32) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let paragraph = paragraph.trim_end_matches('\r');
        let mut current = String::new();

        for word in paragraph.split(' ').filter(|w| !w.is_empty()) {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", current, word)
            };

            if text_width(&candidate, font, size_pt) <= max_width {
                current = candidate;
                continue;
            }

            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }

            if text_width(word, font, size_pt) <= max_width {
                current = word.to_string();
            } else {
                let mut pieces = break_word(word, max_width, font, size_pt);
                current = pieces.pop().unwrap_or_default();
                lines.extend(pieces);
            }
        }

        lines.push(current);
    }

    lines
}

fn break_word(word: &str, max_width: f32, font: Font, size_pt: f32) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    for ch in word.chars() {
        current.push(ch);
        if text_width(&current, font, size_pt) > max_width && current.chars().count() > 1 {
            current.pop();
            pieces.push(std::mem::take(&mut current));
            current.push(ch);
        }
    }
    pieces.push(current);
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_scales_with_size() {
        let small = text_width("Melanoma", Font::Regular, 10.0);
        let large = text_width("Melanoma", Font::Regular, 20.0);
        assert!((large - 2.0 * small).abs() < 1e-4);
        assert!(text_width("Melanoma", Font::Bold, 10.0) > small);
    }

    #[test]
    fn space_is_278_units() {
        // 278/1000 em at 72pt is 278/1000 inch
        let w = text_width(" ", Font::Regular, 72.0);
        assert!((w - 0.278 * 25.4).abs() < 1e-3);
    }

    #[test]
    fn short_text_stays_on_one_line() {
        assert_eq!(
            wrap_text("Lesion is symmetric.", 180.0, Font::Regular, 10.0),
            vec!["Lesion is symmetric."]
        );
    }

    #[test]
    fn long_text_wraps_within_width() {
        let text =
            "The segmented region shows irregular borders with asymmetric pigmentation. ".repeat(6);
        let lines = wrap_text(text.trim(), 180.0, Font::Regular, 10.0);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(text_width(line, Font::Regular, 10.0) <= 180.0, "too wide: {line}");
        }
        assert_eq!(lines.join(" "), text.trim());
    }

    #[test]
    fn newlines_and_empty_text() {
        assert_eq!(wrap_text("a\nb", 180.0, Font::Regular, 10.0), vec!["a", "b"]);
        assert_eq!(wrap_text("", 180.0, Font::Regular, 10.0), vec![""]);
    }

    #[test]
    fn oversized_word_is_broken() {
        let word = "x".repeat(200);
        let lines = wrap_text(&word, 20.0, Font::Regular, 10.0);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), word);
        for line in &lines {
            assert!(text_width(line, Font::Regular, 10.0) <= 20.0);
        }
    }
}
