//! Language-independent text measurement.
//!
//! The real engine relies on a browser/DOM to measure label bounding boxes.
//! A systems-language port has no such oracle, so — same approach as the
//! reference workspace's headless `DeterministicTextMeasurer` — label
//! dimensions are approximated with a fixed-width monospace model. This
//! keeps layout fully reproducible (invariant: determinism, `spec.md` §8.1)
//! without depending on a font-rendering stack.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextMetrics {
    pub width: f64,
    pub height: f64,
}

pub trait TextMeasurer {
    fn measure(&self, text: &str, font_size: f64) -> TextMetrics;
}

/// Fixed-width monospace measurer: `char_width_factor * font_size` per
/// character, `line_height_factor * font_size` per line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeterministicTextMeasurer {
    pub char_width_factor: f64,
    pub line_height_factor: f64,
}

impl Default for DeterministicTextMeasurer {
    fn default() -> Self {
        Self {
            char_width_factor: 0.6,
            line_height_factor: 1.2,
        }
    }
}

impl TextMeasurer for DeterministicTextMeasurer {
    fn measure(&self, text: &str, font_size: f64) -> TextMetrics {
        if text.is_empty() {
            return TextMetrics {
                width: 0.0,
                height: 0.0,
            };
        }
        let lines: Vec<&str> = text.split('\n').collect();
        let max_chars = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
        TextMetrics {
            width: max_chars as f64 * font_size * self.char_width_factor,
            height: lines.len() as f64 * font_size * self.line_height_factor,
        }
    }
}
