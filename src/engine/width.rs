use crate::engine::frequency::{CharClass, FIRST_PRINTABLE, FrequencyModel, MAX_OFFSET};
use crate::error::EstimateError;

/// Font metrics provider: horizontal advance of a single glyph.
pub trait GlyphMetrics {
    fn advance(&self, ch: char) -> f64;
}

/// Terminal metrics: every printable ASCII glyph occupies one cell.
#[derive(Clone, Copy, Debug, Default)]
pub struct Monospace {
    pub cell_width: f64,
}

impl Monospace {
    pub fn new(cell_width: f64) -> Self {
        Self { cell_width }
    }
}

impl GlyphMetrics for Monospace {
    fn advance(&self, _ch: char) -> f64 {
        self.cell_width
    }
}

/// Width table indexed by character offset, covering all of printable ASCII.
pub fn width_table(metrics: &impl GlyphMetrics) -> Vec<f64> {
    (0..=MAX_OFFSET as u32)
        .filter_map(|offset| char::from_u32(offset + FIRST_PRINTABLE))
        .map(|ch| metrics.advance(ch))
        .collect()
}

/// Expected width of a single character of unknown text.
///
/// Each class table contributes the frequency-weighted sum of its glyph widths,
/// and the three sums are blended by the class weights. Panics if `widths` is
/// shorter than [`FrequencyModel::required_width_len`]; that is a bug in the
/// caller, not a runtime condition.
pub fn estimate(model: &FrequencyModel, widths: &[f64]) -> f64 {
    let weights = model.weights();
    CharClass::ALL
        .iter()
        .map(|&class| weights.get(class) * class_sum(model, class, widths))
        .sum()
}

/// Same as [`estimate`] but reports a short width table instead of panicking.
pub fn try_estimate(model: &FrequencyModel, widths: &[f64]) -> Result<f64, EstimateError> {
    let required = model.required_width_len();
    if widths.len() < required {
        return Err(EstimateError::WidthTableTooShort {
            required,
            actual: widths.len(),
        });
    }
    Ok(estimate(model, widths))
}

/// Expected rendered width of `char_count` characters of unknown text.
pub fn estimate_line_width(model: &FrequencyModel, widths: &[f64], char_count: usize) -> f64 {
    estimate(model, widths) * char_count as f64
}

fn class_sum(model: &FrequencyModel, class: CharClass, widths: &[f64]) -> f64 {
    model
        .table(class)
        .entries()
        .iter()
        .map(|&(offset, freq)| widths[offset] * freq)
        .sum()
}
