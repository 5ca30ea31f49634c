//! Window segmentation for bounded-context generators
//!
//! Splits a token count into overlapping windows of fixed length so that a
//! relation straddling a window boundary is fully visible in at least one
//! window. The excess coverage `num_windows * L - N` is spread evenly over
//! the window boundaries.

use relkg_core::{RelkgError, Result, Span};

/// Computes overlapping window boundaries over a token sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpanSegmenter {
    window_length: usize,
}

impl SpanSegmenter {
    /// Create a segmenter producing windows of `window_length` tokens
    pub fn new(window_length: usize) -> Result<Self> {
        if window_length == 0 {
            return Err(RelkgError::InvalidInput(
                "window length must be greater than 0".to_string(),
            ));
        }
        Ok(Self { window_length })
    }

    pub fn window_length(&self) -> usize {
        self.window_length
    }

    /// Number of windows needed for `total_tokens`
    pub fn num_windows(&self, total_tokens: usize) -> usize {
        total_tokens.div_ceil(self.window_length)
    }

    /// Tokens shared by consecutive windows
    pub fn overlap(&self, total_tokens: usize) -> usize {
        let num_windows = self.num_windows(total_tokens);
        let excess = (num_windows * self.window_length).saturating_sub(total_tokens);
        // Rounding down keeps the last window ending at or past the input.
        excess / num_windows.saturating_sub(1).max(1)
    }

    /// Distance between consecutive window starts
    pub fn step(&self, total_tokens: usize) -> usize {
        self.window_length - self.overlap(total_tokens)
    }

    /// Window boundaries covering `[0, total_tokens)`
    ///
    /// Windows are not clipped: the last one may end past `total_tokens`,
    /// and a single window of full length is returned when the input is
    /// shorter than the window.
    pub fn segment(&self, total_tokens: usize) -> Vec<Span> {
        let num_windows = self.num_windows(total_tokens);
        let step = self.step(total_tokens);

        (0..num_windows)
            .map(|i| Span::new(i * step, i * step + self.window_length))
            .collect()
    }
}

/// Window boundaries for `total_tokens` with windows of `window_length`
pub fn segment(total_tokens: usize, window_length: usize) -> Result<Vec<Span>> {
    Ok(SpanSegmenter::new(window_length)?.segment(total_tokens))
}
