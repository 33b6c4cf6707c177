//! Render-to-audio boundary.
//!
//! No synthesis happens in this crate. A renderer turns trace bytes into
//! normalized mono samples at 44.1 kHz; this module only defines that seam
//! and the comparison used on round-trip fixtures.

/// Something that plays a trace into audio samples.
pub trait TraceRenderer {
    type Error: std::error::Error;

    /// Render `trace` to mono samples in `-1.0..=1.0` at 44.1 kHz.
    fn render(&self, trace: &[u8]) -> Result<Vec<f32>, Self::Error>;
}

/// Mean squared difference of two equally long sample buffers.
///
/// Returns `None` when the lengths differ.
pub fn mean_squared_error(a: &[f32], b: &[f32]) -> Option<f64> {
    if a.len() != b.len() {
        return None;
    }
    if a.is_empty() {
        return Some(0.0);
    }
    let sum: f64 = a
        .iter()
        .zip(b)
        .map(|(&x, &y)| {
            let d = x as f64 - y as f64;
            d * d
        })
        .sum();
    Some(sum / a.len() as f64)
}

/// Render two traces and compare them with [`mean_squared_error`].
pub fn render_distance<R: TraceRenderer>(
    renderer: &R,
    a: &[u8],
    b: &[u8],
) -> Result<Option<f64>, R::Error> {
    let a = renderer.render(a)?;
    let b = renderer.render(b)?;
    Ok(mean_squared_error(&a, &b))
}
