//! QR label payloads and the rendering seam.
//!
//! This crate's responsibility ends at the payload text: a pipe-delimited
//! encoding of the fields a counter label needs. Drawing the actual QR image
//! belongs to a third-party renderer behind `LabelRenderer`; when the whole
//! chain is unavailable, the text placeholder keeps labels printable.

use crate::part::Part;

/// Pipe-delimited label content: product code, part name, car model, model
/// year, sell price.
pub fn label_payload(part: &Part) -> String {
    format!(
        "{}|{}|{}|{}|{}",
        part.product_code, part.part_name, part.car_model, part.model_year, part.sell_price
    )
}

/// A rendered label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelArt {
    /// Renderer-produced image bytes (format is renderer-defined).
    Image(Vec<u8>),
    /// Visual fallback: the payload text, shown verbatim.
    TextPlaceholder(String),
}

/// Third-party QR rendering seam.
pub trait LabelRenderer {
    /// Renderer name, logged when it produces the label.
    fn name(&self) -> &str;

    /// Render the payload, or `None` when this renderer is unavailable.
    fn render(&self, payload: &str) -> Option<LabelArt>;
}

/// Walk the renderer chain in order; fall back to the text placeholder when
/// every renderer declines (or the chain is empty).
pub fn render_label_with_fallback(renderers: &[&dyn LabelRenderer], part: &Part) -> LabelArt {
    let payload = label_payload(part);
    for renderer in renderers {
        if let Some(art) = renderer.render(&payload) {
            tracing::debug!(renderer = renderer.name(), "label rendered");
            return art;
        }
    }
    tracing::warn!(code = %part.product_code, "no label renderer available; using text placeholder");
    LabelArt::TextPlaceholder(payload)
}
