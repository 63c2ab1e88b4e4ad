use crate::config::{BrandColor, EmbedStyle, OUTPUT_SIZE};
use crate::decode::encode_data_uri;

use super::VectorOutput;

/// Message attached to responses that only wrap a raster.
pub const RASTER_EMBED_NOTE: &str = "This is a raster image embedded in SVG. For true vector conversion, use a tracing or vector-service mode.";

/// Wrap a PNG in a fixed-size SVG envelope. Any PNG can be embedded, so this never fails.
pub fn embed_png(png: &[u8], style: EmbedStyle, brand: BrandColor) -> VectorOutput {
    let href = encode_data_uri("image/png", png);
    let size = OUTPUT_SIZE;
    let svg = match style {
        EmbedStyle::Plain => format!(
            r#"<svg width="{size}" height="{size}" xmlns="http://www.w3.org/2000/svg">
  <image href="{href}" width="{size}" height="{size}"/>
</svg>"#
        ),
        EmbedStyle::ColorMatrix => {
            let [r, g, b] = brand.unit_channels();
            format!(
                r#"<?xml version="1.0" encoding="UTF-8"?>
<svg width="{size}" height="{size}" viewBox="0 0 {size} {size}" xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink">
  <defs>
    <filter id="colorize">
      <feColorMatrix type="matrix" values="0 0 0 0 {r:.3} 0 0 0 0 {g:.3} 0 0 0 0 {b:.3} 0 0 0 1 0"/>
    </filter>
  </defs>
  <image href="{href}" width="{size}" height="{size}" preserveAspectRatio="xMidYMid meet" filter="url(#colorize)"/>
</svg>"#
            )
        }
    };

    VectorOutput {
        svg,
        view_box: (size, size),
        is_vector: false,
    }
}
