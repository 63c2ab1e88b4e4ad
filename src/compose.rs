use image::{Rgb, RgbImage, Rgba, RgbaImage, imageops};

/// Composite an RGBA image onto an opaque background colour, dropping the alpha channel.
pub fn flatten_onto(rgba: &RgbaImage, background: [u8; 3]) -> RgbImage {
    let (w, h) = rgba.dimensions();
    let mut out = RgbImage::new(w, h);
    for (px, out_px) in rgba.pixels().zip(out.pixels_mut()) {
        let a = f32::from(px[3]) / 255.0;
        let mut rgb = [0u8; 3];
        for c in 0..3 {
            let blended = f32::from(px[c]) * a + f32::from(background[c]) * (1.0 - a);
            rgb[c] = blended.round().clamp(0.0, 255.0) as u8;
        }
        *out_px = Rgb(rgb);
    }
    out
}

/// Rec. 601 luma of an RGB triple.
pub fn luminance(rgb: [u8; 3]) -> u8 {
    let [r, g, b] = rgb.map(f32::from);
    (0.299 * r + 0.587 * g + 0.114 * b).round().clamp(0.0, 255.0) as u8
}

/// Recolour by luminance: white becomes `tint`, black stays black, alpha is kept.
pub fn tint(rgba: &RgbaImage, tint: [u8; 3]) -> RgbaImage {
    let (w, h) = rgba.dimensions();
    let mut out = RgbaImage::new(w, h);
    for (px, out_px) in rgba.pixels().zip(out.pixels_mut()) {
        let l = u16::from(luminance([px[0], px[1], px[2]]));
        let channel = |c: u8| ((l * u16::from(c)) / 255) as u8;
        *out_px = Rgba([channel(tint[0]), channel(tint[1]), channel(tint[2]), px[3]]);
    }
    out
}

/// Centre `image` on a `width`x`height` canvas filled with `color`.
pub fn pad_to_canvas(image: &RgbaImage, width: u32, height: u32, color: [u8; 4]) -> RgbaImage {
    let mut canvas = RgbaImage::from_pixel(width, height, Rgba(color));
    let x = (i64::from(width) - i64::from(image.width())) / 2;
    let y = (i64::from(height) - i64::from(image.height())) / 2;
    imageops::overlay(&mut canvas, image, x, y);
    canvas
}
