//! Drawing detection boxes over a fill-scaled preview.
//!
//! Both functions are pure: they take the latest immutable result and produce
//! pixels, so a new frame's boxes simply replace the previous drawing.

use facecam_vision::{
    CameraFacing, FillTransform, ImageDimensions, OverlayDimensions, OverlayRect, Rotation,
};
use image::{imageops, Rgb, RgbImage};

/// Outline style for face boxes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoxStyle {
    pub color: [u8; 3],
    pub stroke_width: u32,
}

impl Default for BoxStyle {
    fn default() -> Self {
        Self {
            color: [255, 0, 0],
            stroke_width: 8,
        }
    }
}

/// Stroke each box outline onto `canvas`. The stroke straddles the edge and is
/// clipped to the canvas.
pub fn draw_boxes(canvas: &mut RgbImage, boxes: &[OverlayRect], style: &BoxStyle) {
    if boxes.is_empty() || canvas.width() == 0 || canvas.height() == 0 {
        return;
    }
    let half = style.stroke_width as f32 / 2.0;
    let color = Rgb(style.color);

    for b in boxes {
        let (ox0, oy0, ox1, oy1) = (b.left - half, b.top - half, b.right + half, b.bottom + half);
        let (ix0, iy0, ix1, iy1) = (b.left + half, b.top + half, b.right - half, b.bottom - half);

        fill(canvas, ox0, oy0, ox1, iy0, color);
        fill(canvas, ox0, iy1, ox1, oy1, color);
        fill(canvas, ox0, iy0, ix0, iy1, color);
        fill(canvas, ix1, iy0, ox1, iy1, color);
    }
}

fn fill(canvas: &mut RgbImage, x0: f32, y0: f32, x1: f32, y1: f32, color: Rgb<u8>) {
    let (w, h) = (canvas.width() as f32, canvas.height() as f32);
    let xs = x0.round().clamp(0.0, w) as u32..x1.round().clamp(0.0, w) as u32;
    let ys = y0.round().clamp(0.0, h) as u32..y1.round().clamp(0.0, h) as u32;
    for y in ys {
        for x in xs.clone() {
            canvas.put_pixel(x, y, color);
        }
    }
}

/// Render what the preview surface shows for `frame`: rotated upright, scaled
/// to cover the overlay, center-cropped, and mirrored for the front camera.
///
/// For 90 and 270 degree rotations this is exactly the [`FillTransform`] box
/// mapping uses, so mapped boxes line up. Other rotations keep the frame's
/// aspect ratio.
pub fn render_preview(
    frame: &RgbImage,
    rotation: Rotation,
    facing: CameraFacing,
    overlay: OverlayDimensions,
) -> RgbImage {
    let out_w = overlay.width.max(0.0).round() as u32;
    let out_h = overlay.height.max(0.0).round() as u32;
    let mut canvas = RgbImage::new(out_w, out_h);

    // FillTransform expects the upright frame transposed (sensor orientation)
    let image = if rotation.is_transposing() {
        ImageDimensions::new(frame.width(), frame.height())
    } else {
        ImageDimensions::new(frame.height(), frame.width())
    };
    let Some(t) = FillTransform::new(image, overlay) else {
        return canvas;
    };
    if out_w == 0 || out_h == 0 {
        return canvas;
    }

    let upright = rotation.apply(frame);
    let scaled_w = (image.height as f32 * t.scale).round().max(1.0) as u32;
    let scaled_h = (image.width as f32 * t.scale).round().max(1.0) as u32;
    let scaled = imageops::resize(
        &upright,
        scaled_w,
        scaled_h,
        imageops::FilterType::Triangle,
    );

    imageops::overlay(
        &mut canvas,
        &scaled,
        t.offset_x.round() as i64,
        t.offset_y.round() as i64,
    );
    if facing == CameraFacing::Front {
        imageops::flip_horizontal_in_place(&mut canvas);
    }

    log::debug!(
        "preview: frame {}x{} -> scaled {}x{} -> overlay {}x{}",
        frame.width(),
        frame.height(),
        scaled_w,
        scaled_h,
        out_w,
        out_h
    );
    canvas
}
