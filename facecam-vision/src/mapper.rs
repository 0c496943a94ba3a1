use crate::geometry::{
    CameraFacing, ImageDimensions, ImageRect, Landmark, OverlayDimensions, OverlayPoint,
    OverlayRect,
};
use crate::pipeline::Detection;

/// Fill (crop-to-cover) transform from image space into overlay space.
///
/// The analysis buffer arrives in sensor orientation while the overlay is in
/// display orientation, so the image's height spans the overlay's width and
/// vice versa.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FillTransform {
    pub scale: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

impl FillTransform {
    /// Returns `None` until the image dimensions are known (either is zero).
    pub fn new(image: ImageDimensions, overlay: OverlayDimensions) -> Option<Self> {
        if image.width == 0 || image.height == 0 {
            return None;
        }
        let image_w = image.width as f32;
        let image_h = image.height as f32;

        let scale_x = overlay.width / image_h;
        let scale_y = overlay.height / image_w;
        let scale = scale_x.max(scale_y);

        Some(Self {
            scale,
            offset_x: (overlay.width - image_h * scale) / 2.0,
            offset_y: (overlay.height - image_w * scale) / 2.0,
        })
    }

    pub fn apply(&self, rect: &ImageRect) -> OverlayRect {
        OverlayRect {
            left: rect.left as f32 * self.scale + self.offset_x,
            top: rect.top as f32 * self.scale + self.offset_y,
            right: rect.right as f32 * self.scale + self.offset_x,
            bottom: rect.bottom as f32 * self.scale + self.offset_y,
        }
    }

    pub fn apply_point(&self, point: &Landmark) -> OverlayPoint {
        OverlayPoint {
            x: point.x * self.scale + self.offset_x,
            y: point.y * self.scale + self.offset_y,
        }
    }
}

/// Map detector boxes into overlay space.
///
/// Output order matches input order. Boxes that land partly or fully outside
/// the overlay are kept; clipping belongs to the renderer. An empty vector is
/// returned while the image dimensions are still zero.
pub fn map_rectangles(
    rects: &[ImageRect],
    image: ImageDimensions,
    overlay: OverlayDimensions,
    facing: CameraFacing,
) -> Vec<OverlayRect> {
    let Some(transform) = FillTransform::new(image, overlay) else {
        return Vec::new();
    };
    rects
        .iter()
        .map(|rect| {
            let mapped = transform.apply(rect);
            match facing {
                CameraFacing::Front => mapped.mirrored(overlay.width),
                CameraFacing::Back => mapped,
            }
        })
        .collect()
}

/// A detection mapped into overlay space, landmarks included.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayDetection {
    pub bounds: OverlayRect,
    pub landmarks: Vec<OverlayPoint>,
}

/// Same as [`map_rectangles`] but carries landmark points along.
pub fn map_detections(
    detections: &[Detection],
    image: ImageDimensions,
    overlay: OverlayDimensions,
    facing: CameraFacing,
) -> Vec<OverlayDetection> {
    let Some(transform) = FillTransform::new(image, overlay) else {
        return Vec::new();
    };
    detections
        .iter()
        .map(|det| {
            let mut bounds = transform.apply(&det.bounds);
            let mut landmarks: Vec<OverlayPoint> = det
                .landmarks
                .iter()
                .map(|lm| transform.apply_point(lm))
                .collect();
            if facing == CameraFacing::Front {
                bounds = bounds.mirrored(overlay.width);
                for p in &mut landmarks {
                    p.x = overlay.width - p.x;
                }
            }
            OverlayDetection { bounds, landmarks }
        })
        .collect()
}
