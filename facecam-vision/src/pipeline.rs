use anyhow::{Context, Result};
use image::RgbImage;

use crate::crop::{crop_and_upright, Rotation};
use crate::frame::{to_packed_image, PlanarFrame};
use crate::geometry::{
    CameraFacing, ImageDimensions, ImageRect, Landmark, OverlayDimensions, OverlayRect,
};
use crate::mapper::map_rectangles;

/// Detector result for one face, in image space.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub bounds: ImageRect,
    pub landmarks: Vec<Landmark>,
}

impl Detection {
    pub fn new(bounds: ImageRect) -> Self {
        Self {
            bounds,
            landmarks: Vec::new(),
        }
    }
}

/// The face detector, treated as a black box.
pub trait FaceDetector {
    fn detect(&mut self, frame: &PlanarFrame<'_>, rotation: Rotation) -> Result<Vec<Detection>>;
}

/// Everything one analysis callback hands over. Borrowed for the call only.
#[derive(Debug, Clone, Copy)]
pub struct FrameInput<'a> {
    pub frame: PlanarFrame<'a>,
    pub rotation: Rotation,
    pub facing: CameraFacing,
}

/// Result for a single frame; replaces whatever the previous frame produced.
#[derive(Debug, Clone)]
pub struct FrameAnalysis {
    pub detections: Vec<Detection>,
    /// Boxes to stroke over the preview.
    pub boxes: Vec<OverlayRect>,
    /// The whole frame as packed RGB, present when it had to be converted.
    pub image: Option<RgbImage>,
    /// Upright crop of the first detected face.
    pub face: Option<RgbImage>,
}

/// Per-frame glue: detect faces → map boxes → crop the first face
pub struct Pipeline<D> {
    pub detector: D,
}

impl<D: FaceDetector> Pipeline<D> {
    pub fn new(detector: D) -> Self {
        Self { detector }
    }

    pub fn process(
        &mut self,
        input: FrameInput<'_>,
        overlay: OverlayDimensions,
    ) -> Result<FrameAnalysis> {
        let FrameInput {
            frame,
            rotation,
            facing,
        } = input;

        let detections = match self.detector.detect(&frame, rotation) {
            Ok(d) => d,
            Err(e) => {
                log::error!("face detection failed: {e:#}");
                return Err(e.context("detecting faces"));
            }
        };

        let rects: Vec<ImageRect> = detections.iter().map(|d| d.bounds).collect();
        let boxes = map_rectangles(
            &rects,
            ImageDimensions::new(frame.width, frame.height),
            overlay,
            facing,
        );

        let (image, face) = match detections.first() {
            Some(first) => {
                let packed = to_packed_image(&frame).context("converting frame")?;
                let face = crop_and_upright(&packed, first.bounds, rotation);
                (Some(packed), Some(face))
            }
            None => (None, None),
        };

        log::debug!(
            "frame {}x{} rotation={} faces={}",
            frame.width,
            frame.height,
            rotation,
            detections.len()
        );

        Ok(FrameAnalysis {
            detections,
            boxes,
            image,
            face,
        })
    }
}
