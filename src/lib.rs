pub mod config;
pub mod overlay;

// Re-export vision types for convenience
pub use facecam_vision::{
    crop_and_upright, map_rectangles, to_packed_image, CameraFacing, Detection, FaceDetector,
    FrameAnalysis, FrameInput, ImageDimensions, ImageRect, OverlayDimensions, OverlayRect,
    Pipeline, PlanarFrame, Rotation,
};
