pub mod crop;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod mapper;
pub mod pipeline;

// Re-export commonly used types
pub use crop::{crop_and_upright, Rotation};
pub use error::FrameError;
pub use frame::{to_packed_image, Nv21Buffer, PlanarFrame, Plane};
pub use geometry::{
    CameraFacing, ImageDimensions, ImageRect, Landmark, OverlayDimensions, OverlayPoint,
    OverlayRect,
};
pub use mapper::{map_detections, map_rectangles, FillTransform, OverlayDetection};
pub use pipeline::{Detection, FaceDetector, FrameAnalysis, FrameInput, Pipeline};
