use std::fmt;

use image::{imageops, RgbImage};
use serde::{Deserialize, Serialize};

use crate::error::{FrameError, Result};
use crate::geometry::{ImageDimensions, ImageRect};

/// Clockwise rotation that makes a captured frame appear upright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    pub fn from_degrees(degrees: i32) -> Result<Self> {
        match degrees {
            0 => Ok(Rotation::Deg0),
            90 => Ok(Rotation::Deg90),
            180 => Ok(Rotation::Deg180),
            270 => Ok(Rotation::Deg270),
            other => Err(FrameError::InvalidRotation(other)),
        }
    }

    pub fn degrees(self) -> i32 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }

    /// Whether the rotation swaps width and height.
    pub fn is_transposing(self) -> bool {
        matches!(self, Rotation::Deg90 | Rotation::Deg270)
    }

    /// Rotate `image` clockwise by this amount. Quarter turns are exact.
    pub fn apply(self, image: &RgbImage) -> RgbImage {
        match self {
            Rotation::Deg0 => image.clone(),
            Rotation::Deg90 => imageops::rotate90(image),
            Rotation::Deg180 => imageops::rotate180(image),
            Rotation::Deg270 => imageops::rotate270(image),
        }
    }
}

impl TryFrom<i32> for Rotation {
    type Error = FrameError;

    fn try_from(degrees: i32) -> Result<Self> {
        Rotation::from_degrees(degrees)
    }
}

impl From<Rotation> for i32 {
    fn from(rotation: Rotation) -> i32 {
        rotation.degrees()
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.degrees())
    }
}

/// Crop `region` out of `image` and rotate it upright.
///
/// The region is clipped to the image first. When nothing of it lies inside
/// the image, a copy of the whole image is returned instead.
pub fn crop_and_upright(image: &RgbImage, region: ImageRect, rotation: Rotation) -> RgbImage {
    let (width, height) = image.dimensions();
    let bounds = ImageDimensions::new(width, height).bounds();

    let Some(clipped) = region.intersect(&bounds) else {
        log::debug!(
            "crop region {} outside {}x{} image, keeping full frame",
            region,
            width,
            height
        );
        return image.clone();
    };

    let cropped = imageops::crop_imm(
        image,
        clipped.left as u32,
        clipped.top as u32,
        clipped.width() as u32,
        clipped.height() as u32,
    )
    .to_image();

    log::debug!(
        "original image: {}x{}, cropped: {}x{}",
        width,
        height,
        cropped.width(),
        cropped.height()
    );

    match rotation {
        Rotation::Deg0 => cropped,
        other => other.apply(&cropped),
    }
}
