use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Face box in image space, as reported by the detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageRect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl ImageRect {
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    pub fn is_empty(&self) -> bool {
        self.left >= self.right || self.top >= self.bottom
    }

    /// Intersection of two rectangles, `None` unless it has positive area.
    pub fn intersect(&self, other: &ImageRect) -> Option<ImageRect> {
        let clipped = ImageRect {
            left: self.left.max(other.left),
            top: self.top.max(other.top),
            right: self.right.min(other.right),
            bottom: self.bottom.min(other.bottom),
        };
        if clipped.is_empty() {
            None
        } else {
            Some(clipped)
        }
    }
}

impl fmt::Display for ImageRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.left, self.top, self.right, self.bottom)
    }
}

impl FromStr for ImageRect {
    type Err = String;

    /// Parses `left,top,right,bottom`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s
            .split(',')
            .map(|p| p.trim().parse::<i32>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| format!("invalid rectangle {s:?}: {e}"))?;
        match parts.as_slice() {
            &[left, top, right, bottom] => Ok(ImageRect::new(left, top, right, bottom)),
            _ => Err(format!(
                "invalid rectangle {s:?}: expected left,top,right,bottom"
            )),
        }
    }
}

/// Box in overlay (display) space, ready to be stroked.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverlayRect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl OverlayRect {
    pub const fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    /// Reflect around the vertical centerline of an overlay `overlay_width` wide.
    ///
    /// Left and right swap roles so the result keeps `left <= right`.
    pub fn mirrored(self, overlay_width: f32) -> OverlayRect {
        OverlayRect {
            left: overlay_width - self.right,
            top: self.top,
            right: overlay_width - self.left,
            bottom: self.bottom,
        }
    }
}

impl fmt::Display for OverlayRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.3},{:.3},{:.3},{:.3}",
            self.left, self.top, self.right, self.bottom
        )
    }
}

/// Landmark point in image space (eye, nose, mouth corner...).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
}

/// Landmark point in overlay space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverlayPoint {
    pub x: f32,
    pub y: f32,
}

/// Analysis buffer size in sensor orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

impl ImageDimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn bounds(&self) -> ImageRect {
        ImageRect::new(0, 0, self.width as i32, self.height as i32)
    }
}

/// Drawing surface size in display orientation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverlayDimensions {
    pub width: f32,
    pub height: f32,
}

impl OverlayDimensions {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Parses `WIDTHxHEIGHT`, shared by both dimension types.
fn parse_pair(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("invalid dimensions {s:?}: expected WIDTHxHEIGHT"))?;
    let w = w
        .trim()
        .parse()
        .map_err(|e| format!("invalid width in {s:?}: {e}"))?;
    let h = h
        .trim()
        .parse()
        .map_err(|e| format!("invalid height in {s:?}: {e}"))?;
    Ok((w, h))
}

impl FromStr for ImageDimensions {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (width, height) = parse_pair(s)?;
        Ok(ImageDimensions { width, height })
    }
}

impl FromStr for OverlayDimensions {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (width, height) = parse_pair(s)?;
        Ok(OverlayDimensions {
            width: width as f32,
            height: height as f32,
        })
    }
}

/// Which lens produced the frame. The front lens preview is mirrored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraFacing {
    #[default]
    Front,
    Back,
}

impl FromStr for CameraFacing {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "front" => Ok(CameraFacing::Front),
            "back" => Ok(CameraFacing::Back),
            other => Err(format!("unknown camera facing {other:?}")),
        }
    }
}
