//! Planar 4:2:0 camera frames and their conversion to packed RGB.
//!
//! Frames borrow the capture pipeline's buffers, so a [`PlanarFrame`] can never
//! outlive the analysis callback that handed them out. Conversion goes through
//! an NV21 byte sequence (luma, then chroma interleaved V before U), the layout
//! legacy decoders expect, and decodes that with full-range BT.601.

use image::{Rgb, RgbImage};

use crate::error::{FrameError, Result};

/// One plane of a captured frame.
#[derive(Debug, Clone, Copy)]
pub struct Plane<'a> {
    pub data: &'a [u8],
    /// Bytes between the starts of two consecutive rows.
    pub row_stride: usize,
    /// Bytes between two consecutive samples in a row; 2 for interleaved chroma.
    pub pixel_stride: usize,
}

impl<'a> Plane<'a> {
    pub fn new(data: &'a [u8], row_stride: usize, pixel_stride: usize) -> Self {
        Self {
            data,
            row_stride,
            pixel_stride,
        }
    }

    /// Tightly packed plane, one byte per sample.
    pub fn packed(data: &'a [u8], width: usize) -> Self {
        Self::new(data, width, 1)
    }

    fn sample(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.row_stride + x * self.pixel_stride]
    }

    fn validate(&self, name: &'static str, width: usize, height: usize) -> Result<()> {
        if self.row_stride == 0 || self.pixel_stride == 0 {
            return Err(FrameError::InvalidStride { plane: name });
        }
        let invalid_stride = || FrameError::InvalidStride { plane: name };

        // bytes spanned by one row; rows may not overlap
        let row_span = (width - 1)
            .checked_mul(self.pixel_stride)
            .and_then(|n| n.checked_add(1))
            .ok_or_else(invalid_stride)?;
        if self.row_stride < row_span {
            return Err(invalid_stride());
        }

        let expected = (height - 1)
            .checked_mul(self.row_stride)
            .and_then(|n| n.checked_add(row_span))
            .ok_or_else(invalid_stride)?;
        if self.data.len() < expected {
            return Err(FrameError::MalformedFrame {
                plane: name,
                expected,
                actual: self.data.len(),
            });
        }
        Ok(())
    }
}

/// A captured 4:2:0 frame: full resolution luma, quarter resolution chroma.
#[derive(Debug, Clone, Copy)]
pub struct PlanarFrame<'a> {
    pub width: u32,
    pub height: u32,
    pub y: Plane<'a>,
    pub u: Plane<'a>,
    pub v: Plane<'a>,
}

impl<'a> PlanarFrame<'a> {
    pub fn new(width: u32, height: u32, y: Plane<'a>, u: Plane<'a>, v: Plane<'a>) -> Self {
        Self {
            width,
            height,
            y,
            u,
            v,
        }
    }

    /// Contiguous I420: Y, then U, then V, all tightly packed.
    pub fn i420(width: u32, height: u32, data: &'a [u8]) -> Result<Self> {
        let (luma, chroma) = split_contiguous(width, height, data)?;
        let (cw, _) = chroma_dimensions(width, height);
        let (u, v) = chroma.split_at(chroma.len() / 2);
        Ok(Self::new(
            width,
            height,
            Plane::packed(luma, width as usize),
            Plane::packed(u, cw),
            Plane::packed(v, cw),
        ))
    }

    /// Contiguous NV12: Y, then interleaved U/V pairs.
    pub fn nv12(width: u32, height: u32, data: &'a [u8]) -> Result<Self> {
        let (luma, chroma) = split_contiguous(width, height, data)?;
        let (cw, _) = chroma_dimensions(width, height);
        Ok(Self::new(
            width,
            height,
            Plane::packed(luma, width as usize),
            Plane::new(chroma, cw * 2, 2),
            Plane::new(&chroma[1..], cw * 2, 2),
        ))
    }

    /// Contiguous NV21: Y, then interleaved V/U pairs.
    pub fn nv21(width: u32, height: u32, data: &'a [u8]) -> Result<Self> {
        let (luma, chroma) = split_contiguous(width, height, data)?;
        let (cw, _) = chroma_dimensions(width, height);
        Ok(Self::new(
            width,
            height,
            Plane::packed(luma, width as usize),
            Plane::new(&chroma[1..], cw * 2, 2),
            Plane::new(chroma, cw * 2, 2),
        ))
    }

    /// Check every plane holds enough bytes for the declared size and strides.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(FrameError::ZeroDimensions);
        }
        let (cw, ch) = chroma_dimensions(self.width, self.height);
        self.y
            .validate("Y", self.width as usize, self.height as usize)?;
        self.u.validate("U", cw, ch)?;
        self.v.validate("V", cw, ch)?;
        Ok(())
    }
}

/// Chroma plane size for a 4:2:0 frame; odd sizes round up.
pub fn chroma_dimensions(width: u32, height: u32) -> (usize, usize) {
    (width.div_ceil(2) as usize, height.div_ceil(2) as usize)
}

/// Byte length of a tightly packed 4:2:0 frame.
pub fn frame_len(width: u32, height: u32) -> usize {
    let (cw, ch) = chroma_dimensions(width, height);
    width as usize * height as usize + 2 * cw * ch
}

fn split_contiguous(width: u32, height: u32, data: &[u8]) -> Result<(&[u8], &[u8])> {
    if width == 0 || height == 0 {
        return Err(FrameError::ZeroDimensions);
    }
    let expected = frame_len(width, height);
    if data.len() != expected {
        return Err(FrameError::MalformedBuffer {
            expected,
            actual: data.len(),
        });
    }
    Ok(data.split_at(width as usize * height as usize))
}

/// Contiguous NV21 frame: `width * height` luma bytes, then V/U pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nv21Buffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Nv21Buffer {
    /// Reassemble the planes of `frame` in Y, V, U order, dropping row padding.
    pub fn from_frame(frame: &PlanarFrame<'_>) -> Result<Self> {
        frame.validate()?;
        let w = frame.width as usize;
        let h = frame.height as usize;
        let (cw, ch) = chroma_dimensions(frame.width, frame.height);

        let mut data = Vec::with_capacity(frame_len(frame.width, frame.height));
        for row in 0..h {
            if frame.y.pixel_stride == 1 {
                let start = row * frame.y.row_stride;
                data.extend_from_slice(&frame.y.data[start..start + w]);
            } else {
                data.extend((0..w).map(|x| frame.y.sample(x, row)));
            }
        }
        for row in 0..ch {
            for x in 0..cw {
                data.push(frame.v.sample(x, row));
                data.push(frame.u.sample(x, row));
            }
        }

        Ok(Self {
            width: frame.width,
            height: frame.height,
            data,
        })
    }

    /// Wrap an NV21 byte stream, checking its length against the dimensions.
    pub fn from_bytes(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        split_contiguous(width, height, &data)?;
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Decode to RGB at full resolution. Each chroma pair covers a 2x2 luma block.
    pub fn decode(&self) -> RgbImage {
        let w = self.width as usize;
        let luma_len = w * self.height as usize;
        let (cw, _) = chroma_dimensions(self.width, self.height);
        let (luma, chroma) = self.data.split_at(luma_len);

        RgbImage::from_fn(self.width, self.height, |x, y| {
            let (x, y) = (x as usize, y as usize);
            let idx = (y / 2) * cw * 2 + (x / 2) * 2;
            yuv_to_rgb(luma[y * w + x], chroma[idx + 1], chroma[idx])
        })
    }
}

/// Full-range BT.601 (JFIF) conversion of a single sample.
pub fn yuv_to_rgb(y: u8, u: u8, v: u8) -> Rgb<u8> {
    let y = y as f32;
    let u = u as f32 - 128.0;
    let v = v as f32 - 128.0;
    let r = y + 1.402 * v;
    let g = y - 0.344136 * u - 0.714136 * v;
    let b = y + 1.772 * u;
    Rgb([clamp(r), clamp(g), clamp(b)])
}

fn clamp(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// Convert a captured frame into a packed RGB image of the same size.
pub fn to_packed_image(frame: &PlanarFrame<'_>) -> Result<RgbImage> {
    let nv21 = Nv21Buffer::from_frame(frame)?;
    log::debug!(
        "converted frame: width={} height={} nv21_len={}",
        frame.width,
        frame.height,
        nv21.as_bytes().len()
    );
    Ok(nv21.decode())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform_i420(w: u32, h: u32, y: u8, u: u8, v: u8) -> Vec<u8> {
        let (cw, ch) = chroma_dimensions(w, h);
        let mut data = vec![y; (w * h) as usize];
        data.extend(std::iter::repeat(u).take(cw * ch));
        data.extend(std::iter::repeat(v).take(cw * ch));
        data
    }

    #[test]
    fn neutral_chroma_is_grey() {
        assert_eq!(yuv_to_rgb(77, 128, 128), Rgb([77, 77, 77]));
        assert_eq!(yuv_to_rgb(0, 128, 128), Rgb([0, 0, 0]));
        assert_eq!(yuv_to_rgb(255, 128, 128), Rgb([255, 255, 255]));
    }

    #[test]
    fn saturated_values_clamp() {
        let px = yuv_to_rgb(255, 255, 255);
        assert_eq!(px[0], 255);
        assert_eq!(px[2], 255);
    }

    #[test]
    fn nv21_order_is_y_then_v_then_u() {
        let data = uniform_i420(4, 2, 10, 20, 30);
        let frame = PlanarFrame::i420(4, 2, &data).unwrap();
        let nv21 = Nv21Buffer::from_frame(&frame).unwrap();
        assert_eq!(nv21.as_bytes(), &[10, 10, 10, 10, 10, 10, 10, 10, 30, 20, 30, 20]);
    }

    #[test]
    fn padded_rows_are_dropped() {
        // 2x2 frame with 4-byte luma rows and 3-byte chroma rows
        let y = [1, 2, 0xEE, 0xEE, 3, 4, 0xEE, 0xEE];
        let u = [50, 0xEE, 0xEE];
        let v = [60, 0xEE, 0xEE];
        let frame = PlanarFrame::new(
            2,
            2,
            Plane::new(&y, 4, 1),
            Plane::new(&u, 3, 1),
            Plane::new(&v, 3, 1),
        );
        let nv21 = Nv21Buffer::from_frame(&frame).unwrap();
        assert_eq!(nv21.as_bytes(), &[1, 2, 3, 4, 60, 50]);
    }

    #[test]
    fn odd_dimensions_round_chroma_up() {
        assert_eq!(chroma_dimensions(5, 3), (3, 2));
        assert_eq!(frame_len(5, 3), 15 + 12);
        let data = uniform_i420(5, 3, 100, 128, 128);
        let frame = PlanarFrame::i420(5, 3, &data).unwrap();
        let img = to_packed_image(&frame).unwrap();
        assert_eq!(img.dimensions(), (5, 3));
        assert!(img.pixels().all(|p| *p == Rgb([100, 100, 100])));
    }

    #[test]
    fn short_chroma_plane_is_malformed() {
        let y = [0u8; 16];
        let u = [0u8; 3];
        let v = [0u8; 4];
        let frame = PlanarFrame::new(
            4,
            4,
            Plane::packed(&y, 4),
            Plane::packed(&u, 2),
            Plane::packed(&v, 2),
        );
        assert_eq!(
            to_packed_image(&frame).unwrap_err(),
            FrameError::MalformedFrame {
                plane: "U",
                expected: 4,
                actual: 3
            }
        );
    }

    #[test]
    fn overlapping_rows_rejected() {
        // 7 bytes cannot hold a 4x4 plane however the stride is chosen
        let y = [0u8; 7];
        let c = [128u8; 4];
        let frame = PlanarFrame::new(
            4,
            4,
            Plane::new(&y, 1, 1),
            Plane::packed(&c, 2),
            Plane::packed(&c, 2),
        );
        assert_eq!(
            to_packed_image(&frame).unwrap_err(),
            FrameError::InvalidStride { plane: "Y" }
        );

        // interleaved chroma needs at least 2 * (cols - 1) + 1 bytes per row
        let y = [0u8; 16];
        let vu = [128u8; 8];
        let frame = PlanarFrame::new(
            4,
            4,
            Plane::packed(&y, 4),
            Plane::new(&vu[1..], 2, 2),
            Plane::new(&vu, 2, 2),
        );
        assert_eq!(
            frame.validate().unwrap_err(),
            FrameError::InvalidStride { plane: "U" }
        );
    }

    #[test]
    fn huge_strides_do_not_overflow() {
        let y = [0u8; 16];
        let c = [128u8; 4];
        for (row_stride, pixel_stride) in [(usize::MAX / 2, 1), (usize::MAX, 1), (16, usize::MAX)] {
            let frame = PlanarFrame::new(
                4,
                4,
                Plane::new(&y, row_stride, pixel_stride),
                Plane::packed(&c, 2),
                Plane::packed(&c, 2),
            );
            assert_eq!(
                to_packed_image(&frame).unwrap_err(),
                FrameError::InvalidStride { plane: "Y" },
                "row_stride={row_stride} pixel_stride={pixel_stride}"
            );
        }
    }

    #[test]
    fn zero_stride_rejected() {
        let y = [0u8; 4];
        let c = [0u8; 1];
        let frame = PlanarFrame::new(
            2,
            2,
            Plane::new(&y, 0, 1),
            Plane::packed(&c, 1),
            Plane::packed(&c, 1),
        );
        assert_eq!(
            frame.validate().unwrap_err(),
            FrameError::InvalidStride { plane: "Y" }
        );
    }

    #[test]
    fn contiguous_length_checked() {
        let data = vec![0u8; 10];
        assert_eq!(
            PlanarFrame::nv21(4, 2, &data).unwrap_err(),
            FrameError::MalformedBuffer {
                expected: 12,
                actual: 10
            }
        );
        assert_eq!(
            PlanarFrame::i420(0, 2, &data).unwrap_err(),
            FrameError::ZeroDimensions
        );
    }
}
