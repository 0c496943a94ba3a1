use anyhow::Result;
use facecam_vision::frame::{chroma_dimensions, frame_len};
use facecam_vision::{to_packed_image, FrameError, Nv21Buffer, PlanarFrame, Plane};
use image::Rgb;

fn close(a: Rgb<u8>, b: Rgb<u8>, tol: i16) -> bool {
    (0..3).all(|c| (a[c] as i16 - b[c] as i16).abs() <= tol)
}

/// Build an I420 buffer whose chroma is a function of the chroma sample position.
fn i420_from_fn(w: u32, h: u32, luma: u8, chroma: impl Fn(usize, usize) -> (u8, u8)) -> Vec<u8> {
    let (cw, ch) = chroma_dimensions(w, h);
    let mut data = vec![luma; (w * h) as usize];
    let mut u = Vec::with_capacity(cw * ch);
    let mut v = Vec::with_capacity(cw * ch);
    for y in 0..ch {
        for x in 0..cw {
            let (cu, cv) = chroma(x, y);
            u.push(cu);
            v.push(cv);
        }
    }
    data.extend(u);
    data.extend(v);
    data
}

#[test]
fn uniform_frame_decodes_to_uniform_colour() -> Result<()> {
    env_logger::try_init().ok();
    // Y=76 U=85 V=255 is close to pure red in full-range BT.601
    let data = i420_from_fn(64, 48, 76, |_, _| (85, 255));
    let frame = PlanarFrame::i420(64, 48, &data)?;
    let img = to_packed_image(&frame)?;

    assert_eq!(img.dimensions(), (64, 48));
    for px in img.pixels() {
        assert!(close(*px, Rgb([255, 0, 0]), 2), "unexpected pixel {px:?}");
    }
    Ok(())
}

#[test]
fn grey_frame_is_exact() -> Result<()> {
    let data = i420_from_fn(8, 6, 200, |_, _| (128, 128));
    let img = to_packed_image(&PlanarFrame::i420(8, 6, &data)?)?;
    assert!(img.pixels().all(|p| *p == Rgb([200, 200, 200])));
    Ok(())
}

#[test]
fn contiguous_layouts_agree() -> Result<()> {
    let (w, h) = (6u32, 4u32);
    let i420 = i420_from_fn(w, h, 120, |x, y| ((60 + x * 20) as u8, (200 - y * 30) as u8));

    let (cw, ch) = chroma_dimensions(w, h);
    let luma = &i420[..(w * h) as usize];
    let u = &i420[(w * h) as usize..(w * h) as usize + cw * ch];
    let v = &i420[(w * h) as usize + cw * ch..];

    let mut nv12 = luma.to_vec();
    let mut nv21 = luma.to_vec();
    for i in 0..cw * ch {
        nv12.extend([u[i], v[i]]);
        nv21.extend([v[i], u[i]]);
    }
    assert_eq!(nv12.len(), frame_len(w, h));

    let a = to_packed_image(&PlanarFrame::i420(w, h, &i420)?)?;
    let b = to_packed_image(&PlanarFrame::nv12(w, h, &nv12)?)?;
    let c = to_packed_image(&PlanarFrame::nv21(w, h, &nv21)?)?;
    assert_eq!(a, b);
    assert_eq!(a, c);

    // the reassembled byte sequence is exactly the NV21 input
    let rebuilt = Nv21Buffer::from_frame(&PlanarFrame::i420(w, h, &i420)?)?;
    assert_eq!(rebuilt.as_bytes(), nv21.as_slice());
    Ok(())
}

#[test]
fn chroma_covers_two_by_two_blocks() -> Result<()> {
    // left chroma column blue-ish, right column red-ish
    let data = i420_from_fn(4, 2, 128, |x, _| if x == 0 { (255, 128) } else { (128, 255) });
    let img = to_packed_image(&PlanarFrame::i420(4, 2, &data)?)?;
    assert_eq!(img.get_pixel(0, 0), img.get_pixel(1, 1));
    assert_eq!(img.get_pixel(2, 0), img.get_pixel(3, 1));
    assert!(img.get_pixel(0, 0)[2] > img.get_pixel(0, 0)[0]);
    assert!(img.get_pixel(3, 0)[0] > img.get_pixel(3, 0)[2]);
    Ok(())
}

/// Camera HALs commonly hand out padded rows and a shared interleaved chroma
/// buffer exposed as two planes with a pixel stride of 2.
#[test]
fn padded_interleaved_planes() -> Result<()> {
    let (w, h) = (4u32, 4u32);
    let row_stride = 8;
    let mut y = vec![0xAAu8; row_stride * h as usize];
    for row in 0..h as usize {
        for x in 0..w as usize {
            y[row * row_stride + x] = 90;
        }
    }
    // V U V U ... per chroma row, padded to the row stride
    let mut vu = vec![0xAAu8; row_stride * 2];
    for row in 0..2 {
        for x in 0..2 {
            vu[row * row_stride + x * 2] = 128;
            vu[row * row_stride + x * 2 + 1] = 128;
        }
    }
    // trailing padding after the last sample is not provided, as on Android
    let vu = &vu[..row_stride + 4];

    let frame = PlanarFrame::new(
        w,
        h,
        Plane::new(&y, row_stride, 1),
        Plane::new(&vu[1..], row_stride, 2),
        Plane::new(vu, row_stride, 2),
    );
    let img = to_packed_image(&frame)?;
    assert_eq!(img.dimensions(), (4, 4));
    assert!(img.pixels().all(|p| *p == Rgb([90, 90, 90])));

    let nv21 = Nv21Buffer::from_frame(&frame)?;
    assert_eq!(nv21.as_bytes().len(), frame_len(w, h));
    Ok(())
}

#[test]
fn inconsistent_planes_are_rejected() {
    let y = [16u8; 15];
    let c = [128u8; 4];
    let frame = PlanarFrame::new(
        4,
        4,
        Plane::packed(&y, 4),
        Plane::packed(&c, 2),
        Plane::packed(&c, 2),
    );
    match to_packed_image(&frame) {
        Err(FrameError::MalformedFrame {
            plane,
            expected,
            actual,
        }) => {
            assert_eq!(plane, "Y");
            assert_eq!(expected, 16);
            assert_eq!(actual, 15);
        }
        other => panic!("expected malformed frame, got {other:?}"),
    }
}

#[test]
fn raw_nv21_bytes_round_through_buffer() -> Result<()> {
    let bytes = vec![50u8; frame_len(2, 2) - 2]
        .into_iter()
        .chain([128, 128])
        .collect::<Vec<_>>();
    let buf = Nv21Buffer::from_bytes(2, 2, bytes)?;
    assert_eq!((buf.width(), buf.height()), (2, 2));
    assert!(buf.decode().pixels().all(|p| *p == Rgb([50, 50, 50])));

    assert!(matches!(
        Nv21Buffer::from_bytes(2, 2, vec![0; 5]),
        Err(FrameError::MalformedBuffer {
            expected: 6,
            actual: 5
        })
    ));
    Ok(())
}
