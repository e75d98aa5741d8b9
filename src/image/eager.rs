//! Eager stack: read every `Image{k}` once at load, in ascending order.

use anyhow::{Context, Result};
use log::debug;
use ndarray::{Array2, Array3, Axis};

use super::paging::image_path;
use super::pixels::{Frame, PixelStack};
use crate::codec::PixelKind;
use crate::consts::REFERENCE_IMAGE_PATH;
use crate::error::TxrmError;
use crate::storage::Storage;

/// Read and decode image `k` (1-based).
pub fn read_frame<S: Storage + ?Sized>(
    storage: &mut S,
    k: usize,
    kind: PixelKind,
    height: usize,
    width: usize,
) -> Result<Frame> {
    let path = image_path(k);
    let bytes = storage
        .read_stream(&path)?
        .ok_or_else(|| TxrmError::StreamNotFound(path.clone()))?;
    Frame::decode(&bytes, kind, height, width, &path)
}

/// The `(count, height, width)` buffer is allocated once; each decoded frame is
/// copied into its slot.
pub fn load_stack<S: Storage + ?Sized>(
    storage: &mut S,
    count: usize,
    kind: PixelKind,
    height: usize,
    width: usize,
) -> Result<PixelStack> {
    let shape = (count, height, width);
    let mut stack = match kind {
        PixelKind::U16 => PixelStack::U16(Array3::zeros(shape)),
        PixelKind::F32 => PixelStack::F32(Array3::zeros(shape)),
    };
    for k in 1..=count {
        let frame = read_frame(storage, k, kind, height, width)
            .with_context(|| format!("load image {} of {}", k, count))?;
        match (&mut stack, frame) {
            (PixelStack::U16(dst), Frame::U16(src)) => dst.index_axis_mut(Axis(0), k - 1).assign(&src),
            (PixelStack::F32(dst), Frame::F32(src)) => dst.index_axis_mut(Axis(0), k - 1).assign(&src),
            (_, other) => {
                return Err(TxrmError::type_mismatch(
                    "images",
                    format!("frame {} decoded as {:?}, stack is {:?}", k, other.kind(), kind),
                )
                .into())
            }
        }
    }
    debug!("images: loaded {}x{}x{} {:?}", count, height, width, kind);
    Ok(stack)
}

/// Reference frame at its fixed path, decoded with its own type code.
/// None if the container carries no reference.
pub fn load_reference<S: Storage + ?Sized>(
    storage: &mut S,
    kind: PixelKind,
    height: usize,
    width: usize,
) -> Result<Option<Frame>> {
    match storage.read_stream(REFERENCE_IMAGE_PATH)? {
        Some(bytes) => Ok(Some(Frame::decode(
            &bytes,
            kind,
            height,
            width,
            REFERENCE_IMAGE_PATH,
        )?)),
        None => Ok(None),
    }
}

fn check_reference(frame: (usize, usize), reference: &Array2<f32>) -> Result<()> {
    if frame != reference.dim() {
        return Err(TxrmError::type_mismatch(
            "reference",
            format!("reference is {:?}, frames are {:?}", reference.dim(), frame),
        )
        .into());
    }
    Ok(())
}

/// Divide every frame by the reference, element-wise. IEEE semantics for zeros.
pub fn divide_by_reference(stack: &mut Array3<f32>, reference: &Array2<f32>) -> Result<()> {
    let (_, h, w) = stack.dim();
    check_reference((h, w), reference)?;
    for mut frame in stack.axis_iter_mut(Axis(0)) {
        frame /= reference;
    }
    Ok(())
}

/// Stack / reference as float32. Not idempotent: the caller replaces its stack
/// with the result, a second call divides again.
pub fn normalize(stack: &PixelStack, reference: &Frame) -> Result<PixelStack> {
    let mut out = stack.to_f32();
    divide_by_reference(&mut out, &reference.to_f32())?;
    Ok(PixelStack::F32(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode_u16s;
    use crate::storage::MemStorage;

    #[test]
    fn load_across_pages_in_order() -> Result<()> {
        let mut s = MemStorage::new();
        for k in 1..=120usize {
            s.write_stream(&image_path(k), &encode_u16s(&[k as u16, 0, 0, k as u16]))?;
        }
        let st = load_stack(&mut s, 120, PixelKind::U16, 2, 2)?;
        assert_eq!(st.dim(), (120, 2, 2));
        match st.frame(100) {
            Some(Frame::U16(a)) => assert_eq!(a[[0, 0]], 101),
            other => panic!("unexpected {:?}", other),
        }
        assert!(load_stack(&mut s, 121, PixelKind::U16, 2, 2).is_err());

        let empty = load_stack(&mut s, 0, PixelKind::F32, 2, 2)?;
        assert_eq!(empty.dim(), (0, 2, 2));
        Ok(())
    }

    #[test]
    fn normalize_divides_each_frame() -> Result<()> {
        let st = PixelStack::U16(Array3::from_elem((3, 2, 2), 8u16));
        let reference = Frame::F32(Array2::from_elem((2, 2), 2.0f32));
        let n = normalize(&st, &reference)?;
        assert_eq!(n, PixelStack::F32(Array3::from_elem((3, 2, 2), 4.0)));
        // twice divides twice
        let n2 = normalize(&n, &reference)?;
        assert_eq!(n2, PixelStack::F32(Array3::from_elem((3, 2, 2), 2.0)));

        let bad = Frame::F32(Array2::from_elem((2, 3), 1.0f32));
        assert!(normalize(&st, &bad).is_err());
        Ok(())
    }
}
