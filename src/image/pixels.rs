//! Pixel buffers: one frame `(height, width)` or a stack `(count, height, width)`,
//! uint16 or float32.

use anyhow::{anyhow, Result};
use ndarray::{s, stack, Array2, Array3, ArrayView2, Axis};

use crate::codec::{decode_f32s, decode_u16s, encode_f32s, encode_u16s, PixelKind};
use crate::error::TxrmError;

#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    U16(Array2<u16>),
    F32(Array2<f32>),
}

impl Frame {
    /// Decode one stored frame. The payload must be exactly `height * width` elements.
    pub fn decode(bytes: &[u8], kind: PixelKind, height: usize, width: usize, what: &str) -> Result<Self> {
        let expected = height * width * kind.width();
        if bytes.len() != expected {
            return Err(TxrmError::type_mismatch(
                what,
                format!(
                    "{} B payload, expected {} B for {}x{} {:?}",
                    bytes.len(),
                    expected,
                    height,
                    width,
                    kind
                ),
            )
            .into());
        }
        Ok(match kind {
            PixelKind::U16 => Frame::U16(Array2::from_shape_vec((height, width), decode_u16s(bytes)?)?),
            PixelKind::F32 => Frame::F32(Array2::from_shape_vec((height, width), decode_f32s(bytes)?)?),
        })
    }

    pub fn kind(&self) -> PixelKind {
        match self {
            Frame::U16(_) => PixelKind::U16,
            Frame::F32(_) => PixelKind::F32,
        }
    }

    /// (height, width)
    pub fn dim(&self) -> (usize, usize) {
        match self {
            Frame::U16(a) => a.dim(),
            Frame::F32(a) => a.dim(),
        }
    }

    pub fn to_f32(&self) -> Array2<f32> {
        match self {
            Frame::U16(a) => a.mapv(|v| v as f32),
            Frame::F32(a) => a.clone(),
        }
    }

    pub fn to_u16(&self) -> Array2<u16> {
        match self {
            Frame::U16(a) => a.clone(),
            // `as` saturates at the u16 range and maps NaN to 0
            Frame::F32(a) => a.mapv(|v| v as u16),
        }
    }

    /// Serialized payload in `kind`, casting if needed.
    pub fn encode_as(&self, kind: PixelKind) -> Vec<u8> {
        match (self, kind) {
            (Frame::U16(a), PixelKind::U16) => encode_u16s(a.iter()),
            (Frame::F32(a), PixelKind::F32) => encode_f32s(a.iter()),
            (_, PixelKind::U16) => encode_u16s(self.to_u16().iter()),
            (_, PixelKind::F32) => encode_f32s(self.to_f32().iter()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PixelStack {
    U16(Array3<u16>),
    F32(Array3<f32>),
}

fn stack_views<T: Clone + Default>(views: &[ArrayView2<'_, T>], height: usize, width: usize) -> Result<Array3<T>> {
    if views.is_empty() {
        return Ok(Array3::from_elem((0, height, width), T::default()));
    }
    stack(Axis(0), views).map_err(|e| anyhow!("stack frames: {}", e))
}

impl PixelStack {
    pub fn empty(kind: PixelKind, height: usize, width: usize) -> Self {
        match kind {
            PixelKind::U16 => PixelStack::U16(Array3::zeros((0, height, width))),
            PixelKind::F32 => PixelStack::F32(Array3::zeros((0, height, width))),
        }
    }

    /// Stack frames along a new leading axis, casting each to `kind`.
    /// Frames must share one `(height, width)`.
    pub fn from_frames(kind: PixelKind, height: usize, width: usize, frames: &[Frame]) -> Result<Self> {
        if let Some((i, f)) = frames.iter().enumerate().find(|(_, f)| f.dim() != (height, width)) {
            return Err(TxrmError::type_mismatch(
                "images",
                format!("frame {} is {:?}, expected {:?}", i, f.dim(), (height, width)),
            )
            .into());
        }
        Ok(match kind {
            PixelKind::U16 => {
                let owned: Vec<Array2<u16>> = frames.iter().map(|f| f.to_u16()).collect();
                let views: Vec<_> = owned.iter().map(|a| a.view()).collect();
                PixelStack::U16(stack_views(&views, height, width)?)
            }
            PixelKind::F32 => {
                let owned: Vec<Array2<f32>> = frames.iter().map(|f| f.to_f32()).collect();
                let views: Vec<_> = owned.iter().map(|a| a.view()).collect();
                PixelStack::F32(stack_views(&views, height, width)?)
            }
        })
    }

    pub fn kind(&self) -> PixelKind {
        match self {
            PixelStack::U16(_) => PixelKind::U16,
            PixelStack::F32(_) => PixelKind::F32,
        }
    }

    /// Number of frames.
    pub fn len(&self) -> usize {
        self.dim().0
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// (count, height, width)
    pub fn dim(&self) -> (usize, usize, usize) {
        match self {
            PixelStack::U16(a) => a.dim(),
            PixelStack::F32(a) => a.dim(),
        }
    }

    pub fn frame_dim(&self) -> (usize, usize) {
        let (_, h, w) = self.dim();
        (h, w)
    }

    /// Frame `i` (0-based) as an owned buffer.
    pub fn frame(&self, i: usize) -> Option<Frame> {
        if i >= self.len() {
            return None;
        }
        Some(match self {
            PixelStack::U16(a) => Frame::U16(a.index_axis(Axis(0), i).to_owned()),
            PixelStack::F32(a) => Frame::F32(a.index_axis(Axis(0), i).to_owned()),
        })
    }

    /// Serialized frame `i` (0-based) in `kind`. Panics on an out-of-range index,
    /// callers iterate `0..len()`.
    pub fn frame_bytes(&self, i: usize, kind: PixelKind) -> Vec<u8> {
        match (self, kind) {
            (PixelStack::U16(a), PixelKind::U16) => encode_u16s(a.index_axis(Axis(0), i).iter()),
            (PixelStack::F32(a), PixelKind::F32) => encode_f32s(a.index_axis(Axis(0), i).iter()),
            (PixelStack::U16(a), PixelKind::F32) => {
                let f = a.index_axis(Axis(0), i).mapv(|v| v as f32);
                encode_f32s(f.iter())
            }
            (PixelStack::F32(a), PixelKind::U16) => {
                let f = a.index_axis(Axis(0), i).mapv(|v| v as u16);
                encode_u16s(f.iter())
            }
        }
    }

    pub fn to_f32(&self) -> Array3<f32> {
        match self {
            PixelStack::U16(a) => a.mapv(|v| v as f32),
            PixelStack::F32(a) => a.clone(),
        }
    }

    pub fn cast(self, kind: PixelKind) -> PixelStack {
        match (self, kind) {
            (PixelStack::U16(a), PixelKind::F32) => PixelStack::F32(a.mapv(|v| v as f32)),
            (PixelStack::F32(a), PixelKind::U16) => PixelStack::U16(a.mapv(|v| v as u16)),
            (same, _) => same,
        }
    }

    /// First `n` frames (all of them if `n >= len()`).
    pub fn head(&self, n: usize) -> PixelStack {
        let n = n.min(self.len());
        match self {
            PixelStack::U16(a) => PixelStack::U16(a.slice(s![..n, .., ..]).to_owned()),
            PixelStack::F32(a) => PixelStack::F32(a.slice(s![..n, .., ..]).to_owned()),
        }
    }
}

impl From<Array3<f32>> for PixelStack {
    fn from(a: Array3<f32>) -> Self {
        PixelStack::F32(a)
    }
}

impl From<Array3<u16>> for PixelStack {
    fn from(a: Array3<u16>) -> Self {
        PixelStack::U16(a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_decode_checks_size() -> Result<()> {
        let bytes = encode_u16s(&[1u16, 2, 3, 4, 5, 6]);
        let f = Frame::decode(&bytes, PixelKind::U16, 2, 3, "image")?;
        assert_eq!(f.dim(), (2, 3));
        assert_eq!(f.encode_as(PixelKind::U16), bytes);
        assert!(Frame::decode(&bytes, PixelKind::U16, 3, 3, "image").is_err());
        assert!(Frame::decode(&bytes, PixelKind::F32, 2, 3, "image").is_err());
        Ok(())
    }

    #[test]
    fn stack_frames_and_cast() -> Result<()> {
        let a = Frame::U16(Array2::from_elem((2, 2), 7u16));
        let b = Frame::F32(Array2::from_elem((2, 2), 1.5f32));
        let st = PixelStack::from_frames(PixelKind::F32, 2, 2, &[a, b])?;
        assert_eq!(st.dim(), (2, 2, 2));
        assert_eq!(st.frame(1), Some(Frame::F32(Array2::from_elem((2, 2), 1.5))));
        assert_eq!(st.frame(2), None);

        let u = st.clone().cast(PixelKind::U16);
        assert_eq!(u.frame_bytes(1, PixelKind::U16), encode_u16s(&[1u16, 1, 1, 1]));
        assert_eq!(st.head(1).len(), 1);

        let empty = PixelStack::from_frames(PixelKind::U16, 4, 3, &[])?;
        assert_eq!(empty.dim(), (0, 4, 3));
        Ok(())
    }

    #[test]
    fn mismatched_frame_is_rejected() {
        let a = Frame::U16(Array2::zeros((2, 2)));
        let b = Frame::U16(Array2::zeros((2, 3)));
        assert!(PixelStack::from_frames(PixelKind::U16, 2, 2, &[a, b]).is_err());
    }
}
