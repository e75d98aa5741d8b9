//! LazyStack - frames fetched from the container per access.
//!
//! Внешняя индексация 0-based, адресация страниц 1-based (Image{i+1}).
//! Держит только &mut storage и закэшированную геометрию; весь стек не материализуется.

use anyhow::{anyhow, Result};
use ndarray::{Array2, Axis};
use std::ops::Range;

use super::eager::{divide_by_reference, load_reference, read_frame};
use super::pixels::{Frame, PixelStack};
use super::Geometry;
use crate::codec::{decode_f32s, PixelKind};
use crate::config::AngleUnit;
use crate::consts::ANGLES_PATH;
use crate::error::TxrmError;
use crate::storage::Storage;

pub struct LazyStack<'a, S: Storage + ?Sized> {
    storage: &'a mut S,
    geometry: Geometry,
    angle_unit: AngleUnit,
    reference: Option<Array2<f32>>,
}

impl<'a, S: Storage + ?Sized> LazyStack<'a, S> {
    /// With `normalize`, the reference frame is read once here and every
    /// returned frame is divided by it.
    pub fn new(storage: &'a mut S, geometry: Geometry, normalize: bool, angle_unit: AngleUnit) -> Result<Self> {
        let reference = if normalize {
            let kind = geometry.reference_kind()?;
            let r = load_reference(storage, kind, geometry.height, geometry.width)?
                .ok_or_else(|| TxrmError::StreamNotFound(crate::consts::REFERENCE_IMAGE_PATH.into()))?;
            Some(r.to_f32())
        } else {
            None
        };
        Ok(Self {
            storage,
            geometry,
            angle_unit,
            reference,
        })
    }

    pub fn len(&self) -> usize {
        self.geometry.count
    }

    pub fn is_empty(&self) -> bool {
        self.geometry.count == 0
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    pub fn is_normalized(&self) -> bool {
        self.reference.is_some()
    }

    fn check_index(&self, i: usize) -> Result<()> {
        if i >= self.geometry.count {
            return Err(anyhow!(
                "image index {} out of range (0..{})",
                i,
                self.geometry.count
            ));
        }
        Ok(())
    }

    fn fetch(&mut self, i: usize) -> Result<Frame> {
        self.check_index(i)?;
        let g = self.geometry;
        read_frame(&mut *self.storage, i + 1, g.kind, g.height, g.width)
    }

    /// One frame (0-based).
    pub fn get(&mut self, i: usize) -> Result<Frame> {
        let frame = self.fetch(i)?;
        match &self.reference {
            Some(r) => {
                let mut f = frame.to_f32().insert_axis(Axis(0));
                divide_by_reference(&mut f, r)?;
                Ok(Frame::F32(f.index_axis_move(Axis(0), 0)))
            }
            None => Ok(frame),
        }
    }

    /// Frames in request order (any order, repeats allowed).
    pub fn get_many(&mut self, indices: &[usize]) -> Result<PixelStack> {
        for &i in indices {
            self.check_index(i)?;
        }
        let mut frames = Vec::with_capacity(indices.len());
        for &i in indices {
            frames.push(self.fetch(i)?);
        }
        let g = self.geometry;
        match &self.reference {
            Some(r) => {
                let stack = PixelStack::from_frames(PixelKind::F32, g.height, g.width, &frames)?;
                let mut a = stack.to_f32();
                divide_by_reference(&mut a, r)?;
                Ok(PixelStack::F32(a))
            }
            None => PixelStack::from_frames(g.kind, g.height, g.width, &frames),
        }
    }

    pub fn get_range(&mut self, range: Range<usize>) -> Result<PixelStack> {
        let idx: Vec<usize> = range.collect();
        self.get_many(&idx)
    }

    /// Angles in the configured working unit.
    pub fn angles(&mut self) -> Result<Vec<f32>> {
        let bytes = self
            .storage
            .read_stream(ANGLES_PATH)?
            .ok_or_else(|| TxrmError::StreamNotFound(ANGLES_PATH.to_string()))?;
        let unit = self.angle_unit;
        Ok(decode_f32s(&bytes)?
            .into_iter()
            .map(|a| unit.from_degrees(a))
            .collect())
    }
}
