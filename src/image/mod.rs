//! image - image stack: page addressing, pixel buffers, eager and lazy access.
//!
//! - paging.rs - ImageData{p}/Image{k} addressing (100 images per page)
//! - pixels.rs - Frame / PixelStack (uint16 | float32, ndarray)
//! - eager.rs  - full-stack load, reference image, normalize
//! - lazy.rs   - LazyStack: on-demand frames, bounded memory

pub mod eager;
pub mod lazy;
pub mod paging;
pub mod pixels;

use anyhow::Result;

use crate::codec::PixelKind;
use crate::consts::{
    F_IMAGE_DATA_TYPE, F_IMAGE_HEIGHT, F_IMAGE_WIDTH, F_NUMBER_OF_IMAGES, F_REFERENCE_DATA_TYPE,
};
use crate::error::TxrmError;
use crate::meta::{MetaMap, MetadataRegistry};
use crate::storage::Storage;
use crate::value::Value;

pub use eager::{load_reference, load_stack, normalize};
pub use lazy::LazyStack;
pub use paging::{image_path, page_name, page_of, pages_for};
pub use pixels::{Frame, PixelStack};

/// Stack geometry and pixel kinds as declared by the metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub count: usize,
    pub height: usize,
    pub width: usize,
    pub kind: PixelKind,
    /// Raw reference type code; resolved when the reference is read.
    pub reference_code: u32,
}

pub(crate) fn scalar_u32(value: Option<&Value>, name: &str) -> Result<u32> {
    let v = value.ok_or_else(|| TxrmError::StreamNotFound(name.to_string()))?;
    v.as_u32()
        .ok_or_else(|| TxrmError::type_mismatch(name, "expected an integer scalar").into())
}

impl Geometry {
    pub fn from_meta(meta: &MetaMap) -> Result<Self> {
        let get = |name: &str| scalar_u32(meta.get(name), name);
        Ok(Self {
            count: get(F_NUMBER_OF_IMAGES)? as usize,
            height: get(F_IMAGE_HEIGHT)? as usize,
            width: get(F_IMAGE_WIDTH)? as usize,
            kind: PixelKind::from_type_code(get(F_IMAGE_DATA_TYPE)?, "image")?,
            reference_code: get(F_REFERENCE_DATA_TYPE)?,
        })
    }

    /// Read only the geometry fields from storage (no full metadata load).
    pub fn read<S: Storage + ?Sized>(storage: &mut S, registry: &MetadataRegistry) -> Result<Self> {
        let mut meta = MetaMap::new();
        for name in [
            F_NUMBER_OF_IMAGES,
            F_IMAGE_HEIGHT,
            F_IMAGE_WIDTH,
            F_IMAGE_DATA_TYPE,
            F_REFERENCE_DATA_TYPE,
        ] {
            if let Some(v) = registry.load(storage, name)? {
                meta.insert(name.to_string(), v);
            }
        }
        Self::from_meta(&meta)
    }

    pub fn reference_kind(&self) -> Result<PixelKind> {
        PixelKind::from_type_code(self.reference_code, "reference")
    }
}
