//! Typed accessors and mutators of the in-memory model.

use anyhow::{Context, Result};
use log::{debug, warn};

use super::{SessionSnapshot, TxrmFile};
use crate::classify::ConstArrays;
use crate::codec::{self, Dtype, PixelKind};
use crate::consts::*;
use crate::error::TxrmError;
use crate::image::{normalize, scalar_u32, Frame, Geometry, LazyStack, PixelStack};
use crate::meta::{motor_table, split_records, FieldRole, MetaMap, MotorTable};
use crate::storage::Storage;
use crate::value::Value;

impl<S: Storage> TxrmFile<S> {
    // ---------- raw streams ----------

    /// Raw payload of any stream; None if absent.
    pub fn get(&mut self, path: &str) -> Result<Option<Vec<u8>>> {
        self.storage.read_stream(path)
    }

    /// Stream, or storage containing at least one stream.
    pub fn exists(&self, path: &str) -> bool {
        self.catalogue.exists(path)
    }

    /// Every stream path, sorted.
    pub fn streams(&self) -> Vec<String> {
        self.catalogue.to_vec()
    }

    /// Destroy a stream (or storage subtree) in the working container right away.
    pub fn remove_stream(&mut self, path: &str) -> Result<()> {
        self.ensure_write()?;
        self.storage
            .destroy(path)
            .with_context(|| format!("remove '{}'", path))?;
        self.storage.flush()?;
        self.catalogue.remove(path);
        self.state
            .const_arrays
            .retain(|p, _| !p.eq_ignore_ascii_case(path));
        let owned: Vec<String> = self
            .state
            .registry
            .fields()
            .iter()
            .filter(|f| f.paths.len() == 1 && f.paths[0].eq_ignore_ascii_case(path))
            .map(|f| f.name.clone())
            .collect();
        for name in owned {
            self.state.registry.remove(&name);
            self.state.meta.remove(&name);
        }
        debug!("session: removed '{}'", path);
        Ok(())
    }

    // ---------- geometry ----------

    fn meta_u32(&self, name: &str) -> Result<u32> {
        scalar_u32(self.state.meta.get(name), name)
    }

    pub fn image_width(&self) -> Result<u32> {
        self.meta_u32(F_IMAGE_WIDTH)
    }

    pub fn image_height(&self) -> Result<u32> {
        self.meta_u32(F_IMAGE_HEIGHT)
    }

    pub fn number_of_images(&self) -> Result<u32> {
        self.meta_u32(F_NUMBER_OF_IMAGES)
    }

    pub fn geometry(&self) -> Result<Geometry> {
        Geometry::from_meta(&self.state.meta)
    }

    pub fn pixel_size(&self) -> Option<f32> {
        self.state.meta.get(F_PIXEL_SIZE).and_then(|v| v.as_f32())
    }

    // ---------- angles ----------

    /// Angles in the configured working unit.
    pub fn angles(&self) -> Option<Vec<f32>> {
        self.state.meta.get(F_ANGLES).and_then(|v| v.as_f32_vec())
    }

    #[deprecated(note = "use angles()")]
    pub fn thetas(&self) -> Option<Vec<f32>> {
        warn!("thetas() is deprecated, use angles()");
        self.angles()
    }

    /// Replace angles (working unit). Registers the field if the file had none.
    pub fn set_angles(&mut self, angles: Vec<f32>) {
        if !self.state.registry.contains(F_ANGLES) {
            self.state
                .registry
                .register_single(F_ANGLES, ANGLES_PATH, Dtype::F32, FieldRole::PerImage);
        }
        self.state
            .meta
            .insert(F_ANGLES.to_string(), Value::from_f32s(angles));
    }

    // ---------- derived records ----------

    /// (source-to-detector, -source-to-sample) distance from the first entries.
    pub fn distances(&self) -> Result<(f32, f32)> {
        let first = |path: &str| -> Result<f32> {
            self.state
                .const_arrays
                .get(path)
                .and_then(|v| v.first().copied())
                .ok_or_else(|| TxrmError::StreamNotFound(path.to_string()).into())
        };
        Ok((first(DTORA_DISTANCE_PATH)?, -first(STORA_DISTANCE_PATH)?))
    }

    /// (x_shifts, y_shifts) when both alignment arrays are present.
    pub fn shifts(&self) -> Option<(Vec<f32>, Vec<f32>)> {
        let x = self.state.meta.get(F_X_SHIFTS)?.as_f32_vec()?;
        let y = self.state.meta.get(F_Y_SHIFTS)?.as_f32_vec()?;
        Some((x, y))
    }

    fn required_stream(&mut self, path: &str) -> Result<Vec<u8>> {
        self.storage
            .read_stream(path)?
            .ok_or_else(|| TxrmError::StreamNotFound(path.to_string()).into())
    }

    /// Acquisition timestamps, one per image.
    pub fn dates(&mut self) -> Result<Vec<String>> {
        let bytes = self.required_stream(DATES_PATH)?;
        Ok(split_records(&bytes))
    }

    /// Motor positions per axis; raw and ideal tables when the file carries them.
    pub fn motors(&mut self) -> Result<MotorTable> {
        let names = self.required_stream(AXIS_NAMES_PATH)?;
        let units = self.required_stream(AXIS_UNITS_PATH)?;
        let positions = self.required_stream(MOTOR_POSITIONS_PATH)?;
        let raw = self.storage.read_stream(RAW_MOTOR_POSITIONS_PATH)?;
        let ideal = self.storage.read_stream(IDEAL_MOTOR_POSITIONS_PATH)?;
        motor_table(&names, &units, &positions, raw.as_deref(), ideal.as_deref())
    }

    pub fn const_arrays(&self) -> &ConstArrays {
        &self.state.const_arrays
    }

    // ---------- images ----------

    /// Decoded stack; None when the session was opened without eager images.
    pub fn images(&self) -> Option<&PixelStack> {
        self.state.images.as_ref()
    }

    pub fn reference(&self) -> Option<&Frame> {
        self.state.reference.as_ref()
    }

    /// Replace the stack. Pixels are cast to the kind declared by image_data_type
    /// and number_of_images follows the stack length; height/width are left to the caller.
    pub fn set_images(&mut self, images: PixelStack) -> Result<()> {
        let kind = self.declared_pixel_kind()?;
        let images = images.cast(kind);
        self.state
            .meta
            .insert(F_NUMBER_OF_IMAGES.to_string(), Value::U32(images.len() as u32));
        self.state.images = Some(images);
        Ok(())
    }

    /// Divide the stack by the reference image. The result is float32 and
    /// image_data_type is switched to float32 with it. Each call divides again.
    pub fn normalize_images(&mut self) -> Result<()> {
        let reference = self
            .state
            .reference
            .as_ref()
            .ok_or_else(|| TxrmError::StreamNotFound(REFERENCE_IMAGE_PATH.to_string()))?;
        let images = self
            .state
            .images
            .as_ref()
            .ok_or_else(|| TxrmError::type_mismatch("images", "stack was not loaded"))?;
        let out = normalize(images, reference)?;
        self.state.meta.insert(
            F_IMAGE_DATA_TYPE.to_string(),
            Value::U32(PixelKind::F32.type_code()),
        );
        self.set_images(out)
    }

    /// On-demand access to the stored pages (not to the in-memory stack).
    pub fn lazy_images(&mut self, normalize: bool) -> Result<LazyStack<'_, S>> {
        let geometry = Geometry::from_meta(&self.state.meta)?;
        LazyStack::new(&mut self.storage, geometry, normalize, self.config.angle_unit)
    }

    // ---------- metadata mapping ----------

    pub fn meta(&self) -> &MetaMap {
        &self.state.meta
    }

    /// Replace the whole mapping. The key set must be unchanged; new keys go through add_meta.
    /// With a loaded stack, number_of_images is re-pinned to its length.
    pub fn set_meta(&mut self, meta: MetaMap) -> Result<()> {
        if let Some(k) = meta.keys().find(|k| !self.state.meta.contains_key(*k)) {
            return Err(TxrmError::MetaKeys(k.clone()).into());
        }
        if let Some(k) = self.state.meta.keys().find(|k| !meta.contains_key(*k)) {
            return Err(TxrmError::MetaKeys(k.clone()).into());
        }
        self.state.meta = meta;
        if let Some(images) = &self.state.images {
            let n = images.len() as u32;
            self.state
                .meta
                .insert(F_NUMBER_OF_IMAGES.to_string(), Value::U32(n));
        }
        Ok(())
    }

    /// Replace one existing field.
    pub fn set_meta_value(&mut self, name: &str, value: Value) -> Result<()> {
        match self.state.meta.get_mut(name) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(TxrmError::MetaKeys(name.to_string()).into()),
        }
    }

    /// Register a new single-path field. Value comes from `data`, or is read from
    /// `path` when `data` is None; `shape` reshapes it. Names starting with
    /// `array_` are per-image and length-checked on save.
    pub fn add_meta(
        &mut self,
        name: &str,
        path: &str,
        dtype: Dtype,
        data: Option<Value>,
        shape: Option<&[usize]>,
    ) -> Result<()> {
        if data.is_none() && shape.is_none() {
            return Err(TxrmError::MissingArgument(name.to_string()).into());
        }
        let value = match data {
            Some(v) => {
                if v.dtype() != dtype {
                    return Err(TxrmError::type_mismatch(
                        name,
                        format!("data is {}, declared {}", v.dtype().name(), dtype.name()),
                    )
                    .into());
                }
                v
            }
            None => {
                let bytes = self.required_stream(path)?;
                codec::decode(&bytes, dtype).with_context(|| format!("add_meta '{}'", name))?
            }
        };
        let value = match shape {
            Some(shape) => value.reshape(shape)?,
            None => value,
        };
        let role = if dtype == Dtype::Bytes {
            FieldRole::Bytes
        } else if name.starts_with(DYNAMIC_PREFIX) {
            FieldRole::PerImage
        } else {
            FieldRole::Free
        };
        self.state.registry.register_single(name, path, dtype, role);
        self.state.meta.insert(name.to_string(), value);
        Ok(())
    }

    // ---------- snapshot ----------

    pub fn snapshot(&self) -> Option<&SessionSnapshot> {
        self.snapshot.as_ref()
    }

    /// Restore the in-memory model captured at load.
    pub fn reset(&mut self) -> Result<()> {
        let snap = self.snapshot.as_ref().ok_or(TxrmError::SnapshotUnavailable)?;
        self.state = snap.restore();
        debug!("session: reset to load snapshot");
        Ok(())
    }

    /// Pixel kind the stack will be written in.
    pub fn declared_pixel_kind(&self) -> Result<PixelKind> {
        PixelKind::from_type_code(self.meta_u32(F_IMAGE_DATA_TYPE)?, "image")
    }
}
