//! registry - logical metadata field -> ordered list of redundant physical paths.
//!
//! Политика:
//! - read: только первый (канонический) путь; остальные - зеркала для записи,
//!   а не альтернативные источники чтения;
//! - write: значение кодируется один раз, одинаковые байты пишутся во все пути.

use anyhow::{Context, Result};
use std::collections::HashSet;

use crate::codec::{self, Dtype};
use crate::consts::*;
use crate::error::TxrmError;
use crate::save::SavePlan;
use crate::storage::Storage;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRole {
    /// Single value (geometry, type codes, sizes).
    Scalar,
    /// One entry per image; length is validated against number_of_images on save.
    PerImage,
    /// Opaque byte string.
    Bytes,
    /// User-registered value of arbitrary shape, written as-is.
    Free,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub paths: Vec<String>,
    pub dtype: Dtype,
    pub role: FieldRole,
    /// Load fails if the canonical stream is absent.
    pub required: bool,
}

impl FieldSpec {
    pub fn canonical_path(&self) -> &str {
        // paths is never empty: constructors always supply one
        self.paths.first().map(|s| s.as_str()).unwrap_or("")
    }
}

fn spec(name: &str, paths: &[&str], dtype: Dtype, role: FieldRole, required: bool) -> FieldSpec {
    FieldSpec {
        name: name.to_string(),
        paths: paths.iter().map(|p| p.to_string()).collect(),
        dtype,
        role,
        required,
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataRegistry {
    fields: Vec<FieldSpec>,
}

impl MetadataRegistry {
    /// Built-in instrument table. number_of_images is read from ImageInfo/NoOfImages,
    /// so that path leads its list; the other mirrors keep their order.
    pub fn builtin() -> Self {
        use FieldRole::*;
        let fields = vec![
            spec(F_IMAGE_WIDTH, &["ImageInfo/ImageWidth"], Dtype::U32, Scalar, true),
            spec(F_IMAGE_HEIGHT, &["ImageInfo/ImageHeight"], Dtype::U32, Scalar, true),
            spec(F_IMAGE_DATA_TYPE, &["ImageInfo/DataType"], Dtype::U32, Scalar, true),
            spec(
                F_NUMBER_OF_IMAGES,
                &[
                    "ImageInfo/NoOfImages",
                    "AcquisitionSettings/TotalImages",
                    "ImageInfo/ImagesTaken",
                    "PositionInfo/NoOfImages",
                    "TemperatureInfo/NoOfImages",
                    "ThermalHistoryInfo/NoOfImages",
                ],
                Dtype::U32,
                Scalar,
                true,
            ),
            spec(F_PIXEL_SIZE, &["ImageInfo/PixelSize"], Dtype::F32, Scalar, false),
            spec("cam_pixel_size", &["ImageInfo/CamPixelSize"], Dtype::F32, Scalar, false),
            spec(
                "optical_magnification",
                &["ImageInfo/OpticalMagnification"],
                Dtype::F32,
                Scalar,
                false,
            ),
            spec("binning", &["ImageInfo/CameraBinning"], Dtype::U32, Scalar, false),
            spec("reference_filename", &["ImageInfo/ReferenceFile"], Dtype::Bytes, Bytes, false),
            spec(F_REFERENCE_DATA_TYPE, &["referencedata/DataType"], Dtype::U32, Scalar, true),
            spec(F_ANGLES, &[ANGLES_PATH], Dtype::F32, PerImage, false),
            spec("x_positions", &["ImageInfo/XPosition"], Dtype::F32, PerImage, false),
            spec("y_positions", &["ImageInfo/YPosition"], Dtype::F32, PerImage, false),
            spec("z_positions", &["ImageInfo/ZPosition"], Dtype::F32, PerImage, false),
            spec(F_X_SHIFTS, &["Alignment/X-Shifts"], Dtype::F32, PerImage, false),
            spec(F_Y_SHIFTS, &["Alignment/Y-Shifts"], Dtype::F32, PerImage, false),
        ];
        Self { fields }
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Register (or replace, keeping the position) a field.
    pub fn register(&mut self, spec: FieldSpec) {
        match self.fields.iter_mut().find(|f| f.name == spec.name) {
            Some(slot) => *slot = spec,
            None => self.fields.push(spec),
        }
    }

    /// Single-path field, as created by add_meta and by array promotion.
    pub fn register_single(&mut self, name: &str, path: &str, dtype: Dtype, role: FieldRole) {
        self.register(spec(name, &[path], dtype, role, false));
    }

    pub fn remove(&mut self, name: &str) -> Option<FieldSpec> {
        let idx = self.fields.iter().position(|f| f.name == name)?;
        Some(self.fields.remove(idx))
    }

    /// Every path owned by some field (canonical and mirrors).
    pub fn claimed_paths(&self) -> HashSet<&str> {
        self.fields
            .iter()
            .flat_map(|f| f.paths.iter().map(|p| p.as_str()))
            .collect()
    }

    /// Decode a field from its canonical path. None if that stream is absent.
    pub fn load<S: Storage + ?Sized>(&self, storage: &mut S, name: &str) -> Result<Option<Value>> {
        let spec = self
            .get(name)
            .ok_or_else(|| TxrmError::type_mismatch(name, "field is not registered"))?;
        let path = spec.canonical_path();
        let bytes = match storage.read_stream(path)? {
            Some(b) => b,
            None => return Ok(None),
        };
        let v = codec::decode(&bytes, spec.dtype)
            .with_context(|| format!("decode field '{}' at {}", name, path))?;
        Ok(Some(v))
    }

    /// Stage the fan-out of `value`: encode once, same bytes to every registered path.
    pub fn write_back(&self, plan: &mut SavePlan, name: &str, value: &Value) -> Result<()> {
        let spec = self
            .get(name)
            .ok_or_else(|| TxrmError::type_mismatch(name, "field is not registered"))?;
        if value.dtype() != spec.dtype {
            return Err(TxrmError::type_mismatch(
                name,
                format!(
                    "value is {}, field is declared {}",
                    value.dtype().name(),
                    spec.dtype.name()
                ),
            )
            .into());
        }
        let bytes = codec::encode(value);
        for p in &spec.paths {
            plan.write(p, bytes.clone());
        }
        Ok(())
    }
}
