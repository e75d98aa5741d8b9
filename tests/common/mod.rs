#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{anyhow, Result};
use ndarray::Array3;

use TxrmIO::codec::{encode_f32s, encode_u32s};
use TxrmIO::consts::*;
use TxrmIO::image::image_path;
use TxrmIO::meta::{FieldRole, MetadataRegistry};
use TxrmIO::{CfbStorage, PixelKind, PixelStack, Storage, TxrmFile, Value};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

pub fn unique_root(prefix: &str) -> PathBuf {
    let pid = std::process::id();
    let t = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    let base = std::env::temp_dir();
    base.join(format!("txrmtest-{prefix}-{pid}-{t}-{id}"))
}

/// Non-registry per-image stream with zero spread.
pub const ENERGY_PATH: &str = "ImageInfo/Energy";
/// Non-registry per-image stream that varies.
pub const EXPOSURE_PATH: &str = "ImageInfo/ExpTimes";

pub const SOURCE_DISTANCE: f32 = 35.5;
pub const DETECTOR_DISTANCE: f32 = 12.25;

/// Shape of a synthetic acquisition.
#[derive(Debug, Clone, Copy)]
pub struct Fixture {
    pub count: usize,
    pub height: usize,
    pub width: usize,
    pub kind: PixelKind,
    pub reference: bool,
    pub seed: u64,
}

impl Fixture {
    pub fn new(count: usize) -> Self {
        Self {
            count,
            height: 4,
            width: 3,
            kind: PixelKind::U16,
            reference: true,
            seed: 7,
        }
    }

    pub fn with_kind(mut self, kind: PixelKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn without_reference(mut self) -> Self {
        self.reference = false;
        self
    }

    /// Angles in degrees, evenly spaced over [-90, 90).
    pub fn angles_deg(&self) -> Vec<f32> {
        let step = 180.0 / self.count.max(1) as f32;
        (0..self.count).map(|i| -90.0 + step * i as f32).collect()
    }

    pub fn x_shifts(&self) -> Vec<f32> {
        (0..self.count).map(|i| i as f32 * 0.5).collect()
    }

    pub fn y_shifts(&self) -> Vec<f32> {
        (0..self.count).map(|i| -(i as f32) * 0.25).collect()
    }

    pub fn exposures(&self) -> Vec<f32> {
        (0..self.count).map(|i| 1.0 + (i % 7) as f32).collect()
    }

    /// Deterministic pixels; u16 values stay below 4096.
    pub fn stack(&self) -> PixelStack {
        let mut rng = oorandom::Rand32::new(self.seed);
        let shape = (self.count, self.height, self.width);
        match self.kind {
            PixelKind::U16 => {
                PixelStack::from(Array3::from_shape_fn(shape, |_| rng.rand_range(1..4096) as u16))
            }
            PixelKind::F32 => {
                PixelStack::from(Array3::from_shape_fn(shape, |_| 1.0 + rng.rand_float() * 100.0))
            }
        }
    }

    pub fn reference_value(&self) -> f32 {
        2.0
    }
}

fn record(text: &str) -> Vec<u8> {
    let mut r = text.as_bytes().to_vec();
    r.resize(RECORD_WIDTH, 0);
    r
}

/// Write a complete acquisition into any storage.
pub fn write_fixture<S: Storage + ?Sized>(s: &mut S, fx: &Fixture) -> Result<PixelStack> {
    let registry = MetadataRegistry::builtin();
    let n = fx.count as u32;

    s.write_stream("ImageInfo/ImageWidth", &encode_u32s(&[fx.width as u32]))?;
    s.write_stream("ImageInfo/ImageHeight", &encode_u32s(&[fx.height as u32]))?;
    s.write_stream("ImageInfo/DataType", &encode_u32s(&[fx.kind.type_code()]))?;
    s.write_stream("referencedata/DataType", &encode_u32s(&[TYPE_CODE_F32]))?;
    if let Some(spec) = registry.get(F_NUMBER_OF_IMAGES) {
        for p in &spec.paths {
            s.write_stream(p, &encode_u32s(&[n]))?;
        }
    }
    s.write_stream("ImageInfo/PixelSize", &encode_f32s(&[1.5f32]))?;
    s.write_stream("ImageInfo/ReferenceFile", &record("ref_0001.xrm"))?;

    s.write_stream(ANGLES_PATH, &encode_f32s(&fx.angles_deg()))?;
    s.write_stream("Alignment/X-Shifts", &encode_f32s(&fx.x_shifts()))?;
    s.write_stream("Alignment/Y-Shifts", &encode_f32s(&fx.y_shifts()))?;

    s.write_stream(DTORA_DISTANCE_PATH, &encode_f32s(&vec![DETECTOR_DISTANCE; fx.count]))?;
    s.write_stream(STORA_DISTANCE_PATH, &encode_f32s(&vec![SOURCE_DISTANCE; fx.count]))?;
    s.write_stream(ENERGY_PATH, &encode_f32s(&vec![40.0f32; fx.count]))?;
    s.write_stream(EXPOSURE_PATH, &encode_f32s(&fx.exposures()))?;

    let mut dates = Vec::new();
    for i in 0..fx.count {
        dates.extend(record(&format!("03/14/2023 10:{:02}:{:02}.000", i / 60, i % 60)));
    }
    s.write_stream(DATES_PATH, &dates)?;

    let mut names = record("Sample X");
    names.extend(record("Sample Theta"));
    let mut units = record("um");
    units.extend(record("deg"));
    let positions: Vec<f32> = fx
        .angles_deg()
        .iter()
        .enumerate()
        .flat_map(|(i, a)| [i as f32 * 10.0, *a])
        .collect();
    s.write_stream(AXIS_NAMES_PATH, &names)?;
    s.write_stream(AXIS_UNITS_PATH, &units)?;
    s.write_stream(MOTOR_POSITIONS_PATH, &encode_f32s(&positions))?;

    if fx.reference {
        let r = vec![fx.reference_value(); fx.height * fx.width];
        s.write_stream(REFERENCE_IMAGE_PATH, &encode_f32s(&r))?;
    }

    let stack = fx.stack();
    for i in 0..fx.count {
        s.write_stream(&image_path(i + 1), &stack.frame_bytes(i, fx.kind))?;
    }
    s.flush()?;
    Ok(stack)
}

/// Fresh `<root>/<name>.txrm` holding the fixture.
pub fn create_file(root: &Path, name: &str, fx: &Fixture) -> Result<(PathBuf, PixelStack)> {
    fs::create_dir_all(root)?;
    let path = root.join(format!("{}.{}", name, TXRM_EXT));
    let mut s = CfbStorage::create(&path)?;
    let stack = write_fixture(&mut s, fx)?;
    Ok((path, stack))
}

/// Keep the first `keep` frames and cut every per-image field to match.
pub fn shrink_to<S: Storage>(f: &mut TxrmFile<S>, keep: usize) -> Result<()> {
    let images = f
        .images()
        .map(|s| s.head(keep))
        .ok_or_else(|| anyhow!("stack not loaded"))?;
    f.set_images(images)?;
    let names: Vec<String> = f
        .state()
        .registry
        .fields()
        .iter()
        .filter(|s| s.role == FieldRole::PerImage)
        .map(|s| s.name.clone())
        .collect();
    for name in names {
        if let Some(v) = f.meta().get(&name).and_then(|v| v.as_f32_vec()) {
            f.set_meta_value(&name, Value::from_f32s(v[..keep].to_vec()))?;
        }
    }
    Ok(())
}
