//! session - TxrmFile: one open container, its metadata model and image stack.
//!
//! Разделение по подмодулям:
//! - mod.rs       - TxrmFile, load (catalogue -> registry -> classifier -> images), open/close
//! - accessors.rs - чтение/изменение модели (angles, meta, images, records, ...)
//! - save.rs      - save / save_as через SaveEngine + Storage::commit
//! - snapshot.rs  - SessionState / SessionSnapshot (reset)

mod accessors;
mod save;
mod snapshot;

pub use snapshot::{SessionSnapshot, SessionState};

use anyhow::{Context, Result};
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

use crate::catalogue::PathCatalogue;
use crate::classify::{self, ConstArrays};
use crate::codec::{decode_f32s, Dtype};
use crate::config::{SessionBuilder, TxrmConfig};
use crate::consts::*;
use crate::error::TxrmError;
use crate::image::{load_reference, load_stack, Geometry};
use crate::meta::{FieldRole, MetaMap, MetadataRegistry};
use crate::storage::{CfbStorage, OpenMode, Storage};
use crate::value::Value;

pub struct TxrmFile<S: Storage = CfbStorage> {
    storage: S,
    mode: OpenMode,
    config: TxrmConfig,
    catalogue: PathCatalogue,
    state: SessionState,
    snapshot: Option<SessionSnapshot>,
}

fn load_state<S: Storage + ?Sized>(
    storage: &mut S,
    catalogue: &PathCatalogue,
    mode: OpenMode,
    cfg: &TxrmConfig,
) -> Result<SessionState> {
    // 1) registry fields from their canonical paths
    let mut registry = MetadataRegistry::builtin();
    let mut meta = MetaMap::new();
    for field in registry.fields().to_vec() {
        match registry.load(storage, &field.name)? {
            Some(v) => {
                let v = if field.name == F_ANGLES {
                    let unit = cfg.angle_unit;
                    v.map_f32(|a| unit.from_degrees(a))
                } else {
                    v
                };
                meta.insert(field.name.clone(), v);
            }
            None if field.required => {
                return Err(TxrmError::StreamNotFound(field.canonical_path().to_string()).into())
            }
            None => {
                debug!("load: optional field '{}' absent, dropped", field.name);
                registry.remove(&field.name);
            }
        }
    }
    let geometry = Geometry::from_meta(&meta)?;

    // 2) seeded const arrays
    let mut const_arrays = ConstArrays::new();
    for path in [DTORA_DISTANCE_PATH, STORA_DISTANCE_PATH] {
        if let Some(bytes) = storage.read_stream(path)? {
            const_arrays.insert(
                path.to_string(),
                decode_f32s(&bytes).with_context(|| format!("decode '{}'", path))?,
            );
        }
    }

    // 3) discovery, write sessions only
    if mode.is_write() {
        let found = classify::discover(
            storage,
            catalogue,
            &registry,
            &const_arrays,
            geometry.count,
            cfg.const_deviation_threshold,
        )?;
        const_arrays.extend(found.consts);
        for d in found.dynamics {
            registry.register_single(&d.name, &d.path, Dtype::F32, FieldRole::PerImage);
            meta.insert(d.name, Value::from_f32s(d.values));
        }
    }

    // 4) pixels
    let images = if cfg.eager_images {
        Some(load_stack(
            storage,
            geometry.count,
            geometry.kind,
            geometry.height,
            geometry.width,
        )?)
    } else {
        None
    };
    let reference = if catalogue.is_stream(REFERENCE_IMAGE_PATH) {
        load_reference(
            storage,
            geometry.reference_kind()?,
            geometry.height,
            geometry.width,
        )?
    } else {
        None
    };

    Ok(SessionState {
        registry,
        meta,
        const_arrays,
        images,
        reference,
    })
}

impl<S: Storage> TxrmFile<S> {
    /// Bind a session to an already opened storage and load the model.
    pub fn from_storage(mut storage: S, mode: OpenMode, config: TxrmConfig) -> Result<Self> {
        let catalogue = PathCatalogue::build(&storage)?;
        let state = load_state(&mut storage, &catalogue, mode, &config)?;
        let snapshot = if config.capture_snapshot {
            Some(SessionSnapshot::capture(&state))
        } else {
            None
        };
        info!(
            "session: loaded {} stream(s), {} field(s), {} const array(s) ({:?})",
            catalogue.len(),
            state.meta.len(),
            state.const_arrays.len(),
            mode
        );
        Ok(Self {
            storage,
            mode,
            config,
            catalogue,
            state,
            snapshot,
        })
    }

    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    pub fn config(&self) -> &TxrmConfig {
        &self.config
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn catalogue(&self) -> &PathCatalogue {
        &self.catalogue
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Unwrap the storage (tests inspect what a save produced).
    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Release the container. Unsaved changes are discarded.
    pub fn close(mut self) -> Result<()> {
        self.storage.flush()?;
        debug!("session: closed");
        Ok(())
    }

    pub(crate) fn ensure_write(&self) -> Result<()> {
        if !self.mode.is_write() {
            return Err(TxrmError::ReadOnly("save requires a write-mode session").into());
        }
        Ok(())
    }
}

/// `name` -> `name.txrm` unless it already carries the extension.
pub(crate) fn with_txrm_ext(path: &Path) -> PathBuf {
    match path.extension() {
        Some(ext) if ext == TXRM_EXT => path.to_path_buf(),
        _ => {
            let mut s = path.as_os_str().to_owned();
            s.push(".");
            s.push(TXRM_EXT);
            PathBuf::from(s)
        }
    }
}

/// `dir/stem.txrm` -> `dir/stem_edit.txrm`
pub(crate) fn edit_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{}{}.{}", stem, EDIT_SUFFIX, TXRM_EXT))
}

impl TxrmFile<CfbStorage> {
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    /// Open with configuration from the environment.
    pub fn open(path: impl AsRef<Path>, mode: OpenMode) -> Result<Self> {
        Self::open_with_config(path, mode, TxrmConfig::from_env())
    }

    pub fn open_ro(path: impl AsRef<Path>) -> Result<Self> {
        Self::open(path, OpenMode::Read)
    }

    /// Write sessions without `overwrite` work on a `<stem>_edit.txrm` copy.
    pub fn open_with_config(path: impl AsRef<Path>, mode: OpenMode, config: TxrmConfig) -> Result<Self> {
        let source = with_txrm_ext(path.as_ref());
        let working = if mode.is_write() && !config.overwrite {
            let target = edit_path(&source);
            fs::copy(&source, &target)
                .with_context(|| format!("copy {} -> {}", source.display(), target.display()))?;
            info!("session: editing copy {}", target.display());
            target
        } else {
            source
        };
        let storage = CfbStorage::open(&working, mode)?;
        Self::from_storage(storage, mode, config)
    }

    /// File the session reads from and saves to.
    pub fn path(&self) -> &Path {
        self.storage.path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_helpers() {
        assert_eq!(with_txrm_ext(Path::new("a/scan")), PathBuf::from("a/scan.txrm"));
        assert_eq!(with_txrm_ext(Path::new("a/scan.txrm")), PathBuf::from("a/scan.txrm"));
        assert_eq!(with_txrm_ext(Path::new("scan.v2")), PathBuf::from("scan.v2.txrm"));
        assert_eq!(edit_path(Path::new("/d/scan.txrm")), PathBuf::from("/d/scan_edit.txrm"));
    }
}
