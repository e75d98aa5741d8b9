//! CfbStorage - TXRM file as an OLE/Compound File Binary container.
//!
//! Открытие:
//! - файл открывается read-only (OpenMode::Read) или read-write (OpenMode::Write);
//! - на дескриптор берётся эксклюзивный fs2-lock (try, без ожидания), снимается на Drop.
//!
//! Commit (атомарное сохранение):
//! 1) flush текущего хэндла;
//! 2) копия файла -> <file>.tmp;
//! 3) план применяется к копии, flush + fsync;
//! 4) rename tmp -> file, fsync родительского каталога;
//! 5) хэндл и lock переоткрываются на новом файле.
//! Ошибка на шагах 2–3 удаляет tmp; рабочий файл не меняется.
//! Replacing the file while it is open requires POSIX rename semantics.

use anyhow::{anyhow, Context, Result};
use ::cfb::CompoundFile;
use log::{debug, info, warn};
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use super::{split_parent, NodeEntry, NodeKind, OpenMode, Storage};
use crate::consts::TMP_EXT;
use crate::error::TxrmError;
use crate::lock::{try_acquire_exclusive_lock, LockGuard};
use crate::metrics::{record_stream_read, record_stream_written};
use crate::save::SavePlan;

pub struct CfbStorage {
    path: PathBuf,
    mode: OpenMode,
    inner: CompoundFile<File>,
    // держим lock до Drop
    _lock: LockGuard,
}

#[inline]
fn cfb_path(path: &str) -> String {
    format!("/{}", path.trim_matches('/'))
}

pub(crate) fn tmp_path(path: &Path) -> PathBuf {
    let mut s = path.as_os_str().to_owned();
    s.push(".");
    s.push(TMP_EXT);
    PathBuf::from(s)
}

#[cfg(unix)]
fn fsync_dir(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            let dir = File::open(parent)?;
            dir.sync_all()?;
        }
    }
    Ok(())
}
#[cfg(not(unix))]
fn fsync_dir(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

impl CfbStorage {
    /// Open an existing container.
    pub fn open(path: &Path, mode: OpenMode) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(mode.is_write())
            .open(path)
            .with_context(|| format!("open container {}", path.display()))?;
        let lock = try_acquire_exclusive_lock(&file, path)?;
        let inner = CompoundFile::open(file)
            .with_context(|| format!("parse compound file {}", path.display()))?;
        debug!("cfb: opened {} ({:?})", path.display(), mode);
        Ok(Self {
            path: path.to_path_buf(),
            mode,
            inner,
            _lock: lock,
        })
    }

    /// Create a new, empty container (fails if the file exists).
    pub fn create(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path)
            .with_context(|| format!("create container {}", path.display()))?;
        let lock = try_acquire_exclusive_lock(&file, path)?;
        let inner = CompoundFile::create(file)
            .with_context(|| format!("init compound file {}", path.display()))?;
        debug!("cfb: created {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            mode: OpenMode::Write,
            inner,
            _lock: lock,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    fn ensure_write(&self) -> Result<()> {
        if !self.mode.is_write() {
            return Err(TxrmError::ReadOnly("container opened read-only").into());
        }
        Ok(())
    }

    fn stage_into_tmp(&self, tmp: &Path, plan: &SavePlan) -> Result<()> {
        fs::copy(&self.path, tmp)
            .with_context(|| format!("copy {} -> {}", self.path.display(), tmp.display()))?;
        {
            let mut scratch = CfbStorage::open(tmp, OpenMode::Write)?;
            plan.apply(&mut scratch)?;
            scratch.flush()?;
        }
        File::open(tmp)
            .and_then(|f| f.sync_all())
            .with_context(|| format!("fsync {}", tmp.display()))?;
        Ok(())
    }
}

impl Storage for CfbStorage {
    fn list_children(&self, path: &str) -> Result<Vec<NodeEntry>> {
        let p = cfb_path(path);
        let entries = self
            .inner
            .read_storage(&p)
            .with_context(|| format!("read storage '{}'", p))?;
        Ok(entries
            .map(|e| NodeEntry {
                name: e.name().to_string(),
                kind: if e.is_storage() {
                    NodeKind::Storage
                } else {
                    NodeKind::Stream
                },
            })
            .collect())
    }

    fn read_stream(&mut self, path: &str) -> Result<Option<Vec<u8>>> {
        let p = cfb_path(path);
        if !self.inner.is_stream(&p) {
            return Ok(None);
        }
        let mut stream = self
            .inner
            .open_stream(&p)
            .with_context(|| format!("open stream '{}'", p))?;
        let mut buf = Vec::with_capacity(stream.len() as usize);
        stream
            .read_to_end(&mut buf)
            .with_context(|| format!("read stream '{}'", p))?;
        record_stream_read(buf.len());
        Ok(Some(buf))
    }

    fn write_stream(&mut self, path: &str, data: &[u8]) -> Result<()> {
        self.ensure_write()?;
        let (parent, name) = split_parent(path);
        if name.is_empty() {
            return Err(anyhow!("empty stream name in '{}'", path));
        }
        if !parent.is_empty() {
            self.create_storage(parent)?;
        }
        let p = cfb_path(path);
        if self.inner.is_storage(&p) {
            return Err(anyhow!("'{}' is a storage, not a stream", path));
        }
        let mut stream = if self.inner.is_stream(&p) {
            let mut s = self
                .inner
                .open_stream(&p)
                .with_context(|| format!("open stream '{}'", p))?;
            s.set_len(data.len() as u64)?;
            s.seek(SeekFrom::Start(0))?;
            s
        } else {
            self.inner
                .create_new_stream(&p)
                .with_context(|| format!("create stream '{}'", p))?
        };
        stream
            .write_all(data)
            .with_context(|| format!("write stream '{}'", p))?;
        stream.flush()?;
        record_stream_written(data.len());
        Ok(())
    }

    fn create_storage(&mut self, path: &str) -> Result<()> {
        self.ensure_write()?;
        let p = cfb_path(path);
        if self.inner.is_storage(&p) {
            return Ok(());
        }
        self.inner
            .create_storage_all(&p)
            .with_context(|| format!("create storage '{}'", p))?;
        Ok(())
    }

    fn destroy(&mut self, path: &str) -> Result<()> {
        self.ensure_write()?;
        let p = cfb_path(path);
        if self.inner.is_storage(&p) {
            self.inner
                .remove_storage_all(&p)
                .with_context(|| format!("remove storage '{}'", p))?;
        } else if self.inner.is_stream(&p) {
            self.inner
                .remove_stream(&p)
                .with_context(|| format!("remove stream '{}'", p))?;
        } else {
            return Err(anyhow!("destroy: no such node '{}'", path));
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if self.mode.is_write() {
            self.inner
                .flush()
                .with_context(|| format!("flush {}", self.path.display()))?;
        }
        Ok(())
    }

    fn commit(&mut self, plan: &SavePlan) -> Result<()> {
        self.ensure_write()?;
        self.flush()?;

        let tmp = tmp_path(&self.path);
        // stale tmp from an interrupted save
        if tmp.exists() {
            if let Err(e) = fs::remove_file(&tmp) {
                warn!("cfb: remove stale {}: {}", tmp.display(), e);
            }
        }

        if let Err(e) = self.stage_into_tmp(&tmp, plan) {
            if tmp.exists() {
                if let Err(rm) = fs::remove_file(&tmp) {
                    warn!("cfb: cleanup {} failed: {}", tmp.display(), rm);
                }
            }
            return Err(e.context(format!("staged save of {} aborted", self.path.display())));
        }

        fs::rename(&tmp, &self.path)
            .with_context(|| format!("rename {} -> {}", tmp.display(), self.path.display()))?;
        if let Err(e) = fsync_dir(&self.path) {
            warn!("cfb: fsync dir of {}: {}", self.path.display(), e);
        }

        // старый хэндл указывает на отвязанный inode - переоткрываем
        let fresh = CfbStorage::open(&self.path, self.mode)?;
        *self = fresh;
        info!(
            "cfb: committed {} op(s), {} B to {}",
            plan.len(),
            plan.bytes_total(),
            self.path.display()
        );
        Ok(())
    }
}
