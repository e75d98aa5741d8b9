//! File-based locking for single-session safety.
//!
//! Cross-platform (fs2) advisory lock on the container file itself:
//! - Exclusive: one session per container, readers included (no shared mode).
//! - try-lock fails fast instead of blocking, matching exclusive-share open semantics.
//!
//! Lock is released on Drop.

use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::File;
use std::path::{Path, PathBuf};

pub struct LockGuard {
    file: File,
    path: PathBuf,
}

impl LockGuard {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        // ошибки unlock на Drop игнорируются
        let _ = self.file.unlock();
    }
}

/// Try to acquire an exclusive lock. Returns Err if another session holds the container.
pub fn try_acquire_exclusive_lock(file: &File, path: &Path) -> Result<LockGuard> {
    let dup = file
        .try_clone()
        .with_context(|| format!("dup handle {}", path.display()))?;
    dup.try_lock_exclusive().with_context(|| {
        format!(
            "try_lock_exclusive failed (container busy?): {}",
            path.display()
        )
    })?;
    Ok(LockGuard {
        file: dup,
        path: path.to_path_buf(),
    })
}
