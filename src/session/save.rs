//! save / save_as.

use anyhow::{Context, Result};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

use super::{with_txrm_ext, TxrmFile};
use crate::catalogue::PathCatalogue;
use crate::metrics::{record_save, record_save_rejected};
use crate::save::{build_plan, SaveInput, SavePlan, SaveReport};
use crate::storage::{CfbStorage, OpenMode, Storage};

impl<S: Storage> TxrmFile<S> {
    /// Validate and stage the whole session. Nothing is written here.
    pub fn plan_save(&self) -> Result<(SavePlan, SaveReport)> {
        let input = SaveInput {
            registry: &self.state.registry,
            meta: &self.state.meta,
            const_arrays: &self.state.const_arrays,
            images: self.state.images.as_ref(),
            angle_unit: self.config.angle_unit,
        };
        build_plan(&input, &self.catalogue)
    }

    fn checked_plan(&self) -> Result<(SavePlan, SaveReport)> {
        let staged = self.ensure_write().and_then(|_| self.plan_save());
        if staged.is_err() {
            record_save_rejected();
        }
        staged
    }

    /// Persist the session into the working container. All-or-nothing.
    pub fn save(&mut self) -> Result<SaveReport> {
        let (plan, report) = self.checked_plan()?;
        self.storage.commit(&plan)?;
        self.catalogue = PathCatalogue::build(&self.storage)?;
        record_save(report.pages_written as u64, report.pages_pruned as u64);
        info!(
            "save: {} image(s), {} page(s) written, {} pruned, {} stream(s), {} B",
            report.images,
            report.pages_written,
            report.pages_pruned,
            report.streams_written,
            report.bytes_written
        );
        Ok(report)
    }
}

impl TxrmFile<CfbStorage> {
    /// `name` with `.txrm` appended; bare names and names whose directory does
    /// not exist land next to the working file.
    pub fn resolve_save_as(&self, name: impl AsRef<Path>) -> PathBuf {
        let p = with_txrm_ext(name.as_ref());
        let dir_ok = p
            .parent()
            .map(|d| !d.as_os_str().is_empty() && d.is_dir())
            .unwrap_or(false);
        if dir_ok {
            return p;
        }
        let base = self.path().parent().unwrap_or_else(|| Path::new(""));
        match p.file_name() {
            Some(f) => base.join(f),
            None => p,
        }
    }

    /// Save into a clone of the working file. The session stays bound to the working file.
    pub fn save_as(&mut self, name: impl AsRef<Path>) -> Result<PathBuf> {
        let target = self.resolve_save_as(name);
        if target == self.path() {
            self.save()?;
            return Ok(target);
        }
        let (plan, report) = self.checked_plan()?;

        self.storage.flush()?;
        fs::copy(self.path(), &target)
            .with_context(|| format!("copy {} -> {}", self.path().display(), target.display()))?;
        {
            let mut clone = CfbStorage::open(&target, OpenMode::Write)?;
            clone.commit(&plan)?;
        }
        record_save(report.pages_written as u64, report.pages_pruned as u64);
        info!(
            "save_as: {} ({} image(s), {} stream(s))",
            target.display(),
            report.images,
            report.streams_written
        );
        Ok(target)
    }
}
