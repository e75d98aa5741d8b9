//! SavePlan - ordered list of storage mutations built by the save engine.
//!
//! План строится целиком до первой записи; backend применяет его атомарно
//! (Storage::commit). Порядок операций сохраняется: destroy -> create -> write.

use anyhow::{Context, Result};

use crate::storage::Storage;

#[derive(Debug, Clone, PartialEq)]
pub enum PlanOp {
    Destroy(String),
    CreateStorage(String),
    WriteStream { path: String, data: Vec<u8> },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SavePlan {
    ops: Vec<PlanOp>,
}

impl SavePlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn destroy(&mut self, path: impl Into<String>) {
        self.ops.push(PlanOp::Destroy(path.into()));
    }

    pub fn create_storage(&mut self, path: impl Into<String>) {
        self.ops.push(PlanOp::CreateStorage(path.into()));
    }

    pub fn write(&mut self, path: impl Into<String>, data: Vec<u8>) {
        self.ops.push(PlanOp::WriteStream {
            path: path.into(),
            data,
        });
    }

    pub fn ops(&self) -> &[PlanOp] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Payload bytes of all stream writes.
    pub fn bytes_total(&self) -> u64 {
        self.ops
            .iter()
            .map(|op| match op {
                PlanOp::WriteStream { data, .. } => data.len() as u64,
                _ => 0,
            })
            .sum()
    }

    pub fn streams_written(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, PlanOp::WriteStream { .. }))
            .count()
    }

    /// Payload of the last staged write to `path`, if any.
    pub fn writes_to(&self, path: &str) -> Option<&[u8]> {
        self.ops.iter().rev().find_map(|op| match op {
            PlanOp::WriteStream { path: p, data } if p == path => Some(data.as_slice()),
            _ => None,
        })
    }

    /// Apply operations in order. Not atomic by itself.
    pub fn apply<S: Storage + ?Sized>(&self, storage: &mut S) -> Result<()> {
        for op in &self.ops {
            match op {
                PlanOp::Destroy(p) => storage
                    .destroy(p)
                    .with_context(|| format!("plan: destroy '{}'", p))?,
                PlanOp::CreateStorage(p) => storage
                    .create_storage(p)
                    .with_context(|| format!("plan: create storage '{}'", p))?,
                PlanOp::WriteStream { path, data } => storage
                    .write_stream(path, data)
                    .with_context(|| format!("plan: write '{}'", path))?,
            }
        }
        Ok(())
    }
}
