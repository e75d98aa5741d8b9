//! storage - structured-storage backends (tree of storages holding named streams).
//!
//! - mod.rs  - трейт Storage, NodeKind/NodeEntry, OpenMode, path helpers
//! - compound.rs - CfbStorage: real OLE/CFB file (cfb crate) + exclusive fs2 lock, atomic commit
//! - mem.rs  - MemStorage: in-memory tree (tests, tooling), commit = apply to clone + swap
//!
//! Paths are `/`-delimited and relative to the root storage ("" is the root).
//! Node names compare case-insensitively, as in the compound file format.
//! Missing streams are reported as `Ok(None)`, never as empty payloads.

mod compound;
mod mem;

pub use self::compound::CfbStorage;
pub use self::mem::MemStorage;

use anyhow::Result;

use crate::save::SavePlan;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    Read,
    Write,
}

impl OpenMode {
    #[inline]
    pub fn is_write(self) -> bool {
        matches!(self, OpenMode::Write)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Storage,
    Stream,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeEntry {
    pub name: String,
    pub kind: NodeKind,
}

pub trait Storage {
    /// Direct children of the storage at `path`.
    fn list_children(&self, path: &str) -> Result<Vec<NodeEntry>>;

    /// Whole payload of the stream at `path`; None if there is no such stream.
    fn read_stream(&mut self, path: &str) -> Result<Option<Vec<u8>>>;

    /// Open-or-create the stream (and missing parent storages), resize to
    /// `data.len()` and write.
    fn write_stream(&mut self, path: &str, data: &[u8]) -> Result<()>;

    /// Open-or-create a storage (and missing parents).
    fn create_storage(&mut self, path: &str) -> Result<()>;

    /// Destroy a stream or a whole storage subtree. Missing paths are an error.
    fn destroy(&mut self, path: &str) -> Result<()>;

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    /// Apply a staged save plan. Backends override this to make the commit
    /// all-or-nothing; the default applies operations in order.
    fn commit(&mut self, plan: &SavePlan) -> Result<()> {
        plan.apply(self)?;
        self.flush()
    }
}

// ---------- path helpers ----------

/// Split "A/B/C" into ("A/B", "C"); a top-level name has parent "".
pub(crate) fn split_parent(path: &str) -> (&str, &str) {
    let p = path.trim_matches('/');
    match p.rfind('/') {
        Some(i) => (&p[..i], &p[i + 1..]),
        None => ("", p),
    }
}

pub(crate) fn join_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", parent, name)
    }
}

/// Case-folded, slash-trimmed form used to compare node names
/// (compound file names are case-insensitive).
pub(crate) fn fold_path(path: &str) -> String {
    path.trim_matches('/').to_ascii_lowercase()
}

/// Last `/` segment of a path.
pub fn leaf_name(path: &str) -> &str {
    split_parent(path).1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parent_split_and_join() {
        assert_eq!(split_parent("ImageData1/Image5"), ("ImageData1", "Image5"));
        assert_eq!(split_parent("/A/B/C/"), ("A/B", "C"));
        assert_eq!(split_parent("Top"), ("", "Top"));
        assert_eq!(join_path("", "x"), "x");
        assert_eq!(join_path("a/b", "x"), "a/b/x");
        assert_eq!(leaf_name("Alignment/X-Shifts"), "X-Shifts");
        assert_eq!(fold_path("/ReferenceData/Image/"), "referencedata/image");
    }
}
