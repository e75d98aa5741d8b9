//! In-memory structured storage.

use anyhow::{anyhow, Result};
use std::collections::BTreeMap;

use super::{split_parent, NodeEntry, NodeKind, Storage};
use crate::metrics::{record_stream_read, record_stream_written};
use crate::save::SavePlan;

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Storage(BTreeMap<String, Node>),
    Stream(Vec<u8>),
}

/// Tree of storages/streams kept in memory. `PartialEq` lets tests assert
/// that a rejected save left the container untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemStorage {
    root: BTreeMap<String, Node>,
}

fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

impl MemStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of streams in the tree.
    pub fn stream_count(&self) -> usize {
        fn walk(m: &BTreeMap<String, Node>) -> usize {
            m.values()
                .map(|n| match n {
                    Node::Stream(_) => 1,
                    Node::Storage(c) => walk(c),
                })
                .sum()
        }
        walk(&self.root)
    }

    fn dir(&self, segs: &[&str]) -> Option<&BTreeMap<String, Node>> {
        let mut cur = &self.root;
        for s in segs {
            match child(cur, s) {
                Some(Node::Storage(m)) => cur = m,
                _ => return None,
            }
        }
        Some(cur)
    }

    fn dir_mut(&mut self, segs: &[&str]) -> Option<&mut BTreeMap<String, Node>> {
        let mut cur = &mut self.root;
        for s in segs {
            let key = stored_key(cur, s)?;
            let next = match cur.get_mut(&key) {
                Some(Node::Storage(m)) => m,
                _ => return None,
            };
            cur = next;
        }
        Some(cur)
    }

    fn dir_mut_create(&mut self, segs: &[&str]) -> Result<&mut BTreeMap<String, Node>> {
        let mut cur = &mut self.root;
        for s in segs {
            let key = stored_key(cur, s).unwrap_or_else(|| s.to_string());
            let next = match cur
                .entry(key)
                .or_insert_with(|| Node::Storage(BTreeMap::new()))
            {
                Node::Storage(m) => m,
                Node::Stream(_) => return Err(anyhow!("'{}' is a stream, not a storage", s)),
            };
            cur = next;
        }
        Ok(cur)
    }
}

/// Existing spelling of `name` among the children, compared case-insensitively.
fn stored_key(dir: &BTreeMap<String, Node>, name: &str) -> Option<String> {
    dir.keys().find(|k| k.eq_ignore_ascii_case(name)).cloned()
}

fn child<'a>(dir: &'a BTreeMap<String, Node>, name: &str) -> Option<&'a Node> {
    dir.iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, n)| n)
}

impl Storage for MemStorage {
    fn list_children(&self, path: &str) -> Result<Vec<NodeEntry>> {
        let dir = self
            .dir(&segments(path))
            .ok_or_else(|| anyhow!("storage not found: '{}'", path))?;
        Ok(dir
            .iter()
            .map(|(name, node)| NodeEntry {
                name: name.clone(),
                kind: match node {
                    Node::Storage(_) => NodeKind::Storage,
                    Node::Stream(_) => NodeKind::Stream,
                },
            })
            .collect())
    }

    fn read_stream(&mut self, path: &str) -> Result<Option<Vec<u8>>> {
        let (parent, name) = split_parent(path);
        let data = match self.dir(&segments(parent)).and_then(|d| child(d, name)) {
            Some(Node::Stream(b)) => b.clone(),
            _ => return Ok(None),
        };
        record_stream_read(data.len());
        Ok(Some(data))
    }

    fn write_stream(&mut self, path: &str, data: &[u8]) -> Result<()> {
        let (parent, name) = split_parent(path);
        if name.is_empty() {
            return Err(anyhow!("empty stream name in '{}'", path));
        }
        let dir = self.dir_mut_create(&segments(parent))?;
        if let Some(Node::Storage(_)) = child(dir, name) {
            return Err(anyhow!("'{}' is a storage, not a stream", path));
        }
        let key = stored_key(dir, name).unwrap_or_else(|| name.to_string());
        dir.insert(key, Node::Stream(data.to_vec()));
        record_stream_written(data.len());
        Ok(())
    }

    fn create_storage(&mut self, path: &str) -> Result<()> {
        self.dir_mut_create(&segments(path))?;
        Ok(())
    }

    fn destroy(&mut self, path: &str) -> Result<()> {
        let (parent, name) = split_parent(path);
        let removed = self.dir_mut(&segments(parent)).and_then(|d| {
            let key = stored_key(d, name)?;
            d.remove(&key)
        });
        match removed {
            Some(_) => Ok(()),
            None => Err(anyhow!("destroy: no such node '{}'", path)),
        }
    }

    /// All-or-nothing: the plan is applied to a clone which replaces the tree on success.
    fn commit(&mut self, plan: &SavePlan) -> Result<()> {
        let mut scratch = self.clone();
        plan.apply(&mut scratch)?;
        *self = scratch;
        Ok(())
    }
}
