//! catalogue - flat, sorted index of every stream path in the container.
//!
//! Строится одним рекурсивным обходом дерева при каждом open (и после save);
//! storages не хранятся отдельно: "каталог существует" <=> есть stream с префиксом `dir/`.
//!
//! Имена в compound file сравниваются без учёта регистра (`referencedata/DataType`
//! и `ReferenceData/Image` живут в одном storage), поэтому ключ индекса - свёрнутый
//! путь, значение - написание, сохранённое в файле.

use anyhow::{Context, Result};
use std::collections::BTreeMap;

use crate::storage::{fold_path, join_path, NodeKind, Storage};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathCatalogue {
    // folded path -> stored spelling
    paths: BTreeMap<String, String>,
}

impl PathCatalogue {
    pub fn build<S: Storage + ?Sized>(storage: &S) -> Result<Self> {
        let mut paths = BTreeMap::new();
        walk(storage, "", &mut paths)?;
        Ok(Self { paths })
    }

    /// Known stream, or a storage that (transitively) contains at least one stream.
    pub fn exists(&self, path: &str) -> bool {
        let key = fold_path(path);
        if key.is_empty() {
            return !self.paths.is_empty();
        }
        if self.paths.contains_key(&key) {
            return true;
        }
        let prefix = format!("{}/", key);
        self.paths
            .range(prefix.clone()..)
            .next()
            .map_or(false, |(k, _)| k.starts_with(&prefix))
    }

    /// Exact stream match (no directory semantics).
    pub fn is_stream(&self, path: &str) -> bool {
        self.paths.contains_key(&fold_path(path))
    }

    /// Stored spelling of a stream path.
    pub fn resolve(&self, path: &str) -> Option<&str> {
        self.paths.get(&fold_path(path)).map(|s| s.as_str())
    }

    /// Streams under `dir/` in sorted order, as stored.
    pub fn under<'a>(&'a self, dir: &str) -> impl Iterator<Item = &'a str> + 'a {
        let prefix = format!("{}/", fold_path(dir));
        self.paths
            .range(prefix.clone()..)
            .take_while(move |(k, _)| k.starts_with(&prefix))
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.paths.values().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.paths.values().cloned().collect()
    }

    #[cfg(test)]
    pub(crate) fn insert(&mut self, path: &str) {
        let stored = path.trim_matches('/');
        self.paths.insert(fold_path(stored), stored.to_string());
    }

    /// Drop a stream, or every stream below a storage path.
    pub(crate) fn remove(&mut self, path: &str) {
        let key = fold_path(path);
        if self.paths.remove(&key).is_some() {
            return;
        }
        let prefix = format!("{}/", key);
        self.paths.retain(|k, _| !k.starts_with(&prefix));
    }
}

fn walk<S: Storage + ?Sized>(
    storage: &S,
    dir: &str,
    out: &mut BTreeMap<String, String>,
) -> Result<()> {
    let children = storage
        .list_children(dir)
        .with_context(|| format!("enumerate '{}'", dir))?;
    for child in children {
        let path = join_path(dir, &child.name);
        match child.kind {
            NodeKind::Storage => walk(storage, &path, out)?,
            NodeKind::Stream => {
                out.insert(fold_path(&path), path);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemStorage;

    fn sample() -> Result<MemStorage> {
        let mut s = MemStorage::new();
        s.write_stream("ImageInfo/Angles", &[0u8; 8])?;
        s.write_stream("ImageInfo/NoOfImages", &[2, 0, 0, 0])?;
        s.write_stream("ImageData1/Image1", &[0u8; 4])?;
        s.write_stream("ImageData1/Image2", &[0u8; 4])?;
        s.write_stream("ImageData10/Image901", &[0u8; 4])?;
        s.create_storage("Empty")?;
        Ok(s)
    }

    #[test]
    fn build_is_sorted_and_flat() -> Result<()> {
        let cat = PathCatalogue::build(&sample()?)?;
        let v = cat.to_vec();
        assert_eq!(v.len(), 5);
        let mut sorted = v.clone();
        sorted.sort_by_key(|p| p.to_ascii_lowercase());
        assert_eq!(v, sorted);
        assert!(v.contains(&"ImageData1/Image2".to_string()));
        Ok(())
    }

    #[test]
    fn exists_leaf_and_directory_prefix() -> Result<()> {
        let cat = PathCatalogue::build(&sample()?)?;
        assert!(cat.exists("ImageInfo/Angles"));
        assert!(cat.exists("ImageInfo"));
        assert!(cat.exists("ImageData1"));
        assert!(cat.exists("ImageData10"));
        // prefix must end at a path boundary
        assert!(!cat.exists("ImageData"));
        assert!(!cat.exists("ImageInfo/Ang"));
        // storages without streams carry no data
        assert!(!cat.exists("Empty"));
        assert!(!cat.exists("ImageData2"));
        Ok(())
    }

    #[test]
    fn lookups_ignore_case_and_keep_the_stored_spelling() -> Result<()> {
        let mut s = MemStorage::new();
        s.write_stream("referencedata/DataType", &[10, 0, 0, 0])?;
        s.write_stream("ReferenceData/Image", &[0u8; 4])?;
        let cat = PathCatalogue::build(&s)?;

        assert_eq!(cat.len(), 2);
        assert!(cat.is_stream("ReferenceData/Image"));
        assert!(cat.is_stream("REFERENCEDATA/image"));
        assert!(cat.exists("ReferenceData"));
        assert_eq!(cat.resolve("ReferenceData/Image"), Some("referencedata/Image"));
        let listed: Vec<_> = cat.under("REFERENCEDATA").collect();
        assert_eq!(listed, vec!["referencedata/DataType", "referencedata/Image"]);
        Ok(())
    }

    #[test]
    fn under_and_remove() -> Result<()> {
        let mut cat = PathCatalogue::build(&sample()?)?;
        let page1: Vec<_> = cat.under("ImageData1").collect();
        assert_eq!(page1, vec!["ImageData1/Image1", "ImageData1/Image2"]);

        cat.remove("imagedata1");
        assert!(!cat.exists("ImageData1"));
        assert!(cat.exists("ImageData10"));

        cat.insert("ImageData1/Image1");
        assert!(cat.is_stream("ImageData1/Image1"));
        assert!(!cat.is_stream("ImageData1/Image2"));
        Ok(())
    }
}
