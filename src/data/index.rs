use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::model::{AssetKind, SceneRecord};
use crate::error::SynscapeError;

// ---------------------------------------------------------------------------
// SampleIndex – scene identifiers found under a dataset root
// ---------------------------------------------------------------------------

/// Ordered scene records of one dataset root.
///
/// Identifiers are the file stems of `<root>/img/rgb/*.png`. Apart from that
/// one directory listing nothing is touched: the other four paths of each
/// record are formatted, not checked.
#[derive(Debug, Clone)]
pub struct SampleIndex {
    root: PathBuf,
    records: Vec<SceneRecord>,
}

impl SampleIndex {
    /// Scan `root` for scene identifiers and build one record per identifier.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let ids = scan_ids(&root)?;
        log::info!("{}: indexed {} scenes", root.display(), ids.len());
        Ok(Self::from_ids(root, ids))
    }

    /// Build records for already known identifiers, in the given order.
    pub fn from_ids<I, S>(root: impl Into<PathBuf>, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let root = root.into();
        let records = ids
            .into_iter()
            .map(|id| SceneRecord::new(&root, id.as_ref()))
            .collect();
        Self { root, records }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of scenes.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the root holds no scenes.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record at `index`, or [`SynscapeError::IndexOutOfBounds`].
    pub fn get(&self, index: usize) -> Result<&SceneRecord> {
        self.records.get(index).ok_or_else(|| {
            SynscapeError::IndexOutOfBounds {
                index,
                len: self.records.len(),
            }
            .into()
        })
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SceneRecord> {
        self.records.iter()
    }

    /// Scene identifiers in index order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.id.as_str())
    }
}

impl<'a> IntoIterator for &'a SampleIndex {
    type Item = &'a SceneRecord;
    type IntoIter = std::slice::Iter<'a, SceneRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

// ---------------------------------------------------------------------------
// Directory scan
// ---------------------------------------------------------------------------

fn scan_ids(root: &Path) -> Result<Vec<String>> {
    let dir = AssetKind::Image.dir(root);
    if !dir.is_dir() {
        return Err(SynscapeError::MissingImageDir { path: dir }.into());
    }

    let mut ids = Vec::new();
    for entry in std::fs::read_dir(&dir).with_context(|| format!("listing {}", dir.display()))? {
        let path = entry
            .with_context(|| format!("listing {}", dir.display()))?
            .path();
        if !path.is_file() || !has_extension(&path, AssetKind::Image.extension()) {
            continue;
        }
        match path.file_stem().and_then(|s| s.to_str()) {
            Some(stem) => ids.push(stem.to_string()),
            None => log::warn!("skipping non UTF-8 file name {}", path.display()),
        }
    }

    ids.sort_by(|a, b| compare_ids(a, b));
    Ok(ids)
}

/// Case-sensitive: the layout's paths are always formatted with `ext` as given.
pub(crate) fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(ext)
}

/// Numeric identifiers first, in numeric order; the rest lexicographically.
pub(crate) fn compare_ids(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}
