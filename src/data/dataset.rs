use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::Result;
use image::RgbImage;

use super::index::SampleIndex;
use super::loader::{load_asset, load_class, load_depth_map, load_image};
use super::model::{Asset, AssetKind, DepthMap, Sample};

// ---------------------------------------------------------------------------
// Dataset – per-index access consumed by a training pipeline
// ---------------------------------------------------------------------------

/// Random access to decoded dataset items.
///
/// Implementations hold only the scene index and their options, so
/// independent instances can live in separate worker threads or processes.
pub trait Dataset {
    type Item;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Decode item `index`; fails with
    /// [`SynscapeError::IndexOutOfBounds`](crate::SynscapeError::IndexOutOfBounds)
    /// past the end.
    fn get(&self, index: usize) -> Result<Self::Item>;
}

// ---------------------------------------------------------------------------
// LoadOptions
// ---------------------------------------------------------------------------

/// Which assets [`SceneLoader`] decodes on every access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    pub kinds: BTreeSet<AssetKind>,
    /// Accepted and passed to the class loader; no remapping is applied.
    pub to_cityscapes: bool,
}

impl LoadOptions {
    pub fn new(kinds: impl IntoIterator<Item = AssetKind>) -> Self {
        Self {
            kinds: kinds.into_iter().collect(),
            to_cityscapes: false,
        }
    }

    /// All five asset kinds.
    pub fn all() -> Self {
        Self::new(AssetKind::ALL)
    }

    pub fn with_cityscapes_labels(mut self, to_cityscapes: bool) -> Self {
        self.to_cityscapes = to_cityscapes;
        self
    }
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self::all()
    }
}

// ---------------------------------------------------------------------------
// SceneLoader – index + configured set of decoders
// ---------------------------------------------------------------------------

/// Decodes a configurable set of assets for each indexed scene.
#[derive(Debug, Clone)]
pub struct SceneLoader {
    index: SampleIndex,
    options: LoadOptions,
}

impl SceneLoader {
    /// Index `root` and decode the given kinds on every access.
    pub fn new(root: impl Into<PathBuf>, options: LoadOptions) -> Result<Self> {
        Ok(Self::from_index(SampleIndex::new(root)?, options))
    }

    /// Loader decoding every asset kind.
    pub fn full(root: impl Into<PathBuf>) -> Result<Self> {
        Self::new(root, LoadOptions::all())
    }

    pub fn from_index(index: SampleIndex, options: LoadOptions) -> Self {
        Self { index, options }
    }

    pub fn index(&self) -> &SampleIndex {
        &self.index
    }

    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    fn load(&self, kind: AssetKind, path: &Path) -> Result<Asset> {
        match kind {
            AssetKind::Class => Ok(Asset::Class(load_class(path, self.options.to_cityscapes)?)),
            other => load_asset(other, path),
        }
    }
}

impl Dataset for SceneLoader {
    type Item = Sample;

    fn len(&self) -> usize {
        self.index.len()
    }

    fn get(&self, index: usize) -> Result<Sample> {
        let record = self.index.get(index)?;
        let mut sample = Sample {
            id: record.id.clone(),
            ..Sample::default()
        };
        for &kind in &self.options.kinds {
            sample.insert(self.load(kind, record.path(kind))?);
        }
        Ok(sample)
    }
}

// ---------------------------------------------------------------------------
// SynscapeDepth – (image, depth) pairs
// ---------------------------------------------------------------------------

/// Yields `(rgb image, depth map)` for each scene.
#[derive(Debug, Clone)]
pub struct SynscapeDepth {
    index: SampleIndex,
}

impl SynscapeDepth {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self::from_index(SampleIndex::new(root)?))
    }

    pub fn from_index(index: SampleIndex) -> Self {
        Self { index }
    }

    pub fn index(&self) -> &SampleIndex {
        &self.index
    }
}

impl Dataset for SynscapeDepth {
    type Item = (RgbImage, DepthMap);

    fn len(&self) -> usize {
        self.index.len()
    }

    fn get(&self, index: usize) -> Result<(RgbImage, DepthMap)> {
        let record = self.index.get(index)?;
        let image = load_image(&record.image)?;
        let depth = load_depth_map(&record.depth)?;
        Ok((image, depth))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::SceneRecord;
    use crate::data::writer::write_depth_exr;
    use crate::error::SynscapeError;
    use image::{GrayImage, ImageBuffer, Luma, Rgb};
    use ndarray::array;
    use tempfile::TempDir;

    fn write_scene(root: &Path, id: &str) {
        let rec = SceneRecord::new(root, id);
        for kind in AssetKind::ALL {
            std::fs::create_dir_all(kind.dir(root)).unwrap();
        }
        RgbImage::from_pixel(2, 2, Rgb([1, 2, 3])).save(&rec.image).unwrap();
        write_depth_exr(&rec.depth, &array![[5.0, 2000.0], [10.0, 20.0]], (0, 0)).unwrap();
        GrayImage::from_pixel(2, 2, Luma([7])).save(&rec.class).unwrap();
        ImageBuffer::<Luma<u16>, Vec<u16>>::from_pixel(2, 2, Luma([300]))
            .save(&rec.instance)
            .unwrap();
        std::fs::write(&rec.meta, format!(r#"{{"id": "{id}"}}"#)).unwrap();
    }

    #[test]
    fn depth_dataset_returns_image_and_depth() {
        let tmp = TempDir::new().unwrap();
        write_scene(tmp.path(), "1");
        write_scene(tmp.path(), "2");

        let ds = SynscapeDepth::new(tmp.path()).unwrap();
        assert_eq!(ds.len(), 2);
        let (image, depth) = ds.get(1).unwrap();
        assert_eq!(image.get_pixel(0, 0).0, [1, 2, 3]);
        assert_eq!(depth, array![[5.0, -1.0], [10.0, 20.0]]);
    }

    #[test]
    fn out_of_range_index_fails() {
        let tmp = TempDir::new().unwrap();
        write_scene(tmp.path(), "1");

        let ds = SynscapeDepth::new(tmp.path()).unwrap();
        let err = ds.get(1).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SynscapeError>(),
            Some(SynscapeError::IndexOutOfBounds { index: 1, len: 1 })
        ));

        let loader = SceneLoader::full(tmp.path()).unwrap();
        assert!(loader.get(5).is_err());
    }

    #[test]
    fn full_loader_fills_every_slot() {
        let tmp = TempDir::new().unwrap();
        write_scene(tmp.path(), "a");

        let loader = SceneLoader::full(tmp.path()).unwrap();
        let sample = loader.get(0).unwrap();
        assert_eq!(sample.id, "a");
        assert!(sample.image.is_some());
        assert!(sample.depth.is_some());
        assert_eq!(sample.class.map(|c| c.to_luma8().get_pixel(0, 0).0), Some([7]));
        assert_eq!(
            sample.instance.map(|i| i.to_luma16().get_pixel(1, 1).0),
            Some([300])
        );
        assert_eq!(sample.meta.unwrap()["id"], "a");
    }

    #[test]
    fn only_requested_kinds_are_decoded() {
        let tmp = TempDir::new().unwrap();
        write_scene(tmp.path(), "1");
        // Unrequested assets may be absent.
        std::fs::remove_file(tmp.path().join("img/depth/1.exr")).unwrap();

        let options = LoadOptions::new([AssetKind::Image, AssetKind::Meta]);
        let sample = SceneLoader::new(tmp.path(), options).unwrap().get(0).unwrap();
        assert!(sample.image.is_some());
        assert!(sample.meta.is_some());
        assert!(sample.depth.is_none());
        assert!(sample.class.is_none());
    }

    #[test]
    fn missing_asset_fails_access() {
        let tmp = TempDir::new().unwrap();
        write_scene(tmp.path(), "1");
        std::fs::remove_file(tmp.path().join("meta/1.json")).unwrap();

        let err = SceneLoader::full(tmp.path()).unwrap().get(0).unwrap_err();
        assert!(format!("{err:#}").contains("1.json"));
    }

    #[test]
    fn cityscapes_flag_leaves_labels_unchanged() {
        let tmp = TempDir::new().unwrap();
        write_scene(tmp.path(), "1");

        let options = LoadOptions::new([AssetKind::Class]).with_cityscapes_labels(true);
        let sample = SceneLoader::new(tmp.path(), options).unwrap().get(0).unwrap();
        assert_eq!(sample.class.unwrap().to_luma8().get_pixel(1, 0).0, [7]);
    }

    #[test]
    fn loaders_are_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SceneLoader>();
        assert_send_sync::<SynscapeDepth>();
    }
}
