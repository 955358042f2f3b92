use std::fmt;
use std::path::{Path, PathBuf};

use image::{DynamicImage, RgbImage};
use ndarray::Array2;
use serde_json::Value as JsonValue;

// ---------------------------------------------------------------------------
// Constants of the on-disk layout
// ---------------------------------------------------------------------------

/// Depth values strictly greater than this are replaced by [`INVALID_DEPTH`].
pub const MAX_DEPTH: f32 = 1000.0;

/// Sentinel meaning "invalid / ignore" (sky, unbounded background).
pub const INVALID_DEPTH: f32 = -1.0;

/// Name of the depth channel inside the EXR container.
pub const DEPTH_CHANNEL: &str = "Z";

// ---------------------------------------------------------------------------
// AssetKind – the five files every scene owns
// ---------------------------------------------------------------------------

/// One of the per-scene asset files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AssetKind {
    Image,
    Depth,
    Class,
    Instance,
    Meta,
}

impl AssetKind {
    pub const ALL: [AssetKind; 5] = [
        AssetKind::Image,
        AssetKind::Depth,
        AssetKind::Class,
        AssetKind::Instance,
        AssetKind::Meta,
    ];

    /// Directory of this asset relative to the dataset root.
    pub fn subdir(self) -> &'static [&'static str] {
        match self {
            AssetKind::Image => &["img", "rgb"],
            AssetKind::Depth => &["img", "depth"],
            AssetKind::Class => &["img", "class"],
            AssetKind::Instance => &["img", "instance"],
            AssetKind::Meta => &["meta"],
        }
    }

    /// File extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            AssetKind::Image | AssetKind::Class | AssetKind::Instance => "png",
            AssetKind::Depth => "exr",
            AssetKind::Meta => "json",
        }
    }

    /// `<root>/<subdir>` for this kind.
    pub fn dir(self, root: &Path) -> PathBuf {
        let mut dir = root.to_path_buf();
        for part in self.subdir() {
            dir.push(part);
        }
        dir
    }

    /// `<root>/<subdir>/<id>.<ext>` for this kind.
    pub fn path(self, root: &Path, id: &str) -> PathBuf {
        self.dir(root).join(format!("{id}.{}", self.extension()))
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AssetKind::Image => "image",
            AssetKind::Depth => "depth",
            AssetKind::Class => "class",
            AssetKind::Instance => "instance",
            AssetKind::Meta => "meta",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// SceneRecord – one dataset item
// ---------------------------------------------------------------------------

/// The five asset paths of one scene. Built once by the index, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneRecord {
    pub id: String,
    pub image: PathBuf,
    pub depth: PathBuf,
    pub class: PathBuf,
    pub instance: PathBuf,
    pub meta: PathBuf,
}

impl SceneRecord {
    /// Format all five paths for `id`. Touches no files.
    pub fn new(root: &Path, id: &str) -> Self {
        Self {
            id: id.to_string(),
            image: AssetKind::Image.path(root, id),
            depth: AssetKind::Depth.path(root, id),
            class: AssetKind::Class.path(root, id),
            instance: AssetKind::Instance.path(root, id),
            meta: AssetKind::Meta.path(root, id),
        }
    }

    pub fn path(&self, kind: AssetKind) -> &Path {
        match kind {
            AssetKind::Image => &self.image,
            AssetKind::Depth => &self.depth,
            AssetKind::Class => &self.class,
            AssetKind::Instance => &self.instance,
            AssetKind::Meta => &self.meta,
        }
    }
}

// ---------------------------------------------------------------------------
// Decoded values
// ---------------------------------------------------------------------------

/// Row-major `(height, width)` depth, [`INVALID_DEPTH`] where the raw value exceeded [`MAX_DEPTH`].
pub type DepthMap = Array2<f32>;

/// Parsed per-scene metadata document.
pub type Metadata = serde_json::Map<String, JsonValue>;

/// A single decoded asset, as returned by [`crate::data::loader::load_asset`].
#[derive(Debug, Clone)]
pub enum Asset {
    Image(RgbImage),
    Depth(DepthMap),
    Class(DynamicImage),
    Instance(DynamicImage),
    Meta(Metadata),
}

/// Everything decoded for one scene. Kinds that were not requested stay `None`.
#[derive(Debug, Clone, Default)]
pub struct Sample {
    pub id: String,
    pub image: Option<RgbImage>,
    pub depth: Option<DepthMap>,
    pub class: Option<DynamicImage>,
    pub instance: Option<DynamicImage>,
    pub meta: Option<Metadata>,
}

impl Sample {
    pub fn insert(&mut self, asset: Asset) {
        match asset {
            Asset::Image(v) => self.image = Some(v),
            Asset::Depth(v) => self.depth = Some(v),
            Asset::Class(v) => self.class = Some(v),
            Asset::Instance(v) => self.instance = Some(v),
            Asset::Meta(v) => self.meta = Some(v),
        }
    }
}
