//! Loaders for the Synscapes synthetic driving dataset.
//!
//! Scenes are discovered under a dataset root laid out as
//! `img/{rgb,depth,class,instance}/<id>.*` plus `meta/<id>.json`, and each
//! asset kind can be decoded on its own or through a [`Dataset`].

pub mod convert;
pub mod data;
pub mod error;

pub use data::dataset::{Dataset, LoadOptions, SceneLoader, SynscapeDepth};
pub use data::index::SampleIndex;
pub use data::loader::{load_asset, load_class, load_depth_map, load_image, load_instance, load_meta};
pub use data::model::{Asset, AssetKind, DepthMap, Metadata, Sample, SceneRecord};
pub use error::SynscapeError;
