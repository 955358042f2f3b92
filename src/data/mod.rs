/// Data layer: on-disk layout, scene index, decoders and datasets.
///
/// Architecture:
/// ```text
///  <root>/img/rgb/<id>.png  ...  <root>/meta/<id>.json
///        │
///        ▼
///   ┌──────────┐
///   │  index    │  scan img/rgb → SceneRecord per id
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  decode png / exr (Z) / json
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  dataset  │  index → Sample / (image, depth)
///   └──────────┘
/// ```

pub mod dataset;
pub mod index;
pub mod loader;
pub mod model;
pub mod writer;
