use std::path::Path;

use anyhow::{Context, Result};
use ndarray::Array2;

use super::model::DEPTH_CHANNEL;

/// Write `depth` as a single-channel (`Z`, f32) EXR container.
///
/// `origin` is the data window's minimum corner; the window spans
/// `depth.ncols()` × `depth.nrows()` pixels from there.
pub fn write_depth_exr(path: &Path, depth: &Array2<f32>, origin: (i32, i32)) -> Result<()> {
    let (height, width) = depth.dim();
    let values: Vec<f32> = depth.iter().copied().collect();

    encode_exr(path, width, height, values, origin)
        .with_context(|| format!("writing EXR {}", path.display()))
}

fn encode_exr(
    path: &Path,
    width: usize,
    height: usize,
    values: Vec<f32>,
    origin: (i32, i32),
) -> exr::error::Result<()> {
    use exr::prelude::*;

    let mut attributes = LayerAttributes::named("depth");
    attributes.layer_position = Vec2(origin.0, origin.1);

    let channels = AnyChannels::sort(
        vec![AnyChannel::new(DEPTH_CHANNEL, FlatSamples::F32(values))].into(),
    );
    let layer = Layer::new((width, height), attributes, Encoding::FAST_LOSSLESS, channels);

    Image::from_layer(layer).write().to_file(path)
}

/// Write `array` as a NumPy `.npy` file (`<f4`, C order).
pub fn write_npy(path: &Path, array: &Array2<f32>) -> Result<()> {
    ndarray_npy::write_npy(path, array)
        .with_context(|| format!("writing npy {}", path.display()))
}
