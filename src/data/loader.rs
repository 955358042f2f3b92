use std::path::Path;

use anyhow::{Context, Result};
use exr::meta::attribute::ChannelDescription;
use image::{DynamicImage, RgbImage};
use ndarray::Array2;
use serde_json::Value as JsonValue;

use super::model::{Asset, AssetKind, DepthMap, Metadata, DEPTH_CHANNEL, INVALID_DEPTH, MAX_DEPTH};
use crate::error::SynscapeError;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Decode the file at `path` as an asset of the given kind.
pub fn load_asset(kind: AssetKind, path: &Path) -> Result<Asset> {
    let asset = match kind {
        AssetKind::Image => Asset::Image(load_image(path)?),
        AssetKind::Depth => Asset::Depth(load_depth_map(path)?),
        AssetKind::Class => Asset::Class(load_class(path, false)?),
        AssetKind::Instance => Asset::Instance(load_instance(path)?),
        AssetKind::Meta => Asset::Meta(load_meta(path)?),
    };
    Ok(asset)
}

// ---------------------------------------------------------------------------
// Raster loaders
// ---------------------------------------------------------------------------

/// Decode a color image, converting grayscale / alpha sources to 8-bit RGB.
pub fn load_image(path: &Path) -> Result<RgbImage> {
    let img = open_raster(path)?.to_rgb8();
    log::debug!("{}: rgb {}x{}", path.display(), img.width(), img.height());
    Ok(img)
}

/// Decode a class-label mask as stored.
///
/// `to_cityscapes` is accepted for interface compatibility only; no label
/// remapping is performed.
pub fn load_class(path: &Path, to_cityscapes: bool) -> Result<DynamicImage> {
    if to_cityscapes {
        log::debug!("{}: to_cityscapes requested, labels left as stored", path.display());
    }
    open_raster(path)
}

/// Decode an instance-id mask as stored.
pub fn load_instance(path: &Path) -> Result<DynamicImage> {
    open_raster(path)
}

fn open_raster(path: &Path) -> Result<DynamicImage> {
    image::open(path).with_context(|| format!("opening image {}", path.display()))
}

// ---------------------------------------------------------------------------
// Depth loader
// ---------------------------------------------------------------------------

/// `Z` samples of the first valid layer, row-major over the data window.
struct ZChannel {
    width: usize,
    height: usize,
    values: Vec<f32>,
}

/// Decode the `Z` channel of an EXR container into a `(height, width)` array.
///
/// The shape follows the header's data window. Values above [`MAX_DEPTH`]
/// become [`INVALID_DEPTH`]; NaN is left untouched.
pub fn load_depth_map(path: &Path) -> Result<DepthMap> {
    let z = read_z_channel(path)
        .with_context(|| format!("decoding EXR {} ('{DEPTH_CHANNEL}' channel)", path.display()))?;

    let mut depth = Array2::from_shape_vec((z.height, z.width), z.values)
        .with_context(|| format!("{}: depth buffer does not match data window", path.display()))?;
    mask_invalid(&mut depth);

    log::debug!("{}: depth {}x{}", path.display(), z.width, z.height);
    Ok(depth)
}

/// Replace every value above [`MAX_DEPTH`] with [`INVALID_DEPTH`].
pub fn mask_invalid(depth: &mut DepthMap) {
    depth.mapv_inplace(|d| if d > MAX_DEPTH { INVALID_DEPTH } else { d });
}

fn read_z_channel(path: &Path) -> exr::error::Result<ZChannel> {
    use exr::prelude::*;

    let image = read()
        .no_deep_data()
        .largest_resolution_level()
        .specific_channels()
        .required(DEPTH_CHANNEL)
        .collect_pixels(
            |resolution: Vec2<usize>, _channels: &(ChannelDescription,)| ZChannel {
                width: resolution.width(),
                height: resolution.height(),
                values: vec![0.0; resolution.width() * resolution.height()],
            },
            |z: &mut ZChannel, position: Vec2<usize>, (value,): (f32,)| {
                z.values[position.y() * z.width + position.x()] = value;
            },
        )
        .first_valid_layer()
        .all_attributes()
        .from_file(path)?;

    Ok(image.layer_data.channel_data.pixels)
}

// ---------------------------------------------------------------------------
// Metadata loader
// ---------------------------------------------------------------------------

/// Read the side-car file and parse its content as a JSON object.
pub fn load_meta(path: &Path) -> Result<Metadata> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading metadata {}", path.display()))?;
    let root: JsonValue = serde_json::from_str(&text)
        .with_context(|| format!("parsing JSON {}", path.display()))?;

    match root {
        JsonValue::Object(map) => Ok(map),
        _ => Err(SynscapeError::NotAnObject {
            path: path.to_path_buf(),
        }
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::writer::write_depth_exr;
    use image::{GrayAlphaImage, GrayImage, LumaA, Rgba, RgbaImage};
    use ndarray::array;
    use tempfile::TempDir;

    #[test]
    fn depth_masks_values_above_threshold() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("d.exr");
        write_depth_exr(&path, &array![[2000.0, 500.0], [-5.0, 999.0]], (0, 0)).unwrap();

        let depth = load_depth_map(&path).unwrap();
        assert_eq!(depth, array![[-1.0, 500.0], [-5.0, 999.0]]);
    }

    #[test]
    fn depth_never_exceeds_threshold() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("d.exr");
        let raw = Array2::from_shape_fn((8, 12), |(r, c)| (r * 300 + c * 17) as f32);
        write_depth_exr(&path, &raw, (0, 0)).unwrap();

        let depth = load_depth_map(&path).unwrap();
        assert!(depth.iter().all(|&d| d <= MAX_DEPTH || d == INVALID_DEPTH));
        assert_eq!(depth[[0, 0]], 0.0);
        assert_eq!(depth[[3, 0]], 900.0);
        assert_eq!(depth[[4, 0]], INVALID_DEPTH);
    }

    #[test]
    fn threshold_itself_is_kept() {
        let mut depth = array![[1000.0, 1000.5], [f32::INFINITY, 0.0]];
        mask_invalid(&mut depth);
        assert_eq!(depth, array![[1000.0, -1.0], [-1.0, 0.0]]);
    }

    #[test]
    fn depth_shape_follows_data_window() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("d.exr");
        let raw = Array2::from_shape_fn((3, 5), |(r, c)| (r * 5 + c) as f32);
        write_depth_exr(&path, &raw, (10, 20)).unwrap();

        let depth = load_depth_map(&path).unwrap();
        assert_eq!(depth.dim(), (3, 5));
        assert_eq!(depth[[1, 0]], 5.0);
        assert_eq!(depth[[2, 4]], 14.0);
    }

    #[test]
    fn missing_depth_file_names_path() {
        let err = load_depth_map(Path::new("/nonexistent/img/depth/1.exr")).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/img/depth/1.exr"));
    }

    #[test]
    fn image_from_grayscale_is_rgb() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("g.png");
        GrayImage::from_pixel(4, 3, image::Luma([77])).save(&path).unwrap();

        let img = load_image(&path).unwrap();
        assert_eq!(img.dimensions(), (4, 3));
        assert_eq!(img.get_pixel(0, 0).0, [77, 77, 77]);
    }

    #[test]
    fn image_from_alpha_sources_is_rgb() {
        let dir = TempDir::new().unwrap();
        let rgba = dir.path().join("rgba.png");
        RgbaImage::from_pixel(2, 2, Rgba([10, 20, 30, 40])).save(&rgba).unwrap();
        let la = dir.path().join("la.png");
        GrayAlphaImage::from_pixel(2, 2, LumaA([9, 0])).save(&la).unwrap();

        assert_eq!(load_image(&rgba).unwrap().get_pixel(1, 1).0, [10, 20, 30]);
        assert_eq!(load_image(&la).unwrap().get_pixel(1, 1).0, [9, 9, 9]);
    }

    #[test]
    fn masks_are_returned_as_stored() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("class.png");
        GrayImage::from_pixel(3, 2, image::Luma([26])).save(&path).unwrap();

        let class = load_class(&path, true).unwrap();
        assert!(matches!(class, DynamicImage::ImageLuma8(_)));
        assert_eq!(class.to_luma8().get_pixel(2, 1).0, [26]);

        let instance = load_instance(&path).unwrap();
        assert_eq!(instance.width(), 3);
    }

    #[test]
    fn meta_parses_file_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("1.json");
        std::fs::write(&path, r#"{"camera": {"fov": 50.0}, "scene": {"sun": true}}"#).unwrap();

        let meta = load_meta(&path).unwrap();
        assert_eq!(meta["camera"]["fov"], 50.0);
        assert_eq!(meta["scene"]["sun"], true);
    }

    #[test]
    fn meta_rejects_non_object() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("1.json");
        std::fs::write(&path, "[1, 2, 3]").unwrap();

        let err = load_meta(&path).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SynscapeError>(),
            Some(SynscapeError::NotAnObject { .. })
        ));
    }

    #[test]
    fn meta_rejects_malformed_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("1.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(load_meta(&path).is_err());
    }

    #[test]
    fn load_asset_dispatches_by_kind() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("1.json");
        std::fs::write(&path, r#"{"a": 1}"#).unwrap();
        assert!(matches!(load_asset(AssetKind::Meta, &path).unwrap(), Asset::Meta(_)));
    }
}
