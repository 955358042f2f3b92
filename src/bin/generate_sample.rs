use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::{GrayImage, ImageBuffer, Luma, Rgb, RgbImage};
use ndarray::Array2;
use serde::Serialize;

use synscape::data::model::{AssetKind, SceneRecord};
use synscape::data::writer::write_depth_exr;

const WIDTH: u32 = 64;
const HEIGHT: u32 = 32;
const SCENES: usize = 5;

/// SplitMix64: one word of state, enough for reproducible fixtures.
struct SceneRng(u64);

impl SceneRng {
    fn next_u64(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform in `[0, 1)`.
    fn unit(&mut self) -> f32 {
        (self.next_u64() >> 40) as f32 / (1u64 << 24) as f32
    }
}

#[derive(Serialize)]
struct Camera {
    fov: f32,
    height: f32,
}

#[derive(Serialize)]
struct SceneMeta {
    camera: Camera,
    horizon_row: u32,
    sun_elevation: f32,
}

/// Sky above the horizon (depth well past the valid range), road below it
/// getting closer towards the bottom edge.
fn depth_for(horizon: u32, rng: &mut SceneRng) -> Array2<f32> {
    Array2::from_shape_fn((HEIGHT as usize, WIDTH as usize), |(row, _)| {
        let row = row as u32;
        if row < horizon {
            1.0e4
        } else {
            let rows_below = (row - horizon + 1) as f32;
            400.0 / rows_below + rng.unit()
        }
    })
}

fn write_scene(root: &Path, id: &str, rng: &mut SceneRng) -> Result<()> {
    let rec = SceneRecord::new(root, id);
    let horizon = HEIGHT / 3 + (rng.unit() * (HEIGHT / 4) as f32) as u32;

    let sky = Rgb([120, 170, 230]);
    let road = Rgb([70, 70, 70]);
    let rgb = RgbImage::from_fn(WIDTH, HEIGHT, |_, y| if y < horizon { sky } else { road });
    rgb.save(&rec.image)
        .with_context(|| format!("writing {}", rec.image.display()))?;

    write_depth_exr(&rec.depth, &depth_for(horizon, rng), (0, 0))?;

    // Cityscapes-style ids: 23 sky, 7 road.
    let class = GrayImage::from_fn(WIDTH, HEIGHT, |_, y| Luma([if y < horizon { 23 } else { 7 }]));
    class
        .save(&rec.class)
        .with_context(|| format!("writing {}", rec.class.display()))?;

    let instance: ImageBuffer<Luma<u16>, Vec<u16>> =
        ImageBuffer::from_fn(WIDTH, HEIGHT, |x, y| {
            Luma([if y >= horizon && x < WIDTH / 4 { 26001 } else { 0 }])
        });
    instance
        .save(&rec.instance)
        .with_context(|| format!("writing {}", rec.instance.display()))?;

    let meta = SceneMeta {
        camera: Camera {
            fov: 50.0 + rng.unit() * 10.0,
            height: 1.5,
        },
        horizon_row: horizon,
        sun_elevation: rng.unit() * 90.0,
    };
    let text = serde_json::to_string_pretty(&meta)?;
    std::fs::write(&rec.meta, text).with_context(|| format!("writing {}", rec.meta.display()))?;

    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let root = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("sample_synscapes"));

    for kind in AssetKind::ALL {
        let dir = kind.dir(&root);
        std::fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
    }

    let mut rng = SceneRng(42);
    for i in 1..=SCENES {
        let id = i.to_string();
        write_scene(&root, &id, &mut rng)?;
        log::info!("wrote scene {id}");
    }

    println!(
        "Wrote {SCENES} scenes ({WIDTH}x{HEIGHT}) to {}",
        root.display()
    );
    Ok(())
}
