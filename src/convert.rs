//! EXR → npy conversion of a dataset's depth maps.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::data::index::{compare_ids, has_extension};
use crate::data::loader::load_depth_map;
use crate::data::model::AssetKind;
use crate::data::writer::write_npy;

/// Output directory, relative to the dataset root.
pub const OUTPUT_DIR: &str = "depth_numpy";

/// Outcome of one [`convert_depth_maps`] run.
#[derive(Debug, Default)]
pub struct ConversionReport {
    /// Written `.npy` files, in input order.
    pub converted: Vec<PathBuf>,
    /// Inputs that could not be converted, with the reason.
    pub failed: Vec<(PathBuf, anyhow::Error)>,
}

impl ConversionReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Print one line per failed input to `out`, then fail if there were any.
    pub fn finish(&self, out: &mut impl Write) -> Result<()> {
        for (path, e) in &self.failed {
            writeln!(out, "{}: {e:#}", path.display())?;
        }
        if !self.is_success() {
            bail!("{} depth maps could not be converted", self.failed.len());
        }
        Ok(())
    }
}

/// `<root>/depth_numpy/<stem>.npy` for a depth container.
pub fn output_path(root: &Path, input: &Path) -> Option<PathBuf> {
    let stem = input.file_stem()?;
    let mut name = stem.to_os_string();
    name.push(".npy");
    Some(root.join(OUTPUT_DIR).join(name))
}

/// Depth containers under `<root>/img/depth`, ordered like scene identifiers.
pub fn depth_inputs(root: &Path) -> Result<Vec<PathBuf>> {
    let dir = AssetKind::Depth.dir(root);
    let mut inputs = Vec::new();
    for entry in std::fs::read_dir(&dir).with_context(|| format!("listing {}", dir.display()))? {
        let path = entry
            .with_context(|| format!("listing {}", dir.display()))?
            .path();
        if path.is_file() && has_extension(&path, AssetKind::Depth.extension()) {
            inputs.push(path);
        }
    }

    inputs.sort_by(|a, b| compare_ids(&stem_str(a), &stem_str(b)));
    Ok(inputs)
}

fn stem_str(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Convert every depth container of the dataset at `root` to `.npy`.
///
/// A file that fails to decode or write is recorded in the report and the
/// run continues with the next one. Listing the input directory or creating
/// the output directory are fatal.
pub fn convert_depth_maps(root: &Path) -> Result<ConversionReport> {
    let inputs = depth_inputs(root)?;
    let out_dir = root.join(OUTPUT_DIR);
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;

    log::info!("{}: converting {} depth maps", root.display(), inputs.len());

    let mut report = ConversionReport::default();
    for input in inputs {
        match convert_one(root, &input) {
            Ok(output) => {
                log::info!("{} -> {}", input.display(), output.display());
                report.converted.push(output);
            }
            Err(e) => {
                log::error!("Failed to convert {}: {e:#}", input.display());
                report.failed.push((input, e));
            }
        }
    }
    Ok(report)
}

fn convert_one(root: &Path, input: &Path) -> Result<PathBuf> {
    let output = output_path(root, input)
        .with_context(|| format!("{}: no file stem", input.display()))?;
    let depth = load_depth_map(input)?;
    write_npy(&output, &depth)?;
    Ok(output)
}
