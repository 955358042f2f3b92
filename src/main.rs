use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use synscape::convert::{convert_depth_maps, OUTPUT_DIR};

/// Convert a Synscapes dataset's EXR depth maps to NumPy `.npy` arrays.
///
/// Reads `<root>/img/depth/*.exr` and writes `<root>/depth_numpy/<id>.npy`.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Synscapes dataset root directory.
    root: PathBuf,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let report = convert_depth_maps(&args.root)?;

    println!(
        "Wrote {} depth maps to {}",
        report.converted.len(),
        args.root.join(OUTPUT_DIR).display()
    );

    report.finish(&mut std::io::stderr())
}
