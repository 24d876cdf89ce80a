use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use uidrift_core::{AdbDevice, Device};

#[derive(Args)]
pub struct Args {
  /// Directory to write `dump.xml` and `dump.png` into.
  #[arg(long, default_value = ".")]
  out_dir: PathBuf,
  /// Device serial to target (defaults to the only attached device).
  #[arg(long)]
  serial: Option<String>,
}

pub fn run(args: Args) -> Result<()> {
  AdbDevice::ensure_available().context("adb not found in PATH")?;
  std::fs::create_dir_all(&args.out_dir).with_context(|| format!("creating {}", args.out_dir.display()))?;

  let mut device = AdbDevice::new(args.serial);
  let xml = device.dump_hierarchy().context("dumping UI hierarchy")?;
  let png = device.screenshot().context("capturing screenshot")?;

  let xml_path = args.out_dir.join("dump.xml");
  let png_path = args.out_dir.join("dump.png");
  std::fs::write(&xml_path, xml).with_context(|| format!("writing {}", xml_path.display()))?;
  std::fs::write(&png_path, png).with_context(|| format!("writing {}", png_path.display()))?;

  log::info!("wrote {} and {}", xml_path.display(), png_path.display());
  Ok(())
}
