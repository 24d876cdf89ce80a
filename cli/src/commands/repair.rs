use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Args;
use uidrift_core::{AdbDevice, Device, RecordedArchive, RepairSession, render_script};

#[derive(Args)]
pub struct Args {
  /// Path to the recorded archive (directory or zip).
  archive: PathBuf,
  /// Package under test, e.g. `com.example.app`.
  #[arg(long)]
  package: String,
  /// Device serial to target (defaults to the only attached device).
  #[arg(long)]
  serial: Option<String>,
  /// Runtime permission to grant before the run (repeatable).
  #[arg(long = "grant")]
  permissions: Vec<String>,
  /// Replay the assertion-bearing record instead of the plain one.
  #[arg(long)]
  with_assertions: bool,
  /// Drop recorded assertions from the replayed sequence entirely.
  #[arg(long)]
  remove_assertions: bool,
  /// Skip no-op exploration candidates instead of recording every click.
  #[arg(long)]
  optimize_explore: bool,
  /// Where to write the repaired script.
  #[arg(long, default_value = "out.repaired.py")]
  output: PathBuf,
  /// Optional path to also write a verbose zip archive of the committed steps.
  #[arg(long)]
  verbose_output: Option<PathBuf>,
}

pub fn run(args: Args) -> Result<()> {
  AdbDevice::ensure_available().context("adb not found in PATH")?;

  let archive = RecordedArchive::load(&args.archive, args.with_assertions)
    .with_context(|| format!("loading recorded archive {}", args.archive.display()))?;

  let mut device = AdbDevice::new(args.serial.clone());
  let version = device
    .package_version(&args.package)
    .with_context(|| format!("querying installed version of {}", args.package))?;
  if version.is_none() {
    bail!("package {} is not installed on the target device", args.package);
  }

  let mut session = RepairSession::new(
    Box::new(device),
    args.package.clone(),
    args.permissions.clone(),
    archive.pretest.clone(),
    archive.testcase,
    args.optimize_explore,
    args.remove_assertions,
  );

  let outcome = session.run().context("repair session failed")?;

  if let Some(parent) = args.output.parent() {
    if !parent.as_os_str().is_empty() {
      std::fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
  }
  let mut script = render_script("d", &args.package, &outcome);
  if let Some(pretest) = &archive.pretest {
    script = format!("# pretest:\n{}\n{script}", pretest.lines().map(|l| format!("#   {l}")).collect::<Vec<_>>().join("\n"));
  }
  std::fs::write(&args.output, script).with_context(|| format!("writing {}", args.output.display()))?;
  log::info!("wrote repaired script to {}", args.output.display());

  if let Some(verbose_path) = &args.verbose_output {
    RecordedArchive::write(verbose_path, &outcome.result, archive.pretest.as_deref())
      .with_context(|| format!("writing verbose archive {}", verbose_path.display()))?;
    log::info!("wrote verbose archive to {}", verbose_path.display());
  }

  log::info!("repair time: {:.2}s, explore time: {}", outcome.repair_seconds, outcome.explore_time);
  Ok(())
}
