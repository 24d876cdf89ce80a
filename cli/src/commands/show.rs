use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use uidrift_core::RecordedArchive;

#[derive(Args)]
pub struct Args {
  /// Path to the recorded archive (directory or zip).
  archive: PathBuf,
  /// Show the assertion-bearing record instead of the plain one.
  #[arg(long)]
  with_assertions: bool,
  /// Device variable name to render calls against.
  #[arg(long, default_value = "d")]
  device_var: String,
}

pub fn run(args: Args) -> Result<()> {
  let archive = RecordedArchive::load(&args.archive, args.with_assertions)
    .with_context(|| format!("loading recorded archive {}", args.archive.display()))?;

  if let Some(pretest) = &archive.pretest {
    println!("# pretest:");
    for line in pretest.lines() {
      println!("#   {line}");
    }
  }

  for (i, step) in archive.testcase.iter().enumerate() {
    println!("{:>3}  {}", i, step.event.generate_u2(&args.device_var));
  }

  Ok(())
}
