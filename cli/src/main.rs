//! `uidrift`: the command-line front end for the layout-matching and
//! repair engine. Four thin subcommands; no matching/repair logic lives
//! here, only device wiring, file I/O and formatting.

mod commands;

use clap::{Parser, Subcommand};
use commands::{diff_layout, dump, repair, show};

#[derive(Parser)]
#[command(name = "uidrift", version, about = "Repairs UI automation test scripts for mobile apps whose layouts drifted between versions.")]
struct Cli {
  /// Print debug-level logs.
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Replay a recorded test case against a live device, producing a repaired script.
  Repair(repair::Args),
  /// Dump the current device's UI hierarchy and screenshot to a path.
  Dump(dump::Args),
  /// Match two captured layouts and print the resulting outcome.
  DiffLayout(diff_layout::Args),
  /// Pretty-print a recorded test case, one line per step.
  Show(show::Args),
}

fn init_log(verbose: bool) {
  let level = if verbose { log::LevelFilter::Debug } else { log::LevelFilter::Info };
  env_logger::Builder::from_default_env().filter_level(level).format_timestamp_millis().init();
}

fn main() {
  let cli = Cli::parse();
  init_log(cli.verbose);

  let result = match cli.command {
    Command::Repair(args) => repair::run(args),
    Command::Dump(args) => dump::run(args),
    Command::DiffLayout(args) => diff_layout::run(args),
    Command::Show(args) => show::run(args),
  };

  if let Err(err) = result {
    log::error!("{err:#}");
    std::process::exit(1);
  }
}
