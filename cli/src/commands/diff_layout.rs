use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use uidrift_core::{Layout, match_layout};

#[derive(Args)]
pub struct Args {
  /// Path to the old layout's XML dump.
  old: PathBuf,
  /// Path to the new layout's XML dump.
  new: PathBuf,
}

fn load_layout(xml_path: &PathBuf) -> Result<Layout> {
  let xml = std::fs::read_to_string(xml_path).with_context(|| format!("reading {}", xml_path.display()))?;
  let png_path = xml_path.with_extension("png");
  let png = std::fs::read(&png_path).ok();
  Layout::parse(&xml, png.as_deref()).with_context(|| format!("parsing {}", xml_path.display()))
}

fn describe(layout: &Layout, id: uidrift_core::NodeId) -> String {
  let node = layout.node(id);
  format!("{}[text={:?} desc={:?} id={:?}]", node.class(), node.text(), node.content_desc(), node.resource_id())
}

pub fn run(args: Args) -> Result<()> {
  let old = load_layout(&args.old)?;
  let new = load_layout(&args.new)?;

  let outcome = match_layout(&old, &new);

  println!("is_match: {}", outcome.is_match);
  println!("score: {:.4}", outcome.score);
  println!("matched: {}", outcome.matched.len());
  for (old_id, new_id) in &outcome.matched {
    println!("  {} -> {}", describe(&old, *old_id), describe(&new, *new_id));
  }
  println!("possible: {}", outcome.possible.len());
  println!("old_not_matched: {}", outcome.old_not_matched.len());
  println!("new_not_matched: {}", outcome.new_not_matched.len());

  Ok(())
}
