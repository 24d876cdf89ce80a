//! A small, dependency-free keypoint detector and binary descriptor, used by
//! the matcher's geometric-correspondence phase to line up widgets that
//! carry no useful text/resource-id/content-desc but occupy visually
//! corresponding positions in two screenshots (icons, images, dividers).
//!
//! Shaped like the detect-describe-match pipeline a SIFT/BFMatcher pairing
//! would run (corner response → local binary descriptor → brute-force
//! nearest-neighbor with Lowe's ratio test) without pulling in a computer
//! vision binding nowhere else in this codebase's dependency tree.

use image::GrayImage;
use rayon::prelude::*;

/// Bresenham circle of radius 3, the 16-pixel ring FAST-style detectors test.
const CIRCLE: [(i32, i32); 16] = [
  (0, -3),
  (1, -3),
  (2, -2),
  (3, -1),
  (3, 0),
  (3, 1),
  (2, 2),
  (1, 3),
  (0, 3),
  (-1, 3),
  (-2, 2),
  (-3, 1),
  (-3, 0),
  (-3, -1),
  (-2, -2),
  (-1, -3),
];

const INTENSITY_THRESHOLD: i16 = 20;
const MIN_ARC: usize = 9;
const PATCH_RADIUS: i32 = 15;
const DESCRIPTOR_PAIRS: usize = 128;
const MAX_KEYPOINTS: usize = 600;
const NMS_RADIUS: i32 = 3;

#[derive(Debug, Clone, Copy)]
pub struct Keypoint {
  pub x: f32,
  pub y: f32,
  descriptor: u128,
}

impl Keypoint {
  fn hamming(&self, other: &Keypoint) -> u32 { (self.descriptor ^ other.descriptor).count_ones() }
}

/// Deterministic BRIEF-style sampling pattern: pairs of offsets within a
/// patch, each compared for intensity to produce one descriptor bit. Built
/// once from a fixed formula so results are reproducible across runs and
/// platforms, rather than drawn from a seeded RNG dependency.
fn sampling_pattern() -> &'static [((i32, i32), (i32, i32)); DESCRIPTOR_PAIRS] {
  use std::sync::OnceLock;
  static PATTERN: OnceLock<[((i32, i32), (i32, i32)); DESCRIPTOR_PAIRS]> = OnceLock::new();
  PATTERN.get_or_init(|| {
    let mut pattern = [((0, 0), (0, 0)); DESCRIPTOR_PAIRS];
    // xorshift32, seeded with a fixed constant: cheap, deterministic, and
    // good enough to spread sample pairs across the patch.
    let mut state: u32 = 0x9E3779B9;
    let mut next = || {
      state ^= state << 13;
      state ^= state >> 17;
      state ^= state << 5;
      state
    };
    let span = 2 * PATCH_RADIUS + 1;
    for slot in pattern.iter_mut() {
      let ax = (next() % span as u32) as i32 - PATCH_RADIUS;
      let ay = (next() % span as u32) as i32 - PATCH_RADIUS;
      let bx = (next() % span as u32) as i32 - PATCH_RADIUS;
      let by = (next() % span as u32) as i32 - PATCH_RADIUS;
      *slot = ((ax, ay), (bx, by));
    }
    pattern
  })
}

fn corner_score(img: &GrayImage, x: u32, y: u32) -> Option<u32> {
  let center = img.get_pixel(x, y).0[0] as i16;
  let mut brighter = [false; 16];
  let mut darker = [false; 16];
  let mut diffs = [0i16; 16];
  for (i, (dx, dy)) in CIRCLE.iter().enumerate() {
    let px = (x as i32 + dx) as u32;
    let py = (y as i32 + dy) as u32;
    let v = img.get_pixel(px, py).0[0] as i16;
    diffs[i] = v - center;
    brighter[i] = diffs[i] > INTENSITY_THRESHOLD;
    darker[i] = diffs[i] < -INTENSITY_THRESHOLD;
  }

  let longest_run = |flags: &[bool; 16]| -> usize {
    let mut best = 0;
    let mut cur = 0;
    for i in 0..32 {
      if flags[i % 16] {
        cur += 1;
        best = best.max(cur);
      } else {
        cur = 0;
      }
    }
    best.min(16)
  };

  if longest_run(&brighter) >= MIN_ARC || longest_run(&darker) >= MIN_ARC {
    Some(diffs.iter().map(|d| d.unsigned_abs() as u32).sum())
  } else {
    None
  }
}

fn describe(img: &GrayImage, x: u32, y: u32) -> u128 {
  let pattern = sampling_pattern();
  let (w, h) = img.dimensions();
  let sample = |dx: i32, dy: i32| -> u8 {
    let px = (x as i32 + dx).clamp(0, w as i32 - 1) as u32;
    let py = (y as i32 + dy).clamp(0, h as i32 - 1) as u32;
    img.get_pixel(px, py).0[0]
  };
  let mut descriptor: u128 = 0;
  for (i, (a, b)) in pattern.iter().enumerate() {
    if sample(a.0, a.1) < sample(b.0, b.1) {
      descriptor |= 1 << i;
    }
  }
  descriptor
}

/// Detect keypoints in a grayscale screenshot. Empty on a too-small image.
pub fn detect_keypoints(img: &GrayImage) -> Vec<Keypoint> {
  let (w, h) = img.dimensions();
  let margin = PATCH_RADIUS.max(3) as u32;
  if w <= 2 * margin || h <= 2 * margin {
    return Vec::new();
  }

  let rows: Vec<Vec<(u32, u32, u32)>> = (margin..h - margin)
    .into_par_iter()
    .map(|y| {
      let mut row = Vec::new();
      for x in margin..w - margin {
        if let Some(score) = corner_score(img, x, y) {
          row.push((x, y, score));
        }
      }
      row
    })
    .collect();
  let mut candidates: Vec<(u32, u32, u32)> = rows.into_iter().flatten().collect();

  // Non-maximum suppression: drop any candidate that has a higher-scoring
  // neighbor within NMS_RADIUS.
  candidates.sort_unstable_by(|a, b| b.2.cmp(&a.2));
  let mut kept: Vec<(u32, u32, u32)> = Vec::new();
  'candidates: for c in candidates {
    for k in &kept {
      let dx = (c.0 as i32 - k.0 as i32).abs();
      let dy = (c.1 as i32 - k.1 as i32).abs();
      if dx <= NMS_RADIUS && dy <= NMS_RADIUS {
        continue 'candidates;
      }
    }
    kept.push(c);
    if kept.len() >= MAX_KEYPOINTS {
      break;
    }
  }

  kept
    .into_iter()
    .map(|(x, y, _)| Keypoint { x: x as f32, y: y as f32, descriptor: describe(img, x, y) })
    .collect()
}

/// Brute-force k=2 nearest-neighbor match with Lowe's ratio test: a pair
/// `(i, j)` survives only when `old[i]`'s closest match is markedly closer
/// than its second-closest, the same `0.8` ratio a SIFT/BFMatcher pairing
/// would use.
pub fn match_keypoints(old: &[Keypoint], new: &[Keypoint], ratio: f64) -> Vec<(usize, usize)> {
  if new.len() < 2 {
    return Vec::new();
  }
  let mut matches = Vec::new();
  for (i, o) in old.iter().enumerate() {
    let mut best = (usize::MAX, u32::MAX);
    let mut second = u32::MAX;
    for (j, n) in new.iter().enumerate() {
      let d = o.hamming(n);
      if d < best.1 {
        second = best.1;
        best = (j, d);
      } else if d < second {
        second = d;
      }
    }
    if best.0 != usize::MAX && (best.1 as f64) < (second as f64) * ratio {
      matches.push((i, best.0));
    }
  }
  matches
}

#[cfg(test)]
mod tests {
  use super::*;
  use image::{GrayImage, Luma};

  fn checkerboard(size: u32) -> GrayImage {
    GrayImage::from_fn(size, size, |x, y| {
      let block = ((x / 8) + (y / 8)) % 2;
      Luma([if block == 0 { 40 } else { 220 }])
    })
  }

  #[test]
  fn detects_keypoints_on_textured_image() {
    let img = checkerboard(64);
    let kps = detect_keypoints(&img);
    assert!(!kps.is_empty());
  }

  #[test]
  fn blank_image_has_no_keypoints() {
    let img = GrayImage::from_pixel(64, 64, Luma([128]));
    let kps = detect_keypoints(&img);
    assert!(kps.is_empty());
  }

  #[test]
  fn matching_identical_images_pairs_most_keypoints() {
    let img = checkerboard(64);
    let old = detect_keypoints(&img);
    let new = old.clone();
    let matches = match_keypoints(&old, &new, 0.8);
    assert!(!matches.is_empty());
    for (i, j) in matches {
      assert_eq!(old[i].x, new[j].x);
      assert_eq!(old[i].y, new[j].y);
    }
  }

  #[test]
  fn too_few_candidates_yields_no_matches() {
    let one = vec![Keypoint { x: 0.0, y: 0.0, descriptor: 0 }];
    assert!(match_keypoints(&one, &one, 0.8).is_empty());
  }
}
