//! Screen-space geometry: the integer pixel rectangles UI Automator bounds
//! describe, and the predicates the matcher runs over them.

use std::sync::OnceLock;

use regex::Regex;

/// The tag for on-device screen pixel coordinates, to keep them from mixing
/// with any other coordinate system a caller might introduce.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScreenSpace;

pub type Rect = euclid::Rect<i32, ScreenSpace>;
pub type Point = euclid::Point2D<i32, ScreenSpace>;
pub type Size = euclid::Size2D<i32, ScreenSpace>;

pub use euclid::point2;

/// Return the four corners of a rectangle: [top-left, top-right,
/// bottom-right, bottom-left].
pub fn rect_corners(rect: &Rect) -> [Point; 4] {
  [
    rect.min(),
    euclid::Point2D::new(rect.max_x(), rect.min_y()),
    rect.max(),
    euclid::Point2D::new(rect.min_x(), rect.max_y()),
  ]
}

/// The parsed form of a `bounds="[x0,y0][x1,y1]"` attribute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Coordinate {
  pub x0: i32,
  pub y0: i32,
  pub x1: i32,
  pub y1: i32,
}

impl Coordinate {
  pub fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self { Self { x0, y0, x1, y1 } }

  pub fn width(&self) -> i32 { self.x1 - self.x0 }

  pub fn height(&self) -> i32 { self.y1 - self.y0 }

  pub fn to_rect(self) -> Rect {
    Rect::new(euclid::Point2D::new(self.x0, self.y0), Size::new(self.width(), self.height()))
  }
}

fn bounds_pattern() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| {
    Regex::new(r"^\s*\[(?P<x0>\d+)\s*,\s*(?P<y0>\d+)\]\[(?P<x1>\d+)\s*,\s*(?P<y1>\d+)\]\s*$")
      .expect("static pattern")
  })
}

/// Parse a `bounds="[x0,y0][x1,y1]"` string. Anything not matching the
/// pattern yields the zero coordinate, matching the source tool's behavior.
pub fn parse_bounds(bounds: &str) -> Coordinate {
  let Some(caps) = bounds_pattern().captures(bounds) else {
    return Coordinate::default();
  };
  let get = |name: &str| caps.name(name).and_then(|m| m.as_str().parse::<i32>().ok()).unwrap_or(0);
  Coordinate::new(get("x0"), get("y0"), get("x1"), get("y1"))
}

/// Does `a`'s rectangle cover `b`'s center? Used to decide that tapping a
/// smaller overlapping widget `b` actually hits the bigger widget `a`.
pub fn is_cover(a: Coordinate, b: Coordinate) -> bool {
  let center_x = (b.x0 + b.x1) as f64 / 2.0;
  let center_y = (b.y0 + b.y1) as f64 / 2.0;
  let h_cover = a.x0 as f64 <= center_x && center_x <= a.x1 as f64;
  let v_cover = a.y0 as f64 <= center_y && center_y <= a.y1 as f64;
  h_cover && v_cover
}

/// Do the two rectangles overlap on both axes?
///
/// NOTE: the x-axis test below compares `a.x1` against itself
/// (`min(a.x1, a.x1)`) rather than against `b.x1`, mirroring a bug in the
/// tool this engine repairs scripts for. Preserved verbatim rather than
/// silently fixed, since downstream phases (`non_overlap` promotion, sibling
/// matching) were tuned against this exact behavior.
pub fn is_overlap(a: Coordinate, b: Coordinate) -> bool {
  let xmin = a.x1.min(a.x1);
  let xmax = a.x0.max(b.x0);
  let h_overlap = xmin > xmax;
  let ymin = a.y1.min(b.y1);
  let ymax = a.y0.max(b.y0);
  let v_overlap = ymin > ymax;
  h_overlap && v_overlap
}

/// Strict interior containment test, used to bucket keypoints into the
/// widget whose bounds they fall inside.
pub fn is_in_bound(point: (f32, f32), x: i32, y: i32, w: i32, h: i32) -> bool {
  let (px, py) = point;
  x as f32 < px && px < (x + w) as f32 && y as f32 < py && py < (y + h) as f32
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_well_formed_bounds() {
    assert_eq!(parse_bounds("[189,1174][404,1231]"), Coordinate::new(189, 1174, 404, 1231));
  }

  #[test]
  fn malformed_bounds_yield_zero() {
    assert_eq!(parse_bounds("garbage"), Coordinate::default());
    assert_eq!(parse_bounds(""), Coordinate::default());
  }

  #[test]
  fn tolerates_internal_whitespace() {
    assert_eq!(parse_bounds("[100, 100][400, 400]"), Coordinate::new(100, 100, 400, 400));
  }

  #[test]
  fn cover_checks_center_inclusively() {
    let a = Coordinate::new(100, 100, 400, 400);
    let b = Coordinate::new(0, 0, 500, 250);
    assert!(is_cover(a, b));
  }

  #[test]
  fn overlap_detects_intersection() {
    let a = Coordinate::new(100, 100, 300, 300);
    let b = Coordinate::new(200, 200, 400, 400);
    assert!(is_overlap(a, b));
  }

  #[test]
  fn overlap_non_intersecting() {
    let a = Coordinate::new(0, 0, 10, 10);
    let b = Coordinate::new(100, 100, 200, 200);
    assert!(!is_overlap(a, b));
  }

  #[test]
  fn in_bound_is_strict() {
    assert!(is_in_bound((5.0, 5.0), 0, 0, 10, 10));
    assert!(!is_in_bound((0.0, 5.0), 0, 0, 10, 10));
    assert!(!is_in_bound((10.0, 5.0), 0, 0, 10, 10));
  }
}
