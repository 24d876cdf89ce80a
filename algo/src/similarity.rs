/// Collapse runs of whitespace to a single space and trim the ends, the
/// normalization every attribute comparison applies before comparing.
pub fn normalize_whitespace(s: &str) -> String {
  let mut out = String::with_capacity(s.len());
  let mut last_was_space = false;
  for c in s.trim().chars() {
    if c.is_whitespace() {
      if !last_was_space {
        out.push(' ');
      }
      last_was_space = true;
    } else {
      out.push(c);
      last_was_space = false;
    }
  }
  out
}

/// Normalized Levenshtein similarity in `[0.0, 1.0]`, 1.0 meaning identical.
pub fn similarity_ratio(a: &str, b: &str) -> f64 { strsim::normalized_levenshtein(a, b) }

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn collapses_internal_whitespace() {
    assert_eq!(normalize_whitespace("  a   b\tc  "), "a b c");
  }

  #[test]
  fn identical_strings_are_fully_similar() {
    assert_eq!(similarity_ratio("text1", "text1"), 1.0);
  }

  #[test]
  fn near_miss_strings_score_high() {
    let r = similarity_ratio("text1", "text2");
    assert!(r >= 0.79 && r <= 0.81, "expected ~0.8, got {r}");
  }
}
