/// Run `step` repeatedly until it reports no further progress.
///
/// Several matcher phases commit pairs in a single pass but unlock new
/// candidates by doing so (a commit can make some other pair's candidate set
/// shrink to one); `step` should perform one pass and return whether it
/// committed anything.
pub fn run_to_fixed_point(mut step: impl FnMut() -> bool) {
  while step() {}
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn stops_once_step_reports_no_progress() {
    let mut calls = 0;
    let mut remaining = 3;
    run_to_fixed_point(|| {
      calls += 1;
      if remaining > 0 {
        remaining -= 1;
        true
      } else {
        false
      }
    });
    assert_eq!(calls, 4);
  }
}
