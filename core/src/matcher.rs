//! The multi-phase layout matcher: given two preprocessed [`Layout`]s,
//! produces a [`MatchOutcome`] pairing old widgets with new ones.

use ahash::{HashMap, HashSet};
use uidrift_algo::run_to_fixed_point;
use uidrift_geom::is_in_bound;

use crate::layout::{Layout, NodeId};
use crate::node::Node;
use crate::predicates;

const KEYPOINT_RATIO: f64 = 0.8;
const KEYPOINT_CONTAINMENT_THRESHOLD: f64 = 0.6;
const MATCH_THRESHOLD: f64 = 0.8;
const EDIT_TEXT_CLASS: &str = "android.widget.EditText";

#[derive(Debug, Clone, Default)]
pub struct MatchOutcome {
  pub matched: HashMap<NodeId, NodeId>,
  pub possible: HashMap<NodeId, Vec<NodeId>>,
  pub old_not_matched: HashSet<NodeId>,
  pub new_not_matched: HashSet<NodeId>,
  pub score: f64,
  pub is_match: bool,
}

struct MatchCtx<'a> {
  old: &'a Layout,
  new: &'a Layout,
  matched: HashMap<NodeId, NodeId>,
  new_used: HashSet<NodeId>,
  matched_parents: HashMap<NodeId, NodeId>,
}

pub fn match_layout(old: &Layout, new: &Layout) -> MatchOutcome {
  let mut ctx = MatchCtx {
    old,
    new,
    matched: HashMap::default(),
    new_used: HashSet::default(),
    matched_parents: HashMap::default(),
  };

  sure_match(&mut ctx, |a, b| predicates::is_match(a, b, true));
  sure_match(&mut ctx, |a, b| predicates::is_like(a, b, true));
  keypoint_match(&mut ctx);
  parent_match(&mut ctx);
  optimize_match(&mut ctx);
  unique_match(&mut ctx);
  let possible = possible_match(&mut ctx);
  finalize(&ctx, possible)
}

fn commit_pair(ctx: &mut MatchCtx, old_id: NodeId, new_id: NodeId) {
  ctx.matched.insert(old_id, new_id);
  ctx.new_used.insert(new_id);
}

/// When a sure-match pair both belong to list-item groups, promote the
/// shared ancestors into `matched_parents` and resolve their remaining
/// unmatched siblings directly (no re-entrant matching of those siblings'
/// own siblings).
fn sibling_propagation(ctx: &mut MatchCtx, old_id: NodeId, new_id: NodeId) {
  let (Some(&old_ancestor), Some(&new_ancestor)) =
    (ctx.old.non_overlap.get(&old_id), ctx.new.non_overlap.get(&new_id))
  else {
    return;
  };
  ctx.matched_parents.insert(old_ancestor, new_ancestor);

  let siblings: Vec<NodeId> = ctx
    .old
    .non_overlap
    .iter()
    .filter(|&(&m, &a)| a == old_ancestor && m != old_id && !ctx.matched.contains_key(&m))
    .map(|(&m, _)| m)
    .collect();

  for sibling in siblings {
    if ctx.matched.contains_key(&sibling) {
      continue;
    }
    let sibling_node = ctx.old.node(sibling);
    let candidates: Vec<NodeId> = ctx
      .new
      .non_overlap
      .iter()
      .filter(|&(&m, &a)| a == new_ancestor && !ctx.new_used.contains(&m))
      .filter(|&(&m, _)| predicates::is_match(sibling_node, ctx.new.node(m), false))
      .map(|(&m, _)| m)
      .collect();
    if candidates.len() == 1 {
      ctx.matched.insert(sibling, candidates[0]);
      ctx.new_used.insert(candidates[0]);
    }
  }
}

/// Shared shape of phases 1 and 2: fixed-point sure-match over unmatched,
/// non-`non_unique` children, differing only by predicate.
fn sure_match(ctx: &mut MatchCtx, predicate: impl Fn(&Node, &Node) -> bool) {
  run_to_fixed_point(|| {
    let mut progressed = false;
    let old_candidates: Vec<NodeId> = ctx
      .old
      .children
      .iter()
      .copied()
      .filter(|id| !ctx.matched.contains_key(id) && !ctx.old.non_unique.contains(id))
      .collect();
    for old_id in old_candidates {
      if ctx.matched.contains_key(&old_id) {
        continue;
      }
      let old_node = ctx.old.node(old_id);
      let candidates: Vec<NodeId> = ctx
        .new
        .children
        .iter()
        .copied()
        .filter(|id| !ctx.new_used.contains(id) && !ctx.new.non_unique.contains(id))
        .filter(|&new_id| predicate(old_node, ctx.new.node(new_id)))
        .collect();
      if candidates.len() == 1 {
        commit_pair(ctx, old_id, candidates[0]);
        sibling_propagation(ctx, old_id, candidates[0]);
        progressed = true;
      }
    }
    progressed
  });
}

fn keypoint_match(ctx: &mut MatchCtx) {
  let (Some(old_png), Some(new_png)) = (ctx.old.png(), ctx.new.png()) else {
    log::debug!("skipping keypoint-match phase: one or both screenshots are undecodable");
    return;
  };
  let old_kps = uidrift_algo::detect_keypoints(old_png);
  let new_kps = uidrift_algo::detect_keypoints(new_png);
  let old_to_new: HashMap<usize, usize> =
    uidrift_algo::match_keypoints(&old_kps, &new_kps, KEYPOINT_RATIO).into_iter().collect();

  let eligible = |n: &Node| n.text().is_empty() && !predicates::is_skippable_for_geometric_match(n.class());

  run_to_fixed_point(|| {
    let mut progressed = false;
    let old_candidates: Vec<NodeId> = ctx
      .old
      .children
      .iter()
      .copied()
      .filter(|id| !ctx.matched.contains_key(id) && eligible(ctx.old.node(*id)))
      .collect();

    for old_id in old_candidates {
      if ctx.matched.contains_key(&old_id) {
        continue;
      }
      let node = ctx.old.node(old_id);
      let (x, y, w, h) = (node.x(), node.y(), node.w(), node.h());
      let inside_old: Vec<usize> =
        old_kps.iter().enumerate().filter(|(_, kp)| is_in_bound((kp.x, kp.y), x, y, w, h)).map(|(i, _)| i).collect();
      if inside_old.is_empty() {
        continue;
      }
      let mapped_new: Vec<(f32, f32)> =
        inside_old.iter().filter_map(|i| old_to_new.get(i)).map(|&j| (new_kps[j].x, new_kps[j].y)).collect();
      if mapped_new.is_empty() {
        continue;
      }

      let new_candidates: Vec<NodeId> = ctx
        .new
        .children
        .iter()
        .copied()
        .filter(|id| !ctx.new_used.contains(id) && eligible(ctx.new.node(*id)))
        .filter(|&id| {
          let n = ctx.new.node(id);
          let contained = mapped_new.iter().filter(|&&(px, py)| is_in_bound((px, py), n.x(), n.y(), n.w(), n.h())).count();
          (contained as f64) / (mapped_new.len() as f64) >= KEYPOINT_CONTAINMENT_THRESHOLD
        })
        .collect();
      if new_candidates.len() == 1 {
        commit_pair(ctx, old_id, new_candidates[0]);
        progressed = true;
      }
    }
    progressed
  });
}

fn parent_match(ctx: &mut MatchCtx) {
  let mut used_new: HashSet<NodeId> = HashSet::default();
  run_to_fixed_point(|| {
    let mut progressed = false;
    let old_candidates: Vec<NodeId> =
      ctx.old.parents.iter().copied().filter(|id| !ctx.matched_parents.contains_key(id)).collect();
    for old_id in old_candidates {
      if ctx.matched_parents.contains_key(&old_id) {
        continue;
      }
      let old_node = ctx.old.node(old_id);
      let candidates: Vec<NodeId> = ctx
        .new
        .parents
        .iter()
        .copied()
        .filter(|id| !used_new.contains(id))
        .filter(|&new_id| predicates::is_match(old_node, ctx.new.node(new_id), false))
        .collect();
      if candidates.len() == 1 {
        ctx.matched_parents.insert(old_id, candidates[0]);
        used_new.insert(candidates[0]);
        progressed = true;
      }
    }
    progressed
  });
}

fn optimize_match(ctx: &mut MatchCtx) {
  let pairs: Vec<(NodeId, NodeId)> = ctx.matched_parents.iter().map(|(&a, &b)| (a, b)).collect();
  for (old_parent, new_parent) in pairs {
    let old_descendants: HashSet<NodeId> = old_parent.descendants(ctx.old.arena()).collect();
    let new_descendants: HashSet<NodeId> = new_parent.descendants(ctx.new.arena()).collect();
    let scope: Vec<NodeId> = ctx.old.children.iter().copied().filter(|id| old_descendants.contains(id)).collect();

    run_to_fixed_point(|| {
      let mut progressed = false;
      for &old_id in &scope {
        if ctx.matched.contains_key(&old_id) {
          continue;
        }
        let old_node = ctx.old.node(old_id);
        let candidates: Vec<NodeId> = ctx
          .new
          .children
          .iter()
          .copied()
          .filter(|id| new_descendants.contains(id) && !ctx.new_used.contains(id))
          .filter(|&new_id| predicates::is_like(old_node, ctx.new.node(new_id), false))
          .collect();
        if candidates.len() == 1 {
          commit_pair(ctx, old_id, candidates[0]);
          progressed = true;
        }
      }
      progressed
    });
  }
}

fn unique_match(ctx: &mut MatchCtx) {
  run_to_fixed_point(|| {
    let mut progressed = false;
    let old_candidates: Vec<NodeId> =
      ctx.old.unique_children.iter().copied().filter(|id| !ctx.matched.contains_key(id)).collect();
    for old_id in old_candidates {
      if ctx.matched.contains_key(&old_id) {
        continue;
      }
      let old_node = ctx.old.node(old_id);
      if old_node.class() != EDIT_TEXT_CLASS {
        continue;
      }
      let candidates: Vec<NodeId> = ctx
        .new
        .unique_children
        .iter()
        .copied()
        .filter(|id| !ctx.new_used.contains(id))
        .filter(|&new_id| predicates::attr_equal(old_node, ctx.new.node(new_id), "class", None))
        .collect();
      if candidates.len() == 1 {
        commit_pair(ctx, old_id, candidates[0]);
        progressed = true;
      }
    }
    progressed
  });
}

const POSSIBLE_TIEBREAK_ATTRS: [&str; 3] = ["text", "content-desc", "resource-id"];

fn possible_match(ctx: &mut MatchCtx) -> HashMap<NodeId, Vec<NodeId>> {
  let mut possible = HashMap::default();
  let old_candidates: Vec<NodeId> = ctx.old.children.iter().copied().filter(|id| !ctx.matched.contains_key(id)).collect();
  for old_id in old_candidates {
    let old_node = ctx.old.node(old_id);
    let candidates: Vec<NodeId> = ctx
      .new
      .children
      .iter()
      .copied()
      .filter(|id| !ctx.new_used.contains(id))
      .filter(|&new_id| predicates::is_match(old_node, ctx.new.node(new_id), false))
      .collect();

    if let Some(winner) = unique_possible_tiebreak(ctx, old_id, &candidates) {
      commit_pair(ctx, old_id, winner);
      continue;
    }
    if !candidates.is_empty() {
      possible.insert(old_id, candidates);
    }
  }
  possible
}

fn unique_possible_tiebreak(ctx: &MatchCtx, old_id: NodeId, candidates: &[NodeId]) -> Option<NodeId> {
  let old_node = ctx.old.node(old_id);
  for attr in POSSIBLE_TIEBREAK_ATTRS {
    let old_value = old_node.get(attr).to_lowercase();
    if old_value.is_empty() {
      continue;
    }
    let mut filtered: Vec<NodeId> = candidates
      .iter()
      .copied()
      .filter(|&id| {
        let n = ctx.new.node(id);
        n.get(attr).to_lowercase() == old_value && n.class() == old_node.class()
      })
      .collect();
    if attr == "resource-id" && ctx.old.non_overlap.contains_key(&old_id) {
      filtered.clear();
    }
    if filtered.len() == 1 {
      return Some(filtered[0]);
    }
  }
  None
}

fn finalize(ctx: &MatchCtx, possible: HashMap<NodeId, Vec<NodeId>>) -> MatchOutcome {
  let old_not_matched: HashSet<NodeId> = ctx
    .old
    .children
    .iter()
    .copied()
    .filter(|id| !ctx.matched.contains_key(id) && !possible.contains_key(id))
    .collect();

  let matched_values: HashSet<NodeId> = ctx.matched.values().copied().collect();
  let possible_values: HashSet<NodeId> = possible.values().flatten().copied().collect();
  let new_not_matched: HashSet<NodeId> = ctx
    .new
    .children
    .iter()
    .copied()
    .filter(|id| !matched_values.contains(id) && !possible_values.contains(id))
    .collect();

  let denom = ctx.matched.len() + possible.len() + old_not_matched.len();
  let score =
    if denom == 0 { 0.0 } else { (ctx.matched.len() + possible.len()) as f64 / denom as f64 };

  MatchOutcome {
    matched: ctx.matched.clone(),
    possible,
    old_not_matched,
    new_not_matched,
    score,
    is_match: score >= MATCH_THRESHOLD,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::layout::Layout;

  fn trivial_hierarchy() -> &'static str {
    r#"<hierarchy><node class="android.widget.TextView" text="Documents" resource-id="com.example:id/primary" package="com.example.app" clickable="true" bounds="[100,100][400,400]"/></hierarchy>"#
  }

  #[test]
  fn identical_trivial_layouts_match_fully() {
    let old = Layout::parse(trivial_hierarchy(), None).expect("parses");
    let new = Layout::parse(trivial_hierarchy(), None).expect("parses");
    let outcome = match_layout(&old, &new);
    assert_eq!(outcome.matched.len(), 1);
    assert!((outcome.score - 1.0).abs() < f64::EPSILON);
    assert!(outcome.is_match);
  }

  #[test]
  fn disjoint_layouts_do_not_match() {
    let old = Layout::parse(trivial_hierarchy(), None).expect("parses");
    let new_xml = r#"<hierarchy><node class="android.widget.TextView" text="Settings" resource-id="com.example:id/other" package="com.example.app" clickable="true" bounds="[0,0][50,50]"/></hierarchy>"#;
    let new = Layout::parse(new_xml, None).expect("parses");
    let outcome = match_layout(&old, &new);
    assert!(outcome.matched.is_empty());
    assert_eq!(outcome.old_not_matched.len(), 1);
  }

  #[test]
  fn score_is_zero_when_nothing_to_match() {
    let old = Layout::parse("<hierarchy/>", None).expect("parses");
    let new = Layout::parse("<hierarchy/>", None).expect("parses");
    let outcome = match_layout(&old, &new);
    assert_eq!(outcome.score, 0.0);
    assert!(!outcome.is_match);
  }
}
