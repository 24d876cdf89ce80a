//! Parses a UI Automator hierarchy dump (and its paired screenshot) into a
//! [`Layout`]: the preprocessed arena tree plus the derived indices the
//! matcher and repair driver consume.

use ahash::{HashMap, HashSet};
use indextree::Arena;
pub use indextree::NodeId;
use quick_xml::events::Event as XmlEvent;
use quick_xml::reader::Reader;
use uidrift_algo::run_to_fixed_point;
use uidrift_geom::is_cover;

use crate::error::LayoutError;
use crate::node::{INDEXED_ATTRS, Node, TAG_HIERARCHY, TAG_NODE};
use crate::predicates::{is_child, is_parent};

const SYSTEM_UI_PACKAGE: &str = "com.android.systemui";
const SKIPPED_INDEX_RESOURCE_PREFIX: &str = "com.google.android";

/// A parsed, preprocessed UI hierarchy with its derived classification
/// indices. Node handles (`NodeId`) are arena indices valid only against
/// this `Layout`'s own arena.
pub struct Layout {
  arena: Arena<Node>,
  root: NodeId,
  pub children: Vec<NodeId>,
  pub parents: Vec<NodeId>,
  pub cp: HashMap<NodeId, NodeId>,
  pub non_overlap: HashMap<NodeId, NodeId>,
  pub non_unique: HashSet<NodeId>,
  pub unique_children: HashSet<NodeId>,
  png: Option<image::GrayImage>,
}

impl Layout {
  pub fn parse(xml: &str, png_bytes: Option<&[u8]>) -> Result<Self, LayoutError> {
    let (mut arena, root) = parse_xml(xml)?;
    remove_system_ui(&mut arena, root);
    denote_index(&mut arena, root);
    denote_bounds(&mut arena, root);

    let children = compute_children(&arena, root);
    let parents = compute_parents(&arena, root);
    let cp = compute_cp(&arena, root);
    let groups = group_list_items(&arena, &children);
    let non_overlap = compute_non_overlap(&arena, &cp, &groups);
    let non_unique = compute_non_unique(&arena, &groups);
    let unique_children = compute_unique_children(&arena, &children);

    let png = png_bytes.filter(|b| !b.is_empty()).and_then(|bytes| match image::load_from_memory(bytes) {
      Ok(img) => Some(img.to_luma8()),
      Err(err) => {
        log::debug!("failed to decode screenshot PNG, skipping keypoint phase: {err}");
        None
      }
    });

    Ok(Layout { arena, root, children, parents, cp, non_overlap, non_unique, unique_children, png })
  }

  pub fn root(&self) -> NodeId { self.root }

  pub fn arena(&self) -> &Arena<Node> { &self.arena }

  pub fn node(&self, id: NodeId) -> &Node { self.arena[id].get() }

  pub fn png(&self) -> Option<&image::GrayImage> { self.png.as_ref() }

  pub fn has_children(&self, id: NodeId) -> bool { id.children(&self.arena).next().is_some() }

  pub fn descendants(&self) -> impl Iterator<Item = NodeId> + '_ { self.root.descendants(&self.arena) }

  /// Canonical XML equality: two layouts compare equal when their raw
  /// (non-derived) attributes, recursively, serialize identically.
  pub fn tree_equal(&self, other: &Layout) -> bool {
    serialize_canonical(&self.arena, self.root) == serialize_canonical(&other.arena, other.root)
  }

  /// Paint a rectangle outline per node id, for visual debugging.
  pub fn draw_overlay(&self, img: &mut image::RgbImage, ids: &[NodeId], color: image::Rgb<u8>) {
    for &id in ids {
      let c = self.node(id).coordinate();
      draw_rect(img, c.x0, c.y0, c.x1, c.y1, color);
    }
  }
}

fn draw_rect(img: &mut image::RgbImage, x0: i32, y0: i32, x1: i32, y1: i32, color: image::Rgb<u8>) {
  let (w, h) = img.dimensions();
  let in_bounds = |x: i32, y: i32| x >= 0 && y >= 0 && (x as u32) < w && (y as u32) < h;
  for x in x0..=x1 {
    if in_bounds(x, y0) {
      img.put_pixel(x as u32, y0 as u32, color);
    }
    if in_bounds(x, y1) {
      img.put_pixel(x as u32, y1 as u32, color);
    }
  }
  for y in y0..=y1 {
    if in_bounds(x0, y) {
      img.put_pixel(x0 as u32, y as u32, color);
    }
    if in_bounds(x1, y) {
      img.put_pixel(x1 as u32, y as u32, color);
    }
  }
}

fn serialize_canonical(arena: &Arena<Node>, id: NodeId) -> String {
  let node = arena[id].get();
  let mut out = format!("<{}", node.tag);
  for (k, v) in node.sorted_attrs() {
    if k == "x" || k == "y" || k == "w" || k == "h" || k.ends_with("-index") {
      continue;
    }
    out.push_str(&format!(" {k}=\"{v}\""));
  }
  out.push('>');
  for child in id.children(arena) {
    out.push_str(&serialize_canonical(arena, child));
  }
  out.push_str(&format!("</{}>", node.tag));
  out
}

fn parse_xml(xml: &str) -> Result<(Arena<Node>, NodeId), LayoutError> {
  let mut arena = Arena::new();
  let mut reader = Reader::from_str(xml);
  reader.config_mut().trim_text(true);
  let mut stack: Vec<NodeId> = Vec::new();
  let mut root: Option<NodeId> = None;
  let mut buf = Vec::new();

  let mut make = |arena: &mut Arena<Node>, e: &quick_xml::events::BytesStart| -> NodeId {
    let tag = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let mut node = Node::new(tag);
    for attr in e.attributes().flatten() {
      let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
      let value = attr.unescape_value().map(|v| v.into_owned()).unwrap_or_default();
      node.set(key, value);
    }
    arena.new_node(node)
  };

  loop {
    match reader.read_event_into(&mut buf) {
      Ok(XmlEvent::Start(e)) => {
        let id = make(&mut arena, &e);
        if let Some(&parent) = stack.last() {
          parent.append(id, &mut arena);
        } else if root.is_none() {
          root = Some(id);
        }
        stack.push(id);
      }
      Ok(XmlEvent::Empty(e)) => {
        let id = make(&mut arena, &e);
        if let Some(&parent) = stack.last() {
          parent.append(id, &mut arena);
        } else if root.is_none() {
          root = Some(id);
        }
      }
      Ok(XmlEvent::End(_)) => {
        stack.pop();
      }
      Ok(XmlEvent::Eof) => break,
      Err(err) => return Err(LayoutError::MalformedXml(err.to_string())),
      _ => {}
    }
    buf.clear();
  }

  root.ok_or(LayoutError::EmptyHierarchy)
    .map(|root| (arena, root))
}

fn remove_system_ui(arena: &mut Arena<Node>, root: NodeId) {
  if arena[root].get().tag != TAG_HIERARCHY {
    return;
  }
  let to_remove: Vec<NodeId> =
    root.children(arena).filter(|&id| arena[id].get().package() == SYSTEM_UI_PACKAGE).collect();
  for id in to_remove {
    id.remove_subtree(arena);
  }
}

fn denote_index(arena: &mut Arena<Node>, root: NodeId) {
  let mut counters: HashMap<(&'static str, String), i32> = HashMap::default();
  let ids: Vec<NodeId> = root.descendants(arena).collect();
  for id in ids {
    if arena[id].get().tag != TAG_NODE {
      continue;
    }
    if arena[id].get().resource_id().starts_with(SKIPPED_INDEX_RESOURCE_PREFIX) {
      continue;
    }
    for attr in INDEXED_ATTRS {
      let value = arena[id].get().get(attr).to_string();
      if value.is_empty() {
        arena[id].get_mut().set_attr_index(attr, -1);
        continue;
      }
      let counter = counters.entry((attr, value)).or_insert(0);
      let idx = *counter;
      *counter += 1;
      arena[id].get_mut().set_attr_index(attr, idx);
    }
  }
}

fn denote_bounds(arena: &mut Arena<Node>, root: NodeId) {
  let ids: Vec<NodeId> = root.descendants(arena).collect();
  for id in ids {
    if arena[id].get().tag != TAG_NODE {
      continue;
    }
    let bounds = arena[id].get().bounds().to_string();
    let coord = uidrift_geom::parse_bounds(&bounds);
    let node = arena[id].get_mut();
    node.set_i32("x", coord.x0);
    node.set_i32("y", coord.y0);
    node.set_i32("w", coord.width());
    node.set_i32("h", coord.height());
  }
}

fn compute_children(arena: &Arena<Node>, root: NodeId) -> Vec<NodeId> {
  let mut valid: Vec<NodeId> = Vec::new();
  for id in root.descendants(arena) {
    let node = arena[id].get();
    if node.tag != TAG_NODE {
      continue;
    }
    let has_children = id.children(arena).next().is_some();
    if !is_child(node, has_children) {
      continue;
    }
    if node.clickable() {
      let coord = node.coordinate();
      valid.retain(|&m| !is_cover(coord, arena[m].get().coordinate()));
      valid.push(id);
    } else {
      let covered = valid
        .iter()
        .any(|&m| arena[m].get().clickable() && is_cover(arena[m].get().coordinate(), node.coordinate()));
      if !covered {
        valid.push(id);
      }
    }
  }
  valid
}

fn compute_parents(arena: &Arena<Node>, root: NodeId) -> Vec<NodeId> {
  let mut parents: Vec<NodeId> = Vec::new();
  for id in root.descendants(arena) {
    let node = arena[id].get();
    if node.tag != TAG_NODE {
      continue;
    }
    let has_children = id.children(arena).next().is_some();
    if is_parent(node, has_children) {
      parents.push(id);
    }
  }
  compress_parents(arena, parents)
}

fn compress_parents(arena: &Arena<Node>, parents: Vec<NodeId>) -> Vec<NodeId> {
  let parent_set: HashSet<NodeId> = parents.iter().copied().collect();
  parents
    .into_iter()
    .filter(|&b| {
      let mut iter = b.children(arena);
      let Some(only_child) = iter.next() else { return true };
      if iter.next().is_some() {
        return true;
      }
      !parent_set.contains(&only_child)
    })
    .collect()
}

fn compute_cp(arena: &Arena<Node>, root: NodeId) -> HashMap<NodeId, NodeId> {
  let mut cp = HashMap::default();
  for id in root.descendants(arena) {
    if id == root {
      continue;
    }
    if let Some(parent) = arena[id].parent() {
      cp.insert(id, parent);
    }
  }
  cp
}

fn group_list_items(arena: &Arena<Node>, children: &[NodeId]) -> Vec<Vec<NodeId>> {
  let mut groups: HashMap<String, Vec<NodeId>> = HashMap::default();
  for &id in children {
    let rid = arena[id].get().resource_id();
    if rid.is_empty() {
      continue;
    }
    groups.entry(rid.to_string()).or_default().push(id);
  }
  groups.into_values().filter(|g| g.len() >= 2).collect()
}

fn compute_non_overlap(
  arena: &Arena<Node>, cp: &HashMap<NodeId, NodeId>, groups: &[Vec<NodeId>],
) -> HashMap<NodeId, NodeId> {
  let mut result = HashMap::default();
  for group in groups {
    let mut ancestor: HashMap<NodeId, NodeId> = group.iter().map(|&m| (m, m)).collect();
    run_to_fixed_point(|| {
      let snapshot = ancestor.clone();
      let mut progressed = false;
      for &member in group {
        let current = snapshot[&member];
        let Some(&candidate) = cp.get(&current) else { continue };
        if arena[candidate].get().tag == TAG_HIERARCHY {
          continue;
        }
        let candidate_coord = arena[candidate].get().coordinate();
        let conflict = group.iter().any(|&other| {
          other != member && uidrift_geom::is_overlap(arena[snapshot[&other]].get().coordinate(), candidate_coord)
        });
        if !conflict {
          ancestor.insert(member, candidate);
          progressed = true;
        }
      }
      progressed
    });
    result.extend(ancestor);
  }
  result
}

fn compute_non_unique(arena: &Arena<Node>, groups: &[Vec<NodeId>]) -> HashSet<NodeId> {
  let mut result = HashSet::default();
  for group in groups {
    for &m in group {
      let mn = arena[m].get();
      let key = (mn.resource_id(), mn.content_desc(), mn.text());
      let collides = group.iter().any(|&other| {
        if other == m {
          return false;
        }
        let on = arena[other].get();
        (on.resource_id(), on.content_desc(), on.text()) == key
      });
      if collides {
        result.insert(m);
      }
    }
  }
  result
}

fn compute_unique_children(arena: &Arena<Node>, children: &[NodeId]) -> HashSet<NodeId> {
  let mut counts: HashMap<String, i32> = HashMap::default();
  for &id in children {
    *counts.entry(arena[id].get().class().to_string()).or_insert(0) += 1;
  }
  children.iter().copied().filter(|&id| counts[arena[id].get().class()] == 1).collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  const SAMPLE: &str = r#"<hierarchy rotation="0">
    <node index="0" text="" resource-id="" class="android.widget.FrameLayout" package="com.example.app" content-desc="" clickable="false" bounds="[0,0][1080,1920]">
      <node index="0" text="Documents" resource-id="com.example.app:id/primary_info" class="android.widget.TextView" package="com.example.app" content-desc="" clickable="true" bounds="[100,100][400,400]"/>
      <node index="1" text="Other" resource-id="com.example.app:id/secondary" class="android.widget.TextView" package="com.example.app" content-desc="" clickable="true" bounds="[500,500][800,800]"/>
    </node>
  </hierarchy>"#;

  #[test]
  fn parses_and_derives_children() {
    let layout = Layout::parse(SAMPLE, None).expect("parses");
    assert_eq!(layout.children.len(), 2);
  }

  #[test]
  fn denotes_bounds_on_every_node() {
    let layout = Layout::parse(SAMPLE, None).expect("parses");
    let first = layout.children[0];
    let node = layout.node(first);
    assert_eq!((node.x(), node.y(), node.w(), node.h()), (100, 100, 300, 300));
  }

  #[test]
  fn removes_system_ui_children() {
    let xml = r#"<hierarchy><node package="com.android.systemui" class="android.widget.FrameLayout" bounds="[0,0][10,10]"/><node package="com.example.app" text="x" class="android.widget.TextView" resource-id="id/a" bounds="[0,0][50,50]"/></hierarchy>"#;
    let layout = Layout::parse(xml, None).expect("parses");
    assert_eq!(layout.root.children(&layout.arena).count(), 1);
  }

  #[test]
  fn malformed_bounds_yield_zero_size() {
    let xml = r#"<hierarchy><node class="android.widget.TextView" text="a" resource-id="id/a" bounds="garbage"/></hierarchy>"#;
    let layout = Layout::parse(xml, None).expect("parses");
    let id = layout.root.children(&layout.arena).next().unwrap();
    assert_eq!((layout.node(id).w(), layout.node(id).h()), (0, 0));
  }

  #[test]
  fn tree_equal_ignores_derived_attrs_but_not_raw_ones() {
    let a = Layout::parse(SAMPLE, None).expect("parses");
    let b = Layout::parse(SAMPLE, None).expect("parses");
    assert!(a.tree_equal(&b));
  }

  #[test]
  fn denote_index_repeats_for_same_attribute_value() {
    let xml = r#"<hierarchy>
      <node class="android.widget.TextView" text="a" resource-id="id/a" bounds="[0,0][10,10]"/>
      <node class="android.widget.TextView" text="b" resource-id="id/b" bounds="[0,0][10,10]"/>
      <node class="android.widget.TextView" text="a" resource-id="id/c" bounds="[0,0][10,10]"/>
    </hierarchy>"#;
    let layout = Layout::parse(xml, None).expect("parses");
    let mut kids = layout.root.children(&layout.arena);
    let first = kids.next().unwrap();
    let second = kids.next().unwrap();
    let third = kids.next().unwrap();
    assert_eq!(layout.node(first).attr_index("text"), 0);
    assert_eq!(layout.node(second).attr_index("text"), 0);
    assert_eq!(layout.node(third).attr_index("text"), 1);
  }
}
