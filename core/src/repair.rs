//! The repair driver: replays a recorded [`TestCase`] against a live
//! [`Device`], rewriting locators through [`match_layout`] and falling back
//! to bounded, backtracking exploration when no direct match is found.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use ahash::HashMap;

use crate::action::Action;
use crate::device::{Device, UiObject};
use crate::error::{DeviceError, RepairError};
use crate::event::{Event, Parameter};
use crate::layout::{Layout, NodeId};
use crate::locator::Locator;
use crate::matcher::match_layout;
use crate::node::Node;
use crate::oracle::AssertionOracle;
use crate::step::{Step, TestCase, Ui};

const POST_ACTION_WAIT: Duration = Duration::from_secs(1);
const APP_INIT_WAIT: Duration = Duration::from_secs(5);
const DEFAULT_IMPLICIT_WAIT: f64 = 3.0;
const LIST_ITEM_PREFERRED_CLASS: &str = "android.widget.TextView";

/// Injected so a test session doesn't have to actually sleep through the
/// driver's fixed post-action/init waits.
pub trait Sleeper {
  fn sleep(&self, duration: Duration);
}

pub struct RealSleeper;

impl Sleeper for RealSleeper {
  fn sleep(&self, duration: Duration) { std::thread::sleep(duration); }
}

/// The outcome of a completed repair run: the committed steps (with
/// locators rewritten to the new UI), attached generated-assertion results,
/// and the two timing figures the output header reports.
pub struct RepairOutcome {
  pub result: Vec<Step>,
  pub result_assertion: HashMap<usize, Event>,
  pub repair_seconds: f64,
  pub explore_time: u32,
}

/// Drives one device through one recorded test case. Single-threaded and
/// synchronous: every device call happens inline, in the order issued.
pub struct RepairSession {
  device: Box<dyn Device>,
  package: String,
  permissions: Vec<String>,
  pretest: Option<String>,
  main: Vec<Step>,
  generated_assertion: HashMap<usize, Step>,
  result: Vec<Step>,
  result_assertion: HashMap<usize, Event>,
  current: usize,
  explore_time: u32,
  optimize_explore: bool,
  oracle: Option<Box<dyn AssertionOracle>>,
  sleeper: Box<dyn Sleeper>,
  start: Option<Instant>,
}

impl RepairSession {
  pub fn new(
    device: Box<dyn Device>, package: impl Into<String>, permissions: Vec<String>, pretest: Option<String>,
    testcase: TestCase, optimize_explore: bool, remove_assertion: bool,
  ) -> Self {
    let testcase: TestCase =
      if remove_assertion { testcase.into_iter().filter(|s| !s.event.is_assertion()).collect() } else { testcase };
    let (main, generated_assertion) = split_testcase(testcase);
    Self {
      device,
      package: package.into(),
      permissions,
      pretest,
      main,
      generated_assertion,
      result: Vec::new(),
      result_assertion: HashMap::default(),
      current: 0,
      explore_time: 0,
      optimize_explore,
      oracle: None,
      sleeper: Box::new(RealSleeper),
      start: None,
    }
  }

  pub fn with_oracle(mut self, oracle: Box<dyn AssertionOracle>) -> Self {
    self.oracle = Some(oracle);
    self
  }

  pub fn with_sleeper(mut self, sleeper: Box<dyn Sleeper>) -> Self {
    self.sleeper = sleeper;
    self
  }

  /// Run the full repair session to completion. On success, ends with the
  /// app stopped and the committed script ready to render. On a fatal
  /// condition, the app is still stopped before the error propagates.
  pub fn run(&mut self) -> Result<RepairOutcome, RepairError> {
    self.start = Some(Instant::now());
    self.init_app()?;
    let outcome = self.drive();
    if let Err(e) = self.device.app_stop(&self.package) {
      log::warn!("app_stop failed during session teardown: {e}");
    }
    outcome?;
    Ok(RepairOutcome {
      result: std::mem::take(&mut self.result),
      result_assertion: std::mem::take(&mut self.result_assertion),
      repair_seconds: self.start.expect("run sets start before driving").elapsed().as_secs_f64(),
      explore_time: self.explore_time,
    })
  }

  fn drive(&mut self) -> Result<(), RepairError> {
    while self.current < self.main.len() {
      self.run_generated_assertion_hook()?;
      if self.try_match_current()? {
        continue;
      }
      if self.try_match_next()? {
        continue;
      }
      if self.try_explore()? {
        continue;
      }
      if !self.back_step()? {
        return Err(RepairError::ExplorationExhausted);
      }
    }
    self.run_generated_assertion_hook()?;
    Ok(())
  }

  fn init_app(&mut self) -> Result<(), RepairError> {
    self.device.app_stop(&self.package)?;
    self.device.app_clear(&self.package)?;
    let permissions = self.permissions.clone();
    for permission in &permissions {
      self.device.grant_permission(&self.package, permission)?;
    }
    self.device.app_start(&self.package)?;
    if let Some(pretest) = &self.pretest {
      log::debug!("pretest script present ({} bytes); passed through to output, not executed", pretest.len());
    }
    self.sleeper.sleep(APP_INIT_WAIT);
    self.device.implicitly_wait(DEFAULT_IMPLICIT_WAIT);
    Ok(())
  }

  /// Re-init the app, then replay every mutating step currently in
  /// `result`. Assertions carried in `result` don't change device state and
  /// are skipped.
  fn recover(&mut self) -> Result<(), RepairError> {
    self.init_app()?;
    let steps = self.result.clone();
    for step in &steps {
      if step.event.is_assertion() {
        continue;
      }
      self.perform_event(&step.event)?;
    }
    Ok(())
  }

  fn run_generated_assertion_hook(&mut self) -> Result<(), RepairError> {
    if self.current == 0 || self.result.is_empty() {
      return Ok(());
    }
    let Some(step) = self.generated_assertion.get(&(self.current - 1)).cloned() else {
      return Ok(());
    };
    let passed = self.assert_passes(&step.event)?;
    let recorded = if passed { step.event.clone() } else { step.event.clone().with_flag_failed() };
    let last_idx = self.result.len() - 1;
    self.result_assertion.insert(last_idx, recorded);
    Ok(())
  }

  fn try_match_current(&mut self) -> Result<bool, RepairError> { self.attempt(self.current, 1, true) }

  fn try_match_next(&mut self) -> Result<bool, RepairError> {
    if self.current + 1 >= self.main.len() {
      return Ok(false);
    }
    self.attempt(self.current + 1, 2, false)
  }

  fn attempt(&mut self, idx: usize, offset: usize, is_current: bool) -> Result<bool, RepairError> {
    if self.main[idx].event.is_assertion() {
      self.execute_assertion(idx, offset, is_current)
    } else {
      self.single_step_match(idx, offset)
    }
  }

  /// Assertions are never run through the matcher — they're checked
  /// directly against the live device using their recorded locator.
  fn execute_assertion(&mut self, idx: usize, offset: usize, is_current: bool) -> Result<bool, RepairError> {
    let event = self.main[idx].event.clone();
    let (ui, _) = self.capture()?;
    let passed = self.assert_passes(&event)?;
    if passed {
      self.result.push(Step::new(event, ui.clone(), ui));
      self.current += offset;
      Ok(true)
    } else if is_current {
      Err(RepairError::AssertionFailed(format!("{:?}", event.action)))
    } else {
      Ok(false)
    }
  }

  fn assert_passes(&mut self, event: &Event) -> Result<bool, RepairError> {
    let locator = event.locator.as_ref().expect("assertion events always carry a locator");
    let object = self.device.object(&locator.criteria, locator.index);
    let passed = match event.action {
      Action::Exist => object.exists(),
      Action::NotExist => !object.exists(),
      Action::Equal | Action::NotEqual => {
        let Parameter::Oracle { attr, oracle } = &event.parameter else { return Ok(false) };
        match object.info(attr) {
          Ok(observed) => {
            let equal = match self.oracle.as_mut() {
              Some(o) => o.check(attr, oracle, &observed).unwrap_or(None).unwrap_or(observed == *oracle),
              None => observed == *oracle,
            };
            if event.action == Action::Equal { equal } else { !equal }
          }
          Err(DeviceError::WidgetNotFound(_)) => false,
          Err(e) => return Err(e.into()),
        }
      }
      _ => unreachable!("non-assertion action passed to assert_passes"),
    };
    Ok(passed)
  }

  /// Match the recorded widget for one step in the current live layout and
  /// replay the event with a rewritten locator.
  fn single_step_match(&mut self, idx: usize, offset: usize) -> Result<bool, RepairError> {
    let step = self.main[idx].clone();

    if step.event.locator.is_none() {
      let (ui_before, _) = self.capture()?;
      self.perform_event(&step.event)?;
      let (ui_after, _) = self.capture()?;
      self.result.push(Step::new(step.event, ui_before, ui_after));
      self.current += offset;
      return Ok(true);
    }

    let (ui_before, live_before) = self.capture()?;
    let base_png = if step.ui_before.png.is_empty() { None } else { Some(step.ui_before.png.as_slice()) };
    let base_layout = Layout::parse(&step.ui_before.xml, base_png)?;
    let outcome = match_layout(&base_layout, &live_before);

    let old_id = step
      .event
      .locator
      .as_ref()
      .expect("checked above")
      .find_in_layout(&base_layout)
      .ok_or(RepairError::BaseLocatorUnresolved)?;

    let Some(&new_id) = outcome.matched.get(&old_id) else {
      return Ok(false);
    };

    let new_locator = Locator::from_node(live_before.node(new_id));
    let rewritten = step.event.with_locator(new_locator);

    self.perform_event(&rewritten).map_err(|e| RepairError::PerformAfterMatchFailed(e.to_string()))?;
    let (ui_after, live_after) = self.capture()?;

    self.current += offset;
    if live_before.tree_equal(&live_after) {
      return Ok(true);
    }
    self.result.push(Step::new(rewritten, ui_before, ui_after));
    Ok(true)
  }

  /// Generate candidate clicks on the current screen and recursively retry
  /// matching after each one, backtracking on failure.
  fn try_explore(&mut self) -> Result<bool, RepairError> {
    let candidates = self.generate_candidates()?;
    for candidate in candidates {
      self.explore_time += 1;
      let snapshot_result = self.result.clone();
      let snapshot_assertions = self.result_assertion.clone();

      let (ui_before, live_before) = self.capture()?;
      if let Err(e) = self.perform_event(&candidate) {
        log::debug!("exploration candidate perform failed, trying next: {e}");
        continue;
      }
      let (ui_after, live_after) = self.capture()?;

      if self.optimize_explore && live_before.tree_equal(&live_after) {
        continue;
      }

      self.result.push(Step::new(candidate, ui_before, ui_after));
      if self.try_match_current()? || self.try_match_next()? {
        return Ok(true);
      }

      self.result = snapshot_result;
      self.result_assertion = snapshot_assertions;
      self.recover()?;
    }
    Ok(false)
  }

  /// Pop the last committed step (and, for a swipe, the step before it too)
  /// and retry matching from there before giving up entirely.
  fn back_step(&mut self) -> Result<bool, RepairError> {
    if self.result.is_empty() {
      return Ok(false);
    }
    let popped = self.result.pop().expect("checked non-empty above");
    if popped.event.action == Action::Swipe {
      self.result.pop();
    }
    self.result_assertion.retain(|&idx, _| idx < self.result.len());
    self.recover()?;
    if self.try_match_current()? {
      return Ok(true);
    }
    if self.try_match_next()? {
      return Ok(true);
    }
    self.try_explore()
  }

  fn generate_candidates(&mut self) -> Result<Vec<Event>, RepairError> {
    let (_, layout) = self.capture()?;
    let mut pool: Vec<NodeId> = layout.children.clone();

    if self.optimize_explore {
      pool.retain(|&id| !crate::predicates::is_skippable_for_geometric_match(layout.node(id).class()));
      pool = reduce_list_item_buckets(&layout, pool);

      let id_counts = count_occurrences(&layout, &pool, Node::resource_id);
      let text_counts = count_occurrences(&layout, &pool, Node::text);
      let desc_counts = count_occurrences(&layout, &pool, Node::content_desc);
      pool.sort_by_key(|&id| candidate_sort_key(&layout, id, &id_counts, &text_counts, &desc_counts));
    } else {
      pool.sort_by_key(|&id| {
        let n = layout.node(id);
        (n.y(), n.x())
      });
    }

    Ok(pool.into_iter().map(|id| Event::new(Action::Click, Some(Locator::from_node(layout.node(id))), Parameter::None)).collect())
  }

  fn perform_event(&mut self, event: &Event) -> Result<(), DeviceError> {
    match event.action {
      Action::Click => self.object_for(event)?.click()?,
      Action::LongClick => self.object_for(event)?.long_click()?,
      Action::SetText => {
        let text = if let Parameter::Text { text } = &event.parameter { text.as_str() } else { "" };
        self.object_for(event)?.set_text(text)?;
      }
      Action::Back => self.device.press_back()?,
      Action::Swipe => {
        let (fx, fy, tx, ty) =
          if let Parameter::Swipe { fx, fy, tx, ty } = &event.parameter { (*fx, *fy, *tx, *ty) } else { (0, 0, 0, 0) };
        self.device.swipe(fx, fy, tx, ty)?;
      }
      Action::Exist | Action::NotExist | Action::Equal | Action::NotEqual => return Ok(()),
    }
    self.sleeper.sleep(POST_ACTION_WAIT);
    Ok(())
  }

  fn object_for(&self, event: &Event) -> Result<Box<dyn UiObject>, DeviceError> {
    let locator =
      event.locator.as_ref().ok_or_else(|| DeviceError::WidgetNotFound("event carries no locator".to_string()))?;
    Ok(self.device.object(&locator.criteria, locator.index))
  }

  fn capture(&mut self) -> Result<(Ui, Layout), RepairError> {
    let xml = self.device.dump_hierarchy()?;
    let png = self.device.screenshot().unwrap_or_else(|e| {
      log::debug!("screenshot failed, continuing without it: {e}");
      Vec::new()
    });
    let layout = Layout::parse(&xml, if png.is_empty() { None } else { Some(png.as_slice()) })?;
    Ok((Ui::new(xml, png), layout))
  }
}

/// Separate synthetic generated assertions out of the raw recorded
/// sequence, keyed by the index (in the resulting main sequence) of the
/// step they follow. A generated assertion with no preceding step is
/// dropped — there is nothing for it to attach to.
fn split_testcase(testcase: TestCase) -> (Vec<Step>, HashMap<usize, Step>) {
  let mut main = Vec::new();
  let mut generated = HashMap::default();
  for step in testcase {
    if step.event.is_generated_assertion() {
      if let Some(prev_idx) = main.len().checked_sub(1) {
        generated.insert(prev_idx, step);
      }
    } else {
      main.push(step);
    }
  }
  (main, generated)
}

fn count_occurrences(layout: &Layout, pool: &[NodeId], read: impl Fn(&Node) -> &str) -> HashMap<String, i32> {
  let mut counts = HashMap::default();
  for &id in pool {
    *counts.entry(read(layout.node(id)).to_string()).or_insert(0) += 1;
  }
  counts
}

#[allow(clippy::type_complexity)]
fn candidate_sort_key(
  layout: &Layout, id: NodeId, id_counts: &HashMap<String, i32>, text_counts: &HashMap<String, i32>,
  desc_counts: &HashMap<String, i32>,
) -> (i32, i32, i32, i32, i32, i32, i32, i32, i32, i32, i32) {
  let n = layout.node(id);
  let (rid, text, desc) = (n.resource_id(), n.text(), n.content_desc());
  let id_count = *id_counts.get(rid).unwrap_or(&0);
  let text_count = *text_counts.get(text).unwrap_or(&0);
  let desc_count = *desc_counts.get(desc).unwrap_or(&0);
  (
    if id_count == 1 { 0 } else { 1 },
    if text_count == 1 { 0 } else { 1 },
    if desc_count == 1 { 0 } else { 1 },
    if rid.is_empty() { 0 } else { 1 },
    if text.is_empty() { 0 } else { 1 },
    if desc.is_empty() { 0 } else { 1 },
    id_count,
    text_count,
    desc_count,
    n.y(),
    n.x(),
  )
}

/// Bucket list-items by their `non_overlap` ancestor and keep only the
/// single best representative per bucket (cheapest way to avoid clicking
/// through a whole list of visually-identical rows during exploration).
fn reduce_list_item_buckets(layout: &Layout, pool: Vec<NodeId>) -> Vec<NodeId> {
  let mut buckets: HashMap<NodeId, Vec<NodeId>> = HashMap::default();
  let mut singles = Vec::new();
  for id in pool {
    match layout.non_overlap.get(&id) {
      Some(&anchor) => buckets.entry(anchor).or_default().push(id),
      None => singles.push(id),
    }
  }
  for (_, members) in buckets {
    let best = members.into_iter().min_by_key(|&id| {
      let n = layout.node(id);
      (if n.class() == LIST_ITEM_PREFERRED_CLASS { 0 } else { 1 }, n.y(), n.x(), n.text().len(), n.content_desc().len())
    });
    if let Some(best) = best {
      singles.push(best);
    }
  }
  singles
}

/// Template substitution into the repaired script.
pub fn render_script(device_var: &str, package: &str, outcome: &RepairOutcome) -> String {
  let mut body = String::new();
  for (i, step) in outcome.result.iter().enumerate() {
    body.push_str("    ");
    body.push_str(&step.event.generate_u2(device_var));
    body.push('\n');
    if let Some(assertion) = outcome.result_assertion.get(&i) {
      body.push_str("    ");
      body.push_str(&assertion.generate_u2(device_var));
      body.push('\n');
    }
  }
  format!(
    "# repair time: {:.2}s\n# explore time: {}\n{device_var} = connect_device()  # package: {package}\n{body}",
    outcome.repair_seconds, outcome.explore_time,
  )
}

#[cfg(test)]
mod tests {
  use std::cell::RefCell;
  use std::rc::Rc;

  use super::*;
  use crate::criterion::Criterion;

  #[derive(Clone)]
  struct SharedStage(Rc<RefCell<u32>>);

  struct FakeDevice {
    stage: SharedStage,
    screens: Vec<&'static str>,
  }

  impl FakeDevice {
    fn new(screens: Vec<&'static str>) -> Self { Self { stage: SharedStage(Rc::new(RefCell::new(0))), screens } }
    fn current_xml(&self) -> String { self.screens[*self.stage.0.borrow() as usize].to_string() }
  }

  impl Device for FakeDevice {
    fn dump_hierarchy(&mut self) -> Result<String, DeviceError> { Ok(self.current_xml()) }
    fn screenshot(&mut self) -> Result<Vec<u8>, DeviceError> { Ok(Vec::new()) }
    fn object(&self, criteria: &BTreeMap<Criterion, String>, index: i32) -> Box<dyn UiObject> {
      Box::new(FakeUiObject { stage: self.stage.clone(), screens: self.screens.clone(), criteria: criteria.clone(), index })
    }
    fn press_back(&mut self) -> Result<(), DeviceError> { Ok(()) }
    fn swipe(&mut self, _fx: i32, _fy: i32, _tx: i32, _ty: i32) -> Result<(), DeviceError> { Ok(()) }
    fn shell(&mut self, _argv: &[&str]) -> Result<String, DeviceError> { Ok(String::new()) }
    fn app_start(&mut self, _package: &str) -> Result<(), DeviceError> { Ok(()) }
    fn app_stop(&mut self, _package: &str) -> Result<(), DeviceError> { Ok(()) }
    fn app_clear(&mut self, _package: &str) -> Result<(), DeviceError> { Ok(()) }
    fn grant_permission(&mut self, _package: &str, _permission: &str) -> Result<(), DeviceError> { Ok(()) }
    fn package_version(&mut self, _package: &str) -> Result<Option<String>, DeviceError> { Ok(Some("1.0".to_string())) }
    fn implicitly_wait(&mut self, _seconds: f64) {}
  }

  struct FakeUiObject {
    stage: SharedStage,
    screens: Vec<&'static str>,
    criteria: BTreeMap<Criterion, String>,
    index: i32,
  }

  impl FakeUiObject {
    fn resolve(&self) -> Option<Node> {
      let xml = self.screens[*self.stage.0.borrow() as usize];
      let layout = Layout::parse(xml, None).ok()?;
      let id = Locator::new(self.criteria.clone(), self.index).find_in_layout(&layout)?;
      Some(layout.node(id).clone())
    }
  }

  impl UiObject for FakeUiObject {
    fn click(&self) -> Result<(), DeviceError> {
      let node = self.resolve().ok_or_else(|| DeviceError::WidgetNotFound(format!("{:?}", self.criteria)))?;
      if node.text() == "Menu" {
        *self.stage.0.borrow_mut() = 1;
      }
      Ok(())
    }
    fn long_click(&self) -> Result<(), DeviceError> { self.click() }
    fn set_text(&self, _text: &str) -> Result<(), DeviceError> { Ok(()) }
    fn exists(&self) -> bool { self.resolve().is_some() }
    fn info(&self, attr: &str) -> Result<String, DeviceError> {
      self.resolve().map(|n| n.get(attr).to_string()).ok_or_else(|| DeviceError::WidgetNotFound(format!("{:?}", self.criteria)))
    }
  }

  struct NoopSleeper;
  impl Sleeper for NoopSleeper {
    fn sleep(&self, _duration: Duration) {}
  }

  const STAGE0: &str = r#"<hierarchy><node class="android.widget.TextView" text="Menu" resource-id="id/menu" package="app" clickable="true" bounds="[0,0][200,200]"/></hierarchy>"#;
  const STAGE1: &str = r#"<hierarchy>
    <node class="android.widget.TextView" text="Menu" resource-id="id/menu" package="app" clickable="true" bounds="[0,0][200,200]"/>
    <node class="android.widget.TextView" text="Target" resource-id="id/target" package="app" clickable="true" bounds="[0,210][200,410]"/>
  </hierarchy>"#;

  fn fixed_screen_device() -> FakeDevice { FakeDevice::new(vec![STAGE1]) }

  fn session(device: FakeDevice, testcase: TestCase) -> RepairSession {
    RepairSession::new(Box::new(device), "app", Vec::new(), None, testcase, true, false).with_sleeper(Box::new(NoopSleeper))
  }

  #[test]
  fn no_op_click_after_successful_match_is_skipped_from_result() {
    let device = fixed_screen_device();
    let ui = Ui::new(STAGE1, Vec::new());
    let event = Event::new(Action::Click, Some(Locator::single(Criterion::Text, "Target", 0)), Parameter::None);
    let testcase = vec![Step::new(event, ui.clone(), ui)];
    let mut sess = session(device, testcase);
    let outcome = sess.run().expect("repair succeeds");
    assert!(outcome.result.is_empty());
  }

  #[test]
  fn passing_assertion_is_recorded() {
    let device = fixed_screen_device();
    let event = Event::new(Action::Exist, Some(Locator::single(Criterion::Text, "Target", 0)), Parameter::None);
    let testcase = vec![Step::new(event, Ui::new(STAGE1, Vec::new()), Ui::new(STAGE1, Vec::new()))];
    let mut sess = session(device, testcase);
    let outcome = sess.run().expect("assertion passes");
    assert_eq!(outcome.result.len(), 1);
  }

  #[test]
  fn failing_current_assertion_is_fatal() {
    let device = fixed_screen_device();
    let event = Event::new(Action::Exist, Some(Locator::single(Criterion::Text, "Nonexistent", 0)), Parameter::None);
    let testcase = vec![Step::new(event, Ui::new(STAGE1, Vec::new()), Ui::new(STAGE1, Vec::new()))];
    let mut sess = session(device, testcase);
    assert!(matches!(sess.run(), Err(RepairError::AssertionFailed(_))));
  }

  #[test]
  fn exploration_finds_target_behind_a_menu_click() {
    let device = FakeDevice::new(vec![STAGE0, STAGE1]);
    let event = Event::new(Action::Click, Some(Locator::single(Criterion::Text, "Target", 0)), Parameter::None);
    let testcase = vec![Step::new(event, Ui::new(STAGE1, Vec::new()), Ui::new(STAGE1, Vec::new()))];
    let mut sess = session(device, testcase);
    let outcome = sess.run().expect("exploration recovers the target");
    assert_eq!(outcome.result.len(), 1);
    assert!(outcome.result[0].event.locator.as_ref().unwrap().criteria.values().any(|v| v == "Menu"));
    assert!(outcome.explore_time >= 1);
  }

  #[test]
  fn exhausted_exploration_with_empty_result_is_fatal() {
    // Two identical stages: clicking "Menu" flips the stage index but the
    // screen content is unchanged, so every exploration candidate is a
    // canonical no-op and never gets recorded.
    let device = FakeDevice::new(vec![STAGE0, STAGE0]);
    let event = Event::new(Action::Click, Some(Locator::single(Criterion::Text, "Target", 0)), Parameter::None);
    let testcase = vec![Step::new(event, Ui::new(STAGE1, Vec::new()), Ui::new(STAGE1, Vec::new()))];
    let mut sess = session(device, testcase);
    assert!(matches!(sess.run(), Err(RepairError::ExplorationExhausted)));
  }
}
