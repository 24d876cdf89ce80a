//! Reads and writes the recorded-artifact format: a directory or zip
//! holding `record.txt`, `ui/<i>.{xml,png}` snapshots, and an optional
//! `pretest.py`.

use std::fs;
use std::io::{Read, Write};
use std::path::Path;

use zip::write::SimpleFileOptions;

use crate::error::RepairError;
use crate::event::Event;
use crate::step::{Step, TestCase, Ui};

const RECORD_FILE: &str = "record.txt";
const RECORD_WITH_ASSERTION_FILE: &str = "record_with_assertion.txt";
const PRETEST_FILE: &str = "pretest.py";

pub struct RecordedArchive {
  pub testcase: TestCase,
  pub pretest: Option<String>,
}

trait Source {
  fn read_text(&mut self, rel: &str) -> Option<String>;
  fn read_bytes(&mut self, rel: &str) -> Option<Vec<u8>>;
}

struct DirSource<'a> {
  root: &'a Path,
}

impl Source for DirSource<'_> {
  fn read_text(&mut self, rel: &str) -> Option<String> { fs::read_to_string(self.root.join(rel)).ok() }
  fn read_bytes(&mut self, rel: &str) -> Option<Vec<u8>> { fs::read(self.root.join(rel)).ok() }
}

struct ZipSource {
  archive: zip::ZipArchive<fs::File>,
}

impl Source for ZipSource {
  fn read_text(&mut self, rel: &str) -> Option<String> {
    let mut file = self.archive.by_name(rel).ok()?;
    let mut buf = String::new();
    file.read_to_string(&mut buf).ok()?;
    Some(buf)
  }

  fn read_bytes(&mut self, rel: &str) -> Option<Vec<u8>> {
    let mut file = self.archive.by_name(rel).ok()?;
    let mut buf = Vec::new();
    file.read_to_end(&mut buf).ok()?;
    Some(buf)
  }
}

impl RecordedArchive {
  /// Load from either a directory or a zip file, picking `record.txt` or
  /// `record_with_assertion.txt` as the event stream.
  pub fn load(path: &Path, with_assertions: bool) -> Result<Self, RepairError> {
    if path.is_dir() {
      let mut source = DirSource { root: path };
      Self::load_from(&mut source, with_assertions)
    } else {
      let file = fs::File::open(path)?;
      let archive = zip::ZipArchive::new(file).map_err(|e| RepairError::MalformedRecord(e.to_string()))?;
      let mut source = ZipSource { archive };
      Self::load_from(&mut source, with_assertions)
    }
  }

  fn load_from(source: &mut dyn Source, with_assertions: bool) -> Result<Self, RepairError> {
    let pretest = source.read_text(PRETEST_FILE);
    let record_name = if with_assertions { RECORD_WITH_ASSERTION_FILE } else { RECORD_FILE };
    let events_text =
      source.read_text(record_name).ok_or_else(|| RepairError::MalformedRecord(format!("missing {record_name}")))?;

    let mut testcase = TestCase::new();
    let mut ui_index = 0usize;
    for line in events_text.lines() {
      if line.trim().is_empty() {
        continue;
      }
      let value: serde_json::Value = serde_json::from_str(line)
        .map_err(|e| RepairError::MalformedRecord(format!("bad JSON in {record_name}: {e}")))?;
      let Some(event) = Event::from_json(&value) else {
        return Err(RepairError::MalformedRecord(format!("unparsable event in {record_name}")));
      };
      if event.is_generated_assertion() {
        testcase.push(Step::new(event, Ui::default(), Ui::default()));
        continue;
      }
      let before = Ui::new(
        source.read_text(&format!("ui/{}.xml", ui_index * 2)).unwrap_or_default(),
        source.read_bytes(&format!("ui/{}.png", ui_index * 2)).unwrap_or_default(),
      );
      let after = Ui::new(
        source.read_text(&format!("ui/{}.xml", ui_index * 2 + 1)).unwrap_or_default(),
        source.read_bytes(&format!("ui/{}.png", ui_index * 2 + 1)).unwrap_or_default(),
      );
      testcase.push(Step::new(event, before, after));
      ui_index += 1;
    }

    Ok(Self { testcase, pretest })
  }

  /// Write a verbose-output archive: every committed step's event plus its
  /// UI snapshots, for post-hoc inspection of a repair session.
  pub fn write(path: &Path, testcase: &TestCase, pretest: Option<&str>) -> Result<(), RepairError> {
    let file = fs::File::create(path)?;
    let mut zip = zip::ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    let mut record = String::new();
    for step in testcase {
      record.push_str(&step.event.to_json().to_string());
      record.push('\n');
    }
    zip.start_file(RECORD_FILE, options).map_err(|e| RepairError::MalformedRecord(e.to_string()))?;
    zip.write_all(record.as_bytes())?;

    let mut i = 0usize;
    for step in testcase {
      if step.is_synthetic() {
        continue;
      }
      zip.start_file(format!("ui/{}.xml", i * 2), options).map_err(|e| RepairError::MalformedRecord(e.to_string()))?;
      zip.write_all(step.ui_before.xml.as_bytes())?;
      zip.start_file(format!("ui/{}.png", i * 2), options).map_err(|e| RepairError::MalformedRecord(e.to_string()))?;
      zip.write_all(&step.ui_before.png)?;
      zip
        .start_file(format!("ui/{}.xml", i * 2 + 1), options)
        .map_err(|e| RepairError::MalformedRecord(e.to_string()))?;
      zip.write_all(step.ui_after.xml.as_bytes())?;
      zip
        .start_file(format!("ui/{}.png", i * 2 + 1), options)
        .map_err(|e| RepairError::MalformedRecord(e.to_string()))?;
      zip.write_all(&step.ui_after.png)?;
      i += 1;
    }

    if let Some(pretest) = pretest {
      zip.start_file(PRETEST_FILE, options).map_err(|e| RepairError::MalformedRecord(e.to_string()))?;
      zip.write_all(pretest.as_bytes())?;
    }

    zip.finish().map_err(|e| RepairError::MalformedRecord(e.to_string()))?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Write as _;

  #[test]
  fn loads_from_directory() {
    let dir = std::env::temp_dir().join(format!("uidrift-archive-test-{}", std::process::id()));
    let ui_dir = dir.join("ui");
    fs::create_dir_all(&ui_dir).expect("create dirs");
    fs::write(dir.join("record.txt"), "{\"action\":\"BACK\"}\n").expect("write record");
    let archive = RecordedArchive::load(&dir, false).expect("loads");
    assert_eq!(archive.testcase.len(), 1);
    fs::remove_dir_all(&dir).ok();
  }

  #[test]
  fn round_trips_through_written_zip() {
    let dir = std::env::temp_dir();
    let zip_path = dir.join(format!("uidrift-archive-test-{}.zip", std::process::id()));
    let testcase = vec![Step::new(
      Event::new(crate::action::Action::Back, None, crate::event::Parameter::None),
      Ui::default(),
      Ui::default(),
    )];
    RecordedArchive::write(&zip_path, &testcase, Some("# pretest")).expect("writes");

    let file = fs::File::open(&zip_path).expect("open");
    let mut zip = zip::ZipArchive::new(file).expect("zip");
    let mut record = String::new();
    zip.by_name("record.txt").expect("record present").read_to_string(&mut record).expect("read");
    assert!(record.contains("BACK"));
    fs::remove_file(&zip_path).ok();
  }
}
