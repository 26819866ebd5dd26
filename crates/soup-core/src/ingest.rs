//! Markdown puzzle files.
//!
//! A puzzle file carries its surface under a `### 汤面` heading and its truth
//! under `### 汤底`. A section runs until the next `###` heading or the end
//! of the file. The title is the file stem.

use std::path::Path;

use crate::puzzle::NewPuzzle;

const SURFACE_HEADING: &str = "汤面";
const TRUTH_HEADING: &str = "汤底";

/// Stored as the truth when a file has no truth section.
pub const MISSING_TRUTH: &str = "无答案";

fn section(text: &str, heading: &str) -> Option<String> {
  let mut lines = text.lines();
  lines.find(|line| {
    line
      .trim_start()
      .strip_prefix("###")
      .is_some_and(|rest| rest.trim() == heading)
  })?;
  let body: Vec<&str> = lines
    .take_while(|line| !line.trim_start().starts_with("###"))
    .collect();
  Some(body.join("\n").trim().to_owned())
}

/// Parse one puzzle file. Returns `None` when the file has no surface.
pub fn parse_markdown(file_name: &str, text: &str) -> Option<NewPuzzle> {
  let surface = section(text, SURFACE_HEADING)?;
  let truth = section(text, TRUTH_HEADING)
    .filter(|t| !t.is_empty())
    .unwrap_or_else(|| MISSING_TRUTH.to_owned());
  let title = Path::new(file_name)
    .file_stem()
    .map(|stem| stem.to_string_lossy().into_owned())
    .unwrap_or_else(|| file_name.to_owned());

  Some(NewPuzzle { title, surface, truth, source_file: file_name.to_owned() })
}
