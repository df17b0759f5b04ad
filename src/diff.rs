// Unified diff parsing for change-scoped extraction

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::index::Symbol;

static HUNK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^@@ -\d+(?:,\d+)? \+(\d+)(?:,(\d+))? @@").unwrap());

/// Inclusive 1-based line span in the new version of a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRange {
    pub start: usize,
    pub end: usize,
}

impl LineRange {
    pub fn overlaps(&self, start: usize, end: usize) -> bool {
        self.start <= end && start <= self.end
    }
}

/// Changed regions of one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDiff {
    pub path: String,
    pub hunks: Vec<LineRange>,
}

/// Parse `git diff` style output into per-file hunk ranges.
///
/// Deleted files (`+++ /dev/null`) are dropped. Pure-deletion hunks keep the
/// line they were removed at so the surrounding symbol still counts as
/// touched.
pub fn parse_unified_diff(text: &str) -> Vec<FileDiff> {
    let mut files: Vec<FileDiff> = Vec::new();
    let mut current: Option<FileDiff> = None;

    for line in text.lines() {
        if let Some(target) = line.strip_prefix("+++ ") {
            files.extend(current.take());
            let target = target.split('\t').next().unwrap_or(target).trim();
            if target == "/dev/null" {
                continue;
            }
            let path = target.strip_prefix("b/").unwrap_or(target);
            current = Some(FileDiff {
                path: path.to_string(),
                hunks: Vec::new(),
            });
        } else if let Some(caps) = HUNK_RE.captures(line) {
            let Some(file) = current.as_mut() else {
                continue;
            };
            let start: usize = caps.get(1).and_then(|m| m.as_str().parse().ok()).unwrap_or(1);
            let count: usize = caps.get(2).and_then(|m| m.as_str().parse().ok()).unwrap_or(1);
            let start = start.max(1);
            file.hunks.push(LineRange {
                start,
                end: start + count.saturating_sub(1),
            });
        }
    }
    files.extend(current);

    files
}

/// Symbols whose line span intersects any of `ranges`
pub fn symbols_touching<'a>(symbols: &'a [Symbol], ranges: &[LineRange]) -> Vec<&'a Symbol> {
    symbols
        .iter()
        .filter(|s| ranges.iter().any(|r| r.overlaps(s.start_line, s.end_line)))
        .collect()
}
