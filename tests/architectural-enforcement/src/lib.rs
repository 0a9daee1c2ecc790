//! Architectural Enforcement Integration Tests
//!
//! Source scans that keep the workspace honest:
//! - The stream pipeline, reconciler and history stay synchronous
//! - No sleep() calls in production code
//! - No blocking I/O once the runtime is running
//!
//! The scans are line based. They see production code only: everything
//! from the first `#[cfg(test)]` line of a file onwards is skipped.

use std::fs;
use std::path::{Path, PathBuf};

/// Workspace root, resolved from this crate's manifest
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
}

/// All `.rs` files under `dir`, relative to the workspace root
pub fn rust_files(dir: &str) -> Vec<PathBuf> {
    let path = workspace_root().join(dir);
    if !path.exists() {
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(path)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("rs"))
        .map(|e| e.into_path())
        .collect();
    files.sort();
    files
}

/// A production line: number (1-based) and the code before any `//`
#[derive(Debug, Clone)]
pub struct SourceLine {
    pub number: usize,
    pub code: String,
    pub raw: String,
}

/// Production lines of a file, comments stripped
pub fn production_lines(path: &Path) -> Vec<SourceLine> {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(_) => return Vec::new(),
    };

    content
        .lines()
        .enumerate()
        .take_while(|(_, line)| !line.trim_start().starts_with("#[cfg(test)]"))
        .map(|(idx, line)| SourceLine {
            number: idx + 1,
            code: line.split("//").next().unwrap_or(line).to_string(),
            raw: line.trim().to_string(),
        })
        .collect()
}

/// Report violations and fail the calling test
pub fn fail_on_violations(title: &str, violations: &[String], guidance: &[&str]) {
    if violations.is_empty() {
        return;
    }

    eprintln!("\n❌ {title}\n");
    for violation in violations {
        eprintln!("  ❌ {violation}");
    }
    eprintln!();
    for line in guidance {
        eprintln!("  {line}");
    }

    panic!(
        "\nFound {} violation(s) in production code.\nFix these before merging!",
        violations.len()
    );
}
