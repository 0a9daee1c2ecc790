//! Integration Test: Synchronous Stream Pipeline
//!
//! **Policy**: The byte decoder, frame splitter, event parser, reconciler and
//! history reducer are plain state machines. They never await and never
//! touch the runtime, so the conductor stays the only place that suspends.

use architectural_enforcement::{fail_on_violations, production_lines, rust_files};

const SYNC_SOURCES: &[&str] = &[
    "conductor/core/src/streaming",
    "conductor/core/src/reconciler.rs",
    "conductor/core/src/history.rs",
    "conductor/core/src/messages.rs",
];

const FORBIDDEN: &[&str] = &[".await", "async fn", "tokio::", "std::thread::"];

#[test]
fn test_pipeline_stages_are_synchronous() {
    let mut violations = Vec::new();

    for source in SYNC_SOURCES {
        for path in rust_files(source) {
            for line in production_lines(&path) {
                if let Some(pattern) = FORBIDDEN.iter().find(|p| line.code.contains(*p)) {
                    violations.push(format!(
                        "{}:{} - `{}`: {}",
                        path.display(),
                        line.number,
                        pattern,
                        line.raw
                    ));
                }
            }
        }
    }

    fail_on_violations(
        "CRITICAL: Async code found in the synchronous pipeline!",
        &violations,
        &[
            "Pipeline stages take bytes or events and return values.",
            "Awaiting belongs in conductor/core/src/conductor.rs.",
        ],
    );
}

#[test]
fn test_sources_found() {
    // Guards against the scan silently passing on a moved directory
    assert!(!rust_files("conductor/core/src/streaming").is_empty());
    assert!(!rust_files("conductor/core/src/reconciler.rs").is_empty());
}
