//! Integration Test: Sleep Prohibition
//!
//! **Policy**: Production code MUST NOT call sleep methods. The conductor
//! waits on the byte stream, the cancel signal or the update channel.

use architectural_enforcement::{fail_on_violations, production_lines, rust_files};

#[test]
fn test_no_sleep_in_production_code() {
    let mut violations = Vec::new();

    for dir in ["conductor/core/src", "conductor/cli/src"] {
        for path in rust_files(dir) {
            for line in production_lines(&path) {
                if line.code.contains("::sleep(") || line.code.contains(".sleep(") {
                    violations.push(format!("{}:{} - {}", path.display(), line.number, line.raw));
                }
            }
        }
    }

    fail_on_violations(
        "CRITICAL: Sleep calls found in production code!",
        &violations,
        &[
            "FORBIDDEN: sleep in polling loops or as synchronization.",
            "REQUIRED: wait on the stream, a watch channel or tokio::select!.",
        ],
    );
}
