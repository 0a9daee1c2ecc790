//! Integration Test: Blocking I/O Prohibition
//!
//! **Policy**: Once the runtime is running, I/O goes through tokio or reqwest.
//! **Exception**: Configuration is read synchronously before any session
//! starts, so `conductor/core/src/config` may use `std::fs`.

use architectural_enforcement::{fail_on_violations, production_lines, rust_files};

const CONFIG_DIR: &str = "conductor/core/src/config";

#[test]
fn test_no_blocking_io_in_production_code() {
    let mut violations = Vec::new();

    for dir in ["conductor/core/src", "conductor/cli/src"] {
        for path in rust_files(dir) {
            let in_config = path.to_string_lossy().contains(CONFIG_DIR);

            for line in production_lines(&path) {
                let kind = if line.code.contains("std::fs") && !in_config {
                    Some("Blocking file I/O")
                } else if line.code.contains("std::net") {
                    Some("Blocking network I/O")
                } else if line.code.contains("std::process::Command") {
                    Some("Blocking process I/O")
                } else if line.code.contains("reqwest::blocking") {
                    Some("Blocking HTTP client")
                } else if line.code.contains("std::io::stdin()")
                    || line.code.contains("std::io::stdout()")
                {
                    Some("Blocking stdin/stdout")
                } else {
                    None
                };

                if let Some(kind) = kind {
                    violations.push(format!(
                        "{}:{} - {}: {}",
                        path.display(),
                        line.number,
                        kind,
                        line.raw
                    ));
                }
            }
        }
    }

    fail_on_violations(
        "CRITICAL: Blocking I/O calls found in production code!",
        &violations,
        &[
            "REQUIRED async I/O:",
            "  - reqwest::Client with .await",
            "  - tokio::io::stdin(), tokio::io::stdout()",
        ],
    );
}
