use std::env;
use std::process::Command;

/// Exposes build metadata to `utils::build_info` as `MEDIAID_BUILD_*` variables.
fn main() {
    for path in ["build.rs", ".git/HEAD", ".git/refs"] {
        println!("cargo:rerun-if-changed={path}");
    }

    let hash = stdout_of("git", &["rev-parse", "--short", "HEAD"]);
    let status = stdout_of("git", &["status", "--porcelain"]).map(|changes| {
        if changes.is_empty() {
            "clean".to_string()
        } else {
            "dirty".to_string()
        }
    });
    let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);

    let entries = [
        ("HASH", hash),
        ("STATUS", status),
        ("TIMESTAMP", Some(timestamp)),
        ("TARGET", env::var("TARGET").ok()),
        ("PROFILE", env::var("PROFILE").ok()),
        ("RUSTC", stdout_of("rustc", &["--version"])),
    ];
    for (key, value) in entries {
        let value = value.unwrap_or_else(|| "unknown".to_string());
        println!("cargo:rustc-env=MEDIAID_BUILD_{key}={value}");
    }
}

/// Trimmed stdout of a successful command.
fn stdout_of(program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program).args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8(output.stdout)
        .ok()
        .map(|text| text.trim().to_string())
}
