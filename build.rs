use std::env;
use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=.git/HEAD");

    let commit = run_trimmed("git", &["rev-parse", "--short", "HEAD"])
        .unwrap_or_else(|| "unknown".to_string());
    let tree = match run_trimmed("git", &["status", "--porcelain"]) {
        Some(changes) if changes.is_empty() => "clean",
        Some(_) => "dirty",
        None => "unknown",
    };
    let built_at = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
    let profile = env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string());
    let rustc = run_trimmed("rustc", &["--version"]).unwrap_or_else(|| "unknown".to_string());

    emit("EXPENSE_TRACKER_BUILD_COMMIT", &commit);
    emit("EXPENSE_TRACKER_BUILD_TREE", tree);
    emit("EXPENSE_TRACKER_BUILD_TIMESTAMP", &built_at);
    emit("EXPENSE_TRACKER_BUILD_PROFILE", &profile);
    emit("EXPENSE_TRACKER_BUILD_RUSTC", &rustc);
}

fn emit(key: &str, value: &str) {
    println!("cargo:rustc-env={key}={value}");
}

/// Runs a command and returns its trimmed stdout when it exits successfully.
fn run_trimmed(program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program).args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8(output.stdout)
        .ok()
        .map(|text| text.trim().to_string())
}
