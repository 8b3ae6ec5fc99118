//! Embeds build identification for the startup banner of kpa-adapter
//!
//! Exposes `GIT_HASH`, `BUILD_TIMESTAMP` (UTC) and `BUILD_PROFILE` to the
//! crate through `env!`.

use std::path::Path;
use std::process::Command;

fn main() {
    emit("GIT_HASH", &git_hash().unwrap_or_else(|| "unknown".into()));
    emit("BUILD_TIMESTAMP", &chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string());
    emit(
        "BUILD_PROFILE",
        &std::env::var("PROFILE").unwrap_or_else(|_| "unknown".into()),
    );

    println!("cargo:rerun-if-changed=build.rs");
    watch_git_head();
}

fn emit(key: &str, value: &str) {
    println!("cargo:rustc-env={}={}", key, value);
}

/// Short commit hash of the checkout, if built from a git work tree
fn git_hash() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short=8", "HEAD"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let hash = String::from_utf8(output.stdout).ok()?;
    Some(hash.trim().to_string()).filter(|h| !h.is_empty())
}

/// Rebuild when HEAD moves; the workspace root holds `.git`
fn watch_git_head() {
    let head = Path::new("../.git/HEAD");
    if head.exists() {
        println!("cargo:rerun-if-changed={}", head.display());
    }
    let refs = Path::new("../.git/refs/heads");
    if refs.exists() {
        println!("cargo:rerun-if-changed={}", refs.display());
    }
}
