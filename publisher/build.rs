//! Embeds the commit and build time reported by `publisher version`

use std::path::PathBuf;
use std::process::Command;

use chrono::Utc;

/// Trimmed stdout of a successful git call
fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8(output.stdout).ok()?;
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn main() {
    let commit = git(&["rev-parse", "--short", "HEAD"]).unwrap_or_else(|| "unknown".to_string());
    println!("cargo:rustc-env=GIT_HASH={}", commit);
    println!(
        "cargo:rustc-env=BUILD_TIME={}",
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    );

    println!("cargo:rerun-if-changed=build.rs");

    // The git dir sits at the workspace root, not next to this crate
    if let Some(git_dir) = git(&["rev-parse", "--absolute-git-dir"]).map(PathBuf::from) {
        for tracked in ["HEAD", "index"] {
            println!("cargo:rerun-if-changed={}", git_dir.join(tracked).display());
        }
    }
}
