// build.rs - Stamp `td --version` with the source revision and target.
//
//   TD_REVISION : $TD_REVISION when packagers set it, else the short HEAD
//                 commit, else "unknown"
//   TD_TARGET   : target triple the binary was built for

use std::env;
use std::process::Command;

fn main() {
    let revision = env::var("TD_REVISION")
        .ok()
        .filter(|r| !r.trim().is_empty())
        .or_else(head_commit)
        .unwrap_or_else(|| "unknown".to_string());
    let target = env::var("TARGET").unwrap_or_else(|_| "unknown".to_string());

    println!("cargo:rustc-env=TD_REVISION={}", revision.trim());
    println!("cargo:rustc-env=TD_TARGET={}", target);

    println!("cargo:rerun-if-env-changed=TD_REVISION");
    println!("cargo:rerun-if-changed=../../.git/HEAD");
}

fn head_commit() -> Option<String> {
    let out = Command::new("git")
        .args(["rev-parse", "--short=10", "HEAD"])
        .output()
        .ok()?;
    out.status
        .success()
        .then(|| String::from_utf8_lossy(&out.stdout).trim().to_string())
}
