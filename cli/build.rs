// Build script that records the Git commit, branch and build time.
// The values are exposed to the binary as GIT_COMMIT_HASH, GIT_BRANCH and
// BUILD_DATE for the `--version` output. Outside a Git checkout (source
// tarballs, containers) STRATA_GIT_COMMIT / STRATA_GIT_BRANCH are used instead.

use std::env;
use std::process::Command;

fn main() {
    let commit_hash = git(&["rev-parse", "--short", "HEAD"])
        .or_else(|| env::var("STRATA_GIT_COMMIT").ok())
        .unwrap_or_else(|| "unknown".to_string());

    let branch = git(&["rev-parse", "--abbrev-ref", "HEAD"])
        .or_else(|| env::var("STRATA_GIT_BRANCH").ok())
        .unwrap_or_else(|| "unknown".to_string());

    let build_date = chrono::Utc::now()
        .format("%Y-%m-%d %H:%M:%S UTC")
        .to_string();

    println!("cargo:rustc-env=GIT_COMMIT_HASH={}", commit_hash);
    println!("cargo:rustc-env=GIT_BRANCH={}", branch);
    println!("cargo:rustc-env=BUILD_DATE={}", build_date);

    println!("cargo:rerun-if-changed=../.git/HEAD");
    println!("cargo:rerun-if-changed=../.git/refs/heads/");
    println!("cargo:rerun-if-env-changed=STRATA_GIT_COMMIT");
    println!("cargo:rerun-if-env-changed=STRATA_GIT_BRANCH");
}

/// Trimmed stdout of a successful `git` invocation
fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8(output.stdout)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
