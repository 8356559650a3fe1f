// SPDX-License-Identifier: MPL-2.0

use std::process::Command;

fn main() {
    println!("cargo::rerun-if-changed=.git/HEAD");
    println!("cargo::rerun-if-changed=.git/refs/tags");
    println!("cargo::rerun-if-env-changed=CAMAPP_VERSION");

    // Packaging pipelines pin the version explicitly
    let version = std::env::var("CAMAPP_VERSION").unwrap_or_else(|_| describe());

    println!("cargo::rustc-env=GIT_VERSION={}", version);
}

/// `git describe` output reshaped to `<tag>-<hash>` or `<tag>-dirty-<hash>`
fn describe() -> String {
    let Some(described) = git(&["describe", "--tags", "--always", "--match", "v*"]) else {
        return format!(
            "{}-{}",
            env!("CARGO_PKG_VERSION"),
            git(&["rev-parse", "--short", "HEAD"]).unwrap_or_else(|| "unknown".to_string())
        );
    };

    let described = described.strip_prefix('v').unwrap_or(&described).to_string();
    let parts: Vec<&str> = described.rsplitn(3, '-').collect();

    match parts.as_slice() {
        [hash, _commits, base] => {
            format!("{}-dirty-{}", base, hash.strip_prefix('g').unwrap_or(hash))
        }
        _ => {
            let hash = git(&["rev-parse", "--short", "HEAD"]).unwrap_or_else(|| "unknown".into());
            format!("{}-{}", described, hash)
        }
    }
}

fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    output
        .status
        .success()
        .then(|| String::from_utf8_lossy(&output.stdout).trim().to_string())
}
