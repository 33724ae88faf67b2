//! Build script for squad-notifier: embeds a human-readable version string.
//!
//! The string is `{CARGO_PKG_VERSION} ({git}) {rustc}` where `{git}` is the
//! output of `git describe --tags --always --dirty`. When the repository has
//! no tags, or git is unavailable, a pseudo-version
//! `v{CARGO_PKG_VERSION}-{timestamp}-{commit}` is used instead.

use std::process::Command;

use chrono::Utc;

fn main() {
    ["src", "build.rs", "Cargo.toml"]
        .iter()
        .for_each(|path| println!("cargo:rerun-if-changed={path}"));

    println!(
        "cargo:rustc-env=BUILD_INFO_HUMAN={}",
        human_readable_version()
    );
}

fn run(program: &str, args: &[&str]) -> Option<String> {
    Command::new(program)
        .args(args)
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn pseudo_version() -> String {
    let commit = run("git", &["rev-parse", "--short=12", "HEAD"])
        .unwrap_or_else(|| "unknown".to_string());
    let timestamp = Utc::now().format("%Y%m%d%H%M%S");
    format!("v{}-{timestamp}-{commit}", env!("CARGO_PKG_VERSION"))
}

fn git_version() -> String {
    match run("git", &["describe", "--tags", "--always", "--dirty"]) {
        // A bare hash means there are no tags to describe from.
        Some(desc) if desc.contains('v') || desc.contains("-g") => desc,
        _ => pseudo_version(),
    }
}

fn human_readable_version() -> String {
    [
        Some(env!("CARGO_PKG_VERSION").to_string()),
        Some(format!("({})", git_version())),
        run("rustc", &["--version"]),
    ]
    .into_iter()
    .flatten()
    .collect::<Vec<_>>()
    .join(" ")
}
