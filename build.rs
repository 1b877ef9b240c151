use std::env;
use std::process::Command;

fn main() {
    set_build_info();

    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=Cargo.toml");
}

fn set_build_info() {
    // Get build timestamp
    let build_time = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
    println!("cargo:rustc-env=BUILD_TIME={}", build_time);

    let version = env::var("CARGO_PKG_VERSION").unwrap_or_else(|_| "unknown".to_string());

    // Get git commit hash if available
    let commit = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .map(|output| String::from_utf8_lossy(&output.stdout).trim().to_string());

    // Full version string reported by --version
    match commit {
        Some(ref commit) if !commit.is_empty() => {
            println!("cargo:rustc-env=GIT_COMMIT={}", commit);
            println!("cargo:rustc-env=BUILD_VERSION={} ({})", version, commit);
        }
        _ => {
            println!("cargo:rustc-env=BUILD_VERSION={}", version);
        }
    }
}
