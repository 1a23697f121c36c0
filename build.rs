//! Build script for the pantry manager
//!
//! Bumps a persistent build counter and embeds it with the build time.

use std::fs;
use std::path::Path;

const BUILD_NUMBER_FILE: &str = "build_number.txt";

fn read_build_number(path: &Path) -> u64 {
    fs::read_to_string(path)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(0)
}

fn main() {
    println!("cargo:rerun-if-changed=src");

    let path = Path::new(BUILD_NUMBER_FILE);
    let build_number = read_build_number(path) + 1;

    // A read-only checkout still builds, just without a persisted counter
    if let Err(e) = fs::write(path, build_number.to_string()) {
        println!("cargo:warning=Could not persist {}: {}", BUILD_NUMBER_FILE, e);
    }

    let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();

    println!("cargo:rustc-env=PANTRY_BUILD_NUMBER={}", build_number);
    println!("cargo:rustc-env=PANTRY_BUILD_TIMESTAMP={}", timestamp);
    println!("cargo:warning=Pantry build #{} at {}", build_number, timestamp);
}
