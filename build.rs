use std::process::Command;

/// Exposes `CADENCE_BUILD_VERSION` to the crate: an explicit `CADENCE_VERSION`
/// at build time, else `git describe`, else the package version.
fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs");
    println!("cargo:rerun-if-env-changed=CADENCE_VERSION");

    let version = std::env::var("CADENCE_VERSION")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .or_else(git_version)
        .unwrap_or_else(|| {
            std::env::var("CARGO_PKG_VERSION").unwrap_or_else(|_| "unknown".to_string())
        });

    println!("cargo:rustc-env=CADENCE_BUILD_VERSION={version}");
}

fn git_version() -> Option<String> {
    let output = Command::new("git")
        .args(["describe", "--always", "--dirty", "--tags", "--match", "v[0-9]*"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }

    let raw = String::from_utf8(output.stdout).ok()?;
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    // v1.2.3-N-gHASH -> 1.2.3-N-gHASH; a bare hash gets a 0.0.0 prefix
    Some(match raw.strip_prefix('v') {
        Some(tagged) => tagged.to_string(),
        None => format!("0.0.0-g{raw}"),
    })
}
