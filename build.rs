use chrono::Utc;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

const UNKNOWN: &str = "unknown";

fn main() {
    let out_dir = PathBuf::from(env::var_os("OUT_DIR").expect("OUT_DIR is set by cargo"));
    let manifest_dir = PathBuf::from(
        env::var_os("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR is set by cargo"),
    );

    let generated = format!(
        "pub const PROVIDER_API_VERSION: &str = \"{}\";\n\
         pub const BUILD_TIME: &str = \"{}\";\n\
         pub const GIT_HASH: &str = \"{}\";\n",
        provider_api_version(&manifest_dir.join("Cargo.toml")),
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC"),
        git_hash(),
    );
    fs::write(out_dir.join("version.rs"), generated).expect("write version.rs");

    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=Cargo.toml");
    println!("cargo:rerun-if-changed=.git/HEAD");
}

/// `[package.metadata] provider_api_version` from the manifest
fn provider_api_version(manifest: &Path) -> String {
    fs::read_to_string(manifest)
        .ok()
        .and_then(|contents| contents.parse::<toml::Table>().ok())
        .and_then(|manifest| {
            manifest
                .get("package")?
                .get("metadata")?
                .get("provider_api_version")?
                .as_integer()
        })
        .map(|version| version.to_string())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

fn git_hash() -> String {
    Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|hash| hash.trim().to_string())
        .filter(|hash| !hash.is_empty())
        .unwrap_or_else(|| UNKNOWN.to_string())
}
