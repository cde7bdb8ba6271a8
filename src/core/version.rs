//! Build metadata generated by the build script

include!(concat!(env!("OUT_DIR"), "/version.rs"));

/// Provider API version from `[package.metadata]`, falling back to a stable default
pub fn api_version() -> u32 {
    PROVIDER_API_VERSION.parse().unwrap_or(20251016)
}

/// Build time string from the build script (UTC)
pub fn build_time() -> &'static str {
    BUILD_TIME
}

/// Short git hash captured by the build script
pub fn git_hash() -> &'static str {
    GIT_HASH
}

/// Crate version from Cargo
pub fn crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
