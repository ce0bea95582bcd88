//! File and environment-variable sinks for the resolved version.

use std::env;
use std::fs;

use crate::error::{Result, TrackRepoError};

/// Writes the literal version string to the configured path.
///
/// Any existing content is overwritten; no trailing newline is added so the
/// file can be consumed verbatim by later pipeline steps.
pub fn write_release_file(path: &str, version: &str) -> Result<()> {
    fs::write(path, version)
        .map_err(|e| TrackRepoError::publish(format!("Could not write file \"{}\": {}", path, e)))
}

/// Exports the resolved version as a process environment variable.
///
/// Visible to the remainder of this process and its children only; nothing
/// persists beyond process exit.
pub fn export_environment(name: &str, version: &str) {
    env::set_var(name, version);
}
