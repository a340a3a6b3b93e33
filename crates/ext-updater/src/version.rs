//! Version comparison policy.
//!
//! Versions are ordered by semantic-version precedence: numeric major, minor
//! and patch first, then pre-release identifiers (a pre-release sorts before
//! its release), then build metadata. This ordering is the only gate for
//! "new version available"; tags on a descriptor never take part in it.
//!
//! Parsing is slightly more forgiving than strict SemVer because extension
//! manifests and registries in the wild publish `v1.2.3` or `1.2`:
//! - a leading `v`/`V` is ignored
//! - missing minor/patch components are treated as `0`

use std::cmp::Ordering;

use semver::Version;

use crate::error::UpdateError;

/// Parse a version string with the lenient rules described above.
pub fn parse_version(input: &str) -> Result<Version, UpdateError> {
    let trimmed = input.trim();
    let trimmed = trimmed
        .strip_prefix('v')
        .or_else(|| trimmed.strip_prefix('V'))
        .unwrap_or(trimmed);

    if trimmed.is_empty() {
        return Err(UpdateError::Version(format!("empty version string: {:?}", input)));
    }

    let split_at = trimmed.find(['-', '+']).unwrap_or(trimmed.len());
    let (core, suffix) = trimmed.split_at(split_at);

    let parts = core.split('.').count();
    let normalized = match parts {
        1 => format!("{}.0.0{}", core, suffix),
        2 => format!("{}.0{}", core, suffix),
        _ => trimmed.to_string(),
    };

    Version::parse(&normalized)
        .map_err(|e| UpdateError::Version(format!("{:?}: {}", input, e)))
}

/// Compare two version strings.
///
/// Returns `Ordering::Greater` when `latest` is strictly newer than
/// `installed`.
pub fn compare(latest: &str, installed: &str) -> Result<Ordering, UpdateError> {
    let latest = parse_version(latest)?;
    let installed = parse_version(installed)?;
    Ok(latest.cmp(&installed))
}

/// Whether `latest` is strictly newer than `installed`.
pub fn is_newer(latest: &str, installed: &str) -> Result<bool, UpdateError> {
    Ok(compare(latest, installed)? == Ordering::Greater)
}
