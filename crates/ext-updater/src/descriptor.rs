//! Extension identity and registry version descriptors.
//!
//! `ExtensionIdentity` is the read-only snapshot of the installed extension
//! taken when the orchestrator is built. `VersionDescriptor` is what a
//! registry backend reports as the newest release; it is produced fresh on
//! every query and never persisted.

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use url::Url;

use crate::error::UpdateError;
use crate::version::parse_version;

/// Identity of the installed extension, as read from its manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionIdentity {
    /// Package name (`name` in the manifest), used for artifact file names
    pub name: String,
    /// Human readable name (`displayName` in the manifest)
    pub display_name: String,
    /// Currently installed version (`version` in the manifest)
    pub installed_version: String,
}

/// The subset of an extension `package.json` this crate reads.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExtensionManifest {
    name: String,
    #[serde(default)]
    display_name: Option<String>,
    version: String,
}

impl ExtensionIdentity {
    pub fn new(
        name: impl Into<String>,
        display_name: impl Into<String>,
        installed_version: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
            installed_version: installed_version.into(),
        }
    }

    /// Build an identity from the JSON text of an extension manifest.
    ///
    /// `displayName` falls back to `name` when absent.
    pub fn from_manifest_json(json: &str) -> Result<Self, UpdateError> {
        let manifest: ExtensionManifest = serde_json::from_str(json)?;
        parse_version(&manifest.version)?;

        let display_name = manifest
            .display_name
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| manifest.name.clone());

        Ok(Self {
            name: manifest.name,
            display_name,
            installed_version: manifest.version,
        })
    }

    /// Read an identity from a `package.json` on disk.
    pub fn from_manifest_file(path: &Path) -> Result<Self, UpdateError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_manifest_json(&content)
    }
}

/// A tag as found in a registry record.
///
/// Some registries list tags as bare strings, others as objects with a
/// `name` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagEntry {
    Name(String),
    Object { name: String },
}

impl TagEntry {
    pub fn name(&self) -> &str {
        match self {
            Self::Name(name) | Self::Object { name } => name,
        }
    }
}

/// One package record of a registry listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRecord {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<TagEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
}

impl PackageRecord {
    pub fn required_name(&self) -> Result<&str, UpdateError> {
        self.name
            .as_deref()
            .filter(|n| !n.is_empty())
            .ok_or_else(|| UpdateError::Registry("package record has no name".to_string()))
    }

    pub fn required_version(&self) -> Result<&str, UpdateError> {
        self.version
            .as_deref()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| UpdateError::Registry("package record has no version".to_string()))
    }
}

/// Newest release as reported by a registry backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionDescriptor {
    version: String,
    published_at: i64,
    download_location: Url,
    tags: BTreeSet<String>,
}

impl VersionDescriptor {
    pub fn new(
        version: impl Into<String>,
        published_at: i64,
        download_location: Url,
        tags: BTreeSet<String>,
    ) -> Self {
        Self {
            version: version.into(),
            published_at,
            download_location,
            tags,
        }
    }

    /// Build a descriptor from a registry record and its resolved download URL.
    ///
    /// A record whose version does not parse is a malformed response. An
    /// unparsable `created_at` is tolerated and becomes epoch zero.
    pub fn from_record(record: &PackageRecord, download_location: Url) -> Result<Self, UpdateError> {
        let version = record.required_version()?;
        parse_version(version).map_err(|e| {
            UpdateError::Registry(format!("package record has an invalid version: {}", e))
        })?;

        let published_at = match record.created_at.as_deref() {
            Some(raw) => parse_timestamp(raw).unwrap_or_else(|| {
                warn!("Unparsable publication time {:?}, using epoch", raw);
                0
            }),
            None => 0,
        };

        let tags = record.tags.iter().map(|t| t.name().to_string()).collect();

        Ok(Self::new(version, published_at, download_location, tags))
    }

    /// Render this descriptor back into a registry record.
    pub fn to_record(&self, name: &str) -> PackageRecord {
        PackageRecord {
            name: Some(name.to_string()),
            version: Some(self.version.clone()),
            created_at: Some(self.published_at_rfc3339()),
            tags: self.tags.iter().cloned().map(TagEntry::Name).collect(),
            download_url: Some(self.download_location.to_string()),
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Publication time in milliseconds since the Unix epoch (0 if unknown).
    pub fn published_at(&self) -> i64 {
        self.published_at
    }

    pub fn download_location(&self) -> &Url {
        &self.download_location
    }

    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    pub fn published_at_rfc3339(&self) -> String {
        Utc.timestamp_millis_opt(self.published_at)
            .single()
            .unwrap_or_default()
            .to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

impl fmt::Display for VersionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (published {})", self.version, self.published_at_rfc3339())?;
        if !self.tags.is_empty() {
            let tags: Vec<&str> = self.tags.iter().map(String::as_str).collect();
            write!(f, " [{}]", tags.join(", "))?;
        }
        Ok(())
    }
}

/// Parse a registry timestamp into epoch milliseconds.
///
/// Accepts RFC 3339 and naive `YYYY-MM-DD[T ]HH:MM:SS[.fff]` (taken as UTC).
pub fn parse_timestamp(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.timestamp_millis());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc().timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(json: serde_json::Value) -> PackageRecord {
        serde_json::from_value(json).unwrap()
    }

    fn url() -> Url {
        Url::parse("https://registry.example.com/pkg/my-ext/1.2.0/my-ext.vsix").unwrap()
    }

    #[test]
    fn test_identity_from_manifest() {
        let identity = ExtensionIdentity::from_manifest_json(
            r#"{"name":"ade-source-control","displayName":"ADE Source Control","version":"0.0.1","publisher":"x"}"#,
        )
        .unwrap();
        assert_eq!(identity.name, "ade-source-control");
        assert_eq!(identity.display_name, "ADE Source Control");
        assert_eq!(identity.installed_version, "0.0.1");
    }

    #[test]
    fn test_identity_display_name_fallback() {
        let identity =
            ExtensionIdentity::from_manifest_json(r#"{"name":"my-ext","version":"1.0.0"}"#).unwrap();
        assert_eq!(identity.display_name, "my-ext");
    }

    #[test]
    fn test_identity_rejects_bad_version() {
        let result = ExtensionIdentity::from_manifest_json(r#"{"name":"my-ext","version":"abc"}"#);
        assert!(matches!(result, Err(UpdateError::Version(_))));
    }

    #[test]
    fn test_descriptor_from_record() {
        let rec = record(serde_json::json!({
            "name": "my-ext",
            "version": "1.2.0",
            "created_at": "2023-05-10T10:00:00.123Z",
            "tags": ["beta", {"name": "nightly"}]
        }));
        let descriptor = VersionDescriptor::from_record(&rec, url()).unwrap();
        assert_eq!(descriptor.version(), "1.2.0");
        assert_eq!(descriptor.published_at(), 1_683_712_800_123);
        assert_eq!(descriptor.tags().len(), 2);
        assert!(descriptor.tags().contains("nightly"));
    }

    #[test]
    fn test_descriptor_lenient_timestamp() {
        let rec = record(serde_json::json!({
            "name": "my-ext",
            "version": "1.2.0",
            "created_at": "yesterday-ish"
        }));
        let descriptor = VersionDescriptor::from_record(&rec, url()).unwrap();
        assert_eq!(descriptor.published_at(), 0);
        assert_eq!(descriptor.published_at_rfc3339(), "1970-01-01T00:00:00.000Z");
    }

    #[test]
    fn test_descriptor_missing_version() {
        let rec = record(serde_json::json!({ "name": "my-ext" }));
        let result = VersionDescriptor::from_record(&rec, url());
        assert!(matches!(result, Err(UpdateError::Registry(_))));
    }

    #[test]
    fn test_descriptor_invalid_version() {
        let rec = record(serde_json::json!({ "name": "my-ext", "version": "latest" }));
        let result = VersionDescriptor::from_record(&rec, url());
        assert!(matches!(result, Err(UpdateError::Registry(_))));
    }

    #[test]
    fn test_descriptor_to_record() {
        let rec = record(serde_json::json!({
            "name": "my-ext",
            "version": "1.2.0",
            "created_at": "2023-05-10T12:00:00+02:00",
            "tags": ["beta"]
        }));
        let descriptor = VersionDescriptor::from_record(&rec, url()).unwrap();
        let rendered = descriptor.to_record("my-ext");

        assert_eq!(rendered.version.as_deref(), Some("1.2.0"));
        assert_eq!(rendered.created_at.as_deref(), Some("2023-05-10T10:00:00.000Z"));
        assert_eq!(rendered.tags, vec![TagEntry::Name("beta".to_string())]);
        assert_eq!(rendered.download_url.as_deref(), Some(url().as_str()));
    }

    #[test]
    fn test_display() {
        let mut tags = BTreeSet::new();
        tags.insert("beta".to_string());
        let descriptor = VersionDescriptor::new("2.0.0", 0, url(), tags);
        assert_eq!(
            descriptor.to_string(),
            "2.0.0 (published 1970-01-01T00:00:00.000Z) [beta]"
        );
    }

    #[test]
    fn test_parse_timestamp_forms() {
        assert_eq!(parse_timestamp("1970-01-01T00:00:01Z"), Some(1000));
        assert_eq!(parse_timestamp("1970-01-01 00:00:02"), Some(2000));
        assert_eq!(parse_timestamp("1970-01-01T00:00:00.5"), Some(500));
        assert_eq!(parse_timestamp("garbage"), None);
    }
}
