//! Build provenance: content checksum, widget version and the
//! comment block stamped onto every artifact.

use std::path::Path;

use chrono::{SecondsFormat, Utc};
use serde::Deserialize;
use sha2::{Digest, Sha256};

/// Version used when no readable `package.json` is found.
const UNKNOWN_VERSION: &str = "N/A";

/// Metadata recorded in the provenance comment.
#[derive(Debug, Clone)]
pub struct BuildMetadata {
    /// Widget version from `package.json`, or `"N/A"`.
    pub version: String,
    /// ISO-8601 UTC timestamp of the build.
    pub build_date: String,
    /// Hex digest of the artifact content before stamping.
    pub checksum: String,
}

/// Hex digest of the artifact content. Computed before the
/// provenance comment is prepended, so rebuilding unchanged inputs
/// yields the same value no matter when the build runs.
pub fn checksum(content: &str) -> String {
    let digest = Sha256::digest(content.as_bytes());
    format!("{:x}", digest)
}

#[derive(Debug, Deserialize)]
struct PackageDescriptor {
    version: Option<String>,
}

/// Read the widget version from a `package.json` next to the build
/// config. Missing or unreadable descriptors degrade to `"N/A"`;
/// they never fail the build.
pub fn read_version(widget_dir: &Path) -> String {
    let path = widget_dir.join("package.json");
    if !path.is_file() {
        log::warn!(
            "no package.json in {}, stamping version {}",
            widget_dir.display(),
            UNKNOWN_VERSION
        );
        return UNKNOWN_VERSION.to_string();
    }

    let parsed = std::fs::read_to_string(&path)
        .map_err(anyhow::Error::from)
        .and_then(|text| {
            serde_json::from_str::<PackageDescriptor>(&text)
                .map_err(anyhow::Error::from)
        });
    match parsed {
        Ok(package) => package
            .version
            .unwrap_or_else(|| UNKNOWN_VERSION.to_string()),
        Err(e) => {
            log::warn!("could not read version from {}: {}", path.display(), e);
            UNKNOWN_VERSION.to_string()
        }
    }
}

/// Current UTC time in the ISO-8601 form used by the stamp.
pub fn build_date_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Render the provenance comment that heads the artifact.
pub fn provenance_comment(meta: &BuildMetadata) -> String {
    format!(
        "<!--\n  Build Version: {}\n  Build Date: {}\n  Checksum (sha256): {}\n-->",
        meta.version, meta.build_date, meta.checksum
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn checksum_is_stable() {
        assert_eq!(checksum("abc"), checksum("abc"));
        assert_ne!(checksum("abc"), checksum("abd"));
    }

    #[test]
    fn checksum_matches_known_digest() {
        assert_eq!(
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855",
            checksum("")
        );
    }

    #[test]
    fn comment_layout() {
        let meta = BuildMetadata {
            version: "1.0.0".to_string(),
            build_date: "2026-01-02T03:04:05.678Z".to_string(),
            checksum: "cafebabe".to_string(),
        };
        let comment = provenance_comment(&meta);
        assert_eq!(
            "<!--\n  Build Version: 1.0.0\n  Build Date: 2026-01-02T03:04:05.678Z\n  Checksum (sha256): cafebabe\n-->",
            comment
        );
    }

    #[test]
    fn missing_package_json_degrades_to_unknown() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!("N/A", read_version(dir.path()));
    }

    #[test]
    fn malformed_package_json_degrades_to_unknown() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("package.json"), "{ nope").unwrap();
        assert_eq!("N/A", read_version(dir.path()));
    }

    #[test]
    fn version_comes_from_package_json() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("package.json"),
            r#"{"name": "widget", "version": "2.4.6"}"#,
        )
        .unwrap();
        assert_eq!("2.4.6", read_version(dir.path()));
    }

    #[test]
    fn versionless_package_json_degrades_to_unknown() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("package.json"), r#"{"name": "widget"}"#)
            .unwrap();
        assert_eq!("N/A", read_version(dir.path()));
    }

    #[test]
    fn build_date_is_utc_iso8601() {
        let date = build_date_now();
        assert!(date.ends_with('Z'));
        assert!(date.contains('T'));
    }
}
