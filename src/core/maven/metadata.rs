use std::cmp::Ordering;

use quick_xml::de::from_str;
use serde::Deserialize;

use crate::core::error::{LauncherError, LauncherResult};

/// Minimal `maven-metadata.xml` model – only the version listing.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MavenMetadata {
    #[serde(default)]
    pub group_id: Option<String>,
    #[serde(default)]
    pub artifact_id: Option<String>,
    #[serde(default)]
    pub versioning: Option<MavenVersioning>,
}

#[derive(Debug, Deserialize, Default)]
pub struct MavenVersioning {
    #[serde(default)]
    pub latest: Option<String>,
    #[serde(default)]
    pub release: Option<String>,
    #[serde(default)]
    pub versions: Option<MavenVersions>,
}

#[derive(Debug, Deserialize, Default)]
pub struct MavenVersions {
    #[serde(default, rename = "version")]
    pub items: Vec<String>,
}

impl MavenMetadata {
    pub fn parse(xml: &str) -> LauncherResult<Self> {
        from_str(xml).map_err(|e| LauncherError::InvalidDocument {
            source_name: "maven-metadata.xml".into(),
            reason: e.to_string(),
        })
    }

    /// All published versions, newest first.
    pub fn versions_newest_first(&self) -> Vec<String> {
        let mut versions: Vec<String> = self
            .versioning
            .as_ref()
            .and_then(|v| v.versions.as_ref())
            .map(|v| v.items.iter().map(|s| s.trim().to_string()).collect())
            .unwrap_or_default();
        versions.retain(|v| !v.is_empty());
        versions.sort_by(|a, b| compare_versions(b, a));
        versions.dedup();
        versions
    }
}

fn parse_numeric_version_parts(raw: &str) -> Vec<u32> {
    raw.split(|c: char| !c.is_ascii_digit())
        .filter(|segment| !segment.is_empty())
        .filter_map(|segment| segment.parse::<u32>().ok())
        .collect()
}

/// Numeric-aware version ordering (`1.20.10` > `1.20.9`).
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let a_parts = parse_numeric_version_parts(a);
    let b_parts = parse_numeric_version_parts(b);

    let max_len = a_parts.len().max(b_parts.len());
    for idx in 0..max_len {
        let a_val = a_parts.get(idx).copied().unwrap_or(0);
        let b_val = b_parts.get(idx).copied().unwrap_or(0);
        match a_val.cmp(&b_val) {
            Ordering::Equal => continue,
            non_eq => return non_eq,
        }
    }

    // Deterministic tiebreaker for versions with identical numeric parts.
    a.cmp(b)
}
