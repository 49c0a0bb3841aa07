use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::core::error::{LauncherError, LauncherResult};

/// Represents a fully parsed Maven coordinate.
///
/// Supported formats:
///   `groupId:artifactId:version`
///   `groupId:artifactId:version:classifier`
///   `groupId:artifactId:packaging:classifier:version` (legacy Mojang form)
///   any of the above suffixed with `@extension`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct MavenArtifact {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    pub classifier: Option<String>,
    /// File extension / packaging type. Defaults to `"jar"`.
    pub packaging: String,
}

impl MavenArtifact {
    /// Parse a Maven coordinate string.
    ///
    /// # Examples
    /// ```
    /// use interface_installer::core::maven::MavenArtifact;
    ///
    /// let a = MavenArtifact::parse("net.sf.jopt-simple:jopt-simple:5.0.4").unwrap();
    /// assert_eq!(a.group_id, "net.sf.jopt-simple");
    /// ```
    pub fn parse(coord: &str) -> LauncherResult<Self> {
        let coord = coord.trim();
        let invalid = || LauncherError::InvalidMavenCoordinate(coord.to_string());

        // Split off @extension first; it wins over any positional packaging.
        let (coord_part, extension_override) = match coord.rfind('@') {
            Some(idx) => (&coord[..idx], Some(&coord[idx + 1..])),
            None => (coord, None),
        };
        if extension_override.is_some_and(str::is_empty) {
            return Err(invalid());
        }

        let parts: Vec<&str> = coord_part.split(':').collect();
        let (group_id, artifact_id, version, classifier, packaging) = match parts.as_slice() {
            [g, a, v] => (*g, *a, *v, None, None),
            [g, a, v, c] => (*g, *a, *v, Some(*c), None),
            [g, a, p, c, v] => (*g, *a, *v, Some(*c), Some(*p)),
            _ => return Err(invalid()),
        };

        if group_id.is_empty() || artifact_id.is_empty() || version.is_empty() {
            return Err(invalid());
        }

        Ok(Self {
            group_id: group_id.to_string(),
            artifact_id: artifact_id.to_string(),
            version: version.to_string(),
            classifier: classifier.filter(|c| !c.is_empty()).map(str::to_string),
            packaging: extension_override
                .or(packaging)
                .unwrap_or("jar")
                .to_string(),
        })
    }

    /// Construct the group path portion (`net/sf/jopt-simple`).
    pub fn group_path(&self) -> String {
        self.group_id.replace('.', "/")
    }

    /// Build the artifact filename.
    ///
    /// `artifactId-version[-classifier].packaging`
    pub fn filename(&self) -> String {
        match &self.classifier {
            Some(c) => format!(
                "{}-{}-{}.{}",
                self.artifact_id, self.version, c, self.packaging
            ),
            None => format!("{}-{}.{}", self.artifact_id, self.version, self.packaging),
        }
    }

    /// Construct the full URL for this artifact under the given repository base.
    ///
    /// Template:
    /// `<repo>/<group_path>/<artifact_id>/<version>/<filename>`
    pub fn url(&self, repo_base: &str) -> String {
        let base = repo_base.trim_end_matches('/');
        format!(
            "{}/{}/{}/{}/{}",
            base,
            self.group_path(),
            self.artifact_id,
            self.version,
            self.filename()
        )
    }

    /// Local path relative to the libraries directory.
    ///
    /// Mirrors Maven's local repo layout:
    /// `<group_path>/<artifact_id>/<version>/<filename>`
    pub fn local_path(&self) -> PathBuf {
        PathBuf::from(self.group_path())
            .join(&self.artifact_id)
            .join(&self.version)
            .join(self.filename())
    }

    /// Identity of the artifact irrespective of version, used to let one
    /// library declaration override another.
    pub fn versionless_key(&self) -> String {
        format!(
            "{}:{}:{}",
            self.group_id,
            self.artifact_id,
            self.classifier.as_deref().unwrap_or_default()
        )
    }

    /// Return a new artifact with the classifier replaced.
    pub fn with_classifier(&self, classifier: &str) -> Self {
        let mut clone = self.clone();
        clone.classifier = Some(classifier.to_string());
        clone
    }
}

impl fmt::Display for MavenArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group_id, self.artifact_id, self.version)?;
        if let Some(c) = &self.classifier {
            write!(f, ":{}", c)?;
        }
        if self.packaging != "jar" {
            write!(f, "@{}", self.packaging)?;
        }
        Ok(())
    }
}

/// Resolve a coordinate to its path relative to the libraries directory.
pub fn resolve_path(coord: &str) -> Option<PathBuf> {
    MavenArtifact::parse(coord).ok().map(|a| a.local_path())
}

/// Like [`resolve_path`], but a string that is not a coordinate is assumed to
/// already be a relative path.
pub fn resolve_path_or_raw(coord: &str) -> PathBuf {
    resolve_path(coord).unwrap_or_else(|| PathBuf::from(coord.trim()))
}
