use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Closed set of supported loader ecosystems.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum LoaderType {
    Vanilla,
    Forge,
    Fabric,
    NeoForge,
    Quilt,
}

impl LoaderType {
    /// Whether the loader ships the patched game in its own libraries,
    /// keeping the client jar off the classpath.
    pub fn patches_game_jar(self) -> bool {
        matches!(self, LoaderType::Forge | LoaderType::NeoForge)
    }
}

impl fmt::Display for LoaderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoaderType::Vanilla => write!(f, "vanilla"),
            LoaderType::Forge => write!(f, "forge"),
            LoaderType::Fabric => write!(f, "fabric"),
            LoaderType::NeoForge => write!(f, "neoforge"),
            LoaderType::Quilt => write!(f, "quilt"),
        }
    }
}

impl FromStr for LoaderType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vanilla" | "none" => Ok(LoaderType::Vanilla),
            "forge" => Ok(LoaderType::Forge),
            "fabric" => Ok(LoaderType::Fabric),
            "neoforge" => Ok(LoaderType::NeoForge),
            "quilt" => Ok(LoaderType::Quilt),
            other => Err(format!("unknown loader '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively_and_displays_lowercase() {
        assert_eq!("NeoForge".parse::<LoaderType>().unwrap(), LoaderType::NeoForge);
        assert_eq!(LoaderType::NeoForge.to_string(), "neoforge");
        assert!("liteloader".parse::<LoaderType>().is_err());
    }

    #[test]
    fn serde_uses_lowercase_names() {
        let json = serde_json::to_string(&LoaderType::Quilt).unwrap();
        assert_eq!(json, "\"quilt\"");
    }
}
