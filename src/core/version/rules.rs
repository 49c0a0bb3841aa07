// ─── Platform Rules ───
// Last matching rule wins; a list where nothing matches allows the library.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    Allow,
    Disallow,
}

/// A single OS rule as used by loader profiles and version JSONs alike.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlatformRule {
    pub os_name: Option<String>,
    pub action: RuleAction,
}

impl PlatformRule {
    pub fn allow(os_name: Option<&str>) -> Self {
        Self {
            os_name: os_name.map(str::to_string),
            action: RuleAction::Allow,
        }
    }

    pub fn disallow(os_name: Option<&str>) -> Self {
        Self {
            os_name: os_name.map(str::to_string),
            action: RuleAction::Disallow,
        }
    }

    fn matches(&self, os: &str) -> bool {
        self.os_name.as_deref().map_or(true, |name| name == os)
    }
}

/// Evaluate `rules` for `current_os`.
pub fn is_allowed(rules: &[PlatformRule], current_os: &str) -> bool {
    let mut allowed = None;

    for rule in rules.iter().filter(|rule| rule.matches(current_os)) {
        allowed = Some(rule.action == RuleAction::Allow);
    }

    allowed.unwrap_or(true)
}

/// Get the Mojang OS name for the current platform.
pub fn current_os_name() -> &'static str {
    if cfg!(target_os = "windows") {
        "windows"
    } else if cfg!(target_os = "macos") {
        "osx"
    } else {
        "linux"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_rules_means_allowed() {
        for os in ["windows", "osx", "linux"] {
            assert!(is_allowed(&[], os));
        }
    }

    #[test]
    fn universal_disallow_blocks_every_os() {
        let rules = [PlatformRule::disallow(None)];
        for os in ["windows", "osx", "linux"] {
            assert!(!is_allowed(&rules, os));
        }
    }

    #[test]
    fn later_rule_overrides_earlier_one() {
        let rules = [PlatformRule::allow(None), PlatformRule::disallow(Some("osx"))];
        assert!(!is_allowed(&rules, "osx"));
        assert!(is_allowed(&rules, "linux"));

        let reversed = [PlatformRule::disallow(Some("osx")), PlatformRule::allow(None)];
        assert!(is_allowed(&reversed, "osx"));
    }

    #[test]
    fn rules_for_other_systems_are_skipped() {
        let rules = [PlatformRule::allow(Some("osx"))];
        assert!(is_allowed(&rules, "linux"));

        let rules = [PlatformRule::disallow(Some("windows"))];
        assert!(is_allowed(&rules, "linux"));
        assert!(!is_allowed(&rules, "windows"));
    }
}
