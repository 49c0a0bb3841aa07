use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use super::kind::LoaderType;
use super::profile::LoaderProfile;

/// Identity of one resolved profile.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProfileKey {
    pub loader: LoaderType,
    pub game_version: String,
    pub loader_version: String,
}

impl ProfileKey {
    pub fn new(loader: LoaderType, game_version: &str, loader_version: &str) -> Self {
        Self {
            loader,
            game_version: game_version.to_string(),
            loader_version: loader_version.to_string(),
        }
    }
}

impl fmt::Display for ProfileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.game_version, self.loader_version)
    }
}

/// In-memory profile store shared by every resolver of one installer.
///
/// Entries are stored already substituted and are never mutated, only
/// replaced. No eviction.
#[derive(Debug, Default)]
pub struct ProfileCache {
    entries: Mutex<HashMap<ProfileKey, Arc<LoaderProfile>>>,
}

impl ProfileCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &ProfileKey) -> Option<Arc<LoaderProfile>> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    pub fn insert(&self, key: ProfileKey, profile: LoaderProfile) -> Arc<LoaderProfile> {
        let profile = Arc::new(profile);
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, Arc::clone(&profile));
        profile
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
