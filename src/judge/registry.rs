use crate::config::types::{JudgeError, LanguageId, Result};
use crate::judge::language::LanguageProfile;
use std::collections::BTreeMap;

/// Fixed language table, configured at startup and read-only afterwards
#[derive(Debug, Clone)]
pub struct LanguageTable {
    profiles: BTreeMap<LanguageId, LanguageProfile>,
}

impl LanguageTable {
    pub fn new(profiles: Vec<LanguageProfile>) -> Result<Self> {
        let mut table = BTreeMap::new();
        for profile in profiles {
            if profile.run.trim().is_empty() {
                return Err(JudgeError::Config(format!(
                    "language {} has an empty run command",
                    profile.id
                )));
            }
            if profile.extension.trim().is_empty() {
                return Err(JudgeError::Config(format!(
                    "language {} has an empty source extension",
                    profile.id
                )));
            }
            if let Some(previous) = table.insert(profile.id, profile) {
                return Err(JudgeError::Config(format!(
                    "duplicate language id {}",
                    previous.id
                )));
            }
        }
        Ok(Self { profiles: table })
    }

    pub fn get(&self, id: LanguageId) -> Option<&LanguageProfile> {
        self.profiles.get(&id)
    }

    pub fn contains(&self, id: LanguageId) -> bool {
        self.profiles.contains_key(&id)
    }

    pub fn display_name(&self, id: LanguageId) -> Option<&str> {
        self.profiles.get(&id).map(|p| p.display_name.as_str())
    }

    /// Profiles ordered by id
    pub fn iter(&self) -> impl Iterator<Item = &LanguageProfile> {
        self.profiles.values()
    }

    /// Stable `id -> display name` table for validation and display
    pub fn display_names(&self) -> Vec<(LanguageId, String)> {
        self.iter()
            .map(|p| (p.id, p.display_name.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}
