use crate::domain::model::LifestyleProfile;
use crate::domain::ports::ProfileProvider;
use crate::utils::error::Result;
use std::collections::HashMap;

/// Profiles keyed by user id, loaded once from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticProfiles {
    profiles: HashMap<String, LifestyleProfile>,
}

impl StaticProfiles {
    pub fn new(profiles: HashMap<String, LifestyleProfile>) -> Self {
        Self { profiles }
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

impl ProfileProvider for StaticProfiles {
    async fn profile_for(&self, user_id: &str) -> Result<Option<LifestyleProfile>> {
        let profile = self.profiles.get(user_id).cloned();
        if profile.is_none() {
            tracing::debug!("No profile stored for user {}", user_id);
        }
        Ok(profile)
    }
}
