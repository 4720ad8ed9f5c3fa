//! User profile records stored in the graph arena

use super::types::{OpportunityType, UserId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A member profile.
///
/// Skills, interests and the open-to set are mutated only by the owning
/// user (enforced at the engine layer); the id is immutable. The
/// connection count is derived from the graph and never stored here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier for this user
    pub id: UserId,

    /// Display name
    pub name: String,

    /// Free-text bio
    pub bio: String,

    /// Skills, kept sorted for deterministic rendering
    pub skills: BTreeSet<String>,

    /// Interests, kept sorted for deterministic rendering
    pub interests: BTreeSet<String>,

    /// Opportunity categories this user wants to be matched for
    pub open_to: BTreeSet<OpportunityType>,

    /// Creation timestamp (Unix milliseconds)
    pub created_at: i64,
}

impl User {
    /// Create a new user profile.
    pub fn new(
        id: UserId,
        name: impl Into<String>,
        bio: impl Into<String>,
        skills: BTreeSet<String>,
        interests: BTreeSet<String>,
        open_to: BTreeSet<OpportunityType>,
    ) -> Self {
        User {
            id,
            name: name.into(),
            bio: bio.into(),
            skills,
            interests,
            open_to,
            created_at: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Whether this user wants to be considered for the given category.
    pub fn is_open_to(&self, kind: OpportunityType) -> bool {
        self.open_to.contains(&kind)
    }

    /// The profile text handed to the embedding provider.
    ///
    /// Bio first, then skills, interests and open-to categories; the
    /// rendering is deterministic because the sets are sorted.
    pub fn profile_text(&self) -> String {
        let skills: Vec<&str> = self.skills.iter().map(String::as_str).collect();
        let interests: Vec<&str> = self.interests.iter().map(String::as_str).collect();
        let open_to: Vec<&str> = self.open_to.iter().map(|t| t.as_str()).collect();
        format!(
            "{}. Skills: {}. Interests: {}. Open to: {}",
            self.bio,
            skills.join(", "),
            interests.join(", "),
            open_to.join(", "),
        )
    }
}

impl PartialEq for User {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for User {}

impl std::hash::Hash for User {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_profile_text_is_deterministic() {
        let user = User::new(
            UserId::new(1),
            "Sofia",
            "UX designer passionate about sustainability",
            set(&["user research", "Figma", "accessibility"]),
            set(&["sustainability", "community building"]),
            [OpportunityType::Project, OpportunityType::Collab]
                .into_iter()
                .collect(),
        );

        let text = user.profile_text();
        assert!(text.starts_with("UX designer passionate about sustainability. "));
        // BTreeSet ordering makes the rendering stable across runs.
        assert!(text.contains("Skills: Figma, accessibility, user research"));
        assert!(text.contains("Open to: project, collab"));
        assert_eq!(text, user.profile_text());
    }

    #[test]
    fn test_is_open_to() {
        let user = User::new(
            UserId::new(2),
            "Diego",
            "Fullstack developer",
            set(&["TypeScript"]),
            set(&["climate tech"]),
            [OpportunityType::Job].into_iter().collect(),
        );
        assert!(user.is_open_to(OpportunityType::Job));
        assert!(!user.is_open_to(OpportunityType::Date));
    }

    #[test]
    fn test_user_equality_by_id() {
        let a = User::new(
            UserId::new(3),
            "A",
            "",
            BTreeSet::new(),
            BTreeSet::new(),
            BTreeSet::new(),
        );
        let mut b = a.clone();
        b.name = "renamed".to_string();
        assert_eq!(a, b);
    }
}
