//! Per-poll mapping from user ID to display name.

use std::collections::HashMap;

use super::id::UserId;

/// Display names for the users mentioned in one poll batch.
///
/// Rebuilt on every poll cycle and never cached across cycles. A user whose
/// lookup failed is simply absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NicknameMap(HashMap<UserId, String>);

impl NicknameMap {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the display name for a user.
    pub fn insert(&mut self, user_id: UserId, name: impl Into<String>) {
        self.0.insert(user_id, name.into());
    }

    /// Look up a user's display name.
    #[must_use]
    pub fn get(&self, user_id: UserId) -> Option<&str> {
        self.0.get(&user_id).map(String::as_str)
    }

    /// Returns true if the user resolved.
    #[must_use]
    pub fn contains(&self, user_id: UserId) -> bool {
        self.0.contains_key(&user_id)
    }

    /// Number of resolved users.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if no users resolved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(UserId, S)> for NicknameMap {
    fn from_iter<I: IntoIterator<Item = (UserId, S)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(id, name)| (id, name.into()))
                .collect(),
        )
    }
}
