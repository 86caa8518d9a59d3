//! Display name resolution for mentioned users.

use std::collections::BTreeSet;

use futures::future::join_all;
use task_relay_core::{GuildId, NicknameMap, UserId};
use tracing::{debug, instrument, warn};

use crate::discord::DiscordClient;

/// Resolves user IDs to guild display names.
///
/// Lookups are issued concurrently and all settle before the map is
/// returned. A failed lookup drops only that user.
#[derive(Debug, Clone)]
pub struct NicknameResolver {
    discord: DiscordClient,
    guild_id: GuildId,
}

impl NicknameResolver {
    /// Create a resolver for one guild.
    #[must_use]
    pub const fn new(discord: DiscordClient, guild_id: GuildId) -> Self {
        Self { discord, guild_id }
    }

    /// Look up every user in `user_ids` and build a fresh map.
    #[instrument(skip(self, user_ids), fields(guild = %self.guild_id, users = user_ids.len()))]
    pub async fn resolve(&self, user_ids: &BTreeSet<UserId>) -> NicknameMap {
        let lookups = user_ids.iter().map(|&user_id| async move {
            let result = self.discord.get_guild_member(self.guild_id, user_id).await;
            (user_id, result)
        });

        let mut nicknames = NicknameMap::new();
        for (user_id, result) in join_all(lookups).await {
            match result {
                Ok(member) => match member.display_name() {
                    Some(name) => nicknames.insert(user_id, name),
                    None => debug!(user_id = %user_id, "Member has no usable display name"),
                },
                Err(e) => warn!(user_id = %user_id, error = %e, "Member lookup failed"),
            }
        }

        debug!(resolved = nicknames.len(), "Resolved nicknames");
        nicknames
    }
}
