//! Builds registrants from guild members in the cache.

use std::collections::HashMap;

use poise::serenity_prelude::Context;
use poise::serenity_prelude::Guild;
use poise::serenity_prelude::GuildId;
use poise::serenity_prelude::Member;
use poise::serenity_prelude::Message;

use crate::register::MemberRole;
use crate::register::Registrant;

fn registrant_of_member(guild: &Guild, member: &Member) -> Registrant {
    let roles = member
        .roles
        .iter()
        .filter_map(|role_id| guild.roles.get(role_id))
        .map(|role| MemberRole {
            id: role.id.get(),
            name: role.name.to_string(),
        })
        .collect();

    Registrant::new(member.user.name.to_string(), member.display_name().to_string())
        .with_roles(roles)
}

/// The author of `message`, with guild roles when the member is cached.
pub fn registrant_of_message(ctx: &Context, message: &Message) -> Registrant {
    let cached = message.guild_id.and_then(|guild_id| {
        let guild = ctx.cache.guild(guild_id)?;
        let member = guild.members.get(&message.author.id)?;
        Some(registrant_of_member(&guild, member))
    });

    cached.unwrap_or_else(|| {
        Registrant::new(
            message.author.name.to_string(),
            message.author.display_name().to_string(),
        )
    })
}

/// Cached members of the guild keyed by username.
pub fn guild_registrants(ctx: &Context, guild_id: GuildId) -> HashMap<String, Registrant> {
    let Some(guild) = ctx.cache.guild(guild_id) else {
        return HashMap::new();
    };

    guild
        .members
        .iter()
        .map(|member| {
            let registrant = registrant_of_member(&guild, member);
            (registrant.username.clone(), registrant)
        })
        .collect()
}
