use chrono::Utc;
use tracing::{debug, warn};

use super::{require_params, source_name, source_nick, Context, DispatchTable};
use crate::error::DispatchError;
use crate::event::Event;
use crate::message::Message;
use crate::mode::{channel_mode_kind, parse_channel_modes, ModeChange, ModeKind};
use crate::prefix::Prefix;
use crate::response::Response;

pub(super) fn register(table: &mut DispatchTable) {
    table.named("JOIN", join);
    table.named("PART", part);
    table.named("KICK", kick);
    table.named("TOPIC", topic);
    table.named("MODE", mode);
    table.named("INVITE", invite);
    table.numeric(Response::RPL_CHANNELMODEIS, channel_mode_is);
    table.numeric(Response::RPL_CREATIONTIME, creation_time);
    table.numeric(Response::RPL_NOTOPIC, no_topic);
    table.numeric(Response::RPL_TOPIC, join_topic);
    table.numeric(Response::RPL_TOPICWHOTIME, topic_who_time);
    table.numeric(Response::RPL_NAMREPLY, names_reply);
    table.numeric(Response::RPL_ENDOFNAMES, end_of_names);
    table.numeric(Response::RPL_BANLIST, ban_list);
}

fn join(ctx: &mut Context, msg: &Message) -> Result<(), DispatchError> {
    require_params(msg, 1)?;
    let nick = source_nick(msg)?;
    let channel = msg.params[0].as_str();
    let is_self = ctx.is_self(nick);

    if is_self {
        ctx.state.get_or_create_channel(channel);
    } else if ctx.state.find_channel(channel).is_none() {
        debug!(%channel, %nick, "join to untracked channel");
        return Ok(());
    }

    let client = ctx.state.get_or_create_client(nick);
    if let Some(prefix) = &msg.prefix {
        client.update_from_prefix(prefix);
    }
    // extended-join: JOIN <channel> <account> :<realname>
    if let Some(account) = msg.arg(1) {
        client.account = (account != "*").then(|| account.to_string());
    }
    if let Some(realname) = msg.arg(2) {
        client.realname = Some(realname.to_string());
    }
    ctx.state.add_membership(nick, channel)?;

    let channel = ctx.channel_name(channel);
    if is_self {
        ctx.fire(Event::ChannelSelfJoin {
            channel: channel.clone(),
        });
        if ctx.config.request_modes_on_join {
            ctx.send(Message::new("MODE", [channel]));
        }
    } else {
        ctx.fire(Event::ChannelJoin {
            channel,
            nickname: nick.to_string(),
        });
    }
    Ok(())
}

fn part(ctx: &mut Context, msg: &Message) -> Result<(), DispatchError> {
    require_params(msg, 1)?;
    let nick = source_nick(msg)?;
    let channel = msg.params[0].as_str();
    if ctx.state.find_channel(channel).is_none() {
        debug!(%channel, %nick, "part from untracked channel");
        return Ok(());
    }

    let is_self = ctx.is_self(nick);
    ctx.touch_client(msg.prefix.as_ref());
    ctx.fire(Event::ChannelPart {
        channel: ctx.channel_name(channel),
        nickname: ctx.client_name(nick),
        reason: msg.arg(1).map(str::to_string),
        is_self,
    });
    leave_channel(ctx, nick, channel, is_self);
    Ok(())
}

fn kick(ctx: &mut Context, msg: &Message) -> Result<(), DispatchError> {
    require_params(msg, 2)?;
    let channel = msg.params[0].as_str();
    let kicked = msg.params[1].as_str();
    if ctx.state.find_channel(channel).is_none() {
        debug!(%channel, %kicked, "kick from untracked channel");
        return Ok(());
    }

    let is_self = ctx.is_self(kicked);
    ctx.touch_client(msg.prefix.as_ref());
    ctx.fire(Event::ChannelKick {
        channel: ctx.channel_name(channel),
        kicked: ctx.client_name(kicked),
        kicker: source_name(msg),
        reason: msg.arg(2).map(str::to_string),
    });
    leave_channel(ctx, kicked, channel, is_self);
    Ok(())
}

/// Remove a membership after PART or KICK. When we are the one leaving,
/// the whole channel goes, along with anyone we no longer share a channel
/// with.
fn leave_channel(ctx: &mut Context, nick: &str, channel: &str, is_self: bool) {
    if is_self {
        let key = ctx.state.key(channel);
        ctx.pending_topics.remove(&key);
        if let Some(removed) = ctx.state.remove_channel(channel) {
            for member in removed.members.keys() {
                ctx.prune_client(member);
            }
        }
    } else {
        ctx.state.remove_membership(nick, channel);
        ctx.prune_client(nick);
    }
}

/// TOPIC: a live topic change, recorded strictly later than the previous one.
fn topic(ctx: &mut Context, msg: &Message) -> Result<(), DispatchError> {
    require_params(msg, 2)?;
    let setter = msg
        .prefix
        .as_ref()
        .map(ToString::to_string)
        .ok_or_else(|| DispatchError::MissingPrefix(msg.command.to_string()))?;
    let channel = msg.params[0].as_str();
    let text = msg.params[1].as_str();

    let Some(chan) = ctx.state.channel_mut(channel) else {
        debug!(%channel, "topic for untracked channel");
        return Ok(());
    };
    let time = Utc::now().timestamp().max(chan.topic_time.saturating_add(1));
    chan.set_topic(text, &setter, time);
    let name = chan.name.clone();

    let key = ctx.state.key(channel);
    ctx.pending_topics.remove(&key);
    ctx.touch_client(msg.prefix.as_ref());
    ctx.fire(Event::ChannelTopic {
        channel: name,
        topic: text.to_string(),
        setter,
        time,
        is_join_topic: false,
    });
    Ok(())
}

/// 331: `<me> <channel> :No topic is set`.
fn no_topic(ctx: &mut Context, msg: &Message) -> Result<(), DispatchError> {
    require_params(msg, 2)?;
    let channel = msg.params[1].as_str();
    let key = ctx.state.key(channel);
    ctx.pending_topics.remove(&key);
    if let Some(chan) = ctx.state.channel_mut(channel) {
        let time = chan.topic_time;
        chan.set_topic("", "", time);
    }
    Ok(())
}

/// 332: `<me> <channel> :<topic>`. Held until 333 (or 366) completes it.
fn join_topic(ctx: &mut Context, msg: &Message) -> Result<(), DispatchError> {
    require_params(msg, 3)?;
    let channel = msg.params[1].as_str();
    let key = ctx.state.key(channel);
    let Some(chan) = ctx.state.channel_mut(channel) else {
        debug!(%channel, "topic reply for untracked channel");
        return Ok(());
    };
    chan.topic = msg.params[2].clone();
    ctx.pending_topics.insert(key);
    Ok(())
}

/// 333: `<me> <channel> <setter> <time>`. Values are stored as sent.
fn topic_who_time(ctx: &mut Context, msg: &Message) -> Result<(), DispatchError> {
    require_params(msg, 4)?;
    let channel = msg.params[1].as_str();
    let key = ctx.state.key(channel);
    let time = msg.params[3].parse::<i64>().unwrap_or_else(|_| {
        warn!(%channel, time = %msg.params[3], "unparsable topic time");
        0
    });
    let Some(chan) = ctx.state.channel_mut(channel) else {
        return Ok(());
    };
    chan.topic_setter = msg.params[2].clone();
    chan.topic_time = time;

    if ctx.pending_topics.remove(&key) {
        fire_join_topic(ctx, channel);
    }
    Ok(())
}

fn fire_join_topic(ctx: &mut Context, channel: &str) {
    let Some(chan) = ctx.state.find_channel(channel) else {
        return;
    };
    let event = Event::ChannelTopic {
        channel: chan.name().to_string(),
        topic: chan.topic().to_string(),
        setter: chan.topic_setter().to_string(),
        time: chan.topic_time(),
        is_join_topic: true,
    };
    ctx.fire(event);
}

/// 353: `<me> [<symbol>] <channel> :<names>`.
///
/// Entries may carry several prefix symbols (multi-prefix) and a full
/// `nick!user@host` (userhost-in-names).
fn names_reply(ctx: &mut Context, msg: &Message) -> Result<(), DispatchError> {
    require_params(msg, 3)?;
    let (channel, names) = if msg.params.len() >= 4 {
        (msg.params[2].as_str(), msg.params[3].as_str())
    } else {
        (msg.params[1].as_str(), msg.params[2].as_str())
    };
    if ctx.state.find_channel(channel).is_none() {
        debug!(%channel, "names for untracked channel");
        return Ok(());
    }

    let spec = ctx.isupport.prefix();
    for entry in names.split_whitespace() {
        let mut modes = Vec::new();
        let mut rest = entry;
        while let Some(c) = rest.chars().next() {
            match spec.mode_for_prefix(c) {
                Some(mode) => {
                    modes.push(mode);
                    rest = &rest[c.len_utf8()..];
                }
                None => break,
            }
        }

        let prefix = Prefix::new_from_str(rest);
        let Some(nick) = prefix.nickname() else {
            debug!(%channel, %entry, "skipping names entry");
            continue;
        };
        if nick.is_empty() {
            continue;
        }
        ctx.state
            .get_or_create_client(nick)
            .update_from_prefix(&prefix);
        let member = ctx.state.add_membership(nick, channel)?;
        for mode in modes {
            member.add_mode(mode, &spec.modes);
        }
    }
    Ok(())
}

/// 366: `<me> <channel> :End of /NAMES list`.
fn end_of_names(ctx: &mut Context, msg: &Message) -> Result<(), DispatchError> {
    require_params(msg, 2)?;
    let channel = msg.params[1].as_str();
    let key = ctx.state.key(channel);
    let Some(chan) = ctx.state.channel_mut(channel) else {
        return Ok(());
    };
    chan.names_complete = true;
    let name = chan.name.clone();

    if ctx.pending_topics.remove(&key) {
        fire_join_topic(ctx, channel);
    }
    ctx.fire(Event::ChannelNames { channel: name });
    Ok(())
}

fn mode(ctx: &mut Context, msg: &Message) -> Result<(), DispatchError> {
    require_params(msg, 2)?;
    let target = msg.params[0].as_str();
    if ctx.isupport.is_channel(target) {
        channel_modes(ctx, msg)
    } else if ctx.is_self(target) {
        super::user::self_modes(ctx, msg)
    } else {
        debug!(%target, "mode change for someone else");
        Ok(())
    }
}

fn channel_modes(ctx: &mut Context, msg: &Message) -> Result<(), DispatchError> {
    let channel = msg.params[0].as_str();
    if ctx.state.find_channel(channel).is_none() {
        debug!(%channel, "mode change for untracked channel");
        return Ok(());
    }

    let changes = parse_channel_modes(&ctx.isupport, &msg.params[1..]);
    let member_changes = apply_channel_modes(ctx, channel, &changes);
    let setter = source_name(msg);
    let name = ctx.channel_name(channel);
    ctx.touch_client(msg.prefix.as_ref());

    ctx.fire(Event::ChannelModeChanged {
        channel: name.clone(),
        setter: setter.clone(),
        modes: msg.params[1..].join(" "),
        changes,
    });
    for (nickname, mode) in member_changes {
        ctx.fire(Event::ChannelUserModeChanged {
            channel: name.clone(),
            nickname,
            setter: setter.clone(),
            mode,
        });
    }
    Ok(())
}

/// Apply parsed changes to a tracked channel. Returns the prefix mode
/// changes as `(nickname, "+o")` pairs.
fn apply_channel_modes(
    ctx: &mut Context,
    channel: &str,
    changes: &[ModeChange],
) -> Vec<(String, String)> {
    let spec = ctx.isupport.prefix();
    let mut member_changes = Vec::new();

    for change in changes {
        match channel_mode_kind(&ctx.isupport, change.mode) {
            ModeKind::Prefix => {
                let Some(nick) = change.arg.as_deref() else {
                    continue;
                };
                match ctx.state.membership_mut(nick, channel) {
                    Some(member) if change.adding => member.add_mode(change.mode, &spec.modes),
                    Some(member) => member.remove_mode(change.mode),
                    None => {
                        warn!(%channel, %nick, mode = %change.flag(), "prefix mode for non-member");
                        continue;
                    }
                }
                member_changes.push((ctx.client_name(nick), change.flag()));
            }
            ModeKind::List => {
                if let (Some(mask), Some(chan)) =
                    (change.arg.as_deref(), ctx.state.channel_mut(channel))
                {
                    chan.set_list_entry(change.adding, change.mode, mask);
                }
            }
            ModeKind::AlwaysArg | ModeKind::ArgWhenSet | ModeKind::Flag => {
                if let Some(chan) = ctx.state.channel_mut(channel) {
                    chan.set_mode(change.adding, change.mode, change.arg.as_deref());
                }
            }
        }
    }
    member_changes
}

/// 324: `<me> <channel> <modes> [<params>...]`.
fn channel_mode_is(ctx: &mut Context, msg: &Message) -> Result<(), DispatchError> {
    require_params(msg, 3)?;
    let channel = msg.params[1].as_str();
    if ctx.state.find_channel(channel).is_none() {
        return Ok(());
    }
    let changes = parse_channel_modes(&ctx.isupport, &msg.params[2..]);
    apply_channel_modes(ctx, channel, &changes);
    ctx.fire(Event::ChannelModeChanged {
        channel: ctx.channel_name(channel),
        setter: None,
        modes: msg.params[2..].join(" "),
        changes,
    });
    Ok(())
}

/// 329: `<me> <channel> <creation time>`.
fn creation_time(ctx: &mut Context, msg: &Message) -> Result<(), DispatchError> {
    require_params(msg, 3)?;
    if let Some(chan) = ctx.state.channel_mut(&msg.params[1]) {
        chan.created_at = msg.params[2].parse().ok();
    }
    Ok(())
}

/// 367: `<me> <channel> <mask> [<setter> <time>]`.
fn ban_list(ctx: &mut Context, msg: &Message) -> Result<(), DispatchError> {
    require_params(msg, 3)?;
    if let Some(chan) = ctx.state.channel_mut(&msg.params[1]) {
        chan.set_list_entry(true, 'b', &msg.params[2]);
    }
    Ok(())
}

fn invite(ctx: &mut Context, msg: &Message) -> Result<(), DispatchError> {
    require_params(msg, 2)?;
    ctx.fire(Event::Invite {
        channel: msg.params[1].clone(),
        source: source_name(msg).unwrap_or_default(),
    });
    Ok(())
}
