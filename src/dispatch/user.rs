use tracing::debug;

use super::{require_params, source_name, source_nick, Context, DispatchTable};
use crate::error::DispatchError;
use crate::event::Event;
use crate::message::Message;
use crate::mode::parse_user_modes;
use crate::response::Response;

pub(super) fn register(table: &mut DispatchTable) {
    table.named("NICK", nick);
    table.named("QUIT", quit);
    table.named("AWAY", away);
    table.named("CHGHOST", chghost);
    table.named("ACCOUNT", account);
    table.numeric(Response::RPL_UNAWAY, self_away);
    table.numeric(Response::RPL_NOWAWAY, self_away);
    table.numeric(Response::RPL_AWAY, other_away);
    table.numeric(Response::RPL_WHOISUSER, whois_user);
    table.numeric(Response::RPL_WHOREPLY, who_reply);
    table.numeric(Response::RPL_HOSTHIDDEN, host_hidden);
}

/// NICK: the rename lands in state before any event fires.
fn nick(ctx: &mut Context, msg: &Message) -> Result<(), DispatchError> {
    require_params(msg, 1)?;
    let old = source_nick(msg)?;
    let new = msg.params[0].as_str();
    let is_self = ctx.is_self(old);
    if is_self {
        ctx.nickname = new.to_string();
    }

    if ctx.state.find_client(old).is_none() {
        if is_self {
            ctx.fire(Event::NickChanged {
                old: old.to_string(),
                new: new.to_string(),
                is_self,
            });
        } else {
            debug!(%old, %new, "nick change for untracked client");
        }
        return Ok(());
    }

    ctx.state.rename_client(old, new)?;
    if let Some(prefix) = &msg.prefix {
        if let Some(client) = ctx.state.client_mut(new) {
            client.update_from_prefix(prefix);
        }
    }

    let channels: Vec<String> = ctx
        .state
        .find_client(new)
        .map(|c| c.channels().map(|key| ctx.channel_name(key)).collect())
        .unwrap_or_default();

    ctx.fire(Event::NickChanged {
        old: old.to_string(),
        new: new.to_string(),
        is_self,
    });
    for channel in channels {
        ctx.fire(Event::ChannelNickChanged {
            channel,
            old: old.to_string(),
            new: new.to_string(),
        });
    }
    Ok(())
}

/// QUIT: one `Quit`, then one `ChannelQuit` per shared channel, and only
/// then is the client removed.
fn quit(ctx: &mut Context, msg: &Message) -> Result<(), DispatchError> {
    let nick = source_nick(msg)?;
    let reason = msg.arg(0).unwrap_or_default().to_string();
    let Some(client) = ctx.state.find_client(nick) else {
        debug!(%nick, "quit from untracked client");
        return Ok(());
    };

    let nickname = client.nickname().to_string();
    let memberships: Vec<_> = client
        .channels()
        .filter_map(|key| ctx.state.membership(nick, key))
        .map(|m| (ctx.channel_name(m.channel_key()), m.clone()))
        .collect();

    ctx.touch_client(msg.prefix.as_ref());
    let host = ctx.sender_host(Some(nick)).to_string();
    ctx.fire(Event::Quit {
        nickname: nickname.clone(),
        host,
        reason: reason.clone(),
    });
    for (channel, membership) in memberships {
        ctx.fire(Event::ChannelQuit {
            channel,
            nickname: nickname.clone(),
            membership,
            reason: reason.clone(),
        });
    }

    ctx.state.remove_client(nick);
    Ok(())
}

/// MODE on our own nickname.
pub(super) fn self_modes(ctx: &mut Context, msg: &Message) -> Result<(), DispatchError> {
    require_params(msg, 2)?;
    let modes = msg.params[1..].join(" ");
    let nickname = ctx.nickname.clone();
    let client = ctx.state.get_or_create_client(&nickname);
    for change in parse_user_modes(&msg.params[1]) {
        client.apply_mode(change.adding, change.mode);
    }
    ctx.fire(Event::UserModeChanged {
        setter: source_name(msg),
        modes,
    });
    Ok(())
}

/// AWAY from away-notify: a message means away, none means back.
fn away(ctx: &mut Context, msg: &Message) -> Result<(), DispatchError> {
    let nick = source_nick(msg)?;
    let message = msg.arg(0).filter(|m| !m.is_empty());
    let Some(client) = ctx.state.client_mut(nick) else {
        return Ok(());
    };
    client.set_away(message.is_some(), message);
    let nickname = client.nickname().to_string();
    ctx.fire(Event::ClientAway {
        nickname,
        away: message.is_some(),
        message: message.map(str::to_string),
    });
    Ok(())
}

/// 305/306: our own away state.
fn self_away(ctx: &mut Context, msg: &Message) -> Result<(), DispatchError> {
    let away = msg.command.response() == Some(Response::RPL_NOWAWAY);
    let nickname = ctx.nickname.clone();
    ctx.state.get_or_create_client(&nickname).set_away(away, None);
    ctx.fire(Event::AwayState {
        away,
        message: None,
    });
    Ok(())
}

/// 301: `<me> <nick> :<away message>`.
fn other_away(ctx: &mut Context, msg: &Message) -> Result<(), DispatchError> {
    require_params(msg, 3)?;
    let nick = msg.params[1].as_str();
    let message = msg.params[2].as_str();
    let Some(client) = ctx.state.client_mut(nick) else {
        return Ok(());
    };
    let changed = !client.away || client.away_message.as_deref() != Some(message);
    client.set_away(true, Some(message));
    if changed {
        let nickname = client.nickname().to_string();
        ctx.fire(Event::ClientAway {
            nickname,
            away: true,
            message: Some(message.to_string()),
        });
    }
    Ok(())
}

/// 311: `<me> <nick> <user> <host> * :<realname>`.
fn whois_user(ctx: &mut Context, msg: &Message) -> Result<(), DispatchError> {
    require_params(msg, 6)?;
    if let Some(client) = ctx.state.client_mut(&msg.params[1]) {
        client.username = Some(msg.params[2].clone());
        client.hostname = Some(msg.params[3].clone());
        client.realname = Some(msg.params[5].clone());
    }
    Ok(())
}

/// 352: `<me> <channel> <user> <host> <server> <nick> <flags> :<hops> <realname>`.
fn who_reply(ctx: &mut Context, msg: &Message) -> Result<(), DispatchError> {
    require_params(msg, 8)?;
    let Some(client) = ctx.state.client_mut(&msg.params[5]) else {
        return Ok(());
    };
    client.username = Some(msg.params[2].clone());
    client.hostname = Some(msg.params[3].clone());
    client.away = msg.params[6].starts_with('G');
    if !client.away {
        client.away_message = None;
    }
    if let Some((_, realname)) = msg.params[7].split_once(' ') {
        client.realname = Some(realname.to_string());
    }
    Ok(())
}

/// 396: `<me> <host> :is now your displayed host`.
fn host_hidden(ctx: &mut Context, msg: &Message) -> Result<(), DispatchError> {
    require_params(msg, 2)?;
    let nickname = ctx.nickname.clone();
    let displayed = msg.params[1].as_str();
    let client = ctx.state.get_or_create_client(&nickname);
    match displayed.split_once('@') {
        Some((user, host)) => {
            client.username = Some(user.to_string());
            client.hostname = Some(host.to_string());
        }
        None => client.hostname = Some(displayed.to_string()),
    }
    Ok(())
}

/// CHGHOST: `:nick!old@host CHGHOST <user> <host>`.
fn chghost(ctx: &mut Context, msg: &Message) -> Result<(), DispatchError> {
    require_params(msg, 2)?;
    let nick = source_nick(msg)?;
    if let Some(client) = ctx.state.client_mut(nick) {
        client.username = Some(msg.params[0].clone());
        client.hostname = Some(msg.params[1].clone());
    }
    Ok(())
}

/// ACCOUNT: `*` means logged out.
fn account(ctx: &mut Context, msg: &Message) -> Result<(), DispatchError> {
    require_params(msg, 1)?;
    let nick = source_nick(msg)?;
    if let Some(client) = ctx.state.client_mut(nick) {
        let account = msg.params[0].as_str();
        client.account = (account != "*").then(|| account.to_string());
    }
    Ok(())
}
