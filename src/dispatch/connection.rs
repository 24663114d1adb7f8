use tracing::{debug, info, warn};

use super::{require_params, source_name, Context, DispatchTable};
use crate::error::DispatchError;
use crate::event::Event;
use crate::message::Message;
use crate::mode::parse_user_modes;
use crate::response::Response;
use crate::session::SessionState;

pub(super) fn register(table: &mut DispatchTable) {
    table.numeric(Response::RPL_WELCOME, welcome);
    table.numeric(Response::RPL_MYINFO, my_info);
    table.numeric(Response::RPL_ISUPPORT, isupport);
    table.numeric(Response::RPL_UMODEIS, umode_is);
    table.numeric(Response::RPL_MOTDSTART, motd_line);
    table.numeric(Response::RPL_MOTD, motd_line);
    table.numeric(Response::RPL_ENDOFMOTD, motd_end);
    table.numeric(Response::ERR_NOMOTD, motd_end);
    table.numeric(Response::ERR_ERRONEOUSNICKNAME, nick_rejected);
    table.numeric(Response::ERR_NICKNAMEINUSE, nick_rejected);
    table.numeric(Response::ERR_NICKCOLLISION, nick_rejected);
    table.numeric(Response::ERR_UNAVAILRESOURCE, nick_rejected);
    table.named("PING", ping);
    table.named("PONG", pong);
    table.named("ERROR", error);
}

/// 001: registration is complete and the first parameter is our nickname.
fn welcome(ctx: &mut Context, msg: &Message) -> Result<(), DispatchError> {
    require_params(msg, 1)?;
    ctx.nickname = msg.params[0].clone();
    ctx.status = SessionState::Connected;
    if let Some(server) = source_name(msg) {
        ctx.server_name = Some(server);
    }
    ctx.state.get_or_create_client(&ctx.nickname);

    let server = ctx.server_name.clone().unwrap_or_default();
    info!(%server, nickname = %ctx.nickname, "registered");
    ctx.fire(Event::ServerReady {
        server,
        nickname: ctx.nickname.clone(),
    });

    let joins: Vec<_> = ctx
        .config
        .autojoin
        .iter()
        .map(|channel| Message::new("JOIN", [channel.as_str()]))
        .collect();
    for join in joins {
        ctx.send(join);
    }
    Ok(())
}

/// 004: `<me> <servername> <version> <usermodes> <chanmodes>`.
fn my_info(ctx: &mut Context, msg: &Message) -> Result<(), DispatchError> {
    require_params(msg, 3)?;
    ctx.server_name = Some(msg.params[1].clone());
    ctx.server_version = Some(msg.params[2].clone());
    Ok(())
}

fn isupport(ctx: &mut Context, msg: &Message) -> Result<(), DispatchError> {
    require_params(msg, 2)?;
    ctx.isupport.apply(&msg.params);
    if let Some(casemapping) = ctx.isupport.casemapping() {
        if casemapping != ctx.state.casemapping() {
            debug!(%casemapping, "switching casemapping");
            ctx.state.set_casemapping(casemapping);
        }
    }
    Ok(())
}

/// 221: our full user mode string.
fn umode_is(ctx: &mut Context, msg: &Message) -> Result<(), DispatchError> {
    require_params(msg, 2)?;
    let nickname = ctx.nickname.clone();
    let client = ctx.state.get_or_create_client(&nickname);
    client.modes.clear();
    for change in parse_user_modes(&msg.params[1]) {
        client.apply_mode(change.adding, change.mode);
    }
    Ok(())
}

fn motd_line(ctx: &mut Context, msg: &Message) -> Result<(), DispatchError> {
    require_params(msg, 2)?;
    if msg.command.response() == Some(Response::RPL_MOTD) {
        let line = msg.params[1].strip_prefix("- ").unwrap_or(&msg.params[1]);
        ctx.fire(Event::MotdLine {
            line: line.to_string(),
        });
    }
    Ok(())
}

fn motd_end(ctx: &mut Context, _msg: &Message) -> Result<(), DispatchError> {
    ctx.fire(Event::MotdEnd);
    Ok(())
}

/// 432/433/436/437: pick another nickname while registering.
///
/// Once registered the rejection is only reported; the nickname we hold is
/// still valid.
fn nick_rejected(ctx: &mut Context, msg: &Message) -> Result<(), DispatchError> {
    require_params(msg, 2)?;
    let rejected = msg.params[1].clone();
    ctx.fire(Event::NickInUse {
        nickname: rejected.clone(),
    });

    if ctx.status != SessionState::Registering {
        return Ok(());
    }

    let next = match ctx.config.alternate_nicknames.get(ctx.nick_attempt) {
        Some(alt) => alt.clone(),
        None => format!("{rejected}_"),
    };
    ctx.nick_attempt += 1;
    warn!(%rejected, %next, "nickname rejected, retrying");
    ctx.nickname = next.clone();
    ctx.send(Message::new("NICK", [next]));
    Ok(())
}

fn ping(ctx: &mut Context, msg: &Message) -> Result<(), DispatchError> {
    ctx.send(Message::new("PONG", msg.params.iter().cloned()));
    Ok(())
}

fn pong(ctx: &mut Context, _msg: &Message) -> Result<(), DispatchError> {
    if let Some(lag) = ctx.keepalive.pong_received(ctx.now) {
        debug!(?lag, "keep-alive answered");
        ctx.fire(Event::PingSuccess { lag });
    }
    Ok(())
}

fn error(ctx: &mut Context, msg: &Message) -> Result<(), DispatchError> {
    let message = msg.last_arg().unwrap_or("connection closed").to_string();
    warn!(%message, "server sent ERROR");
    ctx.begin_close(&message);
    ctx.fire(Event::ServerError { message });
    Ok(())
}
