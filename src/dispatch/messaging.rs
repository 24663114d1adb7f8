use tracing::debug;

use super::{require_params, Context, DispatchTable};
use crate::ctcp::{self, CtcpKind};
use crate::error::DispatchError;
use crate::event::Event;
use crate::message::Message;
use crate::prefix::Prefix;

pub(super) fn register(table: &mut DispatchTable) {
    table.named("PRIVMSG", privmsg);
    table.named("NOTICE", notice);
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Kind {
    Message,
    Notice,
}

fn privmsg(ctx: &mut Context, msg: &Message) -> Result<(), DispatchError> {
    route(ctx, msg, Kind::Message)
}

fn notice(ctx: &mut Context, msg: &Message) -> Result<(), DispatchError> {
    route(ctx, msg, Kind::Notice)
}

/// Classify the target as a channel, us, or neither, and fire accordingly.
fn route(ctx: &mut Context, msg: &Message, kind: Kind) -> Result<(), DispatchError> {
    require_params(msg, 2)?;
    let target = msg.params[0].as_str();
    let text = msg.params[1].as_str();
    ctx.touch_client(msg.prefix.as_ref());

    let source = msg.prefix.clone().unwrap_or_else(|| {
        Prefix::ServerName(ctx.server_name.clone().unwrap_or_default())
    });

    if let Some(channel) = ctx.channel_target(target) {
        channel_message(ctx, source, channel, text, kind);
    } else if ctx.is_self(target) {
        private_message(ctx, source, target, text, kind);
    } else {
        let host = ctx.sender_host(source.nickname());
        let event = match kind {
            Kind::Message => Event::UnknownMessage {
                message: text.to_string(),
                target: target.to_string(),
                host,
            },
            Kind::Notice => Event::UnknownNotice {
                message: text.to_string(),
                target: target.to_string(),
                host,
            },
        };
        ctx.fire(event);
    }
    Ok(())
}

fn channel_message(ctx: &mut Context, source: Prefix, channel: &str, text: &str, kind: Kind) {
    if ctx.state.find_channel(channel).is_none() {
        debug!(%channel, "message for untracked channel");
        return;
    }
    let channel = ctx.channel_name(channel);
    let nickname = match &source {
        Prefix::Nickname(nick, _, _) => ctx.client_name(nick),
        Prefix::ServerName(server) => server.clone(),
    };
    let host = ctx.sender_host(source.nickname());

    let event = match (ctcp::parse(text), kind) {
        (Some(query), Kind::Message) if query.kind == CtcpKind::Action => Event::ChannelAction {
            channel,
            nickname,
            host,
            message: query.params.to_string(),
        },
        (Some(query), _) => ctcp_event(source, channel, query, kind),
        (None, Kind::Message) => Event::ChannelMessage {
            channel,
            nickname,
            host,
            message: text.to_string(),
        },
        (None, Kind::Notice) => Event::ChannelNotice {
            channel,
            nickname,
            host,
            message: text.to_string(),
        },
    };
    ctx.fire(event);
}

fn private_message(ctx: &mut Context, source: Prefix, target: &str, text: &str, kind: Kind) {
    let event = match (ctcp::parse(text), kind) {
        (Some(query), Kind::Message) if query.kind == CtcpKind::Action => Event::PrivateAction {
            source,
            message: query.params.to_string(),
        },
        (Some(query), _) => ctcp_event(source, target.to_string(), query, kind),
        (None, Kind::Message) => Event::PrivateMessage {
            source,
            message: text.to_string(),
        },
        (None, Kind::Notice) => Event::PrivateNotice {
            source,
            message: text.to_string(),
        },
    };
    ctx.fire(event);
}

/// CTCP in a PRIVMSG is a request, in a NOTICE a reply.
fn ctcp_event(source: Prefix, target: String, query: ctcp::Ctcp<'_>, kind: Kind) -> Event {
    let ctcp_kind = query.kind.to_string();
    let args = query.params.to_string();
    match kind {
        Kind::Message => Event::Ctcp {
            source,
            target,
            kind: ctcp_kind,
            args,
        },
        Kind::Notice => Event::CtcpReply {
            source,
            target,
            kind: ctcp_kind,
            args,
        },
    }
}
