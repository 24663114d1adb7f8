//! Typed events fired by the session.
//!
//! Every [`Event`] variant has a matching [`EventKind`]; listeners subscribe
//! to kinds through the [`CallbackManager`](crate::callbacks::CallbackManager).
//! Channels and clients are referred to by name: listeners resolve them
//! through the [`StateModel`](crate::state::StateModel) they are handed
//! alongside the event, which is guaranteed to still contain anything an
//! event is about to remove.

use std::fmt;
use std::time::Duration;

use crate::mode::ModeChange;
use crate::prefix::Prefix;
use crate::state::ChannelClientInfo;

/// Identity of a message sender as far as the session can resolve it.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SenderHost {
    /// A tracked client; holds its `nick!user@host`.
    Known(String),
    /// The sender is not a tracked client (a server, or a user we share no
    /// channel with).
    Unknown,
}

impl SenderHost {
    pub fn is_known(&self) -> bool {
        matches!(self, SenderHost::Known(_))
    }
}

impl fmt::Display for SenderHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SenderHost::Known(host) => f.write_str(host),
            SenderHost::Unknown => f.write_str("<unknown sender>"),
        }
    }
}

/// Something that happened on the connection.
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub enum Event {
    /// Registration finished (001 received).
    ServerReady { server: String, nickname: String },
    /// One line of the message of the day.
    MotdLine { line: String },
    /// End of the message of the day (376 or 422).
    MotdEnd,
    /// The server rejected our nickname during registration.
    NickInUse { nickname: String },
    /// Our keep-alive PING was answered.
    PingSuccess { lag: Duration },
    /// The server sent ERROR; the session is closing.
    ServerError { message: String },
    /// The session ended. Fired exactly once per connection.
    Disconnected { reason: String },

    /// We joined a channel.
    ChannelSelfJoin { channel: String },
    /// Another client joined a channel we are in.
    ChannelJoin { channel: String, nickname: String },
    /// A client left a channel. Fired before the membership is removed.
    ChannelPart {
        channel: String,
        nickname: String,
        reason: Option<String>,
        is_self: bool,
    },
    /// A client was kicked. Fired before the membership is removed.
    ChannelKick {
        channel: String,
        kicked: String,
        kicker: Option<String>,
        reason: Option<String>,
    },
    /// A client that was in `channel` quit the network.
    ChannelQuit {
        channel: String,
        nickname: String,
        membership: ChannelClientInfo,
        reason: String,
    },
    /// A client quit the network. Fired before it is removed.
    Quit {
        nickname: String,
        host: String,
        reason: String,
    },
    /// A client changed nickname. State already uses the new name.
    NickChanged {
        old: String,
        new: String,
        is_self: bool,
    },
    /// Per-channel view of a nickname change.
    ChannelNickChanged {
        channel: String,
        old: String,
        new: String,
    },
    /// A channel topic was observed or changed.
    ChannelTopic {
        channel: String,
        topic: String,
        setter: String,
        time: i64,
        /// `true` when the topic came from the 332/333 join numerics.
        is_join_topic: bool,
    },
    /// The NAMES list for a channel is complete.
    ChannelNames { channel: String },
    /// Channel modes changed, or were reported (324, no setter).
    ChannelModeChanged {
        channel: String,
        setter: Option<String>,
        modes: String,
        changes: Vec<ModeChange>,
    },
    /// A member's prefix mode changed.
    ChannelUserModeChanged {
        channel: String,
        nickname: String,
        setter: Option<String>,
        mode: String,
    },
    /// Our own user modes changed.
    UserModeChanged { setter: Option<String>, modes: String },
    /// Our away state changed (305/306).
    AwayState { away: bool, message: Option<String> },
    /// Another client's away state changed (away-notify or 301).
    ClientAway {
        nickname: String,
        away: bool,
        message: Option<String>,
    },
    /// We were invited to a channel.
    Invite { channel: String, source: String },

    ChannelMessage {
        channel: String,
        nickname: String,
        host: SenderHost,
        message: String,
    },
    ChannelNotice {
        channel: String,
        nickname: String,
        host: SenderHost,
        message: String,
    },
    ChannelAction {
        channel: String,
        nickname: String,
        host: SenderHost,
        message: String,
    },
    PrivateMessage { source: Prefix, message: String },
    PrivateNotice { source: Prefix, message: String },
    PrivateAction { source: Prefix, message: String },
    /// A CTCP request other than ACTION.
    Ctcp {
        source: Prefix,
        target: String,
        kind: String,
        args: String,
    },
    /// A CTCP reply (CTCP inside a NOTICE).
    CtcpReply {
        source: Prefix,
        target: String,
        kind: String,
        args: String,
    },
    /// PRIVMSG to a target that is neither a channel nor us.
    UnknownMessage {
        message: String,
        target: String,
        host: SenderHost,
    },
    /// NOTICE to a target that is neither a channel nor us.
    UnknownNotice {
        message: String,
        target: String,
        host: SenderHost,
    },
}

/// Event categories listeners subscribe to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum EventKind {
    ServerReady,
    MotdLine,
    MotdEnd,
    NickInUse,
    PingSuccess,
    ServerError,
    Disconnected,
    ChannelSelfJoin,
    ChannelJoin,
    ChannelPart,
    ChannelKick,
    ChannelQuit,
    Quit,
    NickChanged,
    ChannelNickChanged,
    ChannelTopic,
    ChannelNames,
    ChannelModeChanged,
    ChannelUserModeChanged,
    UserModeChanged,
    AwayState,
    ClientAway,
    Invite,
    ChannelMessage,
    ChannelNotice,
    ChannelAction,
    PrivateMessage,
    PrivateNotice,
    PrivateAction,
    Ctcp,
    CtcpReply,
    UnknownMessage,
    UnknownNotice,
}

impl Event {
    /// The category this event is delivered under.
    pub fn kind(&self) -> EventKind {
        match self {
            Event::ServerReady { .. } => EventKind::ServerReady,
            Event::MotdLine { .. } => EventKind::MotdLine,
            Event::MotdEnd => EventKind::MotdEnd,
            Event::NickInUse { .. } => EventKind::NickInUse,
            Event::PingSuccess { .. } => EventKind::PingSuccess,
            Event::ServerError { .. } => EventKind::ServerError,
            Event::Disconnected { .. } => EventKind::Disconnected,
            Event::ChannelSelfJoin { .. } => EventKind::ChannelSelfJoin,
            Event::ChannelJoin { .. } => EventKind::ChannelJoin,
            Event::ChannelPart { .. } => EventKind::ChannelPart,
            Event::ChannelKick { .. } => EventKind::ChannelKick,
            Event::ChannelQuit { .. } => EventKind::ChannelQuit,
            Event::Quit { .. } => EventKind::Quit,
            Event::NickChanged { .. } => EventKind::NickChanged,
            Event::ChannelNickChanged { .. } => EventKind::ChannelNickChanged,
            Event::ChannelTopic { .. } => EventKind::ChannelTopic,
            Event::ChannelNames { .. } => EventKind::ChannelNames,
            Event::ChannelModeChanged { .. } => EventKind::ChannelModeChanged,
            Event::ChannelUserModeChanged { .. } => EventKind::ChannelUserModeChanged,
            Event::UserModeChanged { .. } => EventKind::UserModeChanged,
            Event::AwayState { .. } => EventKind::AwayState,
            Event::ClientAway { .. } => EventKind::ClientAway,
            Event::Invite { .. } => EventKind::Invite,
            Event::ChannelMessage { .. } => EventKind::ChannelMessage,
            Event::ChannelNotice { .. } => EventKind::ChannelNotice,
            Event::ChannelAction { .. } => EventKind::ChannelAction,
            Event::PrivateMessage { .. } => EventKind::PrivateMessage,
            Event::PrivateNotice { .. } => EventKind::PrivateNotice,
            Event::PrivateAction { .. } => EventKind::PrivateAction,
            Event::Ctcp { .. } => EventKind::Ctcp,
            Event::CtcpReply { .. } => EventKind::CtcpReply,
            Event::UnknownMessage { .. } => EventKind::UnknownMessage,
            Event::UnknownNotice { .. } => EventKind::UnknownNotice,
        }
    }
}
