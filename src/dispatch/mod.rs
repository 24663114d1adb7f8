//! Command and numeric dispatch.
//!
//! Each handler is a plain function that interprets one kind of message:
//! it mutates the [`StateModel`] held by the [`Context`] and fires events.
//! Handlers are grouped by concern and registered into one
//! [`DispatchTable`] per session.

mod channel;
mod connection;
mod messaging;
mod user;

use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Instant;

use crate::callbacks::CallbackManager;
use crate::error::DispatchError;
use crate::event::{Event, SenderHost};
use crate::isupport::Isupport;
use crate::message::{Command, Message};
use crate::prefix::Prefix;
use crate::response::Response;
use crate::session::{Diagnostics, KeepAlive, SessionConfig, SessionState};
use crate::state::StateModel;

/// Signature shared by every handler.
pub(crate) type Handler = fn(&mut Context, &Message) -> Result<(), DispatchError>;

/// Map from command or numeric to its handler.
#[derive(Clone)]
pub struct DispatchTable {
    handlers: HashMap<Command, Handler>,
}

impl std::fmt::Debug for DispatchTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut commands: Vec<String> = self.handlers.keys().map(Command::to_string).collect();
        commands.sort();
        f.debug_struct("DispatchTable")
            .field("commands", &commands)
            .finish()
    }
}

impl Default for DispatchTable {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatchTable {
    /// Build the table with every built-in handler.
    pub fn new() -> Self {
        let mut table = DispatchTable {
            handlers: HashMap::new(),
        };
        connection::register(&mut table);
        channel::register(&mut table);
        user::register(&mut table);
        messaging::register(&mut table);
        table
    }

    pub(crate) fn named(&mut self, name: &str, handler: Handler) {
        self.handlers.insert(Command::named(name), handler);
    }

    pub(crate) fn numeric(&mut self, response: Response, handler: Handler) {
        self.handlers.insert(Command::from(response), handler);
    }

    pub(crate) fn get(&self, command: &Command) -> Option<Handler> {
        self.handlers.get(command).copied()
    }

    /// Whether a handler is registered for `command`.
    pub fn handles(&self, command: &Command) -> bool {
        self.handlers.contains_key(command)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// Everything a handler may read or change.
pub(crate) struct Context {
    pub(crate) config: SessionConfig,
    pub(crate) state: StateModel,
    pub(crate) callbacks: CallbackManager,
    pub(crate) isupport: Isupport,
    pub(crate) status: SessionState,
    /// Our current nickname.
    pub(crate) nickname: String,
    pub(crate) server_name: Option<String>,
    pub(crate) server_version: Option<String>,
    /// Index of the next alternate nickname to try during registration.
    pub(crate) nick_attempt: usize,
    /// Folded names of channels whose 332 has not yet seen a 333.
    pub(crate) pending_topics: HashSet<String>,
    pub(crate) outbox: VecDeque<Message>,
    pub(crate) keepalive: KeepAlive,
    pub(crate) diagnostics: Diagnostics,
    /// Reason recorded when the session starts closing.
    pub(crate) close_reason: Option<String>,
    /// Time the current line was received.
    pub(crate) now: Instant,
}

impl Context {
    pub(crate) fn new(config: SessionConfig, now: Instant) -> Self {
        let state = StateModel::new(config.casemapping);
        let keepalive = KeepAlive::new(config.ping_interval, config.ping_timeout, now);
        Context {
            nickname: config.nickname.clone(),
            config,
            state,
            callbacks: CallbackManager::new(),
            isupport: Isupport::new(),
            status: SessionState::Disconnected,
            server_name: None,
            server_version: None,
            nick_attempt: 0,
            pending_topics: HashSet::new(),
            outbox: VecDeque::new(),
            keepalive,
            diagnostics: Diagnostics::default(),
            close_reason: None,
            now,
        }
    }

    pub(crate) fn fire(&mut self, event: Event) {
        self.callbacks.fire(&event, &self.state);
    }

    pub(crate) fn send(&mut self, message: Message) {
        self.outbox.push_back(message);
    }

    /// Whether `nick` is us under the active casemapping.
    pub(crate) fn is_self(&self, nick: &str) -> bool {
        self.state.casemapping().equals(nick, &self.nickname)
    }

    /// `Known(host)` for a tracked client, `Unknown` otherwise.
    pub(crate) fn sender_host(&self, nick: Option<&str>) -> SenderHost {
        nick.and_then(|n| self.state.find_client(n))
            .map_or(SenderHost::Unknown, |c| SenderHost::Known(c.host()))
    }

    /// Tracked spelling of a channel name, or `channel` itself.
    pub(crate) fn channel_name(&self, channel: &str) -> String {
        self.state
            .find_channel(channel)
            .map_or_else(|| channel.to_string(), |c| c.name().to_string())
    }

    /// Tracked spelling of a nickname, or `nick` itself.
    pub(crate) fn client_name(&self, nick: &str) -> String {
        self.state
            .find_client(nick)
            .map_or_else(|| nick.to_string(), |c| c.nickname().to_string())
    }

    /// Refresh ident/host of a tracked client from a message prefix.
    pub(crate) fn touch_client(&mut self, prefix: Option<&Prefix>) {
        let Some(prefix) = prefix else { return };
        let Some(nick) = prefix.nickname() else { return };
        if let Some(client) = self.state.client_mut(nick) {
            client.update_from_prefix(prefix);
        }
    }

    /// Drop a client that shares no channel with us. We are never dropped.
    pub(crate) fn prune_client(&mut self, nick: &str) {
        if !self.is_self(nick) {
            self.state.remove_client_if_orphaned(nick);
        }
    }

    /// Begin closing the session.
    pub(crate) fn begin_close(&mut self, reason: &str) {
        if self.close_reason.is_none() {
            self.close_reason = Some(reason.to_string());
        }
        if self.status != SessionState::Disconnected {
            self.status = SessionState::Disconnecting;
        }
    }

    /// Channel name with any STATUSMSG prefix removed, if `target` names a
    /// channel.
    pub(crate) fn channel_target<'a>(&self, target: &'a str) -> Option<&'a str> {
        let statusmsg = self.isupport.statusmsg();
        let chantypes = self.isupport.chantypes();
        let stripped =
            target.trim_start_matches(|c: char| statusmsg.contains(c) && !chantypes.contains(c));
        self.isupport.is_channel(stripped).then_some(stripped)
    }
}

/// Fail unless `msg` has at least `expected` parameters.
pub(crate) fn require_params(msg: &Message, expected: usize) -> Result<(), DispatchError> {
    if msg.params.len() < expected {
        return Err(DispatchError::NotEnoughParams {
            command: msg.command.to_string(),
            expected,
            got: msg.params.len(),
        });
    }
    Ok(())
}

/// Nickname of a user-sourced message.
pub(crate) fn source_nick(msg: &Message) -> Result<&str, DispatchError> {
    msg.source_nickname()
        .ok_or_else(|| DispatchError::MissingPrefix(msg.command.to_string()))
}

/// Nickname or server name of the message source, if any.
pub(crate) fn source_name(msg: &Message) -> Option<String> {
    msg.prefix.as_ref().map(|p| match p {
        Prefix::Nickname(nick, _, _) => nick.clone(),
        Prefix::ServerName(server) => server.clone(),
    })
}
