//! Sans-IO session state machine.
//!
//! A [`Session`] owns everything one server connection needs: the state
//! model, the dispatch table, listener registrations and the keep-alive
//! timer. It performs no I/O. The caller feeds it received lines and
//! clock ticks and drains the messages it wants sent; [`crate::connection`]
//! does exactly that over a tokio stream.
//!
//! # Example
//!
//! ```
//! use std::time::Instant;
//! use irc_session::{Event, EventKind, Session, SessionConfig, SessionState};
//!
//! let config = SessionConfig::new("ferris").with_username("crab");
//! let mut session = Session::new(config).unwrap();
//!
//! session.register(EventKind::ServerReady, |event, _state| {
//!     if let Event::ServerReady { nickname, .. } = event {
//!         println!("registered as {nickname}");
//!     }
//!     Ok(())
//! });
//!
//! session.connect();
//! session.transport_ready(Instant::now());
//! while let Some(message) = session.poll_outgoing() {
//!     // write `message` to the socket
//!     let _ = message.to_string();
//! }
//!
//! session.feed_line(":irc.example.org 001 ferris :Welcome");
//! assert_eq!(session.status(), SessionState::Connected);
//! ```

use std::fmt;
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{debug, info, trace, warn};

use crate::callbacks::{CallbackHandle, CallbackManager};
use crate::casemap::CaseMapping;
use crate::dispatch::{Context, DispatchTable};
use crate::error::ConfigError;
use crate::event::{Event, EventKind};
use crate::isupport::Isupport;
use crate::message::Message;
use crate::state::StateModel;

/// Longest line accepted from the server, in bytes, terminator excluded.
pub const MAX_IRC_LINE_LEN: usize = 8191;

const DEFAULT_PING_INTERVAL: Duration = Duration::from_secs(120);
const DEFAULT_PING_TIMEOUT: Duration = Duration::from_secs(60);

/// Lifecycle of a session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SessionState {
    /// No transport.
    #[default]
    Disconnected,
    /// A transport is being opened.
    Connecting,
    /// Transport open, NICK/USER sent, waiting for 001.
    Registering,
    /// Registered with the server.
    Connected,
    /// QUIT sent or ERROR received; waiting for the transport to close.
    Disconnecting,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Disconnected => "disconnected",
            SessionState::Connecting => "connecting",
            SessionState::Registering => "registering",
            SessionState::Connected => "connected",
            SessionState::Disconnecting => "disconnecting",
        };
        f.write_str(name)
    }
}

/// Connection parameters supplied at session start.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SessionConfig {
    /// Desired nickname.
    pub nickname: String,
    /// Tried in order if the server rejects the nickname during registration.
    pub alternate_nicknames: Vec<String>,
    /// Username (ident).
    pub username: String,
    /// Real name / GECOS.
    pub realname: String,
    /// Server password, sent as PASS.
    pub password: Option<String>,
    /// Text encoding label, as understood by `encoding_rs`.
    pub encoding: String,
    /// Casemapping used until the server advertises one.
    pub casemapping: CaseMapping,
    /// Silence after which a keep-alive PING is sent.
    pub ping_interval: Duration,
    /// How long to wait for a reply to that PING.
    pub ping_timeout: Duration,
    /// Longest accepted line, in bytes.
    pub max_line_length: usize,
    /// Send `MODE <channel>` after joining.
    pub request_modes_on_join: bool,
    /// Channels joined as soon as registration completes.
    pub autojoin: Vec<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            nickname: "guest".to_string(),
            alternate_nicknames: Vec::new(),
            username: "guest".to_string(),
            realname: "irc-session".to_string(),
            password: None,
            encoding: "utf-8".to_string(),
            casemapping: CaseMapping::default(),
            ping_interval: DEFAULT_PING_INTERVAL,
            ping_timeout: DEFAULT_PING_TIMEOUT,
            max_line_length: MAX_IRC_LINE_LEN,
            request_modes_on_join: true,
            autojoin: Vec::new(),
        }
    }
}

impl SessionConfig {
    /// Defaults with the given nickname.
    pub fn new(nickname: impl Into<String>) -> Self {
        SessionConfig {
            nickname: nickname.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_alternate_nicknames<I, S>(mut self, nicknames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.alternate_nicknames = nicknames.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    #[must_use]
    pub fn with_realname(mut self, realname: impl Into<String>) -> Self {
        self.realname = realname.into();
        self
    }

    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    #[must_use]
    pub fn with_encoding(mut self, label: impl Into<String>) -> Self {
        self.encoding = label.into();
        self
    }

    #[must_use]
    pub fn with_casemapping(mut self, casemapping: CaseMapping) -> Self {
        self.casemapping = casemapping;
        self
    }

    #[must_use]
    pub fn with_ping(mut self, interval: Duration, timeout: Duration) -> Self {
        self.ping_interval = interval;
        self.ping_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_max_line_length(mut self, max: usize) -> Self {
        self.max_line_length = max;
        self
    }

    #[must_use]
    pub fn with_request_modes_on_join(mut self, request: bool) -> Self {
        self.request_modes_on_join = request;
        self
    }

    #[must_use]
    pub fn with_autojoin<I, S>(mut self, channels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.autojoin = channels.into_iter().map(Into::into).collect();
        self
    }

    /// Check the configuration and resolve its encoding.
    pub fn validate(&self) -> Result<&'static encoding::Encoding, ConfigError> {
        validate_nickname(&self.nickname)?;
        for alt in &self.alternate_nicknames {
            validate_nickname(alt)?;
        }
        if self.ping_interval.is_zero() {
            return Err(ConfigError::ZeroDuration("ping interval"));
        }
        if self.ping_timeout.is_zero() {
            return Err(ConfigError::ZeroDuration("ping timeout"));
        }
        if self.max_line_length < 16 {
            return Err(ConfigError::InvalidLineLength(self.max_line_length));
        }
        encoding::Encoding::for_label(self.encoding.as_bytes())
            .ok_or_else(|| ConfigError::UnknownEncoding(self.encoding.clone()))
    }
}

fn validate_nickname(nick: &str) -> Result<(), ConfigError> {
    let bad_start = nick.starts_with([':', '#', '&']) || nick.starts_with(|c: char| c.is_ascii_digit());
    let bad_char = nick.contains(|c: char| matches!(c, ' ' | ',' | '*' | '?' | '!' | '@' | '\r' | '\n' | '\0'));
    if nick.is_empty() || bad_start || bad_char {
        return Err(ConfigError::InvalidNickname(nick.to_string()));
    }
    Ok(())
}

/// Counters describing what a session has seen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Diagnostics {
    /// Lines fed to the session.
    pub lines: u64,
    /// Lines that could not be tokenized.
    pub malformed: u64,
    /// Messages with no handler.
    pub unhandled: u64,
    /// Messages whose handler failed.
    pub handler_errors: u64,
}

/// What the keep-alive timer wants done.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum KeepAliveAction {
    Idle,
    SendPing,
    TimedOut,
}

/// Tracks traffic so silence can be probed with PING.
#[derive(Clone, Debug)]
pub(crate) struct KeepAlive {
    interval: Duration,
    timeout: Duration,
    last_received: Instant,
    ping_sent: Option<Instant>,
}

impl KeepAlive {
    pub(crate) fn new(interval: Duration, timeout: Duration, now: Instant) -> Self {
        KeepAlive {
            interval,
            timeout,
            last_received: now,
            ping_sent: None,
        }
    }

    pub(crate) fn reset(&mut self, now: Instant) {
        self.last_received = now;
        self.ping_sent = None;
    }

    pub(crate) fn line_received(&mut self, now: Instant) {
        self.last_received = now;
    }

    /// Clear the outstanding PING, returning its round trip.
    pub(crate) fn pong_received(&mut self, now: Instant) -> Option<Duration> {
        self.ping_sent
            .take()
            .map(|sent| now.saturating_duration_since(sent))
    }

    pub(crate) fn poll(&mut self, now: Instant) -> KeepAliveAction {
        if let Some(sent) = self.ping_sent {
            if sent >= self.last_received {
                return if now.saturating_duration_since(sent) >= self.timeout {
                    KeepAliveAction::TimedOut
                } else {
                    KeepAliveAction::Idle
                };
            }
        }
        if now.saturating_duration_since(self.last_received) >= self.interval {
            self.ping_sent = Some(now);
            KeepAliveAction::SendPing
        } else {
            KeepAliveAction::Idle
        }
    }
}

/// One client-side IRC session.
pub struct Session {
    table: DispatchTable,
    ctx: Context,
    encoding: &'static encoding::Encoding,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("status", &self.ctx.status)
            .field("nickname", &self.ctx.nickname)
            .field("channels", &self.ctx.state.channel_count())
            .field("clients", &self.ctx.state.client_count())
            .field("callbacks", &self.ctx.callbacks)
            .field("diagnostics", &self.ctx.diagnostics)
            .finish()
    }
}

impl Session {
    /// Validate `config` and build a disconnected session.
    pub fn new(config: SessionConfig) -> Result<Self, ConfigError> {
        let encoding = config.validate()?;
        Ok(Session {
            table: DispatchTable::new(),
            ctx: Context::new(config, Instant::now()),
            encoding,
        })
    }

    // === Queries ===

    pub fn config(&self) -> &SessionConfig {
        &self.ctx.config
    }

    pub fn status(&self) -> SessionState {
        self.ctx.status
    }

    /// The state model. Read-only: only handlers and the session mutate it.
    pub fn state(&self) -> &StateModel {
        &self.ctx.state
    }

    pub fn isupport(&self) -> &Isupport {
        &self.ctx.isupport
    }

    /// Our current nickname.
    pub fn nickname(&self) -> &str {
        &self.ctx.nickname
    }

    pub fn server_name(&self) -> Option<&str> {
        self.ctx.server_name.as_deref()
    }

    pub fn server_version(&self) -> Option<&str> {
        self.ctx.server_version.as_deref()
    }

    pub fn diagnostics(&self) -> Diagnostics {
        self.ctx.diagnostics
    }

    /// Encoding used on the wire.
    pub fn encoding(&self) -> &'static encoding::Encoding {
        self.encoding
    }

    pub fn dispatch_table(&self) -> &DispatchTable {
        &self.table
    }

    // === Listeners ===

    pub fn register<F>(&mut self, kind: EventKind, listener: F) -> CallbackHandle
    where
        F: FnMut(&Event, &StateModel) -> anyhow::Result<()> + Send + 'static,
    {
        self.ctx.callbacks.register(kind, listener)
    }

    pub fn unregister(&mut self, handle: CallbackHandle) -> bool {
        self.ctx.callbacks.unregister(handle)
    }

    pub fn callbacks(&self) -> &CallbackManager {
        &self.ctx.callbacks
    }

    pub fn callbacks_mut(&mut self) -> &mut CallbackManager {
        &mut self.ctx.callbacks
    }

    // === Lifecycle ===

    /// A transport is about to be opened.
    pub fn connect(&mut self) {
        if self.ctx.status != SessionState::Disconnected {
            warn!(status = %self.ctx.status, "connect while not disconnected");
            return;
        }
        self.ctx.status = SessionState::Connecting;
        self.ctx.close_reason = None;
    }

    /// The transport is open: queue PASS, NICK and USER.
    pub fn transport_ready(&mut self, now: Instant) {
        if self.ctx.status != SessionState::Connecting {
            warn!(status = %self.ctx.status, "transport ready while not connecting");
            return;
        }
        self.ctx.status = SessionState::Registering;
        self.ctx.now = now;
        self.ctx.keepalive.reset(now);
        self.ctx.nickname = self.ctx.config.nickname.clone();
        self.ctx.nick_attempt = 0;

        if let Some(password) = self.ctx.config.password.clone() {
            self.ctx.send(Message::new("PASS", [password]));
        }
        let nick = self.ctx.nickname.clone();
        self.ctx.send(Message::new("NICK", [nick]));
        let user = Message::new(
            "USER",
            [
                self.ctx.config.username.clone(),
                "0".to_string(),
                "*".to_string(),
                self.ctx.config.realname.clone(),
            ],
        );
        self.ctx.send(user);
    }

    /// Process one received line.
    pub fn feed_line(&mut self, line: &str) {
        self.feed_line_at(line, Instant::now());
    }

    /// Process one received line, with an explicit receive time.
    ///
    /// Malformed lines and handler failures are logged and counted; they
    /// never stop the session.
    pub fn feed_line_at(&mut self, line: &str, now: Instant) {
        if self.ctx.status == SessionState::Disconnected {
            debug!(%line, "line received while disconnected");
            return;
        }
        self.ctx.now = now;
        self.ctx.keepalive.line_received(now);
        self.ctx.diagnostics.lines += 1;
        trace!(%line, "<<");

        let message = match Message::parse(line) {
            Ok(message) => message,
            Err(err) => {
                self.ctx.diagnostics.malformed += 1;
                warn!(%line, error = %err, "dropping malformed line");
                return;
            }
        };

        match self.table.get(&message.command) {
            Some(handler) => {
                if let Err(err) = handler(&mut self.ctx, &message) {
                    self.ctx.diagnostics.handler_errors += 1;
                    warn!(command = %message.command, error = %err, "failed to handle message");
                }
            }
            None => {
                self.ctx.diagnostics.unhandled += 1;
                debug!(command = %message.command, "unhandled command");
            }
        }
    }

    /// Advance the keep-alive timer.
    pub fn tick(&mut self, now: Instant) {
        if self.ctx.status != SessionState::Connected {
            return;
        }
        match self.ctx.keepalive.poll(now) {
            KeepAliveAction::Idle => {}
            KeepAliveAction::SendPing => {
                let token = format!("LAG{}", Utc::now().timestamp_millis());
                trace!(%token, "sending keep-alive");
                self.ctx.send(Message::new("PING", [token]));
            }
            KeepAliveAction::TimedOut => {
                warn!(timeout = ?self.ctx.config.ping_timeout, "keep-alive timed out");
                self.ctx.begin_close("Ping timeout");
            }
        }
    }

    /// Start closing. A QUIT is queued if the server would accept one.
    pub fn disconnect(&mut self, reason: &str) {
        match self.ctx.status {
            SessionState::Registering | SessionState::Connected => {
                self.ctx.send(Message::new("QUIT", [reason]));
                self.ctx.begin_close(reason);
            }
            SessionState::Connecting => self.ctx.begin_close(reason),
            SessionState::Disconnecting | SessionState::Disconnected => {}
        }
    }

    /// Whether the driver should close the transport once output is flushed.
    pub fn wants_close(&self) -> bool {
        self.ctx.status == SessionState::Disconnecting
    }

    /// Why the session is closing, if it is.
    pub fn close_reason(&self) -> Option<&str> {
        self.ctx.close_reason.as_deref()
    }

    /// The transport is gone. Wipes all connection state and fires
    /// [`Event::Disconnected`] once; later calls do nothing.
    pub fn transport_closed(&mut self, reason: &str) {
        if self.ctx.status == SessionState::Disconnected {
            return;
        }
        let reason = self
            .ctx
            .close_reason
            .take()
            .unwrap_or_else(|| reason.to_string());
        info!(%reason, "disconnected");

        self.ctx.status = SessionState::Disconnected;
        self.ctx.state.clear();
        self.ctx.state.set_casemapping(self.ctx.config.casemapping);
        self.ctx.isupport = Isupport::new();
        self.ctx.pending_topics.clear();
        self.ctx.outbox.clear();
        self.ctx.server_name = None;
        self.ctx.server_version = None;
        self.ctx.fire(Event::Disconnected { reason });
    }

    // === Output ===

    /// Queue a message for the server.
    pub fn send(&mut self, message: Message) {
        self.ctx.send(message);
    }

    /// Next message to write, oldest first.
    pub fn poll_outgoing(&mut self) -> Option<Message> {
        self.ctx.outbox.pop_front()
    }

    pub fn has_outgoing(&self) -> bool {
        !self.ctx.outbox.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(session: &mut Session) -> Vec<String> {
        std::iter::from_fn(|| session.poll_outgoing())
            .map(|m| m.to_string())
            .collect()
    }

    fn registered() -> Session {
        let mut session = Session::new(SessionConfig::new("me")).unwrap();
        session.connect();
        session.transport_ready(Instant::now());
        session.feed_line(":irc.example.org 001 me :Welcome");
        drain(&mut session);
        session
    }

    #[test]
    fn test_registration_sequence() {
        let config = SessionConfig::new("me")
            .with_password("secret")
            .with_username("ident")
            .with_realname("Real Name");
        let mut session = Session::new(config).unwrap();
        assert_eq!(session.status(), SessionState::Disconnected);

        session.connect();
        assert_eq!(session.status(), SessionState::Connecting);
        session.transport_ready(Instant::now());
        assert_eq!(session.status(), SessionState::Registering);
        assert_eq!(
            drain(&mut session),
            vec!["PASS secret", "NICK me", "USER ident 0 * :Real Name"]
        );

        session.feed_line(":irc.example.org 001 me :Welcome");
        assert_eq!(session.status(), SessionState::Connected);
        assert_eq!(session.server_name(), Some("irc.example.org"));
    }

    #[test]
    fn test_autojoin_after_welcome() {
        let config = SessionConfig::new("me").with_autojoin(["#rust", "#tokio"]);
        let mut session = Session::new(config).unwrap();
        session.connect();
        session.transport_ready(Instant::now());
        drain(&mut session);

        session.feed_line(":irc.example.org 001 me :Welcome");
        assert_eq!(drain(&mut session), vec!["JOIN #rust", "JOIN #tokio"]);
    }

    #[test]
    fn test_nick_in_use_tries_alternates() {
        let config = SessionConfig::new("me").with_alternate_nicknames(["me2"]);
        let mut session = Session::new(config).unwrap();
        session.connect();
        session.transport_ready(Instant::now());
        drain(&mut session);

        session.feed_line(":srv 433 * me :Nickname is already in use");
        assert_eq!(drain(&mut session), vec!["NICK me2"]);
        session.feed_line(":srv 433 * me2 :Nickname is already in use");
        assert_eq!(drain(&mut session), vec!["NICK me2_"]);

        session.feed_line(":srv 001 me2_ :Welcome");
        assert_eq!(session.nickname(), "me2_");
    }

    #[test]
    fn test_ping_gets_pong() {
        let mut session = registered();
        session.feed_line("PING :irc.example.org");
        assert_eq!(drain(&mut session), vec!["PONG irc.example.org"]);
    }

    #[test]
    fn test_keepalive_ping_then_timeout() {
        let config = SessionConfig::new("me").with_ping(Duration::from_secs(30), Duration::from_secs(10));
        let mut session = Session::new(config).unwrap();
        let start = Instant::now();
        session.connect();
        session.transport_ready(start);
        session.feed_line_at(":srv 001 me :Welcome", start);
        drain(&mut session);

        session.tick(start + Duration::from_secs(29));
        assert!(!session.has_outgoing());

        session.tick(start + Duration::from_secs(30));
        let out = drain(&mut session);
        assert_eq!(out.len(), 1);
        assert!(out[0].starts_with("PING LAG"));

        session.tick(start + Duration::from_secs(35));
        assert_eq!(session.status(), SessionState::Connected);

        session.tick(start + Duration::from_secs(40));
        assert_eq!(session.status(), SessionState::Disconnecting);
        assert_eq!(session.close_reason(), Some("Ping timeout"));
    }

    #[test]
    fn test_pong_reports_lag() {
        let config = SessionConfig::new("me").with_ping(Duration::from_secs(30), Duration::from_secs(10));
        let mut session = Session::new(config).unwrap();
        let start = Instant::now();
        session.connect();
        session.transport_ready(start);
        session.feed_line_at(":srv 001 me :Welcome", start);

        let lag = std::sync::Arc::new(std::sync::Mutex::new(None));
        let seen = std::sync::Arc::clone(&lag);
        session.register(EventKind::PingSuccess, move |event, _| {
            if let Event::PingSuccess { lag } = event {
                *seen.lock().unwrap() = Some(*lag);
            }
            Ok(())
        });

        session.tick(start + Duration::from_secs(30));
        session.feed_line_at(":srv PONG srv :LAG1", start + Duration::from_secs(32));
        assert_eq!(*lag.lock().unwrap(), Some(Duration::from_secs(2)));

        session.tick(start + Duration::from_secs(45));
        assert_eq!(session.status(), SessionState::Connected);
    }

    #[test]
    fn test_disconnect_queues_quit() {
        let mut session = registered();
        session.disconnect("bye");
        assert_eq!(drain(&mut session), vec!["QUIT bye"]);
        assert!(session.wants_close());
        session.disconnect("again");
        assert!(!session.has_outgoing());
    }

    #[test]
    fn test_transport_closed_fires_once_and_clears() {
        let mut session = registered();
        session.feed_line(":me!u@h JOIN #rust");
        assert_eq!(session.state().channel_count(), 1);

        let count = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let seen = std::sync::Arc::clone(&count);
        session.register(EventKind::Disconnected, move |event, state| {
            if let Event::Disconnected { reason } = event {
                seen.lock().unwrap().push((reason.clone(), state.channel_count()));
            }
            Ok(())
        });

        session.transport_closed("connection reset");
        session.transport_closed("connection reset");

        assert_eq!(*count.lock().unwrap(), vec![("connection reset".to_string(), 0)]);
        assert_eq!(session.status(), SessionState::Disconnected);
        assert_eq!(session.state().client_count(), 0);
    }

    #[test]
    fn test_error_sets_close_reason() {
        let mut session = registered();
        session.feed_line("ERROR :Closing Link: banned");
        assert!(session.wants_close());
        session.transport_closed("eof");
        assert_eq!(session.status(), SessionState::Disconnected);
        assert_eq!(session.close_reason(), None);
    }

    #[test]
    fn test_config_validation() {
        assert!(matches!(
            Session::new(SessionConfig::new("")),
            Err(ConfigError::InvalidNickname(_))
        ));
        assert!(matches!(
            Session::new(SessionConfig::new("two words")),
            Err(ConfigError::InvalidNickname(_))
        ));
        assert!(matches!(
            Session::new(SessionConfig::new("me").with_encoding("klingon")),
            Err(ConfigError::UnknownEncoding(_))
        ));
        assert!(matches!(
            Session::new(SessionConfig::new("me").with_ping(Duration::ZERO, Duration::from_secs(1))),
            Err(ConfigError::ZeroDuration(_))
        ));
        let session = Session::new(SessionConfig::new("me").with_encoding("latin1")).unwrap();
        assert_eq!(session.encoding(), encoding::WINDOWS_1252);
    }

    #[test]
    fn test_malformed_and_unhandled_are_counted() {
        let mut session = registered();
        session.feed_line("");
        session.feed_line(":lonely.prefix");
        session.feed_line(":srv WALLOPS :hello");
        session.feed_line(":srv 333 me #chan");
        let diag = session.diagnostics();
        assert_eq!(diag.malformed, 2);
        assert_eq!(diag.unhandled, 1);
        assert_eq!(diag.handler_errors, 1);
        assert_eq!(session.status(), SessionState::Connected);
    }

    #[test]
    fn test_session_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<Session>();
    }
}
