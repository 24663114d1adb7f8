//! # irc-session
//!
//! Client-side IRC session parsing: raw server lines in, a live model of
//! channels and users plus typed events out.
//!
//! ## Features
//!
//! - Line framing with configurable text encoding and length limits
//! - Message tokenizing with IRCv3 tags, prefixes, commands and parameters
//! - A case-insensitive state model of clients, channels and memberships
//! - A dispatch table of handlers for commands and numerics
//! - Ordered listener callbacks isolated from each other's failures
//! - A sans-IO session state machine with keep-alive
//! - Optional Tokio integration (codec, TCP connect, session driver)

#![deny(clippy::all)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! ## Quick Start
//!
//! ```rust
//! use irc_session::{Event, EventKind, Session, SessionConfig};
//!
//! let mut session = Session::new(SessionConfig::new("ferris")).unwrap();
//! session.register(EventKind::ChannelTopic, |event, state| {
//!     if let Event::ChannelTopic { channel, topic, .. } = event {
//!         let members = state.list_members(channel).len();
//!         println!("{channel} ({members} members): {topic}");
//!     }
//!     Ok(())
//! });
//!
//! session.connect();
//! session.transport_ready(std::time::Instant::now());
//! for line in [
//!     ":irc.example.org 001 ferris :Welcome",
//!     ":ferris!crab@example.org JOIN #rust",
//!     ":irc.example.org 332 ferris #rust :Systems programming",
//!     ":irc.example.org 333 ferris #rust alice 1207350306",
//! ] {
//!     session.feed_line(line);
//! }
//!
//! let channel = session.state().find_channel("#RUST").unwrap();
//! assert_eq!(channel.topic_time(), 1207350306);
//! ```

pub mod callbacks;
pub mod casemap;
#[cfg(feature = "tokio")]
#[cfg_attr(docsrs, doc(cfg(feature = "tokio")))]
pub mod connection;
pub mod ctcp;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod isupport;
#[cfg(feature = "tokio")]
#[cfg_attr(docsrs, doc(cfg(feature = "tokio")))]
pub mod line;
pub mod message;
pub mod mode;
pub mod prefix;
pub mod response;
pub mod session;
pub mod state;

pub use self::callbacks::{CallbackHandle, CallbackManager};
pub use self::casemap::{irc_eq, irc_to_lower, CaseMapping};
pub use self::dispatch::DispatchTable;
pub use self::error::{
    ConfigError, ConnectionError, DispatchError, MessageParseError, ProtocolError, StateError,
};
pub use self::event::{Event, EventKind, SenderHost};
pub use self::isupport::{ChanModes, Isupport, IsupportEntry, PrefixSpec};
#[cfg(feature = "tokio")]
pub use self::line::LineCodec;
pub use self::message::{Command, Message, Tag};
pub use self::mode::ModeChange;
pub use self::prefix::Prefix;
pub use self::response::Response;
pub use self::session::{Diagnostics, Session, SessionConfig, SessionState, MAX_IRC_LINE_LEN};
pub use self::state::{ChannelClientInfo, ChannelInfo, ClientInfo, StateModel};
