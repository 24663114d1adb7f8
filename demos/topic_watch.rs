//! Topic watcher example
//!
//! Connects to a server, joins the channels given on the command line and
//! prints every topic it learns about, along with who set it and when.
//!
//! ```text
//! cargo run --example topic_watch -- irc.libera.chat:6667 '#rust' '#tokio'
//! ```
//!
//! Press Ctrl-C to quit cleanly.

use std::time::Duration;

use chrono::{TimeZone, Utc};
use irc_session::{connection, Event, EventKind, Session, SessionConfig};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "irc_session=info".into()),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let server = args
        .next()
        .unwrap_or_else(|| "irc.libera.chat:6667".to_string());
    let mut channels: Vec<String> = args.collect();
    if channels.is_empty() {
        channels.push("#rust".to_string());
    }

    let config = SessionConfig::new("topic_watch")
        .with_alternate_nicknames(["topic_watch_", "topic_watch__"])
        .with_realname("irc-session topic watcher")
        .with_autojoin(channels);
    let mut session = Session::new(config)?;

    session.register(EventKind::ServerReady, |event, _| {
        if let Event::ServerReady { server, nickname } = event {
            println!("registered on {server} as {nickname}");
        }
        Ok(())
    });

    session.register(EventKind::ChannelTopic, |event, state| {
        let Event::ChannelTopic {
            channel,
            topic,
            setter,
            time,
            is_join_topic,
        } = event
        else {
            return Ok(());
        };

        let when = Utc
            .timestamp_opt(*time, 0)
            .single()
            .map_or_else(|| "unknown time".to_string(), |t| t.to_rfc2822());
        let members = state.list_members(channel).len();
        let verb = if *is_join_topic { "topic is" } else { "topic changed to" };
        println!("{channel} ({members} members) {verb}: {topic}");
        println!("    set by {setter} on {when}");
        Ok(())
    });

    session.register(EventKind::Disconnected, |event, _| {
        if let Event::Disconnected { reason } = event {
            println!("disconnected: {reason}");
        }
        Ok(())
    });

    let shutdown = CancellationToken::new();
    let ctrl_c = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    let stream = connection::connect(server.as_str(), Duration::from_secs(15)).await?;
    connection::run(&mut session, stream, shutdown).await?;
    Ok(())
}
