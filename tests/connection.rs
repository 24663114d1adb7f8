//! Driver tests over an in-memory duplex stream.
//!
//! The far side of the duplex plays the server with a plain newline codec.

#![cfg(feature = "tokio")]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use irc_session::{connection, Event, EventKind, Session, SessionConfig, SessionState};
use tokio::io::DuplexStream;
use tokio::task::JoinHandle;
use tokio_util::codec::{Framed, LinesCodec};
use tokio_util::sync::CancellationToken;

type Server = Framed<DuplexStream, LinesCodec>;
type Driver = JoinHandle<(Session, Result<(), irc_session::ConnectionError>)>;

struct Harness {
    server: Server,
    driver: Driver,
    shutdown: CancellationToken,
    events: Arc<Mutex<Vec<Event>>>,
}

fn start(config: SessionConfig) -> Harness {
    let (client, server) = tokio::io::duplex(4096);
    let mut session = Session::new(config).unwrap();

    let events = Arc::new(Mutex::new(Vec::new()));
    for kind in [EventKind::ServerReady, EventKind::Disconnected] {
        let sink = Arc::clone(&events);
        session.register(kind, move |event, _| {
            sink.lock().unwrap().push(event.clone());
            Ok(())
        });
    }

    let shutdown = CancellationToken::new();
    let token = shutdown.clone();
    let driver = tokio::spawn(async move {
        let result = connection::run(&mut session, client, token).await;
        (session, result)
    });

    Harness {
        server: Framed::new(server, LinesCodec::new()),
        driver,
        shutdown,
        events,
    }
}

async fn expect_line(server: &mut Server) -> String {
    tokio::time::timeout(Duration::from_secs(5), server.next())
        .await
        .expect("timed out waiting for a line")
        .expect("stream closed")
        .expect("valid line")
}

async fn register(server: &mut Server) {
    assert_eq!(expect_line(server).await, "NICK me");
    assert_eq!(expect_line(server).await, "USER guest 0 * irc-session");
    server.send(":irc.test 001 me :Welcome to the test network").await.unwrap();
}

#[tokio::test]
async fn test_shutdown_sends_quit() {
    let Harness {
        mut server,
        driver,
        shutdown,
        events,
    } = start(SessionConfig::new("me"));

    register(&mut server).await;
    server.send(":me!u@h JOIN #rust").await.unwrap();
    assert_eq!(expect_line(&mut server).await, "MODE #rust");

    shutdown.cancel();
    assert_eq!(expect_line(&mut server).await, "QUIT :Client shutdown");

    let (session, result) = driver.await.unwrap();
    assert!(result.is_ok());
    assert_eq!(session.status(), SessionState::Disconnected);
    assert_eq!(session.state().channel_count(), 0);
    assert!(server.next().await.is_none());

    let events = events.lock().unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(
        events[1],
        Event::Disconnected {
            reason: "Client shutdown".into()
        }
    );
}

#[tokio::test]
async fn test_server_ping_is_answered() {
    let Harness {
        mut server, driver, ..
    } = start(SessionConfig::new("me"));

    register(&mut server).await;
    server.send("PING :irc.test").await.unwrap();
    assert_eq!(expect_line(&mut server).await, "PONG irc.test");

    drop(server);
    let (session, result) = driver.await.unwrap();
    assert!(result.is_ok());
    assert_eq!(session.diagnostics().malformed, 0);
}

#[tokio::test]
async fn test_peer_close_ends_session() {
    let Harness {
        mut server,
        driver,
        events,
        ..
    } = start(SessionConfig::new("me"));

    register(&mut server).await;
    drop(server);

    let (session, result) = driver.await.unwrap();
    assert!(result.is_ok());
    assert_eq!(session.status(), SessionState::Disconnected);

    let events = events.lock().unwrap();
    assert!(matches!(&events[0], Event::ServerReady { nickname, .. } if nickname == "me"));
    assert_eq!(
        events.last(),
        Some(&Event::Disconnected {
            reason: "Connection closed".into()
        })
    );
}

#[tokio::test]
async fn test_server_error_closes_connection() {
    let Harness {
        mut server,
        driver,
        events,
        ..
    } = start(SessionConfig::new("me"));

    register(&mut server).await;
    server
        .send("ERROR :Closing Link: me (Banned)")
        .await
        .unwrap();

    let (session, result) = driver.await.unwrap();
    assert!(result.is_ok());
    assert_eq!(session.status(), SessionState::Disconnected);

    let events = events.lock().unwrap();
    assert_eq!(
        events.last(),
        Some(&Event::Disconnected {
            reason: "Closing Link: me (Banned)".into()
        })
    );
}
