//! Tokio driver for a [`Session`].
//!
//! [`run`] frames a byte stream with [`LineCodec`], feeds every line to the
//! session, ticks its keep-alive timer and writes whatever it queues. The
//! loop ends when the peer closes the stream, the session asks to close, or
//! the shutdown token is cancelled; a pending read never delays shutdown.

use std::fmt;
use std::time::{Duration, Instant};

use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::time::MissedTickBehavior;
use tokio_util::codec::Framed;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::error::ConnectionError;
use crate::line::LineCodec;
use crate::message::Message;
use crate::session::{Session, SessionState};

const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Open a TCP connection with keep-alive enabled.
pub async fn connect<A>(addr: A, timeout: Duration) -> Result<TcpStream, ConnectionError>
where
    A: ToSocketAddrs + fmt::Display,
{
    let label = addr.to_string();
    let stream = tokio::time::timeout(timeout, TcpStream::connect(addr))
        .await
        .map_err(|_| ConnectionError::Timeout {
            addr: label.clone(),
            timeout,
        })??;

    if let Err(err) = enable_keepalive(&stream) {
        warn!(addr = %label, error = %err, "failed to enable TCP keepalive");
    }
    info!(addr = %label, "connected");
    Ok(stream)
}

fn enable_keepalive(stream: &TcpStream) -> std::io::Result<()> {
    use socket2::{SockRef, TcpKeepalive};

    let sock = SockRef::from(stream);
    let keepalive = TcpKeepalive::new()
        .with_time(Duration::from_secs(120))
        .with_interval(Duration::from_secs(30));

    sock.set_tcp_keepalive(&keepalive)
}

/// Drive `session` over `stream` until either side closes.
///
/// The session is moved to `Registering` on entry and is always back in
/// [`SessionState::Disconnected`] on return, with its `Disconnected` event
/// fired exactly once.
pub async fn run<S>(
    session: &mut Session,
    stream: S,
    shutdown: CancellationToken,
) -> Result<(), ConnectionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let codec = LineCodec::with_encoding(session.encoding(), session.config().max_line_length);
    let mut framed = Framed::new(stream, codec);

    if session.status() == SessionState::Disconnected {
        session.connect();
    }
    session.transport_ready(Instant::now());

    let mut ticker = tokio::time::interval(TICK_PERIOD);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let result = loop {
        if let Err(err) = flush(session, &mut framed).await {
            break Err(err);
        }
        if session.wants_close() {
            debug!(reason = ?session.close_reason(), "closing transport");
            break Ok(());
        }

        tokio::select! {
            _ = shutdown.cancelled() => {
                session.disconnect("Client shutdown");
            }
            line = framed.next() => match line {
                Some(Ok(line)) => session.feed_line(&line),
                Some(Err(err)) => break Err(err.into()),
                None => {
                    debug!("peer closed the connection");
                    break Ok(());
                }
            },
            _ = ticker.tick() => session.tick(Instant::now()),
        }
    };

    let reason = match &result {
        Ok(()) => "Connection closed".to_string(),
        Err(err) => err.to_string(),
    };
    if let Err(err) = SinkExt::<Message>::close(&mut framed).await {
        debug!(error = %err, "error closing transport");
    }
    session.transport_closed(&reason);
    result
}

async fn flush<S>(
    session: &mut Session,
    framed: &mut Framed<S, LineCodec>,
) -> Result<(), ConnectionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    if !session.has_outgoing() {
        return Ok(());
    }
    while let Some(message) = session.poll_outgoing() {
        trace!(%message, ">>");
        framed.feed(message).await?;
    }
    SinkExt::<Message>::flush(framed).await?;
    Ok(())
}
