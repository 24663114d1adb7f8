//! Benchmarks for line tokenizing and session dispatch.

use std::time::Instant;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use irc_session::{EventKind, Message, Session, SessionConfig};

/// Simple PING message
const SIMPLE_MESSAGE: &str = "PING :irc.example.com";

/// Message with prefix
const PREFIX_MESSAGE: &str = ":nick!user@host PRIVMSG #channel :Hello, world!";

/// Message with IRCv3 tags
const TAGGED_MESSAGE: &str = "@time=2023-01-01T00:00:00.000Z;msgid=abc123;+example/tag=value :nick!user@host PRIVMSG #channel :Hello with tags!";

/// Complex message with escaped tags
const COMPLEX_TAGS: &str = "@time=2023-01-01T12:00:00Z;msgid=msg-12345;+draft/reply=parent-id;batch=batch001;account=username\\sx :nick!user@host.example.com PRIVMSG #long-channel-name :This is a longer message with more content to parse";

/// Numeric response
const NUMERIC_RESPONSE: &str = ":irc.server.net 001 nickname :Welcome to the IRC Network nickname!user@host";

fn benchmark_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("Message Parsing");

    let messages = [
        ("simple_ping", SIMPLE_MESSAGE),
        ("with_prefix", PREFIX_MESSAGE),
        ("with_tags", TAGGED_MESSAGE),
        ("complex_tags", COMPLEX_TAGS),
        ("numeric_response", NUMERIC_RESPONSE),
    ];

    for (name, line) in messages {
        group.bench_with_input(BenchmarkId::new("parse", name), line, |b, s| {
            b.iter(|| {
                let msg = Message::parse(black_box(s)).unwrap();
                black_box(msg)
            })
        });
    }

    group.finish();
}

fn registered_session() -> Session {
    let mut session = Session::new(SessionConfig::new("bench")).unwrap();
    session.connect();
    session.transport_ready(Instant::now());
    session.feed_line(":irc.example.com 001 bench :Welcome");
    session.feed_line(":bench!u@h JOIN #channel");
    for i in 0..200 {
        session.feed_line(&format!(":user{i}!u@host{i} JOIN #channel"));
    }
    while session.poll_outgoing().is_some() {}
    session
}

fn benchmark_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("Session Dispatch");

    group.bench_function("channel_message", |b| {
        let mut session = registered_session();
        session.register(EventKind::ChannelMessage, |event, _| {
            black_box(event);
            Ok(())
        });
        b.iter(|| session.feed_line(black_box(":user42!u@host42 PRIVMSG #channel :Hello, world!")))
    });

    group.bench_function("nick_change", |b| {
        let mut session = registered_session();
        let mut flip = false;
        b.iter(|| {
            let line = if flip {
                ":renamed!u@host7 NICK user7"
            } else {
                ":user7!u@host7 NICK renamed"
            };
            flip = !flip;
            session.feed_line(black_box(line))
        })
    });

    group.bench_function("join_part", |b| {
        let mut session = registered_session();
        b.iter(|| {
            session.feed_line(black_box(":visitor!v@guest JOIN #channel"));
            session.feed_line(black_box(":visitor!v@guest PART #channel :bye"));
        })
    });

    group.bench_function("names_reply", |b| {
        let mut session = registered_session();
        let names: Vec<String> = (0..50).map(|i| format!("@op{i}")).collect();
        let line = format!(":irc.example.com 353 bench = #channel :{}", names.join(" "));
        b.iter(|| session.feed_line(black_box(&line)))
    });

    group.finish();
}

criterion_group!(benches, benchmark_parsing, benchmark_dispatch);

criterion_main!(benches);
