//! Fuzz target for session dispatch
//!
//! Every line of the input is fed to a registered session. Handlers must
//! reject bad input with an error, never a panic, and the state model must
//! stay consistent afterwards.

#![no_main]

use std::time::Instant;

use irc_session::{Session, SessionConfig};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };
    if input.len() > 8192 {
        return;
    }

    let Ok(mut session) = Session::new(SessionConfig::new("fuzz")) else {
        return;
    };
    session.connect();
    session.transport_ready(Instant::now());
    session.feed_line(":irc.fuzz 001 fuzz :Welcome");
    for line in input.lines() {
        session.feed_line(line);
        while session.poll_outgoing().is_some() {}
    }
    assert_eq!(session.state().dangling_relations(), 0);
});
