//! Fuzz target for IRC line framing and tokenizing
//!
//! Feeds arbitrary bytes through the line codec and tokenizes every line
//! it yields. Neither step may panic.

#![no_main]

use bytes::BytesMut;
use libfuzzer_sys::fuzz_target;
use tokio_util::codec::Decoder;

fuzz_target!(|data: &[u8]| {
    if data.len() > 4096 {
        return;
    }

    let mut codec = irc_session::LineCodec::with_encoding(encoding_rs::UTF_8, 64);
    let mut buf = BytesMut::from(data);
    while let Ok(Some(line)) = codec.decode_eof(&mut buf) {
        let _ = irc_session::Message::parse(&line);
    }
});
