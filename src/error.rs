//! Error types for the IRC session library.
//!
//! Each layer has its own error enum: transport/decoding problems
//! ([`ProtocolError`]), tokenizer failures ([`MessageParseError`]), handler
//! failures inside the dispatch table ([`DispatchError`]) and state model
//! lookups ([`StateError`]), plus [`ConfigError`] and [`ConnectionError`]
//! for session setup. None of the per-line errors are fatal to a
//! session; they are logged and the line is dropped.

use thiserror::Error;

/// Convenience type alias for Results using [`ProtocolError`].
pub type Result<T, E = ProtocolError> = std::result::Result<T, E>;

/// Top-level protocol errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProtocolError {
    /// I/O error during reading or writing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The configured text encoding label is not known.
    #[error("unknown encoding: {0}")]
    UnknownEncoding(String),
}

/// Errors encountered when tokenizing IRC lines.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum MessageParseError {
    /// Line was empty (or only whitespace).
    #[error("empty message")]
    EmptyMessage,

    /// Command was invalid or missing.
    #[error("invalid command")]
    InvalidCommand,

    /// Parsing error with position information.
    #[error("parsing failed at position {position}: {context}")]
    ParseContext {
        /// Character position where parsing failed.
        position: usize,
        /// Description of what was being parsed.
        context: String,
    },
}

/// Errors raised by a dispatch handler while interpreting a message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DispatchError {
    /// Not enough parameters for the command.
    #[error("{command}: not enough parameters: expected {expected}, got {got}")]
    NotEnoughParams {
        /// Command or numeric as sent.
        command: String,
        /// Minimum parameter count.
        expected: usize,
        /// Actual parameter count.
        got: usize,
    },

    /// The command requires a user prefix but none (or a server) was given.
    #[error("{0}: missing or non-user prefix")]
    MissingPrefix(String),

    /// A state model operation failed.
    #[error(transparent)]
    State(#[from] StateError),
}

/// Errors returned by state model operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StateError {
    /// No client is tracked under that nickname.
    #[error("no such client: {0}")]
    NoSuchClient(String),

    /// No channel is tracked under that name.
    #[error("no such channel: {0}")]
    NoSuchChannel(String),
}

/// Errors returned from session construction.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// The nickname is empty or contains illegal characters.
    #[error("invalid nickname: {0:?}")]
    InvalidNickname(String),

    /// The configured text encoding label is not known.
    #[error("unknown encoding: {0}")]
    UnknownEncoding(String),

    /// A keep-alive duration is zero.
    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),

    /// The maximum line length is too small to hold a message.
    #[error("maximum line length {0} is too small")]
    InvalidLineLength(usize),
}

/// Errors opening or driving a connection.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConnectionError {
    /// The TCP connect did not complete in time.
    #[error("connection to {addr} timed out after {timeout:?}")]
    Timeout {
        /// Address being dialled.
        addr: String,
        /// Configured connect timeout.
        timeout: std::time::Duration,
    },

    /// Socket error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Framing or decoding failure on an established stream.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ProtocolError::UnknownEncoding("klingon".to_string());
        assert_eq!(format!("{}", err), "unknown encoding: klingon");

        let err = DispatchError::NotEnoughParams {
            command: "333".to_string(),
            expected: 4,
            got: 2,
        };
        assert_eq!(
            format!("{}", err),
            "333: not enough parameters: expected 4, got 2"
        );
    }

    #[test]
    fn test_connection_error_chaining() {
        let protocol_err = ProtocolError::UnknownEncoding("klingon".to_string());
        let err: ConnectionError = protocol_err.into();
        assert_eq!(err.to_string(), "unknown encoding: klingon");

        let err = ConnectionError::Timeout {
            addr: "irc.example.org:6667".to_string(),
            timeout: std::time::Duration::from_secs(10),
        };
        assert_eq!(
            err.to_string(),
            "connection to irc.example.org:6667 timed out after 10s"
        );
    }

    #[test]
    fn test_state_error_is_transparent() {
        let err: DispatchError = StateError::NoSuchChannel("#gone".into()).into();
        assert_eq!(err.to_string(), "no such channel: #gone");
    }

    #[test]
    fn test_error_conversion() {
        let io_err =
            std::io::Error::new(std::io::ErrorKind::ConnectionReset, "connection reset");
        let protocol_err: ProtocolError = io_err.into();

        match protocol_err {
            ProtocolError::Io(_) => {}
            _ => panic!("Expected Io variant"),
        }
    }
}
