//! CTCP framing inside PRIVMSG and NOTICE bodies.
//!
//! A CTCP body is wrapped in `\x01` delimiters: `\x01VERSION\x01`,
//! `\x01ACTION waves\x01`. The closing delimiter is optional on the wire.

use std::fmt;

const DELIM: char = '\u{1}';

/// Well-known CTCP commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CtcpKind {
    Action,
    ClientInfo,
    Ping,
    Source,
    Time,
    Version,
    Unknown(String),
}

impl From<&str> for CtcpKind {
    fn from(command: &str) -> Self {
        match command.to_ascii_uppercase().as_str() {
            "ACTION" => CtcpKind::Action,
            "CLIENTINFO" => CtcpKind::ClientInfo,
            "PING" => CtcpKind::Ping,
            "SOURCE" => CtcpKind::Source,
            "TIME" => CtcpKind::Time,
            "VERSION" => CtcpKind::Version,
            _ => CtcpKind::Unknown(command.to_ascii_uppercase()),
        }
    }
}

impl CtcpKind {
    pub fn as_str(&self) -> &str {
        match self {
            CtcpKind::Action => "ACTION",
            CtcpKind::ClientInfo => "CLIENTINFO",
            CtcpKind::Ping => "PING",
            CtcpKind::Source => "SOURCE",
            CtcpKind::Time => "TIME",
            CtcpKind::Version => "VERSION",
            CtcpKind::Unknown(command) => command,
        }
    }
}

impl fmt::Display for CtcpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded CTCP body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ctcp<'a> {
    pub kind: CtcpKind,
    /// Everything after the command; empty when there were no arguments.
    pub params: &'a str,
}

pub fn is_ctcp(text: &str) -> bool {
    text.starts_with(DELIM)
}

/// Decode a CTCP body, or `None` if `text` is a plain message.
pub fn parse(text: &str) -> Option<Ctcp<'_>> {
    let inner = text.strip_prefix(DELIM)?;
    let inner = inner.strip_suffix(DELIM).unwrap_or(inner);
    if inner.is_empty() {
        return None;
    }
    let (command, params) = inner.split_once(' ').unwrap_or((inner, ""));
    Some(Ctcp {
        kind: CtcpKind::from(command),
        params,
    })
}

/// Wrap a command and optional arguments in CTCP delimiters.
pub fn format(kind: &CtcpKind, params: Option<&str>) -> String {
    match params {
        Some(params) if !params.is_empty() => format!("{DELIM}{kind} {params}{DELIM}"),
        _ => format!("{DELIM}{kind}{DELIM}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action() {
        let ctcp = parse("\u{1}ACTION waves hello\u{1}").unwrap();
        assert_eq!(ctcp.kind, CtcpKind::Action);
        assert_eq!(ctcp.params, "waves hello");
    }

    #[test]
    fn test_missing_closing_delimiter() {
        let ctcp = parse("\u{1}version").unwrap();
        assert_eq!(ctcp.kind, CtcpKind::Version);
        assert_eq!(ctcp.params, "");
    }

    #[test]
    fn test_plain_text_is_not_ctcp() {
        assert!(parse("hello").is_none());
        assert!(parse("\u{1}\u{1}").is_none());
        assert!(!is_ctcp("hi \u{1}ACTION\u{1}"));
    }

    #[test]
    fn test_unknown_kind_keeps_name() {
        let ctcp = parse("\u{1}finger me\u{1}").unwrap();
        assert_eq!(ctcp.kind, CtcpKind::Unknown("FINGER".into()));
        assert_eq!(format(&ctcp.kind, Some(ctcp.params)), "\u{1}FINGER me\u{1}");
        assert_eq!(format(&CtcpKind::Version, None), "\u{1}VERSION\u{1}");
    }
}
