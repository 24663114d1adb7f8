//! Owned IRC message types.

use std::fmt::{self, Write};
use std::str::FromStr;

use crate::error::MessageParseError;
use crate::prefix::Prefix;
use crate::response::Response;

use super::nom_parser::ParsedMessage;
use super::tags::{parse_tags, Tag};

/// The command token of a message.
///
/// Exactly three ASCII digits make a numeric; anything else is a textual
/// command, stored upper-cased.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Command {
    /// A three-digit server reply.
    Numeric(u16),
    /// A textual command such as `PRIVMSG`.
    Named(String),
}

impl Command {
    /// Classify a raw command token.
    pub fn new(token: &str) -> Self {
        let bytes = token.as_bytes();
        if bytes.len() == 3 && bytes.iter().all(u8::is_ascii_digit) {
            let code = bytes
                .iter()
                .fold(0u16, |acc, b| acc * 10 + u16::from(b - b'0'));
            Command::Numeric(code)
        } else {
            Command::Named(token.to_ascii_uppercase())
        }
    }

    /// Shorthand for a textual command key.
    pub fn named(name: &str) -> Self {
        Command::Named(name.to_ascii_uppercase())
    }

    /// The numeric code, if this is a numeric.
    pub fn numeric(&self) -> Option<u16> {
        match self {
            Command::Numeric(code) => Some(*code),
            Command::Named(_) => None,
        }
    }

    /// The known [`Response`] for a numeric, if any.
    pub fn response(&self) -> Option<Response> {
        self.numeric().and_then(Response::from_code)
    }

    /// Whether this is the given textual command.
    pub fn is(&self, name: &str) -> bool {
        matches!(self, Command::Named(n) if n.eq_ignore_ascii_case(name))
    }
}

impl From<Response> for Command {
    fn from(response: Response) -> Self {
        Command::Numeric(response.code())
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Numeric(code) => write!(f, "{:03}", code),
            Command::Named(name) => f.write_str(name),
        }
    }
}

/// A tokenized IRC message.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Message {
    /// IRCv3 tags, in wire order.
    pub tags: Vec<Tag>,
    /// Message source, if the line carried one.
    pub prefix: Option<Prefix>,
    /// Command or numeric.
    pub command: Command,
    /// Parameters; the trailing parameter, if any, is last.
    pub params: Vec<String>,
}

impl Message {
    /// Build an outgoing message without prefix or tags.
    pub fn new<I, S>(command: &str, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Message {
            tags: Vec::new(),
            prefix: None,
            command: Command::new(command),
            params: params.into_iter().map(Into::into).collect(),
        }
    }

    /// Tokenize one line. A trailing CR/LF is ignored.
    pub fn parse(line: &str) -> Result<Self, MessageParseError> {
        let trimmed = line.trim_end_matches(['\r', '\n']);
        if trimmed.trim().is_empty() {
            return Err(MessageParseError::EmptyMessage);
        }

        let parsed = ParsedMessage::parse(trimmed).map_err(|e| {
            if e.context == Some("parsing required command") {
                MessageParseError::InvalidCommand
            } else {
                MessageParseError::ParseContext {
                    position: e.position,
                    context: e.context.unwrap_or("tokenizing line").to_string(),
                }
            }
        })?;

        Ok(Message {
            tags: parsed.tags.map(parse_tags).unwrap_or_default(),
            prefix: parsed.prefix.map(Prefix::new_from_str),
            command: Command::new(parsed.command),
            params: parsed.params.into_iter().map(str::to_owned).collect(),
        })
    }

    /// Parameter at `index`.
    pub fn arg(&self, index: usize) -> Option<&str> {
        self.params.get(index).map(String::as_str)
    }

    /// The final parameter, trailing or not.
    pub fn last_arg(&self) -> Option<&str> {
        self.params.last().map(String::as_str)
    }

    /// Nickname from the prefix, if the source is a user.
    pub fn source_nickname(&self) -> Option<&str> {
        self.prefix.as_ref().and_then(Prefix::nickname)
    }

    /// Value of the first tag with the given key.
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|t| t.key() == key)
            .and_then(Tag::value)
    }
}

impl FromStr for Message {
    type Err = MessageParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Message::parse(s)
    }
}

/// Wire form without the line terminator. Tags are not written.
impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(prefix) = &self.prefix {
            write!(f, ":{} ", prefix)?;
        }
        write!(f, "{}", self.command)?;

        if let Some((last, middle)) = self.params.split_last() {
            for param in middle {
                f.write_char(' ')?;
                f.write_str(param)?;
            }
            f.write_char(' ')?;
            if last.is_empty() || last.contains(' ') || last.starts_with(':') {
                f.write_char(':')?;
            }
            f.write_str(last)?;
        }
        Ok(())
    }
}
