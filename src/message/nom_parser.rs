//! Nom-based IRC line tokenizer.
//!
//! Produces a [`ParsedMessage`] that borrows from the input line. The owned
//! [`Message`](super::Message) is built on top of it.

use nom::{
    bytes::complete::{take_until, take_while1},
    character::complete::{char, space0},
    combinator::opt,
    error::{context, ErrorKind, VerboseError, VerboseErrorKind},
    sequence::preceded,
    IResult,
};

type ParseResult<I, O> = IResult<I, O, VerboseError<I>>;

fn parse_tags(input: &str) -> ParseResult<&str, &str> {
    context(
        "parsing IRCv3 message tags",
        preceded(char('@'), take_until(" ")),
    )(input)
}

fn parse_prefix(input: &str) -> ParseResult<&str, &str> {
    context(
        "parsing message prefix",
        preceded(char(':'), take_while1(|c| c != ' ')),
    )(input)
}

fn parse_command(input: &str) -> ParseResult<&str, &str> {
    context(
        "parsing IRC command",
        take_while1(|c: char| c.is_ascii_alphanumeric()),
    )(input)
}

/// Split everything after the command into parameters.
///
/// Runs of spaces separate parameters. A token that starts with `:` takes
/// the rest of the line verbatim, spaces included, and ends the list.
fn split_params(mut rest: &str) -> Vec<&str> {
    let mut params = Vec::new();
    loop {
        rest = rest.trim_start_matches(' ');
        if rest.is_empty() {
            break;
        }
        if let Some(trailing) = rest.strip_prefix(':') {
            params.push(trailing);
            break;
        }
        let end = rest.find(' ').unwrap_or(rest.len());
        params.push(&rest[..end]);
        rest = &rest[end..];
    }
    params
}

/// Tokenize a complete IRC line (without its terminator).
///
/// ```text
/// [@tags] [:prefix] <command> [params...] [:trailing]
/// ```
pub fn parse_message(input: &str) -> ParseResult<&str, ParsedMessage<'_>> {
    let (input, _) = space0(input)?;
    let (input, tags) = context("parsing optional tags", opt(parse_tags))(input)?;
    let (input, _) = space0(input)?;
    let (input, prefix) = context("parsing optional prefix", opt(parse_prefix))(input)?;
    let (input, _) = space0(input)?;
    let (input, command) = context("parsing required command", parse_command)(input)?;

    // Command must be followed by a separator or the end of the line.
    if let Some(c) = input.chars().next() {
        if c != ' ' {
            return Err(nom::Err::Error(VerboseError {
                errors: vec![
                    (input, VerboseErrorKind::Nom(ErrorKind::AlphaNumeric)),
                    (input, VerboseErrorKind::Context("parsing required command")),
                ],
            }));
        }
    }

    let params = split_params(input);

    Ok((
        "",
        ParsedMessage {
            tags,
            prefix,
            command,
            params,
        },
    ))
}

/// A tokenized IRC line with borrowed string slices.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedMessage<'a> {
    /// Raw tags string (without the leading `@`), if present.
    pub tags: Option<&'a str>,
    /// Raw prefix string (without the leading `:`), if present.
    pub prefix: Option<&'a str>,
    /// The command name or numeric, as sent.
    pub command: &'a str,
    /// Command parameters, including trailing.
    pub params: Vec<&'a str>,
}

impl<'a> ParsedMessage<'a> {
    /// Tokenize a line, returning position and context on failure.
    pub fn parse(input: &'a str) -> Result<Self, DetailedParseError> {
        match parse_message(input) {
            Ok((_, msg)) => Ok(msg),
            Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
                let mut context_info = None;
                let mut position = input.len();
                let mut kind = ErrorKind::Tag;

                for (error_input, error_kind) in &e.errors {
                    position = input.len() - error_input.len();
                    match error_kind {
                        VerboseErrorKind::Context(ctx) => context_info = Some(*ctx),
                        VerboseErrorKind::Nom(ek) => kind = *ek,
                        VerboseErrorKind::Char(_) => kind = ErrorKind::Char,
                    }
                }

                Err(DetailedParseError {
                    input: input.to_string(),
                    position,
                    context: context_info,
                    kind,
                })
            }
            Err(nom::Err::Incomplete(_)) => Err(DetailedParseError {
                input: input.to_string(),
                position: input.len(),
                context: Some("incomplete input"),
                kind: ErrorKind::Eof,
            }),
        }
    }
}

/// Parse failure with position and context information.
#[derive(Debug, Clone)]
pub struct DetailedParseError {
    /// The line that failed to parse.
    pub input: String,
    /// Byte position where parsing failed.
    pub position: usize,
    /// What was being parsed when the error occurred.
    pub context: Option<&'static str>,
    /// The nom error kind.
    pub kind: ErrorKind,
}

impl std::fmt::Display for DetailedParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "parse error at position {}", self.position)?;
        if let Some(ctx) = self.context {
            write!(f, " while {}", ctx)?;
        }
        write!(f, ": {:?}", self.kind)
    }
}

impl std::error::Error for DetailedParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_command() {
        let msg = ParsedMessage::parse("PING").unwrap();
        assert_eq!(msg.command, "PING");
        assert!(msg.tags.is_none());
        assert!(msg.prefix.is_none());
        assert!(msg.params.is_empty());
    }

    #[test]
    fn test_parse_topic_numeric() {
        let msg = ParsedMessage::parse(":server 332 nick #chan :topic text").unwrap();
        assert_eq!(msg.prefix, Some("server"));
        assert_eq!(msg.command, "332");
        assert_eq!(msg.params, vec!["nick", "#chan", "topic text"]);
    }

    #[test]
    fn test_parse_with_tags() {
        let msg = ParsedMessage::parse("@time=2023-01-01T00:00:00Z :nick PRIVMSG #ch :Hi").unwrap();
        assert_eq!(msg.tags, Some("time=2023-01-01T00:00:00Z"));
        assert_eq!(msg.prefix, Some("nick"));
        assert_eq!(msg.params, vec!["#ch", "Hi"]);
    }

    #[test]
    fn test_repeated_spaces_between_params() {
        let msg = ParsedMessage::parse(":s 333 me  #chan   setter 1207350306").unwrap();
        assert_eq!(msg.params, vec!["me", "#chan", "setter", "1207350306"]);
    }

    #[test]
    fn test_colon_inside_param_is_not_trailing() {
        let msg = ParsedMessage::parse("PRIVMSG a:b :c d").unwrap();
        assert_eq!(msg.params, vec!["a:b", "c d"]);
    }

    #[test]
    fn test_trailing_keeps_leading_and_double_spaces() {
        let msg = ParsedMessage::parse("PRIVMSG #c : two  spaces :colon").unwrap();
        assert_eq!(msg.params, vec!["#c", " two  spaces :colon"]);
    }

    #[test]
    fn test_empty_trailing() {
        let msg = ParsedMessage::parse("PRIVMSG #channel :").unwrap();
        assert_eq!(msg.params, vec!["#channel", ""]);
    }

    #[test]
    fn test_prefix_only_is_error() {
        let err = ParsedMessage::parse(":just.a.prefix").unwrap_err();
        assert_eq!(err.context, Some("parsing required command"));
    }

    #[test]
    fn test_bad_command_char_is_error() {
        assert!(ParsedMessage::parse("PRIV*MSG #a :b").is_err());
    }
}
