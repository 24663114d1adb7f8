//! Line tokenizer and owned message types.

mod nom_parser;
pub mod tags;
mod types;

pub use self::nom_parser::{DetailedParseError, ParsedMessage};
pub use self::tags::Tag;
pub use self::types::{Command, Message};
