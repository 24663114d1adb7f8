//! Channel and user mode changes.

mod parse;

pub(crate) use self::parse::channel_mode_kind;
pub use self::parse::{parse_channel_modes, parse_user_modes};

/// How a channel mode letter consumes parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeKind {
    /// Membership prefix (`o`, `v`, ...); parameter is a nickname.
    Prefix,
    /// List mode (`b`, `e`, `I`); parameter is a mask, optional for queries.
    List,
    /// Always takes a parameter (`k`).
    AlwaysArg,
    /// Takes a parameter only when set (`l`).
    ArgWhenSet,
    /// Plain flag (`n`, `t`). Unknown letters are treated as flags.
    Flag,
}

/// One `+x`/`-x` change with its parameter, if any.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModeChange {
    /// `true` for `+`, `false` for `-`.
    pub adding: bool,
    /// Mode letter.
    pub mode: char,
    /// Parameter consumed by this change.
    pub arg: Option<String>,
}

impl ModeChange {
    /// `+o` / `-v` style rendering, without the parameter.
    pub fn flag(&self) -> String {
        format!("{}{}", if self.adding { '+' } else { '-' }, self.mode)
    }
}
