//! IRC case-mapping functions.
//!
//! IRC uses a special case-insensitive comparison where some characters
//! are considered equivalent (e.g., `[` and `{`). Servers advertise which
//! rule they use through the `CASEMAPPING` ISUPPORT token; the state model
//! folds every nickname and channel name through the active mapping before
//! using it as a registry key.

use std::fmt;
use std::str::FromStr;

/// A case-folding rule for nicknames and channel names.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum CaseMapping {
    /// Only `A-Z` fold to `a-z`.
    Ascii,
    /// `A-Z` plus `[]\~` fold to `{}|^`.
    #[default]
    Rfc1459,
    /// `A-Z` plus `[]\` fold to `{}|` (no `~`).
    StrictRfc1459,
}

impl CaseMapping {
    /// Fold a single character.
    #[inline]
    pub fn fold_char(self, c: char) -> char {
        match (self, c) {
            (_, 'A'..='Z') => c.to_ascii_lowercase(),
            (CaseMapping::Ascii, _) => c,
            (_, '[') => '{',
            (_, ']') => '}',
            (_, '\\') => '|',
            (CaseMapping::Rfc1459, '~') => '^',
            _ => c,
        }
    }

    /// Fold a whole string into its lookup key.
    pub fn fold(self, s: &str) -> String {
        s.chars().map(|c| self.fold_char(c)).collect()
    }

    /// Compare two strings under this mapping.
    pub fn equals(self, a: &str, b: &str) -> bool {
        a.len() == b.len()
            && a
                .chars()
                .zip(b.chars())
                .all(|(ca, cb)| self.fold_char(ca) == self.fold_char(cb))
    }

    /// The ISUPPORT token value for this mapping.
    pub fn as_str(self) -> &'static str {
        match self {
            CaseMapping::Ascii => "ascii",
            CaseMapping::Rfc1459 => "rfc1459",
            CaseMapping::StrictRfc1459 => "strict-rfc1459",
        }
    }
}

impl FromStr for CaseMapping {
    type Err = UnknownCaseMapping;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ascii" => Ok(CaseMapping::Ascii),
            "rfc1459" => Ok(CaseMapping::Rfc1459),
            "strict-rfc1459" => Ok(CaseMapping::StrictRfc1459),
            _ => Err(UnknownCaseMapping(s.to_string())),
        }
    }
}

impl fmt::Display for CaseMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a `CASEMAPPING` value is not one we know how to fold.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown casemapping: {0}")]
pub struct UnknownCaseMapping(pub String);

/// Convert a string to IRC lowercase using RFC 1459 case mapping.
pub fn irc_to_lower(s: &str) -> String {
    CaseMapping::Rfc1459.fold(s)
}

/// Compare two strings using RFC 1459 case-insensitive comparison.
pub fn irc_eq(a: &str, b: &str) -> bool {
    CaseMapping::Rfc1459.equals(a, b)
}
