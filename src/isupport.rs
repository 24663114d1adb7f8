//! RPL_ISUPPORT (005) tokens that change how the session interprets lines.
//!
//! Servers may spread ISUPPORT over several 005 lines and may retract a
//! token with `-KEY`; [`Isupport::apply`] merges each line into the running
//! set. Typed accessors fall back to RFC 1459 defaults for tokens the server
//! never sent.

use std::collections::BTreeMap;

use crate::casemap::CaseMapping;

/// One `KEY[=value]` token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IsupportEntry<'a> {
    pub key: &'a str,
    pub value: Option<&'a str>,
}

impl<'a> IsupportEntry<'a> {
    /// Split a raw token. `-KEY` yields key `-KEY` so callers can detect
    /// negation.
    pub fn parse(token: &'a str) -> Self {
        match token.split_once('=') {
            Some((key, value)) => IsupportEntry { key, value: Some(value) },
            None => IsupportEntry { key: token, value: None },
        }
    }
}

/// Accumulated ISUPPORT state for one connection.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Isupport {
    entries: BTreeMap<String, Option<String>>,
}

impl Isupport {
    /// Create an empty set (all accessors return defaults).
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge the parameters of one 005 line.
    ///
    /// `params` is the full parameter list: the leading target nickname and
    /// the trailing human-readable text are skipped.
    pub fn apply(&mut self, params: &[String]) {
        let Some((_, tokens)) = params.split_first() else {
            return;
        };
        let tokens = match tokens.split_last() {
            Some((last, rest)) if last.contains(' ') || last.is_empty() => rest,
            _ => tokens,
        };

        for token in tokens {
            let entry = IsupportEntry::parse(token);
            if let Some(key) = entry.key.strip_prefix('-') {
                self.entries.remove(&key.to_ascii_uppercase());
            } else if !entry.key.is_empty() {
                self.entries.insert(
                    entry.key.to_ascii_uppercase(),
                    entry.value.map(str::to_string),
                );
            }
        }
    }

    /// Raw lookup: `None` if absent, `Some(None)` for a valueless token.
    pub fn get(&self, key: &str) -> Option<Option<&str>> {
        self.entries
            .get(&key.to_ascii_uppercase())
            .map(|v| v.as_deref())
    }

    /// Whether the token is present.
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Advertised casemapping, if it names one we support.
    pub fn casemapping(&self) -> Option<CaseMapping> {
        self.get("CASEMAPPING").flatten().and_then(|s| s.parse().ok())
    }

    /// Channel prefix characters, default `#&`.
    pub fn chantypes(&self) -> &str {
        self.get("CHANTYPES").flatten().unwrap_or("#&")
    }

    /// Prefixes allowed before a channel name in PRIVMSG/NOTICE targets.
    pub fn statusmsg(&self) -> &str {
        self.get("STATUSMSG").flatten().unwrap_or("")
    }

    /// The network name.
    pub fn network(&self) -> Option<&str> {
        self.get("NETWORK").flatten()
    }

    /// Membership prefix mapping, default `(ov)@+`.
    pub fn prefix(&self) -> PrefixSpec {
        self.get("PREFIX")
            .flatten()
            .and_then(PrefixSpec::parse)
            .unwrap_or_default()
    }

    /// Channel mode categories, default `beI,k,l,imnpst`.
    pub fn chanmodes(&self) -> ChanModes {
        self.get("CHANMODES")
            .flatten()
            .and_then(ChanModes::parse)
            .unwrap_or_default()
    }

    /// Whether `name` starts with one of the advertised channel types.
    pub fn is_channel(&self, name: &str) -> bool {
        name.chars()
            .next()
            .map_or(false, |c| self.chantypes().contains(c))
    }
}

/// Parsed `PREFIX=(modes)symbols`, highest rank first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrefixSpec {
    pub modes: String,
    pub prefixes: String,
}

impl Default for PrefixSpec {
    fn default() -> Self {
        PrefixSpec {
            modes: "ov".to_string(),
            prefixes: "@+".to_string(),
        }
    }
}

impl PrefixSpec {
    pub fn parse(s: &str) -> Option<Self> {
        let rest = s.strip_prefix('(')?;
        let (modes, prefixes) = rest.split_once(')')?;
        if modes.chars().count() != prefixes.chars().count() {
            return None;
        }
        Some(PrefixSpec {
            modes: modes.to_string(),
            prefixes: prefixes.to_string(),
        })
    }

    /// Mode letter for a prefix symbol (`@` → `o`).
    pub fn mode_for_prefix(&self, symbol: char) -> Option<char> {
        let idx = self.prefixes.chars().position(|c| c == symbol)?;
        self.modes.chars().nth(idx)
    }

    /// Prefix symbol for a mode letter (`o` → `@`).
    pub fn prefix_for_mode(&self, mode: char) -> Option<char> {
        let idx = self.modes.chars().position(|c| c == mode)?;
        self.prefixes.chars().nth(idx)
    }

    /// Whether `mode` is a membership (prefix) mode.
    pub fn is_prefix_mode(&self, mode: char) -> bool {
        self.modes.contains(mode)
    }

    /// Rank of a mode letter; lower is more powerful.
    pub fn rank(&self, mode: char) -> Option<usize> {
        self.modes.chars().position(|c| c == mode)
    }
}

/// Parsed `CHANMODES=A,B,C,D`.
///
/// - A: list modes, always take a parameter (`b`)
/// - B: always take a parameter (`k`)
/// - C: take a parameter only when set (`l`)
/// - D: never take a parameter (`n`)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChanModes {
    pub a: String,
    pub b: String,
    pub c: String,
    pub d: String,
}

impl Default for ChanModes {
    fn default() -> Self {
        ChanModes {
            a: "beI".to_string(),
            b: "k".to_string(),
            c: "l".to_string(),
            d: "imnpst".to_string(),
        }
    }
}

impl ChanModes {
    pub fn parse(s: &str) -> Option<Self> {
        let mut parts = s.splitn(4, ',');
        let (a, b, c, d) = (parts.next()?, parts.next()?, parts.next()?, parts.next()?);
        // Servers may append further groups after a comma; keep only D.
        let d = d.split(',').next().unwrap_or("");
        Some(ChanModes {
            a: a.to_string(),
            b: b.to_string(),
            c: c.to_string(),
            d: d.to_string(),
        })
    }
}
