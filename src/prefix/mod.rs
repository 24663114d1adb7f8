//! IRC message prefix (source) types.

use std::fmt;

/// The source of a message: either a server or a user.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Prefix {
    /// A server name, e.g. `irc.example.com`.
    ServerName(String),
    /// A user: nickname, username (ident) and hostname.
    ///
    /// Username and hostname are empty when the server omitted them.
    Nickname(String, String, String),
}

impl Prefix {
    /// Parse a raw prefix (without the leading `:`).
    ///
    /// `nick!user@host`, `nick@host` and bare `nick` produce
    /// [`Prefix::Nickname`]; a bare token containing a `.` is taken to be a
    /// server name.
    pub fn new_from_str(s: &str) -> Self {
        if let Some((nick_user, host)) = s.split_once('@') {
            let (nick, user) = nick_user.split_once('!').unwrap_or((nick_user, ""));
            return Prefix::Nickname(nick.to_string(), user.to_string(), host.to_string());
        }
        if let Some((nick, user)) = s.split_once('!') {
            return Prefix::Nickname(nick.to_string(), user.to_string(), String::new());
        }
        if s.contains('.') {
            Prefix::ServerName(s.to_string())
        } else {
            Prefix::Nickname(s.to_string(), String::new(), String::new())
        }
    }

    /// The nickname, if this prefix names a user.
    pub fn nickname(&self) -> Option<&str> {
        match self {
            Prefix::Nickname(nick, _, _) => Some(nick),
            Prefix::ServerName(_) => None,
        }
    }

    /// The username (ident), if known.
    pub fn username(&self) -> Option<&str> {
        match self {
            Prefix::Nickname(_, user, _) if !user.is_empty() => Some(user),
            _ => None,
        }
    }

    /// The hostname, if known.
    pub fn hostname(&self) -> Option<&str> {
        match self {
            Prefix::Nickname(_, _, host) if !host.is_empty() => Some(host),
            _ => None,
        }
    }

    /// Whether this prefix is a server rather than a user.
    pub fn is_server(&self) -> bool {
        matches!(self, Prefix::ServerName(_))
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prefix::ServerName(name) => f.write_str(name),
            Prefix::Nickname(nick, user, host) => {
                f.write_str(nick)?;
                if !user.is_empty() {
                    write!(f, "!{}", user)?;
                }
                if !host.is_empty() {
                    write!(f, "@{}", host)?;
                }
                Ok(())
            }
        }
    }
}

impl From<&str> for Prefix {
    fn from(s: &str) -> Self {
        Prefix::new_from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_user_prefix() {
        let p = Prefix::new_from_str("nick!ident@host.example.com");
        assert_eq!(p.nickname(), Some("nick"));
        assert_eq!(p.username(), Some("ident"));
        assert_eq!(p.hostname(), Some("host.example.com"));
        assert_eq!(p.to_string(), "nick!ident@host.example.com");
    }

    #[test]
    fn test_server_prefix() {
        let p = Prefix::new_from_str("irc.example.com");
        assert!(p.is_server());
        assert_eq!(p.nickname(), None);
    }

    #[test]
    fn test_bare_nick_prefix() {
        let p = Prefix::new_from_str("server");
        assert_eq!(p.nickname(), Some("server"));
        assert_eq!(p.username(), None);
        assert_eq!(p.to_string(), "server");
    }

    #[test]
    fn test_nick_at_host() {
        let p = Prefix::new_from_str("nick@host");
        assert_eq!(p, Prefix::Nickname("nick".into(), "".into(), "host".into()));
    }
}
