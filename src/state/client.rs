use std::collections::BTreeSet;

use crate::prefix::Prefix;

/// A network participant seen by this session.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClientInfo {
    pub(crate) nickname: String,
    pub(crate) username: Option<String>,
    pub(crate) hostname: Option<String>,
    pub(crate) realname: Option<String>,
    pub(crate) account: Option<String>,
    pub(crate) away: bool,
    pub(crate) away_message: Option<String>,
    pub(crate) modes: String,
    /// Folded keys of the channels this client is in.
    pub(crate) channels: BTreeSet<String>,
}

impl ClientInfo {
    pub(crate) fn new(nickname: &str) -> Self {
        ClientInfo {
            nickname: nickname.to_string(),
            username: None,
            hostname: None,
            realname: None,
            account: None,
            away: false,
            away_message: None,
            modes: String::new(),
            channels: BTreeSet::new(),
        }
    }

    /// Nickname as last spelled by the server.
    pub fn nickname(&self) -> &str {
        &self.nickname
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn hostname(&self) -> Option<&str> {
        self.hostname.as_deref()
    }

    pub fn realname(&self) -> Option<&str> {
        self.realname.as_deref()
    }

    pub fn account(&self) -> Option<&str> {
        self.account.as_deref()
    }

    pub fn is_away(&self) -> bool {
        self.away
    }

    pub fn away_message(&self) -> Option<&str> {
        self.away_message.as_deref()
    }

    /// User modes; only tracked for the local client.
    pub fn modes(&self) -> &str {
        &self.modes
    }

    /// Folded names of the channels this client shares with us.
    pub fn channels(&self) -> impl Iterator<Item = &str> {
        self.channels.iter().map(String::as_str)
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// `nick!user@host`, with whatever parts are known.
    pub fn host(&self) -> String {
        Prefix::Nickname(
            self.nickname.clone(),
            self.username.clone().unwrap_or_default(),
            self.hostname.clone().unwrap_or_default(),
        )
        .to_string()
    }

    /// Fill ident/host from a message prefix. Empty parts are ignored so a
    /// bare-nick prefix never erases what we already know.
    pub(crate) fn update_from_prefix(&mut self, prefix: &Prefix) {
        if let Some(user) = prefix.username() {
            self.username = Some(user.to_string());
        }
        if let Some(host) = prefix.hostname() {
            self.hostname = Some(host.to_string());
        }
    }

    pub(crate) fn set_away(&mut self, away: bool, message: Option<&str>) {
        self.away = away;
        self.away_message = if away { message.map(str::to_string) } else { None };
    }

    pub(crate) fn apply_mode(&mut self, adding: bool, mode: char) {
        if adding {
            if !self.modes.contains(mode) {
                self.modes.push(mode);
            }
        } else {
            self.modes.retain(|c| c != mode);
        }
    }
}
