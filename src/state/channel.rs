use std::collections::{BTreeMap, BTreeSet, HashMap};

/// A channel this session knows about.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChannelInfo {
    pub(crate) name: String,
    pub(crate) topic: String,
    pub(crate) topic_setter: String,
    pub(crate) topic_time: i64,
    /// Flag and parameter modes (`n` → None, `k` → Some(key)).
    pub(crate) modes: BTreeMap<char, Option<String>>,
    /// List modes (`b`, `e`, `I`) and their masks.
    pub(crate) lists: BTreeMap<char, BTreeSet<String>>,
    pub(crate) created_at: Option<i64>,
    pub(crate) names_complete: bool,
    /// Memberships keyed by folded nickname.
    pub(crate) members: HashMap<String, ChannelClientInfo>,
}

impl ChannelInfo {
    pub(crate) fn new(name: &str) -> Self {
        ChannelInfo {
            name: name.to_string(),
            topic: String::new(),
            topic_setter: String::new(),
            topic_time: 0,
            modes: BTreeMap::new(),
            lists: BTreeMap::new(),
            created_at: None,
            names_complete: false,
            members: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current topic text; empty when unset.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Who set the topic, as reported by the server.
    pub fn topic_setter(&self) -> &str {
        &self.topic_setter
    }

    /// When the topic was set, in seconds since the epoch (0 if unknown).
    pub fn topic_time(&self) -> i64 {
        self.topic_time
    }

    pub fn created_at(&self) -> Option<i64> {
        self.created_at
    }

    /// Whether the initial NAMES list has been received.
    pub fn names_complete(&self) -> bool {
        self.names_complete
    }

    pub fn has_mode(&self, mode: char) -> bool {
        self.modes.contains_key(&mode)
    }

    /// Parameter of a parameter mode (`k`, `l`).
    pub fn mode_param(&self, mode: char) -> Option<&str> {
        self.modes.get(&mode).and_then(|v| v.as_deref())
    }

    /// `+ntk key` style rendering of flag and parameter modes.
    pub fn mode_string(&self) -> String {
        let mut flags = String::from("+");
        let mut params = Vec::new();
        for (mode, param) in &self.modes {
            flags.push(*mode);
            if let Some(p) = param {
                params.push(p.as_str());
            }
        }
        if params.is_empty() {
            flags
        } else {
            format!("{} {}", flags, params.join(" "))
        }
    }

    /// Masks set for a list mode such as `b`.
    pub fn list(&self, mode: char) -> impl Iterator<Item = &str> {
        self.lists
            .get(&mode)
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub(crate) fn set_topic(&mut self, topic: &str, setter: &str, time: i64) {
        self.topic = topic.to_string();
        self.topic_setter = setter.to_string();
        self.topic_time = time;
    }

    pub(crate) fn set_mode(&mut self, adding: bool, mode: char, param: Option<&str>) {
        if adding {
            self.modes.insert(mode, param.map(str::to_string));
        } else {
            self.modes.remove(&mode);
        }
    }

    pub(crate) fn set_list_entry(&mut self, adding: bool, mode: char, mask: &str) {
        if adding {
            self.lists.entry(mode).or_default().insert(mask.to_string());
        } else if let Some(set) = self.lists.get_mut(&mode) {
            set.remove(mask);
        }
    }
}

/// Membership of one client in one channel.
///
/// Both sides are referenced by folded key and resolved through
/// [`StateModel`](super::StateModel).
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChannelClientInfo {
    pub(crate) client: String,
    pub(crate) channel: String,
    /// Prefix mode letters, highest rank first.
    pub(crate) modes: String,
}

impl ChannelClientInfo {
    pub(crate) fn new(client: &str, channel: &str) -> Self {
        ChannelClientInfo {
            client: client.to_string(),
            channel: channel.to_string(),
            modes: String::new(),
        }
    }

    /// Folded key of the member client.
    pub fn client_key(&self) -> &str {
        &self.client
    }

    /// Folded key of the channel.
    pub fn channel_key(&self) -> &str {
        &self.channel
    }

    /// Prefix modes such as `"ov"`.
    pub fn modes(&self) -> &str {
        &self.modes
    }

    pub fn has_mode(&self, mode: char) -> bool {
        self.modes.contains(mode)
    }

    /// Add a prefix mode, keeping `rank_order` (e.g. `"qaohv"`) ordering.
    pub(crate) fn add_mode(&mut self, mode: char, rank_order: &str) {
        if self.modes.contains(mode) {
            return;
        }
        self.modes.push(mode);
        let mut sorted: Vec<char> = self.modes.chars().collect();
        sorted.sort_by_key(|c| rank_order.chars().position(|r| r == *c).unwrap_or(usize::MAX));
        self.modes = sorted.into_iter().collect();
    }

    pub(crate) fn remove_mode(&mut self, mode: char) {
        self.modes.retain(|c| c != mode);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_string() {
        let mut chan = ChannelInfo::new("#rust");
        chan.set_mode(true, 't', None);
        chan.set_mode(true, 'n', None);
        chan.set_mode(true, 'k', Some("hunter2"));
        assert_eq!(chan.mode_string(), "+knt hunter2");
        chan.set_mode(false, 'k', None);
        assert_eq!(chan.mode_string(), "+nt");
        assert_eq!(chan.mode_param('k'), None);
    }

    #[test]
    fn test_list_entries() {
        let mut chan = ChannelInfo::new("#rust");
        chan.set_list_entry(true, 'b', "*!*@spam");
        chan.set_list_entry(true, 'b', "*!*@spam");
        assert_eq!(chan.list('b').count(), 1);
        chan.set_list_entry(false, 'b', "*!*@spam");
        assert_eq!(chan.list('b').count(), 0);
        assert_eq!(chan.list('e').count(), 0);
    }

    #[test]
    fn test_member_modes_keep_rank_order() {
        let mut member = ChannelClientInfo::new("alice", "#rust");
        member.add_mode('v', "qaohv");
        member.add_mode('o', "qaohv");
        member.add_mode('q', "qaohv");
        assert_eq!(member.modes(), "qov");
        member.remove_mode('o');
        assert_eq!(member.modes(), "qv");
    }
}
