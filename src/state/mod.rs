//! In-memory model of the clients and channels visible to one session.
//!
//! Every registry is keyed by the name folded through the active
//! [`CaseMapping`], so two spellings that fold alike are the same entity.
//! Memberships live inside their channel and are mirrored by a set of
//! channel keys on the client; the two sides are only ever changed together
//! by the methods below.
//!
//! The model has no protocol knowledge. The dispatch table decides what to
//! change, the session decides when to wipe it.
//!
//! # Example
//!
//! ```
//! use irc_session::state::StateModel;
//!
//! let mut state = StateModel::default();
//! state.get_or_create_channel("#Rust");
//! state.get_or_create_client("Alice");
//! state.add_membership("alice", "#rust").unwrap();
//!
//! assert!(state.is_member("ALICE", "#RUST"));
//! state.rename_client("alice", "Alice_").unwrap();
//! assert_eq!(state.list_members("#rust").len(), 1);
//! ```

mod channel;
mod client;

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use tracing::warn;

use crate::casemap::CaseMapping;
use crate::error::StateError;

pub use self::channel::{ChannelClientInfo, ChannelInfo};
pub use self::client::ClientInfo;

/// Registries of clients, channels and memberships.
#[derive(Clone, Debug, Default)]
pub struct StateModel {
    casemapping: CaseMapping,
    clients: HashMap<String, ClientInfo>,
    channels: HashMap<String, ChannelInfo>,
}

impl StateModel {
    /// Create an empty model using `casemapping` for keys.
    pub fn new(casemapping: CaseMapping) -> Self {
        StateModel {
            casemapping,
            ..Default::default()
        }
    }

    pub fn casemapping(&self) -> CaseMapping {
        self.casemapping
    }

    /// Fold a nickname or channel name into its registry key.
    pub fn key(&self, name: &str) -> String {
        self.casemapping.fold(name)
    }

    // === Queries ===

    pub fn find_client(&self, nick: &str) -> Option<&ClientInfo> {
        self.clients.get(&self.key(nick))
    }

    pub fn find_channel(&self, name: &str) -> Option<&ChannelInfo> {
        self.channels.get(&self.key(name))
    }

    /// Memberships of a channel, ordered by folded nickname.
    ///
    /// Empty if the channel is unknown.
    pub fn list_members(&self, channel: &str) -> Vec<&ChannelClientInfo> {
        let mut members: Vec<_> = self
            .find_channel(channel)
            .map(|c| c.members.values().collect())
            .unwrap_or_default();
        members.sort_by(|a, b| a.client.cmp(&b.client));
        members
    }

    pub fn membership(&self, nick: &str, channel: &str) -> Option<&ChannelClientInfo> {
        self.find_channel(channel)?.members.get(&self.key(nick))
    }

    pub fn is_member(&self, nick: &str, channel: &str) -> bool {
        self.membership(nick, channel).is_some()
    }

    /// Resolve the client side of a membership.
    pub fn member_client(&self, member: &ChannelClientInfo) -> Option<&ClientInfo> {
        self.clients.get(&member.client)
    }

    pub fn channels(&self) -> impl Iterator<Item = &ChannelInfo> {
        self.channels.values()
    }

    pub fn clients(&self) -> impl Iterator<Item = &ClientInfo> {
        self.clients.values()
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    // === Mutations ===

    pub fn get_or_create_client(&mut self, nick: &str) -> &mut ClientInfo {
        let key = self.key(nick);
        self.clients
            .entry(key)
            .or_insert_with(|| ClientInfo::new(nick))
    }

    pub fn get_or_create_channel(&mut self, name: &str) -> &mut ChannelInfo {
        let key = self.key(name);
        self.channels
            .entry(key)
            .or_insert_with(|| ChannelInfo::new(name))
    }

    pub(crate) fn client_mut(&mut self, nick: &str) -> Option<&mut ClientInfo> {
        let key = self.key(nick);
        self.clients.get_mut(&key)
    }

    pub(crate) fn channel_mut(&mut self, name: &str) -> Option<&mut ChannelInfo> {
        let key = self.key(name);
        self.channels.get_mut(&key)
    }

    pub(crate) fn membership_mut(
        &mut self,
        nick: &str,
        channel: &str,
    ) -> Option<&mut ChannelClientInfo> {
        let nick_key = self.key(nick);
        let channel_key = self.key(channel);
        self.channels
            .get_mut(&channel_key)?
            .members
            .get_mut(&nick_key)
    }

    /// Link an existing client to an existing channel.
    ///
    /// Adding a membership that already exists returns the existing one.
    pub fn add_membership(
        &mut self,
        nick: &str,
        channel: &str,
    ) -> Result<&mut ChannelClientInfo, StateError> {
        let nick_key = self.key(nick);
        let channel_key = self.key(channel);

        let client = self
            .clients
            .get_mut(&nick_key)
            .ok_or_else(|| StateError::NoSuchClient(nick.to_string()))?;
        let chan = self
            .channels
            .get_mut(&channel_key)
            .ok_or_else(|| StateError::NoSuchChannel(channel.to_string()))?;

        client.channels.insert(channel_key.clone());
        Ok(chan
            .members
            .entry(nick_key.clone())
            .or_insert_with(|| ChannelClientInfo::new(&nick_key, &channel_key)))
    }

    /// Unlink a client from a channel, returning the removed membership.
    pub fn remove_membership(&mut self, nick: &str, channel: &str) -> Option<ChannelClientInfo> {
        let nick_key = self.key(nick);
        let channel_key = self.key(channel);
        if let Some(client) = self.clients.get_mut(&nick_key) {
            client.channels.remove(&channel_key);
        }
        self.channels
            .get_mut(&channel_key)
            .and_then(|c| c.members.remove(&nick_key))
    }

    /// Remove a client and every membership it holds.
    pub fn remove_client(&mut self, nick: &str) -> Option<ClientInfo> {
        let key = self.key(nick);
        let client = self.clients.remove(&key)?;
        for channel_key in &client.channels {
            match self.channels.get_mut(channel_key) {
                Some(channel) => {
                    channel.members.remove(&key);
                }
                None => warn!(
                    client = %client.nickname,
                    channel = %channel_key,
                    "dropping membership of unknown channel"
                ),
            }
        }
        Some(client)
    }

    /// Remove a client only if it no longer shares any channel.
    pub fn remove_client_if_orphaned(&mut self, nick: &str) -> bool {
        let orphaned = self
            .find_client(nick)
            .map_or(false, |c| c.channels.is_empty());
        if orphaned {
            self.remove_client(nick);
        }
        orphaned
    }

    /// Remove a channel and every membership in it.
    pub fn remove_channel(&mut self, name: &str) -> Option<ChannelInfo> {
        let key = self.key(name);
        let channel = self.channels.remove(&key)?;
        for nick_key in channel.members.keys() {
            match self.clients.get_mut(nick_key) {
                Some(client) => {
                    client.channels.remove(&key);
                }
                None => warn!(
                    channel = %channel.name,
                    client = %nick_key,
                    "dropping membership of unknown client"
                ),
            }
        }
        Some(channel)
    }

    /// Re-key a client under a new nickname, keeping its memberships.
    ///
    /// If `new` folds onto a different client that is still tracked, that
    /// stale entry is removed first.
    pub fn rename_client(&mut self, old: &str, new: &str) -> Result<(), StateError> {
        let old_key = self.key(old);
        let new_key = self.key(new);

        if old_key == new_key {
            let client = self
                .clients
                .get_mut(&old_key)
                .ok_or_else(|| StateError::NoSuchClient(old.to_string()))?;
            client.nickname = new.to_string();
            return Ok(());
        }

        let mut client = self
            .clients
            .remove(&old_key)
            .ok_or_else(|| StateError::NoSuchClient(old.to_string()))?;

        if self.clients.contains_key(&new_key) {
            warn!(old = %old, new = %new, "nick change collides with tracked client, dropping it");
            self.remove_client(new);
        }

        client.nickname = new.to_string();
        let mut dangling = Vec::new();
        for channel_key in &client.channels {
            match self.channels.get_mut(channel_key) {
                Some(channel) => {
                    let mut member = channel
                        .members
                        .remove(&old_key)
                        .unwrap_or_else(|| ChannelClientInfo::new(&new_key, channel_key));
                    member.client = new_key.clone();
                    channel.members.insert(new_key.clone(), member);
                }
                None => dangling.push(channel_key.clone()),
            }
        }
        for channel_key in dangling {
            warn!(client = %new, channel = %channel_key, "dropping membership of unknown channel");
            client.channels.remove(&channel_key);
        }

        self.clients.insert(new_key, client);
        Ok(())
    }

    /// Switch casemapping and re-key every registry.
    ///
    /// Entries that collide under the new mapping are merged into the first
    /// one seen: a client keeps the union of both channel sets, a channel
    /// keeps the union of both member maps.
    pub fn set_casemapping(&mut self, casemapping: CaseMapping) {
        if casemapping == self.casemapping {
            return;
        }
        self.casemapping = casemapping;

        let clients = std::mem::take(&mut self.clients);
        let channels = std::mem::take(&mut self.channels);

        let client_keys: HashMap<String, String> = clients
            .iter()
            .map(|(old, c)| (old.clone(), casemapping.fold(&c.nickname)))
            .collect();
        let channel_keys: HashMap<String, String> = channels
            .iter()
            .map(|(old, c)| (old.clone(), casemapping.fold(&c.name)))
            .collect();

        for (_, mut client) in clients {
            client.channels = client
                .channels
                .iter()
                .filter_map(|k| channel_keys.get(k).cloned())
                .collect();
            match self.clients.entry(casemapping.fold(&client.nickname)) {
                Entry::Occupied(mut kept) => {
                    let kept = kept.get_mut();
                    warn!(
                        kept = %kept.nickname,
                        merged = %client.nickname,
                        "clients collide under new casemapping, merging"
                    );
                    kept.channels.append(&mut client.channels);
                }
                Entry::Vacant(slot) => {
                    slot.insert(client);
                }
            }
        }

        for (_, mut channel) in channels {
            let channel_key = casemapping.fold(&channel.name);
            for (old_nick, mut member) in std::mem::take(&mut channel.members) {
                let Some(nick_key) = client_keys.get(&old_nick) else {
                    warn!(channel = %channel.name, client = %old_nick, "dropping membership of unknown client");
                    continue;
                };
                member.client = nick_key.clone();
                member.channel = channel_key.clone();
                channel.members.entry(nick_key.clone()).or_insert(member);
            }
            match self.channels.entry(channel_key) {
                Entry::Occupied(mut kept) => {
                    let kept = kept.get_mut();
                    warn!(
                        kept = %kept.name,
                        merged = %channel.name,
                        "channels collide under new casemapping, merging"
                    );
                    for (nick_key, member) in channel.members {
                        kept.members.entry(nick_key).or_insert(member);
                    }
                }
                Entry::Vacant(slot) => {
                    slot.insert(channel);
                }
            }
        }
    }

    /// Drop everything.
    pub fn clear(&mut self) {
        self.clients.clear();
        self.channels.clear();
    }

    /// Count relations whose other side is missing. Zero under correct use.
    pub fn dangling_relations(&self) -> usize {
        let from_channels = self
            .channels
            .iter()
            .flat_map(|(ck, c)| c.members.keys().map(move |nk| (ck, nk)))
            .filter(|(ck, nk)| {
                self.clients
                    .get(*nk)
                    .map_or(true, |client| !client.channels.contains(*ck))
            })
            .count();
        let from_clients = self
            .clients
            .iter()
            .flat_map(|(nk, c)| c.channels.iter().map(move |ck| (nk, ck)))
            .filter(|(nk, ck)| {
                self.channels
                    .get(*ck)
                    .map_or(true, |channel| !channel.members.contains_key(*nk))
            })
            .count();
        from_channels + from_clients
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn populated() -> StateModel {
        let mut state = StateModel::default();
        for chan in ["#one", "#two"] {
            state.get_or_create_channel(chan);
        }
        for nick in ["alice", "bob"] {
            state.get_or_create_client(nick);
        }
        state.add_membership("alice", "#one").unwrap();
        state.add_membership("alice", "#two").unwrap();
        state.add_membership("bob", "#one").unwrap();
        state
    }

    #[test]
    fn test_case_insensitive_lookup() {
        let mut state = StateModel::default();
        state.get_or_create_client("Nick[Away]");
        assert!(state.find_client("nick{away}").is_some());
        assert_eq!(state.find_client("NICK[AWAY]").unwrap().nickname(), "Nick[Away]");
    }

    #[test]
    fn test_add_membership_requires_both_sides() {
        let mut state = StateModel::default();
        state.get_or_create_client("alice");
        assert_eq!(
            state.add_membership("alice", "#none").unwrap_err(),
            StateError::NoSuchChannel("#none".into())
        );
        state.get_or_create_channel("#some");
        assert!(state.add_membership("carol", "#some").is_err());
    }

    #[test]
    fn test_remove_client_cascades() {
        let mut state = populated();
        let removed = state.remove_client("ALICE").unwrap();
        assert_eq!(removed.channel_count(), 2);
        assert!(!state.is_member("alice", "#one"));
        assert_eq!(state.list_members("#two").len(), 0);
        assert_eq!(state.dangling_relations(), 0);
    }

    #[test]
    fn test_remove_channel_cascades() {
        let mut state = populated();
        state.remove_channel("#one").unwrap();
        assert_eq!(state.find_client("bob").unwrap().channel_count(), 0);
        assert_eq!(state.find_client("alice").unwrap().channel_count(), 1);
        assert!(state.remove_client_if_orphaned("bob"));
        assert!(!state.remove_client_if_orphaned("alice"));
        assert_eq!(state.dangling_relations(), 0);
    }

    #[test]
    fn test_rename_keeps_memberships() {
        let mut state = populated();
        state.membership_mut("alice", "#one").unwrap().add_mode('o', "ov");

        state.rename_client("alice", "Alicia").unwrap();

        assert!(state.find_client("alice").is_none());
        let member = state.membership("alicia", "#one").unwrap();
        assert_eq!(member.client_key(), "alicia");
        assert!(member.has_mode('o'));
        assert!(state.is_member("ALICIA", "#two"));
        assert_eq!(state.dangling_relations(), 0);
    }

    #[test]
    fn test_rename_over_stale_client() {
        let mut state = populated();
        state.rename_client("alice", "bob").unwrap();
        assert_eq!(state.client_count(), 1);
        assert_eq!(state.list_members("#one").len(), 1);
        assert_eq!(state.find_client("bob").unwrap().channel_count(), 2);
        assert_eq!(state.dangling_relations(), 0);
    }

    #[test]
    fn test_rename_case_only() {
        let mut state = populated();
        state.rename_client("alice", "ALICE").unwrap();
        assert_eq!(state.find_client("alice").unwrap().nickname(), "ALICE");
        assert_eq!(state.list_members("#one").len(), 2);
    }

    #[test]
    fn test_rename_unknown_client() {
        let mut state = StateModel::default();
        assert_eq!(
            state.rename_client("ghost", "spirit"),
            Err(StateError::NoSuchClient("ghost".into()))
        );
    }

    #[test]
    fn test_set_casemapping_rekeys() {
        let mut state = StateModel::new(CaseMapping::Ascii);
        state.get_or_create_channel("#Chan[1]");
        state.get_or_create_client("Nick[1]");
        state.add_membership("nick[1]", "#chan[1]").unwrap();
        assert!(state.find_client("nick{1}").is_none());

        state.set_casemapping(CaseMapping::Rfc1459);

        assert!(state.find_client("nick{1}").is_some());
        assert!(state.is_member("NICK{1}", "#chan{1}"));
        assert_eq!(state.dangling_relations(), 0);
    }

    #[test]
    fn test_set_casemapping_merges_colliding_clients() {
        let mut state = StateModel::new(CaseMapping::Ascii);
        for chan in ["#one", "#two"] {
            state.get_or_create_channel(chan);
        }
        state.get_or_create_client("a[");
        state.get_or_create_client("a{");
        state.add_membership("a[", "#one").unwrap();
        state.add_membership("a{", "#two").unwrap();

        state.set_casemapping(CaseMapping::Rfc1459);

        assert_eq!(state.client_count(), 1);
        assert_eq!(state.find_client("A[").unwrap().channel_count(), 2);
        assert!(state.is_member("a{", "#one"));
        assert!(state.is_member("a[", "#two"));
        assert_eq!(state.dangling_relations(), 0);

        state.remove_client("a{").unwrap();
        assert!(state.list_members("#one").is_empty());
        assert!(state.list_members("#two").is_empty());
        assert_eq!(state.dangling_relations(), 0);
    }

    #[test]
    fn test_set_casemapping_merges_colliding_channels() {
        let mut state = StateModel::new(CaseMapping::Ascii);
        state.get_or_create_channel("#c[");
        state.get_or_create_channel("#c{");
        for nick in ["alice", "bob"] {
            state.get_or_create_client(nick);
        }
        state.add_membership("alice", "#c[").unwrap();
        state.add_membership("bob", "#c{").unwrap();
        state.add_membership("bob", "#c[").unwrap();

        state.set_casemapping(CaseMapping::Rfc1459);

        assert_eq!(state.channel_count(), 1);
        assert_eq!(state.list_members("#C{").len(), 2);
        assert_eq!(state.find_client("bob").unwrap().channel_count(), 1);
        assert_eq!(state.dangling_relations(), 0);

        state.remove_channel("#c[").unwrap();
        assert_eq!(state.find_client("alice").unwrap().channel_count(), 0);
        assert_eq!(state.dangling_relations(), 0);
    }
}
