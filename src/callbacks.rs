//! Listener registry and event delivery.
//!
//! Listeners are registered per [`EventKind`] and called in registration
//! order. A listener that returns an error or panics is logged and counted;
//! it never stops delivery to the listeners after it, and never stops the
//! session.

use std::collections::BTreeMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use tracing::error;

use crate::event::{Event, EventKind};
use crate::state::StateModel;

/// A registered listener.
pub type Listener = Box<dyn FnMut(&Event, &StateModel) -> anyhow::Result<()> + Send>;

/// Token returned by [`CallbackManager::register`], used to unregister.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallbackHandle(u64);

struct Registration {
    handle: CallbackHandle,
    listener: Listener,
}

/// Registry of listeners keyed by event kind.
#[derive(Default)]
pub struct CallbackManager {
    next_handle: u64,
    listeners: BTreeMap<EventKind, Vec<Registration>>,
    failures: u64,
}

impl fmt::Debug for CallbackManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: BTreeMap<_, _> = self
            .listeners
            .iter()
            .map(|(kind, regs)| (kind, regs.len()))
            .collect();
        f.debug_struct("CallbackManager")
            .field("listeners", &counts)
            .field("failures", &self.failures)
            .finish()
    }
}

impl CallbackManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe `listener` to events of `kind`.
    pub fn register<F>(&mut self, kind: EventKind, listener: F) -> CallbackHandle
    where
        F: FnMut(&Event, &StateModel) -> anyhow::Result<()> + Send + 'static,
    {
        let handle = CallbackHandle(self.next_handle);
        self.next_handle += 1;
        self.listeners.entry(kind).or_default().push(Registration {
            handle,
            listener: Box::new(listener),
        });
        handle
    }

    /// Remove a listener. Returns `false` if it was not registered, so
    /// unregistering twice is harmless.
    pub fn unregister(&mut self, handle: CallbackHandle) -> bool {
        for regs in self.listeners.values_mut() {
            if let Some(pos) = regs.iter().position(|r| r.handle == handle) {
                regs.remove(pos);
                return true;
            }
        }
        false
    }

    /// Number of listeners for one kind.
    pub fn handler_count(&self, kind: EventKind) -> usize {
        self.listeners.get(&kind).map_or(0, Vec::len)
    }

    /// Total number of listeners.
    pub fn len(&self) -> usize {
        self.listeners.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.listeners.clear();
    }

    /// How many listener calls have failed or panicked so far.
    pub fn failures(&self) -> u64 {
        self.failures
    }

    /// Deliver `event` to every listener of its kind, in registration order.
    pub fn fire(&mut self, event: &Event, state: &StateModel) {
        let kind = event.kind();
        let Some(regs) = self.listeners.get_mut(&kind) else {
            return;
        };
        for reg in regs.iter_mut() {
            let listener = &mut reg.listener;
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| listener(event, state)));
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    self.failures += 1;
                    error!(?kind, handle = reg.handle.0, error = %err, "event listener failed");
                }
                Err(payload) => {
                    self.failures += 1;
                    error!(
                        ?kind,
                        handle = reg.handle.0,
                        panic = panic_message(payload.as_ref()),
                        "event listener panicked"
                    );
                }
            }
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn ready() -> Event {
        Event::ServerReady {
            server: "irc.example.org".into(),
            nickname: "me".into(),
        }
    }

    #[test]
    fn test_fires_in_registration_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut manager = CallbackManager::new();
        for i in 0..3 {
            let seen = Arc::clone(&seen);
            manager.register(EventKind::ServerReady, move |_, _| {
                seen.lock().unwrap().push(i);
                Ok(())
            });
        }
        manager.fire(&ready(), &StateModel::default());
        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_only_matching_kind_fires() {
        let hits = Arc::new(Mutex::new(0));
        let mut manager = CallbackManager::new();
        let counter = Arc::clone(&hits);
        manager.register(EventKind::MotdEnd, move |_, _| {
            *counter.lock().unwrap() += 1;
            Ok(())
        });
        manager.fire(&ready(), &StateModel::default());
        manager.fire(&Event::MotdEnd, &StateModel::default());
        assert_eq!(*hits.lock().unwrap(), 1);
    }

    #[test]
    fn test_unregister_is_idempotent() {
        let mut manager = CallbackManager::new();
        let handle = manager.register(EventKind::ServerReady, |_, _| Ok(()));
        assert_eq!(manager.handler_count(EventKind::ServerReady), 1);
        assert!(manager.unregister(handle));
        assert!(!manager.unregister(handle));
        assert!(manager.is_empty());
    }

    #[test]
    fn test_failing_listener_does_not_stop_delivery() {
        let seen = Arc::new(Mutex::new(0));
        let mut manager = CallbackManager::new();
        manager.register(EventKind::ServerReady, |_, _| anyhow::bail!("boom"));
        manager.register(EventKind::ServerReady, |_, _| panic!("listener bug"));
        let counter = Arc::clone(&seen);
        manager.register(EventKind::ServerReady, move |_, _| {
            *counter.lock().unwrap() += 1;
            Ok(())
        });

        manager.fire(&ready(), &StateModel::default());

        assert_eq!(*seen.lock().unwrap(), 1);
        assert_eq!(manager.failures(), 2);
    }

    #[test]
    fn test_listener_sees_state() {
        let mut state = StateModel::default();
        state.get_or_create_channel("#rust");
        let found = Arc::new(Mutex::new(false));
        let mut manager = CallbackManager::new();
        let flag = Arc::clone(&found);
        manager.register(EventKind::ChannelSelfJoin, move |event, state| {
            if let Event::ChannelSelfJoin { channel } = event {
                *flag.lock().unwrap() = state.find_channel(channel).is_some();
            }
            Ok(())
        });
        manager.fire(
            &Event::ChannelSelfJoin {
                channel: "#RUST".into(),
            },
            &state,
        );
        assert!(*found.lock().unwrap());
    }
}
