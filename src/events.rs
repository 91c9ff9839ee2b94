//! In-process publish/subscribe channel for session changes.
//!
//! Any component holding a clone of [`AuthEventBus`] can react when a token
//! cookie is written or cleared elsewhere, without polling the cookie store.

use std::{
    collections::HashMap,
    panic::{self, AssertUnwindSafe},
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
};

/// AuthEvent
///
/// Signal that the session cookies changed. Carries no payload: listeners
/// re-read the cookies they care about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthEvent {
    AccessChanged,
    RefreshChanged,
    LoggedOut,
}

type Handler = Arc<dyn Fn(AuthEvent) + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    handlers: HashMap<AuthEvent, Vec<(u64, Handler)>>,
}

/// AuthEventBus
///
/// Cloneable handle to a shared handler registry. Constructed explicitly and
/// handed to whatever needs it (the cookie store, API clients, the server state).
#[derive(Clone, Default)]
pub struct AuthEventBus {
    registry: Arc<Mutex<Registry>>,
}

impl AuthEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// subscribe
    ///
    /// Registers `handler` for one event kind. The returned [`Subscription`] is the
    /// only way to deregister it; dropping it leaves the handler in place.
    pub fn subscribe<F>(&self, kind: AuthEvent, handler: F) -> Subscription
    where
        F: Fn(AuthEvent) + Send + Sync + 'static,
    {
        let mut registry = self.lock();
        registry.next_id += 1;
        let id = registry.next_id;
        registry
            .handlers
            .entry(kind)
            .or_default()
            .push((id, Arc::new(handler)));

        Subscription {
            registry: Arc::downgrade(&self.registry),
            kind,
            id,
        }
    }

    /// emit
    ///
    /// Runs every handler registered for `kind` before returning. A handler that
    /// panics is logged and skipped; the rest still run and the caller never sees it.
    pub fn emit(&self, kind: AuthEvent) {
        // Snapshot so handlers can (un)subscribe without deadlocking on the registry.
        let handlers: Vec<Handler> = self
            .lock()
            .handlers
            .get(&kind)
            .map(|list| list.iter().map(|(_, handler)| handler.clone()).collect())
            .unwrap_or_default();

        tracing::debug!(event = ?kind, listeners = handlers.len(), "auth event");

        for handler in handlers {
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| handler(kind))) {
                tracing::error!(
                    event = ?kind,
                    reason = panic_message(payload.as_ref()),
                    "auth event handler panicked"
                );
            }
        }
    }

    /// Number of handlers currently registered for `kind`.
    pub fn listener_count(&self, kind: AuthEvent) -> usize {
        self.lock().handlers.get(&kind).map_or(0, Vec::len)
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        // Handlers never run under the lock, so a poisoned registry is still consistent.
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Subscription
///
/// Capability to remove one handler from the bus it was registered on.
#[derive(Debug)]
pub struct Subscription {
    registry: Weak<Mutex<Registry>>,
    kind: AuthEvent,
    id: u64,
}

impl Subscription {
    pub fn unsubscribe(self) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        let mut registry = registry.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(list) = registry.handlers.get_mut(&self.kind) {
            list.retain(|(id, _)| *id != self.id);
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}
