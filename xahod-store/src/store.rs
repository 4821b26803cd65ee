//! Store engine
//!
//! A `Store<D>` owns one live state value built from a `StoreDefinition`.
//! State changes only through mutations (`commit`), `patch` and `reset`;
//! actions (`dispatch`) run async and may commit any number of times.
//!
//! # Concurrency
//!
//! State lives behind `RwLock<Arc<S>>`. Writers clone-on-write through
//! `Arc::make_mut`, so snapshots handed to readers never change under them.
//! Subscribers run after the write lock is released and may commit or read
//! the store themselves. A reentrant delivery lock is held from the write
//! until the last callback returns, so subscribers see snapshots in commit
//! order even when commits race across threads.

use async_trait::async_trait;
use parking_lot::{Mutex, ReentrantMutex, RwLock};
use serde_json::Value;
use std::sync::{Arc, Weak};
use tracing::debug;

use crate::error::{StoreError, StoreResult};

/// Reserved mutation name reported to subscribers after `patch`
pub const PATCH: &str = "$patch";

/// Reserved mutation name reported to subscribers after `reset`
pub const RESET: &str = "$reset";

// =============================================================================
// Operations
// =============================================================================

/// Why a name-based operation could not be built
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationError {
    /// No operation with this name
    Unknown,
    /// Name matched but the payload did not decode
    InvalidPayload(String),
}

/// Closed set of mutations or actions with a string surface.
pub trait Operation: Sized {
    /// Name reported to subscribers and logs
    fn name(&self) -> String;

    /// Build the operation from its name and a JSON payload
    fn from_named(name: &str, payload: Value) -> Result<Self, OperationError>;
}

// =============================================================================
// Definition
// =============================================================================

/// Declarative description of a store.
#[async_trait]
pub trait StoreDefinition: Send + Sync + Sized + 'static {
    /// State value
    type State: Clone + Send + Sync + 'static;

    /// Synchronous state transitions
    type Mutation: Operation + Send + 'static;

    /// Asynchronous operations
    type Action: Operation + Send + 'static;

    /// Store id, used in logs and errors
    fn id(&self) -> &'static str;

    /// Fresh initial state
    fn state(&self) -> Self::State;

    /// Apply a mutation in place
    fn mutate(&self, state: &mut Self::State, mutation: Self::Mutation);

    /// Run an action against the store
    async fn act(&self, store: &Store<Self>, action: Self::Action) -> StoreResult<()>;
}

// =============================================================================
// Subscriptions
// =============================================================================

type Callback<S> = Arc<dyn Fn(&str, &S) + Send + Sync>;

struct Subscribers<S> {
    next_id: u64,
    entries: Vec<(u64, Callback<S>)>,
}

/// Handle returned by [`Store::subscribe`].
///
/// Dropping the handle keeps the callback registered.
pub struct Subscription<S> {
    id: u64,
    subscribers: Weak<Mutex<Subscribers<S>>>,
}

impl<S> Subscription<S> {
    /// Remove the callback. Calling it again does nothing.
    pub fn unsubscribe(&self) {
        if let Some(subscribers) = self.subscribers.upgrade() {
            subscribers.lock().entries.retain(|(id, _)| *id != self.id);
        }
    }
}

// =============================================================================
// Store
// =============================================================================

/// Live store instance
pub struct Store<D: StoreDefinition> {
    definition: D,
    state: RwLock<Arc<D::State>>,
    initial: Arc<D::State>,
    subscribers: Arc<Mutex<Subscribers<D::State>>>,
    delivery: ReentrantMutex<()>,
}

impl<D: StoreDefinition> Store<D> {
    /// Build the store, invoking the state factory once
    pub fn new(definition: D) -> Self {
        let initial = Arc::new(definition.state());
        Self {
            state: RwLock::new(Arc::clone(&initial)),
            initial,
            definition,
            subscribers: Arc::new(Mutex::new(Subscribers {
                next_id: 0,
                entries: Vec::new(),
            })),
            delivery: ReentrantMutex::new(()),
        }
    }

    /// Store id
    pub fn id(&self) -> &'static str {
        self.definition.id()
    }

    /// Definition this store was built from
    pub fn definition(&self) -> &D {
        &self.definition
    }

    /// Current state snapshot
    pub fn state(&self) -> Arc<D::State> {
        Arc::clone(&self.state.read())
    }

    /// Compute a value from the current state without cloning it
    pub fn read<R>(&self, f: impl FnOnce(&D::State) -> R) -> R {
        let guard = self.state.read();
        f(&guard)
    }

    /// Apply a mutation, then notify subscribers
    pub fn commit(&self, mutation: D::Mutation) {
        let name = mutation.name();
        let _delivery = self.delivery.lock();
        let snapshot = self.write(|state| self.definition.mutate(state, mutation));
        debug!(store = self.id(), mutation = %name, "Mutation committed");
        self.notify(&name, &snapshot);
    }

    /// Name-based commit
    pub fn commit_named(&self, name: &str, payload: Value) -> StoreResult<()> {
        let mutation = D::Mutation::from_named(name, payload).map_err(|e| match e {
            OperationError::Unknown => StoreError::unknown_mutation(self.id(), name),
            OperationError::InvalidPayload(message) => StoreError::InvalidPayload {
                name: name.to_string(),
                message,
            },
        })?;
        self.commit(mutation);
        Ok(())
    }

    /// Run an action with this store as its context
    pub async fn dispatch(&self, action: D::Action) -> StoreResult<()> {
        debug!(store = self.id(), action = %action.name(), "Dispatching action");
        self.definition.act(self, action).await
    }

    /// Name-based dispatch
    pub async fn dispatch_named(&self, name: &str, payload: Value) -> StoreResult<()> {
        let action = D::Action::from_named(name, payload).map_err(|e| match e {
            OperationError::Unknown => StoreError::unknown_action(self.id(), name),
            OperationError::InvalidPayload(message) => StoreError::InvalidPayload {
                name: name.to_string(),
                message,
            },
        })?;
        self.dispatch(action).await
    }

    /// Register a callback invoked after every state change, in
    /// subscription order
    pub fn subscribe<F>(&self, callback: F) -> Subscription<D::State>
    where
        F: Fn(&str, &D::State) + Send + Sync + 'static,
    {
        let mut subscribers = self.subscribers.lock();
        let id = subscribers.next_id;
        subscribers.next_id += 1;
        subscribers.entries.push((id, Arc::new(callback)));

        Subscription {
            id,
            subscribers: Arc::downgrade(&self.subscribers),
        }
    }

    /// Number of registered callbacks
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().entries.len()
    }

    /// Update the state in place, then notify with `"$patch"`
    pub fn patch(&self, f: impl FnOnce(&mut D::State)) {
        let _delivery = self.delivery.lock();
        let snapshot = self.write(f);
        debug!(store = self.id(), "State patched");
        self.notify(PATCH, &snapshot);
    }

    /// Restore the construction-time state, then notify with `"$reset"`
    pub fn reset(&self) {
        let _delivery = self.delivery.lock();
        let snapshot = {
            let mut guard = self.state.write();
            *guard = Arc::clone(&self.initial);
            Arc::clone(&guard)
        };
        debug!(store = self.id(), "State reset");
        self.notify(RESET, &snapshot);
    }

    fn write(&self, f: impl FnOnce(&mut D::State)) -> Arc<D::State> {
        let mut guard = self.state.write();
        f(Arc::make_mut(&mut guard));
        Arc::clone(&guard)
    }

    fn notify(&self, name: &str, state: &D::State) {
        // Snapshot the list so callbacks can subscribe or unsubscribe
        let callbacks: Vec<Callback<D::State>> =
            self.subscribers.lock().entries.iter().map(|(_, cb)| Arc::clone(cb)).collect();

        for callback in callbacks {
            callback(name, state);
        }
    }
}
