//! Transactional state.
use std::mem;

use crate::{
    event::{Event, EventTag},
    storage::{NestedStore, OverlayStore},
};

/// State modification options.
#[derive(Clone, Default, Debug)]
pub struct Options {
    pub silence_events: bool,
}

impl Options {
    /// Create options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all events emitted within the child state, even when it is committed.
    pub fn with_silenced_events(self) -> Self {
        Self {
            silence_events: true,
            ..self
        }
    }
}

/// Mutable state of a chain.
///
/// The state includes storage and emitted events. States can be nested via `open`, `commit` and
/// `rollback` methods which behave like transactions.
pub struct State {
    parent: Option<Box<State>>,
    store: Option<Box<dyn NestedStore>>,

    events: Vec<EventTag>,
    silence_events: bool,
}

impl State {
    /// Create a new root state on top of the given store.
    pub fn new<S: NestedStore + 'static>(root: S) -> Self {
        Self {
            parent: None,
            store: Some(Box::new(root)),
            events: Vec::new(),
            silence_events: false,
        }
    }

    /// Initialize the state with the given options.
    fn init(&mut self, opts: Options) {
        if opts.silence_events {
            self.silence_events = true;
        }
    }

    /// Open a child state after which self will point to the child state.
    pub fn open(&mut self) {
        let mut parent = Self {
            parent: None,
            store: None,
            events: Vec::new(),
            silence_events: false,
        };
        mem::swap(&mut parent, self);

        // Wrap parent store to create an overlay child store.
        self.store = parent
            .store
            .take()
            .map(|pstore| Box::new(OverlayStore::new(pstore)) as Box<dyn NestedStore>);

        self.parent = Some(Box::new(parent));
    }

    /// Commit the current state and return to its parent state.
    ///
    /// # Panics
    ///
    /// This method will panic when attempting to commit the root state.
    pub fn commit(&mut self) {
        let mut child = *self.parent.take().expect("cannot commit on root state");
        mem::swap(&mut child, self);

        // Commit storage.
        self.store = child.store.take().map(|cstore| cstore.commit());

        // Propagate events.
        if !child.silence_events {
            self.events.extend(child.events);
        }
    }

    /// Rollback the current state and return to its parent state.
    ///
    /// # Panics
    ///
    /// This method will panic when attempting to rollback the root state.
    pub fn rollback(&mut self) {
        let mut child = *self.parent.take().expect("cannot rollback on root state");
        mem::swap(&mut child, self);

        // Rollback storage.
        self.store = child.store.take().map(|cstore| cstore.rollback());
    }

    /// Number of transaction levels above the root state.
    pub fn level(&self) -> usize {
        match self.parent {
            Some(ref parent) => parent.level() + 1,
            None => 0,
        }
    }

    /// Emit an event.
    pub fn emit_event<E: Event>(&mut self, event: E) {
        self.emit_event_raw(event.into_event_tag());
    }

    /// Emit a raw event.
    pub fn emit_event_raw(&mut self, etag: EventTag) {
        self.events.push(etag);
    }

    /// Events accumulated in the current state, in emission order.
    pub fn events(&self) -> &[EventTag] {
        &self.events
    }

    /// Take all events accumulated in the current state.
    pub fn take_events(&mut self) -> Vec<EventTag> {
        mem::take(&mut self.events)
    }

    /// Store associated with the state.
    ///
    /// # Panics
    ///
    /// This method will panic if no store is available.
    pub fn store(&mut self) -> &mut dyn NestedStore {
        self.store.as_deref_mut().expect("no store available")
    }

    /// Whether the store associated with the state has any pending updates.
    pub fn has_pending_store_updates(&self) -> bool {
        self.store
            .as_ref()
            .map(|store| store.has_pending_updates())
            .unwrap_or_default()
    }

    /// Run a closure within a state transaction.
    ///
    /// If the closure returns `TransactionResult::Commit(R)` then the child state is committed,
    /// otherwise the child state is rolled back.
    pub fn with_transaction<F, R, Rs>(&mut self, f: F) -> R
    where
        F: FnOnce(&mut State) -> Rs,
        Rs: Into<TransactionResult<R>>,
    {
        self.with_transaction_opts(Options::default(), f)
    }

    /// Run a closure within a state transaction, allowing the caller to customize state.
    ///
    /// If the closure returns `TransactionResult::Commit(R)` then the child state is committed,
    /// otherwise the child state is rolled back.
    pub fn with_transaction_opts<F, R, Rs>(&mut self, opts: Options, f: F) -> R
    where
        F: FnOnce(&mut State) -> Rs,
        Rs: Into<TransactionResult<R>>,
    {
        self.open();
        self.init(opts);
        let level = self.level();
        // Ensure transaction is always closed.
        let mut guard = TransactionGuard { state: self, level };

        match f(guard.state).into() {
            TransactionResult::Commit(result) => {
                guard.state.commit();
                result
            }
            TransactionResult::Rollback(result) => {
                guard.state.rollback();
                result
            }
        }
    }
}

/// A guard that rolls back an unfinished transaction, e.g. on panic.
struct TransactionGuard<'a> {
    state: &'a mut State,
    level: usize,
}

impl Drop for TransactionGuard<'_> {
    fn drop(&mut self) {
        // If transaction hasn't been either committed or reverted, rollback.
        if self.state.level() == self.level {
            self.state.rollback();
        }
    }
}

/// Result of a transaction helper closure.
pub enum TransactionResult<T> {
    Commit(T),
    Rollback(T),
}

impl From<()> for TransactionResult<()> {
    fn from(_: ()) -> TransactionResult<()> {
        TransactionResult::Commit(())
    }
}

impl<R, E> From<Result<R, E>> for TransactionResult<Result<R, E>> {
    fn from(v: Result<R, E>) -> TransactionResult<Result<R, E>> {
        match v {
            Ok(_) => TransactionResult::Commit(v),
            Err(_) => TransactionResult::Rollback(v),
        }
    }
}

#[cfg(test)]
mod test {
    use std::panic::{catch_unwind, AssertUnwindSafe};

    use super::*;
    use crate::storage::{MemoryStore, Store};

    struct TestEvent(u64);

    impl Event for TestEvent {
        fn module_name() -> &'static str {
            "test"
        }

        fn code(&self) -> u32 {
            1
        }

        fn value(&self) -> cbor::Value {
            cbor::to_value(self.0)
        }
    }

    #[test]
    fn test_basic() {
        let mut state = State::new(MemoryStore::new());
        assert_eq!(state.level(), 0);

        state.open();
        assert_eq!(state.level(), 1);
        state.store().insert(b"key", b"value");
        assert!(state.has_pending_store_updates());
        state.emit_event(TestEvent(1));

        state.open();
        state.store().insert(b"key", b"other");
        state.emit_event(TestEvent(2));
        state.rollback();
        assert_eq!(state.level(), 1);
        assert_eq!(state.store().get(b"key"), Some(b"value".to_vec()));
        assert_eq!(state.events().len(), 1);

        state.commit();
        assert_eq!(state.level(), 0);
        assert_eq!(state.store().get(b"key"), Some(b"value".to_vec()));

        let events = state.take_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].key, b"test\x00\x00\x00\x01");
        assert_eq!(events[0].decode::<u64>().unwrap(), 1);
        assert!(events[0].is_from("test"));
        assert!(!events[0].is_from("tes"));
    }

    #[test]
    #[should_panic(expected = "cannot commit on root state")]
    fn test_commit_root() {
        let mut state = State::new(MemoryStore::new());
        state.commit();
    }

    #[test]
    fn test_with_transaction() {
        let mut state = State::new(MemoryStore::new());

        let result: Result<(), ()> = state.with_transaction(|state| {
            state.store().insert(b"a", b"1");
            state.emit_event(TestEvent(1));
            Ok(())
        });
        assert!(result.is_ok());
        assert_eq!(state.store().get(b"a"), Some(b"1".to_vec()));
        assert_eq!(state.events().len(), 1);

        let result: Result<(), &str> = state.with_transaction(|state| {
            state.store().insert(b"b", b"2");
            state.emit_event(TestEvent(2));
            Err("failed")
        });
        assert_eq!(result, Err("failed"));
        assert_eq!(state.store().get(b"b"), None);
        assert_eq!(state.events().len(), 1);
        assert_eq!(state.level(), 0);
    }

    #[test]
    fn test_with_transaction_silenced_events() {
        let mut state = State::new(MemoryStore::new());

        state.with_transaction_opts(Options::new().with_silenced_events(), |state| {
            state.store().insert(b"a", b"1");
            state.emit_event(TestEvent(1));

            // Nested transactions are silenced together with their parent.
            state.with_transaction(|state| state.emit_event(TestEvent(2)));
        });
        assert_eq!(state.store().get(b"a"), Some(b"1".to_vec()));
        assert!(state.events().is_empty());
    }

    #[test]
    fn test_with_transaction_panic() {
        let mut state = State::new(MemoryStore::new());

        let result = catch_unwind(AssertUnwindSafe(|| {
            state.with_transaction(|state| {
                state.store().insert(b"a", b"1");
                panic!("boom");
            })
        }));
        assert!(result.is_err());
        assert_eq!(state.level(), 0);
        assert_eq!(state.store().get(b"a"), None);
    }
}
