use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Events that carry an enumerated kind, so subscriptions can filter on an
/// explicit closed set instead of open string keys.
pub trait Keyed {
    type Kind: Copy + PartialEq + Send;

    fn kind(&self) -> Self::Kind;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Callback<E> = Arc<dyn Fn(&E) + Send + Sync>;

struct Entry<E: Keyed> {
    id: ListenerId,
    kind: E::Kind,
    callback: Callback<E>,
}

/// Multi-listener pub-sub keyed by event kind. Insertion order is delivery
/// order; removing a listener never disturbs the others.
pub struct Emitter<E: Keyed> {
    entries: Mutex<Vec<Entry<E>>>,
    next_id: AtomicU64,
}

impl<E: Keyed> Default for Emitter<E> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }
}

impl<E: Keyed> Emitter<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on<F>(&self, kind: E::Kind, callback: F) -> ListenerId
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        entries.push(Entry {
            id,
            kind,
            callback: Arc::new(callback),
        });
        id
    }

    /// Removes one listener. Returns false if it was already gone.
    pub fn off(&self, id: ListenerId) -> bool {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|entry| entry.id != id);
        entries.len() != before
    }

    pub fn remove_all(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn listener_count(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Delivers to every listener registered for the event's kind, in
    /// insertion order. Callbacks run outside the registry lock so a listener
    /// may re-enter the emitter.
    pub fn emit(&self, event: &E) {
        let callbacks: Vec<Callback<E>> = {
            let entries = self
                .entries
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            entries
                .iter()
                .filter(|entry| entry.kind == event.kind())
                .map(|entry| Arc::clone(&entry.callback))
                .collect()
        };
        for callback in callbacks {
            callback(event);
        }
    }
}

impl<E: Keyed> std::fmt::Debug for Emitter<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Emitter")
            .field("listeners", &self.listener_count())
            .finish()
    }
}
