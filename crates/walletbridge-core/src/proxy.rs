use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;

use crate::events::{Emitter, Keyed, ListenerId};
use crate::middleware::Engine;
use crate::rpc::{Request, RpcError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderEventKind {
    AccountsChanged,
    ChainChanged,
}

/// Notifications re-broadcast from the wallet's own channel. The proxy never
/// synthesizes these itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    AccountsChanged { accounts: Vec<String> },
    ChainChanged { chain_id: String },
}

impl Keyed for ProviderEvent {
    type Kind = ProviderEventKind;

    fn kind(&self) -> ProviderEventKind {
        match self {
            ProviderEvent::AccountsChanged { .. } => ProviderEventKind::AccountsChanged,
            ProviderEvent::ChainChanged { .. } => ProviderEventKind::ChainChanged,
        }
    }
}

/// The stable request facade applications hold. The engine behind it can be
/// swapped atomically without invalidating listener registrations or
/// references held by callers.
#[derive(Debug)]
pub struct ProviderProxy {
    target: Mutex<Option<Arc<Engine>>>,
    events: Emitter<ProviderEvent>,
}

impl ProviderProxy {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self {
            target: Mutex::new(Some(engine)),
            events: Emitter::new(),
        }
    }

    /// Dispatches against the engine that is current at call time. A request
    /// snapshot-reads the target before awaiting, so an in-flight request
    /// completes against the pre-swap engine even if it settles after a swap.
    pub async fn request(&self, request: Request) -> Result<Value, RpcError> {
        let engine = {
            let target = self
                .target
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            target.clone()
        };
        let engine = engine.ok_or_else(RpcError::provider_not_initialized)?;
        engine.dispatch(request).await.into_result()
    }

    /// Atomically replaces the target for future requests.
    pub fn swap_target(&self, engine: Arc<Engine>) {
        let mut target = self
            .target
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *target = Some(engine);
    }

    /// Drops the target; subsequent requests fail with "provider is not
    /// initialized". Used at disconnect.
    pub fn clear_target(&self) {
        let mut target = self
            .target
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *target = None;
    }

    pub fn on<F>(&self, kind: ProviderEventKind, listener: F) -> ListenerId
    where
        F: Fn(&ProviderEvent) + Send + Sync + 'static,
    {
        self.events.on(kind, listener)
    }

    pub fn off(&self, id: ListenerId) -> bool {
        self.events.off(id)
    }

    /// Called during disconnect; leaves the proxy with no external
    /// subscriptions back into wallet internals.
    pub fn remove_all_listeners(&self) {
        self.events.remove_all();
    }

    pub fn listener_count(&self) -> usize {
        self.events.listener_count()
    }

    /// Re-broadcasts a wallet-originated notification to subscribers.
    pub fn emit(&self, event: ProviderEvent) {
        self.events.emit(&event);
    }
}
