use std::sync::{Arc, Mutex as StdMutex, PoisonError};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};

use walletbridge_core::{
    ChainNamespace, ListenerId, ProviderEventKind, ProviderProxy, Request, RpcError, WalletMethod,
};

#[derive(Debug, Clone, Error)]
pub enum SessionError {
    #[error("no session is currently open")]
    NoSession,

    #[error("session transport error: {0}")]
    Transport(String),

    #[error("provider request failed: {0}")]
    Provider(#[from] RpcError),

    #[error("failed to decode provider snapshot: {0}")]
    Decode(String),
}

/// Account/chain state as last communicated to the remote peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub chain_id: String,
    pub accounts: Vec<String>,
}

impl SessionSnapshot {
    /// The remote peer cares about the active account and chain; a change in
    /// either is what warrants a session update.
    fn differs_from(&self, other: &SessionSnapshot) -> bool {
        self.chain_id != other.chain_id || self.accounts.first() != other.accounts.first()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Idle,
    Connecting,
    Connected,
    Disconnected,
}

/// Notifications arriving from the remote peer over the pairing transport.
#[derive(Debug, Clone)]
pub enum InboundSessionEvent {
    /// The remote peer asks for session approval.
    SessionRequest { payload: Value },
    SessionUpdate { payload: Value },
    /// The remote peer invokes a wallet operation.
    CallRequest { request: Request },
    Connect,
    Disconnect,
}

/// The remote-pairing transport (the QR-code-paired connector). One instance
/// per accepted pairing URI; superseded connectors are killed, never reused.
#[async_trait]
pub trait SessionTransport: Send + Sync {
    fn connected(&self) -> bool;

    async fn create_session(&self) -> Result<(), SessionError>;

    async fn approve_session(&self, snapshot: SessionSnapshot) -> Result<(), SessionError>;

    async fn update_session(&self, snapshot: SessionSnapshot) -> Result<(), SessionError>;

    async fn approve_request(&self, id: u64, result: Value) -> Result<(), SessionError>;

    async fn reject_request(&self, id: u64, message: &str) -> Result<(), SessionError>;

    async fn kill_session(&self) -> Result<(), SessionError>;

    /// Hands out the inbound event stream; consumable once per connector.
    fn take_inbound(&self) -> Option<mpsc::UnboundedReceiver<InboundSessionEvent>>;
}

pub trait SessionConnectorFactory: Send + Sync {
    fn create(&self, pairing_uri: &str) -> Result<Arc<dyn SessionTransport>, SessionError>;
}

#[derive(Default)]
struct BridgeState {
    connector: Option<Arc<dyn SessionTransport>>,
    pairing_uri: Option<String>,
    status: Option<SessionStatus>,
    last_snapshot: Option<SessionSnapshot>,
}

/// Exposes an already-connected provider proxy to a remote peer. Every remote
/// invocation is forwarded through the proxy's `request`; account/chain
/// changes observed on the proxy are reconciled into session updates.
///
/// Reconciliation re-reads a fresh snapshot instead of trusting the event
/// payload (snapshot read wins); a second change arriving between event and
/// read is therefore coalesced into the fresh read, and the follow-up trigger
/// pushes nothing. Flagged for review rather than silently changed.
pub struct SessionBridge {
    provider: Arc<ProviderProxy>,
    namespace: ChainNamespace,
    factory: Arc<dyn SessionConnectorFactory>,
    state: Mutex<BridgeState>,
    // Serializes reconciliation attempts so no two session-update pushes
    // overlap; triggers are processed in arrival order.
    reconcile_gate: Mutex<()>,
    triggers: Mutex<mpsc::UnboundedReceiver<()>>,
    listener_ids: StdMutex<Vec<ListenerId>>,
}

impl SessionBridge {
    /// Wraps a provider proxy and subscribes to its account/chain events.
    /// The subscription enqueues reconciliation triggers; callers drive them
    /// with [`SessionBridge::run_reconciler`] (or [`SessionBridge::sync_pending`]).
    pub fn attach(
        provider: Arc<ProviderProxy>,
        namespace: ChainNamespace,
        factory: Arc<dyn SessionConnectorFactory>,
    ) -> Arc<Self> {
        let (trigger_tx, trigger_rx) = mpsc::unbounded_channel();
        let bridge = Arc::new(Self {
            provider,
            namespace,
            factory,
            state: Mutex::new(BridgeState::default()),
            reconcile_gate: Mutex::new(()),
            triggers: Mutex::new(trigger_rx),
            listener_ids: StdMutex::new(Vec::new()),
        });

        let accounts_tx = trigger_tx.clone();
        let accounts_id = bridge
            .provider
            .on(ProviderEventKind::AccountsChanged, move |_event| {
                let _ = accounts_tx.send(());
            });
        let chain_id = bridge
            .provider
            .on(ProviderEventKind::ChainChanged, move |_event| {
                let _ = trigger_tx.send(());
            });
        *bridge
            .listener_ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = vec![accounts_id, chain_id];
        bridge
    }

    pub async fn status(&self) -> SessionStatus {
        self.state.lock().await.status.unwrap_or(SessionStatus::Idle)
    }

    pub async fn pairing_uri(&self) -> Option<String> {
        self.state.lock().await.pairing_uri.clone()
    }

    /// Accepts a pairing URI obtained out of band (scanned or pasted).
    /// Re-scanning the URI of the active session is a no-op; a differing URI
    /// supersedes the old session, which is torn down first.
    pub async fn accept_pairing_uri(&self, uri: &str) -> Result<(), SessionError> {
        let mut state = self.state.lock().await;
        if state.connector.is_some() && state.pairing_uri.as_deref() == Some(uri) {
            return Ok(());
        }
        if let Some(previous) = state.connector.take() {
            if let Err(error) = previous.kill_session().await {
                tracing::warn!(%error, "failed to kill superseded session");
            }
            state.last_snapshot = None;
        }
        let connector = self.factory.create(uri)?;
        if !connector.connected() {
            connector.create_session().await?;
        }
        state.connector = Some(connector);
        state.pairing_uri = Some(uri.to_owned());
        state.status = Some(SessionStatus::Connecting);
        Ok(())
    }

    /// Kills the open session. Reported as `NoSession` when none is open;
    /// callers treat that as non-fatal.
    pub async fn disconnect(&self) -> Result<(), SessionError> {
        let connector = {
            let mut state = self.state.lock().await;
            let connector = state.connector.take().ok_or(SessionError::NoSession)?;
            state.pairing_uri = None;
            state.last_snapshot = None;
            state.status = Some(SessionStatus::Disconnected);
            connector
        };
        connector.kill_session().await
    }

    /// Serves the current connector's inbound events until the stream closes.
    pub async fn run_inbound(&self) -> Result<(), SessionError> {
        let mut inbound = self
            .connector()
            .await?
            .take_inbound()
            .ok_or_else(|| SessionError::Transport("inbound stream already consumed".to_owned()))?;
        while let Some(event) = inbound.recv().await {
            self.handle_inbound(event).await?;
        }
        Ok(())
    }

    pub async fn handle_inbound(&self, event: InboundSessionEvent) -> Result<(), SessionError> {
        match event {
            InboundSessionEvent::SessionRequest { payload } => {
                tracing::info!(?payload, "inbound session request");
                let snapshot = self.session_snapshot().await?;
                let connector = self.connector().await?;
                connector.approve_session(snapshot.clone()).await?;
                let mut state = self.state.lock().await;
                state.last_snapshot = Some(snapshot);
                state.status = Some(SessionStatus::Connected);
            }
            InboundSessionEvent::SessionUpdate { payload } => {
                tracing::debug!(?payload, "inbound session update");
            }
            InboundSessionEvent::CallRequest { request } => {
                // The only path by which the remote peer reaches wallet
                // operations; it must never bypass the provider proxy.
                let connector = self.connector().await?;
                let id = request.id;
                match self.provider.request(request).await {
                    Ok(result) => connector.approve_request(id, result).await?,
                    Err(error) => {
                        connector
                            .reject_request(id, &format!("failed or rejected request: {error}"))
                            .await?
                    }
                }
            }
            InboundSessionEvent::Connect => {
                self.state.lock().await.status = Some(SessionStatus::Connected);
            }
            InboundSessionEvent::Disconnect => {
                let mut state = self.state.lock().await;
                state.connector = None;
                state.pairing_uri = None;
                state.last_snapshot = None;
                state.status = Some(SessionStatus::Disconnected);
            }
        }
        Ok(())
    }

    /// Long-running reconciliation driver for production wiring.
    pub async fn run_reconciler(&self) {
        loop {
            let trigger = { self.triggers.lock().await.recv().await };
            if trigger.is_none() {
                break;
            }
            if let Err(error) = self.reconcile().await {
                tracing::warn!(%error, "session reconciliation failed");
            }
        }
    }

    /// Drains queued reconciliation triggers, returning how many session
    /// updates were actually pushed (coalesced triggers push nothing).
    pub async fn sync_pending(&self) -> Result<usize, SessionError> {
        let mut pushed = 0;
        loop {
            let trigger = { self.triggers.lock().await.try_recv() };
            if trigger.is_err() {
                break;
            }
            if self.reconcile().await? {
                pushed += 1;
            }
        }
        Ok(pushed)
    }

    /// One reconciliation attempt: re-read the snapshot and push a session
    /// update only when it differs from what the peer last saw.
    async fn reconcile(&self) -> Result<bool, SessionError> {
        let _serialized = self.reconcile_gate.lock().await;
        let (connector, last) = {
            let state = self.state.lock().await;
            match (&state.connector, &state.last_snapshot) {
                // Nothing has been communicated to a peer yet.
                (Some(connector), Some(last)) => (Arc::clone(connector), last.clone()),
                _ => return Ok(false),
            }
        };
        let snapshot = self.session_snapshot().await?;
        if !snapshot.differs_from(&last) {
            return Ok(false);
        }
        connector.update_session(snapshot.clone()).await?;
        self.state.lock().await.last_snapshot = Some(snapshot);
        Ok(true)
    }

    async fn connector(&self) -> Result<Arc<dyn SessionTransport>, SessionError> {
        self.state
            .lock()
            .await
            .connector
            .clone()
            .ok_or(SessionError::NoSession)
    }

    async fn session_snapshot(&self) -> Result<SessionSnapshot, SessionError> {
        let accounts_request = Request::new(
            self.namespace.method_name(WalletMethod::RequestAccounts),
            Value::Null,
        );
        let chain_request = Request::new(
            self.namespace.method_name(WalletMethod::ChainId),
            Value::Null,
        );
        let (accounts, chain_id) = tokio::join!(
            self.provider.request(accounts_request),
            self.provider.request(chain_request),
        );
        let accounts: Vec<String> = serde_json::from_value(accounts?)
            .map_err(|e| SessionError::Decode(format!("accounts: {e}")))?;
        let chain_id: String = serde_json::from_value(chain_id?)
            .map_err(|e| SessionError::Decode(format!("chain id: {e}")))?;
        Ok(SessionSnapshot { chain_id, accounts })
    }
}

impl Drop for SessionBridge {
    fn drop(&mut self) {
        let ids = std::mem::take(
            &mut *self
                .listener_ids
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        for id in ids {
            self.provider.off(id);
        }
    }
}
