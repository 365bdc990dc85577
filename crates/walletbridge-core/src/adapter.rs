use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::WalletError;
use crate::events::{Emitter, Keyed};
use crate::proxy::ProviderProxy;

/// Chain family an adapter serves. Determines the namespaced method names its
/// engine answers and the probe used for network lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainNamespace {
    Eip155,
    Solana,
    Starknet,
}

impl ChainNamespace {
    pub fn prefix(self) -> &'static str {
        match self {
            ChainNamespace::Eip155 => "eth",
            ChainNamespace::Solana => "solana",
            ChainNamespace::Starknet => "starknet",
        }
    }

    /// Read-only method used to validate connectivity of an rpc target.
    pub fn block_probe_method(self) -> &'static str {
        match self {
            ChainNamespace::Eip155 => "eth_blockNumber",
            ChainNamespace::Solana => "getLatestBlockhash",
            ChainNamespace::Starknet => "starknet_blockNumber",
        }
    }

    pub fn method_name(self, method: WalletMethod) -> String {
        format!("{}_{}", self.prefix(), method.suffix())
    }
}

impl std::fmt::Display for ChainNamespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.prefix())
    }
}

/// The application-level operations every wallet integration routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletMethod {
    RequestAccounts,
    PrivateKey,
    InvokeFunction,
    SignMessage,
    HashMessage,
    ChainId,
}

impl WalletMethod {
    fn suffix(self) -> &'static str {
        match self {
            WalletMethod::RequestAccounts => "request_accounts",
            WalletMethod::PrivateKey => "private_key",
            WalletMethod::InvokeFunction => "invoke_function",
            WalletMethod::SignMessage => "sign_message",
            WalletMethod::HashMessage => "hash_message",
            WalletMethod::ChainId => "chain_id",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterStatus {
    NotReady,
    Ready,
    Connecting,
    Connected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterEventKind {
    Ready,
    Connecting,
    Connected,
    Disconnected,
    Errored,
}

/// Lifecycle notifications for passive observers such as a UI layer. Active
/// callers additionally receive the failure as a returned error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdapterEvent {
    Ready { adapter: String },
    Connecting { adapter: String },
    Connected { adapter: String, reconnected: bool },
    Disconnected { adapter: String },
    Errored { adapter: String, error: String },
}

impl Keyed for AdapterEvent {
    type Kind = AdapterEventKind;

    fn kind(&self) -> AdapterEventKind {
        match self {
            AdapterEvent::Ready { .. } => AdapterEventKind::Ready,
            AdapterEvent::Connecting { .. } => AdapterEventKind::Connecting,
            AdapterEvent::Connected { .. } => AdapterEventKind::Connected,
            AdapterEvent::Disconnected { .. } => AdapterEventKind::Disconnected,
            AdapterEvent::Errored { .. } => AdapterEventKind::Errored,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InitOptions {
    pub auto_connect: bool,
}

/// Profile record for wallets that expose identity metadata. Wallets without
/// profile data return the empty record; that is not an error condition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verifier_id: Option<String>,
}

/// Shared lifecycle cell for adapter implementations: status, the
/// auto-reconnect ("rehydrated") flag, and the lifecycle event channel.
/// Variants compose this instead of inheriting transition logic.
#[derive(Debug)]
pub struct LifecycleState {
    adapter_name: String,
    status: Mutex<AdapterStatus>,
    rehydrated: AtomicBool,
    events: Emitter<AdapterEvent>,
}

impl LifecycleState {
    pub fn new(adapter_name: impl Into<String>) -> Self {
        Self {
            adapter_name: adapter_name.into(),
            status: Mutex::new(AdapterStatus::NotReady),
            rehydrated: AtomicBool::new(false),
            events: Emitter::new(),
        }
    }

    pub fn adapter_name(&self) -> &str {
        &self.adapter_name
    }

    pub fn status(&self) -> AdapterStatus {
        *self.status.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_status(&self, status: AdapterStatus) {
        *self.status.lock().unwrap_or_else(PoisonError::into_inner) = status;
    }

    pub fn rehydrated(&self) -> bool {
        self.rehydrated.load(Ordering::Relaxed)
    }

    pub fn set_rehydrated(&self, value: bool) {
        self.rehydrated.store(value, Ordering::Relaxed);
    }

    pub fn events(&self) -> &Emitter<AdapterEvent> {
        &self.events
    }

    /// `init()` is allowed only before the adapter has become ready.
    pub fn check_init_requirements(&self) -> Result<(), WalletError> {
        match self.status() {
            AdapterStatus::NotReady => Ok(()),
            AdapterStatus::Connecting => Err(WalletError::ConnectionPending),
            AdapterStatus::Connected => Err(WalletError::AlreadyConnected),
            AdapterStatus::Ready => Err(WalletError::AlreadyInitialized),
        }
    }

    /// `connect()` is allowed only from `Ready`; the guard also defends
    /// against overlapping lifecycle calls.
    pub fn check_connection_requirements(&self) -> Result<(), WalletError> {
        match self.status() {
            AdapterStatus::Ready => Ok(()),
            AdapterStatus::NotReady => Err(WalletError::NotInitialized),
            AdapterStatus::Connecting => Err(WalletError::ConnectionPending),
            AdapterStatus::Connected => Err(WalletError::AlreadyConnected),
        }
    }

    pub fn emit_ready(&self) {
        self.events.emit(&AdapterEvent::Ready {
            adapter: self.adapter_name.clone(),
        });
    }

    pub fn emit_connecting(&self) {
        self.events.emit(&AdapterEvent::Connecting {
            adapter: self.adapter_name.clone(),
        });
    }

    pub fn emit_connected(&self, reconnected: bool) {
        self.events.emit(&AdapterEvent::Connected {
            adapter: self.adapter_name.clone(),
            reconnected,
        });
    }

    pub fn emit_disconnected(&self) {
        self.events.emit(&AdapterEvent::Disconnected {
            adapter: self.adapter_name.clone(),
        });
    }

    pub fn emit_errored(&self, error: &WalletError) {
        self.events.emit(&AdapterEvent::Errored {
            adapter: self.adapter_name.clone(),
            error: error.to_string(),
        });
    }
}

/// One wallet integration instance. Lifecycle calls are strictly sequential;
/// none of them carry an intrinsic timeout, so callers wanting a cutoff for a
/// hung wallet or network round-trip wrap calls in their own timeout.
#[async_trait]
pub trait WalletAdapter: Send + Sync {
    fn name(&self) -> &str;

    fn namespace(&self) -> ChainNamespace;

    fn status(&self) -> AdapterStatus;

    /// The proxy owned since the last successful connect, if any.
    fn provider(&self) -> Option<Arc<ProviderProxy>>;

    /// Lifecycle event channel for passive observers.
    fn lifecycle_events(&self) -> &Emitter<AdapterEvent>;

    async fn init(&self, options: InitOptions) -> Result<(), WalletError>;

    async fn connect(&self) -> Result<Arc<ProviderProxy>, WalletError>;

    async fn disconnect(&self) -> Result<(), WalletError>;

    async fn get_user_info(&self) -> Result<UserInfo, WalletError>;
}
