use std::sync::{Arc, Mutex, PoisonError, Weak};

use async_trait::async_trait;
use serde_json::{json, Value};

use walletbridge_core::{
    AdapterEvent, AdapterStatus, ChainNamespace, Emitter, InitOptions, LifecycleState,
    ProviderEvent, ProviderProxy, Request, RpcError, UserInfo, WalletAdapter, WalletError,
    WalletHandlers,
};

use crate::config::ChainConfig;
use crate::provider::{build_wallet_provider, ProviderFactory};

pub type AccountsChangedHandler = Box<dyn Fn(Vec<String>) + Send + Sync>;

/// The injected wallet object, received as an opaque handle once detection
/// (external to this crate) has succeeded. Mirrors what browser extensions
/// expose: enable, sign/submit/hash over wallet-native payloads, and an
/// account-change notification channel.
#[async_trait]
pub trait InjectedWallet: Send + Sync {
    /// Asks the wallet to authorize the application. Resolves to the
    /// authorized accounts.
    async fn enable(&self) -> Result<Vec<String>, WalletError>;

    fn accounts(&self) -> Vec<String>;

    async fn invoke_function(&self, message: &Value) -> Result<Value, RpcError>;

    async fn sign_message(&self, message: &Value) -> Result<Value, RpcError>;

    async fn hash_message(&self, message: &Value) -> Result<Value, RpcError>;

    /// Reads a recent block through the wallet's own connection; used as the
    /// connectivity probe during provider setup.
    async fn get_block(&self) -> Result<Value, WalletError>;

    fn on_accounts_changed(&self, handler: AccountsChangedHandler);

    fn off_accounts_changed(&self);
}

/// Detection collaborator: probing global scope, polling for injection and so
/// on happen behind this seam.
#[async_trait]
pub trait WalletDetector: Send + Sync {
    async fn detect(&self) -> Option<Arc<dyn InjectedWallet>>;
}

/// Handler set over an injected wallet handle. Non-custodial extensions hold
/// their own keys, so the private-key handler fails deterministically.
struct InjectedHandlers {
    wallet: Arc<dyn InjectedWallet>,
}

#[async_trait]
impl WalletHandlers for InjectedHandlers {
    async fn request_accounts(&self, _request: &Request) -> Result<Value, RpcError> {
        Ok(json!(self.wallet.accounts()))
    }

    async fn get_private_key(&self, _request: &Request) -> Result<Value, RpcError> {
        Err(RpcError::method_not_supported())
    }

    async fn invoke_function(&self, request: &Request) -> Result<Value, RpcError> {
        let message = request.required_param("message")?;
        self.wallet.invoke_function(message).await
    }

    async fn sign_message(&self, request: &Request) -> Result<Value, RpcError> {
        let message = request.required_param("message")?;
        self.wallet.sign_message(message).await
    }

    async fn hash_message(&self, request: &Request) -> Result<Value, RpcError> {
        let message = request.required_param("message")?;
        self.wallet.hash_message(message).await
    }
}

/// Provider variant for injected extension wallets.
pub struct InjectedProviderFactory {
    config: ChainConfig,
    readonly_endpoint: Mutex<Option<String>>,
}

impl InjectedProviderFactory {
    pub fn new(config: ChainConfig) -> Result<Self, WalletError> {
        config.validate_for_injected()?;
        Ok(Self {
            config,
            readonly_endpoint: Mutex::new(None),
        })
    }
}

#[async_trait]
impl ProviderFactory for InjectedProviderFactory {
    type Source = Arc<dyn InjectedWallet>;

    async fn setup_provider(
        &self,
        wallet: Arc<dyn InjectedWallet>,
    ) -> Result<Arc<ProviderProxy>, WalletError> {
        wallet.get_block().await.map_err(|e| {
            tracing::error!(error = %e, "error while connecting to the wallet's rpc endpoint");
            WalletError::NetworkLookup {
                rpc_target: self
                    .config
                    .rpc_target
                    .clone()
                    .unwrap_or_else(|| "injected wallet endpoint".to_owned()),
                cause: e.to_string(),
            }
        })?;

        let handlers = Arc::new(InjectedHandlers {
            wallet: Arc::clone(&wallet),
        });
        let proxy = build_wallet_provider(&self.config, handlers)?;

        // Re-broadcast the wallet's own notifications; the proxy never
        // synthesizes these events itself.
        let proxy_for_events: Weak<ProviderProxy> = Arc::downgrade(&proxy);
        wallet.on_accounts_changed(Box::new(move |accounts| {
            if let Some(proxy) = proxy_for_events.upgrade() {
                proxy.emit(ProviderEvent::AccountsChanged { accounts });
            }
        }));

        let mut endpoint = self
            .readonly_endpoint
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *endpoint = self.config.rpc_target.clone();
        Ok(proxy)
    }

    fn readonly_endpoint(&self) -> Result<String, WalletError> {
        self.readonly_endpoint
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or_else(|| WalletError::Rpc(RpcError::provider_not_initialized()))
    }
}

#[derive(Default)]
struct ConnectionState {
    wallet: Option<Arc<dyn InjectedWallet>>,
    provider: Option<Arc<ProviderProxy>>,
}

/// Adapter for a browser-extension wallet. One instance per integration; the
/// proxy it owns is created fresh on each successful connect and discarded on
/// disconnect.
pub struct InjectedWalletAdapter {
    name: String,
    config: ChainConfig,
    detector: Arc<dyn WalletDetector>,
    lifecycle: LifecycleState,
    connection: Mutex<ConnectionState>,
}

impl InjectedWalletAdapter {
    pub fn new(
        name: impl Into<String>,
        config: ChainConfig,
        detector: Arc<dyn WalletDetector>,
    ) -> Result<Self, WalletError> {
        config.validate_for_injected()?;
        let name = name.into();
        Ok(Self {
            lifecycle: LifecycleState::new(name.clone()),
            name,
            config,
            detector,
            connection: Mutex::new(ConnectionState::default()),
        })
    }

    fn wallet(&self) -> Result<Arc<dyn InjectedWallet>, WalletError> {
        self.connection
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .wallet
            .clone()
            .ok_or(WalletError::NotConnected)
    }

    async fn try_connect(
        &self,
        wallet: &Arc<dyn InjectedWallet>,
    ) -> Result<Arc<ProviderProxy>, WalletError> {
        wallet
            .enable()
            .await
            .map_err(|e| WalletError::ConnectionFailed(e.to_string()))?;
        let factory = InjectedProviderFactory::new(self.config.clone())?;
        factory.setup_provider(Arc::clone(wallet)).await
    }
}

#[async_trait]
impl WalletAdapter for InjectedWalletAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn namespace(&self) -> ChainNamespace {
        self.config.namespace
    }

    fn status(&self) -> AdapterStatus {
        self.lifecycle.status()
    }

    fn provider(&self) -> Option<Arc<ProviderProxy>> {
        self.connection
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .provider
            .clone()
    }

    fn lifecycle_events(&self) -> &Emitter<AdapterEvent> {
        self.lifecycle.events()
    }

    async fn init(&self, options: InitOptions) -> Result<(), WalletError> {
        self.lifecycle.check_init_requirements()?;
        let Some(wallet) = self.detector.detect().await else {
            let error =
                WalletError::NotInstalled(format!("{} wallet extension is not installed", self.name));
            self.lifecycle.emit_errored(&error);
            return Err(error);
        };
        {
            let mut connection = self
                .connection
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            connection.wallet = Some(wallet);
        }
        self.lifecycle.set_status(AdapterStatus::Ready);
        self.lifecycle.emit_ready();

        if options.auto_connect {
            self.lifecycle.set_rehydrated(true);
            if let Err(error) = self.connect().await {
                tracing::warn!(adapter = %self.name, %error, "auto-connect failed during init");
                self.lifecycle.emit_errored(&error);
            }
        }
        Ok(())
    }

    async fn connect(&self) -> Result<Arc<ProviderProxy>, WalletError> {
        self.lifecycle.check_connection_requirements()?;
        self.lifecycle.set_status(AdapterStatus::Connecting);
        self.lifecycle.emit_connecting();

        let wallet = match self.wallet() {
            Ok(wallet) => wallet,
            Err(error) => {
                self.lifecycle.set_status(AdapterStatus::Ready);
                self.lifecycle.emit_errored(&error);
                return Err(error);
            }
        };
        match self.try_connect(&wallet).await {
            Ok(provider) => {
                {
                    let mut connection = self
                        .connection
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner);
                    connection.provider = Some(Arc::clone(&provider));
                }
                self.lifecycle.set_status(AdapterStatus::Connected);
                self.lifecycle.emit_connected(self.lifecycle.rehydrated());
                Ok(provider)
            }
            Err(error) => {
                // Ready again to be connected; the wallet itself is still usable.
                self.lifecycle.set_status(AdapterStatus::Ready);
                self.lifecycle.set_rehydrated(false);
                self.lifecycle.emit_errored(&error);
                Err(error)
            }
        }
    }

    async fn disconnect(&self) -> Result<(), WalletError> {
        if self.lifecycle.status() != AdapterStatus::Connected {
            return Err(WalletError::NotConnected);
        }
        let (wallet, provider) = {
            let mut connection = self
                .connection
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            (connection.wallet.clone(), connection.provider.take())
        };
        if let Some(wallet) = wallet {
            wallet.off_accounts_changed();
        }
        if let Some(provider) = provider {
            provider.remove_all_listeners();
            provider.clear_target();
        }
        self.lifecycle.set_status(AdapterStatus::Ready);
        self.lifecycle.set_rehydrated(false);
        self.lifecycle.emit_disconnected();
        Ok(())
    }

    async fn get_user_info(&self) -> Result<UserInfo, WalletError> {
        if self.lifecycle.status() != AdapterStatus::Connected {
            return Err(WalletError::NotConnected);
        }
        // Extension wallets expose no profile data; the empty record is not
        // an error for this class of wallet.
        Ok(UserInfo::default())
    }
}
