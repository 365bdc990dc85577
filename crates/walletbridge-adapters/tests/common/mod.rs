#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::mpsc;

use walletbridge_adapters::injected::AccountsChangedHandler;
use walletbridge_adapters::{
    ChainConfig, InboundSessionEvent, InjectedWallet, SessionConnectorFactory, SessionError,
    SessionSnapshot, SessionTransport, WalletDetector,
};
use walletbridge_core::{ChainNamespace, Request, RpcError, WalletError, WalletHandlers};

pub fn starknet_config() -> ChainConfig {
    ChainConfig::new(ChainNamespace::Starknet, "SN_MAIN")
}

/// Opt-in log output while debugging a failing test (`RUST_LOG=debug`).
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Injected wallet double with togglable failure points and call counters.
pub struct MockInjectedWallet {
    pub accounts: Mutex<Vec<String>>,
    pub fail_enable: AtomicBool,
    pub fail_get_block: AtomicBool,
    pub enable_calls: AtomicUsize,
    handler: Mutex<Option<AccountsChangedHandler>>,
}

impl MockInjectedWallet {
    pub fn new(accounts: Vec<&str>) -> Arc<Self> {
        Arc::new(Self {
            accounts: Mutex::new(accounts.into_iter().map(str::to_owned).collect()),
            fail_enable: AtomicBool::new(false),
            fail_get_block: AtomicBool::new(false),
            enable_calls: AtomicUsize::new(0),
            handler: Mutex::new(None),
        })
    }

    pub fn has_accounts_handler(&self) -> bool {
        self.handler.lock().expect("handler lock").is_some()
    }

    /// Simulates the wallet's own account-switch notification.
    pub fn trigger_accounts_changed(&self, accounts: Vec<&str>) {
        let accounts: Vec<String> = accounts.into_iter().map(str::to_owned).collect();
        *self.accounts.lock().expect("accounts lock") = accounts.clone();
        let handler = self.handler.lock().expect("handler lock");
        if let Some(handler) = handler.as_ref() {
            handler(accounts);
        }
    }
}

#[async_trait]
impl InjectedWallet for MockInjectedWallet {
    async fn enable(&self) -> Result<Vec<String>, WalletError> {
        self.enable_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_enable.load(Ordering::SeqCst) {
            return Err(WalletError::ConnectionFailed(
                "user rejected approval".to_owned(),
            ));
        }
        Ok(self.accounts.lock().expect("accounts lock").clone())
    }

    fn accounts(&self) -> Vec<String> {
        self.accounts.lock().expect("accounts lock").clone()
    }

    async fn invoke_function(&self, message: &Value) -> Result<Value, RpcError> {
        Ok(json!({ "transaction_hash": "0xdead", "echo": message }))
    }

    async fn sign_message(&self, _message: &Value) -> Result<Value, RpcError> {
        Ok(json!(["0x1", "0x2"]))
    }

    async fn hash_message(&self, _message: &Value) -> Result<Value, RpcError> {
        Ok(json!("0xhash"))
    }

    async fn get_block(&self) -> Result<Value, WalletError> {
        if self.fail_get_block.load(Ordering::SeqCst) {
            return Err(WalletError::Internal("sequencer unreachable".to_owned()));
        }
        Ok(json!({ "block_number": 1 }))
    }

    fn on_accounts_changed(&self, handler: AccountsChangedHandler) {
        *self.handler.lock().expect("handler lock") = Some(handler);
    }

    fn off_accounts_changed(&self) {
        *self.handler.lock().expect("handler lock") = None;
    }
}

/// Detector double: yields the configured wallet handle, or nothing.
pub struct MockDetector {
    wallet: Option<Arc<MockInjectedWallet>>,
}

impl MockDetector {
    pub fn found(wallet: Arc<MockInjectedWallet>) -> Arc<Self> {
        Arc::new(Self {
            wallet: Some(wallet),
        })
    }

    pub fn not_installed() -> Arc<Self> {
        Arc::new(Self { wallet: None })
    }
}

#[async_trait]
impl WalletDetector for MockDetector {
    async fn detect(&self) -> Option<Arc<dyn InjectedWallet>> {
        self.wallet
            .clone()
            .map(|wallet| wallet as Arc<dyn InjectedWallet>)
    }
}

/// Handler set whose account list the test can mutate, for driving
/// reconciliation scenarios through a real engine and proxy.
pub struct SharedAccountHandlers {
    pub accounts: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl WalletHandlers for SharedAccountHandlers {
    async fn request_accounts(&self, _request: &Request) -> Result<Value, RpcError> {
        Ok(json!(self.accounts.lock().expect("accounts lock").clone()))
    }

    async fn get_private_key(&self, _request: &Request) -> Result<Value, RpcError> {
        Err(RpcError::method_not_supported())
    }

    async fn invoke_function(&self, request: &Request) -> Result<Value, RpcError> {
        request.required_param("message")?;
        Ok(json!({ "transaction_hash": "0xbeef" }))
    }

    async fn sign_message(&self, request: &Request) -> Result<Value, RpcError> {
        request.required_param("message")?;
        Ok(json!(["0xr", "0xs"]))
    }

    async fn hash_message(&self, request: &Request) -> Result<Value, RpcError> {
        request.required_param("message")?;
        Ok(json!("0xhashed"))
    }
}

#[derive(Default)]
pub struct ConnectorLog {
    pub session_creations: usize,
    pub approved_sessions: Vec<SessionSnapshot>,
    pub session_updates: Vec<SessionSnapshot>,
    pub approved_requests: Vec<(u64, Value)>,
    pub rejected_requests: Vec<(u64, String)>,
    pub kills: usize,
}

/// Session transport double recording every outbound action.
pub struct MockConnector {
    pub uri: String,
    pub log: Mutex<ConnectorLog>,
    inbound_tx: mpsc::UnboundedSender<InboundSessionEvent>,
    inbound_rx: Mutex<Option<mpsc::UnboundedReceiver<InboundSessionEvent>>>,
    connected: AtomicBool,
}

impl MockConnector {
    pub fn new(uri: &str) -> Arc<Self> {
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        Arc::new(Self {
            uri: uri.to_owned(),
            log: Mutex::new(ConnectorLog::default()),
            inbound_tx,
            inbound_rx: Mutex::new(Some(inbound_rx)),
            connected: AtomicBool::new(false),
        })
    }

    pub fn push_inbound(&self, event: InboundSessionEvent) {
        self.inbound_tx.send(event).expect("inbound channel open");
    }
}

#[async_trait]
impl SessionTransport for MockConnector {
    fn connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn create_session(&self) -> Result<(), SessionError> {
        self.log.lock().expect("log lock").session_creations += 1;
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn approve_session(&self, snapshot: SessionSnapshot) -> Result<(), SessionError> {
        self.log
            .lock()
            .expect("log lock")
            .approved_sessions
            .push(snapshot);
        Ok(())
    }

    async fn update_session(&self, snapshot: SessionSnapshot) -> Result<(), SessionError> {
        self.log
            .lock()
            .expect("log lock")
            .session_updates
            .push(snapshot);
        Ok(())
    }

    async fn approve_request(&self, id: u64, result: Value) -> Result<(), SessionError> {
        self.log
            .lock()
            .expect("log lock")
            .approved_requests
            .push((id, result));
        Ok(())
    }

    async fn reject_request(&self, id: u64, message: &str) -> Result<(), SessionError> {
        self.log
            .lock()
            .expect("log lock")
            .rejected_requests
            .push((id, message.to_owned()));
        Ok(())
    }

    async fn kill_session(&self) -> Result<(), SessionError> {
        self.log.lock().expect("log lock").kills += 1;
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn take_inbound(&self) -> Option<mpsc::UnboundedReceiver<InboundSessionEvent>> {
        self.inbound_rx.lock().expect("inbound lock").take()
    }
}

/// Factory double: one connector per accepted URI, all retained for
/// inspection.
#[derive(Default)]
pub struct MockConnectorFactory {
    pub created: Mutex<Vec<Arc<MockConnector>>>,
}

impl MockConnectorFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn created_count(&self) -> usize {
        self.created.lock().expect("created lock").len()
    }

    pub fn connector(&self, index: usize) -> Arc<MockConnector> {
        Arc::clone(&self.created.lock().expect("created lock")[index])
    }
}

impl SessionConnectorFactory for MockConnectorFactory {
    fn create(&self, pairing_uri: &str) -> Result<Arc<dyn SessionTransport>, SessionError> {
        let connector = MockConnector::new(pairing_uri);
        self.created
            .lock()
            .expect("created lock")
            .push(Arc::clone(&connector));
        Ok(connector)
    }
}
