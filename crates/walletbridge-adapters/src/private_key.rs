use std::sync::{Arc, Mutex, PoisonError};

use alloy::hex;
use alloy::primitives::keccak256;
use async_trait::async_trait;
use serde_json::{json, Value};

use walletbridge_core::{
    ProviderProxy, Request, RpcError, WalletError, WalletHandlers,
};

use crate::config::ChainConfig;
use crate::provider::{build_wallet_provider, lookup_network, ProviderFactory};

/// Signing collaborator for key-backed providers. Signature algorithms are
/// opaque to the core; this seam carries payloads in and signatures out.
#[async_trait]
pub trait LocalSigner: Send + Sync {
    fn address(&self, private_key: &str) -> Result<String, RpcError>;

    fn sign_message(&self, private_key: &str, message: &Value) -> Result<Value, RpcError>;

    fn hash_message(&self, message: &Value) -> Result<String, RpcError>;

    /// Signs and submits a transaction through the chain's rpc endpoint.
    async fn invoke_function(&self, private_key: &str, message: &Value)
        -> Result<Value, RpcError>;
}

fn canonical(message: &Value) -> Result<Vec<u8>, RpcError> {
    serde_json::to_vec(message)
        .map_err(|e| RpcError::internal(format!("payload serialization failed: {e}")))
}

/// Keccak-seeded stand-in signer for tests and offline use. Output is stable
/// for a given key and payload but carries no cryptographic meaning.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeterministicSigner;

#[async_trait]
impl LocalSigner for DeterministicSigner {
    fn address(&self, private_key: &str) -> Result<String, RpcError> {
        let digest = keccak256(private_key.as_bytes());
        Ok(format!("0x{}", hex::encode(&digest[12..])))
    }

    fn sign_message(&self, private_key: &str, message: &Value) -> Result<Value, RpcError> {
        let mut seed = Vec::new();
        seed.extend_from_slice(b"sign_message");
        seed.extend_from_slice(private_key.as_bytes());
        seed.extend_from_slice(&canonical(message)?);
        let digest = keccak256(seed);
        let mut signature = Vec::with_capacity(65);
        signature.extend_from_slice(digest.as_slice());
        signature.extend_from_slice(digest.as_slice());
        signature.push(27);
        Ok(json!(format!("0x{}", hex::encode(signature))))
    }

    fn hash_message(&self, message: &Value) -> Result<String, RpcError> {
        Ok(format!("0x{}", hex::encode(keccak256(canonical(message)?))))
    }

    async fn invoke_function(
        &self,
        private_key: &str,
        message: &Value,
    ) -> Result<Value, RpcError> {
        let mut seed = Vec::new();
        seed.extend_from_slice(b"invoke_function");
        seed.extend_from_slice(private_key.as_bytes());
        seed.extend_from_slice(&canonical(message)?);
        Ok(json!({
            "transaction_hash": format!("0x{}", hex::encode(keccak256(seed))),
        }))
    }
}

/// Handler set over a raw private key. Unlike extension wallets, the key is
/// custodied here, so `get_private_key` answers with it.
struct PrivateKeyHandlers {
    private_key: String,
    signer: Arc<dyn LocalSigner>,
}

#[async_trait]
impl WalletHandlers for PrivateKeyHandlers {
    async fn request_accounts(&self, _request: &Request) -> Result<Value, RpcError> {
        let address = self.signer.address(&self.private_key)?;
        Ok(json!([address]))
    }

    async fn get_private_key(&self, _request: &Request) -> Result<Value, RpcError> {
        Ok(json!(self.private_key))
    }

    async fn invoke_function(&self, request: &Request) -> Result<Value, RpcError> {
        let message = request.required_param("message")?;
        self.signer
            .invoke_function(&self.private_key, message)
            .await
    }

    async fn sign_message(&self, request: &Request) -> Result<Value, RpcError> {
        let message = request.required_param("message")?;
        self.signer.sign_message(&self.private_key, message)
    }

    async fn hash_message(&self, request: &Request) -> Result<Value, RpcError> {
        let message = request.required_param("message")?;
        Ok(json!(self.signer.hash_message(message)?))
    }
}

/// Provider variant backed by a locally held private key. Requires both a
/// chain id and a readonly rpc target; connectivity to the target is
/// validated before the proxy is handed out.
pub struct PrivateKeyProviderFactory {
    config: ChainConfig,
    signer: Arc<dyn LocalSigner>,
    client: reqwest::Client,
    proxy: Mutex<Option<Arc<ProviderProxy>>>,
}

impl PrivateKeyProviderFactory {
    pub fn new(config: ChainConfig, signer: Arc<dyn LocalSigner>) -> Result<Self, WalletError> {
        config.validate_for_private_key()?;
        Ok(Self {
            config,
            signer,
            client: reqwest::Client::new(),
            proxy: Mutex::new(None),
        })
    }
}

#[async_trait]
impl ProviderFactory for PrivateKeyProviderFactory {
    type Source = String;

    async fn setup_provider(
        &self,
        private_key: String,
    ) -> Result<Arc<ProviderProxy>, WalletError> {
        if private_key.is_empty() {
            return Err(WalletError::InvalidConfig(
                "private key must be a non-empty string".to_owned(),
            ));
        }
        let handlers = Arc::new(PrivateKeyHandlers {
            private_key,
            signer: Arc::clone(&self.signer),
        });
        let proxy = build_wallet_provider(&self.config, handlers)?;
        lookup_network(
            &self.client,
            self.config.namespace,
            self.config.rpc_target()?,
        )
        .await?;

        let mut current = self.proxy.lock().unwrap_or_else(PoisonError::into_inner);
        *current = Some(Arc::clone(&proxy));
        Ok(proxy)
    }

    fn readonly_endpoint(&self) -> Result<String, WalletError> {
        let current = self.proxy.lock().unwrap_or_else(PoisonError::into_inner);
        if current.is_none() {
            return Err(WalletError::Rpc(RpcError::provider_not_initialized()));
        }
        self.config.rpc_target().map(str::to_owned)
    }
}
