use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::adapter::{ChainNamespace, WalletMethod};
use crate::middleware::Middleware;
use crate::rpc::{Request, RpcError};

/// The named capabilities a concrete wallet integration supplies. Handlers
/// know nothing about the engine; they are pure capability providers. A
/// handler that is not meaningful for a wallet must fail with
/// `RpcError::method_not_supported`, never silently succeed with empty data.
#[async_trait]
pub trait WalletHandlers: Send + Sync {
    async fn request_accounts(&self, request: &Request) -> Result<Value, RpcError>;

    async fn get_private_key(&self, request: &Request) -> Result<Value, RpcError>;

    /// Submit a chain transaction.
    async fn invoke_function(&self, request: &Request) -> Result<Value, RpcError>;

    async fn sign_message(&self, request: &Request) -> Result<Value, RpcError>;

    async fn hash_message(&self, request: &Request) -> Result<Value, RpcError>;
}

/// Assembles the middleware list wiring a handler set under the chain
/// family's namespaced method names. Ordering is fixed here; the engine
/// rejects duplicates at construction.
pub fn wallet_middlewares(
    namespace: ChainNamespace,
    handlers: Arc<dyn WalletHandlers>,
) -> Vec<Middleware> {
    let invoke = Arc::clone(&handlers);
    let accounts = Arc::clone(&handlers);
    let sign = Arc::clone(&handlers);
    let hash = Arc::clone(&handlers);
    let private_key = handlers;
    vec![
        Middleware::new(
            namespace.method_name(WalletMethod::InvokeFunction),
            move |req| {
                let handlers = Arc::clone(&invoke);
                async move { handlers.invoke_function(&req).await }
            },
        ),
        Middleware::new(
            namespace.method_name(WalletMethod::RequestAccounts),
            move |req| {
                let handlers = Arc::clone(&accounts);
                async move { handlers.request_accounts(&req).await }
            },
        ),
        Middleware::new(
            namespace.method_name(WalletMethod::SignMessage),
            move |req| {
                let handlers = Arc::clone(&sign);
                async move { handlers.sign_message(&req).await }
            },
        ),
        Middleware::new(
            namespace.method_name(WalletMethod::HashMessage),
            move |req| {
                let handlers = Arc::clone(&hash);
                async move { handlers.hash_message(&req).await }
            },
        ),
        Middleware::new(
            namespace.method_name(WalletMethod::PrivateKey),
            move |req| {
                let handlers = Arc::clone(&private_key);
                async move { handlers.get_private_key(&req).await }
            },
        ),
    ]
}
