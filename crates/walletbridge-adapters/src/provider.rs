use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use walletbridge_core::{
    next_request_id, wallet_middlewares, ChainNamespace, Engine, Middleware, ProviderProxy,
    WalletError, WalletHandlers, WalletMethod,
};

use crate::config::ChainConfig;

/// Capability interface every provider variant implements: build a proxy for
/// a wallet-native source, and expose the readonly endpoint it validates
/// against. Variants are independent types selected at construction time;
/// shared assembly lives in the free functions below.
#[async_trait]
pub trait ProviderFactory: Send + Sync {
    /// The wallet-native input the variant builds from (an injected handle,
    /// a private key, ...).
    type Source;

    async fn setup_provider(&self, source: Self::Source)
        -> Result<Arc<ProviderProxy>, WalletError>;

    fn readonly_endpoint(&self) -> Result<String, WalletError>;
}

/// Wires a handler set into an engine under the chain family's method names
/// and wraps it in a fresh swappable proxy. The extra chain-id middleware
/// answers from static chain config so remote peers can snapshot
/// `{chain_id, accounts}` through the same request path.
pub fn build_wallet_provider(
    config: &ChainConfig,
    handlers: Arc<dyn WalletHandlers>,
) -> Result<Arc<ProviderProxy>, WalletError> {
    let mut middlewares = wallet_middlewares(config.namespace, handlers);
    let chain_id = config.chain_id.clone();
    middlewares.push(Middleware::new(
        config.namespace.method_name(WalletMethod::ChainId),
        move |_req| {
            let chain_id = chain_id.clone();
            async move { Ok(json!(chain_id)) }
        },
    ));
    let engine = Engine::new(middlewares)?;
    Ok(Arc::new(ProviderProxy::new(Arc::new(engine))))
}

/// Validates connectivity of a readonly rpc target with the chain family's
/// block probe before a provider is handed out. Failures are wrapped with a
/// stable message plus the underlying cause.
pub async fn lookup_network(
    client: &reqwest::Client,
    namespace: ChainNamespace,
    rpc_target: &str,
) -> Result<(), WalletError> {
    let wrap = |cause: String| {
        tracing::error!(%rpc_target, %cause, "network lookup failed");
        WalletError::NetworkLookup {
            rpc_target: rpc_target.to_owned(),
            cause,
        }
    };

    let payload = json!({
        "jsonrpc": "2.0",
        "id": next_request_id(),
        "method": namespace.block_probe_method(),
        "params": [],
    });
    let response = client
        .post(rpc_target)
        .json(&payload)
        .send()
        .await
        .map_err(|e| wrap(format!("request failed: {e}")))?;
    let status = response.status();
    if !status.is_success() {
        return Err(wrap(format!("status {status}")));
    }
    let body: Value = response
        .json()
        .await
        .map_err(|e| wrap(format!("json decode failed: {e}")))?;
    if let Some(err) = body.get("error") {
        return Err(wrap(format!("rpc target returned error: {err}")));
    }
    Ok(())
}
