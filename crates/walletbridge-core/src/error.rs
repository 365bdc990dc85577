use thiserror::Error;

use crate::middleware::EngineSetupError;
use crate::rpc::RpcError;

/// Lifecycle-level failures. Per-request failures travel inside responses as
/// `RpcError`; these are the ones surfaced to the active caller (and mirrored
/// as `Errored` events for passive observers).
#[derive(Debug, Clone, Error)]
pub enum WalletError {
    #[error("wallet is not installed: {0}")]
    NotInstalled(String),

    #[error("invalid provider config: {0}")]
    InvalidConfig(String),

    #[error("adapter is already initialized")]
    AlreadyInitialized,

    #[error("adapter initialization required before connect")]
    NotInitialized,

    #[error("connection already in progress")]
    ConnectionPending,

    #[error("already connected with wallet")]
    AlreadyConnected,

    #[error("not connected with wallet")]
    NotConnected,

    #[error("failed to connect with wallet: {0}")]
    ConnectionFailed(String),

    #[error("failed to lookup network for rpc target {rpc_target}: {cause}")]
    NetworkLookup { rpc_target: String, cause: String },

    #[error("rpc failure: {0}")]
    Rpc(#[from] RpcError),

    #[error("invalid middleware configuration: {0}")]
    Middleware(#[from] EngineSetupError),

    #[error("internal error: {0}")]
    Internal(String),
}
