pub mod adapter;
pub mod error;
pub mod events;
pub mod handlers;
pub mod middleware;
pub mod proxy;
pub mod rpc;

pub use adapter::{
    AdapterEvent, AdapterEventKind, AdapterStatus, ChainNamespace, InitOptions, LifecycleState,
    UserInfo, WalletAdapter, WalletMethod,
};
pub use error::WalletError;
pub use events::{Emitter, Keyed, ListenerId};
pub use handlers::{wallet_middlewares, WalletHandlers};
pub use middleware::{Engine, EngineSetupError, Middleware};
pub use proxy::{ProviderEvent, ProviderEventKind, ProviderProxy};
pub use rpc::{codes, next_request_id, Outcome, Request, Response, RpcError, PROTOCOL_VERSION};
