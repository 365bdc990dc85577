pub mod config;
pub mod injected;
pub mod private_key;
pub mod provider;
pub mod registry;
pub mod session;

pub use config::ChainConfig;
pub use injected::{InjectedProviderFactory, InjectedWallet, InjectedWalletAdapter, WalletDetector};
pub use private_key::{DeterministicSigner, LocalSigner, PrivateKeyProviderFactory};
pub use provider::{build_wallet_provider, lookup_network, ProviderFactory};
pub use registry::WalletRegistry;
pub use session::{
    InboundSessionEvent, SessionBridge, SessionConnectorFactory, SessionError, SessionSnapshot,
    SessionStatus, SessionTransport,
};
