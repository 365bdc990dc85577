use std::sync::Arc;

use walletbridge_core::{WalletAdapter, WalletError};

type AdapterFactory = Arc<dyn Fn() -> Arc<dyn WalletAdapter> + Send + Sync>;

/// Explicit registry of the wallet integrations an application composes. No
/// ambient global state: the composing application owns the value and passes
/// it to whatever renders or drives the wallet list.
#[derive(Default, Clone)]
pub struct WalletRegistry {
    entries: Vec<(String, AdapterFactory)>,
}

impl WalletRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> Result<(), WalletError>
    where
        F: Fn() -> Arc<dyn WalletAdapter> + Send + Sync + 'static,
    {
        let name = name.into();
        if self.entries.iter().any(|(existing, _)| *existing == name) {
            return Err(WalletError::InvalidConfig(format!(
                "wallet already registered: {name}"
            )));
        }
        self.entries.push((name, Arc::new(factory)));
        Ok(())
    }

    /// Instantiates the named adapter, if registered.
    pub fn instantiate(&self, name: &str) -> Option<Arc<dyn WalletAdapter>> {
        self.entries
            .iter()
            .find(|(entry, _)| entry == name)
            .map(|(_, factory)| factory())
    }

    /// Registration order, which is also presentation order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for WalletRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletRegistry")
            .field("names", &self.names())
            .finish()
    }
}
