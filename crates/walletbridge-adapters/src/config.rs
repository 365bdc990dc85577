use serde::{Deserialize, Serialize};

use walletbridge_core::{ChainNamespace, WalletError};

/// Chain parameters a provider variant is built against. Which fields are
/// required depends on the variant: an injected wallet carries its own rpc
/// connection, a private-key provider needs a readonly rpc target of its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    pub namespace: ChainNamespace,
    pub chain_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rpc_target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl ChainConfig {
    pub fn new(namespace: ChainNamespace, chain_id: impl Into<String>) -> Self {
        Self {
            namespace,
            chain_id: chain_id.into(),
            rpc_target: None,
            display_name: None,
        }
    }

    pub fn with_rpc_target(mut self, rpc_target: impl Into<String>) -> Self {
        self.rpc_target = Some(rpc_target.into());
        self
    }

    pub fn validate_for_injected(&self) -> Result<(), WalletError> {
        if self.chain_id.is_empty() {
            return Err(WalletError::InvalidConfig(
                "please provide chain_id in chain config".to_owned(),
            ));
        }
        Ok(())
    }

    pub fn validate_for_private_key(&self) -> Result<(), WalletError> {
        self.validate_for_injected()?;
        match self.rpc_target.as_deref() {
            Some(target) if !target.is_empty() => Ok(()),
            _ => Err(WalletError::InvalidConfig(
                "please provide rpc_target in chain config".to_owned(),
            )),
        }
    }

    /// The readonly endpoint, failing when the variant has none configured.
    pub fn rpc_target(&self) -> Result<&str, WalletError> {
        self.rpc_target
            .as_deref()
            .ok_or_else(|| WalletError::InvalidConfig("rpc_target is not configured".to_owned()))
    }
}
