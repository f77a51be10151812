// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Owns the process-wide FHE SDK handle and the cached relayer instance.
//! Callers hold the manager by reference; there is no ambient global state.

use crate::error::RelayerError;
use crate::sdk::{FhevmInstance, FhevmSdk, InstanceConfig, SdkRegistry};
use crate::wallet::WalletDirectory;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell, RwLock};
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};
use zl_config::{AppConfig, SdkDiscoveryConfig};

/// The slice of configuration the manager operates on. Replaced wholesale on
/// reconfiguration; the instance cache keys on the derived signature.
#[derive(Debug, Clone)]
pub struct RelayerSettings {
    pub chain_id: u64,
    pub network_name: String,
    pub relayer_url: Option<String>,
    pub gateway_chain_id: Option<u64>,
    pub discovery: SdkDiscoveryConfig,
}

impl RelayerSettings {
    pub fn signature(&self) -> Option<String> {
        match (&self.relayer_url, self.gateway_chain_id) {
            (Some(url), Some(gateway)) => Some(format!("{url}|{gateway}")),
            _ => None,
        }
    }
}

impl From<&AppConfig> for RelayerSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            chain_id: config.chain_id,
            network_name: config.network_name.clone(),
            relayer_url: config.relayer_url.clone(),
            gateway_chain_id: config.gateway_chain_id,
            discovery: config.sdk.clone(),
        }
    }
}

/// What an operation gets back from `ensure_instance`: the SDK handle is
/// always present, the instance only when requested (or already cached).
#[derive(Clone)]
pub struct RelayerSession {
    pub sdk: Arc<dyn FhevmSdk>,
    pub instance: Option<Arc<dyn FhevmInstance>>,
}

struct CachedInstance {
    signature: String,
    instance: Arc<dyn FhevmInstance>,
}

pub struct RelayerManager {
    registry: Arc<SdkRegistry>,
    wallets: Arc<WalletDirectory>,
    settings: RwLock<RelayerSettings>,
    sdk: OnceCell<Arc<dyn FhevmSdk>>,
    cached: RwLock<Option<CachedInstance>>,
    /// Serializes instance rebuilds so concurrent callers with a cold or
    /// stale cache share one `create_instance` per configuration signature.
    build_lock: Mutex<()>,
}

impl RelayerManager {
    pub fn new(
        registry: Arc<SdkRegistry>,
        wallets: Arc<WalletDirectory>,
        settings: RelayerSettings,
    ) -> Arc<Self> {
        Arc::new(Self {
            registry,
            wallets,
            settings: RwLock::new(settings),
            sdk: OnceCell::new(),
            cached: RwLock::new(None),
            build_lock: Mutex::new(()),
        })
    }

    pub fn wallets(&self) -> &Arc<WalletDirectory> {
        &self.wallets
    }

    pub async fn settings(&self) -> RelayerSettings {
        self.settings.read().await.clone()
    }

    /// Replace the active settings. A cached instance built under a different
    /// configuration signature becomes stale and is rebuilt on next use.
    pub async fn update_settings(&self, settings: RelayerSettings) {
        *self.settings.write().await = settings;
    }

    /// Make the SDK handle available, initializing it at most once.
    /// Concurrent callers await the same in-flight initialization; the module
    /// may register its slot asynchronously, so discovery polls the candidate
    /// names with a bounded budget.
    pub async fn ensure_sdk(&self) -> Result<Arc<dyn FhevmSdk>, RelayerError> {
        self.sdk
            .get_or_try_init(|| async {
                let discovery = self.settings.read().await.discovery.clone();
                let sdk = self.discover(&discovery).await?;
                sdk.init().await?;
                info!(
                    version = sdk.version().as_deref().unwrap_or("unknown"),
                    "FHE SDK initialized"
                );
                Ok(sdk)
            })
            .await
            .cloned()
    }

    async fn discover(
        &self,
        discovery: &SdkDiscoveryConfig,
    ) -> Result<Arc<dyn FhevmSdk>, RelayerError> {
        for attempt in 0..discovery.attempts {
            for name in &discovery.candidates {
                if let Some(sdk) = self.registry.lookup(name).await {
                    debug!(slot = %name, attempt, "found FHE SDK");
                    return Ok(sdk);
                }
            }
            sleep(Duration::from_millis(discovery.delay_ms)).await;
        }
        Err(RelayerError::SdkNotFound {
            attempts: discovery.attempts,
        })
    }

    /// Produce a usable session. With `require_instance` set, builds (or
    /// reuses) an instance bound to the current configuration signature;
    /// otherwise only the SDK handle is guaranteed.
    pub async fn ensure_instance(
        &self,
        require_instance: bool,
    ) -> Result<RelayerSession, RelayerError> {
        let sdk = self.ensure_sdk().await?;

        let settings = self.settings.read().await.clone();
        let signature = settings.signature();

        if let Some(cached) = self.cached.read().await.as_ref() {
            if Some(cached.signature.as_str()) == signature.as_deref() {
                return Ok(RelayerSession {
                    sdk,
                    instance: Some(cached.instance.clone()),
                });
            }
        }

        if !require_instance {
            return Ok(RelayerSession {
                sdk,
                instance: None,
            });
        }

        // Rebuild path, single-flight: a concurrent caller may have built
        // the instance while this one waited for the lock.
        let _build = self.build_lock.lock().await;
        if let Some(cached) = self.cached.read().await.as_ref() {
            if Some(cached.signature.as_str()) == signature.as_deref() {
                return Ok(RelayerSession {
                    sdk,
                    instance: Some(cached.instance.clone()),
                });
            }
        }

        let wallet = self.wallets.resolve().await?;
        let (Some(relayer_url), Some(gateway_chain_id)) =
            (settings.relayer_url.clone(), settings.gateway_chain_id)
        else {
            return Err(RelayerError::MissingConfig);
        };
        let signature = format!("{relayer_url}|{gateway_chain_id}");

        let instance = sdk
            .create_instance(InstanceConfig {
                network: wallet,
                relayer_url,
                gateway_chain_id,
                preset: settings.network_name.clone(),
            })
            .await?;

        let mut cached = self.cached.write().await;
        if let Some(previous) = cached.as_ref() {
            if previous.signature != signature {
                warn!(
                    old = %previous.signature,
                    new = %signature,
                    "relayer configuration changed, replacing cached instance"
                );
            }
        }
        *cached = Some(CachedInstance {
            signature,
            instance: instance.clone(),
        });

        Ok(RelayerSession {
            sdk,
            instance: Some(instance),
        })
    }
}
