// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy_primitives::Address;
use anyhow::Context;
use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Discovery budget for the externally registered FHE SDK.
///
/// The hosting environment is expected to register the SDK explicitly; the
/// bounded poll over `candidates` exists for hosts that can only do so
/// asynchronously relative to startup.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SdkDiscoveryConfig {
    /// Slot names to probe, in order
    pub candidates: Vec<String>,
    /// Maximum number of probe rounds before giving up
    pub attempts: u32,
    /// Delay between probe rounds
    pub delay_ms: u64,
}

impl Default for SdkDiscoveryConfig {
    fn default() -> Self {
        Self {
            candidates: vec![
                "fhevm".to_string(),
                "relayerSDK".to_string(),
                "zamaRelayer".to_string(),
                "relayer".to_string(),
            ],
            attempts: 20,
            delay_ms: 100,
        }
    }
}

/// Budget and upstream routing for decryption-oracle lookups.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct OracleConfig {
    /// Base URL of the oracle/relayer HTTP service
    pub upstream_url: String,
    /// Candidate upstream paths tried in order; `{requestId}` is substituted
    pub candidate_paths: Vec<String>,
    pub poll_attempts: u32,
    pub poll_interval_ms: u64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            upstream_url: "https://relayer.testnet.zama.cloud".to_string(),
            candidate_paths: vec![
                "/decrypt/{requestId}".to_string(),
                "/oracle/result?requestId={requestId}".to_string(),
                "/v1/decrypt/{requestId}".to_string(),
                "/api/decrypt/{requestId}".to_string(),
                "/decryption/{requestId}".to_string(),
                "/oracle/{requestId}".to_string(),
                "/decrypt?requestId={requestId}".to_string(),
            ],
            poll_attempts: 120,
            poll_interval_ms: 3000,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 13251,
        }
    }
}

/// The config actually used throughout the app.
///
/// Defaults carry the Sepolia reference deployment so a bare config file is
/// enough to point at the public testnet.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// Chain the pools live on
    pub chain_id: u64,
    pub network_name: String,
    /// HTTP RPC endpoint used for reads and receipt waiting
    pub rpc_url: String,
    /// ConfidentialZETH token address
    pub zethc_address: Option<Address>,
    /// FHEswap address
    pub swap_address: Option<Address>,
    /// LaunchpadFactory address
    pub factory_address: Option<Address>,
    /// Relayer service URL; required before any encrypt/decrypt call
    pub relayer_url: Option<String>,
    /// Gateway chain the relayer settles decryptions on
    pub gateway_chain_id: Option<u64>,
    pub sdk: SdkDiscoveryConfig,
    pub oracle: OracleConfig,
    /// Path of the JSON project store
    pub store_path: PathBuf,
    pub server: ServerConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            chain_id: 11155111,
            network_name: "sepolia".to_string(),
            rpc_url: "https://ethereum-sepolia-rpc.publicnode.com".to_string(),
            zethc_address: None,
            swap_address: None,
            factory_address: None,
            relayer_url: Some("https://relayer.testnet.zama.cloud".to_string()),
            gateway_chain_id: Some(55815),
            sdk: SdkDiscoveryConfig::default(),
            oracle: OracleConfig::default(),
            store_path: PathBuf::from("data/projects.json"),
            server: ServerConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load from a yaml file merged with `ZLAUNCH_*` environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));
        if let Some(path) = path {
            let expanded = shellexpand::full(
                path.to_str().context("config path is not valid utf-8")?,
            )?;
            figment = figment.merge(Yaml::file(expanded.as_ref()));
        }
        figment
            .merge(Env::prefixed("ZLAUNCH_").split("__"))
            .extract()
            .context("could not load configuration")
    }

    /// The configuration signature a relayer instance is bound to. A change
    /// in either component invalidates any cached instance.
    pub fn relayer_signature(&self) -> Option<String> {
        match (&self.relayer_url, self.gateway_chain_id) {
            (Some(url), Some(gateway)) => Some(format!("{url}|{gateway}")),
            _ => None,
        }
    }
}
