// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Same-origin proxy in front of the decryption oracle. The upstream's route
//! layout is unstable across deployments, so a fixed candidate list is tried
//! in order and the first recognizable body wins.

use serde::{Deserialize, Serialize};
use tracing::debug;
use zl_config::OracleConfig;

/// Normalized proxy response: the upstream arrays plus the candidate path
/// that produced them.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct OracleProxyResponse {
    pub plaintexts: Vec<String>,
    pub signatures: Vec<String>,
    pub source: String,
}

#[derive(Debug, Deserialize)]
struct UpstreamBody {
    plaintexts: Vec<String>,
    signatures: Vec<String>,
}

/// The two upstream body shapes observed in the wild.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum UpstreamEnvelope {
    Nested { result: UpstreamBody },
    Flat(UpstreamBody),
}

fn normalize(payload: &serde_json::Value, source: &str) -> Option<OracleProxyResponse> {
    let envelope: UpstreamEnvelope = serde_json::from_value(payload.clone()).ok()?;
    let body = match envelope {
        UpstreamEnvelope::Nested { result } => result,
        UpstreamEnvelope::Flat(body) => body,
    };
    Some(OracleProxyResponse {
        plaintexts: body.plaintexts,
        signatures: body.signatures,
        source: source.to_string(),
    })
}

pub struct OracleProxy {
    http: reqwest::Client,
    upstream_url: String,
    candidate_paths: Vec<String>,
}

impl OracleProxy {
    pub fn new(config: &OracleConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            upstream_url: config.upstream_url.trim_end_matches('/').to_string(),
            candidate_paths: config.candidate_paths.clone(),
        }
    }

    pub fn tried_paths(&self, request_id: &str) -> Vec<String> {
        self.candidate_paths
            .iter()
            .map(|path| path.replace("{requestId}", request_id))
            .collect()
    }

    /// Try every candidate path; the first success with a recognizable body
    /// is returned. Unreachable paths and unrecognized bodies are skipped.
    pub async fn fetch(&self, request_id: &str) -> Option<OracleProxyResponse> {
        for path in self.tried_paths(request_id) {
            let url = format!("{}{}", self.upstream_url, path);
            debug!(%url, "trying oracle upstream path");

            let response = match self.http.get(&url).send().await {
                Ok(response) => response,
                Err(err) => {
                    debug!(%url, error = %err, "oracle upstream path unreachable");
                    continue;
                }
            };
            if !response.status().is_success() {
                debug!(%url, status = %response.status(), "oracle upstream path rejected");
                continue;
            }
            let payload: serde_json::Value = match response.json().await {
                Ok(payload) => payload,
                Err(_) => continue,
            };
            if let Some(normalized) = normalize(&payload, &path) {
                return Some(normalized);
            }
            debug!(%url, "oracle upstream body did not match any known shape");
        }
        None
    }
}
