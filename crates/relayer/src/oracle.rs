// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Fetches completed decryption results for a pending on-chain request
//! through the same-origin oracle proxy. The upstream's response shape is
//! not pinned down, so decoding goes through a closed set of envelopes.

use serde::Deserialize;
use thiserror::Error;
use tokio::time::{sleep, Duration};
use tracing::debug;
use zl_config::OracleConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleDecryption {
    pub plaintexts: Vec<String>,
    pub signatures: Vec<String>,
}

/// One poll cycle either produced a result or the oracle is still working.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OracleOutcome {
    Ready(OracleDecryption),
    /// The attempt budget ran out; not an error, check back later.
    Pending,
}

#[derive(Error, Debug)]
pub enum OracleError {
    #[error("oracle proxy returned {status}: {body}")]
    Upstream { status: u16, body: String },
    #[error("unrecognized oracle response shape: {0}")]
    BadFormat(String),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Deserialize)]
struct OracleBody {
    plaintexts: Vec<String>,
    signatures: Vec<String>,
}

/// The envelopes the oracle service has been observed to return: the arrays
/// at the top level, or nested under `result`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OracleEnvelope {
    Nested { result: OracleBody },
    Flat(OracleBody),
}

impl OracleEnvelope {
    fn into_body(self) -> OracleBody {
        match self {
            OracleEnvelope::Nested { result } => result,
            OracleEnvelope::Flat(body) => body,
        }
    }
}

fn decode_oracle_payload(payload: &serde_json::Value) -> Result<OracleDecryption, OracleError> {
    let envelope: OracleEnvelope = serde_json::from_value(payload.clone())
        .map_err(|_| OracleError::BadFormat(payload.to_string()))?;
    let body = envelope.into_body();
    if body.plaintexts.is_empty() || body.plaintexts.len() != body.signatures.len() {
        return Err(OracleError::BadFormat(payload.to_string()));
    }
    Ok(OracleDecryption {
        plaintexts: body.plaintexts,
        signatures: body.signatures,
    })
}

pub struct OracleClient {
    http: reqwest::Client,
    /// Origin serving the `/api/oracle` proxy
    base_url: String,
    poll_attempts: u32,
    poll_interval: Duration,
}

impl OracleClient {
    pub fn new(base_url: impl Into<String>, config: &OracleConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            poll_attempts: config.poll_attempts,
            poll_interval: Duration::from_millis(config.poll_interval_ms),
        }
    }

    /// One request, one answer. Retry cadence is the caller's business.
    pub async fn fetch(&self, request_id: &str) -> Result<OracleDecryption, OracleError> {
        let url = format!("{}/api/oracle", self.base_url.trim_end_matches('/'));
        let response = self
            .http
            .get(&url)
            .query(&[("requestId", request_id)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OracleError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let payload: serde_json::Value = response.json().await?;
        decode_oracle_payload(&payload)
    }

    /// Poll with the configured fixed interval and bounded attempt count.
    /// Exhausting the budget is the `Pending` outcome, never an error.
    pub async fn poll(&self, request_id: &str) -> Result<OracleOutcome, OracleError> {
        for attempt in 0..self.poll_attempts {
            match self.fetch(request_id).await {
                Ok(result) => return Ok(OracleOutcome::Ready(result)),
                Err(err) => {
                    debug!(request_id, attempt, error = %err, "oracle result not ready");
                }
            }
            if attempt + 1 < self.poll_attempts {
                sleep(self.poll_interval).await;
            }
        }
        Ok(OracleOutcome::Pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_flat_envelopes() {
        let decoded = decode_oracle_payload(&json!({
            "plaintexts": ["0x2a"],
            "signatures": ["0xabc"],
        }))
        .unwrap();
        assert_eq!(decoded.plaintexts, vec!["0x2a"]);
        assert_eq!(decoded.signatures, vec!["0xabc"]);
    }

    #[test]
    fn accepts_nested_result_envelopes() {
        let decoded = decode_oracle_payload(&json!({
            "result": { "plaintexts": ["0x2a"], "signatures": ["0xabc"] },
        }))
        .unwrap();
        assert_eq!(
            decoded,
            OracleDecryption {
                plaintexts: vec!["0x2a".into()],
                signatures: vec!["0xabc".into()],
            }
        );
    }

    #[test]
    fn rejects_missing_signatures() {
        assert!(matches!(
            decode_oracle_payload(&json!({ "plaintexts": ["0x2a"] })),
            Err(OracleError::BadFormat(_))
        ));
    }

    #[tokio::test]
    async fn exhausting_the_poll_budget_is_a_pending_outcome() {
        // Nothing listens on the discard port, so every attempt fails fast.
        let config = OracleConfig {
            poll_attempts: 3,
            poll_interval_ms: 1,
            ..OracleConfig::default()
        };
        let client = OracleClient::new("http://127.0.0.1:9", &config);

        assert!(matches!(
            client.fetch("42").await,
            Err(OracleError::Http(_))
        ));
        let outcome = client.poll("42").await.unwrap();
        assert_eq!(outcome, OracleOutcome::Pending);
    }

    #[test]
    fn rejects_empty_and_mismatched_arrays() {
        assert!(decode_oracle_payload(&json!({
            "plaintexts": [], "signatures": [],
        }))
        .is_err());
        assert!(decode_oracle_payload(&json!({
            "plaintexts": ["0x2a"], "signatures": [],
        }))
        .is_err());
    }
}
