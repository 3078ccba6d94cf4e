use async_trait::async_trait;
use hive_core::{HiveError, PendingAction, ORACLE_BACKOFF_CAP_SECS, ORACLE_DEFAULT_TIMEOUT_SECS};
use serde::{Deserialize, Serialize};

/// The external decision endpoint's structured reply (spec §4.9 Oracle mode).
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum OracleVerdict {
    Approve,
    Reject,
    Defer,
    Modify(serde_json::Value),
}

/// Oracle-mode decision contract. One call per pending action; the concrete
/// transport (HTTP, in this corpus's style, via `reqwest`) is left to the
/// implementer wiring a real endpoint.
#[async_trait]
pub trait OracleClient: Send + Sync {
    async fn decide(&self, action: &PendingAction) -> Result<OracleVerdict, HiveError>;
}

/// Hand-rolled exponential back-off for oracle retries (spec §5: "on
/// timeout... retried with exponential back-off capped at 5 min"). No
/// external retry crate — a small stateful doubling counter, matching this
/// corpus's existing difficulty-adjuster style.
#[derive(Clone, Copy, Debug)]
pub struct OracleBackoff {
    current_secs: u64,
}

impl OracleBackoff {
    pub fn new() -> Self {
        Self {
            current_secs: ORACLE_DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Seconds to wait before the next retry, doubling each call and capped
    /// at `ORACLE_BACKOFF_CAP_SECS`.
    pub fn next_delay_secs(&mut self) -> u64 {
        let delay = self.current_secs;
        self.current_secs = (self.current_secs * 2).min(ORACLE_BACKOFF_CAP_SECS);
        delay
    }

    pub fn reset(&mut self) {
        self.current_secs = ORACLE_DEFAULT_TIMEOUT_SECS;
    }
}

impl Default for OracleBackoff {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
struct OracleRequest<'a> {
    action_id: &'a str,
    action_type: &'a str,
    payload: &'a serde_json::Value,
    proposed_ts: i64,
    expires_ts: i64,
}

#[derive(Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
enum OracleResponse {
    Approve,
    Reject,
    Defer,
    Modify { payload: serde_json::Value },
}

/// HTTP-backed `OracleClient`. POSTs the pending action as JSON to
/// `endpoint` and expects back `{"verdict": "approve" | "reject" | "defer"}`
/// or `{"verdict": "modify", "payload": {...}}`.
pub struct HttpOracleClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpOracleClient {
    pub fn new(endpoint: String, timeout_secs: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("reqwest client builds with a plain timeout");
        Self { client, endpoint }
    }
}

#[async_trait]
impl OracleClient for HttpOracleClient {
    async fn decide(&self, action: &PendingAction) -> Result<OracleVerdict, HiveError> {
        let action_type = format!("{:?}", action.action_type);
        let body = OracleRequest {
            action_id: &action.action_id,
            action_type: &action_type,
            payload: &action.payload,
            proposed_ts: action.proposed_ts,
            expires_ts: action.expires_ts,
        };
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| HiveError::HostUnavailable(format!("oracle request failed: {e}")))?;
        let resp = resp
            .error_for_status()
            .map_err(|e| HiveError::HostUnavailable(format!("oracle returned error status: {e}")))?;
        let parsed: OracleResponse = resp
            .json()
            .await
            .map_err(|e| HiveError::HostUnavailable(format!("oracle response malformed: {e}")))?;
        Ok(match parsed {
            OracleResponse::Approve => OracleVerdict::Approve,
            OracleResponse::Reject => OracleVerdict::Reject,
            OracleResponse::Defer => OracleVerdict::Defer,
            OracleResponse::Modify { payload } => OracleVerdict::Modify(payload),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_until_cap() {
        let mut backoff = OracleBackoff::new();
        assert_eq!(backoff.next_delay_secs(), 30);
        assert_eq!(backoff.next_delay_secs(), 60);
        assert_eq!(backoff.next_delay_secs(), 120);
        assert_eq!(backoff.next_delay_secs(), 240);
        assert_eq!(backoff.next_delay_secs(), 300);
        assert_eq!(backoff.next_delay_secs(), 300);
    }

    #[test]
    fn reset_returns_to_default_timeout() {
        let mut backoff = OracleBackoff::new();
        backoff.next_delay_secs();
        backoff.reset();
        assert_eq!(backoff.next_delay_secs(), 30);
    }
}
