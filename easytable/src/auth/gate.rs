// Copyright 2026 The EasyTable Project
// SPDX-License-Identifier: Apache-2.0

// Quota gate: one consume call per extraction, fail closed.

use async_trait::async_trait;

use super::client::AuthClient;
use super::request::AuthRequest;

/// Outcome of a quota check.
#[derive(Debug, Clone, PartialEq)]
pub enum QuotaDecision {
    Allowed { remaining: f64 },
    Denied(DenyReason),
}

/// Why a quota check did not allow the request. All of these deny.
#[derive(Debug, Clone, PartialEq)]
pub enum DenyReason {
    /// The service reported a quota of zero or less.
    Exhausted,
    /// The response carried no numeric `quota.quota`.
    MissingQuota,
    /// The service could not be asked (network, status, bad body).
    Unavailable(String),
}

impl QuotaDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, QuotaDecision::Allowed { .. })
    }
}

/// Decide from a quota service response of shape `{quota: {quota: n}}`.
pub fn quota_from_response(response: &serde_json::Value) -> QuotaDecision {
    let quota = response
        .get("quota")
        .and_then(|q| q.get("quota"))
        .and_then(|n| n.as_f64());
    match quota {
        Some(n) if n > 0.0 => QuotaDecision::Allowed { remaining: n },
        Some(_) => QuotaDecision::Denied(DenyReason::Exhausted),
        None => QuotaDecision::Denied(DenyReason::MissingQuota),
    }
}

/// Access check performed once before an extraction stream is started.
#[async_trait]
pub trait QuotaGate: Send + Sync {
    async fn check(&self, trace_id: &str) -> QuotaDecision;
}

/// Quota gate backed by the remote quota service.
pub struct RemoteQuotaGate {
    client: AuthClient,
    token: String,
    max_quota: u64,
}

impl RemoteQuotaGate {
    pub fn new(client: AuthClient, token: impl Into<String>, max_quota: u64) -> Self {
        Self {
            client,
            token: token.into(),
            max_quota,
        }
    }
}

#[async_trait]
impl QuotaGate for RemoteQuotaGate {
    async fn check(&self, trace_id: &str) -> QuotaDecision {
        let request = AuthRequest::consume(self.token.clone(), self.max_quota, None).with_trace_id(trace_id);

        let decision = match self.client.send(&request).await {
            Ok(response) => quota_from_response(&response),
            Err(e) => {
                tracing::warn!(%trace_id, error = %e, "quota service unavailable, denying");
                return QuotaDecision::Denied(DenyReason::Unavailable(e.to_string()));
            }
        };

        match &decision {
            QuotaDecision::Allowed { remaining } => {
                tracing::debug!(%trace_id, remaining, "quota check passed");
            }
            QuotaDecision::Denied(DenyReason::Exhausted) => {
                tracing::info!(%trace_id, "quota exhausted");
            }
            QuotaDecision::Denied(reason) => {
                tracing::warn!(%trace_id, ?reason, "quota response unusable, denying");
            }
        }
        decision
    }
}
