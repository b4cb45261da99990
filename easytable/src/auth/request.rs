// Copyright 2026 The EasyTable Project
// SPDX-License-Identifier: Apache-2.0

// Quota service request schema.
//
// On the wire a request is `{"traceId"?, "<kind>": {...}}` with exactly one
// payload key. The payload is an enum, so a request can never carry more
// than one.

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::error::AuthError;

/// A request to the quota service.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    #[serde(flatten)]
    pub payload: AuthPayload,
}

/// The single populated payload of an [`AuthRequest`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AuthPayload {
    Revoke(RevokeRequest),
    CheckRevoke(CheckRevokeRequest),
    Quota(QuotaRequest),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RevokeRequest {
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CheckRevokeRequest {
    pub token: String,
}

/// Quota operation. With neither flag set the service consumes one unit
/// and fails when the remaining quota is not positive.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaRequest {
    pub token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_quota: Option<u64>,
    /// Report usage without consuming quota.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dry_run: Option<bool>,
    /// Reset the counter to `max_quota`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset: Option<bool>,
}

/// Expiry of a revocation or quota record. Either a relative TTL in
/// seconds or an absolute unix timestamp, never both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    Ttl(u64),
    ExpiresAt(i64),
}

impl Expiry {
    fn from_fields(kind: RequestKind, ttl: Option<u64>, expires_at: Option<i64>) -> Result<Option<Self>, AuthError> {
        match (ttl, expires_at) {
            (Some(_), Some(_)) => Err(AuthError::InvalidParams {
                kind: kind.as_str(),
                reason: "ttl and expiresAt are mutually exclusive".into(),
            }),
            (Some(ttl), None) => Ok(Some(Expiry::Ttl(ttl))),
            (None, Some(at)) => Ok(Some(Expiry::ExpiresAt(at))),
            (None, None) => Ok(None),
        }
    }

    fn into_fields(expiry: Option<Self>) -> (Option<u64>, Option<i64>) {
        match expiry {
            Some(Expiry::Ttl(ttl)) => (Some(ttl), None),
            Some(Expiry::ExpiresAt(at)) => (None, Some(at)),
            None => (None, None),
        }
    }
}

impl AuthRequest {
    fn new(payload: AuthPayload) -> Self {
        Self {
            trace_id: None,
            payload,
        }
    }

    /// Revoke `token`, optionally only until `expiry`.
    pub fn revoke(token: impl Into<String>, expiry: Option<Expiry>) -> Self {
        let (ttl, expires_at) = Expiry::into_fields(expiry);
        Self::new(AuthPayload::Revoke(RevokeRequest {
            token: token.into(),
            ttl,
            expires_at,
        }))
    }

    pub fn check_revoke(token: impl Into<String>) -> Self {
        Self::new(AuthPayload::CheckRevoke(CheckRevokeRequest {
            token: token.into(),
        }))
    }

    /// Consume one unit of quota for `token`.
    pub fn consume(token: impl Into<String>, max_quota: u64, expiry: Option<Expiry>) -> Self {
        let (ttl, expires_at) = Expiry::into_fields(expiry);
        Self::new(AuthPayload::Quota(QuotaRequest {
            token: token.into(),
            ttl,
            expires_at,
            max_quota: Some(max_quota),
            ..QuotaRequest::default()
        }))
    }

    /// Report usage for `token` without consuming quota.
    pub fn usage(token: impl Into<String>) -> Self {
        Self::new(AuthPayload::Quota(QuotaRequest {
            token: token.into(),
            dry_run: Some(true),
            ..QuotaRequest::default()
        }))
    }

    /// Reset the counter for `token` back to `max_quota`.
    pub fn reset_quota(token: impl Into<String>, max_quota: Option<u64>) -> Self {
        Self::new(AuthPayload::Quota(QuotaRequest {
            token: token.into(),
            max_quota,
            reset: Some(true),
            ..QuotaRequest::default()
        }))
    }

    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }
}

// ---------------------------------------------------------------------------
// Kind dispatch
// ---------------------------------------------------------------------------

/// Request kind tags accepted by [`build_request`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Revoke,
    CheckRevoke,
    Use,
    Usage,
    ResetQuota,
}

impl RequestKind {
    pub const ALL: [RequestKind; 5] = [
        RequestKind::Revoke,
        RequestKind::CheckRevoke,
        RequestKind::Use,
        RequestKind::Usage,
        RequestKind::ResetQuota,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestKind::Revoke => "revoke",
            RequestKind::CheckRevoke => "checkRevoke",
            RequestKind::Use => "use",
            RequestKind::Usage => "usage",
            RequestKind::ResetQuota => "resetQuota",
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestKind {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RequestKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| AuthError::InvalidKind(s.to_string()))
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct UseParams {
    token: String,
    #[serde(default)]
    ttl: Option<u64>,
    #[serde(default)]
    expires_at: Option<i64>,
    max_quota: u64,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct UsageParams {
    token: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct ResetQuotaParams {
    token: String,
    #[serde(default)]
    max_quota: Option<u64>,
}

/// Build a request from a kind tag and a JSON params object.
///
/// `usage` and `resetQuota` are quota requests with `dryRun` and `reset`
/// set respectively. Params must match the shape of the kind: unknown
/// fields, missing required fields, an empty token, or both `ttl` and
/// `expiresAt` fail with `InvalidParams`.
pub fn build_request(
    kind: &str,
    params: serde_json::Value,
    trace_id: Option<String>,
) -> Result<AuthRequest, AuthError> {
    let kind: RequestKind = kind.parse()?;

    let request = match kind {
        RequestKind::Revoke => {
            let p: RevokeRequest = parse_params(kind, params)?;
            check_token(kind, &p.token)?;
            let expiry = Expiry::from_fields(kind, p.ttl, p.expires_at)?;
            AuthRequest::revoke(p.token, expiry)
        }
        RequestKind::CheckRevoke => {
            let p: CheckRevokeRequest = parse_params(kind, params)?;
            check_token(kind, &p.token)?;
            AuthRequest::check_revoke(p.token)
        }
        RequestKind::Use => {
            let p: UseParams = parse_params(kind, params)?;
            check_token(kind, &p.token)?;
            let expiry = Expiry::from_fields(kind, p.ttl, p.expires_at)?;
            AuthRequest::consume(p.token, p.max_quota, expiry)
        }
        RequestKind::Usage => {
            let p: UsageParams = parse_params(kind, params)?;
            check_token(kind, &p.token)?;
            AuthRequest::usage(p.token)
        }
        RequestKind::ResetQuota => {
            let p: ResetQuotaParams = parse_params(kind, params)?;
            check_token(kind, &p.token)?;
            AuthRequest::reset_quota(p.token, p.max_quota)
        }
    };

    Ok(AuthRequest {
        trace_id,
        ..request
    })
}

fn parse_params<T: DeserializeOwned>(kind: RequestKind, params: serde_json::Value) -> Result<T, AuthError> {
    serde_json::from_value(params).map_err(|e| AuthError::InvalidParams {
        kind: kind.as_str(),
        reason: e.to_string(),
    })
}

fn check_token(kind: RequestKind, token: &str) -> Result<(), AuthError> {
    if token.is_empty() {
        return Err(AuthError::InvalidParams {
            kind: kind.as_str(),
            reason: "token must not be empty".into(),
        });
    }
    Ok(())
}
