// Copyright 2026 The EasyTable Project
// SPDX-License-Identifier: Apache-2.0

// easytable-auth: send encrypted requests to the quota service.
//
// Usage:
//   easytable-auth --config easytable.yaml usage
//   easytable-auth --config easytable.yaml use --max-quota 50
//   easytable-auth --config easytable.yaml revoke --token abc --ttl 3600
//   easytable-auth --config easytable.yaml reset-quota --max-quota 100

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde_json::json;

use easytable::auth::{build_request, derive_key, AesGcmCipher, AuthClient, RequestKind};
use easytable::config::{self, FileSource};

#[derive(Parser)]
#[command(
    name = "easytable-auth",
    about = "Send encrypted revoke and quota requests to the EasyTable auth service."
)]
struct Cli {
    /// Path to the easytable.yaml config file (auth section required).
    #[arg(long, default_value = "easytable.yaml", env = "EASYTABLE_CONFIG")]
    config: String,

    /// Token to operate on. Defaults to auth.token from the config.
    #[arg(long, global = true)]
    token: Option<String>,

    /// Trace id attached to the request.
    #[arg(long, global = true)]
    trace_id: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Revoke a token.
    Revoke {
        /// Revocation lifetime in seconds.
        #[arg(long, conflicts_with = "expires_at")]
        ttl: Option<u64>,
        /// Absolute revocation expiry (unix seconds).
        #[arg(long)]
        expires_at: Option<i64>,
    },
    /// Check whether a token is revoked.
    CheckRevoke,
    /// Consume one unit of quota.
    Use {
        /// Quota granted when the record is first created. Defaults to auth.max_quota.
        #[arg(long)]
        max_quota: Option<u64>,
        #[arg(long, conflicts_with = "expires_at")]
        ttl: Option<u64>,
        #[arg(long)]
        expires_at: Option<i64>,
    },
    /// Report usage without consuming quota.
    Usage,
    /// Reset the remaining quota.
    ResetQuota {
        #[arg(long)]
        max_quota: Option<u64>,
    },
}

impl Command {
    fn kind(&self) -> RequestKind {
        match self {
            Command::Revoke { .. } => RequestKind::Revoke,
            Command::CheckRevoke => RequestKind::CheckRevoke,
            Command::Use { .. } => RequestKind::Use,
            Command::Usage => RequestKind::Usage,
            Command::ResetQuota { .. } => RequestKind::ResetQuota,
        }
    }

    /// Parameter object for `build_request`. Unset options are omitted.
    fn params(&self, token: &str, default_max_quota: u64) -> serde_json::Value {
        let mut params = json!({ "token": token });
        let mut set = |key: &str, value: serde_json::Value| {
            params[key] = value;
        };
        match self {
            Command::Revoke { ttl, expires_at } => {
                if let Some(ttl) = ttl {
                    set("ttl", json!(ttl));
                }
                if let Some(at) = expires_at {
                    set("expiresAt", json!(at));
                }
            }
            Command::Use {
                max_quota,
                ttl,
                expires_at,
            } => {
                set("maxQuota", json!(max_quota.unwrap_or(default_max_quota)));
                if let Some(ttl) = ttl {
                    set("ttl", json!(ttl));
                }
                if let Some(at) = expires_at {
                    set("expiresAt", json!(at));
                }
            }
            Command::ResetQuota { max_quota } => {
                if let Some(max) = max_quota {
                    set("maxQuota", json!(max));
                }
            }
            Command::CheckRevoke | Command::Usage => {}
        }
        params
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    let source = FileSource::new(&cli.config);
    let config = match config::load_config(&source) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("failed to load config: {e}");
            std::process::exit(1);
        }
    };
    let Some(auth) = config.auth else {
        tracing::error!("config {} has no auth section", cli.config);
        std::process::exit(1);
    };

    let token = cli.token.unwrap_or_else(|| auth.token.clone());
    let kind = cli.command.kind();
    let params = cli.command.params(&token, auth.max_quota);

    let request = match build_request(kind.as_str(), params, cli.trace_id) {
        Ok(r) => r,
        Err(e) => {
            tracing::error!("invalid {kind} request: {e}");
            std::process::exit(2);
        }
    };

    let cipher = Arc::new(AesGcmCipher::new(&derive_key(&auth.encryption_key)));
    let mut client = AuthClient::new(reqwest::Client::new(), auth.url.clone(), cipher);
    if let Some(ms) = auth.timeout_ms {
        client = client.with_timeout(Duration::from_millis(ms));
    }

    match client.send(&request).await {
        Ok(response) => match serde_json::to_string_pretty(&response) {
            Ok(text) => println!("{text}"),
            Err(e) => {
                tracing::error!("failed to render response: {e}");
                std::process::exit(1);
            }
        },
        Err(e) => {
            tracing::error!(url = %client.url(), "{kind} request failed: {e}");
            std::process::exit(1);
        }
    }
}
