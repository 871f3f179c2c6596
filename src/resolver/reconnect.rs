use std::time::Duration;

use anyhow::{Context, Result};
use futures_util::StreamExt;
use futures_util::future::BoxFuture;
use futures_util::stream::FuturesUnordered;

use super::*;

pub(super) struct Reached {
    pub url: String,
    pub mode: ConnectionMode,
    pub info: PublicSystemInfo,
}

/// Candidate addresses in race order, duplicates removed.
pub(super) fn candidate_addresses(server: &ServerInfo) -> Vec<(String, ConnectionMode)> {
    let mut out: Vec<(String, ConnectionMode)> = Vec::new();
    let mut push = |address: Option<&String>, mode: ConnectionMode| {
        if let Some(address) = address
            && !out.iter().any(|(a, _)| a == address)
        {
            out.push((address.clone(), mode));
        }
    };
    if !server.manual_address_only {
        push(server.local_address.as_ref(), ConnectionMode::Local);
    }
    push(server.manual_address.as_ref(), ConnectionMode::Manual);
    if !server.manual_address_only {
        push(server.remote_address.as_ref(), ConnectionMode::Remote);
    }
    out
}

impl ConnectionResolver {
    /// Race the server's addresses against `/System/Info/Public` with staggered
    /// starts. The first success wins and the remaining attempts are dropped.
    pub(super) async fn try_reconnect(&self, server: &ServerInfo) -> Result<Reached> {
        let candidates = candidate_addresses(server);
        if candidates.is_empty() {
            anyhow::bail!("server has no address");
        }
        tracing::debug!(
            addresses = %candidates.iter().map(|(a, _)| a.as_str()).collect::<Vec<_>>().join("|"),
            "try_reconnect"
        );

        let mut attempts: FuturesUnordered<BoxFuture<'static, Result<Reached>>> =
            FuturesUnordered::new();
        for (url, mode) in candidates {
            let probe = self.registry.new_client(&url, server.clone());
            attempts.push(Box::pin(async move {
                tokio::time::sleep(Duration::from_millis(mode.stagger_ms())).await;
                let info = probe
                    .public_system_info()
                    .await
                    .with_context(|| format!("reach {}", url))?;
                Ok(Reached {
                    url: probe.address(),
                    mode,
                    info,
                })
            }));
        }

        let mut last_err = None;
        while let Some(attempt) = attempts.next().await {
            match attempt {
                Ok(reached) => {
                    tracing::debug!(url = %reached.url, "reconnect succeeded");
                    return Ok(reached);
                }
                Err(err) => {
                    tracing::debug!("reconnect failed: {:#}", err);
                    last_err = Some(err);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| anyhow::anyhow!("no address reachable")))
    }
}
