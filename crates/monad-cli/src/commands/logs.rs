//! Function log tailing.

use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use monad_config::config::cloudwatch::log_group_name;
use monad_core::ProviderResult;
use monad_core::provider::LogsApi;
use monad_core::provider::logs::LogEvent;
use std::time::Duration;
use tracing::debug;

use super::{Context, shutdown_signal};

const POLL_INTERVAL: Duration = Duration::from_secs(2);

pub fn format_event(event: &LogEvent) -> String {
    let timestamp = DateTime::<Utc>::from_timestamp_millis(event.timestamp)
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_else(|| event.timestamp.to_string());
    format!("{} {}", timestamp, event.message.trim_end())
}

/// Every event in `group` at or after `start`, across all pages.
pub async fn fetch(logs: &dyn LogsApi, group: &str, start: i64) -> ProviderResult<Vec<LogEvent>> {
    let mut events = Vec::new();
    let mut token = None;
    loop {
        let page = logs.filter_log_events(group, start, token).await?;
        events.extend(page.events);
        match page.next_token {
            Some(next) => token = Some(next),
            None => return Ok(events),
        }
    }
}

/// Print events from `start`; with `follow`, keep polling until cancelled.
pub async fn tail(
    logs: &dyn LogsApi,
    group: &str,
    mut start: i64,
    follow: bool,
    out: &mut dyn FnMut(String),
) -> ProviderResult<()> {
    loop {
        let events = fetch(logs, group, start).await?;
        for event in &events {
            out(format_event(event));
        }
        if let Some(last) = events.iter().map(|e| e.timestamp).max() {
            start = last + 1;
        }
        if !follow {
            return Ok(());
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

pub async fn logs(ctx: &Context, follow: bool, since: i64) -> Result<()> {
    let basis = ctx.basis().await?;
    let group = log_group_name(basis.path());
    let start = Utc::now().timestamp_millis() - since * 60_000;
    debug!(group = %group, start, follow, "Tailing logs");

    let mut print = |line: String| println!("{}", line);
    tokio::select! {
        r = tail(ctx.clients.logs.as_ref(), &group, start, follow, &mut print) => r?,
        signal = shutdown_signal() => {
            let signal = signal?;
            debug!(signal, "Stopped tailing");
        }
    }
    Ok(())
}
