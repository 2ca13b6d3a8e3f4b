//! ip-checker - public IP and geolocation lookup
//!
//! This is the composition root that wires together all the components.

use anyhow::Context;
use ip_checker::adapters::inbound::{render_history, render_report, ResolveEvent, ResolveTrigger};
use ip_checker::adapters::outbound::{JsonFileHistoryStore, ReqwestFetcher, TcpConnectivityProbe};
use ip_checker::config::load_config;
use ip_checker::domain::entities::HistoryEntry;
use ip_checker::domain::ports::HistoryStore;
use ip_checker::{LookupService, SourceChainResolver};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::fmt::format::FmtSpan;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration from environment
    let cfg = load_config()?;

    // Setup logging
    let log_level = if cfg.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stderr)
        .init();

    let history = JsonFileHistoryStore::new(&cfg.history_path);

    if std::env::args().nth(1).as_deref() == Some("history") {
        println!("{}", render_history(&history.load()?));
        return Ok(());
    }

    tracing::info!(
        "starting ip-checker address_providers={} geo_providers={}",
        cfg.address_providers.len(),
        cfg.geo_providers.len()
    );

    // ===== COMPOSITION ROOT =====

    // 1. Outbound adapters
    let fetcher = Arc::new(ReqwestFetcher::new(cfg.request_timeout(), &cfg.user_agent)?);

    let probe_addr: SocketAddr = cfg
        .probe_addr
        .parse()
        .with_context(|| format!("invalid probe address '{}'", cfg.probe_addr))?;
    let probe = Arc::new(TcpConnectivityProbe::new(
        probe_addr,
        cfg.probe_hostname.clone(),
        cfg.probe_timeout(),
    ));

    // 2. Application service
    let resolver = SourceChainResolver::new(fetcher, cfg.resolver_settings());
    let service = Arc::new(LookupService::new(probe, resolver));

    // 3. Inbound adapter
    let (trigger, mut events) = ResolveTrigger::new(service);
    let handle = trigger.resolve_now()?;

    let mut cancel_requested = false;
    let outcome = loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(ResolveEvent::Progress(percent)) => tracing::debug!("progress {}%", percent),
                Some(ResolveEvent::Resolved(record)) => break Ok(record),
                Some(ResolveEvent::Failed(reason)) => break Err(reason),
                None => break Err("resolution task ended without a result".to_string()),
            },
            _ = tokio::signal::ctrl_c(), if !cancel_requested => {
                tracing::info!("interrupt received, cancelling");
                cancel_requested = true;
                trigger.cancel();
            }
        }
    };

    handle.await?;

    let record = match outcome {
        Ok(record) => record,
        Err(reason) => anyhow::bail!("lookup failed: {}", reason),
    };

    print!("{}", render_report(&record));

    let entry = HistoryEntry::from_record(&record, &chrono::Local::now());
    if let Err(e) = history.append(entry) {
        tracing::warn!("failed to save history: {:#}", e);
    }

    Ok(())
}
