//! camstreamd — streams camera frames to a fixed UDP receiver.

use std::time::Duration;

use anyhow::{Context, Result};

use camstream_core::config::StreamerConfig;

use camstreamd::link::{self, LinkFlag};
use camstreamd::session::{StreamExit, Streamer, StreamerSettings};
use camstreamd::source;
use camstreamd::stats::StreamStats;
use camstreamd::transport::UdpTransport;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load config
    if let Err(e) = StreamerConfig::write_default_if_missing() {
        tracing::warn!(error = %e, "failed to write default config");
    }
    // a missing file already means defaults; anything else is a broken file
    let config = StreamerConfig::load().context("failed to load config")?;
    config.validate().context("invalid configuration")?;
    let destination = config.destination()?;

    tracing::info!(
        %destination,
        chunk_size = %config.stream.chunk_size,
        camera = ?config.camera.source,
        "camstreamd starting"
    );

    // ── Shutdown channel ─────────────────────────────────────────────────────
    let (shutdown_tx, _) = tokio::sync::broadcast::channel::<()>(1);

    {
        let shutdown = shutdown_tx.clone();
        tokio::spawn(async move {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("shutdown signal received");
            let _ = shutdown.send(());
        });
    }

    // ── Link ─────────────────────────────────────────────────────────────────
    let link_flag = if config.link.interface.is_empty() {
        tracing::info!("no link interface configured, treating link as always up");
        LinkFlag::new(true)
    } else {
        let flag = LinkFlag::new(false);
        tokio::spawn(link::monitor_loop(
            flag.clone(),
            config.link.interface.clone(),
            config.link.poll_interval(),
            shutdown_tx.subscribe(),
        ));
        flag
    };

    // ── Camera ───────────────────────────────────────────────────────────────
    let camera = source::from_config(&config.camera).context("failed to open camera source")?;

    // ── Stats ────────────────────────────────────────────────────────────────
    let stats = StreamStats::new();
    if config.stream.stats_interval_secs > 0 {
        let stats = stats.clone();
        let period = Duration::from_secs(config.stream.stats_interval_secs);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.tick().await;
            loop {
                interval.tick().await;
                stats.print_stats();
            }
        });
    }

    // ── Streamer ─────────────────────────────────────────────────────────────
    let streamer = Streamer::new(
        UdpTransport::new(config.stream.send_buffer_bytes),
        link_flag,
        camera,
        destination,
        StreamerSettings::from_config(&config),
        stats.clone(),
        shutdown_tx.subscribe(),
    );
    let mut streamer_task = tokio::spawn(streamer.run());

    // ── Wait for exit ────────────────────────────────────────────────────────
    let mut shutdown_rx = shutdown_tx.subscribe();

    let finished = tokio::select! {
        r = &mut streamer_task => Some(r),
        _ = shutdown_rx.recv() => None,
    };
    let exit = match finished {
        Some(r) => r,
        None => {
            tracing::info!("shutting down");
            streamer_task.await
        }
    }
    .context("streamer task panicked")?;

    stats.print_stats();

    match exit {
        StreamExit::Shutdown => {
            tracing::info!("camstreamd stopped");
            Ok(())
        }
        StreamExit::TransportUnavailable(e) => {
            Err(e).context("streamer stopped: unable to create socket")
        }
    }
}
