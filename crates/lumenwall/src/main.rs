//! LumenWall - eHuB to Art-Net router for LED walls
//!
//! `lumenwall route` runs the router; `monitor`, `listen` and `solid` are
//! bring-up tools for checking each side of it in isolation.

#![warn(missing_docs)]

mod cli;
mod logging_setup;

use anyhow::{Context, Result};
use clap::Parser;
use lumenwall_control::{ArtNetMonitor, ArtNetSender, EhubInspector, Router};
use lumenwall_core::{DmxBuffer, EntityLookupTable, LogConfig, DMX_CHANNELS};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use cli::{Cli, Command, ListenArgs, MonitorArgs, RouteArgs, SolidArgs};

/// How often the main task checks whether the router stopped by itself
const WATCH_INTERVAL: Duration = Duration::from_millis(250);

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Route(args) => route(args).await,
        Command::Monitor(args) => monitor(args).await,
        Command::Listen(args) => listen(args).await,
        Command::Solid(args) => solid(args).await,
    }
}

async fn route(args: RouteArgs) -> Result<()> {
    let config = lumenwall_io::load_config(args.config.as_deref())
        .context("Failed to load router config")?;
    let config = args.apply(config);

    let _log_guard = logging_setup::init(&config.logging)?;

    info!("==========================================");
    info!("===      LumenWall Router Started      ===");
    info!("==========================================");

    let bands = lumenwall_io::load_mapping(&config.mapping)
        .with_context(|| format!("Failed to load mapping {}", config.mapping.display()))?;
    let lookup = EntityLookupTable::build(&bands);
    let patch = lumenwall_io::load_patch(config.patch.as_deref())
        .context("Failed to load patch sheet")?;

    info!(
        "eHuB {} -> Art-Net port {}, {} target(s) at {} fps, order {}",
        config.listen_addr(),
        config.artnet_port,
        lookup.targets().len(),
        config.fps,
        config.order
    );

    let handle = Router::start(&config, lookup, patch)?;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut watch = tokio::time::interval(WATCH_INTERVAL);
    loop {
        tokio::select! {
            res = &mut ctrl_c => {
                res.context("Failed to listen for Ctrl-C")?;
                info!("Ctrl-C received, shutting down");
                break;
            }
            _ = watch.tick() => {
                if handle.is_shutting_down() {
                    warn!("Router stopped unexpectedly");
                    break;
                }
            }
        }
    }

    handle.shutdown();
    let report = tokio::task::spawn_blocking(move || handle.join())
        .await
        .context("Router join task failed")??;

    info!(
        "Received {} datagrams ({} updates, {} configs, {} rejected), wrote {} entities",
        report.receiver.datagrams,
        report.receiver.updates,
        report.receiver.configs,
        report.receiver.protocol_errors,
        report.receiver.entities_written
    );
    info!(
        "Sent {} packets over {} ticks, {} send errors",
        report.transmitter.packets_sent, report.transmitter.ticks, report.transmitter.send_errors
    );
    Ok(())
}

async fn monitor(args: MonitorArgs) -> Result<()> {
    let _log_guard = logging_setup::init(&LogConfig::default())?;

    let monitor = ArtNetMonitor::bind(
        &format!("{}:{}", args.host, args.port),
        args.channels,
        args.universe,
    )?;
    run_until_ctrl_c(move |shutdown| monitor.run(&shutdown, |line| println!("{}", line))).await
}

async fn listen(args: ListenArgs) -> Result<()> {
    let _log_guard = logging_setup::init(&LogConfig::default())?;

    let inspector = EhubInspector::bind(&format!("{}:{}", args.host, args.port))?;
    run_until_ctrl_c(move |shutdown| inspector.run(&shutdown, |line| println!("{}", line))).await
}

async fn solid(args: SolidArgs) -> Result<()> {
    let _log_guard = logging_setup::init(&LogConfig::default())?;

    let period = Duration::try_from_secs_f64(1.0 / args.fps.max(0.1)).context("Invalid --fps")?;
    let duration = Duration::try_from_secs_f64(args.seconds.max(0.0)).context("Invalid --seconds")?;
    let frame = solid_frame(args.color);
    let mut sender = ArtNetSender::new(&args.ip)?;

    info!(
        "Sending {:?} to {} universe {} for {:?}",
        args.color,
        sender.destination(),
        args.universe,
        duration
    );

    let deadline = Instant::now() + duration;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut ticker = tokio::time::interval(period);
    let mut sent = 0u64;
    loop {
        tokio::select! {
            res = &mut ctrl_c => {
                res.context("Failed to listen for Ctrl-C")?;
                break;
            }
            _ = ticker.tick() => {
                if Instant::now() >= deadline {
                    break;
                }
                match sender.send_dmx(args.universe, &frame) {
                    Ok(()) => sent += 1,
                    Err(e) => warn!("Send to {} failed: {}", sender.destination(), e),
                }
            }
        }
    }

    info!("Sent {} frame(s)", sent);
    Ok(())
}

/// Universe with `color` on channels 1-3 and everything else dark
fn solid_frame(color: [u8; 3]) -> DmxBuffer {
    let mut frame = [0u8; DMX_CHANNELS];
    frame[..3].copy_from_slice(&color);
    frame
}

/// Run a blocking receive loop until it fails or Ctrl-C raises its shutdown flag
async fn run_until_ctrl_c<F>(work: F) -> Result<()>
where
    F: FnOnce(Arc<AtomicBool>) -> lumenwall_control::Result<()> + Send + 'static,
{
    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&shutdown);
    let mut task = tokio::task::spawn_blocking(move || work(flag));

    tokio::select! {
        res = &mut task => {
            res.context("Worker thread panicked")??;
            return Ok(());
        }
        res = tokio::signal::ctrl_c() => {
            res.context("Failed to listen for Ctrl-C")?;
        }
    }

    shutdown.store(true, Ordering::Relaxed);
    task.await.context("Worker thread panicked")??;
    Ok(())
}
