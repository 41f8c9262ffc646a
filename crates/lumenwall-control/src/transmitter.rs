//! Art-Net transmit loop
//!
//! Every tick the whole store is snapshotted, patched and sent, whether or
//! not an UPDATE arrived since the last tick. Re-sending the last known state
//! at a steady rate is what keeps a single lost datagram from leaving a
//! fixture on a wrong colour.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use lumenwall_core::{DmxStateStore, MonitorConfig, PatchTable, RouterConfig};

use crate::dmx::monitor::preview;
use crate::dmx::ArtNetSender;

/// Counters kept by the transmit loop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransmitterStats {
    pub ticks: u64,
    pub packets_sent: u64,
    pub send_errors: u64,
}

/// Fixed-rate Art-Net transmitter
#[derive(Debug)]
pub struct Transmitter {
    store: Arc<DmxStateStore>,
    patch: PatchTable,
    /// One sender per controller ip, created on first use
    senders: HashMap<String, ArtNetSender>,
    artnet_port: u16,
    period: Duration,
    monitor: MonitorConfig,
    stats: TransmitterStats,
}

impl Transmitter {
    /// Create a transmitter for `store`
    pub fn new(store: Arc<DmxStateStore>, patch: PatchTable, config: &RouterConfig) -> Self {
        Self {
            store,
            patch,
            senders: HashMap::new(),
            artnet_port: config.artnet_port,
            period: config.period(),
            monitor: config.monitor.clone().normalized(),
            stats: TransmitterStats::default(),
        }
    }

    pub fn stats(&self) -> TransmitterStats {
        self.stats
    }

    /// Tick period
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Send every target once.
    ///
    /// Returns the DMX monitor lines produced by this tick (empty unless the
    /// monitor is enabled and the tick is a sampling tick).
    pub fn tick(&mut self) -> Vec<String> {
        self.stats.ticks += 1;
        let sample = self.monitor.enabled && self.stats.ticks % self.monitor.every == 0;
        let mut lines = Vec::new();

        for (target, dmx) in self.store.snapshot_all() {
            let out = self.patch.apply(target, &dmx);

            if !self.senders.contains_key(&target.ip) {
                match ArtNetSender::with_port(&target.ip, self.artnet_port) {
                    Ok(sender) => {
                        self.senders.insert(target.ip.clone(), sender);
                    }
                    Err(e) => {
                        self.stats.send_errors += 1;
                        tracing::warn!("No Art-Net sender for {}: {}", target, e);
                        continue;
                    }
                }
            }

            if let Some(sender) = self.senders.get_mut(&target.ip) {
                match sender.send_dmx(target.universe, &out[..]) {
                    Ok(()) => self.stats.packets_sent += 1,
                    Err(e) => {
                        self.stats.send_errors += 1;
                        tracing::warn!("Art-Net send to {} failed: {}", target, e);
                    }
                }
            }

            if sample {
                let n = self.monitor.channels;
                lines.push(format!(
                    "u{:03}@{} ch1..{}: {}",
                    target.universe,
                    target.ip,
                    n,
                    preview(&out[..], n)
                ));
            }
        }

        if !lines.is_empty() {
            tracing::info!("DMX monitor:");
            for line in &lines {
                tracing::info!("   {}", line);
            }
        }

        lines
    }

    /// Tick at the configured rate until `shutdown` is raised.
    ///
    /// A slow tick shortens the following sleep to zero; missed ticks are not
    /// made up.
    pub fn run(&mut self, shutdown: &AtomicBool) {
        tracing::info!(
            "Transmitting {} universes @ {:.1} fps",
            self.store.targets().len(),
            1.0 / self.period.as_secs_f64()
        );

        while !shutdown.load(Ordering::Relaxed) {
            let t0 = Instant::now();
            self.tick();
            if let Some(rest) = self.period.checked_sub(t0.elapsed()) {
                thread::sleep(rest);
            }
        }

        tracing::info!(
            "Transmitter stopped: {} ticks, {} packets, {} errors",
            self.stats.ticks,
            self.stats.packets_sent,
            self.stats.send_errors
        );
    }
}
