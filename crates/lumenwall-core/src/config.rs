//! Router runtime configuration
//!
//! Loaded from a TOML file by `lumenwall-io` and overridden by CLI flags.
//! Every field has a default so a missing file still yields a runnable
//! configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::dmx::{ChannelOrder, DMX_CHANNELS};
use crate::logging::LogConfig;

/// Standard Art-Net UDP port
pub const ARTNET_PORT: u16 = 6454;

/// Default eHuB listen port
pub const EHUB_PORT: u16 = 50000;

/// Lowest accepted transmit rate
const MIN_FPS: f64 = 1e-3;

/// Highest accepted transmit rate
const MAX_FPS: f64 = 1000.0;

/// NaN falls to the minimum, +inf to the maximum
fn clamp_fps(fps: f64) -> f64 {
    if fps.is_nan() {
        MIN_FPS
    } else {
        fps.clamp(MIN_FPS, MAX_FPS)
    }
}

/// Settings of the router process
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RouterConfig {
    /// Installation mapping sheet (CSV, JSON or RON)
    pub mapping: PathBuf,
    /// Optional patch CSV
    pub patch: Option<PathBuf>,
    /// Address the eHuB socket binds to
    pub listen_ip: String,
    /// Port the eHuB socket binds to
    pub listen_port: u16,
    /// Art-Net frames per second, per target
    pub fps: f64,
    /// Colour byte order of the fixtures
    pub order: ChannelOrder,
    /// Destination port of Art-Net packets
    pub artnet_port: u16,
    /// Transmit-side DMX preview
    pub monitor: MonitorConfig,
    /// Logging setup
    pub logging: LogConfig,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            mapping: PathBuf::from("mapping.csv"),
            patch: None,
            listen_ip: "0.0.0.0".to_string(),
            listen_port: EHUB_PORT,
            fps: 40.0,
            order: ChannelOrder::Rgb,
            artnet_port: ARTNET_PORT,
            monitor: MonitorConfig::default(),
            logging: LogConfig::default(),
        }
    }
}

impl RouterConfig {
    /// Clamp values into their working ranges
    pub fn normalized(mut self) -> Self {
        self.fps = clamp_fps(self.fps);
        self.monitor = self.monitor.normalized();
        self
    }

    /// Transmit tick period
    pub fn period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / clamp_fps(self.fps))
    }

    /// `ip:port` of the eHuB socket
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.listen_ip, self.listen_port)
    }
}

/// DMX preview printed by the transmit loop
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MonitorConfig {
    /// Print previews at all
    pub enabled: bool,
    /// Print every N ticks
    pub every: u64,
    /// Number of leading channels shown per universe
    pub channels: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            every: 20,
            channels: 12,
        }
    }
}

impl MonitorConfig {
    /// Clamp `every` to at least 1 and `channels` to 1..=512
    pub fn normalized(mut self) -> Self {
        self.every = self.every.max(1);
        self.channels = self.channels.clamp(1, DMX_CHANNELS);
        self
    }
}
