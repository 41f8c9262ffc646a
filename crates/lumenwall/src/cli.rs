//! Command line interface

use clap::{Args, Parser, Subcommand};
use lumenwall_core::{ChannelOrder, RouterConfig};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "lumenwall", version, about = "eHuB to Art-Net router for LED walls")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Route eHuB updates to the Art-Net controllers until Ctrl-C
    Route(RouteArgs),
    /// Print Art-Net OpDmx packets seen on a port
    Monitor(MonitorArgs),
    /// Decode and print eHuB frames seen on a port
    Listen(ListenArgs),
    /// Send a solid colour to one universe (channels 1-3)
    Solid(SolidArgs),
}

#[derive(Debug, Args)]
pub struct RouteArgs {
    /// Router config file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Installation mapping sheet (CSV, JSON or RON)
    #[arg(long)]
    pub mapping: Option<PathBuf>,
    /// Patch sheet (CSV)
    #[arg(long)]
    pub patch: Option<PathBuf>,
    /// Art-Net frames per second
    #[arg(long)]
    pub fps: Option<f64>,
    /// Colour byte order of the fixtures (RGB or GRB)
    #[arg(long)]
    pub order: Option<ChannelOrder>,
    /// Address the eHuB socket binds to
    #[arg(long)]
    pub listen_ip: Option<String>,
    /// Port the eHuB socket binds to
    #[arg(long)]
    pub listen_port: Option<u16>,
    /// Print a DMX preview of outgoing universes
    #[arg(long)]
    pub dmx_monitor: bool,
    /// Preview every N transmit ticks
    #[arg(long)]
    pub monitor_every: Option<u64>,
    /// Channels shown per preview line
    #[arg(long)]
    pub monitor_channels: Option<usize>,
}

impl RouteArgs {
    /// Layer the flags over values from the config file
    pub fn apply(&self, mut config: RouterConfig) -> RouterConfig {
        if let Some(mapping) = &self.mapping {
            config.mapping = mapping.clone();
        }
        if let Some(patch) = &self.patch {
            config.patch = Some(patch.clone());
        }
        if let Some(fps) = self.fps {
            config.fps = fps;
        }
        if let Some(order) = self.order {
            config.order = order;
        }
        if let Some(ip) = &self.listen_ip {
            config.listen_ip = ip.clone();
        }
        if let Some(port) = self.listen_port {
            config.listen_port = port;
        }
        if self.dmx_monitor {
            config.monitor.enabled = true;
        }
        if let Some(every) = self.monitor_every {
            config.monitor.every = every;
        }
        if let Some(channels) = self.monitor_channels {
            config.monitor.channels = channels;
        }
        config.normalized()
    }
}

#[derive(Debug, Args)]
pub struct MonitorArgs {
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,
    #[arg(long, default_value_t = lumenwall_core::config::ARTNET_PORT)]
    pub port: u16,
    /// Channels shown per line
    #[arg(long, default_value_t = 16)]
    pub channels: usize,
    /// Only show this universe
    #[arg(long)]
    pub universe: Option<u16>,
}

#[derive(Debug, Args)]
pub struct ListenArgs {
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,
    #[arg(long, default_value_t = lumenwall_core::config::EHUB_PORT)]
    pub port: u16,
}

#[derive(Debug, Args)]
pub struct SolidArgs {
    /// Controller address
    #[arg(long)]
    pub ip: String,
    #[arg(long, default_value_t = 200)]
    pub universe: u16,
    /// Colour as R,G,B
    #[arg(long, default_value = "0,255,0", value_parser = parse_color)]
    pub color: [u8; 3],
    /// How long to keep sending
    #[arg(long, default_value_t = 3.0)]
    pub seconds: f64,
    #[arg(long, default_value_t = 10.0)]
    pub fps: f64,
}

fn parse_color(s: &str) -> Result<[u8; 3], String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    let [r, g, b] = parts.as_slice() else {
        return Err(format!("expected R,G,B, got '{}'", s));
    };
    let channel = |v: &str| {
        v.parse::<u8>()
            .map_err(|_| format!("'{}' is not a value in 0..=255", v))
    };
    Ok([channel(r)?, channel(g)?, channel(b)?])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(args: &[&str]) -> RouteArgs {
        let argv = ["lumenwall", "route"].iter().chain(args).copied();
        match Cli::try_parse_from(argv).unwrap().command {
            Command::Route(args) => args,
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_flags_override_config() {
        let args = route(&[
            "--mapping",
            "wall.csv",
            "--fps",
            "25",
            "--order",
            "GRB",
            "--dmx-monitor",
            "--monitor-channels",
            "9000",
        ]);
        let config = args.apply(RouterConfig::default());

        assert_eq!(config.mapping, PathBuf::from("wall.csv"));
        assert_eq!(config.fps, 25.0);
        assert_eq!(config.order, ChannelOrder::Grb);
        assert!(config.monitor.enabled);
        assert_eq!(config.monitor.channels, 512);
    }

    #[test]
    fn test_missing_flags_keep_config_values() {
        let file_config = RouterConfig {
            listen_port: 6000,
            patch: Some(PathBuf::from("patch.csv")),
            ..Default::default()
        };
        let config = route(&[]).apply(file_config);
        assert_eq!(config.listen_port, 6000);
        assert_eq!(config.patch, Some(PathBuf::from("patch.csv")));
        assert!(!config.monitor.enabled);
    }

    #[test]
    fn test_zero_fps_is_clamped() {
        let config = route(&["--fps", "0"]).apply(RouterConfig::default());
        assert!(config.fps > 0.0);
    }

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("255, 0,12"), Ok([255, 0, 12]));
        assert!(parse_color("255,0").is_err());
        assert!(parse_color("256,0,0").is_err());
    }

    #[test]
    fn test_solid_defaults() {
        let cli = Cli::try_parse_from(["lumenwall", "solid", "--ip", "192.168.1.45"]).unwrap();
        let Command::Solid(args) = cli.command else {
            panic!("expected solid");
        };
        assert_eq!(args.universe, 200);
        assert_eq!(args.color, [0, 255, 0]);
    }
}
