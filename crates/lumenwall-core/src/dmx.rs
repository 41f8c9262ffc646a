//! DMX512 primitives shared by the router
//!
//! A [`Target`] names one physical universe on one Art-Net node, and every
//! target owns exactly one [`DmxBuffer`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of channels in one DMX512 universe
pub const DMX_CHANNELS: usize = 512;

/// One full DMX universe worth of channel values
pub type DmxBuffer = [u8; DMX_CHANNELS];

/// An Art-Net destination: controller ip and universe (port-address)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Target {
    /// Controller address, without port
    pub ip: String,
    /// Art-Net port-address (Net << 8 | SubUni)
    pub universe: u16,
}

impl Target {
    /// Create a new target
    pub fn new(ip: impl Into<String>, universe: u16) -> Self {
        Self {
            ip: ip.into(),
            universe,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/u{}", self.ip, self.universe)
    }
}

/// Byte order in which a pixel's colour is written to its three channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChannelOrder {
    /// r, g, b
    #[default]
    #[serde(rename = "RGB", alias = "rgb")]
    Rgb,
    /// g, r, b (WS2811-style strips)
    #[serde(rename = "GRB", alias = "grb")]
    Grb,
}

impl ChannelOrder {
    /// Arrange a colour into the three channel bytes
    #[inline]
    pub fn arrange(self, r: u8, g: u8, b: u8) -> [u8; 3] {
        match self {
            ChannelOrder::Rgb => [r, g, b],
            ChannelOrder::Grb => [g, r, b],
        }
    }
}

impl fmt::Display for ChannelOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelOrder::Rgb => f.write_str("RGB"),
            ChannelOrder::Grb => f.write_str("GRB"),
        }
    }
}

impl FromStr for ChannelOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "RGB" => Ok(ChannelOrder::Rgb),
            "GRB" => Ok(ChannelOrder::Grb),
            other => Err(format!("unknown channel order '{}' (expected RGB or GRB)", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_order_arrange() {
        assert_eq!(ChannelOrder::Rgb.arrange(10, 20, 30), [10, 20, 30]);
        assert_eq!(ChannelOrder::Grb.arrange(10, 20, 30), [20, 10, 30]);
    }

    #[test]
    fn test_channel_order_parse() {
        assert_eq!("rgb".parse::<ChannelOrder>(), Ok(ChannelOrder::Rgb));
        assert_eq!(" GRB ".parse::<ChannelOrder>(), Ok(ChannelOrder::Grb));
        assert!("BGR".parse::<ChannelOrder>().is_err());
    }

    #[test]
    fn test_target_display() {
        assert_eq!(Target::new("10.0.0.1", 3).to_string(), "10.0.0.1/u3");
    }
}
