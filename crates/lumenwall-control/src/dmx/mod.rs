//! DMX output system
//!
//! This module provides DMX512 output via Art-Net, plus an OpDmx decoder for
//! watching the wire.
//!
//! ## Art-Net
//!
//! Art-Net is a UDP protocol for DMX transmission over Ethernet.
//! - Unicast to each controller on port 6454
//! - 15-bit port-address split into Net (high byte) and SubUni (low byte)
//! - One sequence counter per controller
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use lumenwall_control::dmx::ArtNetSender;
//!
//! # fn main() -> lumenwall_control::Result<()> {
//! let mut sender = ArtNetSender::new("192.168.1.45")?;
//!
//! // Solid red on the first fixture of universe 200
//! let mut dmx = [0u8; 512];
//! dmx[0] = 255;
//! sender.send_dmx(200, &dmx)?;
//! # Ok(())
//! # }
//! ```

pub mod artnet;
pub mod monitor;

pub use artnet::ArtNetSender;
pub use monitor::{ArtDmx, ArtNetMonitor};
