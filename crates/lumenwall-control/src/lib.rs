//! LumenWall Control - Network Side of the Router
//!
//! This crate puts the pieces of `lumenwall-core` on the wire:
//! - **Receiver**: eHuB UDP socket feeding the DMX state store
//! - **Transmitter**: fixed-rate Art-Net output of every universe
//! - **Router**: both loops on their own threads with a shared shutdown flag
//! - **DMX**: Art-Net OpDmx sender and a decoding monitor
//! - **Inspector**: eHuB frame decoder for checking generators
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lumenwall_control::Router;
//! use lumenwall_core::{BandDescriptor, EntityLookupTable, PatchTable, RouterConfig};
//!
//! # fn main() -> lumenwall_control::Result<()> {
//! let bands = vec![BandDescriptor::new("192.168.1.10", 0, Some(1), (0..259).collect())];
//! let lookup = EntityLookupTable::build(&bands);
//!
//! let handle = Router::start(&RouterConfig::default(), lookup, PatchTable::new())?;
//! // ... later
//! handle.shutdown();
//! handle.join()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`dmx`] - Art-Net output and monitor
//! - [`inspector`] - eHuB traffic inspector
//! - [`receiver`] - eHuB receive loop
//! - [`transmitter`] - Art-Net transmit loop
//! - [`router`] - Thread wiring
//! - [`error`] - Error types

#![allow(missing_docs)]

/// Error types
pub mod error;

/// DMX output (Art-Net)
pub mod dmx;

/// eHuB traffic inspector
pub mod inspector;
/// eHuB receive loop
pub mod receiver;
/// Receiver + transmitter threads
pub mod router;
/// Art-Net transmit loop
pub mod transmitter;

// Re-exports
pub use dmx::{ArtDmx, ArtNetMonitor, ArtNetSender};
pub use error::{ControlError, Result};
pub use inspector::EhubInspector;
pub use receiver::{Receiver, ReceiverState, ReceiverStats};
pub use router::{Router, RouterHandle, RouterReport};
pub use transmitter::{Transmitter, TransmitterStats};
