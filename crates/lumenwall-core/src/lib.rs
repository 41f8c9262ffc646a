//! LumenWall Core - Protocol and Routing Model
//!
//! This crate contains the pieces of the router that do not touch the network:
//! - eHuB frame codec (CONFIG / UPDATE)
//! - Entity lookup table (entity id -> DMX target + channel offset)
//! - DMX state store shared between the receive and transmit loops
//! - Patch rules applied right before transmission
//! - Runtime and logging configuration

#![warn(missing_docs)]

pub mod config;
pub mod dmx;
pub mod ehub;
pub mod error;
pub mod logging;
pub mod lookup;
pub mod patch;
pub mod store;

// --- Re-exports grouped by category ---

// Protocol
pub use ehub::{ConfigRange, EntityUpdate, Frame, FrameType};
pub use error::{ProtocolError, Result};

// DMX model
pub use dmx::{ChannelOrder, DmxBuffer, Target, DMX_CHANNELS};

// Routing
pub use lookup::{BandDescriptor, EntityLookupTable, LookupEntry, TargetId, PIXELS_PER_UNIVERSE};
pub use patch::PatchTable;
pub use store::DmxStateStore;

// Configuration & logging
pub use config::{MonitorConfig, RouterConfig};
pub use logging::LogConfig;
