//! eHuB receive loop
//!
//! Owns the inbound UDP socket. Every datagram is decoded and, if it is an
//! UPDATE, written into the [`DmxStateStore`]. Malformed traffic is logged
//! and dropped; the loop only stops on shutdown or a fatal socket error.

use std::net::{SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use lumenwall_core::{ehub, ChannelOrder, DmxStateStore, Frame};

use crate::dmx::monitor::is_transient;
use crate::{error::ControlError, Result};

/// Largest UDP payload
const RECV_BUFFER_LEN: usize = 65535;

/// How often a blocked receive wakes up to check for shutdown
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Where the receiver is in its cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiverState {
    /// Waiting for a datagram
    Listening,
    /// Decoding and applying a datagram
    Processing,
}

/// Counters kept by the receive loop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReceiverStats {
    pub datagrams: u64,
    pub updates: u64,
    pub entities_written: u64,
    pub configs: u64,
    pub protocol_errors: u64,
}

/// The eHuB receiver
#[derive(Debug)]
pub struct Receiver {
    socket: UdpSocket,
    store: Arc<DmxStateStore>,
    order: ChannelOrder,
    state: ReceiverState,
    stats: ReceiverStats,
}

impl Receiver {
    /// Bind the eHuB socket. Failure here is fatal for the router.
    pub fn bind(addr: &str, store: Arc<DmxStateStore>, order: ChannelOrder) -> Result<Self> {
        let socket = UdpSocket::bind(addr).map_err(|source| ControlError::Bind {
            addr: addr.to_string(),
            source,
        })?;
        socket.set_read_timeout(Some(POLL_INTERVAL))?;

        tracing::info!("eHuB listening on {}", socket.local_addr()?);

        Ok(Self {
            socket,
            store,
            order,
            state: ReceiverState::Listening,
            stats: ReceiverStats::default(),
        })
    }

    /// Address the socket is bound to
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    pub fn state(&self) -> ReceiverState {
        self.state
    }

    pub fn stats(&self) -> ReceiverStats {
        self.stats
    }

    /// Decode one datagram and act on it
    pub fn handle_datagram(&mut self, data: &[u8], source: SocketAddr) {
        self.state = ReceiverState::Processing;
        self.stats.datagrams += 1;

        match ehub::decode(data) {
            Err(e) => {
                self.stats.protocol_errors += 1;
                tracing::debug!("Dropped datagram from {} ({} bytes): {}", source, data.len(), e);
            }
            Ok(Frame::Config { universe, ranges }) => {
                // mapping is fixed at startup, CONFIG is informational
                self.stats.configs += 1;
                tracing::info!("CONFIG u={} ranges={} from {}", universe, ranges.len(), source);
            }
            Ok(Frame::Update { entities, .. }) => {
                self.stats.updates += 1;
                let written = self.store.apply(&entities, self.order);
                self.stats.entities_written += written as u64;
                tracing::trace!("UPDATE n={} written={}", entities.len(), written);
            }
        }

        self.state = ReceiverState::Listening;
    }

    /// Receive until `shutdown` is raised or the socket fails
    pub fn run(&mut self, shutdown: &AtomicBool) -> Result<()> {
        let mut buf = vec![0u8; RECV_BUFFER_LEN];

        while !shutdown.load(Ordering::Relaxed) {
            match self.socket.recv_from(&mut buf) {
                Ok((len, source)) => self.handle_datagram(&buf[..len], source),
                Err(e) if is_transient(&e) => continue,
                Err(e) => {
                    tracing::error!("eHuB socket failed: {}", e);
                    return Err(e.into());
                }
            }
        }

        tracing::info!(
            "Receiver stopped: {} datagrams, {} updates, {} configs, {} rejected",
            self.stats.datagrams,
            self.stats.updates,
            self.stats.configs,
            self.stats.protocol_errors
        );
        Ok(())
    }
}
