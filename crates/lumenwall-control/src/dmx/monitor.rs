//! Art-Net OpDmx decoding for diagnostics
//!
//! The router never parses Art-Net; this side exists to sniff what actually
//! goes out on the wire (ours or another console's).

use std::net::{SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use lumenwall_core::DMX_CHANNELS;

use super::artnet::{ARTNET_ID, HEADER_LEN, OP_DMX};
use crate::{error::ControlError, Result};

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// A decoded OpDmx packet borrowing its channel data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArtDmx<'a> {
    /// Port-address, `Net << 8 | SubUni`
    pub universe: u16,
    pub sequence: u8,
    pub protocol_version: u16,
    /// The `length` channel bytes announced by the header
    pub data: &'a [u8],
}

impl<'a> ArtDmx<'a> {
    /// Parse an OpDmx packet.
    ///
    /// Returns `None` for anything that is not a complete OpDmx packet.
    pub fn parse(packet: &'a [u8]) -> Option<Self> {
        if packet.len() < HEADER_LEN || &packet[0..8] != ARTNET_ID {
            return None;
        }
        if u16::from_le_bytes([packet[8], packet[9]]) != OP_DMX {
            return None;
        }

        let length = u16::from_be_bytes([packet[16], packet[17]]) as usize;
        if length > DMX_CHANNELS || packet.len() < HEADER_LEN + length {
            return None;
        }

        Some(Self {
            universe: ((packet[15] as u16) << 8) | packet[14] as u16,
            sequence: packet[12],
            protocol_version: u16::from_be_bytes([packet[10], packet[11]]),
            data: &packet[HEADER_LEN..HEADER_LEN + length],
        })
    }

    /// Channel count announced by the header
    pub fn length(&self) -> usize {
        self.data.len()
    }
}

/// Space-separated, right-aligned values of the first `channels` bytes
pub fn preview(data: &[u8], channels: usize) -> String {
    data.iter()
        .take(channels)
        .map(|v| format!("{:3}", v))
        .collect::<Vec<_>>()
        .join(" ")
}

/// One monitor line: `u<universe> from <ip> len=<n> ch1..<k>: v1 v2 ...`
pub fn format_line(packet: &ArtDmx<'_>, source: &SocketAddr, channels: usize) -> String {
    let shown = channels.clamp(1, packet.length().max(1));
    format!(
        "u{:03} from {} len={} ch1..{}: {}",
        packet.universe,
        source.ip(),
        packet.length(),
        shown,
        preview(packet.data, shown)
    )
}

/// Listens for Art-Net traffic and renders every OpDmx packet as a line
#[derive(Debug)]
pub struct ArtNetMonitor {
    socket: UdpSocket,
    channels: usize,
    only_universe: Option<u16>,
}

impl ArtNetMonitor {
    /// Bind the monitor socket
    pub fn bind(addr: &str, channels: usize, only_universe: Option<u16>) -> Result<Self> {
        let socket = UdpSocket::bind(addr).map_err(|source| ControlError::Bind {
            addr: addr.to_string(),
            source,
        })?;
        socket.set_read_timeout(Some(POLL_INTERVAL))?;

        tracing::info!("Art-Net monitor listening on {}", socket.local_addr()?);

        Ok(Self {
            socket,
            channels: channels.clamp(1, DMX_CHANNELS),
            only_universe,
        })
    }

    /// Local address of the monitor socket
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Render a datagram, if it is an OpDmx packet passing the universe filter
    pub fn render(&self, datagram: &[u8], source: &SocketAddr) -> Option<String> {
        let packet = ArtDmx::parse(datagram)?;
        if self.only_universe.is_some_and(|u| u != packet.universe) {
            return None;
        }
        Some(format_line(&packet, source, self.channels))
    }

    /// Receive until `shutdown` is raised, passing each rendered line to `on_line`
    pub fn run(&self, shutdown: &AtomicBool, mut on_line: impl FnMut(String)) -> Result<()> {
        let mut buf = vec![0u8; 65535];

        while !shutdown.load(Ordering::Relaxed) {
            match self.socket.recv_from(&mut buf) {
                Ok((len, source)) => {
                    if let Some(line) = self.render(&buf[..len], &source) {
                        on_line(line);
                    }
                }
                Err(e) if is_transient(&e) => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Ok(())
    }
}

/// Errors a UDP receive loop should shrug off
pub(crate) fn is_transient(e: &std::io::Error) -> bool {
    use std::io::ErrorKind;
    matches!(
        e.kind(),
        ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted | ErrorKind::ConnectionReset
    )
}
