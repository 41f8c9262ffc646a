//! Art-Net protocol implementation (OpDmx)
//!
//! Art-Net is a UDP-based protocol for transmitting DMX512 over Ethernet.
//! One [`ArtNetSender`] exists per controller ip; it owns the socket and the
//! sequence counter shared by every universe of that controller.

use std::net::{IpAddr, SocketAddr, UdpSocket};

use lumenwall_core::config::ARTNET_PORT;
use lumenwall_core::DMX_CHANNELS;

use crate::{error::ControlError, Result};

/// Packet ID opening every Art-Net packet
pub const ARTNET_ID: &[u8; 8] = b"Art-Net\0";

/// OpDmx opcode (sent little-endian)
pub const OP_DMX: u16 = 0x5000;

/// Art-Net protocol revision (sent big-endian)
pub const PROTOCOL_VERSION: u16 = 14;

/// Size of the OpDmx header preceding the channel data
pub const HEADER_LEN: usize = 18;

/// Build an OpDmx header
pub fn build_header(universe: u16, length: u16, sequence: u8) -> [u8; HEADER_LEN] {
    let mut header = [0u8; HEADER_LEN];

    // Header: "Art-Net\0"
    header[0..8].copy_from_slice(ARTNET_ID);

    // OpCode: OpDmx (0x5000)
    header[8..10].copy_from_slice(&OP_DMX.to_le_bytes());

    // Protocol version (14)
    header[10..12].copy_from_slice(&PROTOCOL_VERSION.to_be_bytes());

    header[12] = sequence;

    // Physical
    header[13] = 0;

    // Port-Address: SubUni then Net
    header[14] = (universe & 0xFF) as u8;
    header[15] = ((universe >> 8) & 0xFF) as u8;

    // Length (big-endian)
    header[16..18].copy_from_slice(&length.to_be_bytes());

    header
}

/// Art-Net sender for one controller
#[derive(Debug)]
pub struct ArtNetSender {
    socket: UdpSocket,
    ip: String,
    destination: SocketAddr,
    sequence: u8,
}

impl ArtNetSender {
    /// Create a sender for `ip` on the standard Art-Net port
    pub fn new(ip: &str) -> Result<Self> {
        Self::with_port(ip, ARTNET_PORT)
    }

    /// Create a sender for `ip` on a custom port
    pub fn with_port(ip: &str, port: u16) -> Result<Self> {
        let addr: IpAddr = ip.trim().parse().map_err(|e| {
            ControlError::DmxError(format!("Invalid Art-Net target address '{}': {}", ip, e))
        })?;

        let socket = UdpSocket::bind("0.0.0.0:0")?;
        // controllers are sometimes addressed by subnet broadcast
        socket.set_broadcast(true)?;

        tracing::info!("Art-Net sender created -> {}:{}", addr, port);

        Ok(Self {
            socket,
            ip: ip.to_string(),
            destination: SocketAddr::new(addr, port),
            sequence: 0,
        })
    }

    /// Send one universe of DMX data.
    ///
    /// `dmx` must hold exactly 512 channels. The sequence counter advances
    /// once the packet has been handed to the socket, whether or not the send
    /// succeeded.
    pub fn send_dmx(&mut self, universe: u16, dmx: &[u8]) -> Result<()> {
        if dmx.len() != DMX_CHANNELS {
            return Err(ControlError::DmxError(format!(
                "DMX payload must be exactly {} bytes, got {}",
                DMX_CHANNELS,
                dmx.len()
            )));
        }

        let packet = self.build_packet(universe, dmx);
        let sent = self.socket.send_to(&packet, self.destination);
        self.sequence = self.sequence.wrapping_add(1);
        sent?;

        tracing::trace!(
            "Sent Art-Net DMX packet for universe {} to {}",
            universe,
            self.ip
        );

        Ok(())
    }

    /// Build an Art-Net DMX packet (OpDmx) with the current sequence
    fn build_packet(&self, universe: u16, dmx: &[u8]) -> Vec<u8> {
        let mut packet = Vec::with_capacity(HEADER_LEN + dmx.len());
        packet.extend_from_slice(&build_header(universe, dmx.len() as u16, self.sequence));
        packet.extend_from_slice(dmx);
        packet
    }

    /// Controller ip this sender talks to
    pub fn ip(&self) -> &str {
        &self.ip
    }

    /// Socket address packets are sent to
    pub fn destination(&self) -> SocketAddr {
        self.destination
    }

    /// Sequence number the next packet will carry
    pub fn sequence(&self) -> u8 {
        self.sequence
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn loopback() -> (UdpSocket, u16) {
        let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
        socket
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();
        let port = socket.local_addr().unwrap().port();
        (socket, port)
    }

    #[test]
    fn test_artnet_header_structure() {
        let header = build_header(0, 512, 0);

        // Check header
        assert_eq!(&header[0..8], b"Art-Net\0");

        // Check OpCode (little-endian)
        assert_eq!(header[8], 0x00);
        assert_eq!(header[9], 0x50);

        // Check protocol version (big-endian)
        assert_eq!(header[10], 0);
        assert_eq!(header[11], 14);

        // Check length (big-endian)
        assert_eq!(header[16], 0x02);
        assert_eq!(header[17], 0x00);
    }

    #[test]
    fn test_port_address_split() {
        let header = build_header(0x0102, 512, 7);
        assert_eq!(header[12], 7);
        assert_eq!(header[13], 0);
        assert_eq!(header[14], 0x02); // SubUni
        assert_eq!(header[15], 0x01); // Net
    }

    #[test]
    fn test_packet_is_header_plus_payload() {
        let sender = ArtNetSender::new("127.0.0.1").unwrap();
        let mut dmx = [0u8; 512];
        dmx[0] = 255;
        dmx[511] = 1;

        let packet = sender.build_packet(3, &dmx);
        assert_eq!(packet.len(), 18 + 512);
        assert_eq!(packet[14], 3);
        assert_eq!(packet[18], 255);
        assert_eq!(packet[18 + 511], 1);
    }

    #[test]
    fn test_invalid_target() {
        assert!(ArtNetSender::new("invalid:address").is_err());
        assert!(ArtNetSender::new("10.0.0.300").is_err());
    }

    #[test]
    fn test_payload_must_be_full_universe() {
        let mut sender = ArtNetSender::new("127.0.0.1").unwrap();
        let result = sender.send_dmx(0, &[0u8; 100]);
        assert!(matches!(result, Err(ControlError::DmxError(_))));
        assert_eq!(sender.sequence(), 0);
    }

    #[test]
    fn test_sequence_increment_and_wrap() {
        let (listener, port) = loopback();
        let mut sender = ArtNetSender::with_port("127.0.0.1", port).unwrap();
        sender.sequence = 254;

        let dmx = [0u8; 512];
        let mut buf = [0u8; 1024];
        let mut seen = Vec::new();
        for _ in 0..3 {
            sender.send_dmx(0, &dmx).unwrap();
            let (len, _) = listener.recv_from(&mut buf).unwrap();
            assert_eq!(len, 530);
            seen.push(buf[12]);
        }

        assert_eq!(seen, vec![254, 255, 0]);
        assert_eq!(sender.sequence(), 1);
    }

    #[test]
    fn test_sequence_shared_across_universes() {
        let (listener, port) = loopback();
        let mut sender = ArtNetSender::with_port("127.0.0.1", port).unwrap();

        let dmx = [9u8; 512];
        let mut buf = [0u8; 1024];
        for universe in [0u16, 1, 0] {
            sender.send_dmx(universe, &dmx).unwrap();
        }

        let mut received = Vec::new();
        for _ in 0..3 {
            listener.recv_from(&mut buf).unwrap();
            received.push((buf[14], buf[12]));
        }
        assert_eq!(received, vec![(0, 0), (1, 1), (0, 2)]);
    }
}
