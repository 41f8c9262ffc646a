//! eHuB traffic inspector
//!
//! Decodes whatever a generator sends without touching any router state, to
//! check a sender before pointing it at the wall.

use std::fmt::Write as _;
use std::net::{SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use lumenwall_core::{ehub, Frame};

use crate::dmx::monitor::is_transient;
use crate::{error::ControlError, Result};

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Entities shown per UPDATE line
const PREVIEW_ENTITIES: usize = 5;

/// One line describing a datagram: the decoded frame or why it was rejected
pub fn describe(datagram: &[u8], source: &SocketAddr) -> String {
    match ehub::decode(datagram) {
        Err(e) => format!(
            "invalid frame from {} ({} bytes): {}",
            source,
            datagram.len(),
            e
        ),
        Ok(Frame::Config { universe, ranges }) => {
            let mut line = format!("CONFIG u={} ranges={} from {}", universe, ranges.len(), source);
            for range in &ranges {
                let _ = write!(
                    line,
                    " [{}..{} -> {}..{}]",
                    range.start_index, range.end_index, range.start_entity, range.end_entity
                );
            }
            line
        }
        Ok(Frame::Update { universe, entities }) => {
            let mut line = format!(
                "UPDATE u={} n={} from {}",
                universe,
                entities.len(),
                source
            );
            for e in entities.iter().take(PREVIEW_ENTITIES) {
                let _ = write!(line, " {}:({},{},{},{})", e.id, e.r, e.g, e.b, e.w);
            }
            if entities.len() > PREVIEW_ENTITIES {
                line.push_str(" ...");
            }
            line
        }
    }
}

/// Listens on an eHuB port and describes every datagram
pub struct EhubInspector {
    socket: UdpSocket,
}

impl EhubInspector {
    pub fn bind(addr: &str) -> Result<Self> {
        let socket = UdpSocket::bind(addr).map_err(|source| ControlError::Bind {
            addr: addr.to_string(),
            source,
        })?;
        socket.set_read_timeout(Some(POLL_INTERVAL))?;
        tracing::info!("eHuB inspector listening on {}", socket.local_addr()?);
        Ok(Self { socket })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Receive until `shutdown` is raised, passing each description to `on_line`
    pub fn run(&self, shutdown: &AtomicBool, mut on_line: impl FnMut(String)) -> Result<()> {
        let mut buf = vec![0u8; 65535];

        while !shutdown.load(Ordering::Relaxed) {
            match self.socket.recv_from(&mut buf) {
                Ok((len, source)) => on_line(describe(&buf[..len], &source)),
                Err(e) if is_transient(&e) => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumenwall_core::ehub::{encode_config, encode_update};
    use lumenwall_core::{ConfigRange, EntityUpdate};
    use std::sync::Arc;

    fn source() -> SocketAddr {
        "10.0.0.5:40000".parse().unwrap()
    }

    #[test]
    fn test_describe_config() {
        let frame = encode_config(3, &[ConfigRange::new(0, 100, 169, 269)]).unwrap();
        assert_eq!(
            describe(&frame, &source()),
            "CONFIG u=3 ranges=1 from 10.0.0.5:40000 [0..169 -> 100..269]"
        );
    }

    #[test]
    fn test_describe_update_shows_first_entities() {
        let entities: Vec<_> = (0..8).map(|id| EntityUpdate::new(id, 1, 2, 3, 4)).collect();
        let frame = encode_update(0, &entities).unwrap();
        let line = describe(&frame, &source());

        assert!(line.starts_with("UPDATE u=0 n=8 from 10.0.0.5:40000 0:(1,2,3,4)"));
        assert!(line.contains(" 4:(1,2,3,4)"));
        assert!(!line.contains(" 5:("));
        assert!(line.ends_with(" ..."));
    }

    #[test]
    fn test_describe_invalid() {
        let line = describe(b"eHuX-garbage", &source());
        assert!(line.starts_with("invalid frame from 10.0.0.5:40000 (12 bytes)"));
    }

    #[test]
    fn test_run_until_shutdown() {
        let inspector = EhubInspector::bind("127.0.0.1:0").unwrap();
        let addr = inspector.local_addr().unwrap();
        let shutdown = Arc::new(AtomicBool::new(false));

        let sender = UdpSocket::bind("127.0.0.1:0").unwrap();
        let frame = encode_update(1, &[EntityUpdate::new(9, 0, 0, 0, 0)]).unwrap();
        sender.send_to(&frame, addr).unwrap();

        let mut lines = Vec::new();
        let stop = Arc::clone(&shutdown);
        inspector
            .run(&shutdown, |line| {
                lines.push(line);
                stop.store(true, Ordering::Relaxed);
            })
            .unwrap();

        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("UPDATE u=1 n=1"));
    }
}
