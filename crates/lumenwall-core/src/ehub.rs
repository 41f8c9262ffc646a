//! eHuB frame codec
//!
//! eHuB is the UDP protocol spoken by the animation generators. Every datagram
//! carries one frame:
//!
//! ```text
//! "eHuB"(4) | type:u8 | universe:u8 | count:u16-LE | comp_len:u16-LE | gzip payload
//! ```
//!
//! The gzip payload is a flat array of fixed-width entries: 8 bytes per
//! CONFIG range (4 × u16-LE) and 6 bytes per UPDATE entity
//! (`id:u16-LE, r, g, b, w`).
//!
//! ## Example
//!
//! ```rust
//! use lumenwall_core::ehub::{decode, encode_update};
//! use lumenwall_core::{EntityUpdate, Frame};
//!
//! let entities = vec![EntityUpdate::new(100, 255, 0, 0, 0)];
//! let bytes = encode_update(0, &entities).unwrap();
//!
//! match decode(&bytes).unwrap() {
//!     Frame::Update { universe, entities: decoded } => {
//!         assert_eq!(universe, 0);
//!         assert_eq!(decoded, entities);
//!     }
//!     Frame::Config { .. } => unreachable!(),
//! }
//! ```

use flate2::bufread::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

use crate::error::{ProtocolError, Result};

/// Frame magic
pub const MAGIC: &[u8; 4] = b"eHuB";

/// Size of the fixed header preceding the compressed payload
pub const HEADER_LEN: usize = 10;

/// Encoded size of one CONFIG range
pub const CONFIG_ENTRY_LEN: usize = 8;

/// Encoded size of one UPDATE entity
pub const UPDATE_ENTRY_LEN: usize = 6;

/// Largest inflated payload a well-formed header can describe.
const MAX_PAYLOAD_LEN: usize = u16::MAX as usize * CONFIG_ENTRY_LEN;

/// The type byte of an eHuB header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FrameType {
    /// Range declaration (informational for the router)
    Config = 1,
    /// Per-entity colour update
    Update = 2,
}

impl FrameType {
    /// Parse a header type byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            1 => Some(FrameType::Config),
            2 => Some(FrameType::Update),
            _ => None,
        }
    }

    /// Width in bytes of one payload entry of this type
    pub fn entry_len(self) -> usize {
        match self {
            FrameType::Config => CONFIG_ENTRY_LEN,
            FrameType::Update => UPDATE_ENTRY_LEN,
        }
    }
}

/// One CONFIG entry: a run of sequential indices mapped onto entity ids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigRange {
    /// First sequential index of the run
    pub start_index: u16,
    /// Entity id at `start_index`
    pub start_entity: u16,
    /// Last sequential index of the run
    pub end_index: u16,
    /// Entity id at `end_index`
    pub end_entity: u16,
}

impl ConfigRange {
    /// Create a new range
    pub fn new(start_index: u16, start_entity: u16, end_index: u16, end_entity: u16) -> Self {
        Self {
            start_index,
            start_entity,
            end_index,
            end_entity,
        }
    }
}

/// One UPDATE entry: the colour of a single entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityUpdate {
    /// Entity (pixel) id
    pub id: u16,
    /// Red
    pub r: u8,
    /// Green
    pub g: u8,
    /// Blue
    pub b: u8,
    /// White channel. Carried on the wire, unused by RGB fixtures.
    pub w: u8,
}

impl EntityUpdate {
    /// Create a new entity update
    pub fn new(id: u16, r: u8, g: u8, b: u8, w: u8) -> Self {
        Self { id, r, g, b, w }
    }
}

/// A decoded eHuB frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// CONFIG frame
    #[allow(missing_docs)]
    Config {
        universe: u8,
        ranges: Vec<ConfigRange>,
    },
    /// UPDATE frame
    #[allow(missing_docs)]
    Update {
        universe: u8,
        entities: Vec<EntityUpdate>,
    },
}

impl Frame {
    /// Universe byte from the frame header
    pub fn universe(&self) -> u8 {
        match self {
            Frame::Config { universe, .. } | Frame::Update { universe, .. } => *universe,
        }
    }

    /// Header type of this frame
    pub fn frame_type(&self) -> FrameType {
        match self {
            Frame::Config { .. } => FrameType::Config,
            Frame::Update { .. } => FrameType::Update,
        }
    }

    /// Number of entries carried by the frame
    pub fn len(&self) -> usize {
        match self {
            Frame::Config { ranges, .. } => ranges.len(),
            Frame::Update { entities, .. } => entities.len(),
        }
    }

    /// Whether the frame carries no entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Encode this frame into a datagram
    pub fn encode(&self) -> Result<Vec<u8>> {
        match self {
            Frame::Config { universe, ranges } => encode_config(*universe, ranges),
            Frame::Update { universe, entities } => encode_update(*universe, entities),
        }
    }
}

/// Encode a CONFIG frame
pub fn encode_config(universe: u8, ranges: &[ConfigRange]) -> Result<Vec<u8>> {
    let mut payload = Vec::with_capacity(ranges.len() * CONFIG_ENTRY_LEN);
    for range in ranges {
        payload.extend_from_slice(&range.start_index.to_le_bytes());
        payload.extend_from_slice(&range.start_entity.to_le_bytes());
        payload.extend_from_slice(&range.end_index.to_le_bytes());
        payload.extend_from_slice(&range.end_entity.to_le_bytes());
    }
    encode_frame(FrameType::Config, universe, ranges.len(), &payload)
}

/// Encode an UPDATE frame
pub fn encode_update(universe: u8, entities: &[EntityUpdate]) -> Result<Vec<u8>> {
    let mut payload = Vec::with_capacity(entities.len() * UPDATE_ENTRY_LEN);
    for entity in entities {
        payload.extend_from_slice(&entity.id.to_le_bytes());
        payload.extend_from_slice(&[entity.r, entity.g, entity.b, entity.w]);
    }
    encode_frame(FrameType::Update, universe, entities.len(), &payload)
}

fn encode_frame(
    frame_type: FrameType,
    universe: u8,
    count: usize,
    payload: &[u8],
) -> Result<Vec<u8>> {
    let count = u16::try_from(count).map_err(|_| {
        ProtocolError::PayloadTooLarge(format!("{} entries (max {})", count, u16::MAX))
    })?;

    let compressed = deflate(Vec::new(), payload)?;

    let comp_len = u16::try_from(compressed.len()).map_err(|_| {
        ProtocolError::PayloadTooLarge(format!(
            "{} compressed bytes (max {})",
            compressed.len(),
            u16::MAX
        ))
    })?;

    let mut packet = Vec::with_capacity(HEADER_LEN + compressed.len());
    packet.extend_from_slice(MAGIC);
    packet.push(frame_type as u8);
    packet.push(universe);
    packet.extend_from_slice(&count.to_le_bytes());
    packet.extend_from_slice(&comp_len.to_le_bytes());
    packet.extend_from_slice(&compressed);
    Ok(packet)
}

/// Decode one eHuB datagram.
///
/// The header's entry count is not trusted; entries are rebuilt from the
/// inflated payload and a trailing partial entry is dropped.
pub fn decode(data: &[u8]) -> Result<Frame> {
    if data.len() < HEADER_LEN {
        return Err(ProtocolError::TooShort { len: data.len() });
    }
    if &data[0..4] != MAGIC {
        return Err(ProtocolError::BadMagic);
    }

    let type_byte = data[4];
    let universe = data[5];
    // data[6..8] is the entry count, informational only
    let comp_len = u16::from_le_bytes([data[8], data[9]]) as usize;

    let available = data.len() - HEADER_LEN;
    if available < comp_len {
        return Err(ProtocolError::TruncatedPayload {
            expected: comp_len,
            available,
        });
    }

    let payload = inflate(&data[HEADER_LEN..HEADER_LEN + comp_len])?;

    let frame_type =
        FrameType::from_byte(type_byte).ok_or(ProtocolError::UnsupportedFrameType(type_byte))?;

    let frame = match frame_type {
        FrameType::Config => Frame::Config {
            universe,
            ranges: payload
                .chunks_exact(frame_type.entry_len())
                .map(|c| ConfigRange {
                    start_index: u16::from_le_bytes([c[0], c[1]]),
                    start_entity: u16::from_le_bytes([c[2], c[3]]),
                    end_index: u16::from_le_bytes([c[4], c[5]]),
                    end_entity: u16::from_le_bytes([c[6], c[7]]),
                })
                .collect(),
        },
        FrameType::Update => Frame::Update {
            universe,
            entities: payload
                .chunks_exact(frame_type.entry_len())
                .map(|c| EntityUpdate {
                    id: u16::from_le_bytes([c[0], c[1]]),
                    r: c[2],
                    g: c[3],
                    b: c[4],
                    w: c[5],
                })
                .collect(),
        },
    };

    Ok(frame)
}

/// Gzip `payload` into `writer` and hand the writer back
fn deflate<W: Write>(writer: W, payload: &[u8]) -> Result<W> {
    let mut encoder = GzEncoder::new(writer, Compression::default());
    encoder
        .write_all(payload)
        .map_err(|e| ProtocolError::CompressionFailed(e.to_string()))?;
    encoder
        .finish()
        .map_err(|e| ProtocolError::CompressionFailed(e.to_string()))
}

/// Inflate concatenated gzip members.
///
/// An empty slice is an empty payload. Zero bytes after a complete member are
/// padding and end the stream.
fn inflate(compressed: &[u8]) -> Result<Vec<u8>> {
    let mut payload = Vec::new();
    let mut rest = compressed;

    while !rest.is_empty() {
        let budget = (MAX_PAYLOAD_LEN + 1 - payload.len()) as u64;
        let mut member = GzDecoder::new(rest);
        (&mut member)
            .take(budget)
            .read_to_end(&mut payload)
            .map_err(|e| ProtocolError::DecompressionFailed(e.to_string()))?;

        if payload.len() > MAX_PAYLOAD_LEN {
            return Err(ProtocolError::DecompressionFailed(format!(
                "inflated payload exceeds {} bytes",
                MAX_PAYLOAD_LEN
            )));
        }

        rest = member.into_inner();
        let padding = rest.iter().take_while(|&&b| b == 0).count();
        rest = &rest[padding..];
    }
    Ok(payload)
}
