//! DMX state store
//!
//! Holds the last known value of every channel of every target. The receive
//! loop writes into it, the transmit loop copies out of it. A single mutex
//! covers all buffers; both operations hold it for their whole duration.

use parking_lot::Mutex;

use crate::dmx::{ChannelOrder, DmxBuffer, Target, DMX_CHANNELS};
use crate::ehub::EntityUpdate;
use crate::lookup::EntityLookupTable;

/// Per-target DMX buffers addressed through an [`EntityLookupTable`]
#[derive(Debug)]
pub struct DmxStateStore {
    lookup: EntityLookupTable,
    buffers: Mutex<Vec<DmxBuffer>>,
}

impl DmxStateStore {
    /// Create a store with one zeroed buffer per target of `lookup`
    pub fn new(lookup: EntityLookupTable) -> Self {
        let buffers = vec![[0u8; DMX_CHANNELS]; lookup.targets().len()];
        Self {
            lookup,
            buffers: Mutex::new(buffers),
        }
    }

    /// The lookup table this store was built from
    pub fn lookup(&self) -> &EntityLookupTable {
        &self.lookup
    }

    /// Targets owned by the store, in snapshot order
    pub fn targets(&self) -> &[Target] {
        self.lookup.targets()
    }

    /// Write a batch of entity colours.
    ///
    /// Unmapped ids are skipped: generators paint a canvas larger than the
    /// wall. Returns the number of entities written.
    pub fn apply(&self, entities: &[EntityUpdate], order: ChannelOrder) -> usize {
        let mut buffers = self.buffers.lock();
        let mut written = 0;

        for entity in entities {
            let Some(entry) = self.lookup.get(entity.id) else {
                continue;
            };
            let offset = entry.offset as usize;
            let dmx = &mut buffers[entry.target.index()];
            dmx[offset..offset + 3].copy_from_slice(&order.arrange(entity.r, entity.g, entity.b));
            written += 1;
        }

        written
    }

    /// Copy every buffer out of the store.
    ///
    /// Only the memcpy happens under the lock; callers can take their time
    /// sending without stalling the receiver.
    pub fn snapshot_all(&self) -> Vec<(&Target, DmxBuffer)> {
        let buffers = self.buffers.lock().clone();
        self.lookup.targets().iter().zip(buffers).collect()
    }

    /// Copy of a single target's buffer
    pub fn buffer(&self, target: &Target) -> Option<DmxBuffer> {
        let id = self.lookup.target_id(target)?;
        Some(self.buffers.lock()[id.index()])
    }
}
