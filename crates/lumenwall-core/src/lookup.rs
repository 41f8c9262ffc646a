//! Entity lookup table
//!
//! Resolves an eHuB entity id to the DMX universe and channel offset that
//! drives it. The table is built once at startup from the installation's band
//! list and is immutable afterwards.
//!
//! # Band layout
//!
//! A band is a strip of pixels wired to one controller, spanning a primary
//! universe `U` and, when it holds more than [`PIXELS_PER_UNIVERSE`] pixels,
//! the next universe `U+1`. Pixel `p` of the band lands on:
//!
//! - `p < 170`: universe `U`, offset `p * 3`
//! - `p >= 170`: universe `U+1`, offset `(p - 170) * 3`
//!
//! Pixels whose three channels would not fit in 512 bytes are dropped.

use std::collections::HashMap;

use crate::dmx::{Target, DMX_CHANNELS};

/// Pixels addressed in a universe before a band spills into the next one
pub const PIXELS_PER_UNIVERSE: usize = 170;

const CHANNELS_PER_PIXEL: usize = 3;

/// Number of addressable entity ids (the full u16 space)
const ENTITY_SPACE: usize = u16::MAX as usize + 1;

/// One physical band as delivered by the mapping loader
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BandDescriptor {
    /// Controller address
    pub ip: String,
    /// Universe holding the first 170 pixels
    pub primary_universe: u16,
    /// Universe holding the remaining pixels, normally `primary_universe + 1`
    pub secondary_universe: Option<u16>,
    /// Entity ids in wiring order: the primary range, then the secondary range
    pub entity_ids: Vec<u16>,
}

impl BandDescriptor {
    /// Create a band from its ranges
    pub fn new(
        ip: impl Into<String>,
        primary_universe: u16,
        secondary_universe: Option<u16>,
        entity_ids: Vec<u16>,
    ) -> Self {
        Self {
            ip: ip.into(),
            primary_universe,
            secondary_universe,
            entity_ids,
        }
    }

    /// Universe receiving pixels from position 170 on
    fn tail_universe(&self) -> Option<u16> {
        self.secondary_universe
            .or_else(|| self.primary_universe.checked_add(1))
    }
}

/// Dense index of a registered [`Target`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId(u32);

impl TargetId {
    /// Position of the target in [`EntityLookupTable::targets`]
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Where one entity's colour is written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookupEntry {
    /// Universe buffer holding the pixel
    pub target: TargetId,
    /// Index of the first (R) of the three channel bytes
    pub offset: u16,
}

/// Direct-addressed entity id → (target, offset) table
#[derive(Debug, Clone)]
pub struct EntityLookupTable {
    entries: Box<[Option<LookupEntry>]>,
    targets: Vec<Target>,
    target_ids: HashMap<Target, TargetId>,
    mapped: usize,
    dropped: usize,
}

impl Default for EntityLookupTable {
    fn default() -> Self {
        Self {
            entries: vec![None; ENTITY_SPACE].into_boxed_slice(),
            targets: Vec::new(),
            target_ids: HashMap::new(),
            mapped: 0,
            dropped: 0,
        }
    }
}

impl EntityLookupTable {
    /// Build the table from bands in mapping order.
    ///
    /// When an id appears in several bands the last one wins.
    pub fn build<'a, I>(bands: I) -> Self
    where
        I: IntoIterator<Item = &'a BandDescriptor>,
    {
        let mut table = Self::default();
        for band in bands {
            table.insert_band(band);
        }

        tracing::info!(
            "Entity lookup built: {} entities across {} DMX universes",
            table.mapped,
            table.targets.len()
        );
        if table.dropped > 0 {
            tracing::debug!(
                "{} entity ids dropped (channels beyond universe end)",
                table.dropped
            );
        }

        table
    }

    fn insert_band(&mut self, band: &BandDescriptor) {
        let (head, tail) = band
            .entity_ids
            .split_at(band.entity_ids.len().min(PIXELS_PER_UNIVERSE));

        let primary = self.register(Target::new(band.ip.clone(), band.primary_universe));
        self.insert_run(primary, head);

        if tail.is_empty() {
            return;
        }

        match band.tail_universe() {
            Some(universe) => {
                let secondary = self.register(Target::new(band.ip.clone(), universe));
                self.insert_run(secondary, tail);
            }
            None => self.dropped += tail.len(),
        }
    }

    fn insert_run(&mut self, target: TargetId, ids: &[u16]) {
        for (position, &id) in ids.iter().enumerate() {
            let offset = position * CHANNELS_PER_PIXEL;
            if offset + CHANNELS_PER_PIXEL > DMX_CHANNELS {
                self.dropped += 1;
                continue;
            }

            let slot = &mut self.entries[id as usize];
            if slot.is_none() {
                self.mapped += 1;
            }
            *slot = Some(LookupEntry {
                target,
                offset: offset as u16,
            });
        }
    }

    fn register(&mut self, target: Target) -> TargetId {
        if let Some(id) = self.target_ids.get(&target) {
            return *id;
        }
        let id = TargetId(self.targets.len() as u32);
        self.targets.push(target.clone());
        self.target_ids.insert(target, id);
        id
    }

    /// Look up an entity id
    #[inline]
    pub fn get(&self, entity_id: u16) -> Option<LookupEntry> {
        self.entries[entity_id as usize]
    }

    /// Look up an entity id and resolve its target
    pub fn resolve(&self, entity_id: u16) -> Option<(&Target, u16)> {
        self.get(entity_id)
            .map(|entry| (&self.targets[entry.target.index()], entry.offset))
    }

    /// All registered targets, indexed by [`TargetId::index`]
    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    /// Target for a registered id
    pub fn target(&self, id: TargetId) -> &Target {
        &self.targets[id.index()]
    }

    /// Id of a registered target
    pub fn target_id(&self, target: &Target) -> Option<TargetId> {
        self.target_ids.get(target).copied()
    }

    /// Number of distinct entity ids in the table
    pub fn len(&self) -> usize {
        self.mapped
    }

    /// Whether no entity is mapped
    pub fn is_empty(&self) -> bool {
        self.mapped == 0
    }

    /// Number of ids left out because their channels did not fit a universe
    pub fn dropped(&self) -> usize {
        self.dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn band(ip: &str, primary: u16, secondary: Option<u16>, ids: std::ops::Range<u16>) -> BandDescriptor {
        BandDescriptor::new(ip, primary, secondary, ids.collect())
    }

    #[test]
    fn test_band_split_at_170() {
        let table = EntityLookupTable::build(&[band("10.0.0.1", 0, None, 0..259)]);

        let u0 = Target::new("10.0.0.1", 0);
        let u1 = Target::new("10.0.0.1", 1);

        assert_eq!(table.resolve(0), Some((&u0, 0)));
        assert_eq!(table.resolve(169), Some((&u0, 507)));
        assert_eq!(table.resolve(170), Some((&u1, 0)));
        assert_eq!(table.resolve(258), Some((&u1, 264)));
        assert_eq!(table.resolve(259), None);

        assert_eq!(table.targets(), &[u0, u1]);
        assert_eq!(table.len(), 259);
        assert_eq!(table.dropped(), 0);
    }

    #[test]
    fn test_short_band_registers_only_primary() {
        let table = EntityLookupTable::build(&[band("10.0.0.2", 4, Some(5), 1000..1100)]);

        assert_eq!(table.targets(), &[Target::new("10.0.0.2", 4)]);
        assert_eq!(table.resolve(1099), Some((&Target::new("10.0.0.2", 4), 297)));
    }

    #[test]
    fn test_positions_that_overflow_are_dropped() {
        // 170 pixels in U, 170 in U+1, 10 that fit nowhere
        let table = EntityLookupTable::build(&[band("10.0.0.3", 2, Some(3), 0..350)]);

        assert_eq!(table.resolve(339), Some((&Target::new("10.0.0.3", 3), 507)));
        assert_eq!(table.get(340), None);
        assert_eq!(table.get(349), None);
        assert_eq!(table.dropped(), 10);
        assert_eq!(table.len(), 340);
    }

    #[test]
    fn test_offsets_always_leave_room_for_three_channels() {
        let table = EntityLookupTable::build(&[
            band("10.0.0.1", 0, Some(1), 0..400),
            band("10.0.0.2", 0, Some(1), 400..700),
        ]);
        for id in 0..=u16::MAX {
            if let Some(entry) = table.get(id) {
                assert!((entry.offset as usize) + 2 < DMX_CHANNELS);
            }
        }
    }

    #[test]
    fn test_targets_shared_across_bands_on_same_ip() {
        let table = EntityLookupTable::build(&[
            band("10.0.0.1", 0, Some(1), 0..200),
            band("10.0.0.1", 2, Some(3), 200..400),
            band("10.0.0.2", 0, None, 400..410),
        ]);

        assert_eq!(table.targets().len(), 5);
        let id = table.target_id(&Target::new("10.0.0.1", 2)).unwrap();
        assert_eq!(table.target(id), &Target::new("10.0.0.1", 2));
        assert_eq!(table.get(200).unwrap().target, id);
    }

    #[test]
    fn test_duplicate_id_last_band_wins() {
        let table = EntityLookupTable::build(&[
            band("10.0.0.1", 0, None, 0..10),
            band("10.0.0.9", 8, None, 5..6),
        ]);

        assert_eq!(table.resolve(5), Some((&Target::new("10.0.0.9", 8), 0)));
        assert_eq!(table.len(), 10);
    }

    #[test]
    fn test_tail_without_room_for_next_universe() {
        let table = EntityLookupTable::build(&[band("10.0.0.1", u16::MAX, None, 0..180)]);

        assert_eq!(table.targets(), &[Target::new("10.0.0.1", u16::MAX)]);
        assert_eq!(table.get(170), None);
        assert_eq!(table.dropped(), 10);
    }

    #[test]
    fn test_empty_table() {
        let table = EntityLookupTable::build(std::iter::empty());
        assert!(table.is_empty());
        assert!(table.targets().is_empty());
        assert_eq!(table.get(42), None);
    }
}
