//! Channel patch rules
//!
//! Operators use patch rules to copy a channel's value onto other channels
//! right before transmission, e.g. to feed a spare fixture wired in place of
//! a dead one. Channels are 1-indexed as on the DMX console.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};

use crate::dmx::{DmxBuffer, Target, DMX_CHANNELS};

/// `Target -> { from_channel -> [to_channel, ...] }`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchTable {
    rules: HashMap<Target, BTreeMap<u16, Vec<u16>>>,
}

impl PatchTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one rule: copy `from_channel` onto `to_channel` on `target`
    pub fn insert(&mut self, target: Target, from_channel: u16, to_channel: u16) {
        self.rules
            .entry(target)
            .or_default()
            .entry(from_channel)
            .or_default()
            .push(to_channel);
    }

    /// Rules for one target, if any
    pub fn rules_for(&self, target: &Target) -> Option<&BTreeMap<u16, Vec<u16>>> {
        self.rules.get(target)
    }

    /// Total number of destination channels across all targets
    pub fn rule_count(&self) -> usize {
        self.rules
            .values()
            .flat_map(|rules| rules.values())
            .map(Vec::len)
            .sum()
    }

    /// Whether the table holds no rules
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Apply the rules of `target` to `dmx`.
    ///
    /// Sources are always read from `dmx`, never from the patched copy, so
    /// rule order does not matter. Channels outside 1..=512 are ignored.
    pub fn apply<'a>(&self, target: &Target, dmx: &'a DmxBuffer) -> Cow<'a, DmxBuffer> {
        let Some(rules) = self.rules.get(target) else {
            return Cow::Borrowed(dmx);
        };

        let mut out = *dmx;
        for (&from, destinations) in rules {
            let Some(src) = channel_index(from) else {
                continue;
            };
            for dst in destinations.iter().filter_map(|&to| channel_index(to)) {
                out[dst] = dmx[src];
            }
        }
        Cow::Owned(out)
    }
}

fn channel_index(channel: u16) -> Option<usize> {
    let index = (channel as usize).checked_sub(1)?;
    (index < DMX_CHANNELS).then_some(index)
}
