//! Patch sheet loading.
//!
//! CSV with the header `ip,universe,from_channel,to_channel`. Each row adds
//! one destination; rows sharing a source channel accumulate.

use crate::error::Result;
use lumenwall_core::{PatchTable, Target, DMX_CHANNELS};
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
struct PatchRow {
    ip: String,
    universe: u16,
    from_channel: u16,
    to_channel: u16,
}

/// Load the patch table.
///
/// No path gives an empty table. A path that does not exist also gives an
/// empty table so an optional sheet can stay referenced in the config.
pub fn load_patch(path: Option<&Path>) -> Result<PatchTable> {
    let Some(path) = path else {
        return Ok(PatchTable::new());
    };
    if !path.is_file() {
        warn!("Patch file {} not found, running without patch", path.display());
        return Ok(PatchTable::new());
    }

    let table = parse_patch(File::open(path)?)?;
    info!(
        "Patch loaded from {}: {} rule(s)",
        path.display(),
        table.rule_count()
    );
    Ok(table)
}

/// Parse patch rows from CSV text with a header line
pub fn parse_patch<R: Read>(reader: R) -> Result<PatchTable> {
    let mut csv = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut table = PatchTable::new();
    for (line, record) in csv.deserialize::<PatchRow>().enumerate() {
        let row = record?;
        let in_range = |channel: u16| (1..=DMX_CHANNELS).contains(&usize::from(channel));
        if !in_range(row.from_channel) || !in_range(row.to_channel) {
            warn!(
                "Patch row {}: {} -> {} outside 1..={}, ignored",
                line + 1,
                row.from_channel,
                row.to_channel,
                DMX_CHANNELS
            );
            continue;
        }
        table.insert(
            Target::new(row.ip, row.universe),
            row.from_channel,
            row.to_channel,
        );
    }
    Ok(table)
}
