//! Installation sheet loading.
//!
//! The sheet lists one row per LED universe: the controller address, the
//! universe and the entity range wired to it. Rows are grouped into bands the
//! way the wall is cabled: an even universe carries the first 170 pixels of a
//! band and the following odd universe carries the rest.

use crate::error::{IoError, Result};
use lumenwall_core::BandDescriptor;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::net::Ipv4Addr;
use std::path::Path;
use tracing::{debug, info, warn};

/// Maximum allowed mapping file size (16 MiB)
pub const MAX_MAPPING_FILE_SIZE: u64 = 16 * 1024 * 1024;

/// Highest universe number that drives LED bands; anything above is other fixtures
pub const MAX_LED_UNIVERSE: u16 = 127;

/// One row of the installation sheet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingRow {
    /// Free-form label
    #[serde(default, alias = "Name")]
    pub name: Option<String>,
    /// Controller IPv4 address
    #[serde(alias = "ArtNet IP")]
    pub ip: String,
    /// Art-Net universe
    #[serde(alias = "ArtNet Universe")]
    pub universe: u16,
    /// First entity id wired to this universe
    #[serde(alias = "Entity Start")]
    pub entity_start: u16,
    /// Last entity id wired to this universe (inclusive)
    #[serde(alias = "Entity End")]
    pub entity_end: u16,
}

impl MappingRow {
    /// Entity ids of the row in ascending order
    pub fn entity_ids(&self) -> impl Iterator<Item = u16> {
        let lo = self.entity_start.min(self.entity_end);
        let hi = self.entity_start.max(self.entity_end);
        lo..=hi
    }
}

/// Load the installation sheet and assemble its bands.
///
/// The format follows the file extension: `csv` (or none), `json` or `ron`.
pub fn load_mapping(path: &Path) -> Result<Vec<BandDescriptor>> {
    let rows = read_rows(path, MAX_MAPPING_FILE_SIZE)?;
    let bands = bands_from_rows(&rows)?;
    info!(
        "Loaded {} band(s) from {} mapping row(s) in {}",
        bands.len(),
        rows.len(),
        path.display()
    );
    Ok(bands)
}

fn read_rows(path: &Path, limit: u64) -> Result<Vec<MappingRow>> {
    if !path.exists() {
        return Err(IoError::NotFound(path.to_path_buf()));
    }
    let size = std::fs::metadata(path)?.len();
    if size > limit {
        return Err(IoError::FileTooLarge { size, limit });
    }

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("csv")
        .to_ascii_lowercase();

    match extension.as_str() {
        "json" => {
            let mut content = String::new();
            File::open(path)?.read_to_string(&mut content)?;
            Ok(serde_json::from_str(&content)?)
        }
        "ron" => {
            let mut content = String::new();
            File::open(path)?.read_to_string(&mut content)?;
            Ok(ron::from_str(&content)?)
        }
        "csv" => parse_csv(File::open(path)?),
        other => Err(IoError::UnsupportedFormat(other.to_string())),
    }
}

/// Parse CSV rows with a header line
pub fn parse_csv<R: Read>(reader: R) -> Result<Vec<MappingRow>> {
    let mut csv = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    let mut rows = Vec::new();
    for record in csv.deserialize() {
        rows.push(record?);
    }
    Ok(rows)
}

/// Group sheet rows into bands.
///
/// Rows above [`MAX_LED_UNIVERSE`] are skipped. For every even universe `U`
/// on a controller the band is row `U` followed by row `U + 1` when present.
pub fn bands_from_rows(rows: &[MappingRow]) -> Result<Vec<BandDescriptor>> {
    let mut by_slot: BTreeMap<(Ipv4Addr, u16), &MappingRow> = BTreeMap::new();

    for row in rows {
        if row.universe > MAX_LED_UNIVERSE {
            debug!("Skipping non-LED universe {} on {}", row.universe, row.ip);
            continue;
        }
        let ip: Ipv4Addr = row.ip.parse().map_err(|_| {
            IoError::InvalidMapping(format!(
                "invalid controller address '{}' for universe {}",
                row.ip, row.universe
            ))
        })?;
        if by_slot.contains_key(&(ip, row.universe)) {
            warn!(
                "Duplicate mapping row for {}/u{}, keeping the first one",
                ip, row.universe
            );
            continue;
        }
        by_slot.insert((ip, row.universe), row);
    }

    let mut bands = Vec::new();
    for (&(ip, universe), row) in &by_slot {
        if universe % 2 == 1 {
            if !by_slot.contains_key(&(ip, universe - 1)) {
                warn!(
                    "Universe {} on {} has no even partner, leaving it unmapped",
                    universe, ip
                );
            }
            continue;
        }

        let mut entity_ids: Vec<u16> = row.entity_ids().collect();
        let secondary = universe + 1;
        let secondary_universe = match by_slot.get(&(ip, secondary)) {
            Some(tail) => {
                entity_ids.extend(tail.entity_ids());
                Some(secondary)
            }
            None => None,
        };

        debug!(
            "Band {}/u{}: {} entities{}",
            ip,
            universe,
            entity_ids.len(),
            if secondary_universe.is_some() {
                " over two universes"
            } else {
                ""
            }
        );
        bands.push(BandDescriptor::new(
            ip.to_string(),
            universe,
            secondary_universe,
            entity_ids,
        ));
    }

    if bands.is_empty() {
        return Err(IoError::InvalidMapping(
            "no LED band found in the mapping".to_string(),
        ));
    }
    Ok(bands)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn row(ip: &str, universe: u16, start: u16, end: u16) -> MappingRow {
        MappingRow {
            name: None,
            ip: ip.to_string(),
            universe,
            entity_start: start,
            entity_end: end,
        }
    }

    #[test]
    fn test_pairs_even_and_odd_universes() {
        let rows = vec![
            row("192.168.1.45", 1, 270, 358),
            row("192.168.1.45", 0, 100, 269),
            row("192.168.1.45", 2, 400, 569),
        ];
        let bands = bands_from_rows(&rows).unwrap();
        assert_eq!(bands.len(), 2);

        assert_eq!(bands[0].primary_universe, 0);
        assert_eq!(bands[0].secondary_universe, Some(1));
        assert_eq!(bands[0].entity_ids.len(), 170 + 89);
        assert_eq!(bands[0].entity_ids[0], 100);
        assert_eq!(bands[0].entity_ids[170], 270);

        assert_eq!(bands[1].primary_universe, 2);
        assert_eq!(bands[1].secondary_universe, None);
    }

    #[test]
    fn test_reversed_range_is_normalized() {
        let bands = bands_from_rows(&[row("10.0.0.1", 0, 9, 5)]).unwrap();
        assert_eq!(bands[0].entity_ids, vec![5, 6, 7, 8, 9]);
    }

    #[test]
    fn test_non_led_universes_are_skipped() {
        let rows = vec![row("10.0.0.1", 0, 0, 9), row("10.0.0.1", 200, 10, 19)];
        let bands = bands_from_rows(&rows).unwrap();
        assert_eq!(bands.len(), 1);
    }

    #[test]
    fn test_lonely_odd_universe_is_unmapped() {
        let rows = vec![row("10.0.0.1", 0, 0, 9), row("10.0.0.2", 3, 10, 19)];
        let bands = bands_from_rows(&rows).unwrap();
        assert_eq!(bands.len(), 1);
        assert_eq!(bands[0].ip, "10.0.0.1");
    }

    #[test]
    fn test_duplicate_row_first_wins() {
        let rows = vec![row("10.0.0.1", 0, 0, 9), row("10.0.0.1", 0, 50, 59)];
        let bands = bands_from_rows(&rows).unwrap();
        assert_eq!(bands[0].entity_ids[0], 0);
    }

    #[test]
    fn test_controllers_do_not_pair_across_addresses() {
        let rows = vec![row("10.0.0.1", 0, 0, 9), row("10.0.0.2", 1, 10, 19)];
        let bands = bands_from_rows(&rows).unwrap();
        assert_eq!(bands.len(), 1);
        assert_eq!(bands[0].secondary_universe, None);
    }

    #[test]
    fn test_invalid_ip_is_fatal() {
        let result = bands_from_rows(&[row("not-an-ip", 0, 0, 9)]);
        assert!(matches!(result, Err(IoError::InvalidMapping(_))));
    }

    #[test]
    fn test_empty_mapping_is_fatal() {
        let result = bands_from_rows(&[row("10.0.0.1", 130, 0, 9)]);
        assert!(matches!(result, Err(IoError::InvalidMapping(_))));
    }

    #[test]
    fn test_parse_csv_with_sheet_headers() {
        let data = "Name,ArtNet IP,ArtNet Universe,Entity Start,Entity End\n\
                    Band 1, 192.168.1.45 ,0,100,269\n\
                    Band 1,192.168.1.45,1,270,358\n";
        let rows = parse_csv(data.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].ip, "192.168.1.45");
        assert_eq!(rows[0].name.as_deref(), Some("Band 1"));
        assert_eq!(rows[1].entity_end, 358);
    }

    #[test]
    fn test_parse_csv_with_snake_case_headers() {
        let data = "ip,universe,entity_start,entity_end\n10.0.0.1,4,0,169\n";
        let rows = parse_csv(data.as_bytes()).unwrap();
        assert_eq!(rows[0].universe, 4);
        assert_eq!(rows[0].name, None);
    }

    #[test]
    fn test_parse_csv_rejects_bad_numbers() {
        let data = "ip,universe,entity_start,entity_end\n10.0.0.1,four,0,169\n";
        assert!(matches!(parse_csv(data.as_bytes()), Err(IoError::Csv(_))));
    }

    #[test]
    fn test_load_json_mapping() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"[{{"ip": "10.0.0.1", "universe": 0, "entity_start": 0, "entity_end": 169}},
                {{"ip": "10.0.0.1", "universe": 1, "entity_start": 170, "entity_end": 258}}]"#
        )
        .unwrap();

        let bands = load_mapping(file.path()).unwrap();
        assert_eq!(bands.len(), 1);
        assert_eq!(bands[0].entity_ids.len(), 259);
    }

    #[test]
    fn test_load_ron_mapping() {
        let mut file = tempfile::Builder::new().suffix(".ron").tempfile().unwrap();
        write!(
            file,
            r#"[(name: Some("top"), ip: "10.0.0.9", universe: 6, entity_start: 0, entity_end: 9)]"#
        )
        .unwrap();

        let bands = load_mapping(file.path()).unwrap();
        assert_eq!(bands[0].primary_universe, 6);
    }

    #[test]
    fn test_file_size_limit() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&[b' '; 100]).unwrap();

        let result = read_rows(file.path(), 50);
        assert!(matches!(
            result,
            Err(IoError::FileTooLarge {
                size: 100,
                limit: 50
            })
        ));
    }

    #[test]
    fn test_spreadsheet_extension_is_unsupported() {
        let file = tempfile::Builder::new().suffix(".xlsx").tempfile().unwrap();
        let result = load_mapping(file.path());
        assert!(matches!(result, Err(IoError::UnsupportedFormat(ext)) if ext == "xlsx"));
    }

    #[test]
    fn test_missing_mapping_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_mapping(&dir.path().join("absent.csv"));
        assert!(matches!(result, Err(IoError::NotFound(_))));
    }
}
