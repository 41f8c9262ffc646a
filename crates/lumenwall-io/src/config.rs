//! Router config file loading (TOML).

use crate::error::{IoError, Result};
use lumenwall_core::RouterConfig;
use std::path::Path;
use tracing::{debug, info};

/// Maximum allowed config file size (1 MiB)
pub const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

/// Load the router config.
///
/// No path, or a path that does not exist, yields the defaults. Unknown keys
/// are rejected. The result is not normalized so CLI overrides can still be
/// applied on top.
pub fn load_config(path: Option<&Path>) -> Result<RouterConfig> {
    let Some(path) = path else {
        debug!("No config file given, using defaults");
        return Ok(RouterConfig::default());
    };
    if !path.is_file() {
        info!("Config file {} not found, using defaults", path.display());
        return Ok(RouterConfig::default());
    }

    let size = std::fs::metadata(path)?.len();
    if size > MAX_CONFIG_FILE_SIZE {
        return Err(IoError::FileTooLarge {
            size,
            limit: MAX_CONFIG_FILE_SIZE,
        });
    }

    let content = std::fs::read_to_string(path)?;
    let config: RouterConfig = toml::from_str(&content)?;
    info!("Loaded config from {}", path.display());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumenwall_core::ChannelOrder;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_without_file() {
        assert_eq!(load_config(None).unwrap(), RouterConfig::default());

        let dir = tempfile::tempdir().unwrap();
        let config = load_config(Some(&dir.path().join("router.toml"))).unwrap();
        assert_eq!(config, RouterConfig::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "mapping = \"wall.csv\"").unwrap();
        writeln!(file, "patch = \"patch.csv\"").unwrap();
        writeln!(file, "order = \"GRB\"").unwrap();
        writeln!(file, "[monitor]").unwrap();
        writeln!(file, "enabled = true").unwrap();

        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.mapping, PathBuf::from("wall.csv"));
        assert_eq!(config.patch, Some(PathBuf::from("patch.csv")));
        assert_eq!(config.order, ChannelOrder::Grb);
        assert!(config.monitor.enabled);
        assert_eq!(config.monitor.every, 20);
        assert_eq!(config.listen_port, 50000);
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "excel = \"wall.xlsx\"").unwrap();

        let result = load_config(Some(file.path()));
        assert!(matches!(result, Err(IoError::Toml(_))));
    }
}
