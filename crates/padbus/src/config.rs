use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;

use crate::bus::{Bus, MockBus, DEFAULT_CAPACITY};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("yaml deserialize error: {0}")]
    YamlDeserializeError(#[from] serde_yaml::Error),
    #[error("unsupported version: {0}")]
    UnsupportedVersion(u8),
    #[error("path error: {0}")]
    PathError(#[from] std::io::Error),
}

/// Which bus implementation to open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BusKind {
    /// The installed bus driver.
    #[default]
    Driver,
    /// The in-process [`MockBus`].
    Mock,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MockConfig {
    pub capacity: usize,
    pub available: bool,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            available: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Config {
    pub bus: BusKind,
    pub mock: MockConfig,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigV1 {
    #[allow(dead_code)]
    version: u8,
    #[serde(default)]
    bus: BusKind,
    #[serde(default)]
    mock: MockConfig,
}

impl Config {
    /// Open the configured bus.
    ///
    /// Selecting the driver on a host without it fails with
    /// [`Error::NotSupported`](crate::Error::NotSupported).
    pub fn open_bus(&self) -> crate::Result<Arc<dyn Bus>> {
        match self.bus {
            BusKind::Mock => Ok(Arc::new(MockBus::from_config(&self.mock))),
            #[cfg(windows)]
            BusKind::Driver => Ok(Arc::new(crate::bus::DriverBus)),
            #[cfg(not(windows))]
            BusKind::Driver => Err(crate::Error::NotSupported),
        }
    }
}

/// Parse yaml config.
pub fn parse_config(input: &str) -> Result<Config, ConfigError> {
    let version = parse_version(input)?;
    match version {
        1 => {
            let config: ConfigV1 = serde_yaml::from_str(input)?;
            Ok(Config {
                bus: config.bus,
                mock: config.mock,
            })
        }
        _ => Err(ConfigError::UnsupportedVersion(version)),
    }
}

/// Read and parse a yaml config file.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let input = std::fs::read_to_string(path)?;
    parse_config(&input)
}

#[derive(Debug, Clone, Deserialize)]
struct VersionedConfig {
    version: u8,
}

fn parse_version(input: &str) -> Result<u8, ConfigError> {
    let raw: VersionedConfig = serde_yaml::from_str(input)?;
    Ok(raw.version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_config_yaml_error_when_version_missing() {
        let yaml = "bus: mock\n";
        assert!(matches!(
            parse_config(yaml),
            Err(ConfigError::YamlDeserializeError(_))
        ));
    }

    #[test]
    fn parse_config_rejects_unknown_version() {
        assert!(matches!(
            parse_config("version: 2\n"),
            Err(ConfigError::UnsupportedVersion(2))
        ));
    }

    #[test]
    fn parse_config_defaults() {
        let config = parse_config("version: 1\n").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.bus, BusKind::Driver);
        assert_eq!(config.mock.capacity, DEFAULT_CAPACITY);
        assert!(config.mock.available);
    }

    #[test]
    fn parse_config_mock_section() {
        let yaml = r#"
version: 1
bus: mock
mock:
  capacity: 2
  available: false
"#;
        let config = parse_config(yaml).unwrap();
        assert_eq!(config.bus, BusKind::Mock);
        assert_eq!(
            config.mock,
            MockConfig {
                capacity: 2,
                available: false
            }
        );
    }

    #[test]
    fn parse_config_rejects_unknown_bus() {
        assert!(matches!(
            parse_config("version: 1\nbus: usb\n"),
            Err(ConfigError::YamlDeserializeError(_))
        ));
    }

    #[test]
    fn open_mock_bus_from_config() {
        let config = Config {
            bus: BusKind::Mock,
            mock: MockConfig {
                capacity: 1,
                available: true,
            },
        };
        let bus = config.open_bus().unwrap();
        let mut client = crate::Client::alloc(bus);
        client.connect().unwrap();
        let _pad = client.plug_in().unwrap();
        assert!(matches!(client.plug_in(), Err(crate::Error::NoFreeSlot)));
    }

    #[cfg(not(windows))]
    #[test]
    fn driver_is_not_supported_off_windows() {
        assert!(matches!(
            Config::default().open_bus(),
            Err(crate::Error::NotSupported)
        ));
    }
}
