//! Binary configuration storage
//!
//! The configuration is wrapped with a header and checksum and serialized
//! with postcard, so a board can keep it in flash or EEPROM and detect
//! stale or corrupted data on load.

use serde::{Deserialize, Serialize};

use super::types::{CatapultConfig, ConfigError};

/// Magic number to identify valid configuration data
pub const CONFIG_MAGIC: u32 = 0x4341_5450; // "CATP"

/// Current configuration data version
pub const CONFIG_VERSION: u8 = 1;

/// Upper bound on the encoded size of a [`StoredConfig`]
pub const MAX_STORED_CONFIG_LEN: usize = 96;

/// Configuration as stored on the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StoredConfig {
    /// Magic number for validation
    pub magic: u32,
    /// Data format version
    pub version: u8,
    /// The configuration itself
    pub config: CatapultConfig,
    /// CRC32 over the encoded configuration
    pub crc: u32,
}

impl StoredConfig {
    /// Wrap a configuration with a fresh header and checksum
    pub fn new(config: CatapultConfig) -> Result<Self, ConfigError> {
        let mut stored = Self {
            magic: CONFIG_MAGIC,
            version: CONFIG_VERSION,
            config,
            crc: 0,
        };
        stored.crc = stored.calculate_crc()?;
        Ok(stored)
    }

    /// Check if the header matches this firmware's format
    pub fn is_valid(&self) -> bool {
        self.magic == CONFIG_MAGIC && self.version == CONFIG_VERSION
    }

    /// Calculate CRC32 over magic, version and the encoded configuration
    pub fn calculate_crc(&self) -> Result<u32, ConfigError> {
        let mut buf = [0u8; MAX_STORED_CONFIG_LEN];
        let body =
            postcard::to_slice(&self.config, &mut buf).map_err(|_| ConfigError::Serialize)?;

        let mut crc: u32 = 0xFFFF_FFFF;
        crc = crc32_update(crc, &self.magic.to_le_bytes());
        crc = crc32_update(crc, &[self.version]);
        crc = crc32_update(crc, body);

        Ok(!crc)
    }

    /// Verify the CRC is correct
    pub fn verify_crc(&self) -> bool {
        matches!(self.calculate_crc(), Ok(crc) if crc == self.crc)
    }
}

/// Encode a configuration into `buf`
///
/// Returns the used part of the buffer.
pub fn encode_config<'a>(
    config: &CatapultConfig,
    buf: &'a mut [u8],
) -> Result<&'a mut [u8], ConfigError> {
    config.validate()?;
    let stored = StoredConfig::new(*config)?;
    postcard::to_slice(&stored, buf).map_err(|_| ConfigError::Serialize)
}

/// Decode and verify a stored configuration
pub fn decode_config(bytes: &[u8]) -> Result<CatapultConfig, ConfigError> {
    let stored: StoredConfig =
        postcard::from_bytes(bytes).map_err(|_| ConfigError::Deserialize)?;

    if !stored.is_valid() {
        return Err(ConfigError::InvalidHeader);
    }
    if !stored.verify_crc() {
        return Err(ConfigError::ChecksumMismatch);
    }

    stored.config.validate()?;
    Ok(stored.config)
}

/// CRC32 update (IEEE 802.3 polynomial, reflected)
fn crc32_update(crc: u32, data: &[u8]) -> u32 {
    const POLY: u32 = 0xEDB8_8320;
    let mut crc = crc;

    for &byte in data {
        crc ^= byte as u32;
        for _ in 0..8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ POLY;
            } else {
                crc >>= 1;
            }
        }
    }

    crc
}
