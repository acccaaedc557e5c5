//! Configuration types
//!
//! Board-agnostic configuration structures. Configuration is stored as
//! postcard binary data and can be written by hand as TOML.

pub mod hardware;
#[cfg(feature = "serde")]
pub mod persist;
#[cfg(feature = "toml")]
pub mod toml;
pub mod types;

pub use hardware::*;
#[cfg(feature = "serde")]
pub use persist::{decode_config, encode_config, StoredConfig};
#[cfg(feature = "toml")]
pub use self::toml::parse_config;
pub use types::*;
