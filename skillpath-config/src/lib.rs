//! Configuration for the Skillpath tracking server.
//!
//! Values come from three layers, highest precedence first: the process
//! environment (optionally seeded from a `.env` file), a TOML file, and
//! built-in defaults. Guard rails reject unusable combinations and collect
//! softer findings as warnings for the caller to log.

pub mod loader;
pub mod models;
pub mod validation;

pub use loader::{ConfigLoad, ConfigLoader, ConfigLoaderOptions, error::ConfigLoadError};
pub use models::{
    Config, ConfigMetadata, CorsConfig, DatabaseConfig, ServerConfig,
    TrackingConfig,
};
pub use validation::{ConfigGuardRailError, ConfigWarning, ConfigWarnings};
