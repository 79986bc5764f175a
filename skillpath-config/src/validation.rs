use thiserror::Error;
use url::Url;

use crate::models::Config;

/// Non-fatal finding surfaced to the operator at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct ConfigWarnings {
    items: Vec<ConfigWarning>,
}

impl ConfigWarnings {
    pub fn push(&mut self, message: impl Into<String>) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: None,
        });
    }

    pub fn push_with_hint(
        &mut self,
        message: impl Into<String>,
        hint: impl Into<String>,
    ) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: Some(hint.into()),
        });
    }

    pub fn extend(&mut self, other: ConfigWarnings) {
        self.items.extend(other.items);
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConfigWarning> {
        self.items.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

impl IntoIterator for ConfigWarnings {
    type Item = ConfigWarning;
    type IntoIter = std::vec::IntoIter<ConfigWarning>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

#[derive(Debug, Error)]
pub enum ConfigGuardRailError {
    #[error("watched threshold {value} must lie in (0, 100]")]
    WatchedThreshold { value: f64 },
    #[error("invalid database URL")]
    DatabaseUrl {
        #[source]
        source: url::ParseError,
    },
    #[error(
        "database URL must use the postgres:// or postgresql:// scheme, got '{scheme}'"
    )]
    DatabaseScheme { scheme: String },
    #[error("database max_connections must be at least 1")]
    ZeroMaxConnections,
    #[error("database min_connections ({min}) exceeds max_connections ({max})")]
    PoolBounds { min: u32, max: u32 },
}

/// Rejects configurations the server cannot run with and reports the rest
/// as warnings.
pub fn apply_guard_rails(
    config: &Config,
) -> Result<ConfigWarnings, ConfigGuardRailError> {
    let mut warnings = ConfigWarnings::default();

    let threshold = config.tracking.watched_threshold;
    if !threshold.is_finite() || threshold <= 0.0 || threshold > 100.0 {
        return Err(ConfigGuardRailError::WatchedThreshold { value: threshold });
    }

    let database = &config.database;
    if database.max_connections == 0 {
        return Err(ConfigGuardRailError::ZeroMaxConnections);
    }
    if database.min_connections > database.max_connections {
        return Err(ConfigGuardRailError::PoolBounds {
            min: database.min_connections,
            max: database.max_connections,
        });
    }

    match database.primary_url.as_deref() {
        Some(raw) => {
            let parsed = Url::parse(raw)
                .map_err(|source| ConfigGuardRailError::DatabaseUrl { source })?;
            if !matches!(parsed.scheme(), "postgres" | "postgresql") {
                return Err(ConfigGuardRailError::DatabaseScheme {
                    scheme: parsed.scheme().to_string(),
                });
            }
        }
        None if !config.dev_mode => warnings.push_with_hint(
            "No database URL configured",
            "Set DATABASE_URL or [database].url, or run with --in-memory for local testing",
        ),
        None => {}
    }

    if config.cors.is_wildcard_included() {
        warnings.push_with_hint(
            "CORS allows any origin",
            "List explicit origins in CORS_ALLOWED_ORIGINS for production",
        );
    }

    Ok(warnings)
}
