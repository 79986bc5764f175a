use std::{fs::read_to_string, path::Path};

use crate::{
    loader::error::ConfigLoadError,
    models::sources::{EnvConfig, FileDatabaseConfig},
};

/// Picks the PostgreSQL URL: `DATABASE_URL`, then the file named by
/// `DATABASE_URL_FILE`, then `[database].url`.
pub fn resolve_database_url(
    env: &EnvConfig,
    file_database: &FileDatabaseConfig,
) -> Result<Option<String>, ConfigLoadError> {
    if let Some(url) = env
        .database_url
        .clone()
        .filter(|value| !value.trim().is_empty())
    {
        return Ok(Some(url.trim().to_string()));
    }

    if let Some(path) = env.database_url_file.as_ref()
        && let Some(url) = read_secret_file(path)?
    {
        return Ok(Some(url));
    }

    Ok(file_database
        .url
        .as_deref()
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(str::to_string))
}

pub fn read_secret_file(
    path: &Path,
) -> Result<Option<String>, ConfigLoadError> {
    let contents = read_to_string(path).map_err(|source| {
        ConfigLoadError::SecretFileIo {
            path: path.to_path_buf(),
            source,
        }
    })?;
    let trimmed = contents.trim();
    if trimmed.is_empty() {
        Ok(None)
    } else {
        Ok(Some(trimmed.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn env_url_wins_over_file() {
        let env = EnvConfig {
            database_url: Some("postgres://env/db".into()),
            ..EnvConfig::default()
        };
        let file = FileDatabaseConfig {
            url: Some("postgres://file/db".into()),
            ..FileDatabaseConfig::default()
        };
        assert_eq!(
            resolve_database_url(&env, &file).unwrap().as_deref(),
            Some("postgres://env/db")
        );
    }

    #[test]
    fn url_file_is_read_and_trimmed() {
        let mut secret = tempfile::NamedTempFile::new().unwrap();
        writeln!(secret, "  postgres://secret/db  ").unwrap();
        let env = EnvConfig {
            database_url_file: Some(secret.path().to_path_buf()),
            ..EnvConfig::default()
        };
        assert_eq!(
            resolve_database_url(&env, &FileDatabaseConfig::default())
                .unwrap()
                .as_deref(),
            Some("postgres://secret/db")
        );
    }

    #[test]
    fn missing_secret_file_is_an_error() {
        let env = EnvConfig {
            database_url_file: Some("/nonexistent/skillpath-db-url".into()),
            ..EnvConfig::default()
        };
        assert!(matches!(
            resolve_database_url(&env, &FileDatabaseConfig::default()),
            Err(ConfigLoadError::SecretFileIo { .. })
        ));
    }
}
