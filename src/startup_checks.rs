use thiserror::Error;
use tracing::{error, info, warn};
use url::Url;

use crate::Config;

#[derive(Debug, Error)]
pub enum StartupCheckError {
    #[error("failed to create data directory: {0}")]
    DataDirectoryCreationFailed(#[from] std::io::Error),

    #[error("upstream base URL does not parse: {0}")]
    InvalidUpstreamUrl(String),

    #[error("upstream API key is not configured")]
    MissingApiKey,

    #[error("upstream album id is not configured")]
    MissingAlbumId,

    #[error("admin token is not configured; POST /api/refresh will reject every request")]
    MissingAdminToken,

    #[error("mail recipient is not configured")]
    MissingMailRecipient,
}

/// Errors that make the server useless rather than merely degraded.
pub fn is_critical(check_error: &StartupCheckError) -> bool {
    matches!(
        check_error,
        StartupCheckError::DataDirectoryCreationFailed(_)
            | StartupCheckError::InvalidUpstreamUrl(_)
            | StartupCheckError::MissingApiKey
            | StartupCheckError::MissingAlbumId
    )
}

pub async fn perform_startup_checks(config: &Config) -> Result<(), Vec<StartupCheckError>> {
    let mut errors = Vec::new();

    info!("Performing startup checks...");

    let data_dir = &config.cache.data_directory;
    if data_dir.exists() {
        info!("Data directory exists: {:?}", data_dir);
    } else {
        info!("Data directory does not exist, creating: {:?}", data_dir);
        if let Err(create_error) = tokio::fs::create_dir_all(data_dir).await {
            error!("Failed to create data directory: {}", create_error);
            errors.push(StartupCheckError::DataDirectoryCreationFailed(create_error));
        }
    }

    match Url::parse(&config.upstream.base_url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {
            info!("Upstream base URL: {}", parsed);
        }
        _ => {
            errors.push(StartupCheckError::InvalidUpstreamUrl(
                config.upstream.base_url.clone(),
            ));
        }
    }

    if config.upstream.api_key.is_empty() {
        errors.push(StartupCheckError::MissingApiKey);
    }
    if config.upstream.album_id.is_empty() {
        errors.push(StartupCheckError::MissingAlbumId);
    }

    if config.app.admin_token.is_empty() {
        warn!("No admin token configured; manual refresh is disabled");
        errors.push(StartupCheckError::MissingAdminToken);
    }

    match &config.mail {
        Some(mail_config) if mail_config.recipient.is_empty() => {
            errors.push(StartupCheckError::MissingMailRecipient);
        }
        Some(_) => info!("Mail configured"),
        None => info!("Mail not configured; contact endpoint will report an error"),
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn valid_config(temp: &TempDir) -> Config {
        let mut config = Config::default();
        config.cache.data_directory = temp.path().join("data");
        config.upstream.base_url = "https://photos.example.com".to_string();
        config.upstream.api_key = "key".to_string();
        config.upstream.album_id = "album-1".to_string();
        config.app.admin_token = "token".to_string();
        config
    }

    #[tokio::test]
    async fn valid_config_passes_and_creates_data_dir() {
        let temp = TempDir::new().unwrap();
        let config = valid_config(&temp);

        assert!(perform_startup_checks(&config).await.is_ok());
        assert!(config.cache.data_directory.exists());
    }

    #[tokio::test]
    async fn missing_credentials_are_critical() {
        let temp = TempDir::new().unwrap();
        let mut config = valid_config(&temp);
        config.upstream.base_url = "not a url".to_string();
        config.upstream.api_key = String::new();

        let errors = perform_startup_checks(&config).await.unwrap_err();
        assert!(errors.iter().any(is_critical));
    }

    #[tokio::test]
    async fn missing_admin_token_is_a_warning_only() {
        let temp = TempDir::new().unwrap();
        let mut config = valid_config(&temp);
        config.app.admin_token = String::new();

        let errors = perform_startup_checks(&config).await.unwrap_err();
        assert!(!errors.iter().any(is_critical));
    }
}
