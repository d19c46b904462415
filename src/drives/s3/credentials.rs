//! S3 credentials
//!
//! Credentials come from the drive configuration or, when enabled, from the
//! standard `AWS_*` environment variables. A drive without credentials sends
//! unsigned requests.

use crate::config::S3DriveConfig;
use thiserror::Error;

/// Credential loading errors
#[derive(Error, Debug)]
pub enum CredentialsError {
    #[error("Missing credentials: {0}")]
    MissingCredentials(String),
}

/// Credentials for AWS SigV4 signing
#[derive(Clone)]
pub struct Credentials {
    access_key_id: String,
    secret_access_key: String,
    session_token: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Credentials {
    /// Create new credentials
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: None,
        }
    }

    /// Create credentials with session token (for temporary credentials)
    pub fn with_session_token(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        session_token: impl Into<String>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: Some(session_token.into()),
        }
    }

    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    pub fn secret_access_key(&self) -> &str {
        &self.secret_access_key
    }

    pub fn session_token(&self) -> Option<&str> {
        self.session_token.as_deref()
    }

    /// Load credentials from environment variables
    ///
    /// Looks for:
    /// - `AWS_ACCESS_KEY_ID`
    /// - `AWS_SECRET_ACCESS_KEY`
    /// - `AWS_SESSION_TOKEN` (optional)
    pub fn from_env() -> Result<Self, CredentialsError> {
        let access_key = std::env::var("AWS_ACCESS_KEY_ID").map_err(|_| {
            CredentialsError::MissingCredentials("AWS_ACCESS_KEY_ID not set".into())
        })?;

        let secret_key = std::env::var("AWS_SECRET_ACCESS_KEY").map_err(|_| {
            CredentialsError::MissingCredentials("AWS_SECRET_ACCESS_KEY not set".into())
        })?;

        Ok(match std::env::var("AWS_SESSION_TOKEN").ok() {
            Some(token) => Self::with_session_token(access_key, secret_key, token),
            None => Self::new(access_key, secret_key),
        })
    }

    /// Resolve credentials for a drive configuration.
    ///
    /// Configured keys win; otherwise the environment is consulted when
    /// `use_env_credentials` is set. `Ok(None)` means anonymous access.
    pub fn from_config(config: &S3DriveConfig) -> Result<Option<Self>, CredentialsError> {
        match (&config.access_key, &config.secret_key) {
            (Some(access), Some(secret)) => Ok(Some(Self::new(access.clone(), secret.clone()))),
            (Some(_), None) => Err(CredentialsError::MissingCredentials(
                "secret_key not set in config".into(),
            )),
            (None, Some(_)) => Err(CredentialsError::MissingCredentials(
                "access_key not set in config".into(),
            )),
            (None, None) if config.use_env_credentials => Self::from_env().map(Some),
            (None, None) => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn s3_config(access: Option<&str>, secret: Option<&str>, use_env: bool) -> S3DriveConfig {
        S3DriveConfig {
            bucket: "test".into(),
            region: "us-east-1".into(),
            endpoint: None,
            access_key: access.map(String::from),
            secret_key: secret.map(String::from),
            use_env_credentials: use_env,
        }
    }

    #[test]
    fn test_credentials_with_session_token() {
        let creds = Credentials::with_session_token("access", "secret", "token");
        assert_eq!(creds.access_key_id(), "access");
        assert_eq!(creds.secret_access_key(), "secret");
        assert_eq!(creds.session_token(), Some("token"));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let creds = Credentials::new("access", "super-secret");
        let debug = format!("{:?}", creds);
        assert!(debug.contains("access"));
        assert!(!debug.contains("super-secret"));
    }

    #[test]
    fn test_from_config_success() {
        let creds = Credentials::from_config(&s3_config(Some("a"), Some("s"), false))
            .unwrap()
            .unwrap();
        assert_eq!(creds.access_key_id(), "a");
        assert_eq!(creds.secret_access_key(), "s");
    }

    #[test]
    fn test_from_config_missing_secret_key() {
        assert!(Credentials::from_config(&s3_config(Some("a"), None, false)).is_err());
    }

    #[test]
    fn test_from_config_anonymous() {
        assert!(Credentials::from_config(&s3_config(None, None, false))
            .unwrap()
            .is_none());
    }

    #[test]
    #[serial]
    fn test_from_config_env() {
        std::env::set_var("AWS_ACCESS_KEY_ID", "env-access");
        std::env::set_var("AWS_SECRET_ACCESS_KEY", "env-secret");
        std::env::remove_var("AWS_SESSION_TOKEN");

        let creds = Credentials::from_config(&s3_config(None, None, true))
            .unwrap()
            .unwrap();

        std::env::remove_var("AWS_ACCESS_KEY_ID");
        std::env::remove_var("AWS_SECRET_ACCESS_KEY");

        assert_eq!(creds.access_key_id(), "env-access");
        assert_eq!(creds.secret_access_key(), "env-secret");
        assert!(creds.session_token().is_none());
    }

    #[test]
    #[serial]
    fn test_from_env_missing() {
        std::env::remove_var("AWS_ACCESS_KEY_ID");
        assert!(matches!(
            Credentials::from_env(),
            Err(CredentialsError::MissingCredentials(_))
        ));
    }
}
