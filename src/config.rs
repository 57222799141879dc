//! Application configuration loaded from environment variables.
//!
//! A `.env` file in the working directory is honored for local development.

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Which collaborators back the app.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// In-process store and auth; nothing leaves the machine
    Memory,
    /// Cloud Firestore and Firebase Authentication
    Firestore,
}

impl FromStr for Backend {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "firestore" | "firebase" => Ok(Self::Firestore),
            _ => Err(ConfigError::Invalid {
                name: "GORIDE_BACKEND",
                value: value.to_string(),
            }),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Memory => "memory",
            Self::Firestore => "firestore",
        })
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Collaborator backend
    pub backend: Backend,
    /// GCP project ID (Firestore)
    pub gcp_project_id: String,
    /// Firebase Web API key (required for the Firestore backend)
    pub firebase_api_key: Option<String>,
    /// How long the splash screen stays up
    pub splash_delay: Duration,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            backend: Backend::Memory,
            gcp_project_id: "local-dev".to_string(),
            firebase_api_key: None,
            splash_delay: Duration::ZERO,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Load configuration through a variable lookup function.
    pub fn from_vars<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend = match var("GORIDE_BACKEND") {
            Some(value) => value.parse()?,
            None => Backend::Memory,
        };

        let firebase_api_key = var("FIREBASE_API_KEY")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        if backend == Backend::Firestore && firebase_api_key.is_none() {
            return Err(ConfigError::Missing("FIREBASE_API_KEY"));
        }

        let splash_delay = match var("GORIDE_SPLASH_MS") {
            Some(value) => value
                .trim()
                .parse()
                .map(Duration::from_millis)
                .map_err(|_| ConfigError::Invalid {
                    name: "GORIDE_SPLASH_MS",
                    value,
                })?,
            None => Duration::from_millis(2000),
        };

        Ok(Self {
            backend,
            gcp_project_id: var("GCP_PROJECT_ID").unwrap_or_else(|| "local-dev".to_string()),
            firebase_api_key,
            splash_delay,
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_vars(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).expect("Config should load");
        assert_eq!(config.backend, Backend::Memory);
        assert_eq!(config.gcp_project_id, "local-dev");
        assert_eq!(config.splash_delay, Duration::from_millis(2000));
    }

    #[test]
    fn test_firestore_requires_api_key() {
        let err = load(&[("GORIDE_BACKEND", "firestore")]).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("FIREBASE_API_KEY")));

        let config = load(&[
            ("GORIDE_BACKEND", "Firestore"),
            ("FIREBASE_API_KEY", " abc "),
            ("GCP_PROJECT_ID", "goride-prod"),
        ])
        .expect("Config should load");
        assert_eq!(config.backend, Backend::Firestore);
        assert_eq!(config.firebase_api_key.as_deref(), Some("abc"));
        assert_eq!(config.gcp_project_id, "goride-prod");
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            load(&[("GORIDE_BACKEND", "postgres")]),
            Err(ConfigError::Invalid { name: "GORIDE_BACKEND", .. })
        ));
        assert!(matches!(
            load(&[("GORIDE_SPLASH_MS", "soon")]),
            Err(ConfigError::Invalid { name: "GORIDE_SPLASH_MS", .. })
        ));
    }

    #[test]
    fn test_config_from_env() {
        env::set_var("GORIDE_SPLASH_MS", "0");
        let config = Config::from_env().expect("Config should load");
        assert_eq!(config.splash_delay, Duration::ZERO);
    }
}
