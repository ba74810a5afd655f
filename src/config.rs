use std::{env, time::Duration};

use thiserror::Error;

pub const DEFAULT_WB_API_URL: &str = "https://api.worldbank.org/v2";

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(String),

    #[error("invalid value '{value}' for {var}: {reason}")]
    Invalid {
        var: String,
        value: String,
        reason: String,
    },

    #[error("unknown backend '{0}', expected 'duckdb' or 'mongodb'")]
    UnknownBackend(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MongoConfig {
    pub host: String,
    pub port: u16,
    pub user: Option<String>,
    pub password: Option<String>,
    pub database: String,
    pub collection: String,
}

/// Where the final rows go.
#[derive(Debug, Clone, PartialEq)]
pub enum Backend {
    DuckDb { path: String },
    MongoDb(MongoConfig),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProviderConfig {
    pub base_url: String,
    pub max_attempts: u32,
    pub timeout: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig {
            base_url: DEFAULT_WB_API_URL.to_string(),
            max_attempts: 3,
            timeout: Duration::from_secs(60),
        }
    }
}

/// Everything the job needs from the environment, validated once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub backend: Backend,
    pub provider: ProviderConfig,
}

impl Config {
    pub fn from_env() -> Result<Config, ConfigError> {
        Config::from_lookup(|var| env::var(var).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.  Empty
    /// values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Config, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());
        let require = |var: &str| get(var).ok_or_else(|| ConfigError::Missing(var.to_string()));

        let backend = match get("DATABANK_BACKEND")
            .unwrap_or_else(|| "duckdb".to_string())
            .to_lowercase()
            .as_str()
        {
            "duckdb" => Backend::DuckDb {
                path: require("DATABANK_DUCKDB_PATH")?,
            },
            "mongodb" => {
                let user = get("MONGODB_USER");
                let password = get("MONGODB_PASSWORD");
                if user.is_some() != password.is_some() {
                    let var = if user.is_some() {
                        "MONGODB_PASSWORD"
                    } else {
                        "MONGODB_USER"
                    };
                    return Err(ConfigError::Missing(var.to_string()));
                }
                Backend::MongoDb(MongoConfig {
                    host: require("MONGODB_HOST")?,
                    port: parse_var("MONGODB_PORT", &require("MONGODB_PORT")?)?,
                    user,
                    password,
                    database: get("MONGODB_DATABASE")
                        .unwrap_or_else(|| "global-index".to_string()),
                    collection: get("MONGODB_COLLECTION")
                        .unwrap_or_else(|| "countries".to_string()),
                })
            }
            other => return Err(ConfigError::UnknownBackend(other.to_string())),
        };

        let mut provider = ProviderConfig::default();
        if let Some(url) = get("WB_API_URL") {
            provider.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(value) = get("WB_MAX_ATTEMPTS") {
            provider.max_attempts = parse_var("WB_MAX_ATTEMPTS", &value)?;
            if provider.max_attempts == 0 {
                return Err(ConfigError::Invalid {
                    var: "WB_MAX_ATTEMPTS".to_string(),
                    value,
                    reason: "must be at least 1".to_string(),
                });
            }
        }
        if let Some(value) = get("WB_TIMEOUT_SECS") {
            provider.timeout = Duration::from_secs(parse_var("WB_TIMEOUT_SECS", &value)?);
        }

        Ok(Config { backend, provider })
    }
}

fn parse_var<T>(var: &str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
        var: var.to_string(),
        value: value.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn duckdb_is_the_default_backend() {
        let vars = [("DATABANK_DUCKDB_PATH", "/tmp/databank.duckdb")];
        let config = Config::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(
            config.backend,
            Backend::DuckDb {
                path: "/tmp/databank.duckdb".to_string()
            }
        );
        assert_eq!(config.provider, ProviderConfig::default());
    }

    #[test]
    fn missing_duckdb_path_is_fatal() {
        let err = Config::from_lookup(lookup(&[("DATABANK_DUCKDB_PATH", "  ")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("DATABANK_DUCKDB_PATH".to_string()));
    }

    #[test]
    fn mongodb_backend() {
        let config = Config::from_lookup(lookup(&[
            ("DATABANK_BACKEND", "MongoDB"),
            ("MONGODB_HOST", "localhost"),
            ("MONGODB_PORT", "27017"),
            ("WB_API_URL", "http://localhost:8080/v2/"),
            ("WB_MAX_ATTEMPTS", "5"),
        ]))
        .unwrap();
        match config.backend {
            Backend::MongoDb(mongo) => {
                assert_eq!(mongo.port, 27017);
                assert_eq!(mongo.database, "global-index");
                assert_eq!(mongo.collection, "countries");
                assert!(mongo.user.is_none());
            }
            _ => panic!("expected the mongodb backend"),
        }
        assert_eq!(config.provider.base_url, "http://localhost:8080/v2");
        assert_eq!(config.provider.max_attempts, 5);
    }

    #[test]
    fn bad_port_and_half_credentials_are_rejected() {
        let err = Config::from_lookup(lookup(&[
            ("DATABANK_BACKEND", "mongodb"),
            ("MONGODB_HOST", "localhost"),
            ("MONGODB_PORT", "not-a-port"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "MONGODB_PORT"));

        let err = Config::from_lookup(lookup(&[
            ("DATABANK_BACKEND", "mongodb"),
            ("MONGODB_HOST", "localhost"),
            ("MONGODB_PORT", "27017"),
            ("MONGODB_USER", "etl"),
        ]))
        .unwrap_err();
        assert_eq!(err, ConfigError::Missing("MONGODB_PASSWORD".to_string()));
    }

    #[test]
    fn unknown_backend_and_zero_attempts() {
        let err = Config::from_lookup(lookup(&[("DATABANK_BACKEND", "sqlite")])).unwrap_err();
        assert_eq!(err, ConfigError::UnknownBackend("sqlite".to_string()));

        let err = Config::from_lookup(lookup(&[
            ("DATABANK_DUCKDB_PATH", "/tmp/x.duckdb"),
            ("WB_MAX_ATTEMPTS", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }
}
