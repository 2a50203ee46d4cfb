use crate::config::ServiceConfig;
use crate::utils::error::{LinkError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Optional file layer; every key may be omitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TomlConfig {
    pub server: ServerSection,
    pub limits: LimitsSection,
    pub fetch: FetchSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerSection {
    pub port: Option<u16>,
    pub shutdown_timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LimitsSection {
    pub max_count_urls: Option<usize>,
    pub max_requests: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FetchSection {
    pub max_outcome_requests: Option<usize>,
    pub timeout_seconds: Option<u64>,
}

impl TomlConfig {
    /// Loads the configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = Self::substitute_env_vars(content)?;

        toml::from_str(&processed).map_err(|e| LinkError::ConfigParse {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` references (e.g. `${MAX_REQUESTS}`) with the environment
    /// value; unset variables stay as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| LinkError::ConfigParse {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.into_owned())
    }

    /// Overlays the keys present in the file onto `config`.
    pub fn apply_to(&self, config: &mut ServiceConfig) {
        if let Some(port) = self.server.port {
            config.port = port;
        }
        if let Some(secs) = self.server.shutdown_timeout_seconds {
            config.shutdown_timeout = secs;
        }
        if let Some(n) = self.limits.max_count_urls {
            config.max_count_urls = n;
        }
        if let Some(n) = self.limits.max_requests {
            config.max_requests = n;
        }
        if let Some(n) = self.fetch.max_outcome_requests {
            config.max_outcome_requests = n;
        }
        if let Some(secs) = self.fetch.timeout_seconds {
            config.max_outcome_timeout = secs;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_file_overrides_only_given_keys() {
        let config = TomlConfig::from_toml_str(
            r#"
[limits]
max_requests = 7

[fetch]
timeout_seconds = 3
"#,
        )
        .unwrap();

        let mut resolved = ServiceConfig::default();
        config.apply_to(&mut resolved);

        assert_eq!(resolved.max_requests, 7);
        assert_eq!(resolved.max_outcome_timeout, 3);
        assert_eq!(resolved.port, 8080);
        assert_eq!(resolved.max_outcome_requests, 4);
    }

    #[test]
    fn test_env_substitution() {
        std::env::set_var("LINKFETCH_TEST_WORKERS", "9");
        let config = TomlConfig::from_toml_str(
            r#"
[fetch]
max_outcome_requests = ${LINKFETCH_TEST_WORKERS}
"#,
        )
        .unwrap();

        assert_eq!(config.fetch.max_outcome_requests, Some(9));
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let err = TomlConfig::from_toml_str("[limits]\nmax_urls = 3\n").unwrap_err();
        assert!(matches!(err, LinkError::ConfigParse { .. }));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nport = 9090\nshutdown_timeout_seconds = 2").unwrap();

        let config = TomlConfig::from_file(file.path()).unwrap();

        assert_eq!(config.server.port, Some(9090));
        assert_eq!(config.server.shutdown_timeout_seconds, Some(2));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = TomlConfig::from_file("/nonexistent/linkfetch.toml").unwrap_err();
        assert!(matches!(err, LinkError::Io(_)));
    }
}
