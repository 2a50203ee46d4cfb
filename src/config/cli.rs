use crate::config::{ServiceConfig, TomlConfig};
use crate::utils::error::Result;
use crate::utils::validation::Validate;
use clap::Parser;

/// Flags left unset fall back to the config file, then to built-in defaults.
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "linkfetch")]
#[command(about = "HTTP service that fetches a batch of URLs concurrently")]
pub struct CliArgs {
    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// HTTP port [default: 8080]
    #[arg(long)]
    pub port: Option<u16>,

    /// Max URLs per request [default: 20]
    #[arg(long)]
    pub max_count_urls: Option<usize>,

    /// Max concurrently served requests [default: 100]
    #[arg(long)]
    pub max_requests: Option<usize>,

    /// Concurrent outgoing fetches per request [default: 4]
    #[arg(long)]
    pub max_outcome_requests: Option<usize>,

    /// Per-fetch timeout in seconds [default: 1]
    #[arg(long)]
    pub max_outcome_timeout: Option<u64>,

    /// Graceful shutdown limit in seconds [default: 10]
    #[arg(long)]
    pub shutdown_timeout: Option<u64>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,
}

impl CliArgs {
    /// Defaults, then the config file, then explicit flags; validated.
    pub fn resolve(&self) -> Result<ServiceConfig> {
        let mut config = ServiceConfig::default();

        if let Some(path) = &self.config {
            tracing::info!("Loading configuration from: {}", path);
            TomlConfig::from_file(path)?.apply_to(&mut config);
        }
        self.apply_to(&mut config);

        config.validate()?;
        Ok(config)
    }

    fn apply_to(&self, config: &mut ServiceConfig) {
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(n) = self.max_count_urls {
            config.max_count_urls = n;
        }
        if let Some(n) = self.max_requests {
            config.max_requests = n;
        }
        if let Some(n) = self.max_outcome_requests {
            config.max_outcome_requests = n;
        }
        if let Some(secs) = self.max_outcome_timeout {
            config.max_outcome_timeout = secs;
        }
        if let Some(secs) = self.shutdown_timeout {
            config.shutdown_timeout = secs;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_no_flags_gives_defaults() {
        let args = CliArgs::parse_from(["linkfetch"]);
        assert_eq!(args.resolve().unwrap(), ServiceConfig::default());
    }

    #[test]
    fn test_flags_override_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[limits]\nmax_requests = 5\nmax_count_urls = 3").unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let args = CliArgs::parse_from([
            "linkfetch",
            "--config",
            path.as_str(),
            "--max-requests",
            "50",
        ]);
        let config = args.resolve().unwrap();

        assert_eq!(config.max_requests, 50);
        assert_eq!(config.max_count_urls, 3);
    }

    #[test]
    fn test_invalid_flag_value_fails_validation() {
        let args = CliArgs::parse_from(["linkfetch", "--max-outcome-timeout", "0"]);
        assert!(args.resolve().is_err());
    }
}
