use clap::Parser;
use std::time::Duration;

use crate::error::ConfigError;
use crate::rate_limit::MAX_WINDOW;

// CLI argument structure
#[derive(Parser, Debug, Clone)]
#[command(name = "demo-api-server")]
#[command(about = "Demo API server with rate limiting and request analytics")]
pub struct Args {
    // Port to run the server on
    #[arg(short, long, default_value_t = 3000)]
    pub port: u16,

    // Reported in the banner and health check
    #[arg(short, long, default_value = "development")]
    pub environment: String,

    // Rate limit window in milliseconds
    #[arg(long, default_value_t = 60_000)]
    pub rate_window_ms: u64,

    // Rate limit max requests per window
    #[arg(long, default_value_t = 100)]
    pub rate_limit: u32,

    // Message sent back with a 429
    #[arg(long, default_value = "Too many requests, please try again later")]
    pub rate_limit_message: String,

    // How many request records analytics keeps
    #[arg(long, default_value_t = 1000)]
    pub log_capacity: usize,

    // Requests slower than this are logged as warnings
    #[arg(long, default_value_t = 1000)]
    pub slow_request_ms: u64,
}

/// Settings for the request-accounting subsystem, fixed at construction.
#[derive(Debug, Clone)]
pub struct AccountingConfig {
    pub window: Duration,
    pub max_requests: u32,
    pub rejection_message: String,
    pub log_capacity: usize,
    pub slow_request_threshold: Duration,
}

impl Default for AccountingConfig {
    fn default() -> Self {
        Self {
            window: Duration::from_millis(60_000),
            max_requests: 100,
            rejection_message: "Too many requests, please try again later".to_string(),
            log_capacity: 1000,
            slow_request_threshold: Duration::from_millis(1000),
        }
    }
}

impl AccountingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window.is_zero() {
            return Err(ConfigError::ZeroWindow);
        }
        if self.window > MAX_WINDOW {
            return Err(ConfigError::WindowTooLarge);
        }
        if self.max_requests == 0 {
            return Err(ConfigError::ZeroLimit);
        }
        if self.log_capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        Ok(())
    }
}

impl TryFrom<&Args> for AccountingConfig {
    type Error = ConfigError;

    fn try_from(args: &Args) -> Result<Self, Self::Error> {
        let config = Self {
            window: Duration::from_millis(args.rate_window_ms),
            max_requests: args.rate_limit,
            rejection_message: args.rate_limit_message.clone(),
            log_capacity: args.log_capacity,
            slow_request_threshold: Duration::from_millis(args.slow_request_ms),
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_parse_and_validate() {
        let args = Args::parse_from(["demo-api-server"]);
        let config = AccountingConfig::try_from(&args).unwrap();
        assert_eq!(config.window, Duration::from_secs(60));
        assert_eq!(config.max_requests, 100);
        assert_eq!(config.log_capacity, 1000);
        assert_eq!(config.slow_request_threshold, Duration::from_secs(1));
    }

    #[test]
    fn zero_window_is_rejected() {
        let args = Args::parse_from(["demo-api-server", "--rate-window-ms", "0"]);
        assert!(matches!(
            AccountingConfig::try_from(&args),
            Err(ConfigError::ZeroWindow)
        ));
    }

    #[test]
    fn huge_window_is_rejected() {
        let args = Args::parse_from([
            "demo-api-server",
            "--rate-window-ms",
            "10000000000000000",
        ]);
        assert!(matches!(
            AccountingConfig::try_from(&args),
            Err(ConfigError::WindowTooLarge)
        ));
    }

    #[test]
    fn zero_limit_is_rejected() {
        let args = Args::parse_from(["demo-api-server", "--rate-limit", "0"]);
        assert!(matches!(
            AccountingConfig::try_from(&args),
            Err(ConfigError::ZeroLimit)
        ));
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let config = AccountingConfig {
            log_capacity: 0,
            ..AccountingConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::ZeroCapacity)));
    }
}
