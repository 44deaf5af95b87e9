use std::env;
use log::warn;

// Server Configuration
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;
pub const HEARTBEAT_INTERVAL_SECS: u64 = 15;
pub const STATS_INTERVAL_SECS: u64 = 60;

// Ticker Configuration
pub const DEFAULT_TICKERS: &str = "THYAO.IS,ASELS.IS,GARAN.IS,SISE.IS";

// Broadcast Configuration
pub const CLIENT_CHANNEL_SIZE: usize = 100;

// Fetch Configuration
pub const FETCH_TIMEOUT_SECS: u64 = 10;

pub struct Config {
    pub port: u16,
    pub tickers: Vec<String>,
    pub poll_interval_secs: u64,
    pub log_level: String,
}

/// Splits a comma-separated ticker list, dropping blanks and duplicates
/// while preserving first-occurrence order.
pub fn parse_ticker_list(raw: &str) -> Vec<String> {
    let mut tickers: Vec<String> = Vec::new();
    for part in raw.split(',') {
        let symbol = part.trim().to_uppercase();
        if !symbol.is_empty() && !tickers.contains(&symbol) {
            tickers.push(symbol);
        }
    }
    tickers
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| match v.parse() {
                    Ok(port) => Some(port),
                    Err(_) => {
                        warn!("Invalid PORT value '{}', using default {}", v, DEFAULT_PORT);
                        None
                    }
                })
                .unwrap_or(DEFAULT_PORT),
            tickers: parse_ticker_list(
                &env::var("TICKERS").unwrap_or_else(|_| DEFAULT_TICKERS.to_string()),
            ),
            poll_interval_secs: env::var("POLL_INTERVAL_SECS")
                .ok()
                .and_then(|v| match v.parse() {
                    Ok(secs) => Some(secs),
                    Err(_) => {
                        warn!(
                            "Invalid POLL_INTERVAL_SECS value '{}', using default {}",
                            v, DEFAULT_POLL_INTERVAL_SECS
                        );
                        None
                    }
                })
                .unwrap_or(DEFAULT_POLL_INTERVAL_SECS),
            log_level: env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.tickers.is_empty() {
            return Err("Ticker list is empty - set TICKERS to at least one symbol".to_string());
        }

        if self.poll_interval_secs == 0 {
            return Err("POLL_INTERVAL_SECS must be at least 1".to_string());
        }

        Ok(())
    }

    pub fn log_config(&self) {
        println!("Server Configuration:");
        println!("  Port: {}", self.port);
        println!("  Tickers: {}", self.tickers.join(","));
        println!("  Poll Interval: {}s", self.poll_interval_secs);
        println!("  Log Level: {}", self.log_level);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        let config = Config::from_env();
        assert!(config.port > 0);
        assert!(!config.tickers.is_empty());
        assert!(config.poll_interval_secs > 0);
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::from_env();
        config.tickers.clear();
        assert!(config.validate().is_err());

        config.tickers = parse_ticker_list(DEFAULT_TICKERS);
        config.poll_interval_secs = 0;
        assert!(config.validate().is_err());

        config.poll_interval_secs = 30;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_ticker_list() {
        assert_eq!(
            parse_ticker_list(" thyao.is, ASELS.IS ,,GARAN.IS"),
            vec!["THYAO.IS", "ASELS.IS", "GARAN.IS"]
        );
        assert_eq!(parse_ticker_list("AAPL,aapl,AAPL"), vec!["AAPL"]);
        assert!(parse_ticker_list(" , ,").is_empty());
        assert!(parse_ticker_list("").is_empty());
    }
}
