use super::*;

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            file: "/tmp/eess_prices.log".to_string(),
            backup_count: 5,
            console_output: true,
            json_format: false,
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            base_url: crate::upstream::DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
            user_agent: format!("eess-prices/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: crate::poller::DEFAULT_POLL_INTERVAL.as_secs(),
        }
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "127.0.0.1".to_string(),
            port: 8089,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            http: HttpConfig::default(),
            poll: PollConfig::default(),
            web: WebConfig::default(),
            timezone: "Europe/Madrid".to_string(),
            sensors: Vec::new(),
        }
    }
}
