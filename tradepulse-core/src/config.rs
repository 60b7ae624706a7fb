//! Runtime configuration with environment variable overrides.

/// Pipeline configuration.
///
/// Every field has a compiled default and can be overridden via the
/// environment variable named in its doc comment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Rolling price window capacity (`WINDOW_SIZE`)
    pub window_size: usize,
    /// Z-score threshold for PUMP / DUMP classification (`SIGMA_THRESHOLD`)
    pub sigma_threshold: f64,
    /// Quote-notional volume at or above which a trade is a whale (`WHALE_THRESHOLD`)
    pub whale_threshold: f64,
    /// Fixed trade size applied to every ledger execution (`TRADE_AMOUNT`)
    pub trade_amount: f64,
    /// Per-subscriber snapshot buffer capacity (`SUBSCRIBER_BUFFER`)
    pub subscriber_buffer: usize,
    /// Starting USD balance of the paper portfolio (`STARTING_USD`)
    pub starting_usd: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            window_size: 100,
            sigma_threshold: 2.0,
            whale_threshold: 50_000.0,
            trade_amount: 0.1,
            subscriber_buffer: 256,
            starting_usd: 100_000.0,
        }
    }
}

impl Config {
    /// Build a configuration from the environment, falling back to defaults
    /// for anything unset or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            window_size: env_parse("WINDOW_SIZE", defaults.window_size),
            sigma_threshold: env_parse("SIGMA_THRESHOLD", defaults.sigma_threshold),
            whale_threshold: env_parse("WHALE_THRESHOLD", defaults.whale_threshold),
            trade_amount: env_parse("TRADE_AMOUNT", defaults.trade_amount),
            subscriber_buffer: env_parse("SUBSCRIBER_BUFFER", defaults.subscriber_buffer),
            starting_usd: env_parse("STARTING_USD", defaults.starting_usd),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
