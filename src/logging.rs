use tracing_subscriber::{
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

pub const LOG_LEVEL_ENV: &str = "GERMANKI_LOG_LEVEL";
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_LEVEL)
    }
}

impl LogConfig {
    pub fn new(level: impl Into<String>) -> Self {
        Self { level: level.into() }
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        lookup(LOG_LEVEL_ENV)
            .filter(|level| !level.trim().is_empty())
            .map(Self::new)
            .unwrap_or_default()
    }

    /// Bare levels apply to this crate only; anything else is taken as a
    /// full filter directive.
    pub fn directive(&self) -> String {
        let level = self.level.trim().to_lowercase();
        match level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => format!("germanki={level},warn"),
            _ => self.level.trim().to_string(),
        }
    }

    pub fn filter(&self) -> EnvFilter {
        EnvFilter::try_new(self.directive())
            .unwrap_or_else(|_| EnvFilter::new(format!("germanki={DEFAULT_LOG_LEVEL},warn")))
    }
}

/// Installs the global subscriber. Call once at process start.
pub fn init_logging(config: &LogConfig) {
    let result = tracing_subscriber::registry()
        .with(config.filter())
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .try_init();

    if let Err(e) = result {
        eprintln!("Logging already initialized: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_from_env() {
        let config = LogConfig::from_lookup(|_| Some("debug".to_string()));
        assert_eq!(config.level, "debug");
        assert_eq!(config.directive(), "germanki=debug,warn");

        let fallback = LogConfig::from_lookup(|_| Some("  ".to_string()));
        assert_eq!(fallback.level, DEFAULT_LOG_LEVEL);
    }

    #[test]
    fn test_directive_passthrough() {
        let config = LogConfig::new("germanki::media=trace");
        assert_eq!(config.directive(), "germanki::media=trace");
    }
}
