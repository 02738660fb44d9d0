use std::env;
use std::time::Duration;

use tripwise_catalog::CatalogConfig;

const DEFAULT_ALLOWED_ORIGINS: [&str; 4] = [
    "http://localhost:5500",
    "http://127.0.0.1:5500",
    "http://localhost:3000",
    "http://127.0.0.1:3000",
];

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind: String,
    pub allowed_origins: Vec<String>,
    pub rate_limit_window: Duration,
    pub rate_limit_max: usize,
    pub body_limit_bytes: usize,
    pub catalog: CatalogConfig,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8000".to_string(),
            allowed_origins: DEFAULT_ALLOWED_ORIGINS
                .iter()
                .map(ToString::to_string)
                .collect(),
            rate_limit_window: Duration::from_secs(60),
            rate_limit_max: 120,
            body_limit_bytes: 64 * 1024,
            catalog: CatalogConfig::default(),
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let bind = env::var("TRIPWISE_BIND").unwrap_or(defaults.bind);
        let allowed_origins = env::var("TRIPWISE_ALLOWED_ORIGINS")
            .ok()
            .map(|value| parse_origins(&value))
            .unwrap_or(defaults.allowed_origins);
        let rate_limit_window = env::var("TRIPWISE_RATE_LIMIT_WINDOW_SECONDS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.rate_limit_window);
        let rate_limit_max = env::var("TRIPWISE_RATE_LIMIT_MAX")
            .ok()
            .and_then(|value| value.parse::<usize>().ok())
            .unwrap_or(defaults.rate_limit_max);

        Self {
            bind,
            allowed_origins,
            rate_limit_window,
            rate_limit_max,
            body_limit_bytes: defaults.body_limit_bytes,
            catalog: CatalogConfig::from_env(),
        }
    }
}

fn parse_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|origin| origin.trim().trim_end_matches('/').to_string())
        .filter(|origin| !origin.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origins_are_trimmed() {
        let origins = parse_origins(" https://a.example/ ,, http://b.example");
        assert_eq!(origins, vec!["https://a.example", "http://b.example"]);
    }
}
