/// Default base URL of the generation service.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";
/// Default origin that returned media paths are resolved against.
pub const DEFAULT_MEDIA_ORIGIN: &str = "http://127.0.0.1:8000";
/// Default per-request HTTP timeout. Generations can take minutes.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;

/// Where the generation service lives and how long to wait for it.
///
/// All fields have defaults matching a service running locally on port
/// 8000. Override via environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Base URL for every endpoint (default: `http://localhost:8000`).
    pub api_url: String,
    /// Origin prepended to returned media paths
    /// (default: `http://127.0.0.1:8000`).
    pub media_origin: String,
    /// HTTP request timeout in seconds (default: `300`).
    pub request_timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.into(),
            media_origin: DEFAULT_MEDIA_ORIGIN.into(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl ServiceConfig {
    /// Load a `.env` file if one exists, then read the environment.
    pub fn load() -> Self {
        dotenvy::dotenv().ok();
        Self::from_env()
    }

    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                          | Default                  |
    /// |----------------------------------|--------------------------|
    /// | `GENSTUDIO_API_URL`              | `http://localhost:8000`  |
    /// | `GENSTUDIO_MEDIA_ORIGIN`         | `http://127.0.0.1:8000`  |
    /// | `GENSTUDIO_REQUEST_TIMEOUT_SECS` | `300`                    |
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    ///
    /// Blank values count as unset; an unparseable timeout falls back to
    /// the default.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let api_url = get("GENSTUDIO_API_URL").unwrap_or_else(|| DEFAULT_API_URL.into());
        let media_origin =
            get("GENSTUDIO_MEDIA_ORIGIN").unwrap_or_else(|| DEFAULT_MEDIA_ORIGIN.into());

        let request_timeout_secs = match get("GENSTUDIO_REQUEST_TIMEOUT_SECS") {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!(
                    value = %raw,
                    "GENSTUDIO_REQUEST_TIMEOUT_SECS is not a valid u64, using default",
                );
                DEFAULT_REQUEST_TIMEOUT_SECS
            }),
            None => DEFAULT_REQUEST_TIMEOUT_SECS,
        };

        Self {
            api_url,
            media_origin,
            request_timeout_secs,
        }
    }

    /// Configuration pointing both the API and media at one origin.
    pub fn for_origin(origin: impl Into<String>) -> Self {
        let origin = origin.into();
        Self {
            api_url: origin.clone(),
            media_origin: origin,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = ServiceConfig::from_lookup(lookup(&[]));
        assert_eq!(config, ServiceConfig::default());
        assert_eq!(config.api_url, "http://localhost:8000");
        assert_eq!(config.media_origin, "http://127.0.0.1:8000");
    }

    #[test]
    fn overrides_are_applied() {
        let config = ServiceConfig::from_lookup(lookup(&[
            ("GENSTUDIO_API_URL", "https://gen.example.com"),
            ("GENSTUDIO_MEDIA_ORIGIN", "https://media.example.com"),
            ("GENSTUDIO_REQUEST_TIMEOUT_SECS", "45"),
        ]));
        assert_eq!(config.api_url, "https://gen.example.com");
        assert_eq!(config.media_origin, "https://media.example.com");
        assert_eq!(config.request_timeout_secs, 45);
    }

    #[test]
    fn blank_and_invalid_values_fall_back() {
        let config = ServiceConfig::from_lookup(lookup(&[
            ("GENSTUDIO_API_URL", "   "),
            ("GENSTUDIO_REQUEST_TIMEOUT_SECS", "soon"),
        ]));
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.request_timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
    }

    #[test]
    fn single_origin() {
        let config = ServiceConfig::for_origin("http://10.0.0.5:9000");
        assert_eq!(config.api_url, "http://10.0.0.5:9000");
        assert_eq!(config.media_origin, "http://10.0.0.5:9000");
    }
}
