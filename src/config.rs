// Application configuration, loaded from environment variables and CLI flags.

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_RAIDERIO_BASE_URL: &str = "https://raider.io/api/v1";
pub const DEFAULT_WARCRAFTLOGS_TOKEN_URL: &str = "https://www.warcraftlogs.com/oauth/token";
pub const DEFAULT_WARCRAFTLOGS_API_URL: &str = "https://www.warcraftlogs.com/api/v2/client";
pub const DEFAULT_USER_AGENT: &str = "WoW-Tools/1.0 (https://eladser.github.io/wow-tools)";

/// Client-credentials pair for the WarcraftLogs API.
#[derive(Debug, Clone)]
pub struct WarcraftLogsCredentials {
    pub client_id: String,
    pub client_secret: String,
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Raider.IO REST base URL (no trailing slash).
    pub raiderio_base_url: String,
    /// WarcraftLogs credentials. `None` disables the combat-log endpoints.
    pub warcraftlogs: Option<WarcraftLogsCredentials>,
    pub warcraftlogs_token_url: String,
    pub warcraftlogs_api_url: String,
    /// User-Agent sent on every upstream request.
    pub user_agent: String,
    /// Max alt-candidate lookups in flight at once.
    pub warband_concurrency: usize,
    /// Per-candidate lookup timeout.
    pub warband_candidate_timeout: Duration,
    /// Overall timeout for a single upstream HTTP request.
    pub http_timeout: Duration,
    /// Directory containing pre-built frontend files to serve.
    /// When set, the backend serves static files from this path.
    pub static_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: 3000,
            raiderio_base_url: DEFAULT_RAIDERIO_BASE_URL.to_string(),
            warcraftlogs: None,
            warcraftlogs_token_url: DEFAULT_WARCRAFTLOGS_TOKEN_URL.to_string(),
            warcraftlogs_api_url: DEFAULT_WARCRAFTLOGS_API_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            warband_concurrency: 8,
            warband_candidate_timeout: Duration::from_secs(10),
            http_timeout: Duration::from_secs(30),
            static_dir: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables and CLI arguments.
    ///
    /// Environment variables:
    /// - `PORT` - HTTP server port (default: 3000)
    /// - `RAIDERIO_BASE_URL` - Raider.IO API root
    /// - `WARCRAFTLOGS_CLIENT_ID` / `WARCRAFTLOGS_CLIENT_SECRET` - both required to enable combat logs
    /// - `WARCRAFTLOGS_TOKEN_URL` / `WARCRAFTLOGS_API_URL` - endpoint overrides
    /// - `USER_AGENT` - User-Agent for upstream requests
    /// - `WARBAND_CONCURRENCY` - parallel alt lookups (default: 8)
    /// - `WARBAND_CANDIDATE_TIMEOUT_SECS` - per-candidate timeout (default: 10)
    /// - `HTTP_TIMEOUT_SECS` - upstream request timeout (default: 30)
    /// - `STATIC_DIR` - Path to frontend dist directory for static file serving
    ///
    /// CLI flags:
    /// - `--port <PORT>` - Override the port
    pub fn load() -> Self {
        let args: Vec<String> = std::env::args().collect();
        Self::from_sources(&args, |key| std::env::var(key).ok())
    }

    /// Build a config from explicit argv and an env lookup.
    pub fn from_sources<F>(args: &[String], env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        // Port: CLI flag --port takes precedence, then env var, then default
        let port = Self::parse_cli_value(args, "--port")
            .and_then(|v| v.parse().ok())
            .or_else(|| env("PORT").and_then(|v| v.parse().ok()))
            .unwrap_or(defaults.port);

        let raiderio_base_url = env("RAIDERIO_BASE_URL")
            .map(|v| v.trim_end_matches('/').to_string())
            .unwrap_or(defaults.raiderio_base_url);

        let warcraftlogs = match (
            env("WARCRAFTLOGS_CLIENT_ID").filter(|v| !v.is_empty()),
            env("WARCRAFTLOGS_CLIENT_SECRET").filter(|v| !v.is_empty()),
        ) {
            (Some(client_id), Some(client_secret)) => Some(WarcraftLogsCredentials {
                client_id,
                client_secret,
            }),
            _ => None,
        };

        let warcraftlogs_token_url =
            env("WARCRAFTLOGS_TOKEN_URL").unwrap_or(defaults.warcraftlogs_token_url);
        let warcraftlogs_api_url =
            env("WARCRAFTLOGS_API_URL").unwrap_or(defaults.warcraftlogs_api_url);
        let user_agent = env("USER_AGENT").unwrap_or(defaults.user_agent);

        let warband_concurrency = env("WARBAND_CONCURRENCY")
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(defaults.warband_concurrency);

        let warband_candidate_timeout = env("WARBAND_CANDIDATE_TIMEOUT_SECS")
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.warband_candidate_timeout);

        let http_timeout = env("HTTP_TIMEOUT_SECS")
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.http_timeout);

        let static_dir = env("STATIC_DIR").map(PathBuf::from);

        Config {
            port,
            raiderio_base_url,
            warcraftlogs,
            warcraftlogs_token_url,
            warcraftlogs_api_url,
            user_agent,
            warband_concurrency,
            warband_candidate_timeout,
            http_timeout,
            static_dir,
        }
    }

    /// Parse a CLI flag value like `--port 8080`.
    fn parse_cli_value(args: &[String], flag: &str) -> Option<String> {
        args.windows(2).find_map(|pair| {
            if pair[0] == flag {
                Some(pair[1].clone())
            } else {
                None
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_env() {
        let config = Config::from_sources(&[], env_from(&[]));
        assert_eq!(config.port, 3000);
        assert_eq!(config.raiderio_base_url, DEFAULT_RAIDERIO_BASE_URL);
        assert!(config.warcraftlogs.is_none());
        assert_eq!(config.warband_concurrency, 8);
        assert_eq!(config.warband_candidate_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_cli_port_overrides_env() {
        let args = vec!["bin".to_string(), "--port".to_string(), "8080".to_string()];
        let config = Config::from_sources(&args, env_from(&[("PORT", "9000")]));
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_warcraftlogs_requires_both_credentials() {
        let config = Config::from_sources(&[], env_from(&[("WARCRAFTLOGS_CLIENT_ID", "id")]));
        assert!(config.warcraftlogs.is_none());

        let config = Config::from_sources(
            &[],
            env_from(&[
                ("WARCRAFTLOGS_CLIENT_ID", "id"),
                ("WARCRAFTLOGS_CLIENT_SECRET", "secret"),
            ]),
        );
        let creds = config.warcraftlogs.unwrap();
        assert_eq!(creds.client_id, "id");
        assert_eq!(creds.client_secret, "secret");
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let config = Config::from_sources(
            &[],
            env_from(&[("RAIDERIO_BASE_URL", "http://localhost:9999/api/v1/")]),
        );
        assert_eq!(config.raiderio_base_url, "http://localhost:9999/api/v1");
    }

    #[test]
    fn test_zero_concurrency_falls_back() {
        let config = Config::from_sources(&[], env_from(&[("WARBAND_CONCURRENCY", "0")]));
        assert_eq!(config.warband_concurrency, 8);
    }
}
