use std::env;

pub const DEFAULT_API_URL: &str = "https://api.docbase.io";
pub const DEFAULT_API_VERSION: &str = "2";

/// Runtime configuration for the DocBase API client.
/// Values are sourced from environment variables with sensible defaults.
#[derive(Clone)]
pub struct Config {
    pub token: String,
    pub domain: String,
    pub api_url: String,
    pub api_version: String,
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("token", &"<redacted>")
            .field("domain", &self.domain)
            .field("api_url", &self.api_url)
            .field("api_version", &self.api_version)
            .field("user_agent", &self.user_agent)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

pub fn default_user_agent() -> String {
    format!("docbase-rs/{}", env!("CARGO_PKG_VERSION"))
}

impl Config {
    /// Load configuration from environment.
    ///
    /// Env vars:
    /// - DOCBASE_TOKEN [required]
    /// - DOCBASE_DOMAIN [required]
    /// - DOCBASE_API_URL (default: https://api.docbase.io)
    /// - DOCBASE_API_VERSION (default: 2)
    /// - DOCBASE_HTTP_TIMEOUT_SECS (default: 30)
    /// - DOCBASE_USER_AGENT (default: docbase-rs/<version>)
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let token = get("DOCBASE_TOKEN")
            .filter(|s| !s.is_empty())
            .ok_or_else(|| "Missing DOCBASE_TOKEN".to_string())?;
        let domain = get("DOCBASE_DOMAIN")
            .filter(|s| !s.is_empty())
            .ok_or_else(|| "Missing DOCBASE_DOMAIN".to_string())?;
        let api_url = get("DOCBASE_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let api_version =
            get("DOCBASE_API_VERSION").unwrap_or_else(|| DEFAULT_API_VERSION.to_string());
        let timeout_secs = get("DOCBASE_HTTP_TIMEOUT_SECS")
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(30);
        let user_agent = get("DOCBASE_USER_AGENT").unwrap_or_else(default_user_agent);

        Ok(Self {
            token,
            domain,
            api_url,
            api_version,
            user_agent,
            timeout_secs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_apply() {
        let cfg = load(&[("DOCBASE_TOKEN", "t"), ("DOCBASE_DOMAIN", "kyoh86")]).unwrap();
        assert_eq!(cfg.api_url, DEFAULT_API_URL);
        assert_eq!(cfg.api_version, "2");
        assert_eq!(cfg.timeout_secs, 30);
        assert!(cfg.user_agent.starts_with("docbase-rs/"));
    }

    #[test]
    fn token_and_domain_are_required() {
        assert!(load(&[("DOCBASE_DOMAIN", "kyoh86")]).is_err());
        assert!(load(&[("DOCBASE_TOKEN", "t")]).is_err());
        assert!(load(&[("DOCBASE_TOKEN", ""), ("DOCBASE_DOMAIN", "kyoh86")]).is_err());
    }

    #[test]
    fn overrides_and_bad_timeout() {
        let cfg = load(&[
            ("DOCBASE_TOKEN", "t"),
            ("DOCBASE_DOMAIN", "kyoh86"),
            ("DOCBASE_API_URL", "http://127.0.0.1:9999"),
            ("DOCBASE_HTTP_TIMEOUT_SECS", "soon"),
            ("DOCBASE_USER_AGENT", "custom"),
        ])
        .unwrap();
        assert_eq!(cfg.api_url, "http://127.0.0.1:9999");
        assert_eq!(cfg.timeout_secs, 30);
        assert_eq!(cfg.user_agent, "custom");
        assert!(!format!("{:?}", cfg).contains("token: \"t\""));
    }
}
