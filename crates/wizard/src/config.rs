use std::env;
use std::time::Duration;

/// Client settings, read from the environment (and `.env` when present).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    /// Origin the portal is served from, e.g. `http://localhost:8000`.
    pub base_url: String,
    /// Path segment the step fragments live under.
    pub portal_prefix: String,
    pub autosave_delay: Duration,
}

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_PORTAL_PREFIX: &str = "orthotics_portal";
pub const DEFAULT_AUTOSAVE_MS: u64 = 1000;

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            portal_prefix: DEFAULT_PORTAL_PREFIX.to_string(),
            autosave_delay: Duration::from_millis(DEFAULT_AUTOSAVE_MS),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let base_url = env::var("PORTAL_BASE_URL").unwrap_or(DEFAULT_BASE_URL.to_string());
        let portal_prefix =
            env::var("PORTAL_PREFIX").unwrap_or(DEFAULT_PORTAL_PREFIX.to_string());
        let autosave_ms = env::var("WIZARD_AUTOSAVE_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_AUTOSAVE_MS);

        Self::new(base_url, portal_prefix).with_autosave_delay(Duration::from_millis(autosave_ms))
    }

    pub fn new(base_url: impl Into<String>, portal_prefix: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            portal_prefix: portal_prefix.into().trim_matches('/').to_string(),
            ..Self::default()
        }
    }

    pub fn with_autosave_delay(mut self, delay: Duration) -> Self {
        self.autosave_delay = delay;
        self
    }

    /// `<origin>/api/<resource>/`
    pub fn api_url(&self, resource: &str) -> String {
        format!("{}/api/{}/", self.base_url, resource.trim_matches('/'))
    }

    pub fn step_content_url(&self, step: &str) -> String {
        format!("{}/{}/steps/{}.html", self.base_url, self.portal_prefix, step)
    }

    /// Where the browser goes after a successful submit.
    pub fn prescriptions_listing_path(&self) -> String {
        format!("/{}/prescriptions", self.portal_prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_carry_a_trailing_slash_and_the_portal_prefix() {
        let config = ClientConfig::new("http://portal.test/", "/orthotics_portal/");
        assert_eq!(
            config.api_url("prescriptions/7/postings"),
            "http://portal.test/api/prescriptions/7/postings/"
        );
        assert_eq!(
            config.step_content_url("shoe"),
            "http://portal.test/orthotics_portal/steps/shoe.html"
        );
        assert_eq!(config.prescriptions_listing_path(), "/orthotics_portal/prescriptions");
        assert_eq!(config.autosave_delay, Duration::from_millis(1000));
    }
}
