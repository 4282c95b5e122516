use std::env;

pub const DEFAULT_ADDR: &str = "0.0.0.0:8000";
pub const DEFAULT_PORTAL_PREFIX: &str = "orthotics_portal";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiConfig {
    pub addr: String,
    /// Path segment step fragments are served under.
    pub portal_prefix: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
            portal_prefix: DEFAULT_PORTAL_PREFIX.to_string(),
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            addr: env::var("PORTAL_API_ADDR").unwrap_or(DEFAULT_ADDR.to_string()),
            portal_prefix: env::var("PORTAL_PREFIX")
                .unwrap_or(DEFAULT_PORTAL_PREFIX.to_string())
                .trim_matches('/')
                .to_string(),
        }
    }
}
