use std::env;

/// Runtime configuration for token issuance, uploads and CORS.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Secret for signing short-lived access tokens (Required in production)
    pub access_token_secret: String,

    /// Access token lifetime in minutes (default: 15)
    pub access_token_ttl_minutes: i64,

    /// Secret for signing refresh tokens. Independent from the access secret
    /// so leaking one does not compromise the other.
    pub refresh_token_secret: String,

    /// Refresh token lifetime in days (default: 10)
    pub refresh_token_ttl_days: i64,

    /// Maximum accepted image upload size in bytes (default: 8 MB)
    pub max_image_size: usize,

    /// Whether session cookies carry the `Secure` flag (default: true)
    pub cookie_secure: bool,

    /// Allowed CORS Origins (comma separated)
    pub allowed_origins: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            access_token_secret: "access_secret".to_string(),
            access_token_ttl_minutes: 15,
            refresh_token_secret: "refresh_secret".to_string(),
            refresh_token_ttl_days: 10,
            max_image_size: 8 * 1024 * 1024,
            cookie_secure: true,
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:5173".to_string(), // Vite default
                "http://127.0.0.1:3000".to_string(),
            ],
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            access_token_secret: env::var("ACCESS_TOKEN_SECRET")
                .unwrap_or(default.access_token_secret),

            access_token_ttl_minutes: env::var("ACCESS_TOKEN_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.access_token_ttl_minutes),

            refresh_token_secret: env::var("REFRESH_TOKEN_SECRET")
                .unwrap_or(default.refresh_token_secret),

            refresh_token_ttl_days: env::var("REFRESH_TOKEN_TTL_DAYS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.refresh_token_ttl_days),

            max_image_size: env::var("MAX_IMAGE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_image_size),

            cookie_secure: env::var("COOKIE_SECURE")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(default.cookie_secure),

            allowed_origins: env::var("ALLOWED_ORIGINS")
                .ok()
                .map(|v| v.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(default.allowed_origins),
        }
    }

    /// Create config for development and tests (insecure cookies, fixed secrets)
    pub fn development() -> Self {
        Self {
            cookie_secure: false,
            ..Self::default()
        }
    }

    /// Create config for production (secrets strictly required)
    pub fn production() -> Self {
        let mut config = Self::from_env();
        config.access_token_secret =
            env::var("ACCESS_TOKEN_SECRET").expect("CRITICAL: ACCESS_TOKEN_SECRET must be set");
        config.refresh_token_secret =
            env::var("REFRESH_TOKEN_SECRET").expect("CRITICAL: REFRESH_TOKEN_SECRET must be set");
        config
    }
}
