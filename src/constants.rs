/// Provider identifiers (used by the provider registry, the CLI and the API)
pub const HOUSE_CANARY: &str = "house_canary";

/// Provider used when a request does not name one
pub const DEFAULT_PROVIDER: &str = HOUSE_CANARY;

// House Canary endpoint defaults
pub const HOUSE_CANARY_BASE_URL: &str = "http://virtserver.swaggerhub.com/bdauer8/septic/1/canary";
pub const HOUSE_CANARY_TIMEOUT_SECS: u64 = 7;

// Credential environment variables
pub const HOUSE_CANARY_API_KEY_ENV: &str = "HOUSE_CANARY_API_KEY";
pub const HOUSE_CANARY_API_SECRET_ENV: &str = "HOUSE_CANARY_API_SECRET";

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8000";

// Log output
pub const LOG_DIR: &str = "logs";
pub const LOG_FILE_PREFIX: &str = "home_data.log";
