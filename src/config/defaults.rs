/// Configuration default values
///
/// Central location for every default used by the configuration layer.
use std::time::Duration;

// Listings service defaults
pub const DEFAULT_BASE_URL: &str = "https://json.schedulesdirect.org/20141201";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_USER_AGENT: &str = concat!("listings-sync/", env!("CARGO_PKG_VERSION"));

// Token lifecycle defaults
pub const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(20 * 60 * 60);
pub const DEFAULT_AUTH_COOLDOWN: Duration = Duration::from_secs(60);

// Config file discovery
pub const DEFAULT_CONFIG_FILE: &str = "listings-sync.toml";
pub const CONFIG_FILE_ENV: &str = "LISTINGS_SYNC_CONFIG";

// Credential overrides
pub const USERNAME_ENV: &str = "LISTINGS_SYNC_USERNAME";
pub const PASSWORD_ENV: &str = "LISTINGS_SYNC_PASSWORD";
pub const LISTINGS_ID_ENV: &str = "LISTINGS_SYNC_LISTINGS_ID";
