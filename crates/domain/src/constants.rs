//! Session client constants
//!
//! Centralized defaults shared by configuration, the refresh coordinator and
//! the HTTP layer.

// Refresh retry policy
pub const DEFAULT_REFRESH_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_REFRESH_BASE_DELAY_MS: u64 = 1000;

// Timeouts
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;
/// Bound on a single identity-provider refresh call. A hung refresh surfaces
/// as a transient network failure once this elapses.
pub const DEFAULT_REFRESH_TIMEOUT_MS: u64 = 10_000;

// Identity provider endpoints (relative to the API base URL)
pub const DEFAULT_REFRESH_PATH: &str = "/auth/v1/token?grant_type=refresh_token";

// Session marker naming convention: `<prefix><project-ref><suffix>[.<chunk>]`
pub const DEFAULT_MARKER_PREFIX: &str = "sb-";
pub const DEFAULT_MARKER_SUFFIX: &str = "-auth-token";

// Cookie domain variants
pub const LOCAL_DEV_COOKIE_DOMAIN: &str = "localhost";

pub const DEFAULT_LOG_FILTER: &str = "info";
