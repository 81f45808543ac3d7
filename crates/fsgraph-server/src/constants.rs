//! Server configuration constants.

use std::time::Duration;

/// Default listen address.
pub const DEFAULT_ADDRESS: &str = "localhost:8080";

/// Fallback host part of the scope seed when the hostname can't be read.
pub const FALLBACK_HOSTNAME: &str = "localhost";

/// How long shutdown waits for open connections to finish their current
/// request.
pub const DRAIN_TIMEOUT: Duration = Duration::from_secs(60);

/// Error kind reported for lines that aren't a valid request.
pub const INVALID_REQUEST: &str = "invalid_request";
