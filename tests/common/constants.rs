//! Shared constants for end-to-end tests

// ============================================================================
// Test Identities
// ============================================================================

/// A client uid used by most tests
pub const TEST_UID: &str = "u1";

/// A second, unrelated client uid
pub const OTHER_UID: &str = "device-2";

/// Display name sent on login
pub const TEST_USERNAME: &str = "alice";

// ============================================================================
// Routing
// ============================================================================

/// The non-root prefix the sync routes are mounted under by default
pub const API_PREFIX: &str = "/mgaide-api";

// ============================================================================
// Timeouts
// ============================================================================

/// How long to wait for a spawned server to answer its status endpoint
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Per-request timeout for the test client
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Delay between readiness polls
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 50;
